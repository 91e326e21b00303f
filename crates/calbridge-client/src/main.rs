//! calbridge CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use calbridge_client::cli::Cli;
use calbridge_client::error::ClientError;
use calbridge_client::output;
use calbridge_core::init_tracing;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing (stderr only, stdout is the JSON channel)
    if let Err(e) = init_tracing(cli.tracing_config()) {
        eprintln!("warning: {}", e);
    }

    // One operation per invocation
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            output::print_error(&ClientError::Unexpected(format!(
                "failed to start async runtime: {}",
                e
            )));
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(calbridge_client::run(&cli)) {
        Ok(Some(doc)) => {
            output::print_result(&doc);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            debug!(kind = %e.kind(), "{}", e);
            output::print_error(&e);
            e.exit_code()
        }
    }
}
