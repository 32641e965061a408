//! Binary entrypoint for the `bzsync` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    // Secrets may come from a .env file next to the config.
    dotenvy::dotenv().ok();

    // Recording is handled in commands::dispatch via BZSYNC_RECORD=<dir>.
    match bzsync::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
