//! Release manager binary entry point.

use std::process;

use kodegen_release_manager::cli;
use kodegen_release_manager::cli::OutputManager;

#[tokio::main]
async fn main() {
    env_logger::init();

    match cli::run().await {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            let output = OutputManager::new();
            output.error(&format!("Fatal error: {e}"));
            process::exit(1);
        }
    }
}
