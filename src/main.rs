use clap::Parser;
use emo_erosivity::cli::{self, Args};
use std::process;

fn main() {
    let args = Args::parse();

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    let result = runtime.block_on(async {
        let shutdown_signal = async {
            if tokio::signal::ctrl_c().await.is_err() {
                // No handler available; never resolve
                std::future::pending::<()>().await;
            }
        };

        tokio::select! {
            result = cli::run(args) => result,
            _ = shutdown_signal => {
                eprintln!("\nReceived CTRL+C, shutting down...");
                Err(anyhow::anyhow!("Processing interrupted by user"))
            }
        }
    });

    match result {
        Ok(_stats) => process::exit(0),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}
