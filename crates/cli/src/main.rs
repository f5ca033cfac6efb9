//! tledger CLI entry point.

use clap::Parser;

mod commands;

#[derive(Parser)]
#[command(name = "tledger")]
#[command(about = "Inspect and append to a local tledger data directory", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<commands::Commands>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Some(cmd) => {
            if let Err(e) = commands::run(cmd).await {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            println!("tledger - An append-only ledger over a coordination store");
            println!("Run 'tledger --help' for usage information.");
        }
    }
}
