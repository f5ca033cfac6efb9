//! Transaction operations command.

use super::LedgerArgs;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args)]
pub struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand)]
enum TxCommand {
    /// Show a transaction from a committed block
    Info {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Block number
        block_num: u64,

        /// Position within the block
        tx_number: u64,
    },
}

pub async fn run(args: TxArgs) -> Result<()> {
    match args.command {
        TxCommand::Info {
            ledger,
            block_num,
            tx_number,
        } => show_transaction(ledger, block_num, tx_number).await,
    }
}

async fn show_transaction(args: LedgerArgs, block_num: u64, tx_number: u64) -> Result<()> {
    let open = args.open()?;
    let tx = open
        .ledger
        .get_transaction(&open.ctx, block_num, tx_number)
        .await?
        .with_context(|| format!("Block {} is not committed", block_num))?;

    println!();
    println!("{}", "Transaction:".bold().cyan());
    println!();
    println!("  Block:     {}", tx.block_num.to_string().bright_cyan());
    println!("  Position:  {}", tx.tx_number.to_string().bright_cyan());
    println!("  Timestamp: {}", tx.timestamp.to_rfc3339().bright_black());
    println!("  Content:   {}", tx.content().bright_yellow());

    if !tx.proposed.name.is_empty() {
        println!();
        println!("{}", "Parties:".bold());
        for (name, percent) in tx.proposed.name.iter().zip(&tx.proposed.percent) {
            println!("  {:<20} {}%", name, percent.to_string().bright_cyan());
        }
    }
    println!();

    Ok(())
}
