//! Block operations command.

use super::LedgerArgs;
use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Args)]
pub struct BlockArgs {
    #[command(subcommand)]
    command: BlockCommand,
}

#[derive(Subcommand)]
enum BlockCommand {
    /// List recent committed blocks
    List {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Number of blocks to show
        #[arg(short, long, default_value = "10")]
        count: usize,
    },
    /// Show detailed block information
    Info {
        #[command(flatten)]
        ledger: LedgerArgs,

        /// Block number
        block_num: u64,
    },
}

pub async fn run(args: BlockArgs) -> Result<()> {
    match args.command {
        BlockCommand::List { ledger, count } => list_blocks(ledger, count).await,
        BlockCommand::Info { ledger, block_num } => show_block_info(ledger, block_num).await,
    }
}

async fn list_blocks(args: LedgerArgs, count: usize) -> Result<()> {
    let open = args.open()?;
    let outcome = open.ledger.reconcile(&open.ctx).await?;

    println!();
    println!("{}", "Recent Blocks:".bold().cyan());
    println!();

    if outcome.committed_blocks == 0 {
        println!("  {}", "No committed blocks yet".bright_black());
    }

    let start = outcome.committed_blocks.saturating_sub(count as u64);
    for block_num in (start..outcome.committed_blocks).rev() {
        let block = open
            .ledger
            .get_block(&open.ctx, block_num)
            .await?
            .context("Block not found")?;

        println!(
            "  {} {} {}",
            format!("#{}", block_num).bright_black(),
            block.hash.to_hex()[..16].bright_yellow(),
            format!("({} txs)", block.tx_count()).bright_black()
        );
    }

    println!();
    Ok(())
}

async fn show_block_info(args: LedgerArgs, block_num: u64) -> Result<()> {
    let open = args.open()?;
    let block = open
        .ledger
        .get_block(&open.ctx, block_num)
        .await?
        .with_context(|| format!("Block {} is not committed", block_num))?;

    let previous = block
        .previous_hash
        .map(|h| h.to_hex())
        .unwrap_or_else(|| "-".to_string());

    println!();
    println!("{}", "Block Information:".bold().cyan());
    println!();
    println!("  Number:       {}", block.block_num.to_string().bright_cyan());
    println!("  Hash:         {}", block.hash.to_hex().bright_yellow());
    println!("  Parent Hash:  {}", previous.bright_black());
    println!(
        "  Timestamp:    {}",
        block.timestamp.to_rfc3339().bright_black()
    );
    println!(
        "  Hash Valid:   {}",
        if block.verify_hash() {
            "yes".green()
        } else {
            "no".red()
        }
    );
    println!();

    println!("{}", "Transactions:".bold());
    println!();
    for tx in &block.transactions {
        println!(
            "  {} {}",
            format!("{}.", tx.tx_number).bright_black(),
            tx.content().bright_yellow()
        );
    }
    println!();

    Ok(())
}
