//! Propose transaction command.

use super::LedgerArgs;
use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use tledger_core::ProposedTransaction;

#[derive(Args)]
pub struct ProposeArgs {
    #[command(flatten)]
    ledger: LedgerArgs,

    /// Transaction content
    #[arg(short, long)]
    content: String,

    /// Party names, one per flag
    #[arg(long = "name")]
    names: Vec<String>,

    /// Party percentages, one per flag and in the same order as --name
    #[arg(long = "percent", allow_negative_numbers = true)]
    percents: Vec<i64>,
}

pub async fn run(args: ProposeArgs) -> Result<()> {
    if args.names.len() != args.percents.len() {
        bail!(
            "Got {} names but {} percentages",
            args.names.len(),
            args.percents.len()
        );
    }

    let open = args.ledger.open()?;
    let proposed = ProposedTransaction::new(args.content, args.names, args.percents);
    let sequenced = open
        .ledger
        .propose_transaction(&open.ctx, proposed)
        .await
        .context("Failed to sequence transaction")?;

    println!();
    println!("{}  Transaction sequenced", "✓".green().bold());
    println!("    Namespace: {}", open.ctx.namespace.to_string().bright_cyan());
    println!("    Index:     {}", sequenced.index.to_string().bright_cyan());
    println!("    Block:     {}", sequenced.block_num.to_string().bright_cyan());
    println!("    Position:  {}", sequenced.tx_number.to_string().bright_cyan());
    if sequenced.attempts > 1 {
        println!(
            "    Attempts:  {}",
            sequenced.attempts.to_string().bright_black()
        );
    }
    println!();

    open.close()
}
