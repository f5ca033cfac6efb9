//! Namespace statistics command.

use super::LedgerArgs;
use anyhow::Result;
use clap::Args;
use colored::Colorize;

#[derive(Args)]
pub struct StatsArgs {
    #[command(flatten)]
    ledger: LedgerArgs,
}

pub async fn run(args: StatsArgs) -> Result<()> {
    let open = args.ledger.open()?;
    let outcome = open.ledger.reconcile(&open.ctx).await?;
    let stats = open.ledger.stats(&open.ctx.namespace).await;

    let latest = outcome
        .latest_index
        .map(|i| i.to_string())
        .unwrap_or_else(|| "none".to_string());
    let pending = pending_transactions(
        outcome.latest_index,
        outcome.committed_blocks,
        open.ledger.config().block_size_u64(),
    );

    println!();
    println!("{}", "Ledger Statistics:".bold().cyan());
    println!();
    println!("  Namespace:        {}", open.ctx.namespace.to_string().bright_cyan());
    println!("  Latest Index:     {}", latest.bright_cyan());
    println!(
        "  Committed Blocks: {}",
        outcome.committed_blocks.to_string().bright_cyan()
    );
    println!("  Pending Txs:      {}", pending.to_string().bright_black());
    println!(
        "  Block Size:       {}",
        open.ledger.config().block_size.to_string().bright_black()
    );
    println!(
        "  Cached Blocks:    {}",
        stats.cached_blocks.to_string().bright_black()
    );
    println!();

    Ok(())
}

/// Sequenced transactions not yet part of a full block.
fn pending_transactions(latest_index: Option<u64>, committed_blocks: u64, block_size: u64) -> u128 {
    let sequenced = latest_index.map_or(0, |i| u128::from(i) + 1);
    sequenced.saturating_sub(u128::from(committed_blocks) * u128::from(block_size))
}
