//! Cache snapshot written on shutdown.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tledger_chain::Ledger;
use tledger_core::Block;
use tracing::info;

/// Write every cached block of every namespace to `<dir>/<unix_nanos>.json`.
///
/// Returns the path written.
pub async fn write_snapshot(ledger: &Ledger, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let snapshot = ledger.snapshot().await;
    let view: BTreeMap<&str, Vec<&Block>> = snapshot
        .iter()
        .map(|(ns, blocks)| (ns.as_str(), blocks.iter().map(|b| b.as_ref()).collect()))
        .collect();
    let json = serde_json::to_vec_pretty(&view)?;

    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("creating dump directory {}", dir.display()))?;
    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let path = dir.join(format!("{stamp}.json"));
    tokio::fs::write(&path, json)
        .await
        .with_context(|| format!("writing {}", path.display()))?;

    let blocks: usize = view.values().map(Vec::len).sum();
    info!(path = %path.display(), namespaces = view.len(), blocks, "wrote cache snapshot");
    Ok(path)
}
