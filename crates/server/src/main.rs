//! tledger HTTP server.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tledger_chain::{Ledger, LedgerConfig};
use tledger_core::Namespace;
use tledger_server::{router, write_snapshot};
use tledger_storage::{CoordinationStore, MemoryStore, SledStore};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tledger-server")]
#[command(about = "Append-only ledger over a coordination store", long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:9090")]
    listen: SocketAddr,

    /// Sled data directory
    #[arg(long, default_value = "./tledger_data", conflicts_with = "memory")]
    data_dir: PathBuf,

    /// Keep everything in memory (nothing survives a restart)
    #[arg(long)]
    memory: bool,

    /// JSON file with ledger configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Transactions per block
    #[arg(long)]
    block_size: Option<usize>,

    /// Deadline for each store call, in milliseconds
    #[arg(long)]
    store_timeout_ms: Option<u64>,

    /// Sequencer attempts before giving up
    #[arg(long)]
    max_attempts: Option<u32>,

    /// Namespaces to reconcile at startup
    #[arg(long = "namespace", default_value = "tledger")]
    namespaces: Vec<String>,

    /// Where the cache snapshot is written on shutdown
    #[arg(long, default_value = "/tmp/tledger")]
    dump_dir: PathBuf,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> Result<LedgerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_slice(&raw)
                .with_context(|| format!("parsing config {}", path.display()))?
        }
        None => LedgerConfig::default(),
    };
    if let Some(block_size) = args.block_size {
        config.block_size = block_size;
    }
    if let Some(timeout) = args.store_timeout_ms {
        config.store_timeout_ms = timeout;
    }
    if let Some(attempts) = args.max_attempts {
        config.max_attempts = attempts;
    }
    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();

    let config = load_config(&args)?;
    let namespaces = args
        .namespaces
        .iter()
        .map(|n| Namespace::new(n.as_str()))
        .collect::<Result<Vec<_>, _>>()?;

    let sled = if args.memory {
        None
    } else {
        Some(Arc::new(SledStore::open(&args.data_dir).with_context(|| {
            format!("opening data directory {}", args.data_dir.display())
        })?))
    };
    let store: Arc<dyn CoordinationStore> = match &sled {
        Some(sled) => sled.clone() as Arc<dyn CoordinationStore>,
        None => Arc::new(MemoryStore::new()),
    };

    let ledger = Arc::new(Ledger::new(store, config)?);
    info!(
        block_size = ledger.config().block_size,
        store_timeout_ms = ledger.config().store_timeout_ms,
        persistent = sled.is_some(),
        "ledger initialized"
    );

    for namespace in namespaces {
        let ctx = ledger.context(namespace);
        let outcome = ledger
            .reconcile(&ctx)
            .await
            .with_context(|| format!("initial reconcile of {}", ctx.namespace))?;
        info!(
            namespace = %ctx.namespace,
            latest_index = ?outcome.latest_index,
            blocks = outcome.committed_blocks,
            "namespace ready"
        );
    }

    let listener = tokio::net::TcpListener::bind(args.listen)
        .await
        .with_context(|| format!("binding {}", args.listen))?;
    info!(address = %args.listen, "listening");

    let shutdown_ledger = ledger.clone();
    axum::serve(listener, router(ledger.clone()))
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            info!("shutdown requested, cancelling in-flight requests");
            shutdown_ledger.shutdown();
        })
        .await?;

    if let Err(e) = write_snapshot(&ledger, &args.dump_dir).await {
        warn!(error = %e, "failed to write cache snapshot");
    }
    if let Some(sled) = sled {
        sled.flush()?;
    }
    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
