//! vordr: command-line host for the offline caching agent.
//!
//! Each subcommand delivers one event to the agent. Stores are kept on
//! disk so they survive between invocations.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tracing::info;

use vordr::store::{CacheStorage, FsStorage};
use vordr::{Agent, Config, FetchOutcome, Request, RequestMode};

/// Offline caching agent
#[derive(Parser)]
#[command(name = "vordr")]
#[command(version = vordr::PKG_VERSION)]
#[command(about = "Offline-first caching agent for a single-origin web app")]
struct Args {
    /// Path to configuration file.
    #[arg(short, long, env = "VORDR_CONFIG")]
    config: Option<PathBuf>,

    /// Store directory (default: `[storage] path`, then ~/.cache/vordr/stores).
    #[arg(long, env = "VORDR_STORE_DIR")]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Precache the asset and API stores
    Install,

    /// Delete stores left over from previous versions
    Activate,

    /// Handle one request the way an intercepted page request is handled
    Fetch {
        /// Absolute URL
        url: String,
        /// Treat as a top-level navigation
        #[arg(long)]
        navigate: bool,
        /// Accept hint
        #[arg(long)]
        accept: Option<String>,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
        /// Print response headers
        #[arg(short = 'i', long)]
        include: bool,
    },

    /// Refresh the API store
    Sync {
        /// Sync tag (default: the configured tag)
        #[arg(long)]
        tag: Option<String>,
        /// Keep running and refresh every N seconds until interrupted
        #[arg(long)]
        every: Option<u64>,
    },

    /// List stores and their entry counts
    Stores,

    /// Delete one store
    Purge {
        /// Store name
        store: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialise tracing (default: warn for CLI; override with RUST_LOG).
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref())?;

    let store_dir = args
        .store_dir
        .or_else(|| config.storage.path.clone())
        .unwrap_or_else(FsStorage::default_root);
    let storage = Arc::new(FsStorage::new(store_dir));

    let agent = Arc::new(
        Agent::builder()
            .config(config)
            .storage(storage.clone())
            .build()?,
    );

    match args.command {
        Command::Install => {
            let report = agent.install().await?;
            println!(
                "{}: {} entries",
                agent.scope().asset_store,
                report.assets_cached
            );
            match report.api_cached {
                Some(n) => println!("{}: {n} entries", agent.scope().api_store),
                None => println!("{}: precache failed (will fill on use)", agent.scope().api_store),
            }
        }

        Command::Activate => {
            let report = agent.activate().await?;
            for name in &report.deleted {
                println!("deleted {name}");
            }
            for name in &report.retained {
                println!("kept    {name}");
            }
        }

        Command::Fetch {
            url,
            navigate,
            accept,
            method,
            include,
        } => {
            let mut request = Request::new(&method, url.parse()?);
            if navigate {
                request = request.mode(RequestMode::Navigate);
            }
            if let Some(accept) = accept {
                request = request.accept(accept);
            }

            match agent.fetch(&request).await {
                FetchOutcome::Response { snapshot, source } => {
                    eprintln!("{} ({})", snapshot.status(), source.as_str());
                    if include {
                        for (name, value) in snapshot.headers() {
                            println!("{name}: {value}");
                        }
                        println!();
                    }
                    io::stdout().write_all(&snapshot.into_body())?;
                }
                FetchOutcome::PassThrough => {
                    eprintln!("not intercepted");
                }
                FetchOutcome::NoResponse => {
                    eprintln!("no response: offline and nothing cached");
                    std::process::exit(1);
                }
            }
        }

        Command::Sync { tag, every } => {
            if let Some(secs) = every {
                let (shutdown_tx, shutdown_rx) = watch::channel(false);
                let runner = tokio::spawn(vordr::sync::run_periodic(
                    agent.clone(),
                    Duration::from_secs(secs),
                    shutdown_rx,
                ));
                info!(secs, "periodic refresh running; press Ctrl-C to stop");
                tokio::signal::ctrl_c().await?;
                let _ = shutdown_tx.send(true);
                runner.await?;
                return Ok(());
            }

            let tag = tag.unwrap_or_else(|| agent.scope().sync_tag.clone());
            match agent.sync(&tag).await {
                Some(report) => {
                    for url in &report.refreshed {
                        println!("refreshed {url}");
                    }
                    for (url, reason) in &report.failed {
                        println!("failed    {url}: {reason}");
                    }
                }
                None => println!("unknown sync tag {tag:?}; nothing to do"),
            }
        }

        Command::Stores => {
            for name in storage.names().await? {
                let count = storage.open(&name).await?.keys().await?.len();
                let marker = if agent.scope().is_current_store(&name) {
                    "current"
                } else {
                    "stale"
                };
                println!("{name}\t{count}\t{marker}");
            }
        }

        Command::Purge { store } => {
            if storage.delete(&store).await? {
                println!("deleted {store}");
            } else {
                println!("no store named {store}");
            }
        }
    }

    Ok(())
}
