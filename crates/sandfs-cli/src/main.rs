//! sandfs command-line dispatcher.
//!
//! Loads a sandbox config, opens its mounts, and runs one tool call.
//!
//! Usage:
//!   sandfs --config sandfs.toml mounts
//!   sandfs --config sandfs.toml tools workspace
//!   sandfs --config sandfs.toml call workspace read_file '{"path": "/data/README.md"}'
//!
//! Results are JSON on stdout; logs go to stderr (`RUST_LOG` overrides the
//! default `info` level). Ctrl-C cancels a running call.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{EnvFilter, fmt};

use sandfs_kernel::{MountRegistry, SandboxConfig};

/// Sandboxed filesystem tools over configured mounts.
#[derive(Parser, Debug)]
#[command(name = "sandfs")]
#[command(about = "Run sandboxed filesystem tools against configured mounts")]
struct Args {
    /// Path to the TOML sandbox config
    #[arg(short, long, default_value = "sandfs.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List configured mounts
    Mounts,
    /// List the tools of a mount with their input schemas
    Tools {
        /// Mount name
        mount: String,
    },
    /// Call a tool with a JSON argument object
    Call {
        /// Mount name
        mount: String,
        /// Tool name, e.g. read_file
        tool: String,
        /// JSON arguments (defaults to `{}`)
        args: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();

    let config = SandboxConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let registry = MountRegistry::from_config(&config)
        .await
        .context("opening mounts")?;

    let result = run(&registry, args.command).await;
    registry.close_all().await.context("closing mounts")?;

    let output = result?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(registry: &MountRegistry, command: Command) -> Result<Value> {
    match command {
        Command::Mounts => {
            let mounts: Vec<Value> = registry
                .list()
                .await
                .into_iter()
                .map(|m| {
                    json!({
                        "name": m.name,
                        "kind": m.kind,
                        "read_only": m.read_only,
                        "roots": m.roots,
                    })
                })
                .collect();
            Ok(json!({ "mounts": mounts }))
        }
        Command::Tools { mount } => {
            let target = registry
                .get(&mount)
                .await
                .with_context(|| format!("unknown mount: {mount}"))?;
            Ok(json!({ "tools": target.list_tools() }))
        }
        Command::Call { mount, tool, args } => {
            let params: Value = match args {
                Some(raw) => serde_json::from_str(&raw).context("parsing tool arguments")?,
                None => json!({}),
            };

            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            let watcher = tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("interrupted, cancelling");
                    on_interrupt.cancel();
                }
            });

            tracing::info!(%mount, %tool, "calling tool");
            let result = registry.call(&mount, &tool, &params, &cancel).await;
            watcher.abort();

            result.with_context(|| format!("{mount}/{tool} failed"))
        }
    }
}
