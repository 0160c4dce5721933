mod bridge;
mod config;
mod debounce;
mod equality;
mod frame;
mod height;
mod injector;
mod page;
mod params;
mod protocol;
mod server;
mod state;
#[cfg(test)]
mod testing;
mod watcher;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tokio::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::bridge::{ChannelNotifier, ShimPage};
use crate::injector::Injector;
use crate::protocol::{Command, HostEvent};
use crate::watcher::Watcher;

/// Native messaging host that keeps the DK Analyze frame in step with the
/// report page the user is browsing.
#[derive(Parser, Debug)]
#[command(version)]
struct Args {
    /// Caller identity as passed by the browser (extension origin, or
    /// manifest path and add-on id).
    caller: Vec<String>,

    /// Window handle Chrome passes on Windows. Unused.
    #[arg(long)]
    parent_window: Option<String>,

    /// Config file to use instead of ~/.dk-analyze/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Load the analysis app from the development server regardless of caller.
    #[arg(long)]
    development: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // stdout is the native messaging channel, so logs must go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => config::load_from(path)?,
        None => config::load_config()?,
    };

    let extension_id = config::extension_identity(&args.caller);
    let base_url = if args.development {
        config.frame.development_base()?
    } else {
        config.frame.base_for(extension_id.as_deref())?
    };
    info!(
        extension = extension_id.as_deref().unwrap_or("unknown"),
        base = %base_url,
        parent_window = ?args.parent_window,
        "starting injector host"
    );

    let (command_tx, command_rx) = mpsc::unbounded_channel::<Command>();
    let (event_tx, event_rx) = mpsc::unbounded_channel::<HostEvent>();
    let writer = bridge::spawn_stdout_writer(command_rx);
    bridge::spawn_stdin_reader(event_tx);

    let page = ShimPage::new(command_tx, config.page.tracked_ids())
        .context("content script bridge closed before startup")?;
    let injector = Injector::new(page, config.page.clone(), base_url);
    let (mut watcher, status) =
        Watcher::new(injector, Duration::from_millis(config.height_quiet_ms));

    if config.status_port != 0 {
        let port = config.status_port;
        tokio::spawn(async move {
            if let Err(err) = server::serve(port, status).await {
                warn!(?err, "status endpoint unavailable");
            }
        });
    }

    watcher.run(&mut ChannelNotifier::new(event_rx)).await;

    // Dropping the watcher drops the last command sender and lets the writer drain.
    drop(watcher);
    writer.await.context("stdout writer panicked")?;
    Ok(())
}
