//! clipsync entry point.
//!
//! Parses the command line, loads configuration, installs logging, and runs
//! the session supervisor until Ctrl-C or a fatal error.
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ Cli::resolve_config()      -- defaults < config file < flags
//!  └─ TcpNegotiator::new()       -- dial, else listen
//!  └─ Supervisor::run()          -- negotiate, sync, renegotiate on loss
//!       └─ SyncEngine::run()     -- outbound + inbound loops per session
//! ```
//!
//! Exit status is 0 after Ctrl-C and non-zero when the supervisor gives up
//! (bad local address, or a lost link with `--no-reconnect`).

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use clipsync_peer::application::supervisor::Supervisor;
use clipsync_peer::cli::Cli;
use clipsync_peer::infrastructure::clipboard::create_clipboard;
use clipsync_peer::infrastructure::network::TcpNegotiator;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.resolve_config().context("failed to load configuration")?;

    if cli.print_config {
        print!("{}", config.to_toml_string().context("failed to render configuration")?);
        return Ok(());
    }

    // RUST_LOG takes precedence over the configured level.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.log_level)),
        )
        .init();

    let negotiation = config.negotiation_config(cli.local_ip, cli.remote_ip);
    info!(
        "clipsync starting: local {} remote {} ({} format, clipboard {})",
        negotiation.local_addr,
        negotiation.remote_addr,
        negotiation.wire_format,
        config.sync.clipboard
    );

    let clipboard = create_clipboard(config.sync.clipboard);
    let supervisor = Supervisor::new(
        TcpNegotiator::new(negotiation),
        clipboard,
        config.supervisor_config(),
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let cancel = CancellationToken::new();
    let shutdown = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.cancel();
        }
    });

    supervisor.run(&cancel).await.context("clipboard sync stopped")?;

    info!("clipsync stopped");
    Ok(())
}
