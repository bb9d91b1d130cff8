//! hashgossip: Epidemic message dissemination node.
//!
//! Runs a gossip node by default. `--killer` and `--watcher` turn the binary
//! into a one-shot operator tool that talks to every node on the multicast
//! group.
//!
//! SHUTDOWN datagrams are obeyed from any sender. The protocol assumes a
//! closed, trusted network; anything that can reach the multicast group can
//! stop every node on it.

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, info_span, Instrument};
use tracing_subscriber::EnvFilter;

use hashgossip_core::{emitter, Dispatch, Node, Peer, Transport};
use hashgossip_daemon::bootstrap::{self, HELLO_INTERVAL};
use hashgossip_daemon::{bind_multicast, bind_unicast, serve, Config, UdpTransport, SHUTDOWN_EXIT_CODE};

/// How long `--watcher` collects reports before exiting.
const WATCH_DURATION: Duration = Duration::from_secs(5);

#[derive(Parser, Debug)]
#[command(name = "hashgossip")]
#[command(about = "Epidemic message dissemination over UDP")]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Send a shutdown command to every node on the multicast group and exit
    #[arg(long, conflicts_with = "watcher")]
    killer: bool,

    /// Ask every node on the multicast group for its current message, log the reports and exit
    #[arg(long)]
    watcher: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn any_port() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
}

/// Exit the process as instructed by a SHUTDOWN datagram.
///
/// The command has already been logged inside the span of the read loop
/// that received it.
fn obey_shutdown() -> ! {
    std::process::exit(SHUTDOWN_EXIT_CODE)
}

async fn run_killer(config: &Config) -> Result<()> {
    let group = config.multicast_group()?;
    let transport = UdpTransport::bind()
        .await
        .context("Failed to bind send socket")?;
    transport
        .send(group.into(), &bootstrap::shutdown())
        .await
        .with_context(|| format!("Failed to send shutdown to {}", group))?;
    info!("Shutdown sent to {}", group);
    Ok(())
}

async fn run_watcher(config: &Config) -> Result<()> {
    let group = config.multicast_group()?;
    let transport = Arc::new(
        UdpTransport::bind()
            .await
            .context("Failed to bind send socket")?,
    );
    let (node, _worker) = Node::start(transport.clone());

    let unicast = bind_unicast(any_port())
        .await
        .context("Failed to bind unicast socket")?;
    let port = unicast.local_addr()?.port();
    let span = info_span!("watcher", port);

    transport
        .send(group.into(), &bootstrap::monitoring(port))
        .await
        .with_context(|| format!("Failed to send monitoring request to {}", group))?;
    info!("Collecting reports on port {} for {:?}", port, WATCH_DURATION);

    if let Ok(Dispatch::Shutdown) =
        tokio::time::timeout(
            WATCH_DURATION,
            serve(unicast, &node, "unicast").instrument(span),
        )
        .await
    {
        obey_shutdown();
    }
    Ok(())
}

async fn run_node(config: &Config) -> Result<()> {
    let group = config.multicast_group()?;
    let transport = Arc::new(
        UdpTransport::bind()
            .await
            .context("Failed to bind send socket")?,
    );
    let (node, _worker) = Node::start(transport.clone());
    let node = Arc::new(node);

    let unicast = bind_unicast(any_port())
        .await
        .context("Failed to bind unicast socket")?;
    let port = unicast.local_addr()?.port();
    let span = info_span!("node", port);

    let unicast_task = tokio::spawn({
        let node = node.clone();
        async move { serve(unicast, &node, "unicast").await }.instrument(span.clone())
    });

    let ip = bootstrap::outbound_ip().await?;
    node.peers().add(Peer::new(ip, port));
    info!(parent: &span, "Node address {}:{}", ip, port);

    let multicast = bind_multicast(group)
        .with_context(|| format!("Failed to join multicast group {}", group))?;
    let multicast_task = tokio::spawn({
        let node = node.clone();
        async move { serve(multicast, &node, "multicast").await }.instrument(span.clone())
    });

    let startup = {
        let node = node.clone();
        let transport = transport.clone();
        let limit = config.limit_messages;
        let invalid_frequency = config.invalid_frequency;
        async move {
            bootstrap::announce_until_known(&node, transport.as_ref(), group.into(), port, HELLO_INTERVAL)
                .await?;

            let count = if limit == 0 {
                0
            } else {
                rand::rng().random_range(0..limit)
            };
            tokio::spawn(
                emitter::run(node.gossiper().clone(), count, invalid_frequency)
                    .instrument(tracing::Span::current()),
            );

            std::future::pending::<()>().await;
            Ok::<(), anyhow::Error>(())
        }
        .instrument(span.clone())
    };

    let dispatch = tokio::select! {
        result = unicast_task => result.context("Unicast listener panicked")?,
        result = multicast_task => result.context("Multicast listener panicked")?,
        result = startup => {
            result?;
            return Ok(());
        }
        _ = tokio::signal::ctrl_c() => {
            info!(parent: &span, "Interrupted, shutting down");
            return Ok(());
        }
    };

    if dispatch == Dispatch::Shutdown {
        obey_shutdown();
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging - respects RUST_LOG env var, defaults to info (or debug with --verbose)
    let default_filter = if args.verbose {
        "debug,hashgossip_core=debug,hashgossip_daemon=debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::load(&args.config)?;

    if args.killer {
        run_killer(&config).await
    } else if args.watcher {
        run_watcher(&config).await
    } else {
        info!("Starting hashgossip node");
        run_node(&config).await
    }
}
