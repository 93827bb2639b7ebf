//! Gateway client entry point
//!
//! Run with:
//! ```bash
//! CORDIS_TOKEN=... cargo run -p cordis-gateway
//! ```
//!
//! Configuration is loaded from environment variables (and `.env`).

use anyhow::Context;
use cordis_common::{try_init_tracing_with_config, ClientConfig, TracingConfig};
use cordis_gateway::{Event, EventKind, GatewayClient};
use tracing::{error, info};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Gateway client failed to start");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("loading configuration")?;

    if let Err(e) = try_init_tracing_with_config(TracingConfig::for_environment(config.env)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.env,
        intents = config.intents,
        gateway = %config.gateway_url,
        "Configuration loaded"
    );

    let client = GatewayClient::new(config).context("building client")?;

    client.on(EventKind::Ready, |event| {
        if let Event::Ready { user } = event {
            info!(user_id = %user.id, username = %user.username, "Logged in");
        }
    });
    client.on(EventKind::MessageCreate, |event| {
        if let Event::MessageCreate(message) = event {
            info!(
                message_id = %message.id,
                channel_id = %message.channel_id,
                author_id = ?message.author_id,
                content = %message.content,
                "Message received"
            );
        }
    });

    client.connect().await.context("connecting")?;

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("Shutdown signal received");

    client.disconnect().await;
    Ok(())
}
