use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tracing::{error, info};

use crate::{
    client::{ConnectivityReporter, PluginClient},
    config::PresenceConfig,
    utils::clock::DefaultClock,
};

/// Sends a single connected ping right away, bypassing the cooldown.
pub async fn process_ping_command(config: &PresenceConfig) -> Result<Value> {
    let client = PluginClient::new(
        config.server_url()?,
        &config.plugin_id,
        &config.auth(),
        Arc::new(DefaultClock),
    )?;
    info!("Sending connected ping to {}", client.url());

    send_ping(&client).await
}

async fn send_ping(reporter: &dyn ConnectivityReporter) -> Result<Value> {
    Ok(reporter
        .report_connected()
        .await
        .inspect_err(|e| error!("Connected ping failed {e}"))?)
}
