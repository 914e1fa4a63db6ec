use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Result;
use collection::poller::ActivityPoller;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    activity::{gate::ActivityGate, ActivityHub},
    client::{ConnectivityReporter, PluginClient},
    config::PresenceConfig,
    input_api::{GenericIdleProvider, IdleTimeProvider},
    plugin::PresencePlugin,
    utils::clock::{Clock, DefaultClock},
};

pub mod collection;
pub mod shutdown;

/// Represents the starting point for the daemon
pub async fn start_daemon(config: PresenceConfig) -> Result<()> {
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let client = PluginClient::new(
        config.server_url()?,
        &config.plugin_id,
        &config.auth(),
        clock.clone(),
    )?;
    info!("Reporting presence to {}", client.url());

    let provider = GenericIdleProvider::new()?;
    let hub = Arc::new(ActivityHub::new());
    let shutdown_token = CancellationToken::new();

    let plugin = create_plugin(Arc::new(client), clock, config.cooldown());
    let poller = create_poller(
        hub.clone(),
        provider,
        &shutdown_token,
        config.poll_interval(),
        DefaultClock,
    );

    run_plugin(
        plugin,
        &hub,
        poller,
        shutdown::detect_shutdown(shutdown_token.clone()),
    )
    .await;

    Ok(())
}

/// Keeps the plugin subscribed while the poller runs. Once `shutdown` resolves and polling
/// stops, the listener is removed and pings already in flight are waited on.
async fn run_plugin(
    mut plugin: PresencePlugin,
    hub: &ActivityHub,
    poller: ActivityPoller,
    shutdown: impl Future<Output = ()>,
) -> PresencePlugin {
    plugin.initialize(hub);

    let (_, poll_result) = tokio::join!(shutdown, poller.run());

    plugin.deinitialize(hub);

    if let Err(poll_result) = poll_result {
        error!("Activity polling got an error {:?}", poll_result);
    }

    info!("Waiting for in-flight pings");
    plugin.gate().finish_pending().await;
    plugin
}

fn create_plugin(
    reporter: Arc<dyn ConnectivityReporter>,
    clock: Arc<dyn Clock>,
    cooldown: Duration,
) -> PresencePlugin {
    PresencePlugin::new(ActivityGate::new(reporter, clock, cooldown))
}

fn create_poller(
    hub: Arc<ActivityHub>,
    provider: impl IdleTimeProvider + 'static,
    shutdown_token: &CancellationToken,
    poll_interval: Duration,
    clock: impl Clock,
) -> ActivityPoller {
    ActivityPoller::new(
        hub,
        Box::new(provider),
        shutdown_token.clone(),
        poll_interval,
        Box::new(clock),
    )
}
