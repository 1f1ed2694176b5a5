use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use dicey_core::cache::ActiveMessageCache;
use dicey_core::config::{AppConfig, ConfigError, LoadOptions};
use dicey_discord::events::NoopChannelMessenger;
use dicey_discord::families::dispatcher_with;
use dicey_discord::gateway::{
    CommandRegistrar, GatewayRunner, GatewayTransport, NoopCommandRegistrar,
    NoopGatewayTransport, ReconnectPolicy, TransportError,
};

pub struct Application {
    pub config: AppConfig,
    pub cache: Arc<ActiveMessageCache>,
    pub gateway_runner: GatewayRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("command registration sync failed: {0}")]
    CommandSync(#[source] TransportError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    bootstrap_with_gateway(
        config,
        Arc::new(NoopGatewayTransport),
        Arc::new(NoopCommandRegistrar),
    )
    .await
}

/// Wires the cache, the interaction dispatcher and the gateway runner.
/// The transport and registrar come from the caller so the same assembly
/// serves the real gateway and the tests.
pub async fn bootstrap_with_gateway(
    config: AppConfig,
    transport: Arc<dyn GatewayTransport>,
    registrar: Arc<dyn CommandRegistrar>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let cache = Arc::new(ActiveMessageCache::new(config.cache.channel_retention));
    let dispatcher = dispatcher_with(Arc::clone(&cache), Arc::new(NoopChannelMessenger));

    if config.discord.update_commands {
        let definitions = dispatcher.definitions();
        registrar.sync_commands(&definitions).await.map_err(BootstrapError::CommandSync)?;
        info!(
            event_name = "system.bootstrap.commands_synced",
            correlation_id = "bootstrap",
            command_count = definitions.len(),
            "slash command registrations synced"
        );
    }

    let handler_count = dispatcher.handler_count();
    let gateway_runner = GatewayRunner::new(transport, dispatcher, ReconnectPolicy::default());
    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        handler_count,
        channel_retention = config.cache.channel_retention,
        "application bootstrap complete"
    );

    Ok(Application { config, cache, gateway_runner })
}
