use std::sync::Arc;

use dicey_core::cache::ActiveMessageCache;
use dicey_core::config::{AppConfig, LoadOptions};
use dicey_discord::events::NoopChannelMessenger;
use dicey_discord::families::dispatcher_with;

use crate::commands::CommandResult;

/// Startup preflight: loads the config and assembles the full dispatcher
/// the way the server does, without opening a gateway connection.
pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure("start", "config_validation", error.to_string(), 2);
        }
    };

    let cache = Arc::new(ActiveMessageCache::new(config.cache.channel_retention));
    let dispatcher = dispatcher_with(Arc::clone(&cache), Arc::new(NoopChannelMessenger));
    let command_count = dispatcher.definitions().len();
    let handler_count = dispatcher.handler_count();

    CommandResult::success(
        "start",
        format!(
            "startup preflight passed: {command_count} slash commands across {handler_count} \
             handlers, cache retention {}. Launch dicey-server to open the gateway.",
            config.cache.channel_retention
        ),
    )
}
