use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use dicey_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;
use serde::Serialize;
use toml::Value;

#[derive(Debug, Serialize)]
struct ConfigEntry {
    key: &'static str,
    value: String,
    source: String,
}

pub fn run(json_output: bool) -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            if json_output {
                return serde_json::json!({
                    "status": "error",
                    "message": format!("config validation failed: {error}"),
                })
                .to_string();
            }
            return format!("config validation failed: {error}");
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());
    let source = |key_path: &str, env_keys: &[&str]| {
        field_source(key_path, env_keys, config_file_doc.as_ref(), config_file_path.as_deref())
    };

    let entries = vec![
        ConfigEntry {
            key: "discord.token",
            value: redact_token(config.discord.token.expose_secret()),
            source: source("discord.token", &["DICEY_DISCORD_TOKEN", "DISCORD_TOKEN"]),
        },
        ConfigEntry {
            key: "discord.update_commands",
            value: config.discord.update_commands.to_string(),
            source: source("discord.update_commands", &["DICEY_UPDATE_COMMANDS"]),
        },
        ConfigEntry {
            key: "cache.channel_retention",
            value: config.cache.channel_retention.to_string(),
            source: source("cache.channel_retention", &["DICEY_CACHE_RETENTION"]),
        },
        ConfigEntry {
            key: "server.host",
            value: config.server.host.clone(),
            source: source("server.host", &["DICEY_SERVER_HOST"]),
        },
        ConfigEntry {
            key: "server.port",
            value: config.server.port.to_string(),
            source: source("server.port", &["DICEY_SERVER_PORT"]),
        },
        ConfigEntry {
            key: "logging.level",
            value: config.logging.level.clone(),
            source: source("logging.level", &["DICEY_LOG_LEVEL"]),
        },
        ConfigEntry {
            key: "logging.format",
            value: format!("{:?}", config.logging.format),
            source: source("logging.format", &["DICEY_LOG_FORMAT"]),
        },
    ];

    if json_output {
        return serde_json::to_string_pretty(&entries)
            .unwrap_or_else(|error| format!("config serialization failed: {error}"));
    }

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for entry in &entries {
        lines.push(format!("- {} = {} (source: {})", entry.key, entry.value, entry.source));
    }
    lines.join("\n")
}

fn detect_config_path() -> Option<PathBuf> {
    let root = PathBuf::from("dicey.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/dicey.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    for env_key in env_keys {
        if env::var_os(env_key).is_some() {
            return format!("env ({env_key})");
        }
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn redact_token(token: &str) -> String {
    if token.trim().is_empty() {
        "<empty>".to_string()
    } else {
        "<redacted>".to_string()
    }
}
