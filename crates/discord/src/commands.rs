use std::collections::HashMap;

use serde::Serialize;
use thiserror::Error;

use dicey_core::ChannelId;

/// Normalized slash interaction as it leaves the transport. `options`
/// carries the raw option tree; subcommands nest their own options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlashCommandPayload {
    pub command: String,
    pub options: Vec<CommandOption>,
    pub channel_id: ChannelId,
    pub user_id: String,
    pub request_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOption {
    pub name: String,
    pub value: OptionValue,
}

impl CommandOption {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: OptionValue::String(value.into()) }
    }

    pub fn integer(name: impl Into<String>, value: i64) -> Self {
        Self { name: name.into(), value: OptionValue::Integer(value) }
    }

    pub fn sub_command(name: impl Into<String>, options: Vec<CommandOption>) -> Self {
        Self { name: name.into(), value: OptionValue::SubCommand(options) }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    String(String),
    Integer(i64),
    SubCommand(Vec<CommandOption>),
}

/// Name-keyed view over a `start` subcommand's options.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StartOptions {
    values: HashMap<String, OptionValue>,
}

impl StartOptions {
    pub fn from_options(options: &[CommandOption]) -> Self {
        Self {
            values: options
                .iter()
                .map(|option| (option.name.clone(), option.value.clone()))
                .collect(),
        }
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.values.get(name) {
            Some(OptionValue::String(value)) => Some(value),
            _ => None,
        }
    }

    pub fn integer(&self, name: &str) -> Option<i64> {
        match self.values.get(name) {
            Some(OptionValue::Integer(value)) => Some(*value),
            _ => None,
        }
    }

    pub fn integer_or(&self, name: &str, default: i64) -> i64 {
        self.integer(name).unwrap_or(default)
    }

    pub fn string_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.string(name).unwrap_or(default)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlashAction {
    Start(StartOptions),
    Clear,
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("missing subcommand for `/{command}`")]
    MissingSubcommand { command: String },
    #[error("unsupported subcommand `{subcommand}` for `/{command}`")]
    UnsupportedSubcommand { command: String, subcommand: String },
}

/// Resolves the first option of a family command into its action. Every
/// button family exposes the same `start`/`clear`/`help` surface.
pub fn classify_action(payload: &SlashCommandPayload) -> Result<SlashAction, CommandParseError> {
    let Some(first) = payload.options.first() else {
        return Err(CommandParseError::MissingSubcommand { command: payload.command.clone() });
    };

    match first.name.as_str() {
        "start" => {
            let options = match &first.value {
                OptionValue::SubCommand(options) => StartOptions::from_options(options),
                _ => StartOptions::default(),
            };
            Ok(SlashAction::Start(options))
        }
        "clear" => Ok(SlashAction::Clear),
        "help" => Ok(SlashAction::Help),
        other => Err(CommandParseError::UnsupportedSubcommand {
            command: payload.command.clone(),
            subcommand: other.to_owned(),
        }),
    }
}

/// Registration schema pushed to the platform on startup when command
/// syncing is enabled.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SlashDefinition {
    pub name: String,
    pub description: String,
    pub options: Vec<OptionDefinition>,
}

impl SlashDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self { name: name.into(), description: description.into(), options: Vec::new() }
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    SubCommand,
    String,
    Integer,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OptionDefinition {
    pub name: String,
    pub description: String,
    pub kind: OptionKind,
    pub required: bool,
    pub choices: Vec<String>,
    pub options: Vec<OptionDefinition>,
}

impl OptionDefinition {
    fn new(name: impl Into<String>, description: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind,
            required: false,
            choices: Vec::new(),
            options: Vec::new(),
        }
    }

    pub fn sub_command(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, OptionKind::SubCommand)
    }

    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, OptionKind::String)
    }

    pub fn integer(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(name, description, OptionKind::Integer)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn choice(mut self, value: impl Into<String>) -> Self {
        self.choices.push(value.into());
        self
    }

    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }
}
