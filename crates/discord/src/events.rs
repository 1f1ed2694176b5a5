use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use dicey_core::protocol::matches_command;
use dicey_core::{ApplicationError, ChannelId, InterfaceError, MessageId};

use crate::commands::{SlashCommandPayload, SlashDefinition};
use crate::components::{ComponentRow, EmbedTemplate, MessageTemplate};

/// Button click as it leaves the transport. `button_rows` carries the
/// clicked message's full component layout so handlers can read the
/// configuration back out of the custom ids.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComponentEvent {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub custom_id: String,
    pub message_content: String,
    pub button_rows: Vec<ComponentRow>,
    pub invoking_user: String,
    pub pinned: bool,
    pub request_id: String,
}

impl ComponentEvent {
    /// Custom ids of every button on the clicked message, row by row.
    pub fn button_ids(&self) -> impl Iterator<Item = &str> {
        self.button_rows
            .iter()
            .flat_map(|row| row.components.iter())
            .map(|button| button.custom_id.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

/// Initial interaction response delivered through the gateway ack.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InteractionReply {
    pub content: String,
    pub embed: Option<EmbedTemplate>,
    pub ephemeral: bool,
}

impl InteractionReply {
    pub fn ephemeral_text(content: impl Into<String>) -> Self {
        Self { content: content.into(), embed: None, ephemeral: true }
    }

    pub fn ephemeral_embed(embed: EmbedTemplate) -> Self {
        Self { content: String::new(), embed: Some(embed), ephemeral: true }
    }

    pub fn public_embed(embed: EmbedTemplate) -> Self {
        Self { content: String::new(), embed: Some(embed), ephemeral: false }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(InteractionReply),
    Processed,
    Ignored,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("message edit failed: {0}")]
    Edit(String),
    #[error("message post failed: {0}")]
    Post(String),
    #[error("message delete failed: {0}")]
    Delete(String),
}

impl From<MessengerError> for ApplicationError {
    fn from(error: MessengerError) -> Self {
        ApplicationError::Transport(error.to_string())
    }
}

/// Channel-side REST surface the handlers drive. Everything a family does
/// to a channel goes through these four calls.
#[async_trait]
pub trait ChannelMessenger: Send + Sync {
    async fn edit_message(
        &self,
        channel: ChannelId,
        message: MessageId,
        content: String,
    ) -> Result<(), MessengerError>;

    async fn post_answer(
        &self,
        channel: ChannelId,
        reference: Option<MessageId>,
        embed: EmbedTemplate,
    ) -> Result<(), MessengerError>;

    async fn post_buttons(
        &self,
        channel: ChannelId,
        template: MessageTemplate,
    ) -> Result<MessageId, MessengerError>;

    async fn delete_message(
        &self,
        channel: ChannelId,
        message: MessageId,
    ) -> Result<(), MessengerError>;
}

#[derive(Default)]
pub struct NoopChannelMessenger;

#[async_trait]
impl ChannelMessenger for NoopChannelMessenger {
    async fn edit_message(
        &self,
        _channel: ChannelId,
        _message: MessageId,
        _content: String,
    ) -> Result<(), MessengerError> {
        Ok(())
    }

    async fn post_answer(
        &self,
        _channel: ChannelId,
        _reference: Option<MessageId>,
        _embed: EmbedTemplate,
    ) -> Result<(), MessengerError> {
        Ok(())
    }

    async fn post_buttons(
        &self,
        _channel: ChannelId,
        _template: MessageTemplate,
    ) -> Result<MessageId, MessengerError> {
        Ok(MessageId(0))
    }

    async fn delete_message(
        &self,
        _channel: ChannelId,
        _message: MessageId,
    ) -> Result<(), MessengerError> {
        Ok(())
    }
}

#[async_trait]
pub trait SlashHandler: Send + Sync {
    fn command_name(&self) -> &'static str;
    fn definition(&self) -> SlashDefinition;
    async fn handle_slash(
        &self,
        payload: &SlashCommandPayload,
        ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError>;
}

#[async_trait]
pub trait ComponentHandler: Send + Sync {
    fn command_name(&self) -> &'static str;
    async fn handle_component(
        &self,
        event: &ComponentEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError>;
}

/// Routes slash interactions by command name and component interactions by
/// custom id prefix. Unrouted interactions are ignored, not failed.
#[derive(Default)]
pub struct InteractionDispatcher {
    slash: HashMap<&'static str, Arc<dyn SlashHandler>>,
    components: HashMap<&'static str, Arc<dyn ComponentHandler>>,
}

impl InteractionDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_slash(&mut self, handler: Arc<dyn SlashHandler>) {
        self.slash.insert(handler.command_name(), handler);
    }

    pub fn register_component(&mut self, handler: Arc<dyn ComponentHandler>) {
        self.components.insert(handler.command_name(), handler);
    }

    pub async fn dispatch_slash(
        &self,
        payload: &SlashCommandPayload,
        ctx: &EventContext,
    ) -> Result<HandlerResult, InterfaceError> {
        let Some(handler) = self.slash.get(payload.command.as_str()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler
            .handle_slash(payload, ctx)
            .await
            .map_err(|error| error.into_interface(ctx.correlation_id.clone()))
    }

    pub async fn dispatch_component(
        &self,
        event: &ComponentEvent,
        ctx: &EventContext,
    ) -> Result<HandlerResult, InterfaceError> {
        let handler = self
            .components
            .iter()
            .find(|(name, _)| matches_command(&event.custom_id, name))
            .map(|(_, handler)| handler);
        let Some(handler) = handler else {
            return Ok(HandlerResult::Ignored);
        };

        handler
            .handle_component(event, ctx)
            .await
            .map_err(|error| error.into_interface(ctx.correlation_id.clone()))
    }

    /// Sorted registration schemas for the command sync pass.
    pub fn definitions(&self) -> Vec<SlashDefinition> {
        let mut definitions: Vec<SlashDefinition> =
            self.slash.values().map(|handler| handler.definition()).collect();
        definitions.sort_by(|left, right| left.name.cmp(&right.name));
        definitions
    }

    pub fn handler_count(&self) -> usize {
        self.slash.len() + self.components.len()
    }
}
