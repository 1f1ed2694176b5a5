use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use dicey_core::{ChannelId, CustomId, InterfaceError};

use crate::commands::{SlashCommandPayload, SlashDefinition};
use crate::events::{
    ComponentEvent, EventContext, HandlerResult, InteractionDispatcher, InteractionReply,
};
use crate::families::default_dispatcher;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Interface(#[from] InterfaceError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GatewayEnvelope {
    pub envelope_id: String,
    pub event: GatewayEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GatewayEvent {
    SlashCommand(SlashCommandPayload),
    Component(ComponentEvent),
    Unsupported { event_type: String },
}

impl GatewayEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SlashCommand(_) => "slash_command",
            Self::Component(_) => "component",
            Self::Unsupported { .. } => "unsupported",
        }
    }
}

/// Connection to the platform. Acknowledging an interaction delivers its
/// initial response, so the reply travels with the ack.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<GatewayEnvelope>, TransportError>;
    async fn acknowledge(
        &self,
        envelope_id: &str,
        reply: Option<&InteractionReply>,
    ) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopGatewayTransport;

#[async_trait]
impl GatewayTransport for NoopGatewayTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<GatewayEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(
        &self,
        _envelope_id: &str,
        _reply: Option<&InteractionReply>,
    ) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Pushes the slash command schemas to the platform on startup.
#[async_trait]
pub trait CommandRegistrar: Send + Sync {
    async fn sync_commands(&self, definitions: &[SlashDefinition]) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopCommandRegistrar;

#[async_trait]
impl CommandRegistrar for NoopCommandRegistrar {
    async fn sync_commands(&self, _definitions: &[SlashDefinition]) -> Result<(), TransportError> {
        Ok(())
    }
}

pub struct GatewayRunner {
    transport: Arc<dyn GatewayTransport>,
    dispatcher: InteractionDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl Default for GatewayRunner {
    fn default() -> Self {
        Self {
            transport: Arc::new(NoopGatewayTransport),
            dispatcher: default_dispatcher(),
            reconnect_policy: ReconnectPolicy::default(),
        }
    }
}

impl GatewayRunner {
    pub fn new(
        transport: Arc<dyn GatewayTransport>,
        dispatcher: InteractionDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    pub async fn start(&self) -> Result<()> {
        for attempt in 0..=self.reconnect_policy.max_retries {
            match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(transport_error) => {
                    warn!(
                        attempt,
                        max_retries = self.reconnect_policy.max_retries,
                        error = %transport_error,
                        "gateway transport failed"
                    );

                    if attempt >= self.reconnect_policy.max_retries {
                        warn!(
                            max_retries = self.reconnect_policy.max_retries,
                            "gateway retries exhausted; continuing process without crash"
                        );
                        return Ok(());
                    }

                    let delay = self.reconnect_policy.backoff(attempt);
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
            }
        }

        Ok(())
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), TransportError> {
        info!(attempt, "opening gateway connection");
        self.transport.connect().await?;
        info!(attempt, "gateway connected");

        loop {
            let Some(envelope) = self.transport.next_envelope().await? else {
                info!(attempt, "gateway stream closed");
                self.transport.disconnect().await?;
                return Ok(());
            };
            let (command, channel_id) = correlation_fields(&envelope);

            info!(
                event_name = "ingress.discord.envelope_received",
                envelope_id = %envelope.envelope_id,
                event_type = envelope.event.event_type(),
                correlation_id = %envelope.envelope_id,
                command = command.as_deref().unwrap_or("unknown"),
                channel_id = channel_id.map(|id| id.0).unwrap_or_default(),
                "received gateway envelope"
            );

            let context = EventContext { correlation_id: envelope.envelope_id.clone() };
            let reply = match self.dispatch(&envelope, &context).await {
                Ok(HandlerResult::Responded(reply)) => Some(reply),
                Ok(HandlerResult::Processed) | Ok(HandlerResult::Ignored) => None,
                Err(error) => {
                    warn!(
                        envelope_id = %envelope.envelope_id,
                        correlation_id = %error.correlation_id(),
                        command = command.as_deref().unwrap_or("unknown"),
                        error = %error,
                        "interaction dispatch failed; answering with guidance"
                    );
                    Some(InteractionReply::ephemeral_text(error.user_message()))
                }
            };

            if let Err(error) =
                self.transport.acknowledge(&envelope.envelope_id, reply.as_ref()).await
            {
                warn!(
                    event_name = "ingress.discord.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    error = %error,
                    "failed to acknowledge gateway envelope"
                );
            } else {
                debug!(
                    event_name = "ingress.discord.ack_sent",
                    envelope_id = %envelope.envelope_id,
                    correlation_id = %envelope.envelope_id,
                    "acknowledged gateway envelope"
                );
            }
        }
    }

    async fn dispatch(
        &self,
        envelope: &GatewayEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, InterfaceError> {
        match &envelope.event {
            GatewayEvent::SlashCommand(payload) => {
                self.dispatcher.dispatch_slash(payload, ctx).await
            }
            GatewayEvent::Component(event) => self.dispatcher.dispatch_component(event, ctx).await,
            GatewayEvent::Unsupported { event_type } => {
                debug!(event_type, "ignoring unsupported gateway event");
                Ok(HandlerResult::Ignored)
            }
        }
    }
}

fn correlation_fields(envelope: &GatewayEnvelope) -> (Option<String>, Option<ChannelId>) {
    match &envelope.event {
        GatewayEvent::SlashCommand(payload) => {
            (Some(payload.command.clone()), Some(payload.channel_id))
        }
        GatewayEvent::Component(event) => {
            (CustomId::parse(&event.custom_id).map(|id| id.command), Some(event.channel_id))
        }
        GatewayEvent::Unsupported { .. } => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use dicey_core::{ApplicationError, ChannelId, DomainError, MessageId};

    use super::{
        GatewayEnvelope, GatewayEvent, GatewayRunner, GatewayTransport, ReconnectPolicy,
        TransportError,
    };
    use crate::commands::{SlashCommandPayload, SlashDefinition};
    use crate::events::{
        ComponentEvent, EventContext, HandlerResult, InteractionDispatcher, InteractionReply,
        SlashHandler,
    };

    #[derive(Default)]
    struct ScriptedTransport {
        state: Mutex<ScriptedState>,
    }

    #[derive(Default)]
    struct ScriptedState {
        connect_results: VecDeque<Result<(), TransportError>>,
        envelopes: VecDeque<Result<Option<GatewayEnvelope>, TransportError>>,
        connect_attempts: usize,
        acknowledgements: Vec<(String, Option<InteractionReply>)>,
        disconnect_calls: usize,
    }

    impl ScriptedTransport {
        fn with_script(
            connect_results: Vec<Result<(), TransportError>>,
            envelopes: Vec<Result<Option<GatewayEnvelope>, TransportError>>,
        ) -> Self {
            Self {
                state: Mutex::new(ScriptedState {
                    connect_results: connect_results.into(),
                    envelopes: envelopes.into(),
                    connect_attempts: 0,
                    acknowledgements: Vec::new(),
                    disconnect_calls: 0,
                }),
            }
        }

        async fn connect_attempts(&self) -> usize {
            self.state.lock().await.connect_attempts
        }

        async fn acknowledgements(&self) -> Vec<(String, Option<InteractionReply>)> {
            self.state.lock().await.acknowledgements.clone()
        }
    }

    #[async_trait]
    impl GatewayTransport for ScriptedTransport {
        async fn connect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.connect_attempts += 1;
            state.connect_results.pop_front().unwrap_or(Ok(()))
        }

        async fn next_envelope(&self) -> Result<Option<GatewayEnvelope>, TransportError> {
            let mut state = self.state.lock().await;
            state.envelopes.pop_front().unwrap_or(Ok(None))
        }

        async fn acknowledge(
            &self,
            envelope_id: &str,
            reply: Option<&InteractionReply>,
        ) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.acknowledgements.push((envelope_id.to_owned(), reply.cloned()));
            Ok(())
        }

        async fn disconnect(&self) -> Result<(), TransportError> {
            let mut state = self.state.lock().await;
            state.disconnect_calls += 1;
            Ok(())
        }
    }

    struct StubSlash {
        fail: bool,
    }

    #[async_trait]
    impl SlashHandler for StubSlash {
        fn command_name(&self) -> &'static str {
            "fate"
        }

        fn definition(&self) -> SlashDefinition {
            SlashDefinition::new("fate", "stub")
        }

        async fn handle_slash(
            &self,
            _payload: &SlashCommandPayload,
            _ctx: &EventContext,
        ) -> Result<HandlerResult, ApplicationError> {
            if self.fail {
                return Err(ApplicationError::Domain(DomainError::InvalidExpression {
                    message: "expression is empty".to_owned(),
                }));
            }
            Ok(HandlerResult::Responded(InteractionReply::ephemeral_text("rolled")))
        }
    }

    fn slash_envelope(envelope_id: &str) -> GatewayEnvelope {
        GatewayEnvelope {
            envelope_id: envelope_id.to_owned(),
            event: GatewayEvent::SlashCommand(SlashCommandPayload {
                command: "fate".to_owned(),
                options: Vec::new(),
                channel_id: ChannelId(1),
                user_id: "user-1".to_owned(),
                request_id: envelope_id.to_owned(),
            }),
        }
    }

    #[tokio::test]
    async fn reconnects_after_initial_connect_failure() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Err(TransportError::Connect("network down".to_owned())), Ok(())],
            vec![
                Ok(Some(GatewayEnvelope {
                    envelope_id: "env-1".to_owned(),
                    event: GatewayEvent::Unsupported { event_type: "typing".to_owned() },
                })),
                Ok(None),
            ],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            InteractionDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should not fail");

        assert_eq!(transport.connect_attempts().await, 2);
        let acks = transport.acknowledgements().await;
        assert_eq!(acks, vec![("env-1".to_owned(), None)]);
    }

    #[tokio::test]
    async fn exhausts_retries_without_crashing() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![
                Err(TransportError::Connect("fail-1".to_owned())),
                Err(TransportError::Connect("fail-2".to_owned())),
                Err(TransportError::Connect("fail-3".to_owned())),
            ],
            vec![],
        ));

        let runner = GatewayRunner::new(
            transport.clone(),
            InteractionDispatcher::default(),
            ReconnectPolicy { max_retries: 2, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner should degrade gracefully");
        assert_eq!(transport.connect_attempts().await, 3);
    }

    #[tokio::test]
    async fn acknowledgement_carries_the_handler_reply() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![Ok(Some(slash_envelope("env-2"))), Ok(None)],
        ));
        let mut dispatcher = InteractionDispatcher::new();
        dispatcher.register_slash(Arc::new(StubSlash { fail: false }));

        let runner = GatewayRunner::new(
            transport.clone(),
            dispatcher,
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner");

        let acks = transport.acknowledgements().await;
        assert_eq!(acks.len(), 1);
        let reply = acks[0].1.as_ref().expect("reply should ride on the ack");
        assert_eq!(reply.content, "rolled");
        assert!(reply.ephemeral);
    }

    #[tokio::test]
    async fn dispatch_failures_answer_with_the_user_facing_message() {
        let transport = Arc::new(ScriptedTransport::with_script(
            vec![Ok(())],
            vec![Ok(Some(slash_envelope("env-3"))), Ok(None)],
        ));
        let mut dispatcher = InteractionDispatcher::new();
        dispatcher.register_slash(Arc::new(StubSlash { fail: true }));

        let runner = GatewayRunner::new(
            transport.clone(),
            dispatcher,
            ReconnectPolicy { max_retries: 0, base_delay_ms: 0, max_delay_ms: 0 },
        );

        runner.start().await.expect("runner");

        let acks = transport.acknowledgements().await;
        let reply = acks[0].1.as_ref().expect("failure should still answer the interaction");
        assert!(reply.ephemeral);
        assert!(reply.content.contains("expression is empty"));
    }

    #[test]
    fn extracts_command_and_channel_correlation_fields() {
        let envelope = GatewayEnvelope {
            envelope_id: "env-4".to_owned(),
            event: GatewayEvent::Component(ComponentEvent {
                channel_id: ChannelId(9),
                message_id: MessageId(4),
                custom_id: "fate,roll,simple".to_owned(),
                message_content: String::new(),
                button_rows: Vec::new(),
                invoking_user: "user-1".to_owned(),
                pinned: false,
                request_id: "req-4".to_owned(),
            }),
        };

        let (command, channel_id) = super::correlation_fields(&envelope);
        assert_eq!(command.as_deref(), Some("fate"));
        assert_eq!(channel_id, Some(ChannelId(9)));
    }
}
