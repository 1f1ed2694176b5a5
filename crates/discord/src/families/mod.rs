//! Button command families. Each family describes one slash command with a
//! button message attached to it: how the button set is configured, how a
//! click is turned back into config and state, and what gets rolled. The
//! shared [`FamilyHandler`] owns the channel choreography so the families
//! themselves stay pure functions over config and state.

use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use dicey_core::cache::{ActiveMessageCache, ChannelId, MessageId};
use dicey_core::engine::{validate, validate_list, RandomSource, RollAnswer, ThreadRngSource};
use dicey_core::errors::{ApplicationError, DomainError};
use dicey_core::protocol::{ConfigFingerprint, CONFIG_DELIMITER};

use crate::commands::{
    classify_action, OptionDefinition, SlashAction, SlashCommandPayload, SlashDefinition,
    StartOptions,
};
use crate::components::{
    answer_embed, ButtonComponent, ComponentRow, EmbedTemplate, MessageTemplate,
};
use crate::events::{
    ChannelMessenger, ComponentEvent, ComponentHandler, EventContext, HandlerResult,
    InteractionDispatcher, InteractionReply, NoopChannelMessenger, SlashHandler,
};

pub mod count_successes;
pub mod custom_dice;
pub mod direct_roll;
pub mod fate;
pub mod help;
pub mod hold_reroll;
pub mod sum_custom_set;
pub mod sum_dice_set;

pub use count_successes::CountSuccessesFamily;
pub use custom_dice::CustomDiceFamily;
pub use direct_roll::DirectRollHandler;
pub use fate::FateFamily;
pub use help::HelpHandler;
pub use hold_reroll::HoldRerollFamily;
pub use sum_custom_set::SumCustomSetFamily;
pub use sum_dice_set::SumDiceSetFamily;

/// Separates a dice expression from its button label in start options.
pub const LABEL_DELIMITER: char = '@';
/// Families with configurable buttons accept at most this many entries.
pub const MAX_BUTTON_OPTIONS: usize = 22;
/// Expressions and labels are capped so the encoded custom id stays under
/// the interaction ceiling.
pub(crate) const BUTTON_VALUE_LIMIT: usize = 80;

/// User-facing syntax summary, shared by every help embed that accepts
/// free dice expressions.
pub(crate) const EXPRESSION_HELP: &str = "'3d6' rolls three six sided dice and sums them, \
'd20' is short for '1d20' and '4dF' rolls four fate dice. Combine terms with '+' and '-', \
e.g. '2d6+1d4-2'. '6d6>=5' counts the dice showing 5 or more, '6d6=6' counts the sixes. \
'[1d20]!!' explodes, every die that shows its maximum rolls again. '3x[2d6+1]' repeats the \
expression three times (at most 25). Append '@Label' to name the roll, e.g. '2d20@Attack'. \
Dice can have up to 1000 sides.";

/// One slash command family. `Config` is everything needed to rebuild the
/// button set, `State` is what a single click contributes. Both are
/// reconstructed on every interaction; nothing is kept between events.
pub trait CommandFamily: Send + Sync + 'static {
    const NAME: &'static str;
    type Config: Send + Sync;
    type State: Send + Sync;

    fn definition() -> SlashDefinition;
    fn help() -> EmbedTemplate;

    /// User-facing objection to the start options, checked before any
    /// message is posted.
    fn validate_start(&self, options: &StartOptions) -> Option<String> {
        let _ = options;
        None
    }

    fn config_from_start(&self, options: &StartOptions) -> Result<Self::Config, DomainError>;
    fn config_from_event(&self, event: &ComponentEvent) -> Result<Self::Config, DomainError>;

    /// Rebuilds the click state. Families that roll during reconstruction
    /// (fresh dice, re-rolls) draw from `random` here.
    fn state_from_event(
        &self,
        event: &ComponentEvent,
        random: &mut dyn RandomSource,
    ) -> Result<Self::State, DomainError>;

    /// Button rows for a fresh message. `state` is present after a click
    /// and absent on `/NAME start`.
    fn layout(
        &self,
        config: &Self::Config,
        state: Option<&Self::State>,
    ) -> Result<Vec<ComponentRow>, DomainError>;

    /// The roll result for this click, if the click produces one.
    fn answer(
        &self,
        state: &Self::State,
        config: &Self::Config,
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError>;

    /// Content of a fresh button message posted by `/NAME start`.
    fn prompt(&self, config: &Self::Config) -> String;

    /// Content of a fresh button message posted after a click. Defaults to
    /// the start prompt.
    fn prompt_with_state(&self, state: &Self::State, config: &Self::Config) -> String {
        let _ = state;
        self.prompt(config)
    }

    /// New content for the clicked message itself, or `None` to leave it
    /// untouched.
    fn prompt_after_click(&self, state: &Self::State, config: &Self::Config) -> Option<String> {
        let _ = (state, config);
        None
    }

    /// Whether this click is followed by a fresh button message. The old
    /// one is then superseded through the cache.
    fn posts_new_buttons(&self, state: &Self::State, config: &Self::Config) -> bool {
        let _ = (state, config);
        true
    }

    /// Canonical config fields, fingerprinted to detect equivalent button
    /// messages in the same channel.
    fn config_fields(&self, config: &Self::Config) -> Vec<String>;
}

/// Drives one [`CommandFamily`] against the channel: posts and supersedes
/// button messages, edits clicked ones and publishes answers. Registered
/// with the dispatcher as both slash and component handler.
pub struct FamilyHandler<F: CommandFamily> {
    family: F,
    cache: Arc<ActiveMessageCache>,
    messenger: Arc<dyn ChannelMessenger>,
    random: Mutex<Box<dyn RandomSource + Send>>,
}

impl<F: CommandFamily> FamilyHandler<F> {
    pub fn new(
        family: F,
        cache: Arc<ActiveMessageCache>,
        messenger: Arc<dyn ChannelMessenger>,
    ) -> Self {
        Self { family, cache, messenger, random: Mutex::new(Box::new(ThreadRngSource)) }
    }

    /// Swaps the random source, used by tests to script rolls.
    pub fn with_random(mut self, random: Box<dyn RandomSource + Send>) -> Self {
        self.random = Mutex::new(random);
        self
    }

    fn lock_random(&self) -> MutexGuard<'_, Box<dyn RandomSource + Send>> {
        match self.random.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn fingerprint(&self, config: &F::Config) -> ConfigFingerprint {
        let mut fields = vec![F::NAME.to_owned()];
        fields.extend(self.family.config_fields(config));
        ConfigFingerprint::of_fields(&fields)
    }

    /// Deletion is cleanup; a message already gone is not an error.
    async fn delete_all(&self, channel: ChannelId, stale: &[MessageId]) {
        for message in stale {
            if let Err(error) = self.messenger.delete_message(channel, *message).await {
                let event = format!("command.{}.delete_failed", F::NAME);
                debug!(
                    event_name = %event,
                    channel_id = channel.0,
                    message_id = message.0,
                    error = %error,
                );
            }
        }
    }

    async fn start(
        &self,
        payload: &SlashCommandPayload,
        options: &StartOptions,
    ) -> Result<HandlerResult, ApplicationError> {
        if let Some(message) = self.family.validate_start(options) {
            return Ok(HandlerResult::Responded(InteractionReply::ephemeral_text(message)));
        }
        let config = self.family.config_from_start(options)?;
        let rows = self.family.layout(&config, None)?;
        let template = MessageTemplate::with_rows(self.family.prompt(&config), rows);
        let posted = self.messenger.post_buttons(payload.channel_id, template).await?;
        let event = format!("command.{}.start", F::NAME);
        info!(
            event_name = %event,
            command = F::NAME,
            channel_id = payload.channel_id.0,
            message_id = posted.0,
        );
        let stale =
            self.cache.record_message(payload.channel_id, posted, self.fingerprint(&config), false);
        self.delete_all(payload.channel_id, &stale).await;
        Ok(HandlerResult::Processed)
    }

    async fn clear(&self, channel: ChannelId) -> Result<HandlerResult, ApplicationError> {
        let stale = self.cache.clear_channel(channel);
        let event = format!("command.{}.clear", F::NAME);
        info!(
            event_name = %event,
            command = F::NAME,
            channel_id = channel.0,
            removed = stale.len(),
        );
        self.delete_all(channel, &stale).await;
        Ok(HandlerResult::Processed)
    }
}

#[async_trait]
impl<F: CommandFamily> SlashHandler for FamilyHandler<F> {
    fn command_name(&self) -> &'static str {
        F::NAME
    }

    fn definition(&self) -> SlashDefinition {
        F::definition()
    }

    async fn handle_slash(
        &self,
        payload: &SlashCommandPayload,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError> {
        let action = match classify_action(payload) {
            Ok(action) => action,
            Err(error) => {
                return Ok(HandlerResult::Responded(InteractionReply::ephemeral_text(
                    format!("{error}. Try `/{} help`.", F::NAME),
                )));
            }
        };
        match action {
            SlashAction::Start(options) => self.start(payload, &options).await,
            SlashAction::Clear => self.clear(payload.channel_id).await,
            SlashAction::Help => {
                Ok(HandlerResult::Responded(InteractionReply::ephemeral_embed(F::help())))
            }
        }
    }
}

#[async_trait]
impl<F: CommandFamily> ComponentHandler for FamilyHandler<F> {
    fn command_name(&self) -> &'static str {
        F::NAME
    }

    async fn handle_component(
        &self,
        event: &ComponentEvent,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError> {
        let config = self.family.config_from_event(event)?;
        let (state, answer) = {
            let mut random = self.lock_random();
            let state = self.family.state_from_event(event, &mut **random)?;
            let answer = self.family.answer(&state, &config, &mut **random)?;
            (state, answer)
        };

        if let Some(content) = self.family.prompt_after_click(&state, &config) {
            self.messenger.edit_message(event.channel_id, event.message_id, content).await?;
        }
        if let Some(answer) = &answer {
            let event_name = format!("command.{}.roll", F::NAME);
            debug!(
                event_name = %event_name,
                command = F::NAME,
                channel_id = event.channel_id.0,
                title = %answer.title,
            );
            self.messenger
                .post_answer(event.channel_id, Some(event.message_id), answer_embed(answer))
                .await?;
        }
        if self.family.posts_new_buttons(&state, &config) {
            let rows = self.family.layout(&config, Some(&state))?;
            let template =
                MessageTemplate::with_rows(self.family.prompt_with_state(&state, &config), rows);
            let posted = self.messenger.post_buttons(event.channel_id, template).await?;
            let fingerprint = self.fingerprint(&config);
            let mut stale = self.cache.record_message(
                event.channel_id,
                event.message_id,
                fingerprint,
                event.pinned,
            );
            stale.extend(self.cache.record_message(event.channel_id, posted, fingerprint, false));
            self.delete_all(event.channel_id, &stale).await;
        }
        Ok(HandlerResult::Processed)
    }
}

/// A dice expression behind one button, with the label shown on it. The
/// label falls back to the expression itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ButtonEntry {
    pub expression: String,
    pub label: String,
}

pub(crate) fn button_option_names() -> impl Iterator<Item = String> {
    (1..=MAX_BUTTON_OPTIONS).map(|index| format!("{index}_button"))
}

/// Parses one `expr[@Label]` start option. Entries that cannot survive the
/// custom id round trip are dropped rather than failed.
pub(crate) fn parse_entry(raw: &str, normalize_sign: bool) -> Option<ButtonEntry> {
    if raw.contains(CONFIG_DELIMITER) {
        return None;
    }
    let (expression, label) = match raw.split_once(LABEL_DELIMITER) {
        Some((expression, label)) => {
            if label.contains(LABEL_DELIMITER) {
                return None;
            }
            (expression.trim(), Some(label.trim()))
        }
        None => (raw.trim(), None),
    };
    let mut expression = expression.to_owned();
    if normalize_sign && !expression.is_empty() && !expression.starts_with(['+', '-']) {
        expression.insert(0, '+');
    }
    let label = label.map_or_else(|| expression.clone(), str::to_owned);
    if expression.is_empty() || label.is_empty() {
        return None;
    }
    if expression.len() > BUTTON_VALUE_LIMIT || label.len() > BUTTON_VALUE_LIMIT {
        return None;
    }
    if validate(&expression).is_some() {
        return None;
    }
    Some(ButtonEntry { expression, label })
}

/// Collects the `1_button..22_button` start options in order, parsed and
/// de-duplicated.
pub(crate) fn button_entries(options: &StartOptions, normalize_sign: bool) -> Vec<ButtonEntry> {
    let mut entries: Vec<ButtonEntry> = Vec::new();
    for name in button_option_names() {
        let Some(raw) = options.string(&name) else { continue };
        let Some(entry) = parse_entry(raw, normalize_sign) else { continue };
        if !entries.contains(&entry) {
            entries.push(entry);
        }
    }
    entries
}

/// The raw option values in input order, fed to expression validation so
/// the user sees their own spelling in the message.
pub(crate) fn raw_button_values(options: &StartOptions) -> Vec<String> {
    let mut values: Vec<String> = Vec::new();
    for name in button_option_names() {
        if let Some(raw) = options.string(&name) {
            if !values.iter().any(|known| known == raw) {
                values.push(raw.to_owned());
            }
        }
    }
    values
}

/// Runs the engine's labeled-entry validation over all button options.
pub(crate) fn validate_button_options(options: &StartOptions, help_hint: &str) -> Option<String> {
    validate_list(&raw_button_values(options), LABEL_DELIMITER, ',', help_hint)
}

/// Label for an expression when the config gives it one of its own.
pub(crate) fn label_for(entries: &[ButtonEntry], expression: &str) -> Option<String> {
    entries
        .iter()
        .find(|entry| entry.expression == expression && entry.label != entry.expression)
        .map(|entry| entry.label.clone())
}

/// Reads the button set back out of the clicked message's own rows,
/// skipping the control buttons named in `excluded`.
pub(crate) fn entries_from_rows(
    event: &ComponentEvent,
    command: &str,
    excluded: &[&str],
) -> Vec<ButtonEntry> {
    let prefix = format!("{command}{CONFIG_DELIMITER}");
    event
        .button_rows
        .iter()
        .flat_map(|row| row.components.iter())
        .filter_map(|button| {
            let action = button.custom_id.strip_prefix(prefix.as_str())?;
            if excluded.contains(&action) {
                return None;
            }
            Some(ButtonEntry { expression: action.to_owned(), label: button.label.clone() })
        })
        .collect()
}

pub(crate) fn expression_buttons(command: &str, entries: &[ButtonEntry]) -> Vec<ButtonComponent> {
    entries
        .iter()
        .map(|entry| {
            ButtonComponent::new(
                format!("{command}{CONFIG_DELIMITER}{}", entry.expression),
                entry.label.clone(),
            )
        })
        .collect()
}

/// Every button family exposes the same `start`/`clear`/`help` surface.
pub(crate) fn standard_definition(
    name: &str,
    description: &str,
    start_options: Vec<OptionDefinition>,
) -> SlashDefinition {
    let mut start = OptionDefinition::sub_command("start", "Start");
    for option in start_options {
        start = start.option(option);
    }
    SlashDefinition::new(name, description)
        .option(start)
        .option(OptionDefinition::sub_command("clear", "Clear"))
        .option(OptionDefinition::sub_command("help", "Help"))
}

pub(crate) fn expression_option_definitions() -> Vec<OptionDefinition> {
    button_option_names()
        .map(|name| {
            OptionDefinition::string(name, "xdy for a set of x dice with y sides, e.g. '3d6'")
        })
        .collect()
}

/// Dispatcher with every family registered, rolling real dice against the
/// given channel surface.
pub fn dispatcher_with(
    cache: Arc<ActiveMessageCache>,
    messenger: Arc<dyn ChannelMessenger>,
) -> InteractionDispatcher {
    let mut dispatcher = InteractionDispatcher::new();
    register_family(&mut dispatcher, CountSuccessesFamily, &cache, &messenger);
    register_family(&mut dispatcher, CustomDiceFamily, &cache, &messenger);
    register_family(&mut dispatcher, FateFamily, &cache, &messenger);
    register_family(&mut dispatcher, HoldRerollFamily, &cache, &messenger);
    register_family(&mut dispatcher, SumCustomSetFamily::default(), &cache, &messenger);
    register_family(&mut dispatcher, SumDiceSetFamily, &cache, &messenger);
    dispatcher.register_slash(Arc::new(DirectRollHandler::default()));
    dispatcher.register_slash(Arc::new(HelpHandler));
    dispatcher
}

pub fn default_dispatcher() -> InteractionDispatcher {
    dispatcher_with(Arc::new(ActiveMessageCache::default()), Arc::new(NoopChannelMessenger))
}

fn register_family<F: CommandFamily>(
    dispatcher: &mut InteractionDispatcher,
    family: F,
    cache: &Arc<ActiveMessageCache>,
    messenger: &Arc<dyn ChannelMessenger>,
) {
    let handler = Arc::new(FamilyHandler::new(family, Arc::clone(cache), Arc::clone(messenger)));
    dispatcher.register_slash(Arc::clone(&handler) as Arc<dyn SlashHandler>);
    dispatcher.register_component(handler);
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Mutex as StdMutex;

    use super::*;
    use crate::commands::CommandOption;
    use crate::events::MessengerError;
    use dicey_core::cache::{ChannelId, MessageId};

    #[derive(Debug, PartialEq, Eq)]
    enum Call {
        Edit { message: MessageId, content: String },
        Answer { reference: Option<MessageId>, title: String },
        Buttons { message: MessageId, content: String, buttons: usize },
        Delete { message: MessageId },
    }

    #[derive(Default)]
    struct RecordingMessenger {
        calls: StdMutex<Vec<Call>>,
        next_id: AtomicU64,
    }

    impl RecordingMessenger {
        fn calls(&self) -> Vec<Call> {
            std::mem::take(&mut self.calls.lock().unwrap())
        }

        fn record(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl ChannelMessenger for RecordingMessenger {
        async fn edit_message(
            &self,
            _channel: ChannelId,
            message: MessageId,
            content: String,
        ) -> Result<(), MessengerError> {
            self.record(Call::Edit { message, content });
            Ok(())
        }

        async fn post_answer(
            &self,
            _channel: ChannelId,
            reference: Option<MessageId>,
            embed: EmbedTemplate,
        ) -> Result<(), MessengerError> {
            self.record(Call::Answer { reference, title: embed.title });
            Ok(())
        }

        async fn post_buttons(
            &self,
            _channel: ChannelId,
            template: MessageTemplate,
        ) -> Result<MessageId, MessengerError> {
            let message = MessageId(100 + self.next_id.fetch_add(1, Ordering::SeqCst));
            let buttons = template.rows.iter().map(|row| row.components.len()).sum();
            self.record(Call::Buttons { message, content: template.content, buttons });
            Ok(message)
        }

        async fn delete_message(
            &self,
            _channel: ChannelId,
            message: MessageId,
        ) -> Result<(), MessengerError> {
            self.record(Call::Delete { message });
            Ok(())
        }
    }

    /// Minimal family exercising every handler seam: `go` rolls and
    /// reposts, `stop` does neither.
    struct MiniFamily;

    struct MiniConfig {
        target: String,
    }

    struct MiniState {
        action: String,
    }

    impl CommandFamily for MiniFamily {
        const NAME: &'static str = "mini";
        type Config = MiniConfig;
        type State = MiniState;

        fn definition() -> SlashDefinition {
            standard_definition("mini", "Minimal test family", Vec::new())
        }

        fn help() -> EmbedTemplate {
            EmbedTemplate::new("mini", "help text")
        }

        fn validate_start(&self, options: &StartOptions) -> Option<String> {
            (options.string_or("target", "") == "bad").then(|| "target is invalid".to_owned())
        }

        fn config_from_start(&self, options: &StartOptions) -> Result<MiniConfig, DomainError> {
            Ok(MiniConfig { target: options.string_or("target", "t1").to_owned() })
        }

        fn config_from_event(&self, event: &ComponentEvent) -> Result<MiniConfig, DomainError> {
            let fields = dicey_core::protocol::decode(&event.custom_id);
            Ok(MiniConfig {
                target: dicey_core::protocol::field_or(&fields, 2, "t1").to_owned(),
            })
        }

        fn state_from_event(
            &self,
            event: &ComponentEvent,
            _random: &mut dyn RandomSource,
        ) -> Result<MiniState, DomainError> {
            let fields = dicey_core::protocol::decode(&event.custom_id);
            Ok(MiniState { action: dicey_core::protocol::field_or(&fields, 1, "").to_owned() })
        }

        fn layout(
            &self,
            config: &MiniConfig,
            _state: Option<&MiniState>,
        ) -> Result<Vec<ComponentRow>, DomainError> {
            Ok(vec![ComponentRow {
                components: vec![
                    ButtonComponent::new(format!("mini,go,{}", config.target), "Go"),
                    ButtonComponent::new(format!("mini,stop,{}", config.target), "Stop"),
                ],
            }])
        }

        fn answer(
            &self,
            state: &MiniState,
            config: &MiniConfig,
            _random: &mut dyn RandomSource,
        ) -> Result<Option<RollAnswer>, DomainError> {
            Ok((state.action == "go")
                .then(|| RollAnswer::new(format!("went {}", config.target), "[1]")))
        }

        fn prompt(&self, _config: &MiniConfig) -> String {
            "Pick a button".to_owned()
        }

        fn prompt_after_click(&self, state: &MiniState, _config: &MiniConfig) -> Option<String> {
            (state.action == "go").then(|| format!("Picked {}", state.action))
        }

        fn posts_new_buttons(&self, state: &MiniState, _config: &MiniConfig) -> bool {
            state.action == "go"
        }

        fn config_fields(&self, config: &MiniConfig) -> Vec<String> {
            vec![config.target.clone()]
        }
    }

    fn handler() -> (FamilyHandler<MiniFamily>, Arc<RecordingMessenger>, Arc<ActiveMessageCache>) {
        let messenger = Arc::new(RecordingMessenger::default());
        let cache = Arc::new(ActiveMessageCache::default());
        let handler = FamilyHandler::new(
            MiniFamily,
            Arc::clone(&cache),
            Arc::clone(&messenger) as Arc<dyn ChannelMessenger>,
        );
        (handler, messenger, cache)
    }

    fn start_payload(target: &str) -> SlashCommandPayload {
        SlashCommandPayload {
            command: "mini".to_owned(),
            options: vec![CommandOption::sub_command(
                "start",
                vec![CommandOption::string("target", target)],
            )],
            channel_id: ChannelId(7),
            user_id: "user-1".to_owned(),
            request_id: "req-1".to_owned(),
        }
    }

    fn click(custom_id: &str, pinned: bool) -> ComponentEvent {
        ComponentEvent {
            channel_id: ChannelId(7),
            message_id: MessageId(50),
            custom_id: custom_id.to_owned(),
            message_content: "Pick a button".to_owned(),
            button_rows: Vec::new(),
            invoking_user: "user-1".to_owned(),
            pinned,
            request_id: "req-2".to_owned(),
        }
    }

    #[tokio::test]
    async fn start_posts_buttons_and_tracks_the_message() {
        let (handler, messenger, cache) = handler();

        let result = handler
            .handle_slash(&start_payload("t1"), &EventContext::default())
            .await
            .expect("start should succeed");

        assert!(matches!(result, HandlerResult::Processed));
        assert_eq!(
            messenger.calls(),
            vec![Call::Buttons {
                message: MessageId(100),
                content: "Pick a button".to_owned(),
                buttons: 2,
            }]
        );
        assert_eq!(cache.tracked_channels(), 1);
    }

    #[tokio::test]
    async fn restarting_with_the_same_config_supersedes_the_old_message() {
        let (handler, messenger, _cache) = handler();
        let context = EventContext::default();

        handler.handle_slash(&start_payload("t1"), &context).await.expect("first start");
        messenger.calls();
        handler.handle_slash(&start_payload("t1"), &context).await.expect("second start");

        let calls = messenger.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::Buttons { message: MessageId(101), .. }));
        assert_eq!(calls[1], Call::Delete { message: MessageId(100) });
    }

    #[tokio::test]
    async fn invalid_start_options_reply_ephemeral_without_posting() {
        let (handler, messenger, _cache) = handler();

        let result = handler
            .handle_slash(&start_payload("bad"), &EventContext::default())
            .await
            .expect("validation failure is not an error");

        match result {
            HandlerResult::Responded(reply) => {
                assert!(reply.ephemeral);
                assert_eq!(reply.content, "target is invalid");
            }
            other => panic!("expected a reply, got {other:?}"),
        }
        assert!(messenger.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_subcommand_answers_with_guidance() {
        let (handler, _messenger, _cache) = handler();
        let payload = SlashCommandPayload {
            command: "mini".to_owned(),
            options: vec![CommandOption::sub_command("restart", Vec::new())],
            channel_id: ChannelId(7),
            user_id: "user-1".to_owned(),
            request_id: "req-3".to_owned(),
        };

        let result = handler
            .handle_slash(&payload, &EventContext::default())
            .await
            .expect("guidance reply");

        match result {
            HandlerResult::Responded(reply) => {
                assert!(reply.content.contains("restart"));
                assert!(reply.content.ends_with("Try `/mini help`."));
            }
            other => panic!("expected a reply, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn clear_deletes_every_tracked_message() {
        let (handler, messenger, _cache) = handler();
        let context = EventContext::default();
        handler.handle_slash(&start_payload("t1"), &context).await.expect("start");
        messenger.calls();

        let payload = SlashCommandPayload {
            command: "mini".to_owned(),
            options: vec![CommandOption::sub_command("clear", Vec::new())],
            channel_id: ChannelId(7),
            user_id: "user-1".to_owned(),
            request_id: "req-4".to_owned(),
        };
        let result = handler.handle_slash(&payload, &context).await.expect("clear");

        assert!(matches!(result, HandlerResult::Processed));
        assert_eq!(messenger.calls(), vec![Call::Delete { message: MessageId(100) }]);
    }

    #[tokio::test]
    async fn click_edits_answers_reposts_and_supersedes() {
        let (handler, messenger, _cache) = handler();

        let result = handler
            .handle_component(&click("mini,go,t1", false), &EventContext::default())
            .await
            .expect("click should succeed");

        assert!(matches!(result, HandlerResult::Processed));
        assert_eq!(
            messenger.calls(),
            vec![
                Call::Edit { message: MessageId(50), content: "Picked go".to_owned() },
                Call::Answer { reference: Some(MessageId(50)), title: "went t1".to_owned() },
                Call::Buttons {
                    message: MessageId(100),
                    content: "Pick a button".to_owned(),
                    buttons: 2,
                },
                Call::Delete { message: MessageId(50) },
            ]
        );
    }

    #[tokio::test]
    async fn pinned_messages_are_never_deleted() {
        let (handler, messenger, _cache) = handler();

        handler
            .handle_component(&click("mini,go,t1", true), &EventContext::default())
            .await
            .expect("click on a pinned message");

        let calls = messenger.calls();
        assert!(
            !calls.iter().any(|call| matches!(call, Call::Delete { .. })),
            "pinned button message must survive: {calls:?}"
        );
    }

    #[tokio::test]
    async fn clicks_without_consequences_touch_nothing() {
        let (handler, messenger, cache) = handler();

        let result = handler
            .handle_component(&click("mini,stop,t1", false), &EventContext::default())
            .await
            .expect("stop click");

        assert!(matches!(result, HandlerResult::Processed));
        assert!(messenger.calls().is_empty());
        assert_eq!(cache.tracked_channels(), 0);
    }
}
