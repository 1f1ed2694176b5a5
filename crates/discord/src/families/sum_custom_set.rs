//! Accumulating expression buttons. Clicks append preconfigured terms to
//! an expression kept in the message text; the first clicker locks the set
//! until it is rolled or cleared. Transitions run through the set flow so
//! every click maps to an explicit state change.

use dicey_core::engine::{expand, fold_outcomes, validate, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::flows::{FlowContext, FlowEngine, FlowEvent, FlowState, SetFlow};
use dicey_core::protocol::{decode, encode, field_or, SetMessageState, EMPTY_MESSAGE, USER_DELIMITER};

use crate::commands::{SlashDefinition, StartOptions};
use crate::components::{
    partition_buttons, ButtonComponent, ButtonStyle, ComponentRow, EmbedTemplate,
};
use crate::events::ComponentEvent;
use crate::families::{
    button_entries, entries_from_rows, expression_buttons, expression_option_definitions,
    standard_definition, validate_button_options, ButtonEntry, CommandFamily, EXPRESSION_HELP,
};

const ROLL_ACTION: &str = "roll";
const CLEAR_ACTION: &str = "clear";
const BACK_ACTION: &str = "back";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumCustomSetConfig {
    pub entries: Vec<ButtonEntry>,
}

/// Outcome of folding one click into the message. `rolled_expression` is
/// set when the transition asked for an evaluation; an empty `actions`
/// list with no rolled expression means the click was absorbed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SumCustomSetState {
    pub message: SetMessageState,
    pub rolled_expression: Option<String>,
    touched: bool,
}

impl SumCustomSetState {
    fn absorbed(message: SetMessageState) -> Self {
        Self { message, rolled_expression: None, touched: false }
    }
}

#[derive(Default)]
pub struct SumCustomSetFamily {
    flow: FlowEngine<SetFlow>,
}

impl CommandFamily for SumCustomSetFamily {
    const NAME: &'static str = "sum_custom_set";
    type Config = SumCustomSetConfig;
    type State = SumCustomSetState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure a variable set of dice",
            expression_option_definitions(),
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/sum_custom_set",
            "Creates up to 22 buttons with custom dice expression, that can be combined \
             afterwards, e.g. '/sum_custom_set start 1_button:3d6 2_button:10d10 \
             3_button:3d20'. The first user to add dice owns the set until it is rolled \
             or cleared.",
        )
        .field("Expression syntax", EXPRESSION_HELP)
    }

    fn validate_start(&self, options: &StartOptions) -> Option<String> {
        let values = super::raw_button_values(options);

        let repeated: Vec<&str> = values
            .iter()
            .filter(|value| value.contains("x["))
            .map(String::as_str)
            .collect();
        if !repeated.is_empty() {
            return Some(format!(
                "This command doesn't support multiple rolls, the following expression are \
                 not allowed: {}",
                repeated.join(",")
            ));
        }

        let locked: Vec<&str> = values
            .iter()
            .filter(|value| value.contains(USER_DELIMITER))
            .map(String::as_str)
            .collect();
        if !locked.is_empty() {
            return Some(format!(
                "This command doesn't allow '{USER_DELIMITER}' in the dice expression and \
                 label, the following expression are not allowed: {}",
                locked.join(",")
            ));
        }

        validate_button_options(options, "/sum_custom_set help")
    }

    fn config_from_start(
        &self,
        options: &StartOptions,
    ) -> Result<SumCustomSetConfig, DomainError> {
        Ok(SumCustomSetConfig { entries: button_entries(options, true) })
    }

    fn config_from_event(
        &self,
        event: &ComponentEvent,
    ) -> Result<SumCustomSetConfig, DomainError> {
        Ok(SumCustomSetConfig {
            entries: entries_from_rows(
                event,
                Self::NAME,
                &[ROLL_ACTION, CLEAR_ACTION, BACK_ACTION],
            ),
        })
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        _random: &mut dyn RandomSource,
    ) -> Result<SumCustomSetState, DomainError> {
        let fields = decode(&event.custom_id);
        let action = field_or(&fields, 1, "");
        let mut message = SetMessageState::parse(&event.message_content);
        let flow_state =
            if message.is_empty() { FlowState::Init } else { FlowState::Accumulating };

        if action == CLEAR_ACTION {
            self.flow.apply(&flow_state, &FlowEvent::Clear, &FlowContext::default())?;
            message.clear();
            return Ok(SumCustomSetState {
                message,
                rolled_expression: None,
                touched: true,
            });
        }

        if message.locked_by_other(&event.invoking_user) {
            self.flow.apply(&flow_state, &FlowEvent::ActorMismatch, &context_of(&message))?;
            return Ok(SumCustomSetState::absorbed(message));
        }

        // A doctored message text must not reach the evaluator later.
        if !message.is_empty() && validate(&message.expression).is_some() {
            return Ok(SumCustomSetState::absorbed(message));
        }

        match action {
            BACK_ACTION => {
                if self.flow.apply(&flow_state, &FlowEvent::Undo, &context_of(&message)).is_err()
                {
                    return Ok(SumCustomSetState::absorbed(message));
                }
                message.undo();
                Ok(SumCustomSetState { message, rolled_expression: None, touched: true })
            }
            ROLL_ACTION => {
                if self
                    .flow
                    .apply(&flow_state, &FlowEvent::Finish, &context_of(&message))
                    .is_err()
                {
                    return Ok(SumCustomSetState::absorbed(message));
                }
                let expression = message.expression.clone();
                message.clear();
                Ok(SumCustomSetState {
                    message,
                    rolled_expression: Some(expression),
                    touched: true,
                })
            }
            term => {
                message.append(term);
                message.locked_user = Some(event.invoking_user.clone());
                self.flow.apply(&flow_state, &FlowEvent::AppendTerm, &context_of(&message))?;
                Ok(SumCustomSetState { message, rolled_expression: None, touched: true })
            }
        }
    }

    fn layout(
        &self,
        config: &SumCustomSetConfig,
        _state: Option<&SumCustomSetState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        let mut buttons = expression_buttons(Self::NAME, &config.entries);
        buttons.push(
            ButtonComponent::new(encode(&[Self::NAME, ROLL_ACTION])?, "Roll")
                .style(ButtonStyle::Success),
        );
        buttons.push(
            ButtonComponent::new(encode(&[Self::NAME, CLEAR_ACTION])?, "Clear")
                .style(ButtonStyle::Danger),
        );
        buttons.push(
            ButtonComponent::new(encode(&[Self::NAME, BACK_ACTION])?, "Back")
                .style(ButtonStyle::Secondary),
        );
        Ok(partition_buttons(buttons))
    }

    fn answer(
        &self,
        state: &SumCustomSetState,
        config: &SumCustomSetConfig,
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        let Some(expression) = &state.rolled_expression else {
            return Ok(None);
        };
        let outcomes = expand(expression, random)?;
        let label = signed_label(&config.entries, expression);
        Ok(Some(fold_outcomes(outcomes, label.as_deref())))
    }

    fn prompt(&self, _config: &SumCustomSetConfig) -> String {
        EMPTY_MESSAGE.to_owned()
    }

    fn prompt_after_click(
        &self,
        state: &SumCustomSetState,
        _config: &SumCustomSetConfig,
    ) -> Option<String> {
        state.touched.then(|| state.message.render())
    }

    fn posts_new_buttons(&self, state: &SumCustomSetState, _config: &SumCustomSetConfig) -> bool {
        state.rolled_expression.is_some()
    }

    fn config_fields(&self, config: &SumCustomSetConfig) -> Vec<String> {
        config
            .entries
            .iter()
            .map(|entry| {
                if entry.label == entry.expression {
                    entry.expression.clone()
                } else {
                    format!("{}@{}", entry.expression, entry.label)
                }
            })
            .collect()
    }
}

fn context_of(message: &SetMessageState) -> FlowContext {
    FlowContext { expression: message.expression.clone() }
}

/// Entries store a signed expression while the accumulated text drops a
/// leading `+`, so the lookup tries both spellings.
fn signed_label(entries: &[ButtonEntry], expression: &str) -> Option<String> {
    let signed = if expression.starts_with(['+', '-']) {
        expression.to_owned()
    } else {
        format!("+{expression}")
    };
    entries
        .iter()
        .find(|entry| entry.expression == signed && entry.label != entry.expression)
        .map(|entry| entry.label.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandOption;
    use dicey_core::cache::{ChannelId, MessageId};
    use dicey_core::engine::SequenceSource;

    fn options(values: &[&str]) -> StartOptions {
        let raw: Vec<CommandOption> = values
            .iter()
            .enumerate()
            .map(|(index, value)| CommandOption::string(format!("{}_button", index + 1), *value))
            .collect();
        StartOptions::from_options(&raw)
    }

    fn click(content: &str, action: &str, user: &str) -> ComponentEvent {
        ComponentEvent {
            channel_id: ChannelId(1),
            message_id: MessageId(2),
            custom_id: format!("sum_custom_set,{action}"),
            message_content: content.to_owned(),
            button_rows: Vec::new(),
            invoking_user: user.to_owned(),
            pinned: false,
            request_id: "req".to_owned(),
        }
    }

    fn state_for(content: &str, action: &str, user: &str) -> SumCustomSetState {
        let mut random = SequenceSource::new(std::iter::empty());
        SumCustomSetFamily::default()
            .state_from_event(&click(content, action, user), &mut random)
            .expect("state decodes")
    }

    #[test]
    fn the_first_term_locks_the_set_to_the_clicker() {
        let family = SumCustomSetFamily::default();
        let state = state_for(EMPTY_MESSAGE, "+1d6", "Alice");

        assert_eq!(state.message.expression, "1d6");
        assert_eq!(state.message.locked_user.as_deref(), Some("Alice"));
        assert_eq!(
            family.prompt_after_click(&state, &SumCustomSetConfig { entries: Vec::new() }),
            Some("Alice\u{2236} 1d6".to_owned())
        );
    }

    #[test]
    fn terms_join_without_spaces() {
        let state = state_for("Alice\u{2236} 1d6", "+3d6", "Alice");
        assert_eq!(state.message.expression, "1d6+3d6");

        let state = state_for("Alice\u{2236} 1d6+3d6", "-2", "Alice");
        assert_eq!(state.message.expression, "1d6+3d6-2");
    }

    #[test]
    fn another_user_cannot_touch_a_locked_set() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };
        let state = state_for("Alice\u{2236} 1d6", "+3d6", "Bob");
        let mut random = SequenceSource::new(std::iter::empty());

        assert_eq!(state.message.expression, "1d6");
        assert_eq!(family.prompt_after_click(&state, &config), None);
        assert!(!family.posts_new_buttons(&state, &config));
        assert_eq!(family.answer(&state, &config, &mut random).expect("answers"), None);
    }

    #[test]
    fn back_cuts_the_last_term() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };

        let state = state_for("Alice\u{2236} 1d6+3d6", "back", "Alice");
        assert_eq!(state.message.expression, "1d6");
        assert_eq!(
            family.prompt_after_click(&state, &config),
            Some("Alice\u{2236} 1d6".to_owned())
        );

        let ignored = state_for(EMPTY_MESSAGE, "back", "Alice");
        assert_eq!(family.prompt_after_click(&ignored, &config), None);
    }

    #[test]
    fn roll_evaluates_the_accumulated_expression() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };
        let state = state_for("Alice\u{2236} 1d6+3d6", "roll", "Alice");
        let mut random = SequenceSource::new([2, 1, 3, 5]);

        let answer = family
            .answer(&state, &config, &mut random)
            .expect("roll succeeds")
            .expect("roll answers");

        assert_eq!(answer.title, "1d6+3d6 = 11");
        assert_eq!(answer.detail, "[2,1,3,5] = 11");
        assert!(family.posts_new_buttons(&state, &config));
        assert_eq!(
            family.prompt_after_click(&state, &config),
            Some(EMPTY_MESSAGE.to_owned())
        );
    }

    #[test]
    fn roll_applies_the_label_of_the_matching_entry() {
        let family = SumCustomSetFamily::default();
        let config = family
            .config_from_start(&options(&["3d6@Attack", "1d4"]))
            .expect("config builds");
        let state = state_for("Alice\u{2236} 3d6", "roll", "Alice");
        let mut random = SequenceSource::new([3, 3, 3]);

        let answer = family
            .answer(&state, &config, &mut random)
            .expect("roll succeeds")
            .expect("roll answers");

        assert_eq!(answer.title, "Attack: 3d6 = 9");
    }

    #[test]
    fn rolling_an_empty_set_is_absorbed() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };
        let state = state_for(EMPTY_MESSAGE, "roll", "Alice");
        let mut random = SequenceSource::new(std::iter::empty());

        assert_eq!(family.answer(&state, &config, &mut random).expect("answers"), None);
        assert_eq!(family.prompt_after_click(&state, &config), None);
        assert!(!family.posts_new_buttons(&state, &config));
    }

    #[test]
    fn anyone_may_clear_a_locked_set() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };
        let state = state_for("Alice\u{2236} 1d6", "clear", "Bob");

        assert!(state.message.is_empty());
        assert_eq!(
            family.prompt_after_click(&state, &config),
            Some(EMPTY_MESSAGE.to_owned())
        );
        assert!(!family.posts_new_buttons(&state, &config));
    }

    #[test]
    fn doctored_message_text_is_absorbed() {
        let family = SumCustomSetFamily::default();
        let config = SumCustomSetConfig { entries: Vec::new() };
        let state = state_for("Alice\u{2236} 1d6+++", "+1d6", "Alice");

        assert_eq!(state.message.expression, "1d6+++");
        assert_eq!(family.prompt_after_click(&state, &config), None);
    }

    #[test]
    fn layout_ends_with_the_control_buttons() {
        let family = SumCustomSetFamily::default();
        let config = family
            .config_from_start(&options(&["3d6@Drei", "1d20"]))
            .expect("config builds");

        let rows = family.layout(&config, None).expect("layout builds");
        let buttons: Vec<&ButtonComponent> =
            rows.iter().flat_map(|row| row.components.iter()).collect();

        assert_eq!(buttons.len(), 5);
        assert_eq!(buttons[0].custom_id, "sum_custom_set,+3d6");
        assert_eq!(buttons[0].label, "Drei");
        assert_eq!(buttons[1].custom_id, "sum_custom_set,+1d20");
        assert_eq!(buttons[1].label, "+1d20");
        assert_eq!(buttons[2].label, "Roll");
        assert_eq!(buttons[2].style, ButtonStyle::Success);
        assert_eq!(buttons[3].label, "Clear");
        assert_eq!(buttons[3].style, ButtonStyle::Danger);
        assert_eq!(buttons[4].label, "Back");
        assert_eq!(buttons[4].style, ButtonStyle::Secondary);
    }

    #[test]
    fn config_survives_the_trip_through_the_message_rows() {
        let family = SumCustomSetFamily::default();
        let config = family
            .config_from_start(&options(&["3d6@Drei", "1d20"]))
            .expect("config builds");
        let rows = family.layout(&config, None).expect("layout builds");

        let mut event = click(EMPTY_MESSAGE, "+3d6", "Alice");
        event.button_rows = rows;

        let recovered = family.config_from_event(&event).expect("config decodes");
        assert_eq!(recovered, config);
    }

    #[test]
    fn start_validation_rejects_repetition_and_the_lock_delimiter() {
        let family = SumCustomSetFamily::default();

        assert_eq!(
            family.validate_start(&options(&["2x[1d6]", "1d6"])).as_deref(),
            Some(
                "This command doesn't support multiple rolls, the following expression are \
                 not allowed: 2x[1d6]"
            )
        );
        assert_eq!(
            family.validate_start(&options(&["1d6@A\u{2236} B"])).as_deref(),
            Some(
                "This command doesn't allow '\u{2236} ' in the dice expression and label, \
                 the following expression are not allowed: 1d6@A\u{2236} B"
            )
        );
        assert_eq!(
            family.validate_start(&options(&["broken"])).as_deref(),
            Some(
                "The following dice expression are invalid: broken. Use /sum_custom_set \
                 help to get more information on how to use the command."
            )
        );
        assert!(family.validate_start(&options(&["3d6", "1d20@Zwanzig"])).is_none());
    }
}
