//! Preconfigured expression buttons. Every click runs the clicked
//! expression through the full engine, repetition wrapper included, so
//! these buttons cover everything `/r` can do.

use dicey_core::engine::{expand, fold_outcomes, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::protocol::CONFIG_DELIMITER;

use crate::commands::{SlashDefinition, StartOptions};
use crate::components::{partition_buttons, ComponentRow, EmbedTemplate};
use crate::events::ComponentEvent;
use crate::families::{
    button_entries, entries_from_rows, expression_buttons, expression_option_definitions,
    label_for, standard_definition, validate_button_options, ButtonEntry, CommandFamily,
    EXPRESSION_HELP,
};

const PROMPT: &str = "Click on a button to roll the dice";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomDiceConfig {
    pub entries: Vec<ButtonEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CustomDiceState {
    pub expression: String,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CustomDiceFamily;

impl CommandFamily for CustomDiceFamily {
    const NAME: &'static str = "custom_dice";
    type Config = CustomDiceConfig;
    type State = CustomDiceState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure a custom set of dice",
            expression_option_definitions(),
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/custom_dice",
            "Creates up to 22 buttons with custom dice expression, e.g. '/custom_dice start \
             1_button:3d6 2_button:10d10 3_button:3d20'. Every click rolls the expression on \
             the button.",
        )
        .field("Expression syntax", EXPRESSION_HELP)
    }

    fn validate_start(&self, options: &StartOptions) -> Option<String> {
        validate_button_options(options, "/custom_dice help")
    }

    fn config_from_start(&self, options: &StartOptions) -> Result<CustomDiceConfig, DomainError> {
        Ok(CustomDiceConfig { entries: button_entries(options, false) })
    }

    fn config_from_event(&self, event: &ComponentEvent) -> Result<CustomDiceConfig, DomainError> {
        Ok(CustomDiceConfig { entries: entries_from_rows(event, Self::NAME, &[]) })
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        _random: &mut dyn RandomSource,
    ) -> Result<CustomDiceState, DomainError> {
        let prefix = format!("{}{CONFIG_DELIMITER}", Self::NAME);
        let expression = event.custom_id.strip_prefix(&prefix).ok_or_else(|| {
            DomainError::StateReconstruction {
                message: format!("custom id {:?} does not carry an expression", event.custom_id),
            }
        })?;
        Ok(CustomDiceState { expression: expression.to_owned() })
    }

    fn layout(
        &self,
        config: &CustomDiceConfig,
        _state: Option<&CustomDiceState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        Ok(partition_buttons(expression_buttons(Self::NAME, &config.entries)))
    }

    fn answer(
        &self,
        state: &CustomDiceState,
        config: &CustomDiceConfig,
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        let outcomes = expand(&state.expression, random)?;
        let label = label_for(&config.entries, &state.expression);
        Ok(Some(fold_outcomes(outcomes, label.as_deref())))
    }

    fn prompt(&self, _config: &CustomDiceConfig) -> String {
        PROMPT.to_owned()
    }

    fn config_fields(&self, config: &CustomDiceConfig) -> Vec<String> {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandOption;
    use dicey_core::cache::{ChannelId, MessageId};
    use dicey_core::engine::{SequenceSource, MULTIPLE_RESULTS_TITLE};

    fn options(values: &[&str]) -> StartOptions {
        let raw: Vec<CommandOption> = values
            .iter()
            .enumerate()
            .map(|(index, value)| CommandOption::string(format!("{}_button", index + 1), *value))
            .collect();
        StartOptions::from_options(&raw)
    }

    fn click(custom_id: &str, rows: Vec<ComponentRow>) -> ComponentEvent {
        ComponentEvent {
            channel_id: ChannelId(1),
            message_id: MessageId(2),
            custom_id: custom_id.to_owned(),
            message_content: PROMPT.to_owned(),
            button_rows: rows,
            invoking_user: "roller".to_owned(),
            pinned: false,
            request_id: "req".to_owned(),
        }
    }

    #[test]
    fn click_runs_the_clicked_expression() {
        let family = CustomDiceFamily;
        let config = family
            .config_from_start(&options(&["1d6", "3d20"]))
            .expect("config builds");
        let mut random = SequenceSource::new([4]);

        let state = CustomDiceState { expression: "1d6".to_owned() };
        let answer = family
            .answer(&state, &config, &mut random)
            .expect("roll succeeds")
            .expect("always answers");

        assert_eq!(answer.title, "1d6 = 4");
        assert_eq!(answer.detail, "[4] = 4");
    }

    #[test]
    fn repetition_folds_into_a_multi_result_answer() {
        let family = CustomDiceFamily;
        let config = family
            .config_from_start(&options(&["2x[1d6]"]))
            .expect("config builds");
        let mut random = SequenceSource::new([3, 5]);

        let state = CustomDiceState { expression: "2x[1d6]".to_owned() };
        let answer = family
            .answer(&state, &config, &mut random)
            .expect("roll succeeds")
            .expect("always answers");

        assert_eq!(answer.title, MULTIPLE_RESULTS_TITLE);
        assert_eq!(
            answer.fields,
            vec![
                ("1d6 = 3".to_owned(), "[3] = 3".to_owned()),
                ("1d6 = 5".to_owned(), "[5] = 5".to_owned()),
            ]
        );
    }

    #[test]
    fn configured_label_prefixes_the_title() {
        let family = CustomDiceFamily;
        let config = family
            .config_from_start(&options(&["2d20@Attack", "1d6"]))
            .expect("config builds");
        let mut random = SequenceSource::new([7, 13]);

        let state = CustomDiceState { expression: "2d20".to_owned() };
        let answer = family
            .answer(&state, &config, &mut random)
            .expect("roll succeeds")
            .expect("always answers");

        assert_eq!(answer.title, "Attack: 2d20 = 20");
        assert_eq!(answer.detail, "[7,13] = 20");
    }

    #[test]
    fn layout_round_trips_through_the_message_rows() {
        let family = CustomDiceFamily;
        let config = family
            .config_from_start(&options(&["2d20@Attack", "1d6"]))
            .expect("config builds");

        let rows = family.layout(&config, None).expect("layout builds");
        assert_eq!(rows[0].components[0].custom_id, "custom_dice,2d20");
        assert_eq!(rows[0].components[0].label, "Attack");

        let event = click("custom_dice,2d20", rows);
        let recovered = family.config_from_event(&event).expect("config decodes");
        assert_eq!(recovered, config);

        let mut random = SequenceSource::new(std::iter::empty());
        let state = family.state_from_event(&event, &mut random).expect("state decodes");
        assert_eq!(state.expression, "2d20");
    }

    #[test]
    fn invalid_start_options_are_reported_together() {
        let family = CustomDiceFamily;

        let message = family.validate_start(&options(&["3d6", "broken", "3d6>"]));

        assert_eq!(
            message.as_deref(),
            Some(
                "The following dice expression are invalid: broken,3d6>. Use /custom_dice \
                 help to get more information on how to use the command."
            )
        );
        assert!(family.validate_start(&options(&["3d6", "2x[1d20]", "d6@Sword"])).is_none());
    }

    #[test]
    fn foreign_custom_ids_do_not_reconstruct() {
        let family = CustomDiceFamily;
        let mut random = SequenceSource::new(std::iter::empty());

        let result = family.state_from_event(&click("other,1d6", Vec::new()), &mut random);

        assert!(matches!(result, Err(DomainError::StateReconstruction { .. })));
    }
}
