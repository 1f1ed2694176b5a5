//! Roll a pool, hold what you like, re-roll the rest. The rolled dice
//! travel inside the custom id, so every button message is self-contained
//! and a re-roll only ever touches the configured reroll values.

use dicey_core::engine::{make_bold, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::protocol::{decode, decode_list, encode, encode_list, field_or, EMPTY_FIELD};

use crate::commands::{OptionDefinition, SlashDefinition, StartOptions};
use crate::components::{
    partition_buttons, ButtonComponent, ButtonStyle, ComponentRow, EmbedTemplate,
};
use crate::events::ComponentEvent;
use crate::families::{standard_definition, CommandFamily};

const OPTION_BOUND: i64 = 1000;
const MAX_POOL_BUTTONS: u32 = 15;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoldRerollConfig {
    pub sides: u32,
    pub reroll_set: Vec<i32>,
    pub success_set: Vec<i32>,
    pub failure_set: Vec<i32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoldAction {
    Roll,
    Reroll,
    Finish,
    Clear,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoldRerollState {
    pub dice: Vec<i32>,
    pub reroll_count: u32,
    pub action: HoldAction,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct HoldRerollFamily;

impl CommandFamily for HoldRerollFamily {
    const NAME: &'static str = "hold_reroll";
    type Config = HoldRerollConfig;
    type State = HoldRerollState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure buttons to roll dice, hold some and reroll the rest",
            vec![
                OptionDefinition::integer("sides", "Dice side"),
                OptionDefinition::string("reroll_set", "Comma separated dice values that can be rerolled"),
                OptionDefinition::string("success_set", "Comma separated dice values that count as success"),
                OptionDefinition::string("failure_set", "Comma separated dice values that count as failure"),
            ],
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/hold_reroll",
            "Use '/hold_reroll start sides:6 reroll_set:2,3,4 success_set:5,6 failure_set:1' \
             to get buttons that roll a pool of dice. After a roll you can reroll every die \
             that shows a value from the reroll set, as often as you like, and finish to \
             count successes and failures.",
        )
        .field("Example", "/hold_reroll start sides:6 reroll_set:2,3,4")
    }

    fn validate_start(&self, options: &StartOptions) -> Option<String> {
        let sides = bounded(options.integer_or("sides", 6));
        for (name, option, default) in NAMED_SETS {
            let raw = options.string_or(option, default);
            let Some(members) = parse_members(raw) else {
                return Some(format!(
                    "{name} set [{raw}] contains a value that is not a number"
                ));
            };
            if members.iter().any(|member| *member > sides as i32) {
                return Some(format!(
                    "{name} set {} contains a number bigger then the sides of the die {sides}",
                    set_text(&members)
                ));
            }
        }
        None
    }

    fn config_from_start(&self, options: &StartOptions) -> Result<HoldRerollConfig, DomainError> {
        Ok(HoldRerollConfig {
            sides: bounded(options.integer_or("sides", 6)),
            reroll_set: member_option(options, "reroll", "reroll_set", "2,3,4")?,
            success_set: member_option(options, "success", "success_set", "5,6")?,
            failure_set: member_option(options, "failure", "failure_set", "1")?,
        })
    }

    fn config_from_event(&self, event: &ComponentEvent) -> Result<HoldRerollConfig, DomainError> {
        let fields = decode(&event.custom_id);
        let sides = field_or(&fields, 3, "").parse().map_err(|_| {
            DomainError::StateReconstruction {
                message: "die sides missing from custom id".to_owned(),
            }
        })?;
        Ok(HoldRerollConfig {
            sides,
            reroll_set: list_field(&fields, 4)?,
            success_set: list_field(&fields, 5)?,
            failure_set: list_field(&fields, 6)?,
        })
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        random: &mut dyn RandomSource,
    ) -> Result<HoldRerollState, DomainError> {
        let config = self.config_from_event(event)?;
        let fields = decode(&event.custom_id);
        let rolls = list_field(&fields, 2)?;
        let reroll_count = field_or(&fields, 7, "0").parse().unwrap_or(0);

        match field_or(&fields, 1, "") {
            "clear" => Ok(HoldRerollState {
                dice: Vec::new(),
                reroll_count: 0,
                action: HoldAction::Clear,
            }),
            "finish" => {
                Ok(HoldRerollState { dice: rolls, reroll_count, action: HoldAction::Finish })
            }
            "reroll" => {
                let dice = rolls
                    .iter()
                    .map(|die| {
                        if config.reroll_set.contains(die) {
                            random.uniform(1, config.sides as i32)
                        } else {
                            *die
                        }
                    })
                    .collect();
                Ok(HoldRerollState {
                    dice,
                    reroll_count: reroll_count + 1,
                    action: HoldAction::Reroll,
                })
            }
            action => {
                let pool: u32 =
                    action.parse().map_err(|_| DomainError::StateReconstruction {
                        message: format!("unknown hold_reroll action {action:?}"),
                    })?;
                let dice =
                    (0..pool).map(|_| random.uniform(1, config.sides as i32)).collect();
                Ok(HoldRerollState { dice, reroll_count: 0, action: HoldAction::Roll })
            }
        }
    }

    fn layout(
        &self,
        config: &HoldRerollConfig,
        state: Option<&HoldRerollState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        if let Some(state) = state {
            if in_progress(state, config) {
                let rolls = encode_list(&state.dice);
                let buttons = vec![
                    ButtonComponent::new(
                        action_id(config, "reroll", &rolls, state.reroll_count)?,
                        "Reroll",
                    ),
                    ButtonComponent::new(
                        action_id(config, "finish", &rolls, state.reroll_count)?,
                        "Finish",
                    )
                    .style(ButtonStyle::Success),
                    ButtonComponent::new(
                        action_id(config, "clear", &rolls, state.reroll_count)?,
                        "Clear",
                    )
                    .style(ButtonStyle::Danger),
                ];
                return Ok(partition_buttons(buttons));
            }
        }

        let mut buttons = Vec::with_capacity(MAX_POOL_BUTTONS as usize);
        for pool in 1..=MAX_POOL_BUTTONS {
            buttons.push(ButtonComponent::new(
                action_id(config, &pool.to_string(), EMPTY_FIELD, 0)?,
                format!("Roll {pool}d"),
            ));
        }
        Ok(partition_buttons(buttons))
    }

    fn answer(
        &self,
        state: &HoldRerollState,
        config: &HoldRerollConfig,
        _random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        let finished = match state.action {
            HoldAction::Clear => false,
            HoldAction::Finish => true,
            HoldAction::Roll | HoldAction::Reroll => !in_progress(state, config),
        };
        if !finished {
            return Ok(None);
        }

        let successes = count_in(&state.dice, &config.success_set);
        let failures = count_in(&state.dice, &config.failure_set);
        let title = if state.reroll_count == 0 {
            format!("Success: {successes} and Failure: {failures}")
        } else {
            format!(
                "Success: {successes}, Failure: {failures} and Rerolls: {}",
                state.reroll_count
            )
        };
        Ok(Some(RollAnswer::new(title, marked_dice(&state.dice, config))))
    }

    fn prompt(&self, config: &HoldRerollConfig) -> String {
        format!(
            "Click on the buttons to roll dice. Reroll set: {}, Success Set: {} and \
             Failure Set: {}",
            set_text(&config.reroll_set),
            set_text(&config.success_set),
            set_text(&config.failure_set)
        )
    }

    fn prompt_with_state(&self, state: &HoldRerollState, config: &HoldRerollConfig) -> String {
        if in_progress(state, config) {
            format!(
                "{} = {} successes and {} failures",
                marked_dice(&state.dice, config),
                count_in(&state.dice, &config.success_set),
                count_in(&state.dice, &config.failure_set)
            )
        } else {
            self.prompt(config)
        }
    }

    fn prompt_after_click(
        &self,
        state: &HoldRerollState,
        config: &HoldRerollConfig,
    ) -> Option<String> {
        Some(self.prompt_with_state(state, config))
    }

    fn config_fields(&self, config: &HoldRerollConfig) -> Vec<String> {
        vec![
            config.sides.to_string(),
            encode_list(&config.reroll_set),
            encode_list(&config.success_set),
            encode_list(&config.failure_set),
        ]
    }
}

const NAMED_SETS: [(&str, &str, &str); 3] = [
    ("reroll", "reroll_set", "2,3,4"),
    ("success", "success_set", "5,6"),
    ("failure", "failure_set", "1"),
];

fn bounded(value: i64) -> u32 {
    value.clamp(1, OPTION_BOUND) as u32
}

fn member_option(
    options: &StartOptions,
    name: &str,
    option: &str,
    default: &str,
) -> Result<Vec<i32>, DomainError> {
    let raw = options.string_or(option, default);
    parse_members(raw).ok_or_else(|| DomainError::InvalidConfiguration {
        message: format!("{name} set [{raw}] contains a value that is not a number"),
    })
}

/// `2,3,4` from slash input to a sorted, deduplicated member list.
fn parse_members(raw: &str) -> Option<Vec<i32>> {
    let mut members = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        members.push(part.parse().ok()?);
    }
    members.sort_unstable();
    members.dedup();
    Some(members)
}

/// Set rendering used in prompts and validation, `[2, 3, 4]`.
fn set_text(members: &[i32]) -> String {
    let listed: Vec<String> = members.iter().map(ToString::to_string).collect();
    format!("[{}]", listed.join(", "))
}

fn list_field(fields: &[String], index: usize) -> Result<Vec<i32>, DomainError> {
    decode_list(field_or(fields, index, EMPTY_FIELD)).ok_or_else(|| {
        DomainError::StateReconstruction {
            message: format!("custom id field {index} is not a dice list"),
        }
    })
}

fn action_id(
    config: &HoldRerollConfig,
    action: &str,
    rolls: &str,
    reroll_count: u32,
) -> Result<String, DomainError> {
    Ok(encode(&[
        HoldRerollFamily::NAME,
        action,
        rolls,
        &config.sides.to_string(),
        &encode_list(&config.reroll_set),
        &encode_list(&config.success_set),
        &encode_list(&config.failure_set),
        &reroll_count.to_string(),
    ])?)
}

fn in_progress(state: &HoldRerollState, config: &HoldRerollConfig) -> bool {
    matches!(state.action, HoldAction::Roll | HoldAction::Reroll)
        && state.dice.iter().any(|die| config.reroll_set.contains(die))
}

fn count_in(dice: &[i32], set: &[i32]) -> usize {
    dice.iter().filter(|die| set.contains(die)).count()
}

/// Dice list with successes and failures in bold.
fn marked_dice(dice: &[i32], config: &HoldRerollConfig) -> String {
    let listed: Vec<String> = dice
        .iter()
        .map(|die| {
            if config.success_set.contains(die) || config.failure_set.contains(die) {
                make_bold(*die)
            } else {
                die.to_string()
            }
        })
        .collect();
    format!("[{}]", listed.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandOption;
    use dicey_core::cache::{ChannelId, MessageId};
    use dicey_core::engine::SequenceSource;

    fn click(custom_id: &str) -> ComponentEvent {
        ComponentEvent {
            channel_id: ChannelId(1),
            message_id: MessageId(2),
            custom_id: custom_id.to_owned(),
            message_content: String::new(),
            button_rows: Vec::new(),
            invoking_user: "roller".to_owned(),
            pinned: false,
            request_id: "req".to_owned(),
        }
    }

    fn state_for(custom_id: &str, rolls: impl IntoIterator<Item = i32>) -> HoldRerollState {
        let mut random = SequenceSource::new(rolls);
        HoldRerollFamily
            .state_from_event(&click(custom_id), &mut random)
            .expect("state decodes")
    }

    fn default_config() -> HoldRerollConfig {
        HoldRerollConfig {
            sides: 6,
            reroll_set: vec![2, 3, 4],
            success_set: vec![5, 6],
            failure_set: vec![1],
        }
    }

    #[test]
    fn a_pool_button_rolls_fresh_dice() {
        let state = state_for("hold_reroll,3,EMPTY,6,2;3;4,5;6,1,0", [1, 2, 5]);

        assert_eq!(state.dice, vec![1, 2, 5]);
        assert_eq!(state.reroll_count, 0);
        assert_eq!(state.action, HoldAction::Roll);
    }

    #[test]
    fn reroll_touches_only_the_reroll_set() {
        let state =
            state_for("hold_reroll,reroll,1;2;3;4;5;6,6,2;3;4,5;6,1,0", [6, 6, 6]);

        assert_eq!(state.dice, vec![1, 6, 6, 6, 5, 6]);
        assert_eq!(state.reroll_count, 1);
    }

    #[test]
    fn finish_counts_successes_failures_and_rerolls() {
        let family = HoldRerollFamily;
        let event = click("hold_reroll,finish,1;1;1;1;5;6,6,2;3;4,5;6,1,3");
        let mut random = SequenceSource::new(std::iter::empty());

        let config = family.config_from_event(&event).expect("config decodes");
        let state = family.state_from_event(&event, &mut random).expect("state decodes");
        let answer = family
            .answer(&state, &config, &mut random)
            .expect("answer builds")
            .expect("finish always answers");

        assert_eq!(answer.title, "Success: 2, Failure: 4 and Rerolls: 3");
        assert_eq!(answer.detail, "[**1**,**1**,**1**,**1**,**5**,**6**]");
    }

    #[test]
    fn finish_without_rerolls_uses_the_short_title() {
        let family = HoldRerollFamily;
        let event = click("hold_reroll,finish,1;2;5;6,6,2;3;4,5;6,1,0");
        let mut random = SequenceSource::new(std::iter::empty());

        let config = family.config_from_event(&event).expect("config decodes");
        let state = family.state_from_event(&event, &mut random).expect("state decodes");
        let answer = family
            .answer(&state, &config, &mut random)
            .expect("answer builds")
            .expect("finish always answers");

        assert_eq!(answer.title, "Success: 2 and Failure: 1");
        assert_eq!(answer.detail, "[**1**,2,**5**,**6**]");
    }

    #[test]
    fn a_roll_without_reroll_candidates_finishes_immediately() {
        let family = HoldRerollFamily;
        let config = default_config();
        let state = state_for("hold_reroll,2,EMPTY,6,2;3;4,5;6,1,0", [5, 6]);
        let mut random = SequenceSource::new(std::iter::empty());

        let answer = family
            .answer(&state, &config, &mut random)
            .expect("answer builds")
            .expect("finished pool answers");
        assert_eq!(answer.title, "Success: 2 and Failure: 0");

        assert_eq!(family.prompt_with_state(&state, &config), family.prompt(&config));
        let rows = family.layout(&config, Some(&state)).expect("layout builds");
        assert_eq!(rows.iter().map(|row| row.components.len()).sum::<usize>(), 15);
    }

    #[test]
    fn an_open_pool_offers_reroll_finish_and_clear() {
        let family = HoldRerollFamily;
        let config = default_config();
        let state = state_for("hold_reroll,3,EMPTY,6,2;3;4,5;6,1,0", [1, 2, 5]);
        let mut random = SequenceSource::new(std::iter::empty());

        assert_eq!(family.answer(&state, &config, &mut random).expect("answer builds"), None);
        assert_eq!(
            family.prompt_with_state(&state, &config),
            "[**1**,2,**5**] = 1 successes and 1 failures"
        );

        let rows = family.layout(&config, Some(&state)).expect("layout builds");
        let buttons: Vec<&ButtonComponent> =
            rows.iter().flat_map(|row| row.components.iter()).collect();
        assert_eq!(buttons.len(), 3);
        assert_eq!(buttons[0].custom_id, "hold_reroll,reroll,1;2;5,6,2;3;4,5;6,1,0");
        assert_eq!(buttons[0].label, "Reroll");
        assert_eq!(buttons[1].custom_id, "hold_reroll,finish,1;2;5,6,2;3;4,5;6,1,0");
        assert_eq!(buttons[2].label, "Clear");
        assert_eq!(buttons[2].style, ButtonStyle::Danger);
    }

    #[test]
    fn clear_returns_to_the_empty_pool_layout() {
        let family = HoldRerollFamily;
        let config = default_config();
        let state = state_for("hold_reroll,clear,1;2;5,6,2;3;4,5;6,1,2", []);
        let mut random = SequenceSource::new(std::iter::empty());

        assert!(state.dice.is_empty());
        assert_eq!(family.answer(&state, &config, &mut random).expect("answer builds"), None);
        assert_eq!(family.prompt_with_state(&state, &config), family.prompt(&config));

        let rows = family.layout(&config, Some(&state)).expect("layout builds");
        let first = &rows[0].components[0];
        assert_eq!(first.custom_id, "hold_reroll,1,EMPTY,6,2;3;4,5;6,1,0");
        assert_eq!(first.label, "Roll 1d");
    }

    #[test]
    fn prompt_lists_the_three_sets() {
        assert_eq!(
            HoldRerollFamily.prompt(&default_config()),
            "Click on the buttons to roll dice. Reroll set: [2, 3, 4], Success Set: [5, 6] \
             and Failure Set: [1]"
        );
    }

    #[test]
    fn validation_rejects_set_members_above_the_die() {
        let family = HoldRerollFamily;

        let options = StartOptions::from_options(&[
            CommandOption::integer("sides", 6),
            CommandOption::string("reroll_set", "2,3,7"),
        ]);
        assert_eq!(
            family.validate_start(&options).as_deref(),
            Some("reroll set [2, 3, 7] contains a number bigger then the sides of the die 6")
        );

        let options = StartOptions::from_options(&[
            CommandOption::integer("sides", 6),
            CommandOption::string("success_set", "six"),
        ]);
        assert_eq!(
            family.validate_start(&options).as_deref(),
            Some("success set [six] contains a value that is not a number")
        );

        let options = StartOptions::from_options(&[CommandOption::integer("sides", 10)]);
        assert_eq!(family.validate_start(&options), None);
    }

    #[test]
    fn start_options_build_sorted_sets() {
        let family = HoldRerollFamily;
        let options = StartOptions::from_options(&[
            CommandOption::integer("sides", 10),
            CommandOption::string("reroll_set", "9, 8, 9"),
            CommandOption::string("success_set", "10"),
            CommandOption::string("failure_set", "1,2"),
        ]);

        let config = family.config_from_start(&options).expect("config builds");

        assert_eq!(
            config,
            HoldRerollConfig {
                sides: 10,
                reroll_set: vec![8, 9],
                success_set: vec![10],
                failure_set: vec![1, 2],
            }
        );
    }
}
