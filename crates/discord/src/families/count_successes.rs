//! Pool rolls against a target number: every die at or above the target is
//! a success. Optional glitch rules fold the rolled ones into the result.

use dicey_core::engine::{make_bold, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::protocol::{decode, encode, field_or};

use crate::commands::{OptionDefinition, SlashDefinition, StartOptions};
use crate::components::{
    partition_buttons, ButtonComponent, ComponentRow, EmbedTemplate, MAX_BUTTONS_PER_ROW,
    MAX_ROWS_PER_MESSAGE,
};
use crate::events::ComponentEvent;
use crate::families::{standard_definition, CommandFamily};

/// Bound for the numeric start options, matching the expression engine's
/// die bounds.
const OPTION_BOUND: i64 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlitchOption {
    NoGlitch,
    HalfDiceOne,
    CountOnes,
    SubtractOnes,
}

impl GlitchOption {
    /// Unknown spellings fall back to no glitch, which also covers ids
    /// written before the glitch field existed.
    fn parse(value: &str) -> Self {
        match value {
            "half_dice_one" => Self::HalfDiceOne,
            "count_ones" => Self::CountOnes,
            "subtract_ones" => Self::SubtractOnes,
            _ => Self::NoGlitch,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::NoGlitch => "no_glitch",
            Self::HalfDiceOne => "half_dice_one",
            Self::CountOnes => "count_ones",
            Self::SubtractOnes => "subtract_ones",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountSuccessesConfig {
    pub sides: u32,
    pub target: u32,
    pub glitch: GlitchOption,
    pub max_dice: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountSuccessesState {
    pub dice: u32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct CountSuccessesFamily;

impl CommandFamily for CountSuccessesFamily {
    const NAME: &'static str = "count_successes";
    type Config = CountSuccessesConfig;
    type State = CountSuccessesState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure buttons for dice, with the same side, that counts successes against \
             a target number",
            vec![
                OptionDefinition::integer("dice_sides", "Dice side"),
                OptionDefinition::integer("target_number", "Target number"),
                OptionDefinition::string("glitch", "Glitch rule")
                    .choice("no_glitch")
                    .choice("half_dice_one")
                    .choice("count_ones")
                    .choice("subtract_ones"),
                OptionDefinition::integer("max_dice", "Number of dice buttons"),
            ],
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/count_successes",
            "Use '/count_successes start dice_sides:X target_number:Y' to get buttons that \
             roll with X sided dice against the target of Y and count the successes. \
             A successes are all dice that have a result greater or equal then the target number",
        )
        .field("Example", "/count_successes start dice_sides:10 target_number:7")
    }

    fn config_from_start(
        &self,
        options: &StartOptions,
    ) -> Result<CountSuccessesConfig, DomainError> {
        Ok(CountSuccessesConfig {
            sides: bounded(options.integer_or("dice_sides", 6)),
            target: bounded(options.integer_or("target_number", 6)),
            glitch: GlitchOption::parse(options.string_or("glitch", "no_glitch")),
            max_dice: bounded(options.integer_or("max_dice", 15)),
        })
    }

    fn config_from_event(
        &self,
        event: &ComponentEvent,
    ) -> Result<CountSuccessesConfig, DomainError> {
        let fields = decode(&event.custom_id);
        Ok(CountSuccessesConfig {
            sides: numeric_field(&fields, 2, "", "dice sides")?,
            target: numeric_field(&fields, 3, "", "target number")?,
            glitch: GlitchOption::parse(field_or(&fields, 4, "no_glitch")),
            max_dice: numeric_field(&fields, 5, "15", "max dice")?,
        })
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        _random: &mut dyn RandomSource,
    ) -> Result<CountSuccessesState, DomainError> {
        let fields = decode(&event.custom_id);
        Ok(CountSuccessesState { dice: numeric_field(&fields, 1, "", "dice count")? })
    }

    fn layout(
        &self,
        config: &CountSuccessesConfig,
        _state: Option<&CountSuccessesState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        let visible = config.max_dice.min((MAX_BUTTONS_PER_ROW * MAX_ROWS_PER_MESSAGE) as u32);
        let mut buttons = Vec::with_capacity(visible as usize);
        for count in 1..=visible {
            let id = encode(&[
                Self::NAME,
                &count.to_string(),
                &config.sides.to_string(),
                &config.target.to_string(),
                config.glitch.as_str(),
                &config.max_dice.to_string(),
            ])?;
            buttons.push(ButtonComponent::new(id, format!("{count}d{}", config.sides)));
        }
        Ok(partition_buttons(buttons))
    }

    fn answer(
        &self,
        state: &CountSuccessesState,
        config: &CountSuccessesConfig,
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        let values: Vec<i32> =
            (0..state.dice).map(|_| random.uniform(1, config.sides as i32)).collect();
        Ok(Some(render_result(state.dice, config, &values)))
    }

    fn prompt(&self, config: &CountSuccessesConfig) -> String {
        let base = format!("Click to roll the dice against {}", config.target);
        match config.glitch {
            GlitchOption::NoGlitch => base,
            GlitchOption::HalfDiceOne => {
                format!("{base} and check for more then half of dice 1s")
            }
            GlitchOption::CountOnes => format!("{base} and count the 1s"),
            GlitchOption::SubtractOnes => format!("{base} minus 1s"),
        }
    }

    fn prompt_after_click(
        &self,
        _state: &CountSuccessesState,
        config: &CountSuccessesConfig,
    ) -> Option<String> {
        Some(self.prompt(config))
    }

    fn config_fields(&self, config: &CountSuccessesConfig) -> Vec<String> {
        vec![
            config.sides.to_string(),
            config.target.to_string(),
            config.glitch.as_str().to_owned(),
            config.max_dice.to_string(),
        ]
    }
}

fn bounded(value: i64) -> u32 {
    value.clamp(1, OPTION_BOUND) as u32
}

fn numeric_field(
    fields: &[String],
    index: usize,
    default: &str,
    what: &str,
) -> Result<u32, DomainError> {
    field_or(fields, index, default).parse().map_err(|_| DomainError::StateReconstruction {
        message: format!("{what} missing from custom id"),
    })
}

fn render_result(dice: u32, config: &CountSuccessesConfig, values: &[i32]) -> RollAnswer {
    let expression = format!("{dice}d{}", config.sides);
    let target = config.target as i32;
    let successes = values.iter().filter(|value| **value >= target).count();
    let ones = values.iter().filter(|value| **value == 1).count();

    match config.glitch {
        GlitchOption::NoGlitch => RollAnswer::new(
            format!("{expression} = {successes}"),
            format!("[{}] \u{2265}{target} = {successes}", marked(values, target, false)),
        ),
        GlitchOption::HalfDiceOne => {
            if ones > values.len() / 2 {
                RollAnswer::new(
                    format!("{expression} = {successes} - Glitch!"),
                    format!(
                        "[{}] \u{2265}{target} = {successes} and more then half of all dice \
                         show 1s",
                        marked(values, target, true)
                    ),
                )
            } else {
                RollAnswer::new(
                    format!("{expression} = {successes}"),
                    format!("[{}] \u{2265}{target} = {successes}", marked(values, target, false)),
                )
            }
        }
        GlitchOption::CountOnes => RollAnswer::new(
            format!("{expression} = {successes} successes and {ones} ones"),
            format!("[{}] \u{2265}{target} = {successes}", marked(values, target, true)),
        ),
        GlitchOption::SubtractOnes => {
            let aggregate = successes as i32 - ones as i32;
            RollAnswer::new(
                format!("{expression} = {aggregate}"),
                format!("[{}] \u{2265}{target} -1s = {aggregate}", marked(values, target, true)),
            )
        }
    }
}

/// Dice list with successes, and optionally ones, in bold.
fn marked(values: &[i32], target: i32, bold_ones: bool) -> String {
    values
        .iter()
        .map(|value| {
            if *value >= target || (bold_ones && *value == 1) {
                make_bold(*value)
            } else {
                value.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}
