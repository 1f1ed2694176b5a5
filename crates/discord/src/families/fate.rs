//! Four fate dice per click. The simple layout has a single roll button,
//! the modifier layout adds a flat bonus picked from the button row.

use dicey_core::engine::{evaluate, DiceExpr, DieSides, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::protocol::{decode, encode, field_or};

use crate::commands::{OptionDefinition, SlashDefinition, StartOptions};
use crate::components::{partition_buttons, ButtonComponent, ComponentRow, EmbedTemplate};
use crate::events::ComponentEvent;
use crate::families::{standard_definition, CommandFamily};

const ROLL_ACTION: &str = "roll";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FateMode {
    Simple,
    WithModifier,
}

impl FateMode {
    fn parse(value: &str) -> Self {
        if value == "with_modifier" {
            Self::WithModifier
        } else {
            Self::Simple
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::WithModifier => "with_modifier",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FateConfig {
    pub mode: FateMode,
}

/// The clicked modifier. The plain roll button carries no modifier and
/// behaves like zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FateState {
    pub modifier: i32,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FateFamily;

impl CommandFamily for FateFamily {
    const NAME: &'static str = "fate";
    type Config = FateConfig;
    type State = FateState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure buttons for fate dice",
            vec![OptionDefinition::string("type", "Type of the fate dice set")
                .choice("simple")
                .choice("with_modifier")],
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/fate",
            "Use '/fate start type:simple' to get a button that rolls four fate dice, or \
             '/fate start type:with_modifier' to also pick a modifier that is added to the roll",
        )
        .field("Example", "/fate start type:with_modifier")
    }

    fn config_from_start(&self, options: &StartOptions) -> Result<FateConfig, DomainError> {
        Ok(FateConfig { mode: FateMode::parse(options.string_or("type", "simple")) })
    }

    fn config_from_event(&self, event: &ComponentEvent) -> Result<FateConfig, DomainError> {
        let fields = decode(&event.custom_id);
        Ok(FateConfig { mode: FateMode::parse(field_or(&fields, 2, "simple")) })
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        _random: &mut dyn RandomSource,
    ) -> Result<FateState, DomainError> {
        let fields = decode(&event.custom_id);
        let action = field_or(&fields, 1, ROLL_ACTION);
        if action == ROLL_ACTION {
            return Ok(FateState { modifier: 0 });
        }
        let modifier = action.parse().map_err(|_| DomainError::StateReconstruction {
            message: format!("fate modifier {action:?} is not a number"),
        })?;
        Ok(FateState { modifier })
    }

    fn layout(
        &self,
        config: &FateConfig,
        _state: Option<&FateState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        let buttons = match config.mode {
            FateMode::Simple => {
                let id = encode(&[Self::NAME, ROLL_ACTION, config.mode.as_str()])?;
                vec![ButtonComponent::new(id, "Roll 4dF")]
            }
            FateMode::WithModifier => {
                let mut buttons = Vec::new();
                for modifier in -4..=10 {
                    let id =
                        encode(&[Self::NAME, &modifier.to_string(), config.mode.as_str()])?;
                    buttons.push(ButtonComponent::new(id, modifier_label(modifier)));
                }
                buttons
            }
        };
        Ok(partition_buttons(buttons))
    }

    fn answer(
        &self,
        state: &FateState,
        _config: &FateConfig,
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        let outcome =
            evaluate(&DiceExpr::DieRoll { count: 4, sides: DieSides::Fate }, random);
        let total = outcome.aggregate + state.modifier;
        let title = match state.modifier {
            modifier if modifier > 0 => format!("4dF +{modifier} = {total}"),
            modifier if modifier < 0 => format!("4dF {modifier} = {total}"),
            _ => format!("4dF = {total}"),
        };
        Ok(Some(RollAnswer::new(title, outcome.detail)))
    }

    fn prompt(&self, config: &FateConfig) -> String {
        match config.mode {
            FateMode::Simple => "Click a button to roll four fate dice".to_owned(),
            FateMode::WithModifier => {
                "Click a button to roll four fate dice and add the value of the button"
                    .to_owned()
            }
        }
    }

    fn config_fields(&self, config: &FateConfig) -> Vec<String> {
        vec![config.mode.as_str().to_owned()]
    }
}

fn modifier_label(modifier: i32) -> String {
    if modifier > 0 {
        format!("+{modifier}")
    } else {
        modifier.to_string()
    }
}
