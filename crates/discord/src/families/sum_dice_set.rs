//! A shared dice pool built click by click. The set itself lives in the
//! message text, so the buttons carry nothing but their action and any
//! user can keep editing the pool until someone rolls it.

use dicey_core::engine::{evaluate, parse, RandomSource, RollAnswer};
use dicey_core::errors::DomainError;
use dicey_core::protocol::{decode, encode, field_or};

use crate::commands::{SlashDefinition, StartOptions};
use crate::components::{partition_buttons, ButtonComponent, ButtonStyle, ComponentRow, EmbedTemplate};
use crate::events::ComponentEvent;
use crate::families::{standard_definition, CommandFamily};

const PROMPT: &str = "Click on the buttons to add dice to the set";

/// Die types in display order. The pool renders d4 first and the flat
/// modifier last, whatever order the buttons were clicked in.
const DIE_TYPES: [u32; 6] = [4, 6, 8, 10, 12, 20];
const DICE_CAP: i32 = 100;

const MODIFY_ACTIONS: [&str; 18] = [
    "+1d4", "-1d4", "+1d6", "-1d6", "+1d8", "-1d8", "+1d10", "-1d10", "+1d12", "-1d12",
    "+1d20", "-1d20", "+1", "-1", "+5", "-5", "+10", "-10",
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DiceSet {
    counts: [i32; 6],
    modifier: i32,
}

impl DiceSet {
    pub fn is_empty(&self) -> bool {
        self.modifier == 0 && self.counts.iter().all(|count| *count == 0)
    }

    fn add_dice(&mut self, sides: u32, delta: i32) -> bool {
        let Some(index) = DIE_TYPES.iter().position(|known| *known == sides) else {
            return false;
        };
        self.counts[index] = (self.counts[index] + delta).clamp(-DICE_CAP, DICE_CAP);
        true
    }

    fn add_modifier(&mut self, delta: i32) {
        self.modifier += delta;
    }

    fn double(&mut self) {
        for count in &mut self.counts {
            *count = (*count * 2).clamp(-DICE_CAP, DICE_CAP);
        }
        self.modifier *= 2;
    }

    /// Signed terms joined with spaces; the leading term drops a positive
    /// sign so the text reads as a dice expression.
    pub fn render(&self) -> String {
        let mut terms: Vec<String> = Vec::new();
        for (index, sides) in DIE_TYPES.iter().enumerate() {
            let count = self.counts[index];
            if count != 0 {
                terms.push(format!("{count:+}d{sides}"));
            }
        }
        if self.modifier != 0 {
            terms.push(format!("{:+}", self.modifier));
        }

        let mut rendered = String::new();
        for (position, term) in terms.iter().enumerate() {
            if position == 0 {
                rendered.push_str(term.strip_prefix('+').unwrap_or(term));
            } else {
                rendered.push(' ');
                rendered.push_str(term);
            }
        }
        rendered
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SetAction {
    Modify,
    Clear,
    Roll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SumDiceSetState {
    pub set: DiceSet,
    pub action: SetAction,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SumDiceSetFamily;

impl CommandFamily for SumDiceSetFamily {
    const NAME: &'static str = "sum_dice_set";
    type Config = ();
    type State = SumDiceSetState;

    fn definition() -> SlashDefinition {
        standard_definition(
            Self::NAME,
            "Configure buttons to build a set of dice and roll the sum",
            Vec::new(),
        )
    }

    fn help() -> EmbedTemplate {
        EmbedTemplate::new(
            "/sum_dice_set",
            "Use '/sum_dice_set start' to get a message with buttons that add d4 to d20 dice \
             and flat modifiers to a shared set. Click on Roll to roll the sum of the set, \
             on x2 to double it and on Clear to empty it.",
        )
        .field("Example", "/sum_dice_set start")
    }

    fn config_from_start(&self, _options: &StartOptions) -> Result<(), DomainError> {
        Ok(())
    }

    fn config_from_event(&self, _event: &ComponentEvent) -> Result<(), DomainError> {
        Ok(())
    }

    fn state_from_event(
        &self,
        event: &ComponentEvent,
        _random: &mut dyn RandomSource,
    ) -> Result<SumDiceSetState, DomainError> {
        let mut set = parse_set(&event.message_content)?;
        let fields = decode(&event.custom_id);
        match field_or(&fields, 1, "") {
            "clear" => Ok(SumDiceSetState { set: DiceSet::default(), action: SetAction::Clear }),
            "roll" => Ok(SumDiceSetState { set, action: SetAction::Roll }),
            "x2" => {
                set.double();
                Ok(SumDiceSetState { set, action: SetAction::Modify })
            }
            term => {
                if !apply_term(term, &mut set) {
                    return Err(DomainError::StateReconstruction {
                        message: format!("unknown dice set action {term:?}"),
                    });
                }
                Ok(SumDiceSetState { set, action: SetAction::Modify })
            }
        }
    }

    fn layout(
        &self,
        _config: &(),
        _state: Option<&SumDiceSetState>,
    ) -> Result<Vec<ComponentRow>, DomainError> {
        let mut buttons = Vec::new();
        for action in MODIFY_ACTIONS {
            buttons.push(ButtonComponent::new(encode(&[Self::NAME, action])?, action));
        }
        buttons.push(ButtonComponent::new(encode(&[Self::NAME, "x2"])?, "x2"));
        buttons.push(
            ButtonComponent::new(encode(&[Self::NAME, "clear"])?, "Clear")
                .style(ButtonStyle::Danger),
        );
        buttons.push(
            ButtonComponent::new(encode(&[Self::NAME, "roll"])?, "Roll")
                .style(ButtonStyle::Success),
        );
        Ok(partition_buttons(buttons))
    }

    fn answer(
        &self,
        state: &SumDiceSetState,
        _config: &(),
        random: &mut dyn RandomSource,
    ) -> Result<Option<RollAnswer>, DomainError> {
        if state.action != SetAction::Roll || state.set.is_empty() {
            return Ok(None);
        }
        let rendered = state.set.render();
        let expr = parse(&rendered)?;
        let outcome = evaluate(&expr, random);
        Ok(Some(RollAnswer::new(
            format!("{rendered} = {}", outcome.aggregate),
            outcome.detail,
        )))
    }

    fn prompt(&self, _config: &()) -> String {
        PROMPT.to_owned()
    }

    fn prompt_after_click(&self, state: &SumDiceSetState, _config: &()) -> Option<String> {
        match state.action {
            SetAction::Clear => Some(PROMPT.to_owned()),
            SetAction::Roll => {
                if state.set.is_empty() {
                    None
                } else {
                    Some(PROMPT.to_owned())
                }
            }
            SetAction::Modify => {
                if state.set.is_empty() {
                    Some(PROMPT.to_owned())
                } else {
                    Some(state.set.render())
                }
            }
        }
    }

    fn posts_new_buttons(&self, state: &SumDiceSetState, _config: &()) -> bool {
        state.action == SetAction::Roll && !state.set.is_empty()
    }

    fn config_fields(&self, _config: &()) -> Vec<String> {
        Vec::new()
    }
}

fn parse_set(content: &str) -> Result<DiceSet, DomainError> {
    let mut set = DiceSet::default();
    if content.is_empty() || content == PROMPT {
        return Ok(set);
    }
    for token in content.split_whitespace() {
        if !apply_term(token, &mut set) {
            return Err(DomainError::StateReconstruction {
                message: format!("message text {content:?} is not a dice set"),
            });
        }
    }
    Ok(set)
}

fn apply_term(term: &str, set: &mut DiceSet) -> bool {
    let (sign, body) = match term.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, term.strip_prefix('+').unwrap_or(term)),
    };
    if let Some((count_text, sides_text)) = body.split_once('d') {
        let (Ok(count), Ok(sides)) = (count_text.parse::<i32>(), sides_text.parse::<u32>())
        else {
            return false;
        };
        set.add_dice(sides, sign * count)
    } else {
        match body.parse::<i32>() {
            Ok(value) => {
                set.add_modifier(sign * value);
                true
            }
            Err(_) => false,
        }
    }
}
