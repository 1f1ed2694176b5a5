//! The `/r` command. One expression in, one public answer out, no buttons
//! and no cache bookkeeping.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use dicey_core::engine::{
    expand, fold_outcomes, validate_list, RandomSource, ThreadRngSource,
};
use dicey_core::errors::{ApplicationError, DomainError};

use crate::commands::{OptionDefinition, SlashCommandPayload, SlashDefinition, StartOptions};
use crate::components::{answer_embed, EmbedTemplate};
use crate::events::{EventContext, HandlerResult, InteractionReply, SlashHandler};
use crate::families::{EXPRESSION_HELP, LABEL_DELIMITER};

pub struct DirectRollHandler {
    random: Mutex<Box<dyn RandomSource + Send>>,
}

impl Default for DirectRollHandler {
    fn default() -> Self {
        Self { random: Mutex::new(Box::new(ThreadRngSource)) }
    }
}

impl DirectRollHandler {
    /// Swaps the random source, used by tests to script rolls.
    pub fn with_random(random: Box<dyn RandomSource + Send>) -> Self {
        Self { random: Mutex::new(random) }
    }

    fn lock_random(&self) -> MutexGuard<'_, Box<dyn RandomSource + Send>> {
        match self.random.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn help_embed() -> EmbedTemplate {
        EmbedTemplate::new(
            "/r",
            "Type the dice expression after the command, e.g. '/r expression:3d6'. The \
             result is posted to the channel.",
        )
        .field("Expression syntax", EXPRESSION_HELP)
    }
}

#[async_trait]
impl SlashHandler for DirectRollHandler {
    fn command_name(&self) -> &'static str {
        "r"
    }

    fn definition(&self) -> SlashDefinition {
        SlashDefinition::new("r", "direct roll of dice expression").option(
            OptionDefinition::string("expression", "dice expression, e.g. '2d6'").required(),
        )
    }

    async fn handle_slash(
        &self,
        payload: &SlashCommandPayload,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError> {
        let options = StartOptions::from_options(&payload.options);
        let raw = options.string_or("expression", "help").trim();

        if raw.eq_ignore_ascii_case("help") {
            return Ok(HandlerResult::Responded(InteractionReply::ephemeral_embed(
                Self::help_embed(),
            )));
        }
        if let Some(message) = validate_list(&[raw.to_owned()], LABEL_DELIMITER, ',', "/r help") {
            return Ok(HandlerResult::Responded(InteractionReply::ephemeral_text(message)));
        }

        let (expression, label) = match raw.split_once(LABEL_DELIMITER) {
            Some((expression, label)) => (expression, Some(label.trim())),
            None => (raw, None),
        };
        let answer = {
            let mut random = self.lock_random();
            let outcomes = expand(expression, &mut **random).map_err(DomainError::from)?;
            fold_outcomes(outcomes, label)
        };
        Ok(HandlerResult::Responded(InteractionReply::public_embed(answer_embed(&answer))))
    }
}
