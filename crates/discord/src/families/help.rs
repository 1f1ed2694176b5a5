//! The `/help` command, a static ephemeral embed pointing at the per
//! command help subcommands.

use async_trait::async_trait;

use dicey_core::errors::ApplicationError;

use crate::commands::{SlashCommandPayload, SlashDefinition};
use crate::events::{EventContext, HandlerResult, InteractionReply, SlashHandler};

pub struct HelpHandler;

const DOCUMENTATION_URL: &str = "https://github.com/dicey-rs/dicey";

#[async_trait]
impl SlashHandler for HelpHandler {
    fn command_name(&self) -> &'static str {
        "help"
    }

    fn definition(&self) -> SlashDefinition {
        SlashDefinition::new("help", "Help to the commands and links for further information")
    }

    async fn handle_slash(
        &self,
        _payload: &SlashCommandPayload,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, ApplicationError> {
        let embed = crate::components::EmbedTemplate::new(
            "/help",
            "Roll dice over slash commands and buttons. Every button command has 'start', \
             'clear' and 'help' subcommands; '/r' rolls an expression directly.",
        )
        .field(
            "Command help",
            "type '/count_successes help', '/custom_dice help' or '/fate help' to get help \
             for the commands",
        )
        .field("Full documentation", DOCUMENTATION_URL);
        Ok(HandlerResult::Responded(InteractionReply::ephemeral_embed(embed)))
    }
}
