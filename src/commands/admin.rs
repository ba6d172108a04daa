use crate::{
    bot::SharedBot,
    utils::{
        command_helpers::is_admin,
        responses::{ephemeral_response, panel_components, panel_embed},
    },
};
use serenity::{
    builder::{CreateCommand, CreateMessage},
    model::{application::CommandInteraction, permissions::Permissions},
    prelude::*,
};
use tracing::{debug, error, info};

pub fn checkin_panel_command() -> CreateCommand {
    CreateCommand::new("checkin-panel")
        .description("Post the login campaign check-in button in this channel (Admin only)")
        .default_member_permissions(Permissions::ADMINISTRATOR)
        .dm_permission(false)
}

pub async fn post_checkin_panel(
    ctx: &Context,
    command: &CommandInteraction,
    bot: SharedBot,
) -> serenity::Result<()> {
    info!("Check-in panel command executed by user {}", command.user.id);

    if !is_admin(command) {
        let response = ephemeral_response("This command requires administrator permissions.");
        command.create_response(&ctx.http, response).await?;
        return Ok(());
    }

    let message = CreateMessage::new()
        .embed(panel_embed(bot.config.embed_color))
        .components(panel_components());

    if let Err(e) = command.channel_id.send_message(&ctx.http, message).await {
        error!("Failed to post check-in panel in channel {}: {}", command.channel_id, e);
        let response = ephemeral_response("Failed to post the check-in panel. Please try again.");
        command.create_response(&ctx.http, response).await?;
        return Ok(());
    }

    debug!("Posted check-in panel in channel {}", command.channel_id);
    let response = ephemeral_response("Check-in panel posted!");
    command.create_response(&ctx.http, response).await?;
    Ok(())
}
