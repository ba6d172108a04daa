use crate::{
    bot::SharedBot,
    streaks::local_date,
    utils::{
        command_helpers::get_user,
        responses::{checkin_embed, cooldown_message, ephemeral_response, failure_message},
    },
};
use chrono::Utc;
use serenity::{
    builder::{CreateCommand, EditInteractionResponse},
    model::application::{CommandInteraction, ComponentInteraction},
    prelude::*,
};
use tracing::{error, info};

pub fn register() -> CreateCommand {
    CreateCommand::new("checkin").description("Check in for today's login campaign")
}

pub async fn run(ctx: &Context, command: &CommandInteraction, bot: SharedBot) -> serenity::Result<()> {
    let (user_id, username) = get_user(command);
    info!("Check-in command executed by user {}", user_id);

    if let Err(remaining) = bot.cooldowns.try_acquire(&user_id).await {
        let response = ephemeral_response(&cooldown_message(remaining.as_secs()));
        command.create_response(&ctx.http, response).await?;
        return Ok(());
    }

    command.defer_ephemeral(&ctx.http).await?;
    let reply = checkin_reply(&bot, &user_id, &username).await;
    command.edit_response(&ctx.http, reply).await?;
    Ok(())
}

pub async fn run_button(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: SharedBot,
) -> serenity::Result<()> {
    let (user_id, username) = get_user(component);
    info!("Check-in button pressed by user {}", user_id);

    if let Err(remaining) = bot.cooldowns.try_acquire(&user_id).await {
        let response = ephemeral_response(&cooldown_message(remaining.as_secs()));
        component.create_response(&ctx.http, response).await?;
        return Ok(());
    }

    component.defer_ephemeral(&ctx.http).await?;
    let reply = checkin_reply(&bot, &user_id, &username).await;
    component.edit_response(&ctx.http, reply).await?;
    Ok(())
}

async fn checkin_reply(bot: &SharedBot, user_id: &str, username: &str) -> EditInteractionResponse {
    let today = local_date(Utc::now(), bot.config.timezone);

    match bot.engine.process_checkin(user_id, username, today).await {
        Ok(outcome) => {
            let embed = checkin_embed(&outcome, bot.config.grace_days, bot.config.embed_color);
            EditInteractionResponse::new().embed(embed)
        }
        Err(e) => {
            error!("Check-in for user {} on {} failed: {}", user_id, today, e);
            EditInteractionResponse::new().content(failure_message(e.is_retryable()))
        }
    }
}
