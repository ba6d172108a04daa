pub mod admin;
pub mod checkin;

use crate::{bot::SharedBot, utils::responses::CHECKIN_BUTTON_ID};
use serenity::{
    model::application::{Command, Interaction},
    prelude::*,
};

pub async fn register_commands(ctx: &Context) -> serenity::Result<()> {
    let commands = vec![checkin::register(), admin::checkin_panel_command()];

    Command::set_global_commands(&ctx.http, commands).await?;
    Ok(())
}

pub async fn handle_interaction(
    ctx: &Context,
    interaction: &Interaction,
    bot: SharedBot,
) -> serenity::Result<()> {
    match interaction {
        Interaction::Command(command) => match command.data.name.as_str() {
            "checkin" => checkin::run(ctx, command, bot).await?,
            "checkin-panel" => admin::post_checkin_panel(ctx, command, bot).await?,
            _ => {
                tracing::warn!("Unknown command: {}", command.data.name);
            }
        },
        Interaction::Component(component) => match component.data.custom_id.as_str() {
            CHECKIN_BUTTON_ID => checkin::run_button(ctx, component, bot).await?,
            _ => {
                tracing::warn!("Unknown component: {}", component.data.custom_id);
            }
        },
        _ => {}
    }
    Ok(())
}
