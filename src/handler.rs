use serenity::{
    async_trait,
    gateway::ActivityData,
    model::{application::Interaction, gateway::Ready, user::OnlineStatus},
    prelude::*,
};
use tracing::{info, error};
use crate::{bot::SharedBot, commands};

pub struct Handler {
    pub bot: SharedBot,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("Ready! Logged in as {}", ready.user.tag());

        let name = self.bot.config.presence_name.clone();
        let mut activity = ActivityData::playing(name.clone());
        activity.state = Some(name);
        ctx.set_presence(Some(activity), OnlineStatus::Online);

        if let Err(why) = commands::register_commands(&ctx).await {
            error!("Failed to register slash commands: {}", why);
        } else {
            info!("Successfully registered slash commands");
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Err(why) = commands::handle_interaction(&ctx, &interaction, self.bot.clone()).await {
            error!("Error handling interaction: {}", why);
        }
    }
}
