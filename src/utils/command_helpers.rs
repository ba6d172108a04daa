use serenity::model::{
    application::{CommandInteraction, ComponentInteraction},
    user::User,
};

/// Gives access to the user behind a Discord interaction.
///
/// Implemented for slash command and message component interactions so the
/// same helpers serve both `/checkin` and the check-in button.
pub trait InteractionUser {
    fn invoking_user(&self) -> &User;
}

impl InteractionUser for CommandInteraction {
    fn invoking_user(&self) -> &User {
        &self.user
    }
}

impl InteractionUser for ComponentInteraction {
    fn invoking_user(&self) -> &User {
        &self.user
    }
}

/// Extracts the user ID and username from a Discord interaction.
///
/// This function never fails as interactions always carry a user.
///
/// # Arguments
/// * `interaction` - A command or component interaction
///
/// # Returns
/// * `(String, String)` - The user ID and the current username
///
/// # Example
/// ```rust
/// let (user_id, username) = get_user(component);
/// ```
pub fn get_user<I: InteractionUser>(interaction: &I) -> (String, String) {
    let user = interaction.invoking_user();
    (user.id.to_string(), user.name.clone())
}

/// Checks whether the invoking member has administrator permissions.
///
/// # Arguments
/// * `command` - The Discord command interaction
///
/// # Returns
/// * `true` - If the member's resolved permissions include administrator
/// * `false` - Otherwise, including when the command was used outside a server
///
/// # Example
/// ```rust
/// if !is_admin(command) {
///     // reject the command
/// }
/// ```
pub fn is_admin(command: &CommandInteraction) -> bool {
    command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .map(|permissions| permissions.administrator())
        .unwrap_or(false)
}
