pub mod general;
pub mod queue;
pub mod results;
pub mod settier;
pub mod setup;

pub use general::{help, ping};
pub use queue::{create_queue, waitlist, WaitlistModal};
pub use results::results;
pub use settier::settier;
pub use setup::setup;

use poise::serenity_prelude::RoleId;

use crate::error::BotError;
use crate::{Context, Error};

/// Ephemeral text reply
pub(crate) async fn reply(ctx: Context<'_>, content: impl Into<String>) -> Result<(), Error> {
    ctx.send(
        poise::CreateReply::default()
            .content(content)
            .ephemeral(true),
    )
    .await?;
    Ok(())
}

/// Show user-facing errors to the invoker; everything else goes to the
/// framework's error handler
pub(crate) async fn reply_error(ctx: Context<'_>, err: BotError) -> Result<(), Error> {
    match err.user_message() {
        Some(text) => reply(ctx, text).await,
        None => Err(err.into()),
    }
}

/// Roles of the invoking member, empty outside guilds
pub(crate) async fn author_roles(ctx: Context<'_>) -> Vec<RoleId> {
    ctx.author_member()
        .await
        .map(|member| member.roles.clone())
        .unwrap_or_default()
}
