use poise::serenity_prelude as serenity;
use std::time::Duration;
use tracing::info;

use crate::components::ComponentId;
use crate::error::{BotError, CorruptReason};
use crate::{Context, Error};

/// Text for a tier list that could not be loaded
fn tierlist_problem(err: &BotError) -> Option<&'static str> {
    match err {
        BotError::CorruptState {
            reason: CorruptReason::Missing,
            ..
        } => Some("Tierlist file not found."),
        BotError::CorruptState { .. } => Some("Tierlist file is invalid."),
        _ => None,
    }
}

/// Set a user's tier for a gamemode (admin only, does not broadcast)
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    required_permissions = "ADMINISTRATOR"
)]
pub async fn settier(
    ctx: Context<'_>,
    #[description = "Discord user to set tier for"] discord_user: serenity::User,
    #[description = "Minecraft IGN"] ign: String,
    #[description = "Tier to set (e.g., HT1, LT3)"] new_tier: String,
    #[description = "Gamemode (e.g., Sword, Mace)"] gamemode: String,
) -> Result<(), Error> {
    let data = ctx.data();
    let ign = ign.trim();
    let new_tier = new_tier.trim();
    let gamemode = gamemode.trim();

    if let Err(e) = data.tierlist.assign(gamemode, new_tier, ign).await {
        return match tierlist_problem(&e) {
            Some(text) => super::reply(ctx, text).await,
            None => super::reply_error(ctx, e).await,
        };
    }

    let discord_id = discord_user.id.to_string();
    let meta = data.user_meta.load().await?;
    if !meta.needs_override(&discord_id, ign) {
        data.user_meta.link(&discord_id, ign).await?;
        return super::reply(
            ctx,
            format!("Set {} to {} in {}.", ign, new_tier, gamemode),
        )
        .await;
    }

    let buttons = vec![
        serenity::CreateButton::new(ComponentId::OverrideConfirm.as_str())
            .label("Override")
            .style(serenity::ButtonStyle::Danger),
        serenity::CreateButton::new(ComponentId::OverrideCancel.as_str())
            .label("Cancel")
            .style(serenity::ButtonStyle::Secondary),
    ];
    let reply = ctx
        .send(
            poise::CreateReply::default()
                .content(format!(
                    "Set {} to {} in {}. IGN `{}` is already mapped to another user or this user has a different IGN. Override?",
                    ign, new_tier, gamemode, ign
                ))
                .components(vec![serenity::CreateActionRow::Buttons(buttons)])
                .ephemeral(true),
        )
        .await?;
    let message = reply.message().await?;

    let Some(interaction) = message
        .await_component_interaction(ctx.serenity_context().shard.clone())
        .author_id(ctx.author().id)
        .timeout(Duration::from_secs(60))
        .await
    else {
        info!(
            "Override of IGN '{}' for {} timed out",
            ign, discord_user.name
        );
        return Ok(());
    };

    let content = match ComponentId::parse(&interaction.data.custom_id) {
        Some(ComponentId::OverrideConfirm) => {
            data.user_meta.link(&discord_id, ign).await?;
            info!(
                "{} confirmed IGN '{}' for {}",
                ctx.author().name,
                ign,
                discord_user.name
            );
            format!(
                "Override confirmed. IGN `{}` is now mapped to <@{}>.",
                ign, discord_id
            )
        }
        _ => "Override cancelled.".to_string(),
    };

    interaction
        .create_response(
            ctx.http(),
            serenity::CreateInteractionResponse::UpdateMessage(
                serenity::CreateInteractionResponseMessage::new()
                    .content(content)
                    .components(Vec::new()),
            ),
        )
        .await?;
    Ok(())
}
