use poise::serenity_prelude as serenity;
use chrono::Utc;
use poise::Modal;
use std::time::Duration;
use tracing::{info, warn};

use crate::components::{ComponentId, WaitlistModalId};
use crate::queue::QueueAction;
use crate::{Context, Error};

const WAITLIST_DESCRIPTION: &str = "Upon applying, you will be added to a gamemode-specific queue channel.\n\
Here you will be pinged when a tester is available.\n\n\
• Region should be the region of the server you wish to test on (e.g., AS, EU, NA)\n\
• Username should be the name of the account you will be testing on\n\
• Gamemode should be your preferred testing gamemode (if available)";

/// Waitlist application form
#[derive(Debug, Modal)]
#[name = "Join Waitlist"]
pub struct WaitlistModal {
    #[name = "Minecraft IGN"]
    #[placeholder = "Enter your Minecraft username"]
    pub ign: String,
    #[name = "Gamemode"]
    #[placeholder = "e.g., Sword, Mace, Crystal"]
    pub gamemode: String,
}

/// Create a testing queue embed
#[poise::command(slash_command, guild_only, rename = "createqueue")]
pub async fn create_queue(ctx: Context<'_>) -> Result<(), Error> {
    ctx.defer_ephemeral().await?;

    let action = QueueAction::CreateQueue {
        channel_id: ctx.channel_id(),
    };
    match ctx.data().queue_manager.dispatch(action).await {
        Ok(outcome) => super::reply(ctx, outcome.reply()).await,
        Err(e) => super::reply_error(ctx, e).await,
    }
}

/// Apply to the tierlist waitlist
#[poise::command(slash_command, guild_only)]
pub async fn waitlist(ctx: Context<'_>) -> Result<(), Error> {
    let embed = serenity::CreateEmbed::new()
        .title("Tierlist APP")
        .description(WAITLIST_DESCRIPTION)
        .color(0x9B59B6);

    let buttons = vec![
        serenity::CreateButton::new(ComponentId::WaitlistVerify.as_str())
            .label("✅ Verify Account Details")
            .style(serenity::ButtonStyle::Success),
        serenity::CreateButton::new(ComponentId::WaitlistJoin.as_str())
            .label("Join Waitlist")
            .style(serenity::ButtonStyle::Success),
    ];

    let reply = ctx
        .send(
            poise::CreateReply::default()
                .embed(embed)
                .components(vec![serenity::CreateActionRow::Buttons(buttons)]),
        )
        .await?;
    let message = reply.message().await?;

    while let Some(interaction) = message
        .await_component_interaction(ctx.serenity_context().shard.clone())
        .timeout(Duration::from_secs(60))
        .await
    {
        let response = match ComponentId::parse(&interaction.data.custom_id) {
            Some(ComponentId::WaitlistVerify) => serenity::CreateInteractionResponse::Message(
                serenity::CreateInteractionResponseMessage::new()
                    .content("Account verification coming soon!")
                    .ephemeral(true),
            ),
            // The submission arrives as a separate gateway event
            Some(ComponentId::WaitlistJoin) => {
                info!("User {} opened the waitlist form", interaction.user.name);
                WaitlistModal::create(None, WaitlistModalId::new(Utc::now()).encode())
            }
            _ => {
                warn!(
                    "Unknown button on waitlist prompt: {}",
                    interaction.data.custom_id
                );
                continue;
            }
        };

        if let Err(e) = interaction.create_response(ctx.http(), response).await {
            warn!("Failed to answer waitlist button: {}", e);
        }
    }

    Ok(())
}
