use poise::serenity_prelude::{self as serenity, Mentionable};
use tracing::{info, warn};

use crate::error::BotError;
use crate::{Context, Error};

/// One finished tier test
struct TestResult {
    tester: serenity::UserId,
    player: serenity::UserId,
    ign: String,
    device: String,
    previous_tier: String,
    new_tier: String,
    gamemode: String,
}

impl TestResult {
    fn title(&self) -> String {
        format!("Test Results of {}", self.ign)
    }

    fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Tester", self.tester.mention().to_string()),
            ("Discord", self.player.mention().to_string()),
            ("IGN", self.ign.clone()),
            ("Device", self.device.clone()),
            ("Previous Tier", self.previous_tier.clone()),
            ("New Tier", self.new_tier.clone()),
            ("Gamemode", self.gamemode.clone()),
        ]
    }

    fn thumbnail_url(&self) -> String {
        format!("https://minotar.net/helm/{}/100.png", self.ign)
    }

    fn embed(&self) -> serenity::CreateEmbed {
        self.fields().into_iter().fold(
            serenity::CreateEmbed::new()
                .title(self.title())
                .color(0x2ECC71)
                .thumbnail(self.thumbnail_url()),
            |embed, (name, value)| embed.field(name, value, false),
        )
    }
}

/// Post a tier test result embed
#[poise::command(slash_command, guild_only)]
pub async fn results(
    ctx: Context<'_>,
    #[description = "Discord user who tested"] tester: serenity::User,
    #[description = "Discord user tested"] discord_user: serenity::User,
    #[description = "Minecraft IGN"] ign: String,
    #[description = "Device used"] device: String,
    #[description = "Previous tier"] previous_tier: String,
    #[description = "New tier"] new_tier: String,
    #[description = "Gamemode (e.g., Mace)"] gamemode: String,
) -> Result<(), Error> {
    let settings = ctx.data().settings.load().await?;

    let roles = super::author_roles(ctx).await;
    if !settings.can_post_results(&roles) {
        info!("{} may not post results", ctx.author().name);
        return super::reply_error(
            ctx,
            BotError::AuthorizationDenied {
                message: "You do not have permission to use this command.".to_string(),
            },
        )
        .await;
    }

    let Some(channel_id) = settings.results_channel_id() else {
        return super::reply_error(
            ctx,
            BotError::MissingConfiguration {
                key: "Results channel".to_string(),
            },
        )
        .await;
    };

    let result = TestResult {
        tester: tester.id,
        player: discord_user.id,
        ign,
        device,
        previous_tier,
        new_tier,
        gamemode,
    };

    match channel_id
        .send_message(ctx.http(), serenity::CreateMessage::new().embed(result.embed()))
        .await
    {
        Ok(_) => {
            info!(
                "{} posted results for {} in {}",
                ctx.author().name,
                result.ign,
                channel_id
            );
            super::reply(ctx, format!("Result posted in {}", channel_id.mention())).await
        }
        Err(e) => {
            warn!("Could not post results in {}: {}", channel_id, e);
            super::reply(
                ctx,
                "Configured results channel not found or I lack permission to post there.",
            )
            .await
        }
    }
}
