use poise::serenity_prelude::{self as serenity, Mentionable, RoleId};
use tracing::info;

use crate::error::BotError;
use crate::state::{snowflake, Settings};
use crate::{Context, Error};

/// Setup a command's configuration (admin only)
#[poise::command(
    slash_command,
    guild_only,
    default_member_permissions = "ADMINISTRATOR",
    required_permissions = "ADMINISTRATOR"
)]
pub async fn setup(
    ctx: Context<'_>,
    #[description = "The command to setup (e.g., results, createqueue)"] command: String,
    #[description = "Channel to use for the command (for results)"]
    #[channel_types("Text")]
    channel: Option<serenity::GuildChannel>,
    #[description = "Roles allowed to use the command (for results, comma-separated names or mentions)"]
    roles: Option<String>,
    #[description = "Role allowed to use Join/Leave for createqueue"] role: Option<serenity::Role>,
    #[description = "Category channel for ticket creation"]
    #[channel_types("Category")]
    category: Option<serenity::GuildChannel>,
    #[description = "Staff role for queue tickets"] staff_role: Option<serenity::Role>,
) -> Result<(), Error> {
    let settings = &ctx.data().settings;

    match command.trim().to_lowercase().as_str() {
        "results" => {
            let role_ids = match &roles {
                Some(input) => {
                    let guild_id = ctx.guild_id().ok_or_else(|| BotError::Internal {
                        message: "setup used outside a guild".to_string(),
                    })?;
                    let guild_roles: Vec<(RoleId, String)> = guild_id
                        .roles(ctx.http())
                        .await?
                        .into_iter()
                        .map(|(id, role)| (id, role.name))
                        .collect();
                    Some(resolve_roles(input, &guild_roles))
                }
                None => None,
            };

            let channel_id = channel.as_ref().map(|c| c.id.get());
            settings
                .update(|s| {
                    if let Some(id) = channel_id {
                        s.results_channel = Some(id);
                    }
                    if let Some(ids) = role_ids {
                        s.results_roles = ids;
                    }
                })
                .await?;
            info!("{} configured /results", ctx.author().name);

            super::reply(
                ctx,
                format!(
                    "/results command configured. Channel: {}, Roles: {}",
                    channel
                        .map(|c| c.mention().to_string())
                        .unwrap_or_else(|| "unchanged".to_string()),
                    roles.as_deref().unwrap_or("unchanged")
                ),
            )
            .await
        }
        "createqueue" => {
            let role_id = role.as_ref().map(|r| r.id.get());
            let category_id = category.as_ref().map(|c| c.id.get());
            let staff_id = staff_role.as_ref().map(|r| r.id.get());
            let updated = settings
                .update(|s| {
                    if role_id.is_some() {
                        s.queue_role = role_id;
                    }
                    if category_id.is_some() {
                        s.queue_category = category_id;
                    }
                    if staff_id.is_some() {
                        s.staff_role = staff_id;
                    }
                })
                .await?;
            info!("{} configured /createqueue", ctx.author().name);

            super::reply(ctx, queue_setup_summary(&updated)).await
        }
        _ => super::reply(ctx, format!("Unknown command '{}'.", command)).await,
    }
}

/// Reply after `/setup createqueue`, showing the stored values
fn queue_setup_summary(settings: &Settings) -> String {
    fn or_unset(value: Option<String>) -> String {
        value.unwrap_or_else(|| "not set".to_string())
    }

    format!(
        "/createqueue configured. Role: {}, Category: {}, Staff: {}",
        or_unset(settings.queue_tester_role().map(|r| r.mention().to_string())),
        or_unset(settings.queue_category_id().map(|c| c.mention().to_string())),
        or_unset(settings.staff_role_id().map(|r| r.mention().to_string())),
    )
}

/// Resolve comma separated role mentions, ids or names. Names match
/// case-insensitively; anything unresolvable is skipped.
fn resolve_roles(input: &str, guild_roles: &[(RoleId, String)]) -> Vec<u64> {
    input
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            snowflake::extract_id(token).or_else(|| {
                guild_roles
                    .iter()
                    .find(|(_, name)| name.eq_ignore_ascii_case(token))
                    .map(|(id, _)| id.get())
            })
        })
        .collect()
}
