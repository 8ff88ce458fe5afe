use chrono::Utc;
use poise::serenity_prelude as serenity;
use poise::Modal;
use tracing::{debug, error, info};

use crate::commands::WaitlistModal;
use crate::components::{ComponentId, WaitlistModalId};
use crate::error::Result as BotResult;
use crate::queue::{ActionOutcome, QueueAction};
use crate::{Data, Error};

const GENERIC_FAILURE: &str = "Something went wrong. Please try again later.";
const FORM_EXPIRED: &str = "This form has expired. Please press Join Waitlist again.";

/// Route gateway interactions that no command collector owns: the
/// persistent queue buttons and waitlist form submissions
pub async fn handle_interaction(
    ctx: &serenity::Context,
    interaction: &serenity::Interaction,
    data: &Data,
) -> Result<(), Error> {
    match interaction {
        serenity::Interaction::Component(component) => {
            handle_queue_button(ctx, component, data).await
        }
        serenity::Interaction::Modal(modal) => {
            match WaitlistModalId::parse(&modal.data.custom_id) {
                Some(form_id) => handle_waitlist_submission(ctx, modal, form_id, data).await,
                None => Ok(()),
            }
        }
        _ => Ok(()),
    }
}

async fn handle_queue_button(
    ctx: &serenity::Context,
    component: &serenity::ComponentInteraction,
    data: &Data,
) -> Result<(), Error> {
    let Some(id) = ComponentId::parse(&component.data.custom_id).filter(|id| id.is_persistent())
    else {
        return Ok(());
    };

    let channel_id = component.channel_id;
    let user_id = component.user.id;
    info!(
        "Queue button '{}' pressed by {} in channel {}",
        id, component.user.name, channel_id
    );

    component
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let action = match id {
        ComponentId::QueueJoin => QueueAction::JoinTester {
            channel_id,
            user_id,
            roles: component
                .member
                .as_ref()
                .map(|m| m.roles.clone())
                .unwrap_or_default(),
        },
        _ => QueueAction::LeaveTester {
            channel_id,
            user_id,
        },
    };
    let content = outcome_text(data.queue_manager.dispatch(action).await);

    component
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

async fn handle_waitlist_submission(
    ctx: &serenity::Context,
    modal: &serenity::ModalInteraction,
    form_id: WaitlistModalId,
    data: &Data,
) -> Result<(), Error> {
    if form_id.is_expired(Utc::now()) {
        info!(
            "Discarding waitlist form from {} opened at {}",
            modal.user.name, form_id.opened_at
        );
        modal
            .create_response(
                &ctx.http,
                serenity::CreateInteractionResponse::Message(
                    serenity::CreateInteractionResponseMessage::new()
                        .content(FORM_EXPIRED)
                        .ephemeral(true),
                ),
            )
            .await?;
        return Ok(());
    }

    let form = match WaitlistModal::parse(modal.data.clone()) {
        Ok(form) => form,
        Err(e) => {
            debug!("Unreadable waitlist form from {}: {}", modal.user.name, e);
            return Ok(());
        }
    };

    modal
        .create_response(
            &ctx.http,
            serenity::CreateInteractionResponse::Defer(
                serenity::CreateInteractionResponseMessage::new().ephemeral(true),
            ),
        )
        .await?;

    let action = QueueAction::Apply {
        user_id: modal.user.id,
        ign: form.ign,
        gamemode: form.gamemode,
    };
    let content = outcome_text(data.queue_manager.dispatch(action).await);

    modal
        .create_followup(
            &ctx.http,
            serenity::CreateInteractionResponseFollowup::new()
                .content(content)
                .ephemeral(true),
        )
        .await?;
    Ok(())
}

/// Ephemeral reply for a queue action result
fn outcome_text(result: BotResult<ActionOutcome>) -> String {
    match result {
        Ok(outcome) => outcome.reply(),
        Err(e) => e.user_message().unwrap_or_else(|| {
            error!("Queue action failed: {}", e);
            GENERIC_FAILURE.to_string()
        }),
    }
}
