//! Outbound side of the queue: posting and editing status messages.

use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, ChannelId, MessageId};
use std::sync::Arc;

use super::matchmaking::Pairing;
use super::view::QueueView;
use crate::error::{BotError, Result};

/// Delivers queue output to the chat platform
#[async_trait]
pub trait QueueTransport: Send + Sync {
    /// Post a new status message and return its id
    async fn send_status(&self, channel_id: ChannelId, view: &QueueView) -> Result<MessageId>;

    /// Replace the content of an existing status message
    async fn edit_status(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        view: &QueueView,
    ) -> Result<()>;

    /// Tell the queue channel who was matched
    async fn announce_pairing(&self, pairing: &Pairing) -> Result<()>;
}

/// [`QueueTransport`] over the serenity HTTP client
pub struct DiscordTransport {
    http: Arc<serenity::Http>,
}

impl DiscordTransport {
    pub fn new(http: Arc<serenity::Http>) -> Self {
        Self { http }
    }
}

fn delivery_error(action: &str, channel_id: ChannelId, err: serenity::Error) -> BotError {
    BotError::TransportDelivery {
        message: format!("{} in channel {}: {}", action, channel_id, err),
    }
}

#[async_trait]
impl QueueTransport for DiscordTransport {
    async fn send_status(&self, channel_id: ChannelId, view: &QueueView) -> Result<MessageId> {
        let message = channel_id
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .embed(view.embed())
                    .components(QueueView::components()),
            )
            .await
            .map_err(|e| delivery_error("send status", channel_id, e))?;
        Ok(message.id)
    }

    async fn edit_status(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
        view: &QueueView,
    ) -> Result<()> {
        channel_id
            .edit_message(
                self.http.as_ref(),
                message_id,
                serenity::EditMessage::new()
                    .embed(view.embed())
                    .components(QueueView::components()),
            )
            .await
            .map_err(|e| delivery_error("edit status", channel_id, e))?;
        Ok(())
    }

    async fn announce_pairing(&self, pairing: &Pairing) -> Result<()> {
        let mentions = serenity::CreateAllowedMentions::new().users(
            std::iter::once(pairing.tester).chain(pairing.player.requester()),
        );
        pairing
            .channel_id
            .send_message(
                self.http.as_ref(),
                serenity::CreateMessage::new()
                    .content(pairing.announcement())
                    .allowed_mentions(mentions),
            )
            .await
            .map_err(|e| delivery_error("announce pairing", pairing.channel_id, e))?;
        Ok(())
    }
}
