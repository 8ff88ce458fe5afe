use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

use super::snowflake;
use super::store;
use crate::error::Result;

/// Persisted record for one queue channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct ChannelRecord {
    #[serde(default, deserialize_with = "snowflake::list")]
    testers: Vec<u64>,

    #[serde(
        default,
        deserialize_with = "snowflake::opt",
        skip_serializing_if = "Option::is_none"
    )]
    message_id: Option<u64>,
}

/// Whole queue-state document: channel id (as string) -> record
type QueueStateDocument = BTreeMap<String, ChannelRecord>;

/// Tester queue of a single channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TesterQueueState {
    pub channel_id: ChannelId,
    /// Testers in join order
    pub testers: Vec<UserId>,
    /// Last rendered status message, if any
    pub status_message_id: Option<MessageId>,
}

impl TesterQueueState {
    fn from_record(channel_id: ChannelId, record: &ChannelRecord) -> Self {
        Self {
            channel_id,
            testers: record
                .testers
                .iter()
                .copied()
                .filter_map(snowflake::typed)
                .collect(),
            status_message_id: record.message_id.and_then(snowflake::typed),
        }
    }
}

/// Per-channel tester queues, backed by one JSON object keyed by channel id.
///
/// The repository stores exactly what it is given. Keeping `testers` free of
/// duplicates is the caller's job.
///
/// Clones share one document lock, so writes for different channels never
/// overwrite each other.
#[derive(Debug, Clone)]
pub struct QueueStateRepository {
    path: PathBuf,
    document_lock: Arc<Mutex<()>>,
}

impl QueueStateRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            document_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load_document(&self) -> Result<QueueStateDocument> {
        store::load_or_default(&self.path).await
    }

    async fn update<F>(&self, channel_id: ChannelId, apply: F) -> Result<()>
    where
        F: FnOnce(&mut ChannelRecord),
    {
        let _guard = self.document_lock.lock().await;
        let mut document = self.load_document().await?;
        apply(document.entry(channel_key(channel_id)).or_default());
        store::save(&self.path, &document).await
    }

    /// Queue state for a channel, `None` if the channel was never set up
    pub async fn get(&self, channel_id: ChannelId) -> Result<Option<TesterQueueState>> {
        let document = self.load_document().await?;
        Ok(document
            .get(&channel_key(channel_id))
            .map(|record| TesterQueueState::from_record(channel_id, record)))
    }

    /// Testers of a channel in join order; empty for unknown channels
    pub async fn get_testers(&self, channel_id: ChannelId) -> Result<Vec<UserId>> {
        Ok(self
            .get(channel_id)
            .await?
            .map(|state| state.testers)
            .unwrap_or_default())
    }

    /// Replace the tester sequence of a channel, creating the record if needed
    pub async fn set_testers(&self, channel_id: ChannelId, testers: &[UserId]) -> Result<()> {
        debug!("Queue {}: saving {} tester(s)", channel_id, testers.len());
        let testers: Vec<u64> = testers.iter().map(|t| t.get()).collect();
        self.update(channel_id, |record| record.testers = testers).await
    }

    pub async fn get_status_message_id(&self, channel_id: ChannelId) -> Result<Option<MessageId>> {
        Ok(self
            .get(channel_id)
            .await?
            .and_then(|state| state.status_message_id))
    }

    /// Remember the status message rendered in a channel
    pub async fn set_status_message_id(
        &self,
        channel_id: ChannelId,
        message_id: MessageId,
    ) -> Result<()> {
        self.update(channel_id, |record| record.message_id = Some(message_id.get()))
            .await
    }

    /// All channels that have a queue record, in ascending id order
    pub async fn channels(&self) -> Result<Vec<ChannelId>> {
        let document = self.load_document().await?;
        let mut channels: Vec<ChannelId> = document
            .keys()
            .filter_map(|key| key.parse::<u64>().ok())
            .filter_map(snowflake::typed)
            .collect();
        channels.sort();
        Ok(channels)
    }
}

fn channel_key(channel_id: ChannelId) -> String {
    channel_id.get().to_string()
}
