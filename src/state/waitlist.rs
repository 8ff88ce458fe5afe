use chrono::{DateTime, Utc};
use poise::serenity_prelude::UserId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use super::snowflake;
use super::store;
use crate::error::{BotError, Result};

/// One player's pending request to be tested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    /// Discord user ID of the requester (snowflake as string)
    #[serde(rename = "discord_id", alias = "discordId")]
    pub requester_id: String,

    /// Player handle to be tested
    pub ign: String,

    /// Requested gamemode
    pub gamemode: String,

    /// Submission time, the only ordering key
    #[serde(rename = "timestamp")]
    pub submitted_at: DateTime<Utc>,
}

impl WaitlistEntry {
    /// Build an entry from raw form input, trimming both text fields
    pub fn new(
        requester: UserId,
        ign: &str,
        gamemode: &str,
        submitted_at: DateTime<Utc>,
    ) -> Result<Self> {
        let ign = ign.trim();
        let gamemode = gamemode.trim();

        if ign.is_empty() {
            return Err(BotError::InvalidInput {
                field: "IGN".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if gamemode.is_empty() {
            return Err(BotError::InvalidInput {
                field: "Gamemode".to_string(),
                message: "must not be empty".to_string(),
            });
        }

        Ok(Self {
            requester_id: requester.to_string(),
            ign: ign.to_string(),
            gamemode: gamemode.to_string(),
            submitted_at,
        })
    }

    /// Typed requester id, if the stored value is a valid snowflake
    pub fn requester(&self) -> Option<UserId> {
        self.requester_id
            .parse::<u64>()
            .ok()
            .and_then(snowflake::typed)
    }
}

/// Global FIFO list of pending test requests, backed by one JSON array
#[derive(Debug, Clone)]
pub struct WaitlistRepository {
    path: PathBuf,
}

impl WaitlistRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of all entries, oldest first. Unusable files read as empty.
    pub async fn list(&self) -> Result<Vec<WaitlistEntry>> {
        store::load_or_default(&self.path).await
    }

    /// Append an entry and persist. Returns the entry as stored.
    ///
    /// The submission time is clamped so the list stays ordered even if the
    /// clock steps backwards.
    pub async fn append(&self, mut entry: WaitlistEntry) -> Result<WaitlistEntry> {
        let mut entries = self.list().await?;
        if let Some(last) = entries.last() {
            if entry.submitted_at < last.submitted_at {
                entry.submitted_at = last.submitted_at;
            }
        }
        entries.push(entry.clone());
        store::save(&self.path, &entries).await?;

        info!(
            "Waitlist: added {} ({}) for {}, {} waiting",
            entry.ign,
            entry.gamemode,
            entry.requester_id,
            entries.len()
        );
        Ok(entry)
    }

    /// Remove and return the oldest entry. An empty list is left untouched.
    pub async fn pop_front(&self) -> Result<Option<WaitlistEntry>> {
        let mut entries = self.list().await?;
        if entries.is_empty() {
            return Ok(None);
        }
        let first = entries.remove(0);
        store::save(&self.path, &entries).await?;
        Ok(Some(first))
    }

    /// Number of waiting entries
    pub async fn len(&self) -> Result<usize> {
        Ok(self.list().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
