use poise::serenity_prelude::{ChannelId, RoleId};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::snowflake;
use super::store;
use crate::error::{BotError, Result};

/// Channel and role routing, stored in `settings.json`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Channel that `/results` posts into
    #[serde(
        default,
        deserialize_with = "snowflake::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub results_channel: Option<u64>,

    /// Roles allowed to run `/results` (empty means everyone)
    #[serde(default, deserialize_with = "snowflake::list")]
    pub results_roles: Vec<u64>,

    /// Role allowed to join/leave tester queues (unset means everyone)
    #[serde(
        default,
        deserialize_with = "snowflake::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub queue_role: Option<u64>,

    /// Category for queue tickets. Stored for the panel, unused by the queue.
    #[serde(
        default,
        deserialize_with = "snowflake::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub queue_category: Option<u64>,

    #[serde(
        default,
        deserialize_with = "snowflake::opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub staff_role: Option<u64>,
}

impl Settings {
    pub fn results_channel_id(&self) -> Option<ChannelId> {
        self.results_channel.and_then(snowflake::typed)
    }

    pub fn results_role_ids(&self) -> Vec<RoleId> {
        self.results_roles
            .iter()
            .copied()
            .filter_map(snowflake::typed)
            .collect()
    }

    pub fn queue_tester_role(&self) -> Option<RoleId> {
        self.queue_role.and_then(snowflake::typed)
    }

    pub fn queue_category_id(&self) -> Option<ChannelId> {
        self.queue_category.and_then(snowflake::typed)
    }

    pub fn staff_role_id(&self) -> Option<RoleId> {
        self.staff_role.and_then(snowflake::typed)
    }

    /// Whether a member with `roles` may join or leave a tester queue
    pub fn can_join_queue(&self, roles: &[RoleId]) -> bool {
        match self.queue_tester_role() {
            Some(required) => roles.contains(&required),
            None => true,
        }
    }

    /// Whether a member with `roles` may post results
    pub fn can_post_results(&self, roles: &[RoleId]) -> bool {
        let allowed = self.results_role_ids();
        allowed.is_empty() || roles.iter().any(|r| allowed.contains(r))
    }

    /// Merge a submitted panel form.
    ///
    /// Blank or unparsable single-id fields keep their current value. The
    /// results role list is always replaced.
    pub fn apply_form(&mut self, form: &SettingsForm) {
        fn merge(current: &mut Option<u64>, input: &str) {
            if let Some(id) = snowflake::extract_id(input) {
                *current = Some(id);
            }
        }

        merge(&mut self.results_channel, &form.results_channel);
        self.results_roles = snowflake::parse_id_list(&form.results_roles);
        merge(&mut self.queue_role, &form.queue_role);
        merge(&mut self.queue_category, &form.queue_category);
        merge(&mut self.staff_role, &form.staff_role);
    }
}

/// Raw fields submitted by the settings panel
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsForm {
    pub results_channel: String,
    pub results_roles: String,
    pub queue_role: String,
    pub queue_category: String,
    pub staff_role: String,
}

/// Settings document access. Every call reads the file again.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    path: PathBuf,
}

impl SettingsRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether settings were ever saved
    pub async fn exists(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// Current settings; an unusable document reads as all-unset
    pub async fn load(&self) -> Result<Settings> {
        store::load_or_default(&self.path).await
    }

    /// Current settings, failing when no settings document exists yet
    pub async fn load_configured(&self) -> Result<Settings> {
        if !self.exists().await {
            return Err(BotError::MissingConfiguration {
                key: "Settings".to_string(),
            });
        }
        self.load().await
    }

    pub async fn save(&self, settings: &Settings) -> Result<()> {
        store::save(&self.path, settings).await
    }

    /// Load, modify and save in one step
    pub async fn update<F>(&self, apply: F) -> Result<Settings>
    where
        F: FnOnce(&mut Settings),
    {
        let mut settings = self.load().await?;
        apply(&mut settings);
        self.save(&settings).await?;
        Ok(settings)
    }
}
