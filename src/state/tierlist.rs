use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use super::store;
use crate::error::{BotError, Result};

/// Tier list: gamemode -> tier -> player IGNs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierList {
    gamemodes: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl TierList {
    /// Move `ign` into `tier` of `gamemode`, removing it from that gamemode's other tiers
    pub fn assign(&mut self, gamemode: &str, tier: &str, ign: &str) -> Result<()> {
        let gamemode = gamemode.trim();
        let tier = tier.trim();
        let ign = ign.trim();

        let tiers = self
            .gamemodes
            .get_mut(gamemode)
            .ok_or_else(|| BotError::GamemodeNotFound {
                gamemode: gamemode.to_string(),
            })?;
        if !tiers.contains_key(tier) {
            return Err(BotError::TierNotFound {
                tier: tier.to_string(),
                gamemode: gamemode.to_string(),
            });
        }

        for members in tiers.values_mut() {
            members.retain(|m| m != ign);
        }
        if let Some(members) = tiers.get_mut(tier) {
            members.push(ign.to_string());
        }
        Ok(())
    }

    /// Tier currently holding `ign` in `gamemode`
    pub fn tier_of(&self, gamemode: &str, ign: &str) -> Option<&str> {
        self.gamemodes.get(gamemode).and_then(|tiers| {
            tiers
                .iter()
                .find(|(_, members)| members.iter().any(|m| m == ign))
                .map(|(tier, _)| tier.as_str())
        })
    }
}

/// Discord user <-> IGN mapping kept alongside the tier list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMeta {
    #[serde(default)]
    pub discord_to_ign: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub ign_to_discord: BTreeMap<String, String>,
}

impl UserMeta {
    /// Whether linking would take the IGN from someone else, or give the user
    /// an IGN next to ones they already have
    pub fn needs_override(&self, discord_id: &str, ign: &str) -> bool {
        let owned_elsewhere = self
            .ign_to_discord
            .get(ign)
            .map(|owner| owner != discord_id)
            .unwrap_or(false);
        let existing = self.igns_of(discord_id);
        let has_other_igns = !existing.is_empty() && !existing.iter().any(|i| i == ign);
        owned_elsewhere || has_other_igns
    }

    /// Record `ign` as belonging to `discord_id`, detaching it from everyone else
    pub fn link(&mut self, discord_id: &str, ign: &str) {
        for (owner, igns) in self.discord_to_ign.iter_mut() {
            if owner != discord_id {
                igns.retain(|i| i != ign);
            }
        }
        self.ign_to_discord
            .insert(ign.to_string(), discord_id.to_string());
        let igns = self
            .discord_to_ign
            .entry(discord_id.to_string())
            .or_default();
        if !igns.iter().any(|i| i == ign) {
            igns.push(ign.to_string());
        }
    }

    pub fn owner_of(&self, ign: &str) -> Option<&str> {
        self.ign_to_discord.get(ign).map(String::as_str)
    }

    pub fn igns_of(&self, discord_id: &str) -> &[String] {
        self.discord_to_ign
            .get(discord_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Tier list document. Unlike the queue documents, an unusable tier list is
/// reported to the caller instead of being replaced.
#[derive(Debug, Clone)]
pub struct TierListRepository {
    path: PathBuf,
}

impl TierListRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<TierList> {
        store::load(&self.path).await
    }

    pub async fn save(&self, tiers: &TierList) -> Result<()> {
        store::save(&self.path, tiers).await
    }

    /// Load, assign and save
    pub async fn assign(&self, gamemode: &str, tier: &str, ign: &str) -> Result<()> {
        let mut tiers = self.load().await?;
        tiers.assign(gamemode, tier, ign)?;
        self.save(&tiers).await?;
        info!("Tier list: {} set to {} in {}", ign.trim(), tier.trim(), gamemode.trim());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct UserMetaRepository {
    path: PathBuf,
}

impl UserMetaRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<UserMeta> {
        store::load_or_default(&self.path).await
    }

    pub async fn link(&self, discord_id: &str, ign: &str) -> Result<()> {
        let mut meta = self.load().await?;
        meta.link(discord_id, ign);
        store::save(&self.path, &meta).await?;
        info!("User metadata: {} linked to {}", ign, discord_id);
        Ok(())
    }
}
