//! Tier-testing coordinator for Discord.
//!
//! Players apply to a global waitlist, testers join per-channel queues, and
//! every join, leave or application pairs the oldest waiting player with the
//! earliest available tester. State lives in JSON documents under the data
//! directory; see [`config::DataPaths`].

pub mod commands;
pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod managers;
pub mod queue;
pub mod state;
pub mod web;

use config::DataPaths;
use managers::SharedQueueManager;
use state::{SettingsRepository, TierListRepository, UserMetaRepository};

pub type Error = Box<dyn std::error::Error + Send + Sync>;
pub type Context<'a> = poise::Context<'a, Data, Error>;

/// Shared application state
pub struct Data {
    pub queue_manager: SharedQueueManager,
    pub settings: SettingsRepository,
    pub tierlist: TierListRepository,
    pub user_meta: UserMetaRepository,
    pub paths: DataPaths,
}

impl Data {
    pub fn new(paths: DataPaths, queue_manager: SharedQueueManager) -> Self {
        Self {
            settings: SettingsRepository::new(paths.settings()),
            tierlist: TierListRepository::new(paths.tierlist()),
            user_meta: UserMetaRepository::new(paths.user_meta()),
            queue_manager,
            paths,
        }
    }
}
