pub mod queue_state;
pub mod settings;
pub mod snowflake;
pub mod store;
pub mod tierlist;
pub mod waitlist;

pub use queue_state::{QueueStateRepository, TesterQueueState};
pub use settings::{Settings, SettingsForm, SettingsRepository};
pub use tierlist::{TierList, TierListRepository, UserMeta, UserMetaRepository};
pub use waitlist::{WaitlistEntry, WaitlistRepository};
