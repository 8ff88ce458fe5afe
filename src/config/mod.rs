pub mod bot;
pub mod paths;

pub use bot::{read_env_file, BotConfig, LEGACY_ENV_FILE};
pub use paths::DataPaths;
