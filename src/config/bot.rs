use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use tracing::{info, warn};

use crate::error::{BotError, Result};

/// Legacy credentials file read when `DISCORD_TOKEN` is not set
pub const LEGACY_ENV_FILE: &str = "env.txt";

/// Process configuration, resolved from the environment
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub token: String,
    pub data_path: String,
    pub panel_host: String,
    pub panel_port: u16,
}

impl BotConfig {
    /// Read configuration from environment variables (after `.env` has been
    /// loaded), falling back to `env.txt` for the token
    pub fn from_env() -> Result<Self> {
        let legacy = read_env_file(Path::new(LEGACY_ENV_FILE));
        Self::resolve(|key| std::env::var(key).ok(), &legacy)
    }

    fn resolve<F>(var: F, legacy: &HashMap<String, String>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = match var("DISCORD_TOKEN").filter(|t| !t.trim().is_empty()) {
            Some(token) => token,
            None => match legacy.get("TOKEN") {
                Some(token) => {
                    info!("Using token from {}", LEGACY_ENV_FILE);
                    token.clone()
                }
                None => {
                    return Err(BotError::MissingConfiguration {
                        key: "DISCORD_TOKEN".to_string(),
                    })
                }
            },
        };

        let panel_port = match var("PANEL_PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| BotError::InvalidInput {
                field: "PANEL_PORT".to_string(),
                message: format!("'{}' is not a port number", raw),
            })?,
            None => 8765,
        };

        Ok(Self {
            token,
            data_path: var("DATA_PATH").unwrap_or_else(|| "data".to_string()),
            panel_host: var("PANEL_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            panel_port,
        })
    }

    /// Address the settings panel listens on
    pub fn panel_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.panel_host, self.panel_port)
            .parse()
            .map_err(|_| BotError::InvalidInput {
                field: "PANEL_HOST".to_string(),
                message: format!("'{}' is not an IP address", self.panel_host),
            })
    }
}

/// Read a dotenv-style file into a map. A missing file yields an empty map;
/// unparsable lines are skipped.
pub fn read_env_file(path: &Path) -> HashMap<String, String> {
    let entries = match dotenv::from_path_iter(path) {
        Ok(entries) => entries,
        Err(dotenv::Error::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return HashMap::new()
        }
        Err(e) => {
            warn!("Could not read {}: {}", path.display(), e);
            return HashMap::new();
        }
    };

    entries
        .filter_map(|entry| match entry {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!("Skipping line in {}: {}", path.display(), e);
                None
            }
        })
        .collect()
}
