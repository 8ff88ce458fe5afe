use std::fmt;
use thiserror::Error;

/// Why a persisted document could not be used
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorruptReason {
    Missing,
    Empty,
    Malformed(String),
}

impl fmt::Display for CorruptReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CorruptReason::Missing => write!(f, "file does not exist"),
            CorruptReason::Empty => write!(f, "file is empty"),
            CorruptReason::Malformed(detail) => write!(f, "{}", detail),
        }
    }
}

#[derive(Error, Debug)]
pub enum BotError {
    // State errors
    #[error("State document '{path}' is unusable: {reason}")]
    CorruptState { path: String, reason: CorruptReason },

    #[error("Failed to save state to '{path}': {source}")]
    StateSave {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to load state from '{path}': {source}")]
    StateLoad {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Queue documents out of sync: {message}")]
    CrossRepositoryInconsistency { message: String },

    // Configuration errors
    #[error("Missing configuration: {key}")]
    MissingConfiguration { key: String },

    // Input errors
    #[error("Invalid {field}: {message}")]
    InvalidInput { field: String, message: String },

    // Tier list errors
    #[error("Gamemode '{gamemode}' not found.")]
    GamemodeNotFound { gamemode: String },

    #[error("Tier '{tier}' not found in gamemode '{gamemode}'.")]
    TierNotFound { tier: String, gamemode: String },

    // Permission errors
    #[error("Permission denied: {message}")]
    AuthorizationDenied { message: String },

    // Discord errors
    #[error("Failed to deliver message: {message}")]
    TransportDelivery { message: String },

    // Generic errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl BotError {
    /// Text shown to the invoking user, if this error is meant for them
    pub fn user_message(&self) -> Option<String> {
        match self {
            BotError::AuthorizationDenied { message } => Some(message.clone()),
            BotError::MissingConfiguration { key } => {
                Some(format!("{} not configured. Please use /setup first.", key))
            }
            BotError::InvalidInput { field, message } => Some(format!("{}: {}", field, message)),
            BotError::GamemodeNotFound { .. } | BotError::TierNotFound { .. } => {
                Some(self.to_string())
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BotError {
    fn from(err: serde_json::Error) -> Self {
        BotError::Internal {
            message: err.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BotError>;
