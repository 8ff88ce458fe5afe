//! Tester queue core: rendering, pairing and the transport seam.
//!
//! Nothing in here depends on how interactions arrive; the Discord glue in
//! `commands` and `events` builds [`QueueAction`]s and hands them to
//! [`crate::managers::QueueManager`].

pub mod action;
pub mod matchmaking;
pub mod transport;
pub mod view;

pub use action::{ActionOutcome, QueueAction};
pub use matchmaking::{Matchmaker, Pairing};
pub use transport::{DiscordTransport, QueueTransport};
pub use view::{QueueView, PLAYER_SLOTS, TESTER_SLOTS};
