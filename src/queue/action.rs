use poise::serenity_prelude::{ChannelId, MessageId, RoleId, UserId};

use super::matchmaking::Pairing;
use crate::state::WaitlistEntry;

/// A user interaction that changes queue state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueAction {
    /// Start (or restart) a tester queue in a channel
    CreateQueue { channel_id: ChannelId },
    /// Join a channel's tester queue; `roles` are the member's roles
    JoinTester {
        channel_id: ChannelId,
        user_id: UserId,
        roles: Vec<RoleId>,
    },
    LeaveTester {
        channel_id: ChannelId,
        user_id: UserId,
    },
    /// Submit a waitlist application
    Apply {
        user_id: UserId,
        ign: String,
        gamemode: String,
    },
}

/// What an action did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    QueueCreated {
        message_id: MessageId,
    },
    Joined {
        pairing: Option<Pairing>,
    },
    AlreadyQueued {
        pairing: Option<Pairing>,
    },
    Left {
        was_queued: bool,
        pairing: Option<Pairing>,
    },
    Applied {
        entry: WaitlistEntry,
        pairing: Option<Pairing>,
    },
}

impl ActionOutcome {
    /// The pairing this action triggered, if any
    pub fn pairing(&self) -> Option<&Pairing> {
        match self {
            ActionOutcome::QueueCreated { .. } => None,
            ActionOutcome::Joined { pairing }
            | ActionOutcome::AlreadyQueued { pairing }
            | ActionOutcome::Left { pairing, .. }
            | ActionOutcome::Applied { pairing, .. } => pairing.as_ref(),
        }
    }

    /// Ephemeral confirmation for the acting user
    pub fn reply(&self) -> String {
        match self {
            ActionOutcome::QueueCreated { .. } => "Queue created.".to_string(),
            ActionOutcome::Joined { .. } => "You joined as a tester!".to_string(),
            ActionOutcome::AlreadyQueued { .. } => {
                "You are already in the tester queue.".to_string()
            }
            ActionOutcome::Left { .. } => "You left the tester queue.".to_string(),
            ActionOutcome::Applied { entry, .. } => format!(
                "You have been added to the waitlist! (IGN: {}, Gamemode: {})",
                entry.ign, entry.gamemode
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_replies() {
        let entry = WaitlistEntry::new(UserId::new(1), "Foo", "Sword", Utc::now()).unwrap();
        let applied = ActionOutcome::Applied {
            entry,
            pairing: None,
        };
        assert_eq!(
            applied.reply(),
            "You have been added to the waitlist! (IGN: Foo, Gamemode: Sword)"
        );
        assert!(applied.pairing().is_none());

        let left = ActionOutcome::Left {
            was_queued: false,
            pairing: None,
        };
        assert_eq!(left.reply(), "You left the tester queue.");
    }
}
