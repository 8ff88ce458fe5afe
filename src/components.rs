//! Custom ids of the buttons the bot attaches to its messages.

use chrono::{DateTime, Duration, TimeZone, Utc};
use std::fmt;

const WAITLIST_MODAL_PREFIX: &str = "waitlist_modal:";

/// How long an opened waitlist form accepts a submission
pub const WAITLIST_MODAL_TIMEOUT_SECS: i64 = 60;

/// Custom id of a waitlist application form, carrying the time it was opened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitlistModalId {
    pub opened_at: DateTime<Utc>,
}

impl WaitlistModalId {
    pub fn new(opened_at: DateTime<Utc>) -> Self {
        Self { opened_at }
    }

    pub fn encode(&self) -> String {
        format!("{}{}", WAITLIST_MODAL_PREFIX, self.opened_at.timestamp())
    }

    /// `None` for anything that is not a waitlist form id
    pub fn parse(custom_id: &str) -> Option<Self> {
        let secs = custom_id.strip_prefix(WAITLIST_MODAL_PREFIX)?.parse().ok()?;
        Utc.timestamp_opt(secs, 0).single().map(Self::new)
    }

    /// Submissions after the timeout change nothing
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.opened_at > Duration::seconds(WAITLIST_MODAL_TIMEOUT_SECS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentId {
    /// Persistent "Join" button on a queue status message
    QueueJoin,
    /// Persistent "Leave" button on a queue status message
    QueueLeave,
    /// "Join Waitlist" button on the application prompt
    WaitlistJoin,
    /// "Verify Account Details" button on the application prompt
    WaitlistVerify,
    /// Tier override confirmation
    OverrideConfirm,
    OverrideCancel,
}

impl ComponentId {
    pub const ALL: [ComponentId; 6] = [
        ComponentId::QueueJoin,
        ComponentId::QueueLeave,
        ComponentId::WaitlistJoin,
        ComponentId::WaitlistVerify,
        ComponentId::OverrideConfirm,
        ComponentId::OverrideCancel,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ComponentId::QueueJoin => "queue_join",
            ComponentId::QueueLeave => "queue_leave",
            ComponentId::WaitlistJoin => "waitlist_join",
            ComponentId::WaitlistVerify => "waitlist_verify",
            ComponentId::OverrideConfirm => "override_confirm",
            ComponentId::OverrideCancel => "override_cancel",
        }
    }

    pub fn parse(custom_id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == custom_id)
    }

    /// Buttons that live on long-lived messages and must be routed by the
    /// gateway event handler rather than a command's collector
    pub fn is_persistent(self) -> bool {
        matches!(self, ComponentId::QueueJoin | ComponentId::QueueLeave)
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
