//! Queue status message rendering.
//!
//! A [`QueueView`] is a pure projection of the waitlist and one channel's
//! tester queue. It knows how to turn itself into a Discord embed but never
//! talks to Discord.

use chrono::{DateTime, Utc};
use poise::serenity_prelude::{self as serenity, UserId};

use crate::components::ComponentId;
use crate::state::WaitlistEntry;

/// Player slots shown on the status message
pub const PLAYER_SLOTS: usize = 10;
/// Tester slots shown on the status message
pub const TESTER_SLOTS: usize = 3;

pub const QUEUE_TITLE: &str = "Testing Queue - DEFAULT";
const QUEUE_INSTRUCTIONS: &str = "Please use the command /join to join the DEFAULT queue";
const QUEUE_COLOR: u32 = 0x9B59B6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueView {
    /// Always `PLAYER_SLOTS` lines
    pub player_lines: Vec<String>,
    /// Always `TESTER_SLOTS` lines
    pub tester_lines: Vec<String>,
    /// Total players waiting, including those not shown
    pub players_waiting: usize,
    pub testers_available: usize,
    pub rendered_at: DateTime<Utc>,
}

impl QueueView {
    /// Project the current state. Entries past the visible slots are dropped.
    pub fn render(waitlist: &[WaitlistEntry], testers: &[UserId], rendered_at: DateTime<Utc>) -> Self {
        let player_lines = (0..PLAYER_SLOTS)
            .map(|i| match waitlist.get(i) {
                Some(entry) => format!("{}. {}", i + 1, entry.ign),
                None => format!("{}. ", i + 1),
            })
            .collect();

        let tester_lines = (0..TESTER_SLOTS)
            .map(|i| match testers.get(i) {
                Some(tester) => format!("{}. <@{}>", i + 1, tester),
                None => format!("{}.", i + 1),
            })
            .collect();

        Self {
            player_lines,
            tester_lines,
            players_waiting: waitlist.len(),
            testers_available: testers.len(),
            rendered_at,
        }
    }

    pub fn description(&self) -> String {
        format!(
            "{}\n\n**Players:**\n{}\n\n**Testers**\n{}",
            QUEUE_INSTRUCTIONS,
            self.player_lines.join("\n"),
            self.tester_lines.join("\n")
        )
    }

    /// Number of player slots holding a player
    pub fn players_shown(&self) -> usize {
        self.players_waiting.min(PLAYER_SLOTS)
    }

    /// Number of tester slots holding a tester
    pub fn testers_shown(&self) -> usize {
        self.testers_available.min(TESTER_SLOTS)
    }

    pub fn embed(&self) -> serenity::CreateEmbed {
        let embed = serenity::CreateEmbed::new()
            .title(QUEUE_TITLE)
            .description(self.description())
            .color(QUEUE_COLOR);

        match serenity::Timestamp::from_unix_timestamp(self.rendered_at.timestamp()) {
            Ok(timestamp) => embed.timestamp(timestamp),
            Err(_) => embed,
        }
    }

    /// Join / Leave buttons attached to every status message
    pub fn components() -> Vec<serenity::CreateActionRow> {
        vec![serenity::CreateActionRow::Buttons(vec![
            serenity::CreateButton::new(ComponentId::QueueJoin.as_str())
                .label("Join")
                .style(serenity::ButtonStyle::Success),
            serenity::CreateButton::new(ComponentId::QueueLeave.as_str())
                .label("Leave")
                .style(serenity::ButtonStyle::Danger),
        ])]
    }
}
