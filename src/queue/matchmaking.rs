//! FIFO pairing of the oldest waiting player with the earliest tester.

use poise::serenity_prelude::{ChannelId, UserId};
use tracing::{debug, error, info};

use crate::error::{BotError, Result};
use crate::state::{QueueStateRepository, WaitlistEntry, WaitlistRepository};

/// One player matched with one tester in a queue channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pairing {
    pub channel_id: ChannelId,
    pub tester: UserId,
    pub player: WaitlistEntry,
}

impl Pairing {
    /// Message announcing the pairing in the queue channel
    pub fn announcement(&self) -> String {
        let player = match self.player.requester() {
            Some(id) => format!("<@{}>", id),
            None => format!("`{}`", self.player.ign),
        };
        format!(
            "<@{}> you have been matched with {} (IGN: {}, Gamemode: {})",
            self.tester, player, self.player.ign, self.player.gamemode
        )
    }
}

/// Executes pairings against the waitlist and tester documents.
///
/// The matchmaker does no locking of its own: callers must hold exclusive
/// access to the channel's tester queue and to the waitlist for the whole
/// call.
#[derive(Debug, Clone)]
pub struct Matchmaker {
    waitlist: WaitlistRepository,
    queues: QueueStateRepository,
}

impl Matchmaker {
    pub fn new(waitlist: WaitlistRepository, queues: QueueStateRepository) -> Self {
        Self { waitlist, queues }
    }

    /// Pair at most one player with one tester in `channel_id`.
    ///
    /// Returns `Ok(None)` without writing anything when either side is empty.
    /// The tester queue is saved first, then the waitlist. If the waitlist
    /// save fails the tester queue is restored; if that also fails the two
    /// documents disagree and [`BotError::CrossRepositoryInconsistency`] is
    /// returned.
    pub async fn attempt_match(&self, channel_id: ChannelId) -> Result<Option<Pairing>> {
        let waiting = self.waitlist.list().await?;
        let testers = self.queues.get_testers(channel_id).await?;

        if waiting.is_empty() || testers.is_empty() {
            debug!(
                "Queue {}: no match ({} player(s), {} tester(s))",
                channel_id,
                waiting.len(),
                testers.len()
            );
            return Ok(None);
        }

        let tester = testers[0];
        self.queues.set_testers(channel_id, &testers[1..]).await?;

        let player = match self.waitlist.pop_front().await {
            Ok(Some(player)) => player,
            Ok(None) => {
                // Emptied between the snapshot and the pop; hand the tester back.
                self.restore_testers(channel_id, &testers, "waitlist drained")
                    .await?;
                return Ok(None);
            }
            Err(e) => {
                error!("Queue {}: failed to remove matched player: {}", channel_id, e);
                self.restore_testers(channel_id, &testers, &e.to_string())
                    .await?;
                return Err(e);
            }
        };

        info!(
            "Queue {}: matched tester {} with {} ({}, {})",
            channel_id, tester, player.requester_id, player.ign, player.gamemode
        );

        Ok(Some(Pairing {
            channel_id,
            tester,
            player,
        }))
    }

    async fn restore_testers(
        &self,
        channel_id: ChannelId,
        testers: &[UserId],
        cause: &str,
    ) -> Result<()> {
        self.queues
            .set_testers(channel_id, testers)
            .await
            .map_err(|e| {
                error!(
                    "Queue {}: tester {} consumed but player still waiting: {}",
                    channel_id, testers[0], e
                );
                BotError::CrossRepositoryInconsistency {
                    message: format!(
                        "tester {} removed from queue {} but the waitlist was not updated ({}); restoring the tester failed: {}",
                        testers[0], channel_id, cause, e
                    ),
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    struct Fixture {
        _dir: tempfile::TempDir,
        waitlist: WaitlistRepository,
        queues: QueueStateRepository,
        matchmaker: Matchmaker,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let waitlist = WaitlistRepository::new(dir.path().join("currentwaitlist.json"));
        let queues = QueueStateRepository::new(dir.path().join("queue_state.json"));
        let matchmaker = Matchmaker::new(waitlist.clone(), queues.clone());
        Fixture {
            _dir: dir,
            waitlist,
            queues,
            matchmaker,
        }
    }

    async fn add_players(waitlist: &WaitlistRepository, names: &[&str]) {
        let start = Utc::now();
        for (i, name) in names.iter().enumerate() {
            let entry = WaitlistEntry::new(
                UserId::new(100 + i as u64),
                name,
                "Sword",
                start + Duration::seconds(i as i64),
            )
            .unwrap();
            waitlist.append(entry).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_single_pairing_per_call() {
        let f = fixture();
        let channel = ChannelId::new(1);
        add_players(&f.waitlist, &["P1", "P2", "P3"]).await;
        f.queues
            .set_testers(channel, &[UserId::new(10), UserId::new(11)])
            .await
            .unwrap();

        let pairing = f.matchmaker.attempt_match(channel).await.unwrap().unwrap();
        assert_eq!(pairing.player.ign, "P1");
        assert_eq!(pairing.tester, UserId::new(10));

        assert_eq!(f.waitlist.len().await.unwrap(), 2);
        assert_eq!(
            f.queues.get_testers(channel).await.unwrap(),
            vec![UserId::new(11)]
        );
    }

    #[tokio::test]
    async fn test_no_op_leaves_documents_untouched() {
        let f = fixture();
        let channel = ChannelId::new(1);
        add_players(&f.waitlist, &["P1"]).await;
        f.queues.set_testers(channel, &[]).await.unwrap();

        let waitlist_before = tokio::fs::read(f.waitlist.path()).await.unwrap();
        let queues_before = tokio::fs::read(f.queues.path()).await.unwrap();

        assert!(f.matchmaker.attempt_match(channel).await.unwrap().is_none());

        assert_eq!(tokio::fs::read(f.waitlist.path()).await.unwrap(), waitlist_before);
        assert_eq!(tokio::fs::read(f.queues.path()).await.unwrap(), queues_before);
    }

    #[tokio::test]
    async fn test_no_op_without_players() {
        let f = fixture();
        let channel = ChannelId::new(1);
        f.queues.set_testers(channel, &[UserId::new(10)]).await.unwrap();

        assert!(f.matchmaker.attempt_match(channel).await.unwrap().is_none());
        assert_eq!(
            f.queues.get_testers(channel).await.unwrap(),
            vec![UserId::new(10)]
        );
        assert!(!f.waitlist.path().exists());
    }

    #[tokio::test]
    async fn test_testers_of_other_channels_are_not_used() {
        let f = fixture();
        add_players(&f.waitlist, &["P1"]).await;
        f.queues
            .set_testers(ChannelId::new(2), &[UserId::new(10)])
            .await
            .unwrap();

        assert!(f
            .matchmaker
            .attempt_match(ChannelId::new(1))
            .await
            .unwrap()
            .is_none());
        assert_eq!(f.waitlist.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_waitlist_consumes_nothing() {
        let f = fixture();
        let channel = ChannelId::new(1);
        f.queues
            .set_testers(channel, &[UserId::new(10), UserId::new(11)])
            .await
            .unwrap();

        // A directory where the waitlist file should be is an I/O error, not
        // corruption, so it must surface instead of reading as empty.
        let waitlist_path = f._dir.path().join("blocked.json");
        tokio::fs::create_dir_all(&waitlist_path).await.unwrap();
        let blocked = Matchmaker::new(WaitlistRepository::new(&waitlist_path), f.queues.clone());

        assert!(matches!(
            blocked.attempt_match(channel).await,
            Err(BotError::StateLoad { .. })
        ));
        assert_eq!(
            f.queues.get_testers(channel).await.unwrap(),
            vec![UserId::new(10), UserId::new(11)]
        );
    }

    /// A document name that can be read but never saved: the temporary
    /// sibling written during a save exceeds the file name limit.
    fn unsavable_name(stem: &str) -> String {
        format!("{}{}.json", stem, "x".repeat(220 - stem.len()))
    }

    #[tokio::test]
    async fn test_failed_waitlist_save_restores_tester() {
        let f = fixture();
        let channel = ChannelId::new(1);
        f.queues
            .set_testers(channel, &[UserId::new(10), UserId::new(11)])
            .await
            .unwrap();

        let waitlist_path = f._dir.path().join(unsavable_name("waitlist"));
        let entry = WaitlistEntry::new(UserId::new(20), "Foo", "Sword", Utc::now()).unwrap();
        tokio::fs::write(&waitlist_path, serde_json::to_string(&vec![entry]).unwrap())
            .await
            .unwrap();
        let waitlist = WaitlistRepository::new(&waitlist_path);
        let matchmaker = Matchmaker::new(waitlist.clone(), f.queues.clone());

        assert!(matches!(
            matchmaker.attempt_match(channel).await,
            Err(BotError::StateSave { .. })
        ));
        assert_eq!(
            f.queues.get_testers(channel).await.unwrap(),
            vec![UserId::new(10), UserId::new(11)]
        );
        assert_eq!(waitlist.len().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_restore_reports_inconsistency() {
        let f = fixture();
        let channel = ChannelId::new(1);
        let queues = QueueStateRepository::new(f._dir.path().join(unsavable_name("queue")));
        let matchmaker = Matchmaker::new(f.waitlist.clone(), queues.clone());

        let result = matchmaker
            .restore_testers(channel, &[UserId::new(10)], "disk full")
            .await;

        match result {
            Err(BotError::CrossRepositoryInconsistency { message }) => {
                assert!(message.contains("disk full"));
                assert!(message.contains("10"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(queues.get_testers(channel).await.unwrap().is_empty());
    }

    #[test]
    fn test_announcement_mentions_both_sides() {
        let pairing = Pairing {
            channel_id: ChannelId::new(1),
            tester: UserId::new(10),
            player: WaitlistEntry::new(UserId::new(20), "Foo", "Sword", Utc::now()).unwrap(),
        };
        assert_eq!(
            pairing.announcement(),
            "<@10> you have been matched with <@20> (IGN: Foo, Gamemode: Sword)"
        );
    }
}
