//! End-to-end queue behaviour through the public library API, with Discord
//! replaced by an in-memory recorder.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use poise::serenity_prelude::{ChannelId, MessageId, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tierbot::config::DataPaths;
use tierbot::error::Result;
use tierbot::managers::QueueManager;
use tierbot::queue::{ActionOutcome, Pairing, QueueAction, QueueTransport, QueueView};
use tierbot::state::{Settings, SettingsRepository, WaitlistEntry};

#[derive(Default)]
struct MockTransport {
    next_message: AtomicU64,
    views: parking_lot::Mutex<Vec<(ChannelId, QueueView)>>,
    pairings: parking_lot::Mutex<Vec<Pairing>>,
}

impl MockTransport {
    fn pairings(&self) -> Vec<Pairing> {
        self.pairings.lock().clone()
    }
}

#[async_trait]
impl QueueTransport for MockTransport {
    async fn send_status(&self, channel_id: ChannelId, view: &QueueView) -> Result<MessageId> {
        self.views.lock().push((channel_id, view.clone()));
        Ok(MessageId::new(
            500 + self.next_message.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn edit_status(
        &self,
        channel_id: ChannelId,
        _message_id: MessageId,
        view: &QueueView,
    ) -> Result<()> {
        self.views.lock().push((channel_id, view.clone()));
        Ok(())
    }

    async fn announce_pairing(&self, pairing: &Pairing) -> Result<()> {
        self.pairings.lock().push(pairing.clone());
        Ok(())
    }
}

struct Harness {
    _dir: tempfile::TempDir,
    paths: DataPaths,
    transport: Arc<MockTransport>,
    manager: Arc<QueueManager>,
}

async fn harness() -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let paths = DataPaths::new(dir.path());
    SettingsRepository::new(paths.settings())
        .save(&Settings::default())
        .await
        .unwrap();
    let transport = Arc::new(MockTransport::default());
    let manager = Arc::new(QueueManager::from_paths(&paths, transport.clone()));
    Harness {
        _dir: dir,
        paths,
        transport,
        manager,
    }
}

fn join(channel: u64, user: u64) -> QueueAction {
    QueueAction::JoinTester {
        channel_id: ChannelId::new(channel),
        user_id: UserId::new(user),
        roles: Vec::new(),
    }
}

fn apply(user: u64, ign: &str, gamemode: &str) -> QueueAction {
    QueueAction::Apply {
        user_id: UserId::new(user),
        ign: ign.to_string(),
        gamemode: gamemode.to_string(),
    }
}

#[tokio::test]
async fn test_player_and_tester_are_matched() {
    let h = harness().await;
    let c1 = ChannelId::new(1);

    h.manager
        .dispatch(QueueAction::CreateQueue { channel_id: c1 })
        .await
        .unwrap();
    h.manager.dispatch(apply(20, "Foo", "Sword")).await.unwrap();
    let outcome = h.manager.dispatch(join(1, 10)).await.unwrap();

    let pairing = outcome.pairing().cloned().unwrap();
    assert_eq!(pairing.tester, UserId::new(10));
    assert_eq!(pairing.player.ign, "Foo");
    assert_eq!(pairing.player.gamemode, "Sword");
    assert_eq!(h.transport.pairings(), vec![pairing]);

    assert!(h.manager.waitlist().is_empty().await.unwrap());
    assert!(h.manager.queues().get_testers(c1).await.unwrap().is_empty());

    let view = h.manager.render(c1).await.unwrap();
    assert_eq!(view.players_shown(), 0);
    assert_eq!(view.testers_shown(), 0);
    assert!(view.player_lines.iter().all(|l| l.ends_with(". ")));

    let (channel, last) = h.transport.views.lock().last().cloned().unwrap();
    assert_eq!(channel, c1);
    assert_eq!(last.players_waiting, 0);
    assert_eq!(last.testers_available, 0);
}

#[tokio::test]
async fn test_matching_is_fifo_on_both_sides() {
    let h = harness().await;
    h.manager
        .dispatch(QueueAction::CreateQueue {
            channel_id: ChannelId::new(1),
        })
        .await
        .unwrap();

    for (i, ign) in ["P1", "P2", "P3"].iter().enumerate() {
        h.manager
            .dispatch(apply(20 + i as u64, ign, "Sword"))
            .await
            .unwrap();
    }
    for tester in [10, 11, 12] {
        h.manager.dispatch(join(1, tester)).await.unwrap();
    }

    let matched: Vec<(u64, String)> = h
        .transport
        .pairings()
        .into_iter()
        .map(|p| (p.tester.get(), p.player.ign))
        .collect();
    assert_eq!(
        matched,
        vec![
            (10, "P1".to_string()),
            (11, "P2".to_string()),
            (12, "P3".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_one_pairing_per_trigger() {
    let h = harness().await;
    let c1 = ChannelId::new(1);

    let start = Utc::now();
    for (i, ign) in ["P1", "P2"].iter().enumerate() {
        let entry = WaitlistEntry::new(
            UserId::new(20 + i as u64),
            ign,
            "Sword",
            start + Duration::seconds(i as i64),
        )
        .unwrap();
        h.manager.waitlist().append(entry).await.unwrap();
    }
    h.manager
        .queues()
        .set_testers(c1, &[UserId::new(10), UserId::new(11)])
        .await
        .unwrap();

    let pairing = h.manager.attempt_match(c1).await.unwrap().unwrap();
    assert_eq!(pairing.player.ign, "P1");
    assert_eq!(h.manager.waitlist().len().await.unwrap(), 1);
    assert_eq!(
        h.manager.queues().get_testers(c1).await.unwrap(),
        vec![UserId::new(11)]
    );
}

#[tokio::test]
async fn test_render_caps_visible_slots() {
    let h = harness().await;
    let c1 = ChannelId::new(1);

    for i in 0..15u64 {
        let entry =
            WaitlistEntry::new(UserId::new(100 + i), &format!("P{}", i + 1), "Mace", Utc::now())
                .unwrap();
        h.manager.waitlist().append(entry).await.unwrap();
    }
    let testers: Vec<UserId> = (0..5).map(|i| UserId::new(900 + i)).collect();
    h.manager.queues().set_testers(c1, &testers).await.unwrap();

    let view = h.manager.render(c1).await.unwrap();
    assert_eq!(view.players_shown(), 10);
    assert_eq!(view.testers_shown(), 3);
    assert_eq!(view.player_lines.first().unwrap(), "1. P1");
    assert_eq!(view.player_lines.last().unwrap(), "10. P10");
    assert_eq!(view.tester_lines.last().unwrap(), "3. <@902>");
    assert!(!view.description().contains("P11"));
}

#[tokio::test]
async fn test_repeated_join_keeps_one_entry() {
    let h = harness().await;
    let c1 = ChannelId::new(1);

    let first = h.manager.dispatch(join(1, 10)).await.unwrap();
    let second = h.manager.dispatch(join(1, 10)).await.unwrap();

    assert!(matches!(first, ActionOutcome::Joined { .. }));
    assert!(matches!(second, ActionOutcome::AlreadyQueued { .. }));
    assert_eq!(
        h.manager.queues().get_testers(c1).await.unwrap(),
        vec![UserId::new(10)]
    );
}

#[tokio::test]
async fn test_simultaneous_joins_lose_nothing() {
    let h = harness().await;
    let c1 = ChannelId::new(1);

    let joins = (0..10).map(|i| {
        let manager = h.manager.clone();
        async move { manager.dispatch(join(1, 100 + i)).await }
    });
    for result in futures::future::join_all(joins).await {
        result.unwrap();
    }

    let mut testers = h.manager.queues().get_testers(c1).await.unwrap();
    assert_eq!(testers.len(), 10);
    testers.sort();
    testers.dedup();
    assert_eq!(testers.len(), 10);
}

#[tokio::test]
async fn test_corrupt_waitlist_reads_as_empty() {
    let h = harness().await;
    tokio::fs::write(h.paths.waitlist(), b"{not json").await.unwrap();

    assert!(h.manager.waitlist().list().await.unwrap().is_empty());

    let outcome = h.manager.dispatch(apply(20, "Foo", "Sword")).await.unwrap();
    assert!(matches!(outcome, ActionOutcome::Applied { pairing: None, .. }));
    assert_eq!(h.manager.waitlist().len().await.unwrap(), 1);
}
