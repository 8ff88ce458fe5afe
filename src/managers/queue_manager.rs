use chrono::Utc;
use dashmap::DashMap;
use poise::serenity_prelude::{ChannelId, MessageId, RoleId, UserId};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::DataPaths;
use crate::error::{BotError, Result};
use crate::queue::{ActionOutcome, Matchmaker, Pairing, QueueAction, QueueTransport, QueueView};
use crate::state::{QueueStateRepository, SettingsRepository, WaitlistEntry, WaitlistRepository};

/// Runs queue actions against the stored documents and keeps status
/// messages in sync.
///
/// All mutations of one channel's tester list happen under that channel's
/// lock; waitlist mutations happen under the waitlist lock. When both are
/// needed the channel lock is taken first.
pub struct QueueManager {
    waitlist: WaitlistRepository,
    queues: QueueStateRepository,
    settings: SettingsRepository,
    matchmaker: Matchmaker,
    transport: Arc<dyn QueueTransport>,
    channel_locks: DashMap<ChannelId, Arc<Mutex<()>>>,
    waitlist_lock: Mutex<()>,
}

impl QueueManager {
    pub fn new(
        waitlist: WaitlistRepository,
        queues: QueueStateRepository,
        settings: SettingsRepository,
        transport: Arc<dyn QueueTransport>,
    ) -> Self {
        let matchmaker = Matchmaker::new(waitlist.clone(), queues.clone());
        Self {
            waitlist,
            queues,
            settings,
            matchmaker,
            transport,
            channel_locks: DashMap::new(),
            waitlist_lock: Mutex::new(()),
        }
    }

    pub fn from_paths(paths: &DataPaths, transport: Arc<dyn QueueTransport>) -> Self {
        Self::new(
            WaitlistRepository::new(paths.waitlist()),
            QueueStateRepository::new(paths.queue_state()),
            SettingsRepository::new(paths.settings()),
            transport,
        )
    }

    pub fn waitlist(&self) -> &WaitlistRepository {
        &self.waitlist
    }

    pub fn queues(&self) -> &QueueStateRepository {
        &self.queues
    }

    /// Run one user action
    pub async fn dispatch(&self, action: QueueAction) -> Result<ActionOutcome> {
        match action {
            QueueAction::CreateQueue { channel_id } => {
                let message_id = self.create_queue(channel_id).await?;
                Ok(ActionOutcome::QueueCreated { message_id })
            }
            QueueAction::JoinTester {
                channel_id,
                user_id,
                roles,
            } => self.join_tester(channel_id, user_id, &roles).await,
            QueueAction::LeaveTester {
                channel_id,
                user_id,
            } => self.leave_tester(channel_id, user_id).await,
            QueueAction::Apply {
                user_id,
                ign,
                gamemode,
            } => self.apply(user_id, &ign, &gamemode).await,
        }
    }

    /// Start a queue in `channel_id` with no testers and post its status
    /// message. Calling it again re-anchors the display on a new message.
    pub async fn create_queue(&self, channel_id: ChannelId) -> Result<MessageId> {
        self.settings.load_configured().await?;

        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        // Nothing is stored until the status message exists.
        let waiting = self.waitlist.list().await?;
        let view = QueueView::render(&waiting, &[], Utc::now());
        let message_id = self.transport.send_status(channel_id, &view).await?;

        self.queues.set_testers(channel_id, &[]).await?;
        self.queues
            .set_status_message_id(channel_id, message_id)
            .await?;

        info!(
            "Queue {}: created with status message {}",
            channel_id, message_id
        );
        Ok(message_id)
    }

    /// Add `user_id` to the back of the channel's tester queue
    pub async fn join_tester(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
        roles: &[RoleId],
    ) -> Result<ActionOutcome> {
        let settings = self.settings.load().await?;
        if !settings.can_join_queue(roles) {
            info!(
                "Queue {}: user {} lacks the tester role",
                channel_id, user_id
            );
            return Err(BotError::AuthorizationDenied {
                message: "You are not allowed to join as a tester.".to_string(),
            });
        }

        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        let mut testers = self.queues.get_testers(channel_id).await?;
        let already_queued = testers.contains(&user_id);
        if already_queued {
            debug!("Queue {}: {} is already a tester", channel_id, user_id);
        } else {
            testers.push(user_id);
            self.queues.set_testers(channel_id, &testers).await?;
            info!(
                "Queue {}: {} joined as tester (position {})",
                channel_id,
                user_id,
                testers.len()
            );
        }

        self.refresh_view(channel_id).await?;
        let pairing = self.match_in_channel(channel_id).await?;

        Ok(if already_queued {
            ActionOutcome::AlreadyQueued { pairing }
        } else {
            ActionOutcome::Joined { pairing }
        })
    }

    /// Remove `user_id` from the channel's tester queue if present
    pub async fn leave_tester(
        &self,
        channel_id: ChannelId,
        user_id: UserId,
    ) -> Result<ActionOutcome> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;

        let mut testers = self.queues.get_testers(channel_id).await?;
        let before = testers.len();
        testers.retain(|t| *t != user_id);
        let was_queued = testers.len() != before;

        if was_queued {
            self.queues.set_testers(channel_id, &testers).await?;
            info!("Queue {}: {} left the tester queue", channel_id, user_id);
        }

        self.refresh_view(channel_id).await?;
        let pairing = self.match_in_channel(channel_id).await?;

        Ok(ActionOutcome::Left {
            was_queued,
            pairing,
        })
    }

    /// Put a player on the waitlist, then give every queue a chance to pick
    /// them up. At most one pairing results.
    pub async fn apply(&self, user_id: UserId, ign: &str, gamemode: &str) -> Result<ActionOutcome> {
        let entry = WaitlistEntry::new(user_id, ign, gamemode, Utc::now())?;
        let entry = {
            let _guard = self.waitlist_lock.lock().await;
            self.waitlist.append(entry).await?
        };

        let channels = self.queues.channels().await?;
        let mut pairing: Option<Pairing> = None;
        for &channel_id in &channels {
            let lock = self.channel_lock(channel_id);
            let _guard = lock.lock().await;

            self.refresh_view(channel_id).await?;
            if pairing.is_none() {
                pairing = self.match_in_channel(channel_id).await?;
            }
        }

        // Channels rendered before the pairing still list the matched player.
        if let Some(paired) = &pairing {
            for &channel_id in channels.iter().take_while(|c| **c != paired.channel_id) {
                let lock = self.channel_lock(channel_id);
                let _guard = lock.lock().await;
                self.refresh_view(channel_id).await?;
            }
        }

        Ok(ActionOutcome::Applied { entry, pairing })
    }

    /// Try to pair the oldest player with the channel's first tester
    pub async fn attempt_match(&self, channel_id: ChannelId) -> Result<Option<Pairing>> {
        let lock = self.channel_lock(channel_id);
        let _guard = lock.lock().await;
        self.match_in_channel(channel_id).await
    }

    /// Current display payload for `channel_id`
    pub async fn render(&self, channel_id: ChannelId) -> Result<QueueView> {
        let waiting = self.waitlist.list().await?;
        let testers = self.queues.get_testers(channel_id).await?;
        Ok(QueueView::render(&waiting, &testers, Utc::now()))
    }

    /// Edit the channel's status message to match stored state. Delivery
    /// failures are logged; stored state stays authoritative.
    pub async fn refresh_view(&self, channel_id: ChannelId) -> Result<()> {
        let Some(message_id) = self.queues.get_status_message_id(channel_id).await? else {
            debug!("Queue {}: no status message to refresh", channel_id);
            return Ok(());
        };

        let view = self.render(channel_id).await?;
        debug!(
            "Queue {}: rendering {} player(s), {} tester(s)",
            channel_id, view.players_waiting, view.testers_available
        );
        if let Err(e) = self
            .transport
            .edit_status(channel_id, message_id, &view)
            .await
        {
            warn!("Queue {}: status message not updated: {}", channel_id, e);
        }
        Ok(())
    }

    /// Caller holds the channel lock
    async fn match_in_channel(&self, channel_id: ChannelId) -> Result<Option<Pairing>> {
        let pairing = {
            let _guard = self.waitlist_lock.lock().await;
            self.matchmaker.attempt_match(channel_id).await?
        };

        if let Some(pairing) = &pairing {
            self.refresh_view(channel_id).await?;
            if let Err(e) = self.transport.announce_pairing(pairing).await {
                warn!("Queue {}: pairing not announced: {}", channel_id, e);
            }
        }
        Ok(pairing)
    }

    fn channel_lock(&self, channel_id: ChannelId) -> Arc<Mutex<()>> {
        self.channel_locks
            .entry(channel_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

pub type SharedQueueManager = Arc<QueueManager>;

pub fn create_shared_queue_manager(
    paths: &DataPaths,
    transport: Arc<dyn QueueTransport>,
) -> SharedQueueManager {
    Arc::new(QueueManager::from_paths(paths, transport))
}
