//! Maintains the server connection, dispatches events, and owns the
//! per-game adapters. Runs as a single actor: all state transitions happen
//! inline in `run`'s event loop or in small tasks that only ever talk back
//! through channels, never by sharing state directly.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use engine_adapter::EngineCapabilityProfile;
use protocol::wire::{AuthenticateMessage, BotStatus, NotificationEnvelope, ServerEvent, Speed};
use serde_json::json;
use tokio::sync::{mpsc, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::admission_policy::{self, AdmissionDecision, SpeedCounts};
use crate::config::Config;
use crate::engine_pool::{EnginePool, EngineRole, PooledEngine};
use crate::rest_client::RestClient;
use crate::transport::ServerConnection;

const FINISH_GRACE: Duration = Duration::from_secs(1);
const STATUS_INTERVAL: Duration = Duration::from_millis(100);
const DUMP_INTERVAL: Duration = Duration::from_secs(60);

/// Notification types the session controller silently drops without
/// logging anything — routine lifecycle noise the bot doesn't act on.
const IGNORABLE_NOTIFICATIONS: &[&str] = &[
    "delete",
    "gameStarted",
    "gameEnded",
    "gameDeclined",
    "gameResumedFromStoneRemoval",
    "tournamentStarted",
    "tournamentEnded",
    "aiReviewDone",
];

/// The server-assigned identity learned from `authenticate`'s ack. Replaces
/// the two mutated fields a process-wide config struct would otherwise
/// carry: everything else in `Config` is immutable for the process
/// lifetime.
#[derive(Debug, Clone)]
pub struct BotIdentity {
    pub id: u64,
    pub username: String,
}

struct GameDescriptor {
    speed: Speed,
    engine: PooledEngine,
    role: EngineRole,
    disconnect_timer: Option<JoinHandle<()>>,
}

impl GameDescriptor {
    /// The capability profile the Clock Translator needs to pick a command
    /// form for this game's engine.
    #[allow(dead_code)]
    fn capabilities(&self) -> EngineCapabilityProfile {
        self.engine.capabilities
    }
}

pub struct SessionController {
    config: Arc<Config>,
    pools: Arc<EnginePool>,
    rest: RestClient,
    identity: RwLock<Option<BotIdentity>>,
    descriptors: Mutex<HashMap<u64, GameDescriptor>>,
    last_reported_status: Mutex<Option<BotStatus>>,
}

impl SessionController {
    pub fn new(config: Arc<Config>, pools: Arc<EnginePool>, rest: RestClient) -> Arc<Self> {
        Arc::new(Self {
            config,
            pools,
            rest,
            identity: RwLock::new(None),
            descriptors: Mutex::new(HashMap::new()),
            last_reported_status: Mutex::new(None),
        })
    }

    /// Authenticates, then runs the event loop (plus the two periodic
    /// tasks) until the connection's inbound stream ends.
    pub async fn run(self: &Arc<Self>, mut connection: ServerConnection) -> Result<(), crate::error::Error> {
        let ack = connection
            .authenticate(&AuthenticateMessage {
                jwt: String::new(),
                bot_username: self.config.username.clone(),
                bot_apikey: self.config.apikey.clone(),
                bot_config: json!({}),
            })
            .await?;
        *self.identity.write().await = Some(BotIdentity { id: ack.id, username: ack.username });
        tracing::info!(bot_id = ack.id, "authenticated");

        if self.config.hidden {
            let _ = connection.send(json!({"type": "bot/hidden", "hidden": true}));
        }

        let outbound = connection.sender();
        {
            let this = self.clone();
            let outbound = outbound.clone();
            tokio::spawn(async move { this.status_report_loop(outbound).await });
        }
        {
            let this = self.clone();
            tokio::spawn(async move { this.periodic_dump_loop().await });
        }

        while let Some(event) = connection.next_event().await {
            self.handle_event(event, &outbound).await;
        }

        self.handle_disconnect().await;
        Ok(())
    }

    async fn handle_event(self: &Arc<Self>, event: ServerEvent, outbound: &mpsc::UnboundedSender<serde_json::Value>) {
        match event {
            ServerEvent::Connect => {}
            ServerEvent::Disconnect => self.handle_disconnect().await,
            ServerEvent::ActiveGame(active_game) => {
                self.handle_active_game(active_game.id, active_game.speed, &active_game.phase).await;
            }
            ServerEvent::Notification(notification) => {
                self.handle_notification(notification, outbound).await;
            }
        }
    }

    async fn handle_disconnect(self: &Arc<Self>) {
        let mut descriptors = self.descriptors.lock().await;
        for (game_id, descriptor) in descriptors.drain() {
            if let Some(timer) = descriptor.disconnect_timer {
                timer.abort();
            }
            descriptor.engine.adapter.kill();
            tracing::info!(game_id, "tore down descriptor on disconnect");
        }
    }

    async fn handle_active_game(self: &Arc<Self>, game_id: u64, speed: Speed, phase: &str) {
        if phase == "finished" {
            self.ensure_descriptor(game_id, speed).await;
            self.schedule_finish_grace(game_id).await;
        } else {
            self.ensure_descriptor(game_id, speed).await;
            self.cancel_finish_grace(game_id).await;
        }
    }

    /// Idempotent: a second `active_game` for an already-connected game is
    /// a no-op.
    async fn ensure_descriptor(self: &Arc<Self>, game_id: u64, speed: Speed) {
        {
            let descriptors = self.descriptors.lock().await;
            if descriptors.contains_key(&game_id) {
                return;
            }
        }
        let Some(engine) = self.pools.acquire(EngineRole::Main).await else {
            tracing::error!(game_id, "no main engine pool configured");
            return;
        };
        let mut descriptors = self.descriptors.lock().await;
        descriptors.insert(
            game_id,
            GameDescriptor { speed, engine, role: EngineRole::Main, disconnect_timer: None },
        );
    }

    async fn schedule_finish_grace(self: &Arc<Self>, game_id: u64) {
        let this = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(FINISH_GRACE).await;
            this.finish_descriptor(game_id).await;
        });
        let mut descriptors = self.descriptors.lock().await;
        if let Some(descriptor) = descriptors.get_mut(&game_id) {
            if let Some(old) = descriptor.disconnect_timer.replace(handle) {
                old.abort();
            }
        }
    }

    async fn cancel_finish_grace(self: &Arc<Self>, game_id: u64) {
        let mut descriptors = self.descriptors.lock().await;
        if let Some(descriptor) = descriptors.get_mut(&game_id) {
            if let Some(timer) = descriptor.disconnect_timer.take() {
                timer.abort();
            }
        }
    }

    async fn finish_descriptor(self: &Arc<Self>, game_id: u64) {
        let removed = { self.descriptors.lock().await.remove(&game_id) };
        if let Some(descriptor) = removed {
            self.pools.release(descriptor.role, descriptor.engine).await;
            tracing::info!(game_id, "descriptor finished after grace period");
        }
    }

    async fn handle_notification(
        self: &Arc<Self>,
        notification: NotificationEnvelope,
        outbound: &mpsc::UnboundedSender<serde_json::Value>,
    ) {
        match notification.kind.as_str() {
            "challenge" => self.handle_challenge(notification).await,
            "friendRequest" => self.handle_friend_request(notification).await,
            kind if IGNORABLE_NOTIFICATIONS.contains(&kind) => {}
            kind => {
                tracing::info!(kind, id = %notification.id, "unrecognized notification; deleting");
                let _ = outbound.send(json!({"type": "notification/delete", "notification_id": notification.id}));
            }
        }
    }

    async fn handle_challenge(self: &Arc<Self>, notification: NotificationEnvelope) {
        let challenge: protocol::wire::ChallengePayload = match serde_json::from_value(notification.body) {
            Ok(c) => c,
            Err(err) => {
                tracing::warn!(?err, "malformed challenge notification");
                return;
            }
        };
        let counts = self.current_counts().await;
        match admission_policy::evaluate(&challenge, counts, &self.config) {
            AdmissionDecision::Accept => {
                if let Err(err) = self.rest.accept_challenge(challenge.challenge_id).await {
                    tracing::error!(?err, challenge_id = challenge.challenge_id, "failed to accept challenge");
                }
            }
            AdmissionDecision::Reject { code, details } => {
                let decline = protocol::wire::ChallengeDeclineRequest {
                    delete: true,
                    message: code.message().to_string(),
                    rejection_details: Some(protocol::wire::RejectionPayload { rejection_code: code, details }),
                };
                if let Err(err) = self.rest.decline_challenge(challenge.challenge_id, &decline).await {
                    tracing::error!(?err, challenge_id = challenge.challenge_id, "failed to decline challenge");
                }
            }
        }
    }

    async fn handle_friend_request(self: &Arc<Self>, notification: NotificationEnvelope) {
        let Some(from_user) = notification.body.get("from_user").and_then(|v| v.as_u64()) else {
            tracing::warn!("malformed friend request notification");
            return;
        };
        if let Err(err) = self.rest.accept_friend_request(from_user).await {
            tracing::error!(?err, from_user, "failed to accept friend request");
        }
    }

    async fn current_counts(&self) -> SpeedCounts {
        let descriptors = self.descriptors.lock().await;
        let mut counts = SpeedCounts::default();
        for descriptor in descriptors.values() {
            match descriptor.speed {
                Speed::Blitz => counts.blitz += 1,
                Speed::Live => counts.live += 1,
                Speed::Correspondence => counts.correspondence += 1,
            }
        }
        counts
    }

    async fn status_report_loop(self: Arc<Self>, outbound: mpsc::UnboundedSender<serde_json::Value>) {
        let mut interval = tokio::time::interval(STATUS_INTERVAL);
        loop {
            interval.tick().await;
            let counts = self.current_counts().await;
            let status = BotStatus {
                ongoing_blitz_count: counts.blitz,
                ongoing_live_count: counts.live,
                ongoing_correspondence_count: counts.correspondence,
            };
            let mut last = self.last_reported_status.lock().await;
            if last.as_ref() != Some(&status) {
                let _ = outbound.send(json!({
                    "type": "bot/status",
                    "ongoing_blitz_count": status.ongoing_blitz_count,
                    "ongoing_live_count": status.ongoing_live_count,
                    "ongoing_correspondence_count": status.ongoing_correspondence_count,
                }));
                *last = Some(status);
            }
        }
    }

    async fn periodic_dump_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(DUMP_INTERVAL);
        loop {
            interval.tick().await;
            let counts = self.current_counts().await;
            let main_available = self.pools.count_available(EngineRole::Main).await;
            tracing::info!(
                blitz = counts.blitz,
                live = counts.live,
                correspondence = counts.correspondence,
                main_available,
                "status dump"
            );
        }
    }
}
