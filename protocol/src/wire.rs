//! Inbound/outbound socket message shapes and REST payloads, per the
//! external interface list. This module only describes data — the actual
//! socket and HTTP plumbing live behind traits in the bot binary.

use crate::rejection::{RejectionCode, RejectionDetails};
use serde::{Deserialize, Serialize};

/// `blitz | live | correspondence`, derived from the time control and used
/// to key per-speed admission settings and concurrency counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speed {
    Blitz,
    Live,
    Correspondence,
}

/// Which clock system a challenge or active game is using.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeControlSystem {
    Fischer,
    Byoyomi,
    Canadian,
    Simple,
    Absolute,
    None,
}

/// The server's time control description, reduced to the fields any of the
/// five systems might populate. Unused fields for a given `system` are
/// `None`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeControl {
    pub system: TimeControlSystem,
    pub speed: Speed,
    /// fischer: seconds credited to the clock at game start.
    pub initial_time: Option<u32>,
    /// fischer: seconds credited per move.
    pub time_increment: Option<u32>,
    /// fischer: cap on accumulated time.
    pub max_time: Option<u32>,
    /// byoyomi/canadian/absolute: main time in seconds (byoyomi's `M`,
    /// canadian's `M`, absolute's total).
    pub main_time: Option<u32>,
    /// byoyomi/canadian: seconds per overtime period (`P`).
    pub period_time: Option<u32>,
    /// byoyomi: number of overtime periods (`N`).
    pub periods: Option<u32>,
    /// canadian: stones required per overtime period (`S`).
    pub stones_per_period: Option<u32>,
    /// simple: seconds allotted per move.
    pub per_move: Option<u32>,
}

/// Identity of the user issuing a challenge or friend request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRef {
    pub id: u64,
    pub username: String,
}

/// The challenge payload reduced to exactly what the Admission Policy needs
/// (`spec.md` §3, "Admission Context").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallengePayload {
    pub challenge_id: u64,
    pub user: UserRef,
    pub time_control: TimeControl,
    pub width: u32,
    pub height: u32,
    pub handicap: i32,
    pub ranked: bool,
}

/// Notification envelope dispatch tag plus the raw body, so unrecognized
/// `type`s can still be logged and deleted per `spec.md` §4.5.
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(flatten)]
    pub body: serde_json::Value,
}

/// `active_game` payload: a live game's id and current phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveGameEvent {
    pub id: u64,
    pub phase: String,
    pub speed: Speed,
}

/// Every inbound event the session controller reacts to, per `spec.md` §6
/// "Inbound socket events".
#[derive(Debug, Clone)]
pub enum ServerEvent {
    Connect,
    Disconnect,
    Notification(NotificationEnvelope),
    ActiveGame(ActiveGameEvent),
}

/// `authenticate` outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticateMessage {
    pub jwt: String,
    pub bot_username: String,
    pub bot_apikey: String,
    pub bot_config: serde_json::Value,
}

/// Ack payload for a successful `authenticate`.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthenticateAck {
    pub id: u64,
    pub username: String,
}

/// `bot/status` outbound message.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BotStatus {
    pub ongoing_blitz_count: u32,
    pub ongoing_live_count: u32,
    pub ongoing_correspondence_count: u32,
}

/// `notification/delete` outbound message.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationDelete {
    pub notification_id: String,
}

/// `POST me/friends/invitations` body.
#[derive(Debug, Clone, Serialize)]
pub struct FriendInvitationRequest {
    pub from_user: u64,
}

/// `POST me/challenges/{id}` body when declining, carrying the
/// machine-readable rejection alongside the human message.
#[derive(Debug, Clone, Serialize)]
pub struct ChallengeDeclineRequest {
    pub delete: bool,
    pub message: String,
    pub rejection_details: Option<RejectionPayload>,
}

/// The `rejection_details` object inside a decline request.
#[derive(Debug, Clone, Serialize)]
pub struct RejectionPayload {
    pub rejection_code: RejectionCode,
    pub details: RejectionDetails,
}
