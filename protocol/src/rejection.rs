//! The stable, wire-visible rejection vocabulary the Admission Policy
//! produces and the REST client sends back on `me/challenges/{id}`.

use serde::{Deserialize, Serialize};

/// One entry per code in the rejection code set. Serializes to the exact
/// snake_case strings listed in the protocol, so the counterpart client can
/// match on them without a translation table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionCode {
    Blacklisted,
    BoardSizeNotSquare,
    BoardSizeNotAllowed,
    HandicapNotAllowed,
    UnrankedNotAllowed,
    BlitzNotAllowed,
    TooManyBlitzGames,
    LiveNotAllowed,
    TooManyLiveGames,
    CorrespondenceNotAllowed,
    TooManyCorrespondenceGames,
    TimeControlSystemNotAllowed,
    TimeIncrementOutOfRange,
    PeriodTimeOutOfRange,
    PeriodsOutOfRange,
    MainTimeOutOfRange,
    PerMoveTimeOutOfRange,
}

impl RejectionCode {
    /// A short human-readable message for the `message` field that
    /// accompanies the machine-readable code. Kept terse; the counterpart
    /// client is expected to localize from `code`, not parse this.
    pub fn message(self) -> &'static str {
        match self {
            RejectionCode::Blacklisted => "This bot has blacklisted you.",
            RejectionCode::BoardSizeNotSquare => "Board must be square.",
            RejectionCode::BoardSizeNotAllowed => "This board size is not allowed.",
            RejectionCode::HandicapNotAllowed => "Handicap games are not allowed.",
            RejectionCode::UnrankedNotAllowed => "Unranked games are not allowed.",
            RejectionCode::BlitzNotAllowed => "Blitz games are not allowed.",
            RejectionCode::TooManyBlitzGames => "Too many blitz games in progress.",
            RejectionCode::LiveNotAllowed => "Live games are not allowed.",
            RejectionCode::TooManyLiveGames => "Too many live games in progress.",
            RejectionCode::CorrespondenceNotAllowed => "Correspondence games are not allowed.",
            RejectionCode::TooManyCorrespondenceGames => {
                "Too many correspondence games in progress."
            }
            RejectionCode::TimeControlSystemNotAllowed => "This time control is not allowed.",
            RejectionCode::TimeIncrementOutOfRange => "Time increment is out of range.",
            RejectionCode::PeriodTimeOutOfRange => "Period time is out of range.",
            RejectionCode::PeriodsOutOfRange => "Number of periods is out of range.",
            RejectionCode::MainTimeOutOfRange => "Main time is out of range.",
            RejectionCode::PerMoveTimeOutOfRange => "Per-move time is out of range.",
        }
    }
}

/// The `details` object that accompanies a rejection code: enough to
/// reconstruct exactly which observed value violated which configured
/// range or limit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RejectionDetails {
    BoardSize {
        width: u32,
        height: u32,
    },
    Range {
        observed: f64,
        range: [f64; 2],
    },
    Count {
        observed: u32,
        limit: u32,
    },
    None {},
}
