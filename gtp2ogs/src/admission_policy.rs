//! Pure predicate layer: decides whether to accept or decline a challenge.
//! Never touches the network or the clock; a deterministic function of
//! `(challenge, current_counts, config)`.

use protocol::rejection::{RejectionCode, RejectionDetails};
use protocol::wire::{ChallengePayload, Speed, TimeControlSystem};

use crate::config::{Config, UserMatcher};

/// Live game counts by speed class, as currently tracked by the session
/// controller's game descriptors.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedCounts {
    pub blitz: u32,
    pub live: u32,
    pub correspondence: u32,
}

impl SpeedCounts {
    fn get(self, speed: Speed) -> u32 {
        match speed {
            Speed::Blitz => self.blitz,
            Speed::Live => self.live,
            Speed::Correspondence => self.correspondence,
        }
    }
}

/// The policy's verdict: either accept, or decline with the stable code and
/// reconstructable details the counterpart client can localize.
#[derive(Debug, Clone, PartialEq)]
pub enum AdmissionDecision {
    Accept,
    Reject { code: RejectionCode, details: RejectionDetails },
}

fn matches_user(matcher: &UserMatcher, user_id: u64, username: &str) -> bool {
    match matcher {
        UserMatcher::Id(id) => *id == user_id,
        UserMatcher::Username(name) => name.eq_ignore_ascii_case(username),
    }
}

fn is_listed(list: &[UserMatcher], user_id: u64, username: &str) -> bool {
    list.iter().any(|m| matches_user(m, user_id, username))
}

fn speed_settings<'c>(config: &'c Config, speed: Speed) -> Option<&'c crate::config::SpeedSettings> {
    match speed {
        Speed::Blitz => config.allowed_blitz_settings.as_ref(),
        Speed::Live => config.allowed_live_settings.as_ref(),
        Speed::Correspondence => config.allowed_correspondence_settings.as_ref(),
    }
}

fn speed_rejection_code(speed: Speed, too_many: bool) -> RejectionCode {
    match (speed, too_many) {
        (Speed::Blitz, false) => RejectionCode::BlitzNotAllowed,
        (Speed::Blitz, true) => RejectionCode::TooManyBlitzGames,
        (Speed::Live, false) => RejectionCode::LiveNotAllowed,
        (Speed::Live, true) => RejectionCode::TooManyLiveGames,
        (Speed::Correspondence, false) => RejectionCode::CorrespondenceNotAllowed,
        (Speed::Correspondence, true) => RejectionCode::TooManyCorrespondenceGames,
    }
}

/// Runs the evaluation ladder from `spec.md` §4.4 in order, first
/// non-accept wins, except that whitelist membership clears any rejection
/// reached along the way.
pub fn evaluate(challenge: &ChallengePayload, counts: SpeedCounts, config: &Config) -> AdmissionDecision {
    let decision = evaluate_ladder(challenge, counts, config);
    if is_listed(&config.whitelist, challenge.user.id, &challenge.user.username) {
        return AdmissionDecision::Accept;
    }
    decision
}

fn evaluate_ladder(challenge: &ChallengePayload, counts: SpeedCounts, config: &Config) -> AdmissionDecision {
    if is_listed(&config.blacklist, challenge.user.id, &challenge.user.username) {
        return AdmissionDecision::Reject {
            code: RejectionCode::Blacklisted,
            details: RejectionDetails::None {},
        };
    }

    let tc = &challenge.time_control;
    if !config.allowed_time_control_systems.contains(&tc.system) {
        return AdmissionDecision::Reject {
            code: RejectionCode::TimeControlSystemNotAllowed,
            details: RejectionDetails::None {},
        };
    }

    let Some(settings) = speed_settings(config, tc.speed) else {
        return AdmissionDecision::Reject {
            code: speed_rejection_code(tc.speed, false),
            details: RejectionDetails::None {},
        };
    };

    match tc.system {
        TimeControlSystem::Fischer => {
            if let Some(increment) = tc.time_increment {
                if !settings.per_move_time_range.contains(increment) {
                    return AdmissionDecision::Reject {
                        code: RejectionCode::TimeIncrementOutOfRange,
                        details: range_details(increment, settings.per_move_time_range),
                    };
                }
            }
        }
        TimeControlSystem::Byoyomi => {
            if let Some(period_time) = tc.period_time {
                if !settings.per_move_time_range.contains(period_time) {
                    return AdmissionDecision::Reject {
                        code: RejectionCode::PeriodTimeOutOfRange,
                        details: range_details(period_time, settings.per_move_time_range),
                    };
                }
            }
            if let Some(periods) = tc.periods {
                if !settings.periods_range.contains(periods) {
                    return AdmissionDecision::Reject {
                        code: RejectionCode::PeriodsOutOfRange,
                        details: range_details(periods, settings.periods_range),
                    };
                }
            }
            if let Some(main_time) = tc.main_time {
                if !settings.main_time_range.contains(main_time) {
                    return AdmissionDecision::Reject {
                        code: RejectionCode::MainTimeOutOfRange,
                        details: range_details(main_time, settings.main_time_range),
                    };
                }
            }
        }
        TimeControlSystem::Simple => {
            if let Some(per_move) = tc.per_move {
                if !settings.per_move_time_range.contains(per_move) {
                    return AdmissionDecision::Reject {
                        code: RejectionCode::PerMoveTimeOutOfRange,
                        details: range_details(per_move, settings.per_move_time_range),
                    };
                }
            }
        }
        TimeControlSystem::Canadian | TimeControlSystem::Absolute | TimeControlSystem::None => {}
    }

    if counts.get(tc.speed) >= settings.concurrent_games {
        return AdmissionDecision::Reject {
            code: speed_rejection_code(tc.speed, true),
            details: RejectionDetails::Count {
                observed: counts.get(tc.speed),
                limit: settings.concurrent_games,
            },
        };
    }

    if !config
        .allowed_board_sizes
        .accepts(challenge.width, challenge.height)
    {
        let code = if challenge.width != challenge.height {
            RejectionCode::BoardSizeNotSquare
        } else {
            RejectionCode::BoardSizeNotAllowed
        };
        return AdmissionDecision::Reject {
            code,
            details: RejectionDetails::BoardSize { width: challenge.width, height: challenge.height },
        };
    }

    if !config.allow_handicap && challenge.handicap != 0 {
        return AdmissionDecision::Reject {
            code: RejectionCode::HandicapNotAllowed,
            details: RejectionDetails::None {},
        };
    }

    if !config.allow_unranked && !challenge.ranked {
        return AdmissionDecision::Reject {
            code: RejectionCode::UnrankedNotAllowed,
            details: RejectionDetails::None {},
        };
    }

    AdmissionDecision::Accept
}

fn range_details(observed: u32, range: crate::config::Range) -> RejectionDetails {
    RejectionDetails::Range {
        observed: observed as f64,
        range: [range.min as f64, range.max as f64],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AllowedBoardSizes, EngineCommand, Range, SpeedSettings};
    use protocol::wire::{TimeControl, UserRef};

    fn config_allowing_live_fischer() -> Config {
        Config {
            username: "bot".into(),
            apikey: "key".into(),
            hidden: false,
            bot_command: EngineCommand { argv: vec!["engine".into()], instances: 1 },
            opening_bot: None,
            ending_bot: None,
            resign_bot: None,
            ogspv: false,
            aichat: false,
            json: false,
            verbosity: None,
            noclock: false,
            startup_buffer_ms: 0,
            showboard: false,
            allow_handicap: true,
            allow_unranked: true,
            allowed_board_sizes: AllowedBoardSizes::Keyword("square".into()),
            allowed_time_control_systems: vec![TimeControlSystem::Fischer],
            allowed_blitz_settings: None,
            allowed_live_settings: Some(SpeedSettings {
                concurrent_games: 1,
                per_move_time_range: Range { min: 10, max: 60 },
                main_time_range: Range { min: 0, max: 10_000 },
                periods_range: Range { min: 0, max: 10 },
            }),
            allowed_correspondence_settings: None,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            server_url: "wss://example.invalid".into(),
            rest_base_url: "https://example.invalid".into(),
        }
    }

    fn challenge(width: u32, height: u32, increment: u32, handicap: i32, ranked: bool) -> ChallengePayload {
        ChallengePayload {
            challenge_id: 1,
            user: UserRef { id: 42, username: "alice".into() },
            time_control: TimeControl {
                system: TimeControlSystem::Fischer,
                speed: Speed::Live,
                initial_time: Some(600),
                time_increment: Some(increment),
                max_time: Some(600),
                main_time: None,
                period_time: None,
                periods: None,
                stones_per_period: None,
                per_move: None,
            },
            width,
            height,
            handicap,
            ranked,
        }
    }

    #[test]
    fn accepts_square_19x19_fischer_within_range() {
        let config = config_allowing_live_fischer();
        let decision = evaluate(&challenge(19, 19, 30, 0, true), SpeedCounts::default(), &config);
        assert_eq!(decision, AdmissionDecision::Accept);
    }

    #[test]
    fn rejects_non_square_when_square_only() {
        let config = config_allowing_live_fischer();
        let decision = evaluate(&challenge(19, 13, 30, 0, true), SpeedCounts::default(), &config);
        assert_eq!(
            decision,
            AdmissionDecision::Reject {
                code: RejectionCode::BoardSizeNotSquare,
                details: RejectionDetails::BoardSize { width: 19, height: 13 },
            }
        );
    }

    #[test]
    fn rejects_increment_out_of_range() {
        let config = config_allowing_live_fischer();
        let decision = evaluate(&challenge(19, 19, 5, 0, true), SpeedCounts::default(), &config);
        assert_eq!(
            decision,
            AdmissionDecision::Reject {
                code: RejectionCode::TimeIncrementOutOfRange,
                details: RejectionDetails::Range { observed: 5.0, range: [10.0, 60.0] },
            }
        );
    }

    #[test]
    fn whitelist_overrides_blacklist() {
        let mut config = config_allowing_live_fischer();
        config.blacklist.push(UserMatcher::Id(42));
        config.whitelist.push(UserMatcher::Id(42));
        let decision = evaluate(&challenge(19, 19, 30, 0, true), SpeedCounts::default(), &config);
        assert_eq!(decision, AdmissionDecision::Accept);
    }

    #[test]
    fn concurrency_cap_is_enforced() {
        let config = config_allowing_live_fischer();
        let counts = SpeedCounts { live: 1, ..Default::default() };
        let decision = evaluate(&challenge(19, 19, 30, 0, true), counts, &config);
        assert_eq!(
            decision,
            AdmissionDecision::Reject {
                code: RejectionCode::TooManyLiveGames,
                details: RejectionDetails::Count { observed: 1, limit: 1 },
            }
        );
    }

    #[test]
    fn period_time_boundary_is_inclusive() {
        let config = config_allowing_live_fischer();
        // exactly at the lower bound must be accepted.
        let decision = evaluate(&challenge(19, 19, 10, 0, true), SpeedCounts::default(), &config);
        assert_eq!(decision, AdmissionDecision::Accept);
        // one below must be rejected.
        let decision = evaluate(&challenge(19, 19, 9, 0, true), SpeedCounts::default(), &config);
        assert!(matches!(decision, AdmissionDecision::Reject { code: RejectionCode::TimeIncrementOutOfRange, .. }));
    }
}
