//! Pure translation of a server clock snapshot into the GTP time-setup
//! commands an engine needs, for each of the five time control systems and
//! both with and without `kgs-time_settings` support.
//!
//! Every function here is a pure function of its inputs: no I/O, no clock
//! reads. The one wall-clock read (`now`) happens at the call site in the
//! engine adapter, which then passes the resulting offset in.

use crate::capabilities::EngineCapabilityProfile;
use protocol::wire::{TimeControl, TimeControlSystem};

/// `black`/`white`, used to select which color's fields the offset applies
/// to. Re-declared locally rather than importing `protocol::Color` because
/// the clock snapshot is keyed the same way the server keys it (`black`/
/// `white`), independent of whose turn a board coordinate belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockColor {
    Black,
    White,
}

impl ClockColor {
    fn gtp_str(self) -> &'static str {
        match self {
            ClockColor::Black => "black",
            ClockColor::White => "white",
        }
    }
}

/// One color's clock as last reported by the server. Fields are read
/// according to `time_control.system`; a system never reads a field another
/// system populates.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerClock {
    /// Remaining main/thinking time in seconds, or (byoyomi convention) `0`
    /// exactly when the current overtime period has not yet been touched.
    pub thinking_time: i64,
    /// byoyomi: periods remaining, including the current one.
    pub periods: u32,
    /// canadian: stones remaining in the current block.
    pub stones_left: u32,
}

/// Everything the translator needs for one `time_left`/`time_settings`
/// emission: the config, both clocks, whose turn it is, and the elapsed-time
/// inputs used to compute the offset.
pub struct ClockSnapshot {
    pub time_control: TimeControl,
    pub to_move: ClockColor,
    pub black: PlayerClock,
    pub white: PlayerClock,
    pub capabilities: EngineCapabilityProfile,
    /// Whether this is the first command sent to this engine in the game,
    /// in which case `startup_buffer_ms` is folded into the offset.
    pub first_move: bool,
    pub now_ms: i64,
    pub last_move_ms: i64,
    pub clock_drift_ms: i64,
    pub startup_buffer_ms: i64,
}

impl ClockSnapshot {
    fn offset_seconds(&self) -> i64 {
        let adjusted_now = self.now_ms - self.clock_drift_ms;
        let buffer = if self.first_move { self.startup_buffer_ms } else { 0 };
        let raw = buffer + adjusted_now - self.last_move_ms;
        (raw / 1000).max(0)
    }
}

/// Rolls a byoyomi clock forward through exhausted periods.
///
/// `thinking_time == 0` is the sentinel for "a fresh period just started";
/// in that case the baseline is `period_time`, not `0`, since OGS stops
/// reporting a nonzero thinking time once main time is exhausted and a
/// period resets fully on every move. Clamped to zero once the last period
/// is reached rather than rolling past it (`time_left 0 1`, never negative).
fn roll_byoyomi(thinking_time: i64, periods: u32, period_time: i64, offset: i64) -> (i64, u32) {
    let base = if thinking_time > 0 { thinking_time } else { period_time };
    let mut t = base - offset;
    let mut periods_left = periods;
    while t < 0 && periods_left > 1 {
        t += period_time;
        periods_left -= 1;
    }
    if t < 0 {
        t = 0;
    }
    (t, periods_left)
}

fn roll_canadian(
    thinking_time: i64,
    stones_left: u32,
    period_time: i64,
    stones_per_period: u32,
    offset: i64,
) -> (i64, u32) {
    let mut t = thinking_time - offset;
    let mut stones = stones_left;
    if t <= 0 {
        t = period_time;
        stones = stones_per_period;
    }
    (t.max(0), stones)
}

/// Maps Japanese byoyomi onto a single Canadian `stones=1` overtime block
/// when the engine lacks `kgs-time_settings`. All periods but the last are
/// folded into the declared main time so the engine can spend them however
/// it likes; the last period becomes a repeating one-stone-per-period block,
/// which is the only shape plain `time_settings` can express per move.
fn byoyomi_as_canadian(thinking_time: i64, periods: u32, period_time: i64, offset: i64) -> (i64, u32) {
    let (t, periods_left) = roll_byoyomi(thinking_time, periods, period_time, offset);
    if periods_left <= 1 {
        (t, 1)
    } else {
        (t + (periods_left - 1) * period_time, 0)
    }
}

fn fischer_as_canadian(thinking_time: i64, increment: i64, offset: i64) -> (i64, u32) {
    let t = thinking_time - offset - increment;
    if t < 0 {
        (0, 1)
    } else {
        (t, 0)
    }
}

fn clock_of(snapshot: &ClockSnapshot, color: ClockColor) -> PlayerClock {
    match color {
        ClockColor::Black => snapshot.black,
        ClockColor::White => snapshot.white,
    }
}

fn offset_for(snapshot: &ClockSnapshot, color: ClockColor) -> i64 {
    if color == snapshot.to_move {
        snapshot.offset_seconds()
    } else {
        0
    }
}

/// Produces the ordered GTP command lines to bring an engine's clock in
/// sync, per the system in `snapshot.time_control.system`. Returns an empty
/// list for `TimeControlSystem::None` (clock-free games).
pub fn translate(snapshot: &ClockSnapshot) -> Vec<String> {
    let tc = &snapshot.time_control;
    match tc.system {
        TimeControlSystem::None => Vec::new(),
        TimeControlSystem::Simple => translate_simple(tc),
        TimeControlSystem::Absolute => translate_absolute(snapshot),
        TimeControlSystem::Byoyomi => translate_byoyomi(snapshot),
        TimeControlSystem::Canadian => translate_canadian(snapshot),
        TimeControlSystem::Fischer => translate_fischer(snapshot),
    }
}

fn translate_simple(tc: &TimeControl) -> Vec<String> {
    let per_move = tc.per_move.unwrap_or(0);
    vec![
        format!("time_settings 0 {per_move} 1"),
        format!("time_left black {per_move} 1"),
        format!("time_left white {per_move} 1"),
    ]
}

fn translate_absolute(snapshot: &ClockSnapshot) -> Vec<String> {
    let tc = &snapshot.time_control;
    let total = tc.main_time.unwrap_or(0);
    let mut out = vec![format!("time_settings {total} 0 0")];
    for color in [ClockColor::Black, ClockColor::White] {
        let clock = clock_of(snapshot, color);
        let offset = offset_for(snapshot, color);
        let t = (clock.thinking_time - offset).max(0);
        out.push(format!("time_left {} {t} 0", color.gtp_str()));
    }
    out
}

fn translate_byoyomi(snapshot: &ClockSnapshot) -> Vec<String> {
    let tc = &snapshot.time_control;
    let main = tc.main_time.unwrap_or(0);
    let period_time = tc.period_time.unwrap_or(0) as i64;
    let periods = tc.periods.unwrap_or(0);

    let mut out = Vec::new();
    if snapshot.capabilities.supports_kgs_time_settings {
        out.push(format!("kgs-time_settings byoyomi {main} {period_time} {periods}"));
        for color in [ClockColor::Black, ClockColor::White] {
            let clock = clock_of(snapshot, color);
            let offset = offset_for(snapshot, color);
            let (t, periods_left) =
                roll_byoyomi(clock.thinking_time, clock.periods, period_time, offset);
            out.push(format!("time_left {} {t} {periods_left}", color.gtp_str()));
        }
    } else {
        let combined_main = main + (periods.saturating_sub(1)) as u32 * period_time as u32;
        out.push(format!("time_settings {combined_main} {period_time} 1"));
        for color in [ClockColor::Black, ClockColor::White] {
            let clock = clock_of(snapshot, color);
            let offset = offset_for(snapshot, color);
            let (t, stones) =
                byoyomi_as_canadian(clock.thinking_time, clock.periods, period_time, offset);
            out.push(format!("time_left {} {t} {stones}", color.gtp_str()));
        }
    }
    out
}

fn translate_canadian(snapshot: &ClockSnapshot) -> Vec<String> {
    let tc = &snapshot.time_control;
    let main = tc.main_time.unwrap_or(0);
    let period_time = tc.period_time.unwrap_or(0) as i64;
    let stones_per_period = tc.stones_per_period.unwrap_or(0);

    let mut out = Vec::new();
    let command_name = if snapshot.capabilities.supports_kgs_time_settings {
        format!("kgs-time_settings canadian {main} {period_time} {stones_per_period}")
    } else {
        format!("time_settings {main} {period_time} {stones_per_period}")
    };
    out.push(command_name);
    for color in [ClockColor::Black, ClockColor::White] {
        let clock = clock_of(snapshot, color);
        let offset = offset_for(snapshot, color);
        let (t, stones) = roll_canadian(
            clock.thinking_time,
            clock.stones_left,
            period_time,
            stones_per_period,
            offset,
        );
        out.push(format!("time_left {} {t} {stones}", color.gtp_str()));
    }
    out
}

fn translate_fischer(snapshot: &ClockSnapshot) -> Vec<String> {
    let tc = &snapshot.time_control;
    let initial = tc.initial_time.unwrap_or(0) as i64;
    let increment = tc.time_increment.unwrap_or(0) as i64;
    let max_time = tc.max_time.unwrap_or(0) as i64;

    let mut out = Vec::new();
    if snapshot.capabilities.supports_fischer_capped {
        out.push(format!(
            "kata-time_settings fischer-capped {initial} {increment} {max_time} -1"
        ));
        for color in [ClockColor::Black, ClockColor::White] {
            let clock = clock_of(snapshot, color);
            let offset = offset_for(snapshot, color);
            let t = (clock.thinking_time - offset).max(0);
            out.push(format!("time_left {} {t} 0", color.gtp_str()));
        }
    } else {
        let folded_main = (initial - increment).max(0);
        let command_name = if snapshot.capabilities.supports_kgs_time_settings {
            format!("kgs-time_settings canadian {folded_main} {increment} 1")
        } else {
            format!("time_settings {folded_main} {increment} 1")
        };
        out.push(command_name);
        for color in [ClockColor::Black, ClockColor::White] {
            let clock = clock_of(snapshot, color);
            let offset = offset_for(snapshot, color);
            let (t, stones) = fischer_as_canadian(clock.thinking_time, increment, offset);
            out.push(format!("time_left {} {t} {stones}", color.gtp_str()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::wire::Speed;

    fn base_time_control(system: TimeControlSystem) -> TimeControl {
        TimeControl {
            system,
            speed: Speed::Live,
            initial_time: None,
            time_increment: None,
            max_time: None,
            main_time: None,
            period_time: None,
            periods: None,
            stones_per_period: None,
            per_move: None,
        }
    }

    #[test]
    fn byoyomi_rollover_consumes_exactly_one_period() {
        let mut tc = base_time_control(TimeControlSystem::Byoyomi);
        tc.main_time = Some(600);
        tc.period_time = Some(30);
        tc.periods = Some(3);

        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::Black,
            black: PlayerClock { thinking_time: 0, periods: 3, stones_left: 0 },
            white: PlayerClock { thinking_time: 30, periods: 3, stones_left: 0 },
            capabilities: EngineCapabilityProfile {
                supports_kgs_time_settings: true,
                ..Default::default()
            },
            first_move: false,
            now_ms: 35_000,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 0,
        };

        let commands = translate(&snapshot);
        assert_eq!(commands[0], "kgs-time_settings byoyomi 600 30 3");
        assert_eq!(commands[1], "time_left black 25 2");
        assert_eq!(commands[2], "time_left white 30 3");
    }

    #[test]
    fn last_byoyomi_period_clamps_to_zero_instead_of_rolling_past_it() {
        let mut tc = base_time_control(TimeControlSystem::Byoyomi);
        tc.main_time = Some(0);
        tc.period_time = Some(30);
        tc.periods = Some(1);

        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::Black,
            black: PlayerClock { thinking_time: 0, periods: 1, stones_left: 0 },
            white: PlayerClock { thinking_time: 0, periods: 1, stones_left: 0 },
            capabilities: EngineCapabilityProfile {
                supports_kgs_time_settings: true,
                ..Default::default()
            },
            first_move: false,
            now_ms: 40_000,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 0,
        };

        let commands = translate(&snapshot);
        assert_eq!(commands[1], "time_left black 0 1");
    }

    #[test]
    fn byoyomi_without_kgs_folds_all_but_last_period_into_main_time() {
        let mut tc = base_time_control(TimeControlSystem::Byoyomi);
        tc.main_time = Some(600);
        tc.period_time = Some(30);
        tc.periods = Some(3);

        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::Black,
            black: PlayerClock { thinking_time: 0, periods: 3, stones_left: 0 },
            white: PlayerClock { thinking_time: 0, periods: 3, stones_left: 0 },
            capabilities: EngineCapabilityProfile::default(),
            first_move: false,
            now_ms: 0,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 0,
        };

        let commands = translate(&snapshot);
        assert_eq!(commands[0], "time_settings 660 30 1");
    }

    #[test]
    fn simple_ignores_reported_clocks_and_always_emits_per_move() {
        let mut tc = base_time_control(TimeControlSystem::Simple);
        tc.per_move = Some(10);

        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::White,
            black: PlayerClock { thinking_time: 999, periods: 0, stones_left: 0 },
            white: PlayerClock { thinking_time: 1, periods: 0, stones_left: 0 },
            capabilities: EngineCapabilityProfile::default(),
            first_move: false,
            now_ms: 500_000,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 0,
        };

        let commands = translate(&snapshot);
        assert_eq!(
            commands,
            vec![
                "time_settings 0 10 1".to_string(),
                "time_left black 10 1".to_string(),
                "time_left white 10 1".to_string(),
            ]
        );
    }

    #[test]
    fn none_system_emits_nothing() {
        let tc = base_time_control(TimeControlSystem::None);
        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::Black,
            black: PlayerClock::default(),
            white: PlayerClock::default(),
            capabilities: EngineCapabilityProfile::default(),
            first_move: false,
            now_ms: 0,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 0,
        };
        assert!(translate(&snapshot).is_empty());
    }

    #[test]
    fn first_move_folds_in_the_startup_buffer() {
        let mut tc = base_time_control(TimeControlSystem::Absolute);
        tc.main_time = Some(300);

        let snapshot = ClockSnapshot {
            time_control: tc,
            to_move: ClockColor::Black,
            black: PlayerClock { thinking_time: 300, periods: 0, stones_left: 0 },
            white: PlayerClock { thinking_time: 300, periods: 0, stones_left: 0 },
            capabilities: EngineCapabilityProfile::default(),
            first_move: true,
            now_ms: 2_000,
            last_move_ms: 0,
            clock_drift_ms: 0,
            startup_buffer_ms: 5_000,
        };

        // offset = (5000 + 2000 - 0) / 1000 = 7
        let commands = translate(&snapshot);
        assert_eq!(commands[1], "time_left black 293 0");
    }
}
