//! The recognized configuration surface (`spec.md` §6), loaded once at
//! startup from a JSON file and validated before anything connects.

use std::collections::HashSet;

use protocol::wire::TimeControlSystem;
use serde::Deserialize;

use crate::error::Error;

/// `allowed_board_sizes`: `"all"`, `"square"`, or an explicit list of sizes.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum AllowedBoardSizes {
    Keyword(String),
    List(Vec<u32>),
}

impl AllowedBoardSizes {
    pub fn accepts(&self, width: u32, height: u32) -> bool {
        match self {
            AllowedBoardSizes::Keyword(keyword) if keyword == "all" => true,
            AllowedBoardSizes::Keyword(keyword) if keyword == "square" => width == height,
            AllowedBoardSizes::Keyword(_) => false,
            AllowedBoardSizes::List(sizes) => width == height && sizes.contains(&width),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        if let AllowedBoardSizes::Keyword(keyword) = self {
            if keyword != "all" && keyword != "square" {
                return Err(Error::ConfigInvalid(format!(
                    "allowed_board_sizes: unrecognized keyword {keyword:?}"
                )));
            }
        }
        Ok(())
    }
}

/// Inclusive `[min, max]` range used for every per-speed numeric check.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Range {
    pub min: u32,
    pub max: u32,
}

impl Range {
    pub fn contains(self, value: u32) -> bool {
        value >= self.min && value <= self.max
    }

    fn validate(self, field: &str) -> Result<(), Error> {
        if self.min > self.max {
            return Err(Error::ConfigInvalid(format!("{field}: min > max")));
        }
        Ok(())
    }
}

/// One `allowed_{speed}_settings` block.
#[derive(Debug, Clone, Deserialize)]
pub struct SpeedSettings {
    pub concurrent_games: u32,
    pub per_move_time_range: Range,
    pub main_time_range: Range,
    pub periods_range: Range,
}

impl SpeedSettings {
    fn validate(&self, speed: &str) -> Result<(), Error> {
        self.per_move_time_range
            .validate(&format!("allowed_{speed}_settings.per_move_time_range"))?;
        self.main_time_range
            .validate(&format!("allowed_{speed}_settings.main_time_range"))?;
        self.periods_range
            .validate(&format!("allowed_{speed}_settings.periods_range"))?;
        Ok(())
    }
}

/// One blacklist/whitelist entry: a challenger is matched by id or username.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UserMatcher {
    Id(u64),
    Username(String),
}

/// One configured engine role's launch command.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineCommand {
    pub argv: Vec<String>,
    #[serde(default = "default_instance_count")]
    pub instances: u32,
}

fn default_instance_count() -> u32 {
    1
}

fn default_startup_buffer_ms() -> i64 {
    0
}

/// The process-wide, read-mostly configuration. Immutable after
/// `validate()` succeeds; the authenticated bot identity is tracked
/// separately by the session controller, not mutated here.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub username: String,
    pub apikey: String,

    #[serde(default)]
    pub hidden: bool,

    pub bot_command: EngineCommand,
    #[serde(default)]
    pub opening_bot: Option<EngineCommand>,
    #[serde(default)]
    pub ending_bot: Option<EngineCommand>,
    #[serde(default)]
    pub resign_bot: Option<EngineCommand>,

    #[serde(default)]
    pub ogspv: bool,
    #[serde(default)]
    pub aichat: bool,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub verbosity: Option<String>,
    #[serde(default)]
    pub noclock: bool,
    #[serde(default = "default_startup_buffer_ms")]
    pub startup_buffer_ms: i64,
    #[serde(default)]
    pub showboard: bool,

    #[serde(default)]
    pub allow_handicap: bool,
    #[serde(default)]
    pub allow_unranked: bool,

    pub allowed_board_sizes: AllowedBoardSizes,
    pub allowed_time_control_systems: Vec<TimeControlSystem>,

    #[serde(default)]
    pub allowed_blitz_settings: Option<SpeedSettings>,
    #[serde(default)]
    pub allowed_live_settings: Option<SpeedSettings>,
    #[serde(default)]
    pub allowed_correspondence_settings: Option<SpeedSettings>,

    #[serde(default)]
    pub blacklist: Vec<UserMatcher>,
    #[serde(default)]
    pub whitelist: Vec<UserMatcher>,

    /// Base URL for the server's socket endpoint, e.g.
    /// `wss://online-go.com/socket`. Not part of the original recognized
    /// option list but required to actually dial anything.
    pub server_url: String,
    /// Base URL for the REST API, e.g. `https://online-go.com/api/v1`.
    pub rest_base_url: String,
}

impl Config {
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::ConfigInvalid("username must not be empty".into()));
        }
        if self.apikey.trim().is_empty() {
            return Err(Error::ConfigInvalid("apikey must not be empty".into()));
        }
        if self.bot_command.argv.is_empty() {
            return Err(Error::ConfigInvalid("bot_command must not be empty".into()));
        }
        for (label, optional) in [
            ("opening_bot", &self.opening_bot),
            ("ending_bot", &self.ending_bot),
            ("resign_bot", &self.resign_bot),
        ] {
            if let Some(cmd) = optional {
                if cmd.argv.is_empty() {
                    return Err(Error::ConfigInvalid(format!("{label} must not be empty")));
                }
            }
        }

        self.allowed_board_sizes.validate()?;
        if self.allowed_time_control_systems.is_empty() {
            return Err(Error::ConfigInvalid(
                "allowed_time_control_systems must not be empty".into(),
            ));
        }

        for (speed, settings) in [
            ("blitz", &self.allowed_blitz_settings),
            ("live", &self.allowed_live_settings),
            ("correspondence", &self.allowed_correspondence_settings),
        ] {
            if let Some(settings) = settings {
                settings.validate(speed)?;
            }
        }

        let blacklisted_ids: HashSet<u64> = self
            .blacklist
            .iter()
            .filter_map(|m| match m {
                UserMatcher::Id(id) => Some(*id),
                UserMatcher::Username(_) => None,
            })
            .collect();
        let whitelisted_ids: HashSet<u64> = self
            .whitelist
            .iter()
            .filter_map(|m| match m {
                UserMatcher::Id(id) => Some(*id),
                UserMatcher::Username(_) => None,
            })
            .collect();
        if !blacklisted_ids.is_disjoint(&whitelisted_ids) {
            tracing::warn!("a user id appears in both blacklist and whitelist; whitelist wins");
        }

        if self.server_url.trim().is_empty() || self.rest_base_url.trim().is_empty() {
            return Err(Error::ConfigInvalid(
                "server_url and rest_base_url must not be empty".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal_config() -> Config {
        Config {
            username: "bot".into(),
            apikey: "key".into(),
            hidden: false,
            bot_command: EngineCommand { argv: vec!["gnugo".into(), "--mode".into(), "gtp".into()], instances: 1 },
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
            allowed_live_settings: None,
            allowed_correspondence_settings: None,
            blacklist: Vec::new(),
            whitelist: Vec::new(),
            server_url: "wss://example.invalid/socket".into(),
            rest_base_url: "https://example.invalid/api/v1".into(),
        }
    }

    #[test]
    fn minimal_config_validates() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn empty_username_is_rejected() {
        let mut config = minimal_config();
        config.username = String::new();
        assert!(matches!(config.validate(), Err(Error::ConfigInvalid(_))));
    }

    #[test]
    fn unrecognized_board_size_keyword_is_rejected() {
        let mut config = minimal_config();
        config.allowed_board_sizes = AllowedBoardSizes::Keyword("hexagonal".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut config = minimal_config();
        config.allowed_live_settings = Some(SpeedSettings {
            concurrent_games: 1,
            per_move_time_range: Range { min: 60, max: 10 },
            main_time_range: Range { min: 0, max: 0 },
            periods_range: Range { min: 0, max: 0 },
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn board_size_acceptance() {
        let all = AllowedBoardSizes::Keyword("all".into());
        assert!(all.accepts(13, 19));
        let square = AllowedBoardSizes::Keyword("square".into());
        assert!(square.accepts(19, 19));
        assert!(!square.accepts(19, 13));
        let list = AllowedBoardSizes::List(vec![9, 13, 19]);
        assert!(list.accepts(13, 13));
        assert!(!list.accepts(13, 9));
    }
}
