//! Engine capability discovery: issued once right after spawn, by sending
//! `list_commands` and, conditionally, `kata-list_time_settings`.

/// What an engine was observed to support after the post-spawn handshake.
/// The Clock Translator consults this to pick which command form to emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineCapabilityProfile {
    pub supports_kgs_time_settings: bool,
    pub supports_kata_time_settings: bool,
    pub supports_fischer_capped: bool,
}

/// Splits a `list_commands` success body into the individual command names.
pub fn parse_command_list(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Builds the capability profile from the parsed `list_commands` output and,
/// if the engine claims `kata-time_settings`, the parsed
/// `kata-list_time_settings` output.
pub fn discover(commands: &[String], kata_time_settings: Option<&[String]>) -> EngineCapabilityProfile {
    let supports_kgs_time_settings = commands.iter().any(|c| c == "kgs-time_settings");
    let supports_kata_time_settings = commands.iter().any(|c| c == "kata-time_settings");
    let supports_fischer_capped = kata_time_settings
        .map(|systems| systems.iter().any(|s| s == "fischer-capped"))
        .unwrap_or(false);
    EngineCapabilityProfile {
        supports_kgs_time_settings,
        supports_kata_time_settings,
        supports_fischer_capped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_command_per_line() {
        let body = "play\ngenmove\nkgs-time_settings\n";
        assert_eq!(
            parse_command_list(body),
            vec!["play".to_string(), "genmove".to_string(), "kgs-time_settings".to_string()]
        );
    }

    #[test]
    fn detects_kgs_and_kata_time_settings_support() {
        let commands = parse_command_list("play\nkgs-time_settings\nkata-time_settings\n");
        let profile = discover(&commands, None);
        assert!(profile.supports_kgs_time_settings);
        assert!(profile.supports_kata_time_settings);
        assert!(!profile.supports_fischer_capped);
    }

    #[test]
    fn fischer_capped_requires_the_kata_list_to_mention_it() {
        let commands = parse_command_list("kata-time_settings\n");
        let systems = parse_command_list("byoyomi\nfischer\nfischer-capped\n");
        let profile = discover(&commands, Some(&systems));
        assert!(profile.supports_fischer_capped);
    }

    #[test]
    fn no_support_when_list_commands_omits_the_extensions() {
        let commands = parse_command_list("play\ngenmove\nquit\n");
        let profile = discover(&commands, None);
        assert!(!profile.supports_kgs_time_settings);
        assert!(!profile.supports_kata_time_settings);
    }
}
