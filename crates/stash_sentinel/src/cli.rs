//! Command-line interface handling for the stash sentinel.
//!
//! Options given here override the matching settings in the configuration
//! file.

use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

/// Command line arguments parsed from user input.
#[derive(Debug, Clone)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the watched log file
    pub log_file: Option<PathBuf>,
    /// Optional override for the maximum distance
    pub max_distance: Option<f64>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Whether to skip reading operator commands from stdin
    pub no_console: bool,
}

impl CliArgs {
    /// Parses the process arguments.
    ///
    /// # Panics
    ///
    /// Does not panic. On invalid arguments or `--help`, clap prints a
    /// message and exits the process.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<PathBuf>("config")
                .cloned()
                .unwrap_or_else(|| PathBuf::from("stash_sentinel.toml")),
            log_file: matches.get_one::<PathBuf>("log-file").cloned(),
            max_distance: matches.get_one::<f64>("max-distance").copied(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            no_console: matches.get_flag("no-console"),
        }
    }
}

fn command() -> Command {
    Command::new("Stash Sentinel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Watches a game server admin log for long-distance and bulk storage looting")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .value_parser(clap::value_parser!(PathBuf))
                .default_value("stash_sentinel.toml"),
        )
        .arg(
            Arg::new("log-file")
                .short('f')
                .long("log-file")
                .value_name("FILE")
                .help("Admin log file to watch")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("max-distance")
                .short('d')
                .long("max-distance")
                .value_name("METERS")
                .help("Maximum distance between player and storage before alerting")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-console")
                .long("no-console")
                .help("Do not read operator commands from stdin")
                .action(clap::ArgAction::SetTrue),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> CliArgs {
        CliArgs::from_matches(&command().get_matches_from(args))
    }

    #[test]
    fn test_defaults() {
        let args = parse_from(&["stash_sentinel"]);
        assert_eq!(args.config_path, PathBuf::from("stash_sentinel.toml"));
        assert!(args.log_file.is_none());
        assert!(args.max_distance.is_none());
        assert!(args.log_level.is_none());
        assert!(!args.json_logs);
        assert!(!args.no_console);
    }

    #[test]
    fn test_overrides() {
        let args = parse_from(&[
            "stash_sentinel",
            "-c",
            "custom.toml",
            "--log-file",
            "/srv/DayZServer_x64.ADM",
            "-d",
            "12.5",
            "-l",
            "debug",
            "--json-logs",
            "--no-console",
        ]);
        assert_eq!(args.config_path, PathBuf::from("custom.toml"));
        assert_eq!(args.log_file, Some(PathBuf::from("/srv/DayZServer_x64.ADM")));
        assert_eq!(args.max_distance, Some(12.5));
        assert_eq!(args.log_level, Some("debug".to_string()));
        assert!(args.json_logs);
        assert!(args.no_console);
    }

    #[test]
    fn test_rejects_non_numeric_distance() {
        let result = command().try_get_matches_from(["stash_sentinel", "-d", "far"]);
        assert!(result.is_err());
    }
}
