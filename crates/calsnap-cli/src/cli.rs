//! Command-line interface definition.

use std::path::PathBuf;

use calsnap_core::TracingOutputFormat;
use clap::{Parser, Subcommand, ValueEnum};

/// calsnap - snapshot upcoming Google Calendar events into a per-day JSON report
#[derive(Debug, Parser)]
#[command(name = "calsnap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "CALSNAP_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v', global = true)]
    pub debug: bool,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,

    /// Number of days to fetch, starting today
    #[arg(long, short, env = "DAYS_TO_FETCH", global = true)]
    pub days: Option<u32>,

    /// Where to write the report
    #[arg(long, short, global = true)]
    pub output: Option<PathBuf>,

    /// IANA time zone used to place events on dates (default: system zone)
    #[arg(long, env = "CALSNAP_TIMEZONE", global = true)]
    pub timezone: Option<String>,

    /// Also print the report JSON to stdout
    #[arg(long, global = true)]
    pub print: bool,

    /// Google OAuth client credentials JSON downloaded from the Cloud Console
    #[arg(long, env = "GOOGLE_CREDENTIALS_FILE", global = true)]
    pub credentials_file: Option<PathBuf>,

    /// Where the OAuth token is cached
    #[arg(long, env = "GOOGLE_TOKEN_FILE", global = true)]
    pub token_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch events and write the report (default)
    Fetch,

    /// Authorize calsnap with Google and cache the token
    Auth {
        /// Run the browser flow even if a valid token is cached
        #[arg(long, short)]
        force: bool,
    },

    /// List the calendars the account can see
    Calendars,

    /// Configuration commands
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Dump the effective configuration (secrets masked)
    Dump,

    /// Validate configuration and credentials
    Validate,

    /// Show configuration file path
    Path,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

impl From<LogFormat> for TracingOutputFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Compact => Self::Compact,
            LogFormat::Json => Self::Json,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_to_no_command() {
        let cli = Cli::try_parse_from(["calsnap", "--days", "7", "--print"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.days, Some(7));
        assert!(cli.print);
        assert_eq!(cli.log_format, LogFormat::Compact);
    }

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["calsnap", "auth", "--force", "--debug"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Auth { force: true })));
        assert!(cli.debug);

        let cli = Cli::try_parse_from(["calsnap", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config {
                action: ConfigAction::Validate
            })
        ));
    }

    #[test]
    fn fetch_options_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "calsnap", "fetch", "--days", "3", "--timezone", "UTC", "--output", "week.json", "--print",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Command::Fetch)));
        assert_eq!(cli.days, Some(3));
        assert_eq!(cli.timezone.as_deref(), Some("UTC"));
        assert_eq!(cli.output, Some(PathBuf::from("week.json")));
        assert!(cli.print);

        let cli = Cli::try_parse_from(["calsnap", "--days", "3", "fetch"]).unwrap();
        assert_eq!(cli.days, Some(3));
    }

    #[test]
    fn rejects_bad_days() {
        assert!(Cli::try_parse_from(["calsnap", "--days", "soon"]).is_err());
        assert!(Cli::try_parse_from(["calsnap", "--days", "-1"]).is_err());
    }

    #[test]
    fn json_log_format() {
        let cli = Cli::try_parse_from(["calsnap", "--log-format", "json", "calendars"]).unwrap();
        assert_eq!(
            TracingOutputFormat::from(cli.log_format),
            TracingOutputFormat::Json
        );
    }
}
