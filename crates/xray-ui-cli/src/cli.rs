//! Command-line interface definition.
//!
//! Flags are declared in their double-dash form. [`normalize_args`] rewrites
//! the single-dash long form (`-port 8443`, `-show`) that existing install
//! scripts use, so both spellings reach clap the same way.

use std::collections::HashMap;
use std::path::PathBuf;

use clap::{Args, CommandFactory, Parser, Subcommand};

/// Default location of the v2-ui database.
pub const DEFAULT_V2UI_DB: &str = "/etc/v2-ui/v2-ui.db";

/// Names of the subcommands, in usage order.
pub const SUBCOMMANDS: [&str; 4] = ["run", "v2-ui", "setting", "geoip"];

/// xray-ui - proxy management panel
#[derive(Debug, Parser)]
#[command(name = "xray-ui")]
#[command(about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Show version
    #[arg(long, short = 'v')]
    pub version: bool,

    /// Path to configuration file
    #[arg(long, short, env = "XRAY_UI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the web panel
    Run,

    /// Migrate inbounds from v2-ui
    #[command(name = "v2-ui")]
    V2ui {
        /// Path of the v2-ui database file
        #[arg(long, default_value = DEFAULT_V2UI_DB)]
        db: PathBuf,
    },

    /// Change or show panel settings
    Setting(SettingArgs),

    /// Download geoip and geosite data
    Geoip,

    /// Anything else prints the usage.
    #[command(external_subcommand)]
    Unknown(Vec<String>),
}

/// Flags of the `setting` subcommand.
///
/// Empty strings count as not given.
#[derive(Debug, Clone, Default, Args)]
pub struct SettingArgs {
    /// Reset all settings to their defaults
    #[arg(long)]
    pub reset: bool,

    /// Show current settings
    #[arg(long)]
    pub show: bool,

    /// Set panel port (0 leaves it unchanged)
    #[arg(
        long,
        allow_negative_numbers = true,
        value_parser = clap::value_parser!(i64).range(..=65535)
    )]
    pub port: Option<i64>,

    /// Set panel listen address
    #[arg(long, allow_hyphen_values = true)]
    pub listen: Option<String>,

    /// Set panel base path
    #[arg(long, allow_hyphen_values = true)]
    pub path: Option<String>,

    /// Set login username
    #[arg(long, allow_hyphen_values = true)]
    pub username: Option<String>,

    /// Set login password
    #[arg(long, allow_hyphen_values = true)]
    pub password: Option<String>,

    /// Set Telegram bot token
    #[arg(long, alias = "tgbottoken", allow_hyphen_values = true)]
    pub bot_token: Option<String>,

    /// Set Telegram bot chat id
    #[arg(long, alias = "tgbotchatid", allow_negative_numbers = true)]
    pub bot_chat_id: Option<i64>,

    /// Set Telegram bot report schedule (cron syntax)
    #[arg(long, alias = "tgbotRuntime", allow_hyphen_values = true)]
    pub bot_schedule: Option<String>,

    /// Enable or disable Telegram bot notifications
    #[arg(
        long,
        alias = "enabletgbot",
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub enable_bot: Option<bool>,
}

/// Rewrites single-dash long flags into their double-dash form.
///
/// `-port 8443` becomes `--port 8443` and `-tgbotchatid=5` becomes
/// `--tgbotchatid=5`. Only names that some command actually declares are
/// touched. Short flags, everything after `--`, and the value following a
/// flag that takes one pass through unchanged, so `-password -show` sets the
/// password to `-show`.
pub fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let known = long_names();
    let mut passthrough = false;
    let mut value_next = false;

    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if passthrough || std::mem::take(&mut value_next) {
                return arg;
            }
            if arg == "--" {
                passthrough = true;
                return arg;
            }

            let Some(rest) = arg.strip_prefix('-') else {
                return arg;
            };
            let (single_dash, body) = match rest.strip_prefix('-') {
                Some(body) => (false, body),
                None => (true, rest),
            };
            if single_dash && body.len() < 2 {
                return arg;
            }

            let (name, inline_value) = match body.split_once('=') {
                Some((name, _)) => (name, true),
                None => (body, false),
            };
            match known.get(name) {
                Some(takes_value) => {
                    value_next = *takes_value && !inline_value;
                    if single_dash {
                        format!("-{arg}")
                    } else {
                        arg
                    }
                }
                None => arg,
            }
        })
        .collect()
}

/// Every long flag name and alias across the command tree, mapped to
/// whether the flag consumes the following argument as its value.
fn long_names() -> HashMap<String, bool> {
    let mut cmd = Cli::command();
    cmd.build();

    let mut names = HashMap::new();
    for command in std::iter::once(&cmd).chain(cmd.get_subcommands()) {
        for arg in command.get_arguments() {
            let takes_value =
                arg.get_action().takes_values() && arg.get_num_args().is_none_or(|range| range.min_values() > 0);
            if let Some(long) = arg.get_long() {
                names.insert(long.to_string(), takes_value);
            }
            if let Some(aliases) = arg.get_all_aliases() {
                names.extend(
                    aliases
                        .into_iter()
                        .map(|alias| (alias.to_string(), takes_value)),
                );
            }
        }
    }
    names
}

/// Usage block listing every subcommand and its flags.
pub fn usage_text() -> String {
    let mut cmd = Cli::command();
    cmd.build();

    let mut out = format!(
        "except '{}' or '{}' or '{}' or '{}' subcommands\n",
        SUBCOMMANDS[0], SUBCOMMANDS[1], SUBCOMMANDS[2], SUBCOMMANDS[3]
    );
    for name in SUBCOMMANDS {
        if let Some(sub) = cmd.find_subcommand_mut(name) {
            out.push('\n');
            out.push_str(&sub.render_help().to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(normalize_args(args.iter().copied())).unwrap()
    }

    fn setting(args: &[&str]) -> SettingArgs {
        match parse(args).command {
            Some(Command::Setting(args)) => args,
            other => panic!("expected setting, got {other:?}"),
        }
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn single_dash_long_flags() {
        let normalized = normalize_args(["xray-ui", "setting", "-port", "8443", "-show"]);
        assert_eq!(
            normalized,
            vec!["xray-ui", "setting", "--port", "8443", "--show"]
        );
    }

    #[test]
    fn single_dash_with_equals() {
        let normalized = normalize_args(["xray-ui", "setting", "-tgbotchatid=-100"]);
        assert_eq!(normalized[2], "--tgbotchatid=-100");
    }

    #[test]
    fn short_flags_and_values_untouched() {
        let normalized = normalize_args(["xray-ui", "-v", "setting", "-path", "-unknown"]);
        assert_eq!(normalized, vec!["xray-ui", "-v", "setting", "--path", "-unknown"]);
    }

    #[test]
    fn nothing_after_double_dash() {
        let normalized = normalize_args(["xray-ui", "--", "-port"]);
        assert_eq!(normalized[2], "-port");
    }

    #[test]
    fn no_subcommand() {
        let cli = parse(&["xray-ui"]);
        assert!(cli.command.is_none());
        assert!(!cli.version);
    }

    #[test]
    fn version_flag() {
        assert!(parse(&["xray-ui", "-v"]).version);
        assert!(parse(&["xray-ui", "--version", "setting"]).version);
    }

    #[test]
    fn v2ui_default_db() {
        match parse(&["xray-ui", "v2-ui"]).command {
            Some(Command::V2ui { db }) => assert_eq!(db, PathBuf::from(DEFAULT_V2UI_DB)),
            other => panic!("unexpected {other:?}"),
        }
        match parse(&["xray-ui", "v2-ui", "-db", "/tmp/x.db"]).command {
            Some(Command::V2ui { db }) => assert_eq!(db, PathBuf::from("/tmp/x.db")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn setting_flags() {
        let args = setting(&[
            "xray-ui",
            "setting",
            "-port",
            "8443",
            "-username",
            "admin",
            "--listen",
            "127.0.0.1",
        ]);
        assert_eq!(args.port, Some(8443));
        assert_eq!(args.username.as_deref(), Some("admin"));
        assert_eq!(args.listen.as_deref(), Some("127.0.0.1"));
        assert!(args.password.is_none());
        assert!(!args.reset);
        assert!(!args.show);
    }

    #[test]
    fn legacy_bot_aliases() {
        let args = setting(&[
            "xray-ui",
            "setting",
            "-tgbottoken",
            "123:abc",
            "-tgbotchatid",
            "-1001",
            "-tgbotRuntime",
            "@hourly",
            "-enabletgbot",
        ]);
        assert_eq!(args.bot_token.as_deref(), Some("123:abc"));
        assert_eq!(args.bot_chat_id, Some(-1001));
        assert_eq!(args.bot_schedule.as_deref(), Some("@hourly"));
        assert_eq!(args.enable_bot, Some(true));
    }

    #[test]
    fn enable_bot_takes_optional_value() {
        assert_eq!(setting(&["xray-ui", "setting"]).enable_bot, None);
        assert_eq!(
            setting(&["xray-ui", "setting", "--enable-bot=false"]).enable_bot,
            Some(false)
        );
        assert_eq!(
            setting(&["xray-ui", "setting", "--enable-bot", "--show"]).enable_bot,
            Some(true)
        );
    }

    #[test]
    fn port_above_range_rejected() {
        let result = Cli::try_parse_from(["xray-ui", "setting", "--port", "65536"]);
        assert!(result.is_err());
    }

    #[test]
    fn zero_and_negative_ports_parse() {
        assert_eq!(setting(&["xray-ui", "setting", "-port", "0"]).port, Some(0));
        assert_eq!(setting(&["xray-ui", "setting", "-port", "-1"]).port, Some(-1));
    }

    #[test]
    fn values_starting_with_dash() {
        let args = setting(&[
            "xray-ui",
            "setting",
            "-password",
            "-s3cret",
            "-username",
            "-show",
            "-tgbottoken",
            "--token",
        ]);
        assert_eq!(args.password.as_deref(), Some("-s3cret"));
        assert_eq!(args.username.as_deref(), Some("-show"));
        assert_eq!(args.bot_token.as_deref(), Some("--token"));
        assert!(!args.show);
    }

    #[test]
    fn flag_value_is_not_rewritten() {
        let normalized = normalize_args(["xray-ui", "setting", "-password", "-show", "-show"]);
        assert_eq!(
            normalized,
            vec!["xray-ui", "setting", "--password", "-show", "--show"]
        );
    }

    #[test]
    fn inline_value_does_not_consume_next() {
        let normalized = normalize_args(["xray-ui", "setting", "-port=8443", "-show"]);
        assert_eq!(normalized, vec!["xray-ui", "setting", "--port=8443", "--show"]);
    }

    #[test]
    fn unknown_subcommand_is_captured() {
        match parse(&["xray-ui", "frobnicate", "now"]).command {
            Some(Command::Unknown(args)) => assert_eq!(args, vec!["frobnicate", "now"]),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn usage_lists_every_subcommand() {
        let usage = usage_text();
        for name in SUBCOMMANDS {
            assert!(usage.contains(name), "usage is missing {name}");
        }
        assert!(usage.contains("--port"));
        assert!(usage.contains("--db"));
    }
}
