//! Turns the command line into exactly one thing to do.

use std::path::PathBuf;

use clap::Parser;
use clap::error::{ContextKind, ContextValue, ErrorKind};

use crate::actions::setting::{BotUpdate, SettingPlan, SettingUpdate};
use crate::cli::{Cli, Command, SUBCOMMANDS, SettingArgs, normalize_args};

/// What this process invocation does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// Print the version.
    Version,
    /// Run the panel under the supervisor.
    Serve,
    /// Run the `setting` action.
    Setting(SettingPlan),
    /// Import inbounds from a v2-ui database.
    MigrateLegacy { db: PathBuf },
    /// Refresh the geo data bundles.
    GeoUpdate,
    /// Print the usage of every subcommand.
    Usage,
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub config: Option<PathBuf>,
    pub debug: bool,
    pub invocation: Invocation,
}

impl From<Cli> for Dispatch {
    fn from(cli: Cli) -> Self {
        let invocation = if cli.version {
            Invocation::Version
        } else {
            match cli.command {
                None | Some(Command::Run) => Invocation::Serve,
                Some(Command::V2ui { db }) => Invocation::MigrateLegacy { db },
                Some(Command::Setting(args)) => Invocation::Setting(args.into()),
                Some(Command::Geoip) => Invocation::GeoUpdate,
                Some(Command::Unknown(_)) => Invocation::Usage,
            }
        };

        Self {
            config: cli.config,
            debug: cli.debug,
            invocation,
        }
    }
}

impl From<SettingArgs> for SettingPlan {
    fn from(args: SettingArgs) -> Self {
        Self {
            reset: args.reset,
            fields: SettingUpdate {
                port: args
                    .port
                    .and_then(|port| u16::try_from(port).ok())
                    .filter(|port| *port != 0),
                username: present(args.username),
                password: present(args.password),
                listen: present(args.listen),
                path: present(args.path),
            },
            show: args.show,
            bot: BotUpdate {
                token: present(args.bot_token),
                schedule: present(args.bot_schedule),
                chat_id: args.bot_chat_id.filter(|id| *id != 0),
                enabled: args.enable_bot,
            },
        }
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// Parses the full argument list, program name included.
///
/// An unknown flag before any subcommand yields [`Invocation::Usage`]. Other
/// parse failures, help requests included, come back as the clap error.
pub fn parse<I, T>(args: I) -> Result<Dispatch, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let args = normalize_args(args);
    match Cli::try_parse_from(&args) {
        Ok(cli) => Ok(cli.into()),
        Err(err) if is_top_level_unknown(&args, &err) => Ok(Dispatch {
            config: None,
            debug: false,
            invocation: Invocation::Usage,
        }),
        Err(err) => Err(err),
    }
}

fn is_top_level_unknown(args: &[String], err: &clap::Error) -> bool {
    if err.kind() != ErrorKind::UnknownArgument {
        return false;
    }
    let Some(ContextValue::String(bad)) = err.get(ContextKind::InvalidArg) else {
        return false;
    };

    let rest = args.get(1..).unwrap_or_default();
    let subcommand = rest.iter().position(|a| SUBCOMMANDS.contains(&a.as_str()));
    let flag = rest.iter().position(|a| is_reported_flag(a, bad));

    match (flag, subcommand) {
        (Some(flag), Some(subcommand)) => flag < subcommand,
        (Some(_), None) => true,
        (None, _) => false,
    }
}

/// Whether `arg` is the token clap reported as `bad`.
///
/// Long flags are reported whole, without any `=value`. Short clusters are
/// reported by their first letter.
fn is_reported_flag(arg: &str, bad: &str) -> bool {
    if bad.starts_with("--") {
        arg.split_once('=').map_or(arg, |(flag, _)| flag) == bad
    } else {
        !arg.starts_with("--") && arg.starts_with(bad)
    }
}
