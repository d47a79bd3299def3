// File: ./src/cli.rs
//! Command-line parsing, help text and logger setup for the `clicknote` binary.
use simplelog::{ColorChoice, ConfigBuilder, LevelFilter, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Login { token: String },
    Logout,
    WhoAmI,
    Teams,
    Lists { space: Option<String> },
    UseList { list_id: String },
    Create {
        text: String,
        list: Option<String>,
        note: Option<String>,
    },
    Track {
        list_id: String,
        name: Option<String>,
    },
    Sync { list_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub root: Option<PathBuf>,
    pub vault: Option<PathBuf>,
    pub verbose: bool,
    pub command: Command,
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String, String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| format!("{} needs a value", flag))
}

/// Parses everything after the binary name.
pub fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut root = None;
    let mut vault = None;
    let mut verbose = false;
    let mut help = false;
    let mut list = None;
    let mut note = None;
    let mut space = None;
    let mut positional: Vec<String> = Vec::new();

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => help = true,
            "-v" | "--verbose" => verbose = true,
            "-r" | "--root" => root = Some(PathBuf::from(take_value(args, &mut i, "--root")?)),
            "--vault" => vault = Some(PathBuf::from(take_value(args, &mut i, "--vault")?)),
            "--list" => list = Some(take_value(args, &mut i, "--list")?),
            "--note" => note = Some(take_value(args, &mut i, "--note")?),
            "--space" => space = Some(take_value(args, &mut i, "--space")?),
            "--" => {
                positional.extend(args[i + 1..].iter().cloned());
                break;
            }
            other if other.starts_with('-') && other.len() > 1 => {
                return Err(format!("unknown option '{}'", other));
            }
            other => positional.push(other.to_string()),
        }
        i += 1;
    }

    if help {
        return Ok(Invocation {
            root,
            vault,
            verbose,
            command: Command::Help,
        });
    }

    let mut rest = positional.into_iter();
    let name = rest.next();
    let command = match name.as_deref() {
        None | Some("help") => Command::Help,
        Some("login") => Command::Login {
            token: rest.next().ok_or("login needs a token")?,
        },
        Some("logout") => Command::Logout,
        Some("whoami") => Command::WhoAmI,
        Some("teams") => Command::Teams,
        Some("lists") => Command::Lists { space },
        Some("use-list") => Command::UseList {
            list_id: rest.next().ok_or("use-list needs a list id")?,
        },
        Some("create") => {
            let words: Vec<String> = rest.by_ref().collect();
            if words.is_empty() {
                return Err("create needs the task text".to_string());
            }
            Command::Create {
                text: words.join(" "),
                list,
                note,
            }
        }
        Some("track") => {
            let list_id = rest.next().ok_or("track needs a list id")?;
            let words: Vec<String> = rest.by_ref().collect();
            Command::Track {
                list_id,
                name: (!words.is_empty()).then(|| words.join(" ")),
            }
        }
        Some("sync") => Command::Sync {
            list_id: rest.next().or(list),
        },
        Some(other) => return Err(format!("unknown command '{}'", other)),
    };

    if let Some(extra) = rest.next() {
        return Err(format!("unexpected argument '{}'", extra));
    }

    Ok(Invocation {
        root,
        vault,
        verbose,
        command,
    })
}

/// Logs to stderr; `Debug` when verbose, `Info` otherwise.
pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let config = ConfigBuilder::new()
        .add_filter_allow_str("clicknote")
        .set_time_level(LevelFilter::Off)
        .build();
    let _ = TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto);
}

pub fn print_help(binary_name: &str) {
    println!(
        "Clicknote v{} - Mirror ClickUp lists into Markdown notes",
        env!("CARGO_PKG_VERSION")
    );
    println!();
    println!("USAGE:");
    println!("    {} [OPTIONS] <COMMAND>", binary_name);
    println!();
    println!("COMMANDS:");
    println!("    login <token>                      Store a personal API token and fetch user/teams");
    println!("    logout                             Forget token, user and teams");
    println!("    whoami                             Show the signed-in user");
    println!("    teams                              List your workspaces");
    println!("    lists [--space <id>]               List spaces and their lists");
    println!("    use-list <id>                      Set the default list");
    println!("    create <text> [--list <id>] [--note <path>]");
    println!("                                       Create a task and print ' [task](url)'");
    println!("    track <list-id> [name]             Create a note that mirrors a list");
    println!("    sync [list-id]                     Rewrite the list's note from ClickUp");
    println!();
    println!("OPTIONS:");
    println!("    -r, --root <path>     Use a different directory for config and data.");
    println!("    --vault <path>        Use this vault instead of the configured one.");
    println!("    -v, --verbose         Debug logging.");
    println!("    -h, --help            Show this help message.");
    println!();
    println!("NOTES:");
    println!("    A list note is any note whose path starts with the configured prefix");
    println!("    (default 'ClickUp') and contains '[<list-id>]', e.g.");
    println!("    'ClickUp Sprint 12 [900123456789].md'. Sync replaces its whole content.");
}
