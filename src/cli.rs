//! Command-line interface for session-ctx.
//!
//! Uses lexopt for minimal binary size overhead (~34KB).

use std::ffi::OsString;
use std::path::PathBuf;

/// Subcommand to run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Command {
    /// Print the current session state.
    #[default]
    Status,
    /// Log in against the auth API and store the session.
    Login { email: String, password: String },
    /// Clear the stored session.
    Logout,
    /// Register a new account.
    Register {
        email: String,
        password: String,
        confirm_password: String,
        accept_terms: bool,
    },
}

/// Command-line arguments.
#[derive(Debug, Clone, Default)]
pub struct Args {
    /// Path to configuration file.
    pub config: Option<PathBuf>,
    /// Storage document path (overrides config file).
    pub storage: Option<PathBuf>,
    /// Auth API base URL (overrides config file).
    pub api_url: Option<String>,
    /// Log level (error, warn, info, debug, trace).
    pub log_level: Option<String>,
    /// Show version and exit.
    pub version: bool,
    /// Show help and exit.
    pub help: bool,
    /// Subcommand.
    pub command: Command,
}

/// Parse command-line arguments.
pub fn parse_args() -> Result<Args, ArgsError> {
    parse_args_from(std::env::args_os())
}

/// Parse arguments from an iterator (for testing).
pub fn parse_args_from<I>(args: I) -> Result<Args, ArgsError>
where
    I: IntoIterator<Item = OsString>,
{
    use lexopt::prelude::*;

    let mut result = Args::default();
    let mut positional: Vec<String> = Vec::new();
    let mut accept_terms = false;
    let mut parser = lexopt::Parser::from_iter(args);

    while let Some(arg) = parser.next()? {
        match arg {
            Short('h') | Long("help") => {
                result.help = true;
            }
            Short('V') | Long("version") => {
                result.version = true;
            }
            Short('c') | Long("config") => {
                result.config = Some(parser.value()?.parse()?);
            }
            Short('s') | Long("storage") => {
                result.storage = Some(parser.value()?.parse()?);
            }
            Short('u') | Long("api-url") => {
                result.api_url = Some(parser.value()?.parse()?);
            }
            Short('l') | Long("log-level") => {
                result.log_level = Some(parser.value()?.parse()?);
            }
            Long("accept-terms") => {
                accept_terms = true;
            }
            Value(val) => {
                positional.push(
                    val.into_string()
                        .map_err(|v| ArgsError::UnexpectedArgument(v.to_string_lossy().into()))?,
                );
            }
            _ => return Err(arg.unexpected().into()),
        }
    }

    result.command = build_command(positional, accept_terms)?;
    Ok(result)
}

fn build_command(positional: Vec<String>, accept_terms: bool) -> Result<Command, ArgsError> {
    let mut words = positional.into_iter();
    let name = match words.next() {
        Some(name) => name,
        None => return Ok(Command::Status),
    };

    let mut take = |what: &'static str| words.next().ok_or(ArgsError::MissingArgument(what));

    let command = match name.as_str() {
        "status" => Command::Status,
        "logout" => Command::Logout,
        "login" => Command::Login {
            email: take("email")?,
            password: take("password")?,
        },
        "register" => Command::Register {
            email: take("email")?,
            password: take("password")?,
            confirm_password: take("confirm")?,
            accept_terms,
        },
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = words.next() {
        return Err(ArgsError::UnexpectedArgument(extra));
    }
    Ok(command)
}

/// Print help message.
pub fn print_help() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        r#"session-ctx {version}
Persistent session context for the post it! student-management app

USAGE:
    session-ctx [OPTIONS] [COMMAND]

COMMANDS:
    status                                  Show the stored session [default]
    login <EMAIL> <PASSWORD>                Log in and store the session
    logout                                  Clear the stored session
    register <EMAIL> <PASSWORD> <CONFIRM>   Register a new account (needs --accept-terms)

OPTIONS:
    -c, --config <FILE>     Path to configuration file (JSON)
    -s, --storage <PATH>    Path of the local storage document
    -u, --api-url <URL>     Auth API base URL
    -l, --log-level <LVL>   Log level (error, warn, info, debug, trace)
        --accept-terms      Accept the terms and conditions (register)
    -h, --help              Print help
    -V, --version           Print version

ENVIRONMENT VARIABLES:
    SESSION_CTX_STORAGE     Storage path (overrides config)
    SESSION_CTX_API_URL     Auth API base URL (overrides config)
    EXPO_PUBLIC_API_URL     Fallback for SESSION_CTX_API_URL
    SESSION_CTX_LOG_LEVEL   Log level (overrides config)
    RUST_LOG                Alternative log level setting

EXAMPLES:
    # Show whether a session is stored
    session-ctx status

    # Log in against a local API
    session-ctx -u http://192.168.1.20:3000 login docente@escuela.mx secret

    # Sign out
    session-ctx logout
"#
    );
}

/// Print version.
pub fn print_version() {
    println!("session-ctx {}", env!("CARGO_PKG_VERSION"));
}

/// Argument parsing errors.
#[derive(Debug)]
pub enum ArgsError {
    /// Lexopt parsing error.
    Lexopt(lexopt::Error),
    /// A command is missing a positional argument.
    MissingArgument(&'static str),
    /// Unknown command name.
    UnknownCommand(String),
    /// Unexpected positional argument.
    UnexpectedArgument(String),
}

impl std::fmt::Display for ArgsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lexopt(e) => write!(f, "{}", e),
            Self::MissingArgument(name) => write!(f, "missing argument: <{}>", name),
            Self::UnknownCommand(name) => write!(f, "unknown command: '{}'", name),
            Self::UnexpectedArgument(arg) => {
                write!(f, "unexpected argument: '{}'", arg)
            }
        }
    }
}

impl std::error::Error for ArgsError {}

impl From<lexopt::Error> for ArgsError {
    fn from(e: lexopt::Error) -> Self {
        Self::Lexopt(e)
    }
}
