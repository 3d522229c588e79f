//! Command-line surface shared by the probe binaries.

use crate::credentials::{CredentialError, Credentials};
use crate::probe::ProbeSettings;
use clap::error::ErrorKind;
use clap::{Args, Command, CommandFactory, FromArgMatches, Parser};
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

const BIN_NAME: &str = "sasl-probe";

const EXAMPLE: &str = "Example:
  sasl-probe --broker pkc-abc.us-east-1.aws.confluent.cloud:9092 --username myuser --password mypass";

// Flags recognised regardless of case.
const CASE_INSENSITIVE_FLAGS: &[&str] = &[
    "--broker",
    "-b",
    "--username",
    "-u",
    "--password",
    "-p",
    "--help",
    "-h",
];

const VALUE_FLAGS: &[&str] = &["--broker", "-b", "--username", "-u", "--password", "-p"];

/// Options that do not carry credentials.
#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct ProbeOptions {
    /// File with additional client properties, one key=value per line
    #[arg(long, env = "SASL_PROBE_PROPERTIES_FILE")]
    pub properties_file: Option<PathBuf>,

    /// Timeout for the metadata request in milliseconds
    #[arg(long, env = "SASL_PROBE_METADATA_TIMEOUT_MS", default_value = "10000")]
    pub metadata_timeout_ms: u64,

    /// Timeout for the final producer flush in milliseconds
    #[arg(long, env = "SASL_PROBE_FLUSH_TIMEOUT_MS", default_value = "5000")]
    pub flush_timeout_ms: u64,

    #[arg(long, env = "SASL_PROBE_LOG_LEVEL", default_value = "warn")]
    pub log_level: String,
}

impl ProbeOptions {
    pub fn settings(&self) -> ProbeSettings {
        ProbeSettings {
            metadata_timeout: Duration::from_millis(self.metadata_timeout_ms),
            flush_timeout: Duration::from_millis(self.flush_timeout_ms),
            properties_file: self.properties_file.clone(),
        }
    }
}

/// Arguments of the flag-driven probe.
#[derive(Parser, Debug)]
#[command(
    name = BIN_NAME,
    version,
    about = "Checks SASL/SSL connectivity to a Kafka cluster",
    override_usage = "sasl-probe --broker <url> --username <user> --password <pass>",
    after_help = EXAMPLE
)]
pub struct FlagArgs {
    /// Kafka bootstrap servers (e.g., broker.example.com:9092)
    #[arg(
        short = 'b',
        long,
        value_name = "url",
        env = "SASL_PROBE_BROKER",
        allow_hyphen_values = true,
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub broker: Option<String>,

    /// SASL username
    #[arg(
        short = 'u',
        long,
        value_name = "user",
        env = "SASL_PROBE_USERNAME",
        allow_hyphen_values = true,
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub username: Option<String>,

    /// SASL password
    #[arg(
        short = 'p',
        long,
        value_name = "pass",
        env = "SASL_PROBE_PASSWORD",
        hide_env_values = true,
        allow_hyphen_values = true,
        num_args = 0..=1,
        default_missing_value = ""
    )]
    pub password: Option<String>,

    #[command(flatten)]
    pub options: ProbeOptions,
}

/// Arguments of the interactive probe.
#[derive(Parser, Debug)]
#[command(
    name = "sasl-probe-prompt",
    version,
    about = "Checks SASL/SSL connectivity to a Kafka cluster, asking for credentials"
)]
pub struct PromptArgs {
    #[command(flatten)]
    pub options: ProbeOptions,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    /// Help or version text; nothing else should happen.
    Help(String),
    Probe {
        credentials: Credentials,
        options: ProbeOptions,
    },
}

#[derive(Debug)]
pub enum ArgsError {
    Credential(CredentialError),
    Invalid(clap::Error),
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Credential(err) => write!(f, "{err}"),
            Self::Invalid(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ArgsError {}

/// Parses the probe arguments, excluding the program name.
///
/// No arguments at all, or `--help`/`-h` anywhere in the list, yields the
/// usage text. A credential flag given more than once keeps its first value.
pub fn parse_args<I, T>(args: I) -> Result<Invocation, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    parse_with(FlagArgs::command(), args)
}

fn parse_with<I, T>(mut command: Command, args: I) -> Result<Invocation, ArgsError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.is_empty() || args.iter().any(|arg| is_help_flag(arg)) {
        return Ok(Invocation::Help(command.render_help().to_string()));
    }

    let argv = std::iter::once(OsString::from(BIN_NAME)).chain(normalize_flags(args));
    let parsed = match command
        .try_get_matches_from(argv)
        .and_then(|matches| FlagArgs::from_arg_matches(&matches))
    {
        Ok(parsed) => parsed,
        Err(err) => {
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    Ok(Invocation::Help(err.to_string()))
                }
                _ => Err(ArgsError::Invalid(err)),
            };
        }
    };

    let credentials = Credentials::from_flags(parsed.broker, parsed.username, parsed.password)
        .map_err(ArgsError::Credential)?;

    Ok(Invocation::Probe {
        credentials,
        options: parsed.options,
    })
}

fn is_help_flag(arg: &OsStr) -> bool {
    arg.to_str()
        .is_some_and(|text| matches!(text.to_ascii_lowercase().as_str(), "--help" | "-h"))
}

// Long name shared by both spellings of a credential flag.
fn credential_flag(flag: &str) -> Option<&'static str> {
    match flag {
        "--broker" | "-b" => Some("--broker"),
        "--username" | "-u" => Some("--username"),
        "--password" | "-p" => Some("--password"),
        _ => None,
    }
}

/// Lowercases recognised flag names (`--BROKER`, `-B`, `--Password=x`), leaving
/// the values that follow them untouched. Repeats of a credential flag are
/// dropped together with their value.
fn normalize_flags(args: Vec<OsString>) -> Vec<OsString> {
    let mut normalized = Vec::with_capacity(args.len());
    let mut seen: Vec<&'static str> = Vec::new();
    let mut value_expected = false;
    let mut skip_value = false;

    for arg in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        if value_expected {
            value_expected = false;
            normalized.push(arg);
            continue;
        }

        let Some(text) = arg.to_str() else {
            normalized.push(arg);
            continue;
        };

        let (name, inline_value) = match text.split_once('=') {
            Some((name, value)) if name.starts_with("--") => (name, Some(value)),
            _ => (text, None),
        };

        let lowered = name.to_ascii_lowercase();
        if !CASE_INSENSITIVE_FLAGS.contains(&lowered.as_str()) {
            normalized.push(arg);
            continue;
        }

        if let Some(flag) = credential_flag(&lowered) {
            if seen.contains(&flag) {
                skip_value = inline_value.is_none();
                continue;
            }
            seen.push(flag);
        }

        value_expected = inline_value.is_none() && VALUE_FLAGS.contains(&lowered.as_str());
        normalized.push(match inline_value {
            Some(value) => OsString::from(format!("{lowered}={value}")),
            None => OsString::from(lowered),
        });
    }

    normalized
}
