use burrow_shortener::service::{DEFAULT_BASE_URL, DEFAULT_MAX_ATTEMPTS};
use burrow_telemetry::LogFormat;
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "BURROW_STORAGE_BACKEND";
pub const POSTGRES_DSN_ENV: &str = "BURROW_POSTGRES_DSN";
pub const BASE_URL_ENV: &str = "BURROW_BASE_URL";
pub const MAX_ATTEMPTS_ENV: &str = "BURROW_MAX_ATTEMPTS";
pub const LOG_FORMAT_ENV: &str = "BURROW_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "postgres")]
    Postgres,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Postgres => write!(f, "postgres"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Text,
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Text => LogFormat::Text,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "burrow", about = "Shorten and resolve URLs")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = POSTGRES_DSN_ENV, required_if_eq("storage", "postgres"))]
    pub postgres_dsn: Option<String>,

    #[arg(long, env = BASE_URL_ENV, default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    #[arg(
        long,
        env = MAX_ATTEMPTS_ENV,
        default_value_t = DEFAULT_MAX_ATTEMPTS,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_attempts: u32,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum, default_value_t = LogFormatArg::Text)]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create (or reuse) short links and print `long -> short` per URL.
    Shorten {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Print the long URL behind a short code.
    Resolve { code: String },
    /// Print the short link already issued for a long URL.
    LookupLong { url: String },
}
