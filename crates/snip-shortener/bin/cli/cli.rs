use clap::{Parser, Subcommand, ValueEnum};
use snip_accounts::GatePolicy;
use snip_generator::random::DEFAULT_LENGTH;
use snip_shortener::DEFAULT_MAX_ATTEMPTS;
use snip_telemetry::LogFormat;
use std::fmt::{Display, Formatter};

pub const STORAGE_BACKEND_ENV: &str = "SNIP_STORAGE_BACKEND";
pub const MYSQL_DSN_ENV: &str = "SNIP_MYSQL_DSN";
pub const CODE_LENGTH_ENV: &str = "SNIP_CODE_LENGTH";
pub const MAX_ATTEMPTS_ENV: &str = "SNIP_MAX_ATTEMPTS";
pub const GATE_POLICY_ENV: &str = "SNIP_GATE_POLICY";
pub const PUBLIC_BASE_URL_ENV: &str = "SNIP_PUBLIC_BASE_URL";
pub const LOG_FORMAT_ENV: &str = "SNIP_LOG_FORMAT";
pub const USERNAME_ENV: &str = "SNIP_USERNAME";
pub const PASSWORD_ENV: &str = "SNIP_PASSWORD";

pub const DEFAULT_PUBLIC_BASE_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StorageBackendArg {
    #[value(name = "in-memory")]
    InMemory,
    #[value(name = "mysql")]
    Mysql,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::InMemory => write!(f, "in-memory"),
            StorageBackendArg::Mysql => write!(f, "mysql"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum GatePolicyArg {
    #[value(name = "open")]
    Open,
    #[value(name = "login-required")]
    LoginRequired,
}

impl From<GatePolicyArg> for GatePolicy {
    fn from(value: GatePolicyArg) -> Self {
        match value {
            GatePolicyArg::Open => GatePolicy::Open,
            GatePolicyArg::LoginRequired => GatePolicy::LoginRequired,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    #[value(name = "pretty")]
    Pretty,
    #[value(name = "json")]
    Json,
}

impl From<LogFormatArg> for LogFormat {
    fn from(value: LogFormatArg) -> Self {
        match value {
            LogFormatArg::Pretty => LogFormat::Pretty,
            LogFormatArg::Json => LogFormat::Json,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "snip", about = "Allocate and resolve short links")]
pub struct CLI {
    #[arg(
        long,
        env = STORAGE_BACKEND_ENV,
        value_enum,
        default_value_t = StorageBackendArg::InMemory
    )]
    pub storage: StorageBackendArg,

    #[arg(long, env = MYSQL_DSN_ENV, required_if_eq("storage", "mysql"))]
    pub mysql_dsn: Option<String>,

    #[arg(long, env = CODE_LENGTH_ENV, default_value_t = DEFAULT_LENGTH)]
    pub code_length: usize,

    #[arg(long, env = MAX_ATTEMPTS_ENV, default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub max_attempts: u32,

    #[arg(
        long,
        env = GATE_POLICY_ENV,
        value_enum,
        default_value_t = GatePolicyArg::Open
    )]
    pub gate_policy: GatePolicyArg,

    #[arg(long, env = PUBLIC_BASE_URL_ENV, default_value = DEFAULT_PUBLIC_BASE_URL)]
    pub public_base_url: String,

    #[arg(
        long,
        env = LOG_FORMAT_ENV,
        value_enum,
        default_value_t = LogFormatArg::Pretty
    )]
    pub log_format: LogFormatArg,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account that can own links.
    Register {
        username: String,
        #[arg(env = PASSWORD_ENV)]
        password: String,
    },
    /// Store a mapping for URL under a fresh short code.
    Shorten {
        url: String,
        #[arg(long, env = USERNAME_ENV, requires = "password")]
        username: Option<String>,
        #[arg(long, env = PASSWORD_ENV, requires = "username")]
        password: Option<String>,
    },
    /// Print the target URL of a short code.
    Resolve { code: String },
}
