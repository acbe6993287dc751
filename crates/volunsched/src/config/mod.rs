use crate::scheduling::{QuotaPolicy, SignupReuse};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

const DEFAULT_LOCK_TIMEOUT_MS: u64 = 2_000;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub scheduling: SchedulingConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scheduling: SchedulingConfig::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Quota caps, the duplicate-signup policy, and the bounded wait on the
/// per-shift serialization scope.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedulingConfig {
    pub quota: QuotaPolicy,
    pub signup_reuse: SignupReuse,
    pub lock_timeout: Duration,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            quota: QuotaPolicy::default(),
            signup_reuse: SignupReuse::default(),
            lock_timeout: Duration::from_millis(DEFAULT_LOCK_TIMEOUT_MS),
        }
    }
}

impl SchedulingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = QuotaPolicy::default();
        let quota = QuotaPolicy {
            max_kakad_per_volunteer: read_number(
                "APP_MAX_KAKAD_PER_VOLUNTEER",
                defaults.max_kakad_per_volunteer,
            )?,
            max_total_per_volunteer: read_number(
                "APP_MAX_TOTAL_PER_VOLUNTEER",
                defaults.max_total_per_volunteer,
            )?,
            max_thursday_per_volunteer: read_number(
                "APP_MAX_THURSDAY_PER_VOLUNTEER",
                defaults.max_thursday_per_volunteer,
            )?,
        };

        let signup_reuse = match env::var("APP_SIGNUP_REUSE") {
            Ok(raw) => SignupReuse::parse(&raw).ok_or(ConfigError::InvalidSignupReuse(raw))?,
            Err(_) => SignupReuse::default(),
        };

        let lock_timeout = Duration::from_millis(read_number(
            "APP_SCHEDULE_LOCK_TIMEOUT_MS",
            DEFAULT_LOCK_TIMEOUT_MS,
        )?);

        Ok(Self {
            quota,
            signup_reuse,
            lock_timeout,
        })
    }
}

fn read_number<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { name, value: raw }),
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { name: &'static str, value: String },
    InvalidSignupReuse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { name, value } => {
                write!(f, "{name} must be a non-negative integer, got '{value}'")
            }
            ConfigError::InvalidSignupReuse(value) => write!(
                f,
                "APP_SIGNUP_REUSE must be block_any_status or reinstate_cancelled, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidNumber { .. }
            | ConfigError::InvalidSignupReuse(_) => None,
        }
    }
}
