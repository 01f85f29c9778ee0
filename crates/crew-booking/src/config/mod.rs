use chrono::{FixedOffset, NaiveTime, Offset, Utc, Weekday};
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

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
    pub seed_enabled: bool,
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

        let seed_enabled = match env::var("APP_SEED_ENABLED") {
            Ok(raw) => parse_flag("APP_SEED_ENABLED", &raw)?,
            Err(_) => true,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            scheduling: SchedulingConfig::from_env()?,
            seed_enabled,
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

/// Working window of a single day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkingHours {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

/// Immutable scheduling rules handed to every engine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulingConfig {
    pub timezone: FixedOffset,
    pub working_hours: WorkingHours,
    pub break_minutes: u32,
    pub non_working_day: Weekday,
    pub max_cleaners_per_vehicle: u32,
}

impl SchedulingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let timezone = match env::var("APP_TIMEZONE") {
            Ok(raw) => parse_timezone(&raw)?,
            Err(_) => defaults.timezone,
        };
        let start = match env::var("APP_WORKING_HOURS_START") {
            Ok(raw) => parse_clock_time("APP_WORKING_HOURS_START", &raw)?,
            Err(_) => defaults.working_hours.start,
        };
        let end = match env::var("APP_WORKING_HOURS_END") {
            Ok(raw) => parse_clock_time("APP_WORKING_HOURS_END", &raw)?,
            Err(_) => defaults.working_hours.end,
        };
        let break_minutes = match env::var("APP_BREAK_MINUTES") {
            Ok(raw) => raw
                .trim()
                .parse::<u32>()
                .map_err(|_| ConfigError::invalid("APP_BREAK_MINUTES", &raw))?,
            Err(_) => defaults.break_minutes,
        };
        let non_working_day = match env::var("APP_NON_WORKING_DAY") {
            Ok(raw) => raw
                .trim()
                .parse::<Weekday>()
                .map_err(|_| ConfigError::invalid("APP_NON_WORKING_DAY", &raw))?,
            Err(_) => defaults.non_working_day,
        };
        let max_cleaners_per_vehicle = match env::var("APP_MAX_CLEANERS_PER_VEHICLE") {
            Ok(raw) => match raw.trim().parse::<u32>() {
                Ok(value) if value > 0 => value,
                _ => return Err(ConfigError::invalid("APP_MAX_CLEANERS_PER_VEHICLE", &raw)),
            },
            Err(_) => defaults.max_cleaners_per_vehicle,
        };

        if start >= end {
            return Err(ConfigError::InvalidWorkingHours { start, end });
        }

        Ok(Self {
            timezone,
            working_hours: WorkingHours { start, end },
            break_minutes,
            non_working_day,
            max_cleaners_per_vehicle,
        })
    }

    pub fn is_working_day(&self, day: Weekday) -> bool {
        day != self.non_working_day
    }
}

/// UTC+05:30
const DEFAULT_OFFSET_SECONDS: i32 = 5 * 3600 + 30 * 60;

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            timezone: FixedOffset::east_opt(DEFAULT_OFFSET_SECONDS).unwrap_or_else(|| Utc.fix()),
            working_hours: WorkingHours {
                start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or_default(),
                end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or_default(),
            },
            break_minutes: 30,
            non_working_day: Weekday::Fri,
            max_cleaners_per_vehicle: 5,
        }
    }
}

fn parse_timezone(raw: &str) -> Result<FixedOffset, ConfigError> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return Ok(Utc.fix());
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|_| ConfigError::invalid("APP_TIMEZONE", raw))
}

pub(crate) fn parse_clock_time(variable: &'static str, raw: &str) -> Result<NaiveTime, ConfigError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|_| ConfigError::invalid(variable, raw))
}

fn parse_flag(variable: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid(variable, raw)),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { variable: &'static str, value: String },
    InvalidWorkingHours { start: NaiveTime, end: NaiveTime },
}

impl ConfigError {
    fn invalid(variable: &'static str, value: &str) -> Self {
        Self::InvalidValue {
            variable,
            value: value.to_string(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { variable, value } => {
                write!(f, "{variable} has an invalid value '{value}'")
            }
            ConfigError::InvalidWorkingHours { start, end } => write!(
                f,
                "working hours start {start} must be before working hours end {end}"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            _ => None,
        }
    }
}
