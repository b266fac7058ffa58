use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use crate::workflows::swipe::{GestureThresholds, RecorderConfig, RefinerConfig, SwipeSettings};

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
    pub swipe: SwipeConfig,
    pub refiner: RefinerSettings,
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
        let log_format = LogFormat::from_str(
            &env::var("APP_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string()),
        );

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                log_format,
            },
            swipe: SwipeConfig::from_env()?,
            refiner: RefinerSettings::from_env()?,
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

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub log_format: LogFormat,
}

/// Gesture thresholds and application persistence policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwipeConfig {
    pub distance_threshold: f32,
    pub velocity_threshold: f32,
    pub recorder_max_attempts: u32,
    pub recorder_backoff: Duration,
}

impl SwipeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let distance_threshold = read_positive(
            "SWIPE_DISTANCE_THRESHOLD",
            GestureThresholds::DEFAULT_DISTANCE,
        )?;
        let velocity_threshold = read_positive(
            "SWIPE_VELOCITY_THRESHOLD",
            GestureThresholds::DEFAULT_VELOCITY,
        )?;
        let recorder_max_attempts = read_attempts("RECORDER_MAX_ATTEMPTS", 3)?;
        let recorder_backoff = Duration::from_millis(read_parsed("RECORDER_BACKOFF_MS", 200u64)?);

        Ok(Self {
            distance_threshold,
            velocity_threshold,
            recorder_max_attempts,
            recorder_backoff,
        })
    }

    pub fn settings(&self) -> SwipeSettings {
        SwipeSettings {
            thresholds: GestureThresholds {
                distance: self.distance_threshold,
                velocity: self.velocity_threshold,
            },
            recorder: RecorderConfig {
                max_attempts: self.recorder_max_attempts,
                initial_backoff: self.recorder_backoff,
            },
        }
    }
}

/// Completion backend used to refine match scores. Refinement is off without an endpoint.
#[derive(Debug, Clone)]
pub struct RefinerSettings {
    pub endpoint: Option<String>,
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RefinerSettings {
    fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::var("REFINER_ENDPOINT")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty());
        let api_key = env::var("REFINER_API_KEY").unwrap_or_default();
        let model = env::var("REFINER_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let timeout = Duration::from_secs(read_parsed("REFINER_TIMEOUT_SECS", 30u64)?);
        let max_attempts = read_attempts("REFINER_MAX_ATTEMPTS", 2)?;
        let backoff = Duration::from_millis(read_parsed("REFINER_BACKOFF_MS", 500u64)?);

        Ok(Self {
            endpoint,
            api_key,
            model,
            timeout,
            max_attempts,
            backoff,
        })
    }

    pub fn enabled(&self) -> bool {
        self.endpoint.is_some()
    }

    pub fn refiner_config(&self) -> RefinerConfig {
        RefinerConfig {
            timeout: self.timeout,
            max_attempts: self.max_attempts,
            retry_backoff: self.backoff,
        }
    }
}

fn read_parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
        _ => Ok(default),
    }
}

fn read_positive(key: &'static str, default: f32) -> Result<f32, ConfigError> {
    let value = read_parsed(key, default)?;
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}

fn read_attempts(key: &'static str, default: u32) -> Result<u32, ConfigError> {
    let value = read_parsed(key, default)?;
    if value >= 1 {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        })
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidValue { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "{key} has an invalid value '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidValue { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
