use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::assessment::{NeutralResponsePolicy, ScoringConfig, ScoringProfile};

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
    pub scoring: ScoringSettings,
    pub careers: CareerSettings,
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
        let include_targets = env::var("APP_LOG_TARGETS")
            .map(|value| matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let profile = match env::var("MASARK_SCORING_PROFILE") {
            Ok(value) => value
                .parse::<ScoringProfile>()
                .map_err(|_| ConfigError::InvalidScoringProfile { value })?,
            Err(_) => ScoringProfile::Professional,
        };

        let neutral_policy = match env::var("MASARK_NEUTRAL_POLICY") {
            Ok(value) => value
                .parse::<NeutralResponsePolicy>()
                .map_err(|_| ConfigError::InvalidNeutralPolicy { value })?,
            Err(_) => NeutralResponsePolicy::Alternate,
        };

        let question_count = match env::var("MASARK_QUESTION_COUNT") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|count| *count > 0)
                .ok_or(ConfigError::InvalidQuestionCount)?,
            Err(_) => ScoringConfig::STANDARD_QUESTION_COUNT,
        };

        let cache_capacity = match env::var("MASARK_CAREER_CACHE_CAPACITY") {
            Ok(value) => value
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|capacity| *capacity > 0)
                .ok_or(ConfigError::InvalidCacheCapacity)?,
            Err(_) => 128,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_targets,
            },
            scoring: ScoringSettings {
                profile,
                neutral_policy,
                question_count,
                catalog_path: optional_path("MASARK_QUESTION_CATALOG"),
            },
            careers: CareerSettings {
                matrix_path: optional_path("MASARK_CAREER_MATRIX"),
                cache_capacity,
            },
        })
    }
}

fn optional_path(key: &str) -> Option<PathBuf> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub include_targets: bool,
}

/// Scoring defaults applied by the service and CLI.
#[derive(Debug, Clone)]
pub struct ScoringSettings {
    pub profile: ScoringProfile,
    pub neutral_policy: NeutralResponsePolicy,
    pub question_count: usize,
    pub catalog_path: Option<PathBuf>,
}

impl ScoringSettings {
    pub fn scoring_config(&self) -> ScoringConfig {
        ScoringConfig::for_profile(self.profile)
            .with_question_count(self.question_count)
            .with_neutral_policy(self.neutral_policy)
    }
}

/// Career matrix source and cache sizing.
#[derive(Debug, Clone)]
pub struct CareerSettings {
    pub matrix_path: Option<PathBuf>,
    pub cache_capacity: usize,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidScoringProfile { value: String },
    InvalidNeutralPolicy { value: String },
    InvalidQuestionCount,
    InvalidCacheCapacity,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidScoringProfile { value } => write!(
                f,
                "MASARK_SCORING_PROFILE must be 'basic' or 'professional', got '{value}'"
            ),
            ConfigError::InvalidNeutralPolicy { value } => write!(
                f,
                "MASARK_NEUTRAL_POLICY must be 'alternate', 'option_a' or 'option_b', got '{value}'"
            ),
            ConfigError::InvalidQuestionCount => {
                write!(f, "MASARK_QUESTION_COUNT must be a positive integer")
            }
            ConfigError::InvalidCacheCapacity => {
                write!(f, "MASARK_CAREER_CACHE_CAPACITY must be a positive integer")
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_LOG_TARGETS",
            "MASARK_SCORING_PROFILE",
            "MASARK_NEUTRAL_POLICY",
            "MASARK_QUESTION_COUNT",
            "MASARK_QUESTION_CATALOG",
            "MASARK_CAREER_MATRIX",
            "MASARK_CAREER_CACHE_CAPACITY",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert!(!config.telemetry.include_targets);
        assert_eq!(config.scoring.profile, ScoringProfile::Professional);
        assert_eq!(config.scoring.neutral_policy, NeutralResponsePolicy::Alternate);
        assert_eq!(config.scoring.question_count, 36);
        assert!(config.scoring.catalog_path.is_none());
        assert_eq!(config.careers.cache_capacity, 128);
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn reads_scoring_overrides() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MASARK_SCORING_PROFILE", "basic");
        env::set_var("MASARK_NEUTRAL_POLICY", "option_b");
        env::set_var("MASARK_QUESTION_COUNT", "40");
        let config = AppConfig::load().expect("config loads");
        let scoring = config.scoring.scoring_config();
        assert_eq!(scoring.profile, ScoringProfile::Basic);
        assert_eq!(scoring.neutral_policy, NeutralResponsePolicy::OptionB);
        assert_eq!(scoring.expected_question_count, 40);
        reset_env();
    }

    #[test]
    fn rejects_unknown_scoring_profile() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MASARK_SCORING_PROFILE", "expert");
        match AppConfig::load() {
            Err(ConfigError::InvalidScoringProfile { value }) => assert_eq!(value, "expert"),
            other => panic!("expected invalid profile error, got {other:?}"),
        }
        reset_env();
    }

    #[test]
    fn rejects_zero_question_count() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("MASARK_QUESTION_COUNT", "0");
        assert!(matches!(
            AppConfig::load(),
            Err(ConfigError::InvalidQuestionCount)
        ));
        reset_env();
    }
}
