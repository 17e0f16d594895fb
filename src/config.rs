//! Configuration types.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// Weight added on an "advance weight" suggestion.
pub const DEFAULT_WEIGHT_INCREMENT: f64 = 5.0;
/// Reps added to a single-number target on an "advance reps" suggestion.
pub const DEFAULT_REP_INCREMENT: u32 = 1;
/// RPE at or above which weight is never advanced.
pub const DEFAULT_RPE_CEILING: f64 = 9.0;
/// Suggested weights are rounded to this increment.
pub const WEIGHT_ROUNDING_STEP: f64 = 2.5;
/// Unit suffix on formatted weights.
pub const WEIGHT_UNIT: &str = "lbs";

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the API listens on.
    pub bind_addr: SocketAddr,
    /// libSQL database file.
    pub db_path: PathBuf,
    /// Directory for rolling log files. Logs go to stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: PathBuf::from("./data/adaptive-coach.db"),
            log_dir: None,
        }
    }
}

impl ServerConfig {
    /// Load from `COACH_*` environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let bind_addr = match std::env::var("COACH_BIND_ADDR") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "COACH_BIND_ADDR".to_string(),
                message: format!("{e}"),
            })?,
            Err(_) => defaults.bind_addr,
        };

        let db_path = std::env::var("COACH_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let log_dir = std::env::var("COACH_LOG_DIR").ok().map(PathBuf::from);

        Ok(Self {
            bind_addr,
            db_path,
            log_dir,
        })
    }
}

/// Onboarding conversation configuration.
#[derive(Debug, Clone)]
pub struct OnboardingConfig {
    /// Max tokens for each onboarding reply.
    pub max_tokens: u32,
    /// Sampling temperature for onboarding replies.
    pub temperature: f32,
}

impl Default for OnboardingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 1024,
            temperature: 0.7,
        }
    }
}

impl OnboardingConfig {
    /// Load overrides from `COACH_ONBOARDING_MAX_TOKENS` and
    /// `COACH_ONBOARDING_TEMPERATURE`.
    pub fn from_env() -> Self {
        Self::from_vars(env_var)
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_tokens: parsed(&lookup, "COACH_ONBOARDING_MAX_TOKENS")
                .unwrap_or(defaults.max_tokens),
            temperature: parsed(&lookup, "COACH_ONBOARDING_TEMPERATURE")
                .unwrap_or(defaults.temperature),
        }
    }
}

/// Plan synthesis configuration.
#[derive(Debug, Clone)]
pub struct PlanConfig {
    /// Max tokens for the plan reply. Plans are long.
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for PlanConfig {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.3,
        }
    }
}

impl PlanConfig {
    /// Load overrides from `COACH_PLAN_MAX_TOKENS` and `COACH_PLAN_TEMPERATURE`.
    pub fn from_env() -> Self {
        Self::from_vars(env_var)
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            max_tokens: parsed(&lookup, "COACH_PLAN_MAX_TOKENS").unwrap_or(defaults.max_tokens),
            temperature: parsed(&lookup, "COACH_PLAN_TEMPERATURE")
                .unwrap_or(defaults.temperature),
        }
    }
}

/// Progressive-overload constants.
#[derive(Debug, Clone)]
pub struct ProgressionConfig {
    pub weight_increment: f64,
    pub rep_increment: u32,
    pub rpe_ceiling: f64,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            weight_increment: DEFAULT_WEIGHT_INCREMENT,
            rep_increment: DEFAULT_REP_INCREMENT,
            rpe_ceiling: DEFAULT_RPE_CEILING,
        }
    }
}

impl ProgressionConfig {
    /// Load overrides from `COACH_WEIGHT_INCREMENT`, `COACH_REP_INCREMENT`
    /// and `COACH_RPE_CEILING`.
    pub fn from_env() -> Self {
        Self::from_vars(env_var)
    }

    fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            weight_increment: parsed(&lookup, "COACH_WEIGHT_INCREMENT")
                .unwrap_or(defaults.weight_increment),
            rep_increment: parsed(&lookup, "COACH_REP_INCREMENT").unwrap_or(defaults.rep_increment),
            rpe_ceiling: parsed(&lookup, "COACH_RPE_CEILING").unwrap_or(defaults.rpe_ceiling),
        }
    }
}

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Unparseable values count as unset.
fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse().ok())
}

/// HTTP client timeout for language model calls.
pub fn llm_request_timeout() -> Duration {
    parsed(&env_var, "COACH_LLM_TIMEOUT_SECS")
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(120))
}
