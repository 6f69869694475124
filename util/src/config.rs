//! Global application configuration manager.
//!
//! `AppConfig` is a lazily initialized, globally accessible singleton containing
//! runtime configuration values loaded from environment variables. It provides
//! thread-safe access and mutation for testing or overrides in runtime environments.
//!
//! Required keys (`DATABASE_PATH`, `JWT_SECRET`, `QR_SECRET`) have no fallback: a
//! missing or empty value aborts startup instead of running with an insecure default.

use std::env;
use std::ops::RangeInclusive;
use std::str::FromStr;
use std::sync::{OnceLock, RwLock};

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Represents the complete application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub project_name: String,
    pub log_level: String,
    pub log_file: String,
    pub log_to_stdout: bool,
    pub database_path: String,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub jwt_duration_minutes: u64,
    /// Signing key for course QR tokens.
    pub qr_secret: String,
    /// Lifetime of a QR token, applied both when issuing and when verifying.
    pub qr_token_window_seconds: u64,
    pub fraud_window_hours: u64,
    /// A device seen on more distinct students than this inside the window is suspicious.
    pub fraud_max_students_per_device: usize,
    pub fraud_scan_limit: u64,
    /// Used when a school does not carry its own attendance radius.
    pub school_radius_meters: f64,
}

/// Lazily-initialized, thread-safe singleton instance of `AppConfig`.
static CONFIG_INSTANCE: OnceLock<RwLock<AppConfig>> = OnceLock::new();

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn parsed<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError> {
    let raw = env::var(key).unwrap_or_else(|_| default.into());
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid { key, value: raw })
}

/// Like [`parsed`], but the value must also fall inside `range`.
fn bounded<T>(key: &'static str, default: &str, range: RangeInclusive<T>) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
{
    let value: T = parsed(key, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        })
    }
}

/// One day.
const MAX_QR_TOKEN_WINDOW_SECONDS: u64 = 86_400;
/// One year.
const MAX_FRAUD_WINDOW_HOURS: u64 = 8_760;
const MAX_FRAUD_SCAN_LIMIT: u64 = 1_000_000;
const MAX_STUDENTS_PER_DEVICE: usize = 1_000;
/// One year.
const MAX_JWT_DURATION_MINUTES: u64 = 525_600;

impl AppConfig {
    /// Loads the configuration from `.env` and environment variables.
    pub fn try_from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            env: env::var("APP_ENV").unwrap_or_else(|_| "development".into()),
            project_name: env::var("PROJECT_NAME").unwrap_or_else(|_| "school-attendance".into()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "api=info,services=info".into()),
            log_file: env::var("LOG_FILE").unwrap_or_else(|_| "api.log".into()),
            log_to_stdout: env::var("LOG_TO_STDOUT").unwrap_or_else(|_| "false".into()) == "true",
            database_path: required("DATABASE_PATH")?,
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".into()),
            port: parsed("PORT", "3000")?,
            jwt_secret: required("JWT_SECRET")?,
            jwt_duration_minutes: bounded(
                "JWT_DURATION_MINUTES",
                "60",
                1..=MAX_JWT_DURATION_MINUTES,
            )?,
            qr_secret: required("QR_SECRET")?,
            qr_token_window_seconds: bounded(
                "QR_TOKEN_WINDOW_SECONDS",
                "300",
                1..=MAX_QR_TOKEN_WINDOW_SECONDS,
            )?,
            fraud_window_hours: bounded("FRAUD_WINDOW_HOURS", "24", 1..=MAX_FRAUD_WINDOW_HOURS)?,
            fraud_max_students_per_device: bounded(
                "FRAUD_MAX_STUDENTS_PER_DEVICE",
                "2",
                1..=MAX_STUDENTS_PER_DEVICE,
            )?,
            fraud_scan_limit: bounded("FRAUD_SCAN_LIMIT", "5000", 1..=MAX_FRAUD_SCAN_LIMIT)?,
            school_radius_meters: bounded("SCHOOL_RADIUS_METERS", "100", 1.0..=50_000.0)?,
        })
    }

    /// Same as [`AppConfig::try_from_env`], but a misconfiguration is fatal.
    ///
    /// # Panics
    /// Panics if a required variable is missing or a value cannot be parsed.
    pub fn from_env() -> Self {
        match Self::try_from_env() {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "invalid configuration");
                panic!("invalid configuration: {e}");
            }
        }
    }

    /// Returns a shared reference to the global configuration.
    ///
    /// # Panics
    /// Panics if the lock cannot be acquired.
    pub fn global() -> std::sync::RwLockReadGuard<'static, AppConfig> {
        CONFIG_INSTANCE
            .get_or_init(|| RwLock::new(AppConfig::from_env()))
            .read()
            .expect("Failed to acquire AppConfig read lock")
    }

    /// Resets the configuration by reloading from environment variables.
    ///
    /// Useful in tests to clear overrides.
    pub fn reset() {
        if let Some(lock) = CONFIG_INSTANCE.get() {
            let mut guard = lock.write().expect("Failed to acquire AppConfig write lock");
            *guard = AppConfig::from_env();
        }
    }

    /// Generic internal setter for any field in the config.
    fn set_field<F>(setter: F)
    where
        F: FnOnce(&mut AppConfig),
    {
        let lock = CONFIG_INSTANCE.get_or_init(|| RwLock::new(AppConfig::from_env()));
        let mut guard = lock
            .write()
            .expect("Failed to acquire AppConfig write lock");
        setter(&mut guard);
    }

    // --- Per-field setters below ---

    pub fn set_qr_token_window_seconds(value: u64) {
        AppConfig::set_field(|cfg| cfg.qr_token_window_seconds = value);
    }

    pub fn set_fraud_window_hours(value: u64) {
        AppConfig::set_field(|cfg| cfg.fraud_window_hours = value);
    }
}
