use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use thiserror::Error;

pub mod booking;
pub mod calendar;

/// Result type used throughout this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The error type returned by all fallible operations within this crate.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("invalid timestamp {input:?}: {source}")]
    InvalidTimestamp {
        input: String,
        source: chrono::ParseError,
    },
    #[error("invalid date {0:?}")]
    InvalidDate(String),
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),
    #[error("event time has neither `dateTime` nor `date`")]
    MissingEventTime,
    #[error("calendar client error: {0}")]
    Client(#[from] calendar::google::ClientError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Google Calendar API configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct GoogleConfig {
    /// OAuth2 client secret as downloaded from the Google Cloud console.
    pub credentials_file: PathBuf,
    /// Cached user credentials. Created by the authorization flow if missing.
    pub token_file: PathBuf,
    /// Base URL of the calendar API.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for GoogleConfig {
    fn default() -> Self {
        GoogleConfig {
            credentials_file: "credentials.json".into(),
            token_file: "token.json".into(),
            base_url: "https://www.googleapis.com/calendar/v3".into(),
            timeout_secs: 10,
        }
    }
}

/// Booking check configuration.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct BookingConfig {
    /// IANA name of the zone bookings are displayed in.
    pub time_zone: String,
}

impl Default for BookingConfig {
    fn default() -> Self {
        BookingConfig {
            time_zone: "Australia/Melbourne".into(),
        }
    }
}

/// Global application configuration.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Google Calendar configuration section.
    pub google: GoogleConfig,
    /// Booking check configuration section.
    pub booking: BookingConfig,
}

impl AppConfig {
    /// Loads the application configuration from files in the `config/` directory and environment
    /// variables. All sources are optional; missing values fall back to the defaults.
    pub fn load() -> Result<AppConfig> {
        let app_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        log::debug!("loading configuration using {} environment", app_env);

        let config = Config::builder()
            // Configuration defaults from `config/default.toml`.
            .add_source(File::with_name("config/default").required(false))
            // Optional environment specific config overrides, e.g. `config/production.toml`.
            .add_source(File::with_name(&format!("config/{}", app_env)).required(false))
            // Optional local config overrides from `config/local.toml` (on .gitignore).
            .add_source(File::with_name("config/local").required(false))
            // Config from environment variables prefixed with `GCAL_`, e.g.
            // `GCAL_GOOGLE__TOKEN_FILE`.
            .add_source(
                Environment::with_prefix("GCAL")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        log::debug!("loaded configuration: {:?}", config);

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_working_directory_layout() {
        let config = AppConfig::default();

        assert_eq!(config.google.credentials_file, PathBuf::from("credentials.json"));
        assert_eq!(config.google.token_file, PathBuf::from("token.json"));
        assert_eq!(config.booking.time_zone, "Australia/Melbourne");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config: AppConfig = Config::builder()
            .add_source(File::from_str(
                "[google]\ntoken_file = \"cache/token.json\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.google.token_file, PathBuf::from("cache/token.json"));
        assert_eq!(config.google.credentials_file, PathBuf::from("credentials.json"));
        assert_eq!(config.google.timeout_secs, 10);
        assert_eq!(config.booking.time_zone, "Australia/Melbourne");
    }
}
