//! Process-wide configuration.
//!
//! Configuration is read once at process start, usually from the environment, and is
//! read-only afterwards. It selects the database a `Fixtures` handle connects to and toggles
//! verbose statement logging.

use crate::error::ConfigError;

const DATABASE_URL_VARS: [&str; 2] = ["FIXTURE_DATABASE_URL", "DATABASE_URL"];
const DEBUG_VAR: &str = "FIXTURE_DEBUG";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    /// Connection string used by `Fixtures::connect`.
    pub database_url: Option<String>,

    /// Logs every fixture insert and delete at `info` level instead of `debug`.
    pub debug: bool,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// Reads a `.env` file if one is present, then looks up `FIXTURE_DATABASE_URL` (falling
    /// back to `DATABASE_URL`) and `FIXTURE_DEBUG`.
    ///
    /// # Returns
    /// - `Ok(Config)` - Loaded configuration; missing variables leave defaults in place
    /// - `Err(ConfigError::InvalidEnvVar)` - `FIXTURE_DEBUG` is not a recognised boolean
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let database_url = DATABASE_URL_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok());

        let debug = match std::env::var(DEBUG_VAR) {
            Ok(value) => parse_flag(DEBUG_VAR, &value)?,
            Err(_) => false,
        };

        Ok(Self {
            database_url,
            debug,
        })
    }

    /// Sets the database URL.
    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = Some(url.into());
        self
    }

    /// Enables or disables verbose statement logging.
    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Returns the configured database URL.
    ///
    /// # Returns
    /// - `Ok(&str)` - Configured URL
    /// - `Err(ConfigError::MissingEnvVar)` - No URL configured
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingEnvVar(DATABASE_URL_VARS[0].to_string()))
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_debug_flags() {
        assert!(parse_flag(DEBUG_VAR, "TRUE").unwrap());
        assert!(parse_flag(DEBUG_VAR, " on ").unwrap());
        assert!(!parse_flag(DEBUG_VAR, "0").unwrap());
        assert_eq!(
            parse_flag(DEBUG_VAR, "maybe"),
            Err(ConfigError::InvalidEnvVar {
                name: DEBUG_VAR.to_string(),
                value: "maybe".to_string(),
            })
        );
    }

    #[test]
    fn requires_database_url() {
        let config = Config::default();
        assert_eq!(
            config.require_database_url(),
            Err(ConfigError::MissingEnvVar("FIXTURE_DATABASE_URL".to_string()))
        );

        let config = config.database_url("sqlite::memory:").debug(true);
        assert_eq!(config.require_database_url(), Ok("sqlite::memory:"));
        assert!(config.debug);
    }
}
