//! Broker configuration

use crate::mail::SmtpConfig;

#[derive(Debug, Clone)]
pub struct Config {
    /// Port to listen on
    pub port: u16,

    /// Domain this broker is hosted at
    pub domain: String,

    /// Path to the SQLite database; in-memory stores when unset
    pub database: Option<String>,

    /// SMTP configuration for code delivery; console output when unset
    pub smtp: Option<SmtpConfig>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// - CLAIMGATE_PORT (default: 3000)
    /// - CLAIMGATE_DOMAIN (default: "localhost")
    /// - CLAIMGATE_DB (optional SQLite path)
    /// - SMTP_* (see `SmtpConfig::from_env`)
    pub fn from_env() -> Self {
        let port = std::env::var("CLAIMGATE_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let domain = std::env::var("CLAIMGATE_DOMAIN")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "localhost".to_string());

        let database = std::env::var("CLAIMGATE_DB").ok().filter(|s| !s.is_empty());

        Self {
            port,
            domain,
            database,
            smtp: SmtpConfig::from_env(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            domain: "localhost".to_string(),
            database: None,
            smtp: None,
        }
    }
}
