use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Attempt timeout cannot be 0")]
    ZeroTimeout,

    #[error("Alarms are enabled but no webhook_url is set")]
    MissingWebhookUrl,
}

/// Forwarder configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    /// Main listener for incoming requests
    pub listener: Listener,
    /// Admin listener for health and readiness probes
    pub admin_listener: Listener,
    /// Upper bound for a single upstream attempt, in seconds.
    ///
    /// Unset means attempts never time out and a hung backend holds the
    /// request until the connection fails.
    #[serde(default)]
    pub attempt_timeout_secs: Option<u64>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.admin_listener.validate()?;

        if self.attempt_timeout_secs == Some(0) {
            return Err(ValidationError::ZeroTimeout);
        }

        Ok(())
    }

    pub fn attempt_timeout(&self) -> Option<Duration> {
        self.attempt_timeout_secs.map(Duration::from_secs)
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Operator alarm configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct MonitorConfig {
    #[serde(default)]
    pub enable: bool,
    /// Webhook receiving `{"message": ...}` alarm payloads
    #[serde(default)]
    pub webhook_url: Option<Url>,
    /// Alarm when the cached route of a path fails, not only when a
    /// region scan attempt fails.
    #[serde(default = "default_true")]
    pub alarm_on_cached_route_failure: bool,
}

fn default_true() -> bool {
    true
}

impl Default for MonitorConfig {
    fn default() -> Self {
        MonitorConfig {
            enable: false,
            webhook_url: None,
            alarm_on_cached_route_failure: true,
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.enable && self.webhook_url.is_none() {
            return Err(ValidationError::MissingWebhookUrl);
        }
        Ok(())
    }
}
