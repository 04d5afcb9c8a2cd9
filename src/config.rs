//! Configuration types.

use std::time::Duration;

/// Bot configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Bot name for identification.
    pub name: String,
    /// Session idle timeout (sessions are pruned after this duration).
    pub session_idle_timeout: Duration,
    /// How often the idle-session sweep runs.
    pub eviction_interval: Duration,
    /// Long-poll timeout passed to the Telegram getUpdates call, in seconds.
    pub poll_timeout_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "repbot".to_string(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            eviction_interval: Duration::from_secs(60),
            poll_timeout_secs: 30,
        }
    }
}

impl BotConfig {
    /// Build a config from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = env_u64("REPBOT_SESSION_IDLE_SECS") {
            config.session_idle_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("REPBOT_EVICTION_INTERVAL_SECS") {
            config.eviction_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = env_u64("REPBOT_POLL_TIMEOUT_SECS") {
            config.poll_timeout_secs = secs;
        }
        config
    }
}

fn env_u64(key: &str) -> Option<u64> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {key}: {raw:?} is not a number");
            None
        }
    }
}
