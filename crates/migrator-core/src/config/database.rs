use std::time::Duration;

use serde::{Deserialize, Serialize};

/// The `[database]` section: where migrations are applied and how the
/// connection behaves while they run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL URL. Left empty, the CLI falls back to `DATABASE_URL`.
    #[serde(default)]
    pub url: String,

    /// Upper bound on open connections.
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,

    /// Seconds to wait for a free connection before giving up.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,

    /// Seconds a single migration statement may run. `0` disables the limit.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn has_url(&self) -> bool {
        !self.url.trim().is_empty()
    }

    pub fn pool_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    /// Per-statement limit, `None` when disabled.
    pub fn statement_timeout(&self) -> Option<Duration> {
        match self.statement_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            pool_size: default_pool_size(),
            pool_timeout_secs: default_pool_timeout(),
            statement_timeout_secs: default_statement_timeout(),
        }
    }
}

fn default_pool_size() -> u32 {
    2
}

fn default_pool_timeout() -> u64 {
    30
}

fn default_statement_timeout() -> u64 {
    300
}
