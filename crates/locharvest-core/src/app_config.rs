use std::time::Duration;

/// How the cumulative per-run checkpoint is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CheckpointMode {
    /// Rewrite the whole checkpoint map after every page.
    #[default]
    Snapshot,
    /// Append one line per page and rebuild the map on load.
    Log,
}

impl std::fmt::Display for CheckpointMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckpointMode::Snapshot => write!(f, "snapshot"),
            CheckpointMode::Log => write!(f, "log"),
        }
    }
}

/// Settings shared by every stage of a harvest run. Built once at startup
/// and passed down by reference; nothing reads process state after that.
#[derive(Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub page_delay_ms: u64,
    pub max_attempts: u32,
    pub retry_wait_ms: u64,
    pub checkpoint_mode: CheckpointMode,
}

impl AppConfig {
    #[must_use]
    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    #[must_use]
    pub fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &"[redacted]")
            .field("base_url", &self.base_url)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("page_delay_ms", &self.page_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("retry_wait_ms", &self.retry_wait_ms)
            .field("checkpoint_mode", &self.checkpoint_mode)
            .finish()
    }
}
