use pipeline_core::{AppConfig, StageDeletePolicy};
use std::time::Duration;

/// Behavior knobs for a [`PipelineBoard`](crate::PipelineBoard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardSettings {
    pub stage_delete_policy: StageDeletePolicy,
    /// Shown on provisional notes until the server's copy arrives.
    pub author_name: String,
    /// Upper bound on one remote call. Hitting it counts as a transport
    /// failure and rolls the change back.
    pub request_timeout: Duration,
}

impl Default for BoardSettings {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for BoardSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            stage_delete_policy: config.stage_delete_policy,
            author_name: config.effective_author_name().to_string(),
            request_timeout: config.request_timeout(),
        }
    }
}

impl BoardSettings {
    pub fn with_policy(mut self, policy: StageDeletePolicy) -> Self {
        self.stage_delete_policy = policy;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}
