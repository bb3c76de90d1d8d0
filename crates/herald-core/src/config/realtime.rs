//! `[realtime]` section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Live connection engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Seconds between heartbeat sweeps. A silent connection is dropped
    /// after one to two intervals.
    pub heartbeat_interval_seconds: u64,
    /// Outbound frames queued per connection before sends are dropped.
    pub channel_buffer_size: usize,
    /// Notifications returned by `get_notifications`.
    pub notification_list_limit: i64,
    /// Preview length in characters, ellipsis included.
    pub preview_max_chars: usize,
}

impl RealtimeConfig {
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval_seconds: 30,
            channel_buffer_size: 256,
            notification_list_limit: 50,
            preview_max_chars: 120,
        }
    }
}
