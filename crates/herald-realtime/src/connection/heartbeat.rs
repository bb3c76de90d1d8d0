//! Heartbeat sweep that evicts connections which stopped answering pings.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use herald_entity::protocol::CloseReason;

use super::registry::ConnectionRegistry;

/// Periodically pings every live connection.
///
/// Each sweep clears a connection's alive flag and pings it; a transport pong
/// sets the flag again. A connection still cleared at the next sweep is
/// terminated, so a silent peer is dropped within two intervals.
#[derive(Debug, Clone)]
pub struct HeartbeatMonitor {
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
}

impl HeartbeatMonitor {
    /// Creates a new heartbeat monitor.
    pub fn new(registry: Arc<ConnectionRegistry>, interval: Duration) -> Self {
        Self { registry, interval }
    }

    /// Runs one sweep. Returns the number of connections evicted.
    pub fn sweep(&self) -> usize {
        let mut evicted = 0;
        for conn in self.registry.all_connections() {
            if conn.take_alive() {
                if !conn.ping() {
                    debug!(conn_id = %conn.id, "Heartbeat ping not queued");
                }
                continue;
            }

            warn!(
                conn_id = %conn.id,
                user_id = %conn.user_id,
                "Heartbeat timeout, terminating connection"
            );
            self.registry.unregister(conn.user_id, conn.id);
            conn.close(CloseReason::HeartbeatTimeout);
            evicted += 1;
        }
        evicted
    }

    /// Sweeps every interval until `shutdown` fires.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        ticker.tick().await;

        info!(interval_secs = self.interval.as_secs(), "Heartbeat monitor started");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    let evicted = self.sweep();
                    if evicted > 0 {
                        debug!(evicted, "Heartbeat sweep finished");
                    }
                }
            }
        }
        info!("Heartbeat monitor stopped");
    }
}
