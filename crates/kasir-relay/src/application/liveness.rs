//! Liveness monitor: periodic probes and dead-session eviction.
//!
//! One monitor runs per server.  Every `period` it walks the registry:
//!
//! - A session whose alive flag is still clear (it never answered the
//!   previous probe) is terminated with close code 1001 and removed from the
//!   registry right away, so it stops being listed or addressable even if
//!   its transport is wedged.
//! - Every other session has its flag cleared and gets a fresh probe.
//!
//! A session that stops answering is therefore evicted on the second tick
//! after its last pong: between one and two periods of silence.

use std::sync::Arc;
use std::time::Duration;

use kasir_core::protocol::close_code;
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::application::registry::SessionRegistry;

/// Outcome of one monitor tick.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Sessions that were sent a probe.
    pub probed: usize,
    /// Sessions terminated for missing the previous probe.
    pub terminated: usize,
}

/// Periodically probes every registered session.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    registry: Arc<SessionRegistry>,
    period: Duration,
}

impl LivenessMonitor {
    pub fn new(registry: Arc<SessionRegistry>, period: Duration) -> Self {
        Self { registry, period }
    }

    /// Runs one probe round over a snapshot of the registry.
    pub async fn tick(&self) -> TickReport {
        let mut report = TickReport::default();

        // Snapshot first; the registry lock is not held while touching sessions.
        for session in self.registry.sessions().await {
            if !session.is_open() {
                continue;
            }

            if !session.take_alive() {
                warn!(
                    kasir_id = %session.kasir_id(),
                    session = %session.id(),
                    "no pong since last probe; terminating"
                );
                session.terminate(close_code::GOING_AWAY, close_code::LIVENESS_TIMEOUT_REASON);
                self.registry
                    .remove(session.kasir_id().as_str(), session.id())
                    .await;
                report.terminated += 1;
                continue;
            }

            if session.probe() {
                report.probed += 1;
            } else {
                debug!(kasir_id = %session.kasir_id(), "writer gone; skipping probe");
            }
        }

        if report.terminated > 0 || report.probed > 0 {
            debug!(
                probed = report.probed,
                terminated = report.terminated,
                "liveness tick"
            );
        }
        report
    }

    /// Ticks every `period` until `shutdown` flips to `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately; probes start one period in.
        ticker.tick().await;

        info!("liveness monitor started (period {:?})", self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("liveness monitor stopped");
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
