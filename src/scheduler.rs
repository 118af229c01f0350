use crate::engine::SimEngine;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct TickStats {
    pub total_ticks: u64,
    pub last_tick_us: u64,
    pub max_tick_us: u64,
}

/// Drives the engine's `tick()` on a fixed period.
///
/// The tick itself stays directly callable, so tests exercise simulation
/// behavior without wall-clock waiting; this driver only adds the timing
/// loop around it.
pub struct TickDriver {
    engine: Arc<SimEngine>,
    period: Duration,
    stats: Arc<Mutex<TickStats>>,
}

impl TickDriver {
    pub fn new(engine: Arc<SimEngine>, period: Duration) -> Self {
        Self {
            engine,
            period,
            stats: Arc::new(Mutex::new(TickStats::default())),
        }
    }

    /// Shared stats handle. Stays readable after `run` has consumed the
    /// driver.
    pub fn stats(&self) -> Arc<Mutex<TickStats>> {
        Arc::clone(&self.stats)
    }

    /// Periodic loop; runs until the task is dropped.
    pub async fn run(self) {
        info!(
            period_ms = self.period.as_millis() as u64,
            "tick driver started"
        );
        let mut interval = time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            let started = Instant::now();
            self.engine.tick();

            let elapsed_us = started.elapsed().as_micros() as u64;
            let snapshot = {
                let mut stats = self.stats.lock();
                stats.total_ticks += 1;
                stats.last_tick_us = elapsed_us;
                stats.max_tick_us = stats.max_tick_us.max(elapsed_us);
                *stats
            };

            if snapshot.total_ticks % 100 == 0 {
                debug!(
                    total = snapshot.total_ticks,
                    last_us = snapshot.last_tick_us,
                    max_us = snapshot.max_tick_us,
                    "tick stats"
                );
            }
        }
    }
}
