// crates/formforge-core/src/runtime/driver.rs
// ============================================================================
// Module: FormForge Timer Driver
// Description: Tokio loop driving debounce flushes, sweeps, polls, autosave.
// Purpose: Own the wall clock so the engine itself never reads it.
// Dependencies: crate::{core, runtime}, tokio
// ============================================================================

//! ## Overview
//! The driver is the session's only wall-clock consumer. It runs the
//! engine's timed work on the configured intervals: flushing debounced
//! remote validations and queued suggestion requests, sweeping expired
//! suggestions, polling the active background job, and autosaving drafts.
//! Hosts embed it as one spawned task and stop it through the shutdown
//! channel.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use tokio::sync::watch;
use tokio::time::interval;

use crate::core::Timestamp;
use crate::runtime::session::FormSession;

// ============================================================================
// SECTION: Wall Clock
// ============================================================================

/// Minimum spacing of debounce flush ticks in milliseconds.
const MIN_FLUSH_TICK_MS: i64 = 50;

/// Reads the wall clock as a canonical timestamp.
#[must_use]
pub fn wall_clock() -> Timestamp {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or_default();
    Timestamp::from_unix_millis(i64::try_from(millis).unwrap_or(i64::MAX))
}

/// Converts a configured interval into a non-zero duration.
fn tick(millis: i64) -> Duration {
    Duration::from_millis(u64::try_from(millis.max(MIN_FLUSH_TICK_MS)).unwrap_or(u64::MAX))
}

// ============================================================================
// SECTION: Timer Driver
// ============================================================================

/// Timer loop for one session.
pub struct TimerDriver {
    /// Driven session.
    session: Arc<FormSession>,
    /// Shutdown signal; any received value stops the loop.
    shutdown: watch::Receiver<bool>,
}

impl TimerDriver {
    /// Creates a driver for the session.
    #[must_use]
    pub const fn new(session: Arc<FormSession>, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            session,
            shutdown,
        }
    }

    /// Runs the timer loop until the shutdown channel fires or closes.
    pub async fn run(mut self) {
        let config = *self.session.store().config();
        let mut flush = interval(tick(config.remote_debounce_ms.min(250)));
        let mut sweep = interval(tick(config.sweep_interval_ms));
        let mut poll = interval(tick(config.poll_interval_ms));
        let mut autosave = interval(tick(config.autosave_interval_ms));

        loop {
            tokio::select! {
                _ = flush.tick() => {
                    self.session.flush_due(wall_clock()).await;
                }
                _ = sweep.tick() => {
                    self.session.sweep(wall_clock());
                }
                _ = poll.tick() => {
                    if self.session.jobs().is_polling() {
                        self.session.poll_job(wall_clock()).await;
                    }
                }
                _ = autosave.tick() => {
                    self.session.autosave(wall_clock()).await;
                }
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
