//! Deferred commit scheduling
//!
//! A single cooperative task drains pending record commits one physical
//! write per tick, keeping NVM latency out of the producer's path.
//! Producers call [`CommitScheduler::notify_dirty`] after mutating a
//! record; the host tick loop calls [`CommitScheduler::poll`]. The
//! first tick after arming is held off so a burst of correlated
//! mutations coalesces in the records' in-memory copies before any
//! commit is paid.

use fugit::MillisDurationU32;
use wearvault_hal::{NonVolatileMemory, TimeProvider};

use crate::error::StorageError;
use crate::registry::Registry;

/// Hold-off before the first commit after arming
const INITIAL_DELAY_MS: u32 = 1000;

/// Pause between consecutive commits while records stay pending
const NEXT_PENDING_MS: u32 = 200;

/// Tick-driven deferred commit task
#[derive(Debug)]
pub struct CommitScheduler {
    initial_delay: MillisDurationU32,
    commit_interval: MillisDurationU32,
    enabled: bool,
    deadline_ms: u64,
}

impl Default for CommitScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl CommitScheduler {
    /// Scheduler with the default timing (1 s hold-off, 200 ms between
    /// commits)
    pub fn new() -> Self {
        Self::with_timing(
            MillisDurationU32::millis(INITIAL_DELAY_MS),
            MillisDurationU32::millis(NEXT_PENDING_MS),
        )
    }

    /// Scheduler with custom hold-off and inter-commit timing
    pub fn with_timing(initial_delay: MillisDurationU32, commit_interval: MillisDurationU32) -> Self {
        Self {
            initial_delay,
            commit_interval,
            enabled: false,
            deadline_ms: 0,
        }
    }

    /// True while the task has work scheduled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Mark that a record was mutated and needs committing eventually
    ///
    /// Idempotent and cheap; performs no I/O. On the disabled→enabled
    /// transition the first tick is deferred by the hold-off so bursts
    /// coalesce.
    pub fn notify_dirty(&mut self, clock: &dyn TimeProvider) {
        if self.enabled {
            return;
        }
        self.enabled = true;
        self.deadline_ms = clock.now_ms() + u64::from(self.initial_delay.to_millis());
        log::debug!("commit task armed, first tick at {} ms", self.deadline_ms);
    }

    /// Run the task callback if it is enabled and due
    ///
    /// Commits at most one record. While records remain pending the
    /// next tick is scheduled one commit interval out; once none
    /// remain, the task disables itself until the next
    /// [`CommitScheduler::notify_dirty`].
    ///
    /// Returns whether a record was committed this tick.
    pub fn poll<const MAX: usize>(
        &mut self,
        clock: &dyn TimeProvider,
        nvm: &mut dyn NonVolatileMemory,
        registry: &mut Registry<'_, MAX>,
    ) -> Result<bool, StorageError> {
        if !self.enabled || clock.now_ms() < self.deadline_ms {
            return Ok(false);
        }

        if registry.commit_next_pending(nvm)? {
            self.deadline_ms = clock.now_ms() + u64::from(self.commit_interval.to_millis());
            Ok(true)
        } else {
            self.enabled = false;
            log::debug!("commit task drained, disabling");
            Ok(false)
        }
    }
}
