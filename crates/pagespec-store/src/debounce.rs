//! Latest-wins write debouncer.
//!
//! Rapid edits to the same spec collapse into one write: scheduling a
//! payload while one is already pending for that spec replaces the payload
//! and pushes the deadline out by the full delay. Nothing fires on its own;
//! the owner calls [`WriteDebouncer::tick_at`] and writes whatever is due.
//!
//! # Invariants
//!
//! - **Latest-wins**: a due write always carries the most recent payload.
//! - **One write per window**: a spec is never due twice without a new schedule.
//! - **Deterministic**: every entry point has an `*_at(now)` form.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | `delay = 0` | Due on the next tick |
//! | Cancel without pending | Returns `None` |
//! | Tick before deadline | Returns nothing |

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use pagespec_core::SpecId;

/// Default debounce window for spec writes.
pub const DEFAULT_SAVE_DELAY: Duration = Duration::from_millis(300);

#[derive(Debug, Clone)]
struct Pending<T> {
    payload: T,
    deadline: Instant,
    coalesced: u32,
}

/// Outcome of scheduling a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// No write was pending for this spec.
    Queued,
    /// A pending write was replaced; the deadline moved.
    Coalesced,
}

/// Counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebounceStats {
    pub scheduled: u64,
    pub coalesced: u64,
    pub released: u64,
    pub cancelled: u64,
}

/// Per-spec trailing-edge debouncer holding the latest payload.
#[derive(Debug, Clone)]
pub struct WriteDebouncer<T> {
    delay: Duration,
    pending: BTreeMap<SpecId, Pending<T>>,
    stats: DebounceStats,
}

impl<T> WriteDebouncer<T> {
    #[must_use]
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: BTreeMap::new(),
            stats: DebounceStats::default(),
        }
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedule `payload` for `id` using the current time.
    pub fn schedule(&mut self, id: SpecId, payload: T) -> ScheduleOutcome {
        self.schedule_at(id, payload, Instant::now())
    }

    /// Schedule `payload` for `id` as of `now`.
    pub fn schedule_at(&mut self, id: SpecId, payload: T, now: Instant) -> ScheduleOutcome {
        self.stats.scheduled += 1;
        let deadline = now + self.delay;
        match self.pending.get_mut(&id) {
            Some(pending) => {
                pending.payload = payload;
                pending.deadline = deadline;
                pending.coalesced += 1;
                self.stats.coalesced += 1;
                tracing::trace!(spec_id = %id, coalesced = pending.coalesced, "write coalesced");
                ScheduleOutcome::Coalesced
            }
            None => {
                self.pending.insert(
                    id,
                    Pending {
                        payload,
                        deadline,
                        coalesced: 0,
                    },
                );
                ScheduleOutcome::Queued
            }
        }
    }

    /// Release writes that are due using the current time.
    pub fn tick(&mut self) -> Vec<(SpecId, T)> {
        self.tick_at(Instant::now())
    }

    /// Release every write whose deadline is at or before `now`, in
    /// deadline order.
    pub fn tick_at(&mut self, now: Instant) -> Vec<(SpecId, T)> {
        let due: Vec<SpecId> = self
            .pending
            .iter()
            .filter(|(_, pending)| pending.deadline <= now)
            .map(|(id, _)| id.clone())
            .collect();
        let mut released: Vec<(Instant, SpecId, T)> = due
            .into_iter()
            .filter_map(|id| {
                self.pending
                    .remove(&id)
                    .map(|pending| (pending.deadline, id, pending.payload))
            })
            .collect();
        released.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.stats.released += released.len() as u64;
        released
            .into_iter()
            .map(|(_, id, payload)| (id, payload))
            .collect()
    }

    /// Release everything pending regardless of deadline.
    pub fn drain(&mut self) -> Vec<(SpecId, T)> {
        let pending = std::mem::take(&mut self.pending);
        let mut released: Vec<(Instant, SpecId, T)> = pending
            .into_iter()
            .map(|(id, pending)| (pending.deadline, id, pending.payload))
            .collect();
        released.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        self.stats.released += released.len() as u64;
        released
            .into_iter()
            .map(|(_, id, payload)| (id, payload))
            .collect()
    }

    /// Drop the pending write for `id`, returning its payload.
    pub fn cancel(&mut self, id: &SpecId) -> Option<T> {
        let pending = self.pending.remove(id)?;
        self.stats.cancelled += 1;
        Some(pending.payload)
    }

    /// Time until the earliest pending write is due, `Duration::ZERO` if
    /// something is already due, `None` if nothing is pending.
    #[must_use]
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .values()
            .map(|pending| pending.deadline.saturating_duration_since(now))
            .min()
    }

    #[must_use]
    pub fn is_pending(&self, id: &SpecId) -> bool {
        self.pending.contains_key(id)
    }

    /// Latest payload waiting for `id`.
    #[must_use]
    pub fn peek(&self, id: &SpecId) -> Option<&T> {
        self.pending.get(id).map(|pending| &pending.payload)
    }

    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    #[must_use]
    pub fn stats(&self) -> DebounceStats {
        self.stats
    }
}

impl<T> Default for WriteDebouncer<T> {
    fn default() -> Self {
        Self::new(DEFAULT_SAVE_DELAY)
    }
}
