//! Per-entry single flight.
//!
//! Every build request for an entry takes a [`Ticket`] carrying a fresh
//! generation. Only the holder of the newest generation may record
//! dependencies or write artifacts; older builds still running finish into
//! the void.
//!
//! ```text
//! begin(app.js) → gen 1 ──── resolve ── compile ──────────── commit ✗ (superseded)
//! begin(app.js) → gen 2 ── resolve ── compile ── commit ✓
//! ```
//!
//! `begin` only bumps an atomic, so the async loop never waits on disk I/O.
//! `commit` checks the generation and runs its closure under the entry's
//! write lock: a commit that passed the check finishes before any later
//! commit of the same entry starts, so an older result never lands after
//! a newer one.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;

/// Generation counter and write lock of one entry.
#[derive(Debug, Default)]
struct Slot {
    generation: AtomicU64,
    write: Mutex<()>,
}

/// Generation token for one build request.
#[derive(Debug, Clone)]
pub struct Ticket {
    key: PathBuf,
    generation: u64,
    slot: Arc<Slot>,
}

impl Ticket {
    pub fn path(&self) -> &Path {
        &self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl PartialEq for Ticket {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.generation == other.generation
    }
}

impl Eq for Ticket {}

/// Generation counters keyed by entry path.
#[derive(Debug, Default)]
pub struct SingleFlight {
    slots: DashMap<PathBuf, Arc<Slot>>,
    closed: AtomicBool,
}

impl SingleFlight {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, key: &Path) -> Arc<Slot> {
        if let Some(slot) = self.slots.get(key) {
            return Arc::clone(&slot);
        }
        Arc::clone(&self.slots.entry(key.to_path_buf()).or_default())
    }

    /// Start a new request for `key`, superseding all earlier tickets.
    pub fn begin(&self, key: &Path) -> Ticket {
        let slot = self.slot(key);
        let generation = slot.generation.fetch_add(1, Ordering::AcqRel) + 1;
        Ticket {
            key: key.to_path_buf(),
            generation,
            slot,
        }
    }

    /// Whether `ticket` is still the newest request for its entry.
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        !self.closed.load(Ordering::Acquire)
            && ticket.slot.generation.load(Ordering::Acquire) == ticket.generation
    }

    /// Run `f` only if `ticket` is current, holding the entry's write lock.
    ///
    /// Returns `None` when the ticket was superseded.
    pub fn commit<T>(&self, ticket: &Ticket, f: impl FnOnce() -> T) -> Option<T> {
        let _write = ticket.slot.write.lock();
        if !self.is_current(ticket) {
            return None;
        }
        Some(f())
    }

    /// Supersede whatever is in flight for `key` without starting anything.
    pub fn cancel(&self, key: &Path) {
        if let Some(slot) = self.slots.get(key) {
            slot.generation.fetch_add(1, Ordering::AcqRel);
        }
    }

    /// Supersede everything, now and later. Used when a target stops.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}
