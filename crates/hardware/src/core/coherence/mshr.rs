//! Miss Status Holding Register file: tracks in-flight coherence transactions
//! per line so a cache can keep accepting new requests while a miss resolves.
//!
//! Grounded on `cache/moesi/l1cachev2.h`'s `MSHREntry`: one entry per
//! outstanding line, recording the [`MshrState`] transition in progress, any
//! secondary requestors that arrived behind the primary miss (merged rather
//! than re-issued), and the pending ack count for `GetmAck`-style transactions.

use super::protocol::MshrState;

/// A secondary access that arrived while a line was already being serviced.
#[derive(Clone, Copy, Debug)]
pub struct PendingRequestor {
    pub port: usize,
    pub is_write: bool,
}

/// One outstanding coherence transaction.
#[derive(Clone, Debug)]
pub struct MshrEntry {
    pub line: u64,
    pub state: MshrState,
    pub primary_port: usize,
    /// Secondary requestors merged onto this MSHR instead of missing again.
    pub waiters: Vec<PendingRequestor>,
    /// Remaining `InvalidAck`/`GetmAck` acknowledgements before the
    /// transaction can complete (directory invalidation fan-in).
    pub acks_remaining: u32,
}

impl MshrEntry {
    fn new(line: u64, state: MshrState, primary_port: usize) -> Self {
        Self {
            line,
            state,
            primary_port,
            waiters: Vec::new(),
            acks_remaining: 0,
        }
    }
}

/// Fixed-capacity MSHR file. A full file forces the cache to report `Busy`
/// (see `common::error::MemOpError`) rather than accept a new primary miss.
pub struct MshrFile {
    entries: Vec<MshrEntry>,
    capacity: usize,
}

impl MshrFile {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    #[must_use]
    pub fn lookup(&self, line: u64) -> Option<&MshrEntry> {
        self.entries.iter().find(|e| e.line == line)
    }

    #[must_use]
    pub fn lookup_mut(&mut self, line: u64) -> Option<&mut MshrEntry> {
        self.entries.iter_mut().find(|e| e.line == line)
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    /// Allocates a new MSHR entry as the primary requestor for `line`.
    /// Returns `None` if the file is full; callers must check `is_full` (or
    /// handle the `None`) and report `Busy` upward.
    pub fn allocate(&mut self, line: u64, state: MshrState, primary_port: usize) -> Option<()> {
        if self.is_full() || self.lookup(line).is_some() {
            return None;
        }
        self.entries.push(MshrEntry::new(line, state, primary_port));
        Some(())
    }

    /// Merges a secondary access onto an existing MSHR for `line`.
    pub fn merge(&mut self, line: u64, requestor: PendingRequestor) -> bool {
        if let Some(entry) = self.lookup_mut(line) {
            entry.waiters.push(requestor);
            true
        } else {
            false
        }
    }

    /// Releases the MSHR for `line`, returning its waiters so the cache can
    /// re-drive them now that the line has arrived.
    pub fn release(&mut self, line: u64) -> Option<MshrEntry> {
        let idx = self.entries.iter().position(|e| e.line == line)?;
        Some(self.entries.remove(idx))
    }
}
