//! Return Address Stack (RAS) with a split speculative/committed pair.
//!
//! Fetch pushes/pops the speculative stack immediately on predicted calls/returns;
//! commit pushes/pops the committed stack only once the call/return actually
//! retires. On a misprediction the speculative stack is rewound from the
//! committed copy rather than replayed instruction-by-instruction.

/// A single RAS implementation, shared by both the speculative and committed stacks.
#[derive(Clone)]
struct Stack {
    entries: Vec<u64>,
    capacity: usize,
}

impl Stack {
    fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn push(&mut self, addr: u64) {
        if self.entries.len() == self.capacity {
            self.entries.remove(0);
        }
        self.entries.push(addr);
    }

    fn pop(&mut self) -> Option<u64> {
        self.entries.pop()
    }

    fn top(&self) -> Option<u64> {
        self.entries.last().copied()
    }
}

/// Return Address Stack with independent speculative and committed copies.
pub struct Ras {
    speculative: Stack,
    committed: Stack,
}

impl Ras {
    /// Creates a RAS pair with the given per-stack capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            speculative: Stack::new(capacity),
            committed: Stack::new(capacity),
        }
    }

    /// Speculative push performed at fetch time on a predicted call.
    pub fn speculative_push(&mut self, ret_addr: u64) {
        self.speculative.push(ret_addr);
    }

    /// Speculative pop performed at fetch time on a predicted return; the popped
    /// value is the predicted return target.
    pub fn speculative_pop(&mut self) -> Option<u64> {
        self.speculative.pop()
    }

    /// Peeks the speculative top without popping (used purely for prediction).
    #[must_use]
    pub fn predict_return(&self) -> Option<u64> {
        self.speculative.top()
    }

    /// Commit-time push for a retiring call; also advances the committed stack.
    pub fn commit_call(&mut self, ret_addr: u64) {
        self.committed.push(ret_addr);
    }

    /// Commit-time pop for a retiring return.
    pub fn commit_return(&mut self) -> Option<u64> {
        self.committed.pop()
    }

    /// Peeks the committed stack's top (test/debug visibility only).
    #[must_use]
    pub fn committed_top(&self) -> Option<u64> {
        self.committed.top()
    }

    /// Rewinds the speculative stack to match the committed one — used on any
    /// redirect (mispredict, exception) so speculative call/return history from
    /// squashed instructions is discarded.
    pub fn recover_from_committed(&mut self) {
        self.speculative = self.committed.clone();
    }
}
