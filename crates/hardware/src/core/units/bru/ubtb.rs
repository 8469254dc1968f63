//! Stage-1 micro-BTB: a tiny direct-mapped table for a same-cycle fetch redirect.
//!
//! Looked up in parallel with instruction-cache access. A hit redirects the fetch
//! PC before S2's richer (and slower) FTB/TAGE prediction is available; S3
//! cross-checks the two and corrects any disagreement.

#[derive(Clone, Copy, Default)]
struct UbtbEntry {
    tag: u64,
    target: u64,
    taken_ctr: i8,
    valid: bool,
}

/// Small direct-mapped stage-1 predictor.
pub struct Ubtb {
    table: Vec<UbtbEntry>,
    size: usize,
}

impl Ubtb {
    /// Creates a micro-BTB with `size` entries (must be a power of two).
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            table: vec![UbtbEntry::default(); size],
            size,
        }
    }

    fn index(&self, pc: u64) -> usize {
        ((pc >> 1) as usize) & (self.size - 1)
    }

    /// Predicts the next fetch PC: `pc + ft_len` on a miss or a non-positive taken
    /// counter, or the cached target when the entry predicts taken.
    #[must_use]
    pub fn predict(&self, pc: u64, ft_len: u64) -> u64 {
        let idx = self.index(pc);
        let e = self.table[idx];
        if e.valid && e.tag == pc && e.taken_ctr > 0 {
            e.target
        } else {
            pc + ft_len
        }
    }

    /// Trains the entry for `pc` toward the observed outcome.
    pub fn update(&mut self, pc: u64, taken: bool, target: u64) {
        let idx = self.index(pc);
        let e = &mut self.table[idx];
        if !e.valid || e.tag != pc {
            *e = UbtbEntry {
                tag: pc,
                target,
                taken_ctr: i8::from(taken),
                valid: true,
            };
            return;
        }
        e.target = target;
        e.taken_ctr = if taken {
            e.taken_ctr.saturating_add(1).min(1)
        } else {
            e.taken_ctr.saturating_sub(1).max(-1)
        };
    }
}
