//! Branch-history register: a circular bit buffer feeding the TAGE/SC/ITTAGE index functions.
//!
//! The register itself is a fixed-width bitset; `fold` implements the chunked-XOR
//! operation used to compress a long history into a short table index or tag,
//! folding `history_len` low bits into `tag_len`-bit chunks via XOR.

/// Maximum length tracked by the history register (bits).
pub const MAX_HISTORY: usize = 128;

/// A fixed-capacity circular bit buffer recording recent branch outcomes.
#[derive(Clone, Debug)]
pub struct GlobalHistory {
    bits: [bool; MAX_HISTORY],
}

impl Default for GlobalHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHistory {
    /// Creates a history register with every bit cleared (not-taken).
    #[must_use]
    pub fn new() -> Self {
        Self {
            bits: [false; MAX_HISTORY],
        }
    }

    /// Shifts in one new outcome bit (`true` = taken) at position 0, aging every
    /// older bit up by one position. Oldest bit beyond `MAX_HISTORY` is dropped.
    pub fn push(&mut self, taken: bool) {
        for i in (1..MAX_HISTORY).rev() {
            self.bits[i] = self.bits[i - 1];
        }
        self.bits[0] = taken;
    }

    /// Folds the low `history_len` bits into `tag_len`-bit chunks via XOR.
    ///
    /// `history_len` need not be a multiple of `tag_len`; the final partial chunk
    /// is XORed in at its natural bit width.
    #[must_use]
    pub fn fold(&self, history_len: usize, tag_len: usize) -> u32 {
        debug_assert!(tag_len > 0 && tag_len <= 32);
        let history_len = history_len.min(MAX_HISTORY);
        let mut acc = 0u32;
        let mut chunk = 0u32;
        let mut chunk_bits = 0usize;
        for i in 0..history_len {
            if self.bits[i] {
                chunk |= 1 << chunk_bits;
            }
            chunk_bits += 1;
            if chunk_bits == tag_len {
                acc ^= chunk;
                chunk = 0;
                chunk_bits = 0;
            }
        }
        if chunk_bits > 0 {
            acc ^= chunk;
        }
        let mask = if tag_len >= 32 {
            u32::MAX
        } else {
            (1u32 << tag_len) - 1
        };
        acc & mask
    }

    /// Snapshot of the raw bits, for checkpoint/restore on misprediction.
    #[must_use]
    pub fn snapshot(&self) -> [bool; MAX_HISTORY] {
        self.bits
    }

    /// Restores from a prior snapshot (e.g. on a redirect).
    pub fn restore(&mut self, snap: [bool; MAX_HISTORY]) {
        self.bits = snap;
    }
}
