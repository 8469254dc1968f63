//! ITTAGE: indirect-branch target predictor, structurally identical to TAGE but
//! storing a predicted target address per tagged entry instead of a direction
//! counter. Used for `jalr` targets that the FTB's single static target cannot
//! capture (virtual dispatch, switch tables).

use super::ghr::GlobalHistory;

#[derive(Clone, Copy, Default)]
struct Entry {
    tag: u16,
    target: u64,
    useful: u8,
    valid: bool,
}

struct Bank {
    table: Vec<Entry>,
    history_len: usize,
    tag_bits: u32,
}

impl Bank {
    fn new(size: usize, history_len: usize, tag_bits: u32) -> Self {
        Self {
            table: vec![Entry::default(); size],
            history_len,
            tag_bits,
        }
    }

    fn index(&self, pc: u64, ghr: &GlobalHistory) -> usize {
        let folded = ghr.fold(self.history_len, self.table.len().trailing_zeros().max(1) as usize);
        (((pc >> 1) as u32) ^ folded) as usize % self.table.len()
    }

    fn tag(&self, pc: u64, ghr: &GlobalHistory) -> u16 {
        let folded = ghr.fold(self.history_len, self.tag_bits as usize);
        (((pc >> 1) as u32 ^ folded) & ((1u32 << self.tag_bits) - 1)) as u16
    }
}

/// Indirect-target prediction and the provider bookkeeping `update` needs.
#[derive(Clone, Copy, Debug)]
pub struct IttagePrediction {
    /// Predicted target, if any bank (or the base table) held a valid entry.
    pub target: Option<u64>,
    provider: Option<usize>,
}

/// Five-table ITTAGE predictor for indirect-jump targets.
pub struct Ittage {
    base: Vec<Option<u64>>,
    banks: Vec<Bank>,
}

impl Ittage {
    /// Builds a five-bank ITTAGE predictor with a geometric history-length series.
    #[must_use]
    pub fn new(table_size: usize) -> Self {
        let history_lengths = [4, 8, 16, 32, 64];
        let tag_bits = [8, 8, 9, 9, 10];
        let banks = history_lengths
            .iter()
            .zip(tag_bits.iter())
            .map(|(&h, &t)| Bank::new(table_size, h, t))
            .collect();
        Self {
            base: vec![None; 1024],
            banks,
        }
    }

    fn base_index(pc: u64) -> usize {
        ((pc >> 1) as usize) & 1023
    }

    /// Predicts the indirect target for a `jalr` at `pc`.
    #[must_use]
    pub fn predict(&self, pc: u64, ghr: &GlobalHistory) -> IttagePrediction {
        let mut provider = None;
        let mut target = self.base[Self::base_index(pc)];
        for (i, bank) in self.banks.iter().enumerate() {
            let idx = bank.index(pc, ghr);
            let tag = bank.tag(pc, ghr);
            let e = bank.table[idx];
            if e.valid && e.tag == tag {
                provider = Some(i);
                target = Some(e.target);
            }
        }
        IttagePrediction { target, provider }
    }

    /// Trains the provider entry (or allocates a longer-history one on a miss).
    pub fn update(&mut self, pc: u64, ghr: &GlobalHistory, actual_target: u64, pred: IttagePrediction) {
        let mispredicted = pred.target != Some(actual_target);
        match pred.provider {
            Some(i) if !mispredicted => {
                let bank = &mut self.banks[i];
                let idx = bank.index(pc, ghr);
                bank.table[idx].useful = bank.table[idx].useful.saturating_add(1).min(3);
            }
            _ => {
                if pred.provider.is_none() {
                    self.base[Self::base_index(pc)] = Some(actual_target);
                }
                if mispredicted {
                    self.allocate(pc, ghr, pred.provider, actual_target);
                }
            }
        }
    }

    fn allocate(&mut self, pc: u64, ghr: &GlobalHistory, provider: Option<usize>, target: u64) {
        let start = provider.map_or(0, |p| p + 1);
        for i in start..self.banks.len() {
            let bank = &mut self.banks[i];
            let idx = bank.index(pc, ghr);
            let tag = bank.tag(pc, ghr);
            let e = &mut bank.table[idx];
            if !e.valid || e.useful == 0 {
                *e = Entry {
                    tag,
                    target,
                    useful: 0,
                    valid: true,
                };
                break;
            }
            e.useful -= 1;
        }
    }
}
