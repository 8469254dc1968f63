//! Three-stage composite branch predictor: S1 uBTB, S2 FTB+TAGE-SC+ITTAGE+RAS, S3
//! cross-check/redirect.
//!
//! This replaces the teacher's selectable-family `BranchPredictorWrapper` with the
//! single fixed composite pipeline the specification requires; the family-selector
//! config knobs (`BranchPredictor` enum, `GShare`/`Perceptron`/`Tournament`) are no
//! longer consulted by this predictor (see `DESIGN.md`).

use super::ftb::{Ftb, FtbPrediction, JumpClass};
use super::ghr::GlobalHistory;
use super::ittage::{Ittage, IttagePrediction};
use super::ras::Ras;
use super::tage::{Tage, TagePrediction};
use crate::config::Config;

/// Default byte length of a fetch package when no FTB entry is known yet.
const DEFAULT_FT_LEN: u64 = 32;

/// One resolved branch slot inside a fetch package, as the outcome known at fetch time.
#[derive(Clone, Copy, Debug)]
pub struct BranchOutcome {
    /// Byte offset from the package's start PC.
    pub offset: u16,
    /// Predicted taken/not-taken.
    pub predicted_taken: bool,
}

/// The prediction produced for one fetch package (FTQ entry), per the data model's
/// `(start_pc, end_pc, branches, jump_info, jump_target, ghr_snapshot, ras_snapshot)`.
#[derive(Clone, Debug)]
pub struct FetchPackagePrediction {
    /// First byte address covered by this package.
    pub start_pc: u64,
    /// One past the last byte address covered by this package.
    pub end_pc: u64,
    /// Conditional-branch outcomes predicted within the package.
    pub branches: Vec<BranchOutcome>,
    /// Classification of the package's trailing control-flow instruction.
    pub jump_class: JumpClass,
    /// Predicted PC of the next fetch package.
    pub next_pc: u64,
    /// Global-history snapshot captured before this package's branches update it.
    pub ghr_snapshot: [bool; super::ghr::MAX_HISTORY],
    /// Whether S3 found S1 and S2 disagreeing and had to redirect.
    pub s1_s2_mismatch: bool,
}

/// The fixed three-stage branch predictor.
pub struct Bpu {
    ubtb: super::ubtb::Ubtb,
    ftb: Ftb,
    tage: Tage,
    ittage: Ittage,
    ras: Ras,
    ghr: GlobalHistory,
}

impl Bpu {
    /// Builds the composite predictor from configuration (BTB/RAS sizes; TAGE history
    /// lengths default to the spec's `[8, 13, 32, 119]` via `config::defaults` unless
    /// overridden).
    #[must_use]
    pub fn new(config: &Config) -> Self {
        let btb_size = config.pipeline.btb_size.next_power_of_two();
        let ras_size = config.pipeline.ras_size;
        let tage_cfg = &config.pipeline.tage;
        Self {
            ubtb: super::ubtb::Ubtb::new(btb_size.min(64).max(2)),
            ftb: Ftb::new(btb_size, 4),
            tage: Tage::new(
                tage_cfg.table_size,
                &tage_cfg.history_lengths,
                &tage_cfg.tag_widths,
                tage_cfg.reset_interval,
            ),
            ittage: Ittage::new(tage_cfg.table_size.min(512)),
            ras: Ras::new(ras_size),
            ghr: GlobalHistory::new(),
        }
    }

    /// Stage 1: fast same-cycle redirect using only the uBTB.
    #[must_use]
    pub fn predict_s1(&self, pc: u64) -> u64 {
        self.ubtb.predict(pc, DEFAULT_FT_LEN)
    }

    /// Stage 2: full FTB+TAGE-SC+ITTAGE+RAS prediction for the fetch package at `pc`.
    pub fn predict_s2(&mut self, pc: u64) -> FetchPackagePrediction {
        let ghr_snapshot = self.ghr.snapshot();
        let ftb_hit = self.ftb.lookup(pc);
        let (ft_len, jump_class, mut jump_target, slots) = match &ftb_hit {
            Some(p) => (p.ft_len, p.jump_class, p.jump_target, p.branches.clone()),
            None => (DEFAULT_FT_LEN, JumpClass::None, 0, Vec::new()),
        };

        let mut branches = Vec::with_capacity(slots.len());
        for slot in &slots {
            let branch_pc = pc + u64::from(slot.offset);
            let pred = self.tage.predict(branch_pc, &self.ghr);
            self.ghr.push(pred.taken);
            branches.push(BranchOutcome {
                offset: slot.offset,
                predicted_taken: pred.taken,
            });
            if pred.taken {
                jump_target = slot.target;
                return self.finish_s2(pc, pc + u64::from(slot.offset) + 2, branches, JumpClass::None, jump_target, ghr_snapshot);
            }
        }

        let next_pc = match jump_class {
            JumpClass::None => pc + ft_len,
            JumpClass::Jal | JumpClass::Call => {
                if jump_class == JumpClass::Call {
                    self.ras.speculative_push(pc + ft_len);
                }
                jump_target
            }
            JumpClass::Jalr => {
                let p = self.ittage.predict(pc, &self.ghr);
                p.target.unwrap_or(pc + ft_len)
            }
            JumpClass::Ret => self.ras.speculative_pop().unwrap_or(0),
        };

        self.finish_s2(pc, pc + ft_len, branches, jump_class, next_pc, ghr_snapshot)
    }

    fn finish_s2(
        &self,
        start_pc: u64,
        end_pc: u64,
        branches: Vec<BranchOutcome>,
        jump_class: JumpClass,
        next_pc: u64,
        ghr_snapshot: [bool; super::ghr::MAX_HISTORY],
    ) -> FetchPackagePrediction {
        FetchPackagePrediction {
            start_pc,
            end_pc,
            branches,
            jump_class,
            next_pc,
            ghr_snapshot,
            s1_s2_mismatch: false,
        }
    }

    /// Stage 3: cross-checks S1's fast guess against the authoritative S2 result.
    /// Returns `Some(corrected_pc)` if a redirect is required (and flushes S1/S2
    /// is the caller's responsibility, mirroring how commit issues `jmp_redirect`).
    #[must_use]
    pub fn cross_check(&self, s1_next_pc: u64, s2: &FetchPackagePrediction) -> Option<u64> {
        if s1_next_pc == s2.next_pc {
            None
        } else {
            Some(s2.next_pc)
        }
    }

    /// Applies the resolved outcome of one fetch package at commit: retrains the
    /// FTB (if the observed shape disagreed), TAGE/SC, ITTAGE, and the RAS.
    #[allow(clippy::too_many_arguments)]
    pub fn commit_update(
        &mut self,
        package: &FetchPackagePrediction,
        actual_branches: &[(u16, bool, u64)], // (offset, taken, target)
        actual_jump_class: JumpClass,
        actual_jump_target: u64,
        actual_end_pc: u64,
    ) {
        let mut ghr = GlobalHistory::new();
        ghr.restore(package.ghr_snapshot);

        let mut slots = Vec::with_capacity(actual_branches.len());
        for &(offset, taken, target) in actual_branches {
            let branch_pc = package.start_pc + u64::from(offset);
            let pred = self.tage.predict(branch_pc, &ghr);
            self.tage.update(branch_pc, &ghr, taken, pred);
            ghr.push(taken);
            slots.push(super::ftb::BranchSlot {
                offset,
                taken_ctr: i8::from(taken),
                target,
            });
        }

        if actual_jump_class == JumpClass::Jalr {
            let pred = self.ittage.predict(package.start_pc, &ghr);
            self.ittage.update(package.start_pc, &ghr, actual_jump_target, pred);
        }

        match actual_jump_class {
            JumpClass::Call => self.ras.commit_call(actual_end_pc),
            JumpClass::Ret => {
                self.ras.commit_return();
            }
            _ => {}
        }

        let observed_shape_mismatch = package.jump_class != actual_jump_class
            || package.end_pc != actual_end_pc
            || slots.len() != package.branches.len();
        if observed_shape_mismatch {
            self.ftb.update(
                package.start_pc,
                actual_end_pc - package.start_pc,
                actual_jump_class,
                actual_jump_target,
                slots,
            );
        }

        self.ghr = ghr;
    }

    /// Trains the uBTB for same-cycle S1 redirects; called alongside `commit_update`.
    pub fn train_ubtb(&mut self, pc: u64, taken: bool, target: u64) {
        self.ubtb.update(pc, taken, target);
    }

    /// Discards all speculative state younger than a redirect: restores the
    /// global-history register and rewinds the RAS's speculative copy.
    pub fn recover(&mut self, ghr_snapshot: [bool; super::ghr::MAX_HISTORY]) {
        self.ghr.restore(ghr_snapshot);
        self.ras.recover_from_committed();
    }
}

/// Compatibility surface for the legacy single-instruction-at-a-time in-order
/// frontend/backend (`core::pipeline::backend::inorder`), which predicts and
/// updates one branch at a time rather than a whole fetch package. The
/// out-of-order frontend uses [`Bpu::predict_s2`]/[`Bpu::commit_update`]
/// directly; these methods exist only so the in-order engine — kept in the
/// tree as an alternate `BackendType` — keeps working against the same BPU.
impl Bpu {
    /// Packs the low 64 bits of the global-history register for the in-order
    /// engine's per-instruction snapshot/repair bookkeeping.
    #[must_use]
    pub fn snapshot_history(&self) -> u64 {
        let bits = self.ghr.snapshot();
        let mut packed = 0u64;
        for (i, b) in bits.iter().take(64).enumerate() {
            if *b {
                packed |= 1 << i;
            }
        }
        packed
    }

    /// Restores the low 64 bits of history from a packed snapshot; bits beyond
    /// 64 are left at their current value (best-effort, matching the legacy
    /// engine's narrower history window).
    pub fn repair_history(&mut self, packed: u64) {
        let mut bits = self.ghr.snapshot();
        for i in 0..64 {
            bits[i] = (packed >> i) & 1 != 0;
        }
        self.ghr.restore(bits);
        self.ras.recover_from_committed();
    }

    /// Single-branch prediction for the in-order fetch stage: direction from
    /// TAGE, target from the FTB's first branch slot for this PC (if any).
    #[must_use]
    pub fn predict_branch(&self, pc: u64) -> (bool, Option<u64>) {
        let pred = self.tage.predict(pc, &self.ghr);
        let target = self
            .ftb
            .lookup(pc)
            .and_then(|p| p.branches.first().map(|b| b.target));
        (pred.taken, target)
    }

    /// Speculatively advances history for a single predicted branch (in-order fetch).
    pub fn speculate(&mut self, _pc: u64, taken: bool) {
        self.ghr.push(taken);
    }

    /// Direct/indirect jump target prediction from the FTB (in-order fetch).
    #[must_use]
    pub fn predict_btb(&self, pc: u64) -> Option<u64> {
        self.ftb.lookup(pc).and_then(|p| match p.jump_class {
            JumpClass::None => None,
            _ => Some(p.jump_target),
        })
    }

    /// Return-address prediction for the in-order fetch stage (peek, no pop).
    #[must_use]
    pub fn predict_return(&self) -> Option<u64> {
        self.ras.predict_return()
    }

    /// Single-branch training: updates TAGE and, when the branch was taken,
    /// the FTB's first slot/target for this PC.
    pub fn update_branch(&mut self, pc: u64, taken: bool, target: Option<u64>) {
        let pred = self.tage.predict(pc, &self.ghr);
        self.tage.update(pc, &self.ghr, taken, pred);
        if taken {
            if let Some(t) = target {
                self.ftb.update(
                    pc,
                    DEFAULT_FT_LEN,
                    JumpClass::Jal,
                    t,
                    vec![super::ftb::BranchSlot {
                        offset: 0,
                        taken_ctr: 1,
                        target: t,
                    }],
                );
            }
        }
    }

    /// Records a call for RAS prediction (in-order engine: speculative and
    /// committed copies advance together since there's no speculation to undo
    /// beyond a single in-flight instruction).
    pub fn on_call(&mut self, _pc: u64, ret_addr: u64, _target: u64) {
        self.ras.speculative_push(ret_addr);
        self.ras.commit_call(ret_addr);
    }

    /// Records a return for RAS prediction (in-order engine).
    pub fn on_return(&mut self) {
        self.ras.speculative_pop();
        self.ras.commit_return();
    }
}
