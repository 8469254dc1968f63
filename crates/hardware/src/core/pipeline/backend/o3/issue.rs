//! Out-of-order issue unit: three opcode-family dispatch queues with
//! tag-based wakeup and age-ordered select within each.
//!
//! Unlike the in-order FIFO, entries are not required to issue in arrival
//! order — any entry whose operands are ready may issue, so an instruction
//! stalled behind a long-latency producer no longer blocks independent work
//! behind it. Among the entries that are ready in a given cycle, the oldest
//! (by ROB tag) are preferred so that, combined with in-order commit, the
//! engine never needlessly holds back a ready older instruction in favor of
//! a ready younger one. Dispatch fans out by opcode family into `dq_int`,
//! `dq_mem`, and `dq_fp` rather than a single pool, matching the separate
//! reservation stations each functional-unit family would occupy.

use crate::core::Cpu;
use crate::core::pipeline::backend::shared::operand::read_operand_by_tag;
use crate::core::pipeline::latches::RenameIssueEntry;
use crate::core::pipeline::rob::{Rob, RobTag};
use crate::core::pipeline::signals::ControlSignals;

/// Which family-specific dispatch queue an instruction belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum DispatchQueue {
    Int,
    Mem,
    Fp,
}

/// AMO/load/store/fence go to `dq_mem`; fused-multiply-add and FP ops whose
/// first source is a float register go to `dq_fp`; everything else is int.
fn classify(ctrl: &ControlSignals) -> DispatchQueue {
    if ctrl.mem_read || ctrl.mem_write || ctrl.is_fence {
        DispatchQueue::Mem
    } else if ctrl.rs1_fp {
        DispatchQueue::Fp
    } else {
        DispatchQueue::Int
    }
}

/// Out-of-order scheduler: one reservation-station pool per opcode family.
pub struct O3IssueUnit {
    dq_int: Vec<RenameIssueEntry>,
    dq_mem: Vec<RenameIssueEntry>,
    dq_fp: Vec<RenameIssueEntry>,
    capacity: usize,
}

impl O3IssueUnit {
    /// Creates a scheduler with `capacity` entries shared across all three
    /// queues.
    ///
    /// Like the in-order issue queue, capacity must cover the full ROB:
    /// while the backend stalls, rename keeps allocating ROB entries that
    /// queue up in `rename_output`, and all of them are dispatched at once
    /// once the stall clears.
    pub fn new(capacity: usize) -> Self {
        Self {
            dq_int: Vec::new(),
            dq_mem: Vec::new(),
            dq_fp: Vec::new(),
            capacity,
        }
    }

    /// Accepts dispatched instructions from rename, routing each into its
    /// opcode-family queue.
    pub fn dispatch(&mut self, entries: Vec<RenameIssueEntry>) {
        for entry in entries {
            if self.len() >= self.capacity {
                continue;
            }
            self.queue_mut(classify(&entry.ctrl)).push(entry);
        }
    }

    /// Selects up to `width` ready entries across all three queues,
    /// oldest-first, with operands filled in from the register file or ROB
    /// bypass.
    pub fn select(&mut self, width: usize, rob: &Rob, cpu: &Cpu) -> Vec<RenameIssueEntry> {
        // (queue, index, rv1, rv2, rv3) for every ready entry, across queues.
        let mut ready: Vec<(DispatchQueue, usize, u64, u64, u64)> = Vec::new();

        for q in [DispatchQueue::Int, DispatchQueue::Mem, DispatchQueue::Fp] {
            for (i, entry) in self.queue(q).iter().enumerate() {
                if entry.trap.is_some() {
                    ready.push((q, i, 0, 0, 0));
                    continue;
                }

                let rv1 = read_operand_by_tag(entry.rs1, entry.ctrl.rs1_fp, entry.rs1_tag, rob, cpu);
                let rv2 = read_operand_by_tag(entry.rs2, entry.ctrl.rs2_fp, entry.rs2_tag, rob, cpu);
                let rv3 = if entry.ctrl.rs3_fp {
                    read_operand_by_tag(entry.rs3, true, entry.rs3_tag, rob, cpu)
                } else {
                    Some(0)
                };

                if let (Some(v1), Some(v2), Some(v3)) = (rv1, rv2, rv3) {
                    ready.push((q, i, v1, v2, v3));
                }
            }
        }

        ready.sort_by(|a, b| {
            age_order(self.queue(a.0)[a.1].rob_tag, self.queue(b.0)[b.1].rob_tag)
        });
        ready.truncate(width);

        // Remove selected entries highest-index-first (within each queue)
        // so earlier indices in the same queue stay valid.
        let mut by_index = ready;
        by_index.sort_by(|a, b| b.1.cmp(&a.1));

        let mut selected = Vec::with_capacity(by_index.len());
        for (q, idx, v1, v2, v3) in by_index {
            let mut issued = self.queue_mut(q).remove(idx);
            issued.rv1 = v1;
            issued.rv2 = v2;
            issued.rv3 = v3;
            selected.push(issued);
        }
        // Restore oldest-first order for the execute stage.
        selected.sort_by(|a, b| age_order(a.rob_tag, b.rob_tag));
        selected
    }

    /// How many slots are free for dispatch, across all three queues?
    pub fn available_slots(&self) -> usize {
        self.capacity - self.len()
    }

    /// True if no entry is waiting in any queue — the condition a unique
    /// instruction needs before it may itself dispatch.
    pub fn is_empty(&self) -> bool {
        self.dq_int.is_empty() && self.dq_mem.is_empty() && self.dq_fp.is_empty()
    }

    /// Removes entries allocated after `keep_tag` (e.g. on a misprediction).
    /// Entries at or before `keep_tag` remain, still waiting to issue.
    pub fn flush_after(&mut self, keep_tag: RobTag) {
        self.dq_int.retain(|e| e.rob_tag.is_at_or_before(keep_tag));
        self.dq_mem.retain(|e| e.rob_tag.is_at_or_before(keep_tag));
        self.dq_fp.retain(|e| e.rob_tag.is_at_or_before(keep_tag));
    }

    /// Flushes every entry.
    pub fn flush(&mut self) {
        self.dq_int.clear();
        self.dq_mem.clear();
        self.dq_fp.clear();
    }

    fn len(&self) -> usize {
        self.dq_int.len() + self.dq_mem.len() + self.dq_fp.len()
    }

    fn queue(&self, q: DispatchQueue) -> &Vec<RenameIssueEntry> {
        match q {
            DispatchQueue::Int => &self.dq_int,
            DispatchQueue::Mem => &self.dq_mem,
            DispatchQueue::Fp => &self.dq_fp,
        }
    }

    fn queue_mut(&mut self, q: DispatchQueue) -> &mut Vec<RenameIssueEntry> {
        match q {
            DispatchQueue::Int => &mut self.dq_int,
            DispatchQueue::Mem => &mut self.dq_mem,
            DispatchQueue::Fp => &mut self.dq_fp,
        }
    }
}

/// Orders two ROB tags oldest-first, tolerating wraparound.
fn age_order(a: RobTag, b: RobTag) -> std::cmp::Ordering {
    if a == b {
        std::cmp::Ordering::Equal
    } else if a.is_at_or_before(b) {
        std::cmp::Ordering::Less
    } else {
        std::cmp::Ordering::Greater
    }
}
