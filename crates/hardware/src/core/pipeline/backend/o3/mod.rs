//! Out-of-order backend: unified reservation-station issue, in-order commit.
//!
//! Structurally this mirrors the in-order backend (Issue -> Execute ->
//! Memory1 -> Memory2 -> Writeback -> Commit, driven in reverse so every
//! stage drains before new work enters it) and reuses its execute stage and
//! all four shared stages unchanged — dispatch to a functional unit and
//! retirement from the ROB head don't care which scheduler fed them.
//! The only thing that differs is issue: [`O3IssueUnit`] wakes up and
//! selects any ready entry instead of only the head of a FIFO, so an
//! instruction blocked on a long-latency producer no longer stalls
//! independent work behind it.

pub mod issue;

use crate::config::Config;
use crate::core::Cpu;
use crate::core::pipeline::backend::inorder::execute;
use crate::core::pipeline::backend::shared::{commit, memory1, memory2, writeback};
use crate::core::pipeline::engine::ExecutionEngine;
use crate::core::pipeline::latches::{ExMem1Entry, Mem1Mem2Entry, Mem2WbEntry, RenameIssueEntry};
use crate::core::pipeline::prf::{PhysReg, RenameState};
use crate::core::pipeline::rob::{Rob, RobState, RobTag};
use crate::core::pipeline::scoreboard::Scoreboard;
use crate::core::pipeline::store_buffer::StoreBuffer;

use self::issue::O3IssueUnit;

/// Out-of-order execution engine.
pub struct O3Engine {
    /// Reorder buffer — commit is always in program order, regardless of
    /// the order instructions actually execute in.
    pub rob: Rob,
    /// Store buffer — resolved stores still drain to memory in commit order.
    pub store_buffer: StoreBuffer,
    /// Tag-based register scoreboard, shared with rename for wakeup tags.
    pub scoreboard: Scoreboard,
    /// Reservation-station pool with age-ordered select.
    pub issuer: O3IssueUnit,
    /// Pipeline width (max instructions selected/executed per cycle).
    pub width: usize,
    /// Execute -> Memory1 latch.
    pub execute_mem1: Vec<ExMem1Entry>,
    /// Memory1 -> Memory2 latch.
    pub mem1_mem2: Vec<Mem1Mem2Entry>,
    /// Memory2 -> Writeback latch.
    pub mem2_wb: Vec<Mem2WbEntry>,
    /// Memory1 stall counter (D-TLB / D-cache latency).
    pub mem1_stall: u64,
    /// Physical-register rename map and free list.
    pub rename: RenameState,
    /// ROB tag of the unique instruction (fence/fence.i/ecall/ebreak/csr)
    /// currently draining the pipeline, if any. While set, nothing younger
    /// is admitted from rename.
    pub pending_unique: Option<RobTag>,
}

impl O3Engine {
    /// Creates a new out-of-order engine from config.
    pub fn new(config: &Config) -> Self {
        Self {
            rob: Rob::new(config.pipeline.rob_size),
            store_buffer: StoreBuffer::new(config.pipeline.store_buffer_size),
            scoreboard: Scoreboard::new(),
            issuer: O3IssueUnit::new(config.pipeline.rob_size),
            width: config.pipeline.width,
            execute_mem1: Vec::with_capacity(config.pipeline.width),
            mem1_mem2: Vec::with_capacity(config.pipeline.width),
            mem2_wb: Vec::with_capacity(config.pipeline.width),
            mem1_stall: 0,
            rename: RenameState::new(config.pipeline.rob_size),
            pending_unique: None,
        }
    }
}

impl ExecutionEngine for O3Engine {
    fn tick(&mut self, cpu: &mut Cpu, rename_output: &mut Vec<RenameIssueEntry>) {
        // Backend stages run in reverse order (drain from commit to issue).

        let rename = &mut self.rename;
        let pending_unique = &mut self.pending_unique;
        let trap_event = commit::commit_stage(
            cpu,
            &mut self.rob,
            &mut self.store_buffer,
            &mut self.scoreboard,
            self.width,
            |entry| {
                if *pending_unique == Some(entry.tag) {
                    *pending_unique = None;
                }
                if let (Some(old), Some(new)) = (entry.dest_old_phys, entry.dest_new_phys) {
                    if entry.state == RobState::Faulted {
                        rename.rollback(entry.rd, entry.ctrl.fp_reg_write, old, new);
                    } else {
                        rename.free_committed(old, entry.ctrl.fp_reg_write);
                    }
                }
            },
        );

        if let Some((trap, pc)) = trap_event {
            if cpu.trace {
                eprintln!("BE  * HANDLING TRAP: {:?} at PC {:#x}", trap, pc);
            }
            self.flush(cpu);
            cpu.trap(trap, pc);
            return;
        }

        writeback::writeback_stage(cpu, &mut self.mem2_wb, &mut self.rob);

        memory2::memory2_stage(
            cpu,
            &mut self.mem1_mem2,
            &mut self.mem2_wb,
            &mut self.store_buffer,
            &mut self.rob,
        );

        if self.mem1_stall > 0 {
            self.mem1_stall -= 1;
        } else {
            memory1::memory1_stage(
                cpu,
                &mut self.execute_mem1,
                &mut self.mem1_mem2,
                &mut self.mem1_stall,
            );
        }

        // Same backpressure rule as the in-order backend: don't overwrite
        // execute_mem1 entries M1 hasn't drained yet.
        let backpressured = !self.execute_mem1.is_empty();

        // Select ready entries in age order and execute them. A batch that
        // wakes up tag 5 and 9 while tag 6/7/8 are still waiting on operands
        // is exactly the point: those younger-but-ready instructions no
        // longer sit behind the ones stalling.
        let (results, needs_flush) = if backpressured {
            (Vec::new(), false)
        } else {
            let issued = self.issuer.select(self.width, &self.rob, cpu);
            execute::execute_inorder(cpu, issued, &mut self.rob)
        };
        self.execute_mem1.extend(results);

        if needs_flush {
            rename_output.clear();
            self.mem1_stall = 0;

            // Unlike the in-order backend, older ready-but-unissued entries
            // can still be sitting in the scheduler when a younger branch
            // mispredicts, so only squash entries allocated after it.
            if let Some(last) = self.execute_mem1.last() {
                let keep_tag = last.rob_tag;
                for e in self.rob.valid_entries_after(Some(keep_tag)) {
                    if let (Some(old), Some(new)) = (e.dest_old_phys, e.dest_new_phys) {
                        self.rename.rollback(e.rd, e.ctrl.fp_reg_write, old, new);
                    }
                    if self.pending_unique == Some(e.tag) {
                        self.pending_unique = None;
                    }
                }
                self.rob.flush_after(keep_tag);
                self.store_buffer.flush_after(keep_tag);
                self.issuer.flush_after(keep_tag);
            }
            self.scoreboard.rebuild_from_rob(&self.rob);
        }

        if !backpressured {
            let rename_entries = std::mem::take(rename_output);
            if !rename_entries.is_empty() {
                self.issuer.dispatch(rename_entries);
            }
        }
    }

    fn can_accept(&self) -> usize {
        // A pending unique instruction must see an empty pipeline behind it
        // before anything younger is let in, so block rename outright.
        if self.pending_unique.is_some() {
            return 0;
        }
        let rob_free = self.rob.free_slots();
        let sb_free = self.store_buffer.free_slots();
        let issue_free = self.issuer.available_slots();
        let phys_free = self.rename.free_gpr_count().min(self.rename.free_fpr_count());
        rob_free.min(sb_free).min(issue_free).min(phys_free).min(self.width)
    }

    fn flush(&mut self, _cpu: &mut Cpu) {
        // Only entries still sitting in the ROB are speculative at this
        // point — anything already retired (including the faulting entry
        // itself, if this flush follows a trap) was handled by
        // `commit_stage`'s `on_retire` hook before `flush` ever runs.
        for e in self.rob.valid_entries_after(None) {
            if let (Some(old), Some(new)) = (e.dest_old_phys, e.dest_new_phys) {
                self.rename.rollback(e.rd, e.ctrl.fp_reg_write, old, new);
            }
        }
        self.pending_unique = None;
        self.rob.flush_all();
        self.store_buffer.flush_speculative();
        self.scoreboard.flush();
        self.issuer.flush();
        self.execute_mem1.clear();
        self.mem1_mem2.clear();
        self.mem2_wb.clear();
        self.mem1_stall = 0;
    }

    fn uses_phys_rename(&self) -> bool {
        true
    }

    fn rename_dest_phys(&mut self, reg: usize, is_fp: bool) -> Option<(PhysReg, PhysReg)> {
        self.rename.rename_dest(reg, is_fp)
    }

    fn ready_for_unique(&self) -> bool {
        self.rob.is_empty() && self.issuer.is_empty()
    }

    fn set_pending_unique(&mut self, tag: RobTag) {
        self.pending_unique = Some(tag);
    }

    fn read_csr_speculative(&self, cpu: &crate::core::Cpu, addr: u32) -> u64 {
        // TODO: scan ROB for an in-flight CsrUpdate with a matching addr
        // once speculative CSR reads need to observe not-yet-committed writes.
        cpu.csr_read(addr)
    }

    fn rob(&self) -> &Rob {
        &self.rob
    }

    fn rob_mut(&mut self) -> &mut Rob {
        &mut self.rob
    }

    fn store_buffer(&self) -> &StoreBuffer {
        &self.store_buffer
    }

    fn store_buffer_mut(&mut self) -> &mut StoreBuffer {
        &mut self.store_buffer
    }

    fn scoreboard(&self) -> &Scoreboard {
        &self.scoreboard
    }

    fn scoreboard_mut(&mut self) -> &mut Scoreboard {
        &mut self.scoreboard
    }
}
