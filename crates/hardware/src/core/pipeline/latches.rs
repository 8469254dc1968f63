//! Pipeline latch structures for inter-stage communication.
//!
//! This module defines the buffers that connect the stages of the shared frontend
//! (Fetch1 -> Fetch2 -> Decode -> Rename) and the shared backend tail
//! (Execute -> Memory1 -> Memory2 -> Writeback -> Commit). Both the in-order and
//! out-of-order backends consume and produce these same entry types, which is what
//! lets `Frontend<E>` and `backend::shared` work unmodified across backends.

use crate::common::error::{ExceptionStage, Trap};
use crate::core::pipeline::rob::RobTag;
use crate::core::pipeline::signals::ControlSignals;

/// Entry in the Fetch1 -> Fetch2 latch.
///
/// Carries the physically-translated fetch address and branch prediction
/// metadata computed from a peek at the raw instruction bits; Fetch2 does the
/// actual cache read and RVC expansion.
#[derive(Clone, Default, Debug)]
pub struct Fetch1Fetch2Entry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// Physical address of the instruction (post I-TLB translation).
    pub paddr: u64,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Trap that occurred during fetch (misalignment, I-TLB fault), if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Global history register snapshot taken before speculating, for repair
    /// on misprediction.
    pub ghr_snapshot: u64,
}

/// Entry in the Fetch2 -> Decode latch.
///
/// Contains the raw instruction bits (already RVC-expanded) read from the
/// I-cache, still carrying prediction metadata and any upstream trap.
#[derive(Clone, Default, Debug)]
pub struct IfIdEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding (expanded if originally compressed).
    pub inst: u32,
    /// Size of the instruction in bytes (2 for compressed, 4 for standard).
    pub inst_size: u64,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Trap carried forward from Fetch1/Fetch2, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Global history register snapshot, carried through for branch repair.
    pub ghr_snapshot: u64,
}

/// Entry in the Decode -> Rename latch.
///
/// Contains decoded instruction information: register indices, immediate
/// value, and the control signals that drive every later stage.
#[derive(Clone, Default, Debug)]
pub struct IdExEntry {
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// First source register index (rs1).
    pub rs1: usize,
    /// Second source register index (rs2).
    pub rs2: usize,
    /// Third source register index (rs3, FMA instructions only).
    pub rs3: usize,
    /// Destination register index (rd).
    pub rd: usize,
    /// Sign-extended immediate value.
    pub imm: i64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap carried forward from fetch, or raised during decode.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Global history register snapshot, carried through for branch repair.
    pub ghr_snapshot: u64,
}

/// Entry in the Rename -> Issue latch, tagged with its ROB slot.
///
/// Operand values (`rv1`/`rv2`/`rv3`) are placeholders at rename time; they
/// are filled in by the issue stage (in-order FIFO read, or O3 wakeup/select)
/// once the operands are actually ready.
#[derive(Clone, Default, Debug)]
pub struct RenameIssueEntry {
    /// ROB slot allocated to this instruction.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// First source register index (rs1).
    pub rs1: usize,
    /// Second source register index (rs2).
    pub rs2: usize,
    /// Third source register index (rs3, FMA instructions only).
    pub rs3: usize,
    /// Destination register index (rd).
    pub rd: usize,
    /// Sign-extended immediate value.
    pub imm: i64,
    /// Value of rs1 (filled at issue).
    pub rv1: u64,
    /// Value of rs2 (filled at issue).
    pub rv2: u64,
    /// Value of rs3 (filled at issue).
    pub rv3: u64,
    /// ROB tag of the in-flight producer of rs1 at rename time, if any.
    pub rs1_tag: Option<RobTag>,
    /// ROB tag of the in-flight producer of rs2 at rename time, if any.
    pub rs2_tag: Option<RobTag>,
    /// ROB tag of the in-flight producer of rs3 at rename time, if any.
    pub rs3_tag: Option<RobTag>,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap carried forward from an earlier stage, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
    /// Whether the branch predictor predicted this instruction as taken.
    pub pred_taken: bool,
    /// Predicted target address for branch/jump instructions.
    pub pred_target: u64,
    /// Global history register snapshot, used to repair on misprediction.
    pub ghr_snapshot: u64,
}

/// Entry in the Execute -> Memory1 latch.
#[derive(Clone, Default, Debug)]
pub struct ExMem1Entry {
    /// ROB slot this result belongs to.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU computation result, or the virtual address for memory operations.
    pub alu: u64,
    /// Data to be stored (for store/AMO instructions).
    pub store_data: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap raised during execute, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
}

/// Entry in the Memory1 -> Memory2 latch.
#[derive(Clone, Default, Debug)]
pub struct Mem1Mem2Entry {
    /// ROB slot this result belongs to.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU computation result (for non-memory instructions).
    pub alu: u64,
    /// Virtual address of the memory operation.
    pub vaddr: u64,
    /// Physical address of the memory operation, after translation.
    pub paddr: u64,
    /// Data to be stored (for store/AMO instructions).
    pub store_data: u64,
    /// Control signals for downstream pipeline stages.
    pub ctrl: ControlSignals,
    /// Trap raised during translation, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
}

/// Entry in the Memory2 -> Writeback latch.
#[derive(Clone, Default, Debug)]
pub struct Mem2WbEntry {
    /// ROB slot this result belongs to.
    pub rob_tag: RobTag,
    /// Program counter of the instruction.
    pub pc: u64,
    /// 32-bit instruction encoding.
    pub inst: u32,
    /// Size of the instruction in bytes.
    pub inst_size: u64,
    /// Destination register index (rd).
    pub rd: usize,
    /// ALU computation result (for non-load instructions).
    pub alu: u64,
    /// Data loaded from memory (for load/AMO/LR instructions).
    pub load_data: u64,
    /// Control signals for the writeback stage.
    pub ctrl: ControlSignals,
    /// Trap raised during the memory stage, if any.
    pub trap: Option<Trap>,
    /// Pipeline stage at which the trap was raised.
    pub exception_stage: Option<ExceptionStage>,
}
