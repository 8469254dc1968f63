//! Fetch Target Buffer (FTB): stage-2 table mapping a fetch-package start PC to its
//! shape (length, trailing jump class/target, and the branch slots within it).
//!
//! Generalizes the direct-mapped [`super::btb::Btb`] pattern to the richer per-entry
//! fields a fetch package needs (`ft_len`, jump classification, branch entries).

/// Classification of the control-flow instruction (if any) ending a fetch package.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JumpClass {
    /// No control-flow instruction in this package (hit the byte limit).
    None,
    /// Direct, unconditional jump (`jal`).
    Jal,
    /// Indirect jump (`jalr`), not recognized as a call or return.
    Jalr,
    /// A call (`jal`/`jalr` writing the link register).
    Call,
    /// A return (`jalr x0, ra, 0` shape).
    Ret,
}

/// One predicted conditional-branch slot within a fetch package.
#[derive(Clone, Copy, Debug)]
pub struct BranchSlot {
    /// Byte offset of the branch instruction from the package's start PC.
    pub offset: u16,
    /// Saturating taken/not-taken counter (2-bit semantics, stored widened).
    pub taken_ctr: i8,
    /// Byte offset of the branch's target from the package's start PC (may be negative
    /// in two's-complement terms but is stored as an absolute target for simplicity).
    pub target: u64,
}

#[derive(Clone)]
struct FtbEntry {
    tag: u64,
    ft_len: u64,
    jump_class: JumpClass,
    jump_target: u64,
    branches: Vec<BranchSlot>,
    valid: bool,
}

impl Default for FtbEntry {
    fn default() -> Self {
        Self {
            tag: 0,
            ft_len: 0,
            jump_class: JumpClass::None,
            jump_target: 0,
            branches: Vec::new(),
            valid: false,
        }
    }
}

/// Stage-2 Fetch Target Buffer.
pub struct Ftb {
    table: Vec<FtbEntry>,
    size: usize,
    /// Maximum number of branch slots tracked per fetch package.
    max_branches: usize,
}

/// The prediction an FTB lookup yields for a fetch package.
#[derive(Clone, Debug)]
pub struct FtbPrediction {
    /// Length in bytes of the predicted fetch package.
    pub ft_len: u64,
    /// Classification of the package's trailing control-flow instruction.
    pub jump_class: JumpClass,
    /// Target of that trailing jump, if statically known (direct jal/call).
    pub jump_target: u64,
    /// Conditional-branch slots observed within the package.
    pub branches: Vec<BranchSlot>,
}

impl Ftb {
    /// Creates an FTB with `size` entries and up to `max_branches` tracked per package.
    #[must_use]
    pub fn new(size: usize, max_branches: usize) -> Self {
        Self {
            table: vec![FtbEntry::default(); size],
            size,
            max_branches,
        }
    }

    fn index(&self, pc: u64) -> usize {
        ((pc >> 1) as usize) & (self.size - 1)
    }

    /// Looks up the predicted shape of the fetch package starting at `pc`.
    #[must_use]
    pub fn lookup(&self, pc: u64) -> Option<FtbPrediction> {
        let idx = self.index(pc);
        let e = &self.table[idx];
        if e.valid && e.tag == pc {
            Some(FtbPrediction {
                ft_len: e.ft_len,
                jump_class: e.jump_class,
                jump_target: e.jump_target,
                branches: e.branches.clone(),
            })
        } else {
            None
        }
    }

    /// Rewrites the entry for `pc` when the observed fetch-package shape disagrees.
    pub fn update(
        &mut self,
        pc: u64,
        ft_len: u64,
        jump_class: JumpClass,
        jump_target: u64,
        mut branches: Vec<BranchSlot>,
    ) {
        branches.truncate(self.max_branches);
        let idx = self.index(pc);
        self.table[idx] = FtbEntry {
            tag: pc,
            ft_len,
            jump_class,
            jump_target,
            branches,
            valid: true,
        };
    }
}
