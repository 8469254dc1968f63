//! Decode Stage: opcode classification into control signals.
//!
//! Turns the raw instruction bits carried in `IfIdEntry` into the register
//! indices, immediate, and `ControlSignals` that every later stage reads.
//! Field extraction (opcode/rd/rs1/rs2/funct3/funct7/imm) is delegated to
//! `isa::decode`; this stage owns the opcode -> signal mapping.

use crate::common::{ExceptionStage, Trap};
use crate::core::pipeline::latches::{IdExEntry, IfIdEntry};
use crate::core::pipeline::signals::{AluOp, AtomicOp, ControlSignals, CsrOp, MemWidth, OpASrc, OpBSrc};
use crate::core::Cpu;
use crate::isa::decode::decode;
use crate::isa::instruction::InstructionBits;
use crate::isa::privileged::opcodes as sys_ops;
use crate::isa::rv64a::{funct3 as a_funct3, funct5 as a_funct5, opcodes as a_opcodes};
use crate::isa::rv64d::funct7 as d_funct7;
use crate::isa::rv64f::{funct3 as f_funct3, funct7 as f_funct7, opcodes as f_opcodes};
use crate::isa::rv64i::{funct3, funct7, opcodes};
use crate::isa::rv64m::{funct3 as m_funct3, opcodes as m_opcodes};

/// Executes the Decode stage: `IfIdEntry` -> `IdExEntry`.
pub fn decode_stage(_cpu: &mut Cpu, input: &mut Vec<IfIdEntry>, output: &mut Vec<IdExEntry>) {
    let entries = std::mem::take(input);
    output.clear();

    for f in entries {
        if let Some(trap) = f.trap {
            output.push(IdExEntry {
                pc: f.pc,
                inst: f.inst,
                inst_size: f.inst_size,
                pred_taken: f.pred_taken,
                pred_target: f.pred_target,
                trap: Some(trap),
                exception_stage: f.exception_stage,
                ghr_snapshot: f.ghr_snapshot,
                ..Default::default()
            });
            break;
        }

        let (ctrl, rs1, rs2, rs3, rd, imm, illegal) = decode_one(f.inst);

        output.push(IdExEntry {
            pc: f.pc,
            inst: f.inst,
            inst_size: f.inst_size,
            rs1,
            rs2,
            rs3,
            rd,
            imm,
            ctrl,
            trap: if illegal {
                Some(Trap::IllegalInstruction(f.inst))
            } else {
                None
            },
            exception_stage: if illegal { Some(ExceptionStage::Decode) } else { None },
            pred_taken: f.pred_taken,
            pred_target: f.pred_target,
            ghr_snapshot: f.ghr_snapshot,
        });
    }
}

/// Decodes a single 32-bit instruction into control signals.
///
/// Returns `(ctrl, rs1, rs2, rs3, rd, imm, illegal)`.
fn decode_one(inst: u32) -> (ControlSignals, usize, usize, usize, usize, i64, bool) {
    let d = decode(inst);
    let mut ctrl = ControlSignals::default();
    let mut illegal = false;
    let rs3 = InstructionBits::rs3(&inst);

    match d.opcode {
        opcodes::OP_LOAD => {
            ctrl.reg_write = true;
            ctrl.mem_read = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
            let (width, signed) = match d.funct3 {
                funct3::LB => (MemWidth::Byte, true),
                funct3::LH => (MemWidth::Half, true),
                funct3::LW => (MemWidth::Word, true),
                funct3::LD => (MemWidth::Double, false),
                funct3::LBU => (MemWidth::Byte, false),
                funct3::LHU => (MemWidth::Half, false),
                funct3::LWU => (MemWidth::Word, false),
                _ => {
                    illegal = true;
                    (MemWidth::Double, false)
                }
            };
            ctrl.width = width;
            ctrl.signed_load = signed;
        }

        f_opcodes::OP_LOAD_FP => {
            ctrl.fp_reg_write = true;
            ctrl.mem_read = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
            ctrl.width = match d.funct3 {
                2 => MemWidth::Word,
                3 => MemWidth::Double,
                _ => {
                    illegal = true;
                    MemWidth::Double
                }
            };
        }

        opcodes::OP_STORE => {
            ctrl.mem_write = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
            ctrl.width = match d.funct3 {
                funct3::SB => MemWidth::Byte,
                funct3::SH => MemWidth::Half,
                funct3::SW => MemWidth::Word,
                funct3::SD => MemWidth::Double,
                _ => {
                    illegal = true;
                    MemWidth::Double
                }
            };
        }

        f_opcodes::OP_STORE_FP => {
            ctrl.mem_write = true;
            ctrl.rs2_fp = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
            ctrl.width = match d.funct3 {
                2 => MemWidth::Word,
                3 => MemWidth::Double,
                _ => {
                    illegal = true;
                    MemWidth::Double
                }
            };
        }

        opcodes::OP_IMM | opcodes::OP_IMM_32 => {
            ctrl.reg_write = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.is_rv32 = d.opcode == opcodes::OP_IMM_32;
            ctrl.alu = match d.funct3 {
                funct3::ADD_SUB => AluOp::Add,
                funct3::SLT => AluOp::Slt,
                funct3::SLTU => AluOp::Sltu,
                funct3::XOR => AluOp::Xor,
                funct3::OR => AluOp::Or,
                funct3::AND => AluOp::And,
                funct3::SLL => AluOp::Sll,
                funct3::SRL_SRA => {
                    // Bit 30 discriminates SRAI from SRLI in both the 5-bit
                    // (*IW, shamt in bits 24-20) and 6-bit (shamt in bits
                    // 25-20) shift-amount encodings — the shift amount itself
                    // never reaches bit 30, so a fixed bit test is safe
                    // regardless of width, unlike comparing all of funct7.
                    if (inst >> 30) & 1 != 0 {
                        AluOp::Sra
                    } else {
                        AluOp::Srl
                    }
                }
                _ => unreachable!(),
            };
        }

        opcodes::OP_AUIPC => {
            ctrl.reg_write = true;
            ctrl.a_src = OpASrc::Pc;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
        }

        opcodes::OP_LUI => {
            ctrl.reg_write = true;
            ctrl.a_src = OpASrc::Zero;
            ctrl.b_src = OpBSrc::Imm;
            ctrl.alu = AluOp::Add;
        }

        opcodes::OP_REG | opcodes::OP_REG_32 => {
            ctrl.reg_write = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Reg2;
            ctrl.is_rv32 = d.opcode == opcodes::OP_REG_32;
            if d.funct7 == m_opcodes::M_EXTENSION {
                ctrl.alu = match d.funct3 {
                    m_funct3::MUL => AluOp::Mul,
                    m_funct3::MULH if !ctrl.is_rv32 => AluOp::Mulh,
                    m_funct3::MULHSU if !ctrl.is_rv32 => AluOp::Mulhsu,
                    m_funct3::MULHU if !ctrl.is_rv32 => AluOp::Mulhu,
                    m_funct3::DIV => AluOp::Div,
                    m_funct3::DIVU => AluOp::Divu,
                    m_funct3::REM => AluOp::Rem,
                    m_funct3::REMU => AluOp::Remu,
                    // MULHW/MULHSUW/MULHUW do not exist — *W only defines
                    // MULW/DIVW/DIVUW/REMW/REMUW, so any other funct3 seen
                    // with is_rv32 set falls through as illegal.
                    _ => {
                        illegal = true;
                        AluOp::Add
                    }
                };
            } else {
                ctrl.alu = match d.funct3 {
                    funct3::ADD_SUB => {
                        if d.funct7 == funct7::SUB {
                            AluOp::Sub
                        } else {
                            AluOp::Add
                        }
                    }
                    funct3::SLL => AluOp::Sll,
                    funct3::SLT => AluOp::Slt,
                    funct3::SLTU => AluOp::Sltu,
                    funct3::XOR => AluOp::Xor,
                    funct3::SRL_SRA => {
                        if d.funct7 == funct7::SRA {
                            AluOp::Sra
                        } else {
                            AluOp::Srl
                        }
                    }
                    funct3::OR => AluOp::Or,
                    funct3::AND => AluOp::And,
                    _ => unreachable!(),
                };
            }
        }

        opcodes::OP_BRANCH => {
            ctrl.branch = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Reg2;
            if !matches!(
                d.funct3,
                funct3::BEQ | funct3::BNE | funct3::BLT | funct3::BGE | funct3::BLTU | funct3::BGEU
            ) {
                illegal = true;
            }
        }

        opcodes::OP_JAL => {
            ctrl.jump = true;
            ctrl.reg_write = true;
        }

        opcodes::OP_JALR => {
            ctrl.jump = true;
            ctrl.reg_write = true;
            ctrl.a_src = OpASrc::Reg1;
            ctrl.b_src = OpBSrc::Imm;
            if d.funct3 != 0 {
                illegal = true;
            }
        }

        opcodes::OP_MISC_MEM => {
            // FENCE is a full-system ordering barrier; in this single-hart
            // in-order backend, program order already provides it, so it is
            // a no-op. FENCE.I additionally needs the cache/frontend flush
            // handled in execute.
            ctrl.is_fence_i = d.funct3 == funct3::FENCE_I;
            ctrl.is_fence = true;
        }

        sys_ops::OP_SYSTEM => {
            ctrl.is_system = true;
            match inst {
                sys_ops::MRET => ctrl.is_mret = true,
                sys_ops::SRET => ctrl.is_sret = true,
                sys_ops::WFI | sys_ops::ECALL | sys_ops::EBREAK => {}
                _ if (inst & 0xFE007FFF) == sys_ops::SFENCE_VMA => {}
                _ => {
                    ctrl.csr_op = match d.funct3 {
                        sys_ops::CSRRW => CsrOp::Rw,
                        sys_ops::CSRRS => CsrOp::Rs,
                        sys_ops::CSRRC => CsrOp::Rc,
                        sys_ops::CSRRWI => CsrOp::Rwi,
                        sys_ops::CSRRSI => CsrOp::Rsi,
                        sys_ops::CSRRCI => CsrOp::Rci,
                        _ => {
                            illegal = true;
                            CsrOp::None
                        }
                    };
                    if ctrl.csr_op != CsrOp::None {
                        ctrl.reg_write = true;
                        ctrl.csr_addr = InstructionBits::csr(&inst);
                    }
                }
            }
        }

        a_opcodes::OP_AMO => {
            let width = match d.funct3 {
                a_funct3::WIDTH_32 => MemWidth::Word,
                a_funct3::WIDTH_64 => MemWidth::Double,
                _ => {
                    illegal = true;
                    MemWidth::Double
                }
            };
            ctrl.width = width;
            ctrl.reg_write = true;
            let funct5 = d.funct7 >> 2;
            ctrl.atomic_op = match funct5 {
                a_funct5::LR => {
                    ctrl.mem_read = true;
                    AtomicOp::Lr
                }
                a_funct5::SC => {
                    ctrl.mem_write = true;
                    AtomicOp::Sc
                }
                a_funct5::AMOSWAP => {
                    ctrl.mem_write = true;
                    AtomicOp::Swap
                }
                a_funct5::AMOADD => {
                    ctrl.mem_write = true;
                    AtomicOp::Add
                }
                a_funct5::AMOXOR => {
                    ctrl.mem_write = true;
                    AtomicOp::Xor
                }
                a_funct5::AMOAND => {
                    ctrl.mem_write = true;
                    AtomicOp::And
                }
                a_funct5::AMOOR => {
                    ctrl.mem_write = true;
                    AtomicOp::Or
                }
                a_funct5::AMOMIN => {
                    ctrl.mem_write = true;
                    AtomicOp::Min
                }
                a_funct5::AMOMAX => {
                    ctrl.mem_write = true;
                    AtomicOp::Max
                }
                a_funct5::AMOMINU => {
                    ctrl.mem_write = true;
                    AtomicOp::Minu
                }
                a_funct5::AMOMAXU => {
                    ctrl.mem_write = true;
                    AtomicOp::Maxu
                }
                _ => {
                    illegal = true;
                    AtomicOp::None
                }
            };
        }

        f_opcodes::OP_FP => {
            ctrl.fp_reg_write = true;
            // Format bits 26-25 of funct7 select single (00) vs double (01)
            // precision for every op here except the S<->D conversions below,
            // whose funct7 is a distinct opcode rather than a format tag.
            let is_double = (d.funct7 & 0b11) == 1;
            ctrl.is_rv32 = !is_double;
            ctrl.rs1_fp = true;
            ctrl.rs2_fp = !matches!(
                d.funct7,
                f_funct7::FCVT_W_F | d_funct7::FCVT_W_D | f_funct7::FCLASS_MV_X_F | d_funct7::FCLASS_MV_X_D | f_funct7::FMV_F_X | d_funct7::FMV_D_X
            );
            match d.funct7 {
                f_funct7::FADD | d_funct7::FADD_D => ctrl.alu = AluOp::FAdd,
                f_funct7::FSUB | d_funct7::FSUB_D => ctrl.alu = AluOp::FSub,
                f_funct7::FMUL | d_funct7::FMUL_D => ctrl.alu = AluOp::FMul,
                f_funct7::FDIV | d_funct7::FDIV_D => ctrl.alu = AluOp::FDiv,
                f_funct7::FSQRT | d_funct7::FSQRT_D => {
                    ctrl.rs2_fp = false;
                    ctrl.alu = AluOp::FSqrt;
                }
                f_funct7::FSGNJ | d_funct7::FSGNJ_D => {
                    ctrl.alu = match d.funct3 {
                        f_funct3::FSGNJ => AluOp::FSgnJ,
                        f_funct3::FSGNJN => AluOp::FSgnJN,
                        f_funct3::FSGNJX => AluOp::FSgnJX,
                        _ => {
                            illegal = true;
                            AluOp::FSgnJ
                        }
                    };
                }
                f_funct7::FMIN_MAX | d_funct7::FMIN_MAX_D => {
                    ctrl.alu = match d.funct3 {
                        f_funct3::FMIN => AluOp::FMin,
                        f_funct3::FMAX => AluOp::FMax,
                        _ => {
                            illegal = true;
                            AluOp::FMin
                        }
                    };
                }
                f_funct7::FCMP | d_funct7::FCMP_D => {
                    ctrl.fp_reg_write = false;
                    ctrl.reg_write = true;
                    ctrl.alu = match d.funct3 {
                        f_funct3::FEQ => AluOp::FEq,
                        f_funct3::FLT => AluOp::FLt,
                        f_funct3::FLE => AluOp::FLe,
                        _ => {
                            illegal = true;
                            AluOp::FEq
                        }
                    };
                }
                f_funct7::FCLASS_MV_X_F | d_funct7::FCLASS_MV_X_D => {
                    ctrl.fp_reg_write = false;
                    ctrl.reg_write = true;
                    ctrl.rs2_fp = false;
                    ctrl.alu = if d.funct3 == f_funct3::FCLASS {
                        AluOp::FClass
                    } else {
                        AluOp::FMvToX
                    };
                }
                f_funct7::FMV_F_X | d_funct7::FMV_D_X => {
                    ctrl.rs1_fp = false;
                    ctrl.rs2_fp = false;
                    ctrl.alu = AluOp::FMvToF;
                }
                f_funct7::FCVT_W_F | d_funct7::FCVT_W_D => {
                    ctrl.fp_reg_write = false;
                    ctrl.reg_write = true;
                    ctrl.rs2_fp = false;
                    ctrl.alu = match d.rs2 {
                        0 => AluOp::FCvtWS,
                        1 => AluOp::FCvtWUS,
                        2 => AluOp::FCvtLS,
                        3 => AluOp::FCvtLUS,
                        _ => {
                            illegal = true;
                            AluOp::FCvtWS
                        }
                    };
                }
                f_funct7::FCVT_F_W | d_funct7::FCVT_D_W => {
                    ctrl.rs1_fp = false;
                    ctrl.rs2_fp = false;
                    ctrl.alu = match d.rs2 {
                        0 => AluOp::FCvtSW,
                        1 => AluOp::FCvtSWU,
                        2 => AluOp::FCvtSL,
                        3 => AluOp::FCvtSLU,
                        _ => {
                            illegal = true;
                            AluOp::FCvtSW
                        }
                    };
                }
                f_funct7::FCVT_DS => {
                    // FCVT.D.S: source is single, so the Fpu dispatches it
                    // through the f32 execution path regardless of the
                    // double-precision destination.
                    ctrl.rs2_fp = false;
                    ctrl.is_rv32 = true;
                    ctrl.alu = AluOp::FCvtDS;
                }
                d_funct7::FCVT_S_D => {
                    // FCVT.S.D: source is double, dispatched through the f64
                    // execution path, which re-boxes the narrowed result.
                    ctrl.rs2_fp = false;
                    ctrl.is_rv32 = false;
                    ctrl.alu = AluOp::FCvtSD;
                }
                _ => {
                    illegal = true;
                }
            }
        }

        f_opcodes::OP_FMADD | f_opcodes::OP_FMSUB | f_opcodes::OP_FNMSUB | f_opcodes::OP_FNMADD => {
            // R4-type layout: bits[31:27] are rs3, bits[26:25] are the format
            // selector (00=single, 01=double) — NOT a normal funct7, so the
            // format must be read directly off the raw bits rather than
            // trusting `Decoded.funct7`.
            let fmt = (inst >> 25) & 0b11;
            ctrl.fp_reg_write = true;
            ctrl.is_rv32 = fmt == 0;
            ctrl.rs1_fp = true;
            ctrl.rs2_fp = true;
            ctrl.rs3_fp = true;
            ctrl.alu = match d.opcode {
                f_opcodes::OP_FMADD => AluOp::FMAdd,
                f_opcodes::OP_FMSUB => AluOp::FMSub,
                f_opcodes::OP_FNMSUB => AluOp::FNMSub,
                _ => AluOp::FNMAdd,
            };
        }

        _ => {
            illegal = true;
        }
    }

    (ctrl, d.rs1, d.rs2, rs3, d.rd, d.imm, illegal)
}
