//! Typed views over raw instruction words.

use crate::enums::{AluSource, AluUnit, Chan, CfCond, CfInstType, IndexMode, OutputModifier, PredSel};
use crate::opcodes::{AluFlags, AluOp2, AluOp3, AluOpcode, CfAluInst, CfExpInst, CfInst};
use crate::words::{
    AluWord0, AluWord1Op2, AluWord1Op3, CfAluWord0, CfAluWord1, CfWord0, CfWord1, ExpBufWord1,
    ExpSwizWord1, ExpWord0, TexWord0, TexWord1, TexWord2, VtxWord0, VtxWord1, VtxWord2,
};

/// A two-word control flow instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ControlFlowInst {
    pub word0: u32,
    pub word1: u32,
}

/// Opcode of a control flow instruction, resolved against its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CfOpcode {
    Normal(CfInst),
    Export(CfExpInst),
    Alu(CfAluInst),
}

impl CfOpcode {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Normal(op) => op.name(),
            Self::Export(op) => op.name(),
            Self::Alu(op) => op.name(),
        }
    }
}

impl ControlFlowInst {
    pub const fn new(word0: u32, word1: u32) -> Self {
        Self { word0, word1 }
    }

    pub const fn inst_type(&self) -> CfInstType {
        match (self.word1 >> 28) & 3 {
            0 => CfInstType::Normal,
            1 => CfInstType::Export,
            2 => CfInstType::Alu,
            _ => CfInstType::AluExtended,
        }
    }

    /// The raw opcode field for this instruction's encoding.
    pub const fn raw_opcode(&self) -> u32 {
        match self.inst_type() {
            CfInstType::Normal | CfInstType::Export => self.word1().cf_inst(),
            CfInstType::Alu | CfInstType::AluExtended => self.alu_word1().cf_inst(),
        }
    }

    pub const fn opcode(&self) -> Option<CfOpcode> {
        let raw = self.raw_opcode();
        match self.inst_type() {
            CfInstType::Normal => match CfInst::from_raw(raw) {
                Some(op) => Some(CfOpcode::Normal(op)),
                None => None,
            },
            CfInstType::Export => match CfExpInst::from_raw(raw) {
                Some(op) => Some(CfOpcode::Export(op)),
                None => None,
            },
            CfInstType::Alu | CfInstType::AluExtended => match CfAluInst::from_raw(raw) {
                Some(op) => Some(CfOpcode::Alu(op)),
                None => None,
            },
        }
    }

    pub const fn word0(&self) -> CfWord0 {
        CfWord0(self.word0)
    }

    pub const fn word1(&self) -> CfWord1 {
        CfWord1(self.word1)
    }

    pub const fn alu_word0(&self) -> CfAluWord0 {
        CfAluWord0(self.word0)
    }

    pub const fn alu_word1(&self) -> CfAluWord1 {
        CfAluWord1(self.word1)
    }

    pub const fn exp_word0(&self) -> ExpWord0 {
        ExpWord0(self.word0)
    }

    pub const fn exp_swiz_word1(&self) -> ExpSwizWord1 {
        ExpSwizWord1(self.word1)
    }

    pub const fn exp_buf_word1(&self) -> ExpBufWord1 {
        ExpBufWord1(self.word1)
    }

    pub const fn cond(&self) -> CfCond {
        match self.word1().cond() {
            0 => CfCond::Active,
            1 => CfCond::False,
            2 => CfCond::Bool,
            _ => CfCond::NotBool,
        }
    }

    /// Whether this instruction terminates the program. Only the NORMAL and EXPORT
    /// encodings carry the flag.
    pub const fn end_of_program(&self) -> bool {
        match self.inst_type() {
            CfInstType::Normal | CfInstType::Export => self.word1().end_of_program(),
            _ => false,
        }
    }

    /// Number of instructions in a TEX/VTX clause referenced by a NORMAL instruction.
    pub const fn fetch_clause_len(&self) -> u32 {
        let word1 = self.word1();
        (word1.count() | ((word1.count_3() as u32) << 3)) + 1
    }

    /// Number of 64-bit slots in the ALU clause referenced by an ALU instruction.
    pub const fn alu_clause_slots(&self) -> u32 {
        self.alu_word1().count() + 1
    }
}

/// One ALU source operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AluOperand {
    pub sel: u32,
    pub rel: bool,
    pub chan: Chan,
    pub neg: bool,
    pub abs: bool,
}

impl AluOperand {
    pub const fn source(&self) -> AluSource {
        AluSource::from_sel(self.sel)
    }
}

/// A two-word ALU instruction of either encoding.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct AluInst {
    pub word0: AluWord0,
    pub word1: u32,
}

impl AluInst {
    pub const fn new(word0: u32, word1: u32) -> Self {
        Self {
            word0: AluWord0(word0),
            word1,
        }
    }

    pub const fn op2(&self) -> AluWord1Op2 {
        AluWord1Op2(self.word1)
    }

    pub const fn op3(&self) -> AluWord1Op3 {
        AluWord1Op3(self.word1)
    }

    pub const fn is_op3(&self) -> bool {
        self.op2().encoding() != 0
    }

    pub const fn raw_opcode(&self) -> u32 {
        if self.is_op3() {
            self.op3().alu_inst()
        } else {
            self.op2().alu_inst()
        }
    }

    pub const fn opcode(&self) -> Option<AluOpcode> {
        if self.is_op3() {
            match AluOp3::from_raw(self.op3().alu_inst()) {
                Some(op) => Some(AluOpcode::Op3(op)),
                None => None,
            }
        } else {
            match AluOp2::from_raw(self.op2().alu_inst()) {
                Some(op) => Some(AluOpcode::Op2(op)),
                None => None,
            }
        }
    }

    /// Mnemonic for diagnostics, falling back to the raw encoding for unknown opcodes.
    pub fn opcode_name(&self) -> String {
        match self.opcode() {
            Some(op) => op.name().to_owned(),
            None if self.is_op3() => format!("OP3_{}", self.raw_opcode()),
            None => format!("OP2_{}", self.raw_opcode()),
        }
    }

    pub const fn flags(&self) -> AluFlags {
        match self.opcode() {
            Some(op) => op.flags(),
            None => AluFlags::empty(),
        }
    }

    /// Number of source operands; unknown OP2 opcodes are treated as two-source.
    pub const fn num_srcs(&self) -> usize {
        match self.opcode() {
            Some(op) => op.num_srcs(),
            None if self.is_op3() => 3,
            None => 2,
        }
    }

    pub const fn src(&self, index: usize) -> AluOperand {
        let w0 = self.word0;
        match index {
            0 => AluOperand {
                sel: w0.src0_sel(),
                rel: w0.src0_rel(),
                chan: Chan::from_raw(w0.src0_chan()),
                neg: w0.src0_neg(),
                abs: !self.is_op3() && self.op2().src0_abs(),
            },
            1 => AluOperand {
                sel: w0.src1_sel(),
                rel: w0.src1_rel(),
                chan: Chan::from_raw(w0.src1_chan()),
                neg: w0.src1_neg(),
                abs: !self.is_op3() && self.op2().src1_abs(),
            },
            _ => {
                let op3 = self.op3();
                AluOperand {
                    sel: op3.src2_sel(),
                    rel: op3.src2_rel(),
                    chan: Chan::from_raw(op3.src2_chan()),
                    neg: op3.src2_neg(),
                    abs: false,
                }
            }
        }
    }

    pub const fn last(&self) -> bool {
        self.word0.last()
    }

    pub const fn dst_gpr(&self) -> u32 {
        self.op2().dst_gpr()
    }

    pub const fn dst_chan(&self) -> Chan {
        Chan::from_raw(self.op2().dst_chan())
    }

    pub const fn dst_rel(&self) -> bool {
        self.op2().dst_rel()
    }

    pub const fn clamp(&self) -> bool {
        self.op2().clamp()
    }

    pub const fn bank_swizzle(&self) -> u32 {
        self.op2().bank_swizzle()
    }

    /// OP3 instructions have no write mask and always write their destination.
    pub const fn write_mask(&self) -> bool {
        self.is_op3() || self.op2().write_mask()
    }

    pub const fn omod(&self) -> OutputModifier {
        if self.is_op3() {
            return OutputModifier::Off;
        }
        match self.op2().omod() {
            0 => OutputModifier::Off,
            1 => OutputModifier::Mul2,
            2 => OutputModifier::Mul4,
            _ => OutputModifier::Div2,
        }
    }

    pub const fn update_execute_mask(&self) -> bool {
        !self.is_op3() && self.op2().update_execute_mask()
    }

    pub const fn update_pred(&self) -> bool {
        !self.is_op3() && self.op2().update_pred()
    }

    pub const fn index_mode(&self) -> Option<IndexMode> {
        IndexMode::from_raw(self.word0.index_mode())
    }

    pub const fn pred_sel(&self) -> Option<PredSel> {
        PredSel::from_raw(self.word0.pred_sel())
    }
}

/// A texture fetch instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TexFetchInst {
    pub word0: TexWord0,
    pub word1: TexWord1,
    pub word2: TexWord2,
}

/// A vertex fetch instruction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VtxFetchInst {
    pub word0: VtxWord0,
    pub word1: VtxWord1,
    pub word2: VtxWord2,
}

/// One entry of a TEX or VTX clause. Both kinds occupy four words, the last of which is
/// padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchInst {
    Tex(TexFetchInst),
    Vtx(VtxFetchInst),
}

impl FetchInst {
    pub const WORDS: usize = 4;

    /// Interprets three fetch words. Inside a TEX clause opcodes 0 and 1 are vertex
    /// fetches; inside a VTX clause everything is.
    pub const fn from_words(words: [u32; 3], vertex_clause: bool) -> Self {
        if vertex_clause || (words[0] & 0x1f) <= 1 {
            Self::Vtx(VtxFetchInst {
                word0: VtxWord0(words[0]),
                word1: VtxWord1(words[1]),
                word2: VtxWord2(words[2]),
            })
        } else {
            Self::Tex(TexFetchInst {
                word0: TexWord0(words[0]),
                word1: TexWord1(words[1]),
                word2: TexWord2(words[2]),
            })
        }
    }

    pub const fn words(&self) -> [u32; 4] {
        match self {
            Self::Tex(inst) => [inst.word0.0, inst.word1.0, inst.word2.0, 0],
            Self::Vtx(inst) => [inst.word0.0, inst.word1.0, inst.word2.0, 0],
        }
    }
}

/// Unit an ALU instruction executes in, given its destination channel and flags.
pub(crate) const fn preferred_unit(inst: &AluInst) -> AluUnit {
    let flags = inst.flags();
    if flags.contains(AluFlags::TRANSCENDENTAL) && !flags.contains(AluFlags::VECTOR) {
        AluUnit::T
    } else {
        AluUnit::from_chan(inst.dst_chan())
    }
}
