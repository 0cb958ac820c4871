//! Instruction encoding model of the Latte GPU (an R700 derivative).
//!
//! Shared by the assembler, which writes these words, and the GLSL decompiler, which reads
//! them back. Nothing here allocates global state beyond the lazily built mnemonic tables.

#[macro_use]
mod macros;

pub mod decode;
pub mod disasm;
pub mod enums;
pub mod inst;
pub mod opcodes;
pub mod words;

pub use decode::{
    decode_alu_clause, decode_cf_program, decode_clause, decode_fetch_clause, read_words, AluGroup,
    AluGroupUnits, Clause, DecodeError, MAX_GROUP_INSTS, MAX_GROUP_LITERALS,
};
pub use disasm::{disassemble, disassemble_words};
pub use enums::*;
pub use inst::{AluInst, AluOperand, CfOpcode, ControlFlowInst, FetchInst, TexFetchInst, VtxFetchInst};
pub use opcodes::{AluFlags, AluOp2, AluOp3, AluOpcode, CfAluInst, CfExpInst, CfInst, TexInst, VtxInst};
pub use words::*;

#[cfg(test)]
mod tests;
