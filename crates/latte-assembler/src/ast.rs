//! Syntax tree of a Latte assembly program.
//!
//! Mnemonics and property names are kept as written; resolving them against the opcode
//! tables is the compiler's job so that unknown names produce semantic errors bound to
//! their location rather than grammar failures.

use latte_isa::{AluUnit, Chan, IndexMode, MemExportType, OutputModifier, Sel};

use crate::error::SourceLocation;

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: Option<String>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Text following the `;`, untouched.
    pub text: String,
    pub location: SourceLocation,
}

/// One top-level line (or clause) of a program.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Cf(CfStatement),
    Export(ExportStatement),
    AluClause(AluClauseStatement),
    TexClause(TexClauseStatement),
    EndOfProgram(SourceLocation),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CfStatement {
    pub index: u32,
    pub opcode: String,
    pub properties: Vec<Property>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget {
    Position(u32),
    Parameter(u32),
    Pixel(u32),
    Memory { kind: MemExportType, base: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportSource {
    pub gpr: u32,
    pub rel: Option<IndexMode>,
    pub swizzle: Option<[Sel; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExportStatement {
    pub index: u32,
    pub opcode: String,
    pub target: ExportTarget,
    pub src: ExportSource,
    pub properties: Vec<Property>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AluClauseStatement {
    pub index: u32,
    pub opcode: String,
    pub properties: Vec<Property>,
    pub items: Vec<AluClauseItem>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AluClauseItem {
    Group(AluGroupStatement),
    Comment(Comment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct AluGroupStatement {
    pub index: u32,
    pub insts: Vec<AluInstStatement>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AluInstStatement {
    pub unit: AluUnit,
    pub opcode: String,
    pub omod: OutputModifier,
    pub dst: Option<AluDst>,
    pub srcs: Vec<AluSrc>,
    pub properties: Vec<Property>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluDst {
    /// `____`: the result is only forwarded through PV/PS.
    Masked,
    Gpr {
        gpr: u32,
        rel: Option<IndexMode>,
        chan: Option<Chan>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AluSrc {
    pub value: AluSrcValue,
    pub neg: bool,
    pub abs: bool,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AluSrcValue {
    Gpr {
        gpr: u32,
        rel: Option<IndexMode>,
        chan: Option<Chan>,
    },
    Kcache {
        bank: u32,
        index: u32,
        rel: Option<IndexMode>,
        chan: Option<Chan>,
    },
    ConstFile {
        index: u32,
        rel: Option<IndexMode>,
        chan: Option<Chan>,
    },
    /// `PVn`; `group` is the number written after `PV`, if any.
    PreviousVector {
        group: Option<u32>,
        chan: Option<Chan>,
    },
    PreviousScalar {
        group: Option<u32>,
    },
    /// A literal written as hex, as a float, or as `(0xHEX, float)`.
    Literal {
        hex: Option<u32>,
        float: Option<f32>,
    },
    IntImmediate(i64),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TexClauseStatement {
    pub index: u32,
    pub opcode: String,
    pub properties: Vec<Property>,
    pub items: Vec<TexClauseItem>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TexClauseItem {
    Tex(TexFetchStatement),
    Vtx(VtxFetchStatement),
    Comment(Comment),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchRegister {
    pub gpr: u32,
    pub rel: Option<IndexMode>,
    pub swizzle: Option<[Sel; 4]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TexFetchStatement {
    pub index: u32,
    pub opcode: String,
    /// `None` when written as `____`.
    pub dst: Option<FetchRegister>,
    pub src: FetchRegister,
    pub resource_id: u32,
    pub sampler_id: u32,
    pub properties: Vec<Property>,
    pub location: SourceLocation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VtxDst {
    Gpr(FetchRegister),
    Semantic { id: u32, swizzle: Option<[Sel; 4]> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct VtxFetchStatement {
    pub index: u32,
    pub opcode: String,
    pub dst: VtxDst,
    pub src_gpr: u32,
    pub src_rel: Option<IndexMode>,
    pub src_chan: Option<Chan>,
    pub buffer_id: u32,
    pub properties: Vec<Property>,
    pub location: SourceLocation,
}
