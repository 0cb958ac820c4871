use latte_isa::{DecodeError, KcacheMode, TexDim};
use thiserror::Error;

use crate::descriptor::SamplerUsage;

/// Reason a shader could not be translated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslateErrorKind {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("unsupported control flow instruction {0}")]
    UnsupportedControlFlow(String),

    #[error("unsupported export instruction {0}")]
    UnsupportedExport(String),

    #[error("unsupported ALU instruction {0}")]
    UnsupportedAlu(String),

    #[error("unsupported ALU reduction instruction {0}")]
    UnsupportedReduction(String),

    #[error("unsupported texture instruction {0}")]
    UnsupportedTexture(String),

    #[error("vertex fetch instructions are not supported")]
    UnsupportedVertexFetch,

    #[error("unsupported ALU source selector {0}")]
    UnsupportedSource(u32),

    #[error("relative addressing is only supported for registers and uniforms, found selector {0}")]
    InvalidRelativeSource(u32),

    #[error("invalid index mode {0}")]
    InvalidIndexMode(u32),

    #[error("kcache bank {bank} is read with lock mode {mode}")]
    InvalidKcacheMode { bank: u32, mode: KcacheMode },

    #[error("kcache operand read with uniform blocks disabled")]
    UniformBlocksDisabled,

    #[error("constant file operand read with uniform registers disabled")]
    UniformRegistersDisabled,

    #[error("expected 4 vector instructions in a reduction group, found {0}")]
    IncompleteReduction(usize),

    #[error("every instruction in a reduction group must have the same {0}")]
    InconsistentReduction(&'static str),

    #[error("CUBE operands are inconsistent (detected x={x}, y={y}, z={z})")]
    InconsistentCube { x: String, y: String, z: String },

    #[error("address register instruction {0} cannot execute in the T unit")]
    AddressRegisterUnit(String),

    #[error("address register instruction {0} cannot use an output modifier")]
    AddressRegisterModifier(String),

    #[error("sampler {0} is out of range")]
    SamplerOutOfRange(u32),

    #[error("sampler {id} is used as {requested:?} after being used as {previous:?}")]
    SamplerUsageConflict {
        id: u32,
        previous: SamplerUsage,
        requested: SamplerUsage,
    },

    #[error("resource {resource} does not match sampler {sampler}")]
    ResourceSamplerMismatch { resource: u32, sampler: u32 },

    #[error("unsupported sampler dimension {dim} (shadow: {shadow})")]
    UnsupportedSamplerDim { dim: TexDim, shadow: bool },

    #[error("texel offsets are not supported for sampler dimension {0}")]
    UnsupportedOffsetDim(TexDim),

    #[error("unexpected component selector {0}")]
    InvalidSelect(u32),

    #[error("invalid export type {0}")]
    InvalidExportType(u32),

    #[error("export of R{gpr} with BURSTCNT({burst_count}) reads past R127")]
    ExportRegisterOutOfRange { gpr: u32, burst_count: u32 },

    #[error("position export index {0} is below the position base")]
    InvalidPositionIndex(u32),

    #[error("unsupported {ty} export in MEM_STREAM{stream}")]
    UnsupportedStreamExport { stream: u32, ty: String },

    #[error("unsupported value size {size} in MEM_STREAM{stream}")]
    UnsupportedStreamSize { stream: u32, size: u32 },

    #[error("MEM_STREAM{0} writes no components")]
    EmptyStreamMask(u32),

    #[error("{0} outside of a loop")]
    NoOpenLoop(&'static str),

    #[error("LOOP_END does not close the loop started at {start_pc} (loop end {end_pc}, jumps back to {addr})")]
    LoopMismatch { start_pc: usize, end_pc: u32, addr: u32 },

    #[error("loop started at {0} is never closed")]
    UnclosedLoop(usize),
}

/// A fatal translation failure.
///
/// Translation never produces partial output. The error keeps the disassembly of the whole
/// program so the failing instruction can be located in context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} (control flow instruction {cf_pc})")]
pub struct TranslateError {
    pub kind: TranslateErrorKind,
    pub cf_pc: usize,
    /// Disassembly of the program, or the reason it could not be disassembled.
    pub disassembly: String,
}

pub(crate) type Result<T, E = TranslateErrorKind> = std::result::Result<T, E>;
