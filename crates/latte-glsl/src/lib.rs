//! Latte shader binary to GLSL 4.50 decompiler.
//!
//! The generated code emulates the hardware execution model rather than reconstructing
//! structured control flow: every ALU group writes previous-value registers before the
//! register file, and divergent control flow is tracked with an explicit active-mask stack.
//! See [`translate`] for the entry point.

mod alu;
mod cf;
pub mod descriptor;
pub mod error;
mod exp;
mod header;
mod op2;
mod op3;
mod reduction;
mod swizzle;
mod tex;
mod translate;
mod writer;

pub use descriptor::{
    Export, Feedback, SamplerUsage, ShaderDescriptor, ShaderStage, TranslatedShader,
    MAX_SAMPLERS, MAX_STREAMS, MAX_UNIFORM_BLOCKS, UNIFORM_BLOCK_ELEMENTS,
};
pub use error::{TranslateError, TranslateErrorKind};
pub use translate::translate;

#[cfg(test)]
mod tests;
