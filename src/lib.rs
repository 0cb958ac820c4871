//! Latte GPU shader toolchain.
//!
//! Re-exports the three layers so callers can depend on a single crate:
//!
//! - [`isa`]: instruction word layouts, opcode tables, clause decoding and disassembly.
//! - [`assembler`]: the assembly DSL front end and the GFD container writer.
//! - [`glsl`]: binary to GLSL translation.

pub use latte_assembler as assembler;
pub use latte_glsl as glsl;
pub use latte_isa as isa;

pub use latte_assembler::{compile, AssemblyError, CompiledProgram};
pub use latte_glsl::{translate, ShaderDescriptor, ShaderStage, TranslateError, TranslatedShader};
pub use latte_isa::disassemble;
