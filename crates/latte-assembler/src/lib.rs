//! Assembler for the Latte shader DSL.
//!
//! [`compile`] turns assembly text (the same syntax [`latte_isa::disassemble`] prints) into a
//! [`CompiledProgram`]: control flow instructions plus linked ALU and fetch clause payloads.
//! [`gfd`] packages compiled programs into a `Gfx2` container, with header fields taken
//! from `$` comments by [`comments`].

pub mod ast;
pub mod comments;
mod compiler;
mod error;
pub mod gfd;
mod parser;
mod program;

pub use comments::{parse_pixel_shader_comments, parse_vertex_shader_comments, CommentError};
pub use error::{AssemblyError, SemanticError, SourceLocation};
pub use gfd::{GfdError, GfdFile, PixelShader, VertexShader};
pub use parser::parse;
pub use program::{CompiledProgram, ExportUsage};

/// Assembles a whole program.
pub fn compile(source: &str) -> Result<CompiledProgram, AssemblyError> {
    let statements = parser::parse(source)?;
    compiler::Compiler::default().compile(statements)
}

#[cfg(test)]
mod tests;
