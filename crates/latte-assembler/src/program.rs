use latte_isa::ControlFlowInst;

use crate::ast::Comment;

/// Highest export index written per category, plus the stream-out buffers touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportUsage {
    pub max_position: Option<u32>,
    pub max_parameter: Option<u32>,
    pub max_pixel: Option<u32>,
    pub streams: [bool; 4],
}

impl ExportUsage {
    pub fn num_parameters(&self) -> u32 {
        self.max_parameter.map_or(0, |max| max + 1)
    }

    pub fn num_pixels(&self) -> u32 {
        self.max_pixel.map_or(0, |max| max + 1)
    }
}

/// Output of [`compile`](crate::compile): control flow plus the linked clause payloads.
///
/// Base addresses are in 64-bit units, measured from the start of the program.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledProgram {
    pub cf_insts: Vec<ControlFlowInst>,
    pub alu_clause_base_address: u32,
    pub alu_clause_data: Vec<u32>,
    pub tex_clause_base_address: u32,
    pub tex_clause_data: Vec<u32>,
    /// Every comment line of the source, verbatim and in order.
    pub comments: Vec<Comment>,
    pub exports: ExportUsage,
}

impl CompiledProgram {
    /// The whole program as instruction words: control flow, ALU clauses and fetch
    /// clauses, each clause region starting at its base address.
    pub fn to_words(&self) -> Vec<u32> {
        let mut words = Vec::with_capacity(
            self.tex_clause_base_address as usize * 2 + self.tex_clause_data.len(),
        );
        for inst in &self.cf_insts {
            words.push(inst.word0);
            words.push(inst.word1);
        }

        if !self.alu_clause_data.is_empty() {
            words.resize(self.alu_clause_base_address as usize * 2, 0);
            words.extend_from_slice(&self.alu_clause_data);
        }

        if !self.tex_clause_data.is_empty() {
            words.resize(self.tex_clause_base_address as usize * 2, 0);
            words.extend_from_slice(&self.tex_clause_data);
        }

        words
    }

    /// [`to_words`](Self::to_words) serialized little-endian.
    pub fn to_binary(&self) -> Vec<u8> {
        self.to_words()
            .into_iter()
            .flat_map(u32::to_le_bytes)
            .collect()
    }

    /// Comment text lines, without their source locations.
    pub fn comment_lines(&self) -> impl Iterator<Item = &str> {
        self.comments.iter().map(|comment| comment.text.as_str())
    }
}
