//! Inputs and outputs of a translation.

use latte_isa::{ExportType, TexDim};

/// Number of sampler slots a shader can reference.
pub const MAX_SAMPLERS: usize = 16;

/// Number of uniform buffers addressable through the kcache.
pub const MAX_UNIFORM_BLOCKS: usize = 16;

/// Number of stream-out buffers.
pub const MAX_STREAMS: usize = 4;

/// `vec4` elements declared per uniform block (64 KiB).
pub const UNIFORM_BLOCK_ELEMENTS: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Pixel,
    Geometry,
}

impl ShaderStage {
    /// Name of the uniform register array for this stage.
    pub const fn uniform_registers(self) -> &'static str {
        match self {
            Self::Vertex => "VR",
            Self::Pixel => "PR",
            Self::Geometry => "GR",
        }
    }
}

/// How a sampler slot is referenced by the program.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SamplerUsage {
    #[default]
    Unused,
    Texture,
    Shadow,
}

/// Pipeline state the translation depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderDescriptor {
    pub stage: ShaderStage,
    /// Dimension of the texture bound to each sampler slot.
    pub sampler_dims: [TexDim; MAX_SAMPLERS],
    /// Constant-file operands read `VR`/`PR`/`GR` uniform arrays.
    pub uniform_registers_enabled: bool,
    /// Kcache operands read `UB_n` uniform blocks.
    pub uniform_blocks_enabled: bool,
}

impl ShaderDescriptor {
    pub fn new(stage: ShaderStage) -> Self {
        Self {
            stage,
            sampler_dims: [TexDim::Dim2D; MAX_SAMPLERS],
            uniform_registers_enabled: false,
            uniform_blocks_enabled: false,
        }
    }

    #[must_use]
    pub fn with_sampler_dim(mut self, slot: usize, dim: TexDim) -> Self {
        if let Some(entry) = self.sampler_dims.get_mut(slot) {
            *entry = dim;
        }
        self
    }

    #[must_use]
    pub fn with_uniform_registers(mut self, enabled: bool) -> Self {
        self.uniform_registers_enabled = enabled;
        self
    }

    #[must_use]
    pub fn with_uniform_blocks(mut self, enabled: bool) -> Self {
        self.uniform_blocks_enabled = enabled;
        self
    }
}

/// An architectural output written by an `EXP`/`EXP_DONE` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Export {
    pub ty: ExportType,
    /// Output index; position exports are rebased to start at zero.
    pub id: u32,
}

impl Export {
    /// Name of the GLSL variable holding this output.
    pub fn variable(&self) -> String {
        match self.ty {
            ExportType::Position => format!("exp_position_{}", self.id),
            ExportType::Parameter => format!("exp_param_{}", self.id),
            ExportType::Pixel => format!("exp_pixel_{}", self.id),
        }
    }
}

/// A stream-out write performed by a `MEM_STREAMn` instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Feedback {
    pub stream_index: u32,
    /// Byte offset into the stream's vertex stride.
    pub offset: u32,
    /// Number of dwords written.
    pub size: u32,
    /// Number of components selected by the instruction's component mask.
    pub components: u32,
}

impl Feedback {
    pub fn variable(&self) -> String {
        format!("feedback_{}_{}", self.stream_index, self.offset)
    }

    pub fn glsl_type(&self) -> String {
        match self.components {
            1 => "float".to_owned(),
            n => format!("vec{n}"),
        }
    }
}

/// Result of translating one shader binary.
///
/// The three text blocks are meant to be concatenated as file header, then `main` holding
/// the code header and code body; [`TranslatedShader::to_glsl`] does exactly that.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslatedShader {
    pub stage: ShaderStage,
    pub sampler_dims: [TexDim; MAX_SAMPLERS],
    pub sampler_usage: [SamplerUsage; MAX_SAMPLERS],
    pub used_uniform_blocks: [bool; MAX_UNIFORM_BLOCKS],
    pub exports: Vec<Export>,
    pub feedbacks: [Vec<Feedback>; MAX_STREAMS],
    pub uses_discard: bool,
    pub calls_fetch_shader: bool,
    /// Version pragma, control stack globals, uniform and sampler declarations.
    pub file_header: String,
    /// Register file, previous values, exports and initial control state.
    pub code_header: String,
    pub code_body: String,
}

impl TranslatedShader {
    /// Joins the three blocks into one translation unit with a `main` entry point.
    pub fn to_glsl(&self) -> String {
        let mut out = String::with_capacity(
            self.file_header.len() + self.code_header.len() + self.code_body.len() + 32,
        );
        out.push_str(&self.file_header);
        out.push_str("void main()\n{\n");
        out.push_str(&self.code_header);
        out.push('\n');
        out.push_str(&self.code_body);
        out.push_str("}\n");
        out
    }
}
