//! Writer for the big-endian `Gfx2` shader container.
//!
//! A file is a 32-byte header followed by blocks. Each shader contributes a header block
//! (register state plus relocatable variable tables) and a program block holding the
//! assembled instruction words. With alignment enabled, padding blocks keep every
//! program block on a 0x200 byte boundary.

use std::io::Write;

use thiserror::Error;

const FILE_MAGIC: u32 = 0x4766_7832; // "Gfx2"
const FILE_HEADER_SIZE: u32 = 32;
const FILE_MAJOR_VERSION: u32 = 7;
const FILE_MINOR_VERSION: u32 = 1;
const FILE_GPU_VERSION: u32 = 2;

const BLOCK_MAGIC: u32 = 0x424C_4B7B; // "BLK{"
const BLOCK_HEADER_SIZE: usize = 32;
const BLOCK_MAJOR_VERSION: u32 = 1;

const RELOCATION_MAGIC: u32 = 0x7D42_4C4B; // "}BLK"
const RELOCATION_HEADER_SIZE: u32 = 0x28;
const PATCH_DATA: u32 = 0xD060_0000;
const PATCH_TEXT: u32 = 0xCA70_0000;

pub const VERTEX_SHADER_HEADER_SIZE: usize = 0x134;
pub const PIXEL_SHADER_HEADER_SIZE: usize = 0xE8;

/// Maximum number of vertex attribute variables.
pub const MAX_ATTRIB_VARS: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
enum BlockType {
    EndOfFile = 1,
    Padding = 2,
    VertexShaderHeader = 3,
    VertexShaderProgram = 5,
    PixelShaderHeader = 6,
    PixelShaderProgram = 7,
}

#[derive(Debug, Error)]
pub enum GfdError {
    #[error("{what} size {size} does not fit in 32 bits")]
    TooLarge { what: &'static str, size: usize },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How a shader reads its uniforms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShaderMode {
    #[default]
    UniformRegister = 0,
    UniformBlock = 1,
    GeometryShader = 2,
    ComputeShader = 3,
}

impl ShaderMode {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match normalize_name(name).as_str() {
            "UNIFORMREGISTER" => Self::UniformRegister,
            "UNIFORMBLOCK" => Self::UniformBlock,
            "GEOMETRYSHADER" => Self::GeometryShader,
            "COMPUTESHADER" => Self::ComputeShader,
            _ => return None,
        })
    }
}

/// Upper-cases a value and drops underscores so `uniform_block` and `UniformBlock` agree.
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

const SHADER_VAR_TYPES: &[(&str, u32)] = &[
    ("VOID", 0),
    ("BOOL", 1),
    ("INT", 2),
    ("UINT", 3),
    ("FLOAT", 4),
    ("DOUBLE", 5),
    ("DOUBLE2", 6),
    ("DOUBLE3", 7),
    ("DOUBLE4", 8),
    ("FLOAT2", 9),
    ("FLOAT3", 10),
    ("FLOAT4", 11),
    ("BOOL2", 12),
    ("BOOL3", 13),
    ("BOOL4", 14),
    ("INT2", 15),
    ("INT3", 16),
    ("INT4", 17),
    ("UINT2", 18),
    ("UINT3", 19),
    ("UINT4", 20),
    ("FLOAT2X2", 21),
    ("FLOAT2X3", 22),
    ("FLOAT2X4", 23),
    ("FLOAT3X2", 24),
    ("FLOAT3X3", 25),
    ("FLOAT3X4", 26),
    ("FLOAT4X2", 27),
    ("FLOAT4X3", 28),
    ("FLOAT4X4", 29),
    ("DOUBLE2X2", 30),
    ("DOUBLE2X3", 31),
    ("DOUBLE2X4", 32),
    ("DOUBLE3X2", 33),
    ("DOUBLE3X3", 34),
    ("DOUBLE3X4", 35),
    ("DOUBLE4X2", 36),
    ("DOUBLE4X3", 37),
    ("DOUBLE4X4", 38),
];

const SAMPLER_VAR_TYPES: &[(&str, u32)] = &[
    ("SAMPLER1D", 0),
    ("SAMPLER2D", 1),
    ("SAMPLER3D", 3),
    ("SAMPLERCUBE", 4),
    ("SAMPLER2DSHADOW", 6),
    ("SAMPLER2DARRAY", 10),
    ("SAMPLER2DARRAYSHADOW", 12),
    ("SAMPLERCUBEARRAY", 13),
];

fn lookup(table: &[(&str, u32)], name: &str) -> Option<u32> {
    let name = normalize_name(name);
    table
        .iter()
        .find(|(entry, _)| *entry == name)
        .map(|(_, value)| *value)
}

/// Type of a uniform or attribute variable, stored as its raw GX2 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderVarType(pub u32);

impl ShaderVarType {
    pub const FLOAT4: Self = Self(11);

    pub fn from_name(name: &str) -> Option<Self> {
        lookup(SHADER_VAR_TYPES, name).map(Self)
    }
}

impl Default for ShaderVarType {
    fn default() -> Self {
        Self::FLOAT4
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SamplerVarType(pub u32);

impl SamplerVarType {
    pub fn from_name(name: &str) -> Option<Self> {
        lookup(SAMPLER_VAR_TYPES, name).map(Self)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformBlock {
    pub name: String,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniformVar {
    pub name: String,
    pub var_type: ShaderVarType,
    pub count: u32,
    pub offset: u32,
    pub block: i32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UniformInitialValue {
    pub value: [f32; 4],
    pub offset: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopVar {
    pub offset: u32,
    pub value: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SamplerVar {
    pub name: String,
    pub var_type: SamplerVarType,
    pub location: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttribVar {
    pub name: String,
    pub var_type: ShaderVarType,
    pub count: u32,
    pub location: u32,
}

/// `GX2RBuffer` descriptor embedded in shader headers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RBuffer {
    pub flags: u32,
    pub elem_size: u32,
    pub elem_count: u32,
}

/// Variable tables shared by every shader stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderVariables {
    pub uniform_blocks: Vec<UniformBlock>,
    pub uniform_vars: Vec<UniformVar>,
    pub initial_values: Vec<UniformInitialValue>,
    pub loop_vars: Vec<LoopVar>,
    pub sampler_vars: Vec<SamplerVar>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VertexShaderRegisters {
    pub sq_pgm_resources_vs: u32,
    pub vgt_primitiveid_en: u32,
    pub spi_vs_out_config: u32,
    pub num_spi_vs_out_id: u32,
    pub spi_vs_out_id: [u32; 10],
    pub pa_cl_vs_out_cntl: u32,
    pub sq_vtx_semantic_clear: u32,
    pub num_sq_vtx_semantic: u32,
    pub sq_vtx_semantic: [u32; 32],
    pub vgt_strmout_buffer_en: u32,
    pub vgt_vertex_reuse_block_cntl: u32,
    pub vgt_hos_reuse_depth: u32,
}

impl Default for VertexShaderRegisters {
    fn default() -> Self {
        Self {
            sq_pgm_resources_vs: 0,
            vgt_primitiveid_en: 0,
            spi_vs_out_config: 0,
            num_spi_vs_out_id: 0,
            spi_vs_out_id: [0xFFFF_FFFF; 10],
            pa_cl_vs_out_cntl: 0,
            sq_vtx_semantic_clear: 0,
            num_sq_vtx_semantic: 0,
            sq_vtx_semantic: [0xFF; 32],
            vgt_strmout_buffer_en: 0,
            vgt_vertex_reuse_block_cntl: 0,
            vgt_hos_reuse_depth: 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexShaderHeader {
    pub regs: VertexShaderRegisters,
    pub mode: ShaderMode,
    pub vars: ShaderVariables,
    pub attrib_vars: Vec<AttribVar>,
    pub ring_item_size: u32,
    pub has_stream_out: bool,
    pub stream_out_stride: [u32; 4],
    pub gx2r_buffer: RBuffer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PixelShaderRegisters {
    pub sq_pgm_resources_ps: u32,
    pub sq_pgm_exports_ps: u32,
    pub spi_ps_in_control_0: u32,
    pub spi_ps_in_control_1: u32,
    pub num_spi_ps_input_cntl: u32,
    pub spi_ps_input_cntls: [u32; 32],
    pub cb_shader_mask: u32,
    pub cb_shader_control: u32,
    pub db_shader_control: u32,
    pub spi_input_z: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelShaderHeader {
    pub regs: PixelShaderRegisters,
    pub mode: ShaderMode,
    pub vars: ShaderVariables,
    pub gx2r_buffer: RBuffer,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexShader {
    pub header: VertexShaderHeader,
    pub program: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PixelShader {
    pub header: PixelShaderHeader,
    pub program: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GfdFile {
    pub vertex_shaders: Vec<VertexShader>,
    pub pixel_shaders: Vec<PixelShader>,
}

fn to_u32(what: &'static str, size: usize) -> Result<u32, GfdError> {
    u32::try_from(size).map_err(|_| GfdError::TooLarge { what, size })
}

/// Big-endian byte sink.
#[derive(Default)]
struct BeWriter {
    buf: Vec<u8>,
}

impl BeWriter {
    fn len(&self) -> usize {
        self.buf.len()
    }

    fn u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn i32(&mut self, value: i32) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    fn f32(&mut self, value: f32) {
        self.u32(value.to_bits());
    }

    fn u32_at(&mut self, pos: usize, value: u32) {
        self.buf[pos..pos + 4].copy_from_slice(&value.to_be_bytes());
    }

    fn bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// NUL-terminated, zero padded to a multiple of four bytes.
    fn c_string(&mut self, text: &str) {
        let end = (self.buf.len() + text.len() + 1).next_multiple_of(4);
        self.buf.extend_from_slice(text.as_bytes());
        self.buf.resize(end, 0);
    }
}

/// Pointer slots that must be rewritten once the relocated data is laid out.
#[derive(Default)]
struct Relocations<'a> {
    /// (slot offset, target offset)
    data: Vec<(usize, usize)>,
    /// (slot offset, text)
    text: Vec<(usize, &'a str)>,
}

impl<'a> Relocations<'a> {
    /// Writes one variable table, pointing the header slot at `slot` to it when non-empty.
    fn table<T>(
        &mut self,
        out: &mut BeWriter,
        slot: usize,
        items: &'a [T],
        mut write: impl FnMut(&mut BeWriter, &mut Self, &'a T),
    ) {
        if items.is_empty() {
            return;
        }
        self.data.push((slot, out.len()));
        for item in items {
            write(out, self, item);
        }
    }

    fn name(&mut self, out: &mut BeWriter, name: &'a str) {
        self.text.push((out.len(), name));
        out.u32(0);
    }

    /// Emits the string pool, patches every pointer slot and appends the relocation trailer.
    fn finish(self, out: &mut BeWriter) -> Result<(), GfdError> {
        let text_offset = out.len();
        let mut text_targets = Vec::with_capacity(self.text.len());
        for (_, text) in &self.text {
            text_targets.push(out.len());
            out.c_string(text);
        }
        let text_size = out.len() - text_offset;
        let patch_offset = out.len();
        let data_size = patch_offset;

        for &(slot, target) in &self.data {
            out.u32_at(slot, to_u32("relocation target", target)? | PATCH_DATA);
            out.u32(to_u32("relocation slot", slot)? | PATCH_DATA);
        }
        for (&(slot, _), &target) in self.text.iter().zip(&text_targets) {
            out.u32_at(slot, to_u32("string offset", target)? | PATCH_TEXT);
            out.u32(to_u32("relocation slot", slot)? | PATCH_TEXT);
        }

        out.u32(RELOCATION_MAGIC);
        out.u32(RELOCATION_HEADER_SIZE);
        out.u32(0);
        out.u32(to_u32("header data", data_size)?);
        out.u32(PATCH_DATA);
        out.u32(to_u32("string pool", text_size)?);
        out.u32(to_u32("string pool offset", text_offset)? | PATCH_DATA);
        out.u32(0);
        out.u32(to_u32("patch count", self.data.len() + self.text.len())?);
        out.u32(to_u32("patch offset", patch_offset)? | PATCH_DATA);
        Ok(())
    }
}

/// Writes a `(count, pointer)` pair and returns the offset of the pointer slot.
fn table_slot(out: &mut BeWriter, count: usize) -> Result<usize, GfdError> {
    out.u32(to_u32("variable table", count)?);
    let slot = out.len();
    out.u32(0);
    Ok(slot)
}

fn write_rbuffer(out: &mut BeWriter, buffer: &RBuffer) {
    out.u32(buffer.flags);
    out.u32(buffer.elem_size);
    out.u32(buffer.elem_count);
    out.u32(0);
}

struct VariableSlots {
    uniform_blocks: usize,
    uniform_vars: usize,
    initial_values: usize,
    loop_vars: usize,
    sampler_vars: usize,
}

fn write_variable_slots(out: &mut BeWriter, vars: &ShaderVariables) -> Result<VariableSlots, GfdError> {
    Ok(VariableSlots {
        uniform_blocks: table_slot(out, vars.uniform_blocks.len())?,
        uniform_vars: table_slot(out, vars.uniform_vars.len())?,
        initial_values: table_slot(out, vars.initial_values.len())?,
        loop_vars: table_slot(out, vars.loop_vars.len())?,
        sampler_vars: table_slot(out, vars.sampler_vars.len())?,
    })
}

fn write_variable_tables<'a>(
    out: &mut BeWriter,
    relocs: &mut Relocations<'a>,
    slots: &VariableSlots,
    vars: &'a ShaderVariables,
) {
    relocs.table(out, slots.uniform_blocks, &vars.uniform_blocks, |out, relocs, block| {
        relocs.name(out, &block.name);
        out.u32(block.offset);
        out.u32(block.size);
    });
    relocs.table(out, slots.uniform_vars, &vars.uniform_vars, |out, relocs, var| {
        relocs.name(out, &var.name);
        out.u32(var.var_type.0);
        out.u32(var.count);
        out.u32(var.offset);
        out.i32(var.block);
    });
    relocs.table(out, slots.initial_values, &vars.initial_values, |out, _, init| {
        for value in init.value {
            out.f32(value);
        }
        out.u32(init.offset);
    });
    relocs.table(out, slots.loop_vars, &vars.loop_vars, |out, _, var| {
        out.u32(var.offset);
        out.u32(var.value);
    });
    relocs.table(out, slots.sampler_vars, &vars.sampler_vars, |out, relocs, var| {
        relocs.name(out, &var.name);
        out.u32(var.var_type.0);
        out.u32(var.location);
    });
}

/// Serializes a vertex shader header block body.
pub fn vertex_shader_header_bytes(shader: &VertexShader) -> Result<Vec<u8>, GfdError> {
    let header = &shader.header;
    let regs = &header.regs;
    let mut out = BeWriter::default();

    out.u32(regs.sq_pgm_resources_vs);
    out.u32(regs.vgt_primitiveid_en);
    out.u32(regs.spi_vs_out_config);
    out.u32(regs.num_spi_vs_out_id);
    for value in regs.spi_vs_out_id {
        out.u32(value);
    }
    out.u32(regs.pa_cl_vs_out_cntl);
    out.u32(regs.sq_vtx_semantic_clear);
    out.u32(regs.num_sq_vtx_semantic);
    for value in regs.sq_vtx_semantic {
        out.u32(value);
    }
    out.u32(regs.vgt_strmout_buffer_en);
    out.u32(regs.vgt_vertex_reuse_block_cntl);
    out.u32(regs.vgt_hos_reuse_depth);

    out.u32(to_u32("vertex shader program", shader.program.len())?);
    out.u32(0);
    out.u32(header.mode as u32);

    let slots = write_variable_slots(&mut out, &header.vars)?;
    let attrib_slot = table_slot(&mut out, header.attrib_vars.len())?;
    out.u32(header.ring_item_size);
    out.u32(u32::from(header.has_stream_out));
    for stride in header.stream_out_stride {
        out.u32(stride);
    }
    write_rbuffer(&mut out, &header.gx2r_buffer);
    debug_assert_eq!(out.len(), VERTEX_SHADER_HEADER_SIZE);

    let mut relocs = Relocations::default();
    write_variable_tables(&mut out, &mut relocs, &slots, &header.vars);
    relocs.table(&mut out, attrib_slot, &header.attrib_vars, |out, relocs, var| {
        relocs.name(out, &var.name);
        out.u32(var.var_type.0);
        out.u32(var.count);
        out.u32(var.location);
    });
    relocs.finish(&mut out)?;

    Ok(out.buf)
}

/// Serializes a pixel shader header block body.
pub fn pixel_shader_header_bytes(shader: &PixelShader) -> Result<Vec<u8>, GfdError> {
    let header = &shader.header;
    let regs = &header.regs;
    let mut out = BeWriter::default();

    out.u32(regs.sq_pgm_resources_ps);
    out.u32(regs.sq_pgm_exports_ps);
    out.u32(regs.spi_ps_in_control_0);
    out.u32(regs.spi_ps_in_control_1);
    out.u32(regs.num_spi_ps_input_cntl);
    for value in regs.spi_ps_input_cntls {
        out.u32(value);
    }
    out.u32(regs.cb_shader_mask);
    out.u32(regs.cb_shader_control);
    out.u32(regs.db_shader_control);
    out.u32(regs.spi_input_z);

    out.u32(to_u32("pixel shader program", shader.program.len())?);
    out.u32(0);
    out.u32(header.mode as u32);

    let slots = write_variable_slots(&mut out, &header.vars)?;
    write_rbuffer(&mut out, &header.gx2r_buffer);
    debug_assert_eq!(out.len(), PIXEL_SHADER_HEADER_SIZE);

    let mut relocs = Relocations::default();
    write_variable_tables(&mut out, &mut relocs, &slots, &header.vars);
    relocs.finish(&mut out)?;

    Ok(out.buf)
}

struct BlockWriter {
    out: BeWriter,
    next_id: u32,
    align: bool,
}

impl BlockWriter {
    fn block(&mut self, block_type: BlockType, index: u32, data: &[u8]) -> Result<(), GfdError> {
        let id = self.next_id;
        self.next_id += 1;

        self.out.u32(BLOCK_MAGIC);
        self.out.u32(BLOCK_HEADER_SIZE as u32);
        self.out.u32(BLOCK_MAJOR_VERSION);
        self.out.u32(0);
        self.out.u32(block_type as u32);
        self.out.u32(to_u32("block", data.len())?);
        self.out.u32(id);
        self.out.u32(index);
        self.out.bytes(data);
        Ok(())
    }

    /// Inserts a padding block so the next block's data starts on a 0x200 boundary.
    fn align_next_block(&mut self) -> Result<(), GfdError> {
        if !self.align {
            return Ok(());
        }
        let mut padding = (0x200 - ((self.out.len() + BLOCK_HEADER_SIZE) & 0x1FF)) & 0x1FF;
        if padding == 0 {
            return Ok(());
        }
        if padding < BLOCK_HEADER_SIZE {
            padding += 0x200;
        }
        padding -= BLOCK_HEADER_SIZE;
        self.block(BlockType::Padding, 0, &vec![0; padding])
    }
}

impl GfdFile {
    /// Serializes the whole container.
    pub fn to_bytes(&self, align: bool) -> Result<Vec<u8>, GfdError> {
        let mut writer = BlockWriter {
            out: BeWriter::default(),
            next_id: 0,
            align,
        };

        writer.out.u32(FILE_MAGIC);
        writer.out.u32(FILE_HEADER_SIZE);
        writer.out.u32(FILE_MAJOR_VERSION);
        writer.out.u32(FILE_MINOR_VERSION);
        writer.out.u32(FILE_GPU_VERSION);
        writer.out.u32(u32::from(align));
        writer.out.u32(0);
        writer.out.u32(0);

        for (index, shader) in self.vertex_shaders.iter().enumerate() {
            let index = to_u32("vertex shader index", index)?;
            writer.block(BlockType::VertexShaderHeader, index, &vertex_shader_header_bytes(shader)?)?;
            writer.align_next_block()?;
            writer.block(BlockType::VertexShaderProgram, index, &shader.program)?;
        }

        for (index, shader) in self.pixel_shaders.iter().enumerate() {
            let index = to_u32("pixel shader index", index)?;
            writer.block(BlockType::PixelShaderHeader, index, &pixel_shader_header_bytes(shader)?)?;
            writer.align_next_block()?;
            writer.block(BlockType::PixelShaderProgram, index, &shader.program)?;
        }

        writer.block(BlockType::EndOfFile, 0, &[])?;
        tracing::debug!(
            vertex_shaders = self.vertex_shaders.len(),
            pixel_shaders = self.pixel_shaders.len(),
            bytes = writer.out.len(),
            "wrote gfd container"
        );
        Ok(writer.out.buf)
    }

    pub fn write_to(&self, mut writer: impl Write, align: bool) -> Result<(), GfdError> {
        writer.write_all(&self.to_bytes(align)?)?;
        Ok(())
    }
}
