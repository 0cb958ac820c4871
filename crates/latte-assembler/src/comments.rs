//! Shader header metadata carried in assembly comments.
//!
//! A comment of the form `; $KEY[index].MEMBER = value` sets one field of a vertex or
//! pixel shader header. Comments without a leading `$` are ignored. Keys and members
//! are case-insensitive.

use thiserror::Error;

use crate::gfd::{
    AttribVar, LoopVar, PixelShaderHeader, SamplerVar, SamplerVarType, ShaderMode,
    ShaderVarType, ShaderVariables, UniformBlock, UniformInitialValue, UniformVar,
    VertexShaderHeader, MAX_ATTRIB_VARS,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommentError {
    #[error("Unknown key {0}")]
    UnknownKey(String),
    #[error("{register} does not have member {member}")]
    UnknownMember { register: String, member: String },
    #[error("{key} must be written as {expected}")]
    Shape { key: String, expected: &'static str },
    #[error("{key}[{index}] invalid index, max: {max}")]
    IndexOutOfRange { key: String, index: usize, max: usize },
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
    #[error("malformed header comment {0:?}")]
    Malformed(String),
}

type Result<T> = std::result::Result<T, CommentError>;

/// One parsed `$KEY[index].MEMBER = value` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentKeyValue {
    pub key: String,
    pub index: Option<usize>,
    pub member: Option<String>,
    pub value: String,
}

impl CommentKeyValue {
    /// Parses a comment's text. Returns `Ok(None)` for ordinary comments.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        let Some(rest) = text.trim().strip_prefix('$') else {
            return Ok(None);
        };
        let malformed = || CommentError::Malformed(text.trim().to_owned());

        let (lhs, value) = rest.split_once('=').ok_or_else(malformed)?;
        let (path, member) = match lhs.trim().split_once('.') {
            Some((path, member)) => (path, Some(member.trim().to_ascii_uppercase())),
            None => (lhs.trim(), None),
        };
        let (key, index) = match path.split_once('[') {
            Some((key, index)) => {
                let index = index.strip_suffix(']').ok_or_else(malformed)?;
                (key, Some(index.trim().parse().map_err(|_| malformed())?))
            }
            None => (path, None),
        };

        if key.is_empty() || member.as_deref() == Some("") {
            return Err(malformed());
        }

        Ok(Some(Self {
            key: key.trim().to_ascii_uppercase(),
            index,
            member,
            value: value.trim().to_owned(),
        }))
    }

    fn shape(&self, expected: &'static str) -> CommentError {
        CommentError::Shape {
            key: self.key.clone(),
            expected,
        }
    }

    fn expect_value(&self) -> Result<&str> {
        match (self.index, &self.member) {
            (None, None) => Ok(&self.value),
            _ => Err(self.shape("$KEY = value")),
        }
    }

    fn expect_object(&self) -> Result<&str> {
        match (self.index, &self.member) {
            (None, Some(member)) => Ok(member),
            _ => Err(self.shape("$KEY.MEMBER = value")),
        }
    }

    fn expect_array_of_objects(&self) -> Result<(usize, &str)> {
        match (self.index, &self.member) {
            (Some(index), Some(member)) => Ok((index, member)),
            _ => Err(self.shape("$KEY[index].MEMBER = value")),
        }
    }

    fn expect_array_of_values(&self) -> Result<usize> {
        match (self.index, &self.member) {
            (Some(index), None) => Ok(index),
            _ => Err(self.shape("$KEY[index] = value")),
        }
    }

    fn invalid(&self) -> CommentError {
        CommentError::InvalidValue {
            key: self.key.clone(),
            value: self.value.clone(),
        }
    }

    fn number(&self) -> Result<u32> {
        parse_number(&self.value).ok_or_else(|| self.invalid())
    }

    fn boolean(&self) -> Result<bool> {
        match self.value.to_ascii_lowercase().as_str() {
            "true" | "1" => Ok(true),
            "false" | "0" => Ok(false),
            _ => Err(self.invalid()),
        }
    }

    fn check_index(&self, index: usize, max: usize) -> Result<usize> {
        if index >= max {
            return Err(CommentError::IndexOutOfRange {
                key: self.key.clone(),
                index,
                max,
            });
        }
        Ok(index)
    }

    fn unknown_member(&self, member: &str) -> CommentError {
        let register = match self.index {
            Some(index) => format!("{}[{index}]", self.key),
            None => self.key.clone(),
        };
        CommentError::UnknownMember {
            register,
            member: member.to_owned(),
        }
    }
}

fn parse_number(text: &str) -> Option<u32> {
    let text = text.trim();
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}

#[derive(Debug, Clone, Copy)]
enum FieldKind {
    Number,
    Bool,
    Enum(&'static [(&'static str, u32)]),
}

/// A named bit range of a register.
#[derive(Debug, Clone, Copy)]
struct Field {
    name: &'static str,
    lo: u32,
    width: u32,
    kind: FieldKind,
}

const fn num(name: &'static str, lo: u32, width: u32) -> Field {
    Field {
        name,
        lo,
        width,
        kind: FieldKind::Number,
    }
}

const fn flag(name: &'static str, lo: u32) -> Field {
    Field {
        name,
        lo,
        width: 1,
        kind: FieldKind::Bool,
    }
}

const fn choice(name: &'static str, lo: u32, width: u32, values: &'static [(&'static str, u32)]) -> Field {
    Field {
        name,
        lo,
        width,
        kind: FieldKind::Enum(values),
    }
}

const SQ_PGM_RESOURCES_VS: &[Field] = &[
    num("NUM_GPRS", 0, 8),
    num("STACK_SIZE", 8, 8),
    flag("DX10_CLAMP", 21),
    flag("PRIME_CACHE_PGM_EN", 22),
    flag("PRIME_CACHE_ON_DRAW", 23),
    num("FETCH_CACHE_LINES", 24, 3),
    flag("UNCACHED_FIRST_INST", 28),
    flag("PRIME_CACHE_ENABLE", 29),
    flag("PRIME_CACHE_ON_CONST", 30),
];

const SQ_PGM_RESOURCES_PS: &[Field] = &[
    num("NUM_GPRS", 0, 8),
    num("STACK_SIZE", 8, 8),
    flag("DX10_CLAMP", 21),
    flag("PRIME_CACHE_PGM_EN", 22),
    flag("PRIME_CACHE_ON_DRAW", 23),
    num("FETCH_CACHE_LINES", 24, 3),
    flag("UNCACHED_FIRST_INST", 28),
    flag("PRIME_CACHE_ENABLE", 29),
    flag("PRIME_CACHE_ON_CONST", 30),
    flag("CLAMP_CONSTS", 31),
];

const VGT_PRIMITIVEID_EN: &[Field] = &[flag("PRIMITIVEID_EN", 0)];

const SPI_VS_OUT_CONFIG: &[Field] = &[
    flag("VS_PER_COMPONENT", 0),
    num("VS_EXPORT_COUNT", 1, 5),
    flag("VS_EXPORTS_FOG", 8),
    num("VS_OUT_FOG_VEC_ADDR", 9, 5),
];

const SPI_VS_OUT_ID: &[Field] = &[
    num("SEMANTIC_0", 0, 8),
    num("SEMANTIC_1", 8, 8),
    num("SEMANTIC_2", 16, 8),
    num("SEMANTIC_3", 24, 8),
];

const PA_CL_VS_OUT_CNTL: &[Field] = &[
    flag("CLIP_DIST_ENA_0", 0),
    flag("CLIP_DIST_ENA_1", 1),
    flag("CLIP_DIST_ENA_2", 2),
    flag("CLIP_DIST_ENA_3", 3),
    flag("CLIP_DIST_ENA_4", 4),
    flag("CLIP_DIST_ENA_5", 5),
    flag("CLIP_DIST_ENA_6", 6),
    flag("CLIP_DIST_ENA_7", 7),
    flag("CULL_DIST_ENA_0", 8),
    flag("CULL_DIST_ENA_1", 9),
    flag("CULL_DIST_ENA_2", 10),
    flag("CULL_DIST_ENA_3", 11),
    flag("CULL_DIST_ENA_4", 12),
    flag("CULL_DIST_ENA_5", 13),
    flag("CULL_DIST_ENA_6", 14),
    flag("CULL_DIST_ENA_7", 15),
    flag("USE_VTX_POINT_SIZE", 16),
    flag("USE_VTX_EDGE_FLAG", 17),
    flag("USE_VTX_RENDER_TARGET_INDX", 18),
    flag("USE_VTX_VIEWPORT_INDX", 19),
    flag("USE_VTX_KILL_FLAG", 20),
    flag("VS_OUT_MISC_VEC_ENA", 21),
    flag("VS_OUT_CCDIST0_VEC_ENA", 22),
    flag("VS_OUT_CCDIST1_VEC_ENA", 23),
    flag("VS_OUT_MISC_SIDE_BUS_ENA", 24),
    flag("USE_VTX_GS_CUT_FLAG", 25),
];

const SQ_VTX_SEMANTIC: &[Field] = &[num("SEMANTIC_ID", 0, 8)];

const VGT_STRMOUT_BUFFER_EN: &[Field] = &[
    flag("BUFFER_0_EN", 0),
    flag("BUFFER_1_EN", 1),
    flag("BUFFER_2_EN", 2),
    flag("BUFFER_3_EN", 3),
];

const VGT_VERTEX_REUSE_BLOCK_CNTL: &[Field] = &[num("VTX_REUSE_DEPTH", 0, 8)];

const VGT_HOS_REUSE_DEPTH: &[Field] = &[num("REUSE_DEPTH", 0, 8)];

const SQ_PGM_EXPORTS_PS: &[Field] = &[num("EXPORT_MODE", 0, 5)];

const BARYC_SAMPLE_CNTL: &[(&str, u32)] = &[
    ("CENTROIDS_ONLY", 0),
    ("CENTERS_ONLY", 1),
    ("CENTROIDS_AND_CENTERS", 2),
];

const SPI_PS_IN_CONTROL_0: &[Field] = &[
    num("NUM_INTERP", 0, 6),
    flag("POSITION_ENA", 8),
    flag("POSITION_CENTROID", 9),
    num("POSITION_ADDR", 10, 5),
    num("PARAM_GEN", 15, 4),
    num("PARAM_GEN_ADDR", 19, 7),
    choice("BARYC_SAMPLE_CNTL", 26, 2, BARYC_SAMPLE_CNTL),
    flag("PERSP_GRADIENT_ENA", 28),
    flag("LINEAR_GRADIENT_ENA", 29),
    flag("POSITION_SAMPLE", 30),
    flag("BARYC_AT_SAMPLE_ENA", 31),
];

const SPI_PS_IN_CONTROL_1: &[Field] = &[
    flag("GEN_INDEX_PIX", 0),
    num("GEN_INDEX_PIX_ADDR", 1, 7),
    flag("FRONT_FACE_ENA", 8),
    num("FRONT_FACE_CHAN", 9, 2),
    flag("FRONT_FACE_ALL_BITS", 11),
    num("FRONT_FACE_ADDR", 12, 5),
    num("FOG_ADDR", 17, 7),
    flag("FIXED_PT_POSITION_ENA", 24),
    num("FIXED_PT_POSITION_ADDR", 25, 5),
    flag("POSITION_ULC", 30),
];

const SPI_PS_INPUT_CNTL: &[Field] = &[
    num("SEMANTIC", 0, 8),
    num("DEFAULT_VAL", 8, 2),
    flag("FLAT_SHADE", 10),
    flag("SEL_CENTROID", 11),
    flag("SEL_LINEAR", 12),
    num("CYL_WRAP", 13, 4),
    flag("PT_SPRITE_TEX", 17),
    flag("SEL_SAMPLE", 18),
];

const CB_SHADER_MASK: &[Field] = &[
    num("OUTPUT0_ENABLE", 0, 4),
    num("OUTPUT1_ENABLE", 4, 4),
    num("OUTPUT2_ENABLE", 8, 4),
    num("OUTPUT3_ENABLE", 12, 4),
    num("OUTPUT4_ENABLE", 16, 4),
    num("OUTPUT5_ENABLE", 20, 4),
    num("OUTPUT6_ENABLE", 24, 4),
    num("OUTPUT7_ENABLE", 28, 4),
];

const CB_SHADER_CONTROL: &[Field] = &[
    flag("RT0_ENABLE", 0),
    flag("RT1_ENABLE", 1),
    flag("RT2_ENABLE", 2),
    flag("RT3_ENABLE", 3),
    flag("RT4_ENABLE", 4),
    flag("RT5_ENABLE", 5),
    flag("RT6_ENABLE", 6),
    flag("RT7_ENABLE", 7),
];

const Z_ORDER: &[(&str, u32)] = &[
    ("LATE_Z", 0),
    ("EARLY_Z_THEN_LATE_Z", 1),
    ("RE_Z", 2),
    ("EARLY_Z_THEN_RE_Z", 3),
];

const DB_SHADER_CONTROL: &[Field] = &[
    flag("Z_EXPORT_ENABLE", 0),
    flag("STENCIL_REF_EXPORT_ENABLE", 1),
    choice("Z_ORDER", 4, 2, Z_ORDER),
    flag("KILL_ENABLE", 6),
    flag("COVERAGE_TO_MASK_ENABLE", 7),
    flag("MASK_EXPORT_ENABLE", 8),
    flag("DUAL_EXPORT_ENABLE", 9),
    flag("EXEC_ON_HIER_FAIL", 10),
    flag("EXEC_ON_NOOP", 11),
    flag("ALPHA_TO_MASK_DISABLE", 12),
];

const SPI_INPUT_Z: &[Field] = &[flag("PROVIDE_Z_TO_SPI", 0)];

/// Writes `kv.value` into the field of `register` named `member`.
fn set_field(register: &mut u32, fields: &[Field], kv: &CommentKeyValue, member: &str) -> Result<()> {
    let field = fields
        .iter()
        .find(|field| field.name == member)
        .ok_or_else(|| kv.unknown_member(member))?;

    let value = match field.kind {
        FieldKind::Number => kv.number()?,
        FieldKind::Bool => u32::from(kv.boolean()?),
        FieldKind::Enum(values) => {
            let name = kv.value.to_ascii_uppercase();
            match values.iter().find(|(entry, _)| *entry == name) {
                Some((_, value)) => *value,
                None => kv.number()?,
            }
        }
    };

    let mask = if field.width == 32 {
        u32::MAX
    } else {
        (1 << field.width) - 1
    };
    if value > mask {
        return Err(kv.invalid());
    }
    *register = (*register & !(mask << field.lo)) | (value << field.lo);
    Ok(())
}

fn set_object(register: &mut u32, fields: &[Field], kv: &CommentKeyValue) -> Result<()> {
    let member = kv.expect_object()?;
    set_field(register, fields, kv, member)
}

fn set_array_object(registers: &mut [u32], fields: &[Field], kv: &CommentKeyValue) -> Result<()> {
    let (index, member) = kv.expect_array_of_objects()?;
    let index = kv.check_index(index, registers.len())?;
    set_field(&mut registers[index], fields, kv, member)
}

/// Grows `items` so `index` is valid, filling new slots with `fill(slot)`.
fn slot<T>(items: &mut Vec<T>, index: usize, fill: impl Fn(usize) -> T) -> &mut T {
    if index >= items.len() {
        let start = items.len();
        items.extend((start..=index).map(fill));
    }
    &mut items[index]
}

fn parse_initial_value(kv: &CommentKeyValue) -> Result<[f32; 4]> {
    let mut value = [0.0; 4];
    let mut parts = kv.value.split(',');
    for component in &mut value {
        let part = parts.next().ok_or_else(|| kv.invalid())?;
        *component = part
            .trim()
            .trim_end_matches('f')
            .parse()
            .map_err(|_| kv.invalid())?;
    }
    if parts.next().is_some() {
        return Err(kv.invalid());
    }
    Ok(value)
}

/// Keys shared by vertex and pixel shaders. Returns `false` when `kv` is not one of them.
fn apply_shared(vars: &mut ShaderVariables, mode: &mut ShaderMode, kv: &CommentKeyValue) -> Result<bool> {
    match kv.key.as_str() {
        "MODE" => {
            *mode = ShaderMode::from_name(kv.expect_value()?).ok_or_else(|| kv.invalid())?;
        }
        "UNIFORM_BLOCKS" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let block = slot(&mut vars.uniform_blocks, index, |_| UniformBlock::default());
            match member {
                "NAME" => block.name = kv.value.clone(),
                "OFFSET" => block.offset = kv.number()?,
                "SIZE" => block.size = kv.number()?,
                _ => return Err(kv.unknown_member(member)),
            }
        }
        "UNIFORM_VARS" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let var = slot(&mut vars.uniform_vars, index, |_| UniformVar {
                block: -1,
                ..UniformVar::default()
            });
            match member {
                "NAME" => var.name = kv.value.clone(),
                "TYPE" => var.var_type = ShaderVarType::from_name(&kv.value).ok_or_else(|| kv.invalid())?,
                "COUNT" => var.count = kv.number()?,
                "OFFSET" => var.offset = kv.number()?,
                "BLOCK" => {
                    var.block = kv.value.parse().map_err(|_| kv.invalid())?;
                }
                _ => return Err(kv.unknown_member(member)),
            }
        }
        "INITIAL_VALUES" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let initial = slot(&mut vars.initial_values, index, |_| UniformInitialValue::default());
            match member {
                "VALUE" => initial.value = parse_initial_value(kv)?,
                "OFFSET" => initial.offset = kv.number()?,
                _ => return Err(kv.unknown_member(member)),
            }
        }
        "LOOP_VARS" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let var = slot(&mut vars.loop_vars, index, |_| LoopVar::default());
            match member {
                "OFFSET" => var.offset = kv.number()?,
                "VALUE" => var.value = kv.number()?,
                _ => return Err(kv.unknown_member(member)),
            }
        }
        "SAMPLER_VARS" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let var = slot(&mut vars.sampler_vars, index, |i| SamplerVar {
                location: i as u32,
                ..SamplerVar::default()
            });
            match member {
                "NAME" => var.name = kv.value.clone(),
                "TYPE" => var.var_type = SamplerVarType::from_name(&kv.value).ok_or_else(|| kv.invalid())?,
                "LOCATION" => var.location = kv.number()?,
                _ => return Err(kv.unknown_member(member)),
            }
        }
        _ => return Ok(false),
    }
    Ok(true)
}

/// Applies every `$` comment in `comments` to a vertex shader header.
pub fn parse_vertex_shader_comments<'a>(
    header: &mut VertexShaderHeader,
    comments: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for comment in comments {
        let Some(kv) = CommentKeyValue::parse(comment)? else {
            continue;
        };
        apply_vertex(header, &kv)?;
    }
    Ok(())
}

fn apply_vertex(header: &mut VertexShaderHeader, kv: &CommentKeyValue) -> Result<()> {
    let regs = &mut header.regs;
    match kv.key.as_str() {
        "SQ_PGM_RESOURCES_VS" => set_object(&mut regs.sq_pgm_resources_vs, SQ_PGM_RESOURCES_VS, kv)?,
        "VGT_PRIMITIVEID_EN" => set_object(&mut regs.vgt_primitiveid_en, VGT_PRIMITIVEID_EN, kv)?,
        "SPI_VS_OUT_CONFIG" => set_object(&mut regs.spi_vs_out_config, SPI_VS_OUT_CONFIG, kv)?,
        "NUM_SPI_VS_OUT_ID" => {
            kv.expect_value()?;
            regs.num_spi_vs_out_id = kv.number()?;
        }
        "SPI_VS_OUT_ID" => set_array_object(&mut regs.spi_vs_out_id, SPI_VS_OUT_ID, kv)?,
        "PA_CL_VS_OUT_CNTL" => set_object(&mut regs.pa_cl_vs_out_cntl, PA_CL_VS_OUT_CNTL, kv)?,
        "SQ_VTX_SEMANTIC_CLEAR" => {
            kv.expect_value()?;
            regs.sq_vtx_semantic_clear = kv.number()?;
        }
        "NUM_SQ_VTX_SEMANTIC" => {
            kv.expect_value()?;
            regs.num_sq_vtx_semantic = kv.number()?;
        }
        "SQ_VTX_SEMANTIC" => set_array_object(&mut regs.sq_vtx_semantic, SQ_VTX_SEMANTIC, kv)?,
        "VGT_STRMOUT_BUFFER_EN" => set_object(&mut regs.vgt_strmout_buffer_en, VGT_STRMOUT_BUFFER_EN, kv)?,
        "VGT_VERTEX_REUSE_BLOCK_CNTL" => {
            set_object(&mut regs.vgt_vertex_reuse_block_cntl, VGT_VERTEX_REUSE_BLOCK_CNTL, kv)?
        }
        "VGT_HOS_REUSE_DEPTH" => set_object(&mut regs.vgt_hos_reuse_depth, VGT_HOS_REUSE_DEPTH, kv)?,
        "ATTRIB_VARS" => {
            let (index, member) = kv.expect_array_of_objects()?;
            let index = kv.check_index(index, MAX_ATTRIB_VARS)?;
            let var = slot(&mut header.attrib_vars, index, |i| AttribVar {
                location: i as u32,
                ..AttribVar::default()
            });
            match member {
                "NAME" => var.name = kv.value.clone(),
                "TYPE" => var.var_type = ShaderVarType::from_name(&kv.value).ok_or_else(|| kv.invalid())?,
                "COUNT" => var.count = kv.number()?,
                "LOCATION" => var.location = kv.number()?,
                _ => return Err(kv.unknown_member(member)),
            }
        }
        "RING_ITEM_SIZE" => {
            kv.expect_value()?;
            header.ring_item_size = kv.number()?;
        }
        "HAS_STREAM_OUT" => {
            kv.expect_value()?;
            header.has_stream_out = kv.boolean()?;
        }
        "STREAM_OUT_STRIDE" => {
            let index = kv.expect_array_of_values()?;
            let index = kv.check_index(index, header.stream_out_stride.len())?;
            header.stream_out_stride[index] = kv.number()?;
        }
        _ => {
            if !apply_shared(&mut header.vars, &mut header.mode, kv)? {
                return Err(CommentError::UnknownKey(kv.key.clone()));
            }
        }
    }
    Ok(())
}

/// Applies every `$` comment in `comments` to a pixel shader header.
pub fn parse_pixel_shader_comments<'a>(
    header: &mut PixelShaderHeader,
    comments: impl IntoIterator<Item = &'a str>,
) -> Result<()> {
    for comment in comments {
        let Some(kv) = CommentKeyValue::parse(comment)? else {
            continue;
        };
        apply_pixel(header, &kv)?;
    }
    Ok(())
}

fn apply_pixel(header: &mut PixelShaderHeader, kv: &CommentKeyValue) -> Result<()> {
    let regs = &mut header.regs;
    match kv.key.as_str() {
        "SQ_PGM_RESOURCES_PS" => set_object(&mut regs.sq_pgm_resources_ps, SQ_PGM_RESOURCES_PS, kv)?,
        "SQ_PGM_EXPORTS_PS" => set_object(&mut regs.sq_pgm_exports_ps, SQ_PGM_EXPORTS_PS, kv)?,
        "SPI_PS_IN_CONTROL_0" => set_object(&mut regs.spi_ps_in_control_0, SPI_PS_IN_CONTROL_0, kv)?,
        "SPI_PS_IN_CONTROL_1" => set_object(&mut regs.spi_ps_in_control_1, SPI_PS_IN_CONTROL_1, kv)?,
        "NUM_SPI_PS_INPUT_CNTL" => {
            kv.expect_value()?;
            regs.num_spi_ps_input_cntl = kv.number()?;
        }
        "SPI_PS_INPUT_CNTL" => set_array_object(&mut regs.spi_ps_input_cntls, SPI_PS_INPUT_CNTL, kv)?,
        "CB_SHADER_MASK" => set_object(&mut regs.cb_shader_mask, CB_SHADER_MASK, kv)?,
        "CB_SHADER_CONTROL" => set_object(&mut regs.cb_shader_control, CB_SHADER_CONTROL, kv)?,
        "DB_SHADER_CONTROL" => set_object(&mut regs.db_shader_control, DB_SHADER_CONTROL, kv)?,
        "SPI_INPUT_Z" => set_object(&mut regs.spi_input_z, SPI_INPUT_Z, kv)?,
        _ => {
            if !apply_shared(&mut header.vars, &mut header.mode, kv)? {
                return Err(CommentError::UnknownKey(kv.key.clone()));
            }
        }
    }
    Ok(())
}
