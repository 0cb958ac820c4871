//! Texture fetch clauses.

use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::disasm::texel_offset_value;
use latte_isa::{ControlFlowInst, Sel, TexDim, TexFetchInst, TexInst};

use crate::descriptor::SamplerUsage;
use crate::error::{Result, TranslateErrorKind};
use crate::swizzle::{condense, select_value, select_vector};
use crate::translate::{State, TexFn};

pub(crate) fn lookup(op: TexInst) -> Option<TexFn> {
    static TABLE: OnceLock<HashMap<TexInst, TexFn>> = OnceLock::new();
    TABLE.get_or_init(table).get(&op).copied()
}

fn table() -> HashMap<TexInst, TexFn> {
    let mut table: HashMap<TexInst, TexFn> = HashMap::new();
    table.insert(TexInst::Fetch4, fetch4);
    table.insert(TexInst::GetGradientsH, get_gradients_h);
    table.insert(TexInst::GetGradientsV, get_gradients_v);
    table.insert(TexInst::GetTextureInfo, get_texture_info);
    table.insert(TexInst::SetCubemapIndex, set_cubemap_index);
    table.insert(TexInst::Sample, sample);
    table.insert(TexInst::SampleC, sample_c);
    table.insert(TexInst::SampleL, sample_l);
    table.insert(TexInst::SampleLz, sample_lz);
    table.insert(TexInst::Ld, ld);
    table
}

/// Number of coordinate components a sampler of `dim` takes, including the array layer
/// and the depth reference of shadow lookups.
fn sampler_arg_count(dim: TexDim, shadow: bool) -> Result<usize> {
    let coords = match dim {
        TexDim::Dim1D => 1,
        TexDim::Dim2D | TexDim::Dim2DMsaa | TexDim::Dim1DArray => 2,
        TexDim::Dim3D if shadow => {
            return Err(TranslateErrorKind::UnsupportedSamplerDim { dim, shadow })
        }
        TexDim::Dim3D | TexDim::Cube | TexDim::Dim2DArray | TexDim::Dim2DArrayMsaa => 3,
    };
    Ok(coords + usize::from(shadow))
}

fn is_msaa(dim: TexDim) -> bool {
    matches!(dim, TexDim::Dim2DMsaa | TexDim::Dim2DArrayMsaa)
}

fn register(index: u32, rel: bool) -> String {
    if rel {
        format!("R[{index} + AL]")
    } else {
        format!("R[{index}]")
    }
}

fn src_sels(inst: &TexFetchInst) -> Result<[Sel; 4]> {
    let mut sels = [Sel::X; 4];
    for (i, sel) in sels.iter_mut().enumerate() {
        let raw = inst.word2.src_sel(i);
        *sel = Sel::from_raw(raw).ok_or(TranslateErrorKind::InvalidSelect(raw))?;
    }
    Ok(sels)
}

fn dst_sels(inst: &TexFetchInst) -> [u32; 4] {
    [0, 1, 2, 3].map(|i| inst.word1.dst_sel(i))
}

/// Records how a sampler slot is used; a slot cannot be both a plain and a shadow sampler.
fn register_sampler(state: &mut State<'_>, id: u32, usage: SamplerUsage) -> Result<TexDim> {
    let slot = state
        .sampler_usage
        .get_mut(id as usize)
        .ok_or(TranslateErrorKind::SamplerOutOfRange(id))?;
    if *slot != SamplerUsage::Unused && *slot != usage {
        return Err(TranslateErrorKind::SamplerUsageConflict {
            id,
            previous: *slot,
            requested: usage,
        });
    }
    *slot = usage;
    Ok(state.desc.sampler_dims[id as usize])
}

/// Trailing argument of a sampling call.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Extra {
    None,
    /// Explicit LOD taken from the source W selector.
    Lod,
    ZeroLod,
    /// Integer mip level of a texel fetch.
    IntLod,
}

struct Sampling {
    func: &'static str,
    offset_func: &'static str,
    shadow: bool,
    extra: Extra,
    int_coords: bool,
}

fn sample_with(state: &mut State<'_>, inst: &TexFetchInst, sampling: Sampling) -> Result<()> {
    let sampler_id = inst.word2.sampler_id();
    let resource_id = inst.word0.resource_id();
    let usage = if sampling.shadow {
        SamplerUsage::Shadow
    } else {
        SamplerUsage::Texture
    };
    let dim = register_sampler(state, sampler_id, usage)?;
    if resource_id != sampler_id {
        return Err(TranslateErrorKind::ResourceSamplerMismatch {
            resource: resource_id,
            sampler: sampler_id,
        });
    }

    let (dst_mask, dst_sels) = condense(&dst_sels(inst))?;
    if dst_sels.is_empty() {
        return Ok(());
    }

    let dst = register(inst.word1.dst_gpr(), inst.word1.dst_rel());
    let src = register(inst.word0.src_gpr(), inst.word0.src_rel());
    let elements = sampler_arg_count(dim, sampling.shadow)?;
    let mut src_sels = src_sels(inst)?;

    // The depth reference is in W, GLSL expects it as the last coordinate.
    if sampling.shadow && elements < 4 {
        src_sels[elements - 1] = src_sels[3];
    }

    let raw_offsets = [
        inst.word2.offset_x(),
        inst.word2.offset_y(),
        inst.word2.offset_z(),
    ];
    let has_offsets = raw_offsets.iter().any(|&raw| raw != 0);
    // GLSL offsets are integral, half-texel offsets round toward zero.
    let offsets = raw_offsets.map(|raw| texel_offset_value(raw).trunc() as i32);

    let mut coords = select_vector(&src, &src_sels[..elements])?;
    if sampling.int_coords {
        coords = format!("floatBitsToInt({coords})");
    }

    let mut args = vec![format!("sampler_{sampler_id}"), coords];
    match sampling.extra {
        Extra::None => {}
        Extra::Lod => args.push(select_value(&src, src_sels[3])?),
        Extra::ZeroLod => args.push("0".to_owned()),
        Extra::IntLod if !is_msaa(dim) => {
            args.push(format!("floatBitsToInt({})", select_value(&src, src_sels[3])?));
        }
        Extra::IntLod => {}
    }

    if has_offsets {
        let [x, y, z] = offsets;
        args.push(match dim {
            TexDim::Dim1D | TexDim::Dim1DArray => x.to_string(),
            TexDim::Dim2D | TexDim::Dim2DArray | TexDim::Dim2DMsaa | TexDim::Dim2DArrayMsaa => {
                format!("ivec2({x}, {y})")
            }
            TexDim::Dim3D => format!("ivec3({x}, {y}, {z})"),
            TexDim::Cube => return Err(TranslateErrorKind::UnsupportedOffsetDim(dim)),
        });
    }

    if is_msaa(dim) {
        args.push("0".to_owned());
    }

    let func = if has_offsets {
        sampling.offset_func
    } else {
        sampling.func
    };
    let target = if sampling.shadow { "texTmp.x" } else { "texTmp" };
    state
        .out
        .line(&format!("{target} = {func}({});", args.join(", ")));
    state.out.line(&format!(
        "{dst}.{dst_mask} = {};",
        select_vector("texTmp", &dst_sels)?
    ));
    Ok(())
}

fn sample(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "texture",
            offset_func: "textureOffset",
            shadow: false,
            extra: Extra::None,
            int_coords: false,
        },
    )
}

fn sample_c(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "texture",
            offset_func: "textureOffset",
            shadow: true,
            extra: Extra::None,
            int_coords: false,
        },
    )
}

fn sample_l(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "textureLod",
            offset_func: "textureLodOffset",
            shadow: false,
            extra: Extra::Lod,
            int_coords: false,
        },
    )
}

fn sample_lz(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "textureLod",
            offset_func: "textureLodOffset",
            shadow: false,
            extra: Extra::ZeroLod,
            int_coords: false,
        },
    )
}

fn fetch4(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "textureGather",
            offset_func: "textureGatherOffset",
            shadow: false,
            extra: Extra::None,
            int_coords: false,
        },
    )
}

fn ld(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    sample_with(
        state,
        inst,
        Sampling {
            func: "texelFetch",
            offset_func: "texelFetchOffset",
            shadow: false,
            extra: Extra::IntLod,
            int_coords: true,
        },
    )
}

fn gradients(state: &mut State<'_>, inst: &TexFetchInst, func: &str) -> Result<()> {
    let (dst_mask, dst_sels) = condense(&dst_sels(inst))?;
    if dst_sels.is_empty() {
        return Ok(());
    }

    let dst = register(inst.word1.dst_gpr(), inst.word1.dst_rel());
    let src = register(inst.word0.src_gpr(), inst.word0.src_rel());
    let src_sels = src_sels(inst)?;
    let value = select_vector(&src, &src_sels[..dst_sels.len()])?;

    state.out.line(&format!("{dst}.{dst_mask} = {func}({value});"));
    Ok(())
}

fn get_gradients_h(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    gradients(state, inst, "dFdx")
}

fn get_gradients_v(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    gradients(state, inst, "dFdy")
}

/// Texture size of the mip level in the source X selector into XYZ, and the number of
/// mip levels into W.
fn get_texture_info(state: &mut State<'_>, _cf: &ControlFlowInst, inst: &TexFetchInst) -> Result<()> {
    let id = inst.word0.resource_id();
    let dim = register_sampler(state, id, SamplerUsage::Texture)?;

    let (dst_mask, dst_sels) = condense(&dst_sels(inst))?;
    if dst_sels.is_empty() {
        return Ok(());
    }

    let dst = register(inst.word1.dst_gpr(), inst.word1.dst_rel());
    let src = register(inst.word0.src_gpr(), inst.word0.src_rel());
    let src_sels = src_sels(inst)?;

    if dst_sels.iter().any(|sel| matches!(sel, Sel::X | Sel::Y | Sel::Z)) {
        let components = match dim {
            TexDim::Dim1D => 1,
            TexDim::Dim2D | TexDim::Cube | TexDim::Dim1DArray | TexDim::Dim2DMsaa => 2,
            TexDim::Dim3D | TexDim::Dim2DArray | TexDim::Dim2DArrayMsaa => 3,
        };
        let lod = if is_msaa(dim) {
            String::new()
        } else {
            format!(", floatBitsToInt({})", select_value(&src, src_sels[0])?)
        };
        let size = match components {
            1 => format!("ivec3(textureSize(sampler_{id}{lod}), 1, 1)"),
            2 => format!("ivec3(textureSize(sampler_{id}{lod}), 1)"),
            _ => format!("textureSize(sampler_{id}{lod})"),
        };
        state.out.line(&format!("texTmp.xyz = intBitsToFloat({size});"));
    }
    if dst_sels.contains(&Sel::W) {
        state.out.line(&format!(
            "texTmp.w = intBitsToFloat(textureQueryLevels(sampler_{id}));"
        ));
    }

    state.out.line(&format!(
        "{dst}.{dst_mask} = {};",
        select_vector("texTmp", &dst_sels)?
    ));
    Ok(())
}

// Cube array layers are not exposed, so the index has nothing to select.
fn set_cubemap_index(_state: &mut State<'_>, _cf: &ControlFlowInst, _inst: &TexFetchInst) -> Result<()> {
    Ok(())
}
