use latte_isa::{
    CfInst, CfInstType, CfWord0, CfWord1, ControlFlowInst, DataFormat, EndianSwap, FetchInst,
    FormatComp, IndexMode, NumFormat, Sel, SrfMode, TexFetchInst, TexInst, TexWord0, TexWord1,
    TexWord2, VtxFetchInst, VtxFetchType, VtxInst, VtxWord0, VtxWord1, VtxWord2,
};

use super::cf::normal_property;
use super::{
    check_index, out_of_range, prop_enum, prop_float, prop_number, prop_text, semantic,
    unknown_property, Annotation, ClauseKind, Compiler, PendingClause, Result,
};
use crate::ast::{
    FetchRegister, Property, TexClauseItem, TexClauseStatement, TexFetchStatement, VtxDst,
    VtxFetchStatement,
};
use crate::error::{SemanticError, SourceLocation};

/// COUNT plus COUNT_3 give four bits of instruction count.
const MAX_FETCH_CLAUSE_INSTS: usize = 16;

const IDENTITY_SWIZZLE: [Sel; 4] = [Sel::X, Sel::Y, Sel::Z, Sel::W];

/// Converts to signed fixed point with `frac_bits` fraction bits in a `width`-bit field.
fn signed_fixed(value: f32, frac_bits: u32, width: u32, what: &'static str, location: SourceLocation) -> Result<u32> {
    let scaled = (value * (1 << frac_bits) as f32).round();
    let min = -(1i64 << (width - 1));
    let max = (1i64 << (width - 1)) - 1;
    if !scaled.is_finite() || (scaled as i64) < min || (scaled as i64) > max {
        return Err(out_of_range(location, what, scaled as i64, max));
    }
    Ok((scaled as i32 as u32) & ((1 << width) - 1))
}

fn rel_flag(rel: Option<IndexMode>, location: SourceLocation) -> Result<bool> {
    match rel {
        None => Ok(false),
        Some(IndexMode::Loop) => Ok(true),
        Some(mode) => Err(semantic(
            location,
            SemanticError::InvalidOperand(format!(
                "fetch registers can only be indexed by AL, not {mode}"
            )),
        )),
    }
}

/// Axes named by a `DENORM(xyz)` style mask.
fn axis_mask(prop: &Property) -> Result<Vec<usize>> {
    prop_text(prop)?
        .chars()
        .map(|c| match c {
            'x' | 'X' => Ok(0),
            'y' | 'Y' => Ok(1),
            'z' | 'Z' => Ok(2),
            'w' | 'W' => Ok(3),
            _ => Err(super::invalid_value(prop)),
        })
        .collect()
}

fn compile_tex_inst(stmt: &TexFetchStatement) -> Result<TexFetchInst> {
    let op = TexInst::from_name(&stmt.opcode)
        .filter(|op| !matches!(op, TexInst::VtxFetch | TexInst::VtxSemantic))
        .ok_or_else(|| {
            semantic(
                stmt.location,
                SemanticError::UnknownTexInstruction(stmt.opcode.clone()),
            )
        })?;

    let src = &stmt.src;
    let mut word0 = TexWord0::default()
        .with_tex_inst(op.raw())
        .with_resource_id(check_index(stmt.location, "resource id", stmt.resource_id, 255)?)
        .with_src_gpr(check_index(stmt.location, "source register", src.gpr, 127)?)
        .with_src_rel(rel_flag(src.rel, stmt.location)?);

    let mut word1 = TexWord1::default();
    let dst_swizzle = match &stmt.dst {
        Some(FetchRegister { gpr, rel, swizzle }) => {
            word1 = word1
                .with_dst_gpr(check_index(stmt.location, "destination register", *gpr, 127)?)
                .with_dst_rel(rel_flag(*rel, stmt.location)?);
            swizzle.unwrap_or(IDENTITY_SWIZZLE)
        }
        None => [Sel::Mask; 4],
    };
    for (i, sel) in dst_swizzle.iter().enumerate() {
        word1 = word1.with_dst_sel(i, sel.raw()).with_coord_normalized(i, true);
    }

    let mut word2 = TexWord2::default()
        .with_sampler_id(check_index(stmt.location, "sampler id", stmt.sampler_id, 31)?);
    for (i, sel) in src.swizzle.unwrap_or(IDENTITY_SWIZZLE).iter().enumerate() {
        word2 = word2.with_src_sel(i, sel.raw());
    }

    for prop in &stmt.properties {
        match prop.name.as_str() {
            "ALT_CONST" => word0 = word0.with_alt_const(true),
            "BC_FRAC_MODE" => word0 = word0.with_bc_frac_mode(true),
            "WHOLE_QUAD_MODE" => word0 = word0.with_fetch_whole_quad(true),
            "DENORM" => {
                for axis in axis_mask(prop)? {
                    word1 = word1.with_coord_normalized(axis, false);
                }
            }
            "NORM" => {
                for axis in axis_mask(prop)? {
                    word1 = word1.with_coord_normalized(axis, true);
                }
            }
            "LOD" => {
                let lod = signed_fixed(prop_float(prop)?, 3, 7, "LOD bias", prop.location)?;
                word1 = word1.with_lod_bias(lod);
            }
            "XOFFSET" => {
                word2 = word2.with_offset_x(signed_fixed(prop_float(prop)?, 1, 5, "texel offset", prop.location)?);
            }
            "YOFFSET" => {
                word2 = word2.with_offset_y(signed_fixed(prop_float(prop)?, 1, 5, "texel offset", prop.location)?);
            }
            "ZOFFSET" => {
                word2 = word2.with_offset_z(signed_fixed(prop_float(prop)?, 1, 5, "texel offset", prop.location)?);
            }
            _ => return Err(unknown_property(prop, &stmt.opcode)),
        }
    }

    Ok(TexFetchInst { word0, word1, word2 })
}

fn compile_vtx_inst(stmt: &VtxFetchStatement) -> Result<VtxFetchInst> {
    let op = VtxInst::from_name(&stmt.opcode).ok_or_else(|| {
        semantic(
            stmt.location,
            SemanticError::UnknownVtxInstruction(stmt.opcode.clone()),
        )
    })?;

    let src_chan = stmt.src_chan.map_or(0, |chan| chan as u32);
    let mut word0 = VtxWord0::default()
        .with_vtx_inst(op.raw())
        .with_buffer_id(check_index(stmt.location, "buffer id", stmt.buffer_id, 255)?)
        .with_src_gpr(check_index(stmt.location, "source register", stmt.src_gpr, 127)?)
        .with_src_rel(rel_flag(stmt.src_rel, stmt.location)?)
        .with_src_sel_x(src_chan);

    let mut word1 = VtxWord1::default();
    let swizzle = match (op, &stmt.dst) {
        (VtxInst::Fetch, VtxDst::Gpr(FetchRegister { gpr, rel, swizzle })) => {
            word1 = word1
                .with_dst_gpr(check_index(stmt.location, "destination register", *gpr, 127)?)
                .with_dst_rel(rel_flag(*rel, stmt.location)?);
            swizzle.unwrap_or(IDENTITY_SWIZZLE)
        }
        (VtxInst::Semantic, VtxDst::Semantic { id, swizzle }) => {
            word1 = word1.with_semantic_id(check_index(stmt.location, "semantic id", *id, 255)?);
            swizzle.unwrap_or(IDENTITY_SWIZZLE)
        }
        (VtxInst::Fetch, VtxDst::Semantic { .. }) => {
            return Err(semantic(
                stmt.location,
                SemanticError::InvalidOperand("VFETCH writes a register, not a semantic".to_owned()),
            ))
        }
        (VtxInst::Semantic, VtxDst::Gpr(_)) => {
            return Err(semantic(
                stmt.location,
                SemanticError::InvalidOperand("SEMANTIC writes a semantic, not a register".to_owned()),
            ))
        }
    };
    for (i, sel) in swizzle.iter().enumerate() {
        word1 = word1.with_dst_sel(i, sel.raw());
    }

    let mut word2 = VtxWord2::default();
    for prop in &stmt.properties {
        match prop.name.as_str() {
            "FETCH_TYPE" => word0 = word0.with_fetch_type(prop_enum(prop, VtxFetchType::from_name)?.raw()),
            "FORMAT" => word1 = word1.with_data_format(prop_enum(prop, DataFormat::from_name)?.raw()),
            "NUM_FORMAT" => word1 = word1.with_num_format_all(prop_enum(prop, NumFormat::from_name)?.raw()),
            "FORMAT_COMP" => {
                let comp = prop_enum(prop, FormatComp::from_name)?;
                word1 = word1.with_format_comp_all(comp == FormatComp::Signed);
            }
            "SRF_MODE" => {
                let mode = prop_enum(prop, SrfMode::from_name)?;
                word1 = word1.with_srf_mode_all(mode == SrfMode::NoZero);
            }
            "USE_CONST_FIELDS" => word1 = word1.with_use_const_fields(true),
            "OFFSET" => word2 = word2.with_offset(prop_number(prop, 0xFFFF)?),
            "MEGA" => {
                let count = prop_number(prop, 64)?;
                if count == 0 {
                    return Err(out_of_range(prop.location, "mega fetch count", 0, 64));
                }
                word0 = word0.with_mega_fetch_count(count - 1);
                word2 = word2.with_mega_fetch(true);
            }
            "ENDIAN" => word2 = word2.with_endian_swap(prop_enum(prop, EndianSwap::from_name)?.raw()),
            "CONST_BUF_NO_STRIDE" => word2 = word2.with_const_buf_no_stride(true),
            "ALT_CONST" => word2 = word2.with_alt_const(true),
            "WHOLE_QUAD_MODE" => word0 = word0.with_fetch_whole_quad(true),
            _ => return Err(unknown_property(prop, &stmt.opcode)),
        }
    }

    Ok(VtxFetchInst { word0, word1, word2 })
}

impl Compiler {
    pub(super) fn tex_clause(&mut self, stmt: TexClauseStatement) -> Result<()> {
        let op = CfInst::from_name(&stmt.opcode)
            .filter(|op| matches!(op, CfInst::Tex | CfInst::Vtx | CfInst::VtxTc))
            .ok_or_else(|| {
                semantic(
                    stmt.location,
                    SemanticError::UnknownTexClauseInstruction(stmt.opcode.clone()),
                )
            })?;

        let mut word1 = CfWord1::default()
            .with_inst_type(CfInstType::Normal.raw())
            .with_cf_inst(op.raw())
            .with_barrier(true);
        let mut addr = None;
        let mut count = None;

        for prop in &stmt.properties {
            if normal_property(prop, &mut word1)? {
                continue;
            }
            match prop.name.as_str() {
                "ADDR" => {
                    addr = Some(Annotation {
                        value: prop_number(prop, u32::MAX)?,
                        location: prop.location,
                    });
                }
                "CNT" => {
                    count = Some(Annotation {
                        value: prop_number(prop, u32::MAX)?,
                        location: prop.location,
                    });
                }
                _ => return Err(unknown_property(prop, &stmt.opcode)),
            }
        }

        let cf_index = self.push_cf(
            stmt.index,
            stmt.location,
            ControlFlowInst::new(CfWord0::default().0, word1.0),
        )?;

        let offset = self.tex_data.len();
        let mut insts = 0usize;
        for item in stmt.items {
            let inst = match item {
                TexClauseItem::Comment(comment) => {
                    self.comments.push(comment);
                    continue;
                }
                TexClauseItem::Tex(tex) => {
                    if op != CfInst::Tex {
                        return Err(semantic(
                            tex.location,
                            SemanticError::InvalidOperand(format!(
                                "{} clauses can only contain vertex fetches",
                                op.name()
                            )),
                        ));
                    }
                    self.next_clause_pc(tex.index, tex.location)?;
                    FetchInst::Tex(compile_tex_inst(&tex)?)
                }
                TexClauseItem::Vtx(vtx) => {
                    self.next_clause_pc(vtx.index, vtx.location)?;
                    FetchInst::Vtx(compile_vtx_inst(&vtx)?)
                }
            };
            self.tex_data.extend_from_slice(&inst.words());
            insts += 1;
        }

        if insts == 0 {
            return Err(semantic(stmt.location, SemanticError::EmptyClause));
        }
        if insts > MAX_FETCH_CLAUSE_INSTS {
            return Err(semantic(
                stmt.location,
                SemanticError::ClauseTooLarge {
                    count: insts,
                    max: MAX_FETCH_CLAUSE_INSTS,
                },
            ));
        }

        tracing::debug!(cf_index, insts, clause = %op, "compiled fetch clause");
        self.clauses.push(PendingClause {
            kind: ClauseKind::Fetch,
            cf_index,
            offset,
            size: self.tex_data.len() - offset,
            addr,
            count,
            location: stmt.location,
        });
        Ok(())
    }
}
