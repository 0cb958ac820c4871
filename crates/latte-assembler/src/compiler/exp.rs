use latte_isa::{
    CfExpInst, ControlFlowInst, ExpBufWord1, ExpSwizWord1, ExpWord0, ExportType,
    IndexMode, Sel, EXPORT_POSITION_BASE,
};

use super::{check_index, prop_number, semantic, unknown_property, Compiler, Result};
use crate::ast::{ExportStatement, ExportTarget};
use crate::error::SemanticError;

const MAX_POSITION: u32 = 3;
const MAX_PARAMETER: u32 = 31;
const MAX_PIXEL: u32 = 7;
const MAX_ARRAY_BASE: u32 = 0x1FFF;

/// Flags shared by both forms of the second export word.
#[derive(Default)]
struct ExportFlags {
    burst_count: u32,
    elem_size: u32,
    array_size: Option<u32>,
    no_barrier: bool,
    whole_quad_mode: bool,
    valid_pixel_mode: bool,
}

impl Compiler {
    pub(super) fn exp_inst(&mut self, stmt: &ExportStatement) -> Result<()> {
        let op = CfExpInst::from_name(&stmt.opcode).ok_or_else(|| {
            semantic(
                stmt.location,
                SemanticError::UnknownExportInstruction(stmt.opcode.clone()),
            )
        })?;

        let mut flags = ExportFlags::default();
        for prop in &stmt.properties {
            match prop.name.as_str() {
                "BURSTCNT" => flags.burst_count = prop_number(prop, 15)?,
                "ELEM_SIZE" => flags.elem_size = prop_number(prop, 3)?,
                "ARRAY_SIZE" if op.is_memory() => flags.array_size = Some(prop_number(prop, 0xFFF)?),
                "NO_BARRIER" => flags.no_barrier = true,
                "WHOLE_QUAD_MODE" => flags.whole_quad_mode = true,
                "VALID_PIX" => flags.valid_pixel_mode = true,
                _ => return Err(unknown_property(prop, &stmt.opcode)),
            }
        }

        let gpr = check_index(stmt.location, "export source register", stmt.src.gpr, 127)?;
        check_index(
            stmt.location,
            "last burst source register",
            gpr + flags.burst_count,
            127,
        )?;
        let rw_rel = match stmt.src.rel {
            None => false,
            Some(IndexMode::Loop) => true,
            Some(mode) => {
                return Err(semantic(
                    stmt.location,
                    SemanticError::InvalidOperand(format!(
                        "exports can only be indexed by AL, not {mode}"
                    )),
                ))
            }
        };
        let swizzle = stmt.src.swizzle.unwrap_or([Sel::X, Sel::Y, Sel::Z, Sel::W]);
        let invalid_target = || {
            semantic(
                stmt.location,
                SemanticError::InvalidExportTarget(stmt.opcode.clone()),
            )
        };

        let mut word0 = ExpWord0::default()
            .with_rw_gpr(gpr)
            .with_rw_rel(rw_rel)
            .with_elem_size(flags.elem_size);

        let word1 = if op.is_memory() {
            let ExportTarget::Memory { kind, base } = stmt.target else {
                return Err(invalid_target());
            };
            word0 = word0
                .with_export_type(kind.raw())
                .with_array_base(check_index(stmt.location, "export array base", base, MAX_ARRAY_BASE)?);

            let comp_mask = swizzle
                .iter()
                .enumerate()
                .filter(|(_, sel)| **sel != Sel::Mask)
                .fold(0, |mask, (i, _)| mask | (1 << i));

            if let Some(stream) = op.stream_index() {
                self.exports.streams[stream as usize] = true;
            }

            ExpBufWord1::default()
                .with_array_size(flags.array_size.unwrap_or(0))
                .with_comp_mask(comp_mask)
                .with_burst_count(flags.burst_count)
                .with_cf_inst(op.raw())
                .with_valid_pixel_mode(flags.valid_pixel_mode)
                .with_whole_quad_mode(flags.whole_quad_mode)
                .with_barrier(!flags.no_barrier)
                .0
        } else {
            let (export_type, base) = match stmt.target {
                ExportTarget::Position(index) => {
                    let index = check_index(stmt.location, "position export", index, MAX_POSITION)?;
                    let last = index + flags.burst_count;
                    self.exports.max_position = self.exports.max_position.max(Some(last));
                    (ExportType::Position, EXPORT_POSITION_BASE + index)
                }
                ExportTarget::Parameter(index) => {
                    let index = check_index(stmt.location, "parameter export", index, MAX_PARAMETER)?;
                    let last = index + flags.burst_count;
                    self.exports.max_parameter = self.exports.max_parameter.max(Some(last));
                    (ExportType::Parameter, index)
                }
                ExportTarget::Pixel(index) => {
                    let index = check_index(stmt.location, "pixel export", index, MAX_PIXEL)?;
                    let last = index + flags.burst_count;
                    self.exports.max_pixel = self.exports.max_pixel.max(Some(last));
                    (ExportType::Pixel, index)
                }
                ExportTarget::Memory { .. } => return Err(invalid_target()),
            };
            word0 = word0
                .with_export_type(export_type.raw())
                .with_array_base(base);

            let mut word1 = ExpSwizWord1::default();
            for (i, sel) in swizzle.iter().enumerate() {
                word1 = word1.with_sel(i, sel.raw());
            }
            word1
                .with_burst_count(flags.burst_count)
                .with_cf_inst(op.raw())
                .with_valid_pixel_mode(flags.valid_pixel_mode)
                .with_whole_quad_mode(flags.whole_quad_mode)
                .with_barrier(!flags.no_barrier)
                .0
        };

        self.push_cf(stmt.index, stmt.location, ControlFlowInst::new(word0.0, word1))?;
        Ok(())
    }
}
