use latte_isa::{CfCond, CfInst, CfInstType, CfWord0, CfWord1, ControlFlowInst};

use super::{prop_enum, prop_number, semantic, unknown_property, Compiler, Result};
use crate::ast::{CfStatement, Property};
use crate::error::SemanticError;

/// Applies the properties shared by plain control flow lines and fetch clause headers.
/// Returns `false` when the property is not one of them.
pub(super) fn normal_property(prop: &Property, word1: &mut CfWord1) -> Result<bool> {
    match prop.name.as_str() {
        "CND" => *word1 = word1.with_cond(prop_enum(prop, CfCond::from_name)?.raw()),
        "CF_CONST" => *word1 = word1.with_cf_const(prop_number(prop, 31)?),
        "POP_CNT" => *word1 = word1.with_pop_count(prop_number(prop, 7)?),
        "CALL_CNT" => *word1 = word1.with_call_count(prop_number(prop, 63)?),
        "NO_BARRIER" => *word1 = word1.with_barrier(false),
        "WHOLE_QUAD_MODE" => *word1 = word1.with_whole_quad_mode(true),
        "VALID_PIX" => *word1 = word1.with_valid_pixel_mode(true),
        _ => return Ok(false),
    }
    Ok(true)
}

impl Compiler {
    pub(super) fn cf_inst(&mut self, stmt: &CfStatement) -> Result<()> {
        let op = CfInst::from_name(&stmt.opcode).ok_or_else(|| {
            semantic(
                stmt.location,
                SemanticError::UnknownCfInstruction(stmt.opcode.clone()),
            )
        })?;

        let mut word0 = CfWord0::default();
        let mut word1 = CfWord1::default()
            .with_inst_type(CfInstType::Normal.raw())
            .with_cf_inst(op.raw())
            .with_barrier(true);

        for prop in &stmt.properties {
            if normal_property(prop, &mut word1)? {
                continue;
            }
            match prop.name.as_str() {
                // Jump target, taken as written.
                "ADDR" => word0 = word0.with_addr(prop_number(prop, u32::MAX)?),
                _ => return Err(unknown_property(prop, &stmt.opcode)),
            }
        }

        self.push_cf(
            stmt.index,
            stmt.location,
            ControlFlowInst::new(word0.0, word1.0),
        )?;
        Ok(())
    }
}
