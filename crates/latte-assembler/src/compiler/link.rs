//! Clause layout and the end-of-program pass.
//!
//! Clause payloads are placed after the control flow program: ALU clauses first, then
//! fetch clauses, each region starting on a 256-byte boundary. Addresses and counts are
//! only known once every clause has been compiled, so control flow instructions are
//! patched here.

use latte_isa::{
    CfAluWord0, CfAluWord1, CfInst, CfInstType, CfWord0, CfWord1, ControlFlowInst, FetchInst,
};

use super::{out_of_range, semantic, Annotation, ClauseKind, PendingClause, Result};
use crate::error::SemanticError;

/// 256 bytes in 64-bit units.
const CLAUSE_ALIGNMENT: u32 = 32;

/// Largest value of the 22-bit ALU clause address.
const MAX_ALU_ADDR: u32 = (1 << 22) - 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub alu_base: u32,
    pub tex_base: u32,
}

/// Flags the final instruction `END_OF_PROGRAM`, or appends a NOP carrying the flag when
/// the program ends with an ALU clause or is empty.
pub(super) fn mark_end_of_program(cf_insts: &mut Vec<ControlFlowInst>) {
    match cf_insts.last_mut() {
        Some(last) if matches!(last.inst_type(), CfInstType::Normal | CfInstType::Export) => {
            // Both the NORMAL and EXPORT second words keep the flag in bit 21.
            last.word1 = CfWord1(last.word1).with_end_of_program(true).0;
        }
        _ => {
            let word1 = CfWord1::default()
                .with_inst_type(CfInstType::Normal.raw())
                .with_cf_inst(CfInst::Nop.raw())
                .with_barrier(true)
                .with_end_of_program(true);
            cf_insts.push(ControlFlowInst::new(0, word1.0));
        }
    }
}

fn verify(annotation: Option<Annotation>, computed: u32, mismatch: impl Fn(u32) -> SemanticError) -> Result<()> {
    match annotation {
        Some(annotation) if annotation.value != computed => {
            Err(semantic(annotation.location, mismatch(annotation.value)))
        }
        _ => Ok(()),
    }
}

/// Resolves every clause address and count, checking them against any `ADDR`/`CNT`
/// written in the source.
pub(super) fn link(
    cf_insts: &mut [ControlFlowInst],
    clauses: &[PendingClause],
    alu_data: &[u32],
) -> Result<Layout> {
    let alu_base = (cf_insts.len() as u32).next_multiple_of(CLAUSE_ALIGNMENT);
    let tex_base = (alu_base + alu_data.len() as u32 / 2).next_multiple_of(CLAUSE_ALIGNMENT);

    for clause in clauses {
        let inst = &mut cf_insts[clause.cf_index];
        let (base, unit_words) = match clause.kind {
            ClauseKind::Alu => (alu_base, 2),
            ClauseKind::Fetch => (tex_base, FetchInst::WORDS),
        };
        let addr = base + (clause.offset / 2) as u32;
        // CNT is written as a plain count; the hardware field stores count - 1.
        let count = (clause.size / unit_words) as u32;

        verify(clause.addr, addr, |specified| SemanticError::AddrMismatch {
            computed: addr,
            specified,
        })?;
        verify(clause.count, count, |specified| SemanticError::CountMismatch {
            computed: count,
            specified,
        })?;

        match clause.kind {
            ClauseKind::Alu => {
                if addr > MAX_ALU_ADDR {
                    return Err(out_of_range(
                        clause.location,
                        "ALU clause address",
                        i64::from(addr),
                        i64::from(MAX_ALU_ADDR),
                    ));
                }
                inst.word0 = CfAluWord0(inst.word0).with_addr(addr).0;
                inst.word1 = CfAluWord1(inst.word1).with_count(count - 1).0;
            }
            ClauseKind::Fetch => {
                let stored = count - 1;
                inst.word0 = CfWord0(inst.word0).with_addr(addr).0;
                inst.word1 = CfWord1(inst.word1)
                    .with_count(stored & 7)
                    .with_count_3(stored >> 3 != 0)
                    .0;
            }
        }

        tracing::debug!(cf_index = clause.cf_index, addr, count, kind = ?clause.kind, "linked clause");
    }

    Ok(Layout { alu_base, tex_base })
}
