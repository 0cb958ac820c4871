use latte_isa::{
    alu_src, AluGroupUnits, AluInst, AluOpcode, AluUnit, AluWord0, AluWord1Op2, AluWord1Op3, Chan,
    CfAluInst, CfAluWord0, CfAluWord1, ControlFlowInst, IndexMode, KcacheMode, OutputModifier,
    PredSel, ScalarBankSwizzle, VecBankSwizzle, MAX_GROUP_INSTS, MAX_GROUP_LITERALS,
};

use super::{
    check_index, out_of_range, prop_number, prop_text, semantic, unknown_property, Annotation,
    ClauseKind, Compiler, PendingClause, Result,
};
use crate::ast::{
    AluClauseItem, AluClauseStatement, AluDst, AluGroupStatement, AluInstStatement, AluSrc,
    AluSrcValue, Property,
};
use crate::error::{SemanticError, SourceLocation};

/// 7-bit COUNT field, in 64-bit slots.
const MAX_CLAUSE_SLOTS: usize = 128;

/// A decoded `KCACHEn(CBbank:start-end)` property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KcacheLock {
    pub bank: u32,
    pub mode: KcacheMode,
    pub addr: u32,
}

pub(crate) fn parse_kcache(text: &str) -> Option<KcacheLock> {
    let (bank, range) = text.trim().strip_prefix("CB")?.split_once(':')?;
    let (start, end) = range.split_once('-')?;
    let bank = bank.trim().parse::<u32>().ok()?;
    let start = start.trim().parse::<u32>().ok()?;
    let end = end.trim().parse::<u32>().ok()?;
    if bank > 15 || end < start || start / 16 > 255 {
        return None;
    }
    Some(KcacheLock {
        bank,
        mode: KcacheMode::for_range(start, end),
        addr: start / 16,
    })
}

fn kcache_property(prop: &Property) -> Result<KcacheLock> {
    let text = prop_text(prop)?;
    parse_kcache(text)
        .ok_or_else(|| semantic(prop.location, SemanticError::InvalidKcache(text.to_owned())))
}

/// Literal constants of the group being compiled.
#[derive(Default)]
struct LiteralPool {
    values: Vec<u32>,
}

impl LiteralPool {
    /// Appends a literal and returns the channel that selects it.
    fn push(&mut self, value: u32, location: SourceLocation) -> Result<Chan> {
        if self.values.len() == MAX_GROUP_LITERALS {
            return Err(semantic(location, SemanticError::TooManyLiterals));
        }
        self.values.push(value);
        Ok(Chan::from_raw(self.values.len() as u32 - 1))
    }
}

/// Relative addressing mode shared by every operand of one instruction.
struct IndexModeTracker {
    mode: Option<IndexMode>,
}

impl IndexModeTracker {
    fn use_mode(&mut self, mode: IndexMode, location: SourceLocation) -> Result<()> {
        match self.mode {
            Some(current) if current != mode => Err(semantic(
                location,
                SemanticError::RelIndexConflict {
                    first: current.name().to_owned(),
                    second: mode.name().to_owned(),
                },
            )),
            _ => {
                self.mode = Some(mode);
                Ok(())
            }
        }
    }
}

struct EncodedSrc {
    sel: u32,
    chan: Chan,
    rel: bool,
    neg: bool,
    abs: bool,
}

/// Chooses the selector for a literal operand. Exact floats 0.0, 1.0 and 0.5 use the
/// inline constants instead of a literal slot; 0.0 only when no contradicting hex value
/// was given.
fn literal_sel(hex: Option<u32>, float: Option<f32>) -> Option<u32> {
    let float = float?;
    if float == 0.0 {
        match hex {
            None | Some(0) => Some(alu_src::IMM_0),
            Some(_) => None,
        }
    } else if float == 1.0 {
        Some(alu_src::IMM_1)
    } else if float == 0.5 {
        Some(alu_src::IMM_0_5)
    } else {
        None
    }
}

fn encode_src(
    src: &AluSrc,
    dst_chan: Chan,
    literals: &mut LiteralPool,
    index_mode: &mut IndexModeTracker,
) -> Result<EncodedSrc> {
    let mut rel_mode = None;
    let (sel, chan) = match &src.value {
        AluSrcValue::Gpr { gpr, rel, chan } => {
            rel_mode = *rel;
            (check_index(src.location, "register", *gpr, 127)?, chan.unwrap_or(dst_chan))
        }
        AluSrcValue::Kcache {
            bank,
            index,
            rel,
            chan,
        } => {
            rel_mode = *rel;
            let index = check_index(src.location, "kcache index", *index, 31)?;
            let base = if *bank == 0 {
                alu_src::KCACHE_BANK0
            } else {
                alu_src::KCACHE_BANK1
            };
            (base + index, chan.unwrap_or(dst_chan))
        }
        AluSrcValue::ConstFile { index, rel, chan } => {
            rel_mode = *rel;
            let index = check_index(src.location, "constant file index", *index, 255)?;
            (alu_src::CFILE + index, chan.unwrap_or(dst_chan))
        }
        AluSrcValue::PreviousVector { chan, .. } => (alu_src::PV, chan.unwrap_or(dst_chan)),
        AluSrcValue::PreviousScalar { .. } => (alu_src::PS, dst_chan),
        AluSrcValue::Literal { hex, float } => match literal_sel(*hex, *float) {
            Some(sel) => (sel, dst_chan),
            None => {
                let bits = hex.or(float.map(f32::to_bits)).unwrap_or(0);
                (alu_src::LITERAL, literals.push(bits, src.location)?)
            }
        },
        AluSrcValue::IntImmediate(value) => match *value {
            0 => (alu_src::IMM_0, dst_chan),
            1 => (alu_src::IMM_1_INT, dst_chan),
            -1 => (alu_src::IMM_M1_INT, dst_chan),
            value => {
                let bits = i32::try_from(value)
                    .map(|v| v as u32)
                    .or_else(|_| u32::try_from(value))
                    .map_err(|_| out_of_range(src.location, "integer literal", value, i64::from(u32::MAX)))?;
                (alu_src::LITERAL, literals.push(bits, src.location)?)
            }
        },
    };

    if let Some(mode) = rel_mode {
        index_mode.use_mode(mode, src.location)?;
    }

    Ok(EncodedSrc {
        sel,
        chan,
        rel: rel_mode.is_some(),
        neg: src.neg,
        abs: src.abs,
    })
}

/// Encodes one ALU instruction, appending any literal it needs to `literals`.
fn compile_alu_inst(stmt: &AluInstStatement, literals: &mut LiteralPool) -> Result<AluInst> {
    let opcode = AluOpcode::from_name(&stmt.opcode).ok_or_else(|| {
        semantic(
            stmt.location,
            SemanticError::UnknownAluInstruction(stmt.opcode.clone()),
        )
    })?;
    let is_op3 = opcode.is_op3();

    if is_op3 && stmt.omod != OutputModifier::Off {
        return Err(semantic(stmt.location, SemanticError::OmodOnOp3));
    }

    if stmt.srcs.len() != opcode.num_srcs() {
        return Err(semantic(
            stmt.location,
            SemanticError::OperandCount {
                opcode: opcode.name().to_owned(),
                expected: opcode.num_srcs(),
                found: stmt.srcs.len(),
            },
        ));
    }

    let mut index_mode = IndexModeTracker { mode: None };
    let mut dst_chan = match stmt.unit {
        AluUnit::X | AluUnit::T => Chan::X,
        AluUnit::Y => Chan::Y,
        AluUnit::Z => Chan::Z,
        AluUnit::W => Chan::W,
    };
    let mut dst_gpr = 0;
    let mut dst_rel = false;
    let mut write_mask = true;

    match stmt.dst {
        None => write_mask = false,
        Some(AluDst::Masked) => {
            if is_op3 {
                return Err(semantic(stmt.location, SemanticError::WriteMaskOnOp3));
            }
            write_mask = false;
        }
        Some(AluDst::Gpr { gpr, rel, chan }) => {
            dst_gpr = check_index(stmt.location, "destination register", gpr, 127)?;
            if let Some(mode) = rel {
                index_mode.use_mode(mode, stmt.location)?;
                dst_rel = true;
            }
            if let Some(chan) = chan {
                dst_chan = chan;
            }
        }
    }
    let mut srcs = Vec::with_capacity(stmt.srcs.len());
    for (i, src) in stmt.srcs.iter().enumerate() {
        let encoded = encode_src(src, dst_chan, literals, &mut index_mode)?;
        if encoded.abs && (is_op3 || i > 1) {
            return Err(semantic(src.location, SemanticError::AbsNotEncodable(i)));
        }
        srcs.push(encoded);
    }

    let mut word0 = AluWord0::default();
    for (i, src) in srcs.iter().enumerate() {
        word0 = match i {
            0 => word0
                .with_src0_sel(src.sel)
                .with_src0_chan(src.chan as u32)
                .with_src0_rel(src.rel)
                .with_src0_neg(src.neg),
            1 => word0
                .with_src1_sel(src.sel)
                .with_src1_chan(src.chan as u32)
                .with_src1_rel(src.rel)
                .with_src1_neg(src.neg),
            _ => word0,
        };
    }

    let mut bank_swizzle = 0;
    let mut update_execute_mask = false;
    let mut update_pred = false;
    let mut clamp = false;
    for prop in &stmt.properties {
        let name = prop.name.as_str();
        if let Some(swizzle) = VecBankSwizzle::from_name(name) {
            bank_swizzle = swizzle.raw();
        } else if let Some(swizzle) = ScalarBankSwizzle::from_name(name) {
            bank_swizzle = swizzle.raw();
        } else if let Some(pred_sel) = PredSel::from_name(name) {
            word0 = word0.with_pred_sel(pred_sel.raw());
        } else {
            match name {
                "UPDATE_EXEC_MASK" if !is_op3 => update_execute_mask = true,
                "UPDATE_PRED" if !is_op3 => update_pred = true,
                "CLAMP" => clamp = true,
                _ => return Err(unknown_property(prop, &stmt.opcode)),
            }
        }
    }

    word0 = word0.with_index_mode(index_mode.mode.map_or(0, IndexMode::raw));

    let word1 = if is_op3 {
        let mut word1 = AluWord1Op3::default()
            .with_alu_inst(opcode.raw())
            .with_bank_swizzle(bank_swizzle)
            .with_dst_gpr(dst_gpr)
            .with_dst_rel(dst_rel)
            .with_dst_chan(dst_chan as u32)
            .with_clamp(clamp);
        if let Some(src) = srcs.get(2) {
            word1 = word1
                .with_src2_sel(src.sel)
                .with_src2_chan(src.chan as u32)
                .with_src2_rel(src.rel)
                .with_src2_neg(src.neg);
        }
        word1.0
    } else {
        let abs = |i: usize| srcs.get(i).is_some_and(|src| src.abs);
        AluWord1Op2::default()
            .with_src0_abs(abs(0))
            .with_src1_abs(abs(1))
            .with_update_execute_mask(update_execute_mask)
            .with_update_pred(update_pred)
            .with_write_mask(write_mask)
            .with_omod(stmt.omod.raw())
            .with_alu_inst(opcode.raw())
            .with_bank_swizzle(bank_swizzle)
            .with_dst_gpr(dst_gpr)
            .with_dst_rel(dst_rel)
            .with_dst_chan(dst_chan as u32)
            .with_clamp(clamp)
            .0
    };

    Ok(AluInst::new(word0.0, word1))
}

/// `PVn` and `PSn` can only name the group directly before this one.
fn check_previous_group(group: &AluGroupStatement) -> Result<()> {
    let expected = group.index.saturating_sub(1);
    for src in group.insts.iter().flat_map(|stmt| &stmt.srcs) {
        let found = match src.value {
            AluSrcValue::PreviousVector { group: Some(n), .. }
            | AluSrcValue::PreviousScalar { group: Some(n) } => n,
            _ => continue,
        };
        if found != expected {
            return Err(semantic(
                src.location,
                SemanticError::PreviousGroupMismatch { expected, found },
            ));
        }
    }
    Ok(())
}

/// Encodes one group: its instructions, `LAST` on the final one, then the literal pool
/// padded to a whole 64-bit slot.
fn compile_alu_group(group: &AluGroupStatement) -> Result<Vec<u32>> {
    if group.insts.len() > MAX_GROUP_INSTS {
        return Err(semantic(group.location, SemanticError::TooManyInstructions));
    }

    check_previous_group(group)?;

    let mut literals = LiteralPool::default();
    let mut insts = Vec::with_capacity(group.insts.len());
    for stmt in &group.insts {
        insts.push(compile_alu_inst(stmt, &mut literals)?);
    }
    if let Some(last) = insts.last_mut() {
        last.word0 = last.word0.with_last(true);
    }

    let mut units = AluGroupUnits::default();
    for (stmt, inst) in group.insts.iter().zip(&insts) {
        match units.add(inst) {
            None => {
                return Err(semantic(
                    stmt.location,
                    SemanticError::UnitConflict {
                        unit: stmt.unit.as_char(),
                    },
                ))
            }
            Some(unit) if unit != stmt.unit => {
                return Err(semantic(
                    stmt.location,
                    SemanticError::UnitMismatch {
                        declared: stmt.unit.as_char(),
                        decoded: unit.as_char(),
                    },
                ))
            }
            Some(_) => {}
        }
    }

    let mut words = Vec::with_capacity(insts.len() * 2 + MAX_GROUP_LITERALS);
    for inst in &insts {
        words.push(inst.word0.0);
        words.push(inst.word1);
    }
    words.extend_from_slice(&literals.values);
    if literals.values.len() % 2 != 0 {
        words.push(0);
    }
    Ok(words)
}

impl Compiler {
    pub(super) fn alu_clause(&mut self, stmt: AluClauseStatement) -> Result<()> {
        let op = CfAluInst::from_name(&stmt.opcode).ok_or_else(|| {
            semantic(
                stmt.location,
                SemanticError::UnknownAluClauseInstruction(stmt.opcode.clone()),
            )
        })?;

        let mut word0 = CfAluWord0::default();
        let mut word1 = CfAluWord1::default()
            .with_cf_inst(op.raw())
            .with_barrier(true);
        let mut addr = None;
        let mut count = None;

        for prop in &stmt.properties {
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
                "KCACHE0" => {
                    let lock = kcache_property(prop)?;
                    word0 = word0
                        .with_kcache_bank0(lock.bank)
                        .with_kcache_mode0(lock.mode.raw());
                    word1 = word1.with_kcache_addr0(lock.addr);
                }
                "KCACHE1" => {
                    let lock = kcache_property(prop)?;
                    word0 = word0.with_kcache_bank1(lock.bank);
                    word1 = word1
                        .with_kcache_mode1(lock.mode.raw())
                        .with_kcache_addr1(lock.addr);
                }
                "NO_BARRIER" => word1 = word1.with_barrier(false),
                "WHOLE_QUAD_MODE" => word1 = word1.with_whole_quad_mode(true),
                "USES_WATERFALL" => word1 = word1.with_alt_const(true),
                _ => return Err(unknown_property(prop, &stmt.opcode)),
            }
        }

        let cf_index = self.push_cf(
            stmt.index,
            stmt.location,
            ControlFlowInst::new(word0.0, word1.0),
        )?;

        let offset = self.alu_data.len();
        let mut groups = 0usize;
        for item in stmt.items {
            match item {
                AluClauseItem::Comment(comment) => self.comments.push(comment),
                AluClauseItem::Group(group) => {
                    self.next_clause_pc(group.index, group.location)?;
                    let words = compile_alu_group(&group)?;
                    self.alu_data.extend_from_slice(&words);
                    groups += 1;
                }
            }
        }

        if groups == 0 {
            return Err(semantic(stmt.location, SemanticError::EmptyClause));
        }
        let size = self.alu_data.len() - offset;
        if size / 2 > MAX_CLAUSE_SLOTS {
            return Err(semantic(
                stmt.location,
                SemanticError::ClauseTooLarge {
                    count: size / 2,
                    max: MAX_CLAUSE_SLOTS,
                },
            ));
        }

        tracing::debug!(cf_index, groups, slots = size / 2, "compiled ALU clause");
        self.clauses.push(PendingClause {
            kind: ClauseKind::Alu,
            cf_index,
            offset,
            size,
            addr,
            count,
            location: stmt.location,
        });
        Ok(())
    }
}
