//! Operand and destination translation shared by every ALU emitter.

use latte_isa::{
    AluFlags, AluInst, AluSource, AluUnit, Chan, ControlFlowInst, IndexMode, KcacheMode,
    OutputModifier,
};

use crate::error::{Result, TranslateErrorKind};
use crate::translate::State;

/// How the untyped register bits of an operand or result are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ValueType {
    Float,
    Int,
    Uint,
}

impl ValueType {
    pub fn of_inputs(flags: AluFlags) -> Self {
        if flags.contains(AluFlags::INT_IN) {
            Self::Int
        } else if flags.contains(AluFlags::UINT_IN) {
            Self::Uint
        } else {
            Self::Float
        }
    }

    pub fn of_outputs(flags: AluFlags) -> Self {
        if flags.contains(AluFlags::INT_OUT) {
            Self::Int
        } else if flags.contains(AluFlags::UINT_OUT) {
            Self::Uint
        } else {
            Self::Float
        }
    }
}

/// Conversion an operand needs to reach the instruction's input type.
enum Conversion {
    /// Register-file values are reinterpreted bit for bit.
    Bits,
    /// Inline float constants are converted by value.
    Value,
    None,
}

fn index_register(inst: &AluInst) -> Result<&'static str> {
    match inst.index_mode() {
        Some(IndexMode::ArX) => Ok("AR.x"),
        Some(IndexMode::ArY) => Ok("AR.y"),
        Some(IndexMode::ArZ) => Ok("AR.z"),
        Some(IndexMode::ArW) => Ok("AR.w"),
        Some(IndexMode::Loop) => Ok("AL"),
        _ => Err(TranslateErrorKind::InvalidIndexMode(inst.word0.index_mode())),
    }
}

fn indexed(inst: &AluInst, base: u32, rel: bool) -> Result<String> {
    if rel {
        Ok(format!("{base} + {}", index_register(inst)?))
    } else {
        Ok(base.to_string())
    }
}

/// Renders a literal as a GLSL float, keeping non-finite values exact.
pub(crate) fn float_literal(bits: u32) -> String {
    let value = f32::from_bits(bits);
    if value.is_finite() {
        format!("{value:?}f")
    } else {
        format!("uintBitsToFloat({bits:#010X}u)")
    }
}

fn literal(state: &State<'_>, chan: Chan, ty: ValueType) -> String {
    let bits = state.literals.get(chan.index()).copied().unwrap_or(0);
    match ty {
        ValueType::Float => float_literal(bits),
        ValueType::Int => (bits as i32).to_string(),
        ValueType::Uint => format!("{bits}u"),
    }
}

fn kcache(
    state: &mut State<'_>,
    cf: &ControlFlowInst,
    inst: &AluInst,
    second_bank: bool,
    index: u32,
    rel: bool,
) -> Result<String> {
    if !state.desc.uniform_blocks_enabled {
        return Err(TranslateErrorKind::UniformBlocksDisabled);
    }

    let (word0, word1) = (cf.alu_word0(), cf.alu_word1());
    let (bank, mode, addr) = if second_bank {
        (word0.kcache_bank1(), word1.kcache_mode1(), word1.kcache_addr1())
    } else {
        (word0.kcache_bank0(), word0.kcache_mode0(), word1.kcache_addr0())
    };

    match KcacheMode::from_raw(mode) {
        Some(KcacheMode::Lock1 | KcacheMode::Lock2) => {}
        other => {
            return Err(TranslateErrorKind::InvalidKcacheMode {
                bank,
                mode: other.unwrap_or(KcacheMode::Nop),
            })
        }
    }

    if let Some(used) = state.used_uniform_blocks.get_mut(bank as usize) {
        *used = true;
    }
    Ok(format!("UB_{bank}.values[{}]", indexed(inst, addr * 16 + index, rel)?))
}

/// Translates source operand `index` using the input type implied by the opcode.
pub(crate) fn source(
    state: &mut State<'_>,
    cf: &ControlFlowInst,
    inst: &AluInst,
    index: usize,
) -> Result<String> {
    source_as(state, cf, inst, index, ValueType::of_inputs(inst.flags()))
}

/// Translates source operand `index`, reinterpreting it as `ty`.
pub(crate) fn source_as(
    state: &mut State<'_>,
    cf: &ControlFlowInst,
    inst: &AluInst,
    index: usize,
    ty: ValueType,
) -> Result<String> {
    let operand = inst.src(index);
    let source = operand.source();
    let chan = operand.chan.as_char();

    if operand.rel
        && !matches!(
            source,
            AluSource::Gpr(_)
                | AluSource::Kcache0(_)
                | AluSource::Kcache1(_)
                | AluSource::ConstFile(_)
        )
    {
        return Err(TranslateErrorKind::InvalidRelativeSource(operand.sel));
    }

    let (value, conversion) = match source {
        AluSource::Gpr(n) => (
            format!("R[{}].{chan}", indexed(inst, n, operand.rel)?),
            Conversion::Bits,
        ),
        AluSource::Kcache0(n) => (
            format!("{}.{chan}", kcache(state, cf, inst, false, n, operand.rel)?),
            Conversion::Bits,
        ),
        AluSource::Kcache1(n) => (
            format!("{}.{chan}", kcache(state, cf, inst, true, n, operand.rel)?),
            Conversion::Bits,
        ),
        AluSource::ConstFile(_) if !state.desc.uniform_registers_enabled => {
            return Err(TranslateErrorKind::UniformRegistersDisabled)
        }
        AluSource::ConstFile(n) => (
            format!(
                "{}[{}].{chan}",
                state.desc.stage.uniform_registers(),
                indexed(inst, n, operand.rel)?
            ),
            Conversion::Bits,
        ),
        AluSource::PrevVector => (format!("PV.{chan}"), Conversion::Bits),
        AluSource::PrevScalar => ("PS".to_owned(), Conversion::Bits),
        AluSource::Imm0 => ("0.0f".to_owned(), Conversion::Value),
        AluSource::Imm1 => ("1.0f".to_owned(), Conversion::Value),
        AluSource::Imm05 => ("0.5f".to_owned(), Conversion::Value),
        AluSource::Imm1Int => ("1".to_owned(), Conversion::None),
        AluSource::ImmM1Int => ("-1".to_owned(), Conversion::None),
        AluSource::Literal => (literal(state, operand.chan, ty), Conversion::None),
        other => return Err(TranslateErrorKind::UnsupportedSource(other.sel())),
    };

    let mut expr = match (conversion, ty) {
        (Conversion::Bits, ValueType::Int) => format!("floatBitsToInt({value})"),
        (Conversion::Bits, ValueType::Uint) => format!("floatBitsToUint({value})"),
        (Conversion::Value, ValueType::Int) => format!("int({value})"),
        (Conversion::Value, ValueType::Uint) => format!("uint({value})"),
        _ => value,
    };
    if operand.abs {
        expr = format!("abs({expr})");
    }
    if operand.neg {
        expr = format!("-({expr})");
    }
    Ok(expr)
}

/// The previous-value slot a unit writes: `PVo.c` for vector units, `PSo` for T.
pub(crate) const fn previous_value(unit: AluUnit) -> &'static str {
    match unit {
        AluUnit::X => "PVo.x",
        AluUnit::Y => "PVo.y",
        AluUnit::Z => "PVo.z",
        AluUnit::W => "PVo.w",
        AluUnit::T => "PSo",
    }
}

/// The register component an instruction writes, e.g. `R[4].y`.
pub(crate) fn dest_register(inst: &AluInst) -> Result<String> {
    Ok(format!(
        "R[{}].{}",
        indexed(inst, inst.dst_gpr(), inst.dst_rel())?,
        inst.dst_chan().as_char()
    ))
}

/// Wraps `expr` with the output modifier, clamp and result reinterpretation.
pub(crate) fn apply_modifiers(inst: &AluInst, expr: &str) -> String {
    let mut value = match inst.omod() {
        OutputModifier::Off => expr.to_owned(),
        OutputModifier::Mul2 => format!("({expr}) * 2"),
        OutputModifier::Mul4 => format!("({expr}) * 4"),
        OutputModifier::Div2 => format!("({expr}) / 2"),
    };
    if inst.clamp() {
        value = format!("clamp({value}, 0, 1)");
    }
    match ValueType::of_outputs(inst.flags()) {
        ValueType::Int => format!("intBitsToFloat({value})"),
        ValueType::Uint => format!("uintBitsToFloat({value})"),
        ValueType::Float => value,
    }
}

/// Queues the copy of a previous-value slot into the instruction's destination register.
///
/// Register writes are deferred until every instruction of the group has read its
/// operands.
pub(crate) fn queue_register_write(state: &mut State<'_>, inst: &AluInst, value: &str) -> Result<()> {
    if inst.write_mask() {
        let write = format!("{} = {value};", dest_register(inst)?);
        state.post_group_writes.push(write);
    }
    Ok(())
}

/// Emits `PVo.c = expr;` for the current unit and queues the register write.
pub(crate) fn write_dest(state: &mut State<'_>, inst: &AluInst, expr: &str) -> Result<()> {
    let slot = previous_value(state.unit);
    queue_register_write(state, inst, slot)?;
    let value = apply_modifiers(inst, expr);
    state.out.line(&format!("{slot} = {value};"));
    Ok(())
}

/// Emits the predicate and execute-mask updates of a `PRED_SET*` instruction, then writes
/// the comparison result as 1.0 or 0.0.
pub(crate) fn update_predicate(state: &mut State<'_>, inst: &AluInst, condition: &str) -> Result<()> {
    let update_pred = inst.update_pred();
    let update_exec = inst.update_execute_mask();

    if update_pred {
        state.out.line(&format!("predicateRegister = ({condition});"));
    }
    if update_exec {
        let test = if update_pred {
            "predicateRegister".to_owned()
        } else {
            format!("({condition})")
        };
        state.out.line(&format!("activeMask = {test} ? Active : InactiveBranch;"));
    }

    let value = if update_pred {
        "predicateRegister".to_owned()
    } else if update_exec {
        "(activeMask == Active)".to_owned()
    } else {
        format!("({condition})")
    };
    let result = match ValueType::of_outputs(inst.flags()) {
        ValueType::Float => "1.0f : 0.0f",
        ValueType::Int | ValueType::Uint => "1 : 0",
    };
    write_dest(state, inst, &format!("{value} ? {result}"))
}
