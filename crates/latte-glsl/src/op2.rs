use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::{AluInst, AluOp2, AluUnit, ControlFlowInst, OutputModifier};

use crate::alu::{self, source, update_predicate, write_dest, ValueType};
use crate::error::{Result, TranslateErrorKind};
use crate::translate::{AluFn, State};

pub(crate) fn lookup(op: AluOp2) -> Option<AluFn> {
    static TABLE: OnceLock<HashMap<AluOp2, AluFn>> = OnceLock::new();
    TABLE.get_or_init(table).get(&op).copied()
}

fn table() -> HashMap<AluOp2, AluFn> {
    use AluOp2::*;

    let mut table: HashMap<AluOp2, AluFn> = HashMap::new();
    for op in [Add, AddInt] {
        table.insert(op, add);
    }
    for op in [Mul, MulIeee, MulloInt, MulloUint] {
        table.insert(op, mul);
    }
    for op in [Max, MaxDx10, MaxInt, MaxUint] {
        table.insert(op, max);
    }
    for op in [Min, MinDx10, MinInt, MinUint] {
        table.insert(op, min);
    }
    for op in [Sete, SeteInt, SeteDx10] {
        table.insert(op, sete);
    }
    for op in [Setne, SetneInt, SetneDx10] {
        table.insert(op, setne);
    }
    for op in [Setge, SetgeInt, SetgeUint, SetgeDx10] {
        table.insert(op, setge);
    }
    for op in [Setgt, SetgtInt, SetgtUint, SetgtDx10] {
        table.insert(op, setgt);
    }
    for op in [PredSete, PredSeteInt] {
        table.insert(op, pred_sete);
    }
    for op in [PredSetne, PredSetneInt] {
        table.insert(op, pred_setne);
    }
    for op in [PredSetge, PredSetgeInt, PredSetgeUint] {
        table.insert(op, pred_setge);
    }
    for op in [PredSetgt, PredSetgtInt, PredSetgtUint] {
        table.insert(op, pred_setgt);
    }
    for op in [Kille, KilleInt] {
        table.insert(op, kille);
    }
    for op in [Killne, KillneInt] {
        table.insert(op, killne);
    }
    for op in [Killge, KillgeInt, KillgeUint] {
        table.insert(op, killge);
    }
    for op in [Killgt, KillgtInt, KillgtUint] {
        table.insert(op, killgt);
    }
    for op in [LogClamped, LogIeee] {
        table.insert(op, log);
    }
    for op in [RecipClamped, RecipIeee, RecipFf, RecipInt, RecipUint] {
        table.insert(op, recip);
    }
    for op in [RecipsqrtClamped, RecipsqrtIeee, RecipsqrtFf] {
        table.insert(op, recipsqrt);
    }
    for op in [AshrInt, LshrInt] {
        table.insert(op, lshr);
    }
    table.insert(AndInt, and);
    table.insert(OrInt, or);
    table.insert(XorInt, xor);
    table.insert(NotInt, not);
    table.insert(SubInt, sub);
    table.insert(LshlInt, lshl);
    table.insert(Ceil, ceil);
    table.insert(Floor, floor);
    table.insert(Fract, fract);
    table.insert(Trunc, trunc);
    table.insert(Rndne, rndne);
    table.insert(Cos, cos);
    table.insert(Sin, sin);
    table.insert(ExpIeee, exp);
    table.insert(SqrtIeee, sqrt);
    table.insert(FltToInt, flt_to_int);
    table.insert(FltToUint, flt_to_uint);
    table.insert(IntToFlt, int_to_flt);
    table.insert(UintToFlt, uint_to_flt);
    table.insert(Mov, mov);
    table.insert(Mova, mova);
    table.insert(MovaFloor, mova_floor);
    table.insert(MovaInt, mova_int);
    table.insert(Nop, nop);
    table
}

fn unary_function(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, func: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &format!("{func}({src0})"))
}

fn binary_function(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, func: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;
    write_dest(state, inst, &format!("{func}({src0}, {src1})"))
}

fn binary_operator(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, op: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;
    write_dest(state, inst, &format!("{src0}{op}{src1}"))
}

fn binary_predicate(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, op: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;
    update_predicate(state, inst, &format!("{src0}{op}{src1}"))
}

fn binary_compare_set(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, op: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;
    let result = match ValueType::of_outputs(inst.flags()) {
        ValueType::Float => "1.0f : 0.0f",
        ValueType::Int => "-1 : 0",
        ValueType::Uint => "0xFFFFFFFFu : 0u",
    };
    write_dest(state, inst, &format!("({src0}{op}{src1}) ? {result}"))
}

fn binary_compare_kill(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, op: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;

    state.out.line(&format!("if ({src0}{op}{src1}) {{"));
    state.out.indent();
    state.out.line("discard;");
    state.out.dedent();
    state.out.line("} else {");
    state.out.indent();
    write_dest(state, inst, "0.0f")?;
    state.out.dedent();
    state.out.line("}");

    state.uses_discard = true;
    Ok(())
}

/// Writes the address register, then mirrors the value into the destination register.
fn address_register(state: &mut State<'_>, inst: &AluInst, expr: &str) -> Result<()> {
    let chan = match state.unit {
        AluUnit::T => return Err(TranslateErrorKind::AddressRegisterUnit(inst.opcode_name())),
        unit => unit.as_char(),
    };
    if inst.omod() != OutputModifier::Off {
        return Err(TranslateErrorKind::AddressRegisterModifier(inst.opcode_name()));
    }

    let value = if inst.clamp() {
        format!("clamp({expr}, 0, 1)")
    } else {
        expr.to_owned()
    };
    state.out.line(&format!("AR.{chan} = {value};"));

    if inst.write_mask() {
        let write = format!("{} = intBitsToFloat(AR.{chan});", alu::dest_register(inst)?);
        state.post_group_writes.push(write);
    }
    Ok(())
}

fn add(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " + ")
}

fn sub(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " - ")
}

fn mul(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " * ")
}

fn and(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " & ")
}

fn or(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " | ")
}

fn xor(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " ^ ")
}

fn lshl(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " << ")
}

fn lshr(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_operator(state, cf, inst, " >> ")
}

fn max(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_function(state, cf, inst, "max")
}

fn min(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_function(state, cf, inst, "min")
}

fn sete(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_set(state, cf, inst, " == ")
}

fn setne(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_set(state, cf, inst, " != ")
}

fn setge(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_set(state, cf, inst, " >= ")
}

fn setgt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_set(state, cf, inst, " > ")
}

fn pred_sete(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_predicate(state, cf, inst, " == ")
}

fn pred_setne(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_predicate(state, cf, inst, " != ")
}

fn pred_setge(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_predicate(state, cf, inst, " >= ")
}

fn pred_setgt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_predicate(state, cf, inst, " > ")
}

fn kille(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_kill(state, cf, inst, " == ")
}

fn killne(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_kill(state, cf, inst, " != ")
}

fn killge(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_kill(state, cf, inst, " >= ")
}

fn killgt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    binary_compare_kill(state, cf, inst, " > ")
}

fn ceil(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "ceil")
}

fn floor(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "floor")
}

fn fract(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "fract")
}

fn trunc(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "trunc")
}

fn rndne(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "roundEven")
}

fn exp(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "exp2")
}

fn log(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &format!("log2(abs({src0}))"))
}

fn sqrt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "sqrt")
}

fn recip(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &format!("1 / ({src0})"))
}

fn recipsqrt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "inversesqrt")
}

// SIN and COS take their argument in revolutions.
fn sin(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &format!("sin({src0} / 0.1591549367)"))
}

fn cos(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &format!("cos({src0} / 0.1591549367)"))
}

fn not(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "~")
}

fn flt_to_int(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "int")
}

fn flt_to_uint(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "uint")
}

fn int_to_flt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "float")
}

fn uint_to_flt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    unary_function(state, cf, inst, "float")
}

fn mov(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    write_dest(state, inst, &src0)
}

fn mova(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    address_register(state, inst, &format!("int(clamp(roundEven({src0}), -256, 256))"))
}

fn mova_floor(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    address_register(state, inst, &format!("int(clamp(floor({src0}), -256, 256))"))
}

fn mova_int(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    address_register(state, inst, &format!("clamp({src0}, -256, 256)"))
}

fn nop(_state: &mut State<'_>, _cf: &ControlFlowInst, _inst: &AluInst) -> Result<()> {
    Ok(())
}
