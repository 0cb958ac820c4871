use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::{AluInst, AluOp3, ControlFlowInst};

use crate::alu::{source, source_as, write_dest, ValueType};
use crate::error::Result;
use crate::translate::{AluFn, State};

pub(crate) fn lookup(op: AluOp3) -> Option<AluFn> {
    static TABLE: OnceLock<HashMap<AluOp3, AluFn>> = OnceLock::new();
    TABLE.get_or_init(table).get(&op).copied()
}

fn table() -> HashMap<AluOp3, AluFn> {
    use AluOp3::*;

    let mut table: HashMap<AluOp3, AluFn> = HashMap::new();
    table.insert(Muladd, muladd);
    table.insert(MuladdIeee, muladd);
    table.insert(MuladdM2, muladd_m2);
    table.insert(MuladdIeeeM2, muladd_m2);
    table.insert(MuladdM4, muladd_m4);
    table.insert(MuladdIeeeM4, muladd_m4);
    table.insert(MuladdD2, muladd_d2);
    table.insert(MuladdIeeeD2, muladd_d2);
    table.insert(Cnde, cnde);
    table.insert(CndeInt, cnde);
    table.insert(Cndgt, cndgt);
    table.insert(CndgtInt, cndgt);
    table.insert(Cndge, cndge);
    table.insert(CndgeInt, cndge);
    table
}

fn multiply_add(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, scale: &str) -> Result<()> {
    let src0 = source(state, cf, inst, 0)?;
    let src1 = source(state, cf, inst, 1)?;
    let src2 = source(state, cf, inst, 2)?;
    let expr = if scale.is_empty() {
        format!("{src0} * {src1} + {src2}")
    } else {
        format!("({src0} * {src1} + {src2}){scale}")
    };
    write_dest(state, inst, &expr)
}

/// `dst = (src0 op 0) ? src1 : src2`. The integer forms compare `src0` as an integer but
/// select between the raw values of `src1` and `src2`.
fn conditional(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst, op: &str) -> Result<()> {
    let ty = ValueType::of_inputs(inst.flags());
    let src0 = source_as(state, cf, inst, 0, ty)?;
    let src1 = source_as(state, cf, inst, 1, ValueType::Float)?;
    let src2 = source_as(state, cf, inst, 2, ValueType::Float)?;
    let zero = match ty {
        ValueType::Float => "0.0f",
        ValueType::Int | ValueType::Uint => "0",
    };
    write_dest(state, inst, &format!("({src0}{op}{zero}) ? {src1} : {src2}"))
}

fn muladd(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    multiply_add(state, cf, inst, "")
}

fn muladd_m2(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    multiply_add(state, cf, inst, " * 2")
}

fn muladd_m4(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    multiply_add(state, cf, inst, " * 4")
}

fn muladd_d2(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    multiply_add(state, cf, inst, " / 2")
}

fn cnde(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    conditional(state, cf, inst, " == ")
}

fn cndgt(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    conditional(state, cf, inst, " > ")
}

fn cndge(state: &mut State<'_>, cf: &ControlFlowInst, inst: &AluInst) -> Result<()> {
    conditional(state, cf, inst, " >= ")
}
