//! Instructions that occupy all four vector units as one operation.

use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::disasm::alu_inst_text;
use latte_isa::{AluGroup, AluInst, AluOp2, AluOpcode, AluUnit, Chan, ControlFlowInst};

use crate::alu::{apply_modifiers, queue_register_write, source};
use crate::error::{Result, TranslateErrorKind};
use crate::translate::{ReductionFn, State};

fn lookup(op: AluOp2) -> Option<ReductionFn> {
    static TABLE: OnceLock<HashMap<AluOp2, ReductionFn>> = OnceLock::new();
    TABLE
        .get_or_init(|| {
            let mut table: HashMap<AluOp2, ReductionFn> = HashMap::new();
            table.insert(AluOp2::Dot4, dot4);
            table.insert(AluOp2::Dot4Ieee, dot4);
            table.insert(AluOp2::Cube, cube);
            table.insert(AluOp2::Max4, max4);
            table
        })
        .get(&op)
        .copied()
}

/// Translates the reduction spread over the X/Y/Z/W units of `group`.
pub(crate) fn translate_group(state: &mut State<'_>, cf: &ControlFlowInst, group: &AluGroup) -> Result<()> {
    let mut slots: [Option<AluInst>; 4] = [None; 4];
    for (inst, unit) in group.insts.iter().zip(&group.units) {
        if unit.is_vector() {
            slots[unit.index()] = Some(*inst);
        }
    }

    let [Some(x), Some(y), Some(z), Some(w)] = slots else {
        return Err(TranslateErrorKind::IncompleteReduction(
            slots.iter().flatten().count(),
        ));
    };
    let insts = [x, y, z, w];

    for inst in &insts[1..] {
        if (inst.is_op3(), inst.raw_opcode()) != (x.is_op3(), x.raw_opcode()) {
            return Err(TranslateErrorKind::InconsistentReduction("opcode"));
        }
        if inst.omod() != x.omod() {
            return Err(TranslateErrorKind::InconsistentReduction("output modifier"));
        }
        if inst.clamp() != x.clamp() {
            return Err(TranslateErrorKind::InconsistentReduction("clamp flag"));
        }
    }

    let func = match x.opcode() {
        Some(AluOpcode::Op2(op)) => lookup(op),
        _ => None,
    }
    .ok_or_else(|| TranslateErrorKind::UnsupportedReduction(x.opcode_name()))?;

    state.out.line(&format!("// {:02} Reduction", state.group_pc));
    for (inst, chan) in insts.iter().zip(Chan::ALL) {
        let text = alu_inst_text(state.group_pc, AluUnit::from_chan(chan), inst, &state.literals);
        state.out.line(&format!("// {:02} {text}", state.group_pc));
    }

    func(state, cf, &insts)
}

fn vector_source(
    state: &mut State<'_>,
    cf: &ControlFlowInst,
    insts: &[AluInst; 4],
    index: usize,
) -> Result<String> {
    let mut components = Vec::with_capacity(4);
    for inst in insts {
        components.push(source(state, cf, inst, index)?);
    }
    Ok(format!("vec4({})", components.join(", ")))
}

/// Copies the result in `PVo.x` to the other slots and every enabled destination.
fn broadcast_x(state: &mut State<'_>, insts: &[AluInst; 4]) -> Result<()> {
    state.out.line("PVo.yzw = PVo.xxx;");
    for inst in insts {
        queue_register_write(state, inst, "PVo.x")?;
    }
    Ok(())
}

fn dot4(state: &mut State<'_>, cf: &ControlFlowInst, insts: &[AluInst; 4]) -> Result<()> {
    let src0 = vector_source(state, cf, insts, 0)?;
    let src1 = vector_source(state, cf, insts, 1)?;
    let value = apply_modifiers(&insts[0], &format!("dot({src0}, {src1})"));
    state.out.line(&format!("PVo.x = {value};"));
    broadcast_x(state, insts)
}

fn max4(state: &mut State<'_>, cf: &ControlFlowInst, insts: &[AluInst; 4]) -> Result<()> {
    let mut srcs = Vec::with_capacity(4);
    for inst in insts {
        srcs.push(source(state, cf, inst, 0)?);
    }
    let expr = format!(
        "max(max({}, {}), max({}, {}))",
        srcs[0], srcs[1], srcs[2], srcs[3]
    );
    let value = apply_modifiers(&insts[0], &expr);
    state.out.line(&format!("PVo.x = {value};"));
    broadcast_x(state, insts)
}

/// Operand identity for CUBE consistency checks; modifiers are ignored.
fn operand_key(inst: &AluInst, index: usize) -> (u32, bool, Chan) {
    let operand = inst.src(index);
    (operand.sel, operand.rel, operand.chan)
}

/// `CUBE R.xyzw, src.zzxy, src.yxzz` computes the face coordinates of a direction
/// vector, returning `(t, s, 2 * major axis, face)`.
fn cube(state: &mut State<'_>, cf: &ControlFlowInst, insts: &[AluInst; 4]) -> Result<()> {
    let z_key = operand_key(&insts[0], 0);
    let y_key = operand_key(&insts[3], 0);
    let x_key = operand_key(&insts[2], 0);

    let consistent = operand_key(&insts[1], 0) == z_key
        && operand_key(&insts[0], 1) == y_key
        && operand_key(&insts[1], 1) == x_key
        && operand_key(&insts[2], 1) == z_key
        && operand_key(&insts[3], 1) == z_key;

    let x = source(state, cf, &insts[2], 0)?;
    let y = source(state, cf, &insts[3], 0)?;
    let z = source(state, cf, &insts[0], 0)?;

    if !consistent {
        return Err(TranslateErrorKind::InconsistentCube { x, y, z });
    }

    let out = &mut state.out;
    out.line(&format!(
        "if (abs({x}) >= abs({y}) && abs({x}) >= abs({z})) {{"
    ));
    out.indent();
    out.line(&format!("PVo.x = {y};"));
    out.line(&format!("PVo.y = sign({x}) * {z};"));
    out.line(&format!("PVo.z = {x} * 2.0;"));
    out.line(&format!("PVo.w = ({x} >= 0) ? 0.0 : 1.0;"));
    out.dedent();
    out.line(&format!(
        "}} else if (abs({y}) >= abs({x}) && abs({y}) >= abs({z})) {{"
    ));
    out.indent();
    out.line(&format!("PVo.x = sign({y}) * -({x});"));
    out.line(&format!("PVo.y = -({z});"));
    out.line(&format!("PVo.z = {y} * 2.0;"));
    out.line(&format!("PVo.w = ({y} >= 0) ? 2.0 : 3.0;"));
    out.dedent();
    out.line("} else {");
    out.indent();
    out.line(&format!("PVo.x = {y};"));
    out.line(&format!("PVo.y = sign({z}) * -({x});"));
    out.line(&format!("PVo.z = {z} * 2.0;"));
    out.line(&format!("PVo.w = ({z} >= 0) ? 4.0 : 5.0;"));
    out.dedent();
    out.line("}");

    for (inst, chan) in insts.iter().zip(Chan::ALL) {
        queue_register_write(state, inst, &format!("PVo.{}", chan.as_char()))?;
    }
    Ok(())
}
