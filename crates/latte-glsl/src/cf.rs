//! Control flow emulation.
//!
//! Execution is modelled per invocation with an `activeMask` state and an explicit
//! reconvergence stack, mirroring the hardware's per-pixel active/branch/break/continue
//! states. `PUSH`/`POP` are macros declared in the file header.

use std::collections::HashMap;
use std::sync::OnceLock;

use latte_isa::{CfCond, CfInst, ControlFlowInst};

use crate::error::{Result, TranslateErrorKind};
use crate::translate::{CfFn, LoopState, State};

pub(crate) fn lookup(op: CfInst) -> Option<CfFn> {
    static TABLE: OnceLock<HashMap<CfInst, CfFn>> = OnceLock::new();
    TABLE.get_or_init(table).get(&op).copied()
}

fn table() -> HashMap<CfInst, CfFn> {
    let mut table: HashMap<CfInst, CfFn> = HashMap::new();
    table.insert(CfInst::Nop, nop);
    table.insert(CfInst::Jump, nop);
    table.insert(CfInst::EndProgram, nop);
    table.insert(CfInst::CallFs, call_fs);
    table.insert(CfInst::Push, push_inst);
    table.insert(CfInst::Pop, pop_inst);
    table.insert(CfInst::Else, else_inst);
    table.insert(CfInst::Kill, kill);
    table.insert(CfInst::LoopStartDx10, loop_start);
    table.insert(CfInst::LoopStartNoAl, loop_start);
    table.insert(CfInst::LoopEnd, loop_end);
    table.insert(CfInst::LoopBreak, loop_break);
    table.insert(CfInst::LoopContinue, loop_continue);
    table
}

/// Opens `if (<cond>) {` gating the following code on the active mask.
pub(crate) fn cond_start(state: &mut State<'_>, cond: CfCond) {
    let test = match cond {
        CfCond::Active => "activeMask == Active",
        CfCond::False => "false",
        CfCond::Bool => "activeMask == Active && predicateRegister",
        CfCond::NotBool => "activeMask == Active && !predicateRegister",
    };
    state.out.line(&format!("if ({test}) {{"));
    state.out.indent();
}

pub(crate) fn cond_end(state: &mut State<'_>) {
    state.out.dedent();
    state.out.line("}");
}

pub(crate) fn push(state: &mut State<'_>) {
    state.out.line("PUSH(stack, stackIndex, activeMask);");
}

pub(crate) fn pop(state: &mut State<'_>, count: u32) {
    for _ in 0..count {
        state.out.line("POP(stack, stackIndex, activeMask);");
    }
}

/// Swaps active and branch-inactive invocations, but only where the enclosing scope was
/// active.
pub(crate) fn insert_else(state: &mut State<'_>) {
    let out = &mut state.out;
    out.line("if (stack[stackIndex - 1] == Active) {");
    out.indent();
    out.line("if (activeMask == Active) {");
    out.indent();
    out.line("activeMask = InactiveBranch;");
    out.dedent();
    out.line("} else if (activeMask == InactiveBranch) {");
    out.indent();
    out.line("activeMask = Active;");
    out.dedent();
    out.line("}");
    out.dedent();
    out.line("}");
}

/// Deactivates invocations with a false predicate, as done after `ALU_BREAK` and
/// `ALU_CONTINUE` clauses.
pub(crate) fn deactivate_unless_predicate(state: &mut State<'_>, mask: &str) {
    state.out.line("if (!predicateRegister) {");
    state.out.indent();
    state.out.line(&format!("activeMask = {mask};"));
    state.out.dedent();
    state.out.line("}");
}

fn nop(_state: &mut State<'_>, _cf: &ControlFlowInst) -> Result<()> {
    Ok(())
}

fn call_fs(state: &mut State<'_>, _cf: &ControlFlowInst) -> Result<()> {
    state.calls_fetch_shader = true;
    Ok(())
}

fn push_inst(state: &mut State<'_>, _cf: &ControlFlowInst) -> Result<()> {
    push(state);
    Ok(())
}

fn pop_inst(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    pop(state, cf.word1().pop_count());
    Ok(())
}

// POP_COUNT on ELSE only applies when the jump is taken, which happens when no invocation
// remains active; emulating the mask swap covers that case.
fn else_inst(state: &mut State<'_>, _cf: &ControlFlowInst) -> Result<()> {
    insert_else(state);
    Ok(())
}

fn kill(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    cond_start(state, cf.cond());
    state.out.line("discard;");
    cond_end(state);
    state.uses_discard = true;
    Ok(())
}

fn loop_start(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    state.loop_stack.push(LoopState {
        start_pc: state.cf_pc,
        end_pc: cf.word0().addr(),
    });
    push(state);
    state.out.line("do {");
    state.out.indent();
    Ok(())
}

fn loop_end(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    let open = state
        .loop_stack
        .pop()
        .ok_or(TranslateErrorKind::NoOpenLoop("LOOP_END"))?;

    // LOOP_START jumps past the matching LOOP_END, which jumps back to the first body
    // instruction.
    let addr = cf.word0().addr();
    if addr as usize != open.start_pc + 1 || open.end_pc as usize != state.cf_pc + 1 {
        return Err(TranslateErrorKind::LoopMismatch {
            start_pc: open.start_pc,
            end_pc: open.end_pc,
            addr,
        });
    }

    let out = &mut state.out;
    out.line("if (activeMask == InactiveContinue) {");
    out.indent();
    out.line("activeMask = Active;");
    out.dedent();
    out.line("}");
    out.dedent();
    out.line("} while (activeMask == Active);");
    pop(state, 1);
    Ok(())
}

fn loop_exit(state: &mut State<'_>, cf: &ControlFlowInst, name: &'static str, mask: &str) -> Result<()> {
    if state.loop_stack.is_empty() {
        return Err(TranslateErrorKind::NoOpenLoop(name));
    }
    cond_start(state, cf.cond());
    state.out.line(&format!("activeMask = {mask};"));
    cond_end(state);
    Ok(())
}

fn loop_break(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    loop_exit(state, cf, "LOOP_BREAK", "InactiveBreak")
}

fn loop_continue(state: &mut State<'_>, cf: &ControlFlowInst) -> Result<()> {
    loop_exit(state, cf, "LOOP_CONTINUE", "InactiveContinue")
}
