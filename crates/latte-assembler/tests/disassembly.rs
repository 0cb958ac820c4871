use indoc::indoc;
use latte_assembler::compile;
use latte_isa::disassemble;

const SHADER: &str = indoc! {"
    ; $MODE = UniformRegister
    00 TEX: CNT(1)
          0   SAMPLE R1.xyzw, R0.xy00, t0, s0
    01 ALU:
          1   x: MOV R0.x, R1.x
              y: MOV R0.y, 2.0f
    02 EXP_DONE: PIX0, R0.xyzw
"};

#[test]
fn disassembly_lays_out_clauses_after_control_flow() {
    let program = compile(SHADER).unwrap();
    let text = disassemble(&program.to_binary()).unwrap();

    insta::assert_snapshot!(text, @r"
    00 TEX: ADDR(64) CNT(1)
          0   SAMPLE          R1.xyzw, R0.xy00, t0, s0
    01 ALU: ADDR(32) CNT(3)
          1   x: MOV            R0.x, R1.x
              y: MOV            R0.y, (0x40000000, 2.0)
    02 EXP_DONE: PIX0, R0.xyzw
    END_OF_PROGRAM
    ");
}

#[test]
fn disassembly_is_stable_under_reassembly() {
    let first = compile(SHADER).unwrap();
    let text = disassemble(&first.to_binary()).unwrap();
    let second = compile(&text).unwrap();

    pretty_assertions::assert_eq!(second.cf_insts, first.cf_insts);
    pretty_assertions::assert_eq!(second.alu_clause_data, first.alu_clause_data);
    pretty_assertions::assert_eq!(second.tex_clause_data, first.tex_clause_data);
    assert!(second.comments.is_empty());
}
