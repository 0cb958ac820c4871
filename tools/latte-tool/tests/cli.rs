#![cfg(not(target_arch = "wasm32"))]

use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use indoc::indoc;
use predicates::prelude::*;
use tempfile::tempdir;

const VERTEX_SHADER: &str = indoc! {"
    ; $MODE = UniformRegister
    ; $SQ_PGM_RESOURCES_VS.NUM_GPRS = 2
    00 ALU:
          0   x: MOV R1.x, R0.x
    01 EXP_DONE: POS0, R1.xyzw
"};

const PIXEL_SHADER: &str = indoc! {"
    00 TEX: CNT(1)
          0   SAMPLE R1.xyzw, R0.xy00, t0, s0
    01 EXP_DONE: PIX0, R1.xyzw
"};

#[test]
fn assemble_writes_gfd_container() {
    let dir = tempdir().unwrap();
    let vsh = dir.path().join("shader.vsh");
    let psh = dir.path().join("shader.psh");
    let out = dir.path().join("shader.gsh");
    fs::write(&vsh, VERTEX_SHADER).unwrap();
    fs::write(&psh, PIXEL_SHADER).unwrap();

    cargo_bin_cmd!("latte-assembler")
        .arg("assemble")
        .arg("--vsh")
        .arg(&vsh)
        .arg("--psh")
        .arg(&psh)
        .arg("--align")
        .arg(&out)
        .assert()
        .success();

    let bytes = fs::read(&out).unwrap();
    assert_eq!(&bytes[..4], b"Gfx2");
}

#[test]
fn assemble_reports_source_location() {
    let dir = tempdir().unwrap();
    let psh = dir.path().join("broken.psh");
    let out = dir.path().join("broken.gsh");
    fs::write(&psh, "00 ALU:\n      0   x: FROB R0.x, R1.x\n").unwrap();

    cargo_bin_cmd!("latte-assembler")
        .arg("assemble")
        .arg("--psh")
        .arg(&psh)
        .arg(&out)
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("broken.psh:2:"));
    assert!(!out.exists());
}

#[test]
fn assemble_rejects_unknown_header_comment() {
    let dir = tempdir().unwrap();
    let vsh = dir.path().join("bad.vsh");
    let out = dir.path().join("bad.gsh");
    fs::write(&vsh, "; $NOT_A_REGISTER = 1\n00 EXP_DONE: POS0, R0\n").unwrap();

    cargo_bin_cmd!("latte-assembler")
        .arg("assemble")
        .arg("--vsh")
        .arg(&vsh)
        .arg(&out)
        .assert()
        .failure()
        .stderr(predicate::str::contains("bad.vsh:1:").and(predicate::str::contains("NOT_A_REGISTER")));
}

#[test]
fn assemble_requires_a_shader() {
    let dir = tempdir().unwrap();
    cargo_bin_cmd!("latte-assembler")
        .arg("assemble")
        .arg(dir.path().join("empty.gsh"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("nothing to assemble"));
}

#[test]
fn glsl_prints_translated_shader() {
    let dir = tempdir().unwrap();
    let psh = dir.path().join("shader.psh");
    fs::write(&psh, PIXEL_SHADER).unwrap();

    cargo_bin_cmd!("latte-assembler")
        .args(["glsl", "--stage", "pixel"])
        .arg(&psh)
        .assert()
        .success()
        .stdout(
            predicate::str::starts_with("#version 450 core")
                .and(predicate::str::contains("uniform sampler2D sampler_0;"))
                .and(predicate::str::contains("exp_pixel_0.xyzw = R[1].xyzw;")),
        );
}

#[test]
fn glsl_failure_includes_disassembly() {
    let dir = tempdir().unwrap();
    let psh = dir.path().join("unsupported.psh");
    fs::write(&psh, "00 ALU:\n      0   x: PRED_SET_INV ____, R0.x\n01 EXP_DONE: PIX0, R0\n").unwrap();

    cargo_bin_cmd!("latte-assembler")
        .args(["glsl", "--stage", "pixel"])
        .arg(&psh)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PRED_SET_INV").and(predicate::str::contains("END_OF_PROGRAM")));
}

#[test]
fn disassemble_prints_program_text() {
    let dir = tempdir().unwrap();
    let bin = dir.path().join("shader.bin");
    let program = latte_assembler::compile(PIXEL_SHADER).unwrap();
    fs::write(&bin, program.to_binary()).unwrap();

    cargo_bin_cmd!("latte-assembler")
        .arg("disassemble")
        .arg(&bin)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("SAMPLE")
                .and(predicate::str::contains("01 EXP_DONE: PIX0, R1.xyzw"))
                .and(predicate::str::contains("END_OF_PROGRAM")),
        );

    cargo_bin_cmd!("latte-assembler")
        .args(["glsl", "--stage", "pixel", "--binary"])
        .arg(&bin)
        .assert()
        .success()
        .stdout(predicate::str::contains("texture(sampler_0, R[0].xy)"));
}
