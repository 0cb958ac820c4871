use indoc::indoc;
use latte_isa::{ExpWord0, TexDim};
use pretty_assertions::assert_eq;

use crate::{
    translate, Export, SamplerUsage, ShaderDescriptor, ShaderStage, TranslateError,
    TranslateErrorKind, TranslatedShader,
};
use latte_isa::ExportType;

fn binary(source: &str) -> Vec<u8> {
    match latte_assembler::compile(source) {
        Ok(program) => program.to_binary(),
        Err(err) => panic!("failed to assemble test program: {err}\n{source}"),
    }
}

fn pixel(source: &str) -> TranslatedShader {
    translate(&ShaderDescriptor::new(ShaderStage::Pixel), &binary(source)).unwrap()
}

fn pixel_error(source: &str) -> TranslateError {
    translate(&ShaderDescriptor::new(ShaderStage::Pixel), &binary(source)).unwrap_err()
}

fn assert_contains(haystack: &str, needle: &str) {
    assert!(
        haystack.contains(needle),
        "expected to find {needle:?} in:\n{haystack}"
    );
}

#[test]
fn alu_group_writes_registers_after_reading_operands() {
    let shader = pixel(indoc! {"
        00 ALU:
              0   x: MOV R0.x, R1.x
                  y: ADD R0.y, R1.y, 1.0f
        01 EXP_DONE: PIX0, R0.xyzw
    "});

    let expected = indoc! {"
        // 00 ALU: ADDR(32) CNT(2)
        if (activeMask == Active) {
          // 00 x: MOV            R0.x, R1.x
          PVo.x = R[1].x;
          // 00 y: ADD            R0.y, R1.y, 1.0f
          PVo.y = R[1].y + 1.0f;
          // 00 --
          R[0].x = PVo.x;
          R[0].y = PVo.y;
          PV = PVo;

        }

        // 01 EXP_DONE: PIX0, R0.xyzw
        exp_pixel_0.xyzw = R[0].xyzw;
    "};
    assert_eq!(shader.code_body.trim_end(), expected.trim_end());
    assert_eq!(
        shader.exports,
        vec![Export {
            ty: ExportType::Pixel,
            id: 0,
        }]
    );
    assert!(!shader.uses_discard);
}

#[test]
fn transcendental_unit_updates_previous_scalar() {
    let shader = pixel(indoc! {"
        00 ALU:
              0   t: RECIP_IEEE R2.x, R1.w
        01 EXP_DONE: PIX0, R2
    "});
    assert_contains(&shader.code_body, "PSo = 1 / (R[1].w);");
    assert_contains(&shader.code_body, "R[2].x = PSo;");
    assert_contains(&shader.code_body, "PS = PSo;");
    assert!(!shader.code_body.contains("PV = PVo;"));
}

#[test]
fn dot_product_is_emitted_once_per_group() {
    let shader = pixel(indoc! {"
        00 ALU:
              0   x: DOT4 R0.x, R1.x, R2.x
                  y: DOT4 ____, R1.y, R2.y
                  z: DOT4 ____, R1.z, R2.z
                  w: DOT4 ____, R1.w, R2.w
        01 EXP_DONE: PIX0, R0
    "});

    let body = &shader.code_body;
    assert_contains(body, "// 00 Reduction");
    assert_contains(
        body,
        "PVo.x = dot(vec4(R[1].x, R[1].y, R[1].z, R[1].w), vec4(R[2].x, R[2].y, R[2].z, R[2].w));",
    );
    assert_contains(body, "PVo.yzw = PVo.xxx;");
    assert_contains(body, "R[0].x = PVo.x;");
    assert_eq!(body.matches("dot(").count(), 1);
}

#[test]
fn reduction_with_mismatched_clamp_is_rejected() {
    let err = pixel_error(indoc! {"
        00 ALU:
              0   x: DOT4 R0.x, R1.x, R2.x CLAMP
                  y: DOT4 ____, R1.y, R2.y
                  z: DOT4 ____, R1.z, R2.z
                  w: DOT4 ____, R1.w, R2.w
        01 EXP_DONE: PIX0, R0
    "});
    assert_eq!(err.kind, TranslateErrorKind::InconsistentReduction("clamp flag"));
    assert_eq!(err.cf_pc, 0);
    assert_contains(&err.disassembly, "DOT4");
}

#[test]
fn unsupported_alu_instruction_reports_disassembly() {
    let err = pixel_error(indoc! {"
        00 ALU:
              0   x: PRED_SET_INV ____, R0.x
        01 EXP_DONE: PIX0, R0
    "});
    assert_eq!(
        err.kind,
        TranslateErrorKind::UnsupportedAlu("PRED_SET_INV".to_owned())
    );
    assert_contains(&err.disassembly, "PRED_SET_INV");
    assert_contains(&err.to_string(), "PRED_SET_INV");
}

#[test]
fn predicate_set_updates_mask_and_predicate() {
    let shader = pixel(indoc! {"
        00 ALU_PUSH_BEFORE:
              0   x: PRED_SETGT ____, R0.x, 0.0f UPDATE_EXEC_MASK UPDATE_PRED
        01 POP: POP_CNT(1)
        02 EXP_DONE: PIX0, R0
    "});

    let body = &shader.code_body;
    assert_contains(body, "PUSH(stack, stackIndex, activeMask);");
    assert_contains(body, "predicateRegister = (R[0].x > 0.0f);");
    assert_contains(body, "activeMask = predicateRegister ? Active : InactiveBranch;");
    assert_contains(body, "PVo.x = predicateRegister ? 1.0f : 0.0f;");
    assert_contains(body, "POP(stack, stackIndex, activeMask);");
}

#[test]
fn kill_instruction_discards() {
    let shader = pixel(indoc! {"
        00 ALU:
              0   x: KILLGT ____, R0.x, R1.x
        01 EXP_DONE: PIX0, R0
    "});
    assert_contains(&shader.code_body, "if (R[0].x > R[1].x) {");
    assert_contains(&shader.code_body, "discard;");
    assert!(shader.uses_discard);
}

#[test]
fn loop_with_break() {
    let shader = pixel(indoc! {"
        00 LOOP_START_DX10: ADDR(4)
        01 ALU_BREAK:
              0   x: PRED_SETE ____, R0.x, 0.0f UPDATE_EXEC_MASK UPDATE_PRED
        02 ALU:
              1   x: ADD R0.x, R0.x, -1.0f
        03 LOOP_END: ADDR(1)
        04 EXP_DONE: PIX0, R0
    "});

    let body = &shader.code_body;
    assert_contains(body, "do {");
    assert_contains(body, "activeMask = InactiveBreak;");
    assert_contains(body, "} while (activeMask == Active);");
    assert!(body.find("do {") < body.find("} while"));
}

#[test]
fn unmatched_loop_end_is_rejected() {
    let err = pixel_error(indoc! {"
        00 NOP
        01 LOOP_END: ADDR(1)
        02 EXP_DONE: PIX0, R0
    "});
    assert_eq!(err.kind, TranslateErrorKind::NoOpenLoop("LOOP_END"));
    assert_eq!(err.cf_pc, 1);
}

#[test]
fn fully_masked_export_is_skipped() {
    let shader = pixel(indoc! {"
        00 EXP: PIX1, R3.____
        01 EXP_DONE: PIX0, R0
    "});
    assert_eq!(shader.exports.len(), 1);
    assert!(!shader.code_body.contains("exp_pixel_1"));
}

#[test]
fn burst_export_past_last_register_is_rejected() {
    let mut bytes = binary("00 EXP_DONE: POS0, R126 BURSTCNT(1)\n");
    let word0 = ExpWord0(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]));
    bytes[..4].copy_from_slice(&word0.with_rw_gpr(127).0.to_le_bytes());

    let err = translate(&ShaderDescriptor::new(ShaderStage::Vertex), &bytes).unwrap_err();
    assert_eq!(
        err.kind,
        TranslateErrorKind::ExportRegisterOutOfRange {
            gpr: 127,
            burst_count: 1,
        }
    );
    assert_eq!(err.cf_pc, 0);
}

#[test]
fn burst_export_reads_consecutive_registers() {
    let desc = ShaderDescriptor::new(ShaderStage::Vertex);
    let shader = translate(&desc, &binary("00 EXP_DONE: POS0, R126 BURSTCNT(1)\n")).unwrap();
    assert_contains(&shader.code_body, "exp_position_0.xyzw = R[126].xyzw;");
    assert_contains(&shader.code_body, "exp_position_1.xyzw = R[127].xyzw;");
    assert!(!shader.code_body.contains("R[128]"));
}

#[test]
fn export_selects_constants() {
    let shader = pixel("00 EXP_DONE: PIX0, R1.xy01\n");
    assert_contains(
        &shader.code_body,
        "exp_pixel_0.xyzw = vec4(R[1].x, R[1].y, 0, 1);",
    );
    assert_contains(&shader.code_header, "vec4 exp_pixel_0;");
}

#[test]
fn kcache_operand_declares_uniform_block() {
    let source = indoc! {"
        00 ALU: KCACHE0(CB1:0-15)
              0   x: MUL R0.x, R1.x, KC0[2].x
        01 EXP_DONE: PIX0, R0
    "};
    let desc = ShaderDescriptor::new(ShaderStage::Pixel).with_uniform_blocks(true);
    let shader = translate(&desc, &binary(source)).unwrap();

    assert_contains(&shader.code_body, "PVo.x = R[1].x * UB_1.values[2].x;");
    assert!(shader.used_uniform_blocks[1]);
    assert_contains(
        &shader.file_header,
        "layout (binding = 17) uniform UniformBlock_1 {",
    );
    assert_contains(&shader.file_header, "} UB_1;");

}

#[test]
fn uniform_operands_require_their_declarations() {
    let kcache = binary(indoc! {"
        00 ALU: KCACHE0(CB1:0-15)
              0   x: MOV R0.x, KC0[2].x
        01 EXP_DONE: PIX0, R0
    "});
    let err = translate(&ShaderDescriptor::new(ShaderStage::Pixel), &kcache).unwrap_err();
    assert_eq!(err.kind, TranslateErrorKind::UniformBlocksDisabled);

    let cfile = binary(indoc! {"
        00 ALU:
              0   x: MOV R0.x, C4.x
        01 EXP_DONE: PIX0, R0
    "});
    let err = translate(&ShaderDescriptor::new(ShaderStage::Pixel), &cfile).unwrap_err();
    assert_eq!(err.kind, TranslateErrorKind::UniformRegistersDisabled);

    let desc = ShaderDescriptor::new(ShaderStage::Pixel).with_uniform_registers(true);
    let shader = translate(&desc, &cfile).unwrap();
    assert_contains(&shader.code_body, "PVo.x = PR[4].x;");
    assert_contains(&shader.file_header, "uniform vec4 PR[256];");
}

#[test]
fn texture_sample_declares_sampler() {
    let shader = pixel(indoc! {"
        00 TEX: CNT(1)
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0
        01 EXP_DONE: PIX0, R1
    "});
    assert_contains(&shader.code_body, "texTmp = texture(sampler_0, R[0].xy);");
    assert_contains(&shader.code_body, "R[1].xyzw = texTmp.xyzw;");
    assert_eq!(shader.sampler_usage[0], SamplerUsage::Texture);
    assert_contains(
        &shader.file_header,
        "layout (binding = 0) uniform sampler2D sampler_0;",
    );
}

#[test]
fn half_texel_offsets_truncate() {
    let shader = pixel(indoc! {"
        00 TEX: CNT(1)
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0 XOFFSET(1.5) YOFFSET(-0.5)
        01 EXP_DONE: PIX0, R1
    "});
    assert_contains(
        &shader.code_body,
        "texTmp = textureOffset(sampler_0, R[0].xy, ivec2(1, 0));",
    );
}

#[test]
fn shadow_sample_uses_shadow_sampler() {
    let desc = ShaderDescriptor::new(ShaderStage::Pixel).with_sampler_dim(2, TexDim::Cube);
    let source = indoc! {"
        00 TEX: CNT(1)
              0   SAMPLE_C R1.x___, R0.xyzw, t2, s2
        01 EXP_DONE: PIX0, R1
    "};
    let shader = translate(&desc, &binary(source)).unwrap();
    assert_eq!(shader.sampler_usage[2], SamplerUsage::Shadow);
    assert_contains(&shader.file_header, "uniform samplerCubeShadow sampler_2;");
    assert_contains(&shader.code_body, "texTmp.x = texture(sampler_2, ");
}

#[test]
fn sampler_usage_conflict_is_rejected() {
    let err = pixel_error(indoc! {"
        00 TEX: CNT(2)
              0   SAMPLE R1.xyzw, R0.xy00, t0, s0
              1   SAMPLE_C R2.x___, R0.xyzw, t0, s0
        01 EXP_DONE: PIX0, R1
    "});
    assert_eq!(
        err.kind,
        TranslateErrorKind::SamplerUsageConflict {
            id: 0,
            previous: SamplerUsage::Texture,
            requested: SamplerUsage::Shadow,
        }
    );
}

#[test]
fn vertex_shader_seeds_vertex_id() {
    let desc = ShaderDescriptor::new(ShaderStage::Vertex);
    let shader = translate(&desc, &binary("00 EXP_DONE: POS0, R0\n")).unwrap();

    assert_contains(&shader.code_header, "intBitsToFloat(gl_VertexID)");
    assert_contains(&shader.file_header, "out gl_PerVertex {");
    assert_contains(&shader.code_body, "exp_position_0.xyzw = R[0].xyzw;");

    let glsl = shader.to_glsl();
    assert!(glsl.starts_with("#version 450 core\n"));
    assert!(glsl.ends_with("}\n"));
    assert_contains(&glsl, "void main()\n{\n");
}

#[test]
fn pixel_shader_has_no_vertex_seed() {
    let shader = pixel("00 EXP_DONE: PIX0, R0\n");
    assert!(!shader.code_header.contains("gl_VertexID"));
    assert!(!shader.file_header.contains("gl_PerVertex"));
}

#[test]
fn uniform_registers_are_declared_per_stage() {
    let desc = ShaderDescriptor::new(ShaderStage::Geometry).with_uniform_registers(true);
    let shader = translate(&desc, &binary("00 EXP_DONE: PARAM0, R0\n")).unwrap();
    assert_contains(&shader.file_header, "uniform vec4 GR[256];");
}

#[test]
fn truncated_binary_is_a_decode_error() {
    let err = translate(&ShaderDescriptor::new(ShaderStage::Pixel), &[0, 1, 2]).unwrap_err();
    assert!(matches!(err.kind, TranslateErrorKind::Decode(_)));
}
