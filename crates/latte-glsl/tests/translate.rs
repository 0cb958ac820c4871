use indoc::indoc;
use latte_assembler::compile;
use latte_glsl::{translate, ShaderDescriptor, ShaderStage, TranslateErrorKind};

const PIXEL_SHADER: &str = indoc! {"
    00 ALU:
          0   x: MOV R0.x, R1.x
              y: ADD R0.y, R1.y, 1.0f
    01 EXP_DONE: PIX0, R0.xyzw
"};

#[test]
fn pixel_shader_translates_to_a_complete_unit() {
    let binary = compile(PIXEL_SHADER).unwrap().to_binary();
    let shader = translate(&ShaderDescriptor::new(ShaderStage::Pixel), &binary).unwrap();

    insta::assert_snapshot!(shader.to_glsl(), @r"
    #version 450 core
    #extension GL_ARB_texture_gather : enable
    #define PUSH(stack, stackIndex, activeMask) stack[stackIndex++] = activeMask
    #define POP(stack, stackIndex, activeMask) activeMask = stack[--stackIndex]
    #define Active 0
    #define InactiveBranch 1
    #define InactiveBreak 2
    #define InactiveContinue 3

    int activeMask;
    bool predicateRegister;
    int stackIndex;
    int stack[16];

    void main()
    {
    vec4 R[128];
    vec4 PV;
    vec4 PVo;
    float PS;
    float PSo;
    vec4 texTmp;
    ivec4 AR;
    int AL;
    vec4 exp_pixel_0;

    activeMask = Active;
    stackIndex = 0;

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

    }
    ");
}

#[test]
fn stream_out_declares_feedback_variable() {
    let binary = compile(indoc! {"
        00 MEM_STREAM0: WRITE(2), R1.xy__ ARRAY_SIZE(1) ELEM_SIZE(3)
        01 EXP_DONE: POS0, R0
    "})
    .unwrap()
    .to_binary();

    let shader = translate(&ShaderDescriptor::new(ShaderStage::Vertex), &binary).unwrap();
    let feedback = shader.feedbacks[0][0];
    assert_eq!(feedback.offset, 8);
    assert_eq!(feedback.size, 2);
    assert_eq!(feedback.components, 2);
    assert!(shader.code_header.contains("vec2 feedback_0_8;"));
    assert!(shader.code_body.contains("feedback_0_8 = R[1].xy;"));
}

#[test]
fn translation_failure_carries_the_program_disassembly() {
    let binary = compile(indoc! {"
        00 ALU:
              0   x: PRED_SET_INV ____, R0.x
        01 EXP_DONE: PIX0, R0
    "})
    .unwrap()
    .to_binary();

    let err = translate(&ShaderDescriptor::new(ShaderStage::Pixel), &binary).unwrap_err();
    assert!(matches!(err.kind, TranslateErrorKind::UnsupportedAlu(_)));
    assert!(err.disassembly.starts_with("00 ALU:"));
    assert!(err.disassembly.contains("END_OF_PROGRAM"));
}
