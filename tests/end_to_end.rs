use indoc::indoc;
use latte_toolchain::glsl::Export;
use latte_toolchain::isa::ExportType;
use latte_toolchain::{compile, disassemble, translate, ShaderDescriptor, ShaderStage};
use pretty_assertions::assert_eq;

const VERTEX_SHADER: &str = indoc! {"
    ; $MODE = UniformBlock
    00 TEX: CNT(1)
          0   SAMPLE_LZ R2.xyzw, R1.xy00, t0, s0
    01 ALU_PUSH_BEFORE: KCACHE0(CB0:0-15)
          1   x: MUL R3.x, R1.x, KC0[0].x
              y: MUL R3.y, R1.y, KC0[0].y
              z: MOV R3.z, 0.0f
              w: MOV R3.w, 1.0f
          2   x: PRED_SETGT ____, R2.w, 0.5 UPDATE_EXEC_MASK UPDATE_PRED
    02 ALU_POP_AFTER:
          3   x: MUL R2.x, R2.x, 0.5
    03 EXP: PARAM0, R2.xyzw
    04 EXP_DONE: POS0, R3.xyzw
    END_OF_PROGRAM
"};

#[test]
fn assembled_program_disassembles_and_reassembles() {
    let binary = compile(VERTEX_SHADER).unwrap().to_binary();
    let text = disassemble(&binary).unwrap();

    assert!(text.contains("SAMPLE_LZ"));
    assert!(text.contains("KCACHE0(CB0:0-15)"));
    assert!(text.ends_with("END_OF_PROGRAM\n"));

    let again = compile(&text).unwrap().to_binary();
    assert_eq!(again, binary);
}

#[test]
fn assembled_program_translates_to_glsl() {
    let binary = compile(VERTEX_SHADER).unwrap().to_binary();
    let desc = ShaderDescriptor::new(ShaderStage::Vertex).with_uniform_blocks(true);
    let shader = translate(&desc, &binary).unwrap();

    assert_eq!(
        shader.exports,
        vec![
            Export {
                ty: ExportType::Parameter,
                id: 0,
            },
            Export {
                ty: ExportType::Position,
                id: 0,
            },
        ]
    );
    assert!(shader.used_uniform_blocks[0]);

    let glsl = shader.to_glsl();
    assert!(glsl.contains("layout (binding = 0) uniform UniformBlock_0 {"));
    assert!(glsl.contains("layout (binding = 0) uniform sampler2D sampler_0;"));
    assert!(glsl.contains("texTmp = textureLod(sampler_0, R[1].xy, 0);"));
    assert!(glsl.contains("PVo.x = R[1].x * UB_0.values[0].x;"));
    assert!(glsl.contains("predicateRegister = (R[2].w > 0.5f);"));
    assert!(glsl.contains("exp_param_0.xyzw = R[2].xyzw;"));
    assert!(glsl.contains("exp_position_0.xyzw = R[3].xyzw;"));

    let pushes = glsl.matches("PUSH(stack, stackIndex, activeMask);").count();
    let pops = glsl.matches("POP(stack, stackIndex, activeMask);").count();
    assert_eq!(pushes, 1);
    assert_eq!(pops, 1);
}
