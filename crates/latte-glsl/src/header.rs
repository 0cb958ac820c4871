use std::fmt::Write as _;

use latte_isa::TexDim;

use crate::descriptor::{
    SamplerUsage, ShaderDescriptor, ShaderStage, TranslatedShader, MAX_SAMPLERS,
    UNIFORM_BLOCK_ELEMENTS,
};

/// Binding of uniform block 0; vertex blocks use 0..16, every other stage 16..32.
const fn uniform_block_base(stage: ShaderStage) -> usize {
    match stage {
        ShaderStage::Vertex => 0,
        ShaderStage::Pixel | ShaderStage::Geometry => 16,
    }
}

fn sampler_type(dim: TexDim, usage: SamplerUsage) -> &'static str {
    let shadow = usage == SamplerUsage::Shadow;
    match (dim, shadow) {
        (TexDim::Dim1D, false) => "sampler1D",
        (TexDim::Dim1D, true) => "sampler1DShadow",
        (TexDim::Dim2D, false) => "sampler2D",
        (TexDim::Dim2D, true) => "sampler2DShadow",
        (TexDim::Dim3D, _) => "sampler3D",
        (TexDim::Cube, false) => "samplerCube",
        (TexDim::Cube, true) => "samplerCubeShadow",
        (TexDim::Dim1DArray, false) => "sampler1DArray",
        (TexDim::Dim1DArray, true) => "sampler1DArrayShadow",
        (TexDim::Dim2DArray, false) => "sampler2DArray",
        (TexDim::Dim2DArray, true) => "sampler2DArrayShadow",
        (TexDim::Dim2DMsaa, _) => "sampler2DMS",
        (TexDim::Dim2DArrayMsaa, _) => "sampler2DMSArray",
    }
}

/// Declarations placed before `main`.
pub(crate) fn file_header(desc: &ShaderDescriptor, shader: &TranslatedShader) -> String {
    let mut out = String::new();

    out.push_str("#version 450 core\n");
    out.push_str("#extension GL_ARB_texture_gather : enable\n");
    out.push_str("#define PUSH(stack, stackIndex, activeMask) stack[stackIndex++] = activeMask\n");
    out.push_str("#define POP(stack, stackIndex, activeMask) activeMask = stack[--stackIndex]\n");
    out.push_str("#define Active 0\n");
    out.push_str("#define InactiveBranch 1\n");
    out.push_str("#define InactiveBreak 2\n");
    out.push_str("#define InactiveContinue 3\n");
    out.push('\n');

    out.push_str("int activeMask;\n");
    out.push_str("bool predicateRegister;\n");
    out.push_str("int stackIndex;\n");
    out.push_str("int stack[16];\n");
    out.push('\n');

    if desc.uniform_registers_enabled {
        let _ = writeln!(out, "uniform vec4 {}[256];", desc.stage.uniform_registers());
        out.push('\n');
    }

    if desc.uniform_blocks_enabled {
        let base = uniform_block_base(desc.stage);
        for (index, _) in shader
            .used_uniform_blocks
            .iter()
            .enumerate()
            .filter(|(_, used)| **used)
        {
            let _ = writeln!(
                out,
                "layout (binding = {}) uniform UniformBlock_{index} {{\n   vec4 values[{UNIFORM_BLOCK_ELEMENTS}];\n}} UB_{index};",
                base + index
            );
            out.push('\n');
        }
    }

    for id in 0..MAX_SAMPLERS {
        let usage = shader.sampler_usage[id];
        if usage == SamplerUsage::Unused {
            continue;
        }
        let _ = writeln!(
            out,
            "layout (binding = {id}) uniform {} sampler_{id};",
            sampler_type(shader.sampler_dims[id], usage)
        );
    }
    if shader.sampler_usage.iter().any(|usage| *usage != SamplerUsage::Unused) {
        out.push('\n');
    }

    if desc.stage == ShaderStage::Vertex {
        out.push_str("out gl_PerVertex {\n   vec4 gl_Position;\n};\n");
        out.push('\n');
    }

    out
}

/// Local declarations and initial state at the top of `main`.
pub(crate) fn code_header(shader: &TranslatedShader) -> String {
    let mut out = String::new();

    out.push_str("vec4 R[128];\n");
    out.push_str("vec4 PV;\n");
    out.push_str("vec4 PVo;\n");
    out.push_str("float PS;\n");
    out.push_str("float PSo;\n");
    out.push_str("vec4 texTmp;\n");
    out.push_str("ivec4 AR;\n");
    out.push_str("int AL;\n");

    for export in &shader.exports {
        let _ = writeln!(out, "vec4 {};", export.variable());
    }
    for feedback in shader.feedbacks.iter().flatten() {
        let _ = writeln!(out, "{} {};", feedback.glsl_type(), feedback.variable());
    }

    out.push('\n');
    out.push_str("activeMask = Active;\n");
    out.push_str("stackIndex = 0;\n");

    if shader.stage == ShaderStage::Vertex {
        out.push_str(
            "R[0] = vec4(intBitsToFloat(gl_VertexID), intBitsToFloat(gl_InstanceID), 0.0, 0.0);\n",
        );
    }

    out
}
