#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::fmt::Write as _;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
#[cfg(not(target_arch = "wasm32"))]
use latte_glsl::{ShaderDescriptor, ShaderStage};

/// A pixel shader with `clauses` ALU clauses of 30 full groups, a texture clause and an
/// export.
#[cfg(not(target_arch = "wasm32"))]
fn make_binary(clauses: usize) -> Vec<u8> {
    let mut source = String::new();
    let mut group_pc = 0usize;
    for cf_pc in 0..clauses {
        let _ = writeln!(source, "{cf_pc:02} ALU: KCACHE0(CB0:0-15)");
        for _ in 0..30 {
            let r = group_pc % 60;
            let _ = writeln!(source, "      {group_pc:<4}x: MUL R{r}.x, R{}.x, 1.25f", r + 1);
            let _ = writeln!(source, "          y: ADD R{r}.y, R{}.y, -R{}.w", r + 1, r + 2);
            let _ = writeln!(source, "          z: MULADD R{r}.z, R{}.z, R{}.z, 0.5f", r + 1, r + 2);
            let _ = writeln!(source, "          w: MOV R{r}.w, KC0[{}].w", group_pc % 16);
            group_pc += 1;
        }
    }
    let _ = writeln!(source, "{:02} TEX:", clauses);
    let _ = writeln!(source, "      {group_pc:<4}SAMPLE R1.xyzw, R0.xy00, t0, s0");
    let _ = writeln!(source, "{:02} EXP_DONE: PIX0, R1.xyzw", clauses + 1);
    latte_assembler::compile(&source).unwrap().to_binary()
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("latte_glsl");
    let desc = ShaderDescriptor::new(ShaderStage::Pixel).with_uniform_blocks(true);

    for clauses in [1usize, 8, 32] {
        let binary = make_binary(clauses);
        group.throughput(Throughput::Bytes(binary.len() as u64));

        group.bench_with_input(BenchmarkId::new("translate", clauses), &binary, |b, binary| {
            b.iter(|| {
                let shader = latte_glsl::translate(&desc, black_box(binary)).unwrap();
                black_box(shader.code_body.len());
            })
        });

        group.bench_with_input(BenchmarkId::new("to_glsl", clauses), &binary, |b, binary| {
            let shader = latte_glsl::translate(&desc, binary).unwrap();
            b.iter(|| black_box(shader.to_glsl().len()))
        });
    }

    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group!(benches, bench_translate);
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
