#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
use std::fmt::Write as _;

#[cfg(not(target_arch = "wasm32"))]
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Builds `clauses` ALU clauses of 30 full groups each, followed by a texture clause and a
/// position export.
#[cfg(not(target_arch = "wasm32"))]
fn make_program(clauses: usize) -> String {
    let mut source = String::from("; $MODE = UniformRegister\n");
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
    let _ = writeln!(source, "{:02} EXP_DONE: POS0, R0.xyzw", clauses + 1);
    source
}

#[cfg(not(target_arch = "wasm32"))]
fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("latte_assembler");

    for clauses in [1usize, 8, 32] {
        let source = make_program(clauses);
        group.throughput(Throughput::Bytes(source.len() as u64));

        group.bench_with_input(BenchmarkId::new("parse", clauses), &source, |b, source| {
            b.iter(|| {
                let statements = latte_assembler::parse(black_box(source)).unwrap();
                black_box(statements.len());
            })
        });

        group.bench_with_input(BenchmarkId::new("compile", clauses), &source, |b, source| {
            b.iter(|| {
                let program = latte_assembler::compile(black_box(source)).unwrap();
                black_box(program.alu_clause_data.len());
            })
        });

        // Disassembly of the same program, so the two directions can be compared.
        let binary = latte_assembler::compile(&source).unwrap().to_binary();
        group.bench_with_input(BenchmarkId::new("disassemble", clauses), &binary, |b, binary| {
            b.iter(|| {
                let text = latte_isa::disassemble(black_box(binary)).unwrap();
                black_box(text.len());
            })
        });
    }

    group.finish();
}

#[cfg(not(target_arch = "wasm32"))]
criterion_group!(benches, bench_assemble);
#[cfg(not(target_arch = "wasm32"))]
criterion_main!(benches);
