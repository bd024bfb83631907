//! Benchmarks for the compiler and the bytecode VM.

use bnuuy::compiler::compile;
use bnuuy::Vm;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// A left-leaning sum of `n` terms mixing every arithmetic operator.
fn arithmetic_source(n: usize) -> String {
    let mut source = String::from("1");
    for i in 0..n {
        let op = ["+", "-", "*", "/"][i % 4];
        source.push_str(&format!(" {} ({} + -{})", op, i + 2, i % 7));
    }
    source
}

/// A right-nested expression that keeps `depth` values live on the stack.
fn nested_source(depth: usize) -> String {
    let mut source = String::new();
    for i in 0..depth {
        source.push_str(&format!("{} + (", i));
    }
    source.push('0');
    source.push_str(&")".repeat(depth));
    source
}

fn compile_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for n in [10, 60, 120].iter() {
        let source = arithmetic_source(*n);
        group.bench_with_input(BenchmarkId::new("arithmetic", n), &source, |b, src| {
            b.iter(|| compile(black_box(src)).unwrap())
        });
    }

    group.finish();
}

fn execute_only(c: &mut Criterion) {
    let mut group = c.benchmark_group("execute");

    for n in [10, 60, 120].iter() {
        let chunk = compile(&arithmetic_source(*n)).unwrap();
        let mut vm = Vm::new();
        group.bench_with_input(BenchmarkId::new("arithmetic", n), &chunk, |b, chunk| {
            b.iter(|| vm.run(black_box(chunk)).unwrap())
        });
    }

    let chunk = compile(&nested_source(200)).unwrap();
    let mut vm = Vm::new();
    group.bench_function("nested_200", |b| b.iter(|| vm.run(black_box(&chunk)).unwrap()));

    group.finish();
}

fn compile_and_execute(c: &mut Criterion) {
    let source = arithmetic_source(60);
    let mut vm = Vm::new();
    c.bench_function("interpret_arithmetic_60", |b| {
        b.iter(|| vm.interpret(black_box(&source)).unwrap())
    });
}

criterion_group!(benches, compile_only, execute_only, compile_and_execute);
criterion_main!(benches);
