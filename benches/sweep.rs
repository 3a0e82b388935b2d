use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use platypus::{Function, Recorder, Value};

fn rosenbrock<'t>(x: &[Value<'t, f64>]) -> Value<'t, f64> {
    let mut sum = x[0] * 0.0;
    for i in 0..x.len() - 1 {
        let t1 = 1.0 - x[i];
        let t2 = x[i + 1] - x[i] * x[i];
        sum = sum + t1 * t1 + 100.0 * (t2 * t2);
    }
    sum
}

fn record_rosenbrock(n: usize) -> Function<f64> {
    let rec = Recorder::new();
    let x0 = vec![0.5_f64; n];
    let x = rec.independent(&x0);
    let y = rosenbrock(&x);
    rec.seal(&[y])
}

fn bench_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("recording");
    for n in [8usize, 64, 256] {
        group.bench_with_input(BenchmarkId::new("rosenbrock", n), &n, |b, &n| {
            b.iter(|| black_box(record_rosenbrock(n)));
        });
    }
    group.finish();
}

fn bench_forward(c: &mut Criterion) {
    let mut group = c.benchmark_group("forward0");
    for n in [8usize, 64, 256] {
        let fun = record_rosenbrock(n);
        let x = vec![0.7_f64; n];
        group.bench_with_input(BenchmarkId::new("rosenbrock", n), &n, |b, _| {
            let mut ws = fun.workspace();
            b.iter(|| {
                ws.reset();
                black_box(ws.forward0(black_box(&x)))
            });
        });
    }
    group.finish();
}

fn bench_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("gradient");
    for n in [8usize, 64, 256] {
        let fun = record_rosenbrock(n);
        let x = vec![0.7_f64; n];
        group.bench_with_input(BenchmarkId::new("rosenbrock", n), &n, |b, _| {
            let mut ws = fun.workspace();
            b.iter(|| black_box(ws.gradient(black_box(&x))));
        });
    }
    group.finish();
}

fn bench_sparsity(c: &mut Criterion) {
    let mut group = c.benchmark_group("sparsity");
    for n in [64usize, 256] {
        let fun = record_rosenbrock(n);
        group.bench_with_input(BenchmarkId::new("hessian_pattern", n), &n, |b, _| {
            let select = vec![true];
            b.iter(|| black_box(fun.hes_sparsity(black_box(&select))));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_recording,
    bench_forward,
    bench_gradient,
    bench_sparsity
);
criterion_main!(benches);
