use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use h1omp::dictionary::{sine_basis, uniform_dictionary};
use h1omp::{BasisPair, GreedyBasisConstructor, GreedyOptions};

fn benchmark_greedy(c: &mut Criterion) {
    let vn = sine_basis(8);
    let budgets = [8_usize, 16, 32];

    let mut group = c.benchmark_group("greedy_selection");
    for &m in budgets.iter() {
        let dictionary = uniform_dictionary(199);
        group.throughput(Throughput::Elements(m as u64));

        group.bench_with_input(BenchmarkId::new("construct", m), &dictionary, |b, input| {
            b.iter(|| {
                let mut greedy = GreedyBasisConstructor::new(
                    m,
                    input.clone(),
                    &vn,
                    GreedyOptions::default(),
                );
                let basis = greedy.construct_basis().expect("greedy selection");
                black_box(basis.n());
            });
        });
    }
    group.finish();
}

fn benchmark_reconstruction(c: &mut Criterion) {
    let vn = sine_basis(8);
    let mut greedy =
        GreedyBasisConstructor::new(24, uniform_dictionary(199), &vn, GreedyOptions::default());
    let wm = greedy.construct_basis().expect("greedy selection");
    let wm_ortho = wm.orthonormalise().expect("greedy basis has full rank");
    let pair = BasisPair::new(wm_ortho, &vn).expect("m >= n");
    let favorable = pair.make_favorable_basis().expect("orthonormal pair");

    let u = vn
        .reconstruct(ndarray::Array1::linspace(1.0, 0.1, 8).view())
        .expect("coefficients match n");

    let mut group = c.benchmark_group("optimal_reconstruction");
    group.bench_function("least_squares", |b| {
        b.iter(|| black_box(pair.measure_and_reconstruct(black_box(&u)).expect("reconstruct")))
    });
    group.bench_function("favorable", |b| {
        b.iter(|| {
            black_box(
                favorable
                    .measure_and_reconstruct(black_box(&u))
                    .expect("reconstruct"),
            )
        })
    });
    group.finish();
}

criterion_group!(greedy, benchmark_greedy, benchmark_reconstruction);
criterion_main!(greedy);
