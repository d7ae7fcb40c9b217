use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use pgwrap::{Filter, SelectBuilder, Statement, insert, select, translate_named};

/// SELECT col0, col1, ... FROM t WHERE col0 = %(col0)s AND col1 = %(col1)s ...
fn build_select(n: usize) -> SelectBuilder<'static> {
    let mut qb = select("t");
    qb.fields((0..n).map(|i| format!("col{i}")));
    for i in 0..n {
        qb.where_eq(&format!("col{i}"), i as i64);
    }
    qb
}

fn bench_select_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/select_render");

    for n in [1, 5, 10, 50, 100] {
        let qb = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &qb, |b, qb| {
            b.iter(|| black_box(qb.render()));
        });
    }

    group.finish();
}

fn bench_insert_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("builder/insert_render");

    for n in [1, 10, 50] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let mut qb = insert("t");
                qb.set_constant("created", "now()");
                for i in 0..n {
                    qb.set(&format!("col{i}"), i as i64);
                }
                black_box(qb.render())
            });
        });
    }

    group.finish();
}

fn bench_translate(c: &mut Criterion) {
    let mut group = c.benchmark_group("placeholder/translate");

    for n in [1, 10, 100] {
        let sql = build_select(n).render().expect("select renders");
        group.bench_with_input(BenchmarkId::from_parameter(n), &sql, |b, sql| {
            b.iter(|| black_box(translate_named(sql)));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_select_render,
    bench_insert_render,
    bench_translate
);
criterion_main!(benches);
