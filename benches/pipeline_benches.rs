use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use SymEntry::units::unit_table::UnitTable;
use SymEntry::validation::orchestrator::EntryValidator;
use SymEntry::validation::pipeline::{
    UnitTarget, parse_expr, parse_expr_units, units_are_consistent,
};

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse expression", |b| {
        b.iter(|| parse_expr(black_box("2*cos(pi/4)**2 + sqrt(x)/(1+y)")))
    });
}

fn bench_consistency(c: &mut Criterion) {
    let table = UnitTable::standard();
    let target = UnitTarget::from("ft");
    c.bench_function("parse with units and check", |b| {
        b.iter(|| {
            let expr = parse_expr_units(black_box("5*mm + 1*inch + 2*ft/3"), &table)
                .ok()
                .flatten();
            expr.map(|e| units_are_consistent(&e, Some(&target), &table).is_ok())
        })
    });
}

fn bench_cycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("validation cycle");
    if let Ok(mut entry) = EntryValidator::entry("2*mm + 3*inch", "length") {
        group.bench_function("entry with selector", |b| {
            b.iter(|| entry.revalidate().is_valid())
        });
    }
    group.bench_function("unit entry, error path", |b| {
        let mut entry = EntryValidator::unit("2*mm + 3*kg");
        b.iter(|| entry.revalidate().is_valid())
    });
    group.finish();
}

criterion_group!(benches, bench_parse, bench_consistency, bench_cycle);
criterion_main!(benches);
