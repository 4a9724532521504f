use criterion::{black_box, criterion_group, criterion_main, Criterion};
use prism_rex::types::{SqlTypeName, TypeFactory};
use prism_rex::{std_operators, Datum, Environment, RexBuilder, RexInterpreter, RexNode};
use rust_decimal::Decimal;

/// `((($0 + 1) + 2) + ...) > 0`
fn build_chain(b: &RexBuilder, depth: i64) -> RexNode {
    let ops = std_operators();
    let int = b.type_factory().create_type(SqlTypeName::Integer).unwrap();
    let mut e = b.make_input_ref(int, 0);
    for i in 1..=depth {
        let lit = b.make_exact_literal(Decimal::from(i)).unwrap();
        e = b.make_call(&ops.plus, vec![e, lit]).unwrap();
    }
    let zero = b.make_exact_literal(Decimal::ZERO).unwrap();
    b.make_call(&ops.greater_than, vec![e, zero]).unwrap()
}

fn bench_build_and_digest(c: &mut Criterion) {
    let b = RexBuilder::default();
    c.bench_function("build_chain_64", |bench| {
        bench.iter(|| {
            let e = build_chain(&b, black_box(64));
            black_box(e.digest().len())
        })
    });
}

fn bench_interpret(c: &mut Criterion) {
    let b = RexBuilder::default();
    let e = build_chain(&b, 64);
    let input = b
        .make_input_ref(b.type_factory().create_type(SqlTypeName::Integer).unwrap(), 0);
    let mut env = Environment::new();
    env.insert(input, Datum::from(-100i64));
    c.bench_function("interpret_chain_64", |bench| {
        bench.iter(|| RexInterpreter::evaluate(black_box(&e), &env).unwrap())
    });
}

fn bench_copy(c: &mut Criterion) {
    let b = RexBuilder::default();
    let e = build_chain(&b, 64);
    c.bench_function("copy_chain_64", |bench| bench.iter(|| b.copy(black_box(&e)).unwrap()));
}

criterion_group!(benches, bench_build_and_digest, bench_interpret, bench_copy);
criterion_main!(benches);
