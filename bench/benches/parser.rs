use criterion::{criterion_group, criterion_main, Criterion};
use jsl::{
    lexer::SUGGESTED_TOKENS_CAPACITY,
    parser::{parse_program, DEFAULT_MAX_DEPTH},
    symbols::SymbolTable,
    token::Token,
    type_checker::Checker,
};
use std::hint::black_box;

static INPUT: &str = include_str!("../../effects/color_adjust.jsl");

fn parser(input: &str, tokens: &mut Vec<Token>) {
    let mut symbols = SymbolTable::new();
    let program = parse_program(input, tokens, &mut symbols, DEFAULT_MAX_DEPTH).unwrap();
    _ = black_box(program);
}

fn checker(input: &str, tokens: &mut Vec<Token>) {
    let mut symbols = SymbolTable::new();
    let program = parse_program(input, tokens, &mut symbols, DEFAULT_MAX_DEPTH).unwrap();
    let program = Checker::new(&symbols).check(program).unwrap();
    _ = black_box(program);
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY * 2);

    c.bench_function("parser", |b| {
        b.iter(|| {
            tokens.clear();
            black_box(parser(black_box(INPUT), &mut tokens));
        });
    });
    c.bench_function("parser + checker", |b| {
        b.iter(|| {
            tokens.clear();
            black_box(checker(black_box(INPUT), &mut tokens));
        });
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
