use criterion::{criterion_group, criterion_main, Criterion};
use jsl::{
    lexer::{self, SUGGESTED_TOKENS_CAPACITY},
    token::Token,
};
use std::hint::black_box;

static INPUTS: [(&str, &str); 3] = [
    ("brightpass", include_str!("../../effects/brightpass.jsl")),
    ("box_blur", include_str!("../../effects/box_blur.jsl")),
    ("color_adjust", include_str!("../../effects/color_adjust.jsl")),
];

fn lex(input: &str, tokens: &mut Vec<Token>) {
    lexer::lex(input, tokens);
    let significant = tokens.iter().filter(|t| !t.kind.is_trivia()).count();
    black_box(significant);
    debug_assert!(!tokens.iter().any(|t| t.kind.is_error()));
}

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    for (name, input) in INPUTS {
        c.bench_function(&format!("lex {name}"), |b| {
            b.iter(|| {
                tokens.clear();
                lex(black_box(input), &mut tokens);
            });
        });
    }
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
