//! Benchmarks for the document assembly pipeline
//!
//! Measures placeholder substitution, condition evaluation and full
//! assembly of deeds with a growing number of articles.

use akte_engine::{
    evaluate, Block, Condition, ConditionConfig, ConditionalPlaceholders, Document,
    DocumentAssembler, Node, PlaceholderContext, Rule,
};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

fn context() -> PlaceholderContext {
    PlaceholderContext::new()
        .with("NaamKoper", "Jansen")
        .with("NaamVerkoper", "De Vries")
        .with("Plaats", "Utrecht")
        .with("Hypotheek", "ja")
        .with_typed("AantalKopers", 2i64)
        .with_typed("Bouwjaar", 1972i64)
}

/// A deed with `articles` articles, each with two sub-articles, an optional
/// section and a numbering marker.
fn deed(articles: usize) -> Document {
    let mut nodes: Vec<Node> = Vec::with_capacity(articles * 6);
    for n in 1..=articles {
        nodes.push(Block::from_text(format!("[[ARTIKEL]]Artikel over {n}")).into());
        nodes.push(
            Block::from_text("[[SUBARTIKEL]]De koper [[NaamKoper]] te {Plaats}.").into(),
        );
        nodes.push(Block::from_text("[[SUBARTIKEL]]De verkoper <<NaamVerkoper>>.").into());
        nodes.push(Block::from_text("[[IF:Hypotheek]]").into());
        nodes.push(Block::from_text("Financiering door [[Bank]].").into());
        nodes.push(Block::from_text("[[ENDIF:Hypotheek]]").into());
    }
    Document::new(nodes)
}

fn buyer_conditions() -> ConditionalPlaceholders {
    ConditionalPlaceholders::new().with(
        "Kopers",
        ConditionConfig {
            rules: vec![
                Rule {
                    condition: Condition::and(vec![
                        Condition::compare("AantalKopers", ">", 1i64),
                        Condition::or(vec![
                            Condition::compare("Bouwjaar", "<", 1950i64),
                            Condition::compare("Plaats", "in", "Utrecht, Amersfoort"),
                        ]),
                    ]),
                    result: "de kopers [[NaamKoper]] c.s.".to_string(),
                },
                Rule {
                    condition: Condition::compare("AantalKopers", "==", 1i64),
                    result: "de koper [[NaamKoper]]".to_string(),
                },
            ],
            default: "de koper".to_string(),
        },
    )
}

fn bench_substitution(c: &mut Criterion) {
    let ctx = context();
    let mut group = c.benchmark_group("substitution");

    for articles in [10, 100] {
        let template = deed(articles);
        group.bench_with_input(
            BenchmarkId::from_parameter(articles),
            &template,
            |b, template| {
                b.iter(|| {
                    let mut doc = template.clone();
                    black_box(akte_engine::substitute_document(&mut doc, &ctx))
                })
            },
        );
    }
    group.finish();
}

fn bench_conditions(c: &mut Criterion) {
    let ctx = context();
    let conditions = buyer_conditions();
    let config = conditions.get("Kopers").cloned().unwrap_or_default();

    c.bench_function("evaluate_nested_condition", |b| {
        b.iter(|| black_box(evaluate(black_box(&config), &ctx)))
    });
}

fn bench_full_assembly(c: &mut Criterion) {
    let ctx = context();
    let assembler = DocumentAssembler::default().with_conditions(buyer_conditions());
    let mut group = c.benchmark_group("assemble");

    for articles in [10, 100, 500] {
        let template = deed(articles);
        group.bench_with_input(
            BenchmarkId::from_parameter(articles),
            &template,
            |b, template| b.iter(|| black_box(assembler.assemble(template, &ctx))),
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_substitution,
    bench_conditions,
    bench_full_assembly
);
criterion_main!(benches);
