#![allow(
    clippy::tests_outside_test_module,
    clippy::unwrap_used,
    reason = "benchmark"
)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use handlebars::Handlebars;
use minijinja::Environment;
use tagweave::Engine;

mod utils;

const TAGWEAVE_TEMPLATE: &str = include_str!("template_tagweave.tmpl");

fn tagweave_benchmark(c: &mut Criterion) {
    let mut engine = Engine::new();
    engine.register_partial("footer", utils::FOOTER);
    let template = engine.compile(TAGWEAVE_TEMPLATE).unwrap();
    let contexts = utils::generate_random_contexts(100);

    let mut group = c.benchmark_group("Template Rendering");
    group.sample_size(50);

    group.bench_function("tagweave_parse", |b| {
        b.iter(|| black_box(engine.parse(black_box(TAGWEAVE_TEMPLATE)).unwrap()));
    });
    group.bench_function("tagweave_render", |b| {
        b.iter(|| {
            for context in &contexts {
                black_box(template.render(context).unwrap());
            }
        });
    });

    group.finish();
}

fn handlebars_benchmark(c: &mut Criterion) {
    let mut handlebars = Handlebars::new();
    handlebars
        .register_partial("footer", utils::FOOTER)
        .unwrap();
    handlebars
        .register_template_string("profile", include_str!("template_handlebars.hbs"))
        .unwrap();
    let contexts = utils::generate_random_contexts(100);

    let mut group = c.benchmark_group("Template Rendering");
    group.sample_size(50);

    group.bench_function("handlebars_render", |b| {
        b.iter(|| {
            for context in &contexts {
                black_box(handlebars.render("profile", context).unwrap());
            }
        });
    });

    group.finish();
}

fn minijinja_benchmark(c: &mut Criterion) {
    let mut env = Environment::new();
    env.add_template("footer", "<footer>Generated for {{ user.name }} in {{ year }}</footer>")
        .unwrap();
    env.add_template("profile", include_str!("template_minijinja.jinja"))
        .unwrap();
    let contexts = utils::generate_random_contexts(100);

    let mut group = c.benchmark_group("Template Rendering");
    group.sample_size(50);

    group.bench_function("minijinja_render", |b| {
        b.iter(|| {
            let template = env.get_template("profile").unwrap();
            for context in &contexts {
                black_box(template.render(context).unwrap());
            }
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    tagweave_benchmark,
    handlebars_benchmark,
    minijinja_benchmark
);
criterion_main!(benches);
