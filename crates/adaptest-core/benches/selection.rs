use std::collections::HashSet;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use adaptest_core::config::SelectionConfig;
use adaptest_core::model::{AbilityEstimate, Item, ItemParameters};
use adaptest_core::selection::select_next;

fn pool(n: usize) -> Vec<Item> {
    (0..n)
        .map(|i| {
            let b = -3.0 + 6.0 * i as f64 / n as f64;
            Item::new(format!("q{i}"), ItemParameters::new(b, 0.8 + (i % 5) as f64 * 0.2, 0.2))
        })
        .collect()
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select_next");
    let config = SelectionConfig::default();
    let ability = AbilityEstimate::seed(0.3);

    for n in [50usize, 500, 5000] {
        let items = pool(n);
        let answered: HashSet<String> = items.iter().step_by(4).map(|i| i.id.clone()).collect();
        group.bench_function(format!("pool={n}"), |b| {
            b.iter(|| select_next(black_box(&items), black_box(&ability), &answered, &config))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_select);
criterion_main!(benches);
