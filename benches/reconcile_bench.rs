// ABOUTME: Criterion benchmarks for recipe tree reconciliation
// ABOUTME: Measures level planning in memory and full transactional saves on in-memory SQLite
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Criterion benchmarks for recipe tree reconciliation.
//!
//! Level planning is pure and measured alone with growing sibling counts.
//! Full saves go through the `SQLite` store to show the cost per entity.

#![allow(
    clippy::missing_docs_in_private_items,
    clippy::cast_possible_wrap,
    clippy::unwrap_used,
    missing_docs
)]

use criterion::{
    black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput,
};
use recipe_book::database::repositories::SqliteRecipeStore;
use recipe_book::database::Database;
use recipe_book::models::{Chapter, EntityId, Ingredient, Recipe, Step};
use recipe_book::reconcile::{plan_level, ReconciliationEngine};
use tokio::runtime::Runtime;

/// Steps with persisted ids `1..=count`
fn persisted_steps(count: usize) -> Vec<Step> {
    (1..=count)
        .map(|index| Step {
            id: EntityId::Persisted(index as i64),
            description: format!("Step {index}"),
            order_number: index as u32,
            ..Step::default()
        })
        .collect()
}

/// Edited copy: every third step removed, the rest reversed, and new steps appended
fn edited_steps(persisted: &[Step]) -> Vec<Step> {
    let mut draft: Vec<Step> = persisted
        .iter()
        .enumerate()
        .filter(|(index, _)| index % 3 != 0)
        .map(|(_, step)| step.clone())
        .rev()
        .collect();
    draft.extend((0..persisted.len() / 4).map(|index| Step {
        description: format!("Added {index}"),
        ..Step::default()
    }));
    draft
}

fn generate_recipe(chapters: usize, steps: usize, ingredients: usize) -> Recipe {
    Recipe {
        name: "Benchmark".into(),
        category: "Bench".into(),
        chapters: (0..chapters)
            .map(|c| Chapter {
                name: format!("Chapter {c}"),
                steps: (0..steps)
                    .map(|s| Step {
                        description: format!("Step {c}.{s}"),
                        ingredients: (0..ingredients)
                            .map(|i| Ingredient {
                                name: format!("Ingredient {i}"),
                                quantity: 10.0,
                                unit: "g".into(),
                                ..Ingredient::default()
                            })
                            .collect(),
                        ..Step::default()
                    })
                    .collect(),
                ..Chapter::default()
            })
            .collect(),
        ..Recipe::default()
    }
}

fn bench_plan_level(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_level");

    for count in [10_usize, 100, 1_000] {
        let persisted = persisted_steps(count);
        let draft = edited_steps(&persisted);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("steps", count), &count, |b, _| {
            b.iter(|| {
                let plan = plan_level(black_box(&draft), black_box(&persisted));
                black_box(plan.to_batch(1))
            });
        });
    }

    group.finish();
}

fn bench_save_tree(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("save_tree");

    let store = rt.block_on(async {
        SqliteRecipeStore::new(Database::new_in_memory().await.unwrap())
    });

    // 1 + 4 + 4*8 + 4*8*3 entities
    let tree = generate_recipe(4, 8, 3);
    group.throughput(Throughput::Elements(tree.entity_count() as u64));

    group.bench_function("new_tree", |b| {
        b.iter(|| {
            rt.block_on(ReconciliationEngine::save_tree(&store, black_box(&tree), None))
                .unwrap()
        });
    });

    let saved = rt
        .block_on(ReconciliationEngine::save_tree(&store, &tree, None))
        .unwrap()
        .recipe;

    group.bench_function("unchanged_tree", |b| {
        b.iter(|| {
            rt.block_on(ReconciliationEngine::save_tree(
                &store,
                black_box(&saved),
                Some(&saved),
            ))
            .unwrap()
        });
    });

    group.bench_function("edited_tree", |b| {
        b.iter_batched(
            || {
                let saved = rt
                    .block_on(ReconciliationEngine::save_tree(&store, &tree, None))
                    .unwrap()
                    .recipe;
                let mut edited = saved.clone();
                edited.chapters.swap(0, 3);
                edited.chapters[1].steps.truncate(4);
                (saved, edited)
            },
            |(saved, edited)| {
                rt.block_on(ReconciliationEngine::save_tree(
                    &store,
                    black_box(&edited),
                    Some(&saved),
                ))
                .unwrap()
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_plan_level, bench_save_tree);
criterion_main!(benches);
