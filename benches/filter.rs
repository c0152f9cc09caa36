//! This bench test compares filtering a large store from scratch with
//! refreshing a cached view whose inputs have not changed.

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use opportunities::{
    FilteredView, IdPolicy, NewOpportunity, OpportunityStore, Query, Stage, StageFilter, query,
};

fn preseed_store() -> OpportunityStore {
    OpportunityStore::from_records(
        IdPolicy::Count,
        (0..10_000u32)
            .zip(Stage::ALL.into_iter().cycle())
            .map(|(i, stage)| {
                NewOpportunity::new(format!("Customer {i}"), i * 10).with_stage(stage)
            }),
    )
}

fn filter(c: &mut Criterion) {
    let store = preseed_store();

    c.bench_function("filter by text", |b| {
        b.iter(|| query::filter(store.list(), black_box("o-09"), StageFilter::All));
    });

    c.bench_function("filter by text and stage", |b| {
        b.iter(|| {
            query::filter(
                store.list(),
                black_box("customer 1"),
                StageFilter::Only(Stage::Negotiation),
            )
        });
    });

    let query = Query::new("customer 1", StageFilter::All);
    let mut view = FilteredView::new();
    view.refresh(&store, &query);
    c.bench_function("refresh unchanged view", |b| {
        b.iter(|| view.refresh(black_box(&store), &query));
    });
}

criterion_group!(benches, filter);
criterion_main!(benches);
