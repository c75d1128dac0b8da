//! The progression worker serializes advance requests coming from many tasks.

mod common;

use bracket_engine_web::{
    progression_channel, BracketError, BracketGraph, BracketType, Format, MatchStore, MemoryStore,
};
use common::*;
use std::sync::Arc;

fn shared(store: MemoryStore) -> (Arc<MemoryStore>, Arc<dyn MatchStore>) {
    let store = Arc::new(store);
    let dyn_store: Arc<dyn MatchStore> = store.clone();
    (store, dyn_store)
}

#[tokio::test]
async fn concurrent_requests_generate_each_round_once() {
    let (store, id, _) = started(Format::DoubleElimination, 8);
    let (store, dyn_store) = shared(store);
    for m in playable(&store, id) {
        store.record_result(m.id, team1_wins(&m)).unwrap();
    }

    let (handle, worker) = progression_channel(dyn_store, 4);
    let worker = tokio::spawn(worker.run());

    let mut tasks = Vec::new();
    for _ in 0..10 {
        let h = handle.clone();
        tasks.push(tokio::spawn(async move { h.advance(id).await }));
    }
    let mut generated = 0;
    for t in tasks {
        generated += t.await.unwrap().unwrap().generated.len();
    }

    // L1 and W2, two matches each, created by whichever request ran first.
    assert_eq!(generated, 4);
    assert_eq!(round(&store, id, BracketType::Losers, 1).len(), 2);
    assert_eq!(round(&store, id, BracketType::Winners, 2).len(), 2);
    let graph = BracketGraph::from_matches(&store.list_matches(id).unwrap());
    assert_eq!(graph.validate(), Ok(()));

    drop(handle);
    worker.await.unwrap();
}

#[tokio::test]
async fn worker_runs_a_bracket_to_the_end() {
    let (store, id, _) = started(Format::DoubleElimination, 5);
    let (store, dyn_store) = shared(store);
    let (handle, worker) = progression_channel(dyn_store, 8);
    tokio::spawn(worker.run());

    let mut champion = None;
    for _ in 0..100 {
        let adv = handle.advance(id).await.unwrap();
        if adv.champion.is_some() {
            champion = adv.champion;
            break;
        }
        for m in playable(&store, id) {
            store.record_result(m.id, alternating(&m)).unwrap();
        }
    }
    let champion = champion.expect("bracket finished");
    let t = store.get_tournament(id).unwrap().unwrap();
    assert_eq!(t.champion, Some(champion));
}

#[tokio::test]
async fn errors_come_back_to_the_caller() {
    let (store, id) = store_with(Format::SingleElimination);
    let (_, dyn_store) = shared(store);
    let (handle, worker) = progression_channel(dyn_store, 1);
    tokio::spawn(worker.run());
    assert_eq!(handle.advance(id).await, Err(BracketError::BracketNotStarted));
}

#[tokio::test]
async fn stopped_worker_is_reported() {
    let (store, id) = store_with(Format::SingleElimination);
    let (_, dyn_store) = shared(store);
    let (handle, worker) = progression_channel(dyn_store, 1);
    drop(worker);
    assert_eq!(handle.advance(id).await, Err(BracketError::WorkerUnavailable));
}
