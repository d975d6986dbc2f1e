//! Vector-store invariants (spec §8): bijection between `chunks`, `vec_map`, and the vector
//! table; dimension lock on first write; KNN strictly ordered by ascending distance.

use ts_index::connector::adapter::DuckdbVectorStore;
use ts_index::domain::{CodeChunk, Kind, Symbol, SourceLang};
use ts_index::VectorStore;

fn chunk(name: &str) -> CodeChunk {
    let id = Symbol::compute_id("a.ts", 1, 1, Kind::Function, name);
    CodeChunk::new(
        id,
        name.to_string(),
        Kind::Function,
        "a.ts".to_string(),
        SourceLang::Ts,
        "function_declaration".to_string(),
        1,
        1,
        0,
        10,
        format!("export function {name}() {{}}"),
        String::new(),
    )
}

#[tokio::test]
async fn vector_bijection_holds_after_repeated_upserts() {
    let store = DuckdbVectorStore::in_memory().unwrap();
    let c = chunk("add");

    store.upsert(&[c.clone()], &[vec![0.1, 0.2, 0.3]]).await.unwrap();
    store.upsert(&[c.clone()], &[vec![0.4, 0.5, 0.6]]).await.unwrap();

    assert_eq!(store.count().await.unwrap(), 1);

    let hits = store.query(&[0.4, 0.5, 0.6], 10).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].chunk().id(), c.id());
}

#[tokio::test]
async fn dimension_is_frozen_on_first_write() {
    let store = DuckdbVectorStore::in_memory().unwrap();
    let c = chunk("add");
    store.upsert(&[c], &[vec![0.1, 0.2, 0.3, 0.4]]).await.unwrap();

    assert_eq!(store.dimension().await.unwrap(), Some(4));

    let other = chunk("sub");
    let err = store.upsert(&[other], &[vec![0.1, 0.2]]).await.unwrap_err();
    assert!(err.to_string().contains("dimension"));
}

#[tokio::test]
async fn knn_results_are_ordered_by_ascending_distance() {
    let store = DuckdbVectorStore::in_memory().unwrap();
    let near = chunk("near_fn");
    let mid = chunk("mid_fn");
    let far = chunk("far_fn");

    store
        .upsert(
            &[far.clone(), near.clone(), mid.clone()],
            &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.7, 0.3]],
        )
        .await
        .unwrap();

    let hits = store.query(&[1.0, 0.0], 3).await.unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].chunk().id(), near.id());
    assert_eq!(hits[2].chunk().id(), far.id());

    let mut previous_score = f32::INFINITY;
    for hit in &hits {
        assert!(hit.score() <= previous_score);
        previous_score = hit.score();
    }
}

#[tokio::test]
async fn delete_by_file_removes_chunk_vector_and_mapping() {
    let store = DuckdbVectorStore::in_memory().unwrap();
    let c = chunk("add");
    store.upsert(&[c.clone()], &[vec![0.1, 0.2]]).await.unwrap();
    assert_eq!(store.count().await.unwrap(), 1);

    let deleted = store.delete_by_file("a.ts").await.unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(store.count().await.unwrap(), 0);

    let hits = store.query(&[0.1, 0.2], 1).await.unwrap();
    assert!(hits.is_empty());
}
