//! End-to-end scenarios against a real (temp-file) DuckDB database and the local deterministic
//! embedder — never the network embedder or a real language server.

use std::fs;

use tempfile::tempdir;
use ts_index::connector::api::{Container, ContainerConfig};

async fn build_container(data_dir: &std::path::Path) -> Container {
    let mut config = ContainerConfig::new(data_dir.to_path_buf());
    config.embed_dimensions = 8;
    Container::build(&config).await.expect("container builds")
}

fn write_project(dir: &std::path::Path, body: &str) {
    fs::write(dir.join("a.ts"), body).unwrap();
}

#[tokio::test]
async fn ts_project_index_and_symbol_search() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}",
    );

    let container = build_container(data_dir.path()).await;
    container
        .index_repository
        .execute(project_dir.path().to_str().unwrap(), None, false, None, None)
        .await
        .expect("indexing succeeds");

    let hits = container.symbol_store.find_by_name("add").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert!(hits[0].file().ends_with("a.ts"));
    assert_eq!(hits[0].start_line(), 1);
    assert_eq!(hits[0].end_line(), 1);
}

#[tokio::test]
async fn semantic_self_retrieval() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}",
    );

    let container = build_container(data_dir.path()).await;
    container
        .index_repository
        .execute(project_dir.path().to_str().unwrap(), None, false, None, None)
        .await
        .expect("indexing succeeds");

    let hits = container
        .search_code
        .execute("addition function", 3)
        .await
        .expect("search succeeds");

    assert!(!hits.is_empty());
    assert_eq!(hits[0].chunk().name(), "add");
}

#[tokio::test]
async fn reindex_is_idempotent() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}\nexport function sub(a:number,b:number){return a-b}",
    );

    let container = build_container(data_dir.path()).await;
    let project_path = project_dir.path().to_str().unwrap();

    container
        .index_repository
        .execute(project_path, None, false, None, None)
        .await
        .unwrap();

    let mut first_ids: Vec<String> = container
        .symbol_store
        .find_by_name("add")
        .await
        .unwrap()
        .into_iter()
        .chain(container.symbol_store.find_by_name("sub").await.unwrap())
        .map(|s| s.id().to_string())
        .collect();
    first_ids.sort();

    let chunk_count_before = container.vector_store.count().await.unwrap();

    // Re-index: with content unchanged, the file-hash cache skips re-parsing entirely, but the
    // symbol/vector ID set and counts must still come out identical.
    container
        .index_repository
        .execute(project_path, None, false, None, None)
        .await
        .unwrap();

    let mut second_ids: Vec<String> = container
        .symbol_store
        .find_by_name("add")
        .await
        .unwrap()
        .into_iter()
        .chain(container.symbol_store.find_by_name("sub").await.unwrap())
        .map(|s| s.id().to_string())
        .collect();
    second_ids.sort();

    assert_eq!(first_ids, second_ids);
    assert_eq!(chunk_count_before, container.vector_store.count().await.unwrap());

    // --force bypasses the file-hash cache and re-parses, but IDs are still stable by content.
    container
        .index_repository
        .execute(project_path, None, true, None, None)
        .await
        .unwrap();

    let mut third_ids: Vec<String> = container
        .symbol_store
        .find_by_name("add")
        .await
        .unwrap()
        .into_iter()
        .chain(container.symbol_store.find_by_name("sub").await.unwrap())
        .map(|s| s.id().to_string())
        .collect();
    third_ids.sort();

    assert_eq!(first_ids, third_ids);
    assert_eq!(chunk_count_before, container.vector_store.count().await.unwrap());
}

#[tokio::test]
async fn delete_by_file_reclaims_both_stores() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}",
    );

    let container = build_container(data_dir.path()).await;
    container
        .index_repository
        .execute(project_dir.path().to_str().unwrap(), None, false, None, None)
        .await
        .unwrap();

    let file_path = project_dir.path().join("a.ts").to_string_lossy().to_string();
    let before = container.symbol_store.find_by_name("add").await.unwrap();
    assert_eq!(before.len(), 1);
    let chunk_id = before[0].id().to_string();

    container.vector_store.delete_by_file(&file_path).await.unwrap();
    container.symbol_store.delete_by_file(&file_path).await.unwrap();

    let after = container.symbol_store.find_by_name("add").await.unwrap();
    assert!(after.is_empty());

    // A query vector matching the deleted chunk content should no longer return it.
    let vector = container.embedder.embed_query("addition function").await.unwrap();
    let hits = container.vector_store.query(&vector, 1).await.unwrap();
    assert!(hits.iter().all(|hit| hit.chunk().id() != chunk_id.as_str()));
}

#[tokio::test]
async fn reindexing_a_file_with_one_less_symbol_drops_the_removed_symbol() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}\nexport function sub(a:number,b:number){return a-b}",
    );

    let container = build_container(data_dir.path()).await;
    let project_path = project_dir.path().to_str().unwrap();
    container
        .index_repository
        .execute(project_path, None, false, None, None)
        .await
        .unwrap();
    assert_eq!(container.symbol_store.find_by_name("sub").await.unwrap().len(), 1);

    write_project(
        project_dir.path(),
        "export function add(a:number,b:number){return a+b}",
    );
    container
        .index_repository
        .execute(project_path, None, true, None, None)
        .await
        .unwrap();

    assert!(container.symbol_store.find_by_name("sub").await.unwrap().is_empty());
    assert_eq!(container.symbol_store.find_by_name("add").await.unwrap().len(), 1);
}
