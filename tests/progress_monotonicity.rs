//! Progress-stream invariant (spec §8): events are monotone non-decreasing in `(stage, percent)`,
//! the first event is `percent == 0.0`, and the stream ends at `Stage::Done, percent == 1.0`.

use std::fs;

use tempfile::tempdir;
use tokio::sync::mpsc;
use ts_index::connector::api::{Container, ContainerConfig};
use ts_index::domain::Stage;

#[tokio::test]
async fn progress_events_are_monotone_and_bounded() {
    let data_dir = tempdir().unwrap();
    let project_dir = tempdir().unwrap();
    fs::write(
        project_dir.path().join("a.ts"),
        "export function add(a:number,b:number){return a+b}\nexport function sub(a:number,b:number){return a-b}",
    )
    .unwrap();

    let mut config = ContainerConfig::new(data_dir.path().to_path_buf());
    config.embed_dimensions = 8;
    let container = Container::build(&config).await.expect("container builds");

    let (tx, mut rx) = mpsc::channel(32);
    let project_path = project_dir.path().to_str().unwrap().to_string();
    let handle = tokio::spawn(async move {
        container
            .index_repository
            .execute(&project_path, None, false, Some(tx), None)
            .await
    });

    let mut events = Vec::new();
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    handle.await.unwrap().expect("indexing succeeds");

    assert!(!events.is_empty());
    assert_eq!(events.first().unwrap().percent(), 0.0);
    assert_eq!(events.first().unwrap().stage(), Stage::Scan);

    let last = events.last().unwrap();
    assert_eq!(last.stage(), Stage::Done);
    assert_eq!(last.percent(), 1.0);

    let mut previous = (events[0].stage(), events[0].percent());
    for event in &events[1..] {
        let current = (event.stage(), event.percent());
        assert!(current.0 >= previous.0, "stage went backwards: {:?} -> {:?}", previous, current);
        if current.0 == previous.0 {
            assert!(
                current.1 >= previous.1,
                "percent went backwards within a stage: {:?} -> {:?}",
                previous,
                current
            );
        }
        previous = current;
    }
}
