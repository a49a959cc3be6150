use super::*;

fn target() -> SearchTarget {
    SearchTarget {
        zone: "mar_del_plata".to_owned(),
        coords: "@-38.0174516,-57.7653418,11z".to_owned(),
        query: "maderera".to_owned(),
        country: "BR".to_owned(),
        domain: "com".to_owned(),
    }
}

fn records(ids: &[&str]) -> Vec<PlaceRecord> {
    ids.iter()
        .map(|id| PlaceRecord {
            place_id: Some((*id).to_owned()),
            title: Some(format!("Place {id}")),
            ..PlaceRecord::default()
        })
        .collect()
}

fn raw(ids: &[&str]) -> Value {
    serde_json::json!({ "scrapingResult": { "locals": serde_json::to_value(records(ids)).unwrap() } })
}

async fn record(store: &mut CheckpointStore, page: u32, ids: &[&str]) {
    store
        .record_page(page, &raw(ids), records(ids))
        .await
        .expect("record_page should succeed");
}

#[test]
fn last_page_reports_highest_page_of_zone() {
    let mut map = CheckpointMap::default();
    map.insert(CheckpointKey::new("a", 2), records(&["x"]));
    map.insert(CheckpointKey::new("a", 10), records(&["y", "z"]));
    map.insert(CheckpointKey::new("b", 99), records(&[]));

    let (page, last) = map.last_page("a").unwrap();
    assert_eq!(page, 10);
    assert_eq!(last.len(), 2);
    assert!(map.last_page("c").is_none());
}

#[test]
fn map_serializes_with_rendered_keys() {
    let mut map = CheckpointMap::default();
    map.insert(CheckpointKey::new("a", 0), records(&["x"]));
    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(json["a_0"][0]["placeId"], "x");
}

#[tokio::test]
async fn snapshot_mode_writes_all_three_artifacts_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let mut store = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();

    record(&mut store, 0, &["a", "b"]).await;
    record(&mut store, 1, &["c"]).await;

    assert!(layout.page_path(&target(), 0).is_file());
    assert!(layout.page_path(&target(), 1).is_file());

    let on_disk = read_checkpoint(&store.map_path()).await.unwrap();
    assert_eq!(&on_disk, store.map());
    let keys: Vec<String> = on_disk.keys().map(ToString::to_string).collect();
    assert_eq!(keys, ["mar_del_plata_0", "mar_del_plata_1"]);

    let snapshot = std::fs::read_to_string(layout.snapshot_path(&target())).unwrap();
    assert_eq!(snapshot.lines().count(), 4, "header + 3 records:\n{snapshot}");
}

#[tokio::test]
async fn raw_page_artifact_holds_the_response_body() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let mut store = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();

    record(&mut store, 3, &["a"]).await;

    let bytes = std::fs::read(layout.page_path(&target(), 3)).unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, raw(&["a"]));
}

#[tokio::test]
async fn recording_same_page_twice_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = CheckpointStore::open(
        ArtifactLayout::new(dir.path()),
        target(),
        CheckpointMode::Snapshot,
    )
    .await
    .unwrap();

    record(&mut store, 0, &["a"]).await;
    let err = store
        .record_page(0, &raw(&["b"]), records(&["b"]))
        .await
        .unwrap_err();

    assert!(matches!(err, StoreError::DuplicatePage { ref key } if key == "mar_del_plata_0"));
    assert_eq!(store.map().record_count(), 1);
}

#[tokio::test]
async fn failed_map_write_leaves_memory_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let mut store = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();

    // A directory squatting on the map path makes the rename fail.
    std::fs::create_dir_all(store.map_path()).unwrap();
    let result = store.record_page(0, &raw(&["a"]), records(&["a"])).await;

    assert!(result.is_err());
    assert!(store.map().is_empty());
}

#[tokio::test]
async fn fresh_run_replaces_previous_checkpoint_on_first_page() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());

    let mut first = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();
    record(&mut first, 0, &["a"]).await;
    record(&mut first, 1, &["b"]).await;

    let mut second = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();
    record(&mut second, 0, &["z"]).await;

    let on_disk = read_checkpoint(&second.map_path()).await.unwrap();
    assert_eq!(on_disk.len(), 1);
    assert_eq!(on_disk.records().next().unwrap().id(), Some("z"));
}

#[tokio::test]
async fn resume_seeds_map_from_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());

    let mut first = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Snapshot)
        .await
        .unwrap();
    record(&mut first, 0, &["a"]).await;

    let mut resumed = CheckpointStore::resume(layout, target(), CheckpointMode::Snapshot)
        .await
        .unwrap();
    assert_eq!(resumed.map().len(), 1);
    record(&mut resumed, 1, &["b"]).await;

    let on_disk = read_checkpoint(&resumed.map_path()).await.unwrap();
    assert_eq!(on_disk.len(), 2);
}

#[tokio::test]
async fn resume_without_checkpoint_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::resume(
        ArtifactLayout::new(dir.path()),
        target(),
        CheckpointMode::Log,
    )
    .await
    .unwrap();
    assert!(store.map().is_empty());
}

#[tokio::test]
async fn log_mode_appends_one_line_per_page() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let mut store = CheckpointStore::open(layout, target(), CheckpointMode::Log)
        .await
        .unwrap();

    record(&mut store, 0, &["a"]).await;
    record(&mut store, 1, &["b", "c"]).await;
    record(&mut store, 2, &[]).await;

    let text = std::fs::read_to_string(store.map_path()).unwrap();
    assert_eq!(text.lines().count(), 3);
    let on_disk = read_checkpoint(&store.map_path()).await.unwrap();
    assert_eq!(&on_disk, store.map());
}

#[tokio::test]
async fn log_mode_resume_compacts_torn_tail() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let mut first = CheckpointStore::open(layout.clone(), target(), CheckpointMode::Log)
        .await
        .unwrap();
    record(&mut first, 0, &["a"]).await;
    let path = first.map_path();

    // Simulate a crash in the middle of appending page 1.
    let mut text = std::fs::read_to_string(&path).unwrap();
    text.push_str("{\"key\":\"mar_del_plata_1\",\"rec");
    std::fs::write(&path, text).unwrap();

    let mut resumed = CheckpointStore::resume(layout, target(), CheckpointMode::Log)
        .await
        .unwrap();
    assert_eq!(resumed.map().len(), 1);
    record(&mut resumed, 1, &["b"]).await;

    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(text.lines().count(), 2, "log should be rewritten cleanly:\n{text}");
    assert_eq!(read_checkpoint(&path).await.unwrap().len(), 2);
}
