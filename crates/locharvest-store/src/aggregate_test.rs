use locharvest_core::CheckpointKey;

use super::*;

fn place(id: &str, title: &str) -> PlaceRecord {
    PlaceRecord {
        place_id: Some(id.to_owned()),
        title: Some(title.to_owned()),
        ..PlaceRecord::default()
    }
}

fn page(zone: &str, page: u32, places: &[(&str, &str)]) -> (CheckpointKey, Vec<PlaceRecord>) {
    let records = places.iter().map(|(id, title)| place(id, title)).collect();
    (CheckpointKey::new(zone, page), records)
}

fn map_of<const N: usize>(pages: [(CheckpointKey, Vec<PlaceRecord>); N]) -> CheckpointMap {
    let mut map = CheckpointMap::default();
    for (key, records) in pages {
        map.insert(key, records);
    }
    map
}

fn write_map(layout: &ArtifactLayout, file_name: &str, map: &CheckpointMap) {
    let dir = layout.maps_dir();
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join(file_name), serde_json::to_vec(map).unwrap()).unwrap();
}

fn read_dataset(path: &Path) -> Vec<(String, String)> {
    csv::Reader::from_path(path)
        .unwrap()
        .records()
        .map(|r| {
            let r = r.unwrap();
            (r[2].to_owned(), r[0].to_owned())
        })
        .collect()
}

#[test]
fn dedupe_keeps_first_occurrence_in_order() {
    let records = vec![
        place("X", "first"),
        place("Y", "y"),
        place("X", "second"),
        PlaceRecord::default(),
        PlaceRecord::default(),
    ];
    let out = dedupe_by_place_id(records);
    assert_eq!(out.len(), 4);
    assert_eq!(out[0].title.as_deref(), Some("first"));
    assert_eq!(out[1].id(), Some("Y"));
    assert!(out[2].id().is_none() && out[3].id().is_none());
}

#[test]
fn dedupe_is_idempotent() {
    let once = dedupe_by_place_id(vec![place("A", "a"), place("A", "b"), place("B", "c")]);
    let twice = dedupe_by_place_id(once.clone());
    assert_eq!(once, twice);
}

#[tokio::test]
async fn later_artifact_wins_on_key_collision() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write_map(&layout, "a_first.json", &map_of([page("a", 0, &[("X", "old"), ("Y", "y")])]));
    write_map(&layout, "b_second.json", &map_of([page("a", 0, &[("X", "new"), ("Z", "z")])]));

    let aggregator = Aggregator::new(&layout);
    let merged = aggregator.load_merged().await.unwrap();
    assert_eq!(merged.artifacts, 2);
    let winner = merged.map.get(&CheckpointKey::new("a", 0)).unwrap();
    assert_eq!(winner, &vec![place("X", "new"), place("Z", "z")]);

    let output = dir.path().join("final.csv");
    let summary = aggregator.run(&output).await.unwrap();
    assert_eq!(summary.records_in, 4);
    assert_eq!(summary.records_out, 3);

    let rows = read_dataset(&output);
    let mut ids: Vec<&str> = rows.iter().map(|(id, _)| id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, ["X", "Y", "Z"]);
    let x_title = rows.iter().find(|(id, _)| id == "X").map(|(_, t)| t.as_str());
    assert_eq!(x_title, Some("new"), "X must come from the last merged map");
}

#[tokio::test]
async fn merge_order_follows_file_names_not_creation_order() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    // Written in reverse name order on purpose.
    write_map(&layout, "z_last.json", &map_of([page("a", 0, &[("X", "from-z")])]));
    write_map(&layout, "m_middle.json", &map_of([page("a", 0, &[("X", "from-m")])]));

    let merged = Aggregator::new(&layout).load_merged().await.unwrap();
    let winner = merged.map.get(&CheckpointKey::new("a", 0)).unwrap();
    assert_eq!(winner[0].title.as_deref(), Some("from-z"));
}

#[tokio::test]
async fn disjoint_maps_merge_without_loss() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let north = map_of([
        page("north", 0, &[("N1", "n1")]),
        page("north", 1, &[("N2", "n2")]),
    ]);
    write_map(&layout, "q_dict_north.json", &north);
    write_map(&layout, "q_dict_south.json", &map_of([page("south", 0, &[("S1", "s1")])]));

    let merged = Aggregator::new(&layout).load_merged().await.unwrap();
    assert_eq!(merged.map.len(), 3);
    assert!(merged.superseded.is_empty());
    assert_eq!(merged.map.record_count(), 3);
}

#[tokio::test]
async fn reads_logs_and_nested_directories() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    let nested = layout.maps_dir().join("older");
    std::fs::create_dir_all(&nested).unwrap();

    let log_map = map_of([page("east", 0, &[("E1", "e1")])]);
    let log_text = crate::log::encode_map(&log_map).unwrap();
    std::fs::write(nested.join("q_log_east.jsonl"), log_text).unwrap();
    write_map(&layout, "q_dict_west.json", &map_of([page("west", 0, &[("W1", "w1")])]));
    std::fs::write(layout.maps_dir().join(".q_dict_west.json.tmp"), b"{").unwrap();
    std::fs::write(layout.maps_dir().join("notes.txt"), b"ignore me").unwrap();

    let aggregator = Aggregator::new(&layout);
    let paths = aggregator.artifact_paths().unwrap();
    assert_eq!(paths.len(), 2, "unexpected artifacts: {paths:?}");

    let merged = aggregator.load_merged().await.unwrap();
    assert_eq!(merged.map.len(), 2);
}

#[tokio::test]
async fn aggregation_twice_yields_identical_output() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write_map(&layout, "one.json", &map_of([page("a", 0, &[("X", "x"), ("Y", "y")])]));
    write_map(&layout, "two.json", &map_of([page("a", 1, &[("Y", "dup"), ("Z", "z")])]));

    let aggregator = Aggregator::new(&layout);
    let first = dir.path().join("first.csv");
    let second = dir.path().join("second.csv");
    aggregator.run(&first).await.unwrap();
    aggregator.run(&second).await.unwrap();

    let first_bytes = std::fs::read(&first).unwrap();
    assert_eq!(first_bytes, std::fs::read(&second).unwrap());
    let ids: Vec<String> = read_dataset(&first).into_iter().map(|(id, _)| id).collect();
    assert_eq!(ids, ["X", "Y", "Z"]);
}

#[tokio::test]
async fn missing_maps_directory_writes_header_only_dataset() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path().join("empty-root"));
    let output = dir.path().join("out").join("final.csv");

    let summary = Aggregator::new(&layout).run(&output).await.unwrap();
    assert_eq!(summary.artifacts, 0);
    assert_eq!(summary.records_out, 0);
    assert!(read_dataset(&output).is_empty());
}

#[tokio::test]
async fn unreadable_checkpoint_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    std::fs::create_dir_all(layout.maps_dir()).unwrap();
    std::fs::write(layout.maps_dir().join("broken.json"), b"not json").unwrap();

    let err = Aggregator::new(&layout).load_merged().await.unwrap_err();
    assert!(matches!(err, StoreError::Json { .. }));
}

#[tokio::test(flavor = "current_thread")]
async fn merge_walks_directory_off_the_runtime_thread() {
    let dir = tempfile::tempdir().unwrap();
    let layout = ArtifactLayout::new(dir.path());
    write_map(&layout, "north.json", &map_of([page("north", 0, &[("A", "a")])]));
    let nested = layout.maps_dir().join("older");
    std::fs::create_dir_all(&nested).unwrap();
    std::fs::write(
        nested.join("south.json"),
        serde_json::to_vec(&map_of([page("south", 0, &[("B", "b")])])).unwrap(),
    )
    .unwrap();

    let aggregator = Aggregator::new(&layout);
    let listed = aggregator.artifact_paths().unwrap();
    let merged = aggregator.load_merged().await.unwrap();

    assert_eq!(listed.len(), 2);
    assert_eq!(merged.artifacts, listed.len());
    assert_eq!(merged.map.len(), 2);
}
