use super::*;
use tempfile::TempDir;

fn meta() -> SnapshotMeta {
    SnapshotMeta {
        generation: 3,
        model: "test-embed".to_string(),
    }
}

#[test]
fn add_assigns_dense_slots() {
    let mut index = VectorIndex::new(2);
    assert!(index.is_empty());

    let first = index
        .add(vec![vec![0.0, 0.0], vec![1.0, 1.0]])
        .expect("valid vectors");
    assert_eq!(first, 0);

    let next = index.add(vec![vec![2.0, 2.0]]).expect("valid vector");
    assert_eq!(next, 2);
    assert_eq!(index.len(), 3);
    assert_eq!(index.vector(2), Some([2.0, 2.0].as_slice()));
    assert_eq!(index.vector(3), None);
}

#[test]
fn add_rejects_wrong_dimension_without_partial_append() {
    let mut index = VectorIndex::new(3);
    index.add(vec![vec![0.0; 3]]).expect("valid vector");

    let err = index
        .add(vec![vec![1.0; 3], vec![1.0; 4]])
        .expect_err("second vector is too long");

    assert!(matches!(
        err,
        DocsError::DimensionMismatch {
            expected: 3,
            actual: 4
        }
    ));
    assert_eq!(index.len(), 1);
}

#[test]
fn search_orders_by_distance() {
    let mut index = VectorIndex::new(2);
    index
        .add(vec![vec![10.0, 0.0], vec![1.0, 0.0], vec![3.0, 0.0]])
        .expect("valid vectors");

    let hits = index.search(&[0.0, 0.0], 2).expect("search succeeds");

    assert_eq!(hits, vec![(1, 1.0), (2, 9.0)]);
}

#[test]
fn search_breaks_ties_by_lower_slot() {
    let mut index = VectorIndex::new(1);
    index
        .add(vec![vec![1.0], vec![-1.0], vec![1.0]])
        .expect("valid vectors");

    let hits = index.search(&[0.0], 3).expect("search succeeds");
    let slots: Vec<usize> = hits.iter().map(|(slot, _)| *slot).collect();

    assert_eq!(slots, vec![0, 1, 2]);
}

#[test]
fn search_returns_at_most_index_size() {
    let mut index = VectorIndex::new(1);
    index.add(vec![vec![0.5]]).expect("valid vector");

    assert_eq!(index.search(&[0.0], 10).expect("search").len(), 1);
    assert!(index.search(&[0.0], 0).expect("search").is_empty());
}

#[test]
fn search_on_empty_index_is_empty() {
    let index = VectorIndex::new(4);
    assert!(index.search(&[0.0; 4], 5).expect("search").is_empty());
}

#[test]
fn search_rejects_wrong_query_dimension() {
    let index = VectorIndex::new(4);
    assert!(matches!(
        index.search(&[0.0; 2], 5),
        Err(DocsError::DimensionMismatch {
            expected: 4,
            actual: 2
        })
    ));
}

#[test]
fn save_and_load_preserve_vectors_exactly() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("vectors.json");

    let mut index = VectorIndex::new(3);
    index
        .add(vec![
            vec![0.1, -0.75, 2.5],
            vec![123.456, 0.3, -0.0],
        ])
        .expect("valid vectors");
    index.save(&path, &meta()).expect("save");

    let (loaded, loaded_meta) = VectorIndex::load(&path).expect("load");

    assert_eq!(loaded, index);
    assert_eq!(loaded_meta, meta());
    assert_eq!(
        loaded.search(&[0.1, -0.75, 2.5], 2).expect("search"),
        index.search(&[0.1, -0.75, 2.5], 2).expect("search")
    );
}

#[test]
fn load_rejects_unknown_format_version() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("vectors.json");
    std::fs::write(
        &path,
        r#"{"format_version":99,"generation":1,"model":"m","dimension":1,"vectors":[]}"#,
    )
    .expect("write");

    assert!(matches!(
        VectorIndex::load(&path),
        Err(DocsError::IndexUnavailable(_))
    ));
}

#[test]
fn load_rejects_inconsistent_vectors() {
    let temp_dir = TempDir::new().expect("temp dir");
    let path = temp_dir.path().join("vectors.json");
    std::fs::write(
        &path,
        r#"{"format_version":1,"generation":1,"model":"m","dimension":2,"vectors":[[1.0]]}"#,
    )
    .expect("write");

    assert!(matches!(
        VectorIndex::load(&path),
        Err(DocsError::DimensionMismatch { .. })
    ));
}
