use h2o_dataset::{resolve, resolve_str, SizeTag, TableSchema};
use std::path::Path;

fn row_token(path: &Path) -> String {
    let stem = path.file_stem().unwrap().to_str().unwrap();
    stem.split('_').nth(2).unwrap().to_string()
}

#[test]
fn test_every_size_yields_five_paths_under_root() {
    let root = Path::new("/tmp/h2o");

    for size in SizeTag::ALL {
        let paths = resolve(root, size).expect("Failed to resolve paths");
        let all: Vec<_> = paths.iter().collect();

        assert_eq!(all.len(), 5);
        for (key, path) in all {
            assert!(path.starts_with(root), "{} not under root: {:?}", key, path);
            assert_eq!(path.extension().unwrap(), "csv");
        }

        // Group-by file is always the 1e2 cardinality variant
        assert_eq!(row_token(&paths.groupby), "1e2");
    }
}

#[test]
fn test_counterpart_tokens_scale_with_driver() {
    let expected = [
        (SizeTag::Small, ["1e1", "1e4", "1e7"]),
        (SizeTag::Medium, ["1e2", "1e5", "1e8"]),
        (SizeTag::Large, ["1e3", "1e6", "1e9"]),
    ];

    for (size, tokens) in expected {
        let paths = resolve("data", size).unwrap();
        assert_eq!(row_token(&paths.join_df), "NA");
        assert_eq!(row_token(&paths.join_small), tokens[0]);
        assert_eq!(row_token(&paths.join_medium), tokens[1]);
        assert_eq!(row_token(&paths.join_big), tokens[2]);
    }
}

#[test]
fn test_legacy_big_alias() {
    let big = resolve_str("data", "big").unwrap();
    let large = resolve_str("data", "large").unwrap();
    assert_eq!(big, large);
}

#[test]
fn test_relative_root_stays_relative() {
    let paths = resolve("relative/dir", SizeTag::Small).unwrap();
    assert!(paths.join_df.is_relative());
    assert_eq!(paths.join_df, Path::new("relative/dir/J1_1e7_NA_0_0.csv"));
}

#[test]
fn test_schemas_cover_csv_headers() {
    assert_eq!(
        TableSchema::groupby().column_names(),
        vec!["id1", "id2", "id3", "id4", "id5", "id6", "v1", "v2", "v3"]
    );
    assert_eq!(TableSchema::join_small().column_names(), vec!["id1", "id4", "v2"]);
    assert_eq!(TableSchema::join_medium().len(), 5);
    assert_eq!(TableSchema::join_big().len(), 7);
}
