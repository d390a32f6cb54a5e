use h2o_dataset::{resolve, DatasetPaths, SizeTag};
use std::fs;
use std::path::Path;

const GROUPBY_CSV: &str = "\
id1,id2,id3,id4,id5,id6,v1,v2,v3
id001,id001,id0000000001,1,10,1,1,5,1.5
id001,id002,id0000000001,2,10,1,2,4,2.5
id002,id001,id0000000002,1,20,1,3,3,3.5
id002,id002,id0000000002,2,20,2,4,2,4.5
id003,id001,id0000000003,1,10,2,5,1,5.5
id003,id002,id0000000003,2,20,3,6,0,6.5
";

const JOIN_DF_CSV: &str = "\
id1,id2,id3,id4,id5,id6,v1
1,1,1,id1,id1,id1,1.0
2,2,2,id2,id2,id2,2.0
3,3,3,id3,id3,id3,3.0
4,4,4,id4,id4,id4,4.0
";

const JOIN_SMALL_CSV: &str = "\
id1,id4,v2
1,id1,10.0
2,id2,20.0
";

const JOIN_MEDIUM_CSV: &str = "\
id1,id2,id4,id5,v2
1,1,id1,id1,10.0
2,2,id2,id2,20.0
3,3,id3,id3,30.0
";

const JOIN_BIG_CSV: &str = "\
id1,id2,id3,id4,id5,id6,v2
1,1,1,id1,id1,id1,10.0
2,2,2,id2,id2,id2,20.0
5,5,5,id5,id5,id5,50.0
";

/// Result row counts per group-by query on the fixture
pub const GROUPBY_ROWS: [(&str, usize); 10] = [
    ("q01", 3),
    ("q02", 6),
    ("q03", 3),
    ("q04", 2),
    ("q05", 3),
    ("q06", 4),
    ("q07", 3),
    ("q08", 5),
    ("q09", 2),
    ("q10", 6),
];

/// Result row counts per join query on the fixture
pub const JOIN_ROWS: [(&str, usize); 5] = [
    ("q01", 2),
    ("q02", 3),
    ("q03", 4),
    ("q04", 3),
    ("q05", 2),
];

/// Write a small-size dataset under `root` and return its paths
pub fn write_fixture(root: &Path) -> DatasetPaths {
    let paths = resolve(root, SizeTag::Small).expect("Failed to resolve fixture paths");

    fs::write(&paths.groupby, GROUPBY_CSV).expect("Failed to write groupby csv");
    fs::write(&paths.join_df, JOIN_DF_CSV).expect("Failed to write join driver csv");
    fs::write(&paths.join_small, JOIN_SMALL_CSV).expect("Failed to write join small csv");
    fs::write(&paths.join_medium, JOIN_MEDIUM_CSV).expect("Failed to write join medium csv");
    fs::write(&paths.join_big, JOIN_BIG_CSV).expect("Failed to write join big csv");

    assert!(paths.missing().is_empty());
    paths
}
