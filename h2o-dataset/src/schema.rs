use serde::{Deserialize, Serialize};
use std::fmt;

/// Engine-independent column type used to type CSV ingestion.
///
/// Every backend maps these onto its own types so that group-key
/// cardinality and arithmetic behave the same across engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogicalType {
    /// Dictionary-encoded string
    Categorical,
    Int32,
    Float64,
}

impl fmt::Display for LogicalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogicalType::Categorical => f.write_str("categorical"),
            LogicalType::Int32 => f.write_str("int32"),
            LogicalType::Float64 => f.write_str("float64"),
        }
    }
}

/// Ordered `column -> type` declaration of one benchmark table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableSchema {
    pub name: &'static str,
    columns: Vec<(&'static str, LogicalType)>,
}

impl TableSchema {
    fn new(name: &'static str, columns: Vec<(&'static str, LogicalType)>) -> Self {
        Self { name, columns }
    }

    /// `id1..id3` categorical, `id4..id6, v1, v2` int32, `v3` float64
    pub fn groupby() -> Self {
        use LogicalType::*;
        Self::new(
            "groupby",
            vec![
                ("id1", Categorical),
                ("id2", Categorical),
                ("id3", Categorical),
                ("id4", Int32),
                ("id5", Int32),
                ("id6", Int32),
                ("v1", Int32),
                ("v2", Int32),
                ("v3", Float64),
            ],
        )
    }

    /// Join driver table (`x` in the H2O scripts)
    pub fn join_driver() -> Self {
        use LogicalType::*;
        Self::new(
            "join_df",
            vec![
                ("id1", Int32),
                ("id2", Int32),
                ("id3", Int32),
                ("id4", Categorical),
                ("id5", Categorical),
                ("id6", Categorical),
                ("v1", Float64),
            ],
        )
    }

    pub fn join_small() -> Self {
        use LogicalType::*;
        Self::new(
            "join_small",
            vec![("id1", Int32), ("id4", Categorical), ("v2", Float64)],
        )
    }

    pub fn join_medium() -> Self {
        use LogicalType::*;
        Self::new(
            "join_medium",
            vec![
                ("id1", Int32),
                ("id2", Int32),
                ("id4", Categorical),
                ("id5", Categorical),
                ("v2", Float64),
            ],
        )
    }

    pub fn join_big() -> Self {
        use LogicalType::*;
        Self::new(
            "join_big",
            vec![
                ("id1", Int32),
                ("id2", Int32),
                ("id3", Int32),
                ("id4", Categorical),
                ("id5", Categorical),
                ("id6", Categorical),
                ("v2", Float64),
            ],
        )
    }

    pub fn columns(&self) -> impl Iterator<Item = (&'static str, LogicalType)> + '_ {
        self.columns.iter().copied()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|(name, _)| *name).collect()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
