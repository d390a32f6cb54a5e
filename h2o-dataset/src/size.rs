use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Dataset scale selector.
///
/// Each tag maps to one canonical base name produced by the H2O data
/// generator. The second `_`-separated token of the base name is the row
/// count of the group-by table and of the join driver table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeTag {
    Small,
    Medium,
    #[serde(alias = "big")]
    Large,
}

impl SizeTag {
    pub const ALL: [SizeTag; 3] = [SizeTag::Small, SizeTag::Medium, SizeTag::Large];

    /// Base file name with the `NA` placeholder for the counterpart row count
    pub fn base_name(&self) -> &'static str {
        match self {
            SizeTag::Small => "1_1e7_NA_0_0",
            SizeTag::Medium => "1_1e8_NA_0_0",
            SizeTag::Large => "1_1e9_NA_0_0",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SizeTag::Small => "small",
            SizeTag::Medium => "medium",
            SizeTag::Large => "large",
        }
    }
}

impl FromStr for SizeTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "small" => Ok(SizeTag::Small),
            "medium" => Ok(SizeTag::Medium),
            // Older releases of the suite called the 1e9 tier "big"
            "large" | "big" => Ok(SizeTag::Large),
            _ => Err(Error::InvalidArgument(format!(
                "unknown size tag '{}' (expected small, medium or large)",
                s
            ))),
        }
    }
}

impl fmt::Display for SizeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
