use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::size::SizeTag;

/// Divisors applied to the driver row count to get the small, medium and big
/// join counterpart tables.
const JOIN_DIVISORS: [f64; 3] = [1e6, 1e3, 1.0];

/// Row-count token used for the group-by file at every size tier
const GROUPBY_TOKEN: &str = "1e2";

const PLACEHOLDER: &str = "NA";

/// File locations of one benchmark dataset tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetPaths {
    pub groupby: PathBuf,
    pub join_df: PathBuf,
    pub join_small: PathBuf,
    pub join_medium: PathBuf,
    pub join_big: PathBuf,
}

impl DatasetPaths {
    pub const KEYS: [&'static str; 5] = ["groupby", "join_df", "join_small", "join_medium", "join_big"];

    /// Look a path up by its canonical key
    pub fn get(&self, key: &str) -> Option<&Path> {
        match key {
            "groupby" => Some(&self.groupby),
            "join_df" => Some(&self.join_df),
            "join_small" => Some(&self.join_small),
            "join_medium" => Some(&self.join_medium),
            "join_big" => Some(&self.join_big),
            _ => None,
        }
    }

    /// Iterate `(key, path)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Path)> + '_ {
        Self::KEYS
            .into_iter()
            .filter_map(move |key| self.get(key).map(|path| (key, path)))
    }

    /// Paths that do not exist on disk.
    ///
    /// Resolution never checks the filesystem; this is for callers that want
    /// to report a missing dataset before a load fails.
    pub fn missing(&self) -> Vec<&Path> {
        self.iter()
            .map(|(_, path)| path)
            .filter(|path| !path.exists())
            .collect()
    }
}

/// Resolve the five dataset files for `size` under `data_root`.
///
/// No existence check is performed; a wrong root surfaces as a load error.
pub fn resolve<P: AsRef<Path>>(data_root: P, size: SizeTag) -> Result<DatasetPaths> {
    let data_root = data_root.as_ref();
    let base_name = size.base_name();

    let counterparts = join_counterpart_names(base_name)?;
    let [small, medium, big] = counterparts;

    Ok(DatasetPaths {
        groupby: data_root.join(format!("G{}.csv", base_name.replace(PLACEHOLDER, GROUPBY_TOKEN))),
        join_df: data_root.join(format!("J{}.csv", base_name)),
        join_small: data_root.join(format!("J{}.csv", small)),
        join_medium: data_root.join(format!("J{}.csv", medium)),
        join_big: data_root.join(format!("J{}.csv", big)),
    })
}

/// Same as [`resolve`] but parses the size tag first
pub fn resolve_str<P: AsRef<Path>>(data_root: P, size: &str) -> Result<DatasetPaths> {
    resolve(data_root, size.parse()?)
}

/// Driver row count encoded as the second token of a base name (`1_1e7_NA_0_0`)
pub fn driver_row_count(base_name: &str) -> Result<f64> {
    let token = base_name
        .split('_')
        .nth(1)
        .ok_or_else(|| Error::Parse(format!("no row count token in '{}'", base_name)))?;

    token
        .parse::<f64>()
        .map_err(|e| Error::Parse(format!("row count '{}' in '{}': {}", token, base_name, e)))
}

fn join_counterpart_names(base_name: &str) -> Result<[String; 3]> {
    let driver = driver_row_count(base_name)?;

    let mut names: [String; 3] = Default::default();
    for (name, divisor) in names.iter_mut().zip(JOIN_DIVISORS) {
        let token = scientific_token(driver / divisor)?;
        *name = base_name.replace(PLACEHOLDER, &token);
    }
    Ok(names)
}

/// Format a row count the way the data generator names its files.
///
/// The generator printed `"{:.0e}"` in Python (`1e+07`) and then removed every
/// `+0`, so single-digit exponents collapse to `1e7` and `1e0`, while
/// two-digit exponents keep their sign (`1e+10`).
pub fn scientific_token(count: f64) -> Result<String> {
    let rendered = format!("{:.0e}", count);
    let (mantissa, exponent) = rendered
        .split_once('e')
        .ok_or_else(|| Error::Parse(format!("no exponent in '{}'", rendered)))?;
    let exponent: i32 = exponent
        .parse()
        .map_err(|e| Error::Parse(format!("exponent in '{}': {}", rendered, e)))?;

    let sign = if exponent < 0 { '-' } else { '+' };
    let python = format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    Ok(python.replace("+0", ""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scientific_token() {
        assert_eq!(scientific_token(1e7).unwrap(), "1e7");
        assert_eq!(scientific_token(10.0).unwrap(), "1e1");
        assert_eq!(scientific_token(1.0).unwrap(), "1e0");
        assert_eq!(scientific_token(1e10).unwrap(), "1e+10");
        assert_eq!(scientific_token(0.1).unwrap(), "1e-01");
    }

    #[test]
    fn test_driver_row_count() {
        assert_eq!(driver_row_count("1_1e7_NA_0_0").unwrap(), 1e7);
        assert_eq!(driver_row_count("1_1e9_NA_0_0").unwrap(), 1e9);
        assert!(matches!(driver_row_count("nounderscore"), Err(Error::Parse(_))));
        assert!(matches!(driver_row_count("1_abc_NA"), Err(Error::Parse(_))));
    }

    #[test]
    fn test_resolve_small() {
        let paths = resolve("/data", SizeTag::Small).unwrap();

        assert_eq!(paths.groupby, PathBuf::from("/data/G1_1e7_1e2_0_0.csv"));
        assert_eq!(paths.join_df, PathBuf::from("/data/J1_1e7_NA_0_0.csv"));
        assert_eq!(paths.join_small, PathBuf::from("/data/J1_1e7_1e1_0_0.csv"));
        assert_eq!(paths.join_medium, PathBuf::from("/data/J1_1e7_1e4_0_0.csv"));
        assert_eq!(paths.join_big, PathBuf::from("/data/J1_1e7_1e7_0_0.csv"));
    }

    #[test]
    fn test_get_by_key() {
        let paths = resolve("/data", SizeTag::Medium).unwrap();

        assert_eq!(paths.get("join_small"), Some(Path::new("/data/J1_1e8_1e2_0_0.csv")));
        assert_eq!(paths.get("groupby"), Some(Path::new("/data/G1_1e8_1e2_0_0.csv")));
        assert_eq!(paths.get("join_huge"), None);
    }

    #[test]
    fn test_resolve_str_rejects_unknown_size() {
        let err = resolve_str("/data", "xl").unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[test]
    fn test_missing_reports_every_file_under_fake_root() {
        let paths = resolve("/definitely/not/here", SizeTag::Small).unwrap();
        assert_eq!(paths.missing().len(), 5);
    }
}
