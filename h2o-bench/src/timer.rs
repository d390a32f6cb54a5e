use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use crate::error::{Error, Result};

const SEPARATOR: char = '.';

/// One recorded span
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Dotted scope path, e.g. `groupby.ops.q01`
    pub label: String,
    pub elapsed: Duration,
}

impl Measurement {
    /// Last segment of the label
    pub fn name(&self) -> &str {
        self.label.rsplit(SEPARATOR).next().unwrap_or(&self.label)
    }

    pub fn depth(&self) -> usize {
        self.label.matches(SEPARATOR).count()
    }
}

/// Ordered timing results of a run.
///
/// A scope is placed in the log when it is entered, so parents always come
/// before their children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeasurementLog {
    entries: Vec<Measurement>,
}

impl MeasurementLog {
    pub fn get(&self, label: &str) -> Option<Duration> {
        self.entries
            .iter()
            .find(|m| m.label == label)
            .map(|m| m.elapsed)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Measurement> {
        self.entries.iter()
    }

    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|m| m.label.as_str()).collect()
    }

    /// Direct children of `parent`
    pub fn children<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a Measurement> + 'a {
        self.entries.iter().filter(move |m| {
            m.label
                .strip_prefix(parent)
                .and_then(|rest| rest.strip_prefix(SEPARATOR))
                .map(|rest| !rest.contains(SEPARATOR))
                .unwrap_or(false)
        })
    }

    /// Sum of the direct children of `parent`
    pub fn children_total(&self, parent: &str) -> Duration {
        self.children(parent).map(|m| m.elapsed).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a MeasurementLog {
    type Item = &'a Measurement;
    type IntoIter = std::slice::Iter<'a, Measurement>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Serialized as an ordered `label -> seconds` map
impl Serialize for MeasurementLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for m in &self.entries {
            map.serialize_entry(&m.label, &m.elapsed.as_secs_f64())?;
        }
        map.end()
    }
}

impl fmt::Display for MeasurementLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|m| m.depth() * 2 + m.name().len())
            .max()
            .unwrap_or(0);

        for m in &self.entries {
            let indented = format!("{:indent$}{}", "", m.name(), indent = m.depth() * 2);
            writeln!(f, "{:<width$}  {:>12.6}s", indented, m.elapsed.as_secs_f64(), width = width)?;
        }
        Ok(())
    }
}

struct OpenScope {
    index: usize,
    start: Instant,
}

/// Nested wall-clock timer producing a [`MeasurementLog`]
#[derive(Default)]
pub struct Timer {
    log: MeasurementLog,
    open: Vec<OpenScope>,
}

impl Timer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a scope nested in the current one
    pub fn enter(&mut self, name: &str) {
        let label = match self.open.last() {
            Some(parent) => format!("{}{}{}", self.log.entries[parent.index].label, SEPARATOR, name),
            None => name.to_string(),
        };

        let index = self.log.entries.len();
        self.log.entries.push(Measurement {
            label,
            elapsed: Duration::ZERO,
        });
        self.open.push(OpenScope {
            index,
            start: Instant::now(),
        });
    }

    /// Close the innermost scope and return its elapsed time
    pub fn exit(&mut self) -> Result<Duration> {
        let scope = self
            .open
            .pop()
            .ok_or_else(|| Error::Internal("timer exit without an open scope".to_string()))?;
        let elapsed = scope.start.elapsed();
        self.log.entries[scope.index].elapsed = elapsed;
        Ok(elapsed)
    }

    pub fn finish(self) -> Result<MeasurementLog> {
        if let Some(scope) = self.open.last() {
            return Err(Error::Internal(format!(
                "timer finished with scope '{}' still open",
                self.log.entries[scope.index].label
            )));
        }
        Ok(self.log)
    }
}
