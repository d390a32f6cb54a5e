use regex::Regex;
use std::fmt;

use crate::backend::{NamedQuery, QueryCatalog, Workload};
use crate::error::Result;

/// Which queries a run executes
#[derive(Debug, Clone)]
pub enum TaskSelector {
    All,
    Groupby,
    Join,
    /// Full-match regex over query names, see [`TaskSelector::matches`]
    Pattern(Regex),
}

impl TaskSelector {
    /// `all`, `groupby` and `join` are keywords; anything else is a regex
    pub fn parse(task: &str) -> Result<Self> {
        match task {
            "all" => Ok(TaskSelector::All),
            "groupby" => Ok(TaskSelector::Groupby),
            "join" => Ok(TaskSelector::Join),
            pattern => Ok(TaskSelector::Pattern(Regex::new(&format!("^(?:{})$", pattern))?)),
        }
    }

    /// Whether query `name` of `workload` is selected.
    ///
    /// A pattern is tried against the plain name (`q01`) and against the
    /// workload-qualified name where the first character is replaced by the
    /// workload discriminator (`g01`, `j01`).
    pub fn matches(&self, workload: Workload, name: &str) -> bool {
        match self {
            TaskSelector::All => true,
            TaskSelector::Groupby => workload == Workload::Groupby,
            TaskSelector::Join => workload == Workload::Join,
            TaskSelector::Pattern(regex) => {
                regex.is_match(name) || regex.is_match(&qualified_name(workload, name))
            }
        }
    }

    /// Filtered view over a catalogue; the catalogue itself is untouched
    pub fn filter<'a, Q>(&self, workload: Workload, catalog: &'a QueryCatalog<Q>) -> QueryView<'a, Q> {
        QueryView {
            workload,
            queries: catalog
                .iter()
                .filter(|q| self.matches(workload, q.name))
                .collect(),
        }
    }
}

impl fmt::Display for TaskSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskSelector::All => f.write_str("all"),
            TaskSelector::Groupby => f.write_str("groupby"),
            TaskSelector::Join => f.write_str("join"),
            TaskSelector::Pattern(regex) => {
                let anchored = regex.as_str();
                let inner = anchored
                    .strip_prefix("^(?:")
                    .and_then(|s| s.strip_suffix(")$"))
                    .unwrap_or(anchored);
                f.write_str(inner)
            }
        }
    }
}

/// Replace the leading character of `name` with the workload discriminator
pub fn qualified_name(workload: Workload, name: &str) -> String {
    let mut chars = name.chars();
    chars.next();
    let mut qualified = String::with_capacity(name.len());
    qualified.push(workload.discriminator());
    qualified.push_str(chars.as_str());
    qualified
}

/// Queries of one workload that survived filtering, in catalogue order
#[derive(Debug)]
pub struct QueryView<'a, Q> {
    pub workload: Workload,
    queries: Vec<&'a NamedQuery<Q>>,
}

impl<'a, Q> QueryView<'a, Q> {
    pub fn names(&self) -> Vec<&'static str> {
        self.queries.iter().map(|q| q.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a NamedQuery<Q>> + '_ {
        self.queries.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}
