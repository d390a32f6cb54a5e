//! The contract every execution engine implements to be benchmarked.
//!
//! A backend loads the benchmark tables, forces any deferred work, and
//! exposes two ordered catalogues of named queries. The harness only ever
//! talks to engines through this trait, so adding an engine means one
//! `Backend` impl plus one registry entry.

use async_trait::async_trait;
use h2o_dataset::DatasetPaths;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Query name such as `q01`
pub type QueryName = &'static str;

/// A group-by query takes the loaded group-by table
pub type GroupbyQuery<B> = fn(&<B as Backend>::Frame) -> Result<<B as Backend>::Output>;

/// A join query takes the whole join mapping
pub type JoinQuery<B> = fn(&JoinTables<<B as Backend>::Frame>) -> Result<<B as Backend>::Output>;

/// The two benchmark workloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Workload {
    Groupby,
    Join,
}

impl Workload {
    pub const ALL: [Workload; 2] = [Workload::Groupby, Workload::Join];

    /// Scope label used in the measurement log
    pub fn label(&self) -> &'static str {
        match self {
            Workload::Groupby => "groupby",
            Workload::Join => "join",
        }
    }

    /// Character that replaces the leading `q` of a query name when the
    /// task regex needs to tell the workloads apart
    pub fn discriminator(&self) -> char {
        match self {
            Workload::Groupby => 'g',
            Workload::Join => 'j',
        }
    }
}

impl fmt::Display for Workload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Options passed to a backend at construction.
///
/// Each backend instance keeps its own copy; nothing here touches process
/// wide engine state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendOptions {
    /// Switch the engine to its experimental group-by strategy, if it has one
    #[serde(default)]
    pub experimental_groupby: bool,
}

/// Join inputs: the driver table and its three counterparts
#[derive(Debug, Clone)]
pub struct JoinTables<F> {
    pub df: F,
    pub small: F,
    pub medium: F,
    pub big: F,
}

/// One named query
#[derive(Clone)]
pub struct NamedQuery<Q> {
    pub name: QueryName,
    pub query: Q,
}

impl<Q> fmt::Debug for NamedQuery<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedQuery").field("name", &self.name).finish()
    }
}

/// Ordered, immutable mapping from query name to query.
///
/// Insertion order is execution and reporting order.
#[derive(Clone)]
pub struct QueryCatalog<Q> {
    queries: Vec<NamedQuery<Q>>,
}

impl<Q> fmt::Debug for QueryCatalog<Q> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl<Q> QueryCatalog<Q> {
    /// Build a catalogue, rejecting duplicate names
    pub fn new(entries: impl IntoIterator<Item = (QueryName, Q)>) -> Result<Self> {
        let mut queries: Vec<NamedQuery<Q>> = Vec::new();
        for (name, query) in entries {
            if queries.iter().any(|q| q.name == name) {
                return Err(Error::Config(format!("duplicate query name '{}'", name)));
            }
            queries.push(NamedQuery { name, query });
        }
        Ok(Self { queries })
    }

    pub fn get(&self, name: &str) -> Option<&Q> {
        self.queries
            .iter()
            .find(|q| q.name == name)
            .map(|q| &q.query)
    }

    pub fn names(&self) -> Vec<QueryName> {
        self.queries.iter().map(|q| q.name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NamedQuery<Q>> {
        self.queries.iter()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }
}

impl<'a, Q> IntoIterator for &'a QueryCatalog<Q> {
    type Item = &'a NamedQuery<Q>;
    type IntoIter = std::slice::Iter<'a, NamedQuery<Q>>;

    fn into_iter(self) -> Self::IntoIter {
        self.queries.iter()
    }
}

/// Capability set of an execution engine
#[async_trait]
pub trait Backend: Send + Sync + Sized + 'static {
    /// A loaded table
    type Frame: Send + Sync;
    /// What a query call returns; may still be unevaluated
    type Output: Send;
    /// A fully computed query result
    type Materialized: Send;

    fn name(&self) -> &'static str;

    async fn load_groupby_data(&self, paths: &DatasetPaths) -> Result<Self::Frame>;

    async fn load_join_data(&self, paths: &DatasetPaths) -> Result<JoinTables<Self::Frame>>;

    /// Force a freshly loaded table into memory
    async fn trigger_loading(&self, frame: Self::Frame) -> Result<Self::Frame>;

    /// Force a query result to be computed
    async fn trigger_execution(&self, output: Self::Output) -> Result<Self::Materialized>;

    fn row_count(materialized: &Self::Materialized) -> usize;

    fn groupby_queries(&self) -> &QueryCatalog<GroupbyQuery<Self>>;

    fn join_queries(&self) -> &QueryCatalog<JoinQuery<Self>>;
}
