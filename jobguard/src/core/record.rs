//! Pipeline execution records and conflict sets.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// One pipeline execution as reported by the orchestration service.
///
/// Records are snapshots taken at poll time. Any additional fields in the
/// service response are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExecutionRecord {
    /// Execution id, stable for the lifetime of the execution.
    pub id: u64,
    /// Branch or tag name.
    #[serde(rename = "ref")]
    pub git_ref: String,
    /// Service-defined status (running, pending, success, ...).
    pub status: String,
    /// Commit identifier.
    pub sha: String,
}

impl ExecutionRecord {
    /// Creates a new execution record.
    #[must_use]
    pub fn new(
        id: u64,
        git_ref: impl Into<String>,
        status: impl Into<String>,
        sha: impl Into<String>,
    ) -> Self {
        Self {
            id,
            git_ref: git_ref.into(),
            status: status.into(),
            sha: sha.into(),
        }
    }
}

impl fmt::Display for ExecutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pipeline #{} {:<10} {} {}", self.id, self.status, self.sha, self.git_ref)
    }
}

/// The records that matched the conflict predicate in one poll, in the
/// order the service returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSet {
    records: Vec<ExecutionRecord>,
}

impl ConflictSet {
    /// Creates a conflict set from matched records.
    #[must_use]
    pub fn new(records: Vec<ExecutionRecord>) -> Self {
        Self { records }
    }

    /// Returns the number of conflicting executions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing conflicts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the conflicting records.
    #[must_use]
    pub fn records(&self) -> &[ExecutionRecord] {
        &self.records
    }

    /// Iterates over the conflicting records.
    pub fn iter(&self) -> std::slice::Iter<'_, ExecutionRecord> {
        self.records.iter()
    }

    /// Returns the ids of the conflicting executions.
    #[must_use]
    pub fn ids(&self) -> Vec<u64> {
        self.records.iter().map(|r| r.id).collect()
    }

    /// Returns true if both sets hold the same records, ignoring order.
    ///
    /// A status or sha change on an otherwise unchanged execution counts as
    /// a difference.
    #[must_use]
    pub fn same_members(&self, other: &Self) -> bool {
        if self.records.len() != other.records.len() {
            return false;
        }
        let ours: BTreeSet<&ExecutionRecord> = self.records.iter().collect();
        let theirs: BTreeSet<&ExecutionRecord> = other.records.iter().collect();
        ours == theirs
    }
}

impl FromIterator<ExecutionRecord> for ConflictSet {
    fn from_iter<I: IntoIterator<Item = ExecutionRecord>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a ConflictSet {
    type Item = &'a ExecutionRecord;
    type IntoIter = std::slice::Iter<'a, ExecutionRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
