//! Pipeline record fixtures.

use crate::core::ExecutionRecord;

const FIXTURE_SHA: &str = "0000000000000000000000000000000000000000";

/// Builds a record with a placeholder commit.
#[must_use]
pub fn record(id: u64, git_ref: &str, status: &str) -> ExecutionRecord {
    ExecutionRecord::new(id, git_ref, status, FIXTURE_SHA)
}

/// Builds a record with an explicit commit.
#[must_use]
pub fn record_with_sha(id: u64, git_ref: &str, status: &str, sha: &str) -> ExecutionRecord {
    ExecutionRecord::new(id, git_ref, status, sha)
}

/// A running merge-request pipeline (id 1) next to a finished `main` one.
#[must_use]
pub fn scenario_records() -> Vec<ExecutionRecord> {
    vec![record(1, "42-fix", "running"), record(2, "main", "success")]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_records() {
        let records = scenario_records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].git_ref, "42-fix");
        assert_eq!(records[1].sha, FIXTURE_SHA);
    }
}
