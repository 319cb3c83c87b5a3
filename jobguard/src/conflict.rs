//! Conflict detection over pipeline execution records.
//!
//! A record conflicts when all of the following hold:
//! - the ref pattern matches somewhere within its ref (unanchored search)
//! - the status pattern matches at the start of its status (prefix-anchored)
//! - its id is not the guarding execution's own id
//!
//! The two patterns are deliberately anchored differently; changing either
//! changes which pipelines block the guard.

use regex::Regex;

use crate::core::{ConflictSet, ExecutionRecord};
use crate::errors::ConfigError;

/// Compiled conflict predicate.
#[derive(Debug, Clone)]
pub struct ConflictMatcher {
    ref_pattern: Regex,
    status_source: String,
    status_anchored: Regex,
    self_execution_id: u64,
}

impl ConflictMatcher {
    /// Compiles both patterns.
    ///
    /// Returns a [`ConfigError`] naming the offending pattern if either one
    /// is not a valid regular expression.
    pub fn new(
        ref_pattern: &str,
        status_pattern: &str,
        self_execution_id: u64,
    ) -> Result<Self, ConfigError> {
        let ref_regex = Regex::new(ref_pattern).map_err(|source| ConfigError::InvalidRefPattern {
            pattern: ref_pattern.to_string(),
            source,
        })?;

        // Validate the pattern on its own first so the error points at what
        // the user wrote, not at the anchored wrapper.
        let status_error = |source: regex::Error| ConfigError::InvalidStatusPattern {
            pattern: status_pattern.to_string(),
            source,
        };
        Regex::new(status_pattern).map_err(status_error)?;
        let status_anchored = Regex::new(&format!(r"\A(?:{status_pattern})")).map_err(status_error)?;

        Ok(Self {
            ref_pattern: ref_regex,
            status_source: status_pattern.to_string(),
            status_anchored,
            self_execution_id,
        })
    }

    /// Returns the ref pattern as supplied.
    #[must_use]
    pub fn ref_pattern(&self) -> &str {
        self.ref_pattern.as_str()
    }

    /// Returns the status pattern as supplied.
    #[must_use]
    pub fn status_pattern(&self) -> &str {
        &self.status_source
    }

    /// Returns the id excluded from matching.
    #[must_use]
    pub fn self_execution_id(&self) -> u64 {
        self.self_execution_id
    }

    /// Returns true if the record conflicts with the guarding execution.
    #[must_use]
    pub fn is_conflict(&self, record: &ExecutionRecord) -> bool {
        record.id != self.self_execution_id
            && self.ref_pattern.is_match(&record.git_ref)
            && self.status_anchored.is_match(&record.status)
    }

    /// Filters records down to the conflicting ones, preserving input order.
    #[must_use]
    pub fn find_conflicts(&self, records: &[ExecutionRecord]) -> ConflictSet {
        records
            .iter()
            .filter(|record| self.is_conflict(record))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_REF_PATTERN, DEFAULT_STATUS_PATTERN};
    use pretty_assertions::assert_eq;

    fn default_matcher(self_id: u64) -> ConflictMatcher {
        ConflictMatcher::new(DEFAULT_REF_PATTERN, DEFAULT_STATUS_PATTERN, self_id).unwrap()
    }

    fn sample_records() -> Vec<ExecutionRecord> {
        vec![
            ExecutionRecord::new(1, "42-fix", "running", "aaa"),
            ExecutionRecord::new(2, "main", "success", "bbb"),
        ]
    }

    #[test]
    fn test_self_is_excluded() {
        let conflicts = default_matcher(1).find_conflicts(&sample_records());
        assert!(conflicts.is_empty());
    }

    #[test]
    fn test_other_matching_execution_conflicts() {
        let conflicts = default_matcher(99).find_conflicts(&sample_records());
        assert_eq!(conflicts.ids(), vec![1]);
    }

    #[test]
    fn test_empty_list_has_no_conflicts() {
        assert!(default_matcher(1).find_conflicts(&[]).is_empty());
    }

    #[test]
    fn test_ref_pattern_is_unanchored() {
        let matcher = ConflictMatcher::new("deploy", "running", 0).unwrap();
        assert!(matcher.is_conflict(&ExecutionRecord::new(1, "feature/deploy-x", "running", "s")));
        assert!(!matcher.is_conflict(&ExecutionRecord::new(2, "feature/build", "running", "s")));
    }

    #[test]
    fn test_status_pattern_is_prefix_anchored() {
        let matcher = ConflictMatcher::new(".", "running", 0).unwrap();
        assert!(matcher.is_conflict(&ExecutionRecord::new(1, "x", "running", "s")));
        // Prefix match, not a full match.
        assert!(matcher.is_conflict(&ExecutionRecord::new(2, "x", "running_late", "s")));
        // Must start at position zero.
        assert!(!matcher.is_conflict(&ExecutionRecord::new(3, "x", "not_running", "s")));
    }

    #[test]
    fn test_status_alternation_is_anchored_as_a_whole() {
        let matcher = ConflictMatcher::new(".", "running|pending", 0).unwrap();
        assert!(matcher.is_conflict(&ExecutionRecord::new(1, "x", "pending", "s")));
        assert!(!matcher.is_conflict(&ExecutionRecord::new(2, "x", "was_pending", "s")));
    }

    #[test]
    fn test_matching_is_case_sensitive() {
        let matcher = default_matcher(0);
        assert!(!matcher.is_conflict(&ExecutionRecord::new(1, "1-x", "Running", "s")));
    }

    #[test]
    fn test_default_ref_pattern_requires_leading_digits_and_hyphen() {
        let matcher = default_matcher(0);
        assert!(matcher.is_conflict(&ExecutionRecord::new(1, "123-feature", "running", "s")));
        assert!(!matcher.is_conflict(&ExecutionRecord::new(2, "feature-123", "running", "s")));
        assert!(!matcher.is_conflict(&ExecutionRecord::new(3, "123feature", "running", "s")));
    }

    #[test]
    fn test_find_conflicts_preserves_input_order() {
        let records = vec![
            ExecutionRecord::new(9, "9-a", "running", "s"),
            ExecutionRecord::new(3, "main", "running", "s"),
            ExecutionRecord::new(5, "5-b", "running", "s"),
        ];
        assert_eq!(default_matcher(0).find_conflicts(&records).ids(), vec![9, 5]);
    }

    #[test]
    fn test_matching_is_order_independent() {
        let mut records = vec![
            ExecutionRecord::new(1, "1-a", "running", "s"),
            ExecutionRecord::new(2, "main", "running", "s"),
            ExecutionRecord::new(3, "3-c", "pending", "s"),
            ExecutionRecord::new(4, "4-d", "running", "s"),
            ExecutionRecord::new(5, "5-e", "running", "s"),
        ];
        let matcher = default_matcher(5);
        let forward = matcher.find_conflicts(&records);

        records.reverse();
        let backward = matcher.find_conflicts(&records);
        assert!(forward.same_members(&backward));

        records.rotate_left(2);
        let rotated = matcher.find_conflicts(&records);
        assert!(forward.same_members(&rotated));
    }

    #[test]
    fn test_self_never_conflicts_regardless_of_fields() {
        let matcher = ConflictMatcher::new("", "", 77).unwrap();
        let records = vec![
            ExecutionRecord::new(77, "77-anything", "running", "s"),
            ExecutionRecord::new(77, "", "", ""),
        ];
        assert!(matcher.find_conflicts(&records).is_empty());
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let err = ConflictMatcher::new("(", "running", 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefPattern { ref pattern, .. } if pattern == "("));

        let err = ConflictMatcher::new(".", "[", 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStatusPattern { ref pattern, .. } if pattern == "["));
    }

    #[test]
    fn test_patterns_are_reported_as_supplied() {
        let matcher = ConflictMatcher::new(r"^\d+-", "running|pending", 0).unwrap();
        assert_eq!(matcher.ref_pattern(), r"^\d+-");
        assert_eq!(matcher.status_pattern(), "running|pending");
    }
}
