//! Job identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Prefix shared by every generated job id.
const JOB_ID_PREFIX: &str = "job_";

/// Maximum accepted length of a job id, prefix included.
const MAX_JOB_ID_LEN: usize = 64;

/// Unique identifier for a job.
///
/// The id doubles as the name of the job's working directory, so anything
/// coming from a client must pass [`JobId::is_valid`] before it is joined
/// onto a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(format!("{}{}", JOB_ID_PREFIX, Uuid::new_v4().simple()))
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Parse a caller-supplied id, rejecting anything that is not a safe
    /// directory name.
    pub fn parse(s: &str) -> Option<Self> {
        Self::is_valid(s).then(|| Self(s.to_string()))
    }

    /// Check the id format: `job_` followed by alphanumerics, `-` or `_`.
    pub fn is_valid(s: &str) -> bool {
        let Some(rest) = s.strip_prefix(JOB_ID_PREFIX) else {
            return false;
        };
        !rest.is_empty()
            && s.len() <= MAX_JOB_ID_LEN
            && rest
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for JobId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_valid_and_unique() {
        let a = JobId::new();
        let b = JobId::new();
        assert!(JobId::is_valid(a.as_str()));
        assert!(a.as_str().starts_with("job_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_id_validation() {
        assert!(JobId::is_valid("job_123"));
        assert!(JobId::is_valid("job_abc-DEF_42"));
        assert!(!JobId::is_valid("job_"));
        assert!(!JobId::is_valid("123"));
        assert!(!JobId::is_valid("job_../etc"));
        assert!(!JobId::is_valid("job_a/b"));
        assert!(!JobId::is_valid(&format!("job_{}", "a".repeat(61))));
    }

    #[test]
    fn test_parse() {
        assert_eq!(JobId::parse("job_123"), Some(JobId::from_string("job_123")));
        assert_eq!(JobId::parse("../job_123"), None);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = JobId::from_string("job_123");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"job_123\"");
    }
}
