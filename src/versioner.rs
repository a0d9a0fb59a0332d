//! Migration version tokens
//!
//! A token is a UTC timestamp captured once per run followed by a
//! zero-padded sequence number taken from the entity's position in the
//! resolved order. Ordering comes from the sequence suffix; the timestamp is
//! informational and is shared by every migration of a run.

use chrono::{DateTime, Utc};

/// Timestamp layout of the version prefix
const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Minimum width of the sequence suffix
const MIN_SEQUENCE_WIDTH: usize = 2;

/// Assigns migration versions for one generation run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationVersioner {
    timestamp: String,
    width: usize,
}

impl MigrationVersioner {
    /// Create a versioner for `count` migrations generated at `generated_at`
    pub fn new(generated_at: DateTime<Utc>, count: usize) -> Self {
        let width = count.to_string().len().max(MIN_SEQUENCE_WIDTH);
        Self {
            timestamp: generated_at.format(TIMESTAMP_FORMAT).to_string(),
            width,
        }
    }

    /// Version token for the migration at zero-based `position`
    pub fn version(&self, position: usize) -> String {
        format!(
            "{}{:0width$}",
            self.timestamp,
            position + 1,
            width = self.width
        )
    }

    /// Version tokens for `count` migrations in order
    pub fn versions(&self, count: usize) -> Vec<String> {
        (0..count).map(|position| self.version(position)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap()
    }

    #[test]
    fn test_version_shape() {
        let versioner = MigrationVersioner::new(at(), 2);
        assert_eq!(versioner.version(0), "2024030914050701");
        assert_eq!(versioner.version(1), "2024030914050702");
    }

    #[test]
    fn test_versions_sort_in_order() {
        let versioner = MigrationVersioner::new(at(), 120);
        let versions = versioner.versions(120);
        assert_eq!(versions[0], "20240309140507001");
        assert_eq!(versions[119], "20240309140507120");

        let mut sorted = versions.clone();
        sorted.sort();
        assert_eq!(sorted, versions);
    }

    #[test]
    fn test_same_clock_is_reproducible() {
        let a = MigrationVersioner::new(at(), 3).versions(3);
        let b = MigrationVersioner::new(at(), 3).versions(3);
        assert_eq!(a, b);
    }
}
