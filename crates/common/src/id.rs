//! ID generation utilities.

use std::time::SystemTime;

use chrono::{DateTime, Utc};
use ulid::Ulid;

/// ID generator for entities.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort lexicographically by creation time, so entry IDs follow
    /// the order entries were written.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a ULID whose time component is `at`.
    ///
    /// Used for back-dated mood entries so ID order still matches
    /// timestamp order.
    #[must_use]
    pub fn generate_at(&self, at: DateTime<Utc>) -> String {
        Ulid::from_datetime(SystemTime::from(at))
            .to_string()
            .to_lowercase()
    }
}
