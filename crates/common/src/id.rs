//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for content items, courses and users.
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
    /// ULIDs sort lexicographically by creation time, which keeps freshly
    /// created records clustered in the primary key index.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session identifier.
    #[must_use]
    pub fn generate_session_id(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}
