use uuid::Uuid;

/// Failures shared by every store backend. `VersionConflict` is how a lost
/// compare-and-swap race surfaces; callers translate it into a seat-level
/// availability error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("version conflict on seat {seat_id}")]
    VersionConflict { seat_id: Uuid },

    #[error("duplicate key: {0}")]
    Duplicate(String),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),
}
