use thiserror::Error;

/// Errors that can arise while generating dungeons, resolving actions or touching the store.
///
/// Soft rejections (walking into a wall, a locked door without its key) and the
/// game-over condition are not errors; they are reported through the action outcomes.
#[derive(Debug, Error)]
pub enum DungeonError {
    /// Wrapper around sled's error type.
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),

    /// Wrapper around bincode serialization and deserialization errors.
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// Wrapper around IO errors (directory creation, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when fetching a dungeon or game record that is not present.
    #[error("record not found: {0}")]
    NotFound(String),

    /// Unknown hero class/gender, unknown difficulty, combat action outside combat, ...
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Returned when deserializing a record with an unexpected schema version.
    #[error("schema mismatch for {entity}: expected {expected}, got {found}")]
    SchemaMismatch {
        entity: &'static str,
        expected: u8,
        found: u8,
    },

    /// The layout generator could not place a single room.
    #[error("generation failed: {0}")]
    Generation(String),

    /// Internal error (poisoned locks, unexpected conditions)
    #[error("internal error: {0}")]
    Internal(String),
}

impl DungeonError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        DungeonError::InvalidRequest(reason.into())
    }

    /// True for the caller-facing failures of the not-found class.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DungeonError::NotFound(_))
    }
}
