use thiserror::Error;

/// Lookup misses that the boundary surfaces as a 404-equivalent.
///
/// Everything else an operation can raise flows through `anyhow` and is
/// surfaced as a generic failure. Malformed input cells are never errors;
/// they default (see [`crate::data::parse_numeric_or_default`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("no record matches id {0}")]
    IdNotFound(i64),
    #[error("no record at position {0}")]
    PositionNotFound(i64),
    #[error("no record named '{0}'")]
    NameNotFound(String),
    #[error("column '{0}' is not part of the schema")]
    UnknownColumn(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::IdNotFound(_)
                | StoreError::PositionNotFound(_)
                | StoreError::NameNotFound(_)
        )
    }
}
