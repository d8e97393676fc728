use sitewatch_rules::TransitionError;

/// Errors that can occur within the storage layer.
///
/// # Examples
///
/// ```rust
/// use sitewatch_storage::error::StorageError;
///
/// let err = StorageError::NotFound {
///     entity: "alert_rule",
///     id: "rule-99".to_string(),
/// };
/// assert!(err.to_string().contains("alert_rule"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A required record was not found in the database.
    #[error("Storage: {entity} not found (id={id})")]
    NotFound { entity: &'static str, id: String },

    /// A unique column already holds the given value.
    #[error("Storage: {entity} with the same {field} already exists")]
    Conflict {
        entity: &'static str,
        field: &'static str,
    },

    /// An alert status change that the state machine forbids.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// An underlying database error.
    #[error("Storage: database error: {0}")]
    Db(#[from] sea_orm::DbErr),

    /// JSON serialization or deserialization failure (condition_json,
    /// location_json columns).
    #[error("Storage: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A column held a string outside its enum's value set.
    #[error("Storage: invalid value in column '{column}': {value}")]
    InvalidEnum { column: &'static str, value: String },
}

impl StorageError {
    /// Map a sea-orm insert/update error, folding unique-constraint
    /// violations into [`StorageError::Conflict`].
    pub(crate) fn from_write(
        err: sea_orm::DbErr,
        entity: &'static str,
        unique_field: &'static str,
    ) -> Self {
        if err.to_string().contains("UNIQUE constraint failed") {
            StorageError::Conflict {
                entity,
                field: unique_field,
            }
        } else {
            StorageError::Db(err)
        }
    }
}

/// Convenience `Result` alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;
