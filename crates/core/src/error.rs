/// Domain error taxonomy.
///
/// The `Display` output of every variant is exactly the user-visible message.
/// The HTTP layer passes it through verbatim, so the strings built from
/// [`crate::messages`] are part of the external contract.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// An id (resource, tag, category, collection) is not a positive integer.
    #[error("{0}")]
    InvalidIdentifier(String),

    /// A required create-time field is absent or blank. `field` names the
    /// first missing one.
    #[error("{message}")]
    MissingRequiredField { field: &'static str, message: String },

    /// A value outside its enumerated set (`plan`, `status`).
    #[error("{0}")]
    InvalidEnumValue(String),

    /// An uploaded file exceeds the configured size limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// A referenced entity does not exist.
    #[error("{message}")]
    NotFound { entity: &'static str, message: String },

    /// The actor is neither the owner nor an admin, or lacks a required role.
    #[error("{0}")]
    Forbidden(String),

    /// A uniqueness rule would be violated (duplicate collection membership).
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    /// A curated failure message for conditions the caller cannot fix.
    #[error("{0}")]
    Internal(String),
}

impl CoreError {
    pub fn not_found(entity: &'static str, message: &str) -> Self {
        Self::NotFound {
            entity,
            message: message.to_string(),
        }
    }

    pub fn forbidden(message: &str) -> Self {
        Self::Forbidden(message.to_string())
    }
}
