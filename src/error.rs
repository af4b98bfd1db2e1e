use std::path::PathBuf;
use thiserror::Error;

/// Failures of the persistence layer itself. Missing, empty or corrupt collection files are not
/// errors; the codec reports those through `LoadOutcome`.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {}: {source}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection} was changed by another session; reload and retry")]
    StaleWrite { collection: &'static str },
}

/// Everything a record operation can reject. Validation variants are raised before any write.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("{0}")]
    Invalid(String),

    #[error("{what} '{value}' already exists")]
    Duplicate { what: &'static str, value: String },

    #[error("{what} not found: {key}")]
    NotFound { what: &'static str, key: String },

    #[error("cannot change status from {from} to {to}")]
    InvalidTransition { from: String, to: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DomainError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            what,
            key: key.into(),
        }
    }

    /// Stable code reported over IPC.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingFields(_) | Self::Invalid(_) => "validation_failed",
            Self::Duplicate { .. } => "duplicate_key",
            Self::NotFound { .. } => "not_found",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::Store(StoreError::StaleWrite { .. }) => "stale_write",
            Self::Store(StoreError::Encode { .. }) => "encode_failed",
            Self::Store(_) => "io_failed",
        }
    }
}

pub type DomainResult<T> = Result<T, DomainError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_message_lists_every_field() {
        let e = DomainError::MissingFields(vec!["name", "dob"]);
        assert_eq!(e.to_string(), "missing required fields: name, dob");
        assert_eq!(e.code(), "validation_failed");
    }

    #[test]
    fn stale_write_keeps_its_own_code() {
        let e = DomainError::from(StoreError::StaleWrite {
            collection: "students",
        });
        assert_eq!(e.code(), "stale_write");
        assert!(e.to_string().contains("students"));
    }
}
