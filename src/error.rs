//! Error types at the store and profile-setup boundaries.

use thiserror::Error;

/// A failed interaction with the realtime database.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request for '{path}' failed: {source}")]
    Transport {
        path: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("store returned status {status} for '{path}': {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },

    /// The stored value does not have the shape of the expected record.
    #[error("invalid record at '{path}': {reason}")]
    InvalidRecord { path: String, reason: String },

    #[error("invalid store path '{0}'")]
    InvalidPath(String),

    #[error("store rejected write to '{0}'")]
    Rejected(String),

    #[error("stream event larger than {limit} bytes")]
    EventTooLarge { limit: usize },
}

impl StoreError {
    pub fn invalid_record(path: &str, reason: impl ToString) -> Self {
        Self::InvalidRecord {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Why a profile-setup submission did not go through.
///
/// Both variants are recoverable: the dashboard keeps its previous state
/// and the parent can submit again.
#[derive(Debug, Error)]
pub enum SetupError {
    /// Required fields were empty. Nothing was written.
    #[error("{0}")]
    Validation(&'static str),

    /// The store refused or failed the write.
    #[error("Failed to update profile.")]
    Write(#[source] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_path() {
        let err = StoreError::invalid_record("Students/s1", "missing field");
        assert_eq!(err.to_string(), "invalid record at 'Students/s1': missing field");
    }

    #[test]
    fn test_write_error_keeps_source() {
        let err = SetupError::Write(StoreError::Rejected("Parents/p1".into()));
        assert_eq!(err.to_string(), "Failed to update profile.");
        let source = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(source.as_deref(), Some("store rejected write to 'Parents/p1'"));
    }
}
