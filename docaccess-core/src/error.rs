//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`].
//! Errors are surfaced to the caller as reported by the underlying store; nothing
//! in this layer retries or recovers locally.

use bson::error::Error as BsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Connection parameters are malformed (empty address, missing credentials, bad URI).
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// The client could not be created or the handshake/authentication failed.
    #[error("Connection error: {0}")]
    Connection(String),
    /// A find-one query matched no document.
    /// The first argument is the collection namespace, the second the filter.
    #[error("No document in {0} matches {1}")]
    NotFound(String, String),
    /// A stored document could not be decoded into the requested type.
    #[error("Decode error at position {position}: {message}")]
    Decode {
        /// Zero-based position of the offending document in the result sequence.
        position: usize,
        /// The decoder's description of the mismatch.
        message: String,
    },
    /// The result sequence failed independently of any single document's decode.
    #[error("Sequence error: {0}")]
    Sequence(String),
    /// The store reported a failure for count, insert, update, delete or index operations.
    #[error("Operation error: {0}")]
    Operation(String),
    /// A caller-supplied value could not be encoded as BSON.
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// A caller-supplied value encoded to something other than a BSON document.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
}

impl DocumentStoreError {
    /// Returns `true` for errors raised while decoding stored documents.
    pub fn is_decode(&self) -> bool {
        matches!(self, DocumentStoreError::Decode { .. })
    }

    /// Returns `true` for mid-stream cursor failures.
    pub fn is_sequence(&self) -> bool {
        matches!(self, DocumentStoreError::Sequence(_))
    }

    /// Returns `true` when a find-one query matched nothing.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DocumentStoreError::NotFound(..))
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_display_includes_position() {
        let err = DocumentStoreError::Decode {
            position: 3,
            message: "missing field `name`".to_string(),
        };

        assert!(err.is_decode());
        assert_eq!(err.to_string(), "Decode error at position 3: missing field `name`");
    }

    #[test]
    fn test_classifiers() {
        assert!(DocumentStoreError::Sequence("reset".into()).is_sequence());
        assert!(DocumentStoreError::NotFound("db.users".into(), "{}".into()).is_not_found());
        assert!(!DocumentStoreError::Operation("E11000".into()).is_decode());
    }
}
