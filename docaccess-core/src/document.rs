//! Conversion between caller types and stored BSON documents.
//!
//! The store layer never knows the shape of the records it moves. Callers hand in any
//! `Serialize` value and read back any `DeserializeOwned` value; this module is the
//! single place where those values meet BSON.

use bson::{
    Bson, Document, RawDocument, RawDocumentBuf, de::deserialize_from_slice, doc,
    ser::serialize_to_bson,
};
use serde::{Serialize, de::DeserializeOwned};

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// The field that uniquely identifies a document within its collection.
pub const ID_FIELD: &str = "_id";

/// Encodes a caller value into a BSON document.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Serialization`] if the value cannot be serialized and
/// [`DocumentStoreError::InvalidDocument`] if it serializes to a non-document BSON value
/// (a bare string or number, for instance).
pub fn encode<T>(value: &T) -> DocumentStoreResult<Document>
where
    T: Serialize + ?Sized,
{
    match serialize_to_bson(value)? {
        Bson::Document(document) => Ok(document),
        other => Err(DocumentStoreError::InvalidDocument(format!(
            "expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

/// Decodes a raw stored document into a caller type.
///
/// `position` is reported back in the error so a failed multi-document decode can be
/// traced to the offending element.
///
/// # Errors
///
/// Returns [`DocumentStoreError::Decode`] on any type mismatch or missing required field.
pub fn decode<T>(raw: &RawDocument, position: usize) -> DocumentStoreResult<T>
where
    T: DeserializeOwned,
{
    deserialize_from_slice(raw.as_bytes()).map_err(|e| DocumentStoreError::Decode {
        position,
        message: e.to_string(),
    })
}

/// Re-encodes a parsed document into its raw byte form, as a cursor would yield it.
pub fn to_raw(document: &Document) -> DocumentStoreResult<RawDocumentBuf> {
    Ok(RawDocumentBuf::try_from(document)?)
}

/// Builds the filter selecting a single document by its `_id`.
pub fn id_filter(id: impl Into<Bson>) -> Document {
    doc! { ID_FIELD: id.into() }
}
