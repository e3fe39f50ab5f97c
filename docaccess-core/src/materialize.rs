//! Decoding a whole result sequence into a caller-owned container.
//!
//! The materializer knows nothing about the records it decodes. The element type is
//! carried by the destination container ([`Destination::Item`]) and fixed by the caller's
//! generic instantiation, so a single call can never switch types mid-stream.
//!
//! Semantics are all-or-nothing:
//!
//! - documents are pulled strictly one at a time, in sequence order;
//! - each one is decoded into a fresh value and pushed onto a private buffer;
//! - the first decode failure aborts the call with [`DocumentStoreError::Decode`];
//! - once the sequence ends, a terminal cursor failure is reported as
//!   [`DocumentStoreError::Sequence`] even if every document decoded cleanly;
//! - only a clean end of sequence replaces the destination's contents with the buffer.
//!
//! On any error the buffer is dropped and the destination is left exactly as it was.
//!
//! # Example
//!
//! ```ignore
//! use docaccess_core::materialize::materialize;
//!
//! let mut users: Vec<User> = Vec::new();
//! let count = materialize(&mut cursor, &mut users).await?;
//! assert_eq!(count, users.len());
//! ```

use std::collections::VecDeque;

use bson::RawDocument;
use serde::de::DeserializeOwned;

use crate::{
    cursor::DocumentCursor,
    document::decode,
    error::{DocumentStoreError, DocumentStoreResult},
};

/// A caller-owned sequence container that can receive materialized documents.
pub trait Destination {
    /// The element type documents are decoded into.
    type Item;

    /// Replaces the entire contents of the container with `items`, preserving their order.
    fn replace_all(&mut self, items: Vec<Self::Item>);
}

impl<T> Destination for Vec<T> {
    type Item = T;

    fn replace_all(&mut self, items: Vec<T>) {
        *self = items;
    }
}

impl<T> Destination for VecDeque<T> {
    type Item = T;

    fn replace_all(&mut self, items: Vec<T>) {
        *self = VecDeque::from(items);
    }
}

/// Decodes every document of `cursor` into `destination` using serde.
///
/// Returns the number of elements now held by the destination.
///
/// # Errors
///
/// - [`DocumentStoreError::Decode`] if any document does not fit `D::Item`
/// - [`DocumentStoreError::Sequence`] if the cursor failed mid-stream
pub async fn materialize<C, D>(cursor: &mut C, destination: &mut D) -> DocumentStoreResult<usize>
where
    C: DocumentCursor + ?Sized,
    D: Destination + ?Sized,
    D::Item: DeserializeOwned,
{
    materialize_with(cursor, destination, |raw, position| decode(raw, position)).await
}

/// Decodes every document of `cursor` into `destination` with an explicit decoder.
///
/// `decode` receives each raw document together with its zero-based position in the
/// sequence. An error it returns aborts the call and is surfaced unchanged.
pub async fn materialize_with<C, D, F>(
    cursor: &mut C,
    destination: &mut D,
    mut decode: F,
) -> DocumentStoreResult<usize>
where
    C: DocumentCursor + ?Sized,
    D: Destination + ?Sized,
    F: FnMut(&RawDocument, usize) -> DocumentStoreResult<D::Item>,
{
    let mut buffer = Vec::new();

    while cursor.advance().await {
        let raw = cursor.current().ok_or_else(|| {
            DocumentStoreError::Sequence("cursor advanced without a current document".into())
        })?;

        match decode(raw, buffer.len()) {
            Ok(item) => buffer.push(item),
            Err(err) => {
                tracing::debug!(position = buffer.len(), error = %err, "materialize aborted");
                return Err(err);
            }
        }
    }

    if let Some(err) = cursor.take_error() {
        tracing::debug!(decoded = buffer.len(), error = %err, "result sequence failed");
        return Err(err);
    }

    let count = buffer.len();
    destination.replace_all(buffer);

    Ok(count)
}
