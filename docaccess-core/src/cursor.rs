//! Forward-only result sequences.
//!
//! A [`DocumentCursor`] yields raw, still-encoded documents one at a time. It cannot be
//! rewound or seeked, and it may fail mid-stream for reasons unrelated to any single
//! document (a dropped connection, a killed server-side cursor). Such failures end the
//! sequence and are retrieved afterwards with [`DocumentCursor::take_error`], which keeps
//! them distinct from per-document decode failures.

use async_trait::async_trait;
use bson::{RawDocument, RawDocumentBuf};

use crate::error::DocumentStoreError;

/// A single-pass stream of encoded documents produced by a query.
#[async_trait]
pub trait DocumentCursor: Send {
    /// Moves to the next document.
    ///
    /// Returns `false` once the sequence is exhausted or has failed. After a `false`
    /// return the cursor stays finished; call [`take_error`](Self::take_error) to tell
    /// the two apart.
    async fn advance(&mut self) -> bool;

    /// Returns the document the cursor is positioned on, if any.
    fn current(&self) -> Option<&RawDocument>;

    /// Takes the terminal sequence error, if the cursor stopped because of one.
    fn take_error(&mut self) -> Option<DocumentStoreError>;
}

/// A type-erased cursor as returned by store backends.
pub type BoxDocumentCursor = Box<dyn DocumentCursor>;

#[async_trait]
impl<C> DocumentCursor for Box<C>
where
    C: DocumentCursor + ?Sized,
{
    async fn advance(&mut self) -> bool {
        (**self).advance().await
    }

    fn current(&self) -> Option<&RawDocument> {
        (**self).current()
    }

    fn take_error(&mut self) -> Option<DocumentStoreError> {
        (**self).take_error()
    }
}

/// A cursor over documents that are already in memory.
///
/// Used by the in-memory backend, and by tests that need a sequence which breaks
/// part-way through via [`VecCursor::interrupt_after`].
#[derive(Debug)]
pub struct VecCursor {
    documents: std::vec::IntoIter<RawDocumentBuf>,
    current: Option<RawDocumentBuf>,
    yielded: usize,
    interrupt: Option<(usize, String)>,
    error: Option<DocumentStoreError>,
    finished: bool,
}

impl VecCursor {
    /// Creates a cursor yielding `documents` in order.
    pub fn new(documents: Vec<RawDocumentBuf>) -> Self {
        Self {
            documents: documents.into_iter(),
            current: None,
            yielded: 0,
            interrupt: None,
            error: None,
            finished: false,
        }
    }

    /// Makes the sequence fail with a [`DocumentStoreError::Sequence`] once `count`
    /// documents have been yielded.
    pub fn interrupt_after(mut self, count: usize, message: impl Into<String>) -> Self {
        self.interrupt = Some((count, message.into()));
        self
    }

    /// Number of documents not yet pulled from the sequence.
    pub fn remaining(&self) -> usize {
        self.documents.len()
    }
}

#[async_trait]
impl DocumentCursor for VecCursor {
    async fn advance(&mut self) -> bool {
        if self.finished {
            return false;
        }

        if let Some((count, message)) = &self.interrupt {
            if self.yielded == *count {
                self.error = Some(DocumentStoreError::Sequence(message.clone()));
                self.current = None;
                self.finished = true;
                return false;
            }
        }

        match self.documents.next() {
            Some(document) => {
                self.current = Some(document);
                self.yielded += 1;
                true
            }
            None => {
                self.current = None;
                self.finished = true;
                false
            }
        }
    }

    fn current(&self) -> Option<&RawDocument> {
        self.current.as_deref()
    }

    fn take_error(&mut self) -> Option<DocumentStoreError> {
        self.error.take()
    }
}
