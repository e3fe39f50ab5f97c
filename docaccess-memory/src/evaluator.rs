//! Filter evaluation for in-memory documents.
//!
//! This module matches stored documents against store-native filter documents, the
//! same `{field: value}` / `{field: {$op: value}}` shape the MongoDB backend sends to the
//! server. The supported subset is:
//!
//! - equality on top-level or dotted fields (an array field matches if any element does)
//! - `$eq`, `$ne`, `$gt`, `$gte`, `$lt`, `$lte`, `$in`, `$nin`, `$exists`
//! - the logical combinators `$and`, `$or` and `$nor`
//!
//! Anything else is rejected with [`DocumentStoreError::Operation`], as a server would.

use std::cmp::Ordering;
use bson::{Bson, Document, datetime::DateTime, oid::ObjectId};

use docaccess_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    options::{Sort, SortDirection},
};


/// Type-erased, comparable representation of BSON values.
///
/// Numeric types are normalized to f64 so that `1_i32`, `1_i64` and `1.0` compare equal,
/// matching server semantics. Types without a natural ordering fall back to plain BSON
/// equality.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    ObjectId(ObjectId),
    Array(Vec<Comparable<'a>>),
    /// Embedded document fields, in stored order.
    Map(Vec<(&'a str, Comparable<'a>)>),
    Other(&'a Bson),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null | Bson::Undefined => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::ObjectId(value) => Comparable::ObjectId(*value),
            Bson::Array(arr) => Comparable::Array(
                arr
                    .iter()
                    .map(Comparable::from)
                    .collect::<Vec<_>>()
            ),
            Bson::Document(doc) => Comparable::Map(
                doc
                    .iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect::<Vec<_>>()
            ),
            other => Comparable::Other(other),
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            (Comparable::Other(a), Comparable::Other(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::ObjectId(a), Comparable::ObjectId(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a possibly dotted field path (`address.city`) inside a document.
pub(crate) fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;

    for part in parts {
        current = current.as_document()?.get(part)?;
    }

    Some(current)
}

/// Returns `true` if two optional field values hold the same value.
pub(crate) fn same_value(left: Option<&Bson>, right: Option<&Bson>) -> bool {
    let null = Comparable::Null;
    let left = left.map(Comparable::from);
    let right = right.map(Comparable::from);

    left.as_ref().unwrap_or(&null) == right.as_ref().unwrap_or(&null)
}

/// Orders two documents by a sort specification. Missing fields sort first.
pub(crate) fn compare_documents(a: &Document, b: &Document, sort: &Sort) -> Ordering {
    let left = lookup(a, &sort.field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null);
    let right = lookup(b, &sort.field)
        .map(Comparable::from)
        .unwrap_or(Comparable::Null);

    let ordering = match (&left, &right) {
        (Comparable::Null, Comparable::Null) => Ordering::Equal,
        (Comparable::Null, _) => Ordering::Less,
        (_, Comparable::Null) => Ordering::Greater,
        _ => left.partial_cmp(&right).unwrap_or(Ordering::Equal),
    };

    match sort.direction {
        SortDirection::Asc => ordering,
        SortDirection::Desc => ordering.reverse(),
    }
}


/// Matches documents against a filter document.
pub(crate) struct FilterEvaluator<'f> {
    filter: &'f Document,
}

impl<'f> FilterEvaluator<'f> {
    pub fn new(filter: &'f Document) -> Self {
        Self { filter }
    }

    /// Returns `true` if `document` satisfies every clause of the filter.
    pub fn matches(&self, document: &Document) -> DocumentStoreResult<bool> {
        matches_clauses(document, self.filter)
    }

    /// Returns the positions of the matching documents, in order.
    pub fn positions<'d>(
        &self,
        documents: impl IntoIterator<Item = &'d Document>,
    ) -> DocumentStoreResult<Vec<usize>> {
        let mut positions = Vec::new();

        for (position, document) in documents.into_iter().enumerate() {
            if self.matches(document)? {
                positions.push(position);
            }
        }

        Ok(positions)
    }
}

fn matches_clauses(document: &Document, filter: &Document) -> DocumentStoreResult<bool> {
    for (key, condition) in filter {
        let matched = match key.as_str() {
            "$and" => {
                let mut all = true;
                for clause in subfilters(key, condition)? {
                    if !matches_clauses(document, clause)? {
                        all = false;
                        break;
                    }
                }
                all
            },
            "$or" | "$nor" => {
                let mut any = false;
                for clause in subfilters(key, condition)? {
                    if matches_clauses(document, clause)? {
                        any = true;
                        break;
                    }
                }
                if key == "$or" { any } else { !any }
            },
            op if op.starts_with('$') => return Err(unsupported(op)),
            field => matches_condition(lookup(document, field), condition)?,
        };

        if !matched {
            return Ok(false);
        }
    }

    Ok(true)
}

fn subfilters<'a>(key: &str, condition: &'a Bson) -> DocumentStoreResult<Vec<&'a Document>> {
    condition
        .as_array()
        .ok_or_else(|| DocumentStoreError::Operation(format!("{key} must be an array")))?
        .iter()
        .map(|clause| {
            clause
                .as_document()
                .ok_or_else(|| DocumentStoreError::Operation(format!("{key} entries must be documents")))
        })
        .collect()
}

fn matches_condition(value: Option<&Bson>, condition: &Bson) -> DocumentStoreResult<bool> {
    match condition {
        Bson::Document(ops) if ops.keys().next().is_some_and(|k| k.starts_with('$')) => {
            for (op, operand) in ops {
                if !apply_operator(op, value, operand)? {
                    return Ok(false);
                }
            }

            Ok(true)
        },
        _ => Ok(equals(value, condition)),
    }
}

fn apply_operator(op: &str, value: Option<&Bson>, operand: &Bson) -> DocumentStoreResult<bool> {
    Ok(match op {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$gt" => compare(value, operand, |o| o == Ordering::Greater),
        "$gte" => compare(value, operand, |o| o != Ordering::Less),
        "$lt" => compare(value, operand, |o| o == Ordering::Less),
        "$lte" => compare(value, operand, |o| o != Ordering::Greater),
        "$in" | "$nin" => {
            let any = operand
                .as_array()
                .ok_or_else(|| DocumentStoreError::Operation(format!("{op} needs an array")))?
                .iter()
                .any(|candidate| equals(value, candidate));

            if op == "$in" { any } else { !any }
        },
        "$exists" => value.is_some() == truthy(operand),
        other => return Err(unsupported(other)),
    })
}

/// Equality with server semantics: a missing field equals `null`, and an array field
/// equals a scalar if any of its elements does.
fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => items
            .iter()
            .any(|item| Comparable::from(item) == Comparable::from(expected)),
        Some(value) => Comparable::from(value) == Comparable::from(expected),
    }
}

/// Range comparison. A missing field compares as `null`, and `null` equals `null`.
fn compare(value: Option<&Bson>, operand: &Bson, accept: fn(Ordering) -> bool) -> bool {
    let value = value.map(Comparable::from).unwrap_or(Comparable::Null);
    let operand = Comparable::from(operand);

    match (&value, &operand) {
        (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
        _ => value.partial_cmp(&operand),
    }
    .is_some_and(accept)
}

fn truthy(operand: &Bson) -> bool {
    match operand {
        Bson::Boolean(flag) => *flag,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::Null => false,
        _ => true,
    }
}

fn unsupported(op: &str) -> DocumentStoreError {
    DocumentStoreError::Operation(format!("unsupported filter operator {op}"))
}
