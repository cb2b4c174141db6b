//! Remote query descriptors.
//!
//! A descriptor is parsed exactly once from its textual input — a JSON file
//! path, an inline JSON object, or (for content queries) a bare query string
//! with an optional `@N` result-limit suffix — so downstream logic never
//! re-parses strings. Descriptors are immutable after construction.

use std::path::Path;

use serde_json::Value;

/// Key the server uses for a content query's result-count threshold. It is
/// stripped from the payload before the request is sent.
const RESULT_LIMIT_KEY: &str = "resultLimit";

/// Errors raised while parsing query descriptors.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to read query file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("query input {input:?} is not a JSON object: {source}")]
    Parse {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("query input {input:?} must be a JSON object")]
    NotAnObject { input: String },

    #[error("query input {input:?} has a non-integer resultLimit")]
    BadLimit { input: String },

    #[error("metadata query input {input:?} is neither a JSON file nor an inline JSON object")]
    NotAQuery { input: String },
}

/// A structured metadata search query.
#[derive(Debug, Clone)]
pub struct MetadataQuery {
    payload: Value,
    label: String,
}

impl MetadataQuery {
    /// Parse from a JSON file path or an inline JSON object string.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        let payload = load_json_object(input)?.ok_or_else(|| QueryError::NotAQuery {
            input: input.to_string(),
        })?;
        Ok(Self {
            payload,
            label: input.to_string(),
        })
    }

    /// Build a query matching assets that contain all the given people.
    /// The server ANDs `personIds`, so union-of-people callers pass one
    /// id per query instead.
    pub fn for_person_ids(ids: Vec<String>, label: impl Into<String>) -> Self {
        Self {
            payload: serde_json::json!({ "personIds": ids }),
            label: label.into(),
        }
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The source text this query was parsed from, for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// A content ("smart") similarity query with an optional result threshold.
///
/// Threshold precedence: inline `@N` marker > `resultLimit` field in a JSON
/// payload > the global default (applied at execution time when `limit` is
/// `None`).
#[derive(Debug, Clone)]
pub struct ContentQuery {
    payload: Value,
    limit: Option<usize>,
    label: String,
}

impl ContentQuery {
    /// Parse from a JSON file path, an inline JSON object, a bare query
    /// string, or the `query@N` shorthand.
    pub fn parse(input: &str) -> Result<Self, QueryError> {
        if let Some(mut payload) = load_json_object(input)? {
            let limit = take_result_limit(&mut payload, input)?;
            return Ok(Self {
                payload,
                limit,
                label: input.to_string(),
            });
        }

        if let Some((query, limit)) = split_limit_suffix(input) {
            return Ok(Self {
                payload: serde_json::json!({ "query": query }),
                limit: Some(limit),
                label: input.to_string(),
            });
        }

        Ok(Self {
            payload: serde_json::json!({ "query": input }),
            limit: None,
            label: input.to_string(),
        })
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The parsed result threshold, if one was supplied.
    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Load a JSON object from a `.json`-looking file path or an inline JSON
/// string. `Ok(None)` means the input is neither — callers decide whether
/// that is an error (metadata) or a bare query string (content).
fn load_json_object(input: &str) -> Result<Option<Value>, QueryError> {
    if Path::new(input).exists() {
        let text = std::fs::read_to_string(input).map_err(|source| QueryError::Io {
            path: input.to_string(),
            source,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| QueryError::Parse {
                input: input.to_string(),
                source,
            })?;
        if !value.is_object() {
            return Err(QueryError::NotAnObject {
                input: input.to_string(),
            });
        }
        return Ok(Some(value));
    }

    let inline = input.trim_start();
    if inline.starts_with('{') {
        let value: Value =
            serde_json::from_str(input).map_err(|source| QueryError::Parse {
                input: input.to_string(),
                source,
            })?;
        if !value.is_object() {
            return Err(QueryError::NotAnObject {
                input: input.to_string(),
            });
        }
        return Ok(Some(value));
    }

    Ok(None)
}

/// Pull `resultLimit` out of a payload, validating it is a non-negative
/// integer. The key never reaches the wire.
fn take_result_limit(payload: &mut Value, input: &str) -> Result<Option<usize>, QueryError> {
    let Some(map) = payload.as_object_mut() else {
        return Ok(None);
    };
    match map.remove(RESULT_LIMIT_KEY) {
        None => Ok(None),
        Some(v) => v
            .as_u64()
            .map(|n| Some(n as usize))
            .ok_or_else(|| QueryError::BadLimit {
                input: input.to_string(),
            }),
    }
}

/// Split the `query@N` shorthand. The marker must be a trailing `@` followed
/// by digits; an `@` elsewhere stays part of the query text.
fn split_limit_suffix(input: &str) -> Option<(String, usize)> {
    let (query, suffix) = input.rsplit_once('@')?;
    let query = query.trim();
    let limit = suffix.trim().parse::<usize>().ok()?;
    if query.is_empty() {
        return None;
    }
    Some((query.to_string(), limit))
}
