//! Path-query evaluation over asset records.
//!
//! A [`PathExpr`] addresses values inside the raw JSON tree of an asset:
//! object member access (`exifInfo.city`), array element access
//! (`people[0].name`), and wildcards that fan out across array elements or
//! object members (`people[*].name`, `tags.*`). A leading `$` root marker is
//! accepted and ignored. Expressions are parsed once at load time; malformed
//! expressions are a configuration error, never a silent per-asset skip.

use std::fmt;

use serde_json::Value;

/// Errors produced while parsing a path expression.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PathError {
    #[error("empty path expression")]
    Empty,

    #[error("empty member name at byte {0}")]
    EmptyMember(usize),

    #[error("unterminated bracket segment starting at byte {0}")]
    UnterminatedBracket(usize),

    #[error("invalid bracket segment {segment:?} at byte {offset}")]
    InvalidBracket { segment: String, offset: usize },
}

/// One step of a path expression.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    /// Object member access by name.
    Member(String),
    /// Array element access by index.
    Index(usize),
    /// Fan out across all array elements / object member values.
    Wildcard,
}

/// A compiled path expression.
#[derive(Debug, Clone)]
pub struct PathExpr {
    source: String,
    segments: Vec<Segment>,
}

impl PathExpr {
    /// Parse a path expression.
    pub fn parse(input: &str) -> Result<Self, PathError> {
        let trimmed = input.trim();
        let body = trimmed.strip_prefix('$').unwrap_or(trimmed);
        if body.is_empty() {
            return Err(PathError::Empty);
        }

        let mut segments = Vec::new();
        let bytes = body.as_bytes();
        let mut pos = 0;

        while pos < bytes.len() {
            match bytes[pos] {
                b'.' => {
                    pos += 1;
                    if pos >= bytes.len() {
                        return Err(PathError::EmptyMember(pos));
                    }
                    if bytes[pos] == b'*' {
                        segments.push(Segment::Wildcard);
                        pos += 1;
                    } else if bytes[pos] == b'[' {
                        // `.` followed by a bracket is tolerated (`a.[0]`)
                        continue;
                    } else {
                        let (name, next) = take_member(body, pos)?;
                        segments.push(Segment::Member(name));
                        pos = next;
                    }
                }
                b'[' => {
                    let close = body[pos..]
                        .find(']')
                        .map(|i| pos + i)
                        .ok_or(PathError::UnterminatedBracket(pos))?;
                    let inner = body[pos + 1..close].trim();
                    segments.push(parse_bracket(inner, pos)?);
                    pos = close + 1;
                }
                _ => {
                    let (name, next) = take_member(body, pos)?;
                    segments.push(Segment::Member(name));
                    pos = next;
                }
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }

        Ok(Self {
            source: trimmed.to_string(),
            segments,
        })
    }

    /// The original expression text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Resolve the expression against a JSON tree, returning every value it
    /// addresses. Wildcard segments fan out into multiple candidates; a path
    /// that matches nothing yields an empty vector.
    pub fn resolve<'a>(&self, root: &'a Value) -> Vec<&'a Value> {
        let mut current = vec![root];
        for segment in &self.segments {
            let mut next = Vec::new();
            for value in current {
                match segment {
                    Segment::Member(name) => {
                        if let Some(v) = value.get(name.as_str()) {
                            next.push(v);
                        }
                    }
                    Segment::Index(i) => {
                        if let Some(v) = value.get(*i) {
                            next.push(v);
                        }
                    }
                    Segment::Wildcard => match value {
                        Value::Array(items) => next.extend(items.iter()),
                        Value::Object(map) => next.extend(map.values()),
                        _ => {}
                    },
                }
            }
            if next.is_empty() {
                return Vec::new();
            }
            current = next;
        }
        current
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn take_member(body: &str, start: usize) -> Result<(String, usize), PathError> {
    let rest = &body[start..];
    let end = rest
        .find(|c| c == '.' || c == '[')
        .map(|i| start + i)
        .unwrap_or(body.len());
    let name = body[start..end].trim();
    if name.is_empty() {
        return Err(PathError::EmptyMember(start));
    }
    Ok((name.to_string(), end))
}

fn parse_bracket(inner: &str, offset: usize) -> Result<Segment, PathError> {
    if inner == "*" {
        return Ok(Segment::Wildcard);
    }
    if let Some(quoted) = strip_quotes(inner) {
        if quoted.is_empty() {
            return Err(PathError::EmptyMember(offset));
        }
        return Ok(Segment::Member(quoted.to_string()));
    }
    if let Ok(index) = inner.parse::<usize>() {
        return Ok(Segment::Index(index));
    }
    Err(PathError::InvalidBracket {
        segment: inner.to_string(),
        offset,
    })
}

fn strip_quotes(s: &str) -> Option<&str> {
    s.strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .or_else(|| s.strip_prefix('\'').and_then(|rest| rest.strip_suffix('\'')))
}

/// String form of a resolved value for pattern matching. Strings are used
/// verbatim (no surrounding quotes); everything else uses its JSON text.
pub fn value_to_match_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Value {
        json!({
            "id": "a1",
            "originalPath": "/photos/2024/beach.jpg",
            "isFavorite": true,
            "exifInfo": { "city": "Lisbon", "make": "Canon" },
            "people": [
                { "name": "Alice" },
                { "name": "Bob" }
            ]
        })
    }

    fn resolve_strings(path: &str, root: &Value) -> Vec<String> {
        PathExpr::parse(path)
            .unwrap()
            .resolve(root)
            .into_iter()
            .map(value_to_match_string)
            .collect()
    }

    #[test]
    fn test_member_access() {
        assert_eq!(
            resolve_strings("originalPath", &sample()),
            vec!["/photos/2024/beach.jpg"]
        );
        assert_eq!(resolve_strings("exifInfo.city", &sample()), vec!["Lisbon"]);
    }

    #[test]
    fn test_root_marker_is_optional() {
        assert_eq!(
            resolve_strings("$.exifInfo.city", &sample()),
            resolve_strings("exifInfo.city", &sample())
        );
    }

    #[test]
    fn test_array_index() {
        assert_eq!(resolve_strings("people[0].name", &sample()), vec!["Alice"]);
        assert_eq!(resolve_strings("people[1].name", &sample()), vec!["Bob"]);
        assert!(resolve_strings("people[9].name", &sample()).is_empty());
    }

    #[test]
    fn test_array_wildcard_fans_out() {
        assert_eq!(
            resolve_strings("people[*].name", &sample()),
            vec!["Alice", "Bob"]
        );
    }

    #[test]
    fn test_object_wildcard_fans_out() {
        let values = resolve_strings("exifInfo.*", &sample());
        assert_eq!(values.len(), 2);
        assert!(values.contains(&"Lisbon".to_string()));
    }

    #[test]
    fn test_quoted_member() {
        assert_eq!(
            resolve_strings("exifInfo[\"city\"]", &sample()),
            vec!["Lisbon"]
        );
        assert_eq!(resolve_strings("exifInfo['city']", &sample()), vec!["Lisbon"]);
    }

    #[test]
    fn test_missing_path_resolves_empty() {
        assert!(resolve_strings("exifInfo.country", &sample()).is_empty());
        assert!(resolve_strings("nothing.here", &sample()).is_empty());
    }

    #[test]
    fn test_non_string_scalars_stringify() {
        assert_eq!(resolve_strings("isFavorite", &sample()), vec!["true"]);
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(PathExpr::parse(""), Err(PathError::Empty)));
        assert!(PathExpr::parse("$").is_err());
        assert!(PathExpr::parse("a..b").is_err());
        assert!(PathExpr::parse("a[").is_err());
        assert!(PathExpr::parse("a[abc]").is_err());
        assert!(PathExpr::parse("a.").is_err());
    }

    #[test]
    fn test_display_round_trips_source() {
        let expr = PathExpr::parse("$.people[*].name").unwrap();
        assert_eq!(expr.to_string(), "$.people[*].name");
    }
}
