//! Local predicate rules: path-addressed regex filters over asset records.
//!
//! A rule pairs a [`PathExpr`] with a case-insensitive regex. A rule matches
//! a record when the pattern matches the string form of **any** value the
//! path resolves to — that any-of-values union is built into the rule itself
//! and is distinct from the rule-set's own combination mode. Rule sets
//! combine their rules under [`CombineMode::All`] (every rule must match) or
//! [`CombineMode::Any`] (one suffices).
//!
//! Rules load from a JSON array file, an inline JSON array string, or the
//! `path:regex` command-line shorthand. All compilation happens at load
//! time so malformed paths and patterns surface before any remote call.

use std::fmt;
use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::Deserialize;

use crate::asset::AssetRecord;
use crate::jsonpath::{value_to_match_string, PathError, PathExpr};

/// Errors raised while loading or compiling filter rules.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("rule input {input:?} is not a JSON array: {source}")]
    Parse {
        input: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("rule input {input:?} must be a JSON array of rule objects")]
    NotAnArray { input: String },

    #[error("invalid path expression {path:?}: {source}")]
    Path {
        path: String,
        #[source]
        source: PathError,
    },

    #[error("invalid regex {pattern:?}: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid rule shorthand {input:?}, expected \"path:regex\"")]
    Shorthand { input: String },
}

/// How the rules of a set combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombineMode {
    /// Intersection: every rule must match.
    All,
    /// Union: at least one rule must match.
    Any,
}

/// Wire form of a rule as it appears in JSON rule files.
#[derive(Debug, Deserialize)]
struct RuleSpec {
    path: String,
    regex: String,
    #[serde(default)]
    description: Option<String>,
}

/// One compiled local filter rule.
#[derive(Debug, Clone)]
pub struct LocalFilterRule {
    path: PathExpr,
    pattern: Regex,
    description: Option<String>,
}

impl LocalFilterRule {
    /// Compile a rule from its textual parts. Patterns match
    /// case-insensitively, mirroring the server's own search behavior.
    pub fn new(
        path: &str,
        pattern: &str,
        description: Option<String>,
    ) -> Result<Self, RuleError> {
        let path_expr = PathExpr::parse(path).map_err(|source| RuleError::Path {
            path: path.to_string(),
            source,
        })?;
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|source| RuleError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?;
        Ok(Self {
            path: path_expr,
            pattern: regex,
            description,
        })
    }

    /// Parse the `path:regex` command-line shorthand.
    pub fn from_shorthand(input: &str) -> Result<Self, RuleError> {
        let (path, pattern) = input.split_once(':').ok_or_else(|| RuleError::Shorthand {
            input: input.to_string(),
        })?;
        Self::new(path, pattern, None)
    }

    fn from_spec(spec: RuleSpec) -> Result<Self, RuleError> {
        Self::new(&spec.path, &spec.regex, spec.description)
    }

    /// Whether the rule matches a record: the path must resolve to at least
    /// one value, and the pattern must match the string form of any of them.
    pub fn matches(&self, record: &AssetRecord) -> bool {
        let values = self.path.resolve(record.raw());
        values
            .iter()
            .any(|v| self.pattern.is_match(&value_to_match_string(v)))
    }
}

impl fmt::Display for LocalFilterRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.description {
            Some(d) => f.write_str(d),
            None => write!(f, "{}:{}", self.path, self.pattern.as_str()),
        }
    }
}

/// An ordered sequence of rules with a combination mode.
#[derive(Debug, Clone)]
pub struct LocalFilterSet {
    rules: Vec<LocalFilterRule>,
    mode: CombineMode,
}

impl LocalFilterSet {
    pub fn new(rules: Vec<LocalFilterRule>, mode: CombineMode) -> Self {
        Self { rules, mode }
    }

    /// Load rules from a list of inputs, each of which may be a file path,
    /// an inline JSON array, or the `path:regex` shorthand. Returns `None`
    /// when no inputs were given, so an absent rule set stays absent rather
    /// than becoming an empty one.
    pub fn load(inputs: &[String], mode: CombineMode) -> Result<Option<Self>, RuleError> {
        if inputs.is_empty() {
            return Ok(None);
        }
        let mut rules = Vec::new();
        for input in inputs {
            rules.extend(load_rules_input(input)?);
        }
        Ok(Some(Self::new(rules, mode)))
    }

    pub fn mode(&self) -> CombineMode {
        self.mode
    }

    pub fn rules(&self) -> &[LocalFilterRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether the set matches a record under its combination mode.
    ///
    /// The empty set follows the standard algebraic identities: it matches
    /// everything under `All` (empty intersection) and nothing under `Any`
    /// (empty union).
    pub fn matches(&self, record: &AssetRecord) -> bool {
        match self.mode {
            CombineMode::All => self.rules.iter().all(|r| r.matches(record)),
            CombineMode::Any => self.rules.iter().any(|r| r.matches(record)),
        }
    }
}

fn load_rules_input(input: &str) -> Result<Vec<LocalFilterRule>, RuleError> {
    // File path first, then inline JSON, then shorthand — same probing
    // order for every input so diagnostics stay predictable.
    if Path::new(input).exists() {
        let text = std::fs::read_to_string(input).map_err(|source| RuleError::Io {
            path: input.to_string(),
            source,
        })?;
        return parse_rules_json(&text, input);
    }
    let inline = input.trim_start();
    if inline.starts_with('[') || inline.starts_with('{') {
        return parse_rules_json(input, input);
    }
    LocalFilterRule::from_shorthand(input).map(|rule| vec![rule])
}

fn parse_rules_json(text: &str, input: &str) -> Result<Vec<LocalFilterRule>, RuleError> {
    let specs: Vec<RuleSpec> =
        serde_json::from_str(text).map_err(|source| match serde_json::from_str::<
            serde_json::Value,
        >(text)
        {
            Ok(v) if !v.is_array() => RuleError::NotAnArray {
                input: input.to_string(),
            },
            _ => RuleError::Parse {
                input: input.to_string(),
                source,
            },
        })?;
    specs.into_iter().map(LocalFilterRule::from_spec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: serde_json::Value) -> AssetRecord {
        AssetRecord::from_value(value).unwrap()
    }

    fn beach() -> AssetRecord {
        record(json!({
            "id": "a1",
            "originalPath": "/photos/2024/Beach/IMG_001.jpg",
            "isFavorite": true,
            "exifInfo": { "city": "Lisbon" },
            "people": [{ "name": "Alice" }, { "name": "Bob" }]
        }))
    }

    #[test]
    fn test_rule_matches_any_resolved_value() {
        let rule = LocalFilterRule::new("people[*].name", "^bob$", None).unwrap();
        assert!(rule.matches(&beach()));
    }

    #[test]
    fn test_rule_is_case_insensitive() {
        let rule = LocalFilterRule::new("exifInfo.city", "lisbon", None).unwrap();
        assert!(rule.matches(&beach()));
    }

    #[test]
    fn test_rule_without_resolved_values_does_not_match() {
        let rule = LocalFilterRule::new("exifInfo.country", ".*", None).unwrap();
        assert!(!rule.matches(&beach()));
    }

    #[test]
    fn test_rule_on_non_string_scalar() {
        let rule = LocalFilterRule::new("isFavorite", "^true$", None).unwrap();
        assert!(rule.matches(&beach()));
    }

    #[test]
    fn test_bad_regex_is_load_error() {
        assert!(matches!(
            LocalFilterRule::new("originalPath", "([", None),
            Err(RuleError::Pattern { .. })
        ));
    }

    #[test]
    fn test_bad_path_is_load_error() {
        assert!(matches!(
            LocalFilterRule::new("a..b", ".*", None),
            Err(RuleError::Path { .. })
        ));
    }

    #[test]
    fn test_set_all_mode() {
        let rules = vec![
            LocalFilterRule::new("originalPath", "beach", None).unwrap(),
            LocalFilterRule::new("exifInfo.city", "lisbon", None).unwrap(),
        ];
        let set = LocalFilterSet::new(rules, CombineMode::All);
        assert!(set.matches(&beach()));

        let rules = vec![
            LocalFilterRule::new("originalPath", "beach", None).unwrap(),
            LocalFilterRule::new("exifInfo.city", "porto", None).unwrap(),
        ];
        let set = LocalFilterSet::new(rules, CombineMode::All);
        assert!(!set.matches(&beach()));
    }

    #[test]
    fn test_set_any_mode() {
        let rules = vec![
            LocalFilterRule::new("originalPath", "mountain", None).unwrap(),
            LocalFilterRule::new("exifInfo.city", "lisbon", None).unwrap(),
        ];
        let set = LocalFilterSet::new(rules, CombineMode::Any);
        assert!(set.matches(&beach()));
    }

    #[test]
    fn test_empty_set_identities() {
        let all = LocalFilterSet::new(Vec::new(), CombineMode::All);
        let any = LocalFilterSet::new(Vec::new(), CombineMode::Any);
        assert!(all.matches(&beach()));
        assert!(!any.matches(&beach()));
    }

    #[test]
    fn test_shorthand_parse() {
        let rule = LocalFilterRule::from_shorthand("originalPath:beach").unwrap();
        assert!(rule.matches(&beach()));
        assert!(matches!(
            LocalFilterRule::from_shorthand("no-separator"),
            Err(RuleError::Shorthand { .. })
        ));
    }

    #[test]
    fn test_load_inline_json_array() {
        let inputs = vec![r#"[{"path": "originalPath", "regex": "beach"}]"#.to_string()];
        let set = LocalFilterSet::load(&inputs, CombineMode::All)
            .unwrap()
            .unwrap();
        assert_eq!(set.rules().len(), 1);
        assert!(set.matches(&beach()));
    }

    #[test]
    fn test_load_rejects_non_array_json() {
        let inputs = vec![r#"{"path": "p", "regex": "r"}"#.to_string()];
        assert!(LocalFilterSet::load(&inputs, CombineMode::All).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("rules.json");
        std::fs::write(
            &path,
            r#"[{"path": "exifInfo.city", "regex": "lisbon", "description": "city filter"}]"#,
        )
        .unwrap();
        let inputs = vec![path.to_string_lossy().to_string()];
        let set = LocalFilterSet::load(&inputs, CombineMode::Any)
            .unwrap()
            .unwrap();
        assert_eq!(set.rules().len(), 1);
        assert_eq!(set.rules()[0].to_string(), "city filter");
    }

    #[test]
    fn test_load_empty_inputs_is_none() {
        assert!(LocalFilterSet::load(&[], CombineMode::All)
            .unwrap()
            .is_none());
    }
}
