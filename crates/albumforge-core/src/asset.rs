//! Asset identity and result-set value types.
//!
//! A [`ResultSet`] is the currency of the selection engine: a deduplicated
//! set of asset identifiers together with a side table of the raw records
//! fetched from the server. Sets are value objects — membership is the only
//! identity they carry, and no ordering is guaranteed.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Opaque identifier of a library asset.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AssetId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A read-only projection of one asset as returned by the server.
///
/// The raw JSON tree is kept verbatim so that local path-query filters can
/// address any field the server exposes (EXIF, file paths, flags, nested
/// arrays such as recognised people).
#[derive(Debug, Clone)]
pub struct AssetRecord {
    id: AssetId,
    raw: Value,
}

impl AssetRecord {
    /// Build a record from a raw server object. Returns `None` when the
    /// object carries no string `id` field.
    pub fn from_value(raw: Value) -> Option<Self> {
        let id = raw.get("id")?.as_str()?.to_string();
        Some(Self {
            id: AssetId::new(id),
            raw,
        })
    }

    pub fn id(&self) -> &AssetId {
        &self.id
    }

    pub fn raw(&self) -> &Value {
        &self.raw
    }
}

/// A deduplicated set of asset ids with their records.
///
/// Records are keyed by id; inserting a duplicate id overwrites the stored
/// record (last-write-wins — duplicates from the server are structurally
/// identical, so this is not observable).
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    records: BTreeMap<AssetId, AssetRecord>,
}

impl ResultSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<AssetRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.insert(record);
        }
        set
    }

    pub fn insert(&mut self, record: AssetRecord) {
        self.records.insert(record.id().clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, id: &AssetId) -> bool {
        self.records.contains_key(id)
    }

    pub fn get(&self, id: &AssetId) -> Option<&AssetRecord> {
        self.records.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &AssetId> {
        self.records.keys()
    }

    pub fn records(&self) -> impl Iterator<Item = &AssetRecord> {
        self.records.values()
    }

    /// Merge another set into this one (identifier union, side tables
    /// merged last-write-wins).
    pub fn merge(&mut self, other: &ResultSet) {
        for record in other.records() {
            self.insert(record.clone());
        }
    }

    /// Set union, consuming neither operand.
    pub fn union(&self, other: &ResultSet) -> ResultSet {
        let mut out = self.clone();
        out.merge(other);
        out
    }

    /// Set intersection by identifier; records come from `self`.
    pub fn intersect(&self, other: &ResultSet) -> ResultSet {
        ResultSet {
            records: self
                .records
                .iter()
                .filter(|(id, _)| other.contains(id))
                .map(|(id, rec)| (id.clone(), rec.clone()))
                .collect(),
        }
    }

    /// Set difference by identifier (`self − other`).
    pub fn difference(&self, other: &ResultSet) -> ResultSet {
        ResultSet {
            records: self
                .records
                .iter()
                .filter(|(id, _)| !other.contains(id))
                .map(|(id, rec)| (id.clone(), rec.clone()))
                .collect(),
        }
    }

    /// Keep only the records whose id satisfies `keep`.
    pub fn retain_ids<F: FnMut(&AssetId, &AssetRecord) -> bool>(&self, mut keep: F) -> ResultSet {
        ResultSet {
            records: self
                .records
                .iter()
                .filter(|(id, rec)| keep(id, rec))
                .map(|(id, rec)| (id.clone(), rec.clone()))
                .collect(),
        }
    }

    /// Truncate to at most `max` members. Which members survive is
    /// unspecified — the set has no defined order, so this picks an
    /// arbitrary subset of the required size.
    pub fn truncate(&mut self, max: usize) {
        while self.records.len() > max {
            if let Some(id) = self.records.keys().next_back().cloned() {
                self.records.remove(&id);
            }
        }
    }
}

impl FromIterator<AssetRecord> for ResultSet {
    fn from_iter<T: IntoIterator<Item = AssetRecord>>(iter: T) -> Self {
        Self::from_records(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn rec(id: &str) -> AssetRecord {
        AssetRecord::from_value(json!({ "id": id })).unwrap()
    }

    fn set(ids: &[&str]) -> ResultSet {
        ids.iter().map(|id| rec(id)).collect()
    }

    #[test]
    fn test_record_requires_string_id() {
        assert!(AssetRecord::from_value(json!({ "id": "a1" })).is_some());
        assert!(AssetRecord::from_value(json!({ "id": 42 })).is_none());
        assert!(AssetRecord::from_value(json!({ "name": "a1" })).is_none());
    }

    #[test]
    fn test_insert_deduplicates() {
        let mut s = ResultSet::new();
        s.insert(rec("a"));
        s.insert(rec("a"));
        assert_eq!(s.len(), 1);
    }

    #[test]
    fn test_union_and_intersect() {
        let a = set(&["1", "2", "3"]);
        let b = set(&["2", "3", "4"]);
        let u = a.union(&b);
        let i = a.intersect(&b);
        assert_eq!(u.len(), 4);
        assert_eq!(i.len(), 2);
        assert!(i.contains(&AssetId::from("2")));
        assert!(i.contains(&AssetId::from("3")));
    }

    #[test]
    fn test_difference() {
        let a = set(&["1", "2", "3"]);
        let b = set(&["2"]);
        let d = a.difference(&b);
        assert_eq!(d.len(), 2);
        assert!(!d.contains(&AssetId::from("2")));
    }

    #[test]
    fn test_truncate_is_bounded() {
        let mut s = set(&["1", "2", "3", "4", "5"]);
        s.truncate(2);
        assert_eq!(s.len(), 2);
        s.truncate(10);
        assert_eq!(s.len(), 2);
    }
}
