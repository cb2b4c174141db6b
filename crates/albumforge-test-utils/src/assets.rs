//! Asset record builders for tests.
//!
//! Build realistic asset records without spelling out raw JSON in every
//! test:
//!
//! ```ignore
//! let record = asset("a1")
//!     .path("/photos/2024/Beach/IMG_001.jpg")
//!     .city("Lisbon")
//!     .person("Alice")
//!     .favorite(true)
//!     .build();
//! ```

use albumforge_core::asset::{AssetRecord, ResultSet};
use serde_json::{json, Value};

/// Start building an asset record with the given id.
pub fn asset(id: &str) -> AssetBuilder {
    AssetBuilder {
        value: json!({ "id": id }),
    }
}

/// Fluent builder for [`AssetRecord`] fixtures.
pub struct AssetBuilder {
    value: Value,
}

impl AssetBuilder {
    pub fn path(mut self, path: &str) -> Self {
        self.value["originalPath"] = json!(path);
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.ensure_exif();
        self.value["exifInfo"]["city"] = json!(city);
        self
    }

    pub fn camera_make(mut self, make: &str) -> Self {
        self.ensure_exif();
        self.value["exifInfo"]["make"] = json!(make);
        self
    }

    pub fn favorite(mut self, favorite: bool) -> Self {
        self.value["isFavorite"] = json!(favorite);
        self
    }

    pub fn person(mut self, name: &str) -> Self {
        if !self.value["people"].is_array() {
            self.value["people"] = json!([]);
        }
        if let Some(people) = self.value["people"].as_array_mut() {
            people.push(json!({ "name": name }));
        }
        self
    }

    /// Set an arbitrary top-level field.
    pub fn field(mut self, key: &str, value: Value) -> Self {
        self.value[key] = value;
        self
    }

    pub fn build(self) -> AssetRecord {
        AssetRecord::from_value(self.value)
            .unwrap_or_else(|| unreachable!("builder always sets a string id"))
    }

    fn ensure_exif(&mut self) {
        if !self.value["exifInfo"].is_object() {
            self.value["exifInfo"] = json!({});
        }
    }
}

/// Build plain records for a list of ids.
pub fn records(ids: &[&str]) -> Vec<AssetRecord> {
    ids.iter().map(|id| asset(id).build()).collect()
}

/// The ids of a result set as sorted strings, for assertion convenience.
pub fn sorted_ids(set: &ResultSet) -> Vec<String> {
    let mut ids: Vec<String> = set.ids().map(|id| id.to_string()).collect();
    ids.sort();
    ids
}
