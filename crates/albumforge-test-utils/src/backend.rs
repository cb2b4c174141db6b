//! In-memory [`LibraryBackend`] for tests.
//!
//! Canned responses are registered up front; searches that were not
//! registered return empty results, mirroring a server that finds no
//! matches. Album mutations are recorded for later assertion.

use std::collections::HashMap;
use std::sync::Mutex;

use albumforge_core::api::{
    AlbumSummary, ApiError, LibraryBackend, PersonSummary, ReferenceKind, UserSummary,
};
use albumforge_core::asset::{AssetId, AssetRecord};
use albumforge_core::BoxFuture;
use serde_json::Value;

/// In-memory stand-in for an Immich server.
#[derive(Default)]
pub struct StubLibrary {
    metadata: Vec<(Value, Vec<AssetRecord>)>,
    content: HashMap<String, Vec<AssetRecord>>,
    people: HashMap<String, Vec<String>>,
    albums: HashMap<String, String>,
    network_down: bool,
    added: Mutex<Vec<(String, Vec<AssetId>)>>,
}

impl StubLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the result of a metadata search with this exact payload.
    pub fn with_metadata(mut self, payload: Value, records: Vec<AssetRecord>) -> Self {
        self.metadata.push((payload, records));
        self
    }

    /// Register the result of a content search for this query text.
    pub fn with_content(mut self, query: &str, records: Vec<AssetRecord>) -> Self {
        self.content.insert(query.to_string(), records);
        self
    }

    /// Register a named person.
    pub fn with_person(mut self, name: &str, ids: &[&str]) -> Self {
        self.people
            .insert(name.to_string(), ids.iter().map(|s| s.to_string()).collect());
        self
    }

    /// Register a named album.
    pub fn with_album(mut self, name: &str, id: &str) -> Self {
        self.albums.insert(name.to_string(), id.to_string());
        self
    }

    /// Make every remote call fail with a network error.
    pub fn with_network_failure(mut self) -> Self {
        self.network_down = true;
        self
    }

    /// Every `add_to_album` call recorded so far.
    pub fn added(&self) -> Vec<(String, Vec<AssetId>)> {
        self.added
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }

    fn check_network(&self) -> Result<(), ApiError> {
        if self.network_down {
            return Err(ApiError::Network("connection refused".to_string()));
        }
        Ok(())
    }
}

impl LibraryBackend for StubLibrary {
    fn name(&self) -> &str {
        "stub"
    }

    fn search_metadata(
        &self,
        payload: &Value,
    ) -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>> {
        let payload = payload.clone();
        Box::pin(async move {
            self.check_network()?;
            Ok(self
                .metadata
                .iter()
                .find(|(p, _)| *p == payload)
                .map(|(_, records)| records.clone())
                .unwrap_or_default())
        })
    }

    fn search_content(
        &self,
        payload: &Value,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>> {
        let query = payload
            .get("query")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Box::pin(async move {
            self.check_network()?;
            let mut records = self.content.get(&query).cloned().unwrap_or_default();
            records.truncate(limit);
            Ok(records)
        })
    }

    fn resolve_person(
        &self,
        reference: &str,
    ) -> BoxFuture<'_, Result<Vec<String>, ApiError>> {
        let reference = reference.to_string();
        Box::pin(async move {
            self.check_network()?;
            self.people
                .get(&reference)
                .cloned()
                .filter(|ids| !ids.is_empty())
                .ok_or(ApiError::UnresolvedReference {
                    kind: ReferenceKind::Person,
                    name: reference,
                })
        })
    }

    fn resolve_album(&self, reference: &str) -> BoxFuture<'_, Result<String, ApiError>> {
        let reference = reference.to_string();
        Box::pin(async move {
            self.check_network()?;
            self.albums
                .get(&reference)
                .cloned()
                .ok_or(ApiError::UnresolvedReference {
                    kind: ReferenceKind::Album,
                    name: reference,
                })
        })
    }

    fn add_to_album(
        &self,
        album_id: &str,
        ids: &[AssetId],
    ) -> BoxFuture<'_, Result<(), ApiError>> {
        let album_id = album_id.to_string();
        let ids = ids.to_vec();
        Box::pin(async move {
            self.check_network()?;
            if let Ok(mut added) = self.added.lock() {
                added.push((album_id, ids));
            }
            Ok(())
        })
    }

    fn list_albums(&self) -> BoxFuture<'_, Result<Vec<AlbumSummary>, ApiError>> {
        Box::pin(async move {
            self.check_network()?;
            Ok(self
                .albums
                .iter()
                .map(|(name, id)| AlbumSummary {
                    id: id.clone(),
                    album_name: name.clone(),
                    shared: false,
                    asset_count: 0,
                    owner: None,
                })
                .collect())
        })
    }

    fn list_people(&self) -> BoxFuture<'_, Result<Vec<PersonSummary>, ApiError>> {
        Box::pin(async move {
            self.check_network()?;
            Ok(self
                .people
                .iter()
                .flat_map(|(name, ids)| {
                    ids.iter().map(|id| PersonSummary {
                        id: id.clone(),
                        name: name.clone(),
                    })
                })
                .collect())
        })
    }

    fn list_users(&self) -> BoxFuture<'_, Result<Vec<UserSummary>, ApiError>> {
        Box::pin(async move {
            self.check_network()?;
            Ok(vec![self.test_user()])
        })
    }

    fn current_user(&self) -> BoxFuture<'_, Result<UserSummary, ApiError>> {
        Box::pin(async move {
            self.check_network()?;
            Ok(self.test_user())
        })
    }
}

impl StubLibrary {
    fn test_user(&self) -> UserSummary {
        UserSummary {
            id: "user-1".to_string(),
            name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            is_admin: false,
        }
    }
}
