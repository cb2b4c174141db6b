//! Immich HTTP API client.
//!
//! Implements [`LibraryBackend`] against an Immich server: the
//! `/api/search/{metadata,smart}` endpoints with server-driven pagination,
//! the people/album/user listing endpoints, and the idempotent album-append
//! mutation. One descriptor maps to one logical search; the client only
//! pages as far as the server requires to deliver the requested threshold.

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::asset::{AssetId, AssetRecord};
use crate::BoxFuture;

use super::{
    AlbumSummary, ApiError, LibraryBackend, PersonSummary, ReferenceKind, UserSummary,
};

const SEARCH_PAGE_SIZE: u64 = 100;

/// Client for one Immich server.
pub struct ImmichClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ImmichClient {
    /// Create a client for the given server. A trailing slash on the URL is
    /// tolerated and trimmed.
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            base_url,
            api_key: api_key.into(),
        }
    }

    /// The server base URL (used by the reporting sink to print photo links).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, url: &str) -> Result<Value, ApiError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .header("x-api-key", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse_response(resp).await
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        url: &str,
        body: &Value,
    ) -> Result<Value, ApiError> {
        debug!(%url, %method, "request");
        let resp = self
            .client
            .request(method, url)
            .header("x-api-key", &self.api_key)
            .header("accept", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Self::parse_response(resp).await
    }

    async fn parse_response(resp: reqwest::Response) -> Result<Value, ApiError> {
        let status = resp.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApiError::Auth(format!("server returned {status}")));
        }
        if !status.is_success() {
            let message = resp.text().await.unwrap_or_default();
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        if text.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&text).map_err(|e| ApiError::Parse(e.to_string()))
    }

    /// Execute one search descriptor, paging until the server reports no
    /// next page or the result threshold is reached.
    async fn paged_search(
        &self,
        kind: &str,
        payload: &Value,
        limit: Option<usize>,
    ) -> Result<Vec<AssetRecord>, ApiError> {
        let url = format!("{}/api/search/{kind}", self.base_url);
        let mut records = Vec::new();
        let mut page: u64 = 1;

        loop {
            let mut body = payload.clone();
            if let Some(map) = body.as_object_mut() {
                map.insert("page".to_string(), page.into());
                map.insert("size".to_string(), SEARCH_PAGE_SIZE.into());
                map.insert("withExif".to_string(), true.into());
            }

            debug!(kind, page, "executing search");
            let result = self.send_json(reqwest::Method::POST, &url, &body).await?;
            let parsed: SearchResponse = serde_json::from_value(result)
                .map_err(|e| ApiError::Parse(format!("search response: {e}")))?;

            let fetched = parsed.assets.items.len();
            for item in parsed.assets.items {
                let record = AssetRecord::from_value(item).ok_or_else(|| {
                    ApiError::Parse("search result asset without string id".to_string())
                })?;
                records.push(record);
            }

            if let Some(max) = limit {
                if records.len() >= max {
                    debug!(kind, max, "reached result threshold");
                    records.truncate(max);
                    break;
                }
            }
            if parsed.assets.next_page.is_none() || fetched == 0 {
                debug!(kind, page, total = records.len(), "reached last page");
                break;
            }
            page += 1;
        }

        Ok(records)
    }

    async fn fetch_people(&self) -> Result<Vec<PersonSummary>, ApiError> {
        let mut people = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/api/people?page={page}&withHidden=true",
                self.base_url
            );
            let result = self.get_json(&url).await?;
            let parsed: PeopleResponse = serde_json::from_value(result)
                .map_err(|e| ApiError::Parse(format!("people response: {e}")))?;
            if parsed.people.is_empty() {
                break;
            }
            people.extend(parsed.people);
            page += 1;
        }
        Ok(people)
    }

    async fn fetch_albums(&self) -> Result<Vec<AlbumSummary>, ApiError> {
        // Shared and non-shared albums live behind the same endpoint but
        // must be requested separately.
        let mut albums = Vec::new();
        for shared in ["true", "false"] {
            let url = format!("{}/api/albums?shared={shared}", self.base_url);
            let result = self.get_json(&url).await?;
            let parsed: Vec<AlbumSummary> = serde_json::from_value(result)
                .map_err(|e| ApiError::Parse(format!("albums response: {e}")))?;
            albums.extend(parsed);
        }
        Ok(albums)
    }
}

impl LibraryBackend for ImmichClient {
    fn name(&self) -> &str {
        "Immich"
    }

    fn search_metadata(
        &self,
        payload: &Value,
    ) -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>> {
        let payload = payload.clone();
        Box::pin(async move { self.paged_search("metadata", &payload, None).await })
    }

    fn search_content(
        &self,
        payload: &Value,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>> {
        let payload = payload.clone();
        Box::pin(async move { self.paged_search("smart", &payload, Some(limit)).await })
    }

    fn resolve_person(
        &self,
        reference: &str,
    ) -> BoxFuture<'_, Result<Vec<String>, ApiError>> {
        let reference = reference.to_string();
        Box::pin(async move {
            if is_uuid(&reference) {
                debug!(%reference, "person reference is a UUID, using it directly");
                return Ok(vec![reference]);
            }
            let people = self.fetch_people().await?;
            let ids: Vec<String> = people
                .into_iter()
                .filter(|p| p.name == reference)
                .map(|p| p.id)
                .collect();
            if ids.is_empty() {
                return Err(ApiError::UnresolvedReference {
                    kind: ReferenceKind::Person,
                    name: reference,
                });
            }
            if ids.len() > 1 {
                warn!(name = %reference, count = ids.len(), "multiple people share this name, using all of them");
            }
            Ok(ids)
        })
    }

    fn resolve_album(&self, reference: &str) -> BoxFuture<'_, Result<String, ApiError>> {
        let reference = reference.to_string();
        Box::pin(async move {
            if is_uuid(&reference) {
                return Ok(reference);
            }
            let albums = self.fetch_albums().await?;
            let mut matching = albums.into_iter().filter(|a| a.album_name == reference);
            let Some(first) = matching.next() else {
                return Err(ApiError::UnresolvedReference {
                    kind: ReferenceKind::Album,
                    name: reference,
                });
            };
            if matching.next().is_some() {
                warn!(name = %reference, "multiple albums share this name, using the first one");
            }
            Ok(first.id)
        })
    }

    fn add_to_album(
        &self,
        album_id: &str,
        ids: &[AssetId],
    ) -> BoxFuture<'_, Result<(), ApiError>> {
        let url = format!("{}/api/albums/{album_id}/assets", self.base_url);
        let body = serde_json::json!({
            "ids": ids.iter().map(AssetId::as_str).collect::<Vec<_>>(),
        });
        Box::pin(async move {
            self.send_json(reqwest::Method::PUT, &url, &body).await?;
            Ok(())
        })
    }

    fn list_albums(&self) -> BoxFuture<'_, Result<Vec<AlbumSummary>, ApiError>> {
        Box::pin(self.fetch_albums())
    }

    fn list_people(&self) -> BoxFuture<'_, Result<Vec<PersonSummary>, ApiError>> {
        Box::pin(self.fetch_people())
    }

    fn list_users(&self) -> BoxFuture<'_, Result<Vec<UserSummary>, ApiError>> {
        Box::pin(async move {
            let url = format!("{}/api/users", self.base_url);
            let result = self.get_json(&url).await?;
            serde_json::from_value(result)
                .map_err(|e| ApiError::Parse(format!("users response: {e}")))
        })
    }

    fn current_user(&self) -> BoxFuture<'_, Result<UserSummary, ApiError>> {
        Box::pin(async move {
            let url = format!("{}/api/users/me", self.base_url);
            let result = self.get_json(&url).await?;
            serde_json::from_value(result)
                .map_err(|e| ApiError::Parse(format!("user response: {e}")))
        })
    }
}

/// Whether a reference is already a UUID (hex groups 8-4-4-4-12).
fn is_uuid(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 36
        && b.iter().enumerate().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => *c == b'-',
            _ => c.is_ascii_hexdigit(),
        })
}

// ── Immich wire types (private) ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    assets: SearchPage,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    items: Vec<Value>,
    #[serde(default)]
    next_page: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct PeopleResponse {
    #[serde(default)]
    people: Vec<PersonSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("0194b7e6-35b1-7e3a-9b5d-8f3c2a1d4e5f"));
        assert!(is_uuid("ABCDEF01-2345-6789-abcd-ef0123456789"));
        assert!(!is_uuid("Alice"));
        assert!(!is_uuid("0194b7e6-35b1-7e3a-9b5d"));
        assert!(!is_uuid("0194b7e6x35b1x7e3ax9b5dx8f3c2a1d4e5f"));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = ImmichClient::new("https://photos.example.com/", "key");
        assert_eq!(client.base_url(), "https://photos.example.com");
    }

    #[test]
    fn test_search_response_parsing() {
        let parsed: SearchResponse = serde_json::from_value(json!({
            "assets": {
                "items": [{ "id": "a1" }, { "id": "a2" }],
                "nextPage": "2"
            }
        }))
        .unwrap();
        assert_eq!(parsed.assets.items.len(), 2);
        assert!(parsed.assets.next_page.is_some());
    }

    #[test]
    fn test_search_response_last_page() {
        let parsed: SearchResponse = serde_json::from_value(json!({
            "assets": { "items": [], "nextPage": null }
        }))
        .unwrap();
        assert!(parsed.assets.items.is_empty());
        assert!(parsed.assets.next_page.is_none());
    }

    #[test]
    fn test_album_summary_parsing() {
        let parsed: Vec<AlbumSummary> = serde_json::from_value(json!([
            {
                "id": "al1",
                "albumName": "Holidays",
                "shared": true,
                "assetCount": 12,
                "owner": { "name": "Alice" }
            }
        ]))
        .unwrap();
        assert_eq!(parsed[0].album_name, "Holidays");
        assert_eq!(parsed[0].asset_count, 12);
        assert_eq!(parsed[0].owner.as_ref().unwrap().name, "Alice");
    }
}
