//! Remote library backend — the trait boundary around the Immich HTTP API.
//!
//! The selection engine consumes the external service exclusively through
//! [`LibraryBackend`], so tests substitute an in-memory implementation and
//! all network I/O stays inside [`ImmichClient`].

mod immich;

pub use immich::ImmichClient;

use serde::Deserialize;
use serde_json::Value;

use crate::asset::{AssetId, AssetRecord};
use crate::BoxFuture;

/// What kind of thing a human-readable reference names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Person,
    Album,
}

impl ReferenceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceKind::Person => "person",
            ReferenceKind::Album => "album",
        }
    }
}

/// Errors from remote library calls.
///
/// An unresolvable reference is deliberately distinct from a zero-result
/// query: a misspelled person name must abort the run, not silently select
/// nothing.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("authentication failed (check API key): {0}")]
    Auth(String),

    #[error("server returned {status}: {message}")]
    Http { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("response parse error: {0}")]
    Parse(String),

    #[error("no {} matches reference {name:?}", kind.as_str())]
    UnresolvedReference { kind: ReferenceKind, name: String },
}

/// A person known to the server.
#[derive(Debug, Clone, Deserialize)]
pub struct PersonSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// An album known to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumSummary {
    pub id: String,
    pub album_name: String,
    #[serde(default)]
    pub shared: bool,
    #[serde(default)]
    pub asset_count: u64,
    #[serde(default)]
    pub owner: Option<AlbumOwner>,
}

/// The owning user of an album.
#[derive(Debug, Clone, Deserialize)]
pub struct AlbumOwner {
    #[serde(default)]
    pub name: String,
}

/// A server user account.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// Remote photo-library interface.
///
/// Implementations must be `Send + Sync` for concurrent query fan-out.
/// Uses `BoxFuture` for object safety (allows `&dyn LibraryBackend`).
/// All operations are read-only and idempotent except `add_to_album`,
/// which is an idempotent append — re-adding an existing member is a no-op
/// on the server, so retried runs are safe.
pub trait LibraryBackend: Send + Sync {
    /// Backend display name (e.g. "Immich").
    fn name(&self) -> &str;

    /// Execute a structured metadata search.
    fn search_metadata(&self, payload: &Value)
        -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>>;

    /// Execute a content-similarity ("smart") search, relevance-ordered,
    /// delivering at most `limit` records.
    fn search_content(
        &self,
        payload: &Value,
        limit: usize,
    ) -> BoxFuture<'_, Result<Vec<AssetRecord>, ApiError>>;

    /// Resolve a person name or UUID to one or more person ids. Several
    /// people may share a name; the result is never empty.
    fn resolve_person(&self, reference: &str)
        -> BoxFuture<'_, Result<Vec<String>, ApiError>>;

    /// Resolve an album name or UUID to its id.
    fn resolve_album(&self, reference: &str) -> BoxFuture<'_, Result<String, ApiError>>;

    /// Append assets to an album. Idempotent on the server side.
    fn add_to_album(
        &self,
        album_id: &str,
        ids: &[AssetId],
    ) -> BoxFuture<'_, Result<(), ApiError>>;

    /// List all albums visible to the caller.
    fn list_albums(&self) -> BoxFuture<'_, Result<Vec<AlbumSummary>, ApiError>>;

    /// List all recognised people (named and unnamed).
    fn list_people(&self) -> BoxFuture<'_, Result<Vec<PersonSummary>, ApiError>>;

    /// List all user accounts (may require admin privileges).
    fn list_users(&self) -> BoxFuture<'_, Result<Vec<UserSummary>, ApiError>>;

    /// The authenticated user.
    fn current_user(&self) -> BoxFuture<'_, Result<UserSummary, ApiError>>;
}
