#![deny(unsafe_code)]

//! Albumforge core — the asset selection engine.
//!
//! Combines remote metadata searches, content ("smart") searches, and local
//! path-addressed predicate rules into one deterministic include/exclude
//! decision per asset, and optionally publishes the result to an album.
//! All network I/O lives behind the [`api::LibraryBackend`] trait; the rest
//! of the engine operates on plain value sets.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future — the standard return type for async
/// trait methods that require dynamic dispatch (`dyn Trait`).
///
/// Native `async fn` in traits produces opaque return types that are **not**
/// object-safe. Traits consumed via `&dyn Trait` must return a concrete
/// `Pin<Box<dyn Future>>` instead. This alias keeps those signatures readable.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Remote library backend trait and the Immich HTTP client.
pub mod api;
/// Asset identity and result-set value types.
pub mod asset;
/// Union/intersection algebra and category default rules.
pub mod combine;
/// Path-query evaluation over asset record trees.
pub mod jsonpath;
/// The staged selection pipeline.
pub mod pipeline;
/// Query descriptor parsing (metadata, content, `@N` threshold notation).
pub mod query;
/// Reporting sink: preview listing and album publication.
pub mod report;
/// Local predicate rules (path + regex filter sets).
pub mod rules;

pub use api::{ApiError, ImmichClient, LibraryBackend};
pub use asset::{AssetId, AssetRecord, ResultSet};
pub use pipeline::{Selection, SelectionPipeline, SelectionPlan, SelectError};
