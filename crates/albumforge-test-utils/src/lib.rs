#![deny(unsafe_code)]

//! Shared test utilities for the Albumforge workspace.
//!
//! Provides reusable fixtures, record builders, an in-memory library
//! backend, and tracing helpers so that individual crate tests stay
//! concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! albumforge-test-utils = { workspace = true }
//! ```

pub mod assets;
pub mod backend;
pub mod tracing_setup;

pub use assets::{asset, sorted_ids};
pub use backend::StubLibrary;
