//! Reporting sink: preview output and album publication.
//!
//! The engine hands a finished [`Selection`] to one of two thin sinks:
//! a preview listing of photo URLs, or the chunked, idempotent album
//! append. Publication is the only externally visible mutation the tool
//! performs; re-running after an interruption is safe because re-adding
//! an existing album member is a server-side no-op.

use tracing::info;

use crate::api::{ApiError, LibraryBackend};
use crate::asset::AssetId;
use crate::pipeline::Selection;

/// Render the selection as one photo URL per line.
pub fn preview(selection: &Selection, server_url: &str) {
    let base = server_url.trim_end_matches('/');
    for id in selection.assets.ids() {
        println!("{base}/photos/{id}");
    }
}

/// Append the selection to an album in chunks of `chunk_size` ids.
/// Returns the number of assets submitted. Fails fast on the first
/// chunk error — the append is idempotent, so a retried run converges.
pub async fn publish(
    backend: &dyn LibraryBackend,
    album_id: &str,
    selection: &Selection,
    chunk_size: usize,
) -> Result<usize, ApiError> {
    let ids: Vec<AssetId> = selection.assets.ids().cloned().collect();
    let total = ids.len();
    let mut added = 0;

    for chunk in ids.chunks(chunk_size.max(1)) {
        info!(
            album = album_id,
            from = added + 1,
            to = added + chunk.len(),
            total,
            "adding assets to album"
        );
        backend.add_to_album(album_id, chunk).await?;
        added += chunk.len();
    }

    info!(added, total, album = album_id, "album updated");
    Ok(added)
}
