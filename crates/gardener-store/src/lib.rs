//! # gardener-store
//!
//! Durable JSON state for the Gardener loop: the daily commit quota, the
//! current project, and the prompt/response transcript. All writes that the
//! loop depends on for crash-safe resume go through atomic file replacement.

mod project;
mod quota;
mod transcript;

pub use project::ProjectStore;
pub use quota::QuotaTracker;
pub use transcript::TranscriptLog;

use gardener_core::Result;
use std::path::Path;

/// Write `contents` to `path` via a temp file in the same directory plus
/// rename, so readers never observe a partial record.
pub(crate) fn atomic_write(path: &Path, contents: &str) -> Result<()> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, contents)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}
