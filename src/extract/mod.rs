//! Fact sources: extraction as a capability with two implementations.
//!
//! The external Node-based extractor and the in-process fallback analyzer
//! are interchangeable producers of the same raw fact record schema. The
//! driver selects one at startup and degrades to the fallback when the
//! external process is unavailable or produces nothing.

mod fallback;
mod process;

pub use fallback::FallbackAnalyzer;
pub use process::ProcessExtractor;

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

use crate::record::FileRecord;

/// Errors from a fact source. Extraction errors never abort the build on
/// their own; the driver degrades or skips.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to spawn extractor: {reason}")]
    SpawnFailed { reason: String },

    #[error("extractor exited with code {code} and produced no records")]
    FailedWithoutRecords { code: i32 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A producer of raw fact records, one per source file.
pub trait FactSource {
    /// Source name for logs and diagnostics.
    fn name(&self) -> &'static str;

    /// Extract records for the given files. Partial output preceding a
    /// failure is kept; malformed lines are skipped, never fatal.
    fn extract(&self, files: &[PathBuf]) -> Result<Vec<FileRecord>, ExtractError>;
}

/// Run extraction with degradation: prefer the external process when it is
/// available, fall back to the in-process analyzer when it is missing, fails
/// without records, or yields nothing.
pub fn extract_with_fallback(
    repo: &Path,
    files: &[PathBuf],
    script: Option<&Path>,
    include_globs: &[String],
    exclude_globs: &[String],
) -> Result<Vec<FileRecord>, ExtractError> {
    let fallback = FallbackAnalyzer::new(repo);

    let Some(process) = ProcessExtractor::locate(repo, script, include_globs, exclude_globs)
    else {
        warn!("external extractor unavailable; using fallback analyzer");
        return fallback.extract(files);
    };

    match process.extract(files) {
        Ok(records) if !records.is_empty() => Ok(records),
        Ok(_) => {
            warn!("extractor produced no records; using fallback analyzer");
            fallback.extract(files)
        }
        Err(err) => {
            warn!("extractor failed ({}); using fallback analyzer", err);
            fallback.extract(files)
        }
    }
}
