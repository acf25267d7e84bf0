//! External extractor process: JSON-lines over stdout.
//!
//! Spawns the Node-based extractor and consumes one raw fact record per
//! line incrementally, so a large source tree never requires buffering the
//! whole output. Partial output preceding a failure is kept; a non-zero
//! exit with zero records is reported to the caller so it can degrade.
//! There is no retry and no timeout model.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, error, warn};

use crate::record::FileRecord;

use super::{ExtractError, FactSource};

/// Environment variable carrying the JSON-encoded relative file list.
const FILE_LIST_ENV: &str = "ONTOGRAPH_FILE_LIST";

/// Handle to the external Node-based extractor.
pub struct ProcessExtractor {
    repo: PathBuf,
    node: PathBuf,
    script: PathBuf,
    include_globs: Vec<String>,
    exclude_globs: Vec<String>,
}

impl ProcessExtractor {
    /// Locate the runtime and script; `None` means the external source is
    /// unavailable and the caller should degrade.
    pub fn locate(
        repo: &Path,
        script: Option<&Path>,
        include_globs: &[String],
        exclude_globs: &[String],
    ) -> Option<Self> {
        let node = match which::which("node") {
            Ok(path) => path,
            Err(_) => {
                warn!("node not found on PATH");
                return None;
            }
        };
        let script = script?.to_path_buf();
        if !script.is_file() {
            error!("extractor script missing at {}", script.display());
            return None;
        }
        Some(ProcessExtractor {
            repo: repo.to_path_buf(),
            node,
            script,
            include_globs: include_globs.to_vec(),
            exclude_globs: exclude_globs.to_vec(),
        })
    }
}

impl FactSource for ProcessExtractor {
    fn name(&self) -> &'static str {
        "process"
    }

    fn extract(&self, files: &[PathBuf]) -> Result<Vec<FileRecord>, ExtractError> {
        if files.is_empty() {
            return Ok(Vec::new());
        }

        let rel_files: Vec<String> = files
            .iter()
            .map(|path| {
                path.strip_prefix(&self.repo)
                    .unwrap_or(path)
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        let file_list = serde_json::to_string(&rel_files)
            .map_err(|e| ExtractError::SpawnFailed {
                reason: e.to_string(),
            })?;

        let mut command = Command::new(&self.node);
        command
            .arg("--no-warnings")
            .arg(&self.script)
            .arg("--repo")
            .arg(&self.repo)
            .current_dir(&self.repo)
            .env(FILE_LIST_ENV, file_list)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if !self.include_globs.is_empty() {
            command
                .arg("--files-include")
                .arg(self.include_globs.join(","));
        }
        if !self.exclude_globs.is_empty() {
            command
                .arg("--files-exclude")
                .arg(self.exclude_globs.join(","));
        }

        debug!("running extractor: {} {}", self.node.display(), self.script.display());
        let mut child = command.spawn().map_err(|e| ExtractError::SpawnFailed {
            reason: e.to_string(),
        })?;

        let stdout = child.stdout.take().ok_or_else(|| ExtractError::SpawnFailed {
            reason: "extractor stdout not captured".to_string(),
        })?;

        let mut records = Vec::new();
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            let payload = line.trim();
            if payload.is_empty() {
                continue;
            }
            match serde_json::from_str::<FileRecord>(payload) {
                Ok(record) => records.push(record),
                Err(err) => {
                    error!("invalid extractor payload ({}): {}", err, payload);
                }
            }
        }

        // Stderr is drained only after stdout EOF. A child that fills the
        // stderr pipe buffer before closing stdout would deadlock here; the
        // extractor protocol keeps stderr to short diagnostics, so a single
        // sequential drain is enough without a reader thread.
        let mut stderr_text = String::new();
        if let Some(mut stderr) = child.stderr.take() {
            let _ = stderr.read_to_string(&mut stderr_text);
        }
        let status = child.wait()?;

        let stderr_text = stderr_text.trim();
        if !stderr_text.is_empty() {
            if status.success() {
                debug!("extractor stderr:\n{}", stderr_text);
            } else {
                error!("extractor stderr:\n{}", stderr_text);
            }
        }

        if !status.success() {
            let code = status.code().unwrap_or(-1);
            if records.is_empty() {
                return Err(ExtractError::FailedWithoutRecords { code });
            }
            // Partial output preceding the failure is kept.
            warn!(
                "extractor exited with code {}; keeping {} partial records",
                code,
                records.len()
            );
        }

        Ok(records)
    }
}
