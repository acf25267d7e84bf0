//! Commit resolution via the git CLI.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::OntoError;

/// Resolve HEAD of the repository. Failure is a configuration-class error;
/// the build fails fast rather than publishing under a made-up commit.
pub fn rev_parse_head(repo: &Path) -> Result<String, OntoError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo)
        .arg("rev-parse")
        .arg("HEAD")
        .output()
        .map_err(|e| OntoError::Git {
            message: format!("failed to run git: {}", e),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(OntoError::Git {
            message: format!(
                "git rev-parse HEAD failed in {}: {}",
                repo.display(),
                stderr.trim()
            ),
        });
    }

    let sha = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if sha.is_empty() {
        return Err(OntoError::Git {
            message: "git rev-parse HEAD produced no output".to_string(),
        });
    }
    debug!("resolved HEAD to {}", sha);
    Ok(sha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn non_repository_fails_with_config_class_error() {
        let dir = TempDir::new().unwrap();
        let err = rev_parse_head(dir.path()).unwrap_err();
        assert_eq!(err.exit_code().code(), 2);
    }
}
