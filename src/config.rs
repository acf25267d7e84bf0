//! Build configuration.
//!
//! Defaults mirror the CLI: everything emitted, validation on, TypeScript
//! sources. Validation fails fast before any graph work so a bad option
//! never produces a half-written output tree.

use std::path::PathBuf;

use crate::error::OntoError;

/// Source file globs per supported language key.
pub fn language_globs(language: &str) -> Option<&'static [&'static str]> {
    match language {
        "ts" => Some(&["**/*.ts", "**/*.tsx", "**/*.js", "**/*.jsx"]),
        _ => None,
    }
}

/// Options for one build run.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Repository root to compile.
    pub repo: PathBuf,
    /// Commit override; `None` resolves HEAD.
    pub commit: Option<String>,
    /// Language keys selecting source globs.
    pub langs: Vec<String>,
    /// Enable the Next.js rule pack, framework pass, and shapes.
    pub nextjs: bool,
    /// Output root, relative paths resolved against the repo.
    pub out_dir: PathBuf,
    pub emit_inferred: bool,
    pub emit_mount: bool,
    pub emit_meta: bool,
    pub run_validation: bool,
    /// fnmatch-style patterns over repo-relative paths.
    pub ignore: Vec<String>,
    /// External extractor script; `None` goes straight to the fallback.
    pub extractor_script: Option<PathBuf>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        BuildConfig {
            repo: PathBuf::from("."),
            commit: None,
            langs: vec!["ts".to_string()],
            nextjs: true,
            out_dir: PathBuf::from(".ontology"),
            emit_inferred: true,
            emit_mount: true,
            emit_meta: true,
            run_validation: true,
            ignore: Vec::new(),
            extractor_script: None,
        }
    }
}

impl BuildConfig {
    /// Fail-fast sanity checks; configuration errors exit with code 2.
    pub fn validate(&self) -> Result<(), OntoError> {
        if !self.repo.is_dir() {
            return Err(OntoError::config(format!(
                "repository path does not exist: {}",
                self.repo.display()
            )));
        }
        if self.langs.is_empty() {
            return Err(OntoError::config("at least one language must be selected"));
        }
        if let Some(script) = &self.extractor_script {
            if !script.is_file() {
                return Err(OntoError::config(format!(
                    "extractor script does not exist: {}",
                    script.display()
                )));
            }
        }
        Ok(())
    }

    /// Output root, anchored at the repo when relative.
    pub fn out_root(&self) -> PathBuf {
        if self.out_dir.is_absolute() {
            self.out_dir.clone()
        } else {
            self.repo.join(&self.out_dir)
        }
    }

    /// Include globs for the selected languages, sorted and deduplicated.
    /// Unsupported language keys are skipped by the caller with a warning.
    pub fn include_globs(&self) -> Vec<String> {
        let mut globs: Vec<String> = self
            .langs
            .iter()
            .filter_map(|lang| language_globs(lang))
            .flatten()
            .map(|g| g.to_string())
            .collect();
        globs.sort();
        globs.dedup();
        globs
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_emit_everything() {
        let config = BuildConfig::default();
        assert!(config.nextjs);
        assert!(config.emit_inferred && config.emit_mount && config.emit_meta);
        assert!(config.run_validation);
        assert_eq!(config.langs, vec!["ts"]);
        assert_eq!(config.out_dir, PathBuf::from(".ontology"));
    }

    #[test]
    fn missing_repo_is_a_config_error() {
        let config = BuildConfig {
            repo: PathBuf::from("/nonexistent/repo"),
            ..BuildConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.exit_code().code(), 2);
    }

    #[test]
    fn empty_langs_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig {
            repo: dir.path().to_path_buf(),
            langs: Vec::new(),
            ..BuildConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn include_globs_cover_typescript_family() {
        let config = BuildConfig::default();
        let globs = config.include_globs();
        assert!(globs.contains(&"**/*.tsx".to_string()));
        assert!(globs.contains(&"**/*.jsx".to_string()));
    }

    #[test]
    fn out_root_is_repo_relative() {
        let dir = TempDir::new().unwrap();
        let config = BuildConfig {
            repo: dir.path().to_path_buf(),
            ..BuildConfig::default()
        };
        assert_eq!(config.out_root(), dir.path().join(".ontology"));
    }
}
