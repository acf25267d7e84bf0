//! In-process fallback analyzer.
//!
//! A deliberately small regex-based scanner that keeps builds working when
//! the Node extractor is unavailable. It is a degraded source of the same
//! raw fact record schema: function declarations, line imports, default
//! exports, the use-client directive, and call occurrences from the
//! default-exported unit. Results are limited compared to the external
//! extractor and that is fine.
//!
//! Two passes: unit scanning over every file builds a cross-file
//! qualified-name index, then occurrence collection resolves callees
//! against it, so forward references across files resolve.

use std::fs;
use std::path::{Component, Path, PathBuf};

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::record::{
    ExportRecord, FileRecord, ImportRecord, ImportResolution, OccurrenceRecord, Relation, Span,
    UnitKind, UnitRecord,
};

use super::{ExtractError, FactSource};

const SOURCE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Degraded in-process fact source.
pub struct FallbackAnalyzer {
    repo: PathBuf,
}

impl FallbackAnalyzer {
    pub fn new(repo: &Path) -> Self {
        FallbackAnalyzer {
            repo: repo.to_path_buf(),
        }
    }
}

impl FactSource for FallbackAnalyzer {
    fn name(&self) -> &'static str {
        "fallback"
    }

    fn extract(&self, files: &[PathBuf]) -> Result<Vec<FileRecord>, ExtractError> {
        warn!("using simplified fallback analyzer; results may be limited");
        let mut scan = Scan::new(&self.repo);
        for path in files {
            scan.scan_units(path);
        }
        scan.collect_occurrences();
        Ok(scan.into_records())
    }
}

// ============================================================================
// Scanner
// ============================================================================

struct Scan<'a> {
    repo: &'a Path,
    function_re: Regex,
    import_re: Regex,
    call_re: Regex,
    /// Qualified name -> symbol id, in scan order (first match wins).
    symbol_index: Vec<(String, String)>,
    files: Vec<(String, String, FileRecord)>,
}

impl<'a> Scan<'a> {
    fn new(repo: &'a Path) -> Self {
        Scan {
            repo,
            function_re: Regex::new(
                r"(?m)(?:export\s+(?P<default>default\s+)?)?(?P<async>async\s+)?function\s+(?P<name>[A-Za-z0-9_]+)?",
            )
            .expect("function regex"),
            import_re: Regex::new(r#"(?m)^import\s+[^;]+from\s+['"]([^'"]+)['"]"#)
                .expect("import regex"),
            call_re: Regex::new(r"([A-Za-z0-9_]+)\s*\(").expect("call regex"),
            symbol_index: Vec::new(),
            files: Vec::new(),
        }
    }

    fn scan_units(&mut self, path: &Path) {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) => {
                warn!("skipping unreadable file {}: {}", path.display(), err);
                return;
            }
        };
        let rel = relative_posix(self.repo, path);
        let module = module_name(&rel);

        let mut units = Vec::new();
        for captures in self.function_re.captures_iter(&text) {
            let whole = captures.get(0).expect("match");
            let is_default = captures.name("default").is_some();
            let name = match captures.name("name") {
                Some(m) => m.as_str().to_string(),
                None if is_default => "default".to_string(),
                None => "anonymous".to_string(),
            };
            let qualified = format!("{}.{}", module, name);
            let symbol = symbol_id("callable", &qualified);
            units.push(UnitRecord {
                kind: UnitKind::Callable,
                name,
                qualified_name: Some(qualified.clone()),
                symbol_id: Some(symbol.clone()),
                span: Some(span_for(&text, whole.start())),
                ast_path: Some("Fallback/Function".to_string()),
                is_exported_default: is_default,
                is_async: captures.name("async").is_some(),
            });
            if !self.symbol_index.iter().any(|(q, _)| q == &qualified) {
                self.symbol_index.push((qualified, symbol));
            }
        }

        let exports = units
            .iter()
            .filter(|u| u.is_exported_default)
            .map(|u| ExportRecord {
                name: "default".to_string(),
                unit_symbol_id: u.symbol_id.clone(),
            })
            .collect();

        let record = FileRecord {
            file_path: rel.clone(),
            sha256: sha256_hex(text.as_bytes()),
            units,
            imports: self.collect_imports(path, &text),
            exports,
            occurrences: Vec::new(),
            has_use_client_directive: has_use_client(&text),
        };
        self.files.push((rel, text, record));
    }

    fn collect_imports(&self, path: &Path, text: &str) -> Vec<ImportRecord> {
        let directory = path.parent().unwrap_or(self.repo);
        let mut imports = Vec::new();
        for captures in self.import_re.captures_iter(text) {
            let spec = captures.get(1).expect("import spec").as_str();
            let mut record = ImportRecord {
                from: spec.to_string(),
                resolved_kind: ImportResolution::Unknown,
                resolved: None,
            };
            if spec.starts_with('.') {
                let target = normalize_path(&directory.join(spec));
                for ext in SOURCE_EXTENSIONS {
                    let candidate = target.with_extension(ext);
                    if candidate.is_file() {
                        record.resolved_kind = ImportResolution::File;
                        record.resolved = Some(relative_posix(self.repo, &candidate));
                        break;
                    }
                }
            } else {
                record.resolved_kind = ImportResolution::Package;
                record.resolved = Some(spec.to_string());
            }
            imports.push(record);
        }
        imports
    }

    fn collect_occurrences(&mut self) {
        for (_, text, record) in &mut self.files {
            let Some(subject_symbol) = record
                .units
                .iter()
                .find(|u| u.is_exported_default)
                .and_then(|u| u.symbol_id.clone())
            else {
                continue;
            };
            let mut occurrences = Vec::new();
            for captures in self.call_re.captures_iter(text) {
                let callee_match = captures.get(1).expect("callee");
                let callee = callee_match.as_str();
                if callee == "function" {
                    continue;
                }
                let suffix = format!(".{}", callee);
                let resolved = self
                    .symbol_index
                    .iter()
                    .find(|(qname, _)| qname.ends_with(&suffix));
                let (qualified, object_symbol) = match resolved {
                    Some((qname, symbol)) => (qname.clone(), Some(symbol.clone())),
                    None => (callee.to_string(), None),
                };
                occurrences.push(OccurrenceRecord {
                    relation: Relation::Calls,
                    subject_symbol_id: Some(subject_symbol.clone()),
                    object_symbol_id: object_symbol,
                    object_q_name: Some(qualified),
                    span: Some(span_for(text, callee_match.start())),
                });
            }
            record.occurrences = occurrences;
        }
    }

    fn into_records(self) -> Vec<FileRecord> {
        self.files.into_iter().map(|(_, _, record)| record).collect()
    }
}

// ============================================================================
// Helpers
// ============================================================================

fn relative_posix(repo: &Path, path: &Path) -> String {
    path.strip_prefix(repo)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn module_name(relative: &str) -> String {
    let stem = match relative.rfind('.') {
        Some(idx) => &relative[..idx],
        None => relative,
    };
    stem.replace('/', ".")
}

fn symbol_id(kind: &str, qualified_name: &str) -> String {
    URL_SAFE_NO_PAD.encode(format!("ts:{}:{}", kind, qualified_name))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn span_for(text: &str, offset: usize) -> Span {
    let before = &text[..offset];
    let line = before.matches('\n').count() as i64 + 1;
    let col = match before.rfind('\n') {
        Some(last_newline) => (offset - last_newline) as i64,
        None => offset as i64 + 1,
    };
    Span {
        start_line: line,
        start_col: col,
        end_line: line,
        end_col: col + 1,
    }
}

fn has_use_client(text: &str) -> bool {
    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        return matches!(
            stripped,
            "'use client';" | "\"use client\";" | "'use client'" | "\"use client\""
        );
    }
    false
}

/// Resolve `.` and `..` components without touching the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(repo: &Path, rel: &str, content: &str) -> PathBuf {
        let path = repo.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn extract(repo: &Path, files: &[PathBuf]) -> Vec<FileRecord> {
        FallbackAnalyzer::new(repo).extract(files).unwrap()
    }

    #[test]
    fn scans_default_exported_async_function() {
        let dir = TempDir::new().unwrap();
        let page = write(
            dir.path(),
            "app/home/page.tsx",
            "export default async function Home() {\n  return null;\n}\n",
        );
        let records = extract(dir.path(), &[page]);
        assert_eq!(records.len(), 1);
        let unit = &records[0].units[0];
        assert_eq!(unit.name, "Home");
        assert_eq!(unit.qualified_name.as_deref(), Some("app.home.page.Home"));
        assert!(unit.is_exported_default);
        assert!(unit.is_async);
        assert_eq!(records[0].exports.len(), 1);
        assert_eq!(records[0].sha256.len(), 64);
    }

    #[test]
    fn symbol_ids_are_deterministic() {
        assert_eq!(
            symbol_id("callable", "lib.data.fetchData"),
            symbol_id("callable", "lib.data.fetchData")
        );
        assert_ne!(
            symbol_id("callable", "a.f"),
            symbol_id("callable", "a.g")
        );
    }

    #[test]
    fn classifies_imports() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "lib/data.ts", "export function fetchData() {}\n");
        let page = write(
            dir.path(),
            "app/page.tsx",
            "import { fetchData } from '../lib/data';\nimport React from 'react';\nexport default function P() {}\n",
        );
        let records = extract(dir.path(), &[page]);
        let imports = &records[0].imports;
        assert_eq!(imports[0].resolved_kind, ImportResolution::File);
        assert_eq!(imports[0].resolved.as_deref(), Some("lib/data.ts"));
        assert_eq!(imports[1].resolved_kind, ImportResolution::Package);
    }

    #[test]
    fn detects_use_client_on_first_nonempty_line() {
        assert!(has_use_client("'use client';\nexport default function A() {}\n"));
        assert!(!has_use_client("// comment\n'use client';\n"));
        assert!(!has_use_client("export default function A() {}\n"));
    }

    #[test]
    fn occurrences_resolve_across_files() {
        let dir = TempDir::new().unwrap();
        let page = write(
            dir.path(),
            "app/page.tsx",
            "export default function P() {\n  const d = fetchData();\n  return d;\n}\n",
        );
        let lib = write(dir.path(), "lib/data.ts", "export function fetchData() {}\n");
        // The callee's declaring file comes later in the list; the two-pass
        // scan still resolves it.
        let records = extract(dir.path(), &[page, lib]);
        let occurrence = records[0]
            .occurrences
            .iter()
            .find(|o| o.object_q_name.as_deref() == Some("lib.data.fetchData"))
            .expect("resolved call occurrence");
        assert!(occurrence.object_symbol_id.is_some());
        assert_eq!(occurrence.relation, Relation::Calls);
    }

    #[test]
    fn unresolved_callee_keeps_bare_name() {
        let dir = TempDir::new().unwrap();
        let page = write(
            dir.path(),
            "app/api/hello/route.ts",
            "export default function handler() {\n  return new Response('hello');\n}\n",
        );
        let records = extract(dir.path(), &[page]);
        let occurrence = records[0]
            .occurrences
            .iter()
            .find(|o| o.object_q_name.as_deref() == Some("Response"))
            .expect("unresolved call occurrence");
        assert!(occurrence.object_symbol_id.is_none());
    }
}
