//! Compilation driver: one sequential pipeline per build.
//!
//! Commit resolution, file collection, extraction, the two-phase symbol
//! registration, per-file mapping into shards, the rule pipeline, shape
//! validation, and publishing run in a fixed order. The base fact graph is
//! append-only during mapping and immutable afterwards; inference works on
//! its own copy.

use std::path::{Path, PathBuf};

use regex::Regex;
use tracing::{error, info, warn};
use walkdir::WalkDir;

use crate::config::{language_globs, BuildConfig};
use crate::error::OntoError;
use crate::extract::extract_with_fallback;
use crate::git;
use crate::graph::Graph;
use crate::ids;
use crate::mapper::{map_record, MapContext};
use crate::nextjs::NextJsPass;
use crate::publish::{self, MetaInputs, MountInputs, ShardEntry};
use crate::resolver::SymbolTableBuilder;
use crate::rules::{run_rule_packs, PackEvent, RulePack, RuleStage};
use crate::validate::{core_shapes, nextjs_shapes, validate};
use crate::vocab;

/// Outcome of one build, for logging and the CLI.
#[derive(Debug)]
pub struct BuildSummary {
    pub commit_sha: String,
    pub commit_dir: PathBuf,
    pub files: usize,
    pub records: usize,
    pub fact_triples: usize,
    pub inferred_triples: usize,
    pub conforms: Option<bool>,
}

/// Run the full pipeline for one repository.
pub fn run_build(config: &BuildConfig) -> Result<BuildSummary, OntoError> {
    config.validate()?;

    let repo = &config.repo;
    let repo_name = repo
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| OntoError::config("repository path has no final component"))?;
    let commit_sha = match &config.commit {
        Some(sha) => sha.clone(),
        None => git::rev_parse_head(repo)?,
    };
    info!("building {} at commit {}", repo_name, commit_sha);

    let out_root = config.out_root();
    let commit_dir = out_root.join("commit").join(&commit_sha);
    let facts_dir = commit_dir.join("facts").join("files");
    std::fs::create_dir_all(&facts_dir)?;
    std::fs::create_dir_all(commit_dir.join("inferred"))?;
    std::fs::create_dir_all(commit_dir.join("reports"))?;
    publish::publish_static_assets(&out_root, &commit_dir)?;

    // File collection
    let files = collect_language_files(repo, &config.langs, &config.ignore, &out_root);
    if files.is_empty() {
        warn!("no source files matched the requested languages");
        return Ok(BuildSummary {
            commit_sha,
            commit_dir,
            files: 0,
            records: 0,
            fact_triples: 0,
            inferred_triples: 0,
            conforms: None,
        });
    }
    info!("collected {} source files", files.len());

    // Extraction
    let include_globs = config.include_globs();
    let records = extract_with_fallback(
        repo,
        &files,
        config.extractor_script.as_deref(),
        &include_globs,
        &config.ignore,
    )
    .map_err(|e| OntoError::no_facts(e.to_string()))?;
    if records.is_empty() {
        return Err(OntoError::no_facts(format!(
            "{} files yielded no fact records",
            files.len()
        )));
    }

    // Registration pass, then seal: mapping never starts before every
    // file's units are registered.
    let mut builder = SymbolTableBuilder::new(&repo_name, &commit_sha);
    for record in &records {
        builder.register_record(record);
    }
    let symbols = builder.seal();
    let ctx = MapContext::new(&symbols);

    // Mapping: one shard per file, union accumulated alongside
    let mut facts = Graph::new();
    vocab::bind_fact_prefixes(&mut facts);
    let mut graph_index: Vec<ShardEntry> = Vec::new();
    for record in &records {
        let shard = map_record(record, &ctx);
        facts.extend_from(&shard);
        if record.file_path.is_empty() {
            continue;
        }
        let flattened = ids::flatten_relative_path(&record.file_path);
        let shard_name = format!("{}.ttl", flattened);
        publish::write_graph(&shard, &facts_dir.join(&shard_name))?;
        graph_index.push(ShardEntry {
            ttl_file: shard_name,
            source_path: ids::normalize_relative(&record.file_path),
            graph_iri: ids::file_iri(&repo_name, &commit_sha, &record.file_path)
                .as_iri()
                .unwrap_or_default()
                .to_string(),
            triples: shard.len(),
        });
    }
    info!("mapped {} records into {} statements", records.len(), facts.len());

    // Rule pipeline: declarative packs first, framework derivation last
    let mut events: Vec<PackEvent> = Vec::new();
    let mut inferred = Graph::new();
    if config.emit_inferred {
        let mut sources = vec![("rules-core", vocab::RULES_CORE)];
        if config.nextjs {
            sources.push(("rules-next", vocab::RULES_NEXT));
        }
        let packs = parse_packs(&sources);
        let framework = NextJsPass;
        let mut stages: Vec<RuleStage<'_>> = packs.iter().map(RuleStage::Pack).collect();
        if config.nextjs {
            stages.push(RuleStage::Framework(&framework));
        }
        inferred = run_rule_packs(&facts, &stages, &mut events);
        if !inferred.is_empty() {
            publish::write_graph(&inferred, &commit_dir.join("inferred").join("merged.ttl"))?;
        }
    }

    // Validation: report always written, non-conformance never fatal
    let mut conforms = None;
    if config.run_validation {
        let mut data = facts.clone();
        data.extend_from(&inferred);
        let mut shapes = core_shapes();
        if config.nextjs {
            shapes.extend(nextjs_shapes());
        }
        let outcome = validate(&data, &shapes);
        info!(
            "shape validation {}",
            if outcome.conforms { "passed" } else { "failed" }
        );
        publish::write_graph(
            &outcome.report,
            &commit_dir.join("reports").join("shacl_report.ttl"),
        )?;
        conforms = Some(outcome.conforms);
    }

    if config.emit_mount {
        publish::write_mount(&MountInputs {
            repo,
            repo_name: &repo_name,
            commit_dir: &commit_dir,
            commit_sha: &commit_sha,
            graph_index: &graph_index,
            facts: &facts,
        })?;
    }
    if config.emit_meta {
        publish::write_meta(&MetaInputs {
            commit_dir: &commit_dir,
            facts: &facts,
            inferred: &inferred,
            events: &events,
            conforms,
        })?;
    }

    info!("build complete; results written to {}", commit_dir.display());
    Ok(BuildSummary {
        commit_sha,
        commit_dir,
        files: files.len(),
        records: records.len(),
        fact_triples: facts.len(),
        inferred_triples: inferred.len(),
        conforms,
    })
}

// ============================================================================
// Rule pack loading
// ============================================================================

/// Parse rule pack sources, dropping any pack that fails to parse. A bad
/// pack never takes down the build or its neighbors.
fn parse_packs(sources: &[(&str, &str)]) -> Vec<RulePack> {
    let mut packs = Vec::new();
    for (name, text) in sources {
        match RulePack::parse(name, text) {
            Ok(pack) => packs.push(pack),
            Err(err) => error!("skipping malformed rule pack {}: {}", name, err),
        }
    }
    packs
}

// ============================================================================
// File collection
// ============================================================================

/// Select repo files for the requested languages, minus ignore patterns.
/// Sorted and deduplicated; the output tree and `.git` are never walked.
pub fn collect_language_files(
    repo: &Path,
    langs: &[String],
    ignore: &[String],
    out_root: &Path,
) -> Vec<PathBuf> {
    let mut extensions: Vec<String> = Vec::new();
    for lang in langs {
        match language_globs(lang) {
            Some(globs) => {
                for glob in globs {
                    if let Some(ext) = glob.rsplit('.').next() {
                        extensions.push(ext.to_string());
                    }
                }
            }
            None => warn!("unsupported language '{}' requested; skipping", lang),
        }
    }
    let matchers: Vec<Regex> = ignore.iter().filter_map(|p| fnmatch_regex(p)).collect();

    let mut selected: Vec<PathBuf> = Vec::new();
    let walker = WalkDir::new(repo).into_iter().filter_entry(|entry| {
        entry.file_name() != ".git" && entry.path() != out_root
    });
    for entry in walker.filter_map(Result::ok) {
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            continue;
        };
        if !extensions.iter().any(|known| known == ext) {
            continue;
        }
        let rel = path
            .strip_prefix(repo)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/");
        if matchers.iter().any(|m| m.is_match(&rel)) {
            continue;
        }
        selected.push(path.to_path_buf());
    }
    selected.sort();
    selected.dedup();
    selected
}

/// Translate an fnmatch-style pattern into an anchored regex. `*` crosses
/// path separators, matching the manifest-side matcher semantics.
fn fnmatch_regex(pattern: &str) -> Option<Regex> {
    let mut expr = String::from("^");
    for c in pattern.chars() {
        match c {
            '*' => expr.push_str(".*"),
            '?' => expr.push('.'),
            other => expr.push_str(&regex::escape(&other.to_string())),
        }
    }
    expr.push('$');
    Regex::new(&expr).ok()
}

// ============================================================================
// Tests
// ============================================================================
