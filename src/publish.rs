//! Artifact publishing: shards, merged inference, manifests, metadata.
//!
//! Everything lands under the commit-scoped directory
//! `{out_root}/commit/{sha}/`. Serialization is deterministic apart from
//! the `created_at` and rule-pack timestamps.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::OntoError;
use crate::graph::{Graph, Literal, Term};
use crate::rules::PackEvent;
use crate::vocab;

/// One shard in the manifest's graph index.
#[derive(Debug, Clone, Serialize)]
pub struct ShardEntry {
    pub ttl_file: String,
    pub source_path: String,
    pub graph_iri: String,
    pub triples: usize,
}

/// Write a graph as Turtle, creating parent directories.
pub fn write_graph(graph: &Graph, path: &Path) -> Result<(), OntoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, graph.to_turtle())?;
    debug!("wrote {} statements to {}", graph.len(), path.display());
    Ok(())
}

fn write_json(path: &Path, payload: &serde_json::Value) -> Result<(), OntoError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(payload)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

/// Publish the embedded vocabulary and rule assets: vocabulary both at the
/// output root (shared across commits) and inside the commit directory,
/// rule packs inside the commit directory only.
pub fn publish_static_assets(out_root: &Path, commit_dir: &Path) -> Result<(), OntoError> {
    for target in [out_root.join("vocab"), commit_dir.join("vocab")] {
        fs::create_dir_all(&target)?;
        for (name, content) in vocab::VOCAB_ASSETS {
            fs::write(target.join(name), content)?;
        }
    }
    let rules_dir = commit_dir.join("rules");
    fs::create_dir_all(&rules_dir)?;
    fs::write(rules_dir.join("rules-core.rq"), vocab::RULES_CORE)?;
    fs::write(rules_dir.join("rules-next.rq"), vocab::RULES_NEXT)?;
    Ok(())
}

fn relative_to_repo(repo: &Path, target: &Path) -> String {
    target
        .strip_prefix(repo)
        .unwrap_or(target)
        .to_string_lossy()
        .replace('\\', "/")
}

fn now_utc_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

// ============================================================================
// mount.json
// ============================================================================

pub struct MountInputs<'a> {
    pub repo: &'a Path,
    pub repo_name: &'a str,
    pub commit_dir: &'a Path,
    pub commit_sha: &'a str,
    pub graph_index: &'a [ShardEntry],
    pub facts: &'a Graph,
}

/// Write the dataset manifest. Skipped when no shard was produced.
pub fn write_mount(inputs: &MountInputs<'_>) -> Result<Option<PathBuf>, OntoError> {
    if inputs.graph_index.is_empty() {
        return Ok(None);
    }
    let facts_dir = inputs.commit_dir.join("facts").join("files");
    let inferred_file = inputs.commit_dir.join("inferred").join("merged.ttl");
    let vocab_dir = inputs.commit_dir.join("vocab");

    let vocab_files: Vec<String> = vocab::VOCAB_ASSETS
        .iter()
        .map(|(name, _)| relative_to_repo(inputs.repo, &vocab_dir.join(name)))
        .collect();

    let mut graph_index: Vec<&ShardEntry> = inputs.graph_index.iter().collect();
    graph_index.sort_by(|a, b| a.ttl_file.cmp(&b.ttl_file));

    let payload = json!({
        "dataset_id": format!("ontograph:{}@{}", inputs.repo_name, inputs.commit_sha),
        "commit_sha": inputs.commit_sha,
        "created_at": now_utc_iso(),
        "union_default_graph": true,
        "facts_dir": relative_to_repo(inputs.repo, &facts_dir),
        "inferred_file": relative_to_repo(inputs.repo, &inferred_file),
        "vocab_files": vocab_files,
        "prefixes": inputs.facts.prefixes(),
        "graph_index": graph_index,
        "notes": "Load vocab + all shards + inferred into a single dataset; treat default graph as UNION.",
    });

    let path = inputs.commit_dir.join("mount.json");
    write_json(&path, &payload)?;
    Ok(Some(path))
}

// ============================================================================
// ontology_meta.json
// ============================================================================

pub struct MetaInputs<'a> {
    pub commit_dir: &'a Path,
    pub facts: &'a Graph,
    pub inferred: &'a Graph,
    pub events: &'a [PackEvent],
    /// `None` when validation was skipped.
    pub conforms: Option<bool>,
}

/// Write the metadata summary over the union of facts and inferred.
pub fn write_meta(inputs: &MetaInputs<'_>) -> Result<PathBuf, OntoError> {
    let mut combined = inputs.facts.clone();
    combined.extend_from(inputs.inferred);

    let payload = json!({
        "tbox": {
            "classes": class_rows(&combined),
            "object_properties": property_rows(&combined, vocab::PropertyKind::Object),
            "data_properties": property_rows(&combined, vocab::PropertyKind::Data),
        },
        "rbox": {
            "rule_packs": inputs.events.iter().map(|event| json!({
                "name": event.name,
                "rules": event.rules,
                "produced": event.produced,
                "applied_at": event.completed_at,
            })).collect::<Vec<_>>(),
        },
        "histograms": {
            "capabilities": instance_count(&combined, "Capability"),
            "qualities": instance_count(&combined, "Quality"),
            "roles": instance_count(&combined, "Role"),
        },
        "stats": {
            "facts_triples": inputs.facts.len(),
            "inferred_triples": inputs.inferred.len(),
            "union_triples": combined.len(),
        },
        "shacl": inputs.conforms.map(|conforms| json!({
            "conforms": conforms,
            "report_file": "reports/shacl_report.ttl",
        })),
        "vocabulary_versions": vocabulary_versions(),
        "rules_core_sha": sha256_hex(vocab::RULES_CORE),
        "rules_next_sha": sha256_hex(vocab::RULES_NEXT),
        "version": env!("CARGO_PKG_VERSION"),
    });

    let path = inputs.commit_dir.join("ontology_meta.json");
    write_json(&path, &payload)?;
    Ok(path)
}

fn local_name(iri: &str) -> &str {
    iri.rsplit(['#', '/']).next().unwrap_or(iri)
}

fn class_rows(combined: &Graph) -> Vec<serde_json::Value> {
    let rdf_type = Term::iri(vocab::RDF_TYPE);
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for triple in combined.matching(None, Some(&rdf_type), None) {
        if let Some(class) = triple.object.as_iri() {
            *counts.entry(class.to_string()).or_default() += 1;
        }
    }
    let mut rows: Vec<(String, String, usize)> = counts
        .into_iter()
        .map(|(iri, count)| {
            (
                combined.compact(&iri),
                local_name(&iri).to_string(),
                count,
            )
        })
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    rows.into_iter()
        .map(|(id, label, count)| json!({ "id": id, "label": label, "count": count }))
        .collect()
}

fn property_rows(combined: &Graph, kind: vocab::PropertyKind) -> Vec<serde_json::Value> {
    // Predicates are classified by their observed object terms: a predicate
    // ever seen with a literal object is a data property.
    let mut observed: BTreeMap<String, bool> = BTreeMap::new();
    for triple in combined.iter() {
        if let Some(predicate) = triple.predicate.as_iri() {
            if predicate == vocab::RDF_TYPE {
                continue;
            }
            let is_data = matches!(triple.object, Term::Literal(_));
            *observed.entry(predicate.to_string()).or_insert(is_data) |= is_data;
        }
    }

    let mut rows = Vec::new();
    for (iri, is_data) in observed {
        let observed_kind = if is_data {
            vocab::PropertyKind::Data
        } else {
            vocab::PropertyKind::Object
        };
        if observed_kind != kind {
            continue;
        }
        let mut row = serde_json::Map::new();
        row.insert("id".to_string(), json!(combined.compact(&iri)));
        if let Some(spec) = vocab::property_spec(&iri) {
            if let Some(domain) = spec.domain {
                let key = if is_data { "on" } else { "domain" };
                row.insert(key.to_string(), json!(domain));
            }
            if let Some(range) = spec.range {
                row.insert("range".to_string(), json!(range));
            }
        } else if is_data {
            if let Some(range) = observed_literal_range(combined, &iri) {
                row.insert("range".to_string(), json!(range));
            }
        }
        rows.push(serde_json::Value::Object(row));
    }
    rows
}

fn observed_literal_range(combined: &Graph, predicate_iri: &str) -> Option<&'static str> {
    let predicate = Term::iri(predicate_iri);
    combined
        .matching(None, Some(&predicate), None)
        .find_map(|triple| match &triple.object {
            Term::Literal(Literal::Str(_)) => Some("xsd:string"),
            Term::Literal(Literal::Int(_)) => Some("xsd:integer"),
            Term::Literal(Literal::Bool(_)) => Some("xsd:boolean"),
            _ => None,
        })
}

fn instance_count(combined: &Graph, lasa_class: &str) -> usize {
    let rdf_type = Term::iri(vocab::RDF_TYPE);
    let class = vocab::lasa(lasa_class);
    combined.subjects_with(&rdf_type, &class).len()
}

fn sha256_hex(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

fn vocabulary_versions() -> BTreeMap<String, String> {
    vocab::VOCAB_ASSETS
        .iter()
        .map(|(name, content)| (format!("{}_sha256", name), sha256_hex(content)))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
