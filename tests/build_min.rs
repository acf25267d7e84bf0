//! End-to-end build over a minimal Next.js fixture.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use ontograph::{run_build, BuildConfig, BuildSummary};

fn write(repo: &Path, rel: &str, content: &str) {
    let path = repo.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn fixture_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    write(
        dir.path(),
        "app/home/page.tsx",
        "'use client';\nimport { fetchData } from '../../lib/data';\n\nexport default async function Home() {\n  const data = fetchData();\n  return data;\n}\n",
    );
    write(
        dir.path(),
        "lib/data.ts",
        "export function fetchData() {\n  return 42;\n}\n",
    );
    write(
        dir.path(),
        "app/api/hello/route.ts",
        "export default function handler() {\n  return Response('hello');\n}\n",
    );
    dir
}

/// Count statements in a Turtle document written by this tool: one
/// predicate-object pair per line, terminated by " ;" or " .". Fixture
/// literals never contain either sequence.
fn turtle_statement_count(turtle: &str) -> usize {
    turtle
        .lines()
        .filter(|line| !line.starts_with("@prefix"))
        .map(|line| line.matches(" ;").count() + line.matches(" .").count())
        .sum()
}

fn build(repo: &Path) -> (BuildSummary, PathBuf) {
    let config = BuildConfig {
        repo: repo.to_path_buf(),
        commit: Some("testsha".to_string()),
        ..BuildConfig::default()
    };
    let summary = run_build(&config).unwrap();
    let commit_dir = repo.join(".ontology").join("commit").join("testsha");
    (summary, commit_dir)
}

#[test]
fn facts_shards_are_written_per_file() {
    let repo = fixture_repo();
    let (summary, commit_dir) = build(repo.path());
    assert_eq!(summary.files, 3);
    assert_eq!(summary.records, 3);

    let shard = commit_dir
        .join("facts")
        .join("files")
        .join("app__home__page.tsx.ttl");
    assert!(shard.is_file(), "expected page.tsx shard to be emitted");
    let turtle = fs::read_to_string(shard).unwrap();
    assert!(turtle.contains("a laco:SourceFile"));
    assert!(turtle.contains("laco:Callable"));
    assert!(turtle.contains("laco:isExportedDefault true"));
    // Cross-file call resolved against the sealed symbol table.
    assert!(turtle.contains("laco:calls"));
    assert!(turtle.contains("laco:defines"));
    assert!(turtle.contains("ts:hasUseClientDirective true"));
}

#[test]
fn route_patterns_are_inferred() {
    let repo = fixture_repo();
    let (_, commit_dir) = build(repo.path());
    let inferred = fs::read_to_string(commit_dir.join("inferred").join("merged.ttl")).unwrap();
    assert!(inferred.contains("\"/home\""));
    assert!(inferred.contains("\"/api/hello\""));
    assert!(inferred.contains("next:Page"));
    assert!(inferred.contains("next:APIRoute"));
}

#[test]
fn use_client_directive_is_inferred() {
    let repo = fixture_repo();
    let (_, commit_dir) = build(repo.path());
    let inferred = fs::read_to_string(commit_dir.join("inferred").join("merged.ttl")).unwrap();
    assert!(inferred.contains("next:usesClient true"));
    assert!(inferred.contains("next:ClientModule"));
}

#[test]
fn validation_conforms_on_clean_fixture() {
    let repo = fixture_repo();
    let (summary, commit_dir) = build(repo.path());
    assert_eq!(summary.conforms, Some(true));
    let report = fs::read_to_string(commit_dir.join("reports").join("shacl_report.ttl")).unwrap();
    assert!(report.contains("sh:conforms true"));
    assert!(!report.contains("sh:Violation"));
}

#[test]
fn dangling_reference_gets_a_placeholder() {
    let repo = fixture_repo();
    let (_, commit_dir) = build(repo.path());
    let shard = commit_dir
        .join("facts")
        .join("files")
        .join("app__api__hello__route.ts.ttl");
    let turtle = fs::read_to_string(shard).unwrap();
    // Response() is never declared; the occurrence targets a minted
    // dangling identity declared exactly once.
    assert!(turtle.contains("laco://sym/"));
    assert!(turtle.contains("/dangling/Response"));
}

#[test]
fn mount_manifest_indexes_every_shard() {
    let repo = fixture_repo();
    let (summary, commit_dir) = build(repo.path());
    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(commit_dir.join("mount.json")).unwrap()).unwrap();

    assert_eq!(payload["union_default_graph"], true);
    assert_eq!(payload["commit_sha"], "testsha");
    assert!(payload["facts_dir"].as_str().unwrap().ends_with("facts/files"));
    assert!(payload["prefixes"]["laco"].as_str().unwrap().ends_with("laco#"));

    let facts_dir = commit_dir.join("facts").join("files");
    let mut listed_triples = 0;
    let index = payload["graph_index"].as_array().unwrap();
    assert_eq!(index.len(), 3);
    for entry in index {
        let ttl_file = entry["ttl_file"].as_str().unwrap();
        let shard_path = facts_dir.join(ttl_file);
        assert!(shard_path.is_file(), "missing shard {}", ttl_file);
        let listed = entry["triples"].as_u64().unwrap() as usize;
        let written = turtle_statement_count(&fs::read_to_string(&shard_path).unwrap());
        assert_eq!(listed, written, "stale triple count for {}", ttl_file);
        listed_triples += listed;
    }
    // Shards can repeat statements the union deduplicates.
    assert!(listed_triples >= summary.fact_triples);

    for vocab_file in payload["vocab_files"].as_array().unwrap() {
        let relative = vocab_file.as_str().unwrap();
        assert!(relative.contains("/commit/"), "vocab not commit-scoped: {}", relative);
        assert!(repo.path().join(relative).is_file());
    }
}

#[test]
fn metadata_summarizes_the_union() {
    let repo = fixture_repo();
    let (summary, commit_dir) = build(repo.path());
    let payload: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(commit_dir.join("ontology_meta.json")).unwrap())
            .unwrap();

    let classes: Vec<&str> = payload["tbox"]["classes"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert!(classes.contains(&"laco:Callable"));
    assert!(classes.contains(&"laco:SourceFile"));

    let object_ids: Vec<&str> = payload["tbox"]["object_properties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert!(object_ids.contains(&"laco:declaredIn"));
    assert!(object_ids.contains(&"laco:calls"));
    let data_ids: Vec<&str> = payload["tbox"]["data_properties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["id"].as_str().unwrap())
        .collect();
    assert!(data_ids.contains(&"laco:qualifiedName"));
    assert!(data_ids.contains(&"dct:path"));

    for key in ["laco.ttl_sha256", "lasa.ttl_sha256", "next.ttl_sha256"] {
        assert_eq!(payload["vocabulary_versions"][key].as_str().unwrap().len(), 64);
    }
    assert_eq!(payload["rules_core_sha"].as_str().unwrap().len(), 64);

    let rule_packs = payload["rbox"]["rule_packs"].as_array().unwrap();
    assert!(!rule_packs.is_empty());

    let union_triples = payload["stats"]["union_triples"].as_u64().unwrap() as usize;
    assert!(union_triples >= summary.fact_triples);
    assert_eq!(payload["shacl"]["conforms"], true);
}

#[test]
fn disabling_mount_and_meta_skips_artifacts() {
    let repo = fixture_repo();
    let config = BuildConfig {
        repo: repo.path().to_path_buf(),
        commit: Some("testsha".to_string()),
        emit_mount: false,
        emit_meta: false,
        ..BuildConfig::default()
    };
    run_build(&config).unwrap();
    let commit_dir = repo.path().join(".ontology").join("commit").join("testsha");
    assert!(!commit_dir.join("mount.json").exists());
    assert!(!commit_dir.join("ontology_meta.json").exists());
    // Facts and report are still produced.
    assert!(commit_dir.join("reports").join("shacl_report.ttl").is_file());
}

#[test]
fn ignore_patterns_exclude_sources() {
    let repo = fixture_repo();
    write(
        repo.path(),
        "node_modules/pkg/index.ts",
        "export function hidden() {}\n",
    );
    let config = BuildConfig {
        repo: repo.path().to_path_buf(),
        commit: Some("testsha".to_string()),
        ignore: vec!["node_modules/*".to_string()],
        ..BuildConfig::default()
    };
    let summary = run_build(&config).unwrap();
    assert_eq!(summary.files, 3);
}

#[test]
fn builds_are_reproducible() {
    let repo_a = fixture_repo();
    let repo_b = fixture_repo();
    let (_, commit_a) = build(repo_a.path());
    let (_, commit_b) = build(repo_b.path());
    // Same content at distinct roots, but repo directory names differ, so
    // compare a shard pair that only embeds repo-relative identity.
    let shard = |dir: &Path| {
        fs::read_to_string(dir.join("inferred").join("merged.ttl")).unwrap()
    };
    let a = shard(&commit_a);
    let b = shard(&commit_b);
    let scrub = |text: &str, name: &str| text.replace(name, "REPO");
    let name_a = repo_a.path().file_name().unwrap().to_string_lossy().to_string();
    let name_b = repo_b.path().file_name().unwrap().to_string_lossy().to_string();
    assert_eq!(scrub(&a, &name_a), scrub(&b, &name_b));
}
