//! Fact mapper: one raw file record to that file's graph statements.
//!
//! Mapping is deterministic given identical inputs and symbol table state.
//! Drops are local and silent-but-logged: an export whose target does not
//! resolve is skipped, and an occurrence whose subject does not resolve is
//! dropped whole. Nothing here aborts a build.

use tracing::debug;

use crate::graph::{BlankIdGen, Graph, Term};
use crate::ids;
use crate::record::{FileRecord, ImportResolution, Span};
use crate::resolver::SymbolTable;
use crate::vocab;

// ============================================================================
// Context
// ============================================================================

/// Build-wide context passed to every mapping call.
pub struct MapContext<'a> {
    pub repo_name: &'a str,
    pub commit_sha: &'a str,
    pub commit_iri: Term,
    pub symbols: &'a SymbolTable,
}

impl<'a> MapContext<'a> {
    pub fn new(symbols: &'a SymbolTable) -> Self {
        let repo_name = symbols.repo_name();
        let commit_sha = symbols.commit_sha();
        MapContext {
            repo_name,
            commit_sha,
            commit_iri: ids::commit_iri(repo_name, commit_sha),
            symbols,
        }
    }

    fn file_iri(&self, relative_path: &str) -> Term {
        ids::file_iri(self.repo_name, self.commit_sha, relative_path)
    }
}

// ============================================================================
// Mapping
// ============================================================================

fn add_span(graph: &mut Graph, parent: &Term, span: &Span, blanks: &mut BlankIdGen) {
    let node = blanks.fresh();
    graph.add(parent.clone(), vocab::laco("span"), node.clone());
    graph.add(node.clone(), vocab::laco("startLine"), Term::int(span.start_line));
    graph.add(node.clone(), vocab::laco("endLine"), Term::int(span.end_line));
    graph.add(node.clone(), vocab::laco("startCol"), Term::int(span.start_col));
    graph.add(node, vocab::laco("endCol"), Term::int(span.end_col));
}

/// Map one file's raw record into its full statement set.
pub fn map_record(record: &FileRecord, ctx: &MapContext<'_>) -> Graph {
    let mut graph = Graph::new();
    vocab::bind_fact_prefixes(&mut graph);

    let relative_path = ids::normalize_relative(&record.file_path);
    let file = ctx.file_iri(&relative_path);
    let mut blanks = BlankIdGen::new(&ids::flatten_relative_path(&relative_path));

    graph.add(file.clone(), vocab::rdf_type(), vocab::laco("SourceFile"));
    graph.add(file.clone(), vocab::dct("path"), Term::lit(&relative_path));
    graph.add(file.clone(), vocab::laco("sha256"), Term::lit(&record.sha256));
    graph.add(file.clone(), vocab::laco("atCommit"), ctx.commit_iri.clone());

    if record.has_use_client_directive {
        graph.add(
            file.clone(),
            vocab::ts("hasUseClientDirective"),
            Term::boolean(true),
        );
    }

    // Declared units.
    for unit in &record.units {
        let (symbol_id, qualified_name) = match (
            unit.symbol_id.as_deref(),
            unit.qualified_name.as_deref(),
        ) {
            (Some(s), Some(q)) if !s.is_empty() && !q.is_empty() => (s, q),
            _ => continue,
        };
        let unit_iri = ids::unit_iri(ctx.repo_name, ctx.commit_sha, symbol_id);
        graph.add(unit_iri.clone(), vocab::rdf_type(), vocab::unit_type_for(&unit.kind));
        graph.add(unit_iri.clone(), vocab::laco("declaredIn"), file.clone());
        graph.add(
            unit_iri.clone(),
            vocab::laco("qualifiedName"),
            Term::lit(qualified_name),
        );
        graph.add(unit_iri.clone(), vocab::laco("symbolId"), Term::lit(symbol_id));
        graph.add(unit_iri.clone(), vocab::laco("atCommit"), ctx.commit_iri.clone());
        if let Some(ast_path) = unit.ast_path.as_deref() {
            if !ast_path.is_empty() {
                graph.add(unit_iri.clone(), vocab::laco("astPath"), Term::lit(ast_path));
            }
        }
        if let Some(span) = &unit.span {
            add_span(&mut graph, &unit_iri, span, &mut blanks);
        }
        if unit.is_exported_default {
            graph.add(
                unit_iri.clone(),
                vocab::laco("isExportedDefault"),
                Term::boolean(true),
            );
        }
        if unit.is_async {
            graph.add(unit_iri.clone(), vocab::ts("isAsync"), Term::boolean(true));
        }
        graph.add(file.clone(), vocab::laco("defines"), unit_iri);
    }

    // Imports: package, intra-repo file, or unresolved external.
    for import in &record.imports {
        if import.from.is_empty() {
            continue;
        }
        match import.resolved_kind {
            ImportResolution::Package => {
                let package = ids::package_iri(&import.from);
                graph.add(package.clone(), vocab::rdf_type(), vocab::laco("Package"));
                graph.add(package.clone(), vocab::dct("title"), Term::lit(&import.from));
                graph.add(file.clone(), vocab::laco("importsFrom"), package);
            }
            ImportResolution::File => match import.resolved.as_deref() {
                Some(resolved) if !resolved.is_empty() => {
                    let target = ctx.file_iri(&ids::normalize_relative(resolved));
                    graph.add(file.clone(), vocab::laco("importsFrom"), target);
                }
                _ => {
                    let target = ids::external_iri(&import.from);
                    graph.add(file.clone(), vocab::laco("importsFrom"), target);
                }
            },
            ImportResolution::Unknown => {
                let target = ids::external_iri(&import.from);
                graph.add(file.clone(), vocab::laco("importsFrom"), target);
            }
        }
    }

    // Exports naming local units; unresolvable targets are dropped.
    for export in &record.exports {
        let Some(symbol_id) = export.unit_symbol_id.as_deref() else {
            continue;
        };
        match ctx.symbols.resolve_symbol(symbol_id) {
            Some(unit_iri) => {
                graph.add(file.clone(), vocab::laco("exports"), unit_iri);
            }
            None => {
                debug!(
                    "dropping export '{}' in {}: symbol '{}' not registered",
                    export.name, relative_path, symbol_id
                );
            }
        }
    }

    // Occurrences.
    for occurrence in &record.occurrences {
        let Some(subject) = occurrence
            .subject_symbol_id
            .as_deref()
            .and_then(|id| ctx.symbols.resolve_symbol(id))
        else {
            debug!(
                "dropping occurrence in {}: unresolvable subject {:?}",
                relative_path, occurrence.subject_symbol_id
            );
            continue;
        };

        let mut object = occurrence
            .object_symbol_id
            .as_deref()
            .and_then(|id| ctx.symbols.resolve_symbol(id));
        if object.is_none() {
            if let Some(qname) = occurrence.object_q_name.as_deref() {
                if !qname.is_empty() {
                    let (iri, created) = ctx.symbols.resolve_or_create_dangling(qname);
                    if created {
                        // Placeholder declared exactly once per qualified name.
                        graph.add(iri.clone(), vocab::rdf_type(), vocab::laco("Unit"));
                        graph.add(iri.clone(), vocab::laco("qualifiedName"), Term::lit(qname));
                    }
                    object = Some(iri);
                }
            }
        }
        let Some(object) = object else {
            continue;
        };

        if let Some(predicate) = vocab::relation_predicate(&occurrence.relation) {
            graph.add(subject.clone(), predicate, object.clone());
        }

        let relation_name: String = occurrence.relation.clone().into();
        let node = blanks.fresh();
        graph.add(node.clone(), vocab::rdf_type(), vocab::laco("Occurrence"));
        graph.add(node.clone(), vocab::laco("ofRelation"), Term::lit(relation_name));
        graph.add(node.clone(), vocab::laco("subject"), subject);
        graph.add(node.clone(), vocab::laco("object"), object);
        graph.add(node.clone(), vocab::laco("inFile"), file.clone());
        if let Some(span) = &occurrence.span {
            add_span(&mut graph, &node, span, &mut blanks);
        }
    }

    graph
}

// ============================================================================
// Tests
// ============================================================================
