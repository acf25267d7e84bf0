//! In-memory statement store and Turtle writer.
//!
//! The compiler's data model is a set of RDF-style triples:
//! - [`Term`]: IRIs, labeled blank nodes, and typed literals
//! - [`Triple`]: one statement
//! - [`Graph`]: an append-only statement set with bound prefixes
//!
//! `Graph` has set semantics (adding a duplicate triple is a no-op) while
//! preserving insertion order, so serialization and query results are
//! deterministic for identical input.
//!
//! Blank node labels are caller-supplied via [`BlankIdGen`]; the generator is
//! seeded per file so labels never collide when shards are merged and are
//! stable across runs.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

// ============================================================================
// Terms
// ============================================================================

/// A literal value in a statement object position.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Literal {
    Str(String),
    Int(i64),
    Bool(bool),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Str(s) => write!(f, "{}", s),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Bool(b) => write!(f, "{}", b),
        }
    }
}

/// One node of a statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Term {
    Iri(String),
    Blank(String),
    Literal(Literal),
}

impl Term {
    /// Create an IRI term.
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri(value.into())
    }

    /// Create a string literal term.
    pub fn lit(value: impl Into<String>) -> Self {
        Term::Literal(Literal::Str(value.into()))
    }

    /// Create an integer literal term.
    pub fn int(value: i64) -> Self {
        Term::Literal(Literal::Int(value))
    }

    /// Create a boolean literal term.
    pub fn boolean(value: bool) -> Self {
        Term::Literal(Literal::Bool(value))
    }

    /// The IRI string, if this term is an IRI.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri(s) => Some(s),
            _ => None,
        }
    }

    /// The literal string value, if this term is a string literal.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Literal(Literal::Str(s)) => Some(s),
            _ => None,
        }
    }
}

/// One statement.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Triple {
            subject,
            predicate,
            object,
        }
    }
}

// ============================================================================
// Blank node labels
// ============================================================================

/// Deterministic blank node label generator.
///
/// Labels are `{prefix}{n}` with the prefix sanitized to Turtle-safe
/// characters. Seeding the generator per source file keeps labels unique
/// across merged shards without any global state.
#[derive(Debug)]
pub struct BlankIdGen {
    prefix: String,
    next: u64,
}

impl BlankIdGen {
    pub fn new(prefix: &str) -> Self {
        let sanitized: String = prefix
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        BlankIdGen {
            prefix: sanitized,
            next: 0,
        }
    }

    /// Mint a fresh blank node term.
    pub fn fresh(&mut self) -> Term {
        let label = format!("{}_{}", self.prefix, self.next);
        self.next += 1;
        Term::Blank(label)
    }
}

// ============================================================================
// Graph
// ============================================================================

/// Append-only statement set with declared prefixes.
#[derive(Debug, Default, Clone)]
pub struct Graph {
    triples: Vec<Triple>,
    seen: HashSet<Triple>,
    prefixes: BTreeMap<String, String>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    /// Bind a prefix to a namespace for serialization and compaction.
    pub fn bind(&mut self, prefix: &str, namespace: &str) {
        self.prefixes
            .insert(prefix.to_string(), namespace.to_string());
    }

    /// Declared prefixes, sorted by prefix.
    pub fn prefixes(&self) -> &BTreeMap<String, String> {
        &self.prefixes
    }

    /// Add one statement. Returns false if it was already present.
    pub fn add(&mut self, subject: Term, predicate: Term, object: Term) -> bool {
        self.insert(Triple::new(subject, predicate, object))
    }

    /// Insert a statement, deduplicating.
    pub fn insert(&mut self, triple: Triple) -> bool {
        if self.seen.contains(&triple) {
            return false;
        }
        self.seen.insert(triple.clone());
        self.triples.push(triple);
        true
    }

    /// Merge another graph's statements and prefixes into this one.
    pub fn extend_from(&mut self, other: &Graph) {
        for (prefix, ns) in &other.prefixes {
            self.prefixes
                .entry(prefix.clone())
                .or_insert_with(|| ns.clone());
        }
        for triple in &other.triples {
            self.insert(triple.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.triples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Triple> {
        self.triples.iter()
    }

    /// Whether the exact statement is present.
    pub fn contains(&self, subject: &Term, predicate: &Term, object: &Term) -> bool {
        self.seen.contains(&Triple {
            subject: subject.clone(),
            predicate: predicate.clone(),
            object: object.clone(),
        })
    }

    /// All objects of statements matching (subject, predicate, _).
    ///
    /// Returned borrows are tied to the graph only, never to the query
    /// terms, so callers may pass temporaries. Same for the other accessors.
    pub fn objects<'g>(&'g self, subject: &Term, predicate: &Term) -> Vec<&'g Term> {
        self.triples
            .iter()
            .filter(|t| &t.subject == subject && &t.predicate == predicate)
            .map(|t| &t.object)
            .collect()
    }

    /// First object of a statement matching (subject, predicate, _).
    pub fn value<'g>(&'g self, subject: &Term, predicate: &Term) -> Option<&'g Term> {
        self.triples
            .iter()
            .find(|t| &t.subject == subject && &t.predicate == predicate)
            .map(|t| &t.object)
    }

    /// All subjects of statements matching (_, predicate, object).
    pub fn subjects_with<'g>(&'g self, predicate: &Term, object: &Term) -> Vec<&'g Term> {
        let mut out = Vec::new();
        for t in &self.triples {
            if &t.predicate == predicate && &t.object == object && !out.contains(&&t.subject) {
                out.push(&t.subject);
            }
        }
        out
    }

    /// Statements matching the given optional positions. The iterator owns
    /// its query terms so it borrows only the graph.
    pub fn matching<'g>(
        &'g self,
        subject: Option<&Term>,
        predicate: Option<&Term>,
        object: Option<&Term>,
    ) -> impl Iterator<Item = &'g Triple> + 'g {
        let subject = subject.cloned();
        let predicate = predicate.cloned();
        let object = object.cloned();
        self.triples.iter().filter(move |t| {
            subject.as_ref().map_or(true, |s| &t.subject == s)
                && predicate.as_ref().map_or(true, |p| &t.predicate == p)
                && object.as_ref().map_or(true, |o| &t.object == o)
        })
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Compact an IRI to a prefixed name when a bound namespace matches.
    pub fn compact(&self, iri: &str) -> String {
        for (prefix, ns) in &self.prefixes {
            if let Some(local) = iri.strip_prefix(ns.as_str()) {
                if !local.is_empty() && local.chars().all(is_local_name_char) {
                    return format!("{}:{}", prefix, local);
                }
            }
        }
        iri.to_string()
    }

    /// Serialize to Turtle: prefix header, then statements grouped by subject
    /// in first-appearance order.
    pub fn to_turtle(&self) -> String {
        let mut out = String::new();
        for (prefix, ns) in &self.prefixes {
            out.push_str(&format!("@prefix {}: <{}> .\n", prefix, ns));
        }
        if !self.prefixes.is_empty() {
            out.push('\n');
        }

        let mut subject_order: Vec<&Term> = Vec::new();
        for t in &self.triples {
            if !subject_order.contains(&&t.subject) {
                subject_order.push(&t.subject);
            }
        }

        for subject in subject_order {
            let po: Vec<(&Term, &Term)> = self
                .triples
                .iter()
                .filter(|t| &t.subject == subject)
                .map(|t| (&t.predicate, &t.object))
                .collect();
            out.push_str(&self.format_term(subject));
            let mut first = true;
            for (predicate, object) in po {
                if first {
                    out.push(' ');
                    first = false;
                } else {
                    out.push_str(" ;\n    ");
                }
                out.push_str(&self.format_predicate(predicate));
                out.push(' ');
                out.push_str(&self.format_term(object));
            }
            out.push_str(" .\n");
        }
        out
    }

    fn format_predicate(&self, term: &Term) -> String {
        if term.as_iri() == Some(crate::vocab::RDF_TYPE) {
            return "a".to_string();
        }
        self.format_term(term)
    }

    fn format_term(&self, term: &Term) -> String {
        match term {
            Term::Iri(iri) => {
                let compacted = self.compact(iri);
                if compacted == *iri {
                    format!("<{}>", iri)
                } else {
                    compacted
                }
            }
            Term::Blank(label) => format!("_:{}", label),
            Term::Literal(Literal::Str(s)) => format!("\"{}\"", escape_literal(s)),
            Term::Literal(Literal::Int(i)) => i.to_string(),
            Term::Literal(Literal::Bool(b)) => b.to_string(),
        }
    }
}

fn is_local_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
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

    fn laco(name: &str) -> Term {
        Term::iri(format!("https://example.org/laco#{}", name))
    }

    mod graph_set_semantics {
        use super::*;

        #[test]
        fn duplicate_add_is_noop() {
            let mut g = Graph::new();
            assert!(g.add(Term::iri("laco://a"), laco("calls"), Term::iri("laco://b")));
            assert!(!g.add(Term::iri("laco://a"), laco("calls"), Term::iri("laco://b")));
            assert_eq!(g.len(), 1);
        }

        #[test]
        fn extend_merges_prefixes_and_dedupes() {
            let mut a = Graph::new();
            a.bind("laco", "https://example.org/laco#");
            a.add(Term::iri("laco://a"), laco("calls"), Term::iri("laco://b"));
            let mut b = Graph::new();
            b.bind("next", "https://example.org/next#");
            b.add(Term::iri("laco://a"), laco("calls"), Term::iri("laco://b"));
            b.add(Term::iri("laco://b"), laco("calls"), Term::iri("laco://c"));
            a.extend_from(&b);
            assert_eq!(a.len(), 2);
            assert!(a.prefixes().contains_key("next"));
        }
    }

    mod queries {
        use super::*;

        #[test]
        fn value_returns_first_object() {
            let mut g = Graph::new();
            g.add(Term::iri("laco://f"), laco("sha256"), Term::lit("abc"));
            g.add(Term::iri("laco://f"), laco("sha256"), Term::lit("def"));
            assert_eq!(
                g.value(&Term::iri("laco://f"), &laco("sha256")),
                Some(&Term::lit("abc"))
            );
        }

        #[test]
        fn subjects_with_dedupes() {
            let mut g = Graph::new();
            let class = laco("SourceFile");
            let rdf_type = Term::iri(crate::vocab::RDF_TYPE);
            g.add(Term::iri("laco://f"), rdf_type.clone(), class.clone());
            g.add(Term::iri("laco://g"), rdf_type.clone(), class.clone());
            assert_eq!(g.subjects_with(&rdf_type, &class).len(), 2);
        }

        #[test]
        fn query_results_outlive_temporary_query_terms() {
            let mut g = Graph::new();
            let rdf_type = Term::iri(crate::vocab::RDF_TYPE);
            g.add(Term::iri("laco://f"), laco("sha256"), Term::lit("abc"));
            g.add(Term::iri("laco://f"), rdf_type.clone(), laco("SourceFile"));

            // Query terms are temporaries dropped at each statement's end;
            // the returned borrows must be tied to the graph alone.
            let value = g.value(&Term::iri("laco://f"), &laco("sha256"));
            let subjects = g.subjects_with(&Term::iri(crate::vocab::RDF_TYPE), &laco("SourceFile"));
            let matched: Vec<&Triple> = g
                .matching(None, Some(&Term::iri(crate::vocab::RDF_TYPE)), None)
                .collect();

            assert_eq!(value, Some(&Term::lit("abc")));
            assert_eq!(subjects, vec![&Term::iri("laco://f")]);
            assert_eq!(matched.len(), 1);
        }
    }

    mod turtle {
        use super::*;

        #[test]
        fn compacts_bound_prefixes() {
            let mut g = Graph::new();
            g.bind("laco", "https://example.org/laco#");
            g.add(
                Term::iri("laco://sym/r/c/s1"),
                Term::iri(crate::vocab::RDF_TYPE),
                laco("Callable"),
            );
            let ttl = g.to_turtle();
            assert!(ttl.contains("@prefix laco: <https://example.org/laco#> ."));
            assert!(ttl.contains("<laco://sym/r/c/s1> a laco:Callable ."));
        }

        #[test]
        fn escapes_string_literals() {
            let mut g = Graph::new();
            g.add(
                Term::iri("laco://f"),
                laco("qualifiedName"),
                Term::lit("a\"b\\c"),
            );
            assert!(g.to_turtle().contains("\"a\\\"b\\\\c\""));
        }

        #[test]
        fn serialization_is_deterministic() {
            let build = || {
                let mut g = Graph::new();
                g.bind("laco", "https://example.org/laco#");
                g.add(Term::iri("laco://b"), laco("calls"), Term::iri("laco://a"));
                g.add(Term::iri("laco://a"), laco("sha256"), Term::lit("x"));
                g.to_turtle()
            };
            assert_eq!(build(), build());
        }
    }

    mod blank_ids {
        use super::*;

        #[test]
        fn labels_are_sanitized_and_sequential() {
            let mut generator = BlankIdGen::new("app/home.tsx");
            assert_eq!(generator.fresh(), Term::Blank("app_home_tsx_0".to_string()));
            assert_eq!(generator.fresh(), Term::Blank("app_home_tsx_1".to_string()));
        }
    }
}
