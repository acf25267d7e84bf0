//! Namespaces, fixed mapping tables, and embedded vocabulary assets.
//!
//! The kind→type and relation→predicate tables are closed: unknown unit
//! kinds map to the generic `laco:Unit` type and unknown relations get no
//! predicate edge. Both behaviors are exercised by the mapper.

use crate::graph::Term;
use crate::record::{Relation, UnitKind};

// ============================================================================
// Namespaces
// ============================================================================

pub const LACO: &str = "https://example.org/laco#";
pub const LASA: &str = "https://example.org/lasa#";
pub const NEXT: &str = "https://example.org/next#";
pub const TS: &str = "https://example.org/laco/ts#";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const PROV: &str = "http://www.w3.org/ns/prov#";
pub const SH: &str = "http://www.w3.org/ns/shacl#";
pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub fn laco(name: &str) -> Term {
    Term::iri(format!("{}{}", LACO, name))
}

pub fn lasa(name: &str) -> Term {
    Term::iri(format!("{}{}", LASA, name))
}

pub fn next(name: &str) -> Term {
    Term::iri(format!("{}{}", NEXT, name))
}

pub fn ts(name: &str) -> Term {
    Term::iri(format!("{}{}", TS, name))
}

pub fn dct(name: &str) -> Term {
    Term::iri(format!("{}{}", DCT, name))
}

pub fn sh(name: &str) -> Term {
    Term::iri(format!("{}{}", SH, name))
}

pub fn rdf_type() -> Term {
    Term::iri(RDF_TYPE)
}

/// Bind the standard prefix set on a fact graph.
pub fn bind_fact_prefixes(graph: &mut crate::graph::Graph) {
    graph.bind("laco", LACO);
    graph.bind("lasa", LASA);
    graph.bind("next", NEXT);
    graph.bind("dct", DCT);
    graph.bind("prov", PROV);
    graph.bind("ts", TS);
}

// ============================================================================
// Fixed tables
// ============================================================================

/// Type for a declared unit kind. Unknown kinds get the generic Unit type.
pub fn unit_type_for(kind: &UnitKind) -> Term {
    match kind {
        UnitKind::Callable => laco("Callable"),
        UnitKind::Classifier => laco("Classifier"),
        UnitKind::Variable => laco("Variable"),
        UnitKind::Parameter => laco("Parameter"),
        UnitKind::Type => laco("Type"),
        UnitKind::Other(_) => laco("Unit"),
    }
}

/// Predicate for an occurrence relation. Unknown relations have none.
pub fn relation_predicate(relation: &Relation) -> Option<Term> {
    match relation {
        Relation::Calls => Some(laco("calls")),
        Relation::References => Some(laco("references")),
        Relation::Reads => Some(laco("readsFrom")),
        Relation::Writes => Some(laco("writesTo")),
        Relation::Other(_) => None,
    }
}

// ============================================================================
// Embedded assets
// ============================================================================

/// Vocabulary files published (and content-hashed) with every build.
pub const VOCAB_ASSETS: &[(&str, &str)] = &[
    ("laco.ttl", include_str!("../assets/vocab/laco.ttl")),
    ("lasa.ttl", include_str!("../assets/vocab/lasa.ttl")),
    ("next.ttl", include_str!("../assets/vocab/next.ttl")),
];

/// Declarative rule packs shipped with the tool.
pub const RULES_CORE: &str = include_str!("../assets/rules/rules-core.rq");
pub const RULES_NEXT: &str = include_str!("../assets/rules/rules-next.rq");

// ============================================================================
// Property table
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    Object,
    Data,
}

/// Declared domain/range knowledge for the metadata summary.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    pub iri_suffix: (&'static str, &'static str),
    pub kind: PropertyKind,
    pub domain: Option<&'static str>,
    pub range: Option<&'static str>,
}

const fn object(ns: &'static str, name: &'static str) -> PropertySpec {
    PropertySpec {
        iri_suffix: (ns, name),
        kind: PropertyKind::Object,
        domain: None,
        range: None,
    }
}

const fn data(ns: &'static str, name: &'static str) -> PropertySpec {
    PropertySpec {
        iri_suffix: (ns, name),
        kind: PropertyKind::Data,
        domain: None,
        range: None,
    }
}

const fn with(
    mut spec: PropertySpec,
    domain: Option<&'static str>,
    range: Option<&'static str>,
) -> PropertySpec {
    spec.domain = domain;
    spec.range = range;
    spec
}

/// Static property declarations. Domain/range are filled in where the
/// vocabulary declares them; absent otherwise.
pub const PROPERTY_TABLE: &[PropertySpec] = &[
    with(object(LACO, "declaredIn"), Some("laco:Unit"), Some("laco:SourceFile")),
    with(object(LACO, "defines"), Some("laco:SourceFile"), Some("laco:Unit")),
    with(object(LACO, "importsFrom"), Some("laco:SourceFile"), None),
    with(object(LACO, "exports"), Some("laco:SourceFile"), Some("laco:Unit")),
    with(object(LACO, "calls"), Some("laco:Unit"), Some("laco:Unit")),
    with(object(LACO, "references"), Some("laco:Unit"), Some("laco:Unit")),
    with(object(LACO, "readsFrom"), Some("laco:Unit"), Some("laco:Unit")),
    with(object(LACO, "writesTo"), Some("laco:Unit"), Some("laco:Unit")),
    with(object(LACO, "atCommit"), None, None),
    with(object(LACO, "span"), None, None),
    with(object(LACO, "subject"), Some("laco:Occurrence"), None),
    with(object(LACO, "object"), Some("laco:Occurrence"), None),
    with(object(LACO, "inFile"), Some("laco:Occurrence"), Some("laco:SourceFile")),
    with(object(LASA, "dependsOn"), Some("lasa:Component"), None),
    with(object(LASA, "invokes"), Some("lasa:Capability"), Some("lasa:Capability")),
    with(data(DCT, "path"), Some("laco:SourceFile"), Some("xsd:string")),
    with(data(DCT, "title"), Some("laco:Package"), Some("xsd:string")),
    with(data(LACO, "sha256"), Some("laco:SourceFile"), Some("xsd:string")),
    with(data(LACO, "qualifiedName"), Some("laco:Unit"), Some("xsd:string")),
    with(data(LACO, "symbolId"), Some("laco:Unit"), Some("xsd:string")),
    with(data(LACO, "astPath"), None, Some("xsd:string")),
    with(data(LACO, "isExportedDefault"), None, Some("xsd:boolean")),
    with(data(LACO, "ofRelation"), Some("laco:Occurrence"), Some("xsd:string")),
    with(data(LACO, "startLine"), None, Some("xsd:integer")),
    with(data(LACO, "startCol"), None, Some("xsd:integer")),
    with(data(LACO, "endLine"), None, Some("xsd:integer")),
    with(data(LACO, "endCol"), None, Some("xsd:integer")),
    with(data(TS, "hasUseClientDirective"), Some("laco:SourceFile"), Some("xsd:boolean")),
    with(data(TS, "isAsync"), None, Some("xsd:boolean")),
    with(data(LASA, "capabilityName"), Some("lasa:Capability"), Some("xsd:string")),
    with(data(LASA, "componentPath"), Some("lasa:Component"), Some("xsd:string")),
    with(data(NEXT, "routePattern"), None, Some("xsd:string")),
    with(data(NEXT, "segmentType"), None, Some("xsd:string")),
    with(data(NEXT, "usesClient"), None, Some("xsd:boolean")),
];

/// Look up the static spec for a full property IRI.
pub fn property_spec(iri: &str) -> Option<&'static PropertySpec> {
    PROPERTY_TABLE.iter().find(|spec| {
        let (ns, name) = spec.iri_suffix;
        iri.len() == ns.len() + name.len() && iri.starts_with(ns) && iri.ends_with(name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_maps_to_generic_unit() {
        let kind = UnitKind::Other("decorator".to_string());
        assert_eq!(unit_type_for(&kind), laco("Unit"));
    }

    #[test]
    fn unknown_relation_has_no_predicate() {
        assert_eq!(relation_predicate(&Relation::Other("mentions".into())), None);
        assert_eq!(relation_predicate(&Relation::Reads), Some(laco("readsFrom")));
    }

    #[test]
    fn property_spec_lookup() {
        let spec = property_spec("https://example.org/laco#declaredIn").unwrap();
        assert_eq!(spec.kind, PropertyKind::Object);
        assert_eq!(spec.range, Some("laco:SourceFile"));
        assert!(property_spec("https://example.org/laco#nope").is_none());
    }

    #[test]
    fn vocab_assets_present() {
        assert_eq!(VOCAB_ASSETS.len(), 3);
        assert!(VOCAB_ASSETS[0].1.contains("laco:SourceFile"));
    }
}
