//! Shape validation over the combined graph.
//!
//! A shape names a target class and the properties every instance must
//! carry. Validation produces a report graph in the SHACL results
//! vocabulary and a conformance verdict; it never fails the build, even
//! when the data does not conform.

use tracing::{debug, warn};

use crate::graph::{BlankIdGen, Graph, Term};
use crate::vocab;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Violation,
    Warning,
}

impl Severity {
    fn term(self) -> Term {
        match self {
            Severity::Violation => vocab::sh("Violation"),
            Severity::Warning => vocab::sh("Warning"),
        }
    }
}

/// One required property on instances of a target class.
#[derive(Debug, Clone)]
pub struct RequiredProperty {
    pub path: Term,
    pub severity: Severity,
    pub message: &'static str,
}

/// A node shape: target class plus required properties.
#[derive(Debug, Clone)]
pub struct Shape {
    pub name: &'static str,
    pub target_class: Term,
    pub required: Vec<RequiredProperty>,
}

fn required(path: Term, severity: Severity, message: &'static str) -> RequiredProperty {
    RequiredProperty {
        path,
        severity,
        message,
    }
}

/// Shapes every build checks.
pub fn core_shapes() -> Vec<Shape> {
    vec![
        Shape {
            name: "SourceFileShape",
            target_class: vocab::laco("SourceFile"),
            required: vec![
                required(
                    vocab::dct("path"),
                    Severity::Violation,
                    "source file must carry a repository-relative path",
                ),
                required(
                    vocab::laco("sha256"),
                    Severity::Violation,
                    "source file must carry a content hash",
                ),
            ],
        },
        Shape {
            name: "CallableShape",
            target_class: vocab::laco("Callable"),
            required: vec![
                required(
                    vocab::laco("qualifiedName"),
                    Severity::Warning,
                    "callable should carry a qualified name",
                ),
                required(
                    vocab::laco("declaredIn"),
                    Severity::Violation,
                    "callable must be declared in a source file",
                ),
            ],
        },
        Shape {
            name: "OccurrenceShape",
            target_class: vocab::laco("Occurrence"),
            required: vec![
                required(
                    vocab::laco("subject"),
                    Severity::Violation,
                    "occurrence must reference a subject unit",
                ),
                required(
                    vocab::laco("object"),
                    Severity::Violation,
                    "occurrence must reference an object unit",
                ),
            ],
        },
    ]
}

/// Shapes added when the Next.js extension is enabled.
pub fn nextjs_shapes() -> Vec<Shape> {
    vec![
        Shape {
            name: "PageShape",
            target_class: vocab::next("Page"),
            required: vec![required(
                vocab::next("routePattern"),
                Severity::Violation,
                "page must carry a derived route pattern",
            )],
        },
        Shape {
            name: "APIRouteShape",
            target_class: vocab::next("APIRoute"),
            required: vec![required(
                vocab::next("routePattern"),
                Severity::Violation,
                "API route must carry a derived route pattern",
            )],
        },
    ]
}

/// Result of one validation run.
#[derive(Debug)]
pub struct ValidationOutcome {
    pub conforms: bool,
    pub report: Graph,
}

/// Check every shape against the data graph and build the report.
/// Conformance means no Violation-severity results; warnings do not count.
pub fn validate(data: &Graph, shapes: &[Shape]) -> ValidationOutcome {
    let rdf_type = Term::iri(vocab::RDF_TYPE);
    let mut ids = BlankIdGen::new("result");
    let mut results: Vec<(Term, Term, Term, &'static str, Term)> = Vec::new();

    for shape in shapes {
        let instances = data.subjects_with(&rdf_type, &shape.target_class);
        debug!("shape {} targets {} instances", shape.name, instances.len());
        for instance in instances {
            for property in &shape.required {
                if data.value(instance, &property.path).is_none() {
                    results.push((
                        ids.fresh(),
                        instance.clone(),
                        property.path.clone(),
                        property.message,
                        property.severity.term(),
                    ));
                }
            }
        }
    }

    let conforms = results
        .iter()
        .all(|(_, _, _, _, severity)| severity != &vocab::sh("Violation"));
    if !conforms {
        warn!("validation found {} results; data does not conform", results.len());
    }

    let mut report = Graph::new();
    report.bind("sh", vocab::SH);
    report.bind("laco", vocab::LACO);
    report.bind("next", vocab::NEXT);
    let report_node = Term::Blank("report".to_string());
    report.add(report_node.clone(), rdf_type, vocab::sh("ValidationReport"));
    report.add(
        report_node.clone(),
        vocab::sh("conforms"),
        Term::boolean(conforms),
    );
    for (node, focus, path, message, severity) in results {
        report.add(
            node.clone(),
            Term::iri(vocab::RDF_TYPE),
            vocab::sh("ValidationResult"),
        );
        report.add(report_node.clone(), vocab::sh("result"), node.clone());
        report.add(node.clone(), vocab::sh("resultSeverity"), severity);
        report.add(node.clone(), vocab::sh("focusNode"), focus);
        report.add(node.clone(), vocab::sh("resultPath"), path);
        report.add(node, vocab::sh("resultMessage"), Term::lit(message));
    }

    ValidationOutcome { conforms, report }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn conforming_file(g: &mut Graph) -> Term {
        let file = Term::iri("laco://repo/r/commit/c/file/lib%2Fdata.ts");
        g.add(
            file.clone(),
            Term::iri(vocab::RDF_TYPE),
            vocab::laco("SourceFile"),
        );
        g.add(file.clone(), vocab::dct("path"), Term::lit("lib/data.ts"));
        g.add(file.clone(), vocab::laco("sha256"), Term::lit("abc"));
        file
    }

    #[test]
    fn conforming_data_yields_clean_report() {
        let mut g = Graph::new();
        conforming_file(&mut g);
        let outcome = validate(&g, &core_shapes());
        assert!(outcome.conforms);
        let report_node = Term::Blank("report".to_string());
        assert!(outcome.report.contains(
            &report_node,
            &vocab::sh("conforms"),
            &Term::boolean(true)
        ));
    }

    #[test]
    fn missing_required_property_is_a_violation() {
        let mut g = Graph::new();
        let file = Term::iri("laco://repo/r/commit/c/file/x");
        g.add(
            file.clone(),
            Term::iri(vocab::RDF_TYPE),
            vocab::laco("SourceFile"),
        );
        g.add(file.clone(), vocab::dct("path"), Term::lit("x"));
        // sha256 missing
        let outcome = validate(&g, &core_shapes());
        assert!(!outcome.conforms);
        let rdf_type = Term::iri(vocab::RDF_TYPE);
        let result_class = vocab::sh("ValidationResult");
        let results = outcome.report.subjects_with(&rdf_type, &result_class);
        assert_eq!(results.len(), 1);
        assert!(outcome
            .report
            .contains(results[0], &vocab::sh("focusNode"), &file));
        assert!(outcome.report.contains(
            results[0],
            &vocab::sh("resultPath"),
            &vocab::laco("sha256")
        ));
    }

    #[test]
    fn warnings_do_not_break_conformance() {
        let mut g = Graph::new();
        let unit = Term::iri("laco://sym/r/c/s1");
        let file = conforming_file(&mut g);
        g.add(unit.clone(), Term::iri(vocab::RDF_TYPE), vocab::laco("Callable"));
        g.add(unit.clone(), vocab::laco("declaredIn"), file);
        // qualifiedName missing: warning severity only
        let outcome = validate(&g, &core_shapes());
        assert!(outcome.conforms);
        assert!(outcome.report.contains(
            &Term::Blank("result_0".to_string()),
            &vocab::sh("resultSeverity"),
            &vocab::sh("Warning")
        ));
    }

    #[test]
    fn nextjs_shapes_require_route_pattern() {
        let mut g = Graph::new();
        let unit = Term::iri("laco://sym/r/c/s1");
        g.add(unit, Term::iri(vocab::RDF_TYPE), vocab::next("Page"));
        let outcome = validate(&g, &nextjs_shapes());
        assert!(!outcome.conforms);
    }

    #[test]
    fn empty_data_conforms() {
        let outcome = validate(&Graph::new(), &core_shapes());
        assert!(outcome.conforms);
    }
}
