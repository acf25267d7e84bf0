//! Hand-coded Next.js derivation.
//!
//! Route conventions are positional and lexical, which a declarative rule
//! body cannot express, so this pass stays imperative. It runs as the last
//! pipeline stage and reads the working graph, so it can see statements the
//! declarative packs constructed.

use crate::graph::{Graph, Term};
use crate::rules::InferencePass;
use crate::vocab;

const SOURCE_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];

/// App-router segment markers that never contribute to the route pattern.
const APP_MARKERS: &[&str] = &["page", "layout", "route", "default"];

/// Derive a route pattern from a repo-relative file path.
///
/// App-router paths are rooted at the first `app` segment, pages-router
/// paths at a leading `pages` directory. Dynamic segments normalize to a
/// matcher syntax: `[slug]` → `:slug`, `[...all]` → `*all`, `[[...rest]]`
/// → `*rest`. An empty result is the root route `/`.
pub fn derive_route_pattern(relative_path: &str) -> String {
    let cleaned = relative_path.trim_matches('/');
    if cleaned.is_empty() {
        return "/".to_string();
    }

    let segments: Vec<&str> = cleaned.split('/').collect();
    let in_app = segments.contains(&"app");
    let route_segments: &[&str] = if in_app {
        let app_index = segments.iter().position(|s| *s == "app").unwrap_or(0);
        &segments[app_index + 1..]
    } else if segments.first() == Some(&"pages") {
        &segments[1..]
    } else {
        &segments
    };

    let mut normalized: Vec<String> = Vec::new();
    for (idx, segment) in route_segments.iter().enumerate() {
        let base = strip_source_extension(segment);
        if base.is_empty() {
            continue;
        }
        if in_app && APP_MARKERS.contains(&base) {
            continue;
        }
        // A trailing or nested "index" collapses into its parent segment.
        if base == "index" && (!normalized.is_empty() || idx == route_segments.len() - 1) {
            continue;
        }

        if let Some(inner) = base.strip_prefix("[[...").and_then(|s| s.strip_suffix("]]")) {
            normalized.push(format!("*{}", inner));
        } else if let Some(inner) = base.strip_prefix("[...").and_then(|s| s.strip_suffix("]")) {
            normalized.push(format!("*{}", inner));
        } else if let Some(inner) = base.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
            normalized.push(format!(":{}", inner));
        } else {
            normalized.push(base.to_string());
        }
    }

    if normalized.is_empty() {
        "/".to_string()
    } else {
        format!("/{}", normalized.join("/"))
    }
}

fn strip_source_extension(segment: &str) -> &str {
    if let Some(idx) = segment.rfind('.') {
        let ext = &segment[idx + 1..];
        if SOURCE_EXTENSIONS
            .iter()
            .any(|known| ext.eq_ignore_ascii_case(known))
        {
            return &segment[..idx];
        }
    }
    segment
}

// ============================================================================
// Framework pass
// ============================================================================

/// Pipeline stage deriving Next.js role typing and route patterns.
pub struct NextJsPass;

impl InferencePass for NextJsPass {
    fn name(&self) -> &'static str {
        "nextjs-framework"
    }

    fn derive(&self, working: &Graph) -> Graph {
        framework_inference(working)
    }
}

fn framework_inference(facts: &Graph) -> Graph {
    let mut inferred = Graph::new();
    inferred.bind("next", vocab::NEXT);
    inferred.bind("laco", vocab::LACO);
    inferred.bind("ts", vocab::TS);

    let rdf_type = Term::iri(vocab::RDF_TYPE);
    let defines = vocab::laco("defines");
    let exported_default = vocab::laco("isExportedDefault");

    let files: Vec<Term> = facts
        .subjects_with(&rdf_type, &vocab::laco("SourceFile"))
        .into_iter()
        .cloned()
        .collect();
    for file in files {
        let Some(relative_path) = facts.value(&file, &vocab::dct("path")).and_then(Term::as_str)
        else {
            continue;
        };
        let relative_path = relative_path.to_string();

        let all_units: Vec<Term> = facts
            .objects(&file, &defines)
            .into_iter()
            .cloned()
            .collect();
        let default_units: Vec<&Term> = all_units
            .iter()
            .filter(|unit| facts.contains(unit, &exported_default, &Term::boolean(true)))
            .collect();

        if let Some((_, app_suffix)) = relative_path.split_once("app/") {
            let lower = app_suffix.to_ascii_lowercase();
            if lower.ends_with("page.tsx") || lower.ends_with("page.jsx") || lower.ends_with("page.ts")
            {
                for unit in &default_units {
                    inferred.add((*unit).clone(), rdf_type.clone(), vocab::next("Page"));
                    inferred.add((*unit).clone(), vocab::next("segmentType"), Term::lit("page"));
                    inferred.add(
                        (*unit).clone(),
                        vocab::next("routePattern"),
                        Term::lit(derive_route_pattern(&relative_path)),
                    );
                    if facts.contains(
                        &file,
                        &vocab::ts("hasUseClientDirective"),
                        &Term::boolean(true),
                    ) {
                        inferred.add((*unit).clone(), vocab::next("usesClient"), Term::boolean(true));
                    }
                }
            }
            if lower.ends_with("layout.tsx") || lower.ends_with("layout.jsx") {
                for unit in &default_units {
                    inferred.add((*unit).clone(), rdf_type.clone(), vocab::next("Layout"));
                    inferred.add((*unit).clone(), vocab::next("segmentType"), Term::lit("layout"));
                }
            }
            if lower.ends_with("route.ts")
                || lower.ends_with("route.js")
                || lower.ends_with("route.tsx")
                || lower.ends_with("route.jsx")
            {
                for unit in &all_units {
                    inferred.add(unit.clone(), rdf_type.clone(), vocab::next("APIRoute"));
                    inferred.add(unit.clone(), vocab::next("segmentType"), Term::lit("route"));
                    inferred.add(
                        unit.clone(),
                        vocab::next("routePattern"),
                        Term::lit(derive_route_pattern(&relative_path)),
                    );
                }
            }
        }

        if let Some((_, pages_suffix)) = relative_path.split_once("pages/") {
            if pages_suffix.starts_with("api/") {
                for unit in &default_units {
                    inferred.add((*unit).clone(), rdf_type.clone(), vocab::next("APIRoute"));
                    inferred.add((*unit).clone(), vocab::next("segmentType"), Term::lit("route"));
                    inferred.add(
                        (*unit).clone(),
                        vocab::next("routePattern"),
                        Term::lit(derive_route_pattern(&relative_path)),
                    );
                }
            }
        }
    }
    inferred
}

// ============================================================================
// Tests
// ============================================================================
