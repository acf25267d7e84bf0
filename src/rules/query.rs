//! Basic graph pattern evaluation.
//!
//! A nested-loop join over triple patterns: each pattern extends the set of
//! candidate solutions by scanning the graph under the bindings accumulated
//! so far. Small rule bodies over per-repo graphs keep this tractable; there
//! is no index and no query planner.

use std::collections::HashMap;

use crate::graph::{Graph, Term, Triple};

use super::parser::{PatternTerm, TriplePattern};

/// One solution: variable name to bound term.
pub type Bindings = HashMap<String, Term>;

/// All solutions of a basic graph pattern against a graph.
pub fn match_patterns(graph: &Graph, patterns: &[TriplePattern]) -> Vec<Bindings> {
    let mut solutions = vec![Bindings::new()];
    for pattern in patterns {
        let mut extended = Vec::new();
        for solution in &solutions {
            for triple in graph.iter() {
                if let Some(bound) = extend(solution, pattern, triple) {
                    extended.push(bound);
                }
            }
        }
        solutions = extended;
        if solutions.is_empty() {
            break;
        }
    }
    solutions
}

/// Try to match one triple under an existing solution; `None` on conflict.
fn extend(solution: &Bindings, pattern: &TriplePattern, triple: &Triple) -> Option<Bindings> {
    let mut bound = solution.clone();
    unify(&mut bound, &pattern.subject, &triple.subject)?;
    unify(&mut bound, &pattern.predicate, &triple.predicate)?;
    unify(&mut bound, &pattern.object, &triple.object)?;
    Some(bound)
}

fn unify(bindings: &mut Bindings, pattern: &PatternTerm, actual: &Term) -> Option<()> {
    match pattern {
        PatternTerm::Const(term) => (term == actual).then_some(()),
        PatternTerm::Var(name) => match bindings.get(name) {
            Some(existing) => (existing == actual).then_some(()),
            None => {
                bindings.insert(name.clone(), actual.clone());
                Some(())
            }
        },
    }
}

/// Instantiate a construct template under one solution. Statements with an
/// unbound variable are dropped rather than failing the rule.
pub fn instantiate(construct: &[TriplePattern], bindings: &Bindings) -> Vec<Triple> {
    construct
        .iter()
        .filter_map(|pattern| {
            Some(Triple::new(
                resolve(&pattern.subject, bindings)?,
                resolve(&pattern.predicate, bindings)?,
                resolve(&pattern.object, bindings)?,
            ))
        })
        .collect()
}

fn resolve(pattern: &PatternTerm, bindings: &Bindings) -> Option<Term> {
    match pattern {
        PatternTerm::Const(term) => Some(term.clone()),
        PatternTerm::Var(name) => bindings.get(name).cloned(),
    }
}

// ============================================================================
// Tests
// ============================================================================
