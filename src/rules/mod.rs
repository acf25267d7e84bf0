//! Rule pipeline: forward-chaining derivation over the base fact graph.
//!
//! Stages run in caller-supplied order, rules within a pack in file order.
//! The working graph starts as a copy of the facts and accumulates every
//! construct, so later rules see statements built by earlier ones. One pass,
//! no fixpoint: a rule never re-fires on statements constructed after it
//! ran. The hand-coded framework pass participates as a stage so its
//! placement relative to the declarative packs is explicit.

pub mod parser;
pub mod query;

pub use parser::{ParseError, PatternTerm, Rule, RulePack, TriplePattern};

use chrono::Utc;
use tracing::{debug, info};

use crate::graph::Graph;

/// A hand-coded derivation participating in the pipeline alongside the
/// declarative packs.
pub trait InferencePass {
    fn name(&self) -> &'static str;

    /// Derive new statements from the working graph. Pure; must not assume
    /// its output is ever fed back to itself.
    fn derive(&self, working: &Graph) -> Graph;
}

/// One pipeline stage, in execution order.
pub enum RuleStage<'a> {
    Pack(&'a RulePack),
    Framework(&'a dyn InferencePass),
}

impl RuleStage<'_> {
    fn name(&self) -> &str {
        match self {
            RuleStage::Pack(pack) => &pack.name,
            RuleStage::Framework(pass) => pass.name(),
        }
    }
}

/// Completion record for one stage, kept for the metadata summary.
#[derive(Debug, Clone)]
pub struct PackEvent {
    pub name: String,
    pub rules: usize,
    pub produced: usize,
    pub completed_at: String,
}

/// Run the pipeline. Returns only the inferred statements; the base facts
/// are never mutated.
pub fn run_rule_packs(facts: &Graph, stages: &[RuleStage<'_>], events: &mut Vec<PackEvent>) -> Graph {
    let mut working = facts.clone();
    let mut inferred = Graph::new();
    for (prefix, namespace) in facts.prefixes() {
        inferred.bind(prefix, namespace);
    }

    for stage in stages {
        let before = inferred.len();
        let rule_count = match stage {
            RuleStage::Pack(pack) => {
                run_pack(pack, &mut working, &mut inferred);
                pack.rules.len()
            }
            RuleStage::Framework(pass) => {
                let derived = pass.derive(&working);
                for triple in derived.iter() {
                    if inferred.insert(triple.clone()) {
                        working.insert(triple.clone());
                    }
                }
                1
            }
        };
        let produced = inferred.len() - before;
        info!("rule stage '{}' produced {} statements", stage.name(), produced);
        events.push(PackEvent {
            name: stage.name().to_string(),
            rules: rule_count,
            produced,
            completed_at: Utc::now().to_rfc3339(),
        });
    }
    inferred
}

fn run_pack(pack: &RulePack, working: &mut Graph, inferred: &mut Graph) {
    for (index, rule) in pack.rules.iter().enumerate() {
        let solutions = query::match_patterns(working, &rule.where_);
        debug!(
            "pack '{}' rule {} matched {} solutions",
            pack.name,
            index + 1,
            solutions.len()
        );
        for solution in &solutions {
            for triple in query::instantiate(&rule.construct, solution) {
                if inferred.insert(triple.clone()) {
                    working.insert(triple);
                }
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::Term;
    use crate::vocab;

    fn base_facts() -> Graph {
        let mut g = Graph::new();
        vocab::bind_fact_prefixes(&mut g);
        let rdf_type = Term::iri(vocab::RDF_TYPE);
        g.add(Term::iri("laco://sym/r/c/s1"), rdf_type.clone(), vocab::laco("Callable"));
        g.add(
            Term::iri("laco://sym/r/c/s1"),
            vocab::laco("qualifiedName"),
            Term::lit("lib.data.fetchData"),
        );
        g.add(
            Term::iri("laco://repo/r/commit/c/file/lib%2Fdata.ts"),
            rdf_type,
            vocab::laco("SourceFile"),
        );
        g.add(
            Term::iri("laco://repo/r/commit/c/file/lib%2Fdata.ts"),
            vocab::dct("path"),
            Term::lit("lib/data.ts"),
        );
        g
    }

    #[test]
    fn core_pack_chains_forward_within_one_pass() {
        let facts = base_facts();
        let pack = RulePack::parse("rules-core", vocab::RULES_CORE).unwrap();
        let mut events = Vec::new();
        let inferred = run_rule_packs(&facts, &[RuleStage::Pack(&pack)], &mut events);

        let unit = Term::iri("laco://sym/r/c/s1");
        // Rule 1 types the unit; rule 2 matches on that constructed type.
        assert!(inferred.contains(
            &unit,
            &Term::iri(vocab::RDF_TYPE),
            &vocab::lasa("Capability")
        ));
        assert!(inferred.contains(
            &unit,
            &vocab::lasa("capabilityName"),
            &Term::lit("lib.data.fetchData")
        ));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].rules, 5);
        assert!(events[0].produced >= 4);
    }

    #[test]
    fn facts_graph_is_not_mutated() {
        let facts = base_facts();
        let len_before = facts.len();
        let pack = RulePack::parse("rules-core", vocab::RULES_CORE).unwrap();
        run_rule_packs(&facts, &[RuleStage::Pack(&pack)], &mut Vec::new());
        assert_eq!(facts.len(), len_before);
    }

    #[test]
    fn framework_stage_sees_pack_output() {
        struct CountCapabilities;
        impl InferencePass for CountCapabilities {
            fn name(&self) -> &'static str {
                "count"
            }
            fn derive(&self, working: &Graph) -> Graph {
                let mut out = Graph::new();
                let subjects = working
                    .subjects_with(&Term::iri(vocab::RDF_TYPE), &vocab::lasa("Capability"));
                for subject in subjects {
                    out.add((*subject).clone(), vocab::lasa("seen"), Term::boolean(true));
                }
                out
            }
        }

        let facts = base_facts();
        let pack = RulePack::parse("rules-core", vocab::RULES_CORE).unwrap();
        let pass = CountCapabilities;
        let mut events = Vec::new();
        let inferred = run_rule_packs(
            &facts,
            &[RuleStage::Pack(&pack), RuleStage::Framework(&pass)],
            &mut events,
        );
        assert!(inferred.contains(
            &Term::iri("laco://sym/r/c/s1"),
            &vocab::lasa("seen"),
            &Term::boolean(true)
        ));
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].name, "count");
    }
}
