//! Global symbol resolver: commit-scoped registry of declared units.
//!
//! The two-phase protocol is enforced structurally, not by convention:
//! [`SymbolTableBuilder`] is the write handle used during the registration
//! pass over every file's units; [`SymbolTableBuilder::seal`] consumes it and
//! returns the read-mostly [`SymbolTable`] that mapping works against. Facts
//! about a unit arrive from different files in unpredictable order, so
//! occurrence mapping must never start before registration has covered the
//! whole file set.
//!
//! The only mutation after sealing is lazy dangling-unit minting, which is
//! mutex-guarded so per-file mapping can run on independent workers.
//!
//! None of the resolver operations fail; absence is `None`, never an error.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::graph::Term;
use crate::ids;
use crate::record::FileRecord;

// ============================================================================
// Registration phase
// ============================================================================

/// Write handle for the registration pass.
#[derive(Debug)]
pub struct SymbolTableBuilder {
    repo_name: String,
    commit_sha: String,
    by_symbol: HashMap<String, Term>,
    by_qname: HashMap<String, Term>,
}

impl SymbolTableBuilder {
    pub fn new(repo_name: impl Into<String>, commit_sha: impl Into<String>) -> Self {
        SymbolTableBuilder {
            repo_name: repo_name.into(),
            commit_sha: commit_sha.into(),
            by_symbol: HashMap::new(),
            by_qname: HashMap::new(),
        }
    }

    /// Record one declared unit. Idempotent; the first qualified-name
    /// registration wins when names collide.
    pub fn register_unit(&mut self, symbol_id: &str, qualified_name: &str) {
        let iri = ids::unit_iri(&self.repo_name, &self.commit_sha, symbol_id);
        self.by_symbol.insert(symbol_id.to_string(), iri.clone());
        self.by_qname
            .entry(qualified_name.to_string())
            .or_insert(iri);
    }

    /// Register every unit of a raw record. Units missing a symbol id or
    /// qualified name are skipped here and again by the mapper.
    pub fn register_record(&mut self, record: &FileRecord) {
        for unit in &record.units {
            if let (Some(symbol_id), Some(qualified_name)) =
                (unit.symbol_id.as_deref(), unit.qualified_name.as_deref())
            {
                if !symbol_id.is_empty() && !qualified_name.is_empty() {
                    self.register_unit(symbol_id, qualified_name);
                }
            }
        }
    }

    /// Close registration. The returned table is the handle mapping uses.
    pub fn seal(self) -> SymbolTable {
        SymbolTable {
            repo_name: self.repo_name,
            commit_sha: self.commit_sha,
            by_symbol: self.by_symbol,
            by_qname: self.by_qname,
            dangling: Mutex::new(HashMap::new()),
        }
    }
}

// ============================================================================
// Resolution phase
// ============================================================================

/// Sealed, read-mostly symbol table.
#[derive(Debug)]
pub struct SymbolTable {
    repo_name: String,
    commit_sha: String,
    by_symbol: HashMap<String, Term>,
    by_qname: HashMap<String, Term>,
    dangling: Mutex<HashMap<String, Term>>,
}

impl SymbolTable {
    /// Resolve a build-wide symbol id to its global identity.
    pub fn resolve_symbol(&self, symbol_id: &str) -> Option<Term> {
        self.by_symbol.get(symbol_id).cloned()
    }

    /// Resolve a qualified name, consulting registered units first, then
    /// previously minted dangling placeholders.
    pub fn resolve_qualified(&self, qualified_name: &str) -> Option<Term> {
        if let Some(iri) = self.by_qname.get(qualified_name) {
            return Some(iri.clone());
        }
        self.dangling
            .lock()
            .expect("dangling table poisoned")
            .get(qualified_name)
            .cloned()
    }

    /// Resolve a qualified name, minting a deterministic placeholder
    /// identity on first sight. The flag is true exactly once per distinct
    /// name so the caller emits the placeholder declaration exactly once.
    pub fn resolve_or_create_dangling(&self, qualified_name: &str) -> (Term, bool) {
        if let Some(iri) = self.by_qname.get(qualified_name) {
            return (iri.clone(), false);
        }
        let mut dangling = self.dangling.lock().expect("dangling table poisoned");
        if let Some(iri) = dangling.get(qualified_name) {
            return (iri.clone(), false);
        }
        let iri = ids::dangling_iri(&self.repo_name, &self.commit_sha, qualified_name);
        dangling.insert(qualified_name.to_string(), iri.clone());
        (iri, true)
    }

    pub fn repo_name(&self) -> &str {
        &self.repo_name
    }

    pub fn commit_sha(&self) -> &str {
        &self.commit_sha
    }
}

// ============================================================================
// Tests
// ============================================================================
