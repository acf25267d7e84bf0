//! Raw fact record model.
//!
//! One [`FileRecord`] per source file, delivered by a fact source as one JSON
//! object per line. Open-ended string fields from the wire (unit kinds,
//! import resolution kinds, relation kinds) are modeled as closed enums with
//! an explicit unknown/other variant so nothing is silently dropped at the
//! deserialization boundary.

use serde::{Deserialize, Serialize};

// ============================================================================
// Enums
// ============================================================================

/// Kind of a declared program unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnitKind {
    Callable,
    Classifier,
    Variable,
    Parameter,
    Type,
    /// Unmapped kind; mapped to the generic Unit type, never dropped.
    Other(String),
}

impl From<String> for UnitKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "callable" => UnitKind::Callable,
            "classifier" => UnitKind::Classifier,
            "variable" => UnitKind::Variable,
            "parameter" => UnitKind::Parameter,
            "type" => UnitKind::Type,
            _ => UnitKind::Other(value),
        }
    }
}

impl From<UnitKind> for String {
    fn from(kind: UnitKind) -> Self {
        match kind {
            UnitKind::Callable => "callable".to_string(),
            UnitKind::Classifier => "classifier".to_string(),
            UnitKind::Variable => "variable".to_string(),
            UnitKind::Parameter => "parameter".to_string(),
            UnitKind::Type => "type".to_string(),
            UnitKind::Other(other) => other,
        }
    }
}

/// How an import specifier was resolved by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportResolution {
    File,
    Package,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Relation kind of an occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relation {
    Calls,
    References,
    Reads,
    Writes,
    /// Unmapped relation; the occurrence record is still emitted, the
    /// predicate edge is omitted.
    Other(String),
}

impl Default for Relation {
    fn default() -> Self {
        Relation::Calls
    }
}

impl From<String> for Relation {
    fn from(value: String) -> Self {
        match value.as_str() {
            "calls" => Relation::Calls,
            "references" => Relation::References,
            "reads" => Relation::Reads,
            "writes" => Relation::Writes,
            _ => Relation::Other(value),
        }
    }
}

impl From<Relation> for String {
    fn from(relation: Relation) -> Self {
        match relation {
            Relation::Calls => "calls".to_string(),
            Relation::References => "references".to_string(),
            Relation::Reads => "reads".to_string(),
            Relation::Writes => "writes".to_string(),
            Relation::Other(other) => other,
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Source span, 1-based lines and columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub start_line: i64,
    pub start_col: i64,
    pub end_line: i64,
    pub end_col: i64,
}

/// One declared program unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitRecord {
    pub kind: UnitKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub qualified_name: Option<String>,
    /// Unique across the whole build, not merely per file.
    #[serde(default)]
    pub symbol_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ast_path: Option<String>,
    #[serde(default)]
    pub is_exported_default: bool,
    #[serde(default)]
    pub is_async: bool,
}

/// One import statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRecord {
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub resolved_kind: ImportResolution,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved: Option<String>,
}

/// One export naming a local unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub unit_symbol_id: Option<String>,
}

/// One call/reference/read/write occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OccurrenceRecord {
    #[serde(default)]
    pub relation: Relation,
    #[serde(default)]
    pub subject_symbol_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_symbol_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_q_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
}

/// Full raw fact record for one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub file_path: String,
    #[serde(default)]
    pub sha256: String,
    #[serde(default)]
    pub units: Vec<UnitRecord>,
    #[serde(default)]
    pub imports: Vec<ImportRecord>,
    #[serde(default)]
    pub exports: Vec<ExportRecord>,
    #[serde(default)]
    pub occurrences: Vec<OccurrenceRecord>,
    #[serde(default)]
    pub has_use_client_directive: bool,
}

// ============================================================================
// Tests
// ============================================================================
