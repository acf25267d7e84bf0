//! Fact graph compiler: structural code facts in, queryable graph out.
//!
//! The pipeline ingests per-file raw fact records (external extractor or
//! in-process fallback), resolves symbols globally under a two-phase
//! protocol, maps records into a commit-scoped statement graph, derives
//! architecture facts through a forward-chaining rule pipeline, validates
//! against shapes, and publishes shards plus manifests.

pub mod build;
pub mod config;
pub mod error;
pub mod extract;
pub mod git;
pub mod graph;
pub mod ids;
pub mod mapper;
pub mod nextjs;
pub mod publish;
pub mod record;
pub mod resolver;
pub mod rules;
pub mod validate;
pub mod vocab;

pub use build::{run_build, BuildSummary};
pub use config::BuildConfig;
pub use error::{BuildExitCode, OntoError};
