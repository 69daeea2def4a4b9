//! Mutation instrumentation for C and C++ sources
//!
//! This library rewrites source files in place, replacing operator and
//! literal usages with calls to replacement functions. Every call receives a
//! globally unique index so an external harness can switch each mutation on
//! at runtime and check whether the test suite notices.
//!
//! Matching is done with regular expressions on raw text, not with a parser.
//! Comments, string literals, pointer subtraction and string concatenation are
//! recognised heuristically and left alone.
//!
//! # Example Rule Document
//!
//! ```yaml
//! version: "1.0"
//! groups:
//!   - kind: binary
//!     pattern: '(?P<lhs>[^\n]*) (?P<operator>\+) (?P<rhs>[^;\n]*)'
//!     member_count: 1
//!     members:
//!       - { operator: "+", mutations: 3, function: MUT_ADD }
//! ```
//!
//! With that rule `result = a + b;` becomes
//! `result = MUT_ADD(a, b, MUTATION_INDEX(0));`, and the file gains a
//! `#define MUTATION_INDEX(offset) (offset + N)` line after its includes.
//!
//! # Usage
//!
//! ```no_run
//! use mutation_instrumenter::{discover_sources, EngineSettings, MutationEngine, ProjectConfig, RuleSet};
//! use std::path::Path;
//!
//! let project = ProjectConfig::load(Path::new("project.yaml")).unwrap();
//! let rules = RuleSet::load(Path::new("mutations.yaml")).unwrap();
//! let files = discover_sources(&project.sources);
//! let report = MutationEngine::new(&rules, EngineSettings::default()).run(&files);
//! report.print();
//! ```

pub mod backup;
pub mod classifier;
pub mod codegen;
pub mod config;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod mutator;
pub mod operand;
pub mod report;
pub mod rules;

// Re-export main types at crate root
pub use backup::{backup_sources, restore_sources, BackupOutcome, RestoreSummary};
pub use config::{ProjectConfig, Settings, Sources};
pub use discovery::discover_sources;
pub use engine::{EngineSettings, MutationEngine};
pub use error::{MutationError, Result};
pub use mutator::{FileMutation, FileMutator, DEFAULT_MAX_PASSES};
pub use report::{FileStatus, RunReport};
pub use rules::{MutationKind, RuleGroup, RuleMember, RuleSet};
