//! Akte Engine
//!
//! Assembles notarial deeds and similar legal documents from reusable
//! templates. This library provides:
//! - An in-memory document tree with stable block handles
//! - Scalar placeholder substitution (`[[Key]]`, `<<Key>>`, `{Key}`, `[Key]`)
//! - Conditional placeholders driven by AND/OR condition trees
//! - `[[IF:Field]]` / `[[ENDIF:Field]]` section pruning
//! - Marker-based article removal with contiguous renumbering
//! - Legal article numbering with restartable native numbering
//!
//! # Example
//!
//! ```ignore
//! use akte_engine::{Document, DocumentAssembler, PlaceholderContext};
//!
//! let template = Document::from_json(&template_json)?;
//! let ctx = PlaceholderContext::from_json(&context_json)?;
//!
//! let outcome = DocumentAssembler::default().assemble(&template, &ctx)?;
//! for warning in &outcome.report.warnings {
//!     eprintln!("warning: {warning}");
//! }
//! ```

pub mod articles;
pub mod condition;
pub mod config;
pub mod context;
pub mod document;
pub mod error;
pub mod generators;
pub mod legal_numbering;
pub mod numbering;
pub mod pipeline;
pub mod placeholders;
pub mod sections;
pub mod trace;
pub mod types;

// Re-export commonly used items
pub use articles::{ArticleRemover, ArticleSummary};
pub use condition::{
    evaluate, resolve_nested_placeholders, Comparison, ComparisonOperator, Condition,
    ConditionConfig, ConditionalPlaceholders, ConditionalValue, EvaluationResult, LogicalOp, Rule,
};
pub use config::AssemblyConfig;
pub use context::{CaseInsensitiveMap, PlaceholderContext};
pub use document::{
    Block, BlockId, Document, Node, NumberingRef, Region, Run, RunStyle, Table, TableCell,
    TableRow,
};
pub use error::{AssemblyError, Result};
pub use generators::{ContentGenerator, GeneratorRegistry, GeneratorSummary};
pub use legal_numbering::{process_numbering_markers, LegalNumbering, NumberingSummary};
pub use numbering::{render_numbering_labels, NumberingAllocator, NumberingDefinitions};
pub use pipeline::{assemble, AssemblyOutcome, AssemblyReport, DocumentAssembler};
pub use placeholders::{substitute_block, substitute_document};
pub use sections::{prune_sections, PruneSummary};
pub use trace::{StepKind, TraceNode};
pub use types::Value;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
