//! Content generator registry
//!
//! Content generators turn structured context data into document content,
//! typically tables (parties, cadastral parcels, payment schedules). Each
//! generator is registered for one placeholder tag; a block whose text
//! contains the tag is replaced by the nodes the generator returns.
//!
//! # Example
//!
//! ```ignore
//! use akte_engine::{ContentGenerator, GeneratorRegistry, Node, PlaceholderContext, Result};
//!
//! struct PartiesTable;
//!
//! impl ContentGenerator for PartiesTable {
//!     fn tag(&self) -> &str {
//!         "[[TABEL_PARTIJEN]]"
//!     }
//!
//!     fn generate(&self, _tag: &str, ctx: &PlaceholderContext) -> Result<Vec<Node>> {
//!         // build a table from ctx
//!         Ok(vec![])
//!     }
//! }
//!
//! let mut registry = GeneratorRegistry::new();
//! registry.register(Box::new(PartiesTable));
//! ```

use crate::context::PlaceholderContext;
use crate::document::{BlockId, Document, Node};
use crate::error::Result;
use serde::Serialize;

/// Produces document content for a placeholder tag.
pub trait ContentGenerator: Send + Sync {
    /// The exact placeholder tag this generator handles.
    fn tag(&self) -> &str;

    /// Build the nodes that replace the block containing the tag.
    ///
    /// An error leaves the block unresolved; the rest of the document is
    /// still assembled.
    fn generate(&self, tag: &str, ctx: &PlaceholderContext) -> Result<Vec<Node>>;
}

/// What the generator stage did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GeneratorSummary {
    pub invoked: usize,
    pub replaced: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<String>,
}

/// Generators in registration order.
#[derive(Default)]
pub struct GeneratorRegistry {
    generators: Vec<Box<dyn ContentGenerator>>,
}

impl GeneratorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a generator. Earlier registrations win on overlapping tags.
    pub fn register(&mut self, generator: Box<dyn ContentGenerator>) {
        self.generators.push(generator);
    }

    pub fn with(mut self, generator: Box<dyn ContentGenerator>) -> Self {
        self.register(generator);
        self
    }

    pub fn len(&self) -> usize {
        self.generators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn tags(&self) -> Vec<&str> {
        self.generators.iter().map(|g| g.tag()).collect()
    }

    /// First generator whose tag occurs in `text`.
    pub fn find(&self, text: &str) -> Option<&dyn ContentGenerator> {
        self.generators
            .iter()
            .find(|g| !g.tag().is_empty() && text.contains(g.tag()))
            .map(|g| g.as_ref())
    }

    /// Replace every block containing a registered tag with generated
    /// content. At most one generator runs per block.
    pub fn apply(&self, doc: &mut Document, ctx: &PlaceholderContext) -> GeneratorSummary {
        let mut summary = GeneratorSummary::default();
        if self.generators.is_empty() {
            return summary;
        }

        let targets: Vec<(BlockId, &dyn ContentGenerator)> = doc
            .blocks()
            .into_iter()
            .filter_map(|block| self.find(&block.text()).map(|g| (block.id(), g)))
            .collect();

        for (id, generator) in targets {
            summary.invoked += 1;
            match generator.generate(generator.tag(), ctx) {
                Ok(nodes) => {
                    if doc.replace_block(id, nodes) {
                        summary.replaced += 1;
                    }
                }
                Err(err) => {
                    tracing::warn!(tag = %generator.tag(), error = %err, "Content generator failed");
                    summary.failures.push(format!("{}: {}", generator.tag(), err));
                }
            }
        }

        tracing::debug!(
            invoked = summary.invoked,
            replaced = summary.replaced,
            failed = summary.failures.len(),
            "Ran content generators"
        );
        summary
    }
}

impl std::fmt::Debug for GeneratorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}
