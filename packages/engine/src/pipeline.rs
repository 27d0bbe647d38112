//! Document assembly pipeline
//!
//! Runs the assembly stages in a fixed order on a copy of the template:
//!
//! 1. scalar placeholder substitution
//! 2. conditional placeholder evaluation, followed by a second scalar pass
//!    so the chosen variants land in the text
//! 3. conditional section pruning
//! 4. content generator dispatch
//! 5. article removal markers and renumbering
//! 6. legal numbering markers
//!
//! The template is never modified. A fatal error aborts the run without
//! producing a document; recoverable problems end up in the
//! [`AssemblyReport`]. A document without a body still has its headers and
//! footers assembled; only legal numbering needs the body.
//!
//! # Example
//!
//! ```ignore
//! use akte_engine::{Document, DocumentAssembler, PlaceholderContext};
//!
//! let template = Document::from_texts(["[[ARTIKEL]]Koop", "De koper is [[NaamKoper]]."]);
//! let ctx = PlaceholderContext::new().with("NaamKoper", "Jansen");
//!
//! let outcome = DocumentAssembler::default().assemble(&template, &ctx)?;
//! println!("{}", outcome.document.to_plain_text());
//! ```

use crate::articles::{ArticleRemover, ArticleSummary};
use crate::condition::{ConditionalPlaceholders, ConditionalValue};
use crate::config::AssemblyConfig;
use crate::context::PlaceholderContext;
use crate::document::Document;
use crate::error::Result;
use crate::generators::{ContentGenerator, GeneratorRegistry, GeneratorSummary};
use crate::legal_numbering::{LegalNumbering, NumberingSummary};
use crate::placeholders::substitute_document;
use crate::sections::{prune_sections, PruneSummary};
use serde::Serialize;

// =============================================================================
// Report
// =============================================================================

/// What an assembly run did, stage by stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssemblyReport {
    /// Blocks changed by scalar substitution (both passes)
    pub substituted_blocks: usize,
    /// Conditional placeholder values with their evaluation traces
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub conditionals: Vec<ConditionalValue>,
    pub sections: PruneSummary,
    pub generators: GeneratorSummary,
    pub articles: ArticleSummary,
    pub numbering: NumberingSummary,
    /// All recoverable problems, in stage order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl AssemblyReport {
    /// Render the condition traces of all conditional placeholders.
    pub fn render_traces(&self) -> String {
        let mut out = Vec::new();
        for conditional in &self.conditionals {
            out.push(format!("{} = {:?}", conditional.name, conditional.value));
            for step in &conditional.steps {
                out.push(step.render());
            }
        }
        out.join("\n")
    }
}

/// Result of a successful assembly run.
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyOutcome {
    pub document: Document,
    pub report: AssemblyReport,
}

// =============================================================================
// Assembler
// =============================================================================

/// Assembles documents from templates.
///
/// Holds only immutable configuration, so one assembler can serve many
/// requests. All per-document state lives inside [`assemble`](Self::assemble).
#[derive(Debug, Default)]
pub struct DocumentAssembler {
    config: AssemblyConfig,
    generators: GeneratorRegistry,
    conditions: ConditionalPlaceholders,
}

impl DocumentAssembler {
    pub fn new(config: AssemblyConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Register a content generator.
    pub fn with_generator(mut self, generator: Box<dyn ContentGenerator>) -> Self {
        self.generators.register(generator);
        self
    }

    /// Set the conditional placeholders.
    pub fn with_conditions(mut self, conditions: ConditionalPlaceholders) -> Self {
        self.conditions = conditions;
        self
    }

    pub fn config(&self) -> &AssemblyConfig {
        &self.config
    }

    pub fn generators(&self) -> &GeneratorRegistry {
        &self.generators
    }

    pub fn conditions(&self) -> &ConditionalPlaceholders {
        &self.conditions
    }

    /// Assemble a document from `template` and `ctx`.
    ///
    /// # Errors
    ///
    /// Returns [`AssemblyError::InvalidDocument`](crate::AssemblyError::InvalidDocument)
    /// when the template's numbering definitions are inconsistent.
    pub fn assemble(
        &self,
        template: &Document,
        ctx: &PlaceholderContext,
    ) -> Result<AssemblyOutcome> {
        let mut doc = template.clone();
        doc.assign_ids();
        doc.numbering.validate()?;

        let mut report = AssemblyReport::default();

        tracing::debug!(
            blocks = doc.block_count(),
            placeholders = ctx.replacements().len(),
            "Assembling document"
        );

        report.substituted_blocks = substitute_document(&mut doc, ctx);

        let ctx = self.resolve_conditionals(ctx, &mut report);
        if !report.conditionals.is_empty() {
            report.substituted_blocks += substitute_document(&mut doc, &ctx);
        }

        report.sections = prune_sections(&mut doc, &ctx);
        report.warnings.extend(report.sections.warnings.iter().cloned());

        report.generators = self.generators.apply(&mut doc, &ctx);
        report
            .warnings
            .extend(report.generators.failures.iter().cloned());

        report.articles = ArticleRemover::from_config(&self.config).process(&mut doc);
        report.warnings.extend(report.articles.warnings.iter().cloned());

        report.numbering = LegalNumbering::new(self.config.base_numbering_id, &doc).process(&mut doc);
        if !doc.has_root() {
            report
                .warnings
                .push("document has no body; article numbering skipped".to_string());
        }

        tracing::debug!(
            blocks = doc.block_count(),
            warnings = report.warnings.len(),
            "Assembled document"
        );

        Ok(AssemblyOutcome {
            document: doc,
            report,
        })
    }

    /// Evaluate conditional placeholders and return a context extended with
    /// their values.
    fn resolve_conditionals(
        &self,
        ctx: &PlaceholderContext,
        report: &mut AssemblyReport,
    ) -> PlaceholderContext {
        let mut extended = ctx.clone();
        if self.conditions.is_empty() {
            return extended;
        }

        let values = self
            .conditions
            .evaluate_all(ctx, self.config.max_nesting_depth);
        for value in &values {
            extended.insert(&value.name, value.value.clone());
            report.warnings.extend(
                value
                    .warnings
                    .iter()
                    .map(|w| format!("{}: {}", value.name, w)),
            );
        }
        report.conditionals = values;
        extended
    }
}

/// Assemble with default configuration, no generators and no conditional
/// placeholders.
pub fn assemble(template: &Document, ctx: &PlaceholderContext) -> Result<AssemblyOutcome> {
    DocumentAssembler::default().assemble(template, ctx)
}
