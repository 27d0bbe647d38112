//! World struct for Cucumber BDD tests
//!
//! Contains the test state that persists across steps in a scenario.

use akte_engine::{
    AssemblyConfig, AssemblyError, AssemblyOutcome, ConditionalPlaceholders, ContentGenerator,
    Document, DocumentAssembler, Node, NumberingDefinitions, PlaceholderContext, Region, Result,
};
use cucumber::World;
use std::fmt;

/// Test world that holds state across steps in a Cucumber scenario.
#[derive(World, Default)]
#[world(init = Self::new)]
pub struct AssemblyWorld {
    /// Body nodes of the template
    pub body: Vec<Node>,
    /// Header regions of the template
    pub headers: Vec<Region>,
    /// Numbering definitions of the template
    pub numbering: NumberingDefinitions,
    /// Placeholder context
    pub context: PlaceholderContext,
    /// Conditional placeholders
    pub conditions: ConditionalPlaceholders,
    /// Assembly configuration
    pub config: AssemblyConfig,
    /// Registered generators: tag and produced text (`None` fails)
    pub generators: Vec<(String, Option<String>)>,
    /// Last assembly outcome (if successful)
    pub outcome: Option<AssemblyOutcome>,
    /// Last error (if assembly failed)
    pub error: Option<AssemblyError>,
}

impl fmt::Debug for AssemblyWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AssemblyWorld")
            .field("body", &self.body.len())
            .field("context", &self.context)
            .field("generators", &self.generators)
            .field("outcome", &self.outcome.as_ref().map(|o| &o.report))
            .field("error", &self.error.as_ref().map(|e| e.to_string()))
            .finish()
    }
}

/// Generator producing one fixed block, or failing.
struct FixedGenerator {
    tag: String,
    text: Option<String>,
}

impl ContentGenerator for FixedGenerator {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn generate(&self, tag: &str, _ctx: &PlaceholderContext) -> Result<Vec<Node>> {
        match &self.text {
            Some(text) => Ok(vec![akte_engine::Block::from_text(text.clone()).into()]),
            None => Err(AssemblyError::Generator {
                tag: tag.to_string(),
                message: "no data".to_string(),
            }),
        }
    }
}

impl AssemblyWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble the template and store the outcome or error.
    pub fn assemble(&mut self) {
        let mut template = Document::new(self.body.clone()).with_headers(self.headers.clone());
        template.numbering = self.numbering.clone();

        let mut assembler = DocumentAssembler::new(self.config.clone())
            .with_conditions(self.conditions.clone());
        for (tag, text) in &self.generators {
            assembler = assembler.with_generator(Box::new(FixedGenerator {
                tag: tag.clone(),
                text: text.clone(),
            }));
        }

        match assembler.assemble(&template, &self.context) {
            Ok(outcome) => {
                self.outcome = Some(outcome);
                self.error = None;
            }
            Err(e) => {
                self.outcome = None;
                self.error = Some(e);
            }
        }
    }

    /// The assembled document, panicking with the error if assembly failed.
    pub fn document(&self) -> &Document {
        match &self.outcome {
            Some(outcome) => &outcome.document,
            None => panic!("Expected successful assembly, got error: {:?}", self.error_message()),
        }
    }

    pub fn outcome(&self) -> &AssemblyOutcome {
        match &self.outcome {
            Some(outcome) => outcome,
            None => panic!("Expected successful assembly, got error: {:?}", self.error_message()),
        }
    }

    /// Get error message if assembly failed
    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }
}
