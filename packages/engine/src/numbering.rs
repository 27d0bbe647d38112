//! Native auto-numbering definitions
//!
//! Mirrors the two-tier model of word-processor numbering:
//!
//! - An [`AbstractNumbering`] describes the levels (`"Artikel %1"`,
//!   `"%1.%2"`).
//! - A [`NumberingInstance`] binds blocks to an abstract definition. A new
//!   instance with start overrides restarts the count.
//!
//! Instance ids are handed out by a [`NumberingAllocator`] that lives for
//! one assembly session only.

use crate::config::LEGAL_ABSTRACT_NUMBERING_ID;
use crate::document::{BlockId, Document};
use crate::error::{AssemblyError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One level of an abstract numbering definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingLevel {
    /// Level index (0-based)
    pub level: u8,
    /// Display template; `%1` is the level-0 counter, `%2` the level-1 counter
    pub text: String,
    /// First value of the counter
    #[serde(default = "default_start")]
    pub start: u32,
}

fn default_start() -> u32 {
    1
}

/// An abstract numbering definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbstractNumbering {
    pub id: u32,
    pub levels: Vec<NumberingLevel>,
}

impl AbstractNumbering {
    /// The legal article list: `Artikel N` with `N.M` sub-articles.
    pub fn legal_articles() -> Self {
        Self {
            id: LEGAL_ABSTRACT_NUMBERING_ID,
            levels: vec![
                NumberingLevel {
                    level: 0,
                    text: "Artikel %1".to_string(),
                    start: 1,
                },
                NumberingLevel {
                    level: 1,
                    text: "%1.%2".to_string(),
                    start: 1,
                },
            ],
        }
    }

    fn level(&self, level: u8) -> Option<&NumberingLevel> {
        self.levels.iter().find(|l| l.level == level)
    }
}

/// Start value override for one level of an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelOverride {
    pub level: u8,
    pub start: u32,
}

/// A numbering instance bound to an abstract definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumberingInstance {
    pub id: u32,
    pub abstract_id: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<LevelOverride>,
}

impl NumberingInstance {
    fn start_for(&self, level: &NumberingLevel) -> u32 {
        self.overrides
            .iter()
            .find(|o| o.level == level.level)
            .map(|o| o.start)
            .unwrap_or(level.start)
    }
}

/// All numbering definitions of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NumberingDefinitions {
    #[serde(default)]
    pub abstracts: Vec<AbstractNumbering>,
    #[serde(default)]
    pub instances: Vec<NumberingInstance>,
}

impl NumberingDefinitions {
    /// Find an abstract definition by id.
    pub fn abstract_numbering(&self, id: u32) -> Option<&AbstractNumbering> {
        self.abstracts.iter().find(|a| a.id == id)
    }

    /// Find an instance by id.
    pub fn instance(&self, id: u32) -> Option<&NumberingInstance> {
        self.instances.iter().find(|i| i.id == id)
    }

    /// Add the abstract definition unless one with the same id exists.
    pub fn ensure_abstract(&mut self, definition: AbstractNumbering) {
        if self.abstract_numbering(definition.id).is_none() {
            self.abstracts.push(definition);
        }
    }

    /// Add an instance unless one with the same id exists.
    pub fn ensure_instance(&mut self, instance: NumberingInstance) {
        if self.instance(instance.id).is_none() {
            self.instances.push(instance);
        }
    }

    /// Check that every instance refers to a known abstract definition.
    pub fn validate(&self) -> Result<()> {
        for instance in &self.instances {
            if self.abstract_numbering(instance.abstract_id).is_none() {
                return Err(AssemblyError::InvalidDocument(format!(
                    "numbering instance {} refers to unknown abstract numbering {}",
                    instance.id, instance.abstract_id
                )));
            }
        }
        Ok(())
    }

    /// Highest instance id in use.
    pub fn max_instance_id(&self) -> Option<u32> {
        self.instances.iter().map(|i| i.id).max()
    }
}

/// Hands out numbering instance ids for one assembly session.
///
/// Ids increase monotonically and never collide with instances already
/// present in the document.
#[derive(Debug, Clone)]
pub struct NumberingAllocator {
    next_id: u32,
}

impl NumberingAllocator {
    /// Create an allocator whose first id is `base + 1`, skipping past ids
    /// the document already uses.
    pub fn new(base: u32, definitions: &NumberingDefinitions) -> Self {
        let floor = definitions.max_instance_id().unwrap_or(0).max(base);
        Self {
            next_id: floor.saturating_add(1),
        }
    }

    /// Allocate the next id.
    pub fn allocate(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

/// Compute the label native numbering would display for each numbered block.
///
/// Each instance keeps its own counters. A level-0 item resets the level-1
/// counter; start overrides of the instance are honored. Blocks bound to an
/// unknown instance or level get no label.
pub fn render_numbering_labels(doc: &Document) -> HashMap<BlockId, String> {
    #[derive(Default)]
    struct Counters {
        levels: HashMap<u8, u32>,
    }

    let mut counters: HashMap<u32, Counters> = HashMap::new();
    let mut labels = HashMap::new();

    for block in doc.blocks() {
        let Some(numbering) = block.numbering else {
            continue;
        };
        let Some(instance) = doc.numbering.instance(numbering.num_id) else {
            continue;
        };
        let Some(definition) = doc.numbering.abstract_numbering(instance.abstract_id) else {
            continue;
        };
        let Some(level) = definition.level(numbering.level) else {
            continue;
        };

        let state = counters.entry(instance.id).or_default();
        let value = match state.levels.get(&level.level) {
            Some(current) => current + 1,
            None => instance.start_for(level),
        };
        state.levels.insert(level.level, value);
        state.levels.retain(|l, _| *l <= level.level);

        let mut label = level.text.clone();
        for lower in definition.levels.iter().filter(|l| l.level <= level.level) {
            let current = state
                .levels
                .get(&lower.level)
                .copied()
                .unwrap_or_else(|| instance.start_for(lower));
            label = label.replace(&format!("%{}", lower.level + 1), &current.to_string());
        }
        labels.insert(block.id(), label);
    }

    labels
}
