//! Legal article numbering
//!
//! Processes numbering markers left to right over every block of every
//! region:
//!
//! | Marker               | Effect                                                        |
//! |----------------------|---------------------------------------------------------------|
//! | `[[ARTIKEL]]`        | bind block to level 0 of the active sequence                  |
//! | `[[SUBARTIKEL]]`     | bind block to level 1 of the active sequence                  |
//! | `[[ARTIKEL_NR]]`     | plain text article number                                     |
//! | `[[SUBARTIKEL_NR]]`  | plain text `N.M` reference                                    |
//! | `[[ARTIKEL_RESET]]`  | start a new sequence (new numbering instance, restart at 1)   |
//!
//! Native bindings are rendered by the numbering definition; plain-text
//! markers are substituted from the session counters. Both marker kinds
//! advance the same counters, so plain references written after native
//! articles continue from them.

use crate::document::{BlockId, Document, NumberingRef};
use crate::numbering::{
    AbstractNumbering, LevelOverride, NumberingAllocator, NumberingInstance,
};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

/// Matches any numbering marker.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static MARKER_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[(ARTIKEL_RESET|SUBARTIKEL_NR|ARTIKEL_NR|SUBARTIKEL|ARTIKEL)\]\]")
        .expect("valid regex")
});

/// Kind of numbering marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumberingMarker {
    ArticleBegin,
    SubArticleBegin,
    ArticleNumber,
    SubArticleNumber,
    Reset,
}

impl NumberingMarker {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "ARTIKEL" => Some(Self::ArticleBegin),
            "SUBARTIKEL" => Some(Self::SubArticleBegin),
            "ARTIKEL_NR" => Some(Self::ArticleNumber),
            "SUBARTIKEL_NR" => Some(Self::SubArticleNumber),
            "ARTIKEL_RESET" => Some(Self::Reset),
            _ => None,
        }
    }
}

/// Counters of one numbering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberingState {
    /// Numbering instance new bindings attach to
    pub active_sequence_id: u32,
    /// Next plain article number
    pub article_counter: u32,
    /// Next plain sub-article number within the current article
    pub sub_article_counter: u32,
}

impl NumberingState {
    fn new(base_id: u32) -> Self {
        Self {
            active_sequence_id: base_id,
            article_counter: 1,
            sub_article_counter: 1,
        }
    }
}

/// What a numbering pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NumberingSummary {
    pub articles: usize,
    pub sub_articles: usize,
    pub article_numbers: usize,
    pub sub_article_numbers: usize,
    pub resets: usize,
    pub blocks_removed: usize,
}

impl NumberingSummary {
    /// Total markers processed.
    pub fn markers(&self) -> usize {
        self.articles
            + self.sub_articles
            + self.article_numbers
            + self.sub_article_numbers
            + self.resets
    }
}

/// Numbering engine for one document processing session.
pub struct LegalNumbering {
    base_id: u32,
    allocator: NumberingAllocator,
    state: NumberingState,
}

impl LegalNumbering {
    /// Create an engine for `doc` starting at `base_id`.
    pub fn new(base_id: u32, doc: &Document) -> Self {
        Self {
            base_id,
            allocator: NumberingAllocator::new(base_id, &doc.numbering),
            state: NumberingState::new(base_id),
        }
    }

    /// Process all numbering markers in the document.
    pub fn process(&mut self, doc: &mut Document) -> NumberingSummary {
        let mut summary = NumberingSummary::default();

        if !doc.has_root() {
            tracing::warn!("Document has no body, skipping article numbering");
            return summary;
        }

        let snapshot: Vec<BlockId> = doc
            .blocks()
            .into_iter()
            .filter(|b| MARKER_PATTERN.is_match(&b.text()))
            .map(|b| b.id())
            .collect();

        if snapshot.is_empty() {
            return summary;
        }

        doc.numbering
            .ensure_abstract(AbstractNumbering::legal_articles());
        doc.numbering.ensure_instance(NumberingInstance {
            id: self.base_id,
            abstract_id: AbstractNumbering::legal_articles().id,
            overrides: Vec::new(),
        });

        let mut to_remove = HashSet::new();
        for id in snapshot {
            let (reset_seen, blank) = self.process_block(doc, id, &mut summary);
            if reset_seen && blank {
                to_remove.insert(id);
            }
        }

        summary.blocks_removed = doc.remove_blocks(&to_remove);

        tracing::debug!(
            markers = summary.markers(),
            resets = summary.resets,
            removed = summary.blocks_removed,
            "Processed numbering markers"
        );
        summary
    }

    /// Handle every marker in one block, in text order.
    ///
    /// Returns whether a reset marker was seen and whether the block ended
    /// up blank.
    fn process_block(
        &mut self,
        doc: &mut Document,
        id: BlockId,
        summary: &mut NumberingSummary,
    ) -> (bool, bool) {
        let mut reset_seen = false;

        loop {
            let Some(block) = doc.block(id) else {
                return (reset_seen, false);
            };
            let text = block.text();
            let Some(caps) = MARKER_PATTERN.captures(&text) else {
                break;
            };
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                break;
            };
            let Some(marker) = NumberingMarker::from_name(name.as_str()) else {
                break;
            };
            let range = whole.range();

            let (replacement, binding) = match marker {
                NumberingMarker::ArticleBegin => {
                    summary.articles += 1;
                    self.state.article_counter += 1;
                    self.state.sub_article_counter = 1;
                    (String::new(), Some(self.binding(0)))
                }
                NumberingMarker::SubArticleBegin => {
                    summary.sub_articles += 1;
                    self.state.sub_article_counter += 1;
                    (String::new(), Some(self.binding(1)))
                }
                NumberingMarker::ArticleNumber => {
                    summary.article_numbers += 1;
                    let number = self.state.article_counter.to_string();
                    self.state.article_counter += 1;
                    self.state.sub_article_counter = 1;
                    (number, None)
                }
                NumberingMarker::SubArticleNumber => {
                    summary.sub_article_numbers += 1;
                    let reference = format!(
                        "{}.{}",
                        self.state.article_counter.saturating_sub(1),
                        self.state.sub_article_counter
                    );
                    self.state.sub_article_counter += 1;
                    (reference, None)
                }
                NumberingMarker::Reset => {
                    summary.resets += 1;
                    reset_seen = true;
                    self.restart(doc);
                    (String::new(), None)
                }
            };

            let Some(block) = doc.block_mut(id) else {
                return (reset_seen, false);
            };
            block.replace_range(range, &replacement);
            if let Some(binding) = binding {
                block.numbering = Some(binding);
            }
        }

        let blank = doc.block(id).is_some_and(|b| b.is_blank());
        (reset_seen, blank)
    }

    fn binding(&self, level: u8) -> NumberingRef {
        NumberingRef {
            num_id: self.state.active_sequence_id,
            level,
        }
    }

    /// Start a new numbering sequence restarting both levels at 1.
    fn restart(&mut self, doc: &mut Document) {
        let id = self.allocator.allocate();
        doc.numbering.ensure_instance(NumberingInstance {
            id,
            abstract_id: AbstractNumbering::legal_articles().id,
            overrides: vec![
                LevelOverride { level: 0, start: 1 },
                LevelOverride { level: 1, start: 1 },
            ],
        });
        tracing::debug!(sequence = id, "Restarted article numbering");

        self.state.active_sequence_id = id;
        self.state.article_counter = 1;
        self.state.sub_article_counter = 1;
    }
}

/// Process numbering markers with a fresh session starting at `base_id`.
pub fn process_numbering_markers(doc: &mut Document, base_id: u32) -> NumberingSummary {
    LegalNumbering::new(base_id, doc).process(doc)
}
