//! Marker-based article removal and renumbering
//!
//! Template authors delete content by leaving a marker as the whole text of
//! a block:
//!
//! - the *article marker* (`^` by default) removes the enclosing article:
//!   every block from the nearest preceding main article up to the next one;
//! - the *block marker* (`#` by default) removes only that block.
//!
//! A main article is a block at list level 0 whose text starts with its
//! number and a period (`"3. Levering"`). After removal the surviving main
//! articles are renumbered 1, 2, 3, ... and indented sub-article references
//! (`"  3.1 ..."`) follow their article's new number.
//!
//! Each region is processed on its own.

use crate::config::AssemblyConfig;
use crate::document::{Block, BlockId, Document, Region};
use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static MAIN_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.").expect("valid regex"));

#[allow(clippy::expect_used)]
static SUB_ARTICLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s+(\d+)\.(\d+)").expect("valid regex"));

/// Blocks and articles marked for removal in one region.
#[derive(Debug, Default)]
pub struct ArticleRemovalState {
    pub blocks_to_remove: HashSet<BlockId>,
    pub articles_to_remove: HashSet<u32>,
}

/// What the remover did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArticleSummary {
    pub articles_removed: usize,
    pub blocks_removed: usize,
    pub articles_renumbered: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Removal markers.
#[derive(Debug, Clone)]
pub struct ArticleRemover {
    article_marker: String,
    block_marker: String,
}

impl Default for ArticleRemover {
    fn default() -> Self {
        Self::from_config(&AssemblyConfig::default())
    }
}

impl ArticleRemover {
    pub fn new(article_marker: impl Into<String>, block_marker: impl Into<String>) -> Self {
        Self {
            article_marker: article_marker.into(),
            block_marker: block_marker.into(),
        }
    }

    pub fn from_config(config: &AssemblyConfig) -> Self {
        Self::new(
            config.remove_article_marker.clone(),
            config.remove_block_marker.clone(),
        )
    }

    /// Remove marked blocks and articles, then renumber, in every region.
    pub fn process(&self, doc: &mut Document) -> ArticleSummary {
        let mut summary = ArticleSummary::default();

        for region in doc.regions_mut() {
            self.process_region(region, &mut summary);
        }

        tracing::debug!(
            articles_removed = summary.articles_removed,
            blocks_removed = summary.blocks_removed,
            renumbered = summary.articles_renumbered,
            "Processed article removal markers"
        );
        summary
    }

    fn process_region(&self, region: &mut Region, summary: &mut ArticleSummary) {
        let state = self.discover(&region.blocks(), summary);
        if state.blocks_to_remove.is_empty() && state.articles_to_remove.is_empty() {
            renumber(region, summary);
            return;
        }

        let doomed = doomed_blocks(&region.blocks(), &state);
        summary.articles_removed += state.articles_to_remove.len();
        summary.blocks_removed += region.remove_blocks(&doomed);

        renumber(region, summary);
    }

    /// Pass 1: collect marker blocks and the articles enclosing them.
    fn discover(&self, blocks: &[&Block], summary: &mut ArticleSummary) -> ArticleRemovalState {
        let mut state = ArticleRemovalState::default();

        for (index, block) in blocks.iter().enumerate() {
            let text = block.text();
            let marker = text.trim();

            if marker == self.block_marker {
                state.blocks_to_remove.insert(block.id());
            } else if marker == self.article_marker {
                match blocks[..index].iter().rev().find_map(|b| main_article_number(b)) {
                    Some(number) => {
                        state.articles_to_remove.insert(number);
                    }
                    None => {
                        tracing::warn!(
                            marker = %self.article_marker,
                            "Article removal marker without preceding article"
                        );
                        summary.warnings.push(format!(
                            "article removal marker '{}' has no preceding article",
                            self.article_marker
                        ));
                    }
                }
            }
        }
        state
    }
}

/// Old article number of a main-article block.
pub fn main_article_number(block: &Block) -> Option<u32> {
    if block.list_level() != Some(0) {
        return None;
    }
    let text = block.text();
    MAIN_ARTICLE
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Pass 2: marked blocks plus every block of a removed article.
fn doomed_blocks(blocks: &[&Block], state: &ArticleRemovalState) -> HashSet<BlockId> {
    let mut doomed = HashSet::new();
    let mut current_article = 0;

    for block in blocks {
        if let Some(number) = main_article_number(block) {
            current_article = number;
        }
        if state.blocks_to_remove.contains(&block.id())
            || (current_article > 0 && state.articles_to_remove.contains(&current_article))
        {
            doomed.insert(block.id());
        }
    }
    doomed
}

/// Passes 3 and 4: map old numbers to 1, 2, 3, ... and rewrite the texts.
fn renumber(region: &mut Region, summary: &mut ArticleSummary) {
    let mut mapping: HashMap<u32, u32> = HashMap::new();
    for block in region.blocks() {
        if let Some(old) = main_article_number(block) {
            let next = mapping.len() as u32 + 1;
            mapping.entry(old).or_insert(next);
        }
    }
    if mapping.iter().all(|(old, new)| old == new) {
        return;
    }

    region.for_each_block_mut(|block| {
        let text = block.text();
        let target = if main_article_number(block).is_some() {
            MAIN_ARTICLE.captures(&text).and_then(|caps| caps.get(1))
        } else {
            SUB_ARTICLE.captures(&text).and_then(|caps| caps.get(1))
        };
        let Some(number) = target else {
            return;
        };
        let Some(new) = number.as_str().parse::<u32>().ok().and_then(|old| mapping.get(&old))
        else {
            return;
        };
        if number.as_str() != new.to_string() {
            if main_article_number(block).is_some() {
                summary.articles_renumbered += 1;
            }
            block.replace_range(number.range(), &new.to_string());
        }
    });
}
