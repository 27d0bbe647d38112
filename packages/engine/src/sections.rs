//! Conditional sections
//!
//! Spans of blocks delimited by `[[IF:Field]]` and `[[ENDIF:Field]]` are kept
//! when `Field` has a non-blank value in the context and removed otherwise.
//! The tags may sit anywhere in a block's text and the span may cover any
//! number of blocks across the whole document.
//!
//! An `ENDIF` closes the most recent open `IF` with the same field name,
//! even when other sections were opened after it; those stay open.

use crate::context::PlaceholderContext;
use crate::document::{BlockId, Document};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;

#[allow(clippy::expect_used)]
static SECTION_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[\[(IF|ENDIF):([^\]]+)\]\]").expect("valid regex")
});

/// A matched `IF`/`ENDIF` pair, by position in the block snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionalBlock {
    pub field: String,
    pub start: usize,
    pub end: usize,
}

/// What the pruner did.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PruneSummary {
    pub sections_kept: usize,
    pub sections_removed: usize,
    pub blocks_removed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Find all matched sections in a snapshot of block texts.
///
/// Returns the sections in closing order plus the fields of `IF`s that
/// were never closed and `ENDIF`s that had nothing to close.
pub fn find_sections(texts: &[String]) -> (Vec<ConditionalBlock>, Vec<String>) {
    let mut open: Vec<(usize, String)> = Vec::new();
    let mut sections = Vec::new();
    let mut warnings = Vec::new();

    for (index, text) in texts.iter().enumerate() {
        for caps in SECTION_TAG.captures_iter(text) {
            let field = caps[2].trim().to_string();
            if caps[1].eq_ignore_ascii_case("IF") {
                open.push((index, field));
                continue;
            }

            match open
                .iter()
                .rposition(|(_, name)| name.eq_ignore_ascii_case(&field))
            {
                Some(pos) => {
                    let (start, field) = open.remove(pos);
                    sections.push(ConditionalBlock {
                        field,
                        start,
                        end: index,
                    });
                }
                None => {
                    tracing::warn!(field = %field, block = index, "ENDIF without matching IF");
                    warnings.push(format!("[[ENDIF:{}]] without matching IF", field));
                }
            }
        }
    }

    for (index, field) in open {
        tracing::warn!(field = %field, block = index, "Unclosed conditional section left as-is");
        warnings.push(format!("[[IF:{}]] is never closed", field));
    }

    (sections, warnings)
}

/// Keep or remove every conditional section in the document.
pub fn prune_sections(doc: &mut Document, ctx: &PlaceholderContext) -> PruneSummary {
    let blocks = doc.blocks();
    let ids: Vec<BlockId> = blocks.iter().map(|b| b.id()).collect();
    let texts: Vec<String> = blocks.iter().map(|b| b.text()).collect();

    let (mut sections, warnings) = find_sections(&texts);
    let mut summary = PruneSummary {
        warnings,
        ..PruneSummary::default()
    };
    if sections.is_empty() {
        return summary;
    }

    sections.sort_by(|a, b| b.start.cmp(&a.start));
    let mut removed: HashSet<BlockId> = HashSet::new();

    for section in &sections {
        if ctx.has_value(&section.field) {
            summary.sections_kept += 1;
            strip_tag(doc, ids[section.start], "IF", &section.field, &mut removed);
            strip_tag(doc, ids[section.end], "ENDIF", &section.field, &mut removed);
        } else {
            summary.sections_removed += 1;
            removed.extend(&ids[section.start..=section.end]);
        }
    }

    summary.blocks_removed = doc.remove_blocks(&removed);
    tracing::debug!(
        kept = summary.sections_kept,
        removed = summary.sections_removed,
        blocks_removed = summary.blocks_removed,
        "Pruned conditional sections"
    );
    summary
}

/// Remove the first `[[KIND:field]]` tag from a block, unless the block is
/// already scheduled for removal. A block left blank is scheduled too.
fn strip_tag(
    doc: &mut Document,
    id: BlockId,
    kind: &str,
    field: &str,
    removed: &mut HashSet<BlockId>,
) {
    if removed.contains(&id) {
        return;
    }
    let Some(block) = doc.block_mut(id) else {
        return;
    };

    let text = block.text();
    let range = SECTION_TAG
        .captures_iter(&text)
        .find(|caps| {
            caps[1].eq_ignore_ascii_case(kind) && caps[2].trim().eq_ignore_ascii_case(field)
        })
        .and_then(|caps| caps.get(0))
        .map(|m| m.range());

    if let Some(range) = range {
        block.replace_range(range, "");
    }
    if block.is_blank() {
        removed.insert(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Block, Region, Run};
    use pretty_assertions::assert_eq;

    fn texts(doc: &Document) -> Vec<String> {
        doc.blocks().iter().map(|b| b.text()).collect()
    }

    mod matching {
        use super::*;
        use pretty_assertions::assert_eq;

        fn owned(texts: &[&str]) -> Vec<String> {
            texts.iter().map(|t| t.to_string()).collect()
        }

        #[test]
        fn test_simple_pair() {
            let (sections, warnings) = find_sections(&owned(&["[[IF:A]]", "x", "[[ENDIF:A]]"]));
            assert_eq!(
                sections,
                vec![ConditionalBlock {
                    field: "A".to_string(),
                    start: 0,
                    end: 2
                }]
            );
            assert!(warnings.is_empty());
        }

        #[test]
        fn test_endif_searches_whole_stack() {
            let (sections, warnings) = find_sections(&owned(&[
                "[[IF:A]]",
                "[[IF:B]]",
                "[[ENDIF:a]]",
                "[[ENDIF:B]]",
            ]));
            assert_eq!(sections.len(), 2);
            assert_eq!((sections[0].start, sections[0].end), (0, 2));
            assert_eq!((sections[1].start, sections[1].end), (1, 3));
            assert!(warnings.is_empty());
        }

        #[test]
        fn test_unclosed_and_unmatched() {
            let (sections, warnings) = find_sections(&owned(&["[[IF:A]]", "[[ENDIF:B]]"]));
            assert!(sections.is_empty());
            assert_eq!(warnings.len(), 2);
        }

        #[test]
        fn test_tags_within_one_block() {
            let (sections, _) = find_sections(&owned(&["voor [[IF:A]]midden[[ENDIF:A]] na"]));
            assert_eq!((sections[0].start, sections[0].end), (0, 0));
        }
    }

    mod pruning {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_blank_field_removes_span() {
            let mut doc = Document::from_texts(["[[IF:Has]]", "Body", "[[ENDIF:Has]]", "Na"]);
            let ctx = PlaceholderContext::new().with("Has", "");
            let summary = prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["Na"]);
            assert_eq!(summary.sections_removed, 1);
            assert_eq!(summary.blocks_removed, 3);
        }

        #[test]
        fn test_present_field_strips_tags() {
            let mut doc = Document::from_texts(["[[IF:Has]]", "Body", "[[ENDIF:Has]]"]);
            let ctx = PlaceholderContext::new().with("Has", "yes");
            let summary = prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["Body"]);
            assert_eq!(summary.sections_kept, 1);
        }

        #[test]
        fn test_strip_keeps_surrounding_text() {
            let mut doc = Document::from_texts(["Inleiding [[IF:Has]]", "Body", "[[ENDIF:Has]] slot"]);
            let ctx = PlaceholderContext::new().with("has", "ja");
            prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["Inleiding ", "Body", " slot"]);
        }

        #[test]
        fn test_missing_field_removes_span() {
            let mut doc = Document::from_texts(["a", "[[IF:Onbekend]] tekst", "[[ENDIF:Onbekend]]"]);
            prune_sections(&mut doc, &PlaceholderContext::new());
            assert_eq!(texts(&doc), vec!["a"]);
        }

        #[test]
        fn test_kept_outer_removed_inner() {
            let mut doc = Document::from_texts([
                "[[IF:Outer]]",
                "buiten",
                "[[IF:Inner]]",
                "binnen",
                "[[ENDIF:Inner]]",
                "[[ENDIF:Outer]]",
            ]);
            let ctx = PlaceholderContext::new().with("Outer", "x");
            prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["buiten"]);
        }

        #[test]
        fn test_removed_outer_wins_over_kept_inner() {
            let mut doc = Document::from_texts([
                "voor",
                "[[IF:Outer]]",
                "[[IF:Inner]]",
                "binnen",
                "[[ENDIF:Inner]]",
                "[[ENDIF:Outer]]",
            ]);
            let ctx = PlaceholderContext::new().with("Inner", "x");
            prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["voor"]);
        }

        #[test]
        fn test_unclosed_section_is_preserved() {
            let mut doc = Document::from_texts(["[[IF:A]]", "inhoud"]);
            let summary = prune_sections(&mut doc, &PlaceholderContext::new());
            assert_eq!(texts(&doc), vec!["[[IF:A]]", "inhoud"]);
            assert_eq!(summary.warnings.len(), 1);
        }

        #[test]
        fn test_section_spanning_regions() {
            let mut doc = Document::from_texts(["[[IF:A]]", "body"])
                .with_headers(vec![Region::from_texts(["kop [[ENDIF:A]]", "blijft"])]);
            prune_sections(&mut doc, &PlaceholderContext::new());
            assert_eq!(texts(&doc), vec!["blijft"]);
        }

        #[test]
        fn test_tag_split_over_runs_is_stripped() {
            let mut doc = Document::new(vec![
                Block::from_runs(vec![Run::new("[[IF:"), Run::new("A]]tekst")]).into(),
                Block::from_text("[[ENDIF:A]]").into(),
            ]);
            let ctx = PlaceholderContext::new().with("A", "ja");
            prune_sections(&mut doc, &ctx);
            assert_eq!(texts(&doc), vec!["tekst"]);
        }
    }
}
