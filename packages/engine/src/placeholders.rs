//! Scalar placeholder substitution
//!
//! Recognizes four token syntaxes, all with case-insensitive keys:
//! `[[Key]]`, `<<Key>>`, `{Key}` and `[Key]`. Tokens are matched against the
//! concatenated text of a block, so a token split over several runs is still
//! found. Tokens whose key is not in the context are left verbatim.

use crate::context::PlaceholderContext;
use crate::document::{Block, Document};
use regex::{Captures, Regex};
use std::sync::LazyLock;

/// All token syntaxes in one alternation; `[[Key]]` is tried before `[Key]`.
#[allow(clippy::expect_used)]
static TOKEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\[\]]+)\]\]|<<([^<>]+)>>|\{([^{}]+)\}|\[([^\[\]]+)\]")
        .expect("valid regex")
});

/// Substitute placeholders in one block.
///
/// Returns `true` when at least one token was replaced. A value containing
/// newlines turns the block into one run per line separated by explicit
/// line breaks, all styled like the original first run. Otherwise the first
/// run receives the whole text and the other runs are dropped.
pub fn substitute_block(block: &mut Block, ctx: &PlaceholderContext) -> bool {
    let text = block.text_with_breaks();
    if !text.contains(['[', '<', '{']) {
        return false;
    }

    let Some(result) = substitute_text(&text, ctx) else {
        return false;
    };

    if result.contains('\n') {
        block.set_lines(result.split('\n'));
    } else {
        block.set_text(result);
    }
    true
}

/// Substitute placeholders in a string.
///
/// Returns `None` when nothing matched.
pub fn substitute_text(text: &str, ctx: &PlaceholderContext) -> Option<String> {
    let mut matched = false;
    let result = TOKEN_PATTERN.replace_all(text, |caps: &Captures| {
        let key = (1..=4).find_map(|i| caps.get(i)).map(|m| m.as_str());
        match key.and_then(|k| ctx.get(k)) {
            Some(value) => {
                matched = true;
                value.to_string()
            }
            None => caps[0].to_string(),
        }
    });
    matched.then(|| result.into_owned())
}

/// Substitute placeholders in every block of every region.
///
/// Returns the number of blocks changed.
pub fn substitute_document(doc: &mut Document, ctx: &PlaceholderContext) -> usize {
    if ctx.is_empty() {
        return 0;
    }
    let mut changed = 0;
    doc.for_each_block_mut(|block| {
        if substitute_block(block, ctx) {
            changed += 1;
        }
    });
    tracing::debug!(blocks = changed, "Substituted scalar placeholders");
    changed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Region, Run, RunStyle, Table};
    use pretty_assertions::assert_eq;

    fn ctx() -> PlaceholderContext {
        PlaceholderContext::new()
            .with("NaamKoper", "Jansen")
            .with("Plaats", "Utrecht")
            .with("Adres", "Hoofdstraat 1\r\n1234 AB Utrecht")
    }

    mod syntaxes {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_all_syntaxes() {
            let result = substitute_text("[[NaamKoper]] <<plaats>> {NAAMKOPER} [Plaats]", &ctx());
            assert_eq!(result.as_deref(), Some("Jansen Utrecht Jansen Utrecht"));
        }

        #[test]
        fn test_unknown_tokens_stay_verbatim() {
            let result = substitute_text("[[Onbekend]] en [[NaamKoper]] en {x}", &ctx());
            assert_eq!(result.as_deref(), Some("[[Onbekend]] en Jansen en {x}"));
        }

        #[test]
        fn test_no_match_is_none() {
            assert_eq!(substitute_text("[[IF:NaamKoper]] tekst", &ctx()), None);
            assert_eq!(substitute_text("geen tokens", &ctx()), None);
        }

        #[test]
        fn test_values_are_not_rescanned() {
            let ctx = PlaceholderContext::new().with("A", "[[B]]").with("B", "x");
            assert_eq!(substitute_text("[[A]]", &ctx).as_deref(), Some("[[B]]"));
        }
    }

    mod blocks {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_token_spanning_runs() {
            let bold = RunStyle {
                bold: true,
                ..RunStyle::default()
            };
            let mut block = Block::from_runs(vec![
                Run::styled("Koper: [[Naam", bold.clone()),
                Run::new("Koper]]"),
                Run::new(" te {Plaats}"),
            ]);

            assert!(substitute_block(&mut block, &ctx()));
            assert_eq!(block.runs.len(), 1);
            assert_eq!(block.text(), "Koper: Jansen te Utrecht");
            assert_eq!(block.runs[0].style, bold);
        }

        #[test]
        fn test_multiline_value_becomes_runs() {
            let italic = RunStyle {
                italic: true,
                ..RunStyle::default()
            };
            let mut block = Block::from_runs(vec![Run::styled("Adres: [[Adres]]", italic.clone())]);

            assert!(substitute_block(&mut block, &ctx()));
            assert_eq!(block.runs.len(), 2);
            assert_eq!(block.runs[0].text, "Adres: Hoofdstraat 1");
            assert!(!block.runs[0].break_before);
            assert_eq!(block.runs[1].text, "1234 AB Utrecht");
            assert!(block.runs[1].break_before);
            assert!(block.runs.iter().all(|r| r.style == italic));
        }

        #[test]
        fn test_unmatched_block_is_untouched() {
            let original = Block::from_runs(vec![Run::new("[[Onbekend]]"), Run::new(" rest")]);
            let mut block = original.clone();
            assert!(!substitute_block(&mut block, &ctx()));
            assert_eq!(block, original);
        }
    }

    mod documents {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn test_all_regions_and_cells() {
            let mut doc = Document::new(vec![
                Block::from_text("Body [[NaamKoper]]").into(),
                Table::from_texts(vec![vec!["Cel {Plaats}".to_string()]]).into(),
            ])
            .with_headers(vec![Region::from_texts(["Kop <<NaamKoper>>"])])
            .with_footers(vec![Region::from_texts(["Voet [Plaats]"])]);

            assert_eq!(substitute_document(&mut doc, &ctx()), 4);
            assert_eq!(
                doc.to_plain_text(),
                "Body Jansen\nCel Utrecht\nKop Jansen\nVoet Utrecht"
            );
        }

        #[test]
        fn test_empty_context_changes_nothing() {
            let mut doc = Document::from_texts(["[[NaamKoper]]"]);
            assert_eq!(substitute_document(&mut doc, &PlaceholderContext::new()), 0);
        }
    }
}
