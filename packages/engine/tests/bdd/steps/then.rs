//! Then step definitions
//!
//! Steps that verify the assembled document and the report.

use akte_engine::{render_numbering_labels, Document};
use cucumber::{gherkin::Step, then};
use pretty_assertions::assert_eq;

use crate::helpers::value_conversion::unescape_cell;
use crate::world::AssemblyWorld;

// =============================================================================
// Document steps
// =============================================================================

#[then("the document text is:")]
fn assert_document_text(world: &mut AssemblyWorld, step: &Step) {
    let expected = step.docstring.as_ref().expect("step requires a doc string");
    assert_eq!(world.document().to_plain_text(), expected.trim_matches('\n'));
}

#[then(expr = "the document has {int} block(s)")]
fn assert_block_count(world: &mut AssemblyWorld, count: usize) {
    assert_eq!(world.document().block_count(), count);
}

#[then(expr = "block {int} has {int} run(s)")]
fn assert_run_count(world: &mut AssemblyWorld, index: usize, runs: usize) {
    let blocks = world.document().blocks();
    let block = blocks
        .get(index - 1)
        .unwrap_or_else(|| panic!("no block {index}"));
    assert_eq!(block.runs.len(), runs);
}

/// `\n` and `\t` in the expected text are unescaped.
#[then(expr = "block {int} reads {string}")]
fn assert_block_text(world: &mut AssemblyWorld, index: usize, expected: String) {
    let blocks = world.document().blocks();
    let block = blocks
        .get(index - 1)
        .unwrap_or_else(|| panic!("no block {index}"));
    assert_eq!(block.text_with_breaks(), unescape_cell(&expected));
}

#[then(expr = "block {int} has numbering label {string}")]
fn assert_numbering_label(world: &mut AssemblyWorld, index: usize, label: String) {
    let doc: &Document = world.document();
    let labels = render_numbering_labels(doc);
    let blocks = doc.blocks();
    let block = blocks
        .get(index - 1)
        .unwrap_or_else(|| panic!("no block {index}"));
    assert_eq!(labels.get(&block.id()), Some(&label));
}

#[then(expr = "the document uses {int} numbering instance(s)")]
fn assert_numbering_instances(world: &mut AssemblyWorld, count: usize) {
    assert_eq!(world.document().numbering.instances.len(), count);
}

// =============================================================================
// Report steps
// =============================================================================

#[then(expr = "the report has {int} warning(s)")]
fn assert_warning_count(world: &mut AssemblyWorld, count: usize) {
    let warnings = &world.outcome().report.warnings;
    assert_eq!(warnings.len(), count, "warnings: {warnings:?}");
}

#[then(expr = "the report contains a warning about {string}")]
fn assert_warning_contains(world: &mut AssemblyWorld, needle: String) {
    let warnings = &world.outcome().report.warnings;
    assert!(
        warnings.iter().any(|w| w.contains(&needle)),
        "Expected a warning containing {needle:?}, got {warnings:?}"
    );
}

/// Rules are counted from 1 in feature files.
#[then(expr = "conditional placeholder {string} matched rule {int}")]
fn assert_matched_rule(world: &mut AssemblyWorld, name: String, rule: usize) {
    let conditional = world
        .outcome()
        .report
        .conditionals
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no conditional placeholder {name}"));
    assert_eq!(conditional.matched_rule, rule.checked_sub(1));
}

#[then(expr = "conditional placeholder {string} used the default")]
fn assert_used_default(world: &mut AssemblyWorld, name: String) {
    let conditional = world
        .outcome()
        .report
        .conditionals
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("no conditional placeholder {name}"));
    assert_eq!(conditional.matched_rule, None);
}

#[then(expr = "{int} article(s) was/were removed")]
fn assert_articles_removed(world: &mut AssemblyWorld, count: usize) {
    assert_eq!(world.outcome().report.articles.articles_removed, count);
}

// =============================================================================
// Error steps
// =============================================================================

#[then(expr = "the assembly fails with {string}")]
fn assert_assembly_fails(world: &mut AssemblyWorld, needle: String) {
    let message = world.error_message().expect("Expected assembly to fail");
    assert!(
        message.contains(&needle),
        "Expected error containing {needle:?}, got {message:?}"
    );
}
