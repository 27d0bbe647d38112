//! Given step definitions
//!
//! Steps that set up the template, context and configuration.

use akte_engine::numbering::NumberingInstance;
use akte_engine::{Block, ConditionConfig, Node, Region};
use cucumber::{gherkin::Step, given};

use crate::helpers::value_conversion::{parse_table_to_context, unescape_cell};
use crate::world::AssemblyWorld;

// =============================================================================
// Template steps
// =============================================================================

/// Table columns: `text` and optionally `level` (list level of numbering
/// instance 1; empty for an unnumbered block). The first row is a header.
#[given("a template with the following blocks:")]
fn set_template_blocks(world: &mut AssemblyWorld, step: &Step) {
    let table = step.table.as_ref().expect("step requires a table");
    world.body = table.rows.iter().skip(1).map(|row| block_from_row(row)).collect();
}

#[given(expr = "a header with the text {string}")]
fn add_header(world: &mut AssemblyWorld, text: String) {
    world.headers.push(Region::from_texts([text.as_str()]));
}

fn block_from_row(row: &[String]) -> Node {
    let text = unescape_cell(row.first().map(String::as_str).unwrap_or_default());
    let block = Block::from_text(text);
    match row.get(1).map(|l| l.trim()).filter(|l| !l.is_empty()) {
        Some(level) => {
            let level: u8 = level.parse().expect("level must be a small integer");
            block.with_numbering(1, level).into()
        }
        None => block.into(),
    }
}

// =============================================================================
// Context steps
// =============================================================================

#[given("the context:")]
fn set_context(world: &mut AssemblyWorld, step: &Step) {
    let table = step.table.as_ref().expect("step requires a table");
    world.context = parse_table_to_context(table);
}

#[given(expr = "the conditional placeholder {string} defined as:")]
fn add_conditional_placeholder(world: &mut AssemblyWorld, name: String, step: &Step) {
    let json = step.docstring.as_ref().expect("step requires a doc string");
    let config: ConditionConfig =
        serde_json::from_str(json).expect("conditional placeholder must be valid JSON");
    world.conditions.insert(name, config);
}

// =============================================================================
// Configuration steps
// =============================================================================

#[given(expr = "the removal markers are {string} for articles and {string} for blocks")]
fn set_removal_markers(world: &mut AssemblyWorld, article: String, block: String) {
    world.config = world.config.clone().with_removal_markers(article, block);
}

#[given(expr = "the numbering base id is {int}")]
fn set_base_numbering_id(world: &mut AssemblyWorld, id: u32) {
    world.config = world.config.clone().with_base_numbering_id(id);
}

// =============================================================================
// Generator steps
// =============================================================================

#[given(expr = "a content generator for {string} producing {string}")]
fn add_generator(world: &mut AssemblyWorld, tag: String, text: String) {
    world.generators.push((tag, Some(text)));
}

#[given(expr = "a failing content generator for {string}")]
fn add_failing_generator(world: &mut AssemblyWorld, tag: String) {
    world.generators.push((tag, None));
}

// =============================================================================
// Numbering steps
// =============================================================================

#[given(expr = "numbering instance {int} refers to abstract numbering {int}")]
fn add_numbering_instance(world: &mut AssemblyWorld, id: u32, abstract_id: u32) {
    world.numbering.instances.push(NumberingInstance {
        id,
        abstract_id,
        overrides: Vec::new(),
    });
}
