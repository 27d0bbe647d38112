//! In-memory document tree
//!
//! A [`Document`] is made of [`Region`]s (body, headers, footers). Each
//! region is an ordered list of [`Node`]s: paragraphs ([`Block`]) or tables
//! whose cells contain nested nodes. Block order is the only source of
//! document order.
//!
//! # Handles
//!
//! Every block carries a [`BlockId`] that stays stable while other blocks
//! are removed or inserted. Processing stages take a snapshot of ids
//! ([`Document::block_ids`]) before mutating, then apply all removals in a
//! single pass ([`Document::remove_blocks`]). No stage mutates the tree
//! while a traversal over it is in progress.

use crate::numbering::NumberingDefinitions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::Range;

/// Stable handle of a block within one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct BlockId(u32);

impl BlockId {
    /// Id of a block that has not been attached to a document yet.
    pub const UNASSIGNED: BlockId = BlockId(0);

    /// Raw numeric value.
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Character formatting of a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStyle {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

/// A styled span of text inside a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub style: RunStyle,
    /// Explicit line break rendered before the text
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub break_before: bool,
}

impl Run {
    /// Create an unstyled run.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Create a run with the given style.
    pub fn styled(text: impl Into<String>, style: RunStyle) -> Self {
        Self {
            text: text.into(),
            style,
            break_before: false,
        }
    }
}

/// Binding of a block to a native numbering instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingRef {
    /// Numbering instance id
    pub num_id: u32,
    /// List level (0 = article, 1 = sub-article)
    pub level: u8,
}

/// A paragraph: the smallest unit addressed by removal and insertion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(skip)]
    id: BlockId,
    /// Paragraph style name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Native numbering binding, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<NumberingRef>,
    #[serde(default)]
    pub runs: Vec<Run>,
}

impl Block {
    /// Create an empty block.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a block with a single unstyled run.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            runs: vec![Run::new(text)],
            ..Self::default()
        }
    }

    /// Create a block from runs.
    pub fn from_runs(runs: Vec<Run>) -> Self {
        Self {
            runs,
            ..Self::default()
        }
    }

    /// Set the numbering binding.
    pub fn with_numbering(mut self, num_id: u32, level: u8) -> Self {
        self.numbering = Some(NumberingRef { num_id, level });
        self
    }

    /// Set the paragraph style.
    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Stable handle of this block.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// List level of the numbering binding, if any.
    pub fn list_level(&self) -> Option<u8> {
        self.numbering.map(|n| n.level)
    }

    /// Concatenated text of all runs. Line breaks are not included.
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    /// Concatenated text with explicit line breaks rendered as `\n`.
    pub fn text_with_breaks(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            if run.break_before {
                out.push('\n');
            }
            out.push_str(&run.text);
        }
        out
    }

    /// True when the text is empty or whitespace-only.
    pub fn is_blank(&self) -> bool {
        self.runs.iter().all(|r| r.text.trim().is_empty())
    }

    /// Replace the whole text, keeping the first run's style.
    ///
    /// The first run receives the text; all other runs are dropped.
    pub fn set_text(&mut self, text: impl Into<String>) {
        let text = text.into();
        match self.runs.first_mut() {
            Some(first) => {
                first.text = text;
                first.break_before = false;
                self.runs.truncate(1);
            }
            None => self.runs.push(Run::new(text)),
        }
    }

    /// Replace the whole text with one run per line, joined by explicit
    /// line breaks. Every new run copies the style of the original first run.
    pub fn set_lines<'a>(&mut self, lines: impl IntoIterator<Item = &'a str>) {
        let style = self
            .runs
            .first()
            .map(|r| r.style.clone())
            .unwrap_or_default();

        self.runs = lines
            .into_iter()
            .enumerate()
            .map(|(i, line)| Run {
                text: line.trim_end_matches('\r').to_string(),
                style: style.clone(),
                break_before: i > 0,
            })
            .collect();
    }

    /// Replace a byte range of [`text`](Self::text) while keeping run styles.
    ///
    /// The replacement goes into the first run touched by the range; the
    /// covered parts of later runs are removed. Runs that end up empty
    /// (and carry no line break) are dropped.
    pub fn replace_range(&mut self, range: Range<usize>, replacement: &str) {
        if range.start > range.end {
            return;
        }

        let mut offset = 0;
        let mut placed = false;

        for run in &mut self.runs {
            let run_start = offset;
            let run_end = offset + run.text.len();
            offset = run_end;

            let touches = if range.is_empty() {
                run_start <= range.start && range.start <= run_end
            } else {
                run_start < range.end && run_end > range.start
            };
            if !touches {
                continue;
            }

            let local_start = range.start.saturating_sub(run_start);
            let local_end = (range.end - run_start).min(run.text.len());

            if placed {
                run.text.replace_range(local_start..local_end, "");
            } else {
                run.text.replace_range(local_start..local_end, replacement);
                placed = true;
                if range.is_empty() {
                    break;
                }
            }
        }

        if !placed && !replacement.is_empty() {
            self.runs.push(Run::new(replacement));
        }

        self.runs.retain(|r| !r.text.is_empty() || r.break_before);
    }

    /// Remove every occurrence of `needle` from the text, run-aware.
    ///
    /// Returns the number of occurrences removed.
    pub fn strip(&mut self, needle: &str) -> usize {
        if needle.is_empty() {
            return 0;
        }
        let mut removed = 0;
        while let Some(pos) = self.text().find(needle) {
            self.replace_range(pos..pos + needle.len(), "");
            removed += 1;
        }
        removed
    }
}

/// A table cell holding nested nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

/// A table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a table from rows of cell texts, one block per cell.
    pub fn from_texts<R, C>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| TableRow {
                    cells: cells
                        .into_iter()
                        .map(|text| TableCell {
                            nodes: vec![Node::Block(Block::from_text(text))],
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Content node of a region or table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    Block(Block),
    Table(Table),
}

impl From<Block> for Node {
    fn from(block: Block) -> Self {
        Node::Block(block)
    }
}

impl From<Table> for Node {
    fn from(table: Table) -> Self {
        Node::Table(table)
    }
}

/// A top-level container of content.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Region {
    #[serde(default)]
    pub nodes: Vec<Node>,
}

impl Region {
    /// Create a region from nodes.
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// Create a region of plain text blocks.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            texts
                .into_iter()
                .map(|t| Node::Block(Block::from_text(t)))
                .collect(),
        )
    }

    /// All blocks in document order, including those in table cells.
    pub fn blocks(&self) -> Vec<&Block> {
        let mut out = Vec::new();
        collect_blocks(&self.nodes, &mut out);
        out
    }

    /// Snapshot of block handles in document order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks().into_iter().map(Block::id).collect()
    }

    /// Visit every block mutably, in document order.
    pub fn for_each_block_mut(&mut self, mut f: impl FnMut(&mut Block)) {
        for_each_block_mut(&mut self.nodes, &mut f);
    }

    /// Remove all blocks whose handle is in `ids`. Returns the count removed.
    pub fn remove_blocks(&mut self, ids: &HashSet<BlockId>) -> usize {
        remove_from_nodes(&mut self.nodes, ids)
    }
}

/// Which region kind a [`RegionRef`] points to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    Body,
    Header,
    Footer,
}

/// Read-only view of one region with its kind.
#[derive(Debug, Clone, Copy)]
pub struct RegionRef<'a> {
    pub kind: RegionKind,
    pub region: &'a Region,
}

/// A complete document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Main body; `None` for a document without root content
    #[serde(default)]
    pub body: Option<Region>,
    #[serde(default)]
    pub headers: Vec<Region>,
    #[serde(default)]
    pub footers: Vec<Region>,
    /// Native numbering definitions
    #[serde(default)]
    pub numbering: NumberingDefinitions,
    #[serde(skip)]
    next_id: u32,
}

impl Document {
    /// Create a document with the given body nodes.
    pub fn new(body: Vec<Node>) -> Self {
        Self::from_regions(Some(Region::new(body)), Vec::new(), Vec::new())
    }

    /// Create a document from explicit regions.
    pub fn from_regions(body: Option<Region>, headers: Vec<Region>, footers: Vec<Region>) -> Self {
        let mut doc = Self {
            body,
            headers,
            footers,
            numbering: NumberingDefinitions::default(),
            next_id: 0,
        };
        doc.assign_ids();
        doc
    }

    /// Create a document whose body consists of plain text blocks.
    pub fn from_texts<'a>(texts: impl IntoIterator<Item = &'a str>) -> Self {
        Self::from_regions(Some(Region::from_texts(texts)), Vec::new(), Vec::new())
    }

    /// Parse a document from JSON and assign block handles.
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        let mut doc: Document = serde_json::from_str(json)?;
        doc.assign_ids();
        Ok(doc)
    }

    /// Set the header regions.
    pub fn with_headers(mut self, headers: Vec<Region>) -> Self {
        self.headers = headers;
        self.assign_ids();
        self
    }

    /// Set the footer regions.
    pub fn with_footers(mut self, footers: Vec<Region>) -> Self {
        self.footers = footers;
        self.assign_ids();
        self
    }

    /// True when the document has a body.
    pub fn has_root(&self) -> bool {
        self.body.is_some()
    }

    /// Give every block without a handle a fresh one.
    pub fn assign_ids(&mut self) {
        let mut next = self.next_id;
        for_each_block_in_doc_mut(self, &mut |block| {
            if block.id == BlockId::UNASSIGNED {
                next += 1;
                block.id = BlockId(next);
            }
        });
        self.next_id = next;
    }

    /// Regions in processing order: body, headers, footers.
    pub fn regions(&self) -> Vec<RegionRef<'_>> {
        let mut out = Vec::new();
        if let Some(body) = &self.body {
            out.push(RegionRef {
                kind: RegionKind::Body,
                region: body,
            });
        }
        out.extend(self.headers.iter().map(|region| RegionRef {
            kind: RegionKind::Header,
            region,
        }));
        out.extend(self.footers.iter().map(|region| RegionRef {
            kind: RegionKind::Footer,
            region,
        }));
        out
    }

    /// All blocks across all regions, in document order.
    pub fn blocks(&self) -> Vec<&Block> {
        self.regions()
            .into_iter()
            .flat_map(|r| r.region.blocks())
            .collect()
    }

    /// Snapshot of all block handles, in document order.
    pub fn block_ids(&self) -> Vec<BlockId> {
        self.blocks().into_iter().map(Block::id).collect()
    }

    /// Total number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks().len()
    }

    /// Find a block by handle.
    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks().into_iter().find(|b| b.id == id)
    }

    /// Find a block by handle for mutation.
    pub fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.regions_mut()
            .into_iter()
            .find_map(|region| find_block_mut(&mut region.nodes, id))
    }

    /// Visit every block mutably, in document order.
    pub fn for_each_block_mut(&mut self, mut f: impl FnMut(&mut Block)) {
        for_each_block_in_doc_mut(self, &mut f);
    }

    /// Remove all blocks whose handle is in `ids`, in one pass.
    ///
    /// Returns the number of blocks removed.
    pub fn remove_blocks(&mut self, ids: &HashSet<BlockId>) -> usize {
        if ids.is_empty() {
            return 0;
        }
        self.regions_mut()
            .into_iter()
            .map(|region| region.remove_blocks(ids))
            .sum()
    }

    /// Replace a block with a sequence of nodes. New blocks get handles.
    ///
    /// Returns `false` when the handle is unknown.
    pub fn replace_block(&mut self, id: BlockId, replacement: Vec<Node>) -> bool {
        let mut replacement = Some(replacement);
        let replaced = self
            .regions_mut()
            .into_iter()
            .any(|region| splice_nodes(&mut region.nodes, id, &mut replacement));
        if replaced {
            self.assign_ids();
        }
        replaced
    }

    /// Render the document as plain text, one line per block.
    ///
    /// Blocks bound to native numbering are prefixed with the label the
    /// numbering would display. Line breaks inside a block become `\n`.
    pub fn to_plain_text(&self) -> String {
        let labels = crate::numbering::render_numbering_labels(self);
        let mut lines = Vec::new();
        for block in self.blocks() {
            let mut line = String::new();
            if let Some(label) = labels.get(&block.id) {
                line.push_str(label);
                line.push(' ');
            }
            line.push_str(&block.text_with_breaks());
            lines.push(line);
        }
        lines.join("\n")
    }

    /// Mutable regions in processing order: body, headers, footers.
    pub fn regions_mut(&mut self) -> Vec<&mut Region> {
        let mut out: Vec<&mut Region> = Vec::new();
        if let Some(body) = self.body.as_mut() {
            out.push(body);
        }
        out.extend(self.headers.iter_mut());
        out.extend(self.footers.iter_mut());
        out
    }
}

fn collect_blocks<'a>(nodes: &'a [Node], out: &mut Vec<&'a Block>) {
    for node in nodes {
        match node {
            Node::Block(block) => out.push(block),
            Node::Table(table) => {
                for cell in table.rows.iter().flat_map(|r| r.cells.iter()) {
                    collect_blocks(&cell.nodes, out);
                }
            }
        }
    }
}

fn for_each_block_in_doc_mut(doc: &mut Document, f: &mut dyn FnMut(&mut Block)) {
    for region in doc.regions_mut() {
        for_each_block_mut(&mut region.nodes, f);
    }
}

fn for_each_block_mut(nodes: &mut [Node], f: &mut dyn FnMut(&mut Block)) {
    for node in nodes {
        match node {
            Node::Block(block) => f(block),
            Node::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    for_each_block_mut(&mut cell.nodes, f);
                }
            }
        }
    }
}

fn find_block_mut(nodes: &mut [Node], id: BlockId) -> Option<&mut Block> {
    for node in nodes {
        match node {
            Node::Block(block) if block.id == id => return Some(block),
            Node::Block(_) => {}
            Node::Table(table) => {
                for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                    if let Some(found) = find_block_mut(&mut cell.nodes, id) {
                        return Some(found);
                    }
                }
            }
        }
    }
    None
}

fn remove_from_nodes(nodes: &mut Vec<Node>, ids: &HashSet<BlockId>) -> usize {
    let before = nodes.len();
    nodes.retain(|node| !matches!(node, Node::Block(b) if ids.contains(&b.id)));
    let mut removed = before - nodes.len();

    for node in nodes.iter_mut() {
        if let Node::Table(table) = node {
            for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                removed += remove_from_nodes(&mut cell.nodes, ids);
            }
        }
    }
    removed
}

fn splice_nodes(nodes: &mut Vec<Node>, id: BlockId, replacement: &mut Option<Vec<Node>>) -> bool {
    if let Some(index) = nodes
        .iter()
        .position(|n| matches!(n, Node::Block(b) if b.id == id))
    {
        let new_nodes = replacement.take().unwrap_or_default();
        nodes.splice(index..=index, new_nodes);
        return true;
    }

    for node in nodes.iter_mut() {
        if let Node::Table(table) = node {
            for cell in table.rows.iter_mut().flat_map(|r| r.cells.iter_mut()) {
                if splice_nodes(&mut cell.nodes, id, replacement) {
                    return true;
                }
            }
        }
    }
    false
}
