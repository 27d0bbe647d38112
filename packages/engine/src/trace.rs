//! Evaluation tracing for conditional placeholders
//!
//! Records how a [`ConditionConfig`](crate::condition::ConditionConfig)
//! arrived at its result: which rules were tried, how each group
//! short-circuited, and what every comparison saw. Useful for explaining
//! to template authors why a particular text variant ended up in a
//! document.
//!
//! # Example
//!
//! ```ignore
//! use akte_engine::trace::{StepKind, TraceBuilder};
//!
//! let mut builder = TraceBuilder::new();
//! builder.push("rule 0", StepKind::Rule);
//! builder.push("AantalKopers > 1", StepKind::Comparison);
//! builder.set_outcome(true);
//! builder.pop();
//! builder.set_outcome(true);
//! let trace = builder.build();
//! ```

use serde::Serialize;

/// Kind of evaluation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Rule,
    Group,
    Comparison,
    Default,
}

impl StepKind {
    fn as_str(self) -> &'static str {
        match self {
            StepKind::Rule => "rule",
            StepKind::Group => "group",
            StepKind::Comparison => "comparison",
            StepKind::Default => "default",
        }
    }
}

/// A node in the evaluation trace tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceNode {
    /// Type of this step
    pub kind: StepKind,

    /// Human-readable description (e.g. `AantalKopers > 1`)
    pub name: String,

    /// Boolean outcome of the step, if it completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<bool>,

    /// Extra information such as the looked-up field value
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,

    /// Nested steps
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TraceNode>,
}

impl TraceNode {
    /// Create a new node with the given kind and name.
    pub fn new(kind: StepKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            outcome: None,
            detail: None,
            children: Vec::new(),
        }
    }

    /// Set the outcome.
    pub fn with_outcome(mut self, outcome: bool) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set the detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Add a child node.
    pub fn with_child(mut self, child: TraceNode) -> Self {
        self.children.push(child);
        self
    }

    /// Render the trace as a human-readable tree string.
    ///
    /// Produces output like:
    /// ```text
    /// rule 0 (rule) = true
    /// +-- AND (group) = true
    /// |   +-- AantalKopers > 1 (comparison) [2] = true
    /// |   `-- Gehuwd = ja (comparison) [true] = true
    /// `-- ...
    /// ```
    pub fn render(&self) -> String {
        self.render_lines().join("\n")
    }

    fn render_lines(&self) -> Vec<String> {
        let mut line = format!("{} ({})", self.name, self.kind.as_str());
        if let Some(detail) = &self.detail {
            line.push_str(&format!(" [{}]", detail));
        }
        if let Some(outcome) = self.outcome {
            line.push_str(&format!(" = {}", outcome));
        }

        let mut lines = vec![line];
        let child_count = self.children.len();
        for (i, child) in self.children.iter().enumerate() {
            let is_last = i + 1 == child_count;
            let (first_prefix, rest_prefix) = if is_last {
                ("`-- ", "    ")
            } else {
                ("+-- ", "|   ")
            };
            for (j, child_line) in child.render_lines().into_iter().enumerate() {
                let prefix = if j == 0 { first_prefix } else { rest_prefix };
                lines.push(format!("{}{}", prefix, child_line));
            }
        }

        lines
    }
}

/// Builder for traces using a stack of open steps.
///
/// Steps are pushed when evaluation enters a rule, group or comparison and
/// popped when it leaves; popped steps become children of the step below.
#[derive(Debug)]
pub struct TraceBuilder {
    stack: Vec<TraceNode>,
    finished: Vec<TraceNode>,
    enabled: bool,
}

impl Default for TraceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TraceBuilder {
    /// Create a builder with tracing enabled.
    pub fn new() -> Self {
        Self {
            stack: Vec::new(),
            finished: Vec::new(),
            enabled: true,
        }
    }

    /// Create a builder that records nothing.
    pub fn disabled() -> Self {
        Self {
            stack: Vec::new(),
            finished: Vec::new(),
            enabled: false,
        }
    }

    /// Check if tracing is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Open a new step.
    pub fn push(&mut self, name: impl Into<String>, kind: StepKind) {
        if !self.enabled {
            return;
        }
        self.stack.push(TraceNode::new(kind, name));
    }

    /// Set the outcome of the current step.
    pub fn set_outcome(&mut self, outcome: bool) {
        if let Some(current) = self.stack.last_mut() {
            current.outcome = Some(outcome);
        }
    }

    /// Set the detail of the current step.
    pub fn set_detail(&mut self, detail: impl Into<String>) {
        if let Some(current) = self.stack.last_mut() {
            current.detail = Some(detail.into());
        }
    }

    /// Close the current step.
    ///
    /// A step without a parent becomes a finished top-level step.
    pub fn pop(&mut self) {
        let Some(completed) = self.stack.pop() else {
            return;
        };
        match self.stack.last_mut() {
            Some(parent) => parent.children.push(completed),
            None => self.finished.push(completed),
        }
    }

    /// Close all open steps and return the top-level steps.
    pub fn build(mut self) -> Vec<TraceNode> {
        while !self.stack.is_empty() {
            self.pop();
        }
        self.finished
    }

    /// Number of open steps.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }
}
