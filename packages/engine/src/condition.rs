//! Conditional placeholders
//!
//! A conditional placeholder picks one of several text variants by
//! evaluating an ordered list of rules against the typed context. Each rule
//! holds a condition tree of AND/OR groups and field comparisons; the first
//! rule whose condition holds supplies the result, otherwise the default is
//! used.
//!
//! # Wire format
//!
//! ```json
//! {
//!   "rules": [
//!     {
//!       "condition": {
//!         "operator": "AND",
//!         "conditions": [
//!           { "field": "AantalKopers", "operator": ">", "value": 1 },
//!           { "field": "Gehuwd", "operator": "=", "value": "ja" }
//!         ]
//!       },
//!       "result": "de kopers, [[NaamKoper1]] en [[NaamKoper2]]"
//!     }
//!   ],
//!   "default": "de koper, [[NaamKoper1]]"
//! }
//! ```
//!
//! The same `operator` key carries the logical operator of a group and the
//! comparison operator of a leaf. It is disambiguated once while parsing
//! into [`Condition`].

use crate::config::{self, NUMERIC_EPSILON};
use crate::context::PlaceholderContext;
use crate::error::{AssemblyError, Result};
use crate::trace::{StepKind, TraceBuilder, TraceNode};
use crate::types::Value;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// `[[Key]]` tokens inside a rule result.
#[allow(clippy::expect_used)]
static NESTED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\[\]]+)\]\]").expect("valid regex"));

/// Logical operator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicalOp {
    And,
    Or,
}

impl LogicalOp {
    pub fn as_str(self) -> &'static str {
        match self {
            LogicalOp::And => "AND",
            LogicalOp::Or => "OR",
        }
    }

    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_uppercase().as_str() {
            "AND" => Some(LogicalOp::And),
            "OR" => Some(LogicalOp::Or),
            _ => None,
        }
    }
}

/// Comparison operator of a leaf condition.
///
/// Unrecognized operators are kept so they can be reported at evaluation
/// time; they always evaluate to `false`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComparisonOperator {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    BeginsWith,
    EndsWith,
    In,
    NotIn,
    Empty,
    NotEmpty,
    Unknown(String),
}

impl ComparisonOperator {
    /// Parse an operator, accepting common aliases.
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "=" | "==" => ComparisonOperator::Equals,
            "!=" | "<>" => ComparisonOperator::NotEquals,
            ">" => ComparisonOperator::GreaterThan,
            ">=" => ComparisonOperator::GreaterThanOrEqual,
            "<" => ComparisonOperator::LessThan,
            "<=" => ComparisonOperator::LessThanOrEqual,
            "contains" => ComparisonOperator::Contains,
            "begins_with" | "starts_with" => ComparisonOperator::BeginsWith,
            "ends_with" => ComparisonOperator::EndsWith,
            "in" => ComparisonOperator::In,
            "not_in" => ComparisonOperator::NotIn,
            "empty" | "is_empty" => ComparisonOperator::Empty,
            "not_empty" | "is_not_empty" => ComparisonOperator::NotEmpty,
            _ => ComparisonOperator::Unknown(raw.to_string()),
        }
    }

    /// Canonical spelling.
    pub fn as_str(&self) -> &str {
        match self {
            ComparisonOperator::Equals => "=",
            ComparisonOperator::NotEquals => "!=",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::GreaterThanOrEqual => ">=",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::LessThanOrEqual => "<=",
            ComparisonOperator::Contains => "contains",
            ComparisonOperator::BeginsWith => "begins_with",
            ComparisonOperator::EndsWith => "ends_with",
            ComparisonOperator::In => "in",
            ComparisonOperator::NotIn => "not_in",
            ComparisonOperator::Empty => "empty",
            ComparisonOperator::NotEmpty => "not_empty",
            ComparisonOperator::Unknown(raw) => raw.as_str(),
        }
    }
}

/// A field comparison.
///
/// `field` and `operator` are optional on the wire; a comparison missing
/// either one is malformed and evaluates to `false`.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub field: Option<String>,
    pub operator: Option<ComparisonOperator>,
    pub value: Value,
}

impl Comparison {
    pub fn new(field: &str, operator: &str, value: impl Into<Value>) -> Self {
        Self {
            field: Some(field.to_string()),
            operator: Some(ComparisonOperator::parse(operator)),
            value: value.into(),
        }
    }

    fn label(&self) -> String {
        let field = self.field.as_deref().unwrap_or("?");
        let op = self
            .operator
            .as_ref()
            .map(ComparisonOperator::as_str)
            .unwrap_or("?");
        match self.value.to_text() {
            Some(value) => format!("{} {} {}", field, op, value),
            None => format!("{} {}", field, op),
        }
    }
}

/// Node of a condition tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub enum Condition {
    Group {
        op: LogicalOp,
        children: Vec<Condition>,
    },
    Comparison(Comparison),
}

impl Condition {
    pub fn and(children: Vec<Condition>) -> Self {
        Condition::Group {
            op: LogicalOp::And,
            children,
        }
    }

    pub fn or(children: Vec<Condition>) -> Self {
        Condition::Group {
            op: LogicalOp::Or,
            children,
        }
    }

    pub fn compare(field: &str, operator: &str, value: impl Into<Value>) -> Self {
        Condition::Comparison(Comparison::new(field, operator, value))
    }
}

/// Condition as it appears on the wire, before disambiguation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawCondition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    operator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    conditions: Option<Vec<Condition>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

impl TryFrom<RawCondition> for Condition {
    type Error = AssemblyError;

    fn try_from(raw: RawCondition) -> Result<Self> {
        match (raw.conditions, raw.field) {
            (Some(_), Some(field)) => Err(AssemblyError::InvalidCondition(format!(
                "condition has both 'conditions' and 'field' ('{}')",
                field
            ))),
            (Some(children), None) => {
                let op = match raw.operator.as_deref() {
                    None => LogicalOp::And,
                    Some(op) => LogicalOp::parse(op).ok_or_else(|| {
                        AssemblyError::InvalidCondition(format!(
                            "group operator must be AND or OR, got '{}'",
                            op
                        ))
                    })?,
                };
                Ok(Condition::Group { op, children })
            }
            (None, field) => {
                if field.is_none() && raw.value.is_none() {
                    // A bare AND/OR is a group without children
                    match raw.operator.as_deref() {
                        None => {
                            return Err(AssemblyError::InvalidCondition(
                                "condition is neither a group nor a comparison".to_string(),
                            ))
                        }
                        Some(op) => {
                            if let Some(op) = LogicalOp::parse(op) {
                                return Ok(Condition::Group {
                                    op,
                                    children: Vec::new(),
                                });
                            }
                        }
                    }
                }
                Ok(Condition::Comparison(Comparison {
                    field,
                    operator: raw.operator.as_deref().map(ComparisonOperator::parse),
                    value: raw.value.unwrap_or_default(),
                }))
            }
        }
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Group { op, children } => RawCondition {
                operator: Some(op.as_str().to_string()),
                conditions: Some(children),
                ..RawCondition::default()
            },
            Condition::Comparison(c) => RawCondition {
                operator: c.operator.map(|op| op.as_str().to_string()),
                field: c.field,
                value: Some(c.value),
                ..RawCondition::default()
            },
        }
    }
}

/// A rule: when `condition` holds, `result` is the placeholder text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub condition: Condition,
    pub result: String,
}

/// Ordered rules plus the fallback text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionConfig {
    #[serde(default)]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub default: String,
}

/// Outcome of evaluating a [`ConditionConfig`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Index of the first rule whose condition held
    pub matched_rule: Option<usize>,
    /// Result text before nested placeholder resolution
    pub raw_result: String,
    /// Evaluation trace, one node per rule tried (plus the default)
    pub steps: Vec<TraceNode>,
    /// Non-fatal problems: malformed comparisons, unknown operators
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Evaluate rules in order; the first rule whose condition holds wins.
pub fn evaluate(config: &ConditionConfig, ctx: &PlaceholderContext) -> EvaluationResult {
    let mut evaluator = Evaluator::new(ctx);

    for (index, rule) in config.rules.iter().enumerate() {
        evaluator.trace.push(format!("rule {}", index), StepKind::Rule);
        let holds = evaluator.eval(&rule.condition);
        evaluator.trace.set_outcome(holds);
        evaluator.trace.pop();

        if holds {
            return evaluator.finish(Some(index), rule.result.clone());
        }
    }

    evaluator.trace.push("default", StepKind::Default);
    evaluator.trace.set_detail(config.default.clone());
    evaluator.trace.pop();
    evaluator.finish(None, config.default.clone())
}

/// Evaluate a single condition tree without tracing.
pub fn evaluate_condition(condition: &Condition, ctx: &PlaceholderContext) -> bool {
    let mut evaluator = Evaluator::new(ctx);
    evaluator.trace = TraceBuilder::disabled();
    evaluator.eval(condition)
}

struct Evaluator<'a> {
    ctx: &'a PlaceholderContext,
    trace: TraceBuilder,
    warnings: Vec<String>,
}

impl<'a> Evaluator<'a> {
    fn new(ctx: &'a PlaceholderContext) -> Self {
        Self {
            ctx,
            trace: TraceBuilder::new(),
            warnings: Vec::new(),
        }
    }

    fn finish(self, matched_rule: Option<usize>, raw_result: String) -> EvaluationResult {
        EvaluationResult {
            matched_rule,
            raw_result,
            steps: self.trace.build(),
            warnings: self.warnings,
        }
    }

    fn eval(&mut self, condition: &Condition) -> bool {
        match condition {
            Condition::Group { op, children } => self.eval_group(*op, children),
            Condition::Comparison(comparison) => self.eval_comparison(comparison),
        }
    }

    fn eval_group(&mut self, op: LogicalOp, children: &[Condition]) -> bool {
        self.trace.push(op.as_str(), StepKind::Group);
        let result = match op {
            LogicalOp::And => {
                let mut all = true;
                for child in children {
                    if !self.eval(child) {
                        all = false;
                        break;
                    }
                }
                all
            }
            LogicalOp::Or => {
                let mut any = false;
                for child in children {
                    if self.eval(child) {
                        any = true;
                        break;
                    }
                }
                any
            }
        };
        self.trace.set_outcome(result);
        self.trace.pop();
        result
    }

    fn eval_comparison(&mut self, comparison: &Comparison) -> bool {
        self.trace.push(comparison.label(), StepKind::Comparison);
        let result = self.compare(comparison);
        self.trace.set_outcome(result);
        self.trace.pop();
        result
    }

    fn compare(&mut self, comparison: &Comparison) -> bool {
        let (Some(field), Some(operator)) = (&comparison.field, &comparison.operator) else {
            tracing::warn!(
                field = ?comparison.field,
                "Malformed comparison: 'field' and 'operator' are required"
            );
            self.warnings.push(format!(
                "malformed comparison '{}': field and operator are required",
                comparison.label()
            ));
            return false;
        };

        let actual = self.ctx.get_typed(field);
        self.trace
            .set_detail(actual.to_text().unwrap_or_else(|| "null".to_string()));

        if let ComparisonOperator::Unknown(raw) = operator {
            tracing::warn!(field = %field, operator = %raw, "Unknown comparison operator");
            self.warnings
                .push(format!("unknown operator '{}' on field '{}'", raw, field));
            return false;
        }

        apply_operator(operator, actual, &comparison.value)
    }
}

/// Apply a known comparison operator. Unknown operators yield `false`.
pub fn apply_operator(operator: &ComparisonOperator, actual: &Value, expected: &Value) -> bool {
    match operator {
        ComparisonOperator::Empty => actual.is_empty_value(),
        ComparisonOperator::NotEmpty => !actual.is_empty_value(),
        ComparisonOperator::Equals => values_equal(actual, expected),
        ComparisonOperator::NotEquals => !values_equal(actual, expected),
        ComparisonOperator::GreaterThan => compare_values(actual, expected) == Ordering::Greater,
        ComparisonOperator::GreaterThanOrEqual => {
            compare_values(actual, expected) != Ordering::Less
        }
        ComparisonOperator::LessThan => compare_values(actual, expected) == Ordering::Less,
        ComparisonOperator::LessThanOrEqual => {
            compare_values(actual, expected) != Ordering::Greater
        }
        ComparisonOperator::Contains => match actual {
            Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
            _ => text_predicate(actual, expected, |a, e| a.contains(e)),
        },
        ComparisonOperator::BeginsWith => text_predicate(actual, expected, |a, e| a.starts_with(e)),
        ComparisonOperator::EndsWith => text_predicate(actual, expected, |a, e| a.ends_with(e)),
        ComparisonOperator::In => is_in_list(actual, expected),
        ComparisonOperator::NotIn => !is_in_list(actual, expected),
        ComparisonOperator::Unknown(_) => false,
    }
}

/// Equality with boolean, then numeric, then case-insensitive string
/// coercion. Null equals null and the empty string.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => return true,
        (Value::Null, other) | (other, Value::Null) => {
            return other.as_str().is_some_and(str::is_empty)
        }
        _ => {}
    }

    if let (Some(x), Some(y)) = (a.coerce_bool(), b.coerce_bool()) {
        return x == y;
    }
    if let (Some(x), Some(y)) = (a.coerce_number(), b.coerce_number()) {
        return (x - y).abs() < NUMERIC_EPSILON;
    }
    match (a.to_text(), b.to_text()) {
        (Some(x), Some(y)) => x.to_lowercase() == y.to_lowercase(),
        _ => false,
    }
}

/// Ordering with numeric, then date, then case-insensitive lexical
/// comparison. Null sorts before any non-null value.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Less,
        (false, true) => return Ordering::Greater,
        _ => {}
    }

    if let (Some(x), Some(y)) = (a.coerce_number(), b.coerce_number()) {
        if (x - y).abs() < NUMERIC_EPSILON {
            return Ordering::Equal;
        }
        return x.partial_cmp(&y).unwrap_or(Ordering::Equal);
    }
    if let (Some(x), Some(y)) = (a.coerce_date(), b.coerce_date()) {
        return x.cmp(&y);
    }

    let x = a.to_text().unwrap_or_default().to_lowercase();
    let y = b.to_text().unwrap_or_default().to_lowercase();
    x.cmp(&y)
}

/// True when `value` equals any element of `list`.
///
/// A string list is split on commas. Null is never in a list.
pub fn is_in_list(value: &Value, list: &Value) -> bool {
    if value.is_null() {
        return false;
    }
    match list {
        Value::Array(items) => items.iter().any(|item| values_equal(value, item)),
        Value::String(s) => s
            .split(',')
            .map(|item| Value::String(item.trim().to_string()))
            .any(|item| values_equal(value, &item)),
        Value::Null => false,
        scalar => values_equal(value, scalar),
    }
}

fn text_predicate(actual: &Value, expected: &Value, f: impl Fn(&str, &str) -> bool) -> bool {
    match (actual.to_text(), expected.to_text()) {
        (Some(a), Some(e)) => f(&a.to_lowercase(), &e.to_lowercase()),
        _ => false,
    }
}

/// Resolve `[[Key]]` tokens using the string replacements of `ctx`.
///
/// Runs at most `max_depth` passes and stops early once a pass substitutes
/// nothing, so cyclic values terminate. Unknown keys stay verbatim.
pub fn resolve_nested_placeholders(
    text: &str,
    ctx: &PlaceholderContext,
    max_depth: usize,
) -> String {
    let mut current = text.to_string();
    for _ in 0..max_depth {
        let mut substituted = false;
        let next = NESTED_PLACEHOLDER
            .replace_all(&current, |caps: &regex::Captures| match ctx.get(&caps[1]) {
                Some(value) => {
                    substituted = true;
                    value.to_string()
                }
                None => caps[0].to_string(),
            })
            .into_owned();
        current = next;
        if !substituted {
            break;
        }
    }
    current
}

/// Result of one conditional placeholder.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConditionalValue {
    /// Placeholder name the value is stored under
    pub name: String,
    /// Resolved text
    pub value: String,
    pub matched_rule: Option<usize>,
    pub steps: Vec<TraceNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Named set of conditional placeholders.
///
/// Serialized as a map from placeholder name to [`ConditionConfig`];
/// evaluation follows name order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConditionalPlaceholders {
    entries: BTreeMap<String, ConditionConfig>,
}

impl ConditionalPlaceholders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns error if the content exceeds [`config::MAX_RULES_SIZE`], is
    /// not valid JSON, or contains a condition that is neither a group nor
    /// a comparison.
    pub fn from_json_str(content: &str) -> Result<Self> {
        check_size(content)?;
        let placeholders: Self = serde_json::from_str(content)?;
        tracing::debug!(count = placeholders.len(), "Parsed conditional placeholders");
        Ok(placeholders)
    }

    /// Parse from a YAML string. Same limits as [`from_json_str`](Self::from_json_str).
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        check_size(content)?;
        let placeholders: Self = serde_yaml::from_str(content)?;
        tracing::debug!(count = placeholders.len(), "Parsed conditional placeholders");
        Ok(placeholders)
    }

    /// Add or replace a placeholder definition.
    pub fn insert(&mut self, name: impl Into<String>, config: ConditionConfig) {
        self.entries.insert(name.into(), config);
    }

    pub fn with(mut self, name: impl Into<String>, config: ConditionConfig) -> Self {
        self.insert(name, config);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ConditionConfig> {
        self.entries.get(name)
    }

    /// Evaluate every placeholder and resolve nested placeholders in the
    /// chosen text.
    pub fn evaluate_all(&self, ctx: &PlaceholderContext, max_depth: usize) -> Vec<ConditionalValue> {
        self.entries
            .iter()
            .map(|(name, config)| {
                let result = evaluate(config, ctx);
                let value = resolve_nested_placeholders(&result.raw_result, ctx, max_depth);
                tracing::debug!(
                    placeholder = %name,
                    matched_rule = ?result.matched_rule,
                    "Evaluated conditional placeholder"
                );
                ConditionalValue {
                    name: name.clone(),
                    value,
                    matched_rule: result.matched_rule,
                    steps: result.steps,
                    warnings: result.warnings,
                }
            })
            .collect()
    }
}

fn check_size(content: &str) -> Result<()> {
    if content.len() > config::MAX_RULES_SIZE {
        tracing::warn!(
            size = content.len(),
            max = config::MAX_RULES_SIZE,
            "Condition rules exceed size limit"
        );
        return Err(AssemblyError::InputTooLarge {
            size: content.len(),
            max: config::MAX_RULES_SIZE,
        });
    }
    Ok(())
}
