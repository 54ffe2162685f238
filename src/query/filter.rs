//! Filter expressions
//!
//! A filter is a JSON object. Field keys map either to a scalar (shorthand
//! for `$eq`) or to an object of operators; `AND` and `OR` hold arrays of
//! nested filters. All entries of one object are combined with AND.
//!
//! ```json
//! { "title": { "$iContains": "drill" },
//!   "OR": [ { "price": { "$between": [10, 50] } }, { "price": { "$null": true } } ] }
//! ```

use crate::shared::error::AppError;
use crate::shared::validation::ValidationUtils;
use serde_json::{Map, Value};
use std::fmt;

pub const AND_KEY: &str = "AND";
pub const OR_KEY: &str = "OR";

/// Nesting limit for `AND`/`OR` groups
pub const MAX_FILTER_DEPTH: usize = 16;

/// Comparison operator of a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
    Contains,
    NotContains,
    IContains,
    NotIContains,
    Null,
    NotNull,
    Between,
}

impl FilterOp {
    pub const ALL: [FilterOp; 15] = [
        FilterOp::Eq,
        FilterOp::Ne,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::In,
        FilterOp::NotIn,
        FilterOp::Contains,
        FilterOp::NotContains,
        FilterOp::IContains,
        FilterOp::NotIContains,
        FilterOp::Null,
        FilterOp::NotNull,
        FilterOp::Between,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FilterOp::Eq => "$eq",
            FilterOp::Ne => "$ne",
            FilterOp::Gt => "$gt",
            FilterOp::Gte => "$gte",
            FilterOp::Lt => "$lt",
            FilterOp::Lte => "$lte",
            FilterOp::In => "$in",
            FilterOp::NotIn => "$nIn",
            FilterOp::Contains => "$contains",
            FilterOp::NotContains => "$nContains",
            FilterOp::IContains => "$iContains",
            FilterOp::NotIContains => "$nIContains",
            FilterOp::Null => "$null",
            FilterOp::NotNull => "$notNull",
            FilterOp::Between => "$between",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == key)
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single `field <op> value` test
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

impl Condition {
    /// Build a condition, checking the field name and operand shape
    pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> crate::Result<Self> {
        let field = field.into();
        ValidationUtils::validate_identifier(&field).map_err(|e| AppError::Filter(e.to_string()))?;
        check_operand(&field, op, &value)?;
        Ok(Self { field, op, value })
    }
}

/// Parsed filter tree
#[derive(Debug, Clone, PartialEq)]
pub enum FilterNode {
    Condition(Condition),
    And(Vec<FilterNode>),
    Or(Vec<FilterNode>),
}

impl FilterNode {
    /// Parse a filter object
    pub fn parse(value: &Value) -> crate::Result<Self> {
        parse_object(value, 0)
    }

    /// Number of conditions in the tree
    pub fn condition_count(&self) -> usize {
        match self {
            FilterNode::Condition(_) => 1,
            FilterNode::And(children) | FilterNode::Or(children) => {
                children.iter().map(FilterNode::condition_count).sum()
            }
        }
    }
}

fn parse_object(value: &Value, depth: usize) -> crate::Result<FilterNode> {
    if depth > MAX_FILTER_DEPTH {
        return Err(AppError::Filter(format!(
            "filter nesting exceeds {} levels",
            MAX_FILTER_DEPTH
        )));
    }

    let object = value
        .as_object()
        .ok_or_else(|| AppError::Filter(format!("expected a filter object, found {}", type_name(value))))?;

    let mut children = Vec::with_capacity(object.len());
    for (key, entry) in sorted_entries(object) {
        match key.as_str() {
            AND_KEY => children.push(FilterNode::And(parse_group(key, entry, depth)?)),
            OR_KEY => children.push(FilterNode::Or(parse_group(key, entry, depth)?)),
            field => parse_field(field, entry, &mut children)?,
        }
    }

    Ok(match children.len() {
        1 => children.remove(0),
        _ => FilterNode::And(children),
    })
}

fn parse_group(key: &str, value: &Value, depth: usize) -> crate::Result<Vec<FilterNode>> {
    let items = value
        .as_array()
        .ok_or_else(|| AppError::Filter(format!("{} expects an array of filters", key)))?;

    items.iter().map(|item| parse_object(item, depth + 1)).collect()
}

fn parse_field(field: &str, value: &Value, out: &mut Vec<FilterNode>) -> crate::Result<()> {
    match value {
        Value::Object(operators) => {
            if operators.is_empty() {
                return Err(AppError::Filter(format!("no operator given for field '{}'", field)));
            }
            for (key, operand) in sorted_entries(operators) {
                let op = FilterOp::from_key(key).ok_or_else(|| {
                    AppError::Filter(format!("unknown operator '{}' on field '{}'", key, field))
                })?;
                out.push(FilterNode::Condition(Condition::new(field, op, operand.clone())?));
            }
        }
        Value::Array(_) => {
            return Err(AppError::Filter(format!(
                "field '{}' takes an operator object; use $in for lists",
                field
            )))
        }
        scalar => out.push(FilterNode::Condition(Condition::new(field, FilterOp::Eq, scalar.clone())?)),
    }
    Ok(())
}

/// Object entries in key order, independent of the map implementation
fn sorted_entries(object: &Map<String, Value>) -> Vec<(&String, &Value)> {
    let mut entries: Vec<_> = object.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    entries
}

/// Check that `value` is an acceptable operand for `op`
pub(crate) fn check_operand(field: &str, op: FilterOp, value: &Value) -> crate::Result<()> {
    let invalid = |expected: &str| {
        Err(AppError::Filter(format!(
            "{} on field '{}' expects {}, found {}",
            op,
            field,
            expected,
            type_name(value)
        )))
    };

    match op {
        FilterOp::Eq | FilterOp::Ne => {
            if is_scalar(value) || value.is_null() {
                Ok(())
            } else {
                invalid("a scalar or null")
            }
        }
        FilterOp::Gt | FilterOp::Gte | FilterOp::Lt | FilterOp::Lte => {
            if is_scalar(value) {
                Ok(())
            } else {
                invalid("a scalar")
            }
        }
        FilterOp::In | FilterOp::NotIn => match value {
            Value::Array(items) if items.iter().all(is_scalar) => Ok(()),
            _ => invalid("an array of scalars"),
        },
        FilterOp::Contains | FilterOp::NotContains | FilterOp::IContains | FilterOp::NotIContains => {
            if value.is_string() {
                Ok(())
            } else {
                invalid("a string")
            }
        }
        FilterOp::Null | FilterOp::NotNull => {
            if value.is_boolean() {
                Ok(())
            } else {
                invalid("a boolean")
            }
        }
        FilterOp::Between => match value {
            Value::Array(items) if items.len() == 2 && items.iter().all(is_scalar) => Ok(()),
            _ => invalid("an array of two scalars"),
        },
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Bool(_) | Value::Number(_) | Value::String(_))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
