//! Filter compilation to parameterized SQL
//!
//! Output targets Postgres: identifiers are double-quoted and bind values
//! use `$1..$n` placeholders numbered in order of appearance.

use crate::query::filter::{check_operand, Condition, FilterNode, FilterOp};
use crate::shared::error::AppError;
use crate::shared::validation::ValidationUtils;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt::Write as _;

/// SQL text with its bind values
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SqlFragment {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Incremental SQL writer that numbers placeholders as values are bound
#[derive(Debug, Default)]
pub struct SqlWriter {
    sql: String,
    params: Vec<Value>,
}

impl SqlWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    pub fn push_bind(&mut self, value: Value) -> &mut Self {
        self.params.push(value);
        let _ = write!(self.sql, "${}", self.params.len());
        self
    }

    /// Push a validated, quoted identifier
    pub fn push_identifier(&mut self, name: &str) -> crate::Result<&mut Self> {
        let quoted = ValidationUtils::quote_identifier(name)?;
        self.sql.push_str(&quoted);
        Ok(self)
    }

    pub fn finish(self) -> SqlFragment {
        SqlFragment {
            sql: self.sql,
            params: self.params,
        }
    }
}

/// Compiles filter trees into `WHERE` clause fragments
#[derive(Debug, Clone, Default)]
pub struct FilterCompiler {
    allowed_fields: Option<BTreeSet<String>>,
}

impl FilterCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict filtering and ordering to the given fields
    pub fn allow_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Reject fields outside the whitelist, if one is set
    pub fn ensure_field_allowed(&self, field: &str) -> crate::Result<()> {
        match &self.allowed_fields {
            Some(allowed) if !allowed.contains(field) => Err(AppError::Filter(format!(
                "field '{}' is not filterable",
                field
            ))),
            _ => Ok(()),
        }
    }

    pub fn compile(&self, node: &FilterNode) -> crate::Result<SqlFragment> {
        let mut writer = SqlWriter::new();
        self.compile_into(&mut writer, node)?;
        Ok(writer.finish())
    }

    /// Parse and compile a JSON filter object
    pub fn compile_value(&self, filter: &Value) -> crate::Result<SqlFragment> {
        self.compile(&FilterNode::parse(filter)?)
    }

    /// Append the predicate for `node` to an existing statement
    pub fn compile_into(&self, writer: &mut SqlWriter, node: &FilterNode) -> crate::Result<()> {
        match node {
            FilterNode::Condition(condition) => self.compile_condition(writer, condition),
            FilterNode::And(children) => self.compile_group(writer, children, " AND ", "TRUE"),
            FilterNode::Or(children) => self.compile_group(writer, children, " OR ", "FALSE"),
        }
    }

    fn compile_group(
        &self,
        writer: &mut SqlWriter,
        children: &[FilterNode],
        separator: &str,
        identity: &str,
    ) -> crate::Result<()> {
        match children {
            [] => {
                writer.push(identity);
            }
            [only] => self.compile_into(writer, only)?,
            _ => {
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        writer.push(separator);
                    }
                    writer.push("(");
                    self.compile_into(writer, child)?;
                    writer.push(")");
                }
            }
        }
        Ok(())
    }

    fn compile_condition(&self, writer: &mut SqlWriter, condition: &Condition) -> crate::Result<()> {
        let Condition { field, op, value } = condition;
        self.ensure_field_allowed(field)?;
        check_operand(field, *op, value)?;
        let column = ValidationUtils::quote_identifier(field).map_err(|e| AppError::Filter(e.to_string()))?;

        // an empty list makes the predicate constant
        if matches!(op, FilterOp::In | FilterOp::NotIn) && value.as_array().is_some_and(Vec::is_empty) {
            writer.push(if *op == FilterOp::NotIn { "TRUE" } else { "FALSE" });
            return Ok(());
        }

        writer.push(&column);

        match op {
            FilterOp::Eq if value.is_null() => {
                writer.push(" IS NULL");
            }
            FilterOp::Ne if value.is_null() => {
                writer.push(" IS NOT NULL");
            }
            FilterOp::Eq => {
                writer.push(" = ").push_bind(value.clone());
            }
            FilterOp::Ne => {
                writer.push(" <> ").push_bind(value.clone());
            }
            FilterOp::Gt => {
                writer.push(" > ").push_bind(value.clone());
            }
            FilterOp::Gte => {
                writer.push(" >= ").push_bind(value.clone());
            }
            FilterOp::Lt => {
                writer.push(" < ").push_bind(value.clone());
            }
            FilterOp::Lte => {
                writer.push(" <= ").push_bind(value.clone());
            }
            FilterOp::In | FilterOp::NotIn => {
                let items = value.as_array().map(Vec::as_slice).unwrap_or_default();
                Self::push_membership(writer, items, *op == FilterOp::NotIn);
            }
            FilterOp::Contains => Self::push_like(writer, "LIKE", value),
            FilterOp::NotContains => Self::push_like(writer, "NOT LIKE", value),
            FilterOp::IContains => Self::push_like(writer, "ILIKE", value),
            FilterOp::NotIContains => Self::push_like(writer, "NOT ILIKE", value),
            FilterOp::Null | FilterOp::NotNull => {
                let wants_null = value.as_bool().unwrap_or(true) == (*op == FilterOp::Null);
                writer.push(if wants_null { " IS NULL" } else { " IS NOT NULL" });
            }
            FilterOp::Between => {
                let bounds = value.as_array().map(Vec::as_slice).unwrap_or_default();
                if let [low, high] = bounds {
                    writer
                        .push(" BETWEEN ")
                        .push_bind(low.clone())
                        .push(" AND ")
                        .push_bind(high.clone());
                }
            }
        }

        Ok(())
    }

    fn push_membership(writer: &mut SqlWriter, items: &[Value], negated: bool) {
        writer.push(if negated { " NOT IN (" } else { " IN (" });
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                writer.push(", ");
            }
            writer.push_bind(item.clone());
        }
        writer.push(")");
    }

    fn push_like(writer: &mut SqlWriter, keyword: &str, value: &Value) {
        let needle = value.as_str().unwrap_or_default();
        let pattern = format!("%{}%", ValidationUtils::escape_like_pattern(needle));
        writer
            .push(" ")
            .push(keyword)
            .push(" ")
            .push_bind(Value::String(pattern))
            .push(" ESCAPE '\\'");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compile(filter: Value) -> SqlFragment {
        FilterCompiler::new().compile_value(&filter).unwrap()
    }

    #[test]
    fn test_equality_and_null_handling() {
        assert_eq!(compile(json!({ "status": "active" })).sql, "\"status\" = $1");
        assert_eq!(compile(json!({ "status": { "$eq": null } })).sql, "\"status\" IS NULL");
        assert_eq!(compile(json!({ "status": { "$ne": null } })).sql, "\"status\" IS NOT NULL");
        assert_eq!(compile(json!({ "status": { "$ne": "x" } })).sql, "\"status\" <> $1");
    }

    #[test]
    fn test_comparisons() {
        let fragment = compile(json!({ "price": { "$gt": 1, "$gte": 2, "$lt": 9, "$lte": 8 } }));

        assert_eq!(
            fragment.sql,
            "(\"price\" > $1) AND (\"price\" >= $2) AND (\"price\" < $3) AND (\"price\" <= $4)"
        );
        assert_eq!(fragment.params, vec![json!(1), json!(2), json!(9), json!(8)]);
    }

    #[test]
    fn test_in_and_not_in() {
        let fragment = compile(json!({ "id": { "$in": [3, 5, 8] } }));
        assert_eq!(fragment.sql, "\"id\" IN ($1, $2, $3)");
        assert_eq!(fragment.params, vec![json!(3), json!(5), json!(8)]);

        let fragment = compile(json!({ "id": { "$nIn": ["a"] } }));
        assert_eq!(fragment.sql, "\"id\" NOT IN ($1)");
    }

    #[test]
    fn test_empty_membership_is_constant() {
        let fragment = compile(json!({ "id": { "$in": [] } }));
        assert_eq!(fragment.sql, "FALSE");
        assert!(fragment.params.is_empty());

        assert_eq!(compile(json!({ "id": { "$nIn": [] } })).sql, "TRUE");
    }

    #[test]
    fn test_contains_family_escapes_wildcards() {
        let fragment = compile(json!({ "title": { "$iContains": "50%_off" } }));

        assert_eq!(fragment.sql, "\"title\" ILIKE $1 ESCAPE '\\'");
        assert_eq!(fragment.params, vec![json!("%50\\%\\_off%")]);

        assert_eq!(
            compile(json!({ "title": { "$contains": "a" } })).sql,
            "\"title\" LIKE $1 ESCAPE '\\'"
        );
        assert_eq!(
            compile(json!({ "title": { "$nContains": "a" } })).sql,
            "\"title\" NOT LIKE $1 ESCAPE '\\'"
        );
        assert_eq!(
            compile(json!({ "title": { "$nIContains": "a" } })).sql,
            "\"title\" NOT ILIKE $1 ESCAPE '\\'"
        );
    }

    #[test]
    fn test_null_operators() {
        assert_eq!(compile(json!({ "deleted_at": { "$null": true } })).sql, "\"deleted_at\" IS NULL");
        assert_eq!(compile(json!({ "deleted_at": { "$null": false } })).sql, "\"deleted_at\" IS NOT NULL");
        assert_eq!(compile(json!({ "deleted_at": { "$notNull": true } })).sql, "\"deleted_at\" IS NOT NULL");
        assert_eq!(compile(json!({ "deleted_at": { "$notNull": false } })).sql, "\"deleted_at\" IS NULL");
    }

    #[test]
    fn test_between() {
        let fragment = compile(json!({ "created_at": { "$between": ["2024-01-01", "2024-12-31"] } }));

        assert_eq!(fragment.sql, "\"created_at\" BETWEEN $1 AND $2");
        assert_eq!(fragment.params, vec![json!("2024-01-01"), json!("2024-12-31")]);
    }

    #[test]
    fn test_nested_tree_numbers_placeholders_in_order() {
        let fragment = compile(json!({
            "OR": [
                { "status": { "$in": ["draft", "review"] } },
                { "AND": [
                    { "price": { "$between": [10, 50] } },
                    { "title": { "$iContains": "drill" } }
                ] }
            ],
            "owner_id": 7
        }));

        assert_eq!(
            fragment.sql,
            "((\"status\" IN ($1, $2)) OR ((\"price\" BETWEEN $3 AND $4) AND (\"title\" ILIKE $5 ESCAPE '\\'))) AND (\"owner_id\" = $6)"
        );
        assert_eq!(
            fragment.params,
            vec![json!("draft"), json!("review"), json!(10), json!(50), json!("%drill%"), json!(7)]
        );
    }

    #[test]
    fn test_empty_groups() {
        assert_eq!(compile(json!({})).sql, "TRUE");
        assert_eq!(compile(json!({ "OR": [] })).sql, "FALSE");
        assert_eq!(compile(json!({ "AND": [] })).sql, "TRUE");
    }

    #[test]
    fn test_whitelist() {
        let compiler = FilterCompiler::new().allow_fields(["title", "price"]);

        assert!(compiler.compile_value(&json!({ "title": "x" })).is_ok());

        let error = compiler.compile_value(&json!({ "password_hash": "x" })).unwrap_err();
        assert!(error.to_string().contains("'password_hash' is not filterable"));
    }

    #[test]
    fn test_hand_built_condition_is_rechecked() {
        let node = FilterNode::Condition(Condition {
            field: "price".to_string(),
            op: FilterOp::Between,
            value: json!([1]),
        });

        assert!(FilterCompiler::new().compile(&node).is_err());
    }

    #[test]
    fn test_writer_continues_numbering() {
        let mut writer = SqlWriter::new();
        writer.push("SELECT * FROM t WHERE a = ").push_bind(json!(1)).push(" AND ");

        let node = FilterNode::parse(&json!({ "b": 2 })).unwrap();
        FilterCompiler::new().compile_into(&mut writer, &node).unwrap();

        let fragment = writer.finish();
        assert_eq!(fragment.sql, "SELECT * FROM t WHERE a = $1 AND \"b\" = $2");
        assert_eq!(fragment.params.len(), 2);
    }
}
