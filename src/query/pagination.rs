//! Ordering, pagination and list statements
//!
//! `SelectBuilder` assembles the list and count statements a CRUD resolver
//! runs, with the filter compiled into the `WHERE` clause.

use crate::config::AppConfig;
use crate::query::compiler::{FilterCompiler, SqlFragment, SqlWriter};
use crate::query::filter::FilterNode;
use crate::shared::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort direction; deserializes from any casing of `asc`/`desc`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl TryFrom<String> for SortDirection {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_uppercase().as_str() {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(AppError::Filter(format!("invalid sort direction '{}'", value))),
        }
    }
}

impl From<SortDirection> for String {
    fn from(value: SortDirection) -> Self {
        value.as_sql().to_string()
    }
}

/// One ordering term
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBy {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

/// Requested page window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

impl Pagination {
    /// Requested limit clamped to `max_limit`; `max_limit` when unset
    pub fn effective_limit(&self, max_limit: u64) -> u64 {
        self.limit.map_or(max_limit, |limit| limit.min(max_limit))
    }

    pub fn effective_offset(&self) -> u64 {
        self.offset.unwrap_or(0)
    }
}

/// List arguments as received from a GraphQL query
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct QueryOptions {
    #[serde(rename = "where", default)]
    pub filter: Option<Value>,
    #[serde(default)]
    pub order: Vec<OrderBy>,
    #[serde(default)]
    pub pagination: Pagination,
}

impl QueryOptions {
    /// Parse list arguments from JSON
    pub fn from_value(value: Value) -> crate::Result<Self> {
        serde_json::from_value(value).map_err(|e| AppError::Filter(e.to_string()))
    }
}

/// Builds `SELECT` and `COUNT` statements for one table
#[derive(Debug, Clone)]
pub struct SelectBuilder {
    table: String,
    columns: Vec<String>,
    max_limit: u64,
    compiler: FilterCompiler,
}

impl SelectBuilder {
    pub fn new(table: impl Into<String>, max_limit: u64) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            max_limit,
            compiler: FilterCompiler::new(),
        }
    }

    /// Builder using the configured page size limit
    pub fn for_config(table: impl Into<String>, config: &AppConfig) -> Self {
        Self::new(table, u64::from(config.query_max_limit))
    }

    /// Selected columns; all columns when none are given
    pub fn columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn compiler(mut self, compiler: FilterCompiler) -> Self {
        self.compiler = compiler;
        self
    }

    /// `SELECT ... WHERE ... ORDER BY ... LIMIT ... OFFSET ...`
    pub fn select(&self, options: &QueryOptions) -> crate::Result<SqlFragment> {
        let mut writer = SqlWriter::new();
        writer.push("SELECT ");
        self.push_columns(&mut writer)?;
        writer.push(" FROM ");
        writer.push_identifier(&self.table)?;
        self.push_where(&mut writer, options)?;
        self.push_order(&mut writer, &options.order)?;

        writer
            .push(" LIMIT ")
            .push_bind(Value::from(options.pagination.effective_limit(self.max_limit)))
            .push(" OFFSET ")
            .push_bind(Value::from(options.pagination.effective_offset()));

        Ok(writer.finish())
    }

    /// `SELECT COUNT(*) AS count ... WHERE ...`; ordering and paging are ignored
    pub fn count(&self, options: &QueryOptions) -> crate::Result<SqlFragment> {
        let mut writer = SqlWriter::new();
        writer.push("SELECT COUNT(*) AS count FROM ");
        writer.push_identifier(&self.table)?;
        self.push_where(&mut writer, options)?;
        Ok(writer.finish())
    }

    fn push_columns(&self, writer: &mut SqlWriter) -> crate::Result<()> {
        if self.columns.is_empty() {
            writer.push("*");
            return Ok(());
        }

        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                writer.push(", ");
            }
            writer.push_identifier(column)?;
        }
        Ok(())
    }

    fn push_where(&self, writer: &mut SqlWriter, options: &QueryOptions) -> crate::Result<()> {
        writer.push(" WHERE ");
        match &options.filter {
            Some(filter) => {
                let node = FilterNode::parse(filter)?;
                self.compiler.compile_into(writer, &node)
            }
            None => {
                writer.push("TRUE");
                Ok(())
            }
        }
    }

    fn push_order(&self, writer: &mut SqlWriter, order: &[OrderBy]) -> crate::Result<()> {
        for (i, term) in order.iter().enumerate() {
            self.compiler.ensure_field_allowed(&term.field)?;
            writer.push(if i == 0 { " ORDER BY " } else { ", " });
            writer
                .push_identifier(&term.field)
                .map_err(|e| AppError::Filter(e.to_string()))?;
            writer.push(" ").push(term.direction.as_sql());
        }
        Ok(())
    }
}
