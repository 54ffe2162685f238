//! Query translation module
//!
//! Turns the declarative filter, ordering and pagination arguments of a
//! list query into parameterized Postgres SQL.

pub mod compiler;
pub mod filter;
pub mod pagination;

pub use compiler::{FilterCompiler, SqlFragment, SqlWriter};
pub use filter::{Condition, FilterNode, FilterOp};
pub use pagination::{OrderBy, Pagination, QueryOptions, SelectBuilder, SortDirection};
