//! SQL generation module.
//!
//! A small type-safe builder that metadata synthesis renders its virtual
//! relations through:
//!
//! - [`query`] - SELECT / UNION ALL / derived-table builder
//! - [`expr`] - Expression AST and builder DSL
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations and the literal escaper

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;


// Re-export commonly used types at the sql module level
pub use dialect::helpers::escape;
pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    case_of, col, func, lit_int, lit_null, lit_opt_str, lit_str, param, upper,
    BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::{LimitOffset, OrderByExpr, Query, Relation, SelectExpr, SetOperation, TableRef};
pub use token::{Token, TokenStream};
