//! SQLite dialect.
//!
//! - ANSI identifier quoting (`"`)
//! - Booleans are integers
//! - Numbered `?NNN` parameters
//! - Compound SELECT operands may not be parenthesized

use super::helpers;
use super::SqlDialect;

/// SQLite dialect, the one every metadata query is rendered for.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn parenthesize_set_operands(&self) -> bool {
        false
    }
}
