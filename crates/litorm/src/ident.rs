//! SQL identifier rendering.
//!
//! Table and column names are emitted bare when they are plain identifiers
//! (`[A-Za-z_][A-Za-z0-9_]*`) and not reserved words; anything else is wrapped in
//! double quotes with embedded `"` doubled.
//!
//! # Example
//! ```ignore
//! use litorm::ident;
//!
//! assert_eq!(ident::quote("Planet"), "Planet");
//! assert_eq!(ident::quote("order"), "\"order\"");
//! assert_eq!(ident::qualified("Planet", "galaxy id"), "Planet.\"galaxy id\"");
//! ```

use crate::error::{OrmError, OrmResult};

const RESERVED: &[&str] = &[
    "ABORT", "ACTION", "ADD", "AFTER", "ALL", "ALTER", "ALWAYS", "ANALYZE", "AND", "AS", "ASC",
    "ATTACH", "AUTOINCREMENT", "BEFORE", "BEGIN", "BETWEEN", "BY", "CASCADE", "CASE", "CAST",
    "CHECK", "COLLATE", "COLUMN", "COMMIT", "CONFLICT", "CONSTRAINT", "CREATE", "CROSS",
    "CURRENT", "CURRENT_DATE", "CURRENT_TIME", "CURRENT_TIMESTAMP", "DATABASE", "DEFAULT",
    "DEFERRABLE", "DEFERRED", "DELETE", "DESC", "DETACH", "DISTINCT", "DO", "DROP", "EACH",
    "ELSE", "END", "ESCAPE", "EXCEPT", "EXCLUDE", "EXCLUSIVE", "EXISTS", "EXPLAIN", "FAIL",
    "FILTER", "FIRST", "FOLLOWING", "FOR", "FOREIGN", "FROM", "FULL", "GENERATED", "GLOB",
    "GROUP", "GROUPS", "HAVING", "IF", "IGNORE", "IMMEDIATE", "IN", "INDEX", "INDEXED",
    "INITIALLY", "INNER", "INSERT", "INSTEAD", "INTERSECT", "INTO", "IS", "ISNULL", "JOIN",
    "KEY", "LAST", "LEFT", "LIKE", "LIMIT", "MATCH", "MATERIALIZED", "NATURAL", "NO", "NOT",
    "NOTHING", "NOTNULL", "NULL", "NULLS", "OF", "OFFSET", "ON", "OR", "ORDER", "OTHERS",
    "OUTER", "OVER", "PARTITION", "PLAN", "PRAGMA", "PRECEDING", "PRIMARY", "QUERY", "RAISE",
    "RANGE", "RECURSIVE", "REFERENCES", "REGEXP", "REINDEX", "RELEASE", "RENAME", "REPLACE",
    "RESTRICT", "RETURNING", "RIGHT", "ROLLBACK", "ROW", "ROWS", "SAVEPOINT", "SELECT", "SET",
    "TABLE", "TEMP", "TEMPORARY", "THEN", "TIES", "TO", "TRANSACTION", "TRIGGER", "UNBOUNDED",
    "UNION", "UNIQUE", "UPDATE", "USING", "VACUUM", "VALUES", "VIEW", "VIRTUAL", "WHEN",
    "WHERE", "WINDOW", "WITH", "WITHOUT",
];

/// Check that a name can be used as an identifier at all.
pub fn validate(name: &str) -> OrmResult<()> {
    if name.is_empty() {
        return Err(OrmError::builder("Identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(OrmError::builder(
            "Identifier cannot contain NUL character",
        ));
    }
    Ok(())
}

/// Whether `name` must be quoted to be read back as the same identifier.
pub fn needs_quoting(name: &str) -> bool {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {
            chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        }
        _ => false,
    };
    !plain || is_reserved(name)
}

fn is_reserved(name: &str) -> bool {
    RESERVED.iter().any(|kw| kw.eq_ignore_ascii_case(name))
}

/// Render a single identifier.
pub fn quote(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 2);
    write_ident(&mut out, name);
    out
}

/// Render `table.column`.
pub fn qualified(table: &str, column: &str) -> String {
    let mut out = String::with_capacity(table.len() + column.len() + 1);
    write_qualified(&mut out, table, column);
    out
}

pub(crate) fn write_ident(out: &mut String, name: &str) {
    if !needs_quoting(name) {
        out.push_str(name);
        return;
    }
    out.push('"');
    for ch in name.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

pub(crate) fn write_qualified(out: &mut String, table: &str, column: &str) {
    if !table.is_empty() {
        write_ident(out, table);
        out.push('.');
    }
    write_ident(out, column);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_names_are_bare() {
        assert_eq!(quote("galaxyID"), "galaxyID");
        assert_eq!(quote("_private1"), "_private1");
    }

    #[test]
    fn reserved_words_are_quoted_case_insensitively() {
        assert_eq!(quote("order"), "\"order\"");
        assert_eq!(quote("Group"), "\"Group\"");
    }

    #[test]
    fn special_characters_are_quoted_and_escaped() {
        assert_eq!(quote("galaxy id"), "\"galaxy id\"");
        assert_eq!(quote("1st"), "\"1st\"");
        assert_eq!(quote("has\"quote"), "\"has\"\"quote\"");
        assert_eq!(quote("Ж"), "\"Ж\"");
    }

    #[test]
    fn qualified_names_quote_each_part() {
        assert_eq!(qualified("Planet", "name"), "Planet.name");
        assert_eq!(qualified("select", "id"), "\"select\".id");
        assert_eq!(qualified("", "id"), "id");
    }

    #[test]
    fn validate_rejects_empty_and_nul() {
        assert!(validate("").is_err());
        assert!(validate("a\0b").is_err());
        assert!(validate("ok").is_ok());
    }
}
