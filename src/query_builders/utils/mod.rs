// src/query_builders/utils/mod.rs
//! Identifier checks and LIKE escaping

use std::collections::HashSet;
use lazy_static::lazy_static;

lazy_static! {
    static ref RESERVED_WORDS: HashSet<&'static str> = [
        "SELECT", "FROM", "WHERE", "INSERT", "UPDATE", "DELETE", "DROP", "CREATE", "ALTER",
        "UNION", "JOIN", "ORDER", "GROUP", "HAVING", "EXISTS", "AND", "OR", "NOT", "NULL", "AS",
        "TABLE", "INDEX", "VIEW", "TRIGGER", "INTO", "VALUES", "SET", "PRAGMA", "ATTACH",
        "DETACH", "REPLACE", "BEGIN", "COMMIT", "ROLLBACK", "SAVEPOINT", "EXPLAIN",
    ].into_iter().collect();
}

const MAX_IDENTIFIER_LENGTH: usize = 64;

// ==================== ESCAPING ====================

/// Escapes LIKE wildcards; pair with `ESCAPE '\'` in the condition.
pub fn escape_like_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ==================== IDENTIFIERS ====================

/// Plain SQL identifier: ASCII letter first, then letters, digits or single underscores.
pub fn is_safe_field_name(field: &str) -> bool {
    if field.is_empty() || field.len() > MAX_IDENTIFIER_LENGTH {
        return false;
    }
    if RESERVED_WORDS.contains(field.to_uppercase().as_str()) {
        return false;
    }
    if field.contains("__") || field.ends_with('_') {
        return false;
    }

    let mut chars = field.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[inline]
pub fn is_safe_table_name(table: &str) -> bool {
    is_safe_field_name(table)
}

#[inline]
pub fn normalize_sort_order(order: &str) -> &'static str {
    match order.to_uppercase().as_str() {
        "ASC" => "ASC",
        _ => "DESC",
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_value() {
        assert_eq!(escape_like_value("100%"), "100\\%");
        assert_eq!(escape_like_value("dela_cruz"), "dela\\_cruz");
        assert_eq!(escape_like_value("a\\b"), "a\\\\b");
        assert_eq!(escape_like_value("Juan"), "Juan");
    }

    #[test]
    fn test_safe_field_names() {
        assert!(is_safe_field_name("kit_lot_no"));
        assert!(is_safe_field_name("created_at"));
        assert!(!is_safe_field_name("name; DROP TABLE patients"));
        assert!(!is_safe_field_name("select"));
        assert!(!is_safe_field_name("_hidden"));
        assert!(!is_safe_field_name("a__b"));
        assert!(!is_safe_field_name(""));
    }

    #[test]
    fn test_normalize_sort_order() {
        assert_eq!(normalize_sort_order("asc"), "ASC");
        assert_eq!(normalize_sort_order("desc"), "DESC");
        assert_eq!(normalize_sort_order("sideways"), "DESC");
    }
}
