// src/query_builders/sql/select.rs
//! Parameterized SELECT builder

use crate::query_builders::utils::{
    escape_like_value, is_safe_field_name, is_safe_table_name, normalize_sort_order,
};

/// SELECT builder for listing screens.
///
/// Values always travel as `?` parameters; table and column names are
/// checked before they are spliced into the statement.
#[derive(Debug, Clone)]
pub struct SafeQueryBuilder {
    table: String,
    conditions: Vec<String>,
    params: Vec<String>,
    order_by: Vec<(String, &'static str)>,
    limit: Option<u32>,
    offset: Option<u32>,
}

impl SafeQueryBuilder {
    pub fn new(table: &str) -> Result<Self, String> {
        if !is_safe_table_name(table) {
            return Err(format!("Invalid table name: '{}'", table));
        }
        Ok(Self {
            table: table.to_string(),
            conditions: Vec::new(),
            params: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        })
    }

    // ==================== CONDITIONS ====================

    /// field = ?
    pub fn add_exact_match(&mut self, field: &str, value: impl Into<String>) -> &mut Self {
        if is_safe_field_name(field) {
            self.conditions.push(format!("{} = ?", field));
            self.params.push(value.into());
        }
        self
    }

    /// (a LIKE ? OR b LIKE ? ...) over every searchable field; blank terms add nothing.
    pub fn add_search(&mut self, fields: &[&str], term: &str) -> &mut Self {
        let term = term.trim();
        if term.is_empty() {
            return self;
        }

        let fields: Vec<&str> = fields.iter().copied().filter(|f| is_safe_field_name(f)).collect();
        if fields.is_empty() {
            return self;
        }

        let pattern = format!("%{}%", escape_like_value(term));
        let like_conditions: Vec<String> = fields
            .iter()
            .map(|f| format!("{} LIKE ? ESCAPE '\\'", f))
            .collect();
        self.conditions.push(format!("({})", like_conditions.join(" OR ")));
        self.params.extend(fields.iter().map(|_| pattern.clone()));
        self
    }

    // ==================== ORDERING AND PAGING ====================

    pub fn order_by(&mut self, field: &str, order: &str) -> &mut Self {
        if is_safe_field_name(field) {
            self.order_by.push((field.to_string(), normalize_sort_order(order)));
        }
        self
    }

    pub fn limit(&mut self, limit: u32) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(&mut self, offset: u32) -> &mut Self {
        self.offset = Some(offset);
        self
    }

    // ==================== BUILD ====================

    pub fn build_select(&self, fields: &str) -> (String, Vec<String>) {
        let mut sql = format!("SELECT {} FROM {}", fields, self.table);
        self.push_where(&mut sql);

        if !self.order_by.is_empty() {
            let order: Vec<String> = self
                .order_by
                .iter()
                .map(|(field, dir)| format!("{} {}", field, dir))
                .collect();
            sql.push_str(&format!(" ORDER BY {}", order.join(", ")));
        }

        if let Some(limit) = self.limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }

        if let Some(offset) = self.offset {
            sql.push_str(&format!(" OFFSET {}", offset));
        }

        (sql, self.params.clone())
    }

    pub fn build_count(&self) -> (String, Vec<String>) {
        let mut sql = format!("SELECT COUNT(*) as count FROM {}", self.table);
        self.push_where(&mut sql);
        (sql, self.params.clone())
    }

    fn push_where(&self, sql: &mut String) {
        if !self.conditions.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&self.conditions.join(" AND "));
        }
    }
}

// ==================== TESTS ====================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_spans_all_fields_with_escape_clause() {
        let mut builder = SafeQueryBuilder::new("patients").unwrap();
        builder.add_search(&["name", "address", "company"], "100%_ok");

        let (sql, params) = builder.build_select("*");
        assert!(sql.contains("(name LIKE ? ESCAPE '\\' OR address LIKE ? ESCAPE '\\' OR company LIKE ? ESCAPE '\\')"));
        assert_eq!(params.len(), 3);
        assert_eq!(params[0], "%100\\%\\_ok%");
    }

    #[test]
    fn test_blank_search_adds_no_condition() {
        let mut builder = SafeQueryBuilder::new("kits").unwrap();
        builder.add_search(&["kit_name"], "   ");
        let (sql, params) = builder.build_select("*");
        assert_eq!(sql, "SELECT * FROM kits");
        assert!(params.is_empty());
    }

    #[test]
    fn test_unsafe_fields_are_dropped() {
        let mut builder = SafeQueryBuilder::new("patients").unwrap();
        builder.add_exact_match("name; --", "x");
        builder.order_by("1=1; DROP", "asc");
        let (sql, params) = builder.build_select("*");
        assert_eq!(sql, "SELECT * FROM patients");
        assert!(params.is_empty());
    }

    #[test]
    fn test_order_and_pagination() {
        let mut builder = SafeQueryBuilder::new("kits").unwrap();
        builder
            .order_by("created_at", "desc")
            .order_by("rowid", "desc")
            .limit(50)
            .offset(100);

        let (sql, _) = builder.build_select("*");
        assert!(sql.ends_with("ORDER BY created_at DESC, rowid DESC LIMIT 50 OFFSET 100"));
    }

    #[test]
    fn test_count_has_no_limit() {
        let mut builder = SafeQueryBuilder::new("patients").unwrap();
        builder.add_exact_match("gender", "Female").limit(10);

        let (sql, params) = builder.build_count();
        assert_eq!(sql, "SELECT COUNT(*) as count FROM patients WHERE gender = ?");
        assert_eq!(params, vec!["Female".to_string()]);
    }

    #[test]
    fn test_exact_match_with_ordering() {
        let mut builder = SafeQueryBuilder::new("serology_results").unwrap();
        builder
            .add_exact_match("patient_id", "p1")
            .order_by("created_at", "DESC")
            .order_by("rowid", "DESC");

        let (sql, params) = builder.build_select("*");
        assert_eq!(
            sql,
            "SELECT * FROM serology_results WHERE patient_id = ? ORDER BY created_at DESC, rowid DESC"
        );
        assert_eq!(params, vec!["p1".to_string()]);
    }

    #[test]
    fn test_invalid_table_name() {
        assert!(SafeQueryBuilder::new("DROP TABLE patients; --").is_err());
    }
}
