// src/query_builders/sql/count.rs
//! COUNT builder

use crate::query_builders::sql::SafeQueryBuilder;

/// Thin wrapper over [`SafeQueryBuilder`] for the total-rows half of a paginated listing.
pub struct CountQueryBuilder {
    inner: SafeQueryBuilder,
}

impl CountQueryBuilder {
    pub fn new(table: &str) -> Result<Self, String> {
        Ok(Self {
            inner: SafeQueryBuilder::new(table)?,
        })
    }

    pub fn add_search(&mut self, fields: &[&str], term: &str) -> &mut Self {
        self.inner.add_search(fields, term);
        self
    }

    pub fn build(&self) -> (String, Vec<String>) {
        self.inner.build_count()
    }
}

// ==================== TESTS ====================
