// src/handlers.rs
use serde::{Serialize, Deserialize};

// ==================== COMMON STRUCTURES ====================

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn success_with_message(data: T, message: String) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: Some(message),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl<T> PaginatedResponse<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResponse<U> {
        PaginatedResponse {
            data: self.data.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            total_pages: self.total_pages,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PaginationQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub search: Option<String>,
}

impl PaginationQuery {
    /// Returns (page, per_page, offset); `default_per_page` applies when the caller sends none.
    pub fn normalize(&self, default_per_page: i64) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(default_per_page).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_defaults_to_configured_page_size() {
        let query = PaginationQuery::default();
        assert_eq!(query.normalize(50), (1, 50, 0));

        let query = PaginationQuery { page: Some(3), per_page: None, search: None };
        assert_eq!(query.normalize(50), (3, 50, 100));
    }

    #[test]
    fn test_pagination_clamps_bad_input() {
        let query = PaginationQuery { page: Some(-2), per_page: Some(1000), search: None };
        assert_eq!(query.normalize(50), (1, 100, 0));
    }

    #[test]
    fn test_paginated_response_map_keeps_counts() {
        let page = PaginatedResponse { data: vec![1, 2], total: 7, page: 2, per_page: 2, total_pages: 4 };
        let mapped = page.map(|n| n * 10);
        assert_eq!(mapped.data, vec![10, 20]);
        assert_eq!(mapped.total, 7);
        assert_eq!(mapped.total_pages, 4);
    }
}
