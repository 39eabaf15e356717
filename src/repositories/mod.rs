// src/repositories/mod.rs
//! Database repositories

pub mod kits;
pub mod patients;
pub mod results;

pub use kits::KitRepository;
pub use patients::PatientRepository;
pub use results::ResultRepository;

use async_trait::async_trait;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteRow;
use serde::Serialize;
use crate::error::{ApiError, ApiResult};
use crate::handlers::{PaginatedResponse, PaginationQuery};
use crate::query_builders::{CountQueryBuilder, SafeQueryBuilder};

/// CRUD over one table whose rows map straight onto `T`.
#[async_trait]
pub trait CrudRepository<T, Dto>: Send + Sync
where
    T: Serialize + Send + Unpin + for<'r> sqlx::FromRow<'r, SqliteRow>,
    Dto: Send + 'static,
{
    fn table_name(&self) -> &'static str;

    /// Name used in not-found messages.
    fn entity_name(&self) -> &'static str;

    fn search_fields(&self) -> Vec<&'static str> {
        vec![]
    }

    fn default_sort_field(&self) -> &'static str {
        "created_at"
    }

    async fn create(&self, pool: &SqlitePool, data: Dto) -> ApiResult<T>;

    async fn get_by_id(&self, pool: &SqlitePool, id: &str) -> ApiResult<Option<T>> {
        let query = format!("SELECT * FROM {} WHERE id = ?", self.table_name());

        let result = sqlx::query_as::<_, T>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(result)
    }

    async fn get(&self, pool: &SqlitePool, id: &str) -> ApiResult<T> {
        self.get_by_id(pool, id)
            .await?
            .ok_or_else(|| ApiError::not_found(self.entity_name(), id))
    }

    /// Full replacement of the editable fields.
    async fn update(&self, pool: &SqlitePool, id: &str, data: Dto) -> ApiResult<T>;

    async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<()> {
        let query = format!("DELETE FROM {} WHERE id = ?", self.table_name());

        let result = sqlx::query(&query)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found(self.entity_name(), id));
        }

        Ok(())
    }

    async fn get_paginated(
        &self,
        pool: &SqlitePool,
        query: &PaginationQuery,
        default_per_page: i64,
    ) -> ApiResult<PaginatedResponse<T>> {
        fetch_page::<T>(
            pool,
            self.table_name(),
            "*",
            &self.search_fields(),
            self.default_sort_field(),
            query,
            default_per_page,
        )
        .await
    }
}

/// Runs the COUNT and the page SELECT for a searchable listing, newest first.
pub async fn fetch_page<R>(
    pool: &SqlitePool,
    table: &str,
    fields: &str,
    search_fields: &[&str],
    sort_field: &str,
    query: &PaginationQuery,
    default_per_page: i64,
) -> ApiResult<PaginatedResponse<R>>
where
    R: for<'r> sqlx::FromRow<'r, SqliteRow> + Send + Unpin,
{
    let (page, per_page, offset) = query.normalize(default_per_page);
    let search = query.search.as_deref().unwrap_or("");

    // === COUNT QUERY ===
    let mut count_builder = CountQueryBuilder::new(table)
        .map_err(|e| ApiError::bad_request(&e))?;
    count_builder.add_search(search_fields, search);

    let (count_sql, count_params) = count_builder.build();
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    for param in &count_params {
        count_query = count_query.bind(param);
    }
    let total: i64 = count_query.fetch_one(pool).await?;

    // === SELECT QUERY ===
    let mut data_builder = SafeQueryBuilder::new(table)
        .map_err(|e| ApiError::bad_request(&e))?;
    data_builder
        .add_search(search_fields, search)
        .order_by(sort_field, "DESC")
        .order_by("rowid", "DESC")
        .limit(per_page as u32)
        .offset(offset as u32);

    let (select_sql, select_params) = data_builder.build_select(fields);
    log::debug!("Listing query: {}", select_sql);
    let mut select_query = sqlx::query_as::<_, R>(&select_sql);
    for param in &select_params {
        select_query = select_query.bind(param);
    }
    let data: Vec<R> = select_query.fetch_all(pool).await?;

    let total_pages = (total + per_page - 1) / per_page;

    Ok(PaginatedResponse {
        data,
        total,
        page,
        per_page,
        total_pages,
    })
}
