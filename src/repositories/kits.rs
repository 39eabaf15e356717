// src/repositories/kits.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{KitRequest, ReagentKit};
use super::CrudRepository;

pub struct KitRepository;

#[async_trait]
impl CrudRepository<ReagentKit, KitRequest> for KitRepository {
    fn table_name(&self) -> &'static str {
        "kits"
    }

    fn entity_name(&self) -> &'static str {
        "Kit"
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["kit_name", "kit_lot_no", "kit_types"]
    }

    async fn create(&self, pool: &SqlitePool, data: KitRequest) -> ApiResult<ReagentKit> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO kits (id, kit_name, kit_types, kit_lot_no, kit_expiration_date, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&data.kit_name)
        .bind(&data.kit_types)
        .bind(&data.kit_lot_no)
        .bind(data.kit_expiration_date)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        log::info!("Kit created: {} ({})", id, data.kit_name);
        self.get(pool, &id).await
    }

    async fn update(&self, pool: &SqlitePool, id: &str, data: KitRequest) -> ApiResult<ReagentKit> {
        let result = sqlx::query(
            r#"UPDATE kits
               SET kit_name = ?, kit_types = ?, kit_lot_no = ?, kit_expiration_date = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&data.kit_name)
        .bind(&data.kit_types)
        .bind(&data.kit_lot_no)
        .bind(data.kit_expiration_date)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Kit", id));
        }

        log::info!("Kit updated: {}", id);
        self.get(pool, id).await
    }

    /// Unlinks dependent serology records, then removes the kit.
    async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<()> {
        let mut tx = pool.begin().await?;

        let unlinked = sqlx::query("UPDATE serology_results SET kit_id = NULL WHERE kit_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let result = sqlx::query("DELETE FROM kits WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Kit", id));
        }

        tx.commit().await?;
        log::info!("Kit deleted: {} ({} serology records unlinked)", id, unlinked);
        Ok(())
    }
}
