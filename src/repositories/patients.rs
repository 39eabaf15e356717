// src/repositories/patients.rs
use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use strum::IntoEnumIterator;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::handlers::{PaginatedResponse, PaginationQuery};
use crate::models::{Patient, PatientRequest, PatientSummary, ResultKind};
use super::{fetch_page, CrudRepository};

pub struct PatientRepository;

#[async_trait]
impl CrudRepository<Patient, PatientRequest> for PatientRepository {
    fn table_name(&self) -> &'static str {
        "patients"
    }

    fn entity_name(&self) -> &'static str {
        "Patient"
    }

    fn search_fields(&self) -> Vec<&'static str> {
        vec!["name", "address", "company"]
    }

    async fn create(&self, pool: &SqlitePool, data: PatientRequest) -> ApiResult<Patient> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"INSERT INTO patients (id, name, date_of_birth, gender, company, address, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&id)
        .bind(&data.name)
        .bind(data.date_of_birth)
        .bind(&data.gender)
        .bind(&data.company)
        .bind(&data.address)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;

        log::info!("Patient created: {}", id);
        self.get(pool, &id).await
    }

    async fn update(&self, pool: &SqlitePool, id: &str, data: PatientRequest) -> ApiResult<Patient> {
        let result = sqlx::query(
            r#"UPDATE patients
               SET name = ?, date_of_birth = ?, gender = ?, company = ?, address = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&data.name)
        .bind(data.date_of_birth)
        .bind(&data.gender)
        .bind(&data.company)
        .bind(&data.address)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Patient", id));
        }

        log::info!("Patient updated: {}", id);
        self.get(pool, id).await
    }

    /// Removes the patient and every result it owns in one transaction.
    async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<()> {
        let mut tx = pool.begin().await?;

        let mut removed_results = 0;
        for kind in ResultKind::iter() {
            let query = format!("DELETE FROM {} WHERE patient_id = ?", kind.table_name());
            let result = sqlx::query(&query)
                .bind(id)
                .execute(&mut *tx)
                .await?;
            removed_results += result.rows_affected();
        }

        let result = sqlx::query("DELETE FROM patients WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ApiError::not_found("Patient", id));
        }

        tx.commit().await?;
        log::info!("Patient deleted: {} ({} result records removed)", id, removed_results);
        Ok(())
    }
}

impl PatientRepository {
    /// Registry listing with per-category result counts.
    pub async fn list_summaries(
        &self,
        pool: &SqlitePool,
        query: &PaginationQuery,
        default_per_page: i64,
    ) -> ApiResult<PaginatedResponse<PatientSummary>> {
        let mut fields = vec!["patients.*".to_string()];
        for kind in ResultKind::iter() {
            fields.push(format!(
                "(SELECT COUNT(*) FROM {0} WHERE {0}.patient_id = patients.id) AS {1}_count",
                kind.table_name(),
                kind
            ));
        }

        fetch_page::<PatientSummary>(
            pool,
            self.table_name(),
            &fields.join(", "),
            &self.search_fields(),
            self.default_sort_field(),
            query,
            default_per_page,
        )
        .await
    }
}
