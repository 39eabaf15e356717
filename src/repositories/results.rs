// src/repositories/results.rs
//! One repository for all four result categories, driven by the category schema.

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{FieldKind, FieldSpec, ResultKind, ResultPayload, ResultRecord};
use crate::query_builders::SafeQueryBuilder;
use crate::validator::{normalize_field, ValidationMode};

#[derive(Debug, Clone, Copy)]
pub struct ResultRepository {
    kind: ResultKind,
}

impl ResultRepository {
    pub fn new(kind: ResultKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ResultKind {
        self.kind
    }

    fn table(&self) -> &'static str {
        self.kind.table_name()
    }

    /// Schema fields a write touches. Legacy kit metadata is only written by the import path.
    fn stored_fields(&self, include_legacy: bool) -> impl Iterator<Item = &'static FieldSpec> {
        self.kind
            .schema()
            .iter()
            .filter(move |spec| include_legacy || !spec.legacy)
    }

    /// Every writable column, in bind order.
    fn writable_columns(&self, include_legacy: bool) -> Vec<&'static str> {
        let mut columns = vec!["patient_id"];
        if self.kind.links_kit() {
            columns.push("kit_id");
        }
        columns.push("medical_technologist");
        columns.push("reported_at");
        columns.extend(self.stored_fields(include_legacy).map(|spec| spec.name));
        columns
    }

    /// Column values in `writable_columns` order; absent fields become NULL.
    fn column_values(&self, payload: &ResultPayload, include_legacy: bool) -> ApiResult<Vec<Option<String>>> {
        let mut values = vec![Some(payload.patient_id.clone())];
        if self.kind.links_kit() {
            values.push(payload.kit_id.clone());
        }
        values.push(payload.medical_technologist.clone());
        values.push(payload.reported_at.map(|d| d.format("%Y-%m-%d").to_string()));

        for spec in self.stored_fields(include_legacy) {
            let value = match payload.fields.get(spec.name) {
                Some(v) => Some(v.to_column().map_err(|e| {
                    ApiError::InternalServerError(format!("Failed to encode {}: {}", spec.name, e))
                })?),
                None => None,
            };
            values.push(value);
        }
        Ok(values)
    }

    async fn ensure_references(&self, conn: &mut SqliteConnection, payload: &ResultPayload) -> ApiResult<()> {
        let patient: Option<(String,)> = sqlx::query_as("SELECT id FROM patients WHERE id = ?")
            .bind(&payload.patient_id)
            .fetch_optional(&mut *conn)
            .await?;
        if patient.is_none() {
            return Err(ApiError::missing_reference("patient_id", "Patient", &payload.patient_id));
        }

        if let Some(kit_id) = payload.kit_id.as_deref() {
            let kit: Option<(String,)> = sqlx::query_as("SELECT id FROM kits WHERE id = ?")
                .bind(kit_id)
                .fetch_optional(&mut *conn)
                .await?;
            if kit.is_none() {
                return Err(ApiError::missing_reference("kit_id", "Kit", kit_id));
            }
        }

        Ok(())
    }

    pub async fn create(&self, pool: &SqlitePool, payload: &ResultPayload) -> ApiResult<ResultRecord> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let columns = self.writable_columns(true);
        let values = self.column_values(payload, true)?;

        let sql = format!(
            "INSERT INTO {} (id, {}, created_at, updated_at) VALUES (?, {}, ?, ?)",
            self.table(),
            columns.join(", "),
            vec!["?"; columns.len()].join(", ")
        );

        let mut tx = pool.begin().await?;
        self.ensure_references(&mut *tx, payload).await?;

        let mut query = sqlx::query(&sql).bind(&id);
        for value in &values {
            query = query.bind(value);
        }
        query.bind(now).bind(now).execute(&mut *tx).await?;
        tx.commit().await?;

        log::info!("{} result created: {} (patient {})", self.kind.label(), id, payload.patient_id);
        self.get(pool, &id).await
    }

    /// Overwrites every field. Concurrent writers are not detected; the last one wins.
    /// A `Standard` update leaves stored legacy kit metadata untouched.
    pub async fn update(
        &self,
        pool: &SqlitePool,
        id: &str,
        payload: &ResultPayload,
        mode: ValidationMode,
    ) -> ApiResult<ResultRecord> {
        let include_legacy = mode == ValidationMode::Import;
        let columns = self.writable_columns(include_legacy);
        let values = self.column_values(payload, include_legacy)?;
        let assignments: Vec<String> = columns.iter().map(|c| format!("{} = ?", c)).collect();

        let sql = format!(
            "UPDATE {} SET {}, updated_at = ? WHERE id = ?",
            self.table(),
            assignments.join(", ")
        );

        let mut tx = pool.begin().await?;
        let exists: Option<(String,)> = sqlx::query_as(&format!("SELECT id FROM {} WHERE id = ?", self.table()))
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Err(self.not_found(id));
        }
        self.ensure_references(&mut *tx, payload).await?;

        let mut query = sqlx::query(&sql);
        for value in &values {
            query = query.bind(value);
        }
        query.bind(Utc::now()).bind(id).execute(&mut *tx).await?;
        tx.commit().await?;

        log::info!("{} result updated: {}", self.kind.label(), id);
        self.get(pool, id).await
    }

    pub async fn delete(&self, pool: &SqlitePool, id: &str) -> ApiResult<()> {
        let sql = format!("DELETE FROM {} WHERE id = ?", self.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(self.not_found(id));
        }

        log::info!("{} result deleted: {}", self.kind.label(), id);
        Ok(())
    }

    pub async fn get_by_id(&self, pool: &SqlitePool, id: &str) -> ApiResult<Option<ResultRecord>> {
        let sql = format!("SELECT * FROM {} WHERE id = ?", self.table());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(pool)
            .await?;

        row.map(|r| self.record_from_row(&r)).transpose()
    }

    pub async fn get(&self, pool: &SqlitePool, id: &str) -> ApiResult<ResultRecord> {
        self.get_by_id(pool, id)
            .await?
            .ok_or_else(|| self.not_found(id))
    }

    /// History view, newest first; `patient_id` narrows it to one patient.
    pub async fn list(&self, pool: &SqlitePool, patient_id: Option<&str>) -> ApiResult<Vec<ResultRecord>> {
        let mut builder = SafeQueryBuilder::new(self.table()).map_err(|e| ApiError::bad_request(&e))?;
        if let Some(patient_id) = patient_id {
            builder.add_exact_match("patient_id", patient_id);
        }
        builder.order_by("created_at", "DESC").order_by("rowid", "DESC");

        let (sql, params) = builder.build_select("*");
        let mut query = sqlx::query(&sql);
        for param in &params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(pool).await?;

        rows.iter().map(|row| self.record_from_row(row)).collect()
    }

    fn not_found(&self, id: &str) -> ApiError {
        ApiError::not_found(&format!("{} result", self.kind.label()), id)
    }

    /// Decodes a row, re-validating every stored field against the schema.
    fn record_from_row(&self, row: &SqliteRow) -> ApiResult<ResultRecord> {
        let id: String = row.try_get("id")?;
        let kit_id: Option<String> = if self.kind.links_kit() {
            row.try_get("kit_id")?
        } else {
            None
        };
        let reported_at: Option<NaiveDate> = row.try_get("reported_at")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

        let mut fields = BTreeMap::new();
        for spec in self.kind.schema() {
            let raw: Option<String> = row.try_get(spec.name)?;
            let Some(raw) = raw else { continue };

            let value = match spec.kind {
                FieldKind::Text | FieldKind::Date => Value::String(raw),
                // Older rows may hold the bare result string rather than a JSON array.
                FieldKind::SingleResult if raw.trim_start().starts_with('[') => {
                    serde_json::from_str::<Value>(&raw).unwrap_or(Value::String(raw))
                }
                FieldKind::SingleResult => Value::String(raw),
                FieldKind::Entries | FieldKind::Values => serde_json::from_str::<Value>(&raw).map_err(|e| {
                    ApiError::InternalServerError(format!(
                        "Stored {} of {} result '{}' is not valid JSON: {}",
                        spec.name, self.kind, id, e
                    ))
                })?,
            };

            match normalize_field(spec, &value) {
                Ok(Some(v)) => {
                    fields.insert(spec.name.to_string(), v);
                }
                Ok(None) => {}
                Err(errors) => {
                    let detail: Vec<String> = errors.into_iter().map(|(_, message)| message).collect();
                    return Err(ApiError::InternalServerError(format!(
                        "Stored {} result '{}' does not match its schema: {}",
                        self.kind,
                        id,
                        detail.join("; ")
                    )));
                }
            }
        }

        Ok(ResultRecord {
            kind: self.kind,
            patient_id: row.try_get("patient_id")?,
            kit_id,
            medical_technologist: row.try_get("medical_technologist")?,
            reported_at,
            fields,
            created_at,
            updated_at,
            id,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::testing::test_pool;
    use crate::models::{FieldValue, KitRequest, PatientRequest, ResultEntry};
    use crate::repositories::{CrudRepository, KitRepository, PatientRepository};
    use crate::validator::{validate_result_payload, ValidationMode};
    use serde_json::{json, Map};
    use strum::IntoEnumIterator;

    async fn patient(pool: &SqlitePool) -> String {
        PatientRepository
            .create(pool, PatientRequest {
                name: "Juan Dela Cruz".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 1),
                gender: "Male".to_string(),
                company: Some("Acme".to_string()),
                address: Some("123 St".to_string()),
            })
            .await
            .unwrap()
            .id
    }

    async fn kit(pool: &SqlitePool) -> String {
        KitRepository
            .create(pool, KitRequest {
                kit_name: "Dengue Duo".to_string(),
                kit_types: Some("Dengue".to_string()),
                kit_lot_no: Some("DD-1".to_string()),
                kit_expiration_date: NaiveDate::from_ymd_opt(2026, 6, 30),
            })
            .await
            .unwrap()
            .id
    }

    fn payload(kind: ResultKind, value: Value) -> ResultPayload {
        let Value::Object(map) = value else { panic!("expected an object") };
        validate_result_payload(kind, &map, ValidationMode::Standard).unwrap().payload
    }

    async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .unwrap()
    }

    #[actix_rt::test]
    async fn test_round_trip_keeps_provided_fields_and_omits_the_rest() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Clinical);

        let input = payload(ResultKind::Clinical, json!({
            "patient_id": patient_id,
            "medical_technologist": "KATE ANGELINE M. SALAS, RMT",
            "fecalysis_color": "Brown",
            "urinalysis_casts": [
                { "type": "hyaline_cast", "details": ["0-2"] },
                { "type": "granular" }
            ],
            "reported_at": "2025-07-30"
        }));

        let created = repo.create(&pool, &input).await.unwrap();
        let read = repo.get(&pool, &created.id).await.unwrap();

        assert_eq!(read, created);
        assert_eq!(read.fields, input.fields);
        assert_eq!(read.reported_at, NaiveDate::from_ymd_opt(2025, 7, 30));
        assert_eq!(read.text("fecalysis_color"), Some("Brown"));
        assert_eq!(read.text("urinalysis_color"), None);
        assert_eq!(
            read.entries("urinalysis_casts")[1],
            ResultEntry { entry_type: "granular".to_string(), details: None }
        );

        let json = serde_json::to_value(&read).unwrap();
        assert!(json.get("urinalysis_color").is_none());
        assert_eq!(json["urinalysis_casts"][0]["type"], "hyaline_cast");
    }

    #[actix_rt::test]
    async fn test_every_kind_round_trips() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let kit_id = kit(&pool).await;

        for kind in ResultKind::iter() {
            let mut map = Map::new();
            map.insert("patient_id".to_string(), json!(patient_id));
            map.insert("medical_technologist".to_string(), json!("JANIELLE M. PASAMONTE, RMT"));
            map.insert("kit_id".to_string(), json!(kit_id));
            let sample = match kind {
                ResultKind::Clinical => ("urinalysis_ph", json!("6.5")),
                ResultKind::Hematology => ("cbc_hgb", json!("130")),
                ResultKind::Serology => ("hbsag_result", json!(["NONREACTIVE"])),
                ResultKind::Chemistry => ("fasting", json!("95")),
            };
            map.insert(sample.0.to_string(), sample.1);

            let input = validate_result_payload(kind, &map, ValidationMode::Standard).unwrap().payload;
            let repo = ResultRepository::new(kind);
            let created = repo.create(&pool, &input).await.unwrap();
            let read = repo.get(&pool, &created.id).await.unwrap();
            assert_eq!(read.fields, input.fields, "{}", kind);
            assert_eq!(read.kit_id.is_some(), kind.links_kit(), "{}", kind);
        }
    }

    #[actix_rt::test]
    async fn test_missing_patient_is_referential_integrity_and_nothing_persists() {
        let pool = test_pool().await;
        let repo = ResultRepository::new(ResultKind::Chemistry);
        let input = payload(ResultKind::Chemistry, json!({
            "patient_id": "ghost",
            "medical_technologist": "X",
            "rbs": "120"
        }));

        let err = repo.create(&pool, &input).await.unwrap_err();
        match err {
            ApiError::ReferentialIntegrity { field, .. } => assert_eq!(field, "patient_id"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(count_rows(&pool, "chemistry_results").await, 0);
    }

    #[actix_rt::test]
    async fn test_serology_with_deleted_kit_cites_kit_id() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let kit_id = kit(&pool).await;
        KitRepository.delete(&pool, &kit_id).await.unwrap();

        let repo = ResultRepository::new(ResultKind::Serology);
        let input = payload(ResultKind::Serology, json!({
            "patient_id": patient_id,
            "kit_id": kit_id,
            "dd_result": [{ "type": "igg", "details": ["positive"] }]
        }));

        let err = repo.create(&pool, &input).await.unwrap_err();
        match err {
            ApiError::ReferentialIntegrity { field, .. } => assert_eq!(field, "kit_id"),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(count_rows(&pool, "serology_results").await, 0);
    }

    #[actix_rt::test]
    async fn test_deleting_kit_unlinks_serology_records() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let kit_id = kit(&pool).await;
        let repo = ResultRepository::new(ResultKind::Serology);

        let input = payload(ResultKind::Serology, json!({
            "patient_id": patient_id,
            "kit_id": kit_id,
            "hbsag_result": ["REACTIVE"]
        }));
        let created = repo.create(&pool, &input).await.unwrap();

        KitRepository.delete(&pool, &kit_id).await.unwrap();

        let read = repo.get(&pool, &created.id).await.unwrap();
        assert_eq!(read.kit_id, None);
        assert_eq!(read.first_result("hbsag_result"), Some("REACTIVE"));
    }

    #[actix_rt::test]
    async fn test_update_replaces_all_fields_and_bumps_timestamp() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Chemistry);

        let created = repo
            .create(&pool, &payload(ResultKind::Chemistry, json!({
                "patient_id": patient_id,
                "medical_technologist": "X",
                "rbs": "150",
                "remarks": "repeat"
            })))
            .await
            .unwrap();

        let updated = repo
            .update(&pool, &created.id, &payload(ResultKind::Chemistry, json!({
                "patient_id": patient_id,
                "medical_technologist": "X",
                "fasting": "90"
            })), ValidationMode::Standard)
            .await
            .unwrap();

        assert_eq!(updated.text("rbs"), None);
        assert_eq!(updated.text("remarks"), None);
        assert_eq!(updated.text("fasting"), Some("90"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[actix_rt::test]
    async fn test_concurrent_updates_last_write_wins_without_conflict() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Chemistry);
        let created = repo
            .create(&pool, &payload(ResultKind::Chemistry, json!({
                "patient_id": patient_id, "medical_technologist": "X", "rbs": "100"
            })))
            .await
            .unwrap();

        // Both editors loaded the same version; neither write is rejected.
        let first = payload(ResultKind::Chemistry, json!({
            "patient_id": patient_id, "medical_technologist": "X", "rbs": "110"
        }));
        let second = payload(ResultKind::Chemistry, json!({
            "patient_id": patient_id, "medical_technologist": "Y", "rbs": "120"
        }));
        repo.update(&pool, &created.id, &first, ValidationMode::Standard).await.unwrap();
        repo.update(&pool, &created.id, &second, ValidationMode::Standard).await.unwrap();

        let read = repo.get(&pool, &created.id).await.unwrap();
        assert_eq!(read.text("rbs"), Some("120"));
        assert_eq!(read.medical_technologist.as_deref(), Some("Y"));
    }

    #[actix_rt::test]
    async fn test_update_and_delete_of_missing_record_are_not_found() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Hematology);
        let input = payload(ResultKind::Hematology, json!({
            "patient_id": patient_id, "medical_technologist": "X"
        }));

        let update = repo.update(&pool, "missing", &input, ValidationMode::Standard).await;
        assert_eq!(update.unwrap_err().code(), "NOT_FOUND");
        assert_eq!(repo.delete(&pool, "missing").await.unwrap_err().code(), "NOT_FOUND");

        let created = repo.create(&pool, &input).await.unwrap();
        repo.delete(&pool, &created.id).await.unwrap();
        assert_eq!(repo.delete(&pool, &created.id).await.unwrap_err().code(), "NOT_FOUND");
    }

    #[actix_rt::test]
    async fn test_update_of_missing_record_with_dangling_patient_is_not_found() {
        let pool = test_pool().await;
        let repo = ResultRepository::new(ResultKind::Chemistry);
        let input = payload(ResultKind::Chemistry, json!({
            "patient_id": "ghost", "medical_technologist": "X", "rbs": "120"
        }));

        let err = repo.update(&pool, "missing", &input, ValidationMode::Standard).await.unwrap_err();
        assert_eq!(err.code(), "NOT_FOUND");
    }

    #[actix_rt::test]
    async fn test_standard_update_keeps_imported_kit_metadata() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let kit_id = kit(&pool).await;
        let repo = ResultRepository::new(ResultKind::Serology);

        let Value::Object(legacy) = json!({
            "patient_id": patient_id,
            "ss_kit": "OldSS",
            "ss_lot_no": "SS-1",
            "ss_expiration_date": "2025-12-31",
            "ss_result": [{ "type": "rpr", "details": ["nonreactive"] }],
            "ss_remarks": "imported"
        }) else { unreachable!() };
        let imported = validate_result_payload(ResultKind::Serology, &legacy, ValidationMode::Import)
            .unwrap()
            .payload;
        let created = repo.create(&pool, &imported).await.unwrap();
        assert_eq!(created.text("ss_kit"), Some("OldSS"));

        let updated = repo
            .update(&pool, &created.id, &payload(ResultKind::Serology, json!({
                "patient_id": patient_id,
                "kit_id": kit_id,
                "ss_result": [{ "type": "rpr", "details": ["nonreactive"] }],
                "ss_remarks": "edited"
            })), ValidationMode::Standard)
            .await
            .unwrap();

        assert_eq!(updated.kit_id.as_deref(), Some(kit_id.as_str()));
        assert_eq!(updated.text("ss_remarks"), Some("edited"));
        assert_eq!(updated.text("ss_kit"), Some("OldSS"));
        assert_eq!(updated.text("ss_lot_no"), Some("SS-1"));
        assert_eq!(
            updated.fields["ss_expiration_date"],
            FieldValue::Date(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap())
        );
    }

    #[actix_rt::test]
    async fn test_deleting_patient_removes_every_owned_result() {
        let pool = test_pool().await;
        let doomed = patient(&pool).await;
        let survivor = patient(&pool).await;
        let kit_id = kit(&pool).await;

        for owner in [&doomed, &survivor] {
            for kind in ResultKind::iter() {
                let mut map = Map::new();
                map.insert("patient_id".to_string(), json!(owner));
                map.insert("medical_technologist".to_string(), json!("X"));
                map.insert("kit_id".to_string(), json!(kit_id));
                let input = validate_result_payload(kind, &map, ValidationMode::Standard).unwrap().payload;
                ResultRepository::new(kind).create(&pool, &input).await.unwrap();
            }
        }

        PatientRepository.delete(&pool, &doomed).await.unwrap();

        for kind in ResultKind::iter() {
            let repo = ResultRepository::new(kind);
            assert!(repo.list(&pool, Some(&doomed)).await.unwrap().is_empty(), "{}", kind);
            assert_eq!(repo.list(&pool, Some(&survivor)).await.unwrap().len(), 1, "{}", kind);
            let orphans: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(*) FROM {} WHERE patient_id NOT IN (SELECT id FROM patients)",
                kind.table_name()
            ))
            .fetch_one(&pool)
            .await
            .unwrap();
            assert_eq!(orphans, 0);
        }
    }

    #[actix_rt::test]
    async fn test_history_is_newest_first() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Chemistry);

        for rbs in ["100", "110", "120"] {
            repo.create(&pool, &payload(ResultKind::Chemistry, json!({
                "patient_id": patient_id, "medical_technologist": "X", "rbs": rbs
            })))
            .await
            .unwrap();
        }

        let history = repo.list(&pool, Some(&patient_id)).await.unwrap();
        let values: Vec<_> = history.iter().map(|r| r.text("rbs").unwrap_or_default()).collect();
        assert_eq!(values, vec!["120", "110", "100"]);
        assert_eq!(repo.list(&pool, None).await.unwrap().len(), 3);
    }

    #[actix_rt::test]
    async fn test_stored_rows_are_revalidated_on_read() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Clinical);
        let created = repo
            .create(&pool, &payload(ResultKind::Clinical, json!({
                "patient_id": patient_id, "medical_technologist": "X"
            })))
            .await
            .unwrap();

        sqlx::query("UPDATE clinical_results SET urinalysis_crystals = ? WHERE id = ?")
            .bind(r#"[{"details":["rare"]}]"#)
            .bind(&created.id)
            .execute(&pool)
            .await
            .unwrap();

        let err = repo.get(&pool, &created.id).await.unwrap_err();
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[actix_rt::test]
    async fn test_legacy_bare_hbsag_value_is_read_as_single_result() {
        let pool = test_pool().await;
        let patient_id = patient(&pool).await;
        let repo = ResultRepository::new(ResultKind::Serology);
        let mut map = Map::new();
        map.insert("patient_id".to_string(), json!(patient_id));
        let input = validate_result_payload(ResultKind::Serology, &map, ValidationMode::Import).unwrap().payload;
        let created = repo.create(&pool, &input).await.unwrap();

        sqlx::query("UPDATE serology_results SET hbsag_result = 'REACTIVE' WHERE id = ?")
            .bind(&created.id)
            .execute(&pool)
            .await
            .unwrap();

        let read = repo.get(&pool, &created.id).await.unwrap();
        assert_eq!(read.fields["hbsag_result"], FieldValue::List(vec!["REACTIVE".to_string()]));

        // Bare values that happen to parse as JSON scalars are still plain strings.
        for (stored, expected) in [("1", "1"), ("true", "true"), ("null", "null")] {
            sqlx::query("UPDATE serology_results SET hbsag_result = ? WHERE id = ?")
                .bind(stored)
                .bind(&created.id)
                .execute(&pool)
                .await
                .unwrap();
            let read = repo.get(&pool, &created.id).await.unwrap();
            assert_eq!(read.first_result("hbsag_result"), Some(expected), "{}", stored);
        }
    }
}
