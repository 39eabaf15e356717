// src/result_handlers.rs
//! Result endpoints, shared by all four categories.
//!
//! Each category is mounted as its own scope carrying its [`ResultKind`] as app data,
//! so one set of handlers serves `/clinical`, `/hematology`, `/serology` and `/chemistry`.

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use log::{info, warn};

use crate::AppState;
use crate::error::ApiResult;
use crate::handlers::ApiResponse;
use crate::models::{ResultKind, ResultPayload};
use crate::repositories::{CrudRepository, PatientRepository, ResultRepository};
use crate::validator::{validate_result_payload, ValidationMode};

#[derive(Debug, Deserialize)]
pub struct ResultListQuery {
    pub patient_id: Option<String>,
}

// ==================== HELPERS ====================

/// Validates the raw body, echoing it back on failure.
fn validate_body(
    kind: ResultKind,
    body: &Map<String, Value>,
    mode: ValidationMode,
) -> ApiResult<(ResultPayload, BTreeMap<String, Vec<String>>)> {
    match validate_result_payload(kind, body, mode) {
        Ok(validated) => {
            for (field, messages) in &validated.warnings {
                warn!("{} payload field '{}': {}", kind, field, messages.join(", "));
            }
            Ok((validated.payload, validated.warnings))
        }
        Err(result) => {
            warn!("{} payload rejected: {}", kind, result.summary());
            Err(result.to_api_error().with_input(Value::Object(body.clone())))
        }
    }
}

fn outcome_message(kind: ResultKind, action: &str, warnings: &BTreeMap<String, Vec<String>>) -> String {
    let mut message = format!("{} result {} successfully", kind.label(), action);
    if !warnings.is_empty() {
        let fields: Vec<&str> = warnings.keys().map(String::as_str).collect();
        message.push_str(&format!("; ignored: {}", fields.join(", ")));
    }
    message
}

// ==================== HANDLERS ====================

/// History view, newest first, optionally narrowed to one patient.
pub async fn list_results(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    query: web::Query<ResultListQuery>,
) -> ApiResult<HttpResponse> {
    let repo = ResultRepository::new(**kind);
    let patient_id = query.patient_id.as_deref().filter(|id| !id.trim().is_empty());
    let records = repo.list(&app_state.db_pool, patient_id).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn list_patient_results(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let patient_id = path.into_inner();
    PatientRepository.get(&app_state.db_pool, &patient_id).await?;

    let records = ResultRepository::new(**kind)
        .list(&app_state.db_pool, Some(&patient_id))
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(records)))
}

pub async fn get_result(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let record = ResultRepository::new(**kind)
        .get(&app_state.db_pool, &path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(record)))
}

pub async fn create_result(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    store_new(&app_state, **kind, body.into_inner(), ValidationMode::Standard).await
}

/// Accepts serology rows carrying the superseded per-panel kit metadata.
pub async fn import_serology(
    app_state: web::Data<Arc<AppState>>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    store_new(&app_state, ResultKind::Serology, body.into_inner(), ValidationMode::Import).await
}

async fn store_new(
    app_state: &AppState,
    kind: ResultKind,
    body: Map<String, Value>,
    mode: ValidationMode,
) -> ApiResult<HttpResponse> {
    let (payload, warnings) = validate_body(kind, &body, mode)?;

    let record = ResultRepository::new(kind)
        .create(&app_state.db_pool, &payload)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        record,
        outcome_message(kind, "created", &warnings),
    )))
}

/// Full replacement: fields left out of the body are cleared.
pub async fn update_result(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let id = path.into_inner();
    let repo = ResultRepository::new(kind);
    repo.get(&app_state.db_pool, &id).await?;

    let body = body.into_inner();
    let (payload, warnings) = validate_body(kind, &body, ValidationMode::Standard)?;

    let record = repo
        .update(&app_state.db_pool, &id, &payload, ValidationMode::Standard)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        record,
        outcome_message(kind, "updated", &warnings),
    )))
}

pub async fn delete_result(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let id = path.into_inner();
    ResultRepository::new(**kind).delete(&app_state.db_pool, &id).await?;
    info!("Removed {} result {}", kind.as_ref(), id);

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        format!("{} result deleted successfully", kind.label()),
    )))
}
