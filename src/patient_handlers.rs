// src/patient_handlers.rs
//! Patient registry endpoints

use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};
use std::sync::Arc;
use log::{info, warn};

use crate::AppState;
use crate::error::ApiResult;
use crate::handlers::{ApiResponse, PaginationQuery};
use crate::repositories::{CrudRepository, PatientRepository};
use crate::validator::validate_patient;

pub async fn get_patients(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<PaginationQuery>,
) -> ApiResult<HttpResponse> {
    let page = PatientRepository
        .list_summaries(&app_state.db_pool, &query, app_state.config.pagination.per_page)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

pub async fn get_patient(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let patient = PatientRepository.get(&app_state.db_pool, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(patient)))
}

pub async fn create_patient(
    app_state: web::Data<Arc<AppState>>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let request = validate_patient(&body).map_err(|e| {
        warn!("Patient rejected: {}", e);
        e.with_input(Value::Object(body.clone()))
    })?;

    let patient = PatientRepository
        .create(&app_state.db_pool, request)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    info!("Registered patient: {} ({})", patient.name, patient.id);

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        patient,
        "Patient created successfully".to_string(),
    )))
}

pub async fn update_patient(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let patient_id = path.into_inner();
    PatientRepository.get(&app_state.db_pool, &patient_id).await?;

    let body = body.into_inner();
    let request = validate_patient(&body).map_err(|e| {
        warn!("Patient update rejected for {}: {}", patient_id, e);
        e.with_input(Value::Object(body.clone()))
    })?;

    let patient = PatientRepository
        .update(&app_state.db_pool, &patient_id, request)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        patient,
        "Patient updated successfully".to_string(),
    )))
}

/// Removes the patient together with every result it owns.
pub async fn delete_patient(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    PatientRepository.delete(&app_state.db_pool, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Patient deleted successfully".to_string(),
    )))
}
