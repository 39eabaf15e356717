// src/kit_handlers.rs
//! Reagent kit registry endpoints

use actix_web::{web, HttpResponse};
use serde_json::{Map, Value};
use std::sync::Arc;
use log::warn;

use crate::AppState;
use crate::error::ApiResult;
use crate::handlers::{ApiResponse, PaginationQuery};
use crate::models::KitListItem;
use crate::repositories::{CrudRepository, KitRepository};
use crate::validator::validate_kit;

pub async fn get_kits(
    app_state: web::Data<Arc<AppState>>,
    query: web::Query<PaginationQuery>,
) -> ApiResult<HttpResponse> {
    let page = KitRepository
        .get_paginated(&app_state.db_pool, &query, app_state.config.pagination.per_page)
        .await?
        .map(KitListItem::from);

    Ok(HttpResponse::Ok().json(ApiResponse::success(page)))
}

pub async fn get_kit(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let kit = KitRepository.get(&app_state.db_pool, &path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(ApiResponse::success(KitListItem::from(kit))))
}

pub async fn create_kit(
    app_state: web::Data<Arc<AppState>>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let body = body.into_inner();
    let request = validate_kit(&body).map_err(|e| {
        warn!("Kit rejected: {}", e);
        e.with_input(Value::Object(body.clone()))
    })?;

    let kit = KitRepository
        .create(&app_state.db_pool, request)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
        kit,
        "Kit created successfully".to_string(),
    )))
}

pub async fn update_kit(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
    body: web::Json<Map<String, Value>>,
) -> ApiResult<HttpResponse> {
    let kit_id = path.into_inner();
    KitRepository.get(&app_state.db_pool, &kit_id).await?;

    let body = body.into_inner();
    let request = validate_kit(&body).map_err(|e| {
        warn!("Kit update rejected for {}: {}", kit_id, e);
        e.with_input(Value::Object(body.clone()))
    })?;

    let kit = KitRepository
        .update(&app_state.db_pool, &kit_id, request)
        .await
        .map_err(|e| e.with_input(Value::Object(body)))?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        kit,
        "Kit updated successfully".to_string(),
    )))
}

/// Deletes the kit; serology results that used it keep existing without a kit link.
pub async fn delete_kit(
    app_state: web::Data<Arc<AppState>>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    KitRepository.delete(&app_state.db_pool, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
        (),
        "Kit deleted successfully".to_string(),
    )))
}
