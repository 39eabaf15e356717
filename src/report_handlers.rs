// src/report_handlers.rs
//! Report endpoints: `/{kind}/{id}/{subtype}-pdf` and `/{kind}/{id}/{subtype}-document`

use actix_web::{web, HttpResponse};
use chrono::Local;
use std::str::FromStr;
use std::sync::Arc;
use log::{error, info};

use crate::AppState;
use crate::error::{ApiError, ApiResult};
use crate::handlers::ApiResponse;
use crate::models::ResultKind;
use crate::repositories::{CrudRepository, KitRepository, PatientRepository, ResultRepository};
use crate::reports::{project, ReportContext, ReportDocument, ReportSubtype};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Pdf,
    Document,
}

/// Splits `cbc-pdf` into its subtype and format. Anything unknown is a missing route.
pub fn parse_report_segment(kind: ResultKind, segment: &str) -> ApiResult<(ReportSubtype, ReportFormat)> {
    let (name, format) = if let Some(name) = segment.strip_suffix("-pdf") {
        (name, ReportFormat::Pdf)
    } else if let Some(name) = segment.strip_suffix("-document") {
        (name, ReportFormat::Document)
    } else {
        return Err(ApiError::NotFound(format!("Unknown report '{}'", segment)));
    };

    let subtype = ReportSubtype::from_str(name)
        .map_err(|_| ApiError::NotFound(format!("Unknown report '{}'", segment)))?;
    if !ReportSubtype::for_kind(kind).contains(&subtype) {
        return Err(ApiError::NotFound(format!(
            "No {} report exists for {} results",
            subtype, kind
        )));
    }
    Ok((subtype, format))
}

async fn build_document(
    app_state: &AppState,
    kind: ResultKind,
    id: &str,
    subtype: ReportSubtype,
) -> ApiResult<ReportDocument> {
    let pool = &app_state.db_pool;
    let record = ResultRepository::new(kind).get(pool, id).await?;
    let patient = PatientRepository.get(pool, &record.patient_id).await?;
    let kit = match record.kit_id.as_deref() {
        Some(kit_id) => KitRepository.get_by_id(pool, kit_id).await?,
        None => None,
    };

    let ctx = ReportContext {
        today: Local::now().date_naive(),
        config: &app_state.config.reports,
        licenses: &app_state.licenses,
    };
    project(&record, &patient, kit.as_ref(), subtype, &ctx)
}

pub async fn get_report(
    app_state: web::Data<Arc<AppState>>,
    kind: web::Data<ResultKind>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let kind = **kind;
    let (id, segment) = path.into_inner();
    let (subtype, format) = parse_report_segment(kind, &segment)?;
    let document = build_document(&app_state, kind, &id, subtype).await?;

    match format {
        ReportFormat::Document => Ok(HttpResponse::Ok().json(ApiResponse::success(document))),
        ReportFormat::Pdf => {
            let bytes = app_state.renderer.render(&document).await.map_err(|e| {
                error!("{} renderer failed for {} report of {}: {}", app_state.renderer.name(), subtype, id, e);
                ApiError::from(e)
            })?;
            info!("Rendered {} report for {} result {} ({} bytes)", subtype, kind, id, bytes.len());

            Ok(HttpResponse::Ok()
                .insert_header(("Content-Type", "application/pdf"))
                .insert_header((
                    "Content-Disposition",
                    format!("inline; filename=\"{}\"", document.filename),
                ))
                .body(bytes))
        }
    }
}
