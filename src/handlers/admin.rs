use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

use crate::middlewares::current_admin;
use crate::models::*;
use crate::services::{EXPORT_FILE_NAME, EntryService, ExportService};
use crate::utils::PaginationParams;

use super::draw::draw_config;

#[utoipa::path(
    get,
    path = "/api/v1/admin/entries",
    tag = "admin",
    params(PaginationParams),
    responses(
        (status = 200, description = "参赛记录（按提交时间倒序）", body = [EntryResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_entries(
    entry_service: web::Data<EntryService>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse> {
    match entry_service.list_entries(&query).await {
        Ok(page) => Ok(HttpResponse::Ok().json(ApiResponse::success(page))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/entries/count",
    tag = "admin",
    responses(
        (status = 200, description = "参赛人数", body = EntryCountResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn count_entries(entry_service: web::Data<EntryService>) -> Result<HttpResponse> {
    match entry_service.count_entries().await {
        Ok(total) => Ok(HttpResponse::Ok().json(ApiResponse::success(EntryCountResponse { total }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/export",
    tag = "admin",
    responses(
        (status = 200, description = "entries.csv + images/ 的 ZIP 包", content_type = "application/zip"),
        (status = 404, description = "没有参赛记录")
    ),
    security(("bearer_auth" = []))
)]
pub async fn export_entries(
    export_service: web::Data<ExportService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    if let Some(admin) = current_admin(&req) {
        log::info!("Export requested by {}", admin.email);
    }

    match export_service.export_bundle().await {
        Ok(bundle) => Ok(HttpResponse::Ok()
            .content_type("application/zip")
            .insert_header(ContentDisposition {
                disposition: DispositionType::Attachment,
                parameters: vec![DispositionParam::Filename(EXPORT_FILE_NAME.to_string())],
            })
            .body(bundle)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/entries", web::get().to(list_entries))
            .route("/entries/count", web::get().to(count_entries))
            .route("/export", web::get().to(export_entries))
            .configure(draw_config),
    );
}
