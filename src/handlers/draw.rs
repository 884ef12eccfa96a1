use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::DrawService;

#[utoipa::path(
    post,
    path = "/api/v1/admin/draws",
    tag = "draws",
    request_body = StartDrawRequest,
    responses(
        (status = 200, description = "开奖成功，返回第一位中奖者", body = DrawStatusResponse),
        (status = 400, description = "中奖人数无效"),
        (status = 404, description = "没有参赛记录"),
        (status = 409, description = "已有开奖在进行中")
    ),
    security(("bearer_auth" = []))
)]
pub async fn start_draw(
    draw_service: web::Data<DrawService>,
    request: web::Json<StartDrawRequest>,
) -> Result<HttpResponse> {
    match draw_service.start_draw(request.into_inner()).await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/api/v1/admin/draws/current",
    tag = "draws",
    responses(
        (status = 200, description = "当前展示状态", body = DrawStatusResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn current_draw(draw_service: web::Data<DrawService>) -> Result<HttpResponse> {
    let status = draw_service.current().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

#[utoipa::path(
    post,
    path = "/api/v1/admin/draws/next",
    tag = "draws",
    responses(
        (status = 200, description = "已确认，返回下一位（或结束）", body = DrawStatusResponse),
        (status = 409, description = "当前没有正在展示的中奖者")
    ),
    security(("bearer_auth" = []))
)]
pub async fn next_winner(draw_service: web::Data<DrawService>) -> Result<HttpResponse> {
    match draw_service.next().await {
        Ok(status) => Ok(HttpResponse::Ok().json(ApiResponse::success(status))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn draw_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/draws", web::post().to(start_draw))
        .route("/draws/current", web::get().to(current_draw))
        .route("/draws/next", web::post().to(next_winner));
}
