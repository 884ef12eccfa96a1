use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::AdminAuthService;

#[utoipa::path(
    post,
    path = "/api/v1/admin/login",
    tag = "admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "登录成功", body = AdminLoginResponse),
        (status = 401, description = "ID token 无效"),
        (status = 403, description = "邮箱不在管理员白名单中")
    )
)]
pub async fn admin_login(
    auth_service: web::Data<AdminAuthService>,
    request: web::Json<AdminLoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(ApiResponse::success(response))),
        Err(e) => Ok(e.error_response()),
    }
}

/// 登录路由不在 /admin scope 内，需要在 admin_config 之前注册
pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/admin/login", web::post().to(admin_login));
}
