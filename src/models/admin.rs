use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// 管理员登录：前端 Google 登录后拿到的 ID token
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    pub id_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminLoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub email: String,
}

/// 认证中间件注入到请求扩展中的管理员身份
#[derive(Debug, Clone)]
pub struct AdminIdentity {
    pub email: String,
}
