use crate::error::{AppError, AppResult};
use crate::external::IdentityProvider;
use crate::models::*;
use crate::utils::*;
use std::sync::Arc;

/// 管理员登录：外部身份校验 + 邮箱白名单 + 签发 JWT
#[derive(Clone)]
pub struct AdminAuthService {
    identity: Arc<dyn IdentityProvider>,
    jwt_service: JwtService,
    allowed_emails: Vec<String>,
}

impl AdminAuthService {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        jwt_service: JwtService,
        allowed_emails: Vec<String>,
    ) -> Self {
        Self {
            identity,
            jwt_service,
            allowed_emails: allowed_emails
                .into_iter()
                .map(|e| e.trim().to_lowercase())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_allowed(&self, email: &str) -> bool {
        let email = email.trim().to_lowercase();
        self.allowed_emails.iter().any(|e| *e == email)
    }

    pub async fn login(&self, request: AdminLoginRequest) -> AppResult<AdminLoginResponse> {
        let email = self.identity.verify_id_token(&request.id_token).await?;

        if !self.is_allowed(&email) {
            log::warn!("Admin login refused for {email}");
            return Err(AppError::Forbidden);
        }

        let access_token = self.jwt_service.generate_access_token(&email)?;
        log::info!("Admin {email} logged in");

        Ok(AdminLoginResponse {
            access_token,
            token_type: "Bearer".to_string(),
            expires_in: self.jwt_service.get_access_token_expires_in(),
            email,
        })
    }
}
