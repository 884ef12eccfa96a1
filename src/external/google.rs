use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const TOKENINFO_ENDPOINT: &str = "https://oauth2.googleapis.com/tokeninfo";

/// 外部身份提供方：校验登录凭证并返回账号邮箱
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn verify_id_token(&self, id_token: &str) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct TokenInfo {
    #[serde(default)]
    email: Option<String>,
    /// tokeninfo 返回的是字符串 "true"/"false"
    #[serde(default)]
    email_verified: Option<serde_json::Value>,
    #[serde(default)]
    aud: Option<String>,
}

impl TokenInfo {
    fn is_email_verified(&self) -> bool {
        match &self.email_verified {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::String(s)) => s == "true",
            _ => false,
        }
    }

    fn into_email(self, expected_audience: Option<&str>) -> AppResult<String> {
        if let Some(expected) = expected_audience
            && self.aud.as_deref() != Some(expected)
        {
            return Err(AppError::AuthError("ID token audience mismatch".into()));
        }
        if !self.is_email_verified() {
            return Err(AppError::AuthError("Email is not verified".into()));
        }
        self.email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| AppError::AuthError("ID token has no email".into()))
    }
}

#[derive(Clone)]
pub struct GoogleIdentity {
    http: Client,
    client_id: Option<String>,
}

impl GoogleIdentity {
    pub fn new(client_id: Option<String>) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("contest-backend/google")
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, client_id })
    }
}

#[async_trait]
impl IdentityProvider for GoogleIdentity {
    async fn verify_id_token(&self, id_token: &str) -> AppResult<String> {
        if id_token.is_empty() || id_token.len() > 4096 {
            return Err(AppError::AuthError("Invalid ID token".into()));
        }

        let resp = self
            .http
            .get(TOKENINFO_ENDPOINT)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(AppError::AuthError(format!(
                "ID token rejected by Google: HTTP {}",
                resp.status().as_u16()
            )));
        }

        let info: TokenInfo = resp.json().await?;
        info.into_email(self.client_id.as_deref())
    }
}
