use crate::config::TurnstileConfig;
use crate::error::{AppError, AppResult, Rejection};
use reqwest::Client;
use serde::{Deserialize, Serialize};

const VERIFY_ENDPOINT: &str = "https://challenges.cloudflare.com/turnstile/v0/siteverify";

/// Cloudflare Turnstile 人机验证（未配置 secret_key 时不启用）
#[derive(Clone)]
pub struct TurnstileService {
    http: Client,
    cfg: TurnstileConfig,
}

impl TurnstileService {
    pub fn new(cfg: TurnstileConfig) -> AppResult<Self> {
        let http = Client::builder()
            .user_agent("contest-backend/turnstile")
            .build()?;
        Ok(Self { http, cfg })
    }

    pub fn is_enabled(&self) -> bool {
        !self.cfg.secret_key.is_empty()
    }

    /// 校验从前端提交的 Turnstile token。
    /// 如果 expected_* 在配置中设置，将进行额外校验。
    pub async fn verify_token(&self, token: Option<&str>, remote_ip: Option<&str>) -> AppResult<()> {
        let token = match token.map(str::trim) {
            Some(t) if !t.is_empty() => t,
            _ => return Err(Rejection::MissingCaptcha.into()),
        };
        if token.len() > 2048 {
            return Err(Rejection::CaptchaFailed.into());
        }

        let mut req_body = serde_json::json!({
            "secret": self.cfg.secret_key,
            "response": token,
        });
        if let Some(ip) = remote_ip {
            req_body["remoteip"] = serde_json::json!(ip);
        }

        let resp = self
            .http
            .post(VERIFY_ENDPOINT)
            .json(&req_body)
            .send()
            .await?;

        let status = resp.status();
        let body: VerifyResponse = resp.json().await?;

        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Turnstile verification failed: HTTP {}",
                status.as_u16()
            )));
        }

        check_response(&self.cfg, &body)
    }
}

fn check_response(cfg: &TurnstileConfig, body: &VerifyResponse) -> AppResult<()> {
    if !body.success {
        let errs = body.error_codes.clone().unwrap_or_default().join(",");
        log::warn!("Turnstile rejected token: {errs}");
        return Err(Rejection::CaptchaFailed.into());
    }

    if let Some(expected) = &cfg.expected_hostname
        && let Some(host) = body.hostname.as_ref()
        && host != expected
    {
        log::warn!("Turnstile hostname mismatch: {host}");
        return Err(Rejection::CaptchaFailed.into());
    }
    if let Some(expected) = &cfg.expected_action
        && let Some(action) = body.action.as_ref()
        && action != expected
    {
        log::warn!("Turnstile action mismatch: {action}");
        return Err(Rejection::CaptchaFailed.into());
    }

    Ok(())
}

#[derive(Debug, Deserialize, Serialize)]
struct VerifyResponse {
    success: bool,
    #[serde(default)]
    hostname: Option<String>,
    #[serde(rename = "error-codes")]
    #[serde(default)]
    error_codes: Option<Vec<String>>,
    #[serde(default)]
    action: Option<String>,
}
