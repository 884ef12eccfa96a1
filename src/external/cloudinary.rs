use crate::config::CloudinaryConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::time::Duration;

/// 图片对象存储
#[async_trait]
pub trait ImageStorage: Send + Sync {
    /// 上传图片到指定目录，返回可公开访问的持久 URL
    async fn upload(&self, bytes: Vec<u8>, folder: &str, file_name: &str) -> AppResult<String>;

    /// 下载已存储的图片
    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    error: Option<UploadError>,
}

#[derive(Debug, Deserialize)]
struct UploadError {
    message: String,
}

#[derive(Clone)]
pub struct CloudinaryStorage {
    client: Client,
    config: CloudinaryConfig,
}

impl CloudinaryStorage {
    pub fn new(config: CloudinaryConfig) -> AppResult<Self> {
        let client = Client::builder()
            .user_agent("contest-backend/cloudinary")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    fn upload_url(&self) -> String {
        format!(
            "https://api.cloudinary.com/v1_1/{}/image/upload",
            self.config.cloud_name
        )
    }

    /// 签名: 参数按字母序拼接为 k=v&k=v，末尾追加 api_secret 后取 SHA-1
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.config.api_secret.as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl ImageStorage for CloudinaryStorage {
    async fn upload(&self, bytes: Vec<u8>, folder: &str, file_name: &str) -> AppResult<String> {
        // public_id 不带扩展名，Cloudinary 会按实际格式补上
        let public_id = file_name
            .rsplit_once('.')
            .map(|(stem, _)| stem)
            .unwrap_or(file_name);
        let timestamp = Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", folder),
            ("public_id", public_id),
            ("timestamp", timestamp.as_str()),
        ]);

        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("api_key", self.config.api_key.clone())
            .text("folder", folder.to_string())
            .text("public_id", public_id.to_string())
            .text("timestamp", timestamp)
            .text("signature", signature);

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body: UploadResponse = response.json().await?;

        match (body.secure_url, body.error) {
            (Some(url), _) if status.is_success() => {
                log::info!("Image uploaded to Cloudinary: {url}");
                Ok(url)
            }
            (_, Some(err)) => Err(AppError::ExternalApiError(format!(
                "Cloudinary upload failed: HTTP {}: {}",
                status.as_u16(),
                err.message
            ))),
            _ => Err(AppError::ExternalApiError(format!(
                "Cloudinary upload failed: HTTP {}",
                status.as_u16()
            ))),
        }
    }

    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        let bytes = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        Ok(bytes.to_vec())
    }
}
