use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::entry_entity;

/// 上传的图片
#[derive(Debug, Clone, Default)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
    pub file_name: Option<String>,
}

/// 一次参赛提交（从 multipart 表单解析而来，尚未校验）
#[derive(Debug, Clone, Default)]
pub struct EntrySubmission {
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub code: String,
    pub device_id: Option<String>,
    pub image: Option<ImageUpload>,
    pub group_tag: Option<String>,
    pub is_relative: Option<bool>,
}

/// 参赛表单（仅用于 OpenAPI 文档，实际以 multipart/form-data 提交）
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEntryForm {
    #[schema(example = "Amina")]
    pub first_name: String,
    #[schema(example = "Benali")]
    pub last_name: String,
    #[schema(example = "0555123456")]
    pub phone: String,
    #[schema(example = "Médéa")]
    pub city: String,
    #[schema(example = "SUMMER25")]
    pub code: String,
    /// 设备指纹，缺省时使用 device_id cookie
    pub device_id: Option<String>,
    /// Turnstile token（启用人机验证时必填）
    pub captcha_token: Option<String>,
    pub group: Option<String>,
    pub is_relative: Option<bool>,
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitEntryResponse {
    pub id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DeviceResponse {
    pub device_id: String,
}

/// 后台查看的参赛记录
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub code: String,
    pub image_url: String,
    pub image_hash: String,
    pub device_id: String,
    pub group: Option<String>,
    pub is_relative: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl From<entry_entity::Model> for EntryResponse {
    fn from(m: entry_entity::Model) -> Self {
        EntryResponse {
            id: m.id,
            first_name: m.first_name,
            last_name: m.last_name,
            phone: m.phone,
            city: m.city,
            code: m.code,
            image_url: m.image_url,
            image_hash: m.image_hash,
            device_id: m.device_id,
            group: m.group_tag,
            is_relative: m.is_relative,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EntryCountResponse {
    pub total: u64,
}
