use crate::entities::entry_entity as entries;
use crate::error::{AppError, AppResult, Rejection};
use crate::external::ImageStorage;
use crate::models::*;
use crate::utils::{
    PaginatedResponse, PaginationParams, image_content_hash, upload_extension, validate_phone,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
};
use std::sync::Arc;

/// 与 entries 表的列宽一致（varchar 按字符计）
const MAX_TEXT_CHARS: usize = 255;
const MAX_CODE_CHARS: usize = 64;

/// 提交限制
#[derive(Debug, Clone)]
pub struct AdmissionLimits {
    pub max_image_bytes: usize,
    /// 对象存储目录
    pub folder: String,
}

pub struct EntryService {
    pool: DatabaseConnection,
    storage: Arc<dyn ImageStorage>,
    limits: AdmissionLimits,
}

impl EntryService {
    pub fn new(
        pool: DatabaseConnection,
        storage: Arc<dyn ImageStorage>,
        limits: AdmissionLimits,
    ) -> Self {
        Self {
            pool,
            storage,
            limits,
        }
    }

    pub fn max_image_bytes(&self) -> usize {
        self.limits.max_image_bytes
    }

    /// 参赛提交
    ///
    /// 逻辑（按顺序，任一步失败立即返回）:
    /// 1. 设备标识必须存在
    /// 2. 图片必须存在且合法，必填字段非空，手机号格式正确
    /// 3. 手机号已被使用 -> DuplicatePhone
    /// 4. 设备已参与 -> DuplicateDevice
    /// 5. 计算图片 MD5
    /// 6. 图片已被使用 -> DuplicateImage
    /// 7. 上传图片到对象存储
    /// 8. 写入记录；唯一索引冲突为最终判定，映射回对应的 Duplicate*
    /// 9. 返回新记录 ID
    ///
    /// 3/4/6 的预检查只是为了尽早给出友好提示，并发提交时以数据库唯一索引为准。
    pub async fn admit(&self, submission: EntrySubmission) -> AppResult<i64> {
        let device_id = submission
            .device_id
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or(Rejection::MissingDeviceIdentity)?
            .to_string();
        within_limit(&device_id, "deviceId", MAX_TEXT_CHARS)?;

        let image = submission
            .image
            .filter(|img| !img.bytes.is_empty())
            .ok_or(Rejection::MissingImage)?;
        self.check_image(&image)?;

        let first_name = required(&submission.first_name, "firstName", MAX_TEXT_CHARS)?;
        let last_name = required(&submission.last_name, "lastName", MAX_TEXT_CHARS)?;
        let phone = validate_phone(&required(&submission.phone, "phone", MAX_TEXT_CHARS)?)?;
        let city = required(&submission.city, "city", MAX_TEXT_CHARS)?;
        let code = required(&submission.code, "code", MAX_CODE_CHARS)?;
        let group_tag = submission
            .group_tag
            .as_deref()
            .map(str::trim)
            .filter(|g| !g.is_empty())
            .map(str::to_string);
        if let Some(group) = &group_tag {
            within_limit(group, "group", MAX_TEXT_CHARS)?;
        }

        if self.exists(entries::Column::Phone, &phone).await? {
            return Err(Rejection::DuplicatePhone.into());
        }

        if self.exists(entries::Column::DeviceId, &device_id).await? {
            return Err(Rejection::DuplicateDevice.into());
        }

        let image_hash = image_content_hash(&image.bytes);

        if self.exists(entries::Column::ImageHash, &image_hash).await? {
            return Err(Rejection::DuplicateImage.into());
        }

        let file_name = format!(
            "{}.{}",
            image_hash,
            upload_extension(image.content_type.as_deref(), image.file_name.as_deref())
        );
        let image_url = self
            .storage
            .upload(image.bytes, &self.limits.folder, &file_name)
            .await?;

        let created = entries::ActiveModel {
            first_name: Set(first_name),
            last_name: Set(last_name),
            phone: Set(phone),
            city: Set(city),
            code: Set(code),
            image_url: Set(image_url.clone()),
            image_hash: Set(image_hash),
            device_id: Set(device_id),
            group_tag: Set(group_tag),
            is_relative: Set(submission.is_relative),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await;

        match created {
            Ok(model) => {
                log::info!("Entry {} admitted (image {})", model.id, model.image_hash);
                Ok(model.id)
            }
            Err(err) => match unique_violation(&err) {
                Some(rejection) => {
                    // 并发提交：预检查都通过但写入时撞上唯一索引，已上传的图片成为孤儿
                    log::warn!(
                        "Entry rejected at insert ({}), orphaned image: {image_url}",
                        rejection.code()
                    );
                    Err(rejection.into())
                }
                None => Err(err.into()),
            },
        }
    }

    /// 后台分页查看（按创建时间倒序）
    pub async fn list_entries(
        &self,
        params: &PaginationParams,
    ) -> AppResult<PaginatedResponse<EntryResponse>> {
        let total = entries::Entity::find().count(&self.pool).await?;

        let items = entries::Entity::find()
            .order_by_desc(entries::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(
            items.into_iter().map(Into::into).collect(),
            params,
            total,
        ))
    }

    pub async fn count_entries(&self) -> AppResult<u64> {
        Ok(entries::Entity::find().count(&self.pool).await?)
    }

    fn check_image(&self, image: &ImageUpload) -> AppResult<()> {
        if let Some(ct) = image.content_type.as_deref()
            && !ct.starts_with("image/")
        {
            return Err(Rejection::InvalidImage(format!("unsupported content type {ct}")).into());
        }
        if image.bytes.len() > self.limits.max_image_bytes {
            return Err(Rejection::InvalidImage(format!(
                "file is larger than {} bytes",
                self.limits.max_image_bytes
            ))
            .into());
        }
        Ok(())
    }

    async fn exists(&self, column: entries::Column, value: &str) -> AppResult<bool> {
        let found = entries::Entity::find()
            .filter(column.eq(value))
            .one(&self.pool)
            .await?;
        Ok(found.is_some())
    }
}

fn required(value: &str, field: &'static str, max_chars: usize) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Rejection::MissingField(field).into());
    }
    within_limit(trimmed, field, max_chars)?;
    Ok(trimmed.to_string())
}

fn within_limit(value: &str, field: &str, max_chars: usize) -> Result<(), AppError> {
    if value.chars().count() > max_chars {
        return Err(Rejection::FieldTooLong(field.to_string()).into());
    }
    Ok(())
}

fn unique_violation(err: &DbErr) -> Option<Rejection> {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(message)) => rejection_for_constraint(&message),
        _ => None,
    }
}

/// 唯一索引名 -> 拒绝原因（索引名见 migration m20251101_000001_create_entries）
fn rejection_for_constraint(message: &str) -> Option<Rejection> {
    if message.contains("idx_entries_phone_unique") {
        Some(Rejection::DuplicatePhone)
    } else if message.contains("idx_entries_device_id_unique") {
        Some(Rejection::DuplicateDevice)
    } else if message.contains("idx_entries_image_hash_unique") {
        Some(Rejection::DuplicateImage)
    } else {
        None
    }
}
