use crate::entities::entry_entity as entries;
use crate::error::{AppError, AppResult};
use crate::external::ImageStorage;
use crate::utils::image_extension;
use futures_util::stream::{self, StreamExt};
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};
use std::io::{Cursor, Write};
use std::sync::Arc;
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

/// UTF-8 BOM，Excel 打开时才能正确显示阿拉伯文等非拉丁字符
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

pub const EXPORT_FILE_NAME: &str = "entries_with_images.zip";

/// 同时进行的图片下载数
const FETCH_CONCURRENCY: usize = 8;

const CSV_HEADER: [&str; 8] = [
    "firstName",
    "lastName",
    "phone",
    "city",
    "code",
    "deviceId",
    "createdAt",
    "imageUrl",
];

pub struct ExportService {
    pool: DatabaseConnection,
    storage: Arc<dyn ImageStorage>,
}

impl ExportService {
    pub fn new(pool: DatabaseConnection, storage: Arc<dyn ImageStorage>) -> Self {
        Self { pool, storage }
    }

    /// 导出全部参赛记录（按创建时间倒序）及图片为 ZIP
    pub async fn export_bundle(&self) -> AppResult<Vec<u8>> {
        let rows = entries::Entity::find()
            .order_by_desc(entries::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        if rows.is_empty() {
            return Err(AppError::NoEntries);
        }

        self.build_bundle(&rows).await
    }

    /// entries.csv + images/image_{n}.{ext}，n 为 CSV 中的行号（从 1 开始）
    ///
    /// 图片最多 `FETCH_CONCURRENCY` 个同时下载，结果保持行顺序；
    /// 下载失败的只记录日志并跳过，不影响 CSV。
    pub async fn build_bundle(&self, rows: &[entries::Model]) -> AppResult<Vec<u8>> {
        let csv = entries_csv(rows)?;

        let fetched: Vec<AppResult<Vec<u8>>> =
            stream::iter(rows.iter().map(|row| self.storage.fetch(&row.image_url)))
                .buffered(FETCH_CONCURRENCY)
                .collect()
                .await;

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

        zip.start_file("entries.csv", deflated)?;
        zip.write_all(&csv)?;

        let mut images = 0usize;
        for (idx, (row, image)) in rows.iter().zip(fetched).enumerate() {
            match image {
                Ok(bytes) => {
                    let name = format!(
                        "images/image_{}.{}",
                        idx + 1,
                        image_extension(&row.image_url)
                    );
                    zip.start_file(name, stored)?;
                    zip.write_all(&bytes)?;
                    images += 1;
                }
                Err(e) => {
                    log::warn!(
                        "Skipping image for entry {} ({}): {}",
                        row.id,
                        row.image_url,
                        e
                    );
                }
            }
        }

        let bundle = zip.finish()?.into_inner();
        log::info!(
            "Export bundle built: {} entries, {} images, {} bytes",
            rows.len(),
            images,
            bundle.len()
        );
        Ok(bundle)
    }
}

fn entries_csv(rows: &[entries::Model]) -> AppResult<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(UTF8_BOM.to_vec());
    writer.write_record(CSV_HEADER)?;
    for row in rows {
        writer.write_record([
            row.first_name.as_str(),
            row.last_name.as_str(),
            row.phone.as_str(),
            row.city.as_str(),
            row.code.as_str(),
            row.device_id.as_str(),
            row.created_at.to_rfc3339().as_str(),
            row.image_url.as_str(),
        ])?;
    }
    writer
        .into_inner()
        .map_err(|e| AppError::InternalError(format!("Failed to flush CSV: {e}")))
}
