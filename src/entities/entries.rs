use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// 参赛记录实体
/// 说明:
/// - 只有创建与读取，没有更新 / 删除路径
/// - phone / device_id / image_hash 各自有唯一索引
/// - image_hash 为图片原始字节的 MD5 (hex)
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    /// 比赛代码
    pub code: String,
    /// 对象存储返回的公开地址
    pub image_url: String,
    pub image_hash: String,
    pub device_id: String,
    /// 分组标识（分组抽奖时同组最多一人中奖）
    pub group_tag: Option<String>,
    /// Some(false) = 明确标记为非亲属
    pub is_relative: Option<bool>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
