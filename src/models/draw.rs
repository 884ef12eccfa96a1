use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::draw::{DrawPolicy, DrawSession};
use crate::entities::entry_entity;

/// 开奖请求
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct StartDrawRequest {
    /// 中奖人数（超过参赛人数时按参赛人数）
    #[schema(example = 3)]
    pub count: usize,
    /// 不传时使用配置中的默认策略
    pub policy: Option<DrawPolicy>,
}

/// 展示给操作员的中奖者信息
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WinnerResponse {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub city: String,
    pub code: String,
    pub image_url: String,
}

impl From<&entry_entity::Model> for WinnerResponse {
    fn from(m: &entry_entity::Model) -> Self {
        WinnerResponse {
            id: m.id,
            first_name: m.first_name.clone(),
            last_name: m.last_name.clone(),
            phone: m.phone.clone(),
            city: m.city.clone(),
            code: m.code.clone(),
            image_url: m.image_url.clone(),
        }
    }
}

/// 开奖会话状态
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawStatusResponse {
    /// idle | drawing | presenting
    #[schema(example = "presenting")]
    pub phase: String,
    /// 当前中奖者序号（从 1 开始）
    pub position: Option<usize>,
    pub total: Option<usize>,
    /// 是否为最后一位（前端按钮显示"关闭"而不是"下一位"）
    pub is_last: bool,
    pub winner: Option<WinnerResponse>,
}

impl DrawStatusResponse {
    pub fn from_session(session: &DrawSession<entry_entity::Model>) -> Self {
        let phase = session.phase();
        match session.current() {
            Some(p) => DrawStatusResponse {
                phase: phase.as_str().to_string(),
                position: Some(p.position),
                total: Some(p.total),
                is_last: p.is_last(),
                winner: Some(WinnerResponse::from(p.winner)),
            },
            None => DrawStatusResponse {
                phase: phase.as_str().to_string(),
                position: None,
                total: None,
                is_last: false,
                winner: None,
            },
        }
    }
}
