use crate::draw::{DrawCandidate, DrawError, DrawPhase, DrawPolicy, DrawSession, select_winners};
use crate::entities::entry_entity as entries;
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::{DatabaseConnection, EntityTrait};
use std::sync::Arc;
use tokio::sync::Mutex;

impl DrawCandidate for entries::Model {
    fn group(&self) -> Option<&str> {
        self.group_tag.as_deref()
    }

    fn is_stranger(&self) -> bool {
        self.is_relative == Some(false)
    }
}

/// 开奖服务：加载参赛池、抽取中奖者、驱动展示会话
///
/// 会话为进程内单例，多个 worker 共享同一个 `Arc`。
pub struct DrawService {
    pool: DatabaseConnection,
    session: Arc<Mutex<DrawSession<entries::Model>>>,
    default_policy: DrawPolicy,
}

impl DrawService {
    pub fn new(pool: DatabaseConnection, default_policy: DrawPolicy) -> Self {
        Self {
            pool,
            session: Arc::new(Mutex::new(DrawSession::new())),
            default_policy,
        }
    }

    /// 开始一次开奖
    ///
    /// 先加载参赛池，再在同一次持锁内完成 begin -> 抽取 -> complete，
    /// Drawing 状态不会跨越任何 await，请求中途被丢弃也不会卡住会话。
    pub async fn start_draw(&self, req: StartDrawRequest) -> AppResult<DrawStatusResponse> {
        if req.count == 0 {
            return Err(AppError::ValidationError(
                "Winner count must be at least 1".to_string(),
            ));
        }
        let policy = req.policy.unwrap_or(self.default_policy);

        // 快速失败，避免展示中重复加载参赛池；以下面持锁时的 begin 为准
        if self.session.lock().await.phase() != DrawPhase::Idle {
            return Err(DrawError::InProgress.into());
        }

        let pool = entries::Entity::find().all(&self.pool).await?;

        let mut session = self.session.lock().await;
        session.begin()?;

        if pool.is_empty() {
            session.abort();
            return Err(AppError::NoEntries);
        }

        let pool_size = pool.len();
        let winners = select_winners(pool, req.count, policy, &mut rand::rng());
        log::info!(
            "Draw started: {} winner(s) from {} entries, requested {}, policy {:?}",
            winners.len(),
            pool_size,
            req.count,
            policy
        );

        session.complete(winners)?;
        Ok(DrawStatusResponse::from_session(&session))
    }

    pub async fn current(&self) -> DrawStatusResponse {
        let session = self.session.lock().await;
        DrawStatusResponse::from_session(&session)
    }

    /// 操作员确认当前中奖者，切到下一位（最后一位确认后结束）
    pub async fn next(&self) -> AppResult<DrawStatusResponse> {
        let mut session = self.session.lock().await;
        session.acknowledge()?;
        Ok(DrawStatusResponse::from_session(&session))
    }
}
