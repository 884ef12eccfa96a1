//! 抽奖引擎：随机洗牌选人 + 逐个展示的状态机。
//!
//! 与数据库无关，`DrawService` 负责加载参赛池并持有会话。

pub mod policy;
pub mod session;
pub mod shuffle;

pub use policy::{DrawCandidate, DrawPolicy, select_winners};
pub use session::{DrawError, DrawPhase, DrawSession, Presentation};
pub use shuffle::fisher_yates;
