use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    #[error("A draw is already in progress")]
    InProgress,
    #[error("No winner is being presented")]
    NothingToAcknowledge,
    #[error("No draw is running")]
    NotDrawing,
}

impl DrawError {
    pub fn code(&self) -> &'static str {
        match self {
            DrawError::InProgress => "DRAW_IN_PROGRESS",
            DrawError::NothingToAcknowledge => "NOTHING_TO_ACKNOWLEDGE",
            DrawError::NotDrawing => "NOT_DRAWING",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPhase {
    Idle,
    Drawing,
    Presenting,
}

impl DrawPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            DrawPhase::Idle => "idle",
            DrawPhase::Drawing => "drawing",
            DrawPhase::Presenting => "presenting",
        }
    }
}

#[derive(Debug)]
enum State<T> {
    Idle,
    Drawing,
    Presenting { winners: Vec<T>, index: usize },
}

/// 当前展示的中奖者
#[derive(Debug, PartialEq)]
pub struct Presentation<'a, T> {
    pub winner: &'a T,
    /// 从 1 开始
    pub position: usize,
    pub total: usize,
}

impl<T> Presentation<'_, T> {
    pub fn is_last(&self) -> bool {
        self.position == self.total
    }
}

/// 开奖展示状态机: Idle -> Drawing -> Presenting(0) -> ... -> Presenting(n-1) -> Idle
///
/// 每个中奖者都需要操作员确认（`acknowledge`）后才会切换，没有自动前进。
#[derive(Debug)]
pub struct DrawSession<T> {
    state: State<T>,
}

impl<T> Default for DrawSession<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DrawSession<T> {
    pub fn new() -> Self {
        Self { state: State::Idle }
    }

    pub fn phase(&self) -> DrawPhase {
        match self.state {
            State::Idle => DrawPhase::Idle,
            State::Drawing => DrawPhase::Drawing,
            State::Presenting { .. } => DrawPhase::Presenting,
        }
    }

    /// Idle -> Drawing；其它状态下拒绝，防止重叠开奖
    pub fn begin(&mut self) -> Result<(), DrawError> {
        match self.state {
            State::Idle => {
                self.state = State::Drawing;
                Ok(())
            }
            _ => Err(DrawError::InProgress),
        }
    }

    /// Drawing -> Idle（参赛池为空或加载失败）
    pub fn abort(&mut self) {
        if matches!(self.state, State::Drawing) {
            self.state = State::Idle;
        }
    }

    /// Drawing -> Presenting(0)；没有中奖者时直接回到 Idle
    pub fn complete(&mut self, winners: Vec<T>) -> Result<Option<Presentation<'_, T>>, DrawError> {
        if !matches!(self.state, State::Drawing) {
            return Err(DrawError::NotDrawing);
        }
        self.state = if winners.is_empty() {
            State::Idle
        } else {
            State::Presenting { winners, index: 0 }
        };
        Ok(self.current())
    }

    /// Presenting(i) -> Presenting(i+1)，最后一个确认后回到 Idle
    pub fn acknowledge(&mut self) -> Result<Option<Presentation<'_, T>>, DrawError> {
        let finished = match &mut self.state {
            State::Presenting { winners, index } => {
                if *index + 1 < winners.len() {
                    *index += 1;
                    false
                } else {
                    true
                }
            }
            _ => return Err(DrawError::NothingToAcknowledge),
        };
        if finished {
            self.state = State::Idle;
        }
        Ok(self.current())
    }

    pub fn current(&self) -> Option<Presentation<'_, T>> {
        match &self.state {
            State::Presenting { winners, index } => winners.get(*index).map(|winner| Presentation {
                winner,
                position: index + 1,
                total: winners.len(),
            }),
            _ => None,
        }
    }
}
