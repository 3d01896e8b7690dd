//! 助教上下文
//!
//! 封装"我是第几号助教"这一信息

use std::fmt::Display;

/// 助教上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraderCtx {
    /// 助教编号（从0开始，仅用于日志和随机种子）
    pub worker_id: usize,
}

impl GraderCtx {
    pub fn new(worker_id: usize) -> Self {
        Self { worker_id }
    }
}

impl Display for GraderCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[TA {}]", self.worker_id)
    }
}
