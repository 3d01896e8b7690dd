use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// 运行期计数器
///
/// 计数器本身与互斥域无关，任何模式下都可以安全地并发累加
#[derive(Debug, Default)]
pub struct GradingStats {
    claims: AtomicU64,
    marks: AtomicU64,
    torn_transitions: AtomicU64,
    corrections: AtomicU64,
    rubric_persists: AtomicU64,
    advances: AtomicU64,
}

impl GradingStats {
    pub fn record_claim(&self) {
        self.claims.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_mark(&self) {
        self.marks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_torn_transition(&self) {
        self.torn_transitions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_correction(&self) {
        self.corrections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_persist(&self) {
        self.rubric_persists.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_advance(&self) {
        self.advances.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            claims: self.claims.load(Ordering::Relaxed),
            marks: self.marks.load(Ordering::Relaxed),
            torn_transitions: self.torn_transitions.load(Ordering::Relaxed),
            corrections: self.corrections.load(Ordering::Relaxed),
            rubric_persists: self.rubric_persists.load(Ordering::Relaxed),
            advances: self.advances.load(Ordering::Relaxed),
        }
    }
}

/// 计数器快照
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// 成功认领的题目数
    pub claims: u64,
    /// 标记为完成的题目数
    pub marks: u64,
    /// 未经过"批改中"直接变为"已完成"的次数
    pub torn_transitions: u64,
    /// 评分标准修正次数
    pub corrections: u64,
    /// 评分标准整体写入次数
    pub rubric_persists: u64,
    /// 成功切换到下一份试卷的次数
    pub advances: u64,
}
