//! 批改流程 - 流程层
//!
//! 核心职责：定义"一个助教"的完整循环
//!
//! 每一轮：
//! 1. 终止检查（终止标志或哨兵学号）
//! 2. 逐题检查评分标准，按概率修正并写回文件
//! 3. 反复认领未开始的题目并批改，直到没有可认领的题目
//! 4. 尝试切换到下一份试卷
//!
//! 同一份试卷上每个助教都会检查一遍评分标准，这是有意的重复。

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{format_student_id, NUM_QUESTIONS};
use crate::services::{ExamLoader, RubricWriter};
use crate::state::{AdvanceOutcome, SharedState};
use crate::workflow::grader_ctx::GraderCtx;
use crate::workflow::pacing::Pacer;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info};

/// 助教所处的阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerPhase {
    ReviewingRubric(usize),
    ClaimingQuestion,
    Marking(usize),
    AttemptingAdvance,
    Terminated,
}

impl fmt::Display for WorkerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerPhase::ReviewingRubric(q) => write!(f, "检查评分标准 Q{}", q + 1),
            WorkerPhase::ClaimingQuestion => write!(f, "认领题目"),
            WorkerPhase::Marking(q) => write!(f, "批改 Q{}", q + 1),
            WorkerPhase::AttemptingAdvance => write!(f, "尝试切换试卷"),
            WorkerPhase::Terminated => write!(f, "已终止"),
        }
    }
}

/// 单个助教的工作统计
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub worker_id: usize,
    /// 外层循环轮数
    pub iterations: u64,
    pub questions_marked: u64,
    pub corrections: u64,
    /// 由本助教完成的试卷切换次数
    pub advances: u64,
}

/// 批改流程
///
/// - 持有共享状态句柄和两项存储能力（评分标准写入、试卷加载）
/// - 所有共享字段的访问都委托给 `SharedState`
/// - 多个助教各自持有一份，共享同一个 `SharedState`
#[derive(Clone)]
pub struct GradingFlow {
    state: Arc<SharedState>,
    rubric_writer: RubricWriter,
    exam_loader: ExamLoader,
    verbose_logging: bool,
}

impl GradingFlow {
    pub fn new(
        state: Arc<SharedState>,
        rubric_writer: RubricWriter,
        exam_loader: ExamLoader,
        config: &Config,
    ) -> Self {
        Self {
            state,
            rubric_writer,
            exam_loader,
            verbose_logging: config.verbose_logging,
        }
    }

    /// 运行助教循环直到终止
    ///
    /// 遇到致命错误时先设置终止标志，让其他助教在下一次终止检查时退出，
    /// 再把错误返回给协调者
    pub async fn run(&self, ctx: &GraderCtx, pacer: &mut Pacer) -> AppResult<WorkerSummary> {
        match self.grade_until_done(ctx, pacer).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                error!("{} ❌ 致命错误: {}", ctx, e);
                self.state.abort().await;
                Err(e)
            }
        }
    }

    async fn grade_until_done(
        &self,
        ctx: &GraderCtx,
        pacer: &mut Pacer,
    ) -> AppResult<WorkerSummary> {
        let mut summary = WorkerSummary {
            worker_id: ctx.worker_id,
            ..Default::default()
        };

        loop {
            let snapshot = self.state.observe().await;
            if snapshot.should_stop() {
                self.enter(ctx, WorkerPhase::Terminated);
                info!("{} 检测到终止标志或学号 9999，退出", ctx);
                return Ok(summary);
            }

            summary.iterations += 1;
            info!(
                "{} 开始批改学生 {} 的试卷 (试卷索引 {})",
                ctx,
                format_student_id(snapshot.student_id),
                snapshot.exam_index
            );

            for question in 0..NUM_QUESTIONS {
                self.enter(ctx, WorkerPhase::ReviewingRubric(question));
                if self.review_question(ctx, pacer, question).await? {
                    summary.corrections += 1;
                }
            }

            self.enter(ctx, WorkerPhase::ClaimingQuestion);
            while let Some(question) = self.state.claim_question().await {
                self.enter(ctx, WorkerPhase::Marking(question));
                self.mark_question(ctx, pacer, question).await;
                summary.questions_marked += 1;
                self.enter(ctx, WorkerPhase::ClaimingQuestion);
            }

            info!(
                "{} 完成学生 {} 的试卷",
                ctx,
                format_student_id(snapshot.student_id)
            );

            self.enter(ctx, WorkerPhase::AttemptingAdvance);
            if let AdvanceOutcome::Loaded { exam_index, record } =
                self.state.try_advance(&self.exam_loader).await?
            {
                summary.advances += 1;
                info!(
                    "{} 已切换到试卷索引 {} ({})，学生 {}",
                    ctx,
                    exam_index,
                    record.exam_id,
                    format_student_id(record.student_id)
                );
            }
        }
    }

    /// 检查一道题的评分标准，返回是否做了修正
    async fn review_question(
        &self,
        ctx: &GraderCtx,
        pacer: &mut Pacer,
        question: usize,
    ) -> AppResult<bool> {
        let current = self.state.rubric_key(question).await;
        info!(
            "{} 检查第 {} 题的评分标准 (当前: {})",
            ctx,
            question + 1,
            current
        );

        pacer.review_pause().await;

        if !pacer.wants_correction() {
            return Ok(false);
        }

        let correction = self
            .state
            .correct_rubric(question, &self.rubric_writer)
            .await?;
        info!(
            "{} ✏️ 修正评分标准 Q{}: {} -> {}",
            ctx,
            correction.question + 1,
            correction.old,
            correction.new
        );
        Ok(true)
    }

    /// 批改一道已认领的题目
    async fn mark_question(&self, ctx: &GraderCtx, pacer: &mut Pacer, question: usize) {
        let student = self.state.current_student().await;
        info!(
            "{} 批改学生 {} 第 {} 题",
            ctx,
            format_student_id(student),
            question + 1
        );

        pacer.mark_pause().await;

        self.state.complete_question(question).await;
    }

    fn enter(&self, ctx: &GraderCtx, phase: WorkerPhase) {
        if self.verbose_logging {
            debug!("{} → {}", ctx, phase);
        }
    }
}
