//! 协调者 - 编排层
//!
//! ## 职责
//!
//! 1. **初始化**：校验配置，读取试卷列表、评分标准和第一份试卷，创建共享状态
//! 2. **启动助教**：为每个助教 `tokio::spawn` 一个任务，共享同一个 `Arc<SharedState>`
//! 3. **等待结束**：等待所有助教终止后回收共享状态
//! 4. **统计输出**：汇总运行报告，可选写入 JSON 文件
//!
//! 只有"启动并等待"，运行期间不提供暂停、恢复等控制。

use crate::config::Config;
use crate::error::{AppError, AppResult, ResourceError, StoreError};
use crate::infrastructure::{LockStats, SyncMode};
use crate::models::{load_exam_list, load_rubric};
use crate::services::{ExamLoader, RubricWriter};
use crate::state::{SharedState, StateSnapshot, StatsSnapshot};
use crate::utils::logging::{log_exams_loaded, log_startup, print_final_stats};
use crate::workflow::{GraderCtx, GradingFlow, Pacer, WorkerSummary};
use chrono::{DateTime, Local};
use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// 应用主结构
pub struct App {
    config: Config,
    state: Arc<SharedState>,
    flow: GradingFlow,
    total_exams: usize,
}

/// 一次完整运行的报告
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub mode: SyncMode,
    pub num_workers: usize,
    pub total_exams: usize,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub final_state: StateSnapshot,
    /// 最终评分标准（按题号顺序排列的评分键）
    pub rubric: String,
    pub stats: StatsSnapshot,
    pub locks: Vec<LockStats>,
    pub workers: Vec<WorkerSummary>,
}

impl App {
    /// 初始化应用
    ///
    /// 任何输入错误都在启动助教之前返回
    pub async fn initialize(config: Config) -> AppResult<Self> {
        config.validate()?;
        log_startup(&config);

        let exams = load_exam_list(&config.exam_list_path).await?;
        let rubric = load_rubric(&config.rubric_path).await?;

        let exam_loader = ExamLoader::new(exams);
        let first_exam = exam_loader
            .load(0)
            .await?
            .ok_or_else(|| StoreError::EmptyExamList {
                path: config.exam_list_path.display().to_string(),
            })?;
        log_exams_loaded(exam_loader.len(), first_exam.student_id);

        let state = Arc::new(SharedState::new(rubric, &first_exam, config.sync_mode));
        let flow = GradingFlow::new(
            state.clone(),
            RubricWriter::with_path(&config.rubric_path),
            exam_loader.clone(),
            &config,
        );

        Ok(Self {
            config,
            state,
            flow,
            total_exams: exam_loader.len(),
        })
    }

    /// 共享状态句柄
    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    /// 启动所有助教并等待其结束
    ///
    /// 某个助教失败或 panic 时其余助教会在下一次终止检查时退出；
    /// 全部回收后返回第一个错误
    pub async fn run(self) -> AppResult<RunReport> {
        let started_at = Local::now();

        let handles: Vec<_> = (0..self.config.num_workers)
            .map(|worker_id| {
                let flow = self.flow.clone();
                let mut pacer = Pacer::new(&self.config, worker_id);
                let ctx = GraderCtx::new(worker_id);

                let handle = tokio::spawn(async move { flow.run(&ctx, &mut pacer).await });
                (worker_id, handle)
            })
            .collect();
        info!("已启动 {} 个助教", handles.len());

        let (workers, first_error) = join_workers(&self.state, handles).await;

        if let Some(e) = first_error {
            error!("❌ 批改中止: {}", e);
            return Err(e);
        }

        let report = self.build_report(started_at, workers).await;
        print_final_stats(&report);
        self.write_report(&report).await?;

        Ok(report)
    }

    async fn build_report(
        &self,
        started_at: DateTime<Local>,
        workers: Vec<WorkerSummary>,
    ) -> RunReport {
        let rubric = self
            .state
            .rubric()
            .await
            .keys
            .iter()
            .map(|key| key.as_char())
            .collect();

        RunReport {
            mode: self.state.mode(),
            num_workers: self.config.num_workers,
            total_exams: self.total_exams,
            started_at,
            finished_at: Local::now(),
            final_state: self.state.observe().await,
            rubric,
            stats: self.state.stats(),
            locks: self.state.lock_stats(),
            workers,
        }
    }

    async fn write_report(&self, report: &RunReport) -> AppResult<()> {
        let Some(path) = &self.config.report_file else {
            return Ok(());
        };

        let json = serde_json::to_string_pretty(report)
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        tokio::fs::write(path, json)
            .await
            .map_err(|e| AppError::file_write_failed(path.display().to_string(), e))?;
        info!("运行报告已保存至: {}", path.display());
        Ok(())
    }
}

/// 按完成顺序回收助教任务
///
/// 某个任务 panic 时立即设置终止标志，其余助教在下一次终止检查时退出。
/// 返回按助教编号排序的统计和第一个错误
async fn join_workers(
    state: &SharedState,
    handles: Vec<(usize, JoinHandle<AppResult<WorkerSummary>>)>,
) -> (Vec<WorkerSummary>, Option<AppError>) {
    let mut pending: FuturesUnordered<_> = handles
        .into_iter()
        .map(|(worker_id, handle)| async move { (worker_id, handle.await) })
        .collect();

    let mut workers = Vec::with_capacity(pending.len());
    let mut first_error: Option<AppError> = None;
    while let Some((worker_id, result)) = pending.next().await {
        match result {
            Ok(Ok(summary)) => workers.push(summary),
            Ok(Err(e)) => {
                first_error.get_or_insert(e);
            }
            Err(e) => {
                error!("[TA {}] 任务执行失败: {}", worker_id, e);
                state.abort().await;
                first_error.get_or_insert(
                    ResourceError::WorkerPanicked {
                        worker_id,
                        message: e.to_string(),
                    }
                    .into(),
                );
            }
        }
    }

    workers.sort_by_key(|summary| summary.worker_id);
    (workers, first_error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ExamRecord, Rubric, RubricKey};
    use std::time::Duration;

    fn shared_state() -> Arc<SharedState> {
        let first_exam = ExamRecord {
            exam_id: "exam1.txt".to_string(),
            student_id: 1001,
        };
        Arc::new(SharedState::new(
            Rubric::uniform(RubricKey::new('A').unwrap()),
            &first_exam,
            SyncMode::Synchronized,
        ))
    }

    async fn crashing_worker() -> AppResult<WorkerSummary> {
        panic!("助教任务崩溃")
    }

    /// 只在看到终止标志后才退出的助教
    fn spawn_waiting_worker(
        state: Arc<SharedState>,
        worker_id: usize,
    ) -> JoinHandle<AppResult<WorkerSummary>> {
        tokio::spawn(async move {
            let mut iterations = 0;
            while !state.observe().await.should_stop() {
                iterations += 1;
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
            Ok(WorkerSummary {
                worker_id,
                iterations,
                ..WorkerSummary::default()
            })
        })
    }

    #[tokio::test]
    async fn test_panicking_worker_stops_the_others() {
        let state = shared_state();
        let handles = vec![
            (0, spawn_waiting_worker(state.clone(), 0)),
            (1, tokio::spawn(crashing_worker())),
            (2, spawn_waiting_worker(state.clone(), 2)),
        ];

        let (workers, first_error) =
            tokio::time::timeout(Duration::from_secs(10), join_workers(&state, handles))
                .await
                .expect("助教在任务崩溃后没有退出");

        assert!(matches!(
            first_error,
            Some(AppError::Resource(ResourceError::WorkerPanicked { worker_id: 1, .. }))
        ));
        assert!(state.observe().await.terminated);
        let ids: Vec<usize> = workers.iter().map(|w| w.worker_id).collect();
        assert_eq!(ids, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_successful_workers_are_reported_in_order() {
        let state = shared_state();
        let handles = (0..3)
            .rev()
            .map(|worker_id| {
                let handle: JoinHandle<AppResult<WorkerSummary>> = tokio::spawn(async move {
                    Ok(WorkerSummary {
                        worker_id,
                        ..WorkerSummary::default()
                    })
                });
                (worker_id, handle)
            })
            .collect();

        let (workers, first_error) = join_workers(&state, handles).await;

        assert!(first_error.is_none());
        let ids: Vec<usize> = workers.iter().map(|w| w.worker_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(!state.observe().await.terminated);
    }
}
