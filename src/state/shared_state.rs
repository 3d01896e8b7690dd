//! 共享状态
//!
//! 字段分属两个互斥域：
//!
//! | 互斥域 | 保护的字段 |
//! |---|---|
//! | `state_lock` | 当前学号、题目状态、试卷游标、终止标志 |
//! | `rubric_lock` | 评分标准及其持久化文件 |
//!
//! 任何操作一次只进入一个互斥域，因此不存在加锁顺序问题。
//!
//! 字段用原子类型存放：同步模式下所有读写都发生在对应守卫存活期间，
//! 由互斥锁建立先后关系，原子操作使用 `Relaxed` 即可；非同步模式下守卫
//! 不持有锁，"先检查后修改"的步骤之间可以被其他助教插入。

use crate::error::AppResult;
use crate::infrastructure::{LockDomain, LockStats, SyncMode};
use crate::models::{ExamRecord, QuestionStatus, Rubric, RubricKey, NUM_QUESTIONS, SENTINEL_STUDENT_ID};
use crate::services::{ExamLoader, RubricWriter};
use crate::state::stats::{GradingStats, StatsSnapshot};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicU8, AtomicUsize, Ordering};
use tracing::{info, warn};

/// 共享状态在某一时刻的视图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StateSnapshot {
    pub terminated: bool,
    pub student_id: i32,
    pub exam_index: usize,
    pub question_status: [QuestionStatus; NUM_QUESTIONS],
}

impl StateSnapshot {
    /// 助教是否应当退出
    pub fn should_stop(&self) -> bool {
        self.terminated || self.student_id == SENTINEL_STUDENT_ID
    }

    pub fn all_done(&self) -> bool {
        self.question_status
            .iter()
            .all(|status| *status == QuestionStatus::Done)
    }
}

/// 一次评分标准修正
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Correction {
    pub question: usize,
    pub old: RubricKey,
    pub new: RubricKey,
}

/// 切换试卷的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// 已经终止，未做任何修改
    AlreadyTerminated,
    /// 仍有题目未完成，未做任何修改
    NotReady,
    /// 列表已用完，已设置终止标志
    Exhausted,
    /// 已加载下一份试卷
    Loaded { exam_index: usize, record: ExamRecord },
}

/// 所有助教共享的状态
///
/// 由协调者创建并以 `Arc` 分发给每个助教，全部助教结束后回收
#[derive(Debug)]
pub struct SharedState {
    rubric: [AtomicU8; NUM_QUESTIONS],
    current_student: AtomicI32,
    question_status: [AtomicU8; NUM_QUESTIONS],
    current_exam_index: AtomicUsize,
    terminated: AtomicBool,

    state_lock: LockDomain,
    rubric_lock: LockDomain,
    stats: GradingStats,
}

impl SharedState {
    /// 用初始评分标准和第一份试卷创建共享状态
    ///
    /// 第一份试卷就是哨兵时，状态一开始即为终止
    pub fn new(rubric: Rubric, first_exam: &ExamRecord, mode: SyncMode) -> Self {
        Self {
            rubric: std::array::from_fn(|q| AtomicU8::new(rubric.keys[q].as_byte())),
            current_student: AtomicI32::new(first_exam.student_id),
            question_status: std::array::from_fn(|_| {
                AtomicU8::new(QuestionStatus::NotStarted.as_byte())
            }),
            current_exam_index: AtomicUsize::new(0),
            terminated: AtomicBool::new(first_exam.is_sentinel()),
            state_lock: LockDomain::new("state", mode),
            rubric_lock: LockDomain::new("rubric", mode),
            stats: GradingStats::default(),
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.state_lock.mode()
    }

    fn status(&self, question: usize) -> QuestionStatus {
        QuestionStatus::from_byte(self.question_status[question].load(Ordering::Relaxed))
    }

    fn read_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            terminated: self.terminated.load(Ordering::Relaxed),
            student_id: self.current_student.load(Ordering::Relaxed),
            exam_index: self.current_exam_index.load(Ordering::Relaxed),
            question_status: std::array::from_fn(|q| self.status(q)),
        }
    }

    fn read_rubric(&self) -> Rubric {
        Rubric::new(std::array::from_fn(|q| {
            RubricKey::from_byte(self.rubric[q].load(Ordering::Relaxed))
        }))
    }

    // ========== 状态互斥域 ==========

    /// 读取终止标志、学号、游标和题目状态
    pub async fn observe(&self) -> StateSnapshot {
        let _section = self.state_lock.enter().await;
        self.read_snapshot()
    }

    pub async fn current_student(&self) -> i32 {
        let _section = self.state_lock.enter().await;
        self.current_student.load(Ordering::Relaxed)
    }

    /// 认领下一道未开始的题目
    ///
    /// 按题号顺序扫描，第一道"未开始"的题目改为"批改中"并返回其索引。
    /// 已终止（包括刚加载到哨兵学号）时没有可认领的题目。
    pub async fn claim_question(&self) -> Option<usize> {
        let _section = self.state_lock.enter().await;

        if self.read_snapshot().should_stop() {
            return None;
        }

        let question = (0..NUM_QUESTIONS).find(|&q| self.status(q) == QuestionStatus::NotStarted)?;
        self.question_status[question].store(QuestionStatus::InProgress.as_byte(), Ordering::Relaxed);
        self.stats.record_claim();
        Some(question)
    }

    /// 把题目标记为已完成
    pub async fn complete_question(&self, question: usize) {
        let _section = self.state_lock.enter().await;

        let previous = QuestionStatus::from_byte(
            self.question_status[question].swap(QuestionStatus::Done.as_byte(), Ordering::Relaxed),
        );
        if previous != QuestionStatus::InProgress {
            self.stats.record_torn_transition();
            warn!(
                "题目 {} 从 {:?} 直接变为 Done（试卷已被其他助教切换？）",
                question + 1,
                previous
            );
        }
        self.stats.record_mark();
    }

    /// 尝试切换到下一份试卷
    ///
    /// 只有全部题目完成时才会切换。加载试卷文件时一直持有状态互斥域，
    /// 学号与题目状态的重置在同一个临界区内完成。
    pub async fn try_advance(&self, loader: &ExamLoader) -> AppResult<AdvanceOutcome> {
        let _section = self.state_lock.enter().await;

        if self.terminated.load(Ordering::Relaxed) {
            return Ok(AdvanceOutcome::AlreadyTerminated);
        }
        if !self.read_snapshot().all_done() {
            return Ok(AdvanceOutcome::NotReady);
        }

        let next_index = self.current_exam_index.load(Ordering::Relaxed) + 1;
        let Some(record) = loader.load(next_index).await? else {
            info!("[Loader] 没有更多试卷，设置终止标志");
            self.terminated.store(true, Ordering::Relaxed);
            return Ok(AdvanceOutcome::Exhausted);
        };

        self.current_student.store(record.student_id, Ordering::Relaxed);
        for status in &self.question_status {
            status.store(QuestionStatus::NotStarted.as_byte(), Ordering::Relaxed);
        }
        if record.is_sentinel() {
            info!("[Loader] 加载到哨兵学号 {}，设置终止标志", SENTINEL_STUDENT_ID);
            self.terminated.store(true, Ordering::Relaxed);
        }
        self.current_exam_index.store(next_index, Ordering::Relaxed);
        self.stats.record_advance();

        Ok(AdvanceOutcome::Loaded {
            exam_index: next_index,
            record,
        })
    }

    /// 设置终止标志（用于助教遇到致命错误时让其他助教退出）
    pub async fn abort(&self) {
        let _section = self.state_lock.enter().await;
        self.terminated.store(true, Ordering::Relaxed);
    }

    // ========== 评分标准互斥域 ==========

    pub async fn rubric_key(&self, question: usize) -> RubricKey {
        let _section = self.rubric_lock.enter().await;
        RubricKey::from_byte(self.rubric[question].load(Ordering::Relaxed))
    }

    pub async fn rubric(&self) -> Rubric {
        let _section = self.rubric_lock.enter().await;
        self.read_rubric()
    }

    /// 修正一道题的评分键并整体写回文件
    ///
    /// 写入完成之前不释放评分标准互斥域
    pub async fn correct_rubric(
        &self,
        question: usize,
        writer: &RubricWriter,
    ) -> AppResult<Correction> {
        let _section = self.rubric_lock.enter().await;

        let old = RubricKey::from_byte(self.rubric[question].load(Ordering::Relaxed));
        let new = old.next();
        self.rubric[question].store(new.as_byte(), Ordering::Relaxed);
        self.stats.record_correction();

        writer.write(&self.read_rubric()).await?;
        self.stats.record_persist();

        Ok(Correction { question, old, new })
    }

    // ========== 统计 ==========

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn lock_stats(&self) -> Vec<LockStats> {
        vec![self.state_lock.stats(), self.rubric_lock.stats()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ExamList;

    fn rubric_a() -> Rubric {
        Rubric::uniform(RubricKey::new('A').unwrap())
    }

    fn record(student_id: i32) -> ExamRecord {
        ExamRecord {
            exam_id: "exam".to_string(),
            student_id,
        }
    }

    fn write_exams(dir: &std::path::Path, students: &[i32]) -> ExamLoader {
        let entries = students
            .iter()
            .enumerate()
            .map(|(i, student)| {
                let path = dir.join(format!("exam{}.txt", i + 1));
                std::fs::write(&path, format!("{}\n", student)).unwrap();
                path.display().to_string()
            })
            .collect();
        ExamLoader::new(ExamList::new(entries))
    }

    async fn finish_all(state: &SharedState) {
        while let Some(q) = state.claim_question().await {
            state.complete_question(q).await;
        }
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_and_in_order() {
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        let claimed: Vec<usize> = {
            let mut claimed = Vec::new();
            while let Some(q) = state.claim_question().await {
                claimed.push(q);
            }
            claimed
        };

        assert_eq!(claimed, vec![0, 1, 2, 3, 4]);
        let snapshot = state.observe().await;
        assert!(snapshot
            .question_status
            .iter()
            .all(|s| *s == QuestionStatus::InProgress));
        assert_eq!(state.stats().claims, 5);
    }

    #[tokio::test]
    async fn test_complete_without_claim_is_torn() {
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);
        state.complete_question(3).await;
        assert_eq!(state.stats().torn_transitions, 1);

        let q = state.claim_question().await.unwrap();
        state.complete_question(q).await;
        assert_eq!(state.stats().torn_transitions, 1);
        assert_eq!(state.stats().marks, 2);
    }

    #[tokio::test]
    async fn test_advance_requires_all_done() {
        let dir = tempfile::tempdir().unwrap();
        let loader = write_exams(dir.path(), &[1001, 1002]);
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        let q = state.claim_question().await.unwrap();
        state.complete_question(q).await;
        assert_eq!(state.try_advance(&loader).await.unwrap(), AdvanceOutcome::NotReady);
        assert_eq!(state.observe().await.exam_index, 0);
    }

    #[tokio::test]
    async fn test_advance_resets_status_with_new_student() {
        let dir = tempfile::tempdir().unwrap();
        let loader = write_exams(dir.path(), &[1001, 1002]);
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        finish_all(&state).await;
        let outcome = state.try_advance(&loader).await.unwrap();
        assert!(matches!(
            outcome,
            AdvanceOutcome::Loaded { exam_index: 1, ref record } if record.student_id == 1002
        ));

        let snapshot = state.observe().await;
        assert_eq!(snapshot.student_id, 1002);
        assert_eq!(snapshot.exam_index, 1);
        assert!(!snapshot.terminated);
        assert_eq!(
            snapshot.question_status,
            [QuestionStatus::NotStarted; NUM_QUESTIONS]
        );

        finish_all(&state).await;
        assert_eq!(state.try_advance(&loader).await.unwrap(), AdvanceOutcome::Exhausted);
        assert!(state.observe().await.terminated);
        assert_eq!(
            state.try_advance(&loader).await.unwrap(),
            AdvanceOutcome::AlreadyTerminated
        );
        assert_eq!(state.stats().advances, 1);
    }

    #[tokio::test]
    async fn test_loading_sentinel_terminates() {
        let dir = tempfile::tempdir().unwrap();
        let loader = write_exams(dir.path(), &[1001, SENTINEL_STUDENT_ID, 1003]);
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        finish_all(&state).await;
        state.try_advance(&loader).await.unwrap();

        let snapshot = state.observe().await;
        assert!(snapshot.terminated);
        assert!(snapshot.should_stop());
        assert_eq!(snapshot.student_id, SENTINEL_STUDENT_ID);
    }

    #[tokio::test]
    async fn test_no_claim_after_sentinel_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let loader = write_exams(dir.path(), &[1001, SENTINEL_STUDENT_ID]);
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        finish_all(&state).await;
        state.try_advance(&loader).await.unwrap();

        // 哨兵试卷的题目状态已重置，但不应再被认领
        assert_eq!(state.claim_question().await, None);
        assert_eq!(state.stats().claims, NUM_QUESTIONS as u64);
        assert_eq!(
            state.observe().await.question_status,
            [QuestionStatus::NotStarted; NUM_QUESTIONS]
        );
    }

    #[tokio::test]
    async fn test_no_claim_after_abort() {
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);
        state.abort().await;
        assert_eq!(state.claim_question().await, None);
        assert_eq!(state.stats().claims, 0);
    }

    #[tokio::test]
    async fn test_sentinel_first_exam_starts_terminated() {
        let state = SharedState::new(
            rubric_a(),
            &record(SENTINEL_STUDENT_ID),
            SyncMode::Synchronized,
        );
        assert!(state.observe().await.should_stop());
    }

    #[tokio::test]
    async fn test_advance_load_failure_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ExamLoader::new(ExamList::new(vec![
            "unused".to_string(),
            dir.path().join("missing.txt").display().to_string(),
        ]));
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        finish_all(&state).await;
        assert!(state.try_advance(&loader).await.is_err());

        let snapshot = state.observe().await;
        assert_eq!(snapshot.exam_index, 0);
        assert_eq!(snapshot.student_id, 1001);
        assert!(snapshot.all_done());
    }

    #[tokio::test]
    async fn test_correct_rubric_persists_whole_store() {
        let dir = tempfile::tempdir().unwrap();
        let writer = RubricWriter::with_path(dir.path().join("rubric.txt"));
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Synchronized);

        let correction = state.correct_rubric(1, &writer).await.unwrap();
        assert_eq!(correction.old.as_char(), 'A');
        assert_eq!(correction.new.as_char(), 'B');
        state.correct_rubric(1, &writer).await.unwrap();

        assert_eq!(state.rubric_key(1).await.as_char(), 'C');
        let content = std::fs::read_to_string(writer.path()).unwrap();
        assert_eq!(content, "1, A\n2, C\n3, A\n4, A\n5, A\n");
        assert_eq!(state.stats().rubric_persists, 2);
    }

    #[tokio::test]
    async fn test_abort_sets_terminated() {
        let state = SharedState::new(rubric_a(), &record(1001), SyncMode::Unsynchronized);
        state.abort().await;
        assert!(state.observe().await.terminated);
        assert_eq!(state.mode(), SyncMode::Unsynchronized);
    }
}
