//! 试卷数据模型

use serde::Serialize;
use std::path::Path;

/// 哨兵学号：加载到该学号表示没有更多试卷
pub const SENTINEL_STUDENT_ID: i32 = 9999;

/// 试卷列表最多读取的条目数
pub const MAX_EXAMS: usize = 20;

/// 单道题的批改状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum QuestionStatus {
    /// 未开始
    NotStarted = 0,
    /// 批改中
    InProgress = 1,
    /// 已完成
    Done = 2,
}

impl QuestionStatus {
    pub(crate) fn as_byte(self) -> u8 {
        self as u8
    }

    pub(crate) fn from_byte(byte: u8) -> Self {
        match byte {
            1 => QuestionStatus::InProgress,
            2 => QuestionStatus::Done,
            _ => QuestionStatus::NotStarted,
        }
    }
}

/// 一份已加载的试卷记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExamRecord {
    /// 试卷标识（试卷文件路径）
    pub exam_id: String,
    /// 学号
    pub student_id: i32,
}

impl ExamRecord {
    pub fn is_sentinel(&self) -> bool {
        self.student_id == SENTINEL_STUDENT_ID
    }
}

/// 按顺序排列的试卷标识列表
#[derive(Debug, Clone, Default)]
pub struct ExamList {
    entries: Vec<String>,
}

impl ExamList {
    pub fn new(entries: Vec<String>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries.get(index).map(String::as_str)
    }

    /// 试卷文件路径
    pub fn path(&self, index: usize) -> Option<&Path> {
        self.get(index).map(Path::new)
    }
}

/// 学号显示格式（四位补零）
pub fn format_student_id(student_id: i32) -> String {
    format!("{:04}", student_id)
}
