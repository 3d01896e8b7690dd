//! 文本存储加载器
//!
//! 三种输入文件：
//! - 试卷列表：每行一个试卷文件路径，跳过空行
//! - 评分标准：每行 `<题号>, <评分键>`
//! - 试卷文件：第一个记号为整数学号

use crate::error::{AppError, AppResult, StoreError};
use crate::models::exam::{ExamList, ExamRecord, MAX_EXAMS};
use crate::models::rubric::{Rubric, RubricKey, NUM_QUESTIONS};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tokio::fs;

/// 评分标准单行解析错误
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineError {
    #[error("无法识别的行: '{content}'")]
    Malformed { content: String },
    #[error("题号 {number} 超出范围 [1, {max}]")]
    QuestionOutOfRange { number: usize, max: usize },
    #[error("评分键 '{key}' 不是可见 ASCII 字符")]
    InvalidKey { key: char },
}

fn rubric_line_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d+)\s*,\s*(\S)\s*$").expect("评分标准行正则无效")
    })
}

async fn read_store(path: &Path) -> AppResult<String> {
    fs::read_to_string(path)
        .await
        .map_err(|e| AppError::file_read_failed(path.display().to_string(), e))
}

/// 解析试卷列表
///
/// 最多保留 `MAX_EXAMS` 个非空条目，多余的行被忽略
pub fn parse_exam_list(content: &str, path: &str) -> AppResult<ExamList> {
    let entries: Vec<String> = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();

    let total = entries.len();
    let list = ExamList::new(entries.into_iter().take(MAX_EXAMS).collect());
    if list.is_empty() {
        return Err(StoreError::EmptyExamList {
            path: path.to_string(),
        }
        .into());
    }

    if total > MAX_EXAMS {
        tracing::warn!("试卷列表 {} 共 {} 项，只读取前 {} 项", path, total, MAX_EXAMS);
    }

    Ok(list)
}

/// 从文件加载试卷列表
pub async fn load_exam_list(path: &Path) -> AppResult<ExamList> {
    let content = read_store(path).await?;
    let list = parse_exam_list(&content, &path.display().to_string())?;
    tracing::info!("已加载 {} 个试卷文件名", list.len());
    Ok(list)
}

fn parse_rubric_line(line: &str) -> Result<(usize, RubricKey), LineError> {
    let captures = rubric_line_pattern()
        .captures(line)
        .ok_or_else(|| LineError::Malformed {
            content: line.to_string(),
        })?;

    let number: usize = captures[1].parse().map_err(|_| LineError::Malformed {
        content: line.to_string(),
    })?;
    if !(1..=NUM_QUESTIONS).contains(&number) {
        return Err(LineError::QuestionOutOfRange {
            number,
            max: NUM_QUESTIONS,
        });
    }

    let letter = captures[2].chars().next().unwrap_or(' ');
    let key = RubricKey::new(letter).ok_or(LineError::InvalidKey { key: letter })?;

    Ok((number, key))
}

/// 解析评分标准
///
/// 读取前 `NUM_QUESTIONS` 个非空行，每个题号必须恰好出现一次
pub fn parse_rubric(content: &str, path: &str) -> AppResult<Rubric> {
    let mut keys: [Option<RubricKey>; NUM_QUESTIONS] = [None; NUM_QUESTIONS];
    let mut found = 0;

    let lines = content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .take(NUM_QUESTIONS);

    for (line_index, line) in lines {
        let (number, key) = parse_rubric_line(line).map_err(|source| StoreError::RubricLine {
            path: path.to_string(),
            line: line_index + 1,
            source,
        })?;

        let slot = &mut keys[number - 1];
        if slot.is_some() {
            return Err(StoreError::DuplicateQuestion {
                path: path.to_string(),
                question: number,
            }
            .into());
        }
        *slot = Some(key);
        found += 1;
    }

    if found < NUM_QUESTIONS {
        return Err(StoreError::MissingQuestions {
            path: path.to_string(),
            expected: NUM_QUESTIONS,
            found,
        }
        .into());
    }

    let mut rubric = [RubricKey::LAST; NUM_QUESTIONS];
    for (slot, key) in rubric.iter_mut().zip(keys) {
        if let Some(key) = key {
            *slot = key;
        }
    }
    Ok(Rubric::new(rubric))
}

/// 从文件加载评分标准
pub async fn load_rubric(path: &Path) -> AppResult<Rubric> {
    let content = read_store(path).await?;
    parse_rubric(&content, &path.display().to_string())
}

/// 解析试卷文件中的学号（第一个记号）
pub fn parse_student_id(content: &str, path: &str) -> AppResult<i32> {
    content
        .split_whitespace()
        .next()
        .and_then(|token| token.parse().ok())
        .ok_or_else(|| {
            StoreError::MissingStudentId {
                path: path.to_string(),
            }
            .into()
        })
}

/// 加载单份试卷
pub async fn load_exam_record(path: &Path) -> AppResult<ExamRecord> {
    let exam_id = path.display().to_string();
    let content = read_store(path).await?;
    let student_id = parse_student_id(&content, &exam_id)?;
    Ok(ExamRecord {
        exam_id,
        student_id,
    })
}
