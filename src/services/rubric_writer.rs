//! 评分标准写入服务 - 业务能力层
//!
//! 只负责"整体重写评分标准文件"的能力，不关心由谁、何时调用

use crate::error::{AppError, AppResult};
use crate::models::Rubric;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// 评分标准写入服务
///
/// 每次写入都覆盖整个文件（全部 `NUM_QUESTIONS` 行）。
/// 调用方必须持有评分标准互斥域，保证两次写入不会交错。
#[derive(Debug, Clone)]
pub struct RubricWriter {
    rubric_path: PathBuf,
}

impl RubricWriter {
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            rubric_path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.rubric_path
    }

    /// 写入完整评分标准
    pub async fn write(&self, rubric: &Rubric) -> AppResult<()> {
        let content = rubric.to_store_format();
        debug!("重写评分标准: {}", self.rubric_path.display());

        fs::write(&self.rubric_path, content)
            .await
            .map_err(|e| AppError::file_write_failed(self.rubric_path.display().to_string(), e))
    }
}
