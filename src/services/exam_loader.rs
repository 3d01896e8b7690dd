//! 试卷加载服务 - 业务能力层
//!
//! 按试卷列表中的位置读取试卷记录

use crate::error::AppResult;
use crate::models::{load_exam_record, ExamList, ExamRecord};
use tracing::info;

/// 试卷加载服务
#[derive(Debug, Clone)]
pub struct ExamLoader {
    exams: ExamList,
}

impl ExamLoader {
    pub fn new(exams: ExamList) -> Self {
        Self { exams }
    }

    /// 试卷总数
    pub(crate) fn len(&self) -> usize {
        self.exams.len()
    }

    /// 加载第 `index` 份试卷
    ///
    /// 超出列表范围返回 `Ok(None)`；文件不可读或缺少学号返回错误
    pub async fn load(&self, index: usize) -> AppResult<Option<ExamRecord>> {
        let Some(path) = self.exams.path(index) else {
            return Ok(None);
        };

        info!("[Loader] 加载第 {} 份试卷 ({})", index, path.display());
        load_exam_record(path).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_same_exam_twice_is_identical() {
        let dir = tempfile::tempdir().unwrap();
        let exam = dir.path().join("exam1.txt");
        std::fs::write(&exam, "1001\n").unwrap();

        let loader = ExamLoader::new(ExamList::new(vec![exam.display().to_string()]));
        let first = loader.load(0).await.unwrap().unwrap();
        let second = loader.load(0).await.unwrap().unwrap();

        assert_eq!(first, second);
        assert_eq!(first.student_id, 1001);
        assert!(!first.is_sentinel());
    }

    #[tokio::test]
    async fn test_load_past_end_is_none() {
        let loader = ExamLoader::new(ExamList::new(vec!["exam1.txt".to_string()]));
        assert!(loader.load(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.txt");
        let loader = ExamLoader::new(ExamList::new(vec![missing.display().to_string()]));
        assert!(loader.load(0).await.is_err());
    }
}
