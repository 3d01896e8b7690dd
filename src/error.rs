use std::fmt;

/// 应用程序错误类型
///
/// 所有错误在检测到的位置都不可恢复：调用方记录日志后终止本次运行
#[derive(Debug)]
pub enum AppError {
    /// 配置错误（线程数、试卷列表等）
    Config(ConfigError),
    /// 文件操作错误
    File(FileError),
    /// 存储格式错误（评分标准 / 试卷记录）
    Store(StoreError),
    /// 资源错误（工作任务回收）
    Resource(ResourceError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(e) => write!(f, "配置错误: {}", e),
            AppError::File(e) => write!(f, "文件错误: {}", e),
            AppError::Store(e) => write!(f, "存储格式错误: {}", e),
            AppError::Resource(e) => write!(f, "资源错误: {}", e),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(e) => Some(e),
            AppError::File(e) => Some(e),
            AppError::Store(e) => Some(e),
            AppError::Resource(e) => Some(e),
        }
    }
}

/// 配置错误
#[derive(Debug)]
pub enum ConfigError {
    /// 助教数量不足
    InvalidWorkerCount { value: usize },
    /// 环境变量解析失败
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 延迟区间无效（最小值大于最大值）
    InvalidDelayRange { name: String, min: u64, max: u64 },
    /// 概率不在 [0, 1] 内
    InvalidProbability { value: f64 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidWorkerCount { value } => {
                write!(f, "助教数量必须至少为 2，当前为 {}", value)
            }
            ConfigError::EnvVarParseFailed {
                var_name,
                value,
                expected_type,
            } => {
                write!(
                    f,
                    "环境变量 {} 解析失败: 值 '{}' 无法转换为 {}",
                    var_name, value, expected_type
                )
            }
            ConfigError::InvalidDelayRange { name, min, max } => {
                write!(f, "延迟区间 {} 无效: {}ms > {}ms", name, min, max)
            }
            ConfigError::InvalidProbability { value } => {
                write!(f, "修正概率 {} 不在 [0, 1] 范围内", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// 文件操作错误
#[derive(Debug)]
pub enum FileError {
    /// 文件不存在
    NotFound { path: String },
    /// 读取文件失败
    ReadFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 写入文件失败
    WriteFailed {
        path: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl fmt::Display for FileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileError::NotFound { path } => write!(f, "文件不存在: {}", path),
            FileError::ReadFailed { path, source } => {
                write!(f, "读取文件失败 ({}): {}", path, source)
            }
            FileError::WriteFailed { path, source } => {
                write!(f, "写入文件失败 ({}): {}", path, source)
            }
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::ReadFailed { source, .. } | FileError::WriteFailed { source, .. } => {
                Some(source.as_ref() as &(dyn std::error::Error + 'static))
            }
            FileError::NotFound { .. } => None,
        }
    }
}

/// 存储格式错误
#[derive(Debug)]
pub enum StoreError {
    /// 试卷列表为空
    EmptyExamList { path: String },
    /// 评分标准某一行格式错误
    RubricLine {
        path: String,
        line: usize,
        source: crate::models::loaders::LineError,
    },
    /// 评分标准中题号重复
    DuplicateQuestion { path: String, question: usize },
    /// 评分标准行数不足
    MissingQuestions {
        path: String,
        expected: usize,
        found: usize,
    },
    /// 试卷文件缺少学号
    MissingStudentId { path: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::EmptyExamList { path } => write!(f, "试卷列表 {} 中没有试卷", path),
            StoreError::RubricLine { path, line, source } => {
                write!(f, "评分标准 {} 第 {} 行格式错误: {}", path, line, source)
            }
            StoreError::DuplicateQuestion { path, question } => {
                write!(f, "评分标准 {} 中题号 {} 重复", path, question)
            }
            StoreError::MissingQuestions {
                path,
                expected,
                found,
            } => {
                write!(
                    f,
                    "评分标准 {} 应有 {} 行，只找到 {} 行",
                    path, expected, found
                )
            }
            StoreError::MissingStudentId { path } => {
                write!(f, "试卷文件 {} 缺少学号", path)
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::RubricLine { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// 资源错误
#[derive(Debug)]
pub enum ResourceError {
    /// 工作任务异常退出
    WorkerPanicked { worker_id: usize, message: String },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::WorkerPanicked { worker_id, message } => {
                write!(f, "助教 {} 的任务异常退出: {}", worker_id, message)
            }
        }
    }
}

impl std::error::Error for ResourceError {}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 根据 io 错误类型创建文件读取错误
    pub fn file_read_failed(path: impl Into<String>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            AppError::File(FileError::NotFound { path })
        } else {
            AppError::File(FileError::ReadFailed {
                path,
                source: Box::new(source),
            })
        }
    }

    /// 创建文件写入错误
    pub fn file_write_failed(
        path: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::File(FileError::WriteFailed {
            path: path.into(),
            source: Box::new(source),
        })
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Store(err)
    }
}

impl From<ResourceError> for AppError {
    fn from(err: ResourceError) -> Self {
        AppError::Resource(err)
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
