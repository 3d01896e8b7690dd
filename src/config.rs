use crate::error::{AppResult, ConfigError};
use crate::infrastructure::SyncMode;
use serde::Serialize;
use std::path::PathBuf;
use std::str::FromStr;

/// 最少助教数量
pub const MIN_WORKERS: usize = 2;

/// 随机延迟区间（毫秒，闭区间）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DelayRange {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayRange {
    pub const fn new(min_ms: u64, max_ms: u64) -> Self {
        Self { min_ms, max_ms }
    }
}

impl FromStr for DelayRange {
    type Err = String;

    /// 接受 `500-1000` 或单个数值 `0`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| format!("无效的毫秒数: '{}'", v))
        };
        match s.split_once('-') {
            Some((min, max)) => Ok(Self::new(parse(min)?, parse(max)?)),
            None => {
                let value = parse(s)?;
                Ok(Self::new(value, value))
            }
        }
    }
}

/// 程序配置
#[derive(Clone, Debug, Serialize)]
pub struct Config {
    /// 助教数量（由命令行给出）
    pub num_workers: usize,
    /// 评分标准文件
    pub rubric_path: PathBuf,
    /// 试卷列表文件
    pub exam_list_path: PathBuf,
    /// 同步策略
    pub sync_mode: SyncMode,
    /// 检查评分标准的耗时
    pub review_delay_ms: DelayRange,
    /// 批改一道题的耗时
    pub mark_delay_ms: DelayRange,
    /// 每次检查后修正评分标准的概率
    pub correction_probability: f64,
    /// 随机种子，未设置时使用系统熵
    pub seed: Option<u64>,
    /// 运行报告输出文件（JSON）
    pub report_file: Option<PathBuf>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            num_workers: MIN_WORKERS,
            rubric_path: PathBuf::from("rubric.txt"),
            exam_list_path: PathBuf::from("exams_list.txt"),
            sync_mode: SyncMode::Synchronized,
            review_delay_ms: DelayRange::new(500, 1000),
            mark_delay_ms: DelayRange::new(1000, 2000),
            correction_probability: 0.5,
            seed: None,
            report_file: None,
            verbose_logging: false,
        }
    }
}

/// 读取环境变量，不存在时返回 None，解析失败返回配置错误
fn env_parse<T: FromStr>(var_name: &str, expected_type: &str) -> AppResult<Option<T>> {
    match std::env::var(var_name) {
        Ok(value) => value.parse().map(Some).map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(None),
    }
}

impl Config {
    pub fn from_env() -> AppResult<Self> {
        let default = Self::default();
        Ok(Self {
            num_workers: default.num_workers,
            rubric_path: std::env::var("RUBRIC_PATH").map(PathBuf::from).unwrap_or(default.rubric_path),
            exam_list_path: std::env::var("EXAM_LIST_PATH").map(PathBuf::from).unwrap_or(default.exam_list_path),
            sync_mode: env_parse("SYNC_MODE", "synchronized|unsynchronized")?.unwrap_or(default.sync_mode),
            review_delay_ms: env_parse("REVIEW_DELAY_MS", "min-max")?.unwrap_or(default.review_delay_ms),
            mark_delay_ms: env_parse("MARK_DELAY_MS", "min-max")?.unwrap_or(default.mark_delay_ms),
            correction_probability: env_parse("CORRECTION_PROBABILITY", "f64")?.unwrap_or(default.correction_probability),
            seed: env_parse("GRADER_SEED", "u64")?.or(default.seed),
            report_file: std::env::var("GRADING_REPORT_FILE").ok().map(PathBuf::from).or(default.report_file),
            verbose_logging: env_parse("VERBOSE_LOGGING", "bool")?.unwrap_or(default.verbose_logging),
        })
    }

    /// 校验配置，任何一项不合法都是致命错误
    pub fn validate(&self) -> AppResult<()> {
        if self.num_workers < MIN_WORKERS {
            return Err(ConfigError::InvalidWorkerCount {
                value: self.num_workers,
            }
            .into());
        }

        for (name, range) in [
            ("REVIEW_DELAY_MS", self.review_delay_ms),
            ("MARK_DELAY_MS", self.mark_delay_ms),
        ] {
            if range.min_ms > range.max_ms {
                return Err(ConfigError::InvalidDelayRange {
                    name: name.to_string(),
                    min: range.min_ms,
                    max: range.max_ms,
                }
                .into());
            }
        }

        if !(0.0..=1.0).contains(&self.correction_probability) {
            return Err(ConfigError::InvalidProbability {
                value: self.correction_probability,
            }
            .into());
        }

        Ok(())
    }
}
