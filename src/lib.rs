//! # Exam Grader
//!
//! 多个助教并发批改一组试卷的演示程序，重点在共享状态的同步方式
//!
//! ## 架构设计
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 互斥域 `LockDomain`，只暴露"进入临界区"的能力
//! - `SyncMode` - 同步 / 非同步两种策略，非同步模式用来复现竞争条件
//!
//! ### ② 业务能力层（Services）
//! - `RubricWriter` - 整体重写评分标准文件
//! - `ExamLoader` - 按索引加载试卷记录
//!
//! ### ③ 共享状态层（State）
//! - `SharedState` - 评分标准、当前学号、题目状态、试卷游标、终止标志
//! - 两个互斥域：状态域、评分标准域，任何操作只进入其中一个
//!
//! ### ④ 流程层（Workflow）
//! - `GradingFlow` - 单个助教的循环（终止检查 → 检查评分标准 → 认领批改 → 切换试卷）
//! - `Pacer` - 随机延迟和修正概率
//!
//! ### ⑤ 编排层（Orchestration）
//! - `App` - 初始化共享状态，启动 N 个助教，等待结束并输出报告
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod state;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::SyncMode;
pub use orchestrator::{App, RunReport};
pub use state::SharedState;
pub use workflow::GradingFlow;
