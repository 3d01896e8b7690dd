//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责一次批改运行的完整生命周期，是整个系统的"指挥中心"。
//!
//! ## 层次关系
//!
//! ```text
//! coordinator (启动 N 个助教，等待全部结束)
//!     ↓
//! workflow::GradingFlow (单个助教的循环)
//!     ↓
//! state::SharedState (受保护的共享字段)
//!     ↓
//! services (能力层：评分标准写入 / 试卷加载)
//!     ↓
//! infrastructure (基础设施：LockDomain)
//! ```
//!
//! ## 设计原则
//!
//! 1. **显式句柄**：共享状态通过 `Arc` 传给每个助教，没有全局变量
//! 2. **启动即等待**：协调者不参与批改，只负责创建、等待和回收
//! 3. **错误不吞掉**：任何助教的错误都会在全部回收后返回

pub mod coordinator;

// 重新导出主要类型
pub use coordinator::{App, RunReport};
