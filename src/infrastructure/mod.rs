//! 基础设施层
//!
//! 持有互斥资源，只暴露"进入临界区"的能力，不认识试卷和题目

pub mod lock_domain;

pub use lock_domain::{CriticalSection, LockDomain, LockStats, SyncMode};
