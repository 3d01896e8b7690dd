//! 共享状态层
//!
//! - `shared_state` - 所有助教共享的一份可变记录，以及受保护的读写操作
//! - `stats` - 运行期计数器

pub mod shared_state;
pub mod stats;

pub use shared_state::{AdvanceOutcome, Correction, SharedState, StateSnapshot};
pub use stats::{GradingStats, StatsSnapshot};
