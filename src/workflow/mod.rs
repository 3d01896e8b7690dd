pub mod grader_ctx;
pub mod grading_flow;
pub mod pacing;

pub use grader_ctx::GraderCtx;
pub use grading_flow::{GradingFlow, WorkerPhase, WorkerSummary};
pub use pacing::Pacer;
