//! 日志工具模块
//!
//! 提供启动横幅和最终统计的输出
use crate::config::Config;
use crate::models::format_student_id;
use crate::orchestrator::RunReport;
use tracing::{info, warn};

/// 记录程序启动信息
///
/// # 参数
/// - `config`: 本次运行的配置
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多助教并发批改模式");
    info!("👥 助教数量: {}", config.num_workers);
    info!("🔒 同步模式: {}", config.sync_mode);
    info!("📄 评分标准: {}", config.rubric_path.display());
    info!("📋 试卷列表: {}", config.exam_list_path.display());
    info!("{}", "=".repeat(60));
}

/// 记录试卷加载信息
///
/// # 参数
/// - `total`: 试卷总数
/// - `initial_student`: 第一份试卷的学号
pub fn log_exams_loaded(total: usize, initial_student: i32) {
    info!("✓ 已加载 {} 个试卷文件名", total);
    info!("初始学生: {}", format_student_id(initial_student));
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部助教已结束");
    info!(
        "完成时间: {}",
        report.finished_at.format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "📦 最终试卷索引: {} (学生 {})",
        report.final_state.exam_index,
        format_student_id(report.final_state.student_id)
    );
    info!("🔀 试卷切换: {}", report.stats.advances);
    info!(
        "✅ 认领 / 完成题目: {} / {}",
        report.stats.claims, report.stats.marks
    );
    info!(
        "✏️ 评分标准修正: {} (写入 {} 次)",
        report.stats.corrections, report.stats.rubric_persists
    );
    info!("📄 最终评分标准: {}", report.rubric);
    for lock in &report.locks {
        info!(
            "🔒 互斥域 {}: 进入 {} 次, 重叠 {} 次",
            lock.name, lock.entries, lock.overlaps
        );
    }
    if report.stats.torn_transitions > 0 {
        warn!(
            "⚠️ 检测到 {} 次题目状态跳过\"批改中\"",
            report.stats.torn_transitions
        );
    }
    info!("{}", "=".repeat(60));
}
