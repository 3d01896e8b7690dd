use anyhow::Result;
use clap::Parser;
use exam_grader::config::MIN_WORKERS;
use exam_grader::{logger, App, AppResult, Config, RunReport, SyncMode};
use tracing::error;

#[derive(Parser, Debug)]
#[command(name = "exam-grader")]
#[command(version)]
#[command(about = "多个助教并发批改试卷，演示共享状态的同步")]
struct Args {
    /// 助教数量（至少 2）
    #[arg(value_name = "NUM_TAS", value_parser = parse_worker_count)]
    num_tas: usize,

    /// 同步模式（覆盖 SYNC_MODE 环境变量）
    #[arg(long, value_enum)]
    mode: Option<SyncMode>,
}

fn parse_worker_count(value: &str) -> Result<usize, String> {
    let count: usize = value
        .parse()
        .map_err(|_| format!("'{}' 不是有效的整数", value))?;
    if count < MIN_WORKERS {
        return Err(format!("请至少使用 {} 个助教", MIN_WORKERS));
    }
    Ok(count)
}

async fn grade(args: Args, mut config: Config) -> AppResult<RunReport> {
    config.num_workers = args.num_tas;
    if let Some(mode) = args.mode {
        config.sync_mode = mode;
    }

    App::initialize(config).await?.run().await
}

#[tokio::main]
async fn main() -> Result<()> {
    // 参数错误统一以退出码 1 结束；--help / --version 正常退出
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    // 先读取配置，日志级别取自配置；配置无效时以默认级别记录错误
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::init(false);
            error!("❌ 配置无效: {}", e);
            return Err(e.into());
        }
    };
    logger::init(config.verbose_logging);

    if let Err(e) = grade(args, config).await {
        error!("❌ 运行失败: {}", e);
        return Err(e.into());
    }

    Ok(())
}
