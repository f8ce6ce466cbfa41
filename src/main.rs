use std::path::Path;
use std::process::ExitCode;

use strongbird::orchestrator::{error_exit_code, exit_code};
use strongbird::utils::logging;
use strongbird::{AppError, App, Config, Input};
use tracing::error;

const USAGE: &str = "用法: strongbird <URL 模板>... | strongbird --file <批量文件>";

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("配置错误: {}", e);
            return exit_status(error_exit_code(&anyhow::Error::from(AppError::from(e))));
        }
    };

    // 初始化日志
    if let Err(e) = logging::init(
        config.verbose_logging,
        Some(Path::new(&config.output_log_file)),
    ) {
        eprintln!("日志初始化失败: {:#}", e);
        return ExitCode::FAILURE;
    }

    let Some(input) = Input::from_args(std::env::args().skip(1)) else {
        eprintln!("{}", USAGE);
        return exit_status(2);
    };

    // 初始化并运行应用
    let app = App::initialize(config);
    match app.run(input).await {
        Ok(report) => exit_status(exit_code(&report)),
        Err(e) => {
            error!("❌ {:#}", e);
            exit_status(error_exit_code(&e))
        }
    }
}

fn exit_status(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
