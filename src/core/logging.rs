//! 日志初始化
//!
//! 基于 `tracing-subscriber` 的 fmt 订阅器。`RUST_LOG` 环境变量优先于配置中的日志级别。

use std::fs::OpenOptions;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{LogLevel, LoggingConfig};

impl LogLevel {
    /// 转换为 `EnvFilter` 指令
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// 初始化日志系统
///
/// 重复调用是安全的：已经安装过全局订阅器时直接返回。
/// 日志文件无法打开时回退到控制台输出。
pub fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    if config.log_to_file {
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_file_path)
        {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
                tracing::info!(target: "deform", "Logging to {}", config.log_file_path);
                return;
            }
            Err(e) => {
                eprintln!(
                    "Failed to open log file {}: {}, falling back to console",
                    config.log_file_path, e
                );
            }
        }
    }

    if config.log_to_console {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}
