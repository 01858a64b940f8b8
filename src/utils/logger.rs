//! 日志模块
//! 基于 log4rs，控制台 + 按大小滚动的文件日志
use std::path::PathBuf;

use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::rolling_file::policy::compound::roll::fixed_window::FixedWindowRoller;
use log4rs::append::rolling_file::policy::compound::trigger::size::SizeTrigger;
use log4rs::append::rolling_file::policy::compound::CompoundPolicy;
use log4rs::append::rolling_file::RollingFileAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use serde::{Deserialize, Serialize};

use crate::core::error::RiskError;

const LOG_FILE_NAME: &str = "rustdrp.log";

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub root_dir: String,
    pub level: String,
    pub max_file_size_mb: u64,
    /// 保留的滚动归档数量
    pub retained_files: u32,
    pub console_output: bool,
    pub pattern: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            root_dir: "logs".to_string(),
            level: "INFO".to_string(),
            max_file_size_mb: 10,
            retained_files: 5,
            console_output: true,
            pattern: "[{d(%Y-%m-%d %H:%M:%S%.3f)}] [{l}] [{M}] {m}{n}".to_string(),
        }
    }
}

impl LogConfig {
    /// 获取日志级别
    pub fn level_filter(&self) -> LevelFilter {
        match self.level.to_uppercase().as_str() {
            "TRACE" => LevelFilter::Trace,
            "DEBUG" => LevelFilter::Debug,
            "INFO" => LevelFilter::Info,
            "WARN" => LevelFilter::Warn,
            "ERROR" => LevelFilter::Error,
            "OFF" => LevelFilter::Off,
            _ => LevelFilter::Info,
        }
    }

    pub fn log_path(&self) -> PathBuf {
        PathBuf::from(&self.root_dir).join(LOG_FILE_NAME)
    }

    /// 归档命名: logs/rustdrp.{index}.log
    fn archive_pattern(&self) -> String {
        PathBuf::from(&self.root_dir)
            .join("rustdrp.{}.log")
            .to_string_lossy()
            .to_string()
    }

    /// 构建 log4rs 配置（不安装）
    pub fn build(&self) -> Result<Config, RiskError> {
        let roller = FixedWindowRoller::builder()
            .build(&self.archive_pattern(), self.retained_files.max(1))
            .map_err(|e| RiskError::Logging(format!("创建日志轮转器失败: {}", e)))?;
        let trigger = SizeTrigger::new(self.max_file_size_mb.max(1) * 1024 * 1024);
        let policy = CompoundPolicy::new(Box::new(trigger), Box::new(roller));

        let file = RollingFileAppender::builder()
            .encoder(Box::new(PatternEncoder::new(&self.pattern)))
            .build(self.log_path(), Box::new(policy))
            .map_err(|e| RiskError::Logging(format!("打开日志文件失败: {}", e)))?;

        let mut builder =
            Config::builder().appender(Appender::builder().build("file", Box::new(file)));
        let mut root = Root::builder().appender("file");

        if self.console_output {
            let console = ConsoleAppender::builder()
                .encoder(Box::new(PatternEncoder::new(&self.pattern)))
                .build();
            builder = builder.appender(Appender::builder().build("console", Box::new(console)));
            root = root.appender("console");
        }

        builder
            .build(root.build(self.level_filter()))
            .map_err(|e| RiskError::Logging(format!("日志配置无效: {}", e)))
    }
}

/// 初始化全局日志器，只能调用一次
pub fn init_logger(config: &LogConfig) -> Result<log4rs::Handle, RiskError> {
    std::fs::create_dir_all(&config.root_dir)?;
    let log_config = config.build()?;
    log4rs::init_config(log_config)
        .map_err(|e| RiskError::Logging(format!("日志器已初始化: {}", e)))
}
