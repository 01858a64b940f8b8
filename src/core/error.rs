use thiserror::Error;

use crate::model::ModelError;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("配置错误: {0}")]
    Config(#[from] ::config::ConfigError),

    #[error("配置无效: {field} - {reason}")]
    InvalidConfig { field: String, reason: String },

    #[error("模型加载失败 {path}: {reason}")]
    ModelLoad { path: String, reason: String },

    #[error("推理失败: {0}")]
    Inference(#[from] ModelError),

    #[error("输入无效 {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("日志初始化失败: {0}")]
    Logging(String),

    #[error("服务错误: {0}")]
    Server(String),
}

impl RiskError {
    pub fn model_load(path: impl Into<String>, reason: impl ToString) -> Self {
        RiskError::ModelLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// 获取错误的严重程度
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            RiskError::Validation { .. } => ErrorSeverity::Warning,
            RiskError::Inference(_) => ErrorSeverity::Error,
            RiskError::Io(_) => ErrorSeverity::Error,
            _ => ErrorSeverity::Critical,
        }
    }

    /// 按严重程度写日志
    pub fn log(&self, context: &str) {
        log::log!(self.severity().log_level(), "{}: {}", context, self);
    }

    /// 页面和命令行上展示给用户的描述
    pub fn user_friendly_message(&self) -> String {
        match self {
            RiskError::ModelLoad { reason, .. } => format!("Error loading model: {}", reason),
            RiskError::Inference(e) => format!("Error during prediction: {}", e),
            RiskError::Validation { field, reason } => {
                format!("Invalid input for {}: {}", field, reason)
            }
            RiskError::Io(e) => format!("I/O error: {}", e),
            RiskError::Config(e) => format!("Configuration error: {}", e),
            RiskError::InvalidConfig { field, reason } => {
                format!("Invalid configuration for {}: {}", field, reason)
            }
            RiskError::Logging(reason) => format!("Failed to set up logging: {}", reason),
            RiskError::Server(reason) => format!("Server error: {}", reason),
        }
    }
}

/// 错误严重程度
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorSeverity {
    Warning,  // 用户输入问题，表单可重新提交
    Error,    // 单次请求失败
    Critical, // 无法启动
}

impl ErrorSeverity {
    pub fn log_level(self) -> log::Level {
        match self {
            ErrorSeverity::Warning => log::Level::Warn,
            ErrorSeverity::Error | ErrorSeverity::Critical => log::Level::Error,
        }
    }
}
