use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::RiskError;
use crate::utils::logger::LogConfig;

/// 环境变量前缀，例如 RUSTDRP_SERVER__PORT=9000
pub const ENV_PREFIX: &str = "RUSTDRP";
pub const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

/// 服务主配置
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub thresholds: ThresholdConfig,
    pub page: PageConfig,
    pub logging: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8501,
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/diabetes_model.json".to_string(),
        }
    }
}

/// 概率分档阈值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// 概率 >= 该值视为糖尿病前期
    pub pre_diabetic: f64,
    /// 概率 >= 该值视为糖尿病
    pub diabetic: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            pre_diabetic: 0.40,
            diabetic: 0.60,
        }
    }
}

/// 页面文案
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub sidebar_title: String,
    pub sidebar_subtitle: Option<String>,
    pub contact_email: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Diabetes Risk Prediction".to_string(),
            sidebar_title: "Diabetes Risk Check".to_string(),
            sidebar_subtitle: None,
            contact_email: None,
        }
    }
}

impl AppConfig {
    /// 读取 YAML 配置文件（可不存在），再叠加环境变量
    pub fn load(path: &str) -> Result<Self, RiskError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(Path::new(path)).required(false))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), RiskError> {
        let t = &self.thresholds;
        if !(t.pre_diabetic > 0.0 && t.pre_diabetic < t.diabetic && t.diabetic <= 1.0) {
            return Err(RiskError::InvalidConfig {
                field: "thresholds".to_string(),
                reason: format!(
                    "expected 0 < pre_diabetic < diabetic <= 1, got {} / {}",
                    t.pre_diabetic, t.diabetic
                ),
            });
        }

        if self.model.path.trim().is_empty() {
            return Err(RiskError::InvalidConfig {
                field: "model.path".to_string(),
                reason: "model path is empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn load_yaml(contents: &str) -> Result<AppConfig, RiskError> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        AppConfig::load(file.path().to_str().unwrap())
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = AppConfig::load("does/not/exist.yaml").unwrap();
        assert_eq!(config.thresholds, ThresholdConfig::default());
        assert_eq!(config.model.path, "models/diabetes_model.json");
        assert_eq!(config.page.title, "Diabetes Risk Prediction");
    }

    #[test]
    fn yaml_sections_are_partial() {
        let config = load_yaml(
            r#"
model:
  path: models/other.yaml
thresholds:
  pre_diabetic: 0.3
"#,
        )
        .unwrap();
        assert_eq!(config.model.path, "models/other.yaml");
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.thresholds.pre_diabetic, 0.3);
        assert_eq!(config.thresholds.diabetic, 0.6);
    }

    #[test]
    fn env_overrides_file() {
        // 其它测试不读 server.port / logging.level
        std::env::set_var("RUSTDRP_SERVER__PORT", "9100");
        std::env::set_var("RUSTDRP_LOGGING__LEVEL", "DEBUG");
        let result = load_yaml(
            r#"
server:
  port: 9000
logging:
  level: WARN
"#,
        );
        std::env::remove_var("RUSTDRP_SERVER__PORT");
        std::env::remove_var("RUSTDRP_LOGGING__LEVEL");

        let config = result.unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.logging.level, "DEBUG");
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = load_yaml(
            r#"
thresholds:
  pre_diabetic: 0.7
  diabetic: 0.6
"#,
        )
        .unwrap_err();
        assert!(matches!(err, RiskError::InvalidConfig { .. }));
    }

    #[test]
    fn shipped_config_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/config/app.yaml");
        let config = AppConfig::load(path).unwrap();
        assert_eq!(config.model.path, "models/diabetes_model.json");
        assert_eq!(config.thresholds, ThresholdConfig::default());
    }
}
