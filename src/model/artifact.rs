//! 模型文件加载
//!
//! 文件内容可以是裸分类器，也可以是 `{model, scaler?, feature_names?}` 组合，
//! 格式按扩展名选择（json / yaml / toml，其它按 json 解析）。

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::classifier::{Classifier, DecisionTree, LinearSvm, LogisticRegression};
use super::scaler::Scaler;
use super::ModelError;
use crate::core::error::RiskError;
use crate::core::types::{Feature, FEATURE_COUNT};

/// 模型文件格式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    Json,
    Yaml,
    Toml,
}

impl ArtifactFormat {
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref()
        {
            Some("yaml") | Some("yml") => ArtifactFormat::Yaml,
            Some("toml") => ArtifactFormat::Toml,
            _ => ArtifactFormat::Json,
        }
    }

    fn parse_value(self, bytes: &[u8]) -> Result<serde_json::Value, String> {
        match self {
            ArtifactFormat::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            ArtifactFormat::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
            ArtifactFormat::Toml => {
                let text = std::str::from_utf8(bytes).map_err(|e| e.to_string())?;
                toml::from_str(text).map_err(|e| e.to_string())
            }
        }
    }
}

impl fmt::Display for ArtifactFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactFormat::Json => "json",
            ArtifactFormat::Yaml => "yaml",
            ArtifactFormat::Toml => "toml",
        };
        f.write_str(name)
    }
}

/// 文件中的分类器描述，按 kind 区分
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    LogisticRegression(LogisticRegression),
    DecisionTree(DecisionTree),
    LinearSvm(LinearSvm),
}

impl ModelSpec {
    fn into_classifier(self) -> Result<Classifier, ModelError> {
        let classifier = match self {
            ModelSpec::LogisticRegression(model) => {
                model.validate()?;
                Classifier::Probabilistic(Box::new(model))
            }
            ModelSpec::DecisionTree(model) => {
                model.validate()?;
                Classifier::Probabilistic(Box::new(model))
            }
            ModelSpec::LinearSvm(model) => {
                model.validate()?;
                Classifier::LabelOnly(Box::new(model))
            }
        };
        Ok(classifier)
    }
}

/// 组合形式的模型文件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelArtifact {
    pub model: ModelSpec,
    #[serde(default)]
    pub scaler: Option<Scaler>,
    /// 训练时的特征顺序，存在时必须与输入顺序一致
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,
}

impl ModelArtifact {
    /// 解析文件内容；没有 model 键时按裸分类器处理
    pub fn parse(bytes: &[u8], format: ArtifactFormat) -> Result<Self, String> {
        let value = format.parse_value(bytes)?;
        let is_bundle = value
            .as_object()
            .map(|obj| obj.contains_key("model"))
            .unwrap_or(false);

        if is_bundle {
            serde_json::from_value(value).map_err(|e| e.to_string())
        } else {
            let model: ModelSpec = serde_json::from_value(value).map_err(|e| e.to_string())?;
            Ok(Self {
                model,
                scaler: None,
                feature_names: None,
            })
        }
    }

    fn check_feature_names(&self) -> Result<(), String> {
        let Some(names) = &self.feature_names else {
            return Ok(());
        };
        let expected: Vec<String> = Feature::ALL
            .iter()
            .map(|f| normalize_name(f.name()))
            .collect();
        let actual: Vec<String> = names.iter().map(|n| normalize_name(n)).collect();
        if actual != expected {
            return Err(format!(
                "feature_names {:?} do not match expected order {:?}",
                names,
                Feature::ALL.iter().map(|f| f.name()).collect::<Vec<_>>()
            ));
        }
        Ok(())
    }

    /// 校验并构建可推理的模型
    pub fn build(
        self,
        source: PathBuf,
        format: ArtifactFormat,
        fingerprint: String,
    ) -> Result<LoadedModel, String> {
        self.check_feature_names()?;

        let classifier = self.model.into_classifier().map_err(|e| e.to_string())?;
        if classifier.n_features() != FEATURE_COUNT {
            return Err(format!(
                "model expects {} features, inputs have {}",
                classifier.n_features(),
                FEATURE_COUNT
            ));
        }

        if let Some(scaler) = &self.scaler {
            scaler.validate().map_err(|e| e.to_string())?;
            if scaler.n_features() != FEATURE_COUNT {
                return Err(format!(
                    "scaler expects {} features, inputs have {}",
                    scaler.n_features(),
                    FEATURE_COUNT
                ));
            }
        }

        Ok(LoadedModel {
            classifier,
            scaler: self.scaler,
            source,
            format,
            fingerprint,
        })
    }
}

/// "Blood Pressure" / "BloodPressure" / "blood_pressure" 视为同一名字
fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

/// 已加载的模型，进程内只读共享
#[derive(Debug)]
pub struct LoadedModel {
    pub classifier: Classifier,
    pub scaler: Option<Scaler>,
    pub source: PathBuf,
    pub format: ArtifactFormat,
    /// 文件内容的 SHA-256
    pub fingerprint: String,
}

impl LoadedModel {
    /// 从文件加载；任何失败都是 ModelLoad 错误
    pub fn load(path: impl AsRef<Path>) -> Result<Self, RiskError> {
        let path = path.as_ref();
        let display = path.display().to_string();

        if path.is_dir() {
            return Err(RiskError::model_load(&display, "model path must be a file"));
        }

        let bytes = std::fs::read(path).map_err(|e| RiskError::model_load(&display, e))?;
        let format = ArtifactFormat::from_path(path);
        let digest = fingerprint(&bytes);

        let model = ModelArtifact::parse(&bytes, format)
            .and_then(|artifact| artifact.build(path.to_path_buf(), format, digest))
            .map_err(|reason| RiskError::model_load(&display, reason))?;

        log::info!(
            "模型已加载: {} (format={}, kind={}, 概率输出={}, scaler={}, sha256={})",
            display,
            model.format,
            model.classifier.kind(),
            model.classifier.is_probabilistic(),
            model.scaler_kind().unwrap_or("none"),
            model.fingerprint
        );
        Ok(model)
    }

    pub fn from_parts(classifier: Classifier, scaler: Option<Scaler>) -> Self {
        Self {
            classifier,
            scaler,
            source: PathBuf::new(),
            format: ArtifactFormat::Json,
            fingerprint: String::new(),
        }
    }

    pub fn scaler_kind(&self) -> Option<&'static str> {
        self.scaler.as_ref().map(|s| s.kind())
    }
}

pub fn fingerprint(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_artifact(name: &str, contents: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        (dir, path)
    }

    #[test]
    fn loads_bare_classifier() {
        let (_dir, path) = write_artifact(
            "bare.json",
            r#"{"kind": "logistic_regression", "coefficients": [0.1, 0.0, 0.0, 0.0, 0.0], "intercept": -1.0}"#,
        );
        let model = LoadedModel::load(&path).unwrap();
        assert!(model.classifier.is_probabilistic());
        assert!(model.scaler.is_none());
        assert_eq!(model.fingerprint.len(), 64);
    }

    #[test]
    fn loads_yaml_bundle_with_scaler() {
        let (_dir, path) = write_artifact(
            "bundle.yaml",
            r#"
feature_names: [Glucose, BloodPressure, Insulin, BMI, Age]
model:
  kind: linear_svm
  coefficients: [1.0, 0.0, 0.0, 0.0, 0.0]
  intercept: 0.0
scaler:
  kind: standard
  mean: [120.0, 70.0, 80.0, 32.0, 33.0]
  scale: [30.0, 20.0, 100.0, 8.0, 12.0]
"#,
        );
        let model = LoadedModel::load(&path).unwrap();
        assert_eq!(model.format, ArtifactFormat::Yaml);
        assert!(!model.classifier.is_probabilistic());
        assert_eq!(model.scaler_kind(), Some("standard"));
    }

    #[test]
    fn loads_toml_tree() {
        let (_dir, path) = write_artifact(
            "tree.toml",
            r#"
[model]
kind = "decision_tree"

[[model.nodes]]
type = "split"
feature = 0
threshold = 140.0
left = 1
right = 2

[[model.nodes]]
type = "leaf"
probability = 0.2

[[model.nodes]]
type = "leaf"
probability = 0.7
"#,
        );
        let model = LoadedModel::load(&path).unwrap();
        assert_eq!(model.classifier.kind(), "decision_tree");
    }

    #[test]
    fn missing_file_is_a_load_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LoadedModel::load(dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, RiskError::ModelLoad { .. }));
    }

    #[test]
    fn corrupt_file_is_a_load_error() {
        let (_dir, path) = write_artifact("corrupt.json", "{not json");
        assert!(matches!(
            LoadedModel::load(&path),
            Err(RiskError::ModelLoad { .. })
        ));
    }

    #[test]
    fn wrong_dimension_is_rejected_at_load() {
        let (_dir, path) = write_artifact(
            "short.json",
            r#"{"model": {"kind": "logistic_regression", "coefficients": [1.0, 2.0], "intercept": 0.0}}"#,
        );
        let err = LoadedModel::load(&path).unwrap_err();
        assert!(err.to_string().contains("model expects 2 features"));
    }

    #[test]
    fn feature_order_mismatch_is_rejected() {
        let (_dir, path) = write_artifact(
            "order.json",
            r#"{
                "feature_names": ["age", "bmi", "insulin", "blood_pressure", "glucose"],
                "model": {"kind": "linear_svm", "coefficients": [1, 1, 1, 1, 1], "intercept": 0}
            }"#,
        );
        let err = LoadedModel::load(&path).unwrap_err();
        assert!(err.to_string().contains("feature_names"));
    }

    #[test]
    fn misspelled_bundle_key_is_rejected() {
        // 拼错的 scaler 不能被忽略，否则模型会直接吃未缩放的输入
        let (_dir, path) = write_artifact(
            "typo.json",
            r#"{
                "model": {"kind": "logistic_regression", "coefficients": [1, 0, 0, 0, 0], "intercept": 0},
                "scalar": {"kind": "standard", "mean": [0, 0, 0, 0, 0], "scale": [1, 1, 1, 1, 1]}
            }"#,
        );
        let err = LoadedModel::load(&path).unwrap_err();
        assert!(matches!(err, RiskError::ModelLoad { .. }));
        assert!(err.to_string().contains("scalar"));
    }

    #[test]
    fn misspelled_model_field_is_rejected() {
        let (_dir, path) = write_artifact(
            "field_typo.yaml",
            r#"
kind: logistic_regression
coefficients: [1.0, 0.0, 0.0, 0.0, 0.0]
intercept: 0.0
treshold: 0.3
"#,
        );
        let err = LoadedModel::load(&path).unwrap_err();
        assert!(err.to_string().contains("treshold"));
    }

    #[test]
    fn format_names_follow_extension() {
        assert_eq!(ArtifactFormat::from_path(Path::new("m.yml")).to_string(), "yaml");
        assert_eq!(ArtifactFormat::from_path(Path::new("m.TOML")).to_string(), "toml");
        assert_eq!(ArtifactFormat::from_path(Path::new("m.bin")).to_string(), "json");
    }

    #[test]
    fn shipped_model_loads() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/models/diabetes_model.json");
        let model = LoadedModel::load(path).unwrap();
        assert!(model.classifier.is_probabilistic());
        assert_eq!(model.scaler_kind(), Some("standard"));
    }
}
