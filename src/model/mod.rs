// 模型模块 - 分类器、特征缩放与模型文件加载
pub mod artifact;
pub mod classifier;
pub mod scaler;

use thiserror::Error;

pub use artifact::{LoadedModel, ModelArtifact};
pub use classifier::{
    Classifier, DecisionTree, LabelClassifier, LinearSvm, LogisticRegression,
    ProbabilisticClassifier, TreeNode,
};
pub use scaler::Scaler;

/// 模型层错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("dimension mismatch: expected {expected} features, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("feature {index} is not a finite number")]
    NonFiniteInput { index: usize },

    #[error("model produced a non-finite value")]
    NonFiniteOutput,

    #[error("probability {0} is outside [0, 1]")]
    InvalidProbability(f64),

    #[error("invalid model parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid decision tree: {0}")]
    InvalidTree(String),
}

/// 维度与数值检查，分类器和缩放器共用
pub(crate) fn check_input(features: &[f64], expected: usize) -> Result<(), ModelError> {
    if features.len() != expected {
        return Err(ModelError::DimensionMismatch {
            expected,
            got: features.len(),
        });
    }
    if let Some(index) = features.iter().position(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteInput { index });
    }
    Ok(())
}
