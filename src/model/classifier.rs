//! 二分类器
//!
//! 概率输出是可选能力：`Classifier::Probabilistic` 同时提供标签和阳性类概率，
//! `Classifier::LabelOnly` 只提供标签。调用方按变体分派，不做运行时探测。

use serde::{Deserialize, Serialize};

use super::{check_input, ModelError};
use crate::core::types::{ClassLabel, FEATURE_COUNT};

/// 只能输出标签的分类器
pub trait LabelClassifier: Send + Sync {
    /// 模型类型名，用于日志与健康检查
    fn kind(&self) -> &'static str;

    fn n_features(&self) -> usize;

    fn predict(&self, features: &[f64]) -> Result<ClassLabel, ModelError>;
}

/// 额外提供阳性类概率的分类器
pub trait ProbabilisticClassifier: LabelClassifier {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError>;
}

pub enum Classifier {
    Probabilistic(Box<dyn ProbabilisticClassifier>),
    LabelOnly(Box<dyn LabelClassifier>),
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Classifier::Probabilistic(model) => model.kind(),
            Classifier::LabelOnly(model) => model.kind(),
        }
    }

    pub fn n_features(&self) -> usize {
        match self {
            Classifier::Probabilistic(model) => model.n_features(),
            Classifier::LabelOnly(model) => model.n_features(),
        }
    }

    pub fn is_probabilistic(&self) -> bool {
        matches!(self, Classifier::Probabilistic(_))
    }

    pub fn predict(&self, features: &[f64]) -> Result<ClassLabel, ModelError> {
        match self {
            Classifier::Probabilistic(model) => model.predict(features),
            Classifier::LabelOnly(model) => model.predict(features),
        }
    }

    /// 标签-only 分类器返回 None
    pub fn predict_proba(&self, features: &[f64]) -> Option<Result<f64, ModelError>> {
        match self {
            Classifier::Probabilistic(model) => Some(model.predict_proba(features).and_then(
                |p| {
                    if !p.is_finite() {
                        Err(ModelError::NonFiniteOutput)
                    } else if !(0.0..=1.0).contains(&p) {
                        Err(ModelError::InvalidProbability(p))
                    } else {
                        Ok(p)
                    }
                },
            )),
            Classifier::LabelOnly(_) => None,
        }
    }
}

impl std::fmt::Debug for Classifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Classifier")
            .field("kind", &self.kind())
            .field("probabilistic", &self.is_probabilistic())
            .field("n_features", &self.n_features())
            .finish()
    }
}

/// 数值稳定的 sigmoid
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let exp_z = z.exp();
        exp_z / (1.0 + exp_z)
    }
}

fn dot(weights: &[f64], features: &[f64]) -> f64 {
    weights.iter().zip(features).map(|(w, x)| w * x).sum()
}

fn check_weights(coefficients: &[f64], intercept: f64) -> Result<(), ModelError> {
    if coefficients.is_empty() {
        return Err(ModelError::InvalidParameter("no coefficients".to_string()));
    }
    if coefficients.iter().any(|w| !w.is_finite()) || !intercept.is_finite() {
        return Err(ModelError::InvalidParameter(
            "coefficients must be finite".to_string(),
        ));
    }
    Ok(())
}

fn default_threshold() -> f64 {
    0.5
}

fn default_tree_features() -> usize {
    FEATURE_COUNT
}

/// 逻辑回归：p = sigmoid(w·x + b)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogisticRegression {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
    /// 判为阳性的概率阈值
    #[serde(default = "default_threshold")]
    pub threshold: f64,
}

impl LogisticRegression {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
            threshold: default_threshold(),
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_weights(&self.coefficients, self.intercept)?;
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(ModelError::InvalidParameter(format!(
                "threshold {} outside [0, 1]",
                self.threshold
            )));
        }
        Ok(())
    }

    /// 对数几率
    pub fn decision_function(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_input(features, self.coefficients.len())?;
        Ok(dot(&self.coefficients, features) + self.intercept)
    }
}

impl LabelClassifier for LogisticRegression {
    fn kind(&self) -> &'static str {
        "logistic_regression"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<ClassLabel, ModelError> {
        let p = self.predict_proba(features)?;
        Ok(ClassLabel::from_bool(p >= self.threshold))
    }
}

impl ProbabilisticClassifier for LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        let z = self.decision_function(features)?;
        if !z.is_finite() {
            return Err(ModelError::NonFiniteOutput);
        }
        Ok(sigmoid(z))
    }
}

/// 线性 SVM，只输出标签（w·x + b >= 0 为阳性）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LinearSvm {
    pub coefficients: Vec<f64>,
    pub intercept: f64,
}

impl LinearSvm {
    pub fn new(coefficients: Vec<f64>, intercept: f64) -> Self {
        Self {
            coefficients,
            intercept,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        check_weights(&self.coefficients, self.intercept)
    }
}

impl LabelClassifier for LinearSvm {
    fn kind(&self) -> &'static str {
        "linear_svm"
    }

    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<ClassLabel, ModelError> {
        check_input(features, self.coefficients.len())?;
        let margin = dot(&self.coefficients, features) + self.intercept;
        if !margin.is_finite() {
            return Err(ModelError::NonFiniteOutput);
        }
        Ok(ClassLabel::from_bool(margin >= 0.0))
    }
}

/// 决策树节点；split 时 x[feature] <= threshold 走左子树
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

/// 决策树，叶子节点存阳性类比例，根节点为 nodes[0]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DecisionTree {
    #[serde(default = "default_tree_features")]
    pub n_features: usize,
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    pub fn new(n_features: usize, nodes: Vec<TreeNode>) -> Self {
        Self { n_features, nodes }
    }

    /// 子节点下标必须大于父节点，保证无环且遍历必然终止
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.nodes.is_empty() {
            return Err(ModelError::InvalidTree("tree has no nodes".to_string()));
        }
        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= self.n_features {
                        return Err(ModelError::InvalidTree(format!(
                            "node {} splits on feature {} but the model has {}",
                            index, feature, self.n_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(ModelError::InvalidTree(format!(
                            "node {} has a non-finite threshold",
                            index
                        )));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(ModelError::InvalidTree(format!(
                                "node {} points to invalid child {}",
                                index, child
                            )));
                        }
                    }
                }
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(probability) {
                        return Err(ModelError::InvalidTree(format!(
                            "leaf {} has probability {}",
                            index, probability
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    fn leaf_probability(&self, features: &[f64]) -> Result<f64, ModelError> {
        check_input(features, self.n_features)?;
        let mut index = 0;
        // 经 validate 后最多走 nodes.len() 步
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features.get(*feature).ok_or_else(|| {
                        ModelError::InvalidTree(format!("feature {} out of range", feature))
                    })?;
                    index = if *value <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                None => break,
            }
        }
        Err(ModelError::InvalidTree(format!(
            "traversal did not reach a leaf (stopped at node {})",
            index
        )))
    }
}

impl LabelClassifier for DecisionTree {
    fn kind(&self) -> &'static str {
        "decision_tree"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict(&self, features: &[f64]) -> Result<ClassLabel, ModelError> {
        // 与 sklearn 一致：取概率较大的类，平局取阴性
        let p = self.leaf_probability(features)?;
        Ok(ClassLabel::from_bool(p > 0.5))
    }
}

impl ProbabilisticClassifier for DecisionTree {
    fn predict_proba(&self, features: &[f64]) -> Result<f64, ModelError> {
        self.leaf_probability(features)
    }
}
