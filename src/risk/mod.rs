// 风险评估模块
pub mod evaluator;

pub use evaluator::{categorize, evaluate, RiskEvaluator};
