use std::sync::Arc;

use crate::core::config::ThresholdConfig;
use crate::core::error::RiskError;
use crate::core::types::{ClassLabel, PatientInput, RiskCategory, RiskResult};
use crate::model::{Classifier, LoadedModel, Scaler};

/// 概率分档；没有概率时只按标签二分，不会出现糖尿病前期
pub fn categorize(
    probability: Option<f64>,
    label: ClassLabel,
    thresholds: &ThresholdConfig,
) -> RiskCategory {
    match probability {
        Some(p) if p >= thresholds.diabetic => RiskCategory::Diabetic,
        Some(p) if p >= thresholds.pre_diabetic => RiskCategory::PreDiabetic,
        Some(_) => RiskCategory::NotDiabetic,
        None => match label {
            ClassLabel::Positive => RiskCategory::Diabetic,
            ClassLabel::Negative => RiskCategory::NotDiabetic,
        },
    }
}

/// 单次评估：组装特征 -> 缩放（可选）-> 预测 -> 分档
pub fn evaluate(
    input: &PatientInput,
    classifier: &Classifier,
    scaler: Option<&Scaler>,
    thresholds: &ThresholdConfig,
) -> Result<RiskResult, RiskError> {
    let mut features = input.to_features();
    if let Some(scaler) = scaler {
        features = scaler.transform(&features)?;
    }

    let label = classifier.predict(&features)?;
    let probability = classifier.predict_proba(&features).transpose()?;

    let category = categorize(probability, label, thresholds);
    Ok(RiskResult::new(category, probability, label))
}

/// 持有已加载模型的评估器，所有请求共享
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    model: Arc<LoadedModel>,
    thresholds: ThresholdConfig,
}

impl RiskEvaluator {
    pub fn new(model: Arc<LoadedModel>, thresholds: ThresholdConfig) -> Self {
        Self { model, thresholds }
    }

    pub fn model(&self) -> &LoadedModel {
        &self.model
    }

    pub fn thresholds(&self) -> &ThresholdConfig {
        &self.thresholds
    }

    pub fn evaluate(&self, input: &PatientInput) -> Result<RiskResult, RiskError> {
        match evaluate(
            input,
            &self.model.classifier,
            self.model.scaler.as_ref(),
            &self.thresholds,
        ) {
            Ok(result) => {
                log::info!(
                    "风险评估完成: {:?} -> {} (概率={}, 标签={})",
                    input.to_features(),
                    result.category.display_name(),
                    result
                        .probability
                        .map(|p| format!("{:.4}", p))
                        .unwrap_or_else(|| "n/a".to_string()),
                    result.label.as_u8()
                );
                Ok(result)
            }
            Err(e) => {
                e.log(&format!("风险评估失败 {:?}", input.to_features()));
                Err(e)
            }
        }
    }
}
