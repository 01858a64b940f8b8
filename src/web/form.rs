use serde::Deserialize;

use crate::core::error::RiskError;
use crate::core::types::{Feature, PatientInput};

/// 表单提交内容，字段原样保留为字符串
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PredictForm {
    pub glucose: Option<String>,
    pub blood_pressure: Option<String>,
    pub insulin: Option<String>,
    pub bmi: Option<String>,
    pub age: Option<String>,
}

impl PredictForm {
    fn raw(&self, feature: Feature) -> Option<&str> {
        let value = match feature {
            Feature::Glucose => &self.glucose,
            Feature::BloodPressure => &self.blood_pressure,
            Feature::Insulin => &self.insulin,
            Feature::Bmi => &self.bmi,
            Feature::Age => &self.age,
        };
        value.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// 空值取默认值，数值对齐步长并夹到范围内；无法解析时报校验错误
    pub fn parse(&self) -> Result<PatientInput, RiskError> {
        let mut input = PatientInput::default();
        for feature in Feature::ALL {
            let spec = feature.spec();
            let value = match self.raw(feature) {
                None => spec.default,
                Some(raw) => parse_number(feature, raw)?,
            };
            input.set(feature, spec.normalize(value));
        }
        Ok(input)
    }

    /// 校验失败时用于回填表单：能解析的字段保留，其余取默认值
    pub fn best_effort(&self) -> PatientInput {
        let mut input = PatientInput::default();
        for feature in Feature::ALL {
            if let Some(value) = self
                .raw(feature)
                .and_then(|raw| parse_number(feature, raw).ok())
            {
                input.set(feature, feature.spec().normalize(value));
            }
        }
        input
    }
}

fn parse_number(feature: Feature, raw: &str) -> Result<f64, RiskError> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(RiskError::Validation {
            field: feature.label().to_string(),
            reason: format!("'{}' is not a number", raw),
        }),
    }
}

/// JSON 接口不做夹取，超出范围直接拒绝
pub fn check_ranges(input: &PatientInput) -> Result<(), RiskError> {
    for feature in Feature::ALL {
        let spec = feature.spec();
        let value = input.get(feature);
        if !value.is_finite() || value < spec.min || value > spec.max {
            return Err(RiskError::Validation {
                field: feature.label().to_string(),
                reason: format!(
                    "{} is outside [{}, {}]",
                    value,
                    spec.format(spec.min),
                    spec.format(spec.max)
                ),
            });
        }
    }
    Ok(())
}
