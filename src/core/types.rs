use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 特征数量（模型输入维度）
pub const FEATURE_COUNT: usize = 5;

/// 模型特征，顺序固定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Glucose,
    BloodPressure,
    Insulin,
    Bmi,
    Age,
}

impl Feature {
    /// 模型要求的特征顺序
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Feature::Glucose,
        Feature::BloodPressure,
        Feature::Insulin,
        Feature::Bmi,
        Feature::Age,
    ];

    pub fn index(self) -> usize {
        match self {
            Feature::Glucose => 0,
            Feature::BloodPressure => 1,
            Feature::Insulin => 2,
            Feature::Bmi => 3,
            Feature::Age => 4,
        }
    }

    /// 表单字段名 / 模型文件中的特征名
    pub fn name(self) -> &'static str {
        match self {
            Feature::Glucose => "glucose",
            Feature::BloodPressure => "blood_pressure",
            Feature::Insulin => "insulin",
            Feature::Bmi => "bmi",
            Feature::Age => "age",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Feature::Glucose => "Glucose Level",
            Feature::BloodPressure => "Blood Pressure",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::Age => "Age",
        }
    }

    /// 柱状图横轴标签
    pub fn chart_label(self) -> &'static str {
        match self {
            Feature::Glucose => "Glucose",
            Feature::BloodPressure => "BloodPressure",
            Feature::Insulin => "Insulin",
            Feature::Bmi => "BMI",
            Feature::Age => "Age",
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            Feature::Glucose => "#7db3ff",
            Feature::BloodPressure => "#a5d8ff",
            Feature::Insulin => "#b8f2e6",
            Feature::Bmi => "#f6c0ff",
            Feature::Age => "#ffd6a5",
        }
    }

    pub fn spec(self) -> FieldSpec {
        match self {
            Feature::Glucose => FieldSpec::integer(0.0, 300.0, 100.0),
            Feature::BloodPressure => FieldSpec::integer(0.0, 200.0, 80.0),
            Feature::Insulin => FieldSpec::integer(0.0, 900.0, 80.0),
            Feature::Bmi => FieldSpec {
                min: 0.0,
                max: 70.0,
                default: 25.0,
                step: 0.1,
                decimals: 1,
            },
            Feature::Age => FieldSpec::integer(1.0, 120.0, 30.0),
        }
    }
}

/// 表单字段的取值范围
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub min: f64,
    pub max: f64,
    pub default: f64,
    pub step: f64,
    /// 显示时保留的小数位
    pub decimals: usize,
}

impl FieldSpec {
    fn integer(min: f64, max: f64, default: f64) -> Self {
        Self {
            min,
            max,
            default,
            step: 1.0,
            decimals: 0,
        }
    }

    /// 对齐步长后夹到 [min, max]
    pub fn normalize(&self, value: f64) -> f64 {
        let snapped = (value / self.step).round() * self.step;
        let factor = 10f64.powi(self.decimals as i32);
        let rounded = (snapped * factor).round() / factor;
        rounded.clamp(self.min, self.max)
    }

    pub fn format(&self, value: f64) -> String {
        format!("{:.*}", self.decimals, value)
    }
}

/// 患者输入
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatientInput {
    pub glucose: f64,
    pub blood_pressure: f64,
    pub insulin: f64,
    pub bmi: f64,
    pub age: f64,
}

impl Default for PatientInput {
    fn default() -> Self {
        Self {
            glucose: Feature::Glucose.spec().default,
            blood_pressure: Feature::BloodPressure.spec().default,
            insulin: Feature::Insulin.spec().default,
            bmi: Feature::Bmi.spec().default,
            age: Feature::Age.spec().default,
        }
    }
}

impl PatientInput {
    pub fn new(glucose: f64, blood_pressure: f64, insulin: f64, bmi: f64, age: f64) -> Self {
        Self {
            glucose,
            blood_pressure,
            insulin,
            bmi,
            age,
        }
    }

    pub fn get(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Glucose => self.glucose,
            Feature::BloodPressure => self.blood_pressure,
            Feature::Insulin => self.insulin,
            Feature::Bmi => self.bmi,
            Feature::Age => self.age,
        }
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        match feature {
            Feature::Glucose => self.glucose = value,
            Feature::BloodPressure => self.blood_pressure = value,
            Feature::Insulin => self.insulin = value,
            Feature::Bmi => self.bmi = value,
            Feature::Age => self.age = value,
        }
    }

    /// 按 [glucose, blood_pressure, insulin, bmi, age] 组装特征向量
    pub fn to_features(&self) -> Vec<f64> {
        Feature::ALL.iter().map(|f| self.get(*f)).collect()
    }

    /// 夹到表单允许的范围（API 入口使用，表单已自行处理）
    pub fn normalized(&self) -> Self {
        let mut out = *self;
        for feature in Feature::ALL {
            out.set(feature, feature.spec().normalize(self.get(feature)));
        }
        out
    }
}

/// 分类器输出的二元标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassLabel {
    Negative,
    Positive,
}

impl ClassLabel {
    pub fn from_bool(positive: bool) -> Self {
        if positive {
            ClassLabel::Positive
        } else {
            ClassLabel::Negative
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            ClassLabel::Negative => 0,
            ClassLabel::Positive => 1,
        }
    }
}

/// 提示框样式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Warning,
    Error,
}

impl AlertKind {
    pub fn css_class(self) -> &'static str {
        match self {
            AlertKind::Success => "alert-success",
            AlertKind::Warning => "alert-warning",
            AlertKind::Error => "alert-error",
        }
    }
}

/// 风险分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    NotDiabetic,
    PreDiabetic,
    Diabetic,
}

impl RiskCategory {
    pub fn display_name(self) -> &'static str {
        match self {
            RiskCategory::NotDiabetic => "Not Diabetic",
            RiskCategory::PreDiabetic => "Pre-Diabetic",
            RiskCategory::Diabetic => "Diabetic",
        }
    }

    /// 渐变条上的位置
    pub fn position(self) -> f64 {
        match self {
            RiskCategory::NotDiabetic => 0.0,
            RiskCategory::PreDiabetic => 0.5,
            RiskCategory::Diabetic => 1.0,
        }
    }

    pub fn color(self) -> &'static str {
        match self {
            RiskCategory::NotDiabetic => "green",
            RiskCategory::PreDiabetic => "gold",
            RiskCategory::Diabetic => "red",
        }
    }

    pub fn alert(self) -> AlertKind {
        match self {
            RiskCategory::NotDiabetic => AlertKind::Success,
            RiskCategory::PreDiabetic => AlertKind::Warning,
            RiskCategory::Diabetic => AlertKind::Error,
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            RiskCategory::NotDiabetic => "✅",
            RiskCategory::PreDiabetic | RiskCategory::Diabetic => "⚠️",
        }
    }

    pub fn instructions_heading(self) -> &'static str {
        match self {
            RiskCategory::Diabetic => "Instructions for Diabetic Patients:",
            RiskCategory::PreDiabetic => "Instructions for Pre-Diabetic Patients:",
            RiskCategory::NotDiabetic => "Healthy Living Tips:",
        }
    }

    pub fn instructions(self) -> &'static [&'static str] {
        match self {
            RiskCategory::Diabetic => &[
                "Monitor blood glucose regularly.",
                "Follow a balanced, low-sugar diet.",
                "Take prescribed medication/insulin as directed.",
                "Engage in 30 minutes of moderate exercise daily.",
                "Schedule regular check-ups with your healthcare provider.",
            ],
            RiskCategory::PreDiabetic => &[
                "Reduce refined carbohydrates and added sugars.",
                "Increase daily physical activity (at least 150 minutes/week).",
                "Maintain a healthy weight.",
                "Monitor blood glucose and blood pressure regularly.",
                "Get a health check-up every 6–12 months.",
            ],
            RiskCategory::NotDiabetic => &[
                "Maintain balanced diet, daily exercise, hydration, and routine screening.",
            ],
        }
    }
}

/// 风险评估结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskResult {
    pub category: RiskCategory,
    /// 阳性类概率，仅概率型分类器提供
    pub probability: Option<f64>,
    pub position: f64,
    pub label: ClassLabel,
    pub evaluated_at: DateTime<Utc>,
}

impl RiskResult {
    pub fn new(category: RiskCategory, probability: Option<f64>, label: ClassLabel) -> Self {
        Self {
            category,
            probability,
            position: category.position(),
            label,
            evaluated_at: Utc::now(),
        }
    }

    /// 例如 "Patient is Pre-Diabetic (52.31% risk)"
    pub fn summary(&self) -> String {
        match self.probability {
            Some(p) => format!(
                "Patient is {} ({})",
                self.category.display_name(),
                format_risk(p)
            ),
            None => format!("Patient is {}", self.category.display_name()),
        }
    }
}

/// 概率格式化为百分比，两位小数
pub fn format_risk(probability: f64) -> String {
    format!("{:.2}% risk", probability * 100.0)
}
