//! 页面渲染
//!
//! 单页：侧边栏、输入表单，提交后在表单下方显示结果（或错误）。

use crate::core::config::PageConfig;
use crate::core::types::{format_risk, Feature, PatientInput, RiskResult};

use super::chart::render_bar_chart;

const STYLE: &str = r#"
body { margin: 0; background: linear-gradient(135deg, #f5f7fa, #c3cfe2); font-family: 'Segoe UI', sans-serif; color: #111; min-height: 100vh; }
.layout { display: flex; gap: 24px; padding: 24px; }
.sidebar { flex: 0 0 240px; }
.main { flex: 1; max-width: 980px; }
.sidebar-card { background: linear-gradient(135deg, #e6e6ff, #d7c9ff); border-radius: 14px; padding: 16px; text-align: center; box-shadow: 0 4px 16px rgba(0,0,0,0.12); border: 1px solid rgba(0,0,0,0.06); }
.sidebar-card a, .custom-footer a { color: #111; text-decoration: none; }
.form-title { text-align: center; font-size: 1.9rem; font-weight: 700; margin: 10px 0 14px 0; color: #222; }
.info-box { background: linear-gradient(135deg, #ffffff, #f2f4ff); padding: 10px 12px; border-radius: 10px; border: 1px solid #e6e9f0; font-size: 14px; font-weight: 600; margin-bottom: 10px; text-align: center; box-shadow: 0 2px 8px rgba(0,0,0,0.08); }
.input-card { background: #ffffff; padding: 16px; border-radius: 12px; box-shadow: 0 4px 18px rgba(0,0,0,0.08); border: 1px solid rgba(0,0,0,0.05); }
.columns { display: grid; grid-template-columns: 1fr 1fr; gap: 12px 24px; }
.field label { display: block; font-size: 14px; margin-bottom: 4px; }
.field input { width: 100%; box-sizing: border-box; padding: 8px; border-radius: 8px; border: 1px solid #cfd4e0; }
.predict { margin-top: 14px; padding: 8px 18px; border: none; border-radius: 8px; background: #ff4b4b; color: #fff; font-weight: 600; cursor: pointer; }
.result { display: grid; grid-template-columns: 2fr 1fr; gap: 24px; margin-top: 20px; }
.alert { padding: 12px 14px; border-radius: 8px; margin-bottom: 12px; }
.alert-success { background: #e3f6e8; color: #155724; }
.alert-warning { background: #fff6d6; color: #7a5b00; }
.alert-error { background: #fde4e4; color: #8a1c1c; }
.gauge { margin-top: 14px; text-align: center; }
.gauge-bar { width: 100%; background: linear-gradient(to right, green 33%, gold 66%, red 100%); height: 16px; border-radius: 10px; position: relative; border: 1px solid rgba(0,0,0,0.15); }
.gauge-marker { position: absolute; top: -7px; transform: translateX(-50%); width: 16px; height: 30px; border-radius: 6px; border: 2px solid rgba(0,0,0,0.35); }
.gauge-captions { display: flex; justify-content: space-between; font-size: 12px; margin-top: 6px; }
.hr-soft { height: 1px; background: linear-gradient(90deg, rgba(0,0,0,0), rgba(0,0,0,0.12), rgba(0,0,0,0)); border: none; margin: 12px 0; }
.custom-footer { text-align: center; padding: 8px 0 12px 0; font-size: 13px; }
"#;

/// 提交后的结果
#[derive(Debug, Clone)]
pub enum Outcome {
    Prediction(RiskResult),
    Failure(String),
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_sidebar(page: &PageConfig) -> String {
    let mut html = format!(
        r#"<aside class="sidebar"><div class="sidebar-card"><h3 style="margin:0 0 6px 0;">{}</h3>"#,
        escape_html(&page.sidebar_title)
    );
    if let Some(email) = &page.contact_email {
        let email = escape_html(email);
        html.push_str(&format!(
            r#"<div style="font-size:14px; margin-top:6px;">📧 <a href="mailto:{0}">{0}</a></div>"#,
            email
        ));
    }
    if let Some(subtitle) = &page.sidebar_subtitle {
        html.push_str(&format!(
            r#"<hr class="hr-soft"/><div style="font-size:13px; line-height:1.4;">{}</div>"#,
            escape_html(subtitle)
        ));
    }
    html.push_str("</div></aside>");
    html
}

fn render_field(feature: Feature, value: f64) -> String {
    let spec = feature.spec();
    format!(
        r#"<div class="field"><label for="{name}">{label}</label><input type="number" id="{name}" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}" required/></div>"#,
        name = feature.name(),
        label = feature.label(),
        min = spec.format(spec.min),
        max = spec.format(spec.max),
        step = spec.step,
        value = spec.format(value),
    )
}

/// 两列布局与原页面一致：左列 glucose/insulin/age，右列 blood pressure/bmi
fn render_form(input: &PatientInput) -> String {
    let left = [Feature::Glucose, Feature::Insulin, Feature::Age];
    let right = [Feature::BloodPressure, Feature::Bmi];

    let column = |features: &[Feature]| -> String {
        features
            .iter()
            .map(|f| render_field(*f, input.get(*f)))
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        r#"<div class="info-box">Enter your details</div>
<form class="input-card" method="post" action="/predict">
<div class="columns"><div>{}</div><div>{}</div></div>
<button class="predict" type="submit">Predict</button>
</form>"#,
        column(&left),
        column(&right)
    )
}

/// 渐变条与类别标记
pub fn render_gauge(result: &RiskResult) -> String {
    format!(
        r#"<div class="gauge"><div class="gauge-bar"><div class="gauge-marker" style="left:{left}%; background:{color};"></div></div><div class="gauge-captions"><span>Not Diabetic</span><span>Pre-Diabetic</span><span>Diabetic</span></div></div>"#,
        left = result.position * 100.0,
        color = result.category.color(),
    )
}

pub fn render_message(result: &RiskResult) -> String {
    let category = result.category;
    let risk = result
        .probability
        .map(|p| format!(" ({})", format_risk(p)))
        .unwrap_or_default();
    format!(
        r#"<div class="alert {}">{} Patient is <strong>{}</strong>{}</div>"#,
        category.alert().css_class(),
        category.icon(),
        category.display_name(),
        risk
    )
}

fn render_instructions(result: &RiskResult) -> String {
    let items = result
        .category
        .instructions()
        .iter()
        .map(|line| format!("<li>{}</li>", escape_html(line)))
        .collect::<String>();
    format!(
        "<div class=\"instructions\"><strong>{}</strong><ul>{}</ul></div>",
        result.category.instructions_heading(),
        items
    )
}

fn render_outcome(outcome: &Outcome, input: &PatientInput) -> String {
    match outcome {
        Outcome::Prediction(result) => format!(
            r#"<section class="result"><div>{}{}{}</div><div>{}</div></section>"#,
            render_message(result),
            render_instructions(result),
            render_gauge(result),
            render_bar_chart(input)
        ),
        Outcome::Failure(message) => format!(
            r#"<section class="result-error"><div class="alert alert-error">{}</div></section>"#,
            escape_html(message)
        ),
    }
}

/// 完整页面
pub fn render_page(page: &PageConfig, input: &PatientInput, outcome: Option<&Outcome>) -> String {
    let footer = page
        .contact_email
        .as_ref()
        .map(|email| {
            let email = escape_html(email);
            format!(
                r#"<footer class="custom-footer">📧 <a href="mailto:{0}">{0}</a></footer>"#,
                email
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>{title}</title>
<style>{style}</style>
</head>
<body>
<div class="layout">
{sidebar}
<main class="main">
<div class="form-title">{title}</div>
{form}
{outcome}
</main>
</div>
{footer}
</body>
</html>
"#,
        title = escape_html(&page.title),
        style = STYLE,
        sidebar = render_sidebar(page),
        form = render_form(input),
        outcome = outcome
            .map(|o| render_outcome(o, input))
            .unwrap_or_default(),
        footer = footer,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ClassLabel, RiskCategory};

    #[test]
    fn empty_page_has_form_with_defaults() {
        let html = render_page(&PageConfig::default(), &PatientInput::default(), None);
        assert!(html.contains("Diabetes Risk Prediction"));
        assert!(html.contains(r#"name="glucose" min="0" max="300" step="1" value="100""#));
        assert!(html.contains(r#"name="bmi" min="0.0" max="70.0" step="0.1" value="25.0""#));
        assert!(html.contains(r#"name="age" min="1" max="120" step="1" value="30""#));
        assert!(!html.contains("class=\"result\""));
    }

    #[test]
    fn prediction_shows_message_instructions_gauge_and_chart() {
        let result = RiskResult::new(RiskCategory::PreDiabetic, Some(0.5), ClassLabel::Positive);
        let outcome = Outcome::Prediction(result);
        let html = render_page(
            &PageConfig::default(),
            &PatientInput::default(),
            Some(&outcome),
        );
        assert!(html.contains("Patient is <strong>Pre-Diabetic</strong> (50.00% risk)"));
        assert!(html.contains("Instructions for Pre-Diabetic Patients:"));
        assert!(html.contains("left:50%; background:gold;"));
        assert!(html.contains("<svg"));
    }

    #[test]
    fn label_only_message_has_no_percentage() {
        let result = RiskResult::new(RiskCategory::Diabetic, None, ClassLabel::Positive);
        let message = render_message(&result);
        assert!(message.ends_with("Patient is <strong>Diabetic</strong></div>"));
        assert!(render_gauge(&result).contains("left:100%; background:red;"));
    }

    #[test]
    fn failures_are_escaped() {
        let outcome = Outcome::Failure("Error during prediction: <bad>".to_string());
        let html = render_page(
            &PageConfig::default(),
            &PatientInput::default(),
            Some(&outcome),
        );
        assert!(html.contains("Error during prediction: &lt;bad&gt;"));
        // 表单仍然可用
        assert!(html.contains(r#"action="/predict""#));
    }

    #[test]
    fn contact_appears_in_sidebar_and_footer() {
        let page = PageConfig {
            contact_email: Some("clinic@example.org".to_string()),
            ..PageConfig::default()
        };
        let html = render_page(&page, &PatientInput::default(), None);
        assert_eq!(html.matches("mailto:clinic@example.org").count(), 2);
    }
}
