//! 输入指标柱状图（内联 SVG）

use crate::core::types::{Feature, PatientInput};

const WIDTH: f64 = 360.0;
const HEIGHT: f64 = 240.0;
const MARGIN_LEFT: f64 = 44.0;
const MARGIN_RIGHT: f64 = 12.0;
const MARGIN_TOP: f64 = 28.0;
const MARGIN_BOTTOM: f64 = 48.0;
const GRID_LINES: usize = 5;
/// 柱宽占每格的比例
const BAR_FILL: f64 = 0.8;

/// 单根柱子
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: &'static str,
    pub value: f64,
    pub color: &'static str,
    /// 柱顶数值标注，统一保留一位小数
    pub text: String,
}

pub fn bars(input: &PatientInput) -> Vec<ChartBar> {
    Feature::ALL
        .iter()
        .map(|feature| {
            let value = input.get(*feature);
            ChartBar {
                label: feature.chart_label(),
                value,
                color: feature.color(),
                text: format!("{:.1}", value),
            }
        })
        .collect()
}

/// 纵轴上限：最大值留 15% 余量，全为 0 时取 1
pub fn y_limit(input: &PatientInput) -> f64 {
    let max = Feature::ALL
        .iter()
        .map(|f| input.get(*f))
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.15
    } else {
        1.0
    }
}

fn tick_label(value: f64) -> String {
    if (value - value.round()).abs() < 1e-9 {
        format!("{}", value.round() as i64)
    } else {
        format!("{:.1}", value)
    }
}

pub fn render_bar_chart(input: &PatientInput) -> String {
    let bars = bars(input);
    let y_max = y_limit(input);
    let plot_w = WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let baseline = MARGIN_TOP + plot_h;
    let slot = plot_w / bars.len() as f64;
    let y_of = |v: f64| baseline - (v / y_max) * plot_h;

    let mut svg = format!(
        r##"<svg class="metrics-chart" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg" role="img" aria-label="Patient Health Metrics">
<rect x="{ml}" y="{mt}" width="{pw}" height="{ph}" fill="#f7f8fb"/>
<text x="{cx}" y="16" text-anchor="middle" font-size="11" fill="#111">Patient Health Metrics</text>
<text x="12" y="{cy}" text-anchor="middle" font-size="10" fill="#111" transform="rotate(-90 12 {cy})">Value</text>
"##,
        w = WIDTH,
        h = HEIGHT,
        ml = MARGIN_LEFT,
        mt = MARGIN_TOP,
        pw = plot_w,
        ph = plot_h,
        cx = MARGIN_LEFT + plot_w / 2.0,
        cy = MARGIN_TOP + plot_h / 2.0,
    );

    for i in 0..=GRID_LINES {
        let value = y_max * i as f64 / GRID_LINES as f64;
        let y = y_of(value);
        svg.push_str(&format!(
            r##"<line x1="{x1}" y1="{y:.2}" x2="{x2}" y2="{y:.2}" stroke="#999" stroke-width="0.6" stroke-dasharray="4 3" opacity="0.5"/>
<text x="{tx}" y="{ty:.2}" text-anchor="end" font-size="9" fill="#111">{label}</text>
"##,
            x1 = MARGIN_LEFT,
            x2 = MARGIN_LEFT + plot_w,
            tx = MARGIN_LEFT - 4.0,
            ty = y + 3.0,
            label = tick_label(value),
        ));
    }

    for (i, bar) in bars.iter().enumerate() {
        let center = MARGIN_LEFT + slot * (i as f64 + 0.5);
        let width = slot * BAR_FILL;
        let top = y_of(bar.value);
        svg.push_str(&format!(
            r##"<rect x="{x:.2}" y="{top:.2}" width="{width:.2}" height="{height:.2}" fill="{color}" stroke="#333" stroke-width="0.6"/>
<text x="{center:.2}" y="{ly:.2}" text-anchor="middle" font-size="8" fill="#111">{text}</text>
<text x="{center:.2}" y="{xy:.2}" text-anchor="end" font-size="9" fill="#111" transform="rotate(-20 {center:.2} {xy:.2})">{label}</text>
"##,
            x = center - width / 2.0,
            height = baseline - top,
            color = bar.color,
            ly = top - 3.0,
            text = bar.text,
            xy = baseline + 14.0,
            label = bar.label,
        ));
    }

    svg.push_str("</svg>");
    svg
}
