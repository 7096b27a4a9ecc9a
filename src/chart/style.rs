//! Chart styling.

use eframe::egui::Color32;

pub struct ChartStyle {
    pub value_color: Color32,
    pub growth_color: Color32,
    pub rate_color: Color32,
    pub box_fill_opacity: f32,
    pub line_width: f32,
    pub box_width: f64,
}

pub const CHART_STYLE: ChartStyle = ChartStyle {
    value_color: Color32::from_rgb(66, 133, 244),  // Blue
    growth_color: Color32::from_rgb(52, 168, 83),  // Green
    rate_color: Color32::from_rgb(217, 48, 37),    // Red
    box_fill_opacity: 0.35,
    line_width: 2.0,
    box_width: 0.5,
};
