//! Interactive chart window.
//!
//! One eframe window with four tabs: the dual-axis housing chart, the
//! unemployment chart, the triple-axis combined overlay, and side-by-side
//! box plots of the two distributions. The window blocks until closed;
//! headless runs skip it entirely.

mod style;
mod view;

use eframe::egui::{self, Ui};
use egui_plot::{AxisHints, BoxPlot, Corner, HPlacement, Legend, Line, LineStyle, Plot, PlotPoints};

use crate::error::Result;
use crate::types::{AlignedDataset, REGION_GROWTH_COL, REGION_VALUE_COL};
use style::CHART_STYLE;
use view::{AxisMap, box_elem, padded_range, quarter_axis, series_points, sorted_values};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChartTab {
    Housing,
    Unemployment,
    Combined,
    Distributions,
}

/// Everything the viewer needs, extracted up front from the aligned
/// tables so the frame loop never touches polars.
struct ChartData {
    region: String,
    value: Vec<[f64; 2]>,
    growth: Vec<[f64; 2]>,
    rate: Vec<[f64; 2]>,
    growth_map: AxisMap,
    rate_map: AxisMap,
    value_sorted: Vec<f64>,
    rate_sorted: Vec<f64>,
}

impl ChartData {
    fn from_dataset(dataset: &AlignedDataset, region: &str) -> Result<Self> {
        let value = series_points(&dataset.housing, REGION_VALUE_COL)?;
        let growth = series_points(&dataset.housing, REGION_GROWTH_COL)?;
        let rate = series_points(&dataset.unemployment, region)?;

        let value_range = padded_range(&value);
        let growth_map = AxisMap::fit(padded_range(&growth), value_range);
        let rate_map = AxisMap::fit(padded_range(&rate), value_range);

        Ok(Self {
            region: region.to_string(),
            value,
            growth,
            rate,
            growth_map,
            rate_map,
            value_sorted: sorted_values(&dataset.housing, REGION_VALUE_COL)?,
            rate_sorted: sorted_values(&dataset.unemployment, region)?,
        })
    }

    fn mapped(points: &[[f64; 2]], map: AxisMap) -> Vec<[f64; 2]> {
        points.iter().map(|p| [p[0], map.apply(p[1])]).collect()
    }
}

/// The tabbed chart viewer.
pub struct ExplorerApp {
    data: ChartData,
    tab: ChartTab,
}

impl ExplorerApp {
    fn new(data: ChartData) -> Self {
        Self {
            data,
            tab: ChartTab::Housing,
        }
    }

    fn value_axis(&self) -> AxisHints<'static> {
        AxisHints::new_y()
            .label("Housing value")
            .placement(HPlacement::Left)
    }

    fn growth_axis(&self) -> AxisHints<'static> {
        let map = self.data.growth_map;
        AxisHints::new_y()
            .label("Annual growth (%)")
            .placement(HPlacement::Right)
            .formatter(move |grid_mark, _range| format!("{:.1}", map.invert(grid_mark.value)))
    }

    fn rate_axis(&self) -> AxisHints<'static> {
        let map = self.data.rate_map;
        AxisHints::new_y()
            .label("Unemployment rate (%)")
            .placement(HPlacement::Right)
            .formatter(move |grid_mark, _range| format!("{:.1}", map.invert(grid_mark.value)))
    }

    fn value_line(&self) -> Line<'static> {
        Line::new(
            format!("Housing value ({})", self.data.region),
            PlotPoints::new(self.data.value.clone()),
        )
        .color(CHART_STYLE.value_color)
        .width(CHART_STYLE.line_width)
    }

    fn growth_line(&self) -> Line<'static> {
        Line::new(
            format!("Annual growth ({})", self.data.region),
            PlotPoints::new(ChartData::mapped(&self.data.growth, self.data.growth_map)),
        )
        .color(CHART_STYLE.growth_color)
        .width(CHART_STYLE.line_width)
        .style(LineStyle::dashed_loose())
    }

    fn rate_line(&self, mapped: bool) -> Line<'static> {
        let points = if mapped {
            ChartData::mapped(&self.data.rate, self.data.rate_map)
        } else {
            self.data.rate.clone()
        };
        Line::new(
            format!("Unemployment rate ({})", self.data.region),
            PlotPoints::new(points),
        )
        .color(CHART_STYLE.rate_color)
        .width(CHART_STYLE.line_width)
    }

    fn housing_chart(&self, ui: &mut Ui) {
        Plot::new("housing_chart")
            .legend(Legend::default().position(Corner::LeftTop))
            .custom_x_axes(vec![quarter_axis()])
            .custom_y_axes(vec![self.value_axis(), self.growth_axis()])
            .show(ui, |plot_ui| {
                plot_ui.line(self.value_line());
                plot_ui.line(self.growth_line());
            });
    }

    fn unemployment_chart(&self, ui: &mut Ui) {
        Plot::new("unemployment_chart")
            .legend(Legend::default().position(Corner::RightTop))
            .custom_x_axes(vec![quarter_axis()])
            .custom_y_axes(vec![
                AxisHints::new_y()
                    .label("Unemployment rate (%)")
                    .placement(HPlacement::Left),
            ])
            .show(ui, |plot_ui| {
                plot_ui.line(self.rate_line(false));
            });
    }

    fn combined_chart(&self, ui: &mut Ui) {
        // the second right-hand axis is drawn further outward, keeping
        // all three scales readable
        Plot::new("combined_chart")
            .legend(Legend::default().position(Corner::LeftTop))
            .custom_x_axes(vec![quarter_axis()])
            .custom_y_axes(vec![
                self.value_axis(),
                self.growth_axis(),
                self.rate_axis(),
            ])
            .show(ui, |plot_ui| {
                plot_ui.line(self.value_line());
                plot_ui.line(self.growth_line());
                plot_ui.line(self.rate_line(true));
            });
    }

    fn distribution_charts(&self, ui: &mut Ui) {
        ui.columns(2, |columns| {
            Self::box_chart(
                &mut columns[0],
                "housing_box",
                &format!("Housing value ({})", self.data.region),
                &self.data.value_sorted,
                CHART_STYLE.value_color,
            );
            Self::box_chart(
                &mut columns[1],
                "rate_box",
                &format!("Unemployment rate ({})", self.data.region),
                &self.data.rate_sorted,
                CHART_STYLE.rate_color,
            );
        });
    }

    fn box_chart(ui: &mut Ui, id: &str, label: &str, sorted: &[f64], color: egui::Color32) {
        if sorted.is_empty() {
            ui.label(format!("{label}: no data"));
            return;
        }

        let elem = box_elem(0.0, sorted)
            .box_width(CHART_STYLE.box_width)
            .fill(color.linear_multiply(CHART_STYLE.box_fill_opacity))
            .stroke(egui::Stroke::new(1.5, color));

        Plot::new(id.to_string())
            .legend(Legend::default().position(Corner::RightTop))
            .show_x(false)
            .x_grid_spacer(|_input| Vec::new())
            .show(ui, |plot_ui| {
                plot_ui.box_plot(BoxPlot::new(label.to_string(), vec![elem]));
            });
    }
}

impl eframe::App for ExplorerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("chart_tabs").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, ChartTab::Housing, "Housing");
                ui.selectable_value(&mut self.tab, ChartTab::Unemployment, "Unemployment");
                ui.selectable_value(&mut self.tab, ChartTab::Combined, "Combined");
                ui.selectable_value(&mut self.tab, ChartTab::Distributions, "Distributions");
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            ChartTab::Housing => self.housing_chart(ui),
            ChartTab::Unemployment => self.unemployment_chart(ui),
            ChartTab::Combined => self.combined_chart(ui),
            ChartTab::Distributions => self.distribution_charts(ui),
        });
    }
}

/// Open the chart window for an aligned dataset and block until it is
/// closed.
pub fn show(dataset: &AlignedDataset, region: &str) -> Result<()> {
    let data = ChartData::from_dataset(dataset, region)?;
    let app = ExplorerApp::new(data);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1180.0, 720.0]),
        ..Default::default()
    };

    eframe::run_native(
        &format!("quarterline - {region}"),
        options,
        Box::new(move |_cc| Ok(Box::new(app))),
    )
    .map_err(|e| crate::error::PrepError::Chart(e.to_string()))?;
    Ok(())
}
