//! Chart drawing for dashboard widgets
//!
//! Bar, line, area and scatter charts go through egui_plot; pie and radar
//! charts are painted directly since egui_plot has neither.

use std::f32::consts::{PI, TAU};

use egui::{pos2, vec2, Align2, Color32, FontId, Pos2, Rect, Sense, Shape, Stroke, Ui};
use egui_plot::{Bar, BarChart, Legend, Line, Plot, PlotPoints, Points};
use td_data::shaping::{PieSlice, Series};
use td_data::{ChartData, ChartKind};
use td_ui::theme::CHART_COLORS;
use td_ui::UiKey;

/// Line and area charts with more points than this are drawn without dots
pub const DOT_LIMIT: usize = 20;

pub fn chart_color(index: usize) -> Color32 {
    CHART_COLORS[index % CHART_COLORS.len()]
}

/// Draw `data` into the remaining space of `ui`.
pub fn show_chart(ui: &mut Ui, key: &UiKey, data: &ChartData) {
    match data {
        ChartData::Placeholder(kind) => placeholder(ui, *kind),
        ChartData::Pie(slices) => pie(ui, slices),
        ChartData::Bar(series) => bars(ui, key, series),
        ChartData::Line(series) => lines(ui, key, series, false),
        ChartData::Area(series) => lines(ui, key, series, true),
        ChartData::Scatter { x_key, y_key, points } => scatter(ui, key, x_key, y_key, points),
        ChartData::Radar(series) => radar(ui, series),
        ChartData::Text { header, body } => {
            ui.heading(header.as_str());
            ui.add_space(4.0);
            ui.label(body.as_str());
        }
    }
}

fn plot(key: &UiKey) -> Plot {
    Plot::new(key.clone().with("plot").build())
        .legend(Legend::default())
        .allow_scroll(false)
        .allow_drag(false)
        .allow_zoom(false)
        .allow_boxed_zoom(false)
}

fn bars(ui: &mut Ui, key: &UiKey, series: &Series) {
    let mut charts: Vec<BarChart> = Vec::with_capacity(series.y_keys.len());
    for (i, name) in series.y_keys.iter().enumerate() {
        let bars: Vec<Bar> = series
            .points
            .iter()
            .enumerate()
            .map(|(pos, point)| {
                let value = point.values.get(i).copied().flatten().unwrap_or(0.0);
                Bar::new(pos as f64, value).width(0.7).name(point.label())
            })
            .collect();

        let chart = BarChart::new(bars).name(name).color(chart_color(i));
        // Each series sits on top of the ones before it.
        let chart = {
            let below: Vec<&BarChart> = charts.iter().collect();
            chart.stack_on(&below)
        };
        charts.push(chart);
    }

    plot(key).show(ui, |plot_ui| {
        for chart in charts {
            plot_ui.bar_chart(chart);
        }
    });
}

fn lines(ui: &mut Ui, key: &UiKey, series: &Series, filled: bool) {
    let show_dots = series.points.len() <= DOT_LIMIT;
    plot(key).show(ui, |plot_ui| {
        for (i, name) in series.y_keys.iter().enumerate() {
            let coords: Vec<[f64; 2]> = series
                .column(i)
                .enumerate()
                .filter_map(|(pos, value)| value.map(|v| [pos as f64, v]))
                .collect();
            let color = chart_color(i);

            let mut line = Line::new(PlotPoints::from(coords.clone())).name(name).color(color);
            if filled {
                line = line.fill(0.0_f32);
            }
            plot_ui.line(line);
            if show_dots {
                plot_ui.points(Points::new(PlotPoints::from(coords)).radius(3.0).color(color));
            }
        }
    });
}

fn scatter(ui: &mut Ui, key: &UiKey, x_key: &str, y_key: &str, points: &[[f64; 2]]) {
    Plot::new(key.clone().with("plot").build())
        .x_axis_label(x_key)
        .y_axis_label(y_key)
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            plot_ui.points(
                Points::new(PlotPoints::from(points.to_vec()))
                    .radius(3.0)
                    .color(chart_color(0))
                    .name(format!("{} / {}", x_key, y_key)),
            );
        });
}

fn chart_area(ui: &mut Ui) -> Rect {
    let size = ui.available_size().max(vec2(120.0, 120.0));
    let (rect, _) = ui.allocate_exact_size(size, Sense::hover());
    rect
}

fn pie(ui: &mut Ui, slices: &[PieSlice]) {
    let total: f64 = slices.iter().map(|s| s.value).sum();
    if total <= 0.0 {
        ui.weak("No data");
        return;
    }

    let rect = chart_area(ui);
    let legend_width = (rect.width() * 0.35).min(160.0);
    let chart_rect = Rect::from_min_max(rect.min, pos2(rect.right() - legend_width, rect.bottom()));
    let center = chart_rect.center();
    let radius = chart_rect.width().min(chart_rect.height()) * 0.45;
    let painter = ui.painter_at(rect);

    let mut start = -PI / 2.0;
    for (i, slice) in slices.iter().enumerate() {
        let sweep = (slice.value / total) as f32 * TAU;
        let color = chart_color(i);
        // Fan of thin triangles; a wide sector is not convex.
        let steps = ((sweep / 0.1).ceil() as usize).max(1);
        for step in 0..steps {
            let a0 = start + sweep * step as f32 / steps as f32;
            let a1 = start + sweep * (step + 1) as f32 / steps as f32;
            painter.add(Shape::convex_polygon(
                vec![center, on_circle(center, radius, a0), on_circle(center, radius, a1)],
                color,
                Stroke::NONE,
            ));
        }
        start += sweep;
    }

    let font = FontId::proportional(12.0);
    let mut y = rect.top() + 8.0;
    for (i, slice) in slices.iter().enumerate() {
        let x = rect.right() - legend_width + 8.0;
        painter.circle_filled(pos2(x + 5.0, y + 6.0), 5.0, chart_color(i));
        painter.text(
            pos2(x + 16.0, y),
            Align2::LEFT_TOP,
            format!("{} ({})", slice.name, td_core::value::format_number(slice.value)),
            font.clone(),
            ui.visuals().text_color(),
        );
        y += 18.0;
    }
}

fn on_circle(center: Pos2, radius: f32, angle: f32) -> Pos2 {
    center + vec2(angle.cos(), angle.sin()) * radius
}

fn radar(ui: &mut Ui, series: &Series) {
    let values: Vec<f64> = series.column(0).map(|v| v.unwrap_or(0.0)).collect();
    if values.len() < 3 {
        ui.weak("Radar charts need at least three categories");
        return;
    }
    let max = values.iter().cloned().fold(0.0_f64, f64::max);

    let rect = chart_area(ui);
    let center = rect.center();
    let radius = rect.width().min(rect.height()) * 0.38;
    let painter = ui.painter_at(rect);
    let grid = ui.visuals().widgets.noninteractive.bg_stroke;
    let text_color = ui.visuals().text_color();
    let angle_of = |i: usize| -PI / 2.0 + TAU * i as f32 / values.len() as f32;

    for ring in 1..=4 {
        painter.circle_stroke(center, radius * ring as f32 / 4.0, grid);
    }

    let mut outline = Vec::with_capacity(values.len());
    for (i, (value, point)) in values.iter().zip(&series.points).enumerate() {
        let angle = angle_of(i);
        painter.line_segment([center, on_circle(center, radius, angle)], grid);
        painter.text(
            on_circle(center, radius + 12.0, angle),
            Align2::CENTER_CENTER,
            point.label(),
            FontId::proportional(11.0),
            text_color,
        );
        let scale = if max > 0.0 { (*value / max) as f32 } else { 0.0 };
        outline.push(on_circle(center, radius * scale, angle));
    }

    let color = chart_color(0);
    painter.add(Shape::closed_line(outline.clone(), Stroke::new(2.0, color)));
    for point in outline {
        painter.circle_filled(point, 3.0, color);
    }
}

/// Grey outline of the chart to come, with a hint
fn placeholder(ui: &mut Ui, kind: ChartKind) {
    let rect = chart_area(ui);
    let painter = ui.painter_at(rect);
    let shade = ui.visuals().widgets.inactive.bg_fill;
    let inner = rect.shrink(16.0);

    match kind {
        ChartKind::Pie | ChartKind::Radar => {
            painter.circle_filled(inner.center(), inner.width().min(inner.height()) * 0.35, shade);
        }
        ChartKind::Bar => {
            let heights = [12.0, 24.0, 36.0, 20.0, 28.0, 16.0];
            let slot = inner.width() / heights.len() as f32;
            for (i, h) in heights.iter().enumerate() {
                let height = inner.height() * h / 40.0;
                let bar = Rect::from_min_max(
                    pos2(inner.left() + slot * i as f32 + 4.0, inner.bottom() - height),
                    pos2(inner.left() + slot * (i + 1) as f32 - 4.0, inner.bottom()),
                );
                painter.rect_filled(bar, 2.0, shade);
            }
        }
        ChartKind::Line | ChartKind::Area | ChartKind::Scatter => {
            let ys = [50.0, 40.0, 42.0, 25.0, 30.0, 20.0, 25.0, 15.0, 18.0];
            let points: Vec<Pos2> = ys
                .iter()
                .enumerate()
                .map(|(i, y)| {
                    pos2(
                        inner.left() + inner.width() * i as f32 / (ys.len() - 1) as f32,
                        inner.top() + inner.height() * y / 64.0,
                    )
                })
                .collect();
            painter.add(Shape::line(points, Stroke::new(3.0, shade)));
        }
        ChartKind::Text => {}
    }

    painter.text(
        rect.center_bottom() - vec2(0.0, 8.0),
        Align2::CENTER_BOTTOM,
        "Edit this widget to choose its fields",
        FontId::proportional(12.0),
        ui.visuals().weak_text_color(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_colors_cycle() {
        assert_eq!(chart_color(0), CHART_COLORS[0]);
        assert_eq!(chart_color(CHART_COLORS.len() + 2), CHART_COLORS[2]);
    }
}
