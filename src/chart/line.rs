use super::{
    category_label, numeric_values, text_style, title_style, Chart, ChartKind, Labels, XValues,
};
use crate::data::Table;
use crate::palette::{Qualitative, GRID_GRAY};
use crate::stats;
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;

/// One or more series sharing an x-axis. `y_columns` is comma-delimited.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LineChart {
    pub x_column: String,
    pub y_columns: String,
}

impl LineChart {
    pub fn series(&self) -> Vec<&str> {
        self.y_columns
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .collect()
    }
}

impl Chart for LineChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Line
    }

    fn columns(&self) -> Vec<&str> {
        let mut cols = vec![self.x_column.as_str()];
        cols.extend(self.series());
        cols
    }

    fn default_size(&self) -> (u32, u32) {
        (1400, 700)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.series().is_empty() {
            return Err("line chart needs at least one y column".to_string());
        }
        Ok(())
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let xs = XValues::from_column(table, &self.x_column);
        let positions = xs.positions();

        let mut series: Vec<(&str, Vec<f64>)> = Vec::new();
        for name in self.series() {
            series.push((name, numeric_values(table, name)?));
        }

        let all_y: Vec<f64> = series.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        let (y_min, y_max) = stats::extent(&all_y).unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = stats::pad_range(y_min, y_max);

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(&labels.title, title_style())
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(xs.range(), y_lo..y_hi)
            .context("Failed to build chart")?;

        let categories = xs.categories();
        let category_formatter = |x: &f64| category_label(categories.unwrap_or(&[]), *x);
        {
            let mut mesh = chart.configure_mesh();
            mesh.bold_line_style(&GRID_GRAY)
                .light_line_style(&WHITE)
                .x_desc(labels.x_or(&self.x_column))
                .y_desc(labels.y_or("Value"))
                .label_style(text_style(14));
            if let Some(cats) = categories {
                mesh.x_labels(cats.len())
                    .x_label_formatter(&category_formatter);
            }
            mesh.draw().context("Failed to draw mesh")?;
        }

        for (idx, (name, ys)) in series.iter().enumerate() {
            let color = Qualitative::Category10.pick(idx);
            let points: Vec<(f64, f64)> = positions.iter().copied().zip(ys.iter().copied()).collect();

            chart
                .draw_series(LineSeries::new(points.clone(), color.stroke_width(2)))
                .context("Failed to draw line series")?
                .label(*name)
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });

            chart
                .draw_series(points.into_iter().map(|p| Circle::new(p, 4, color.filled())))
                .context("Failed to draw line markers")?;
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .label_font(text_style(14))
            .draw()
            .context("Failed to draw legend")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_series_split_and_trimmed() {
        let chart = LineChart {
            x_column: "month".into(),
            y_columns: "orders, revenue ,".into(),
        };
        assert_eq!(chart.series(), vec!["orders", "revenue"]);
        assert_eq!(chart.columns(), vec!["month", "orders", "revenue"]);
        assert!(chart.validate().is_ok());
    }

    #[test]
    fn test_empty_series_rejected() {
        let chart = LineChart {
            x_column: "month".into(),
            y_columns: " , ".into(),
        };
        assert!(chart.validate().is_err());
    }
}
