use super::{
    category_label, numeric_values, text_style, title_style, Chart, ChartKind, Labels, XValues,
};
use crate::data::Table;
use crate::palette::{GRID_GRAY, STEEL_BLUE};
use crate::stats;
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScatterChart {
    pub x_column: String,
    pub y_column: String,
}

impl Chart for ScatterChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Scatter
    }

    fn columns(&self) -> Vec<&str> {
        vec![self.x_column.as_str(), self.y_column.as_str()]
    }

    fn default_size(&self) -> (u32, u32) {
        (1200, 800)
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let xs = XValues::from_column(table, &self.x_column);
        let ys = numeric_values(table, &self.y_column)?;
        let (y_min, y_max) = stats::extent(&ys).unwrap_or((0.0, 1.0));
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
                .y_desc(labels.y_or(&self.y_column))
                .label_style(text_style(14));
            if let Some(cats) = categories {
                mesh.x_labels(cats.len())
                    .x_label_formatter(&category_formatter);
            }
            mesh.draw().context("Failed to draw mesh")?;
        }

        let point_style = STEEL_BLUE.mix(0.6).filled();
        chart
            .draw_series(
                xs.positions()
                    .into_iter()
                    .zip(ys)
                    .map(|p| Circle::new(p, 6, point_style)),
            )
            .context("Failed to draw point series")?;

        Ok(())
    }
}
