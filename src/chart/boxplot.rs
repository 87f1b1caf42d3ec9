use super::{
    category_label, category_range, label_values, numeric_values_skip_null, parse_number,
    text_style, title_style, Chart, ChartKind, Labels,
};
use crate::data::Table;
use crate::palette::{Qualitative, GRID_GRAY};
use crate::stats::{self, BoxStats};
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use serde::Deserialize;

/// Box-and-whisker summary of a numeric column, optionally grouped by a category column.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BoxChart {
    pub value_column: String,
    #[serde(default)]
    pub category_column: Option<String>,
}

const BOX_WIDTH: f64 = 0.6;

impl BoxChart {
    fn category(&self) -> Option<&str> {
        self.category_column
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }

    /// Values per group, groups in order of first appearance. Nulls are dropped;
    /// a column with no numeric values left is an error.
    fn groups(&self, table: &Table) -> Result<Vec<(String, Vec<f64>)>> {
        let groups = self.collect_groups(table)?;
        if groups.iter().all(|(_, values)| values.is_empty()) {
            bail!("Column '{}' has no numeric values", self.value_column);
        }
        Ok(groups)
    }

    fn collect_groups(&self, table: &Table) -> Result<Vec<(String, Vec<f64>)>> {
        let Some(category) = self.category() else {
            let values = numeric_values_skip_null(table, &self.value_column)?;
            return Ok(vec![(self.value_column.clone(), values)]);
        };

        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        let rows = label_values(table, category)
            .into_iter()
            .zip(table.values(&self.value_column));
        for (row_idx, (name, cell)) in rows.enumerate() {
            if cell.is_null() {
                continue;
            }
            let value = parse_number(cell, &self.value_column, row_idx)?;
            match groups.iter_mut().find(|(g, _)| *g == name) {
                Some((_, values)) => values.push(value),
                None => groups.push((name, vec![value])),
            }
        }
        Ok(groups)
    }
}

impl Chart for BoxChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Box
    }

    fn columns(&self) -> Vec<&str> {
        let mut cols = vec![self.value_column.as_str()];
        cols.extend(self.category());
        cols
    }

    fn default_size(&self) -> (u32, u32) {
        (1400, 800)
    }

    fn default_title(&self) -> Option<String> {
        Some(match self.category() {
            Some(category) => format!("Distribution of {} by {}", self.value_column, category),
            None => format!("Distribution of {}", self.value_column),
        })
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let groups = self.groups(table)?;
        let summaries: Vec<(usize, BoxStats)> = groups
            .iter()
            .enumerate()
            .filter_map(|(i, (_, values))| stats::box_stats(values).map(|s| (i, s)))
            .collect();
        let names: Vec<String> = groups.iter().map(|(name, _)| name.clone()).collect();

        let all: Vec<f64> = groups.iter().flat_map(|(_, v)| v.iter().copied()).collect();
        let (y_min, y_max) = stats::extent(&all).unwrap_or((0.0, 1.0));
        let (y_lo, y_hi) = stats::pad_range(y_min, y_max);

        let grouped = self.category().is_some();
        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(&labels.title, title_style())
            .x_label_area_size(if grouped { 120 } else { 60 })
            .y_label_area_size(80)
            .build_cartesian_2d(category_range(names.len()), y_lo..y_hi)
            .context("Failed to build chart")?;

        let x_label_style = if grouped {
            text_style(14).transform(FontTransform::Rotate90)
        } else {
            text_style(14)
        };

        chart
            .configure_mesh()
            .disable_x_mesh()
            .bold_line_style(&GRID_GRAY)
            .light_line_style(&WHITE)
            .x_labels(names.len())
            .x_label_formatter(&|x| category_label(&names, *x))
            .x_label_style(x_label_style)
            .y_label_style(text_style(14))
            .x_desc(labels.x_or(self.category().unwrap_or("")))
            .y_desc(labels.y_or(&self.value_column))
            .axis_desc_style(text_style(14))
            .draw()
            .context("Failed to draw mesh")?;

        let colors = Qualitative::Set2.take(names.len());
        let half = BOX_WIDTH / 2.0;

        for (i, s) in &summaries {
            let x = *i as f64;
            let color = colors[*i];

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - half, s.q1), (x + half, s.q3)],
                    color.filled(),
                )))
                .context("Failed to draw box")?;

            chart
                .draw_series(std::iter::once(Rectangle::new(
                    [(x - half, s.q1), (x + half, s.q3)],
                    BLACK.stroke_width(1),
                )))
                .context("Failed to draw box outline")?;

            let segments = vec![
                vec![(x, s.lower_whisker), (x, s.q1)],
                vec![(x, s.q3), (x, s.upper_whisker)],
                vec![(x - half / 2.0, s.lower_whisker), (x + half / 2.0, s.lower_whisker)],
                vec![(x - half / 2.0, s.upper_whisker), (x + half / 2.0, s.upper_whisker)],
            ];
            chart
                .draw_series(
                    segments
                        .into_iter()
                        .map(|points| PathElement::new(points, BLACK.stroke_width(1))),
                )
                .context("Failed to draw whiskers")?;

            chart
                .draw_series(std::iter::once(PathElement::new(
                    vec![(x - half, s.median), (x + half, s.median)],
                    BLACK.stroke_width(2),
                )))
                .context("Failed to draw median")?;

            chart
                .draw_series(
                    s.outliers
                        .iter()
                        .map(|&v| Circle::new((x, v), 4, BLACK.stroke_width(1))),
                )
                .context("Failed to draw outliers")?;
        }

        Ok(())
    }
}
