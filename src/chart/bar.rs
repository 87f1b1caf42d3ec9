use super::{
    category_label, category_range, format_thousands, label_values, numeric_values, text_style,
    title_style, zero_based_range, Chart, ChartKind, Labels,
};
use crate::data::Table;
use crate::palette::{GRID_GRAY, STEEL_BLUE};
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Deserialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Orientation {
    #[default]
    #[serde(rename = "v", alias = "vertical")]
    Vertical,
    #[serde(rename = "h", alias = "horizontal")]
    Horizontal,
}

/// One bar per category, annotated with its value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BarChart {
    pub x_column: String,
    pub y_column: String,
    #[serde(default)]
    pub orientation: Orientation,
}

const BAR_WIDTH: f64 = 0.8;

impl Chart for BarChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Bar
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
        let (categories, values) = aggregate_by_category(table, &self.x_column, &self.y_column)?;
        let category_axis = category_range(categories.len());
        let value_axis = zero_based_range(&values);
        let category_desc = labels.x_or(&self.x_column);
        let value_desc = labels.y_or(&self.y_column);
        let bar_color = STEEL_BLUE.filled();

        match self.orientation {
            Orientation::Vertical => {
                let mut chart = ChartBuilder::on(root)
                    .margin(20)
                    .caption(&labels.title, title_style())
                    .x_label_area_size(60)
                    .y_label_area_size(90)
                    .build_cartesian_2d(category_axis, value_axis)
                    .context("Failed to build chart")?;

                chart
                    .configure_mesh()
                    .disable_x_mesh()
                    .bold_line_style(&GRID_GRAY)
                    .light_line_style(&WHITE)
                    .x_labels(categories.len())
                    .x_label_formatter(&|x| category_label(&categories, *x))
                    .y_label_formatter(&|y| format_thousands(*y))
                    .x_desc(category_desc)
                    .y_desc(value_desc)
                    .label_style(text_style(14))
                    .draw()
                    .context("Failed to draw mesh")?;

                chart
                    .draw_series(values.iter().enumerate().map(|(i, &v)| {
                        let x = i as f64;
                        Rectangle::new(
                            [(x - BAR_WIDTH / 2.0, 0.0), (x + BAR_WIDTH / 2.0, v)],
                            bar_color,
                        )
                    }))
                    .context("Failed to draw bars")?;

                chart
                    .draw_series(values.iter().enumerate().map(|(i, &v)| {
                        let anchor = if v >= 0.0 { VPos::Bottom } else { VPos::Top };
                        Text::new(
                            format_thousands(v),
                            (i as f64, v),
                            text_style(14).pos(Pos::new(HPos::Center, anchor)),
                        )
                    }))
                    .context("Failed to draw value labels")?;
            }
            Orientation::Horizontal => {
                let mut chart = ChartBuilder::on(root)
                    .margin(20)
                    .caption(&labels.title, title_style())
                    .x_label_area_size(60)
                    .y_label_area_size(160)
                    .build_cartesian_2d(value_axis, category_axis)
                    .context("Failed to build chart")?;

                chart
                    .configure_mesh()
                    .disable_y_mesh()
                    .bold_line_style(&GRID_GRAY)
                    .light_line_style(&WHITE)
                    .y_labels(categories.len())
                    .y_label_formatter(&|y| category_label(&categories, *y))
                    .x_label_formatter(&|x| format_thousands(*x))
                    .x_desc(value_desc)
                    .y_desc(category_desc)
                    .label_style(text_style(14))
                    .draw()
                    .context("Failed to draw mesh")?;

                chart
                    .draw_series(values.iter().enumerate().map(|(i, &v)| {
                        let y = i as f64;
                        Rectangle::new(
                            [(0.0, y - BAR_WIDTH / 2.0), (v, y + BAR_WIDTH / 2.0)],
                            bar_color,
                        )
                    }))
                    .context("Failed to draw bars")?;

                chart
                    .draw_series(values.iter().enumerate().map(|(i, &v)| {
                        let anchor = if v >= 0.0 { HPos::Left } else { HPos::Right };
                        Text::new(
                            format!(" {} ", format_thousands(v)),
                            (v, i as f64),
                            text_style(14).pos(Pos::new(anchor, VPos::Center)),
                        )
                    }))
                    .context("Failed to draw value labels")?;
            }
        }

        Ok(())
    }
}

/// Sum `y_col` per distinct `x_col` value, keeping categories in order of first appearance.
fn aggregate_by_category(
    table: &Table,
    x_col: &str,
    y_col: &str,
) -> Result<(Vec<String>, Vec<f64>)> {
    let categories = label_values(table, x_col);
    let values = numeric_values(table, y_col)?;

    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut order: Vec<String> = Vec::new();
    let mut sums: Vec<f64> = Vec::new();

    for (category, value) in categories.iter().zip(values) {
        match index.get(category.as_str()) {
            Some(&slot) => sums[slot] += value,
            None => {
                index.insert(category, order.len());
                order.push(category.clone());
                sums.push(value);
            }
        }
    }

    Ok((order, sums))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_aggregate_sums_duplicates_in_first_seen_order() {
        let table = normalize(json!([
            {"cat": "B", "v": 1},
            {"cat": "A", "v": 2},
            {"cat": "B", "v": 3}
        ]))
        .unwrap();
        let (cats, values) = aggregate_by_category(&table, "cat", "v").unwrap();
        assert_eq!(cats, vec!["B", "A"]);
        assert_eq!(values, vec![4.0, 2.0]);
    }

    #[test]
    fn test_aggregate_rejects_text_values() {
        let table = normalize(json!([{"cat": "A", "v": "n/a"}])).unwrap();
        assert!(aggregate_by_category(&table, "cat", "v").is_err());
    }

    #[test]
    fn test_orientation_parsing() {
        let bar: BarChart =
            serde_json::from_value(json!({"x_column": "a", "y_column": "b"})).unwrap();
        assert_eq!(bar.orientation, Orientation::Vertical);
        let bar: BarChart = serde_json::from_value(
            json!({"x_column": "a", "y_column": "b", "orientation": "horizontal"}),
        )
        .unwrap();
        assert_eq!(bar.orientation, Orientation::Horizontal);
    }
}
