use super::{
    category_label, category_range, parse_number, text_style, title_style, Chart, ChartKind,
    Labels,
};
use crate::data::Table;
use crate::palette::{contrast_text, yl_or_rd};
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Deserialize;
use std::collections::HashMap;

/// Pivot of `value_column` summed over (`y_column`, `x_column`), drawn as colored cells.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HeatmapChart {
    pub x_column: String,
    pub y_column: String,
    pub value_column: String,
}

const COLOR_BAR_WIDTH: i32 = 110;
const COLOR_BAR_STEPS: usize = 100;

/// Summed cells keyed by (row, column) index into `rows` / `cols`.
#[derive(Debug, Clone, PartialEq)]
struct Pivot {
    rows: Vec<String>,
    cols: Vec<String>,
    cells: HashMap<(usize, usize), f64>,
}

impl Pivot {
    fn build(table: &Table, x_col: &str, y_col: &str, value_col: &str) -> Result<Self> {
        let mut sums: HashMap<(String, String), f64> = HashMap::new();
        let mut rows = Vec::new();
        let mut cols = Vec::new();

        let cells = table
            .values(x_col)
            .zip(table.values(y_col))
            .zip(table.values(value_col));
        for (row_idx, ((x, y), value)) in cells.enumerate() {
            if value.is_null() {
                continue;
            }
            let value = parse_number(value, value_col, row_idx)?;
            let (x, y) = (x.to_string(), y.to_string());
            if !cols.contains(&x) {
                cols.push(x.clone());
            }
            if !rows.contains(&y) {
                rows.push(y.clone());
            }
            *sums.entry((y, x)).or_insert(0.0) += value;
        }

        if sums.is_empty() {
            bail!("Column '{}' has no numeric values", value_col);
        }

        sort_keys(&mut rows);
        sort_keys(&mut cols);

        let cells = sums
            .into_iter()
            .filter_map(|((y, x), v)| {
                let r = rows.iter().position(|k| *k == y)?;
                let c = cols.iter().position(|k| *k == x)?;
                Some(((r, c), v))
            })
            .collect();

        Ok(Self { rows, cols, cells })
    }

    fn value_range(&self) -> (f64, f64) {
        let min = self.cells.values().copied().fold(f64::INFINITY, f64::min);
        let max = self.cells.values().copied().fold(f64::NEG_INFINITY, f64::max);
        if !min.is_finite() {
            (0.0, 1.0)
        } else if min == max {
            (min - 0.5, max + 0.5)
        } else {
            (min, max)
        }
    }
}

/// Numeric order when every key is a number, otherwise lexicographic.
fn sort_keys(keys: &mut [String]) {
    if keys.iter().all(|k| k.parse::<f64>().is_ok()) {
        keys.sort_by(|a, b| {
            let a = a.parse::<f64>().unwrap_or(0.0);
            let b = b.parse::<f64>().unwrap_or(0.0);
            a.total_cmp(&b)
        });
    } else {
        keys.sort();
    }
}

impl Chart for HeatmapChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Heatmap
    }

    fn columns(&self) -> Vec<&str> {
        vec![
            self.x_column.as_str(),
            self.y_column.as_str(),
            self.value_column.as_str(),
        ]
    }

    fn default_size(&self) -> (u32, u32) {
        (1400, 800)
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let pivot = Pivot::build(table, &self.x_column, &self.y_column, &self.value_column)?;
        let (v_min, v_max) = pivot.value_range();
        let shade = |v: f64| yl_or_rd((v - v_min) / (v_max - v_min));

        let area = root
            .titled(&labels.title, title_style())
            .context("Failed to draw title")?;
        let (w, _) = area.dim_in_pixel();
        let grid_width = (w as i32 - COLOR_BAR_WIDTH).max(1);
        let (grid_area, bar_area) = area.split_horizontally(grid_width);

        let n_rows = pivot.rows.len();
        // First row at the top.
        let row_labels: Vec<String> = pivot.rows.iter().rev().cloned().collect();
        let flip = |r: usize| (n_rows - 1 - r) as f64;

        let mut chart = ChartBuilder::on(&grid_area)
            .margin(20)
            .x_label_area_size(60)
            .y_label_area_size(120)
            .build_cartesian_2d(category_range(pivot.cols.len()), category_range(n_rows))
            .context("Failed to build chart")?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(pivot.cols.len())
            .y_labels(n_rows)
            .x_label_formatter(&|x| category_label(&pivot.cols, *x))
            .y_label_formatter(&|y| category_label(&row_labels, *y))
            .x_desc(labels.x_or(&self.x_column))
            .y_desc(labels.y_or(&self.y_column))
            .label_style(text_style(14))
            .draw()
            .context("Failed to draw mesh")?;

        chart
            .draw_series(pivot.cells.iter().map(|(&(r, c), &v)| {
                let (x, y) = (c as f64, flip(r));
                Rectangle::new([(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)], shade(v).filled())
            }))
            .context("Failed to draw cells")?;

        let annotations: Vec<((f64, f64), f64, RGBColor)> = pivot
            .cells
            .iter()
            .map(|(&(r, c), &v)| ((c as f64, flip(r)), v, contrast_text(shade(v))))
            .collect();
        chart
            .draw_series(annotations.iter().map(|(pos, v, ink)| {
                Text::new(
                    format!("{:.0}", v),
                    *pos,
                    text_style(13)
                        .color(ink)
                        .pos(Pos::new(HPos::Center, VPos::Center)),
                )
            }))
            .context("Failed to draw cell annotations")?;

        draw_color_bar(&bar_area, v_min, v_max, &self.value_column)
    }
}

fn draw_color_bar(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    v_min: f64,
    v_max: f64,
    value_label: &str,
) -> Result<()> {
    let mut bar = ChartBuilder::on(area)
        .margin_top(20)
        .margin_bottom(80)
        .margin_right(10)
        .right_y_label_area_size(70)
        .build_cartesian_2d(0.0..1.0, v_min..v_max)
        .context("Failed to build color bar")?;

    bar.configure_mesh()
        .disable_mesh()
        .disable_x_axis()
        .y_desc(value_label)
        .label_style(text_style(12))
        .draw()
        .context("Failed to draw color bar axis")?;

    let step = (v_max - v_min) / COLOR_BAR_STEPS as f64;
    bar.draw_series((0..COLOR_BAR_STEPS).map(|i| {
        let lo = v_min + i as f64 * step;
        let t = (i as f64 + 0.5) / COLOR_BAR_STEPS as f64;
        Rectangle::new([(0.0, lo), (1.0, lo + step)], yl_or_rd(t).filled())
    }))
    .context("Failed to draw color bar")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_pivot_sums_and_skips_nulls() {
        let table = normalize(json!([
            {"day": "Tue", "hour": 9, "n": 2},
            {"day": "Mon", "hour": 10, "n": 1},
            {"day": "Tue", "hour": 9, "n": 3},
            {"day": "Mon", "hour": 9, "n": null}
        ]))
        .unwrap();
        let pivot = Pivot::build(&table, "hour", "day", "n").unwrap();

        assert_eq!(pivot.rows, vec!["Mon", "Tue"]);
        assert_eq!(pivot.cols, vec!["9", "10"]);
        assert_eq!(pivot.cells.get(&(1, 0)), Some(&5.0));
        assert_eq!(pivot.cells.get(&(0, 1)), Some(&1.0));
        assert_eq!(pivot.cells.get(&(0, 0)), None);
    }

    #[test]
    fn test_pivot_rejects_all_null_values() {
        let table = normalize(json!([
            {"day": "Mon", "hour": 9, "n": null},
            {"day": "Tue", "hour": 10, "n": null}
        ]))
        .unwrap();
        let err = Pivot::build(&table, "hour", "day", "n").unwrap_err();
        assert!(err.to_string().contains("no numeric values"), "{}", err);
    }

    #[test]
    fn test_pivot_rejects_text_values() {
        let table = normalize(json!([{"a": 1, "b": 2, "n": "many"}])).unwrap();
        assert!(Pivot::build(&table, "a", "b", "n").is_err());
    }

    #[test]
    fn test_sort_keys_numeric_when_possible() {
        let mut keys = vec!["10".to_string(), "9".to_string(), "100".to_string()];
        sort_keys(&mut keys);
        assert_eq!(keys, vec!["9", "10", "100"]);

        let mut keys = vec!["b".to_string(), "10".to_string(), "a".to_string()];
        sort_keys(&mut keys);
        assert_eq!(keys, vec!["10", "a", "b"]);
    }
}
