use super::{numeric_values_skip_null, text_style, title_style, Chart, ChartKind, Labels};
use crate::data::Table;
use crate::palette::{GRID_GRAY, STEEL_BLUE};
use crate::stats;
use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::Deserialize;

fn default_bins() -> usize {
    30
}

/// Frequency histogram of one numeric column with a density curve overlaid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistogramChart {
    pub column: String,
    #[serde(default = "default_bins")]
    pub bins: usize,
}

const KDE_POINTS: usize = 200;

/// Upper bound on the requested bin count.
pub const MAX_BINS: usize = 10_000;

impl Chart for HistogramChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Histogram
    }

    fn columns(&self) -> Vec<&str> {
        vec![self.column.as_str()]
    }

    fn default_size(&self) -> (u32, u32) {
        (1200, 700)
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.bins == 0 {
            return Err("histogram bin count must be positive".to_string());
        }
        if self.bins > MAX_BINS {
            return Err(format!(
                "histogram bin count {} exceeds the limit of {}",
                self.bins, MAX_BINS
            ));
        }
        Ok(())
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let values = numeric_values_skip_null(table, &self.column)?;
        let bins = stats::bin(&values, self.bins)
            .with_context(|| format!("Column '{}' has no numeric values", self.column))?;

        let x_lo = bins.start;
        let x_hi = bins.start + bins.width * bins.counts.len() as f64;

        // Density scaled to counts so the curve sits on the same axis as the bars.
        let scale = values.len() as f64 * bins.width;
        let curve: Vec<(f64, f64)> = stats::kde(&values, x_lo, x_hi, KDE_POINTS)
            .into_iter()
            .map(|(x, d)| (x, d * scale))
            .collect();

        let curve_max = curve.iter().map(|&(_, y)| y).fold(0.0, f64::max);
        let y_hi = (bins.max_count() as f64).max(curve_max).max(1.0) * 1.1;

        let mut chart = ChartBuilder::on(root)
            .margin(20)
            .caption(&labels.title, title_style())
            .x_label_area_size(60)
            .y_label_area_size(80)
            .build_cartesian_2d(x_lo..x_hi, 0.0..y_hi)
            .context("Failed to build chart")?;

        chart
            .configure_mesh()
            .bold_line_style(&GRID_GRAY)
            .light_line_style(&WHITE)
            .x_desc(labels.x_or(&self.column))
            .y_desc(labels.y_or("Frequency"))
            .label_style(text_style(14))
            .draw()
            .context("Failed to draw mesh")?;

        chart
            .draw_series(bins.counts.iter().enumerate().map(|(i, &count)| {
                let (lo, hi) = bins.edges(i);
                Rectangle::new([(lo, 0.0), (hi, count as f64)], STEEL_BLUE.mix(0.7).filled())
            }))
            .context("Failed to draw bins")?;

        chart
            .draw_series(bins.counts.iter().enumerate().map(|(i, &count)| {
                let (lo, hi) = bins.edges(i);
                Rectangle::new([(lo, 0.0), (hi, count as f64)], BLACK.stroke_width(1))
            }))
            .context("Failed to draw bin outlines")?;

        if !curve.is_empty() {
            chart
                .draw_series(LineSeries::new(curve, STEEL_BLUE.stroke_width(2)))
                .context("Failed to draw density curve")?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_bins_default_to_thirty() {
        let chart: HistogramChart = serde_json::from_value(json!({"column": "price"})).unwrap();
        assert_eq!(chart.bins, 30);
        assert!(chart.validate().is_ok());
    }

    #[test]
    fn test_zero_bins_rejected() {
        let chart = HistogramChart {
            column: "price".into(),
            bins: 0,
        };
        assert!(chart.validate().is_err());
    }

    #[test]
    fn test_bin_count_is_capped() {
        let at_cap = HistogramChart {
            column: "price".into(),
            bins: MAX_BINS,
        };
        assert!(at_cap.validate().is_ok());

        let huge: HistogramChart =
            serde_json::from_value(json!({"column": "price", "bins": u64::MAX})).unwrap();
        assert!(huge.validate().is_err());
    }
}
