//! Chart renderers.
//!
//! Every renderer implements [`Chart`]: it names the columns its selectors reference,
//! and draws a table onto a drawing area supplied by the [`Canvas`](crate::canvas::Canvas).
//! Column presence and row count are checked by the runtime before `draw` is called,
//! so renderers only fail on value-level problems (non-numeric cells and the like).

mod bar;
mod boxplot;
mod heatmap;
mod histogram;
mod line;
mod pie;
mod scatter;

pub use bar::{BarChart, Orientation};
pub use boxplot::BoxChart;
pub use heatmap::HeatmapChart;
pub use histogram::{HistogramChart, MAX_BINS};
pub use line::LineChart;
pub use pie::PieChart;
pub use scatter::ScatterChart;

use crate::data::{Scalar, Table};
use anyhow::{anyhow, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Bar,
    Line,
    Pie,
    Heatmap,
    Scatter,
    Histogram,
    Box,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
            ChartKind::Heatmap => "heatmap",
            ChartKind::Scatter => "scatter",
            ChartKind::Histogram => "histogram",
            ChartKind::Box => "box",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved text for one render: title plus optional axis overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Labels {
    pub title: String,
    pub x: Option<String>,
    pub y: Option<String>,
}

impl Labels {
    pub fn x_or(&self, default: &str) -> String {
        self.x.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn y_or(&self, default: &str) -> String {
        self.y.clone().unwrap_or_else(|| default.to_string())
    }
}

/// Shared renderer contract.
pub trait Chart {
    fn kind(&self) -> ChartKind;

    /// Every column named by this chart's selectors.
    fn columns(&self) -> Vec<&str>;

    /// Canvas size used when neither the request nor the config sets one.
    fn default_size(&self) -> (u32, u32);

    /// Title used when the request leaves it empty. Only some kinds have one.
    fn default_title(&self) -> Option<String> {
        None
    }

    /// Selector-level checks that need no data.
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChartSpec {
    Bar(BarChart),
    Line(LineChart),
    Pie(PieChart),
    Heatmap(HeatmapChart),
    Scatter(ScatterChart),
    Histogram(HistogramChart),
    Box(BoxChart),
}

impl ChartSpec {
    pub fn as_chart(&self) -> &dyn Chart {
        match self {
            ChartSpec::Bar(c) => c,
            ChartSpec::Line(c) => c,
            ChartSpec::Pie(c) => c,
            ChartSpec::Heatmap(c) => c,
            ChartSpec::Scatter(c) => c,
            ChartSpec::Histogram(c) => c,
            ChartSpec::Box(c) => c,
        }
    }
}

/// Display options shared by every kind. Empty strings count as "not supplied".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartOptions {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub x_label: Option<String>,
    #[serde(default)]
    pub y_label: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
}

/// One rendering invocation: kind-specific selectors plus display options.
#[derive(Debug, Clone)]
pub struct ChartRequest {
    pub spec: ChartSpec,
    pub options: ChartOptions,
}

impl ChartRequest {
    pub fn new(spec: ChartSpec, title: impl Into<String>) -> Self {
        Self {
            spec,
            options: ChartOptions {
                title: title.into(),
                ..ChartOptions::default()
            },
        }
    }

    pub fn with_labels(mut self, x_label: Option<&str>, y_label: Option<&str>) -> Self {
        self.options.x_label = x_label.map(str::to_string);
        self.options.y_label = y_label.map(str::to_string);
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.options.width = Some(width);
        self.options.height = Some(height);
        self
    }

    pub fn chart(&self) -> &dyn Chart {
        self.spec.as_chart()
    }

    /// Resolve title and axis labels; `None` if no title is available.
    pub fn labels(&self) -> Option<Labels> {
        let title = non_empty(Some(&self.options.title))
            .or_else(|| self.chart().default_title())?;
        Some(Labels {
            title,
            x: non_empty(self.options.x_label.as_ref()),
            y: non_empty(self.options.y_label.as_ref()),
        })
    }
}

/// Requests arrive as one flat JSON object: `{"kind": "bar", "x_column": ..., "title": ...}`.
impl<'de> Deserialize<'de> for ChartRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        let spec = ChartSpec::deserialize(&value).map_err(D::Error::custom)?;
        let options = ChartOptions::deserialize(&value).map_err(D::Error::custom)?;
        Ok(Self { spec, options })
    }
}

fn non_empty(s: Option<&String>) -> Option<String> {
    s.map(|s| s.trim()).filter(|s| !s.is_empty()).map(str::to_string)
}

pub(crate) fn title_style() -> TextStyle<'static> {
    ("sans-serif", 26).into_font().style(FontStyle::Bold).into()
}

pub(crate) fn text_style(size: i32) -> TextStyle<'static> {
    ("sans-serif", size).into_font().into()
}

/// Numeric cells of a column; null or non-numeric cells are an error naming the row.
pub(crate) fn numeric_values(table: &Table, column: &str) -> Result<Vec<f64>> {
    table
        .values(column)
        .enumerate()
        .map(|(row_idx, cell)| parse_number(cell, column, row_idx))
        .collect()
}

/// Numeric cells of a column with nulls dropped; non-numeric text is still an error.
pub(crate) fn numeric_values_skip_null(table: &Table, column: &str) -> Result<Vec<f64>> {
    table
        .values(column)
        .enumerate()
        .filter(|(_, cell)| !cell.is_null())
        .map(|(row_idx, cell)| parse_number(cell, column, row_idx))
        .collect()
}

fn parse_number(cell: &Scalar, column: &str, row_idx: usize) -> Result<f64> {
    cell.as_f64().ok_or_else(|| {
        anyhow!(
            "Failed to parse '{}' as number in column '{}' at row {}",
            cell,
            column,
            row_idx + 1
        )
    })
}

pub(crate) fn label_values(table: &Table, column: &str) -> Vec<String> {
    table.values(column).map(|c| c.to_string()).collect()
}

/// X positions of a line or scatter chart: numeric when every cell is a number,
/// otherwise categorical by row position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum XValues {
    Numeric(Vec<f64>),
    Categorical(Vec<String>),
}

impl XValues {
    pub(crate) fn from_column(table: &Table, column: &str) -> Self {
        let numeric: Option<Vec<f64>> = table
            .values(column)
            .map(|cell| match cell {
                Scalar::Timestamp(_) => None,
                other => other.as_f64(),
            })
            .collect();
        match numeric {
            Some(values) => XValues::Numeric(values),
            None => XValues::Categorical(label_values(table, column)),
        }
    }

    pub(crate) fn positions(&self) -> Vec<f64> {
        match self {
            XValues::Numeric(v) => v.clone(),
            XValues::Categorical(labels) => (0..labels.len()).map(|i| i as f64).collect(),
        }
    }

    pub(crate) fn range(&self) -> Range<f64> {
        match self {
            XValues::Numeric(v) => {
                let (lo, hi) = crate::stats::extent(v).unwrap_or((0.0, 1.0));
                let (lo, hi) = crate::stats::pad_range(lo, hi);
                lo..hi
            }
            XValues::Categorical(labels) => category_range(labels.len()),
        }
    }

    pub(crate) fn categories(&self) -> Option<&[String]> {
        match self {
            XValues::Numeric(_) => None,
            XValues::Categorical(labels) => Some(labels.as_slice()),
        }
    }
}

/// Axis range that centers `n` categories on integer positions.
pub(crate) fn category_range(n: usize) -> Range<f64> {
    -0.5..(n.max(1) as f64 - 0.5)
}

/// Tick label for a categorical axis; only integer positions carry a label.
pub(crate) fn category_label(categories: &[String], pos: f64) -> String {
    let idx = pos.round();
    if (pos - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    categories.get(idx as usize).cloned().unwrap_or_default()
}

/// Whole-number formatting with thousands separators, e.g. `-1,234,567`.
pub(crate) fn format_thousands(v: f64) -> String {
    let rounded = v.round();
    let digits = format!("{}", rounded.abs() as u64);
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if rounded < 0.0 {
        out.insert(0, '-');
    }
    out
}

/// Value axis range that always contains zero, with headroom for annotations.
pub(crate) fn zero_based_range(values: &[f64]) -> Range<f64> {
    let (min, max) = crate::stats::extent(values).unwrap_or((0.0, 1.0));
    let lo = min.min(0.0);
    let hi = max.max(0.0);
    let span = if hi - lo == 0.0 { 1.0 } else { hi - lo };
    let lo = if lo < 0.0 { lo - span * 0.1 } else { lo };
    (lo)..(hi + span * 0.1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use serde_json::json;

    #[test]
    fn test_request_from_flat_json() {
        let request: ChartRequest = serde_json::from_value(json!({
            "kind": "bar",
            "x_column": "category",
            "y_column": "revenue",
            "orientation": "h",
            "title": "Revenue",
            "x_label": ""
        }))
        .unwrap();

        assert_eq!(request.chart().kind(), ChartKind::Bar);
        assert_eq!(request.chart().columns(), vec!["category", "revenue"]);
        let labels = request.labels().unwrap();
        assert_eq!(labels.title, "Revenue");
        assert_eq!(labels.x, None);
        match request.spec {
            ChartSpec::Bar(bar) => assert_eq!(bar.orientation, Orientation::Horizontal),
            other => panic!("unexpected spec {other:?}"),
        }
    }

    #[test]
    fn test_request_unknown_kind_rejected() {
        let result: std::result::Result<ChartRequest, _> =
            serde_json::from_value(json!({"kind": "funnel", "title": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_labels_require_title() {
        let request = ChartRequest::new(
            ChartSpec::Scatter(ScatterChart {
                x_column: "a".into(),
                y_column: "b".into(),
            }),
            "   ",
        );
        assert!(request.labels().is_none());
    }

    #[test]
    fn test_box_has_default_title() {
        let request = ChartRequest::new(
            ChartSpec::Box(BoxChart {
                value_column: "price".into(),
                category_column: Some("state".into()),
            }),
            "",
        );
        assert_eq!(
            request.labels().unwrap().title,
            "Distribution of price by state"
        );
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234.0), "1,234");
        assert_eq!(format_thousands(-1234567.0), "-1,234,567");
    }

    #[test]
    fn test_category_label() {
        let cats = vec!["A".to_string(), "B".to_string()];
        assert_eq!(category_label(&cats, 1.0), "B");
        assert_eq!(category_label(&cats, 0.5), "");
        assert_eq!(category_label(&cats, 2.0), "");
        assert_eq!(category_label(&cats, -1.0), "");
    }

    #[test]
    fn test_x_values_detects_categorical() {
        let table = normalize(json!([{"m": "Jan"}, {"m": "Feb"}])).unwrap();
        let xs = XValues::from_column(&table, "m");
        assert_eq!(xs.positions(), vec![0.0, 1.0]);
        assert_eq!(xs.categories().unwrap(), &["Jan".to_string(), "Feb".to_string()]);

        let table = normalize(json!([{"m": 3}, {"m": "4"}])).unwrap();
        assert_eq!(
            XValues::from_column(&table, "m"),
            XValues::Numeric(vec![3.0, 4.0])
        );
    }

    #[test]
    fn test_numeric_values_reports_row() {
        let table = normalize(json!([{"v": 1}, {"v": "oops"}])).unwrap();
        let err = numeric_values(&table, "v").unwrap_err().to_string();
        assert!(err.contains("'oops'"));
        assert!(err.contains("row 2"));

        let table = normalize(json!([{"v": 1}, {"v": null}])).unwrap();
        assert!(numeric_values(&table, "v").is_err());
        assert_eq!(numeric_values_skip_null(&table, "v").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_zero_based_range() {
        let r = zero_based_range(&[10.0, 50.0]);
        assert_eq!(r.start, 0.0);
        assert!(r.end > 50.0);
        let r = zero_based_range(&[-5.0, 5.0]);
        assert!(r.start < -5.0);
    }
}
