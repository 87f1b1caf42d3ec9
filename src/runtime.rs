// Render executor: request checks, drawing, persistence.

use crate::canvas::Canvas;
use crate::chart::{Chart, ChartRequest, Labels};
use crate::data::Table;
use crate::error::{Result, VizError};
use crate::normalize::{Normalizer, Payload};
use crate::store::ArtifactStore;
use log::debug;
use std::path::PathBuf;

/// Settings shared by every render in a process.
#[derive(Debug, Clone, Default)]
pub struct RenderDefaults {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl RenderDefaults {
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            width: config.width,
            height: config.height,
        }
    }
}

/// Render `table` as described by `request` and persist the image.
///
/// Returns the absolute path of the new artifact. Any failure leaves the store untouched.
pub fn render_chart(
    request: &ChartRequest,
    table: &Table,
    store: &ArtifactStore,
    defaults: &RenderDefaults,
) -> Result<PathBuf> {
    let png = render_png(request, table, defaults)?;
    store.persist(&png)
}

/// Normalize a raw payload, then render it.
pub fn render_payload(
    request: &ChartRequest,
    payload: impl Into<Payload>,
    store: &ArtifactStore,
    defaults: &RenderDefaults,
) -> Result<PathBuf> {
    let table = Normalizer::default().normalize(&payload.into())?;
    render_chart(request, &table, store, defaults)
}

/// Validate and draw without touching the store.
pub fn render_png(
    request: &ChartRequest,
    table: &Table,
    defaults: &RenderDefaults,
) -> Result<Vec<u8>> {
    let chart = request.chart();
    let labels = check_request(request, table)?;
    let (width, height) = canvas_size(request, chart, defaults);

    debug!(
        "Rendering {} chart: {} rows, {}x{}",
        chart.kind(),
        table.len(),
        width,
        height
    );

    let render_err = |e: anyhow::Error| VizError::Render(format!("{:#}", e));
    let mut canvas = Canvas::new(width, height).map_err(render_err)?;
    canvas.paint(chart, table, &labels).map_err(render_err)?;
    canvas.encode_png().map_err(render_err)
}

fn check_request(request: &ChartRequest, table: &Table) -> Result<Labels> {
    let chart = request.chart();
    let kind = chart.kind().to_string();

    chart.validate().map_err(VizError::InvalidRequest)?;
    let labels = request.labels().ok_or_else(|| {
        VizError::InvalidRequest(format!("{} chart requires a title", kind))
    })?;

    if table.is_empty() {
        return Err(VizError::EmptyTable { kind });
    }
    if let Some(column) = table.first_missing(&chart.columns()) {
        return Err(VizError::MissingColumn {
            column: column.to_string(),
            kind,
        });
    }

    Ok(labels)
}

fn canvas_size(request: &ChartRequest, chart: &dyn Chart, defaults: &RenderDefaults) -> (u32, u32) {
    let (default_w, default_h) = chart.default_size();
    let width = request
        .options
        .width
        .or(defaults.width)
        .unwrap_or(default_w);
    let height = request
        .options
        .height
        .or(defaults.height)
        .unwrap_or(default_h);
    (width, height)
}
