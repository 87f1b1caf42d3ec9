use crate::chart::{Chart, Labels};
use crate::data::Table;
use anyhow::{Context, Result};
use image::ImageEncoder;
use plotters::prelude::*;

/// Largest accepted canvas edge in pixels.
pub const MAX_DIMENSION: u32 = 8000;

/// In-memory RGB raster that a single chart is painted onto.
///
/// The pixel buffer is owned by the canvas and released when it is dropped,
/// whether or not painting succeeded.
pub struct Canvas {
    buffer: Vec<u8>,
    width: u32,
    height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            anyhow::bail!("Canvas size must be positive, got {}x{}", width, height);
        }
        if width > MAX_DIMENSION || height > MAX_DIMENSION {
            anyhow::bail!(
                "Canvas size {}x{} exceeds the {}px limit",
                width,
                height,
                MAX_DIMENSION
            );
        }

        Ok(Canvas {
            buffer: vec![0u8; (width as usize) * (height as usize) * 3],
            width,
            height,
        })
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Fill the background and let `chart` draw itself.
    pub fn paint(&mut self, chart: &dyn Chart, table: &Table, labels: &Labels) -> Result<()> {
        let root = BitMapBackend::with_buffer(&mut self.buffer, (self.width, self.height))
            .into_drawing_area();

        root.fill(&WHITE).context("Failed to fill background")?;
        chart
            .draw(table, labels, &root)
            .with_context(|| format!("Failed to draw {} chart", chart.kind()))?;
        root.present().context("Failed to present drawing")?;

        Ok(())
    }

    /// Encode the canvas as PNG bytes.
    pub fn encode_png(self) -> Result<Vec<u8>> {
        let mut png_bytes = Vec::new();
        {
            let encoder = image::codecs::png::PngEncoder::new(&mut png_bytes);
            encoder
                .write_image(
                    &self.buffer,
                    self.width,
                    self.height,
                    image::ColorType::Rgb8,
                )
                .context("Failed to encode PNG")?;
        }

        Ok(png_bytes)
    }
}
