// Library exports for vizbridge

pub mod canvas;
pub mod chart;
pub mod config;
pub mod data;
pub mod embed;
pub mod error;
pub mod literal;
pub mod normalize;
pub mod palette;
pub mod runtime;
pub mod stats;
pub mod store;

pub use chart::{ChartKind, ChartRequest, ChartSpec};
pub use config::Config;
pub use data::{Record, Scalar, Table};
pub use embed::{extract, render_reply, VizReference};
pub use error::{Result, VizError};
pub use normalize::{normalize, Normalizer, Payload};
pub use runtime::{render_chart, render_payload, RenderDefaults};
pub use store::ArtifactStore;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "png")]
    #[default]
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Png => "png",
        }
    }
}
