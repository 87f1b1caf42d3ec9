use super::{label_values, numeric_values, text_style, title_style, Chart, ChartKind, Labels};
use crate::data::Table;
use crate::palette::Qualitative;
use anyhow::{bail, Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use serde::Deserialize;
use std::f64::consts::PI;

/// Proportional wedges, one per row, labelled with name and share.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PieChart {
    pub values_column: String,
    pub names_column: String,
}

const START_ANGLE: f64 = PI / 2.0;
const ARC_STEPS_PER_TURN: f64 = 360.0;

impl Chart for PieChart {
    fn kind(&self) -> ChartKind {
        ChartKind::Pie
    }

    fn columns(&self) -> Vec<&str> {
        vec![self.values_column.as_str(), self.names_column.as_str()]
    }

    fn default_size(&self) -> (u32, u32) {
        (1000, 800)
    }

    fn draw(
        &self,
        table: &Table,
        labels: &Labels,
        root: &DrawingArea<BitMapBackend<'_>, Shift>,
    ) -> Result<()> {
        let values = numeric_values(table, &self.values_column)?;
        let names = label_values(table, &self.names_column);

        if let Some(v) = values.iter().find(|v| **v < 0.0) {
            bail!(
                "Pie values must be non-negative, found {} in column '{}'",
                v,
                self.values_column
            );
        }
        let total: f64 = values.iter().sum();
        if total <= 0.0 {
            bail!("Pie values in column '{}' sum to zero", self.values_column);
        }

        let area = root
            .titled(&labels.title, title_style())
            .context("Failed to draw title")?;
        let (w, h) = area.dim_in_pixel();
        let center = (w as f64 / 2.0, h as f64 / 2.0);
        let radius = (w.min(h) as f64) * 0.35;
        let colors = Qualitative::Set3.take(values.len());

        let point_at = |angle: f64, r: f64| -> (i32, i32) {
            (
                (center.0 + r * angle.cos()).round() as i32,
                // Pixel rows grow downward.
                (center.1 - r * angle.sin()).round() as i32,
            )
        };

        let mut angle = START_ANGLE;
        for ((value, name), color) in values.iter().zip(&names).zip(&colors) {
            let share = value / total;
            let sweep = share * 2.0 * PI;
            if sweep <= 0.0 {
                continue;
            }

            let steps = ((sweep / (2.0 * PI)) * ARC_STEPS_PER_TURN).ceil().max(2.0) as usize;
            let mut outline = Vec::with_capacity(steps + 2);
            outline.push(point_at(0.0, 0.0));
            for step in 0..=steps {
                outline.push(point_at(angle + sweep * step as f64 / steps as f64, radius));
            }

            area.draw(&Polygon::new(outline.clone(), color.filled()))
                .context("Failed to draw wedge")?;
            outline.push(point_at(0.0, 0.0));
            area.draw(&PathElement::new(outline, WHITE.stroke_width(2)))
                .context("Failed to draw wedge outline")?;

            let mid = angle + sweep / 2.0;
            let name_anchor = if mid.cos() >= 0.0 {
                HPos::Left
            } else {
                HPos::Right
            };
            area.draw(&Text::new(
                name.clone(),
                point_at(mid, radius * 1.12),
                text_style(16).pos(Pos::new(name_anchor, VPos::Center)),
            ))
            .context("Failed to draw wedge label")?;

            area.draw(&Text::new(
                format!("{:.1}%", share * 100.0),
                point_at(mid, radius * 0.6),
                text_style(14)
                    .color(&WHITE)
                    .pos(Pos::new(HPos::Center, VPos::Center)),
            ))
            .context("Failed to draw wedge percentage")?;

            angle += sweep;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::Canvas;
    use crate::normalize::normalize;
    use serde_json::json;

    fn chart() -> PieChart {
        PieChart {
            values_column: "count".into(),
            names_column: "status".into(),
        }
    }

    fn labels() -> Labels {
        Labels {
            title: "Orders".into(),
            x: None,
            y: None,
        }
    }

    #[test]
    fn test_negative_value_rejected() {
        let table = normalize(json!([
            {"status": "ok", "count": 3},
            {"status": "bad", "count": -1}
        ]))
        .unwrap();
        let mut canvas = Canvas::new(200, 200).unwrap();
        let err = canvas.paint(&chart(), &table, &labels()).unwrap_err();
        assert!(format!("{:#}", err).contains("non-negative"));
    }

    #[test]
    fn test_zero_total_rejected() {
        let table = normalize(json!([{"status": "ok", "count": 0}])).unwrap();
        let mut canvas = Canvas::new(200, 200).unwrap();
        assert!(canvas.paint(&chart(), &table, &labels()).is_err());
    }
}
