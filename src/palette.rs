// Fixed colors and palettes used by the renderers.

use plotters::style::RGBColor;

pub const STEEL_BLUE: RGBColor = RGBColor(70, 130, 180);
pub const GRID_GRAY: RGBColor = RGBColor(220, 220, 220);

/// Qualitative palette for line series (tab10).
const CATEGORY10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Pastel qualitative palette for pie wedges (ColorBrewer Set3).
const SET3: [&str; 12] = [
    "#8dd3c7", "#ffffb3", "#bebada", "#fb8072", "#80b1d3", "#fdb462", "#b3de69", "#fccde5",
    "#d9d9d9", "#bc80bd", "#ccebc5", "#ffed6f",
];

/// Qualitative palette for grouped box plots (ColorBrewer Set2).
const SET2: [&str; 8] = [
    "#66c2a5", "#fc8d62", "#8da0cb", "#e78ac3", "#a6d854", "#ffd92f", "#e5c494", "#b3b3b3",
];

/// Sequential ramp for heatmaps (ColorBrewer YlOrRd, 9 classes).
const YL_OR_RD: [&str; 9] = [
    "#ffffcc", "#ffeda0", "#fed976", "#feb24c", "#fd8d3c", "#fc4e2a", "#e31a1c", "#bd0026",
    "#800026",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualitative {
    Category10,
    Set2,
    Set3,
}

impl Qualitative {
    fn stops(self) -> &'static [&'static str] {
        match self {
            Qualitative::Category10 => &CATEGORY10,
            Qualitative::Set2 => &SET2,
            Qualitative::Set3 => &SET3,
        }
    }

    /// Color for the `idx`-th series, cycling when the palette runs out.
    pub fn pick(self, idx: usize) -> RGBColor {
        let stops = self.stops();
        parse_hex_color(stops[idx % stops.len()]).unwrap_or(STEEL_BLUE)
    }

    pub fn take(self, n: usize) -> Vec<RGBColor> {
        (0..n).map(|i| self.pick(i)).collect()
    }
}

/// Map `t` in `[0, 1]` onto the YlOrRd ramp with linear interpolation between stops.
pub fn yl_or_rd(t: f64) -> RGBColor {
    let stops: Vec<RGBColor> = YL_OR_RD.iter().filter_map(|h| parse_hex_color(h)).collect();
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
    let scaled = t * (stops.len() - 1) as f64;
    let lo = scaled.floor() as usize;
    let hi = (lo + 1).min(stops.len() - 1);
    let w = scaled - lo as f64;

    let lerp = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * w).round() as u8;
    RGBColor(
        lerp(stops[lo].0, stops[hi].0),
        lerp(stops[lo].1, stops[hi].1),
        lerp(stops[lo].2, stops[hi].2),
    )
}

/// Black or white, whichever reads better on `bg`.
pub fn contrast_text(bg: RGBColor) -> RGBColor {
    let luma = 0.299 * bg.0 as f64 + 0.587 * bg.1 as f64 + 0.114 * bg.2 as f64;
    if luma > 140.0 {
        RGBColor(0, 0, 0)
    } else {
        RGBColor(255, 255, 255)
    }
}

/// Parse hex color (#RRGGBB or #RGB)
pub fn parse_hex_color(hex: &str) -> Option<RGBColor> {
    let hex = hex.trim().trim_start_matches('#');
    match hex.len() {
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(RGBColor(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()? * 17;
            Some(RGBColor(r, g, b))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#4682b4"), Some(STEEL_BLUE));
        assert_eq!(parse_hex_color("#fff"), Some(RGBColor(255, 255, 255)));
        assert_eq!(parse_hex_color("#12"), None);
    }

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(yl_or_rd(0.0), RGBColor(0xff, 0xff, 0xcc));
        assert_eq!(yl_or_rd(1.0), RGBColor(0x80, 0x00, 0x26));
        assert_eq!(yl_or_rd(f64::NAN), yl_or_rd(0.0));
    }

    #[test]
    fn test_qualitative_cycles() {
        assert_eq!(Qualitative::Set2.pick(0), Qualitative::Set2.pick(8));
        assert_eq!(Qualitative::Set3.take(3).len(), 3);
    }

    #[test]
    fn test_contrast_text() {
        assert_eq!(contrast_text(RGBColor(255, 255, 204)), RGBColor(0, 0, 0));
        assert_eq!(contrast_text(RGBColor(128, 0, 38)), RGBColor(255, 255, 255));
    }
}
