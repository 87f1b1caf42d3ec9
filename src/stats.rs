// Numeric helpers shared by the distribution charts (histogram, box plot).

/// Five-number summary with Tukey fences.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxStats {
    pub lower_whisker: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub upper_whisker: f64,
    pub outliers: Vec<f64>,
}

/// Equal-width histogram bins over `[min, max]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bins {
    pub start: f64,
    pub width: f64,
    pub counts: Vec<usize>,
}

impl Bins {
    pub fn edges(&self, idx: usize) -> (f64, f64) {
        let lo = self.start + idx as f64 * self.width;
        (lo, lo + self.width)
    }

    pub fn max_count(&self) -> usize {
        self.counts.iter().copied().max().unwrap_or(0)
    }
}

/// Linear-interpolated percentile of already sorted data.
pub fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

fn sorted(values: &[f64]) -> Vec<f64> {
    let mut v = values.to_vec();
    v.sort_by(|a, b| a.total_cmp(b));
    v
}

/// Box statistics with whiskers at the most extreme points inside 1.5 IQR.
pub fn box_stats(values: &[f64]) -> Option<BoxStats> {
    if values.is_empty() {
        return None;
    }
    let ys = sorted(values);

    let q1 = percentile(&ys, 0.25);
    let median = percentile(&ys, 0.50);
    let q3 = percentile(&ys, 0.75);
    let iqr = q3 - q1;

    let lower_fence = q1 - 1.5 * iqr;
    let upper_fence = q3 + 1.5 * iqr;

    let lower_whisker = ys.iter().copied().find(|&v| v >= lower_fence).unwrap_or(q1);
    let upper_whisker = ys
        .iter()
        .rev()
        .copied()
        .find(|&v| v <= upper_fence)
        .unwrap_or(q3);

    let outliers = ys
        .iter()
        .copied()
        .filter(|&v| v < lower_fence || v > upper_fence)
        .collect();

    Some(BoxStats {
        lower_whisker,
        q1,
        median,
        q3,
        upper_whisker,
        outliers,
    })
}

/// Count values into `bin_count` equal-width bins. The maximum value lands in the last bin.
pub fn bin(values: &[f64], bin_count: usize) -> Option<Bins> {
    if values.is_empty() || bin_count == 0 {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let (start, width) = if max == min {
        (min - 0.5, 1.0 / bin_count as f64)
    } else {
        (min, (max - min) / bin_count as f64)
    };

    let mut counts = vec![0usize; bin_count];
    for &v in values {
        let idx = (((v - start) / width).floor() as usize).min(bin_count - 1);
        counts[idx] += 1;
    }

    Some(Bins {
        start,
        width,
        counts,
    })
}

/// Silverman's rule of thumb for bandwidth selection
pub fn silverman_bandwidth(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    if n < 2.0 {
        return 1.0;
    }

    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let std_dev = variance.sqrt();

    let ys = sorted(data);
    let iqr = percentile(&ys, 0.75) - percentile(&ys, 0.25);

    // h = 0.9 * min(std, IQR/1.34) * n^(-1/5)
    let scale = if iqr > 0.0 { std_dev.min(iqr / 1.34) } else { std_dev };
    if scale <= 0.0 {
        return 1.0;
    }
    0.9 * scale * n.powf(-0.2)
}

fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

/// Gaussian KDE evaluated on `points` evenly spaced positions across `[lo, hi]`.
/// Returns (x, density) pairs; the density integrates to 1 over the real line.
pub fn kde(data: &[f64], lo: f64, hi: f64, points: usize) -> Vec<(f64, f64)> {
    if data.is_empty() || points < 2 || hi <= lo {
        return Vec::new();
    }
    let bandwidth = silverman_bandwidth(data);
    let n = data.len() as f64;
    let step = (hi - lo) / (points - 1) as f64;

    (0..points)
        .map(|i| {
            let x = lo + i as f64 * step;
            let d = data
                .iter()
                .map(|&xi| gaussian_kernel((x - xi) / bandwidth))
                .sum::<f64>()
                / (n * bandwidth);
            (x, d)
        })
        .collect()
}

/// Pad a data range by 5% on both ends; degenerate ranges grow by 1.
pub fn pad_range(min: f64, max: f64) -> (f64, f64) {
    if min == max {
        (min - 1.0, max + 1.0)
    } else {
        let padding = (max - min) * 0.05;
        (min - padding, max + padding)
    }
}

/// Min and max of a slice, `None` when empty.
pub fn extent(values: &[f64]) -> Option<(f64, f64)> {
    if values.is_empty() {
        return None;
    }
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentile_interpolates() {
        let data = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&data, 0.0), 1.0);
        assert_eq!(percentile(&data, 1.0), 4.0);
        assert_eq!(percentile(&data, 0.5), 2.5);
    }

    #[test]
    fn test_box_stats_flags_outliers() {
        let stats = box_stats(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stats.median, 3.5);
        assert_eq!(stats.outliers, vec![100.0]);
        assert_eq!(stats.upper_whisker, 5.0);
        assert_eq!(stats.lower_whisker, 1.0);
    }

    #[test]
    fn test_box_stats_empty() {
        assert!(box_stats(&[]).is_none());
    }

    #[test]
    fn test_bin_counts_every_value() {
        let values: Vec<f64> = (0..100).map(|v| v as f64).collect();
        let bins = bin(&values, 10).unwrap();
        assert_eq!(bins.counts.len(), 10);
        assert_eq!(bins.counts.iter().sum::<usize>(), 100);
        assert_eq!(bins.counts[9], 10);
    }

    #[test]
    fn test_bin_constant_values() {
        let bins = bin(&[5.0, 5.0, 5.0], 30).unwrap();
        assert_eq!(bins.counts.iter().sum::<usize>(), 3);
        assert_eq!(bins.max_count(), 3);
    }

    #[test]
    fn test_kde_is_a_density() {
        let data = [0.0, 1.0, 2.0, 3.0, 4.0];
        let curve = kde(&data, -20.0, 24.0, 2000);
        let step = curve[1].0 - curve[0].0;
        let area: f64 = curve.iter().map(|(_, d)| d * step).sum();
        assert!((area - 1.0).abs() < 0.01, "area was {}", area);
    }

    #[test]
    fn test_pad_range() {
        assert_eq!(pad_range(5.0, 5.0), (4.0, 6.0));
        let (lo, hi) = pad_range(0.0, 10.0);
        assert!(lo < 0.0 && hi > 10.0);
    }
}
