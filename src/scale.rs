use crate::color::Rgb;
use serde::Serialize;

/// Maps a continuous domain onto a fixed set of equal-width color buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizeScale {
    min: f64,
    max: f64,
    range: Vec<Rgb>,
    thresholds: Vec<f64>,
}

impl QuantizeScale {
    /// Builds a scale over the inclusive extent of `values`.
    ///
    /// Returns `None` when `values` holds no finite number or `colors` is
    /// empty; there is no domain to quantize in either case.
    pub fn from_values<I>(values: I, colors: Vec<Rgb>) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let (min, max) = extent(values)?;
        Self::new(min, max, colors)
    }

    pub fn new(min: f64, max: f64, range: Vec<Rgb>) -> Option<Self> {
        if range.is_empty() || !min.is_finite() || !max.is_finite() || min > max {
            return None;
        }
        let n = range.len() - 1;
        let nf = n as f64;
        let thresholds = (0..n)
            .map(|i| {
                let i = i as f64;
                ((i + 1.0) * max - (i - nf) * min) / (nf + 1.0)
            })
            .collect();
        Some(Self {
            min,
            max,
            range,
            thresholds,
        })
    }

    pub fn domain(&self) -> (f64, f64) {
        (self.min, self.max)
    }

    pub fn range(&self) -> &[Rgb] {
        &self.range
    }

    pub fn buckets(&self) -> usize {
        self.range.len()
    }

    /// Bucket index for `v`: the number of thresholds at or below it.
    /// Values beyond the domain land in the first or last bucket.
    pub fn bucket(&self, v: f64) -> usize {
        self.thresholds.partition_point(|&t| t <= v)
    }

    pub fn color_for(&self, v: f64) -> Rgb {
        self.range[self.bucket(v)]
    }
}

/// Inclusive (min, max) over the finite entries of `values`.
pub fn extent<I>(values: I) -> Option<(f64, f64)>
where
    I: IntoIterator<Item = f64>,
{
    values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendRow {
    pub color: Rgb,
    pub lower: f64,
    pub upper: f64,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Legend {
    pub heading: String,
    pub rows: Vec<LegendRow>,
}

impl Legend {
    /// One row per bucket, split evenly over the domain.
    ///
    /// The last row's upper bound is pinned to the domain maximum so that
    /// accumulated floating point error never leaves a gap at the top.
    pub fn from_scale(scale: &QuantizeScale, heading: &str) -> Self {
        let (min, max) = scale.domain();
        let steps = scale.buckets();
        let step = (max - min) / steps as f64;

        let rows = scale
            .range()
            .iter()
            .enumerate()
            .map(|(i, &color)| {
                let lower = min + i as f64 * step;
                let upper = if i == steps - 1 {
                    max
                } else {
                    min + (i + 1) as f64 * step
                };
                LegendRow {
                    color,
                    lower,
                    upper,
                    label: format!("{} – {}", to_fixed_1(lower), to_fixed_1(upper)),
                }
            })
            .collect();

        Self {
            heading: heading.to_string(),
            rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// One decimal place, exact ties rounded away from zero (`0.25` -> `"0.3"`).
///
/// `{:.1}` rounds ties to even, which would print `0.25` as `0.2`.
pub fn to_fixed_1(v: f64) -> String {
    if !v.is_finite() {
        return v.to_string();
    }
    // Exact decimal expansion; an f64 never has more than 1074 fractional digits
    let exact = format!("{:.1074}", v.abs());
    let (int_part, frac) = exact.split_once('.').unwrap_or((exact.as_str(), ""));
    let mut frac_digits = frac.bytes();
    let tenths = frac_digits.next().unwrap_or(b'0');
    let round_up = frac_digits.next().is_some_and(|d| d >= b'5');

    let mut digits: Vec<u8> = int_part.bytes().chain(std::iter::once(tenths)).collect();
    if round_up {
        let mut i = digits.len();
        loop {
            if i == 0 {
                digits.insert(0, b'1');
                break;
            }
            i -= 1;
            if digits[i] == b'9' {
                digits[i] = b'0';
            } else {
                digits[i] += 1;
                break;
            }
        }
    }

    let split = digits.len() - 1;
    let sign = if v < 0.0 { "-" } else { "" };
    format!(
        "{}{}.{}",
        sign,
        String::from_utf8_lossy(&digits[..split]),
        digits[split] as char
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorScheme;

    fn seven() -> Vec<Rgb> {
        ColorScheme::Oranges.quantize(7)
    }

    #[test]
    fn extent_skips_non_finite() {
        assert_eq!(extent([3.0, f64::NAN, -1.0, 8.5]), Some((-1.0, 8.5)));
        assert_eq!(extent([f64::NAN, f64::INFINITY]), None);
        assert_eq!(extent(Vec::<f64>::new()), None);
    }

    #[test]
    fn empty_domain_yields_no_scale() {
        assert!(QuantizeScale::from_values(Vec::<f64>::new(), seven()).is_none());
        assert!(QuantizeScale::from_values([1.0, 2.0], Vec::new()).is_none());
    }

    #[test]
    fn one_through_seven_each_get_their_own_bucket() {
        let scale = QuantizeScale::from_values((1..=7).map(f64::from), seven()).unwrap();
        assert_eq!(scale.domain(), (1.0, 7.0));
        assert_eq!(scale.buckets(), 7);
        let buckets: Vec<usize> = (1..=7).map(|v| scale.bucket(v as f64)).collect();
        assert_eq!(buckets, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(scale.color_for(1.0), seven()[0]);
        assert_eq!(scale.color_for(7.0), seven()[6]);
    }

    #[test]
    fn out_of_domain_values_clamp() {
        let scale = QuantizeScale::new(0.0, 10.0, seven()).unwrap();
        assert_eq!(scale.bucket(-100.0), 0);
        assert_eq!(scale.bucket(1e9), 6);
    }

    #[test]
    fn degenerate_domain_maps_to_last_bucket() {
        let scale = QuantizeScale::from_values([4.0, 4.0], seven()).unwrap();
        assert_eq!(scale.bucket(4.0), 6);
        let legend = Legend::from_scale(&scale, "Percentile");
        assert_eq!(legend.rows.len(), 7);
        assert!(legend.rows.iter().all(|r| r.label == "4.0 – 4.0"));
    }

    #[test]
    fn legend_rows_are_contiguous_and_end_at_max() {
        let scale = QuantizeScale::new(0.1, 97.3, seven()).unwrap();
        let legend = Legend::from_scale(&scale, "Percentile");
        assert_eq!(legend.heading, "Percentile");
        assert_eq!(legend.rows.len(), 7);
        assert_eq!(legend.rows[0].lower, 0.1);
        for pair in legend.rows.windows(2) {
            assert_eq!(pair[0].upper, pair[1].lower);
            assert!(pair[0].lower < pair[0].upper);
        }
        assert_eq!(legend.rows[6].upper, 97.3);
        let colors: Vec<Rgb> = legend.rows.iter().map(|r| r.color).collect();
        assert_eq!(colors, seven());
    }

    #[test]
    fn fixed_point_labels_round_ties_up() {
        assert_eq!(to_fixed_1(0.25), "0.3");
        assert_eq!(to_fixed_1(0.75), "0.8");
        assert_eq!(to_fixed_1(-0.25), "-0.3");
        // 0.35 is stored just below the tie
        assert_eq!(to_fixed_1(0.35), "0.3");
        assert_eq!(to_fixed_1(9.96), "10.0");
        assert_eq!(to_fixed_1(2.0), "2.0");
        assert_eq!(to_fixed_1(0.0), "0.0");
        assert_eq!(to_fixed_1(1234.04), "1234.0");
    }

    #[test]
    fn legend_labels_on_a_quarter_step_domain() {
        let scale = QuantizeScale::new(0.0, 1.75, ColorScheme::Blues.quantize(7)).unwrap();
        let labels: Vec<String> = Legend::from_scale(&scale, "Percentile")
            .rows
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels[0], "0.0 – 0.3");
        assert_eq!(labels[1], "0.3 – 0.5");
        assert_eq!(labels[2], "0.5 – 0.8");
        assert_eq!(labels[6], "1.5 – 1.8");
    }

    #[test]
    fn legend_for_one_through_seven() {
        let scale = QuantizeScale::from_values((1..=7).map(f64::from), seven()).unwrap();
        let labels: Vec<String> = Legend::from_scale(&scale, "Percentile")
            .rows
            .into_iter()
            .map(|r| r.label)
            .collect();
        assert_eq!(labels.first().unwrap(), "1.0 – 1.9");
        assert_eq!(labels.last().unwrap(), "6.1 – 7.0");
        assert_eq!(labels.len(), 7);
    }
}
