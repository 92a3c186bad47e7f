use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// An opaque sRGB color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parses `#rgb` or `#rrggbb` (leading `#` optional).
    pub fn from_hex(hex: &str) -> Result<Self> {
        let digits = hex.trim().trim_start_matches('#');
        let channel = |s: &str| {
            u8::from_str_radix(s, 16).map_err(|_| anyhow!("Invalid hex color: {:?}", hex))
        };
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(anyhow!("Invalid hex color: {:?}", hex));
        }
        match digits.len() {
            3 => {
                let expand = |i: usize| channel(digits[i..=i].repeat(2).as_str());
                Ok(Self::new(expand(0)?, expand(1)?, expand(2)?))
            }
            6 => Ok(Self::new(
                channel(&digits[0..2])?,
                channel(&digits[2..4])?,
                channel(&digits[4..6])?,
            )),
            _ => Err(anyhow!("Invalid hex color: {:?}", hex)),
        }
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Rgb {
    /// CSS functional notation, e.g. `rgb(253, 141, 60)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Sequential single-hue color families (ColorBrewer, 9 classes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorScheme {
    Oranges,
    Blues,
    Greens,
    Purples,
    Reds,
    Greys,
}

const ORANGES: [Rgb; 9] = [
    Rgb::new(0xff, 0xf5, 0xeb),
    Rgb::new(0xfe, 0xe6, 0xce),
    Rgb::new(0xfd, 0xd0, 0xa2),
    Rgb::new(0xfd, 0xae, 0x6b),
    Rgb::new(0xfd, 0x8d, 0x3c),
    Rgb::new(0xf1, 0x69, 0x13),
    Rgb::new(0xd9, 0x48, 0x01),
    Rgb::new(0xa6, 0x36, 0x03),
    Rgb::new(0x7f, 0x27, 0x04),
];

const BLUES: [Rgb; 9] = [
    Rgb::new(0xf7, 0xfb, 0xff),
    Rgb::new(0xde, 0xeb, 0xf7),
    Rgb::new(0xc6, 0xdb, 0xef),
    Rgb::new(0x9e, 0xca, 0xe1),
    Rgb::new(0x6b, 0xae, 0xd6),
    Rgb::new(0x42, 0x92, 0xc6),
    Rgb::new(0x21, 0x71, 0xb5),
    Rgb::new(0x08, 0x51, 0x9c),
    Rgb::new(0x08, 0x30, 0x6b),
];

const GREENS: [Rgb; 9] = [
    Rgb::new(0xf7, 0xfc, 0xf5),
    Rgb::new(0xe5, 0xf5, 0xe0),
    Rgb::new(0xc7, 0xe9, 0xc0),
    Rgb::new(0xa1, 0xd9, 0x9b),
    Rgb::new(0x74, 0xc4, 0x76),
    Rgb::new(0x41, 0xab, 0x5d),
    Rgb::new(0x23, 0x8b, 0x45),
    Rgb::new(0x00, 0x6d, 0x2c),
    Rgb::new(0x00, 0x44, 0x1b),
];

const PURPLES: [Rgb; 9] = [
    Rgb::new(0xfc, 0xfb, 0xfd),
    Rgb::new(0xef, 0xed, 0xf5),
    Rgb::new(0xda, 0xda, 0xeb),
    Rgb::new(0xbc, 0xbd, 0xdc),
    Rgb::new(0x9e, 0x9a, 0xc8),
    Rgb::new(0x80, 0x7d, 0xba),
    Rgb::new(0x6a, 0x51, 0xa3),
    Rgb::new(0x54, 0x27, 0x8f),
    Rgb::new(0x3f, 0x00, 0x7d),
];

const REDS: [Rgb; 9] = [
    Rgb::new(0xff, 0xf5, 0xf0),
    Rgb::new(0xfe, 0xe0, 0xd2),
    Rgb::new(0xfc, 0xbb, 0xa1),
    Rgb::new(0xfc, 0x92, 0x72),
    Rgb::new(0xfb, 0x6a, 0x4a),
    Rgb::new(0xef, 0x3b, 0x2c),
    Rgb::new(0xcb, 0x18, 0x1d),
    Rgb::new(0xa5, 0x0f, 0x15),
    Rgb::new(0x67, 0x00, 0x0d),
];

const GREYS: [Rgb; 9] = [
    Rgb::new(0xff, 0xff, 0xff),
    Rgb::new(0xf0, 0xf0, 0xf0),
    Rgb::new(0xd9, 0xd9, 0xd9),
    Rgb::new(0xbd, 0xbd, 0xbd),
    Rgb::new(0x96, 0x96, 0x96),
    Rgb::new(0x73, 0x73, 0x73),
    Rgb::new(0x52, 0x52, 0x52),
    Rgb::new(0x25, 0x25, 0x25),
    Rgb::new(0x00, 0x00, 0x00),
];

impl ColorScheme {
    pub fn anchors(self) -> &'static [Rgb; 9] {
        match self {
            ColorScheme::Oranges => &ORANGES,
            ColorScheme::Blues => &BLUES,
            ColorScheme::Greens => &GREENS,
            ColorScheme::Purples => &PURPLES,
            ColorScheme::Reds => &REDS,
            ColorScheme::Greys => &GREYS,
        }
    }

    /// Continuous ramp through the anchors, `t` in [0, 1].
    ///
    /// Each channel follows a uniform cubic B-spline through the anchor
    /// values, so the ramp is smooth but only passes exactly through the
    /// first and last anchors.
    pub fn interpolate(self, t: f64) -> Rgb {
        let anchors = self.anchors();
        let channel = |pick: fn(&Rgb) -> u8| {
            let values: Vec<f64> = anchors.iter().map(|c| pick(c) as f64).collect();
            to_channel(basis_spline(&values, t))
        };
        Rgb::new(channel(|c| c.r), channel(|c| c.g), channel(|c| c.b))
    }

    /// `n` colors sampled evenly along the ramp, lightest first.
    pub fn quantize(self, n: usize) -> Vec<Rgb> {
        match n {
            0 => Vec::new(),
            1 => vec![self.interpolate(0.0)],
            _ => (0..n)
                .map(|i| self.interpolate(i as f64 / (n - 1) as f64))
                .collect(),
        }
    }
}

fn basis(t1: f64, v0: f64, v1: f64, v2: f64, v3: f64) -> f64 {
    let t2 = t1 * t1;
    let t3 = t2 * t1;
    ((1.0 - 3.0 * t1 + 3.0 * t2 - t3) * v0
        + (4.0 - 6.0 * t2 + 3.0 * t3) * v1
        + (1.0 + 3.0 * t1 + 3.0 * t2 - 3.0 * t3) * v2
        + t3 * v3)
        / 6.0
}

fn basis_spline(values: &[f64], t: f64) -> f64 {
    let n = values.len() - 1;
    let (t, i) = if !(t > 0.0) {
        (0.0, 0)
    } else if t >= 1.0 {
        (1.0, n - 1)
    } else {
        (t, (t * n as f64).floor() as usize)
    };
    let v1 = values[i];
    let v2 = values[i + 1];
    // Phantom end points mirror the neighbouring segment
    let v0 = if i > 0 { values[i - 1] } else { 2.0 * v1 - v2 };
    let v3 = if i < n - 1 { values[i + 2] } else { 2.0 * v2 - v1 };
    basis((t - i as f64 / n as f64) * n as f64, v0, v1, v2, v3)
}

fn to_channel(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ColorScheme; 6] = [
        ColorScheme::Oranges,
        ColorScheme::Blues,
        ColorScheme::Greens,
        ColorScheme::Purples,
        ColorScheme::Reds,
        ColorScheme::Greys,
    ];

    #[test]
    fn hex_parsing() {
        assert_eq!(Rgb::from_hex("#ccc").unwrap(), Rgb::new(0xcc, 0xcc, 0xcc));
        assert_eq!(Rgb::from_hex("fd8d3c").unwrap(), Rgb::new(0xfd, 0x8d, 0x3c));
        assert!(Rgb::from_hex("#12").is_err());
        assert!(Rgb::from_hex("#zzzzzz").is_err());
        assert_eq!(Rgb::new(1, 2, 255).to_hex(), "#0102ff");
        assert_eq!(Rgb::new(253, 141, 60).to_string(), "rgb(253, 141, 60)");
    }

    #[test]
    fn ramp_ends_hit_first_and_last_anchor() {
        for scheme in ALL {
            let anchors = scheme.anchors();
            assert_eq!(scheme.interpolate(0.0), anchors[0], "{scheme:?}");
            assert_eq!(scheme.interpolate(1.0), anchors[8], "{scheme:?}");
            // out of range clamps
            assert_eq!(scheme.interpolate(-3.0), anchors[0]);
            assert_eq!(scheme.interpolate(7.0), anchors[8]);
            assert_eq!(scheme.interpolate(f64::NAN), anchors[0]);
        }
    }

    #[test]
    fn quantize_returns_requested_count_in_ramp_order() {
        for scheme in ALL {
            let colors = scheme.quantize(7);
            assert_eq!(colors.len(), 7);
            assert_eq!(colors[0], scheme.interpolate(0.0));
            assert_eq!(colors[6], scheme.interpolate(1.0));
            for (i, c) in colors.iter().enumerate() {
                assert_eq!(*c, scheme.interpolate(i as f64 / 6.0));
            }
        }
        assert!(ColorScheme::Blues.quantize(0).is_empty());
        assert_eq!(ColorScheme::Blues.quantize(1), vec![BLUES[0]]);
    }

    #[test]
    fn single_hue_ramps_darken_monotonically() {
        for scheme in ALL {
            let colors = scheme.quantize(7);
            let lum: Vec<u32> = colors
                .iter()
                .map(|c| c.r as u32 + c.g as u32 + c.b as u32)
                .collect();
            assert!(lum.windows(2).all(|w| w[0] > w[1]), "{scheme:?}: {lum:?}");
        }
    }
}
