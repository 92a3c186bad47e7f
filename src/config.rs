use crate::color::ColorScheme;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub input: InputConfig,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default = "default_indicators")]
    pub indicators: BTreeMap<String, IndicatorConfig>,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct InputConfig {
    pub geojson: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub width: f64,
    pub height: f64,
    pub center: [f64; 2], // [lon, lat]
    pub neutral_fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub transition_ms: u64,
    pub buckets: usize,
    pub legend_heading: String,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 700.0,
            height: 800.0,
            center: [-77.0369, 38.9072],
            neutral_fill: "#ccc".to_string(),
            stroke: "#fff".to_string(),
            stroke_width: 0.5,
            transition_ms: 500,
            buckets: 7,
            legend_heading: "Percentile".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub scheme: ColorScheme,
    pub title: String,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScrollConfig {
    pub offset: f64,
    // Falls back to the map height when unset
    pub viewport_height: Option<f64>,
    pub steps: Vec<StepConfig>,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            offset: 0.5,
            viewport_height: None,
            steps: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StepConfig {
    pub indicator: Option<String>,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_step_height")]
    pub height: f64,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
        }
    }
}

fn default_step_height() -> f64 {
    600.0
}

/// The four indicators of the municipal open-space story.
pub fn default_indicators() -> BTreeMap<String, IndicatorConfig> {
    [
        ("m5_4_bike_lanes", ColorScheme::Oranges, "Bike Lanes"),
        ("m8_2_parks", ColorScheme::Blues, "Parks"),
        ("m8_1_urban_tree_canopy", ColorScheme::Greens, "Urban Tree Canopy"),
        ("m8_3_trails", ColorScheme::Purples, "Trails"),
    ]
    .into_iter()
    .map(|(id, scheme, title)| {
        (
            id.to_string(),
            IndicatorConfig {
                scheme,
                title: title.to_string(),
            },
        )
    })
    .collect()
}

impl AppConfig {
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_toml_str(&content)?;

        // Relative input/output paths are resolved against the config file
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Ok(config.rebased(base))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "Failed to parse TOML configuration")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let map = &self.map;
        if !(map.width > 0.0 && map.height > 0.0) {
            bail!("map width and height must be positive, got {}x{}", map.width, map.height);
        }
        if map.buckets == 0 {
            bail!("map.buckets must be at least 1");
        }
        if !map.stroke_width.is_finite() || map.stroke_width < 0.0 {
            bail!("map.stroke_width must be a non-negative number");
        }
        if !(0.0..=1.0).contains(&self.scroll.offset) {
            bail!("scroll.offset must lie within [0, 1], got {}", self.scroll.offset);
        }
        if let Some(vh) = self.scroll.viewport_height {
            if !(vh > 0.0) {
                bail!("scroll.viewport_height must be positive, got {}", vh);
            }
        }
        for (i, step) in self.scroll.steps.iter().enumerate() {
            if !(step.height > 0.0) {
                bail!("scroll step {} has non-positive height {}", i, step.height);
            }
        }
        Ok(())
    }

    pub fn viewport_height(&self) -> f64 {
        self.scroll.viewport_height.unwrap_or(self.map.height)
    }

    fn rebased(mut self, base: &Path) -> Self {
        if self.input.geojson.is_relative() {
            self.input.geojson = base.join(&self.input.geojson);
        }
        if self.output.dir.is_relative() {
            self.output.dir = base.join(&self.output.dir);
        }
        self
    }
}
