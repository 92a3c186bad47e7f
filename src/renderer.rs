use crate::color::{ColorScheme, Rgb};
use crate::config::{IndicatorConfig, MapConfig};
use crate::projection::{PathBuilder, Projection};
use crate::scale::{Legend, QuantizeScale};
use crate::types::RegionSet;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// What a narrative step asks the map to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "indicator", rename_all = "snake_case")]
pub enum Action {
    Reset,
    ShowIndicator(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TitleState {
    pub text: String,
    pub visible: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegionStyle {
    pub fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f64,
}

/// Everything on screen after one step: region styles, legend and title.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub indicator: Option<String>,
    pub title: TitleState,
    pub legend: Option<Legend>,
    pub domain: Option<(f64, f64)>,
    pub transition_ms: u64,
    pub regions: Vec<RegionStyle>,
}

/// Resolved drawing settings, colors parsed once.
#[derive(Debug, Clone)]
pub struct Style {
    pub neutral_fill: Rgb,
    pub stroke: Rgb,
    pub stroke_width: f64,
    pub transition_ms: u64,
    pub buckets: usize,
    pub legend_heading: String,
}

impl Style {
    pub fn from_config(map: &MapConfig) -> Result<Self> {
        Ok(Self {
            neutral_fill: Rgb::from_hex(&map.neutral_fill).context("Invalid map.neutral_fill")?,
            stroke: Rgb::from_hex(&map.stroke).context("Invalid map.stroke")?,
            stroke_width: map.stroke_width,
            transition_ms: map.transition_ms,
            buckets: map.buckets,
            legend_heading: map.legend_heading.clone(),
        })
    }
}

/// Indicator id to color family and display title. Fixed for the session.
#[derive(Debug, Clone, Default)]
pub struct IndicatorRegistry {
    entries: BTreeMap<String, IndicatorConfig>,
}

impl IndicatorRegistry {
    pub fn new(entries: BTreeMap<String, IndicatorConfig>) -> Self {
        Self { entries }
    }

    pub fn get(&self, id: &str) -> Option<&IndicatorConfig> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

pub struct ChoroplethRenderer {
    style: Style,
    registry: IndicatorRegistry,
    regions: RegionSet,
    width: f64,
    height: f64,
    paths: Vec<String>,
}

impl ChoroplethRenderer {
    /// Fits the projection to the regions and precomputes their outlines.
    pub fn new(map: &MapConfig, registry: IndicatorRegistry, regions: RegionSet) -> Result<Self> {
        let style = Style::from_config(map)?;

        let mut projection = Projection::mercator(map.center);
        projection.fit_size(map.width, map.height, &regions);
        debug!(
            "Projection fitted: scale {:.1}, translate {:?}",
            projection.scale(),
            projection.translate()
        );

        let builder = PathBuilder::new(projection);
        let paths = regions
            .iter()
            .map(|r| r.geometry.as_ref().map(|g| builder.build(g)).unwrap_or_default())
            .collect();

        Ok(Self {
            style,
            registry,
            regions,
            width: map.width,
            height: map.height,
            paths,
        })
    }

    pub fn registry(&self) -> &IndicatorRegistry {
        &self.registry
    }

    pub fn regions(&self) -> &RegionSet {
        &self.regions
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn dispatch(&self, action: &Action) -> ViewState {
        match action {
            Action::Reset => self.reset(),
            Action::ShowIndicator(id) => self.show_indicator(id),
        }
    }

    /// Neutral fill everywhere, no legend, title hidden.
    pub fn reset(&self) -> ViewState {
        ViewState {
            indicator: None,
            title: TitleState {
                text: String::new(),
                visible: false,
            },
            legend: None,
            domain: None,
            transition_ms: self.style.transition_ms,
            regions: self.neutral_regions(),
        }
    }

    pub fn show_indicator(&self, id: &str) -> ViewState {
        let Some(indicator) = self.registry.get(id) else {
            warn!("Unknown indicator {:?}, showing the neutral map", id);
            return ViewState {
                indicator: Some(id.to_string()),
                ..self.reset()
            };
        };

        let values = self.regions.values(id);
        let scale = self.scale_for(indicator.scheme, &values);
        let title = TitleState {
            text: indicator.title.clone(),
            visible: true,
        };

        let Some(scale) = scale else {
            warn!("Indicator {:?} has no numeric values", id);
            return ViewState {
                indicator: Some(id.to_string()),
                title,
                ..self.reset()
            };
        };

        let regions = values
            .iter()
            .map(|v| RegionStyle {
                fill: v.map_or(self.style.neutral_fill, |v| scale.color_for(v)),
                stroke: self.style.stroke,
                stroke_width: self.style.stroke_width,
            })
            .collect();

        debug!(
            "Indicator {:?}: domain {:?} over {} buckets",
            id,
            scale.domain(),
            scale.buckets()
        );

        ViewState {
            indicator: Some(id.to_string()),
            title,
            legend: Some(Legend::from_scale(&scale, &self.style.legend_heading)),
            domain: Some(scale.domain()),
            transition_ms: self.style.transition_ms,
            regions,
        }
    }

    /// The quantized scale an indicator would use, if it has any numeric data.
    pub fn scale_for(&self, scheme: ColorScheme, values: &[Option<f64>]) -> Option<QuantizeScale> {
        QuantizeScale::from_values(
            values.iter().flatten().copied(),
            scheme.quantize(self.style.buckets),
        )
    }

    fn neutral_regions(&self) -> Vec<RegionStyle> {
        vec![
            RegionStyle {
                fill: self.style.neutral_fill,
                stroke: self.style.stroke,
                stroke_width: self.style.stroke_width,
            };
            self.regions.len()
        ]
    }
}
