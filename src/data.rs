use crate::types::{Region, RegionSet};
use anyhow::{anyhow, Context, Result};
use geojson::{feature::Id, Feature, GeoJson};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::{debug, info, warn};

pub fn load_regions(path: &Path) -> Result<RegionSet> {
    info!("Loading boundary GeoJSON from {:?}", path);
    let file = File::open(path)
        .with_context(|| format!("Failed to open GeoJSON file: {:?}", path))?;
    let regions = read_regions(BufReader::new(file))
        .with_context(|| format!("Failed to load regions from {:?}", path))?;
    info!("Loaded {} regions", regions.len());
    Ok(regions)
}

pub fn read_regions<R: Read>(reader: R) -> Result<RegionSet> {
    // Parse the GeoJSON. The boundary file is small, so it is loaded whole.
    let geojson = GeoJson::from_reader(reader).context("Failed to parse GeoJSON")?;

    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        _ => return Err(anyhow!("GeoJSON must be a FeatureCollection")),
    };

    let regions = collection
        .features
        .into_iter()
        .enumerate()
        .map(|(index, feature)| region_from_feature(index, feature))
        .collect();

    Ok(RegionSet::new(regions))
}

fn region_from_feature(index: usize, feature: Feature) -> Region {
    let label = match &feature.id {
        Some(Id::String(s)) => s.clone(),
        Some(Id::Number(n)) => n.to_string(),
        None => index.to_string(),
    };

    // Every feature keeps its slot so styles line up with input order,
    // even when its geometry can't be drawn.
    let geometry = match feature.geometry {
        Some(geom) => match geo::Geometry::<f64>::try_from(geom.value) {
            Ok(g) => Some(g),
            Err(e) => {
                warn!("Feature {} has unusable geometry: {}", label, e);
                None
            }
        },
        None => {
            debug!("Feature {} has no geometry", label);
            None
        }
    };

    Region {
        label,
        geometry,
        properties: feature.properties.unwrap_or_default(),
    }
}
