use geo::Geometry;
use serde_json::{Map, Value};

#[derive(Debug, Clone)]
pub struct Region {
    pub label: String,
    // None when the feature carried no geometry; such regions draw nothing
    pub geometry: Option<Geometry<f64>>,
    pub properties: Map<String, Value>,
}

impl Region {
    /// Numeric value of `indicator` for this region.
    ///
    /// JSON numbers and strings holding a finite number count as numeric.
    /// Missing keys, `null`, booleans, nested values and anything non-finite
    /// are treated as "no data".
    pub fn value(&self, indicator: &str) -> Option<f64> {
        let v = match self.properties.get(indicator)? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        v.is_finite().then_some(v)
    }
}

/// The boundary feature collection, in file order. Immutable once loaded.
#[derive(Debug, Clone, Default)]
pub struct RegionSet {
    pub regions: Vec<Region>,
}

impl RegionSet {
    pub fn new(regions: Vec<Region>) -> Self {
        Self { regions }
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Region> {
        self.regions.iter()
    }

    /// One entry per region, `None` where the indicator has no numeric value.
    pub fn values(&self, indicator: &str) -> Vec<Option<f64>> {
        self.regions.iter().map(|r| r.value(indicator)).collect()
    }
}

#[cfg(test)]
pub(crate) fn region_with(label: &str, props: Value) -> Region {
    let properties = match props {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    Region {
        label: label.to_string(),
        geometry: None,
        properties,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_values_and_numeric_strings_are_read() {
        let r = region_with("a", json!({ "x": 4.5, "y": " 12 ", "z": 3 }));
        assert_eq!(r.value("x"), Some(4.5));
        assert_eq!(r.value("y"), Some(12.0));
        assert_eq!(r.value("z"), Some(3.0));
    }

    #[test]
    fn missing_and_non_numeric_values_are_none() {
        let r = region_with(
            "a",
            json!({ "n": null, "s": "NaN", "t": "abc", "b": true, "o": { "v": 1 } }),
        );
        for key in ["n", "s", "t", "b", "o", "absent"] {
            assert_eq!(r.value(key), None, "key {key}");
        }
    }
}
