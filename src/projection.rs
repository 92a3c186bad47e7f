use crate::types::RegionSet;
use geo::{Coord, CoordsIter, Geometry, LineString, Polygon};
use std::f64::consts::FRAC_PI_4;
use std::fmt::Write;

// Mercator is unbounded at the poles; clamp to the usual web map limit
const MAX_LATITUDE: f64 = 85.051_128_779_806_6;
const POINT_RADIUS: f64 = 4.5;

/// Spherical Mercator centred on a fixed lon/lat, in screen pixels (y down).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projection {
    center: [f64; 2],
    scale: f64,
    translate: [f64; 2],
}

impl Projection {
    pub fn mercator(center: [f64; 2]) -> Self {
        Self {
            center,
            scale: 1.0,
            translate: [0.0, 0.0],
        }
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn translate(&self) -> [f64; 2] {
        self.translate
    }

    fn raw(lon: f64, lat: f64) -> (f64, f64) {
        let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE).to_radians();
        (lon.to_radians(), (FRAC_PI_4 + lat / 2.0).tan().ln())
    }

    /// Projects a lon/lat pair (degrees) to screen coordinates.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = Self::raw(lon, lat);
        let (cx, cy) = Self::raw(self.center[0], self.center[1]);
        (
            self.translate[0] + self.scale * (x - cx),
            self.translate[1] - self.scale * (y - cy),
        )
    }

    /// Chooses scale and translate so that every region's geometry fills a
    /// `width` x `height` viewport, centred, preserving aspect ratio.
    ///
    /// Leaves the projection untouched when there is nothing to fit.
    pub fn fit_size(&mut self, width: f64, height: f64, regions: &RegionSet) {
        let unit = Self::mercator(self.center);
        let mut bounds: Option<(f64, f64, f64, f64)> = None;
        for geometry in regions.iter().filter_map(|r| r.geometry.as_ref()) {
            for c in geometry.coords_iter() {
                let (x, y) = unit.project(c.x, c.y);
                if !x.is_finite() || !y.is_finite() {
                    continue;
                }
                bounds = Some(match bounds {
                    None => (x, y, x, y),
                    Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
                });
            }
        }
        let Some((x0, y0, x1, y1)) = bounds else {
            return;
        };

        let (dx, dy) = (x1 - x0, y1 - y0);
        let k = match (dx > 0.0, dy > 0.0) {
            (true, true) => (width / dx).min(height / dy),
            (true, false) => width / dx,
            (false, true) => height / dy,
            // A single point: keep the unit scale and just centre it
            (false, false) => 1.0,
        };
        self.scale = k;
        self.translate = [
            (width - k * (x1 + x0)) / 2.0,
            (height - k * (y1 + y0)) / 2.0,
        ];
    }
}

/// Turns geometries into SVG path data through a projection.
#[derive(Debug, Clone)]
pub struct PathBuilder {
    projection: Projection,
}

impl PathBuilder {
    pub fn new(projection: Projection) -> Self {
        Self { projection }
    }

    /// SVG `d` attribute for `geometry`; empty when there is nothing to draw.
    pub fn build(&self, geometry: &Geometry<f64>) -> String {
        let mut d = String::new();
        self.push_geometry(&mut d, geometry);
        d
    }

    fn push_geometry(&self, d: &mut String, geometry: &Geometry<f64>) {
        match geometry {
            Geometry::Point(p) => self.push_point(d, p.0),
            Geometry::MultiPoint(mp) => mp.iter().for_each(|p| self.push_point(d, p.0)),
            Geometry::Line(l) => self.push_line(d, &[l.start, l.end], false),
            Geometry::LineString(ls) => self.push_line(d, &ls.0, false),
            Geometry::MultiLineString(mls) => {
                mls.iter().for_each(|ls| self.push_line(d, &ls.0, false))
            }
            Geometry::Polygon(p) => self.push_polygon(d, p),
            Geometry::MultiPolygon(mp) => mp.iter().for_each(|p| self.push_polygon(d, p)),
            Geometry::Rect(r) => self.push_polygon(d, &r.to_polygon()),
            Geometry::Triangle(t) => self.push_polygon(d, &t.to_polygon()),
            Geometry::GeometryCollection(gc) => {
                gc.iter().for_each(|g| self.push_geometry(d, g))
            }
        }
    }

    fn push_polygon(&self, d: &mut String, polygon: &Polygon<f64>) {
        self.push_ring(d, polygon.exterior());
        polygon.interiors().iter().for_each(|ring| self.push_ring(d, ring));
    }

    fn push_ring(&self, d: &mut String, ring: &LineString<f64>) {
        let coords = &ring.0;
        // Closed rings repeat their first coordinate; `Z` already closes them
        let open = match coords.split_last() {
            Some((last, rest)) if !rest.is_empty() && rest[0] == *last => rest,
            _ => coords.as_slice(),
        };
        self.push_line(d, open, true);
    }

    fn push_line(&self, d: &mut String, coords: &[Coord<f64>], close: bool) {
        if coords.is_empty() {
            return;
        }
        for (i, c) in coords.iter().enumerate() {
            let (x, y) = self.projection.project(c.x, c.y);
            let cmd = if i == 0 { 'M' } else { 'L' };
            let _ = write!(d, "{}{},{}", cmd, num(x), num(y));
        }
        if close {
            d.push('Z');
        }
    }

    fn push_point(&self, d: &mut String, c: Coord<f64>) {
        let (x, y) = self.projection.project(c.x, c.y);
        let r = num(POINT_RADIUS);
        let _ = write!(
            d,
            "M{},{}m0,{r}a{r},{r} 0 1,1 0,{}a{r},{r} 0 1,1 0,{}z",
            num(x),
            num(y),
            num(-2.0 * POINT_RADIUS),
            num(2.0 * POINT_RADIUS),
        );
    }
}

/// Three decimal places, trailing zeros dropped.
fn num(v: f64) -> String {
    let rounded = (v * 1000.0).round() / 1000.0;
    // avoid printing "-0"
    if rounded == 0.0 {
        "0".to_string()
    } else {
        rounded.to_string()
    }
}
