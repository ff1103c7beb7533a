//! Geometry adapter: normalizes heterogeneous isochrone records into
//! canonical polygon features, and wraps the polygon boolean operations the
//! ring engine is built on.
//!
//! Records arrive in whatever shape the upstream query produced: a row with
//! a bare GeoJSON geometry under `geom` or `GEOM` and a minutes-like field
//! beside it, or a full GeoJSON Feature with the minutes in `properties`.
//! Anything without usable polygon geometry and a positive band value is
//! dropped, never an error.

use geo::{Area, BooleanOps, MultiPolygon, Point, Polygon};
use serde_json::Value;

/// Walking-time bands the dataset is built around, smallest first.
pub const CANONICAL_BANDS: [u32; 3] = [5, 10, 15];

/// Candidate names for the band-minutes field, probed in order.
const BAND_FIELDS: [&str; 5] = ["aa_mins", "minutes", "walkingTime", "time", "mins"];

/// A normalized isochrone polygon: geometry plus its walking-time band.
/// Derived geometries (unions, differences) are always new values.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub band: u32,
    pub geometry: MultiPolygon<f64>,
}

/// Normalize one raw record. Returns `None` when the record lacks polygon
/// geometry or a positive band value.
pub fn adapt_record(record: &Value) -> Option<PolygonFeature> {
    let band = band_minutes(record)?;
    let geometry = parse_geometry(raw_geometry(record)?)?;
    if !is_usable(&geometry) {
        return None;
    }
    Some(PolygonFeature { band, geometry })
}

/// Locate the geometry object inside a record: `geom`, `GEOM`, or the
/// `geometry` of a GeoJSON Feature.
fn raw_geometry(record: &Value) -> Option<&Value> {
    record
        .get("geom")
        .or_else(|| record.get("GEOM"))
        .or_else(|| {
            (record.get("type")? == "Feature")
                .then(|| record.get("geometry"))
                .flatten()
        })
}

/// First positive number found under a known band field, on the record
/// itself or in a Feature's `properties`. Numeric strings count.
fn band_minutes(record: &Value) -> Option<u32> {
    for holder in [Some(record), record.get("properties")].into_iter().flatten() {
        for field in BAND_FIELDS {
            if let Some(minutes) = holder.get(field).and_then(positive_minutes) {
                return Some(minutes);
            }
        }
    }
    None
}

fn positive_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (minutes > 0.0).then_some(minutes as u32)
}

/// Parse a GeoJSON geometry value into a multipolygon. Non-areal geometry
/// types yield `None`.
pub fn parse_geometry(value: &Value) -> Option<MultiPolygon<f64>> {
    let geometry: geojson::Geometry = serde_json::from_value(value.clone()).ok()?;
    match geometry.value {
        geojson::Value::Polygon(_) => Polygon::<f64>::try_from(geometry.value)
            .ok()
            .map(|polygon| MultiPolygon(vec![polygon])),
        geojson::Value::MultiPolygon(_) => MultiPolygon::<f64>::try_from(geometry.value).ok(),
        _ => None,
    }
}

/// Whether a multipolygon is safe to hand to the boolean-op library:
/// non-empty, every ring closed with at least four coordinates, all
/// coordinates finite.
pub fn is_usable(geometry: &MultiPolygon<f64>) -> bool {
    if geometry.0.is_empty() {
        return false;
    }
    geometry.0.iter().all(|polygon| {
        std::iter::once(polygon.exterior())
            .chain(polygon.interiors())
            .all(|ring| ring.0.len() >= 4 && ring.0.iter().all(|c| c.x.is_finite() && c.y.is_finite()))
    })
}

/// Approximate center: the vertex average of the first polygon's exterior
/// ring. This is what the marker-selection heuristic was tuned against, so
/// it is deliberately not a true centroid.
pub fn approx_center(geometry: &MultiPolygon<f64>) -> Option<Point<f64>> {
    let ring = geometry.0.first()?.exterior();
    if ring.0.is_empty() {
        return None;
    }
    let (mut x, mut y) = (0.0, 0.0);
    for coord in &ring.0 {
        x += coord.x;
        y += coord.y;
    }
    let count = ring.0.len() as f64;
    Some(Point::new(x / count, y / count))
}

/// Union of two multipolygons, or `None` when either operand is degenerate.
/// Callers fall back to the unaffected operand.
pub fn union(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    (is_usable(a) && is_usable(b)).then(|| a.union(b))
}

/// `a` minus `b`, or `None` when either operand is degenerate. Callers fall
/// back to the unmodified minuend.
pub fn difference(a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Option<MultiPolygon<f64>> {
    (is_usable(a) && is_usable(b)).then(|| a.difference(b))
}

/// Unsigned area in squared map units.
pub fn area(geometry: &MultiPolygon<f64>) -> f64 {
    geometry.unsigned_area()
}

/// Test helper shared across the engine test modules: axis-aligned square
/// around (`cx`, `cy`) with the given half-size.
#[cfg(test)]
pub(crate) fn square(cx: f64, cy: f64, half: f64) -> MultiPolygon<f64> {
    let ring = vec![
        [cx - half, cy - half],
        [cx + half, cy - half],
        [cx + half, cy + half],
        [cx - half, cy + half],
        [cx - half, cy - half],
    ];
    parse_geometry(&serde_json::json!({"type": "Polygon", "coordinates": [ring]})).unwrap()
}
