//! Marker identity and the nearest-isochrone selection heuristic.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use geo::{Distance, Haversine, Point};

use crate::geometry::{self, PolygonFeature, CANONICAL_BANDS};

/// How far from a marker we look for candidate isochrones, in meters.
pub const SEARCH_RADIUS_M: f64 = 3000.0;

/// Grouping tolerance floor and factor: candidates within
/// `max(500 m, 0.5 × closest)` of the marker are treated as one source.
const GROUP_TOLERANCE_FLOOR_M: f64 = 500.0;
const GROUP_TOLERANCE_FACTOR: f64 = 0.5;

/// The fallback path returns at most this many bands.
const MAX_FALLBACK_BANDS: usize = 3;

/// Stable marker identity derived from the rounded coordinate pair, so
/// repeated clicks at the same location resolve to the same source even
/// when the marker objects were rebuilt in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerKey {
    lat_e4: i64,
    lng_e4: i64,
}

impl MarkerKey {
    pub fn from_latlng(lat: f64, lng: f64) -> Self {
        MarkerKey {
            lat_e4: (lat * 10_000.0).round() as i64,
            lng_e4: (lng * 10_000.0).round() as i64,
        }
    }
}

impl fmt::Display for MarkerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lat_e4, self.lng_e4)
    }
}

struct Candidate<'a> {
    feature: &'a PolygonFeature,
    distance: f64,
}

/// Pick the isochrone features belonging to the marker at `location`
/// (x = lng, y = lat).
///
/// Candidates are features whose approximate center lies within
/// `radius_m`. If at least two candidates fall inside the dynamic
/// tolerance of the closest one, the closest feature per distinct band in
/// that group is taken. Otherwise the closest feature per band over all
/// candidates, preferring the canonical band set and capped at three
/// bands. Empty when nothing is in range.
pub fn select_for_marker<'a>(
    location: Point<f64>,
    features: &'a [PolygonFeature],
    radius_m: f64,
) -> Vec<&'a PolygonFeature> {
    let mut candidates: Vec<Candidate<'a>> = features
        .iter()
        .filter_map(|feature| {
            let center = geometry::approx_center(&feature.geometry)?;
            let distance = Haversine::distance(location, center);
            (distance <= radius_m).then_some(Candidate { feature, distance })
        })
        .collect();

    if candidates.is_empty() {
        return Vec::new();
    }

    candidates.sort_by(|a, b| a.distance.partial_cmp(&b.distance).unwrap_or(Ordering::Equal));
    let closest = candidates[0].distance;
    let tolerance = (closest * GROUP_TOLERANCE_FACTOR).max(GROUP_TOLERANCE_FLOOR_M);

    let nearby: Vec<&Candidate<'a>> = candidates
        .iter()
        .filter(|c| c.distance <= tolerance)
        .collect();

    if nearby.len() >= 2 {
        return closest_per_band(nearby.into_iter())
            .into_values()
            .map(|c| c.feature)
            .collect();
    }

    // No coherent group near the marker: take the closest feature per band
    // over everything in range, canonical bands first.
    let mut per_band = closest_per_band(candidates.iter());
    let mut selected = Vec::new();
    for band in CANONICAL_BANDS {
        if let Some(candidate) = per_band.remove(&band) {
            selected.push(candidate.feature);
        }
    }
    for candidate in per_band.into_values() {
        if selected.len() >= MAX_FALLBACK_BANDS {
            break;
        }
        selected.push(candidate.feature);
    }
    selected
}

fn closest_per_band<'a, 'b>(
    candidates: impl Iterator<Item = &'b Candidate<'a>>,
) -> BTreeMap<u32, &'b Candidate<'a>>
where
    'a: 'b,
{
    let mut per_band: BTreeMap<u32, &Candidate<'a>> = BTreeMap::new();
    for candidate in candidates {
        per_band
            .entry(candidate.feature.band)
            .and_modify(|best| {
                if candidate.distance < best.distance {
                    *best = candidate;
                }
            })
            .or_insert(candidate);
    }
    per_band
}
