//! Isochrone ring engine.
//!
//! Owns the per-band accumulation state and exposes the command interface
//! the map UI drives: `contribute`, `retract`, `toggle_marker`, `show_all`,
//! `hide_all`, and `rendered_rings` for the renderer to consume. The engine
//! holds no reference to any map or DOM object; it is a plain synchronous
//! state machine owned by the view that created it.

mod bands;
mod compositor;
mod markers;

pub use bands::BandState;
pub use compositor::RenderedRing;
pub use markers::{MarkerKey, SEARCH_RADIUS_M};

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use geo::{Point, Simplify};
use serde_json::Value;

use crate::geometry::{self, PolygonFeature};

/// Who put a polygon into a band: a toggled marker, or the synthetic bulk
/// source used by the show-everything view.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnerId {
    Marker(MarkerKey),
    Bulk,
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerId::Marker(key) => write!(f, "{}", key),
            OwnerId::Bulk => write!(f, "bulk"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Search radius for marker activation, meters.
    pub search_radius_m: f64,
    /// Optional pre-simplification tolerance (map units) applied to each
    /// feature before the bulk union pass.
    pub simplify_tolerance: Option<f64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            search_radius_m: SEARCH_RADIUS_M,
            simplify_tolerance: None,
        }
    }
}

/// Result of toggling a marker.
#[derive(Debug, Clone, PartialEq)]
pub enum ToggleOutcome {
    /// Marker switched on; lists the bands it contributed to, ascending.
    Activated { key: MarkerKey, bands: Vec<u32> },
    /// Marker switched off and its geometry retracted everywhere.
    Deactivated { key: MarkerKey },
    /// Nothing within the search radius; no state changed.
    NothingFound { key: MarkerKey },
}

#[derive(Debug, Clone, Default)]
pub struct IsochroneEngine {
    config: EngineConfig,
    bands: BTreeMap<u32, BandState>,
    /// Bands each active marker has contributed to.
    markers: HashMap<MarkerKey, Vec<u32>>,
    bulk_active: bool,
}

impl IsochroneEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EngineConfig) -> Self {
        IsochroneEngine {
            config,
            ..Self::default()
        }
    }

    /// Add an owner-tagged copy of `feature` to its band, creating the band
    /// state on first use.
    pub fn contribute(&mut self, band: u32, feature: &PolygonFeature, owner: OwnerId) {
        self.bands
            .entry(band)
            .or_default()
            .contribute(owner.clone(), feature.geometry.clone());
        if let OwnerId::Marker(key) = owner {
            let bands = self.markers.entry(key).or_default();
            if !bands.contains(&band) {
                bands.push(band);
            }
        }
    }

    /// Remove everything `owner` contributed to `band`. An emptied band
    /// keeps its state with an absent union.
    pub fn retract(&mut self, band: u32, owner: &OwnerId) {
        if let Some(state) = self.bands.get_mut(&band) {
            state.retract(owner);
        }
        if let OwnerId::Marker(key) = owner {
            if let Some(bands) = self.markers.get_mut(key) {
                bands.retain(|b| *b != band);
                if bands.is_empty() {
                    self.markers.remove(key);
                }
            }
        }
    }

    /// Flip the marker at (`lat`, `lng`). Activation picks the nearest
    /// isochrone group from `features` and contributes one feature per
    /// selected band; deactivation retracts the marker everywhere. While
    /// bulk mode is active any toggle first clears the bulk state, then
    /// activates against a clean slate.
    pub fn toggle_marker(
        &mut self,
        lat: f64,
        lng: f64,
        features: &[PolygonFeature],
    ) -> ToggleOutcome {
        let key = MarkerKey::from_latlng(lat, lng);

        if self.bulk_active {
            self.clear();
        }

        if let Some(bands) = self.markers.get(&key).cloned() {
            let owner = OwnerId::Marker(key);
            for band in bands {
                self.retract(band, &owner);
            }
            return ToggleOutcome::Deactivated { key };
        }

        let location = Point::new(lng, lat);
        let selected = markers::select_for_marker(location, features, self.config.search_radius_m);
        if selected.is_empty() {
            return ToggleOutcome::NothingFound { key };
        }

        let mut bands = Vec::with_capacity(selected.len());
        for feature in selected {
            self.contribute(feature.band, feature, OwnerId::Marker(key));
            bands.push(feature.band);
        }
        bands.sort_unstable();
        ToggleOutcome::Activated { key, bands }
    }

    /// Bulk mode: discard all per-marker state and ingest the entire raw
    /// dataset, one union pass per band, every contribution owned by the
    /// synthetic bulk source.
    pub fn show_all(&mut self, records: &[Value]) {
        self.clear();

        let mut by_band: BTreeMap<u32, Vec<geo::MultiPolygon<f64>>> = BTreeMap::new();
        for record in records {
            let Some(feature) = geometry::adapt_record(record) else {
                continue;
            };
            let geometry = match self.config.simplify_tolerance {
                Some(tolerance) => feature.geometry.simplify(&tolerance),
                None => feature.geometry,
            };
            by_band.entry(feature.band).or_default().push(geometry);
        }

        for (band, geometries) in by_band {
            self.bands
                .entry(band)
                .or_default()
                .populate(OwnerId::Bulk, geometries);
        }
        self.bulk_active = true;
    }

    /// Full reset: drops every band and marker record.
    pub fn hide_all(&mut self) {
        self.clear();
    }

    /// The non-overlapping shapes to draw, one per band with visible area.
    pub fn rendered_rings(&self) -> Vec<RenderedRing> {
        compositor::compose(&self.bands)
    }

    pub fn band_union(&self, band: u32) -> Option<&geo::MultiPolygon<f64>> {
        self.bands.get(&band)?.union()
    }

    /// Bands with state, ascending. Emptied bands are still listed.
    pub fn bands(&self) -> impl Iterator<Item = u32> + '_ {
        self.bands.keys().copied()
    }

    pub fn active_marker_count(&self) -> usize {
        self.markers.len()
    }

    pub fn is_marker_active(&self, lat: f64, lng: f64) -> bool {
        self.markers.contains_key(&MarkerKey::from_latlng(lat, lng))
    }

    pub fn is_bulk_active(&self) -> bool {
        self.bulk_active
    }

    pub fn is_empty(&self) -> bool {
        self.bands.values().all(|state| state.is_empty()) && self.markers.is_empty()
    }

    fn clear(&mut self) {
        self.bands.clear();
        self.markers.clear();
        self.bulk_active = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::square;
    use serde_json::json;

    fn square_record(minutes: u32, lat: f64, lng: f64, half: f64) -> Value {
        json!({
            "aa_mins": minutes,
            "geom": {
                "type": "Polygon",
                "coordinates": [[
                    [lng - half, lat - half],
                    [lng + half, lat - half],
                    [lng + half, lat + half],
                    [lng - half, lat + half],
                    [lng - half, lat - half],
                ]]
            }
        })
    }

    fn feature(band: u32, lat: f64, lng: f64, half: f64) -> PolygonFeature {
        PolygonFeature {
            band,
            geometry: square(lng, lat, half),
        }
    }

    /// One source at (59.0, 10.0) with concentric 5/10/15-minute squares.
    fn nested_dataset() -> Vec<PolygonFeature> {
        vec![
            feature(5, 59.0, 10.0, 0.006),
            feature(10, 59.0, 10.0, 0.012),
            feature(15, 59.0, 10.0, 0.018),
        ]
    }

    #[test]
    fn test_retracting_every_owner_returns_band_to_absent() {
        let mut engine = IsochroneEngine::new();
        let a = OwnerId::Marker(MarkerKey::from_latlng(59.0, 10.0));
        let b = OwnerId::Marker(MarkerKey::from_latlng(59.1, 10.0));
        engine.contribute(5, &feature(5, 59.0, 10.0, 0.006), a.clone());
        engine.contribute(5, &feature(5, 59.1, 10.0, 0.006), b.clone());
        assert!(engine.band_union(5).is_some());
        engine.retract(5, &a);
        engine.retract(5, &b);
        assert!(engine.band_union(5).is_none());
        assert!(engine.is_empty());
    }

    #[test]
    fn test_union_is_order_independent() {
        let features = [
            feature(5, 59.0, 10.0, 0.01),
            feature(5, 59.005, 10.005, 0.01),
            feature(5, 59.01, 9.995, 0.01),
        ];
        let owner = OwnerId::Bulk;

        let mut forward = IsochroneEngine::new();
        for f in &features {
            forward.contribute(5, f, owner.clone());
        }
        let mut reverse = IsochroneEngine::new();
        for f in features.iter().rev() {
            reverse.contribute(5, f, owner.clone());
        }

        let area_forward = geometry::area(forward.band_union(5).unwrap());
        let area_reverse = geometry::area(reverse.band_union(5).unwrap());
        assert!((area_forward - area_reverse).abs() < 1e-9);
    }

    #[test]
    fn test_rendered_rings_do_not_overlap() {
        let mut engine = IsochroneEngine::new();
        let outcome = engine.toggle_marker(59.0, 10.0, &nested_dataset());
        assert!(matches!(outcome, ToggleOutcome::Activated { .. }));

        let rings = engine.rendered_rings();
        assert_eq!(rings.len(), 3);
        for i in 0..rings.len() {
            for j in (i + 1)..rings.len() {
                let a = &rings[i].geometry;
                let b = &rings[j].geometry;
                let union = geometry::union(a, b).unwrap();
                let overlap = geometry::area(a) + geometry::area(b) - geometry::area(&union);
                assert!(overlap.abs() < 1e-9, "overlap {}", overlap);
            }
        }
    }

    #[test]
    fn test_toggle_is_idempotent() {
        let dataset = nested_dataset();
        let mut engine = IsochroneEngine::new();

        for _ in 0..2 {
            let on = engine.toggle_marker(59.0, 10.0, &dataset);
            assert!(matches!(on, ToggleOutcome::Activated { .. }));
            assert!(engine.is_marker_active(59.0, 10.0));

            let off = engine.toggle_marker(59.0, 10.0, &dataset);
            assert!(matches!(off, ToggleOutcome::Deactivated { .. }));
            assert!(engine.is_empty());
            assert!(engine.rendered_rings().is_empty());
        }
    }

    #[test]
    fn test_bulk_then_single_marker_clears_bulk_state() {
        let records = vec![
            square_record(5, 59.0, 10.0, 0.006),
            square_record(5, 59.5, 10.0, 0.006),
        ];
        let dataset = nested_dataset();

        let mut engine = IsochroneEngine::new();
        engine.show_all(&records);
        assert!(engine.is_bulk_active());
        assert!(engine.band_union(5).is_some());

        let outcome = engine.toggle_marker(59.0, 10.0, &dataset);
        assert!(matches!(outcome, ToggleOutcome::Activated { .. }));
        assert!(!engine.is_bulk_active());
        assert_eq!(engine.active_marker_count(), 1);

        // Only the marker's own features remain: band 5 union equals the
        // marker's 5-minute square, not the bulk union of both records
        let expected = geometry::area(&square(10.0, 59.0, 0.006));
        let actual = geometry::area(engine.band_union(5).unwrap());
        assert!((actual - expected).abs() < 1e-9);
    }

    #[test]
    fn test_nested_squares_scenario() {
        let dataset = nested_dataset();
        let mut engine = IsochroneEngine::new();

        let outcome = engine.toggle_marker(59.0, 10.0, &dataset);
        match outcome {
            ToggleOutcome::Activated { bands, .. } => assert_eq!(bands, vec![5, 10, 15]),
            other => panic!("expected activation, got {:?}", other),
        }

        let rings = engine.rendered_rings();
        assert_eq!(rings.len(), 3);
        let area_5 = geometry::area(&square(10.0, 59.0, 0.006));
        let area_10 = geometry::area(&square(10.0, 59.0, 0.012));
        let area_15 = geometry::area(&square(10.0, 59.0, 0.018));
        assert!((geometry::area(&rings[0].geometry) - area_5).abs() < 1e-9);
        assert!((geometry::area(&rings[1].geometry) - (area_10 - area_5)).abs() < 1e-9);
        assert!((geometry::area(&rings[2].geometry) - (area_15 - area_10)).abs() < 1e-9);

        let off = engine.toggle_marker(59.0, 10.0, &dataset);
        assert!(matches!(off, ToggleOutcome::Deactivated { .. }));
        assert!(engine.rendered_rings().is_empty());
    }

    #[test]
    fn test_two_distant_markers_union_and_partial_retract() {
        // ~10 km apart in latitude; each marker only sees its own square
        let dataset = vec![
            feature(5, 59.0, 10.0, 0.01),
            feature(5, 59.09, 10.0, 0.01),
        ];
        let mut engine = IsochroneEngine::new();

        assert!(matches!(
            engine.toggle_marker(59.0, 10.0, &dataset),
            ToggleOutcome::Activated { .. }
        ));
        assert!(matches!(
            engine.toggle_marker(59.09, 10.0, &dataset),
            ToggleOutcome::Activated { .. }
        ));

        let union = engine.band_union(5).unwrap();
        assert_eq!(union.0.len(), 2, "expected two disjoint regions");
        let both = geometry::area(&dataset[0].geometry) + geometry::area(&dataset[1].geometry);
        assert!((geometry::area(union) - both).abs() < 1e-9);

        assert!(matches!(
            engine.toggle_marker(59.0, 10.0, &dataset),
            ToggleOutcome::Deactivated { .. }
        ));
        let remaining = engine.band_union(5).unwrap();
        assert!(
            (geometry::area(remaining) - geometry::area(&dataset[1].geometry)).abs() < 1e-9
        );
    }

    #[test]
    fn test_nothing_found_changes_no_state() {
        let dataset = vec![feature(5, 59.5, 10.0, 0.006)];
        let mut engine = IsochroneEngine::new();
        let outcome = engine.toggle_marker(59.0, 10.0, &dataset);
        assert!(matches!(outcome, ToggleOutcome::NothingFound { .. }));
        assert!(engine.is_empty());
        assert!(!engine.is_marker_active(59.0, 10.0));
    }

    #[test]
    fn test_show_all_drops_malformed_records() {
        let records = vec![
            square_record(5, 59.0, 10.0, 0.006),
            json!({"aa_mins": 5}),
            json!({"geom": {"type": "Point", "coordinates": [10.0, 59.0]}, "aa_mins": 10}),
        ];
        let mut engine = IsochroneEngine::new();
        engine.show_all(&records);
        assert!(engine.band_union(5).is_some());
        assert!(engine.band_union(10).is_none());
    }

    #[test]
    fn test_show_all_with_simplification() {
        let mut engine = IsochroneEngine::with_config(EngineConfig {
            simplify_tolerance: Some(0.0001),
            ..EngineConfig::default()
        });
        engine.show_all(&[square_record(5, 59.0, 10.0, 0.006)]);
        // A square survives simplification unchanged
        let union = engine.band_union(5).unwrap();
        let expected = geometry::area(&square(10.0, 59.0, 0.006));
        assert!((geometry::area(union) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_hide_all_is_full_reset() {
        let dataset = nested_dataset();
        let mut engine = IsochroneEngine::new();
        engine.toggle_marker(59.0, 10.0, &dataset);
        engine.hide_all();
        assert!(engine.is_empty());
        assert_eq!(engine.bands().count(), 0);
        assert!(engine.rendered_rings().is_empty());
    }

    #[test]
    fn test_emptied_band_state_persists_after_retract() {
        let dataset = nested_dataset();
        let mut engine = IsochroneEngine::new();
        engine.toggle_marker(59.0, 10.0, &dataset);
        engine.toggle_marker(59.0, 10.0, &dataset);
        // Toggling off empties the bands but does not drop their state
        let bands: Vec<u32> = engine.bands().collect();
        assert_eq!(bands, vec![5, 10, 15]);
    }
}
