//! Derives the non-overlapping rendered ring per band: each band's union
//! minus the union of the next-smaller band, smallest band drawn raw.

use std::collections::BTreeMap;

use geo::MultiPolygon;

use crate::geometry;

use super::bands::BandState;

/// The shape actually drawn for one band.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedRing {
    pub band: u32,
    pub geometry: MultiPolygon<f64>,
}

/// Run the derivation over every band, smallest first. Bands with no union
/// contribute nothing and subtract nothing from their successor. A
/// difference over degenerate geometry degrades to the unmodified minuend
/// rather than failing the whole pass.
pub fn compose(bands: &BTreeMap<u32, BandState>) -> Vec<RenderedRing> {
    let mut rings = Vec::new();
    let mut previous: Option<&MultiPolygon<f64>> = None;

    for (&band, state) in bands {
        let current = state.union();
        if let Some(minuend) = current {
            let geometry = match previous {
                None => minuend.clone(),
                Some(subtrahend) => {
                    geometry::difference(minuend, subtrahend).unwrap_or_else(|| {
                        tracing::warn!(band, "difference failed on degenerate geometry, drawing band unclipped");
                        minuend.clone()
                    })
                }
            };
            if !geometry.0.is_empty() {
                rings.push(RenderedRing { band, geometry });
            }
        }
        previous = current;
    }

    rings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::OwnerId;
    use crate::geometry::square;

    fn bands_from(entries: Vec<(u32, MultiPolygon<f64>)>) -> BTreeMap<u32, BandState> {
        let mut bands = BTreeMap::new();
        for (band, geometry) in entries {
            bands
                .entry(band)
                .or_insert_with(BandState::default)
                .contribute(OwnerId::Bulk, geometry);
        }
        bands
    }

    #[test]
    fn test_empty_band_map_renders_nothing() {
        assert!(compose(&BTreeMap::new()).is_empty());
    }

    #[test]
    fn test_single_band_renders_raw_union() {
        let bands = bands_from(vec![(5, square(0.0, 0.0, 1.0))]);
        let rings = compose(&bands);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].band, 5);
        assert!((geometry::area(&rings[0].geometry) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_nested_bands_subtract_predecessor() {
        let bands = bands_from(vec![
            (5, square(0.0, 0.0, 1.0)),
            (10, square(0.0, 0.0, 2.0)),
            (15, square(0.0, 0.0, 3.0)),
        ]);
        let rings = compose(&bands);
        assert_eq!(rings.len(), 3);
        assert!((geometry::area(&rings[0].geometry) - 4.0).abs() < 1e-9);
        assert!((geometry::area(&rings[1].geometry) - 12.0).abs() < 1e-9);
        assert!((geometry::area(&rings[2].geometry) - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_emptied_band_does_not_clip_successor() {
        let mut bands = bands_from(vec![
            (5, square(0.0, 0.0, 1.0)),
            (15, square(0.0, 0.0, 3.0)),
        ]);
        // Band 10 exists but was emptied: subtrahend absent, no-op subtract
        bands.insert(10, BandState::default());
        let rings = compose(&bands);
        assert_eq!(rings.len(), 2);
        assert_eq!(rings[1].band, 15);
        assert!((geometry::area(&rings[1].geometry) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_fully_covered_band_is_dropped() {
        // Band 10 entirely inside band 5's union leaves an empty difference
        let bands = bands_from(vec![
            (5, square(0.0, 0.0, 2.0)),
            (10, square(0.0, 0.0, 1.0)),
        ]);
        let rings = compose(&bands);
        assert_eq!(rings.len(), 1);
        assert_eq!(rings[0].band, 5);
    }

    #[test]
    fn test_disjoint_bands_render_unclipped() {
        let bands = bands_from(vec![
            (5, square(0.0, 0.0, 1.0)),
            (10, square(10.0, 0.0, 1.0)),
        ]);
        let rings = compose(&bands);
        assert_eq!(rings.len(), 2);
        assert!((geometry::area(&rings[1].geometry) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_rendered_rings_never_overlap() {
        // Overlapping but non-nested unions: intersection area via
        // inclusion-exclusion must come out ~0 after composition
        let bands = bands_from(vec![
            (5, square(0.0, 0.0, 1.5)),
            (10, square(1.0, 0.0, 1.5)),
            (15, square(2.0, 0.0, 1.5)),
        ]);
        let rings = compose(&bands);
        for i in 0..rings.len() {
            for j in (i + 1)..rings.len() {
                let a = &rings[i].geometry;
                let b = &rings[j].geometry;
                let union = geometry::union(a, b).unwrap();
                let overlap =
                    geometry::area(a) + geometry::area(b) - geometry::area(&union);
                assert!(
                    overlap.abs() < 1e-9,
                    "bands {} and {} overlap by {}",
                    rings[i].band,
                    rings[j].band,
                    overlap
                );
            }
        }
    }
}
