//! Per-band accumulation: owner-tagged contributions and the cached union.

use geo::MultiPolygon;

use crate::geometry;

use super::OwnerId;

#[derive(Debug, Clone)]
pub(crate) struct Contribution {
    pub owner: OwnerId,
    pub geometry: MultiPolygon<f64>,
}

/// State for one walking-time band: every contributed polygon tagged with
/// its owner, and the union of all of them. The union is `None` while the
/// band has no contributors.
#[derive(Debug, Clone, Default)]
pub struct BandState {
    contributions: Vec<Contribution>,
    union: Option<MultiPolygon<f64>>,
}

impl BandState {
    /// Append an owner-tagged copy of a feature and recompute the union.
    pub fn contribute(&mut self, owner: OwnerId, geometry: MultiPolygon<f64>) {
        self.contributions.push(Contribution { owner, geometry });
        self.recompute();
    }

    /// Replace the whole contributor list, all owned by `owner`, with a
    /// single union pass. Used by bulk ingestion.
    pub fn populate(&mut self, owner: OwnerId, geometries: Vec<MultiPolygon<f64>>) {
        self.contributions = geometries
            .into_iter()
            .map(|geometry| Contribution {
                owner: owner.clone(),
                geometry,
            })
            .collect();
        self.recompute();
    }

    /// Remove every contribution tagged with `owner` and recompute.
    /// Returns whether anything was removed. An emptied band keeps its
    /// state; the union just becomes absent.
    pub fn retract(&mut self, owner: &OwnerId) -> bool {
        let before = self.contributions.len();
        self.contributions.retain(|c| c.owner != *owner);
        if self.contributions.len() == before {
            return false;
        }
        self.recompute();
        true
    }

    pub fn union(&self) -> Option<&MultiPolygon<f64>> {
        self.union.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.contributions.is_empty()
    }

    pub fn contributor_count(&self) -> usize {
        self.contributions.len()
    }

    pub fn owners(&self) -> impl Iterator<Item = &OwnerId> {
        self.contributions.iter().map(|c| &c.owner)
    }

    /// Fold all contributions through the union operator. A degenerate
    /// contribution is skipped so one bad polygon cannot take down the
    /// band; the skip is logged and the accumulated result stands.
    fn recompute(&mut self) {
        let mut accumulated: Option<MultiPolygon<f64>> = None;
        for contribution in &self.contributions {
            accumulated = match accumulated {
                None => {
                    if geometry::is_usable(&contribution.geometry) {
                        Some(contribution.geometry.clone())
                    } else {
                        tracing::warn!(owner = %contribution.owner, "skipping degenerate geometry in band union");
                        None
                    }
                }
                Some(current) => match geometry::union(&current, &contribution.geometry) {
                    Some(unioned) => Some(unioned),
                    None => {
                        tracing::warn!(owner = %contribution.owner, "skipping degenerate geometry in band union");
                        Some(current)
                    }
                },
            };
        }
        self.union = accumulated;
    }
}
