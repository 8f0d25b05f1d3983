use crate::model::*;

use super::Engine;

/// How a candidate location relates to the unit being placed. Ordered by
/// match quality: same SKU beats similar SKU beats an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    Same,
    Similar,
    Empty,
}

impl MatchKind {
    pub fn rationale(self) -> Rationale {
        match self {
            MatchKind::Same => Rationale::SameSkuMatch,
            MatchKind::Similar => Rationale::SimilarSkuMatch,
            MatchKind::Empty => Rationale::EmptyFifoSlot,
        }
    }
}

/// Snapshot of one candidate location at resolve time. Reads are not assumed
/// fresh — the commit path re-validates under the location's write lock.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub location_id: LocationId,
    pub match_kind: MatchKind,
    /// Mode-aware remaining capacity at snapshot time.
    pub available: u32,
    pub distinct_skus: usize,
    /// Oldest receipt of the unit's own SKU at this location, if held.
    pub sku_oldest: Option<Ms>,
    /// Oldest receipt across all occupants.
    pub stock_oldest: Option<Ms>,
}

impl Engine {
    /// Candidate locations by product affinity: same-SKU holders with room,
    /// oldest stock first; otherwise holders of similar SKUs, preferring
    /// less-mixed and older locations; otherwise empty (the caller falls
    /// back to empty slots).
    pub(super) async fn affinity_candidates(&self, unit: &Unit) -> Vec<Candidate> {
        let mut same = self.holders_of(&unit.sku, unit, MatchKind::Same).await;
        if !same.is_empty() {
            same.sort_by(|a, b| {
                a.sku_oldest
                    .cmp(&b.sku_oldest)
                    .then_with(|| a.location_id.cmp(&b.location_id))
            });
            return same;
        }

        let mut merged: Vec<Candidate> = Vec::new();
        for similar_sku in self.similarity.similar_to(&unit.sku) {
            for candidate in self.holders_of(&similar_sku, unit, MatchKind::Similar).await {
                if !merged.iter().any(|c| c.location_id == candidate.location_id) {
                    merged.push(candidate);
                }
            }
        }
        merged.sort_by(|a, b| {
            a.distinct_skus
                .cmp(&b.distinct_skus)
                .then_with(|| a.stock_oldest.cmp(&b.stock_oldest))
                .then_with(|| a.location_id.cmp(&b.location_id))
        });
        merged
    }

    /// Unoccupied, non-blocked locations with room for the unit.
    pub(super) async fn empty_candidates(&self, unit: &Unit) -> Vec<Candidate> {
        let slots: Vec<super::SharedLocationState> =
            self.locations.iter().map(|e| e.value().clone()).collect();

        let mut candidates = Vec::new();
        for slot in slots {
            let guard = slot.read().await;
            if !guard.is_unoccupied() {
                continue;
            }
            if let Some(candidate) = snapshot(&guard, unit, MatchKind::Empty, self.config.capacity_mode) {
                candidates.push(candidate);
            }
        }
        candidates.sort_by(|a, b| a.location_id.cmp(&b.location_id));
        candidates
    }

    /// Locations currently holding `holder_sku` that can also take the unit.
    async fn holders_of(&self, holder_sku: &Sku, unit: &Unit, kind: MatchKind) -> Vec<Candidate> {
        let ids: Vec<LocationId> = match self.sku_index.get(holder_sku) {
            Some(entry) => entry.value().iter().cloned().collect(),
            None => return Vec::new(),
        };

        let mut candidates = Vec::new();
        for id in ids {
            let Some(slot) = self.location(&id) else { continue };
            let guard = slot.read().await;
            if let Some(candidate) = snapshot(&guard, unit, kind, self.config.capacity_mode) {
                candidates.push(candidate);
            }
        }
        candidates
    }
}

/// Capture a candidate row from a locked location, or `None` when the
/// location is blocked or cannot take the unit.
fn snapshot(
    state: &LocationState,
    unit: &Unit,
    kind: MatchKind,
    mode: CapacityMode,
) -> Option<Candidate> {
    if state.status == LocationStatus::Blocked {
        return None;
    }
    if !state.fits(&unit.sku, unit.quantity, mode) {
        return None;
    }
    Some(Candidate {
        location_id: state.id.clone(),
        match_kind: kind,
        available: state.available_capacity(mode),
        distinct_skus: state.distinct_skus(),
        sku_oldest: state.lot(&unit.sku).map(|lot| lot.oldest_receipt),
        stock_oldest: state.stock_oldest(),
    })
}
