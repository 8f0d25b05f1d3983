use crate::model::*;

use super::{Engine, PlaceError, SharedLocationState};

impl Engine {
    pub fn location_count(&self) -> usize {
        self.locations.len()
    }

    /// Mode-aware remaining capacity of one location.
    pub async fn available_capacity(&self, id: &LocationId) -> Result<u32, PlaceError> {
        let slot = self
            .location(id)
            .ok_or_else(|| PlaceError::NotFound(id.clone()))?;
        let guard = slot.read().await;
        Ok(guard.available_capacity(self.config.capacity_mode))
    }

    /// SKUs currently stored at one location.
    pub async fn occupants_of(&self, id: &LocationId) -> Result<Vec<Sku>, PlaceError> {
        let slot = self
            .location(id)
            .ok_or_else(|| PlaceError::NotFound(id.clone()))?;
        let guard = slot.read().await;
        Ok(guard.occupants.keys().cloned().collect())
    }

    /// Locations holding `sku`, oldest stock first (then location id).
    /// A snapshot — the commit path re-validates before mutating.
    pub async fn locations_holding(&self, sku: &Sku) -> Vec<HoldingInfo> {
        let ids: Vec<LocationId> = match self.sku_index.get(sku) {
            Some(entry) => entry.value().iter().cloned().collect(),
            None => return Vec::new(),
        };

        let mut rows = Vec::new();
        for id in ids {
            let Some(slot) = self.location(&id) else { continue };
            let guard = slot.read().await;
            let Some(lot) = guard.lot(sku) else { continue };
            rows.push(HoldingInfo {
                location_id: id,
                oldest_receipt: lot.oldest_receipt,
                available_capacity: guard.available_capacity(self.config.capacity_mode),
            });
        }
        rows.sort_by(|a, b| {
            a.oldest_receipt
                .cmp(&b.oldest_receipt)
                .then_with(|| a.location_id.cmp(&b.location_id))
        });
        rows
    }

    pub async fn list_locations(&self) -> Vec<LocationSummary> {
        let slots: Vec<SharedLocationState> =
            self.locations.iter().map(|e| e.value().clone()).collect();

        let mut rows = Vec::new();
        for slot in slots {
            let guard = slot.read().await;
            rows.push(LocationSummary {
                id: guard.id.clone(),
                zone: guard.zone.clone(),
                status: guard.status,
                capacity: guard.capacity,
                available: guard.available_capacity(self.config.capacity_mode),
                distinct_skus: guard.distinct_skus(),
                total_quantity: guard.total_quantity(),
            });
        }
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        rows
    }

    /// Unoccupied, non-blocked locations, id-ascending.
    pub async fn empty_locations(&self) -> Vec<LocationId> {
        let slots: Vec<SharedLocationState> =
            self.locations.iter().map(|e| e.value().clone()).collect();

        let mut ids = Vec::new();
        for slot in slots {
            let guard = slot.read().await;
            if guard.is_unoccupied() && guard.status != LocationStatus::Blocked {
                ids.push(guard.id.clone());
            }
        }
        ids.sort();
        ids
    }

    /// Where a unit was committed, if it was.
    pub fn assignment_of(&self, unit_id: &UnitId) -> Option<LocationId> {
        self.committed.get(unit_id).map(|e| e.value().clone())
    }
}
