use std::io;

use async_trait::async_trait;

use crate::model::{Assignment, LocatedUnit, LocationState, Unit};

/// Read side of the warehouse system: snapshots of locations, located stock,
/// and the units awaiting placement. However these are sourced (database,
/// spreadsheet export, WMS API), the engine only sees the in-memory entities.
#[async_trait]
pub trait InventorySource: Send + Sync {
    async fn load_locations(&self) -> io::Result<Vec<LocationState>>;
    async fn load_inventory(&self) -> io::Result<Vec<LocatedUnit>>;
    async fn load_unlocated_units(&self) -> io::Result<Vec<Unit>>;
}

/// Write side: called inside the commit path, before any in-memory state
/// changes. A failure leaves the unit unlocated with nothing committed.
/// Implementations must be idempotent on `unit_id` — a unit that failed
/// after the sink succeeded is safe to resubmit.
#[async_trait]
pub trait AssignmentSink: Send + Sync {
    async fn persist(&self, assignment: &Assignment) -> io::Result<()>;
}

/// In-memory source over pre-loaded vectors. Convenient for tests and for
/// embedders that already hold the snapshots.
pub struct VecSource {
    pub locations: Vec<LocationState>,
    pub inventory: Vec<LocatedUnit>,
    pub unlocated: Vec<Unit>,
}

#[async_trait]
impl InventorySource for VecSource {
    async fn load_locations(&self) -> io::Result<Vec<LocationState>> {
        Ok(self.locations.clone())
    }

    async fn load_inventory(&self) -> io::Result<Vec<LocatedUnit>> {
        Ok(self.inventory.clone())
    }

    async fn load_unlocated_units(&self) -> io::Result<Vec<Unit>> {
        Ok(self.unlocated.clone())
    }
}
