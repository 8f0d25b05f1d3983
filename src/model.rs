use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unix milliseconds — the only time type.
pub type Ms = i64;

/// Stock-keeping unit identifier for a product type.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

/// Identifier of a discrete physical inventory unit (pallet/case).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

/// Identifier of a physical storage slot, e.g. an aisle-rack-level code.
/// Ordered lexicographically — the deterministic tie-break of the ranker.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self(raw.to_owned())
            }
        }
    };
}

string_id!(Sku);
string_id!(UnitId);
string_id!(LocationId);

/// A received inventory unit awaiting (or holding) a storage location.
/// Immutable; transitions from unlocated to located exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub unit_id: UnitId,
    pub sku: Sku,
    pub receipt_ts: Ms,
    pub quantity: u32,
    /// Optional expiry, carried for audit — not a placement input.
    pub expires_at: Option<Ms>,
}

/// What `LocationState::capacity` bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapacityMode {
    /// Capacity bounds the summed occupant quantity.
    Quantity,
    /// Capacity bounds the number of distinct SKUs; a unit of a SKU
    /// already present always fits.
    DistinctSkus,
}

/// Operational status of a storage slot. `Blocked` slots are never
/// placement candidates; `Open` and `InUse` behave identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LocationStatus {
    Open,
    InUse,
    Blocked,
}

/// Per-SKU occupancy at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantLot {
    pub quantity: u32,
    /// Receipt timestamp of the oldest stock of this SKU here.
    /// Never decreases — the engine re-routes instead of violating this.
    pub oldest_receipt: Ms,
}

/// A physical storage slot and its current occupants.
/// Mutated only by the placement engine's commit path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationState {
    pub id: LocationId,
    pub zone: String,
    pub status: LocationStatus,
    pub capacity: u32,
    /// SKU → occupancy, BTreeMap for deterministic iteration.
    pub occupants: BTreeMap<Sku, OccupantLot>,
}

impl LocationState {
    pub fn new(id: LocationId, zone: impl Into<String>, status: LocationStatus, capacity: u32) -> Self {
        Self {
            id,
            zone: zone.into(),
            status,
            capacity,
            occupants: BTreeMap::new(),
        }
    }

    pub fn total_quantity(&self) -> u32 {
        self.occupants.values().map(|lot| lot.quantity).sum()
    }

    pub fn distinct_skus(&self) -> usize {
        self.occupants.len()
    }

    pub fn lot(&self, sku: &Sku) -> Option<&OccupantLot> {
        self.occupants.get(sku)
    }

    pub fn is_unoccupied(&self) -> bool {
        self.occupants.is_empty()
    }

    /// Oldest receipt across all occupant lots, `None` when unoccupied.
    pub fn stock_oldest(&self) -> Option<Ms> {
        self.occupants.values().map(|lot| lot.oldest_receipt).min()
    }

    /// Mode-aware remaining headroom, used by the ranker to favor
    /// consolidation (most available capacity first).
    pub fn available_capacity(&self, mode: CapacityMode) -> u32 {
        match mode {
            CapacityMode::Quantity => self.capacity.saturating_sub(self.total_quantity()),
            CapacityMode::DistinctSkus => self.capacity.saturating_sub(self.distinct_skus() as u32),
        }
    }

    /// Whether `quantity` units of `sku` physically fit here.
    pub fn fits(&self, sku: &Sku, quantity: u32, mode: CapacityMode) -> bool {
        match mode {
            CapacityMode::Quantity => {
                self.total_quantity().saturating_add(quantity) <= self.capacity
            }
            CapacityMode::DistinctSkus => {
                self.occupants.contains_key(sku) || (self.distinct_skus() as u32) < self.capacity
            }
        }
    }

    /// Record an arrival. The only occupancy mutator; callers hold the
    /// location's write lock and have already validated fit and FIFO order.
    pub fn receive(&mut self, sku: Sku, quantity: u32, receipt_ts: Ms) {
        match self.occupants.entry(sku) {
            std::collections::btree_map::Entry::Occupied(mut entry) => {
                let lot = entry.get_mut();
                debug_assert!(
                    receipt_ts >= lot.oldest_receipt,
                    "receive would move oldest_receipt backwards"
                );
                lot.quantity += quantity;
            }
            std::collections::btree_map::Entry::Vacant(entry) => {
                entry.insert(OccupantLot {
                    quantity,
                    oldest_receipt: receipt_ts,
                });
            }
        }
    }
}

/// Why a location was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rationale {
    SameSkuMatch,
    SimilarSkuMatch,
    EmptyFifoSlot,
}

/// Per-unit placement lifecycle, surfaced in tracing events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementPhase {
    Pending,
    Deciding,
    Committed,
    Failed,
}

/// Append-only journal record — one per unit, write-once.
/// This is the transaction-log entry format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub id: Ulid,
    pub unit_id: UnitId,
    pub location_id: LocationId,
    pub sku: Sku,
    pub quantity: u32,
    pub receipt_ts: Ms,
    pub decided_at: Ms,
    pub rationale: Rationale,
}

// ── Query result types ───────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationSummary {
    pub id: LocationId,
    pub zone: String,
    pub status: LocationStatus,
    pub capacity: u32,
    pub available: u32,
    pub distinct_skus: usize,
    pub total_quantity: u32,
}

/// One row of `locations_holding`, ordered oldest-first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoldingInfo {
    pub location_id: LocationId,
    pub oldest_receipt: Ms,
    pub available_capacity: u32,
}

/// An already-located unit, as reported by the inventory snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedUnit {
    pub unit: Unit,
    pub location_id: LocationId,
}
