use crate::model::{LocationId, UnitId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceError {
    /// Referenced location is absent from the catalog. Fatal for the unit,
    /// never retried.
    NotFound(LocationId),
    /// The unit already has a committed assignment. Resubmission is rejected,
    /// never double-assigned.
    AlreadyAssigned(UnitId),
    /// A concurrent commit consumed the capacity the decision was based on.
    /// Transient; the engine retries with a fresh read.
    CapacityExceeded(u32),
    /// No eligible location exists anywhere in the catalog, or retries were
    /// exhausted. Terminal; surfaced for manual intervention.
    NoCapacity,
    /// The per-unit deadline elapsed before a commit succeeded.
    Timeout,
    /// The batch was cancelled before this unit reached the deciding phase.
    Cancelled,
    LimitExceeded(&'static str),
    Journal(String),
    /// External persistence failed. The unit remains unlocated; nothing was
    /// committed, so resubmitting it on the next run is safe.
    Io(String),
}

impl std::fmt::Display for PlaceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlaceError::NotFound(id) => write!(f, "location not found: {id}"),
            PlaceError::AlreadyAssigned(id) => write!(f, "unit already assigned: {id}"),
            PlaceError::CapacityExceeded(cap) => {
                write!(f, "capacity {cap} exceeded: slot taken by a concurrent commit")
            }
            PlaceError::NoCapacity => write!(f, "no eligible location with capacity"),
            PlaceError::Timeout => write!(f, "placement deadline elapsed"),
            PlaceError::Cancelled => write!(f, "placement cancelled before deciding"),
            PlaceError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            PlaceError::Journal(e) => write!(f, "journal error: {e}"),
            PlaceError::Io(e) => write!(f, "persistence error: {e}"),
        }
    }
}

impl std::error::Error for PlaceError {}
