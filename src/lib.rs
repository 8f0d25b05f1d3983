//! Put-away placement engine: assigns storage locations to newly received,
//! unlocated inventory units so that older stock stays pickable before newer
//! stock of the same product (FIFO) and same/similar products consolidate
//! (affinity). Decisions commit transactionally per location; every
//! assignment is journaled for idempotence and audit.

pub mod engine;
pub mod journal;
pub mod limits;
pub mod model;
pub mod observability;
pub mod similarity;
pub mod source;

pub use engine::{Engine, Outcome, PlaceConfig, PlaceError, PlacementResult};
pub use model::{
    Assignment, CapacityMode, LocationId, LocationState, LocationStatus, Ms, Rationale, Sku, Unit,
    UnitId,
};
