use crate::model::Ms;

pub const MAX_SKU_LEN: usize = 64;
pub const MAX_UNIT_ID_LEN: usize = 64;
pub const MAX_LOCATION_ID_LEN: usize = 64;
pub const MAX_ZONE_LEN: usize = 64;

pub const MAX_LOCATIONS: usize = 100_000;
pub const MAX_BATCH_SIZE: usize = 10_000;
pub const MAX_UNIT_QUANTITY: u32 = 1_000_000;

pub const MIN_VALID_TIMESTAMP_MS: Ms = 0;
/// 2100-01-01T00:00:00Z
pub const MAX_VALID_TIMESTAMP_MS: Ms = 4_102_444_800_000;
