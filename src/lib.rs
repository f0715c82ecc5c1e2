//! Timezone-aware availability aggregation for shared 7-day scheduling
//! grids: normalize per-person local selections to absolute instants, merge
//! them, and re-project the merged set into any viewer's timezone.

#[cfg(feature = "export")]
pub mod export;
#[cfg(feature = "serde")]
pub mod input;
pub mod occupancy;
pub mod participant;
pub mod schedule;
pub mod time;
