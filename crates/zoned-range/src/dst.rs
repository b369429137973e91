//! DST transition policies for civil times that do not map to exactly one instant.

use serde::{Deserialize, Serialize};

/// Policy for a civil time inside a spring-forward gap (e.g. 2:30 AM on the
/// night clocks jump from 2:00 to 3:00).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GapPolicy {
    /// Use the first instant after the gap: the transition itself.
    #[default]
    SnapToTransition,
    /// Read the civil time with the offset in effect before the gap, landing
    /// as far past the transition as the civil time was past the gap start.
    ShiftForward,
    /// Fail with [`RangeError::NonexistentLocalTime`](crate::RangeError::NonexistentLocalTime).
    Reject,
}

/// Policy for a civil time that occurs twice during a fall-back overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OverlapPolicy {
    /// The first occurrence, read with the pre-transition offset.
    #[default]
    Earlier,
    /// The second occurrence, read with the post-transition offset.
    Later,
}

/// Both tie-break policies used by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DstPolicy {
    pub gap: GapPolicy,
    pub overlap: OverlapPolicy,
}

impl DstPolicy {
    pub fn new(gap: GapPolicy, overlap: OverlapPolicy) -> Self {
        DstPolicy { gap, overlap }
    }
}
