//! Layout of the unified buffer the sort permutation addresses.
//!
//! Every registered splat set occupies a run of whole texture lines.
//! The sort worker writes one key per pixel of the used region, padding
//! included, so the resulting permutation covers the entire buffer.

use serde::{Deserialize, Serialize};

use crate::types::SplatSetId;

/// Errors from layout construction.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("texture size must be non-zero")]
    ZeroTextureSize,
    #[error("splat sets need {needed} lines but texture size {size} provides {size}")]
    DoesNotFit { needed: u32, size: u32 },
    #[error("no texture size up to {max} fits the splat sets")]
    TooLarge { max: u32 },
    #[error("set {id:?} has an invalid interval list")]
    InvalidIntervals { id: SplatSetId },
}

/// Input to [`CentersLayout::assign`]: one set's extent and the active
/// subset of its splats.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetSlice {
    pub id: SplatSetId,
    /// Total number of splats in the set's center buffer.
    pub total: u32,
    /// Even list of `[start, end)` splat-index ranges selecting the
    /// active splats, ascending and non-overlapping. Empty means all.
    pub intervals: Vec<(u32, u32)>,
}

impl SetSlice {
    pub fn all(id: SplatSetId, total: u32) -> Self {
        Self {
            id,
            total,
            intervals: Vec::new(),
        }
    }

    /// Number of active splats selected by the intervals.
    pub fn active(&self) -> u32 {
        if self.intervals.is_empty() {
            self.total
        } else {
            self.intervals.iter().map(|(s, e)| e - s).sum()
        }
    }

    fn intervals_valid(&self) -> bool {
        let mut prev_end = 0;
        for &(start, end) in &self.intervals {
            if start > end || end > self.total || start < prev_end {
                return false;
            }
            prev_end = end;
        }
        true
    }
}

/// One set's slot in the unified buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetPlacement {
    pub id: SplatSetId,
    /// First texture line occupied by this set.
    pub line_start: u32,
    /// Number of whole lines occupied.
    pub line_count: u32,
    /// Unused pixels at the tail of the last line. These still receive
    /// sort keys so the whole buffer is covered by the permutation.
    pub padding: u32,
    /// Active splat-index ranges into the set's center buffer (empty =
    /// the whole buffer).
    pub intervals: Vec<(u32, u32)>,
}

/// Placement of all active splat sets in the unified buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CentersLayout {
    pub placements: Vec<SetPlacement>,
    /// Width of the unified buffer in pixels; every line holds this many
    /// splats.
    pub texture_size: u32,
    /// Pixels covered by the permutation, padding included.
    pub total_used_pixels: u32,
    /// Stamped by the coordinator; results carry it back so stale orders
    /// can be recognized.
    pub version: u64,
}

impl CentersLayout {
    /// Packs the given sets into consecutive texture lines.
    pub fn assign(slices: &[SetSlice], texture_size: u32) -> Result<Self, LayoutError> {
        if texture_size == 0 {
            return Err(LayoutError::ZeroTextureSize);
        }

        let mut placements = Vec::with_capacity(slices.len());
        let mut line = 0u32;
        for slice in slices {
            if !slice.intervals_valid() {
                return Err(LayoutError::InvalidIntervals { id: slice.id });
            }
            let active = slice.active();
            let line_count = active.div_ceil(texture_size);
            placements.push(SetPlacement {
                id: slice.id,
                line_start: line,
                line_count,
                padding: line_count * texture_size - active,
                intervals: slice.intervals.clone(),
            });
            line += line_count;
        }

        if line > texture_size {
            return Err(LayoutError::DoesNotFit {
                needed: line,
                size: texture_size,
            });
        }

        Ok(Self {
            placements,
            texture_size,
            total_used_pixels: line * texture_size,
            version: 0,
        })
    }

    /// Checks internal consistency: placements contiguous, padding and
    /// total accounted for.
    pub fn validate(&self) -> Result<(), LayoutError> {
        if self.texture_size == 0 {
            return Err(LayoutError::ZeroTextureSize);
        }
        let mut line = 0u32;
        for p in &self.placements {
            let padding_ok = if p.line_count > 0 {
                p.padding < self.texture_size
            } else {
                p.padding == 0
            };
            if p.line_start != line || !padding_ok {
                return Err(LayoutError::DoesNotFit {
                    needed: p.line_start,
                    size: self.texture_size,
                });
            }
            line += p.line_count;
        }
        if self.total_used_pixels != line * self.texture_size {
            return Err(LayoutError::DoesNotFit {
                needed: line,
                size: self.texture_size,
            });
        }
        Ok(())
    }
}

/// Smallest power-of-two texture width that fits all sets' lines,
/// starting from 64.
pub fn estimate_texture_size(active_counts: &[u32], max_size: u32) -> Result<u32, LayoutError> {
    let mut size = 64u32;
    loop {
        if size > max_size {
            return Err(LayoutError::TooLarge { max: max_size });
        }
        let lines: u32 = active_counts.iter().map(|c| c.div_ceil(size)).sum();
        if lines <= size {
            return Ok(size);
        }
        size = size.saturating_mul(2);
    }
}
