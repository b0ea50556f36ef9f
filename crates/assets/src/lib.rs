//! Splat center sets and how they get into the sorter: deterministic
//! synthesis, a checksummed binary store, and YAML scene specs for the
//! CLI driver.
//!
//! # Invariants
//! - Synthesis is deterministic: same spec, same cloud, on every
//!   platform.
//! - The store fails closed: schema or checksum mismatch refuses the
//!   file.

use serde::{Deserialize, Serialize};
use splatsort_common::Aabb;

pub mod scene;
pub mod store;
pub mod synth;

pub use scene::{CameraSpec, SceneError, SceneSet, SceneSpec, load_scene};
pub use store::{StoreError, load_center_set, save_center_set};
pub use synth::{Distribution, SynthSpec, synthesize};

/// One splat set's center points: flat xyz triples in local space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CenterSet {
    pub name: String,
    pub centers: Vec<f32>,
}

impl CenterSet {
    pub fn new(name: impl Into<String>, centers: Vec<f32>) -> Self {
        Self {
            name: name.into(),
            centers,
        }
    }

    /// Number of splats.
    pub fn len(&self) -> u32 {
        (self.centers.len() / 3) as u32
    }

    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Local-space bounds over the finite centers.
    pub fn aabb(&self) -> Option<Aabb> {
        Aabb::from_centers(&self.centers)
    }

    /// Replaces non-finite components with zero so a damaged set cannot
    /// poison the sort keys. Returns how many components were replaced.
    pub fn sanitize(&mut self) -> u32 {
        let mut replaced = 0;
        for c in &mut self.centers {
            if !c.is_finite() {
                *c = 0.0;
                replaced += 1;
            }
        }
        if replaced > 0 {
            tracing::warn!(name = %self.name, replaced, "non-finite centers zeroed");
        }
        replaced
    }
}

pub fn crate_info() -> &'static str {
    "splatsort-assets v0.1.0"
}
