//! YAML scene specification for the CLI driver.
//!
//! A scene is a list of synthetic splat sets with placements plus a
//! camera block; enough to exercise the whole sort path without any
//! real capture data.

use std::path::Path;

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

use crate::CenterSet;
use crate::synth::{Distribution, SynthSpec, synthesize};

/// Errors from scene loading.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// One placed synthetic splat set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSet {
    pub name: String,
    pub count: u32,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub distribution: Distribution,
    /// World position of the set's origin.
    #[serde(default)]
    pub position: Vec3,
    /// Uniform model scale.
    #[serde(default = "default_scale")]
    pub scale: f32,
}

fn default_scale() -> f32 {
    1.0
}

impl SceneSet {
    /// Generates this set's centers.
    pub fn synthesize(&self) -> CenterSet {
        synthesize(&SynthSpec {
            name: self.name.clone(),
            count: self.count,
            seed: self.seed,
            distribution: self.distribution,
        })
    }

    /// Model matrix placing the set in the world.
    pub fn model_matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * Mat4::from_scale(Vec3::splat(self.scale))
    }
}

/// Camera block of a scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSpec {
    pub position: Vec3,
    #[serde(default)]
    pub target: Vec3,
}

/// A full scene: sets plus camera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneSpec {
    pub camera: CameraSpec,
    pub sets: Vec<SceneSet>,
}

/// Loads a scene spec from a YAML file.
pub fn load_scene(path: impl AsRef<Path>) -> Result<SceneSpec, SceneError> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let scene: SceneSpec = serde_yaml::from_str(&text)?;
    tracing::debug!(
        path = %path.as_ref().display(),
        sets = scene.sets.len(),
        "scene loaded"
    );
    Ok(scene)
}
