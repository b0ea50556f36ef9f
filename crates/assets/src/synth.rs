//! Deterministic synthetic point clouds.
//!
//! Backed by a splitmix64 stream so a spec reproduces the exact same
//! cloud everywhere; tests and benchmarks anchor on that.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::CenterSet;

/// Shape of a synthetic cloud.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Distribution {
    /// Uniform inside a box around the origin.
    Uniform { half_extent: Vec3 },
    /// Gaussian cluster around the origin.
    Gaussian { std_dev: Vec3 },
}

impl Default for Distribution {
    fn default() -> Self {
        Self::Uniform {
            half_extent: Vec3::ONE,
        }
    }
}

/// Everything needed to synthesize one cloud.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthSpec {
    pub name: String,
    pub count: u32,
    pub seed: u64,
    #[serde(default)]
    pub distribution: Distribution,
}

/// Builds the cloud described by `spec`.
pub fn synthesize(spec: &SynthSpec) -> CenterSet {
    let mut centers = Vec::with_capacity(spec.count as usize * 3);
    // mix the name in so same-seed sets still diverge
    let mut state = spec.seed ^ fnv1a(&spec.name);

    match spec.distribution {
        Distribution::Uniform { half_extent } => {
            for _ in 0..spec.count {
                let p = Vec3::new(
                    symmetric_unit(&mut state),
                    symmetric_unit(&mut state),
                    symmetric_unit(&mut state),
                ) * half_extent;
                centers.extend_from_slice(&[p.x, p.y, p.z]);
            }
        }
        Distribution::Gaussian { std_dev } => {
            for _ in 0..spec.count {
                let p = Vec3::new(
                    gaussian(&mut state),
                    gaussian(&mut state),
                    gaussian(&mut state),
                ) * std_dev;
                centers.extend_from_slice(&[p.x, p.y, p.z]);
            }
        }
    }

    CenterSet::new(spec.name.clone(), centers)
}

/// FNV-1a over the set name, for seed mixing.
fn fnv1a(data: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Splitmix64, a fast, high-quality deterministic PRNG step function.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Uniform in `[0, 1)` from the top 24 bits of a draw.
fn unit(state: &mut u64) -> f32 {
    (splitmix64(state) >> 40) as f32 / (1u64 << 24) as f32
}

/// Uniform in `[-1, 1)`.
fn symmetric_unit(state: &mut u64) -> f32 {
    unit(state) * 2.0 - 1.0
}

/// Standard normal via Box-Muller. The uniform draw is shifted off zero
/// so the log never sees it.
fn gaussian(state: &mut u64) -> f32 {
    let u1 = (unit(state) + 1.0 / (1u64 << 24) as f32).min(1.0);
    let u2 = unit(state);
    (-2.0 * u1.ln()).sqrt() * (std::f32::consts::TAU * u2).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(count: u32, seed: u64) -> SynthSpec {
        SynthSpec {
            name: "cloud".into(),
            count,
            seed,
            distribution: Distribution::Uniform {
                half_extent: Vec3::splat(10.0),
            },
        }
    }

    #[test]
    fn same_spec_same_cloud() {
        let a = synthesize(&spec(1000, 42));
        let b = synthesize(&spec(1000, 42));
        assert_eq!(a, b);
    }

    #[test]
    fn different_seeds_diverge() {
        let a = synthesize(&spec(100, 1));
        let b = synthesize(&spec(100, 2));
        assert_ne!(a.centers, b.centers);
    }

    #[test]
    fn different_names_diverge_with_same_seed() {
        let mut a = spec(100, 1);
        let mut b = spec(100, 1);
        a.name = "left".into();
        b.name = "right".into();
        assert_ne!(synthesize(&a).centers, synthesize(&b).centers);
    }

    #[test]
    fn uniform_stays_in_box() {
        let set = synthesize(&spec(10_000, 3));
        let aabb = set.aabb().unwrap();
        assert!(aabb.min.cmpge(Vec3::splat(-10.0)).all());
        assert!(aabb.max.cmplt(Vec3::splat(10.0)).all());
        // and actually fills it
        assert!(aabb.max.cmpgt(Vec3::splat(8.0)).all());
        assert!(aabb.min.cmplt(Vec3::splat(-8.0)).all());
    }

    #[test]
    fn gaussian_centers_cluster_near_origin() {
        let set = synthesize(&SynthSpec {
            name: "g".into(),
            count: 10_000,
            seed: 5,
            distribution: Distribution::Gaussian {
                std_dev: Vec3::splat(2.0),
            },
        });
        let mean = set
            .centers
            .chunks_exact(3)
            .fold(Vec3::ZERO, |acc, c| acc + Vec3::new(c[0], c[1], c[2]))
            / set.len() as f32;
        assert!(mean.length() < 0.2, "mean {mean} too far from origin");
        // every sample is finite
        assert!(set.centers.iter().all(|c| c.is_finite()));
    }

    #[test]
    fn count_is_respected() {
        assert_eq!(synthesize(&spec(0, 1)).len(), 0);
        assert_eq!(synthesize(&spec(17, 1)).len(), 17);
    }
}
