use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use glam::{Mat4, Vec3};
use tracing_subscriber::EnvFilter;

use splatsort_assets::{
    CenterSet, Distribution, SynthSpec, load_center_set, load_scene, save_center_set, synthesize,
};
use splatsort_common::{
    Aabb, CentersLayout, SetSlice, SortMode, SplatSetId, estimate_texture_size,
};
use splatsort_sorter::{CameraView, UnifiedSorter, sort_params};

#[derive(Parser)]
#[command(name = "splatsort-cli", about = "CLI driver for the splat depth-sorter")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// Synthesize a cloud and save it to a center-set file
    Gen {
        /// Number of splats
        #[arg(short, long, default_value = "100000")]
        count: u32,
        /// PRNG seed
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Gaussian cluster instead of a uniform box
        #[arg(long)]
        gaussian: bool,
        /// Half extent (uniform) or standard deviation (gaussian)
        #[arg(long, default_value = "10.0")]
        extent: f32,
        /// Output file
        output: PathBuf,
    },
    /// Run one sort through the full worker path and report on it
    Sort {
        /// Center-set file; a synthetic cloud is used when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
        /// Splats for the synthetic cloud
        #[arg(short, long, default_value = "100000")]
        count: u32,
        /// Seed for the synthetic cloud
        #[arg(short, long, default_value = "42")]
        seed: u64,
        /// Sort by radial distance instead of view depth
        #[arg(long)]
        radial: bool,
        /// Emit the report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Orbit the camera through a scene, sorting every frame
    Simulate {
        /// Scene spec (YAML)
        scene: PathBuf,
        /// Frames to simulate
        #[arg(short, long, default_value = "120")]
        frames: u32,
        /// Orbit radius around the camera target
        #[arg(long, default_value = "30.0")]
        radius: f32,
        /// Sort by radial distance instead of view depth
        #[arg(long)]
        radial: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("splatsort-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", splatsort_common::crate_info());
            println!("kernel: {}", splatsort_kernel::crate_info());
            println!("sorter: {}", splatsort_sorter::crate_info());
            println!("assets: {}", splatsort_assets::crate_info());
        }
        Commands::Gen {
            count,
            seed,
            gaussian,
            extent,
            output,
        } => {
            let distribution = if gaussian {
                Distribution::Gaussian {
                    std_dev: Vec3::splat(extent),
                }
            } else {
                Distribution::Uniform {
                    half_extent: Vec3::splat(extent),
                }
            };
            let set = synthesize(&SynthSpec {
                name: output
                    .file_stem()
                    .map(|s| s.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "cloud".into()),
                count,
                seed,
                distribution,
            });
            save_center_set(&output, &set)?;
            println!("{} splats written to {}", set.len(), output.display());
        }
        Commands::Sort {
            input,
            count,
            seed,
            radial,
            json,
        } => {
            let mut set = match input {
                Some(path) => load_center_set(&path)?,
                None => synthesize(&SynthSpec {
                    name: "synthetic".into(),
                    count,
                    seed,
                    distribution: Distribution::Uniform {
                        half_extent: Vec3::splat(10.0),
                    },
                }),
            };
            set.sanitize();
            run_single_sort(&set, radial, json)?;
        }
        Commands::Simulate {
            scene,
            frames,
            radius,
            radial,
        } => {
            let spec = load_scene(&scene)?;
            run_simulation(&spec, frames, radius, radial)?;
        }
    }

    Ok(())
}

fn mode_for(radial: bool) -> SortMode {
    if radial {
        SortMode::Radial
    } else {
        SortMode::Linear
    }
}

fn run_single_sort(set: &CenterSet, radial: bool, json: bool) -> anyhow::Result<()> {
    let aabb = set
        .aabb()
        .ok_or_else(|| anyhow::anyhow!("center set is empty"))?;
    let mode = mode_for(radial);

    let id = SplatSetId(1);
    let texture_size = estimate_texture_size(&[set.len()], 4096)?;
    let layout = CentersLayout::assign(&[SetSlice::all(id, set.len())], texture_size)?;

    let mut sorter = UnifiedSorter::new();
    sorter.set_centers(id, set.centers.clone())?;
    sorter.set_layout(layout)?;

    // camera pulled back from the cloud along +Z
    let span = (aabb.max - aabb.min).length().max(1.0);
    let view = CameraView::looking_at(aabb.center() + Vec3::new(0.0, 0.0, span), aabb.center());
    let params = sort_params(&Mat4::IDENTITY, aabb, &view);

    sorter.request_sort(vec![params], mode)?;
    let frame = sorter
        .wait_apply()?
        .ok_or_else(|| anyhow::anyhow!("sort produced no frame"))?;

    let stats = frame.stats();
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("sorted {} splats ({} pixels incl. padding)", set.len(), stats.count);
        println!(
            "  mode={:?} texture={}x{} buckets={} version={}",
            mode, texture_size, texture_size, stats.buckets, stats.version
        );
        println!("  sort time: {:?}", stats.sort_time);
        if stats.clamped > 0 {
            println!("  clamped keys: {} (bounds too tight)", stats.clamped);
        }
        let indices = frame.indices();
        let shown = indices.len().min(8);
        println!("  draw order starts: {:?}...", &indices[..shown]);
    }

    sorter.recycle(frame);
    sorter.shutdown();
    Ok(())
}

fn run_simulation(
    spec: &splatsort_assets::SceneSpec,
    frames: u32,
    radius: f32,
    radial: bool,
) -> anyhow::Result<()> {
    let mode = mode_for(radial);

    // synthesize and register every set
    let mut sorter = UnifiedSorter::new();
    let mut sets: Vec<(SplatSetId, Mat4, Aabb, u32)> = Vec::new();
    for (index, scene_set) in spec.sets.iter().enumerate() {
        let id = SplatSetId(index as u64 + 1);
        let set = scene_set.synthesize();
        let aabb = set
            .aabb()
            .ok_or_else(|| anyhow::anyhow!("set '{}' is empty", scene_set.name))?;
        sets.push((id, scene_set.model_matrix(), aabb, set.len()));
        sorter.set_centers(id, set.centers)?;
    }

    let counts: Vec<u32> = sets.iter().map(|(_, _, _, count)| *count).collect();
    let texture_size = estimate_texture_size(&counts, 4096)?;
    let slices: Vec<SetSlice> = sets
        .iter()
        .map(|(id, _, _, count)| SetSlice::all(*id, *count))
        .collect();
    sorter.set_layout(CentersLayout::assign(&slices, texture_size)?)?;

    let target = spec.camera.target;
    let height = spec.camera.position.y;

    let mut dispatched = 0u32;
    let mut applied = 0u32;
    let mut total_sort_time = Duration::ZERO;

    for frame_index in 0..frames {
        let angle = frame_index as f32 / frames as f32 * std::f32::consts::TAU;
        let position = target + Vec3::new(angle.cos() * radius, height, angle.sin() * radius);
        let view = CameraView::looking_at(position, target);

        let params = sets
            .iter()
            .map(|(_, model, aabb, _)| sort_params(model, *aabb, &view))
            .collect();

        if sorter.request_sort(params, mode)? {
            dispatched += 1;
        }

        if let Some(frame) = sorter.apply_pending()? {
            applied += 1;
            total_sort_time += frame.sort_time();
            tracing::debug!(
                frame = frame_index,
                count = frame.count(),
                sort_time = ?frame.sort_time(),
                "frame applied"
            );
            sorter.recycle(frame);
        }
    }

    // drain whatever is still in flight
    if let Some(frame) = sorter.wait_apply()? {
        applied += 1;
        total_sort_time += frame.sort_time();
        sorter.recycle(frame);
    }

    println!("simulated {frames} frames over {} sets", sets.len());
    println!(
        "  dispatched={} applied={} skipped={} stale={}",
        dispatched,
        applied,
        sorter.skipped_requests(),
        sorter.stale_results()
    );
    if applied > 0 {
        println!("  avg sort time: {:?}", total_sort_time / applied);
    }

    sorter.shutdown();
    Ok(())
}
