use std::hint::black_box;
use std::time::Instant;

use glam::Vec3;
use splatsort_common::{Aabb, CentersLayout, SetSlice, SortMode, SplatSetId, SplatSortParams};
use splatsort_kernel::{
    BinWeights, DEFAULT_MAX_BITS, DEFAULT_MIN_BITS, bucket_count, camera_bin, compare_bits,
    counting_sort, effective_range, evaluate_sort_keys,
};

fn make_cloud(count: u32) -> Vec<f32> {
    // deterministic spiral filling a box, roughly uniform in depth
    let mut centers = Vec::with_capacity(count as usize * 3);
    for i in 0..count {
        let t = i as f32 / count as f32;
        let angle = i as f32 * 2.399_963; // golden angle
        centers.push(angle.cos() * 50.0 * t);
        centers.push(angle.sin() * 50.0 * t);
        centers.push(t * 200.0 - 100.0);
    }
    centers
}

fn setup(count: u32) -> (Vec<f32>, SplatSortParams, CentersLayout) {
    let centers = make_cloud(count);
    let aabb = Aabb::from_centers(&centers).unwrap();
    let params = SplatSortParams {
        transformed_direction: Vec3::Z,
        transformed_position: Vec3::new(0.0, 0.0, -150.0),
        offset: 150.0,
        scale: 1.0,
        aabb,
    };
    let size = splatsort_common::estimate_texture_size(&[count], 4096).unwrap();
    let layout = CentersLayout::assign(&[SetSlice::all(SplatSetId(1), count)], size).unwrap();
    (centers, params, layout)
}

fn bench_key_evaluation(count: u32, iterations: usize) {
    let (centers, params, layout) = setup(count);
    let range = effective_range(SortMode::Linear, &[params]);
    let bits = compare_bits(layout.total_used_pixels, DEFAULT_MIN_BITS, DEFAULT_MAX_BITS);
    let buckets = bucket_count(bits);
    let weights = BinWeights::compute(camera_bin(SortMode::Linear, range.min, range.span()), buckets);
    let mut keys = vec![0u32; layout.total_used_pixels as usize];
    let mut counts = vec![0u32; buckets as usize];

    let start = Instant::now();
    for _ in 0..iterations {
        counts.fill(0);
        let stats = evaluate_sort_keys(
            SortMode::Linear,
            black_box(&[params]),
            &[&centers],
            &layout,
            range,
            &weights,
            &mut keys,
            &mut counts,
        )
        .unwrap();
        black_box(stats);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  key evaluation ({count} splats, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_counting_sort(count: u32, iterations: usize) {
    let (centers, params, layout) = setup(count);
    let range = effective_range(SortMode::Linear, &[params]);
    let bits = compare_bits(layout.total_used_pixels, DEFAULT_MIN_BITS, DEFAULT_MAX_BITS);
    let buckets = bucket_count(bits);
    let weights = BinWeights::compute(camera_bin(SortMode::Linear, range.min, range.span()), buckets);
    let mut keys = vec![0u32; layout.total_used_pixels as usize];
    let mut counts = vec![0u32; buckets as usize];
    evaluate_sort_keys(
        SortMode::Linear,
        &[params],
        &[&centers],
        &layout,
        range,
        &weights,
        &mut keys,
        &mut counts,
    )
    .unwrap();
    let baseline = counts.clone();
    let mut order = vec![0u32; keys.len()];

    let start = Instant::now();
    for _ in 0..iterations {
        counts.copy_from_slice(&baseline);
        let total = counting_sort(black_box(&mut counts), &keys, &mut order);
        black_box(total);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  counting sort ({count} splats, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn bench_full_kernel(count: u32, iterations: usize) {
    let (centers, params, layout) = setup(count);
    let mut keys = vec![0u32; layout.total_used_pixels as usize];
    let mut order = vec![0u32; keys.len()];
    let mut counts = Vec::new();

    let start = Instant::now();
    for _ in 0..iterations {
        let range = effective_range(SortMode::Linear, &[params]);
        let bits = compare_bits(layout.total_used_pixels, DEFAULT_MIN_BITS, DEFAULT_MAX_BITS);
        let buckets = bucket_count(bits) as usize;
        if counts.len() != buckets {
            counts = vec![0u32; buckets];
        } else {
            counts.fill(0);
        }
        let weights =
            BinWeights::compute(camera_bin(SortMode::Linear, range.min, range.span()), buckets as u32);
        evaluate_sort_keys(
            SortMode::Linear,
            black_box(&[params]),
            &[&centers],
            &layout,
            range,
            &weights,
            &mut keys,
            &mut counts,
        )
        .unwrap();
        let total = counting_sort(&mut counts, &keys, &mut order);
        black_box(total);
    }
    let elapsed = start.elapsed();
    let per_iter = elapsed / iterations as u32;
    println!("  full kernel ({count} splats, {iterations} iters): {per_iter:?}/iter, total {elapsed:?}");
}

fn main() {
    println!("=== Sort Kernel Benchmarks ===\n");

    println!("Key evaluation:");
    bench_key_evaluation(10_000, 200);
    bench_key_evaluation(100_000, 50);
    bench_key_evaluation(1_000_000, 5);

    println!("\nCounting sort:");
    bench_counting_sort(10_000, 200);
    bench_counting_sort(100_000, 50);
    bench_counting_sort(1_000_000, 5);

    println!("\nFull kernel (range + weights + keys + sort):");
    bench_full_kernel(10_000, 200);
    bench_full_kernel(100_000, 50);
    bench_full_kernel(1_000_000, 5);

    println!("\n=== Done ===");
}
