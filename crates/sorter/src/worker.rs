//! The sort worker thread.
//!
//! Owns a registry of center buffers and the scratch (key and count)
//! buffers, so a warm worker allocates nothing per sort. The order
//! buffer travels in with the request and back out with the result;
//! the coordinator pools it.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender};
use std::time::{Duration, Instant};

use splatsort_common::{CentersLayout, SortMode, SplatSetId, SplatSortParams};
use splatsort_kernel::{
    BinWeights, bucket_count, camera_bin, compare_bits, counting_sort, effective_range,
    evaluate_sort_keys,
};

/// Requests from the coordinator.
pub(crate) enum WorkerRequest {
    SetCenters {
        id: SplatSetId,
        centers: Arc<Vec<f32>>,
    },
    RemoveCenters {
        id: SplatSetId,
    },
    SetLayout(CentersLayout),
    Sort {
        params: Vec<SplatSortParams>,
        mode: SortMode,
        order: Vec<u32>,
    },
}

/// One finished sort. `version == 0` marks a sort that could not run
/// (missing layout or centers); the coordinator's version gate drops it
/// and reclaims the buffer.
#[derive(Debug)]
pub(crate) struct SortResult {
    pub order: Vec<u32>,
    pub count: u32,
    pub version: u64,
    pub sort_time: Duration,
    pub clamped: u32,
    pub buckets: u32,
}

pub(crate) struct WorkerLimits {
    pub min_bits: u32,
    pub max_bits: u32,
}

/// Worker loop. Ends when the coordinator drops its sender.
pub(crate) fn run(rx: Receiver<WorkerRequest>, tx: Sender<SortResult>, limits: WorkerLimits) {
    let mut state = WorkerState::new(limits);

    while let Ok(request) = rx.recv() {
        match request {
            WorkerRequest::SetCenters { id, centers } => {
                tracing::debug!(?id, splats = centers.len() / 3, "centers registered");
                state.centers.insert(id, centers);
            }
            WorkerRequest::RemoveCenters { id } => {
                tracing::debug!(?id, "centers removed");
                state.centers.remove(&id);
            }
            WorkerRequest::SetLayout(layout) => {
                state.layout = Some(layout);
            }
            WorkerRequest::Sort {
                params,
                mode,
                order,
            } => {
                let result = state.sort(&params, mode, order);
                if tx.send(result).is_err() {
                    // coordinator is gone
                    break;
                }
            }
        }
    }
}

struct WorkerState {
    centers: HashMap<SplatSetId, Arc<Vec<f32>>>,
    layout: Option<CentersLayout>,
    keys: Vec<u32>,
    counts: Vec<u32>,
    limits: WorkerLimits,
    warned_clamped: bool,
}

impl WorkerState {
    fn new(limits: WorkerLimits) -> Self {
        Self {
            centers: HashMap::new(),
            layout: None,
            keys: Vec::new(),
            counts: Vec::new(),
            limits,
            warned_clamped: false,
        }
    }

    fn sort(&mut self, params: &[SplatSortParams], mode: SortMode, mut order: Vec<u32>) -> SortResult {
        let span = tracing::debug_span!("sort", ?mode).entered();
        let started = Instant::now();

        let Some(layout) = self.layout.as_ref() else {
            tracing::warn!("sort requested before any layout was set");
            return failed(order);
        };

        // resolve each placement's centers from the registry
        let mut resolved: Vec<&[f32]> = Vec::with_capacity(layout.placements.len());
        for placement in &layout.placements {
            match self.centers.get(&placement.id) {
                Some(centers) => resolved.push(centers.as_slice()),
                None => {
                    tracing::error!(id = ?placement.id, "no centers registered for placement");
                    return failed(order);
                }
            }
        }

        let n = layout.total_used_pixels;
        let bits = compare_bits(n, self.limits.min_bits, self.limits.max_bits);
        let buckets = bucket_count(bits);

        // size scratch and output buffers; reuse when stable
        if self.keys.len() != n as usize {
            self.keys = vec![0; n as usize];
        }
        if self.counts.len() != buckets as usize {
            self.counts = vec![0; buckets as usize];
        } else {
            self.counts.fill(0);
        }
        if order.len() != n as usize {
            order.resize(n as usize, 0);
        }

        let range = effective_range(mode, params);
        let weights = BinWeights::compute(camera_bin(mode, range.min, range.span()), buckets);

        let stats = match evaluate_sort_keys(
            mode,
            params,
            &resolved,
            layout,
            range,
            &weights,
            &mut self.keys,
            &mut self.counts,
        ) {
            Ok(stats) => stats,
            Err(err) => {
                tracing::error!(%err, "sort key evaluation failed");
                return failed(order);
            }
        };

        if stats.clamped > 0 && !self.warned_clamped {
            self.warned_clamped = true;
            tracing::warn!(
                clamped = stats.clamped,
                "sort keys clamped; check that set bounds contain all centers"
            );
        }

        let valid = counting_sort(&mut self.counts, &self.keys, &mut order);
        debug_assert_eq!(valid, n);

        let sort_time = started.elapsed();
        drop(span);
        tracing::debug!(
            count = n,
            version = layout.version,
            ?sort_time,
            "sort complete"
        );

        SortResult {
            order,
            count: n,
            version: layout.version,
            sort_time,
            clamped: stats.clamped,
            buckets,
        }
    }
}

fn failed(order: Vec<u32>) -> SortResult {
    SortResult {
        order,
        count: 0,
        version: 0,
        sort_time: Duration::ZERO,
        clamped: 0,
        buckets: 0,
    }
}
