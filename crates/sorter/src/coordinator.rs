//! The sorter coordinator: render-loop-facing surface of the worker.
//!
//! Sort requests are fire-and-forget; the render loop pulls the newest
//! finished permutation with [`UnifiedSorter::apply_pending`] whenever
//! it is ready to consume one. When several sorts complete between
//! pulls, only the newest survives; the rest are recycled into the
//! buffer pool unseen.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, TryRecvError, channel};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use splatsort_common::{CentersLayout, SortMode, SplatSetId, SplatSortParams};
use splatsort_kernel::{DEFAULT_MAX_BITS, DEFAULT_MIN_BITS};

use crate::worker::{self, SortResult, WorkerLimits, WorkerRequest};

/// Errors from the coordinator surface.
#[derive(Debug, thiserror::Error)]
pub enum SorterError {
    #[error("sort worker disconnected")]
    WorkerDisconnected,
    #[error("no layout set; register centers and call set_layout first")]
    NoLayout,
}

/// Coordinator tunables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SorterConfig {
    /// Order buffers in rotation. Two gives classic double buffering:
    /// one sort in flight while the previous result is consumed.
    pub pool_size: usize,
    /// Lower bound for the adaptive key bit budget.
    pub min_bits: u32,
    /// Upper bound for the adaptive key bit budget.
    pub max_bits: u32,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self {
            pool_size: 2,
            min_bits: DEFAULT_MIN_BITS,
            max_bits: DEFAULT_MAX_BITS,
        }
    }
}

/// Summary of one applied sort, for instrumentation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SortStats {
    pub count: u32,
    pub version: u64,
    pub buckets: u32,
    pub clamped: u32,
    pub sort_time: Duration,
}

/// One applied permutation, lent to the caller. Return it with
/// [`UnifiedSorter::recycle`] once consumed so the buffer re-enters the
/// pool.
#[derive(Debug)]
pub struct SortedFrame {
    order: Vec<u32>,
    count: u32,
    version: u64,
    sort_time: Duration,
    clamped: u32,
    buckets: u32,
}

impl SortedFrame {
    /// Draw order: splat indices into the unified buffer, farthest
    /// first.
    pub fn indices(&self) -> &[u32] {
        &self.order[..self.count as usize]
    }

    /// Byte view of the draw order for texture/buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.indices())
    }

    /// Splats covered by the permutation, padding included.
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Layout version this permutation was sorted against.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn sort_time(&self) -> Duration {
        self.sort_time
    }

    /// Keys clamped during evaluation (bounds did not contain all
    /// centers).
    pub fn clamped(&self) -> u32 {
        self.clamped
    }

    pub fn stats(&self) -> SortStats {
        SortStats {
            count: self.count,
            version: self.version,
            buckets: self.buckets,
            clamped: self.clamped,
            sort_time: self.sort_time,
        }
    }

    fn from_result(result: SortResult) -> Self {
        Self {
            order: result.order,
            count: result.count,
            version: result.version,
            sort_time: result.sort_time,
            clamped: result.clamped,
            buckets: result.buckets,
        }
    }
}

/// Owns the sort worker and the order-buffer pool; tracks layout
/// versions so stale results are never applied.
pub struct UnifiedSorter {
    tx: Sender<WorkerRequest>,
    rx: Receiver<SortResult>,
    handle: Option<JoinHandle<()>>,
    config: SorterConfig,

    pool: Vec<Vec<u32>>,
    order_len: usize,
    in_flight: usize,

    layout_version: u64,
    /// Results below this version belong to a retired set of splats and
    /// must never reach the caller.
    sorted_version_min: u64,
    applied_version: u64,
    pending: Option<SortResult>,

    /// Center removals deferred until a sorted result confirms the
    /// worker is past the version that still referenced them.
    pending_removals: Vec<(SplatSetId, u64)>,

    stale_results: u64,
    skipped_requests: u64,
}

impl Default for UnifiedSorter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnifiedSorter {
    pub fn new() -> Self {
        Self::with_config(SorterConfig::default())
    }

    pub fn with_config(config: SorterConfig) -> Self {
        let (req_tx, req_rx) = channel();
        let (res_tx, res_rx) = channel();
        let limits = WorkerLimits {
            min_bits: config.min_bits,
            max_bits: config.max_bits,
        };
        let handle = thread::spawn(move || worker::run(req_rx, res_tx, limits));

        let pool = (0..config.pool_size.max(1)).map(|_| Vec::new()).collect();
        Self {
            tx: req_tx,
            rx: res_rx,
            handle: Some(handle),
            config,
            pool,
            order_len: 0,
            in_flight: 0,
            layout_version: 0,
            sorted_version_min: 1,
            applied_version: 0,
            pending: None,
            pending_removals: Vec::new(),
            stale_results: 0,
            skipped_requests: 0,
        }
    }

    /// Registers (or replaces) the centers of a splat set. Cancels a
    /// pending removal of the same id.
    pub fn set_centers(&mut self, id: SplatSetId, centers: Vec<f32>) -> Result<(), SorterError> {
        self.pending_removals.retain(|(pending, _)| *pending != id);
        self.invalidate();
        self.send(WorkerRequest::SetCenters {
            id,
            centers: Arc::new(centers),
        })
    }

    /// Schedules removal of a splat set. The worker keeps the centers
    /// until a sorted result shows it has moved past the last layout
    /// that referenced them.
    pub fn remove_centers(&mut self, id: SplatSetId) {
        self.pending_removals.push((id, self.layout_version + 1));
        self.invalidate();
    }

    /// Publishes a new unified-buffer layout. Returns the stamped
    /// version; results carry it back.
    pub fn set_layout(&mut self, mut layout: CentersLayout) -> Result<u64, SorterError> {
        self.layout_version += 1;
        layout.version = self.layout_version;
        self.order_len = layout.total_used_pixels as usize;
        self.send(WorkerRequest::SetLayout(layout))?;
        Ok(self.layout_version)
    }

    /// Dispatches a sort if an order buffer is free. Returns `false`
    /// when the pool is exhausted (all buffers in flight or lent out) —
    /// the frame simply goes without a fresh sort.
    pub fn request_sort(
        &mut self,
        params: Vec<SplatSortParams>,
        mode: SortMode,
    ) -> Result<bool, SorterError> {
        if self.layout_version == 0 {
            return Err(SorterError::NoLayout);
        }
        self.collect()?;

        let Some(mut order) = self.pool.pop() else {
            self.skipped_requests += 1;
            tracing::trace!("sort skipped, no free order buffer");
            return Ok(false);
        };
        order.resize(self.order_len, 0);

        self.send(WorkerRequest::Sort {
            params,
            mode,
            order,
        })?;
        self.in_flight += 1;
        Ok(true)
    }

    /// Pulls the newest finished permutation, if any. Stale and
    /// overtaken results are recycled on the way.
    pub fn apply_pending(&mut self) -> Result<Option<SortedFrame>, SorterError> {
        self.collect()?;
        match self.pending.take() {
            Some(result) => {
                self.applied_version = result.version;
                tracing::debug!(version = result.version, count = result.count, "order applied");
                Ok(Some(SortedFrame::from_result(result)))
            }
            None => Ok(None),
        }
    }

    /// Returns a consumed frame's buffer to the pool.
    pub fn recycle(&mut self, frame: SortedFrame) {
        self.recycle_buffer(frame.order);
    }

    /// Sorts currently running or queued on the worker.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Free order buffers available for dispatch.
    pub fn free_buffers(&self) -> usize {
        self.pool.len()
    }

    /// Results dropped because a newer one arrived or their layout was
    /// retired.
    pub fn stale_results(&self) -> u64 {
        self.stale_results
    }

    /// Sort requests skipped because no buffer was free.
    pub fn skipped_requests(&self) -> u64 {
        self.skipped_requests
    }

    pub fn layout_version(&self) -> u64 {
        self.layout_version
    }

    pub fn applied_version(&self) -> u64 {
        self.applied_version
    }

    /// Blocks until every in-flight sort has come back, then applies the
    /// newest. For frame loops prefer the non-blocking
    /// [`Self::apply_pending`].
    pub fn wait_apply(&mut self) -> Result<Option<SortedFrame>, SorterError> {
        while self.in_flight > 0 {
            let result = self
                .rx
                .recv()
                .map_err(|_| SorterError::WorkerDisconnected)?;
            self.in_flight -= 1;
            self.absorb(result);
        }
        self.apply_pending()
    }

    /// Shuts the worker down and waits for it to exit.
    pub fn shutdown(mut self) {
        let handle = self.handle.take();
        drop(self);
        if let Some(handle) = handle {
            let _ = handle.join();
        }
    }

    fn invalidate(&mut self) {
        // orders sorted against layouts that still contained (or were
        // missing) the changed set can no longer be used
        self.sorted_version_min = self.layout_version + 1;
    }

    fn send(&self, request: WorkerRequest) -> Result<(), SorterError> {
        self.tx
            .send(request)
            .map_err(|_| SorterError::WorkerDisconnected)
    }

    fn collect(&mut self) -> Result<(), SorterError> {
        loop {
            match self.rx.try_recv() {
                Ok(result) => {
                    self.in_flight -= 1;
                    self.absorb(result);
                }
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(SorterError::WorkerDisconnected),
            }
        }
    }

    fn absorb(&mut self, result: SortResult) {
        if result.version < self.sorted_version_min || result.version < self.applied_version {
            self.stale_results += 1;
            tracing::trace!(version = result.version, "stale order recycled");
            self.recycle_buffer(result.order);
            return;
        }

        // results arrive in completion order; an unconsumed older one is
        // overtaken
        if let Some(previous) = self.pending.take() {
            self.stale_results += 1;
            self.recycle_buffer(previous.order);
        }
        self.flush_removals(result.version);
        self.pending = Some(result);
    }

    /// Sends deferred center removals whose retirement version has been
    /// confirmed by a sorted result.
    fn flush_removals(&mut self, version: u64) {
        if self.pending_removals.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_removals);
        for (id, removal_version) in pending {
            if version >= removal_version {
                if self.send(WorkerRequest::RemoveCenters { id }).is_err() {
                    tracing::warn!(?id, "worker gone before deferred removal");
                }
            } else {
                self.pending_removals.push((id, removal_version));
            }
        }
    }

    fn recycle_buffer(&mut self, order: Vec<u32>) {
        if self.pool.len() < self.config.pool_size.max(1) {
            self.pool.push(order);
        }
    }
}
