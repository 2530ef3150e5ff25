// src/pipeline/metrics.rs
//
// Run-level observability for the tracking pipeline. Counters are atomics
// so a monitoring thread can read a clone while the frame loop writes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone)]
pub struct PipelineMetrics {
    pub total_frames: Arc<AtomicU64>,
    pub frames_tracking: Arc<AtomicU64>,
    pub frames_both_on_guard: Arc<AtomicU64>,
    pub locks: Arc<AtomicU64>,
    pub tracks_frozen: Arc<AtomicU64>,
    pub sessions_reset: Arc<AtomicU64>,
    pub started_at: Instant,
}

impl PipelineMetrics {
    pub fn new() -> Self {
        Self {
            total_frames: Arc::new(AtomicU64::new(0)),
            frames_tracking: Arc::new(AtomicU64::new(0)),
            frames_both_on_guard: Arc::new(AtomicU64::new(0)),
            locks: Arc::new(AtomicU64::new(0)),
            tracks_frozen: Arc::new(AtomicU64::new(0)),
            sessions_reset: Arc::new(AtomicU64::new(0)),
            started_at: Instant::now(),
        }
    }

    pub fn inc(&self, counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn fps(&self) -> f64 {
        let frames = self.total_frames.load(Ordering::Relaxed);
        let elapsed = self.started_at.elapsed().as_secs_f64();
        if elapsed > 0.01 {
            frames as f64 / elapsed
        } else {
            0.0
        }
    }

    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_frames: self.total_frames.load(Ordering::Relaxed),
            frames_tracking: self.frames_tracking.load(Ordering::Relaxed),
            frames_both_on_guard: self.frames_both_on_guard.load(Ordering::Relaxed),
            locks: self.locks.load(Ordering::Relaxed),
            tracks_frozen: self.tracks_frozen.load(Ordering::Relaxed),
            sessions_reset: self.sessions_reset.load(Ordering::Relaxed),
            fps: self.fps(),
            elapsed_secs: self.started_at.elapsed().as_secs_f64(),
        }
    }
}

impl Default for PipelineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct MetricsSummary {
    pub total_frames: u64,
    pub frames_tracking: u64,
    pub frames_both_on_guard: u64,
    pub locks: u64,
    pub tracks_frozen: u64,
    pub sessions_reset: u64,
    pub fps: f64,
    pub elapsed_secs: f64,
}
