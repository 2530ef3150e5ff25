// src/main.rs

use anyhow::{Context, Result};
use bout_vision::pipeline::{BoutPhase, BoutPipeline};
use bout_vision::source::{DetectionSource, JsonlDetectionSource};
use bout_vision::types::Config;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.yaml".to_string());
    let config = Config::load(&config_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(format!("bout_vision={}", config.logging.level))
        .init();

    info!("🤺 Fencer tracking pipeline starting");
    info!("✓ Configuration loaded from {}", config_path);
    info!(
        "Tracking: max_distance={:.0}px, dropout_tolerance={} frames, policy={:?}",
        config.tracking.max_tracking_distance,
        config.tracking.dropout_tolerance,
        config.tracking.loss_policy
    );

    let mut pipeline = BoutPipeline::new(&config)?;
    if pipeline.phase() == BoutPhase::AwaitingCalibration {
        warn!("No piste area in config - waiting for calibration from the control surface");
    }

    let mut source = JsonlDetectionSource::open(&config.io.detections_path)?;

    std::fs::create_dir_all(&config.io.output_dir)
        .with_context(|| format!("failed to create output dir {}", config.io.output_dir))?;
    let snapshots_path = Path::new(&config.io.output_dir).join("snapshots.jsonl");
    let mut snapshots_file = std::fs::File::create(&snapshots_path)
        .with_context(|| format!("failed to create {}", snapshots_path.display()))?;
    info!("💾 Snapshots will be written to {}", snapshots_path.display());

    let mut frame_count: u64 = 0;
    while let Some(detections) = source.next_frame()? {
        frame_count += 1;
        let snapshot = pipeline.process_frame(&detections);

        let json_line = serde_json::to_string(&snapshot)?;
        writeln!(snapshots_file, "{}", json_line)?;

        if frame_count % 100 == 0 {
            let status = snapshot
                .validation
                .as_ref()
                .map(|v| v.status.as_str())
                .unwrap_or("-");
            info!(
                "Frame {}: phase={} | {}",
                frame_count,
                snapshot.phase.as_str(),
                status
            );
        }
    }
    snapshots_file.flush()?;

    let summary = pipeline.metrics().summary();
    info!("📊 Final report:");
    info!("  Total frames: {}", summary.total_frames);
    info!(
        "  Tracking frames: {} ({:.1}%)",
        summary.frames_tracking,
        100.0 * summary.frames_tracking as f64 / summary.total_frames.max(1) as f64
    );
    info!("  Both on guard: {} frame(s)", summary.frames_both_on_guard);
    info!("  Locks: {}", summary.locks);
    if summary.tracks_frozen > 0 {
        warn!("  Tracks frozen: {}", summary.tracks_frozen);
    }
    if summary.sessions_reset > 0 {
        warn!("  Sessions reset after tracking loss: {}", summary.sessions_reset);
    }
    info!("  Processing speed: {:.1} FPS", summary.fps);

    Ok(())
}
