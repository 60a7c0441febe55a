//! SteadyView - jitter stabilization and region tracking demo.
//!
//! Usage: `steadyview [config.json] [frames]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use steadyview_app::{FramePipeline, PipelineConfig, SyntheticConfig, SyntheticSequence};
use steadyview_core::Point;
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const DEFAULT_FRAMES: usize = 120;

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => PipelineConfig::load(&path)?,
        None => PipelineConfig::default(),
    };
    let frames = args
        .next()
        .map(|s| s.parse::<usize>())
        .transpose()
        .context("frame count must be a non-negative integer")?
        .unwrap_or(DEFAULT_FRAMES);

    info!("SteadyView starting...");

    let synthetic = SyntheticConfig::default();
    let (width, height) = (synthetic.width, synthetic.height);
    let mut pipeline = FramePipeline::new(width, height, config)?;
    let timing = pipeline.subscribe_timing();
    // Select the scene centre; it takes effect on the first processed frame.
    pipeline
        .selection_handle()
        .select(Point::new(width as i32 / 2, height as i32 / 2));

    let mut locked_frames = 0usize;
    let mut guidance_events = 0usize;
    let mut residual_sum = 0.0f64;
    let mut timings: Vec<f64> = Vec::new();
    for item in SyntheticSequence::new(synthetic).take(frames) {
        let out = pipeline.process(&item.frame)?;
        let v = out.motion.vector;
        // Content moved by -jitter; compensation should cancel it.
        let residual = Point::new(v.dx, v.dy) - item.jitter;
        residual_sum += f64::from(residual.x.abs() + residual.y.abs());
        if out.track.locked {
            locked_frames += 1;
        }
        debug!(
            frame = item.index,
            jitter_x = item.jitter.x,
            jitter_y = item.jitter.y,
            dx = v.dx,
            dy = v.dy,
            track_x = out.track.point.x,
            track_y = out.track.point.y,
            state = ?out.track.state,
            "Frame processed"
        );
        if let Some(offset) = out.guidance {
            guidance_events += 1;
            info!(dx = offset.dx, dy = offset.dy, "Target off centre");
        }
        if let Some(t) = out.timing {
            info!(average_ms = t.as_millis_f64(), frames = t.frames, "Processing time");
        }
        timings.extend(timing.try_iter().map(|t| t.as_millis_f64()));
    }

    let summary = serde_json::json!({
        "frames": frames,
        "locked_frames": locked_frames,
        "guidance_events": guidance_events,
        "mean_residual_px": if frames > 0 { residual_sum / frames as f64 } else { 0.0 },
        "final_point": [pipeline.tracker().tracking_point().x, pipeline.tracker().tracking_point().y],
        "timing_ms": timings,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
