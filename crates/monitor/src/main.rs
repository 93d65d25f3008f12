//! Drowsiness Monitor - Main Entry Point

use alerting::{ManualClock, TracingSink};
use anyhow::{bail, Result};
use dms::{DetectionSession, DmsConfig};
use drowsiness_monitor::{frame_interval, init_logging, replay, JsonLinesSource, Report};
use std::path::PathBuf;
use std::sync::Arc;
use storage::{EventWriter, Repository};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let json_logs = std::env::var("DMS_LOG_JSON").map_or(false, |v| v == "1" || v == "true");
    init_logging(json_logs);

    let mut args = std::env::args().skip(1);
    let Some(recording) = args.next().map(PathBuf::from) else {
        bail!("usage: drowsiness-monitor <landmarks.jsonl> [config.toml]");
    };
    let config_path = args.next().map(PathBuf::from);

    info!("=== Drowsiness Monitor v{} ===", env!("CARGO_PKG_VERSION"));

    let config = DmsConfig::load(config_path.as_deref())?;
    info!("Monitoring vehicle {}", config.vehicle_id);

    let repository = Arc::new(Repository::new());
    let (writer, writer_handle) = EventWriter::spawn(repository.clone());

    let clock = ManualClock::new();
    let mut session = DetectionSession::new(&config, TracingSink, Box::new(writer), clock.clone())?;
    session.on_detection(|state, ear| info!(ear, "Detection: {}", state));

    let mut source = JsonLinesSource::open(&recording)?;
    info!("Replaying {} landmark events from {}", source.len(), recording.display());

    let stats = replay(&mut session, &mut source, &clock, frame_interval(config.fps));
    session.stop();
    drop(session);

    let written = writer_handle.await?;
    info!("Replay complete, {} events persisted", written);

    let report = Report {
        stats,
        events: repository.get_events(None, usize::MAX)?,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
