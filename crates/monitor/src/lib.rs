//! Drowsiness Monitor
//!
//! Replays a recorded landmark stream through a detection session.

use alerting::{AlertSink, Clock, ManualClock};
use anyhow::{Context, Result};
use dms::{DetectionSession, LandmarkEvent, LandmarkFrame, LandmarkSource, Point2, SessionStats};
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;
use storage::StoredEvent;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Nominal spacing of recorded frames (~30 fps)
pub const FRAME_INTERVAL: Duration = Duration::from_millis(33);

/// Spacing of recorded frames at `fps`, or [`FRAME_INTERVAL`] when unset
pub fn frame_interval(fps: Option<f32>) -> Duration {
    match fps {
        Some(fps) if fps.is_finite() && fps > 0.0 => Duration::from_secs_f64(1.0 / f64::from(fps)),
        _ => FRAME_INTERVAL,
    }
}

/// Initialize logging to stderr.
///
/// `RUST_LOG` overrides the default `info` filter.
pub fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    let result = if json {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("Logging already initialized: {}", e);
    }
}

/// Landmark source backed by a JSON-lines recording.
///
/// Each line is either `null` (no face) or an array of `[x, y]` pairs.
/// Lines that fail to parse become empty frames, so they still take up
/// one frame interval.
#[derive(Debug, Clone, Default)]
pub struct JsonLinesSource {
    events: Vec<LandmarkEvent>,
    position: usize,
}

impl JsonLinesSource {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open landmark recording {}", path.display()))?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut events = Vec::new();

        for (number, line) in reader.lines().enumerate() {
            let line = line.context("failed to read landmark recording")?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            // A broken line still occupies a frame slot and measures as open eyes
            let event = match serde_json::from_str::<Option<Vec<(f32, f32)>>>(line) {
                Ok(points) => LandmarkEvent::from(points.map(|points| {
                    points.into_iter().map(Point2::from).collect::<LandmarkFrame>()
                })),
                Err(e) => {
                    warn!("Malformed frame on line {}: {}", number + 1, e);
                    LandmarkEvent::Frame(LandmarkFrame::default())
                }
            };
            events.push(event);
        }

        debug!("Loaded {} landmark events", events.len());
        Ok(Self {
            events,
            position: 0,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl LandmarkSource for JsonLinesSource {
    fn next_event(&mut self) -> Option<LandmarkEvent> {
        let event = self.events.get(self.position).cloned()?;
        self.position += 1;
        Some(event)
    }

    fn restart(&mut self) {
        self.position = 0;
    }
}

/// Feed `source` into `session`, advancing `clock` one frame interval per event
pub fn replay<S, L>(
    session: &mut DetectionSession<S, ManualClock>,
    source: &mut L,
    clock: &ManualClock,
    interval: Duration,
) -> SessionStats
where
    S: AlertSink,
    L: LandmarkSource + ?Sized,
{
    session.start();
    while let Some(event) = source.next_event() {
        clock.advance(interval);
        session.process(event);
    }
    debug!("Replay finished at {}ms", clock.now().as_millis());
    session.stats().clone()
}

/// Summary printed when a replay finishes
#[derive(Debug, Serialize)]
pub struct Report {
    pub stats: SessionStats,
    pub events: Vec<StoredEvent>,
}
