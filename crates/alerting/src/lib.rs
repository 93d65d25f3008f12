//! Alerting System
//!
//! Provides the driver-facing alert vocabulary, tone patterns, a monotonic
//! clock abstraction, and time-based emission throttling.

mod clock;
mod throttle;
mod sink;

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use throttle::{EmitThrottle, ThrottleConfig};
pub use sink::{AlertKind, AlertSink, RecordingSink, SinkCall, Severity, TonePattern, TracingSink};
