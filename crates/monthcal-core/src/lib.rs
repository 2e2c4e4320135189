//! Core types: time windows, display events, tracing

pub mod event;
pub mod time;
pub mod tracing;

pub use event::{DisplayEvent, EventsView, INVALID_DATE};
pub use time::{TimeWindow, add_calendar_months};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
