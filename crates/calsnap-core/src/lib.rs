//! Core types: date window, report zone, day schedule report, tracing

pub mod error;
pub mod report;
pub mod time;
pub mod tracing;

pub use error::{CoreError, CoreResult};
pub use report::{DaySchedule, MINUTES_PER_DAY, NormalizedEvent, Report, UNTITLED_EVENT};
pub use time::{DateWindow, ReportTimeZone, TimeWindow};
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
