//! Calendar providers and event normalization for calsnap.
//!
//! - [`CalendarProvider`] - the trait calendar backends implement
//! - [`RawEvent`] / [`EventSpan`] - events as a provider returned them
//! - [`normalize_events`] - raw events to a per-day [`calsnap_core::Report`]
//! - [`ProviderError`] - error type for provider operations
//!
//! ```text
//! ┌─────────────────┐
//! │  Google API     │
//! └────────┬────────┘
//!          ▼
//! ┌─────────────────┐
//! │ GoogleProvider  │  CalendarProvider
//! └────────┬────────┘
//!          ▼
//!    ┌───────────┐
//!    │ RawEvent  │
//!    └─────┬─────┘
//!          ▼ normalize_events()
//!    ┌───────────┐
//!    │  Report   │
//!    └───────────┘
//! ```

pub mod error;
#[cfg(feature = "google")]
pub mod google;
pub mod normalize;
pub mod provider;
pub mod raw_event;

pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use normalize::{DatedEvent, NormalizeError, normalize_event, normalize_events};
pub use provider::{BoxFuture, CalendarInfo, CalendarProvider, FetchOptions, FetchResult};
pub use raw_event::{EventSpan, RawEvent, RawEventTime};
