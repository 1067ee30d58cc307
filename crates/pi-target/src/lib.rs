//! Device-facing PI operations.
//!
//! This crate routes counter operations to per-device backends:
//!
//! - [`CounterTarget`]: the counter capability a backend implements
//! - [`PiDispatcher`]: device assignment and call forwarding
//! - [`DummyTarget`]: an in-memory backend
//! - [`PiError`] / [`PiStatus`]: status codes shared with backends

mod counter;
mod dummy;
mod error;
mod types;

pub use counter::{CounterTarget, PiDispatcher};
pub use dummy::DummyTarget;
pub use error::{PiError, PiResult, PiStatus};
pub use types::{CounterData, CounterReadFlags, CounterUnits, DevTgt, EntryHandle, SessionHandle};
