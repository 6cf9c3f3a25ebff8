//! Core of the Frostwatch freezer monitor
//!
//! Samples an environmental sensor once a second, batches readings in a
//! bounded write buffer, appends them to a line-oriented log store and serves
//! a downsampled view of the log tail to one waiting peer at a time. All of it
//! runs on a single thread driven by a cooperative periodic scheduler.
//!
//! Key constraints:
//! - One thread of control, no locks
//! - Bounded memory on the read path (one line at a time)
//! - No failure outside start-up terminates the scheduler loop
//!
//! ```no_run
//! use frostwatch_core::{Scheduler, StationResult};
//!
//! struct Counter { ticks: u32 }
//!
//! let mut scheduler: Scheduler<Counter> = Scheduler::new();
//! scheduler
//!     .register("count", 1000, |c: &mut Counter, _now: u64| -> StationResult<()> {
//!         c.ticks += 1;
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let mut counter = Counter { ticks: 0 };
//! scheduler.tick(1000, &mut counter);
//! assert_eq!(counter.ticks, 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod macros;

pub mod alert;
pub mod buffer;
pub mod config;
pub mod connectivity;
pub mod constants;
pub mod dashboard;
pub mod errors;
pub mod history;
pub mod record;
pub mod scheduler;
pub mod service;
pub mod station;
pub mod store;
pub mod time;
pub mod traits;

// Public API
pub use alert::{AlertGate, AlertPolicy};
pub use buffer::WriteBuffer;
pub use config::StationConfig;
pub use connectivity::{ConnectivityState, ConnectivitySupervisor, ReconnectPolicy};
pub use errors::{StationError, StationResult};
pub use history::{HistoricalReader, HistoryQuery, PartialLinePolicy, Series};
pub use record::LogRecord;
pub use scheduler::{PeriodicTask, Scheduler, TaskDescriptor, TaskId};
pub use service::{Connection, RequestListener, ServiceError};
pub use station::{Peripherals, Station, StationState};
pub use store::{LogStore, MemoryLogStore, StoreError};

#[cfg(feature = "std")]
pub use store::FileLogStore;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
