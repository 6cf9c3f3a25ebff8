//! Core Traits and Abstractions for Frostwatch
//!
//! Everything the core does not own is reached through a trait defined here.
//!
//! ## Module Organization
//!
//! - [`time`] - monotonic clock, bounded delay, wall clock
//! - [`peripherals`] - sensor, link, mailer and display contracts
//!
//! The log store contract lives with its implementations in
//! [`crate::store`], and the inbound connection contract in
//! [`crate::service`].

pub mod peripherals;
pub mod time;

pub use peripherals::{Display, Link, LinkStatus, Mailer, NullDisplay, ReadingView, Sensor};
pub use time::{Delay, TimeSource, WallClock};
