//! Station Wiring
//!
//! Owns every piece of runtime state and the scheduler that drives it.
//!
//! ## Start-up Sequence
//!
//! ```text
//! validate config
//! connect link          non-fatal: the maintenance task keeps retrying
//! check time sync       non-fatal: timestamps read "Time Error!" until synced
//! mount log store       FATAL: start() returns StoreMountFailed
//! register tasks        sample, status, requests, connectivity, time sync
//! ```
//!
//! After `start` the caller drives the loop with [`Station::poll`] (one pass
//! at the clock's current time), [`Station::tick`] (explicit time, for
//! tests) or [`Station::run`].

mod tasks;

use alloc::boxed::Box;

use crate::alert::AlertGate;
use crate::buffer::WriteBuffer;
use crate::config::StationConfig;
use crate::connectivity::ConnectivitySupervisor;
use crate::constants::buffers::LOG_BUFFER_CAPACITY;
use crate::errors::{StationError, StationResult};
use crate::history::HistoricalReader;
use crate::record::LogRecord;
use crate::scheduler::{Scheduler, TaskId, TickReport};
use crate::service::RequestListener;
use crate::store::LogStore;
use crate::time::{Delay, TimeSource, TimeSync, Timestamp, WallClock};
use crate::traits::{Display, Link, Mailer, Sensor};

/// Collaborators the station drives
pub struct Peripherals {
    /// Temperature and humidity sensor
    pub sensor: Box<dyn Sensor>,
    /// Network link
    pub link: Box<dyn Link>,
    /// Alert transport
    pub mailer: Box<dyn Mailer>,
    /// Local display
    pub display: Box<dyn Display>,
    /// Inbound connections
    pub listener: Box<dyn RequestListener>,
    /// Wall clock for timestamps
    pub wall_clock: Box<dyn WallClock>,
    /// Monotonic clock for scheduling
    pub clock: Box<dyn TimeSource>,
    /// Bounded blocking delay
    pub delay: Box<dyn Delay>,
}

/// Everything the periodic tasks work on
pub struct StationState<S: LogStore> {
    config: StationConfig,
    store: S,
    buffer: WriteBuffer<LOG_BUFFER_CAPACITY>,
    reader: HistoricalReader,
    alert: AlertGate,
    connectivity: ConnectivitySupervisor,
    time_sync: TimeSync,
    sensor: Box<dyn Sensor>,
    mailer: Box<dyn Mailer>,
    display: Box<dyn Display>,
    listener: Box<dyn RequestListener>,
    wall_clock: Box<dyn WallClock>,
    clock: Box<dyn TimeSource>,
    delay: Box<dyn Delay>,
    last_record: Option<LogRecord>,
    requests_served: u32,
}

impl<S: LogStore> StationState<S> {
    /// Active configuration
    pub fn config(&self) -> &StationConfig {
        &self.config
    }

    /// Log store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Pending records
    pub fn buffer(&self) -> &WriteBuffer<LOG_BUFFER_CAPACITY> {
        &self.buffer
    }

    /// Alert gate
    pub fn alert(&self) -> &AlertGate {
        &self.alert
    }

    /// Connectivity supervisor
    pub fn connectivity(&self) -> &ConnectivitySupervisor {
        &self.connectivity
    }

    /// Time-sync tracker
    pub fn time_sync(&self) -> &TimeSync {
        &self.time_sync
    }

    /// Most recent sample
    pub fn last_record(&self) -> Option<&LogRecord> {
        self.last_record.as_ref()
    }

    /// Dashboard requests served
    pub fn requests_served(&self) -> u32 {
        self.requests_served
    }
}

/// Task identifiers assigned at start-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationTasks {
    /// Sample + log
    pub sample: TaskId,
    /// Link status report
    pub status: TaskId,
    /// Inbound request service
    pub requests: TaskId,
    /// Connectivity maintenance
    pub connectivity: TaskId,
    /// Time-sync retry
    pub time_sync: TaskId,
}

/// The running monitor
pub struct Station<S: LogStore + 'static> {
    scheduler: Scheduler<StationState<S>>,
    tasks: StationTasks,
    state: StationState<S>,
}

impl<S: LogStore + 'static> Station<S> {
    /// Run the start-up sequence and register the periodic tasks
    ///
    /// Fails only on an invalid configuration or an unmountable store.
    pub fn start(config: StationConfig, mut store: S, peripherals: Peripherals) -> StationResult<Self> {
        config.validate()?;

        let Peripherals { sensor, link, mailer, mut display, listener, wall_clock, clock, mut delay } =
            peripherals;

        display.show_status("Starting...");
        let mut connectivity = ConnectivitySupervisor::new(link, config.reconnect);
        connectivity.connect(clock.as_ref(), delay.as_mut());

        let mut time_sync = TimeSync::new();
        if time_sync.check(wall_clock.as_ref()).is_err() {
            log_warn!("Starting without wall-clock time");
        }

        if let Err(err) = store.mount() {
            log_error!("Log store mount failed: {}", err);
            display.show_status("Storage failed");
            return Err(StationError::StoreMountFailed { reason: "log store could not be mounted" });
        }
        log_info!("Log store ready");

        let start = clock.now();
        let intervals = config.intervals;
        let mut scheduler = Scheduler::new();
        let tasks = StationTasks {
            sample: scheduler.register_at("sample_and_log", intervals.sample_ms, start, tasks::sample_and_log::<S>)?,
            status: scheduler.register_at("report_status", intervals.status_ms, start, tasks::report_status::<S>)?,
            requests: scheduler.register_at("serve_requests", intervals.request_ms, start, tasks::serve_requests::<S>)?,
            connectivity: scheduler.register_at(
                "maintain_connectivity",
                intervals.connectivity_ms,
                start,
                tasks::maintain_connectivity::<S>,
            )?,
            time_sync: scheduler.register_at("check_time_sync", intervals.time_sync_ms, start, tasks::check_time_sync::<S>)?,
        };

        let state = StationState {
            reader: HistoricalReader::new(config.history),
            alert: AlertGate::new(config.alert),
            config,
            store,
            buffer: WriteBuffer::new(),
            connectivity,
            time_sync,
            sensor,
            mailer,
            display,
            listener,
            wall_clock,
            clock,
            delay,
            last_record: None,
            requests_served: 0,
        };

        log_info!("Station started with {} tasks", scheduler.len());
        Ok(Self { scheduler, tasks, state })
    }

    /// One scheduler pass at the clock's current time
    pub fn poll(&mut self) -> TickReport {
        let now = self.state.clock.now();
        self.tick(now)
    }

    /// One scheduler pass at `now`
    pub fn tick(&mut self, now: Timestamp) -> TickReport {
        self.scheduler.tick(now, &mut self.state)
    }

    /// Poll until `keep_running` returns false
    pub fn run<F>(&mut self, mut keep_running: F)
    where
        F: FnMut(&StationState<S>) -> bool,
    {
        while keep_running(&self.state) {
            self.poll();
        }
    }

    /// Write pending records now
    pub fn flush(&mut self) -> StationResult<usize> {
        Ok(self.state.buffer.flush(&mut self.state.store)?)
    }

    /// Runtime state
    pub fn state(&self) -> &StationState<S> {
        &self.state
    }

    /// Log store
    pub fn store(&self) -> &S {
        &self.state.store
    }

    /// Scheduler (descriptors and per-task statistics)
    pub fn scheduler(&self) -> &Scheduler<StationState<S>> {
        &self.scheduler
    }

    /// Registered task identifiers
    pub fn tasks(&self) -> &StationTasks {
        &self.tasks
    }

    /// Flush pending records and hand back the store
    pub fn shutdown(mut self) -> S {
        if let Err(err) = self.flush() {
            log_error!("Final flush failed: {}", err);
        }
        self.state.store
    }
}
