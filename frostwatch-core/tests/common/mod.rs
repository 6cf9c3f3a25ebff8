//! Shared test rig for integration tests
//!
//! Scripted collaborators whose state is shared through `Rc` handles, so a
//! test can hand a collaborator to the station and still observe it:
//! - `ScriptedSensor`: replays a list of readings, repeating the last
//! - `RecordingMailer`: keeps every alert, can be told to fail
//! - `ScriptedLink`: up or down on command, counts `begin` calls
//! - `RecordingDisplay`: keeps status messages, counts readings
//! - `QueueListener`: hands out queued in-memory connections
//! - `SwitchableStore`: memory store whose availability can be toggled
//!
//! Time is a single `MockTimeSource`; the station's delay is a clone of it,
//! so reconnect waits advance the same clock the test reads.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use chrono::{NaiveDate, NaiveDateTime};
use frostwatch_core::errors::{StationError, StationResult};
use frostwatch_core::service::{Connection, RequestListener, ServiceError};
use frostwatch_core::store::memory::{MemoryAppender, MemoryReader};
use frostwatch_core::store::{LogStore, MemoryLogStore, StoreError};
use frostwatch_core::time::{MockTimeSource, MockWallClock};
use frostwatch_core::traits::{Display, Link, LinkStatus, Mailer, ReadingView, Sensor};
use frostwatch_core::Peripherals;

/// Wall-clock time at mock tick 0
pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 15)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

/// Convert °F to the °C a sensor would report
pub fn f_to_c(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// Sensor replaying scripted temperatures
pub struct ScriptedSensor {
    temperatures: VecDeque<StationResult<f32>>,
    last: StationResult<f32>,
    humidity: f32,
    reads: Rc<Cell<u32>>,
}

impl ScriptedSensor {
    /// Replay Celsius readings
    pub fn celsius(readings: impl IntoIterator<Item = StationResult<f32>>) -> Self {
        Self {
            temperatures: readings.into_iter().collect(),
            last: Ok(0.0),
            humidity: 55.0,
            reads: Rc::new(Cell::new(0)),
        }
    }

    /// Replay Fahrenheit readings (converted to Celsius)
    pub fn fahrenheit(readings: &[f32]) -> Self {
        Self::celsius(readings.iter().map(|f| Ok(f_to_c(*f))))
    }

    /// Constant reading
    pub fn steady(celsius: f32) -> Self {
        let mut sensor = Self::celsius(Vec::new());
        sensor.last = Ok(celsius);
        sensor
    }

    /// Handle counting temperature reads
    pub fn reads(&self) -> Rc<Cell<u32>> {
        self.reads.clone()
    }
}

impl Sensor for ScriptedSensor {
    fn read_temperature_c(&mut self) -> StationResult<f32> {
        self.reads.set(self.reads.get() + 1);
        if let Some(next) = self.temperatures.pop_front() {
            self.last = next;
        }
        self.last
    }

    fn read_humidity(&mut self) -> StationResult<f32> {
        Ok(self.humidity)
    }
}

/// Mailer recording every alert
#[derive(Clone, Default)]
pub struct RecordingMailer {
    pub sent: Rc<RefCell<Vec<(String, String)>>>,
    pub fail: Rc<Cell<bool>>,
}

impl RecordingMailer {
    pub fn count(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl Mailer for RecordingMailer {
    fn send_alert(&mut self, subject: &str, body: &str) -> StationResult<()> {
        self.sent.borrow_mut().push((subject.to_string(), body.to_string()));
        if self.fail.get() {
            Err(StationError::AlertDeliveryFailed { reason: "scripted failure" })
        } else {
            Ok(())
        }
    }
}

/// Link that is up or down on command
#[derive(Clone)]
pub struct ScriptedLink {
    pub up: Rc<Cell<bool>>,
    pub begins: Rc<Cell<u32>>,
    pub rssi: i32,
}

impl ScriptedLink {
    pub fn new(up: bool) -> Self {
        Self { up: Rc::new(Cell::new(up)), begins: Rc::new(Cell::new(0)), rssi: -67 }
    }
}

impl Link for ScriptedLink {
    fn status(&mut self) -> LinkStatus {
        if self.up.get() {
            LinkStatus::Connected
        } else {
            LinkStatus::ConnectionLost
        }
    }

    fn begin(&mut self) {
        self.begins.set(self.begins.get() + 1);
    }

    fn signal_strength(&mut self) -> i32 {
        self.rssi
    }
}

/// Display recording what it was asked to show
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    pub statuses: Rc<RefCell<Vec<String>>>,
    pub readings: Rc<Cell<u32>>,
}

impl Display for RecordingDisplay {
    fn show_reading(&mut self, _reading: &ReadingView<'_>) {
        self.readings.set(self.readings.get() + 1);
    }

    fn show_status(&mut self, message: &str) {
        self.statuses.borrow_mut().push(message.to_string());
    }
}

/// In-memory peer connection with shared output
#[derive(Clone, Default)]
pub struct SharedConnection {
    input: Rc<RefCell<VecDeque<u8>>>,
    pub output: Rc<RefCell<Vec<u8>>>,
    pub closed: Rc<Cell<bool>>,
}

impl SharedConnection {
    pub fn with_request(request: &str) -> Self {
        let conn = Self::default();
        conn.input.borrow_mut().extend(request.bytes());
        conn
    }

    pub fn response(&self) -> String {
        String::from_utf8_lossy(&self.output.borrow()).into_owned()
    }
}

impl Connection for SharedConnection {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, ServiceError> {
        let mut input = self.input.borrow_mut();
        let mut n = 0;
        while n < buf.len() {
            match input.pop_front() {
                Some(byte) => {
                    buf[n] = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }

    fn write_all(&mut self, data: &[u8]) -> Result<(), ServiceError> {
        if self.closed.get() {
            return Err(ServiceError::Closed);
        }
        self.output.borrow_mut().extend_from_slice(data);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ServiceError> {
        self.closed.set(true);
        Ok(())
    }
}

/// Listener handing out queued connections
#[derive(Clone, Default)]
pub struct QueueListener {
    pending: Rc<RefCell<VecDeque<SharedConnection>>>,
}

impl QueueListener {
    /// Queue a peer; returns a handle to observe it
    pub fn connect(&self, request: &str) -> SharedConnection {
        let conn = SharedConnection::with_request(request);
        self.pending.borrow_mut().push_back(conn.clone());
        conn
    }
}

impl RequestListener for QueueListener {
    fn poll_request(&mut self) -> nb::Result<Box<dyn Connection>, ServiceError> {
        match self.pending.borrow_mut().pop_front() {
            Some(conn) => Ok(Box::new(conn)),
            None => Err(nb::Error::WouldBlock),
        }
    }
}

/// Memory store whose opens can be made to fail after start-up
pub struct SwitchableStore {
    pub inner: MemoryLogStore,
    pub available: Rc<Cell<bool>>,
}

impl SwitchableStore {
    pub fn new() -> Self {
        Self { inner: MemoryLogStore::new(), available: Rc::new(Cell::new(true)) }
    }
}

impl LogStore for SwitchableStore {
    type Appender<'a> = MemoryAppender<'a>;
    type Reader<'a> = MemoryReader<'a>;

    fn mount(&mut self) -> Result<(), StoreError> {
        self.inner.mount()
    }

    fn open_append(&mut self) -> Result<Self::Appender<'_>, StoreError> {
        if !self.available.get() {
            return Err(StoreError::Unavailable { operation: "open for append" });
        }
        self.inner.open_append()
    }

    fn open_read(&self) -> Result<Self::Reader<'_>, StoreError> {
        if !self.available.get() {
            return Err(StoreError::Unavailable { operation: "open for read" });
        }
        self.inner.open_read()
    }
}

/// Handles to every scripted collaborator
pub struct Rig {
    pub clock: MockTimeSource,
    pub wall: MockWallClock,
    pub mailer: RecordingMailer,
    pub link: ScriptedLink,
    pub display: RecordingDisplay,
    pub listener: QueueListener,
}

impl Rig {
    /// Link up, wall clock synced, clock at 0
    pub fn new() -> Self {
        let clock = MockTimeSource::new(0);
        Self {
            wall: MockWallClock::synced(base_time(), clock.clone()),
            clock,
            mailer: RecordingMailer::default(),
            link: ScriptedLink::new(true),
            display: RecordingDisplay::default(),
            listener: QueueListener::default(),
        }
    }

    /// Same, with the wall clock unsynchronized
    pub fn unsynced() -> Self {
        let rig = Self::new();
        rig.wall.set_base(None);
        rig
    }

    /// Peripherals sharing this rig's handles
    pub fn peripherals(&self, sensor: ScriptedSensor) -> Peripherals {
        Peripherals {
            sensor: Box::new(sensor),
            link: Box::new(self.link.clone()),
            mailer: Box::new(self.mailer.clone()),
            display: Box::new(self.display.clone()),
            listener: Box::new(self.listener.clone()),
            wall_clock: Box::new(self.wall.clone()),
            clock: Box::new(self.clock.clone()),
            delay: Box::new(self.clock.clone()),
        }
    }
}
