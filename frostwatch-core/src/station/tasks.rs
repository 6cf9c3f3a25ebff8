//! Periodic task actions
//!
//! Plain functions over [`StationState`], registered with the scheduler at
//! start-up. Each returns the first error it hit after doing as much of its
//! work as it could.

use super::StationState;
use crate::errors::{StationError, StationResult};
use crate::record::{celsius_to_fahrenheit, LogRecord};
use crate::service;
use crate::store::LogStore;
use crate::time::{timestamp_text, Timestamp};
use crate::traits::ReadingView;

/// Sample the sensor, buffer the record, update the display, check the alert
pub(super) fn sample_and_log<S: LogStore>(state: &mut StationState<S>, now: Timestamp) -> StationResult<()> {
    let (humidity, humidity_err) = read_or_nan(state.sensor.read_humidity(), "humidity");
    let (celsius, temperature_err) = read_or_nan(state.sensor.read_temperature_c(), "temperature");
    let temperature_f = celsius_to_fahrenheit(celsius);

    let timestamp = timestamp_text(state.wall_clock.as_ref());
    let uptime_hours = state.connectivity.uptime_hours(now);
    let signal_strength = state.connectivity.signal_strength();
    let record = LogRecord::new(&timestamp, temperature_f, humidity, uptime_hours, signal_strength);

    state.display.show_reading(&ReadingView {
        timestamp: &record.timestamp,
        temperature_f,
        humidity,
        uptime_hours,
    });
    log_info!("{}", record);

    let flushed = state.buffer.append(record.clone(), &mut state.store);
    state.alert.check_and_send(temperature_f, now, state.mailer.as_mut());
    state.last_record = Some(record);

    flushed?;
    match temperature_err.or(humidity_err) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Log and display the detailed link status
pub(super) fn report_status<S: LogStore>(state: &mut StationState<S>, _now: Timestamp) -> StationResult<()> {
    let status = state.connectivity.report();
    state.display.show_status(status.describe());
    Ok(())
}

/// Serve the dashboard to at most one waiting peer
pub(super) fn serve_requests<S: LogStore>(state: &mut StationState<S>, _now: Timestamp) -> StationResult<()> {
    let served = service::serve_one(
        state.listener.as_mut(),
        &state.store,
        &state.reader,
        state.wall_clock.as_ref(),
    )?;
    if served.is_some() {
        state.requests_served = state.requests_served.saturating_add(1);
    }
    Ok(())
}

/// Reconnect if the link dropped
pub(super) fn maintain_connectivity<S: LogStore>(
    state: &mut StationState<S>,
    _now: Timestamp,
) -> StationResult<()> {
    state.connectivity.check(state.clock.as_ref(), state.delay.as_mut())
}

/// Retry wall-clock sync until it succeeds once
pub(super) fn check_time_sync<S: LogStore>(state: &mut StationState<S>, _now: Timestamp) -> StationResult<()> {
    state.time_sync.check(state.wall_clock.as_ref())
}

/// Turn a failed or non-finite read into NaN plus the error to report
fn read_or_nan(reading: StationResult<f32>, quantity: &'static str) -> (f32, Option<StationError>) {
    match reading {
        Ok(value) if value.is_finite() => (value, None),
        Ok(_) => {
            log_warn!("Sensor returned no {} reading", quantity);
            (f32::NAN, Some(StationError::SensorReadFailure { reason: quantity }))
        }
        Err(err) => {
            log_warn!("Sensor {} read failed: {}", quantity, err);
            (f32::NAN, Some(StationError::SensorReadFailure { reason: quantity }))
        }
    }
}
