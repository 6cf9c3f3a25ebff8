//! Cooperative Periodic-Task Scheduler
//!
//! ## Overview
//!
//! A single-threaded loop over a fixed table of periodic tasks. Every pass
//! (`tick`) walks the table in registration order and runs each task whose
//! interval has elapsed, synchronously and to completion:
//!
//! ```text
//! tick(now):
//!   for task in table (registration order):
//!       if now - task.last_run_ms >= task.interval_ms:
//!           task.run(ctx, now)            // may fail, never aborts the pass
//!           task.last_run_ms = now
//! ```
//!
//! There is no preemption. A slow task delays every task after it in the same
//! pass, and every task in the next one.
//!
//! ## Context Passing
//!
//! Tasks do not own the state they work on. The scheduler is generic over a
//! context type `C` and lends `&mut C` to each task in turn, so the whole
//! station state is one owned struct with no globals and no interior
//! mutability.
//!
//! ## Failure Semantics
//!
//! A task returns [`StationResult`]. A failure is logged, counted in the
//! task's [`TaskStats`], and the task's `last_run_ms` still advances: it is
//! retried on its next interval, not on the next pass.

use alloc::boxed::Box;

use crate::constants::buffers::MAX_TASKS;
use crate::errors::{StationError, StationResult};
use crate::time::{TimeSource, Timestamp};

/// Identifier of a registered task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(usize);

impl TaskId {
    /// Position in the scheduling table
    pub const fn index(&self) -> usize {
        self.0
    }
}

/// Scheduling metadata for one task
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskDescriptor {
    /// Task identifier
    pub id: TaskId,
    /// Name used in diagnostics
    pub name: &'static str,
    /// Minimum time between runs
    pub interval_ms: u64,
    /// Time of the last run (or registration time)
    pub last_run_ms: Timestamp,
}

impl TaskDescriptor {
    /// Check if the task is due at `now`
    ///
    /// Saturating: a clock that steps backwards never makes a task due early.
    pub fn is_due(&self, now: Timestamp) -> bool {
        now.saturating_sub(self.last_run_ms) >= self.interval_ms
    }

    /// Time until the task is due, 0 if due now
    pub fn due_in(&self, now: Timestamp) -> u64 {
        self.interval_ms.saturating_sub(now.saturating_sub(self.last_run_ms))
    }
}

/// Per-task counters
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct TaskStats {
    /// Completed runs, successful or not
    pub runs: u32,
    /// Runs that returned an error
    pub failures: u32,
    /// Most recent error
    pub last_error: Option<StationError>,
}

/// Summary of one pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks that ran
    pub ran: usize,
    /// Tasks that returned an error
    pub failed: usize,
}

/// A unit of periodic work over context `C`
///
/// Implemented for any `FnMut(&mut C, Timestamp) -> StationResult<()>`, so
/// closures and plain functions can be registered directly.
pub trait PeriodicTask<C> {
    /// Do one unit of work; must return within bounded time
    fn run(&mut self, ctx: &mut C, now: Timestamp) -> StationResult<()>;
}

impl<C, F> PeriodicTask<C> for F
where
    F: FnMut(&mut C, Timestamp) -> StationResult<()>,
{
    fn run(&mut self, ctx: &mut C, now: Timestamp) -> StationResult<()> {
        self(ctx, now)
    }
}

struct TaskSlot<C> {
    descriptor: TaskDescriptor,
    stats: TaskStats,
    task: Box<dyn PeriodicTask<C>>,
}

/// Fixed-capacity table of periodic tasks
pub struct Scheduler<C> {
    tasks: heapless::Vec<TaskSlot<C>, MAX_TASKS>,
    passes: u64,
}

impl<C> Default for Scheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Scheduler<C> {
    /// Empty table
    pub fn new() -> Self {
        Self { tasks: heapless::Vec::new(), passes: 0 }
    }

    /// Register a task with `last_run_ms = 0`
    pub fn register<T>(&mut self, name: &'static str, interval_ms: u64, task: T) -> StationResult<TaskId>
    where
        T: PeriodicTask<C> + 'static,
    {
        self.register_at(name, interval_ms, 0, task)
    }

    /// Register a task whose first interval counts from `start`
    pub fn register_at<T>(
        &mut self,
        name: &'static str,
        interval_ms: u64,
        start: Timestamp,
        task: T,
    ) -> StationResult<TaskId>
    where
        T: PeriodicTask<C> + 'static,
    {
        let id = TaskId(self.tasks.len());
        let slot = TaskSlot {
            descriptor: TaskDescriptor { id, name, interval_ms, last_run_ms: start },
            stats: TaskStats::default(),
            task: Box::new(task),
        };
        self.tasks
            .push(slot)
            .map_err(|_| StationError::TaskTableFull { capacity: MAX_TASKS })?;
        log_debug!("Registered task '{}' every {} ms", name, interval_ms);
        Ok(id)
    }

    /// Run every due task once, in registration order
    pub fn tick(&mut self, now: Timestamp, ctx: &mut C) -> TickReport {
        let mut report = TickReport::default();
        for slot in self.tasks.iter_mut() {
            if !slot.descriptor.is_due(now) {
                continue;
            }
            let result = slot.task.run(ctx, now);
            slot.descriptor.last_run_ms = now;
            slot.stats.runs = slot.stats.runs.saturating_add(1);
            report.ran += 1;

            if let Err(err) = result {
                slot.stats.failures = slot.stats.failures.saturating_add(1);
                slot.stats.last_error = Some(err);
                report.failed += 1;
                log_warn!("Task '{}' failed: {}", slot.descriptor.name, err);
            }
        }
        self.passes += 1;
        report
    }

    /// Drive `tick` from `clock` while `keep_running` returns true
    ///
    /// Busy-polls; there is no minimum cadence between passes.
    pub fn run<F>(&mut self, clock: &dyn TimeSource, ctx: &mut C, mut keep_running: F)
    where
        F: FnMut(&C) -> bool,
    {
        while keep_running(ctx) {
            self.tick(clock.now(), ctx);
        }
    }

    /// Descriptor of a registered task
    pub fn descriptor(&self, id: TaskId) -> Option<&TaskDescriptor> {
        self.tasks.get(id.0).map(|slot| &slot.descriptor)
    }

    /// All descriptors in registration order
    pub fn descriptors(&self) -> impl Iterator<Item = &TaskDescriptor> {
        self.tasks.iter().map(|slot| &slot.descriptor)
    }

    /// Counters of a registered task
    pub fn stats(&self, id: TaskId) -> Option<&TaskStats> {
        self.tasks.get(id.0).map(|slot| &slot.stats)
    }

    /// Look up a task by name
    pub fn find(&self, name: &str) -> Option<TaskId> {
        self.tasks
            .iter()
            .find(|slot| slot.descriptor.name == name)
            .map(|slot| slot.descriptor.id)
    }

    /// Time until the earliest task is due; `None` with no tasks
    pub fn next_due_in(&self, now: Timestamp) -> Option<u64> {
        self.tasks.iter().map(|slot| slot.descriptor.due_in(now)).min()
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Check if no task is registered
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Passes completed
    pub fn passes(&self) -> u64 {
        self.passes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::MockTimeSource;
    use alloc::vec::Vec;

    #[derive(Default)]
    struct Log {
        order: Vec<&'static str>,
    }

    fn push(name: &'static str) -> impl FnMut(&mut Log, Timestamp) -> StationResult<()> {
        move |log: &mut Log, _now| {
            log.order.push(name);
            Ok(())
        }
    }

    #[test]
    fn first_fire_after_full_interval() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        let id = scheduler.register("sample", 1000, push("sample")).unwrap();
        let mut log = Log::default();

        scheduler.tick(999, &mut log);
        assert!(log.order.is_empty());

        scheduler.tick(1000, &mut log);
        assert_eq!(log.order, vec!["sample"]);
        assert_eq!(scheduler.descriptor(id).unwrap().last_run_ms, 1000);

        scheduler.tick(1999, &mut log);
        assert_eq!(log.order.len(), 1);
        scheduler.tick(2000, &mut log);
        assert_eq!(log.order.len(), 2);
    }

    #[test]
    fn due_tasks_run_in_registration_order() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        scheduler.register("slow", 5000, push("slow")).unwrap();
        scheduler.register("fast", 200, push("fast")).unwrap();
        let mut log = Log::default();

        scheduler.tick(5000, &mut log);
        assert_eq!(log.order, vec!["slow", "fast"]);

        let report = scheduler.tick(5200, &mut log);
        assert_eq!(report.ran, 1);
        assert_eq!(log.order, vec!["slow", "fast", "fast"]);
    }

    #[test]
    fn failing_task_is_counted_and_rescheduled() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        let bad = scheduler
            .register("bad", 100, |_: &mut Log, _now: Timestamp| -> StationResult<()> {
                Err(StationError::TimeSyncFailure)
            })
            .unwrap();
        scheduler.register("good", 100, push("good")).unwrap();
        let mut log = Log::default();

        let report = scheduler.tick(100, &mut log);
        assert_eq!(report, TickReport { ran: 2, failed: 1 });
        assert_eq!(log.order, vec!["good"]);

        let stats = scheduler.stats(bad).unwrap();
        assert_eq!(stats.failures, 1);
        assert_eq!(stats.last_error, Some(StationError::TimeSyncFailure));
        assert_eq!(scheduler.descriptor(bad).unwrap().last_run_ms, 100);

        // Not retried before its next interval
        assert_eq!(scheduler.tick(150, &mut log).ran, 0);
    }

    #[test]
    fn backwards_clock_never_fires_early() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        scheduler.register_at("t", 1000, 5000, push("t")).unwrap();
        let mut log = Log::default();

        scheduler.tick(10, &mut log);
        assert!(log.order.is_empty());
        assert_eq!(scheduler.next_due_in(10), Some(1000));
    }

    #[test]
    fn table_capacity_is_enforced() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        for _ in 0..MAX_TASKS {
            scheduler.register("t", 1, push("t")).unwrap();
        }
        assert_eq!(
            scheduler.register("extra", 1, push("extra")),
            Err(StationError::TaskTableFull { capacity: MAX_TASKS })
        );
        assert_eq!(scheduler.len(), MAX_TASKS);
    }

    #[test]
    fn next_due_and_lookup() {
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        assert_eq!(scheduler.next_due_in(0), None);

        scheduler.register("a", 1000, push("a")).unwrap();
        let b = scheduler.register("b", 300, push("b")).unwrap();
        assert_eq!(scheduler.next_due_in(100), Some(200));
        assert_eq!(scheduler.next_due_in(400), Some(0));
        assert_eq!(scheduler.find("b"), Some(b));
        assert_eq!(scheduler.find("missing"), None);
        assert_eq!(scheduler.descriptors().count(), 2);
    }

    #[test]
    fn run_until_predicate_false() {
        let clock = MockTimeSource::new(0);
        let mut scheduler: Scheduler<Log> = Scheduler::new();
        let driver = clock.clone();
        scheduler
            .register("step", 0, move |log: &mut Log, _now: Timestamp| -> StationResult<()> {
                log.order.push("step");
                driver.advance(250);
                Ok(())
            })
            .unwrap();
        let mut log = Log::default();

        scheduler.run(&clock, &mut log, |log| log.order.len() < 4);
        assert_eq!(log.order.len(), 4);
        assert_eq!(scheduler.passes(), 4);
        assert_eq!(clock.now(), 1000);
    }
}
