//! Discrete-event timeline.
//!
//! A priority queue of `(time, action)` entries ordered by time and then by
//! insertion sequence, so events scheduled for the same instant run in the
//! order they were scheduled. Actions run to completion against a caller
//! supplied context `C`; an action error stops the run and is returned.
//!
//! ```
//! use satsim_common::{SimTime, Timeline};
//!
//! let mut timeline: Timeline<Vec<u64>, ()> = Timeline::new();
//! timeline.schedule(SimTime::from_millis(20), |log, now| { log.push(now.as_millis()); Ok(()) }).unwrap();
//! timeline.schedule(SimTime::from_millis(10), |log, now| { log.push(now.as_millis()); Ok(()) }).unwrap();
//!
//! let mut log = Vec::new();
//! timeline.run(&mut log).unwrap();
//! assert_eq!(log, vec![10, 20]);
//! ```

use crate::SimTime;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;
use thiserror::Error;

/// Identifier of a scheduled event (its insertion sequence number).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventId(pub u64);

/// Errors raised when scheduling events.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TimelineError {
    /// The requested time lies before the current simulation time.
    #[error("Cannot schedule event at {requested} before current time {now}")]
    InThePast {
        /// Requested event time.
        requested: SimTime,
        /// Current simulation time.
        now: SimTime,
    },
}

type Action<C, E> = Box<dyn FnOnce(&mut C, SimTime) -> Result<(), E>>;

struct Scheduled<C, E> {
    time: SimTime,
    id: EventId,
    action: Action<C, E>,
}

impl<C, E> PartialEq for Scheduled<C, E> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.id == other.id
    }
}

impl<C, E> Eq for Scheduled<C, E> {}

impl<C, E> PartialOrd for Scheduled<C, E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<C, E> Ord for Scheduled<C, E> {
    // Reversed: BinaryHeap is a max-heap and we want the earliest event first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

/// Discrete-event queue driving a context of type `C`.
pub struct Timeline<C, E> {
    queue: BinaryHeap<Scheduled<C, E>>,
    now: SimTime,
    next_id: u64,
    executed: u64,
}

impl<C, E> Default for Timeline<C, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, E> fmt::Debug for Timeline<C, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("now", &self.now)
            .field("pending", &self.queue.len())
            .field("executed", &self.executed)
            .finish()
    }
}

impl<C, E> Timeline<C, E> {
    /// Create an empty timeline at time zero.
    pub fn new() -> Self {
        Timeline {
            queue: BinaryHeap::new(),
            now: SimTime::ZERO,
            next_id: 0,
            executed: 0,
        }
    }

    /// Current simulation time (time of the last executed event).
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// Number of events waiting to run.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of events executed so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Schedule `action` to run at absolute time `at`.
    pub fn schedule<F>(&mut self, at: SimTime, action: F) -> Result<EventId, TimelineError>
    where
        F: FnOnce(&mut C, SimTime) -> Result<(), E> + 'static,
    {
        if at < self.now {
            return Err(TimelineError::InThePast {
                requested: at,
                now: self.now,
            });
        }
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.queue.push(Scheduled {
            time: at,
            id,
            action: Box::new(action),
        });
        Ok(id)
    }

    /// Schedule `action` to run `delay` after the current time.
    pub fn schedule_in<F>(&mut self, delay: SimTime, action: F) -> EventId
    where
        F: FnOnce(&mut C, SimTime) -> Result<(), E> + 'static,
    {
        let at = self.now + delay;
        let id = EventId(self.next_id);
        self.next_id += 1;
        self.queue.push(Scheduled {
            time: at,
            id,
            action: Box::new(action),
        });
        id
    }

    /// Time of the next pending event, if any.
    pub fn peek_time(&self) -> Option<SimTime> {
        self.queue.peek().map(|s| s.time)
    }

    /// Execute the next event. Returns its time, or `None` if the queue is empty.
    pub fn step(&mut self, context: &mut C) -> Result<Option<SimTime>, E> {
        let Some(event) = self.queue.pop() else {
            return Ok(None);
        };
        self.now = event.time;
        self.executed += 1;
        (event.action)(context, event.time)?;
        Ok(Some(event.time))
    }

    /// Drain the queue. Returns the number of events executed by this call.
    pub fn run(&mut self, context: &mut C) -> Result<u64, E> {
        let start = self.executed;
        while self.step(context)?.is_some() {}
        Ok(self.executed - start)
    }

    /// Run every event scheduled at or before `end`, then advance the clock to `end`.
    ///
    /// Later events stay queued.
    pub fn run_until(&mut self, context: &mut C, end: SimTime) -> Result<u64, E> {
        let start = self.executed;
        while self.peek_time().is_some_and(|t| t <= end) {
            self.step(context)?;
        }
        if end > self.now {
            self.now = end;
        }
        Ok(self.executed - start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Log = Vec<(u64, &'static str)>;

    fn push(label: &'static str) -> impl FnOnce(&mut Log, SimTime) -> Result<(), String> {
        move |log, now| {
            log.push((now.as_millis(), label));
            Ok(())
        }
    }

    #[test]
    fn test_events_run_in_time_order() {
        let mut timeline: Timeline<Log, String> = Timeline::new();
        timeline.schedule(SimTime::from_millis(30), push("c")).unwrap();
        timeline.schedule(SimTime::from_millis(10), push("a")).unwrap();
        timeline.schedule(SimTime::from_millis(20), push("b")).unwrap();

        let mut log = Vec::new();
        assert_eq!(timeline.run(&mut log).unwrap(), 3);
        assert_eq!(log, vec![(10, "a"), (20, "b"), (30, "c")]);
        assert_eq!(timeline.now(), SimTime::from_millis(30));
    }

    #[test]
    fn test_same_time_events_keep_insertion_order() {
        let mut timeline: Timeline<Log, String> = Timeline::new();
        for label in ["first", "second", "third"] {
            timeline.schedule(SimTime::from_millis(5), push(label)).unwrap();
        }

        let mut log = Vec::new();
        timeline.run(&mut log).unwrap();
        let labels: Vec<_> = log.iter().map(|(_, l)| *l).collect();
        assert_eq!(labels, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_scheduling_in_the_past_is_rejected() {
        let mut timeline: Timeline<Log, String> = Timeline::new();
        timeline.schedule(SimTime::from_millis(50), push("x")).unwrap();
        let mut log = Vec::new();
        timeline.run(&mut log).unwrap();

        let err = timeline
            .schedule(SimTime::from_millis(10), push("late"))
            .unwrap_err();
        assert!(matches!(err, TimelineError::InThePast { .. }));

        // Same instant as "now" is still allowed.
        assert!(timeline.schedule(SimTime::from_millis(50), push("now")).is_ok());
    }

    #[test]
    fn test_run_until_leaves_later_events() {
        let mut timeline: Timeline<Log, String> = Timeline::new();
        timeline.schedule(SimTime::from_millis(10), push("a")).unwrap();
        timeline.schedule(SimTime::from_millis(100), push("b")).unwrap();

        let mut log = Vec::new();
        assert_eq!(timeline.run_until(&mut log, SimTime::from_millis(50)).unwrap(), 1);
        assert_eq!(timeline.now(), SimTime::from_millis(50));
        assert_eq!(timeline.pending(), 1);

        let id = timeline.schedule_in(SimTime::from_millis(5), push("c"));
        assert_eq!(id, EventId(2));
        timeline.run(&mut log).unwrap();
        assert_eq!(log, vec![(10, "a"), (55, "c"), (100, "b")]);
    }

    #[test]
    fn test_action_error_stops_run() {
        let mut timeline: Timeline<Log, String> = Timeline::new();
        timeline.schedule(SimTime::from_millis(1), push("ok")).unwrap();
        timeline
            .schedule(SimTime::from_millis(2), |_log: &mut Log, _| Err("boom".to_string()))
            .unwrap();
        timeline.schedule(SimTime::from_millis(3), push("never")).unwrap();

        let mut log = Vec::new();
        assert_eq!(timeline.run(&mut log).unwrap_err(), "boom");
        assert_eq!(log, vec![(1, "ok")]);
        assert_eq!(timeline.pending(), 1);
    }
}
