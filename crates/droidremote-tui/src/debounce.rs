//! Volume debouncer — turns a burst of slider movements into one command.
//!
//! # States (per control)
//! ```text
//!  Idle ──slider──▶ Pending ──deadline──▶ Dispatching ──settled──▶ Idle
//!                    ▲   │
//!                    └───┘ slider again: overwrite value, restart deadline
//! ```
//!
//! The debouncer is pure bookkeeping: callers pass `now` in and await
//! `deadline()` themselves, which keeps it testable without a runtime.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use droidremote_proto::protocol::VolumeStream;

/// A set-volume request ready to hand to the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VolumeDispatch {
    pub stream: VolumeStream,
    pub level: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Dispatching,
}

/// What happened when the deadline was checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// Nothing pending, or the deadline has not passed yet.
    NotDue,
    /// Send this.
    Dispatch(VolumeDispatch),
    /// The level equals what was last sent (or is being sent); dropped.
    Unchanged(VolumeDispatch),
    /// Device not connected; the request was dropped.
    Offline,
}

pub struct VolumeDebouncer {
    delay: Duration,
    stream: VolumeStream,
    /// Raw slider percent waiting for the quiet period to end.
    pending: Option<f64>,
    deadline: Option<Instant>,
    /// Last level confirmed applied, per stream.
    last_level: HashMap<VolumeStream, u32>,
    /// Commands handed out and not yet settled, per stream.
    in_flight: HashMap<VolumeStream, InFlight>,
}

/// Unsettled set-volume commands for one stream.  The lane runs them in
/// order, so the device ends at `newest` once all of them have settled.
#[derive(Debug, Clone, Copy)]
struct InFlight {
    newest: u32,
    outstanding: u32,
}

impl VolumeDebouncer {
    pub fn new(stream: VolumeStream, delay: Duration) -> Self {
        Self {
            delay,
            stream,
            pending: None,
            deadline: None,
            last_level: HashMap::new(),
            in_flight: HashMap::new(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn phase(&self) -> Phase {
        if self.pending.is_some() {
            Phase::Pending
        } else if self.in_flight.contains_key(&self.stream) {
            Phase::Dispatching
        } else {
            Phase::Idle
        }
    }

    pub fn last_level(&self, stream: VolumeStream) -> Option<u32> {
        self.last_level.get(&stream).copied()
    }

    /// Record a slider value and restart the quiet period.
    pub fn set_percent(&mut self, percent: f64, now: Instant) {
        self.pending = Some(percent);
        self.deadline = Some(now + self.delay);
    }

    /// Switch the controlled stream.  Drops any pending value and cancels the
    /// deadline; per-stream level bookkeeping is kept.
    pub fn select_stream(&mut self, stream: VolumeStream) {
        if stream == self.stream {
            return;
        }
        self.stream = stream;
        self.pending = None;
        self.deadline = None;
    }

    /// Consume the pending value if its deadline has passed.
    pub fn fire(&mut self, now: Instant, connected: bool) -> Expiry {
        match self.deadline {
            Some(deadline) if now >= deadline => {}
            _ => return Expiry::NotDue,
        }
        self.deadline = None;
        let Some(percent) = self.pending.take() else {
            return Expiry::NotDue;
        };
        if !connected {
            return Expiry::Offline;
        }

        let stream = self.stream;
        let dispatch = VolumeDispatch {
            stream,
            level: stream.level_for_percent(percent),
        };
        let current = match self.in_flight.get(&stream) {
            Some(f) => Some(f.newest),
            None => self.last_level.get(&stream).copied(),
        };
        if current == Some(dispatch.level) {
            return Expiry::Unchanged(dispatch);
        }

        let entry = self.in_flight.entry(stream).or_insert(InFlight {
            newest: dispatch.level,
            outstanding: 0,
        });
        entry.newest = dispatch.level;
        entry.outstanding += 1;
        Expiry::Dispatch(dispatch)
    }

    /// The bridge finished a set-volume command.  Only a successful one
    /// moves the last level; a failure leaves it so the user can retry.
    /// Settles arrive in dispatch order, one per dispatched command.
    pub fn settle(&mut self, stream: VolumeStream, level: u32, applied: bool) {
        if let Some(f) = self.in_flight.get_mut(&stream) {
            f.outstanding = f.outstanding.saturating_sub(1);
            if f.outstanding == 0 {
                self.in_flight.remove(&stream);
            }
        }
        if applied {
            self.last_level.insert(stream, level);
        }
    }

    /// Forget every unsettled command.  Used when completions may have been
    /// missed, so a stuck in-flight entry cannot suppress a level forever.
    pub fn forget_in_flight(&mut self) {
        self.in_flight.clear();
    }
}
