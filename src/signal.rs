//! Cross-thread signals
//!
//! - `StopFlag`: cooperative shutdown for worker threads
//! - `StartGate`: one-shot "playback started" signal with cancellation

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared shutdown flag, checked by workers between blocking calls
#[derive(Debug, Clone, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Check if shutdown is requested
    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Waiting,
    Open,
    Cancelled,
}

/// Outcome of waiting on a [`StartGate`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Started,
    Cancelled,
    TimedOut,
}

/// One-shot start signal.
///
/// The gate opens at most once. Cancelling is allowed before or after
/// opening and is terminal. Waiters park on a condition variable instead
/// of spinning.
#[derive(Debug)]
pub struct StartGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl StartGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Waiting),
            changed: Condvar::new(),
        }
    }

    /// Open the gate. Returns false if it was already opened or cancelled.
    pub fn open(&self) -> bool {
        let mut state = self.state.lock();
        if *state != GateState::Waiting {
            return false;
        }
        *state = GateState::Open;
        self.changed.notify_all();
        true
    }

    /// Cancel the gate, waking every waiter and sleeper.
    /// Returns false if it was already cancelled.
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock();
        if *state == GateState::Cancelled {
            return false;
        }
        *state = GateState::Cancelled;
        self.changed.notify_all();
        true
    }

    pub fn is_open(&self) -> bool {
        *self.state.lock() == GateState::Open
    }

    pub fn is_cancelled(&self) -> bool {
        *self.state.lock() == GateState::Cancelled
    }

    /// Block until the gate is opened or cancelled
    pub fn wait(&self) -> GateOutcome {
        let mut state = self.state.lock();
        while *state == GateState::Waiting {
            self.changed.wait(&mut state);
        }
        Self::outcome(*state)
    }

    /// Block until the gate leaves the waiting state or `timeout` elapses
    pub fn wait_timeout(&self, timeout: Duration) -> GateOutcome {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while *state == GateState::Waiting {
            if self.changed.wait_until(&mut state, deadline).timed_out() {
                break;
            }
        }
        Self::outcome(*state)
    }

    /// Sleep for `duration` unless the gate is cancelled first.
    ///
    /// Returns false when cancelled. Opening does not interrupt the sleep.
    pub fn sleep_unless_cancelled(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut state = self.state.lock();
        loop {
            if *state == GateState::Cancelled {
                return false;
            }
            if Instant::now() >= deadline {
                return true;
            }
            let _ = self.changed.wait_until(&mut state, deadline);
        }
    }

    fn outcome(state: GateState) -> GateOutcome {
        match state {
            GateState::Open => GateOutcome::Started,
            GateState::Cancelled => GateOutcome::Cancelled,
            GateState::Waiting => GateOutcome::TimedOut,
        }
    }
}

impl Default for StartGate {
    fn default() -> Self {
        Self::new()
    }
}
