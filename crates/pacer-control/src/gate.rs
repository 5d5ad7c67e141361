//! The adjustment state gate.
//!
//! A single-slot mutual-exclusion primitive with two states. Entering
//! yields a permit whose `Drop` releases the gate, so a panicking or
//! failing handler can never leave the process stuck in `Adjusting`.
//! Contended entry fails immediately; there is no queueing.

use std::sync::{Mutex, MutexGuard};

use tracing::trace;

/// Process-wide adjustment state. Mutated only through [`StateGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustmentState {
    Stable,
    Adjusting,
}

/// Two-state gate serializing adjustment cycles.
#[derive(Debug)]
pub struct StateGate {
    state: Mutex<AdjustmentState>,
}

impl StateGate {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AdjustmentState::Stable),
        }
    }

    /// Attempt the `Stable → Adjusting` transition.
    ///
    /// Returns a permit on success; `None` (with no state change) if an
    /// adjustment is already in flight. Exactly one of any set of
    /// concurrent callers wins.
    pub fn try_enter(&self) -> Option<GatePermit<'_>> {
        let mut state = self.lock();
        match *state {
            AdjustmentState::Adjusting => None,
            AdjustmentState::Stable => {
                *state = AdjustmentState::Adjusting;
                trace!("gate entered");
                Some(GatePermit { gate: self })
            }
        }
    }

    /// Current state, for logs and tests.
    pub fn state(&self) -> AdjustmentState {
        *self.lock()
    }

    /// The unconditional `Adjusting → Stable` transition.
    fn exit(&self) {
        *self.lock() = AdjustmentState::Stable;
        trace!("gate released");
    }

    fn lock(&self) -> MutexGuard<'_, AdjustmentState> {
        match self.state.lock() {
            Ok(guard) => guard,
            // The state is a plain enum; a poisoned lock cannot leave it
            // torn, so recover the value.
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Default for StateGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of a successful `try_enter`. Releases the gate when dropped.
#[derive(Debug)]
pub struct GatePermit<'a> {
    gate: &'a StateGate,
}

impl Drop for GatePermit<'_> {
    fn drop(&mut self) {
        self.gate.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_transitions_to_adjusting() {
        let gate = StateGate::new();
        assert_eq!(gate.state(), AdjustmentState::Stable);

        let permit = gate.try_enter().unwrap();
        assert_eq!(gate.state(), AdjustmentState::Adjusting);
        drop(permit);
        assert_eq!(gate.state(), AdjustmentState::Stable);
    }

    #[test]
    fn second_enter_is_refused_while_held() {
        let gate = StateGate::new();
        let _permit = gate.try_enter().unwrap();
        assert!(gate.try_enter().is_none());
    }

    #[test]
    fn reenter_after_release() {
        let gate = StateGate::new();
        drop(gate.try_enter().unwrap());
        assert!(gate.try_enter().is_some());
    }

    #[test]
    fn concurrent_entry_admits_exactly_one() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::{Arc, Barrier};

        let gate = Arc::new(StateGate::new());
        let admitted = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gate = gate.clone();
                let admitted = admitted.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    let permit = gate.try_enter();
                    if permit.is_some() {
                        admitted.fetch_add(1, Ordering::SeqCst);
                    }
                    // Nobody releases until every thread has attempted.
                    barrier.wait();
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(admitted.load(Ordering::SeqCst), 1);
        assert_eq!(gate.state(), AdjustmentState::Stable);
    }
}
