use crate::memory::{Address, StoreGuard, Value};
use heapless::Vec;
use serde::{Deserialize, Serialize};
use tracing::warn;

const MAX_INTERLOCK_EVENTS: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterlockState {
    Normal,
    Faulted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterlockTransition {
    Tripped,
    Cleared,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InterlockEvent {
    pub transition: InterlockTransition,
    pub timestamp_ms: u64,
}

/// Safety-interlock policy evaluated immediately after the process models
/// each tick, with strictly higher priority.
///
/// While the trigger bit reads true, every cleared-output address is forced
/// to its zero value (overriding anything a model wrote this same tick) and
/// the fault code register holds the configured sentinel. When the trigger
/// drops, the fault code returns to zero and simulation resumes from the
/// forced-zero state; no ramp memory is retained across the fault.
///
/// State machine: `Normal -> Faulted` on trigger true, `Faulted -> Normal`
/// on trigger false, both evaluated once per tick, no intermediate states.
#[derive(Debug)]
pub struct SafetyInterlock {
    trigger: Address,
    cleared_outputs: std::vec::Vec<Address>,
    fault_code_address: Address,
    fault_code_value: i32,
    state: InterlockState,
    trip_count: u32,
    events: Vec<InterlockEvent, MAX_INTERLOCK_EVENTS>,
}

impl SafetyInterlock {
    pub fn new(
        trigger: Address,
        cleared_outputs: std::vec::Vec<Address>,
        fault_code_address: Address,
        fault_code_value: i32,
    ) -> Self {
        Self {
            trigger,
            cleared_outputs,
            fault_code_address,
            fault_code_value,
            state: InterlockState::Normal,
            trip_count: 0,
            events: Vec::new(),
        }
    }

    /// Evaluate the trigger and apply overrides. Called under the same
    /// exclusive store guard as the models it overrides.
    pub fn evaluate(&mut self, guard: &mut StoreGuard<'_>, now_ms: u64) -> InterlockState {
        let active = guard.read_typed(&self.trigger).as_bool();

        match (self.state, active) {
            (InterlockState::Normal, true) => {
                self.state = InterlockState::Faulted;
                self.trip_count = self.trip_count.saturating_add(1);
                self.record_event(InterlockTransition::Tripped, now_ms);
                warn!(fault_code = self.fault_code_value, "safety interlock tripped");
            }
            (InterlockState::Faulted, false) => {
                self.state = InterlockState::Normal;
                self.record_event(InterlockTransition::Cleared, now_ms);
                guard.write_typed(
                    &self.fault_code_address,
                    Value::zero(self.fault_code_address.data_type()),
                );
                warn!("safety interlock cleared, resuming normal simulation");
            }
            _ => {}
        }

        if self.state == InterlockState::Faulted {
            for address in &self.cleared_outputs {
                guard.write_typed(address, Value::zero(address.data_type()));
            }
            guard.write_typed(
                &self.fault_code_address,
                Value::from_f64(
                    self.fault_code_address.data_type(),
                    f64::from(self.fault_code_value),
                ),
            );
        }

        self.state
    }

    fn record_event(&mut self, transition: InterlockTransition, timestamp_ms: u64) {
        if self.events.is_full() {
            self.events.remove(0);
        }
        let _ = self.events.push(InterlockEvent {
            transition,
            timestamp_ms,
        });
    }

    pub fn state(&self) -> InterlockState {
        self.state
    }

    pub fn trip_count(&self) -> u32 {
        self.trip_count
    }

    pub fn events(&self) -> &[InterlockEvent] {
        &self.events
    }
}
