use plcsim::memory::DataType;
use plcsim::{SimEngine, SimulatorConfig};

fn engine() -> SimEngine {
    SimEngine::from_config(&SimulatorConfig::default()).unwrap()
}

#[cfg(test)]
mod interlock_tests {
    use super::*;
    use plcsim::interlock::InterlockState;

    #[test]
    fn test_normal_state_without_trigger() {
        let engine = engine();
        engine.tick();
        assert_eq!(engine.interlock_state(), Some(InterlockState::Normal));
        assert_eq!(engine.read_tag("fault_code").unwrap(), 0.0);
    }

    #[test]
    fn test_fault_mid_ramp_forces_safe_state() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        for _ in 0..8 {
            engine.tick();
        }
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 800.0);

        engine.write_tag("fault_active", 1.0).unwrap();
        engine.tick();

        assert_eq!(engine.interlock_state(), Some(InterlockState::Faulted));
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 0.0);
        assert_eq!(engine.read_tag("motor_running").unwrap(), 0.0);
        assert_eq!(engine.read_tag("fault_code").unwrap(), 999.0);
    }

    #[test]
    fn test_override_holds_regardless_of_command() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        engine.write_tag("fault_active", 1.0).unwrap();

        // Interlock wins over the simulator on every tick.
        for _ in 0..10 {
            engine.tick();
            assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 0.0);
            assert_eq!(engine.read_tag("motor_running").unwrap(), 0.0);
            assert_eq!(engine.read_tag("fault_code").unwrap(), 999.0);
        }
    }

    #[test]
    fn test_cleared_outputs_read_zero_over_raw_interface() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        engine.write_tag("fault_active", 1.0).unwrap();
        engine.tick();

        // The raw register view agrees with the tag view.
        assert_eq!(
            engine.read("DB1.DBD4", DataType::Float32).unwrap(),
            vec![0x00, 0x00, 0x00, 0x00]
        );
        assert_eq!(
            engine.read("DB1.DBW12", DataType::Int16).unwrap(),
            vec![0x03, 0xE7]
        );
    }

    #[test]
    fn test_recovery_resumes_from_zero() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        for _ in 0..8 {
            engine.tick();
        }
        engine.write_tag("fault_active", 1.0).unwrap();
        engine.tick();

        engine.write_tag("fault_active", 0.0).unwrap();
        engine.tick();

        // No ramp memory: the first recovered tick starts from zero again.
        assert_eq!(engine.interlock_state(), Some(InterlockState::Normal));
        assert_eq!(engine.read_tag("fault_code").unwrap(), 0.0);
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 100.0);
        assert_eq!(engine.read_tag("motor_running").unwrap(), 1.0);
    }

    #[test]
    fn test_transitions_evaluated_once_per_tick() {
        let engine = engine();

        // Setting the trigger between ticks changes nothing until the next
        // evaluation.
        engine.write_tag("fault_active", 1.0).unwrap();
        assert_eq!(engine.interlock_state(), Some(InterlockState::Normal));

        engine.tick();
        assert_eq!(engine.interlock_state(), Some(InterlockState::Faulted));

        engine.write_tag("fault_active", 0.0).unwrap();
        assert_eq!(engine.interlock_state(), Some(InterlockState::Faulted));
        engine.tick();
        assert_eq!(engine.interlock_state(), Some(InterlockState::Normal));
    }
}

#[cfg(test)]
mod interlock_unit_tests {
    use super::*;
    use plcsim::interlock::{InterlockTransition, SafetyInterlock};
    use plcsim::memory::{AddressSpace, MemoryStore, Value};

    fn setup() -> (AddressSpace, MemoryStore) {
        let space = AddressSpace::new(SimulatorConfig::default().areas);
        let store = MemoryStore::new(&space);
        (space, store)
    }

    #[test]
    fn test_event_history_records_transitions() {
        let (space, store) = setup();
        let trigger = space.resolve("M0.0", DataType::Bool).unwrap();
        let output = space.resolve("MW2", DataType::Int16).unwrap();
        let code = space.resolve("MW4", DataType::Int16).unwrap();
        let mut interlock = SafetyInterlock::new(trigger, vec![output], code, 999);

        store.write_typed(&output, Value::I16(1234));

        let mut guard = store.lock();
        interlock.evaluate(&mut guard, 1000);
        assert!(interlock.events().is_empty());

        guard.write_typed(&trigger, Value::Bool(true));
        interlock.evaluate(&mut guard, 2000);
        guard.write_typed(&trigger, Value::Bool(false));
        interlock.evaluate(&mut guard, 3000);
        drop(guard);

        assert_eq!(interlock.trip_count(), 1);
        let events = interlock.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].transition, InterlockTransition::Tripped);
        assert_eq!(events[0].timestamp_ms, 2000);
        assert_eq!(events[1].transition, InterlockTransition::Cleared);
        assert_eq!(events[1].timestamp_ms, 3000);

        assert_eq!(store.read_typed(&output), Value::I16(0));
        assert_eq!(store.read_typed(&code), Value::I16(0));
    }
}
