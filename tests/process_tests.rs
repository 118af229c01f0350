use plcsim::{SimEngine, SimulatorConfig};

fn engine() -> SimEngine {
    SimEngine::from_config(&SimulatorConfig::default()).unwrap()
}

#[cfg(test)]
mod motor_tests {
    use super::*;

    #[test]
    fn test_motor_idle_without_command() {
        let engine = engine();
        for _ in 0..5 {
            engine.tick();
        }
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 0.0);
        assert_eq!(engine.read_tag("motor_running").unwrap(), 0.0);
    }

    #[test]
    fn test_ramp_up_is_monotone_and_clamped() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();

        let mut previous = 0.0;
        for n in 1..=30 {
            engine.tick();
            let speed = engine.read_tag("motor_speed_rpm").unwrap();
            assert!(speed >= previous, "speed dropped during ramp-up at tick {n}");
            assert!((0.0..=1500.0).contains(&speed));
            previous = speed;
        }
        // 30 ticks at 100 rpm/tick, rated 1500: saturated.
        assert_eq!(previous, 1500.0);
    }

    #[test]
    fn test_ramp_matches_step_times_ticks() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();

        for n in 1..=20u32 {
            engine.tick();
            let expected = f64::from(n * 100).min(1500.0);
            let speed = engine.read_tag("motor_speed_rpm").unwrap();
            assert_eq!(speed, expected, "after {n} ticks");
        }
    }

    #[test]
    fn test_running_feedback_mirrors_speed() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        engine.tick();
        assert_eq!(engine.read_tag("motor_running").unwrap(), 1.0);

        engine.write_tag("motor_command", 0.0).unwrap();
        // 100 rpm decays at 60 rpm/tick: two ticks to zero.
        engine.tick();
        assert_eq!(engine.read_tag("motor_running").unwrap(), 1.0);
        engine.tick();
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 0.0);
        assert_eq!(engine.read_tag("motor_running").unwrap(), 0.0);
    }

    #[test]
    fn test_ramp_down_is_monotone_to_zero() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();
        for _ in 0..10 {
            engine.tick();
        }
        engine.write_tag("motor_command", 0.0).unwrap();

        let mut previous = engine.read_tag("motor_speed_rpm").unwrap();
        for _ in 0..30 {
            engine.tick();
            let speed = engine.read_tag("motor_speed_rpm").unwrap();
            assert!(speed <= previous, "speed rose during ramp-down");
            assert!(speed >= 0.0);
            previous = speed;
        }
        assert_eq!(previous, 0.0);
    }

    #[test]
    fn test_target_setpoint_caps_ramp() {
        let engine = engine();
        engine.write_tag("motor_target_rpm", 450.0).unwrap();
        engine.write_tag("motor_command", 1.0).unwrap();

        for _ in 0..20 {
            engine.tick();
        }
        assert_eq!(engine.read_tag("motor_speed_rpm").unwrap(), 450.0);
    }

    #[test]
    fn test_temperature_stays_bounded() {
        let engine = engine();
        engine.write_tag("motor_command", 1.0).unwrap();

        let ambient = 25.0;
        let mut previous = engine.read_tag("motor_temperature").unwrap();
        for _ in 0..200 {
            engine.tick();
            let temp = engine.read_tag("motor_temperature").unwrap();
            assert!((ambient..=80.0).contains(&temp));
            assert!(temp >= previous, "temperature fell while running at speed");
            previous = temp;
        }

        engine.write_tag("motor_command", 0.0).unwrap();
        for _ in 0..200 {
            engine.tick();
        }
        let cooled = engine.read_tag("motor_temperature").unwrap();
        assert!(cooled < previous);
        assert!(cooled >= ambient);
    }

    #[test]
    fn test_start_timestamp_latched_on_rising_edge() {
        let engine = engine();
        engine.tick();
        assert_eq!(engine.read_tag("motor_start_ts").unwrap(), 0.0);

        engine.write_tag("motor_command", 1.0).unwrap();
        engine.tick();
        let latched = engine.read_tag("motor_start_ts").unwrap();
        assert!(latched > 0.0);

        // Stays latched while running, clears on the falling edge.
        engine.tick();
        assert_eq!(engine.read_tag("motor_start_ts").unwrap(), latched);

        engine.write_tag("motor_command", 0.0).unwrap();
        engine.tick();
        assert_eq!(engine.read_tag("motor_start_ts").unwrap(), 0.0);
    }
}

#[cfg(test)]
mod power_tests {
    use super::*;

    #[test]
    fn test_surplus_charges_battery() {
        let engine = engine();
        engine.write_tag("pv_power", 5000.0).unwrap();
        engine.write_tag("load_power", 3000.0).unwrap();
        let soc_before = engine.read_tag("battery_soc").unwrap();

        engine.tick();

        assert_eq!(engine.read_tag("grid_power").unwrap(), 2000.0);
        assert!(engine.read_tag("battery_power").unwrap() > 0.0);
        assert!(engine.read_tag("battery_soc").unwrap() > soc_before);
    }

    #[test]
    fn test_deficit_discharges_battery() {
        let engine = engine();
        engine.write_tag("pv_power", 1000.0).unwrap();
        engine.write_tag("load_power", 4000.0).unwrap();
        let soc_before = engine.read_tag("battery_soc").unwrap();

        engine.tick();

        assert_eq!(engine.read_tag("grid_power").unwrap(), -3000.0);
        assert!(engine.read_tag("battery_power").unwrap() < 0.0);
        assert!(engine.read_tag("battery_soc").unwrap() < soc_before);
    }

    #[test]
    fn test_soc_clamps_at_bounds() {
        let engine = engine();
        engine.write_tag("pv_power", 100_000.0).unwrap();
        engine.write_tag("load_power", 0.0).unwrap();

        for _ in 0..20_000 {
            engine.tick();
        }
        assert_eq!(engine.read_tag("battery_soc").unwrap(), 100.0);

        // Full battery absorbs nothing more.
        engine.tick();
        assert_eq!(engine.read_tag("battery_power").unwrap(), 0.0);

        engine.write_tag("pv_power", 0.0).unwrap();
        engine.write_tag("load_power", 100_000.0).unwrap();
        for _ in 0..20_000 {
            engine.tick();
        }
        assert_eq!(engine.read_tag("battery_soc").unwrap(), 0.0);
        engine.tick();
        assert_eq!(engine.read_tag("battery_power").unwrap(), 0.0);
    }

    #[test]
    fn test_charge_power_is_capped() {
        let engine = engine();
        engine.write_tag("pv_power", 50_000.0).unwrap();
        engine.write_tag("load_power", 0.0).unwrap();

        engine.tick();

        // Default cap is 5 kW either direction.
        assert_eq!(engine.read_tag("battery_power").unwrap(), 5000.0);
        assert_eq!(engine.read_tag("grid_power").unwrap(), 50_000.0);
    }

    #[test]
    fn test_tick_sequences_are_reproducible() {
        let run = || {
            let engine = engine();
            engine.write_tag("pv_power", 4200.0).unwrap();
            engine.write_tag("load_power", 1800.0).unwrap();
            engine.write_tag("motor_command", 1.0).unwrap();
            for _ in 0..50 {
                engine.tick();
            }
            (
                engine.read_tag("motor_speed_rpm").unwrap(),
                engine.read_tag("motor_temperature").unwrap(),
                engine.read_tag("battery_soc").unwrap(),
                engine.read_tag("grid_power").unwrap(),
            )
        };

        assert_eq!(run(), run());
    }
}
