use super::ProcessModel;
use crate::memory::{Address, StoreGuard, Value};
use serde::{Deserialize, Serialize};

/// Motor ramp parameters. Rates are per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorParams {
    pub rated_speed_rpm: f32,
    pub ramp_up_rpm: f32,
    pub ramp_down_rpm: f32,
    pub ambient_temp_c: f32,
    pub max_temp_c: f32,
    /// First-order approach rate toward the speed-dependent temperature
    /// target while heating, fraction of the remaining gap per tick.
    pub temp_rise_rate: f32,
    pub temp_fall_rate: f32,
}

impl Default for MotorParams {
    fn default() -> Self {
        Self {
            rated_speed_rpm: 1500.0,
            ramp_up_rpm: 100.0,
            ramp_down_rpm: 60.0,
            ambient_temp_c: 25.0,
            max_temp_c: 80.0,
            temp_rise_rate: 0.05,
            temp_fall_rate: 0.1,
        }
    }
}

/// Resolved register bindings for the motor model.
#[derive(Debug, Clone)]
pub struct MotorBindings {
    pub command: Address,
    pub running: Address,
    pub speed_rpm: Address,
    pub temperature_c: Address,
    /// Writable setpoint register; ramp target is `min(target, rated)`.
    pub target_rpm: Option<Address>,
    /// Latched Unix start time, set on the command's rising edge and
    /// cleared on the falling edge.
    pub start_timestamp: Option<Address>,
}

/// Command-driven speed ramp with a lagging temperature model.
///
/// While commanded on, speed climbs by `ramp_up_rpm` per tick and clamps to
/// the target; off, it falls by `ramp_down_rpm` and clamps to zero.
/// Temperature approaches `ambient + (max - ambient) * speed / rated`
/// first-order. The running feedback bit mirrors `speed > 0`.
#[derive(Debug)]
pub struct MotorModel {
    params: MotorParams,
    bindings: MotorBindings,
    last_command: bool,
}

impl MotorModel {
    pub fn new(params: MotorParams, bindings: MotorBindings) -> Self {
        Self {
            params,
            bindings,
            last_command: false,
        }
    }

    pub fn params(&self) -> &MotorParams {
        &self.params
    }
}

impl ProcessModel for MotorModel {
    fn name(&self) -> &'static str {
        "motor"
    }

    fn step(&mut self, guard: &mut StoreGuard<'_>, now_ms: u64) {
        let p = &self.params;
        let b = &self.bindings;

        let command = guard.read_typed(&b.command).as_bool();
        let mut speed = guard.read_typed(&b.speed_rpm).as_f64() as f32;

        let target = match &b.target_rpm {
            Some(addr) => (guard.read_typed(addr).as_f64() as f32).clamp(0.0, p.rated_speed_rpm),
            None => p.rated_speed_rpm,
        };

        if command {
            speed = (speed + p.ramp_up_rpm).min(target);
        } else {
            speed = (speed - p.ramp_down_rpm).max(0.0);
        }
        speed = speed.clamp(0.0, p.rated_speed_rpm);

        let mut temp = guard.read_typed(&b.temperature_c).as_f64() as f32;
        let temp_target =
            p.ambient_temp_c + (p.max_temp_c - p.ambient_temp_c) * speed / p.rated_speed_rpm;
        let rate = if temp_target >= temp {
            p.temp_rise_rate
        } else {
            p.temp_fall_rate
        };
        temp += (temp_target - temp) * rate;
        temp = temp.clamp(p.ambient_temp_c, p.max_temp_c);

        if let Some(ts) = &b.start_timestamp {
            if command && !self.last_command {
                guard.write_typed(ts, Value::U32((now_ms / 1000) as u32));
            } else if !command && self.last_command {
                guard.write_typed(ts, Value::U32(0));
            }
        }
        self.last_command = command;

        guard.write_typed(&b.speed_rpm, Value::F32(speed));
        guard.write_typed(&b.temperature_c, Value::F32(temp));
        guard.write_typed(&b.running, Value::Bool(speed > 0.0));
    }
}
