use super::ProcessModel;
use crate::memory::{Address, StoreGuard, Value};
use serde::{Deserialize, Serialize};

/// Power-balance parameters. SOC rate is per watt per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerParams {
    pub max_charge_w: f32,
    pub max_discharge_w: f32,
    /// State-of-charge percent gained (or lost) per watt of battery power
    /// each tick.
    pub soc_per_watt: f32,
}

impl Default for PowerParams {
    fn default() -> Self {
        Self {
            max_charge_w: 5000.0,
            max_discharge_w: 5000.0,
            soc_per_watt: 0.0001,
        }
    }
}

/// Resolved register bindings for the power-conversion model.
#[derive(Debug, Clone)]
pub struct PowerBindings {
    /// Externally driven inputs.
    pub pv_power: Address,
    pub load_power: Address,
    /// Derived outputs.
    pub grid_power: Address,
    pub battery_power: Address,
    pub battery_soc: Address,
}

/// PV/load/battery power balance.
///
/// `grid = pv - load`; a surplus charges the battery (positive battery
/// power, SOC rises toward 100), a deficit discharges it (negative battery
/// power, SOC falls toward 0). Battery power is capped by the configured
/// charge/discharge limits and drops to zero at the SOC bounds.
#[derive(Debug)]
pub struct PowerModel {
    params: PowerParams,
    bindings: PowerBindings,
}

impl PowerModel {
    pub fn new(params: PowerParams, bindings: PowerBindings) -> Self {
        Self { params, bindings }
    }

    pub fn params(&self) -> &PowerParams {
        &self.params
    }
}

impl ProcessModel for PowerModel {
    fn name(&self) -> &'static str {
        "power"
    }

    fn step(&mut self, guard: &mut StoreGuard<'_>, _now_ms: u64) {
        let p = &self.params;
        let b = &self.bindings;

        let pv = guard.read_typed(&b.pv_power).as_f64() as f32;
        let load = guard.read_typed(&b.load_power).as_f64() as f32;
        let mut soc = (guard.read_typed(&b.battery_soc).as_f64() as f32).clamp(0.0, 100.0);

        let grid = pv - load;
        let battery = if grid > 0.0 {
            if soc >= 100.0 {
                0.0
            } else {
                grid.min(p.max_charge_w)
            }
        } else if soc <= 0.0 {
            0.0
        } else {
            grid.max(-p.max_discharge_w)
        };

        soc = (soc + battery * p.soc_per_watt).clamp(0.0, 100.0);

        guard.write_typed(&b.grid_power, Value::F32(grid));
        guard.write_typed(&b.battery_power, Value::F32(battery));
        guard.write_typed(&b.battery_soc, Value::F32(soc));
    }
}
