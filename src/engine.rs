use crate::config::SimulatorConfig;
use crate::error::SimError;
use crate::interlock::{InterlockState, SafetyInterlock};
use crate::memory::{Address, AddressSpace, DataType, MemoryStore, Value};
use crate::process::{
    motor::MotorBindings, power::PowerBindings, MotorModel, PowerModel, ProcessModel,
};
use crate::tags::{AccessMode, TagTable};
use parking_lot::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

struct SimCore {
    models: Vec<Box<dyn ProcessModel>>,
    interlock: Option<SafetyInterlock>,
    tick_count: u64,
}

/// The register engine: owns the address space, the backing store, the tag
/// map, the process models and the safety interlock.
///
/// One instance is shared (`Arc`) between the periodic tick driver and any
/// number of protocol-adapter request handlers. Adapter reads and writes go
/// through the store's own lock; a tick takes the store's exclusive guard
/// for the full simulator-plus-interlock update, so no client ever observes
/// a partially applied tick.
pub struct SimEngine {
    space: AddressSpace,
    store: MemoryStore,
    tags: TagTable,
    sim: Mutex<SimCore>,
}

impl SimEngine {
    /// Assemble an engine from parts. Tag defaults are projected onto the
    /// zero-initialized store before the engine is handed out.
    pub fn new(
        space: AddressSpace,
        tags: TagTable,
        models: Vec<Box<dyn ProcessModel>>,
        interlock: Option<SafetyInterlock>,
    ) -> Self {
        let store = MemoryStore::new(&space);
        {
            let mut guard = store.lock();
            tags.apply_defaults(&mut guard);
        }
        Self {
            space,
            store,
            tags,
            sim: Mutex::new(SimCore {
                models,
                interlock,
                tick_count: 0,
            }),
        }
    }

    /// Build the engine described by a configuration: areas, tags, process
    /// models and interlock bindings, all resolved and validated up front.
    pub fn from_config(config: &SimulatorConfig) -> Result<Self, SimError> {
        let space = AddressSpace::new(config.areas.clone());

        let mut tags = Vec::with_capacity(config.tags.len());
        for tc in &config.tags {
            tags.push(crate::tags::Tag {
                name: tc.name.clone(),
                address: space.resolve(&tc.address, tc.data_type)?,
                access: tc.access,
                scale: tc.scale,
                default: tc.default,
            });
        }
        let tags = TagTable::new(tags);
        let tag_address = |name: &str| -> Result<Address, SimError> {
            Ok(tags.get(name)?.address)
        };

        let mut models: Vec<Box<dyn ProcessModel>> = Vec::new();
        if let Some(mc) = &config.motor {
            let bindings = MotorBindings {
                command: tag_address(&mc.command_tag)?,
                running: tag_address(&mc.running_tag)?,
                speed_rpm: tag_address(&mc.speed_tag)?,
                temperature_c: tag_address(&mc.temperature_tag)?,
                target_rpm: mc
                    .target_tag
                    .as_deref()
                    .map(tag_address)
                    .transpose()?,
                start_timestamp: mc
                    .start_timestamp_tag
                    .as_deref()
                    .map(tag_address)
                    .transpose()?,
            };
            models.push(Box::new(MotorModel::new(mc.params.clone(), bindings)));
        }
        if let Some(pc) = &config.power {
            let bindings = PowerBindings {
                pv_power: tag_address(&pc.pv_tag)?,
                load_power: tag_address(&pc.load_tag)?,
                grid_power: tag_address(&pc.grid_tag)?,
                battery_power: tag_address(&pc.battery_power_tag)?,
                battery_soc: tag_address(&pc.battery_soc_tag)?,
            };
            models.push(Box::new(PowerModel::new(pc.params.clone(), bindings)));
        }

        let interlock = match &config.interlock {
            Some(ic) => {
                let mut cleared = Vec::with_capacity(ic.cleared_output_tags.len());
                for name in &ic.cleared_output_tags {
                    cleared.push(tag_address(name)?);
                }
                Some(SafetyInterlock::new(
                    tag_address(&ic.trigger_tag)?,
                    cleared,
                    tag_address(&ic.fault_code_tag)?,
                    ic.fault_code_value,
                ))
            }
            None => None,
        };

        info!(
            areas = config.areas.len(),
            tags = tags.len(),
            models = models.len(),
            "register engine built"
        );
        Ok(Self::new(space, tags, models, interlock))
    }

    /// Run the process models then the safety interlock exactly once, under
    /// a single exclusive store section. Never fails: inputs are
    /// already-validated memory contents and bounded quantities clamp.
    pub fn tick(&self) {
        let now_ms = unix_time_ms();
        let mut core = self.sim.lock();
        core.tick_count += 1;

        let mut guard = self.store.lock();
        for model in &mut core.models {
            model.step(&mut guard, now_ms);
        }
        if let Some(interlock) = &mut core.interlock {
            interlock.evaluate(&mut guard, now_ms);
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.sim.lock().tick_count
    }

    pub fn interlock_state(&self) -> Option<InterlockState> {
        self.sim.lock().interlock.as_ref().map(|i| i.state())
    }

    /// Resolve a symbolic address against the engine's address space.
    pub fn resolve(&self, symbol: &str, data_type: DataType) -> Result<Address, SimError> {
        self.space.resolve(symbol, data_type)
    }

    /// Adapter-facing raw read: big-endian bytes or `InvalidAddress`.
    pub fn read(&self, symbol: &str, data_type: DataType) -> Result<Vec<u8>, SimError> {
        let address = self.space.resolve(symbol, data_type)?;
        Ok(self.store.read_bytes(&address))
    }

    /// Adapter-facing raw write. Rejects writes landing on a read-only
    /// tag's backing storage with `AccessDenied`; the store itself stays
    /// policy-free.
    pub fn write(&self, symbol: &str, data_type: DataType, bytes: &[u8]) -> Result<(), SimError> {
        let address = self.space.resolve(symbol, data_type)?;
        if let Some(tag) = self.tags.read_only_overlap(&address) {
            return Err(SimError::AccessDenied(tag.name.clone()));
        }
        debug!(%symbol, ?data_type, "adapter write");
        self.store.write_bytes(&address, bytes)
    }

    /// Decoded variant of `read` for adapters that speak values, not bytes.
    pub fn read_value(&self, symbol: &str, data_type: DataType) -> Result<Value, SimError> {
        let address = self.space.resolve(symbol, data_type)?;
        Ok(self.store.read_typed(&address))
    }

    pub fn write_value(
        &self,
        symbol: &str,
        data_type: DataType,
        value: Value,
    ) -> Result<(), SimError> {
        let address = self.space.resolve(symbol, data_type)?;
        if let Some(tag) = self.tags.read_only_overlap(&address) {
            return Err(SimError::AccessDenied(tag.name.clone()));
        }
        self.store.write_typed(&address, value);
        Ok(())
    }

    /// Engineering-unit read through a tag's scale.
    pub fn read_tag(&self, name: &str) -> Result<f64, SimError> {
        let tag = self.tags.get(name)?;
        Ok(tag.engineering_from_raw(self.store.read_typed(&tag.address)))
    }

    /// Engineering-unit write through a tag's scale; read-only tags are
    /// rejected with `AccessDenied`.
    pub fn write_tag(&self, name: &str, engineering: f64) -> Result<(), SimError> {
        let tag = self.tags.get(name)?;
        if tag.access == AccessMode::ReadOnly {
            return Err(SimError::AccessDenied(tag.name.clone()));
        }
        self.store
            .write_typed(&tag.address, tag.raw_from_engineering(engineering));
        Ok(())
    }

    pub fn tags(&self) -> &TagTable {
        &self.tags
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }
}

fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
