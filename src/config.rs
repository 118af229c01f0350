use crate::memory::{AddressingMode, DataType, MemoryArea};
use crate::process::{MotorParams, PowerParams};
use crate::tags::AccessMode;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bound when the primary port is unavailable.
    #[serde(default = "default_fallback_port")]
    pub fallback_port: u16,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            fallback_port: default_fallback_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6002
}

fn default_fallback_port() -> u16 {
    16002
}

fn default_tick_interval_ms() -> u64 {
    500
}

fn default_scale() -> f64 {
    1.0
}

fn default_access() -> AccessMode {
    AccessMode::ReadWrite
}

fn default_fault_code() -> i32 {
    999
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TagConfig {
    pub name: String,
    /// Symbolic address, e.g. `DB1.DBX0.0` or `HR100`.
    pub address: String,
    pub data_type: DataType,
    #[serde(default = "default_access")]
    pub access: AccessMode,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(default)]
    pub default: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorModelConfig {
    #[serde(flatten)]
    pub params: MotorParams,
    pub command_tag: String,
    pub running_tag: String,
    pub speed_tag: String,
    pub temperature_tag: String,
    #[serde(default)]
    pub target_tag: Option<String>,
    #[serde(default)]
    pub start_timestamp_tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerModelConfig {
    #[serde(flatten)]
    pub params: PowerParams,
    pub pv_tag: String,
    pub load_tag: String,
    pub grid_tag: String,
    pub battery_power_tag: String,
    pub battery_soc_tag: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterlockConfig {
    /// Bool tag inspected each tick.
    pub trigger_tag: String,
    /// Tags forced to zero/false while the trigger holds.
    pub cleared_output_tags: Vec<String>,
    pub fault_code_tag: String,
    #[serde(default = "default_fault_code")]
    pub fault_code_value: i32,
}

/// Top-level simulator settings: network, tick period, area definitions,
/// tag map and the optional process models. The default configuration
/// reproduces the reference register maps of the emulated S7 data-block
/// and power-conversion controllers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    pub areas: Vec<MemoryArea>,
    #[serde(default)]
    pub tags: Vec<TagConfig>,
    #[serde(default)]
    pub motor: Option<MotorModelConfig>,
    #[serde(default)]
    pub power: Option<PowerModelConfig>,
    #[serde(default)]
    pub interlock: Option<InterlockConfig>,
}

impl SimulatorConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: SimulatorConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_yaml_str(&std::fs::read_to_string(path)?)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.areas.is_empty() {
            return Err(ConfigError::Invalid("no memory areas defined".into()));
        }
        for (i, area) in self.areas.iter().enumerate() {
            if self.areas[..i]
                .iter()
                .any(|a| a.code.eq_ignore_ascii_case(&area.code))
            {
                return Err(ConfigError::Invalid(format!(
                    "duplicate area code `{}`",
                    area.code
                )));
            }
            if area.size_bytes == 0 {
                return Err(ConfigError::Invalid(format!(
                    "area `{}` has zero size",
                    area.code
                )));
            }
        }
        for (i, tag) in self.tags.iter().enumerate() {
            if self.tags[..i].iter().any(|t| t.name == tag.name) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate tag `{}`",
                    tag.name
                )));
            }
            if tag.scale == 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "tag `{}` has zero scale",
                    tag.name
                )));
            }
        }
        Ok(())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        let bit_byte = vec![AddressingMode::Bit, AddressingMode::Byte];
        let all_modes = vec![
            AddressingMode::Bit,
            AddressingMode::Byte,
            AddressingMode::Word,
            AddressingMode::DoubleWord,
        ];

        let areas = vec![
            MemoryArea {
                code: "I".into(),
                modes: bit_byte.clone(),
                size_bytes: 64,
                retentive: false,
                word_only: false,
                word_addressed: false,
            },
            MemoryArea {
                code: "Q".into(),
                modes: bit_byte,
                size_bytes: 64,
                retentive: false,
                word_only: false,
                word_addressed: false,
            },
            MemoryArea {
                code: "M".into(),
                modes: all_modes.clone(),
                size_bytes: 256,
                retentive: true,
                word_only: false,
                word_addressed: false,
            },
            MemoryArea {
                code: "DB1".into(),
                modes: all_modes,
                size_bytes: 1024,
                retentive: true,
                word_only: false,
                word_addressed: false,
            },
            // Power-conversion holding registers: whole 16-bit words only,
            // numeric offsets count words.
            MemoryArea {
                code: "HR".into(),
                modes: vec![AddressingMode::Word, AddressingMode::DoubleWord],
                size_bytes: 32768,
                retentive: false,
                word_only: true,
                word_addressed: true,
            },
        ];

        let tag = |name: &str, address: &str, data_type, access, default: f64| TagConfig {
            name: name.into(),
            address: address.into(),
            data_type,
            access,
            scale: 1.0,
            default,
        };
        use AccessMode::{ReadOnly, ReadWrite};
        use DataType::{Bool, Float32, Int16, Uint32};

        let tags = vec![
            tag("motor_command", "DB1.DBX0.0", Bool, ReadWrite, 0.0),
            tag("fault_active", "DB1.DBX0.1", Bool, ReadWrite, 0.0),
            tag("motor_running", "DB1.DBX0.2", Bool, ReadOnly, 0.0),
            tag("motor_target_rpm", "DB1.DBW2", Int16, ReadWrite, 1500.0),
            tag("motor_speed_rpm", "DB1.DBD4", Float32, ReadOnly, 0.0),
            tag("motor_temperature", "DB1.DBD8", Float32, ReadOnly, 25.0),
            tag("fault_code", "DB1.DBW12", Int16, ReadOnly, 0.0),
            tag("motor_start_ts", "DB1.DBD14", Uint32, ReadOnly, 0.0),
            tag("pv_power", "HR100", Float32, ReadWrite, 0.0),
            tag("load_power", "HR102", Float32, ReadWrite, 0.0),
            tag("grid_power", "HR104", Float32, ReadOnly, 0.0),
            tag("battery_power", "HR106", Float32, ReadOnly, 0.0),
            tag("battery_soc", "HR108", Float32, ReadOnly, 50.0),
        ];

        Self {
            network: NetworkConfig::default(),
            tick_interval_ms: default_tick_interval_ms(),
            areas,
            tags,
            motor: Some(MotorModelConfig {
                params: MotorParams::default(),
                command_tag: "motor_command".into(),
                running_tag: "motor_running".into(),
                speed_tag: "motor_speed_rpm".into(),
                temperature_tag: "motor_temperature".into(),
                target_tag: Some("motor_target_rpm".into()),
                start_timestamp_tag: Some("motor_start_ts".into()),
            }),
            power: Some(PowerModelConfig {
                params: PowerParams::default(),
                pv_tag: "pv_power".into(),
                load_tag: "load_power".into(),
                grid_tag: "grid_power".into(),
                battery_power_tag: "battery_power".into(),
                battery_soc_tag: "battery_soc".into(),
            }),
            interlock: Some(InterlockConfig {
                trigger_tag: "fault_active".into(),
                cleared_output_tags: vec![
                    "motor_running".into(),
                    "motor_speed_rpm".into(),
                    "motor_start_ts".into(),
                ],
                fault_code_tag: "fault_code".into(),
                fault_code_value: default_fault_code(),
            }),
        }
    }
}
