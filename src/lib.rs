//! # PLC Register-Engine Simulator
//!
//! Emulates the externally observable behavior of industrial controllers
//! (an S7-style data-block server and a power-conversion-system register
//! server) so HMI/SCADA clients and test harnesses can exercise read/write
//! sequences against a believable, internally consistent process without
//! hardware.
//!
//! ## Features
//!
//! - **Typed address space**: area-partitioned memory with bit/byte/word
//!   addressing rules, symbolic address parsing and big-endian conversion
//! - **Tag layer**: named, scaled, access-controlled register bindings
//! - **Process simulation**: motor ramp and PV/battery power-balance models
//!   advanced on a fixed tick
//! - **Safety interlock**: a fault trigger forces outputs to a safe state
//!   and latches a fault code, overriding the simulation
//! - **Adapter surface**: JSON-lines TCP protocol for external clients,
//!   with the engine itself protocol-agnostic
//!
//! ## Quick Start
//!
//! ```rust
//! use plcsim::{SimEngine, SimulatorConfig};
//!
//! let engine = SimEngine::from_config(&SimulatorConfig::default()).unwrap();
//!
//! // Command the motor on and advance the process.
//! engine.write_tag("motor_command", 1.0).unwrap();
//! engine.tick();
//!
//! assert!(engine.read_tag("motor_speed_rpm").unwrap() > 0.0);
//! ```
//!
//! ## Architecture
//!
//! - [`memory`] - address space model and the mutable backing store
//! - [`tags`] - symbolic tag bindings with scaling and access modes
//! - [`process`] - physical-process models run each tick
//! - [`interlock`] - safety override state machine
//! - [`engine`] - orchestrator owning store, tags, models and interlock
//! - [`scheduler`] - periodic tick driver
//! - [`adapter`] - JSON-lines TCP request handling
//! - [`config`] - YAML configuration surface

pub mod adapter;
pub mod config;
pub mod engine;
pub mod error;
pub mod interlock;
pub mod memory;
pub mod process;
pub mod scheduler;
pub mod tags;

// Re-export main public types for convenience
pub use config::SimulatorConfig;
pub use engine::SimEngine;
pub use error::SimError;
pub use memory::{Address, AddressSpace, DataType, MemoryStore, Value};
