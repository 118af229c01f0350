pub mod motor;
pub mod power;

pub use motor::{MotorBindings, MotorModel, MotorParams};
pub use power::{PowerBindings, PowerModel, PowerParams};

use crate::memory::StoreGuard;

/// A physical-process model advanced once per scheduler tick.
///
/// Models read their inputs from and write their outputs back to the shared
/// store, under the exclusive guard the engine already holds for the tick.
/// Steps are pure functions of previous store contents plus model state,
/// with no randomness, so tick sequences are reproducible in tests. Rate
/// parameters are expressed per tick.
pub trait ProcessModel: Send {
    fn name(&self) -> &'static str;

    /// Advance one tick. `now_ms` is Unix time in milliseconds, used only
    /// for timestamp registers.
    fn step(&mut self, guard: &mut StoreGuard<'_>, now_ms: u64);
}
