//! Plant emulation for the receding-horizon loop.
//!
//! Provides:
//! - the `SimulationEngine` contract an emulated plant implements
//! - `Emulator`, which owns the accumulated results table `res`
//! - fixed-step RK4 / forward-Euler integrators
//! - `OdeEngine`, a reference engine for state-space models

pub mod emulator;
pub mod engine;
pub mod error;
pub mod integrator;
pub mod model;
pub mod ode;

pub use emulator::{Emulator, EmulatorSettings};
pub use engine::SimulationEngine;
pub use error::{SimError, SimResult};
pub use integrator::{ForwardEuler, Integrator, IntegratorType, RK4};
pub use model::{DynamicModel, TransientModel};
pub use ode::OdeEngine;
