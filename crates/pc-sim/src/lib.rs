//! Time-stepping framework for release and cloud models.
//!
//! Provides:
//! - `TransientModel` (x' = f(t, x)) with a fixed-step RK4 integrator
//! - `StepModel` state machines advanced by explicit `advance(state, dt)`
//! - Step cut-back and bounded retry on recoverable sub-solve failures
//! - Lazy `Stepper` iterator over a `StepModel` trajectory

pub mod error;
pub mod integrator;
pub mod model;
pub mod sim;
pub mod stepper;

// Re-exports for public API
pub use error::{SimError, SimResult};
pub use integrator::{Integrator, RK4};
pub use model::{StepModel, TransientModel};
pub use sim::SimOptions;
pub use stepper::{StepRecord, Stepper, step_with_cutback};
