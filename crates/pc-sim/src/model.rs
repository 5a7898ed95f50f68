//! Model traits for pluggable dynamic systems.

use crate::error::SimResult;

/// Trait for transient (dynamic) system models integrated as ODEs.
///
/// A TransientModel must implement:
/// - State type (Clone, for snapshots)
/// - Initial state
/// - RHS (right-hand side) computation: x_dot = f(t, x)
/// - Scalar field arithmetic for integration: add states, scale by scalar
///
/// The independent variable need not be time; the heavy-gas cloud integrates
/// along downwind distance.
pub trait TransientModel {
    /// State type (must be Clone).
    type State: Clone;

    /// Return the initial state at t=0.
    fn initial_state(&self) -> Self::State;

    /// Compute state derivative dxdt = f(t, x).
    ///
    /// Returning [`crate::SimError::Retryable`] asks the stepper to retry the
    /// step with a smaller increment.
    fn rhs(&mut self, t: f64, x: &Self::State) -> SimResult<Self::State>;

    /// Add two states element-wise: result = a + b.
    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    /// Scale a state by a scalar: result = scale * a.
    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

/// Explicit state machine: `advance(state, dt) -> state'`.
///
/// Used where the update is not a plain ODE (discrete regime switches,
/// clamps against inventory, implicit sub-solves). `advance` must not mutate
/// the model; all evolving quantities live in `State`.
pub trait StepModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// Advance by `dt` seconds.
    fn advance(&self, state: &Self::State, dt: f64) -> SimResult<Self::State>;

    /// True once the model has nothing further to release.
    fn is_terminal(&self, state: &Self::State) -> bool;
}
