//! pc-core: stable foundation for plumecast.
//!
//! Contains:
//! - units (uom SI types + constructors + physical constants)
//! - numeric (Real + tolerances + float helpers + clamping)
//! - special (erf, gamma)
//! - roots (bracketed scalar root finding)
//! - concentration (mass concentration <-> ppm)
//! - error (shared error types)

pub mod concentration;
pub mod error;
pub mod numeric;
pub mod roots;
pub mod special;
pub mod units;

// Re-exports: nice ergonomics for downstream crates
pub use concentration::PpmConverter;
pub use error::{PcError, PcResult};
pub use numeric::*;
pub use roots::{RootOptions, RootSolution, bisect};
pub use special::{erf, gamma};
pub use units::*;
