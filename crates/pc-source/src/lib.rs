//! Source-term models: how fast a chemical leaves its containment and how
//! much of it becomes airborne.
//!
//! Provides:
//! - Orifice flow for gases (choked and subsonic) and liquids
//! - Pipeline blowdown, gas tank venting and liquid tank draining
//! - Flashing two-phase discharge of superheated liquids
//! - Spreading, evaporating puddles with a surface energy balance
//! - A tagged [`SourceSpec`] that builds any of the above into a [`SourceModel`]

pub mod common;
pub mod direct;
pub mod error;
pub mod orifice;
pub mod pipeline;
pub mod puddle;
pub mod release;
pub mod series;
pub mod tank_gas;
pub mod tank_liquid;
pub mod two_phase;

pub use direct::{DirectRelease, DirectSpec, DirectState};
pub use error::{SourceError, SourceResult};
pub use orifice::{GasFlow, Orifice};
pub use pipeline::{PipelineLeak, PipelineSpec, PipelineState};
pub use puddle::{
    EnergyFluxes, FluxTerm, PuddleEvaporation, PuddleSpec, PuddleState, PuddleSurface, Substrate,
};
pub use release::{ReleaseSeries, SourceModel, SourceRelease, SourceSpec, SourceState, collect_series};
pub use series::{PhaseSplit, ReleaseSample, ReleaseTimeSeries};
pub use tank_gas::{TankGasRelease, TankGasSpec, TankGasState};
pub use tank_liquid::{TankLiquidRelease, TankLiquidSpec, TankLiquidState};
pub use two_phase::{TwoPhaseRelease, TwoPhaseSpec, TwoPhaseState, flash_fraction};
