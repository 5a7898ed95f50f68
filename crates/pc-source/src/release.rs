//! Source-term selection and stepping.
//!
//! [`SourceSpec`] is the serialized description of a release. Building it
//! against a chemical and an atmosphere gives a [`SourceModel`], which steps
//! like any other [`StepModel`] and reduces each state to a
//! [`ReleaseSample`].

use crate::direct::{DirectRelease, DirectSpec, DirectState};
use crate::error::{SourceError, SourceResult};
use crate::pipeline::{PipelineLeak, PipelineSpec, PipelineState};
use crate::puddle::{PuddleEvaporation, PuddleSpec, PuddleState};
use crate::series::{PhaseSplit, ReleaseSample, ReleaseTimeSeries};
use crate::tank_gas::{TankGasRelease, TankGasSpec, TankGasState};
use crate::tank_liquid::{TankLiquidRelease, TankLiquidSpec, TankLiquidState};
use crate::two_phase::{TwoPhaseRelease, TwoPhaseSpec, TwoPhaseState};
use pc_chem::Chemical;
use pc_met::MeteorologicalState;
use pc_sim::{SimError, SimOptions, SimResult, StepModel, Stepper, step_with_cutback};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    Pipeline(PipelineSpec),
    TankGas(TankGasSpec),
    TankLiquid(TankLiquidSpec),
    TwoPhase(TwoPhaseSpec),
    Puddle(PuddleSpec),
    Direct(DirectSpec),
}

impl SourceSpec {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceSpec::Pipeline(_) => "pipeline",
            SourceSpec::TankGas(_) => "tank_gas",
            SourceSpec::TankLiquid(_) => "tank_liquid",
            SourceSpec::TwoPhase(_) => "two_phase",
            SourceSpec::Puddle(_) => "puddle",
            SourceSpec::Direct(_) => "direct",
        }
    }

    pub fn validate(&self) -> SourceResult<()> {
        match self {
            SourceSpec::Pipeline(s) => s.validate(),
            SourceSpec::TankGas(s) => s.validate(),
            SourceSpec::TankLiquid(s) => s.validate(),
            SourceSpec::TwoPhase(s) => s.validate(),
            SourceSpec::Puddle(s) => s.surface.validate(),
            SourceSpec::Direct(s) => s.validate(),
        }
    }

    pub fn build(&self, chemical: &Chemical, met: &MeteorologicalState) -> SourceResult<SourceModel> {
        let model = match self {
            SourceSpec::Pipeline(s) => SourceModel::Pipeline(PipelineLeak::new(s, chemical, met)?),
            SourceSpec::TankGas(s) => SourceModel::TankGas(TankGasRelease::new(s, chemical, met)?),
            SourceSpec::TankLiquid(s) => {
                SourceModel::TankLiquid(TankLiquidRelease::new(s, chemical, met)?)
            }
            SourceSpec::TwoPhase(s) => SourceModel::TwoPhase(TwoPhaseRelease::new(s, chemical, met)?),
            SourceSpec::Puddle(s) => SourceModel::Puddle(PuddleEvaporation::new(s, chemical, met)?),
            SourceSpec::Direct(s) => SourceModel::Direct(DirectRelease::new(s, met)?),
        };
        tracing::debug!(
            kind = self.kind(),
            chemical = %chemical.name,
            inventory_kg = model.initial_inventory_kg(),
            "source model built"
        );
        Ok(model)
    }
}

#[derive(Debug, Clone)]
pub enum SourceModel {
    Pipeline(PipelineLeak),
    TankGas(TankGasRelease),
    TankLiquid(TankLiquidRelease),
    TwoPhase(TwoPhaseRelease),
    Puddle(PuddleEvaporation),
    Direct(DirectRelease),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceState {
    Pipeline(PipelineState),
    TankGas(TankGasState),
    TankLiquid(TankLiquidState),
    TwoPhase(TwoPhaseState),
    Puddle(PuddleState),
    Direct(DirectState),
}

impl SourceModel {
    pub fn kind(&self) -> &'static str {
        match self {
            SourceModel::Pipeline(_) => "pipeline",
            SourceModel::TankGas(_) => "tank_gas",
            SourceModel::TankLiquid(_) => "tank_liquid",
            SourceModel::TwoPhase(_) => "two_phase",
            SourceModel::Puddle(_) => "puddle",
            SourceModel::Direct(_) => "direct",
        }
    }

    /// Mass available for release at the start of the run.
    pub fn initial_inventory_kg(&self) -> f64 {
        match self {
            SourceModel::Pipeline(m) => m.initial_inventory_kg(),
            SourceModel::TankGas(m) => m.initial_mass_kg(),
            SourceModel::TankLiquid(m) => m.initial_mass_kg(),
            SourceModel::TwoPhase(m) => m.initial_mass_kg(),
            SourceModel::Puddle(m) => m.initial_state().mass_kg,
            SourceModel::Direct(m) => m.total_mass_kg(),
        }
    }

    /// Reduce a state to the rates the dispersion models consume.
    pub fn sample(&self, state: &SourceState) -> ReleaseSample {
        match (self, state) {
            (SourceModel::Pipeline(_), SourceState::Pipeline(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.mass_flow_kg_s,
                airborne_kg_s: s.mass_flow_kg_s,
                temperature_k: s.temperature_k,
                phase: PhaseSplit::VAPOR,
                released_kg: s.released_kg,
            },
            (SourceModel::TankGas(_), SourceState::TankGas(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.mass_flow_kg_s,
                airborne_kg_s: s.mass_flow_kg_s,
                temperature_k: s.temperature_k,
                phase: PhaseSplit::VAPOR,
                released_kg: s.released_kg,
            },
            (SourceModel::TankLiquid(_), SourceState::TankLiquid(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.discharge_kg_s,
                airborne_kg_s: s.puddle.evaporation_kg_s,
                temperature_k: s.puddle.temperature_k,
                phase: PhaseSplit::LIQUID,
                released_kg: s.released_kg,
            },
            (SourceModel::TwoPhase(m), SourceState::TwoPhase(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.mass_flow_kg_s,
                airborne_kg_s: s.mass_flow_kg_s * s.phase.airborne(),
                temperature_k: m.jet_temperature_k(),
                phase: s.phase,
                released_kg: s.released_kg,
            },
            (SourceModel::Puddle(_), SourceState::Puddle(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.evaporation_kg_s,
                airborne_kg_s: s.evaporation_kg_s,
                temperature_k: s.temperature_k,
                phase: PhaseSplit::VAPOR,
                released_kg: s.evaporated_kg,
            },
            (SourceModel::Direct(m), SourceState::Direct(s)) => ReleaseSample {
                time_s: s.time_s,
                mass_flow_kg_s: s.mass_flow_kg_s,
                airborne_kg_s: s.mass_flow_kg_s,
                temperature_k: m.temperature_k(),
                phase: PhaseSplit::VAPOR,
                released_kg: s.released_kg,
            },
            (model, _) => {
                tracing::error!(kind = model.kind(), "state does not belong to this source model");
                ReleaseSample {
                    time_s: 0.0,
                    mass_flow_kg_s: 0.0,
                    airborne_kg_s: 0.0,
                    temperature_k: 0.0,
                    phase: PhaseSplit::VAPOR,
                    released_kg: 0.0,
                }
            }
        }
    }
}

fn mismatch() -> SimError {
    SimError::InvalidArg {
        what: "state does not belong to this source model",
    }
}

impl StepModel for SourceModel {
    type State = SourceState;

    fn initial_state(&self) -> SourceState {
        match self {
            SourceModel::Pipeline(m) => SourceState::Pipeline(m.initial_state()),
            SourceModel::TankGas(m) => SourceState::TankGas(m.initial_state()),
            SourceModel::TankLiquid(m) => SourceState::TankLiquid(m.initial_state()),
            SourceModel::TwoPhase(m) => SourceState::TwoPhase(m.initial_state()),
            SourceModel::Puddle(m) => SourceState::Puddle(m.initial_state()),
            SourceModel::Direct(m) => SourceState::Direct(m.initial_state()),
        }
    }

    fn advance(&self, state: &SourceState, dt: f64) -> SimResult<SourceState> {
        Ok(match (self, state) {
            (SourceModel::Pipeline(m), SourceState::Pipeline(s)) => {
                SourceState::Pipeline(m.advance(s, dt)?)
            }
            (SourceModel::TankGas(m), SourceState::TankGas(s)) => {
                SourceState::TankGas(m.advance(s, dt)?)
            }
            (SourceModel::TankLiquid(m), SourceState::TankLiquid(s)) => {
                SourceState::TankLiquid(m.advance(s, dt)?)
            }
            (SourceModel::TwoPhase(m), SourceState::TwoPhase(s)) => {
                SourceState::TwoPhase(m.advance(s, dt)?)
            }
            (SourceModel::Puddle(m), SourceState::Puddle(s)) => {
                SourceState::Puddle(m.advance(s, dt)?)
            }
            (SourceModel::Direct(m), SourceState::Direct(s)) => {
                SourceState::Direct(m.advance(s, dt)?)
            }
            _ => return Err(mismatch()),
        })
    }

    fn is_terminal(&self, state: &SourceState) -> bool {
        match (self, state) {
            (SourceModel::Pipeline(m), SourceState::Pipeline(s)) => m.is_terminal(s),
            (SourceModel::TankGas(m), SourceState::TankGas(s)) => m.is_terminal(s),
            (SourceModel::TankLiquid(m), SourceState::TankLiquid(s)) => m.is_terminal(s),
            (SourceModel::TwoPhase(m), SourceState::TwoPhase(s)) => m.is_terminal(s),
            (SourceModel::Puddle(m), SourceState::Puddle(s)) => m.is_terminal(s),
            (SourceModel::Direct(m), SourceState::Direct(s)) => m.is_terminal(s),
            _ => true,
        }
    }
}

/// A source model together with the state it owns.
#[derive(Debug, Clone)]
pub struct SourceRelease {
    model: SourceModel,
    state: SourceState,
}

impl SourceRelease {
    pub fn new(model: SourceModel) -> Self {
        let state = model.initial_state();
        Self { model, state }
    }

    pub fn model(&self) -> &SourceModel {
        &self.model
    }

    pub fn state(&self) -> &SourceState {
        &self.state
    }

    pub fn sample(&self) -> ReleaseSample {
        self.model.sample(&self.state)
    }

    pub fn is_finished(&self) -> bool {
        self.model.is_terminal(&self.state)
    }

    /// Advance by up to `dt`, cutting back per `opts`; returns the step taken.
    pub fn step(&mut self, dt: f64, opts: &SimOptions) -> SourceResult<f64> {
        let t = self.sample().time_s;
        let (next, used) = step_with_cutback(&self.model, &self.state, t, 0, dt, opts)?;
        self.state = next;
        Ok(used)
    }
}

/// Lazily yields the initial sample followed by one sample per accepted step.
pub struct ReleaseSeries<'a> {
    model: &'a SourceModel,
    initial: Option<ReleaseSample>,
    stepper: Stepper<'a, SourceModel>,
}

impl<'a> ReleaseSeries<'a> {
    pub fn new(model: &'a SourceModel, opts: SimOptions) -> SourceResult<Self> {
        let stepper = Stepper::new(model, opts)?;
        Ok(Self {
            model,
            initial: Some(model.sample(stepper.state())),
            stepper,
        })
    }
}

impl Iterator for ReleaseSeries<'_> {
    type Item = SourceResult<ReleaseSample>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(first) = self.initial.take() {
            return Some(Ok(first));
        }
        self.stepper.next().map(|record| {
            record
                .map(|r| self.model.sample(&r.state))
                .map_err(SourceError::from)
        })
    }
}

/// Step `model` to completion (or `opts.t_end`) and collect its samples.
pub fn collect_series(model: &SourceModel, opts: SimOptions) -> SourceResult<ReleaseTimeSeries> {
    let samples = ReleaseSeries::new(model, opts)?.collect::<SourceResult<Vec<_>>>()?;
    let series = ReleaseTimeSeries::new(samples);
    tracing::info!(
        kind = model.kind(),
        samples = series.samples.len(),
        duration_s = series.duration_s(),
        released_kg = series.total_released_kg(),
        "source term complete"
    );
    Ok(series)
}
