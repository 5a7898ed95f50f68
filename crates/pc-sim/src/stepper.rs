//! Lazy stepping of [`StepModel`] state machines.

use crate::error::{SimError, SimResult};
use crate::model::StepModel;
use crate::sim::SimOptions;

/// One accepted step of a [`Stepper`].
#[derive(Clone, Debug)]
pub struct StepRecord<S> {
    pub step: usize,
    /// Time at the end of the step, s.
    pub t: f64,
    /// Step actually taken (after any cut-back), s.
    pub dt: f64,
    pub state: S,
}

/// Advance `state` by up to `dt`, cutting the step back on retryable failures.
///
/// Returns the new state and the step actually taken. When the retry budget
/// (or `min_dt`) is exhausted the failure becomes
/// [`SimError::ConvergenceFailed`] carrying the last residual.
pub fn step_with_cutback<M: StepModel>(
    model: &M,
    state: &M::State,
    t: f64,
    step: usize,
    dt: f64,
    opts: &SimOptions,
) -> SimResult<(M::State, f64)> {
    let mut attempt = dt;
    let mut retries = 0;
    loop {
        match model.advance(state, attempt) {
            Ok(next) => return Ok((next, attempt)),
            Err(SimError::Retryable { message, residual }) => {
                let smaller = attempt * opts.cutback_factor;
                if retries >= opts.max_retries || smaller < opts.min_dt {
                    return Err(SimError::ConvergenceFailed {
                        what: message,
                        step,
                        time_s: t,
                        residual,
                    });
                }
                tracing::warn!(step, t, dt = attempt, retry = retries + 1, %message, "step cut back");
                retries += 1;
                attempt = smaller;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Iterator over accepted steps of a [`StepModel`].
///
/// Stops after the first terminal state, at `t_end`, at `max_steps`, or after
/// yielding an error. The initial state is not yielded.
pub struct Stepper<'a, M: StepModel> {
    model: &'a M,
    opts: SimOptions,
    state: M::State,
    t: f64,
    dt: f64,
    step: usize,
    done: bool,
}

impl<'a, M: StepModel> Stepper<'a, M> {
    pub fn new(model: &'a M, opts: SimOptions) -> SimResult<Self> {
        opts.validate()?;
        let state = model.initial_state();
        let done = model.is_terminal(&state);
        let dt = opts.dt;
        Ok(Self {
            model,
            opts,
            state,
            t: 0.0,
            dt,
            step: 0,
            done,
        })
    }

    pub fn state(&self) -> &M::State {
        &self.state
    }

    pub fn time(&self) -> f64 {
        self.t
    }
}

impl<M: StepModel> Iterator for Stepper<'_, M> {
    type Item = SimResult<StepRecord<M::State>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done
            || self.opts.t_end - self.t <= self.opts.end_slack()
            || self.step >= self.opts.max_steps
        {
            return None;
        }

        let requested = self.dt.min(self.opts.t_end - self.t);
        match step_with_cutback(self.model, &self.state, self.t, self.step, requested, &self.opts) {
            Ok((next, used)) => {
                self.t += used;
                self.step += 1;
                self.dt = self.opts.next_dt(used);
                self.state = next;
                self.done = self.model.is_terminal(&self.state);
                Some(Ok(StepRecord {
                    step: self.step,
                    t: self.t,
                    dt: used,
                    state: self.state.clone(),
                }))
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
