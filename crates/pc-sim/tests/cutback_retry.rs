//! Cutback retry tests for the step-model stepper.

use pc_sim::{SimError, SimOptions, SimResult, StepModel, Stepper, step_with_cutback};
use std::cell::Cell;

/// Fails whenever asked to take a step longer than `max_ok_dt`.
struct StiffStep {
    max_ok_dt: f64,
    calls: Cell<usize>,
}

impl StepModel for StiffStep {
    type State = f64;

    fn initial_state(&self) -> f64 {
        0.0
    }

    fn advance(&self, x: &f64, dt: f64) -> SimResult<f64> {
        self.calls.set(self.calls.get() + 1);
        if dt > self.max_ok_dt {
            return Err(SimError::Retryable {
                message: "sub-solve diverged".into(),
                residual: dt,
            });
        }
        Ok(x + dt)
    }

    fn is_terminal(&self, _x: &f64) -> bool {
        false
    }
}

fn retry_opts() -> SimOptions {
    SimOptions {
        dt: 0.1,
        t_end: 0.2,
        max_steps: 10,
        min_dt: 0.01,
        max_retries: 4,
        cutback_factor: 0.5,
        grow_factor: 2.0,
    }
}

#[test]
fn stepper_cuts_back_until_step_is_accepted() {
    let model = StiffStep {
        max_ok_dt: 0.03,
        calls: Cell::new(0),
    };
    let mut stepper = Stepper::new(&model, retry_opts()).unwrap();
    let first = stepper.next().unwrap().unwrap();
    assert!((first.dt - 0.025).abs() < 1e-12);
    assert_eq!(model.calls.get(), 3);
}

#[test]
fn exhausted_retries_report_step_time_and_residual() {
    let model = StiffStep {
        max_ok_dt: 1e-6,
        calls: Cell::new(0),
    };
    let err = step_with_cutback(&model, &0.0, 3.5, 7, 0.1, &retry_opts()).unwrap_err();
    match err {
        SimError::ConvergenceFailed {
            step,
            time_s,
            residual,
            ..
        } => {
            assert_eq!(step, 7);
            assert_eq!(time_s, 3.5);
            assert!((residual - 0.0125).abs() < 1e-15);
        }
        other => panic!("expected ConvergenceFailed, got {other:?}"),
    }
    assert_eq!(model.calls.get(), 4);
}

#[test]
fn stepper_reports_convergence_failure_once() {
    let model = StiffStep {
        max_ok_dt: 1e-6,
        calls: Cell::new(0),
    };
    let mut stepper = Stepper::new(&model, retry_opts()).unwrap();
    let err = stepper.next().unwrap().unwrap_err();
    assert!(matches!(err, SimError::ConvergenceFailed { .. }));
    assert!(stepper.next().is_none());
}

proptest::proptest! {
    #[test]
    fn stepper_reaches_t_end_with_accepted_steps_only(max_ok_dt in 0.02f64..1.0) {
        let model = StiffStep {
            max_ok_dt,
            calls: Cell::new(0),
        };
        let opts = SimOptions {
            dt: 1.0,
            t_end: 5.0,
            max_steps: 10_000,
            min_dt: 1e-3,
            ..SimOptions::default()
        };
        let records = Stepper::new(&model, opts)
            .unwrap()
            .collect::<SimResult<Vec<_>>>()
            .unwrap();
        let last = records.last().unwrap();
        proptest::prop_assert!((last.state - 5.0).abs() < 1e-6);
        proptest::prop_assert!((last.t - last.state).abs() < 1e-9);
        for r in &records {
            proptest::prop_assert!(r.dt <= max_ok_dt);
        }
    }
}
