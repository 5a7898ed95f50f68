use thiserror::Error;

pub type PcResult<T> = Result<T, PcError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PcError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Root not bracketed for {what}: f(lo)={f_lo}, f(hi)={f_hi}")]
    NotBracketed {
        what: &'static str,
        f_lo: f64,
        f_hi: f64,
    },

    #[error("No convergence for {what} after {iterations} iterations (residual={residual:e})")]
    NoConvergence {
        what: &'static str,
        iterations: usize,
        residual: f64,
    },

    #[error("Invariant violated: {what}")]
    Invariant { what: &'static str },
}
