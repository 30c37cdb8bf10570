//! Error types for the simulation engine
//!
//! Setup-time errors (parameter graph, model validation) abort a run before
//! any integration starts. Run-time errors ([`Error::NumericalInstability`]
//! and [`Error::InvalidState`]) are reported through
//! [`RunStatus::Failed`](crate::structs::trajectory::RunStatus) together with
//! the partial trajectory; cancellation is a status, not an error.

use serde::Serialize;
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum Error {
    /// The parameter or derived-quantity dependency graph has a cycle
    #[error("cyclic definition involving: {}", .names.join(", "))]
    CyclicDefinition { names: Vec<String> },

    /// An expression or override refers to a name that is not defined
    #[error("`{referenced_by}` references unknown name `{name}`")]
    UnknownReference { name: String, referenced_by: String },

    /// The model definition or simulation input is structurally invalid
    #[error("invalid model: {reason}")]
    InvalidModel { reason: String },

    /// The adaptive step-size controller failed before the next output time
    #[error("numerical instability at t = {time}: {detail}")]
    NumericalInstability { time: f64, detail: String },

    /// A compartment mass became non-finite (NaN or infinite)
    #[error("non-finite mass in compartment `{compartment}` at t = {time}")]
    InvalidState { time: f64, compartment: String },
}

impl Error {
    pub(crate) fn invalid_model(reason: impl Into<String>) -> Self {
        Error::InvalidModel {
            reason: reason.into(),
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
