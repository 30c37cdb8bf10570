//! A whole-body physiologically based pharmacokinetic (PBPK) simulation
//! engine.
//!
//! Models are declared as named parameters (literal values or arithmetic
//! expressions over other parameters), one-time derived quantities, a list of
//! compartments and a right-hand side over amounts in those compartments.
//! A resolved [`SimulationContext`](simulator::SimulationContext) integrates
//! the system with an adaptive Runge-Kutta solver, applying bolus doses and
//! infusion rate changes exactly at their scheduled times, and samples the
//! trajectory on a caller-supplied output grid.
//!
//! ```
//! use pbpkcore::models::pk1;
//! use pbpkcore::prelude::*;
//!
//! # fn run() -> pbpkcore::Result<()> {
//! let model = pk1::model()?;
//! let subject = model.context()?;
//!
//! let regimen = Regimen::new().bolus(0.0, 100.0, pk1::GUT);
//! let times: Vec<f64> = (0..=24).map(f64::from).collect();
//!
//! let trajectory = subject.simulate(&regimen, &times, &SolverOptions::default())?;
//! assert!(trajectory.status().is_completed());
//! assert_eq!(trajectory.len(), times.len());
//! # Ok(())
//! # }
//! # run().unwrap();
//! ```
//!
//! Ready-made models live in [`models`]; new ones are assembled with
//! [`Model::builder`](model::Model::builder). Population batches over
//! per-subject parameter overrides run in parallel through
//! [`simulate_population`](simulator::simulate_population).

pub mod data;
pub mod error;
pub mod expr;
pub mod logger;
pub mod model;
pub mod models;
pub mod simulator;
pub mod structs;

pub use error::{Error, Result};

pub mod prelude {
    pub use crate::data::{DoseEvent, EventKind, Regimen};
    pub use crate::error::{Error, Result};
    pub use crate::expr::{lit, var, Expr};
    pub use crate::logger::setup_log;
    pub use crate::model::{Compartment, Model, ModelBuilder, Role};
    pub use crate::simulator::{
        simulate_population, CancelToken, SimulationContext, SolverOptions, T, V,
    };
    pub use crate::structs::derived::{Derived, DerivedBlock};
    pub use crate::structs::parameters::{ParameterSet, Parameters};
    pub use crate::structs::trajectory::{RunStatus, Sample, Trajectory};
}
