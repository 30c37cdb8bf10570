//! Simulation output
//!
//! A [`Trajectory`] is the append-only product of one run: a sample per
//! requested output time (exactly the requested grid, ascending, no
//! duplicates) holding the full state vector and the captured observables,
//! plus a [`RunStatus`] describing how the run ended. Run-time failures and
//! cancellation annotate the partial trajectory instead of discarding it.

use serde::Serialize;

use crate::error::Error;

/// One output point: time, compartment masses, captured observables
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub time: f64,
    pub state: Vec<f64>,
    pub outputs: Vec<f64>,
}

/// How a simulation run ended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum RunStatus {
    /// Every requested output time was produced
    Completed,
    /// The cancellation token was observed between steps
    Cancelled,
    /// A run-time numerical failure stopped the run
    Failed(Error),
}

impl RunStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, RunStatus::Completed)
    }
}

/// Ordered samples from a single simulation run
#[derive(Debug, Clone, Serialize)]
pub struct Trajectory {
    outputs: Vec<String>,
    samples: Vec<Sample>,
    status: RunStatus,
}

impl Trajectory {
    pub(crate) fn new(outputs: Vec<String>) -> Self {
        Trajectory {
            outputs,
            samples: Vec::new(),
            status: RunStatus::Completed,
        }
    }

    pub(crate) fn push(&mut self, time: f64, state: Vec<f64>, outputs: Vec<f64>) {
        self.samples.push(Sample {
            time,
            state,
            outputs,
        });
    }

    pub(crate) fn finish(&mut self, status: RunStatus) {
        self.status = status;
    }

    /// Names of the captured observables, in column order
    pub fn output_names(&self) -> &[String] {
        &self.outputs
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }

    /// Column of one captured observable across all samples
    pub fn output(&self, name: &str) -> Option<Vec<f64>> {
        let column = self.outputs.iter().position(|n| n == name)?;
        Some(self.samples.iter().map(|s| s.outputs[column]).collect())
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_column_lookup() {
        let mut trajectory = Trajectory::new(vec!["CP".to_string()]);
        trajectory.push(0.0, vec![100.0, 0.0], vec![0.0]);
        trajectory.push(1.0, vec![36.8, 60.0], vec![3.0]);

        assert_eq!(trajectory.len(), 2);
        assert_eq!(trajectory.times(), vec![0.0, 1.0]);
        assert_eq!(trajectory.output("CP"), Some(vec![0.0, 3.0]));
        assert_eq!(trajectory.output("missing"), None);
        assert!(trajectory.status().is_completed());
    }

    #[test]
    fn test_failed_status_keeps_partial_samples() {
        let mut trajectory = Trajectory::new(Vec::new());
        trajectory.push(0.0, vec![0.0], Vec::new());
        trajectory.finish(RunStatus::Failed(Error::NumericalInstability {
            time: 0.5,
            detail: "step size underflow".to_string(),
        }));

        assert_eq!(trajectory.len(), 1);
        assert!(!trajectory.status().is_completed());
    }
}
