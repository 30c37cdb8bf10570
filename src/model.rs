//! Model definition
//!
//! A [`Model`] bundles everything the engine needs to simulate one system:
//! the parameter set, the derived-quantity block, the ordered compartment
//! list, the differential equation, and the capture mapping. Models are
//! built through [`ModelBuilder`] and are inert until
//! [`Model::context`]/[`Model::context_with`] resolves the parameter graph
//! into a [`SimulationContext`](crate::simulator::SimulationContext).

use std::fmt;

use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::simulator::{DiffEq, Out, SimulationContext, V};
use crate::structs::derived::{Derived, DerivedBlock};
use crate::structs::parameters::{ParameterSet, Parameters};

/// Semantic role of a compartment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// Systemic circulation, the usual sampling site
    Central,
    /// Arterial blood
    Arterial,
    /// Perfused organ or tissue
    Tissue,
    /// Intestinal lumen contents
    Lumen,
    /// Absorption site without physiological volume
    Depot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Role::Central => write!(f, "central"),
            Role::Arterial => write!(f, "arterial"),
            Role::Tissue => write!(f, "tissue"),
            Role::Lumen => write!(f, "lumen"),
            Role::Depot => write!(f, "depot"),
        }
    }
}

/// A named slot of the state vector
#[derive(Debug, Clone, PartialEq)]
pub struct Compartment {
    name: String,
    index: usize,
    role: Role,
}

impl Compartment {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn role(&self) -> Role {
        self.role
    }
}

/// A complete compartmental model, ready to resolve into contexts
#[derive(Debug, Clone)]
pub struct Model {
    name: String,
    params: ParameterSet,
    derived: DerivedBlock,
    compartments: Vec<Compartment>,
    positive: Vec<String>,
    diffeq: DiffEq,
    out: Out,
    captures: Vec<String>,
}

impl Model {
    pub fn builder(name: impl Into<String>) -> ModelBuilder {
        ModelBuilder {
            name: name.into(),
            params: ParameterSet::new(),
            derived: DerivedBlock::new(),
            compartments: Vec::new(),
            positive: Vec::new(),
            diffeq: None,
            out: None,
            captures: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Length of the state vector
    pub fn nstates(&self) -> usize {
        self.compartments.len()
    }

    pub fn noutputs(&self) -> usize {
        self.captures.len()
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn compartment_index(&self, name: &str) -> Option<usize> {
        self.compartments
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.index)
    }

    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    pub fn params(&self) -> &ParameterSet {
        &self.params
    }

    pub(crate) fn diffeq(&self) -> DiffEq {
        self.diffeq
    }

    pub(crate) fn out(&self) -> Out {
        self.out
    }

    /// Resolve the model with its declared parameter values
    pub fn context(&self) -> Result<SimulationContext> {
        self.context_with(&[])
    }

    /// Resolve the model with literal replacements for named parameters
    ///
    /// Overridden parameters lose their defining expression; every dependent
    /// parameter and derived quantity is recomputed from the replacements.
    /// Fails with the graph errors of resolution, or with
    /// [`Error::InvalidModel`] when a resolved value violates the model's
    /// positivity constraints or is not finite.
    pub fn context_with(&self, overrides: &[(&str, f64)]) -> Result<SimulationContext> {
        let params = self.params.resolve_with(overrides)?;
        let derived = self.derived.resolve(&params)?;

        for (name, value) in params.iter() {
            if !value.is_finite() {
                return Err(Error::invalid_model(format!(
                    "parameter `{}` resolved to the non-finite value {}",
                    name, value
                )));
            }
        }
        for (name, value) in derived.iter() {
            if !value.is_finite() {
                return Err(Error::invalid_model(format!(
                    "derived quantity `{}` resolved to the non-finite value {}",
                    name, value
                )));
            }
        }
        for name in &self.positive {
            let value = params.get(name).or_else(|| derived.get(name));
            if let Some(value) = value {
                if !(value > 0.0) {
                    return Err(Error::invalid_model(format!(
                        "`{}` must be strictly positive, got {}",
                        name, value
                    )));
                }
            }
        }

        Ok(SimulationContext::new(self.clone(), params, derived))
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Model `{}` with {} compartments, {} parameters and {} outputs",
            self.name,
            self.compartments.len(),
            self.params.len(),
            self.captures.len()
        )
    }
}

fn no_output(_x: &V, _p: &Parameters, _d: &Derived, _y: &mut V) {}

/// Builder for [`Model`]
///
/// Compartments are indexed in declaration order. `build` checks structure
/// only; the parameter graph is resolved when a context is created.
pub struct ModelBuilder {
    name: String,
    params: ParameterSet,
    derived: DerivedBlock,
    compartments: Vec<Compartment>,
    positive: Vec<String>,
    diffeq: Option<DiffEq>,
    out: Option<Out>,
    captures: Vec<String>,
}

impl ModelBuilder {
    /// Parameter with a literal value
    pub fn literal(mut self, name: impl Into<String>, value: f64) -> Self {
        self.params = self.params.literal(name, value);
        self
    }

    /// Parameter defined by an expression over other parameters
    pub fn expr(mut self, name: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.params = self.params.expr(name, expr);
        self
    }

    /// Derived quantity computed once per context from the parameters
    pub fn derived(mut self, name: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.derived = self.derived.define(name, expr);
        self
    }

    /// Append a compartment; its index is the declaration position
    pub fn compartment(mut self, name: impl Into<String>, role: Role) -> Self {
        let index = self.compartments.len();
        self.compartments.push(Compartment {
            name: name.into(),
            index,
            role,
        });
        self
    }

    /// Require a parameter or derived quantity to resolve strictly positive
    pub fn positive(mut self, name: impl Into<String>) -> Self {
        self.positive.push(name.into());
        self
    }

    /// Require several names to resolve strictly positive
    pub fn positive_all(mut self, names: &[&str]) -> Self {
        for name in names {
            self.positive.push((*name).to_string());
        }
        self
    }

    pub fn diffeq(mut self, diffeq: DiffEq) -> Self {
        self.diffeq = Some(diffeq);
        self
    }

    /// Declare an output label; the output function fills them in order
    pub fn capture(mut self, name: impl Into<String>) -> Self {
        self.captures.push(name.into());
        self
    }

    pub fn output(mut self, out: Out) -> Self {
        self.out = Some(out);
        self
    }

    pub fn build(self) -> Result<Model> {
        if self.compartments.is_empty() {
            return Err(Error::invalid_model("model has no compartments"));
        }
        for (i, c) in self.compartments.iter().enumerate() {
            if self.compartments[..i].iter().any(|o| o.name == c.name) {
                return Err(Error::invalid_model(format!(
                    "duplicate compartment `{}`",
                    c.name
                )));
            }
        }
        for (i, name) in self.captures.iter().enumerate() {
            if self.captures[..i].contains(name) {
                return Err(Error::invalid_model(format!("duplicate capture `{}`", name)));
            }
        }
        let diffeq = self
            .diffeq
            .ok_or_else(|| Error::invalid_model("model has no differential equation"))?;
        let out = match self.out {
            Some(out) => out,
            None if self.captures.is_empty() => no_output as Out,
            None => {
                return Err(Error::invalid_model(
                    "captures declared without an output function",
                ))
            }
        };
        for name in &self.positive {
            if !self.params.contains(name) && !self.derived.contains(name) {
                return Err(Error::invalid_model(format!(
                    "positivity constraint on unknown name `{}`",
                    name
                )));
            }
        }

        Ok(Model {
            name: self.name,
            params: self.params,
            derived: self.derived,
            compartments: self.compartments,
            positive: self.positive,
            diffeq,
            out,
            captures: self.captures,
        })
    }
}
