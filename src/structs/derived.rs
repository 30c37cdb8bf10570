//! Derived quantities computed once per simulation context
//!
//! A [`DerivedBlock`] is the declarative analogue of a model's algebraic
//! preamble: named expressions over the resolved parameters and over earlier
//! derived quantities (total hepatic flow, intrinsic clearances, absorption
//! rate constants from permeability and surface area). It is resolved through
//! the same dependency-graph machinery as the parameters, once, after
//! parameter resolution and before the first derivative evaluation. Changing
//! any parameter means building a new context, which recomputes the block in
//! full.

use std::fmt;

use crate::error::Result;
use crate::expr::Expr;
use crate::structs::parameters::{resolve_block, Parameters};

/// Raw, ordered derived-quantity definitions
#[derive(Debug, Clone, Default)]
pub struct DerivedBlock {
    defs: Vec<(String, Expr)>,
}

impl DerivedBlock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a derived quantity defined over parameters and earlier quantities
    pub fn define(mut self, name: impl Into<String>, expr: impl Into<Expr>) -> Self {
        self.defs.push((name.into(), expr.into()));
        self
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.defs.iter().map(|(name, _)| name.as_str())
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.defs.iter().any(|(n, _)| n == name)
    }

    /// Evaluate every quantity against a resolved parameter table
    pub fn resolve(&self, params: &Parameters) -> Result<Derived> {
        let env = resolve_block(&self.defs, &params.as_env(), "derived quantity")?;
        let names: Vec<String> = self.defs.iter().map(|(name, _)| name.clone()).collect();
        let values: Vec<f64> = names.iter().map(|name| env[name.as_str()]).collect();
        Ok(Derived {
            inner: Parameters::from_parts(names, values),
        })
    }
}

/// Immutable table of resolved derived quantities
#[derive(Debug, Clone, PartialEq)]
pub struct Derived {
    inner: Parameters,
}

impl Derived {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.inner.get(name)
    }

    pub fn names(&self) -> &[String] {
        self.inner.names()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.inner.iter()
    }
}

impl std::ops::Index<&str> for Derived {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        match self.inner.get(name) {
            Some(_) => &self.inner[name],
            None => panic!("unknown derived quantity `{}`", name),
        }
    }
}

impl fmt::Display for Derived {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::expr::var;
    use crate::structs::parameters::ParameterSet;

    fn flows() -> Parameters {
        ParameterSet::new()
            .literal("Qgu", 58.5)
            .literal("Qsp", 11.7)
            .literal("Qha", 25.35)
            .literal("Vli", 1.8)
            .literal("MPPGL", 30.3)
            .resolve()
            .unwrap()
    }

    #[test]
    fn test_chained_quantities_resolve_through_the_graph() {
        let params = flows();
        // CLint references scale_factor, declared after it
        let derived = DerivedBlock::new()
            .define("CLint", var("scale_factor") * 2.0)
            .define("scale_factor", var("MPPGL") * var("Vli") * 1000.0)
            .define("Qli", var("Qgu") + var("Qsp") + var("Qha"))
            .resolve(&params)
            .unwrap();

        assert!((derived["Qli"] - 95.55).abs() < 1e-12);
        assert_eq!(derived["scale_factor"], 54540.0);
        assert_eq!(derived["CLint"], 109080.0);
        assert_eq!(derived.names(), &["CLint", "scale_factor", "Qli"]);
    }

    #[test]
    fn test_resolving_twice_yields_identical_values() {
        let params = flows();
        let block = DerivedBlock::new()
            .define("Qli", var("Qgu") + var("Qsp") + var("Qha"))
            .define("half", var("Qli") / 2.0);

        assert_eq!(block.resolve(&params), block.resolve(&params));
    }

    #[test]
    fn test_shadowing_a_parameter_is_rejected() {
        let err = DerivedBlock::new()
            .define("Qgu", var("Qsp") * 2.0)
            .resolve(&flows())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidModel { .. }));
    }

    #[test]
    fn test_unknown_parameter_is_rejected() {
        let err = DerivedBlock::new()
            .define("Qre", var("Qlu") - var("Qgu"))
            .resolve(&flows())
            .unwrap_err();
        assert_eq!(
            err,
            Error::UnknownReference {
                name: "Qlu".to_string(),
                referenced_by: "Qre".to_string(),
            }
        );
    }
}
