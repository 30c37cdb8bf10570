//! Parameter definitions and their resolution
//!
//! A [`ParameterSet`] holds the raw, insertion-ordered definitions of a
//! model: literals or expressions over other parameters. [`resolve`]
//! topologically sorts the dependency graph and evaluates each definition
//! exactly once, yielding an immutable [`Parameters`] table. Resolution is
//! deterministic and fails on cycles and unknown references.

use std::collections::HashMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::expr::Expr;

/// Raw, ordered parameter definitions
#[derive(Debug, Clone, Default)]
pub struct ParameterSet {
    defs: Vec<(String, Expr)>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter with a literal value
    pub fn literal(mut self, name: impl Into<String>, value: f64) -> Self {
        self.defs.push((name.into(), Expr::Lit(value)));
        self
    }

    /// Add a parameter defined by an expression over other parameters
    pub fn expr(mut self, name: impl Into<String>, expr: impl Into<Expr>) -> Self {
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

    /// Resolve all definitions into an immutable table
    pub fn resolve(&self) -> Result<Parameters> {
        self.resolve_with(&[])
    }

    /// Resolve with some parameters replaced by literal overrides
    ///
    /// Overrides substitute the named definition before resolution, so every
    /// dependent parameter and derived quantity is recomputed in full.
    pub fn resolve_with(&self, overrides: &[(&str, f64)]) -> Result<Parameters> {
        let mut defs = self.defs.clone();
        for (name, value) in overrides {
            let def = defs
                .iter_mut()
                .find(|(n, _)| n == name)
                .ok_or_else(|| Error::UnknownReference {
                    name: name.to_string(),
                    referenced_by: "parameter overrides".to_string(),
                })?;
            def.1 = Expr::Lit(*value);
        }

        let env = resolve_block(&defs, &HashMap::new(), "parameter")?;
        Ok(Parameters::from_defs(&defs, &env))
    }
}

/// Immutable table of resolved parameter values
#[derive(Debug, Clone, PartialEq)]
pub struct Parameters {
    names: Vec<String>,
    values: Vec<f64>,
    index: HashMap<String, usize>,
}

impl Parameters {
    fn from_defs(defs: &[(String, Expr)], env: &HashMap<String, f64>) -> Self {
        let names: Vec<String> = defs.iter().map(|(name, _)| name.clone()).collect();
        let values = names.iter().map(|name| env[name.as_str()]).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Parameters {
            names,
            values,
            index,
        }
    }

    pub(crate) fn from_parts(names: Vec<String>, values: Vec<f64>) -> Self {
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Parameters {
            names,
            values,
            index,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.index.get(name).map(|&i| self.values[i])
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(|n| n.as_str())
            .zip(self.values.iter().copied())
    }

    pub(crate) fn as_env(&self) -> HashMap<String, f64> {
        self.iter()
            .map(|(name, value)| (name.to_string(), value))
            .collect()
    }
}

impl std::ops::Index<&str> for Parameters {
    type Output = f64;

    fn index(&self, name: &str) -> &f64 {
        match self.index.get(name) {
            Some(&i) => &self.values[i],
            None => panic!("unknown parameter `{}`", name),
        }
    }
}

impl fmt::Display for Parameters {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (name, value) in self.iter() {
            writeln!(f, "{} = {}", name, value)?;
        }
        Ok(())
    }
}

/// Topologically sort and evaluate a definition block
///
/// `base` holds names resolved outside the block (empty for parameters, the
/// parameter table for derived quantities). Returns the environment with
/// every block name evaluated. Fails with [`Error::InvalidModel`] on
/// duplicate names, [`Error::UnknownReference`] on references to names in
/// neither the block nor the base, and [`Error::CyclicDefinition`] when a
/// dependency cycle prevents evaluation.
pub(crate) fn resolve_block(
    defs: &[(String, Expr)],
    base: &HashMap<String, f64>,
    what: &str,
) -> Result<HashMap<String, f64>> {
    let mut position: HashMap<&str, usize> = HashMap::with_capacity(defs.len());
    for (i, (name, _)) in defs.iter().enumerate() {
        if position.insert(name.as_str(), i).is_some() {
            return Err(Error::invalid_model(format!(
                "duplicate {} `{}`",
                what, name
            )));
        }
        if base.contains_key(name.as_str()) {
            return Err(Error::invalid_model(format!(
                "{} `{}` shadows an already defined name",
                what, name
            )));
        }
    }

    // Edges run from a definition to the definitions that reference it.
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); defs.len()];
    let mut indegree: Vec<usize> = vec![0; defs.len()];
    for (i, (name, expr)) in defs.iter().enumerate() {
        for dep in expr.dependencies() {
            if let Some(&j) = position.get(dep) {
                dependents[j].push(i);
                indegree[i] += 1;
            } else if !base.contains_key(dep) {
                return Err(Error::UnknownReference {
                    name: dep.to_string(),
                    referenced_by: name.clone(),
                });
            }
        }
    }

    let mut env = base.clone();
    let mut ready: Vec<usize> = (0..defs.len()).filter(|&i| indegree[i] == 0).collect();
    let mut resolved = 0;
    while let Some(i) = ready.pop() {
        let (name, expr) = &defs[i];
        let value = expr.eval(&env);
        env.insert(name.clone(), value);
        resolved += 1;
        for &dependent in &dependents[i] {
            indegree[dependent] -= 1;
            if indegree[dependent] == 0 {
                ready.push(dependent);
            }
        }
    }

    if resolved < defs.len() {
        let names = defs
            .iter()
            .enumerate()
            .filter(|(i, _)| indegree[*i] > 0)
            .map(|(_, (name, _))| name.clone())
            .collect();
        return Err(Error::CyclicDefinition { names });
    }

    Ok(env)
}
