//! Arithmetic expressions for parameter and derived-quantity definitions
//!
//! A definition block is declarative data: each named value is either a
//! literal or an [`Expr`] over other named values. Expressions are built in
//! Rust with [`lit`], [`var`] and the usual operators, so a model definition
//! reads like the formula it encodes:
//!
//! ```
//! use pbpkcore::expr::var;
//!
//! let qli = var("Qgu") + var("Qsp") + var("Qha");
//! assert_eq!(qli.dependencies(), vec!["Qgu", "Qsp", "Qha"]);
//! ```
//!
//! Evaluation is a plain tree walk; every expression is evaluated exactly
//! once per resolution, so no compilation step is needed.

use std::collections::HashMap;
use std::fmt;
use std::ops;

/// A scalar arithmetic expression over named values
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Lit(f64),
    Var(String),
    Neg(Box<Expr>),
    Add(Box<Expr>, Box<Expr>),
    Sub(Box<Expr>, Box<Expr>),
    Mul(Box<Expr>, Box<Expr>),
    Div(Box<Expr>, Box<Expr>),
    Pow(Box<Expr>, Box<Expr>),
}

/// A literal value
pub fn lit(value: f64) -> Expr {
    Expr::Lit(value)
}

/// A reference to another named value
pub fn var(name: impl Into<String>) -> Expr {
    Expr::Var(name.into())
}

impl Expr {
    /// Raise to a power (`f64::powf`)
    pub fn pow(self, exponent: impl Into<Expr>) -> Expr {
        Expr::Pow(Box::new(self), Box::new(exponent.into()))
    }

    /// Names referenced by this expression, in first-occurrence order
    pub fn dependencies(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_deps(&mut names);
        names
    }

    fn collect_deps<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Lit(_) => {}
            Expr::Var(name) => {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
            Expr::Neg(inner) => inner.collect_deps(names),
            Expr::Add(a, b)
            | Expr::Sub(a, b)
            | Expr::Mul(a, b)
            | Expr::Div(a, b)
            | Expr::Pow(a, b) => {
                a.collect_deps(names);
                b.collect_deps(names);
            }
        }
    }

    /// Evaluate against a table of resolved values
    ///
    /// The resolver checks every referenced name before evaluation, so a
    /// missing name here is a bug in the resolver, not user input.
    pub(crate) fn eval(&self, env: &HashMap<String, f64>) -> f64 {
        match self {
            Expr::Lit(value) => *value,
            Expr::Var(name) => env[name.as_str()],
            Expr::Neg(inner) => -inner.eval(env),
            Expr::Add(a, b) => a.eval(env) + b.eval(env),
            Expr::Sub(a, b) => a.eval(env) - b.eval(env),
            Expr::Mul(a, b) => a.eval(env) * b.eval(env),
            Expr::Div(a, b) => a.eval(env) / b.eval(env),
            Expr::Pow(a, b) => a.eval(env).powf(b.eval(env)),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Lit(value)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $variant:ident) => {
        impl<R: Into<Expr>> ops::$trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                Expr::$variant(Box::new(self), Box::new(rhs.into()))
            }
        }

        impl ops::$trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$variant(Box::new(Expr::Lit(self)), Box::new(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, Add);
impl_binary_op!(Sub, sub, Sub);
impl_binary_op!(Mul, mul, Mul);
impl_binary_op!(Div, div, Div);

impl ops::Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Neg(Box::new(self))
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Lit(value) => write!(f, "{}", value),
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Neg(inner) => write!(f, "-({})", inner),
            Expr::Add(a, b) => write!(f, "({} + {})", a, b),
            Expr::Sub(a, b) => write!(f, "({} - {})", a, b),
            Expr::Mul(a, b) => write!(f, "({} * {})", a, b),
            Expr::Div(a, b) => write!(f, "({} / {})", a, b),
            Expr::Pow(a, b) => write!(f, "({} ^ {})", a, b),
        }
    }
}
