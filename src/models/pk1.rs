//! One-compartment model with first-order absorption
//!
//! Dosing goes into a depot without physiological volume; absorption into
//! the central compartment is first order with rate constant `KA`, and
//! elimination is linear clearance `CL` out of the central volume `VC`.
//! The captured output is the central concentration `CP = CENT / VC`.

#![allow(non_snake_case)]

use crate::model::{Model, ModelBuilder, Role};
use crate::simulator::{T, V};
use crate::structs::derived::Derived;
use crate::structs::parameters::Parameters;
use crate::{fetch_params, Result};

pub const GUT: usize = 0;
pub const CENT: usize = 1;

fn diffeq(x: &V, p: &Parameters, _d: &Derived, _t: T, dx: &mut V) {
    fetch_params!(p, CL, VC, KA);

    dx[GUT] = -KA * x[GUT];
    dx[CENT] = KA * x[GUT] - (CL / VC) * x[CENT];
}

fn out(x: &V, p: &Parameters, _d: &Derived, y: &mut V) {
    fetch_params!(p, VC);

    y[0] = x[CENT] / VC;
}

pub fn builder() -> ModelBuilder {
    Model::builder("pk1")
        .literal("CL", 1.0)
        .literal("VC", 20.0)
        .literal("KA", 1.0)
        .positive("VC")
        .compartment("GUT", Role::Depot)
        .compartment("CENT", Role::Central)
        .diffeq(diffeq)
        .capture("CP")
        .output(out)
}

pub fn model() -> Result<Model> {
    builder().build()
}
