//! Whole-body voriconazole model for a typical adult male
//!
//! Fourteen compartments: a gut lumen depot, eleven perfused tissues, and
//! arterial and venous blood. Absorption from the lumen is first order;
//! tissue exchange is blood-flow limited with Poulin-Theil partition
//! coefficients; elimination is microsome-scaled intrinsic hepatic
//! clearance on free liver concentration plus renal clearance on free
//! kidney concentration. The captured output is the venous plasma
//! concentration `CP = Cvenous / BP`.
//!
//! Tissue volumes and flows follow the standard adult male physiology
//! (cardiac output 6.5 L/min); flows are declared as fractions of the
//! cardiac output parameter `CO`, so overriding `CO` rescales the whole
//! circulation.

#![allow(non_snake_case)]

use crate::expr::var;
use crate::model::{Model, ModelBuilder, Role};
use crate::simulator::{T, V};
use crate::structs::derived::Derived;
use crate::structs::parameters::Parameters;
use crate::{fetch_derived, fetch_params, Result};

pub const GUTLUMEN: usize = 0;
pub const GUT: usize = 1;
pub const ADIPOSE: usize = 2;
pub const BRAIN: usize = 3;
pub const HEART: usize = 4;
pub const BONE: usize = 5;
pub const KIDNEY: usize = 6;
pub const LIVER: usize = 7;
pub const LUNG: usize = 8;
pub const MUSCLE: usize = 9;
pub const SPLEEN: usize = 10;
pub const REST: usize = 11;
pub const ART: usize = 12;
pub const VEN: usize = 13;

fn diffeq(x: &V, p: &Parameters, d: &Derived, _t: T, dx: &mut V) {
    fetch_params!(
        p, Vad, Vbo, Vbr, VguWall, Vhe, Vki, Vli, Vlu, Vmu, Vsp, Qad, Qbo, Qbr, Qgu, Qhe, Qki,
        Qmu, Qsp, Qha, Qlu, Kpad, Kpbo, Kpbr, Kpgu, Kphe, Kpki, Kpli, Kplu, Kpmu, Kpsp, Kpre, BP,
        ka, fup, CLrenal
    );
    fetch_derived!(d, Vve, Var, Vre, Qli, Qre, CLintHep);

    // tissue concentrations (mg/L)
    let Cadipose = x[ADIPOSE] / Vad;
    let Cbone = x[BONE] / Vbo;
    let Cbrain = x[BRAIN] / Vbr;
    let Cheart = x[HEART] / Vhe;
    let Ckidney = x[KIDNEY] / Vki;
    let Cliver = x[LIVER] / Vli;
    let Clung = x[LUNG] / Vlu;
    let Cmuscle = x[MUSCLE] / Vmu;
    let Cspleen = x[SPLEEN] / Vsp;
    let Crest = x[REST] / Vre;
    let Carterial = x[ART] / Var;
    let Cvenous = x[VEN] / Vve;
    let Cgut = x[GUT] / VguWall;

    let Cliverfree = Cliver * fup;
    let Ckidneyfree = Ckidney * fup;

    dx[GUTLUMEN] = -ka * x[GUTLUMEN];
    dx[GUT] = ka * x[GUTLUMEN] + Qgu * (Carterial - Cgut / (Kpgu / BP));
    dx[ADIPOSE] = Qad * (Carterial - Cadipose / (Kpad / BP));
    dx[BRAIN] = Qbr * (Carterial - Cbrain / (Kpbr / BP));
    dx[HEART] = Qhe * (Carterial - Cheart / (Kphe / BP));
    dx[KIDNEY] = Qki * (Carterial - Ckidney / (Kpki / BP)) - CLrenal * (Ckidneyfree / (Kpki / BP));
    dx[LIVER] = Qgu * (Cgut / (Kpgu / BP)) + Qsp * (Cspleen / (Kpsp / BP)) + Qha * Carterial
        - Qli * (Cliver / (Kpli / BP))
        - CLintHep * (Cliverfree / (Kpli / BP));
    dx[LUNG] = Qlu * (Cvenous - Clung / (Kplu / BP));
    dx[MUSCLE] = Qmu * (Carterial - Cmuscle / (Kpmu / BP));
    dx[SPLEEN] = Qsp * (Carterial - Cspleen / (Kpsp / BP));
    dx[BONE] = Qbo * (Carterial - Cbone / (Kpbo / BP));
    dx[REST] = Qre * (Carterial - Crest / (Kpre / BP));
    dx[VEN] = Qad * (Cadipose / (Kpad / BP))
        + Qbr * (Cbrain / (Kpbr / BP))
        + Qhe * (Cheart / (Kphe / BP))
        + Qki * (Ckidney / (Kpki / BP))
        + Qli * (Cliver / (Kpli / BP))
        + Qmu * (Cmuscle / (Kpmu / BP))
        + Qbo * (Cbone / (Kpbo / BP))
        + Qre * (Crest / (Kpre / BP))
        - Qlu * Cvenous;
    dx[ART] = Qlu * (Clung / (Kplu / BP) - Carterial);
}

fn out(x: &V, p: &Parameters, d: &Derived, y: &mut V) {
    fetch_params!(p, BP);
    fetch_derived!(d, Vve);

    y[0] = x[VEN] / Vve / BP;
}

pub fn builder() -> ModelBuilder {
    Model::builder("voriPBPK")
        // tissue volumes (L)
        .literal("Vad", 18.2)
        .literal("Vbo", 10.5)
        .literal("Vbr", 1.45)
        .literal("VguWall", 0.65)
        .literal("Vhe", 0.33)
        .literal("Vki", 0.31)
        .literal("Vli", 1.8)
        .literal("Vlu", 0.5)
        .literal("Vmu", 29.0)
        .literal("Vsp", 0.15)
        .literal("Vbl", 5.6)
        // blood flows (L/h) as fractions of cardiac output
        .literal("CO", 6.5 * 60.0)
        .expr("Qad", 0.05 * var("CO"))
        .expr("Qbo", 0.05 * var("CO"))
        .expr("Qbr", 0.12 * var("CO"))
        .expr("Qgu", 0.15 * var("CO"))
        .expr("Qhe", 0.04 * var("CO"))
        .expr("Qki", 0.19 * var("CO"))
        .expr("Qmu", 0.17 * var("CO"))
        .expr("Qsp", 0.03 * var("CO"))
        .expr("Qha", 0.065 * var("CO"))
        .expr("Qlu", var("CO"))
        // Poulin-Theil tissue:plasma partition coefficients
        .literal("Kpad", 9.89)
        .literal("Kpbo", 7.91)
        .literal("Kpbr", 7.35)
        .literal("Kpgu", 5.82)
        .literal("Kphe", 1.95)
        .literal("Kpki", 2.9)
        .literal("Kpli", 4.66)
        .literal("Kplu", 0.83)
        .literal("Kpmu", 2.94)
        .literal("Kpsp", 2.96)
        .literal("Kpre", 4.0)
        .literal("BP", 1.0)
        // other parameters
        .literal("WEIGHT", 73.0)
        .literal("ka", 0.849)
        .literal("fup", 0.42)
        .literal("CLrenal", 0.096)
        // in vitro hepatic clearance parameters
        .literal("fumic", 0.711)
        .literal("MPPGL", 30.3)
        .literal("VmaxH", 40.0)
        .literal("KmH", 9.3)
        // blood pool split and rest-of-body volume
        .derived("Vve", 0.705 * var("Vbl"))
        .derived("Var", 0.295 * var("Vbl"))
        .derived(
            "Vre",
            var("WEIGHT")
                - (var("Vli")
                    + var("Vki")
                    + var("Vsp")
                    + var("Vhe")
                    + var("Vlu")
                    + var("Vbo")
                    + var("Vbr")
                    + var("Vmu")
                    + var("Vad")
                    + var("VguWall")
                    + var("Vbl")),
        )
        // flow balance
        .derived("Qli", var("Qgu") + var("Qsp") + var("Qha"))
        .derived(
            "Qtot",
            var("Qli") + var("Qki") + var("Qbo") + var("Qhe") + var("Qmu") + var("Qad")
                + var("Qbr"),
        )
        .derived("Qre", var("Qlu") - var("Qtot"))
        // microsome-scaled intrinsic hepatic clearance (L/h)
        .derived("scale_factor_H", var("MPPGL") * var("Vli") * 1000.0)
        .derived(
            "CLintHep",
            (var("VmaxH") / var("KmH")) * var("scale_factor_H") * 60.0 * 1e-6 / var("fumic"),
        )
        .positive_all(&[
            "Vad", "Vbo", "Vbr", "VguWall", "Vhe", "Vki", "Vli", "Vlu", "Vmu", "Vsp", "Vbl", "CO",
            "Qad", "Qbo", "Qbr", "Qgu", "Qhe", "Qki", "Qmu", "Qsp", "Qha", "Qlu", "Vve", "Var",
            "Vre", "Qli", "Qre", "Kpad", "Kpbo", "Kpbr", "Kpgu", "Kphe", "Kpki", "Kpli", "Kplu",
            "Kpmu", "Kpsp", "Kpre", "BP", "fumic", "KmH",
        ])
        .compartment("GUTLUMEN", Role::Lumen)
        .compartment("GUT", Role::Tissue)
        .compartment("ADIPOSE", Role::Tissue)
        .compartment("BRAIN", Role::Tissue)
        .compartment("HEART", Role::Tissue)
        .compartment("BONE", Role::Tissue)
        .compartment("KIDNEY", Role::Tissue)
        .compartment("LIVER", Role::Tissue)
        .compartment("LUNG", Role::Tissue)
        .compartment("MUSCLE", Role::Tissue)
        .compartment("SPLEEN", Role::Tissue)
        .compartment("REST", Role::Tissue)
        .compartment("ART", Role::Arterial)
        .compartment("VEN", Role::Central)
        .diffeq(diffeq)
        .capture("CP")
        .output(out)
}

pub fn model() -> Result<Model> {
    builder().build()
}
