//! Voriconazole model with permeability-limited absorption
//!
//! Extends the perfusion-limited physiology of
//! [`voriconazole`](crate::models::voriconazole) with an enterocyte
//! (gut wall) compartment between the lumen and the gut circulation.
//! The lumen-to-wall rate constant `kd` and the wall-to-circulation rate
//! constant `ka` both derive from an effective intestinal permeability
//! `Peff`, computed from the effective molecular weight and the membrane
//! affinity over the mucosal and basal surface areas of the small
//! intestine. Unabsorbed drug leaves the lumen by intestinal transit
//! (`kt = 1/ITT`), the gut wall carries its own intrinsic clearance
//! `CLintGut`, and lumen dissolution is capped at the solubility ceiling
//! `S_lumen`: above it the absorption-driving concentration clamps to the
//! saturation value. The captured output is the venous blood
//! concentration `Cvenous`.

#![allow(non_snake_case)]

use std::f64::consts::PI;

use crate::expr::{lit, var};
use crate::model::{Model, ModelBuilder, Role};
use crate::simulator::{T, V};
use crate::structs::derived::Derived;
use crate::structs::parameters::Parameters;
use crate::{fetch_derived, fetch_params, Result};

pub const GUTLUMEN: usize = 0;
pub const GUTWALL: usize = 1;
pub const GUT: usize = 2;
pub const ADIPOSE: usize = 3;
pub const BRAIN: usize = 4;
pub const HEART: usize = 5;
pub const BONE: usize = 6;
pub const KIDNEY: usize = 7;
pub const LIVER: usize = 8;
pub const LUNG: usize = 9;
pub const MUSCLE: usize = 10;
pub const SPLEEN: usize = 11;
pub const REST: usize = 12;
pub const ART: usize = 13;
pub const VEN: usize = 14;

fn diffeq(x: &V, p: &Parameters, d: &Derived, _t: T, dx: &mut V) {
    fetch_params!(
        p, Vad, Vbo, Vbr, VguWall, VguLumen, Vhe, Vki, Vli, Vlu, Vmu, Vsp, Qad, Qbo, Qbr, Qgu,
        Qhe, Qki, Qmu, Qsp, Qha, Qlu, Kpad, Kpbo, Kpbr, Kpgu, Kphe, Kpki, Kpli, Kplu, Kpmu, Kpsp,
        Kpre, BP, fup, CLrenal, S_lumen
    );
    fetch_derived!(d, Vve, Var, Vre, Qli, Qre, CLintHep, CLintGut, kd, ka, kt);

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
    let CgutLumen = x[GUTLUMEN] / VguLumen;
    let CgutWall = x[GUTWALL] / VguWall;
    let Cgut = x[GUT] / VguWall;

    let Cliverfree = Cliver * fup;
    let Ckidneyfree = Ckidney * fup;

    // solubility ceiling, evaluated fresh on every call
    let f = if CgutLumen > S_lumen { 0.0 } else { 1.0 };
    let dissolved = kd * VguLumen * (f * CgutLumen + (1.0 - f) * S_lumen);

    dx[GUTLUMEN] = -dissolved - kt * x[GUTLUMEN];
    dx[GUTWALL] = dissolved - ka * x[GUTWALL] - CLintGut * CgutWall;
    dx[GUT] = ka * x[GUTWALL] + Qgu * (Carterial - Cgut / (Kpgu / BP));
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

fn out(x: &V, _p: &Parameters, d: &Derived, y: &mut V) {
    fetch_derived!(d, Vve);

    y[0] = x[VEN] / Vve;
}

pub fn builder() -> ModelBuilder {
    Model::builder("voriPBPK_ext")
        // tissue volumes (L)
        .literal("Vad", 18.2)
        .literal("Vbo", 10.5)
        .literal("Vbr", 1.45)
        .literal("VguWall", 0.65)
        .literal("VguLumen", 0.35)
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
        .literal("fup", 0.42)
        .literal("CLrenal", 0.096)
        // in vitro hepatic clearance parameters
        .literal("fumic", 0.711)
        .literal("MPPGL", 30.3)
        .literal("VmaxH", 40.0)
        .literal("KmH", 9.3)
        // in vitro intestinal clearance parameters
        .literal("MPPGI", 0.0)
        .literal("VmaxG", 40.0)
        .literal("KmG", 9.3)
        // absorption model parameters
        .literal("MW", 349.317)
        .literal("logP", 2.56)
        .literal("S_lumen", 0.39 * 1000.0)
        .literal("L", 280.0)
        .literal("diam", 2.5)
        .literal("PF", 1.57)
        .literal("VF", 6.5)
        .literal("MF", 13.0)
        .literal("ITT", 3.32)
        .literal("A", 7440.0)
        .literal("B", 1e7)
        .literal("alpha", 0.6)
        .literal("beta", 4.395)
        .literal("fabs", 1.0)
        .literal("fdis", 1.0)
        .literal("fperm", 1.0)
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
        // microsome-scaled intrinsic clearances (L/h)
        .derived("scale_factor_H", var("MPPGL") * var("Vli") * 1000.0)
        .derived(
            "CLintHep",
            (var("VmaxH") / var("KmH")) * var("scale_factor_H") * 60.0 * 1e-6 / var("fumic"),
        )
        .derived("scale_factor_G", var("MPPGI") * var("VguWall") * 1000.0)
        .derived(
            "CLintGut",
            (var("VmaxG") / var("KmG")) * var("scale_factor_G") * 60.0 * 1e-6 / var("fumic"),
        )
        // permeability-limited absorption
        .derived(
            "SA_abs",
            PI * var("L") * var("diam") * var("PF") * var("VF") * var("MF") * 1e-4,
        )
        .derived(
            "SA_basal",
            PI * var("L") * var("diam") * var("PF") * var("VF") * 1e-4,
        )
        .derived("MA", lit(10.0).pow(var("logP")))
        .derived("MW_eff", var("MW") - 3.0 * 17.0)
        .derived(
            "Peff",
            var("fperm")
                * var("A")
                * (var("MW_eff").pow(-var("alpha") - var("beta")) * var("MA")
                    / (var("MW_eff").pow(-var("alpha"))
                        + var("B") * var("MW_eff").pow(-var("beta")) * var("MA"))
                    * 1e-2
                    * 3600.0),
        )
        .derived("kd", var("fdis") * var("Peff") * var("SA_abs") * 1000.0 / var("VguLumen"))
        .derived("ka", var("fabs") * var("Peff") * var("SA_basal") * 1000.0 / var("VguWall"))
        .derived("kt", 1.0 / var("ITT"))
        .positive_all(&[
            "Vad", "Vbo", "Vbr", "VguWall", "VguLumen", "Vhe", "Vki", "Vli", "Vlu", "Vmu", "Vsp",
            "Vbl", "CO", "Qad", "Qbo", "Qbr", "Qgu", "Qhe", "Qki", "Qmu", "Qsp", "Qha", "Qlu",
            "Vve", "Var", "Vre", "Qli", "Qre", "Kpad", "Kpbo", "Kpbr", "Kpgu", "Kphe", "Kpki",
            "Kpli", "Kplu", "Kpmu", "Kpsp", "Kpre", "BP", "fumic", "KmH", "KmG", "S_lumen", "ITT",
            "MW_eff", "Peff",
        ])
        .compartment("GUTLUMEN", Role::Lumen)
        .compartment("GUTWALL", Role::Tissue)
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
        .capture("Cvenous")
        .output(out)
}

pub fn model() -> Result<Model> {
    builder().build()
}
