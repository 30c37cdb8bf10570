use anyhow::Result;
use pbpkcore::models::{voriconazole as vori, voriconazole_ext as ext};
use pbpkcore::prelude::*;

fn tight() -> SolverOptions {
    SolverOptions {
        rtol: 1e-8,
        atol: 1e-10,
        ..Default::default()
    }
}

#[test]
fn test_mass_is_conserved_without_elimination() -> Result<()> {
    // zero both clearance routes, leaving only inter-compartment transport
    let subject = vori::model()?.context_with(&[("VmaxH", 0.0), ("CLrenal", 0.0)])?;

    let dose = 200.0;
    let regimen = Regimen::new().bolus(0.0, dose, vori::VEN);
    let times: Vec<f64> = (0..=48).map(f64::from).collect();

    let trajectory = subject.simulate(&regimen, &times, &tight())?;
    assert!(trajectory.status().is_completed());

    for sample in trajectory.samples() {
        let total: f64 = sample.state.iter().sum();
        assert!(
            ((total - dose) / dose).abs() < 1e-6,
            "at t={}: total mass {} drifted from the dose",
            sample.time,
            total
        );
    }

    Ok(())
}

#[test]
fn test_long_runs_complete_for_oral_and_iv_dosing() -> Result<()> {
    let times: Vec<f64> = (0..=48).map(f64::from).collect();
    let options = SolverOptions::default();

    let subject = vori::model()?.context()?;
    let oral = Regimen::new().bolus(0.0, 200.0, vori::GUTLUMEN);
    let iv = Regimen::new().infusion(0.0, 200.0, vori::VEN, 1.0);
    for regimen in [oral, iv] {
        let trajectory = subject.simulate(&regimen, &times, &options)?;
        assert!(
            trajectory.status().is_completed(),
            "run ended {:?}",
            trajectory.status()
        );
        assert_eq!(trajectory.len(), times.len());
    }

    // the permeability-limited variant integrates the same circulation
    let wall_limited = ext::model()?.context()?;
    let oral_wall = Regimen::new().bolus(0.0, 200.0, ext::GUTLUMEN);
    let trajectory = wall_limited.simulate(&oral_wall, &times, &options)?;
    assert!(trajectory.status().is_completed());
    assert_eq!(trajectory.len(), times.len());

    Ok(())
}

#[test]
fn test_zero_dose_stays_identically_zero() -> Result<()> {
    let subject = vori::model()?.context()?;

    let regimen = Regimen::new();
    let times: Vec<f64> = (0..=24).map(f64::from).collect();

    let trajectory = subject.simulate(&regimen, &times, &SolverOptions::default())?;
    assert!(trajectory.status().is_completed());
    assert_eq!(trajectory.len(), times.len());

    for sample in trajectory.samples() {
        assert!(sample.state.iter().all(|&m| m == 0.0));
        assert!(sample.outputs.iter().all(|&y| y == 0.0));
    }

    Ok(())
}

#[test]
fn test_blood_plasma_ratio_shifts_the_profile() -> Result<()> {
    let model = vori::model()?;
    let reference = model.context()?;
    let shifted = model.context_with(&[("BP", 0.67)])?;

    let regimen = Regimen::new().bolus(0.0, 200.0, vori::VEN);
    let times: Vec<f64> = (0..=24).map(f64::from).collect();

    let a = reference.simulate(&regimen, &times, &tight())?;
    let b = shifted.simulate(&regimen, &times, &tight())?;
    assert!(a.status().is_completed());
    assert!(b.status().is_completed());

    let cp_a = a.output("CP").unwrap();
    let cp_b = b.output("CP").unwrap();

    // partitioning scales with BP, so the profiles must separate
    let spread = cp_a
        .iter()
        .zip(cp_b.iter())
        .skip(1)
        .map(|(x, y)| ((x - y) / x).abs())
        .fold(0.0, f64::max);
    assert!(spread > 0.01, "profiles did not separate, spread {}", spread);

    Ok(())
}

#[test]
fn test_runs_are_deterministic() -> Result<()> {
    let model = vori::model()?;
    let subject = model.context()?;

    let regimen = Regimen::new().bolus(0.0, 200.0, vori::GUTLUMEN);
    let times: Vec<f64> = (0..=48).map(f64::from).collect();
    let options = SolverOptions::default();

    let first = subject.simulate(&regimen, &times, &options)?;
    let second = subject.simulate(&regimen, &times, &options)?;
    assert!(first.status().is_completed());
    assert!(second.status().is_completed());
    assert_eq!(first.output("CP"), second.output("CP"));

    // a population batch of identical subjects reproduces the single run
    let batch = simulate_population(&model, &[vec![], vec![]], &regimen, &times, &options);
    for result in &batch {
        let trajectory = result.as_ref().unwrap();
        assert!(trajectory.status().is_completed());
        assert_eq!(trajectory.output("CP"), first.output("CP"));
    }

    Ok(())
}

#[test]
fn test_population_batch_isolates_subject_failures() -> Result<()> {
    let model = vori::model()?;

    let regimen = Regimen::new().bolus(0.0, 200.0, vori::VEN);
    let times: Vec<f64> = (0..=12).map(f64::from).collect();

    let subjects: Vec<Vec<(&str, f64)>> =
        vec![vec![], vec![("Vli", 0.0)], vec![("CO", 2.0 * 390.0)]];
    let batch = simulate_population(&model, &subjects, &regimen, &times, &SolverOptions::default());

    assert_eq!(batch.len(), 3);
    assert!(matches!(&batch[1], Err(Error::InvalidModel { .. })));

    // the healthy subjects must have run to completion, not merely set up
    let base = batch[0].as_ref().unwrap();
    let fast = batch[2].as_ref().unwrap();
    assert!(base.status().is_completed());
    assert!(fast.status().is_completed());

    // the doubled cardiac output subject really is a different run
    let base_cp = base.output("CP").unwrap();
    let fast_cp = fast.output("CP").unwrap();
    assert!(base_cp.iter().zip(fast_cp.iter()).skip(1).any(|(a, b)| a != b));

    Ok(())
}

#[test]
fn test_saturated_lumen_caps_absorption() -> Result<()> {
    let subject = ext::model()?.context()?;
    let p = subject.parameters();
    let saturating_mass = p["S_lumen"] * p["VguLumen"];

    let times = vec![0.0, 0.005, 0.01, 1.0];
    let low = Regimen::new().bolus(0.0, 2.0 * saturating_mass, ext::GUTLUMEN);
    let high = Regimen::new().bolus(0.0, 4.0 * saturating_mass, ext::GUTLUMEN);

    let a = subject.simulate(&low, &times, &tight())?;
    let b = subject.simulate(&high, &times, &tight())?;
    assert!(a.status().is_completed());
    assert!(b.status().is_completed());

    // while both lumens are supersaturated the dissolution flux is capped,
    // so the gut wall cannot tell the two doses apart
    for i in 1..=2 {
        let wall_low = a.samples()[i].state[ext::GUTWALL];
        let wall_high = b.samples()[i].state[ext::GUTWALL];
        assert!(
            ((wall_high - wall_low) / wall_low).abs() < 1e-4,
            "at t={}: wall amounts {} and {} separated under saturation",
            times[i],
            wall_low,
            wall_high
        );
    }

    // once the small dose falls below saturation the doses must diverge
    let ven_low = a.samples()[3].state[ext::VEN];
    let ven_high = b.samples()[3].state[ext::VEN];
    assert!(ven_high > 1.3 * ven_low);

    Ok(())
}
