use anyhow::Result;
use pbpkcore::models::pk1;
use pbpkcore::prelude::*;

fn tight() -> SolverOptions {
    SolverOptions {
        rtol: 1e-8,
        atol: 1e-10,
        ..Default::default()
    }
}

#[test]
fn test_oral_bolus_matches_analytic_solution() -> Result<()> {
    let subject = pk1::model()?.context()?;
    let p = subject.parameters();
    let (cl, vc, ka) = (p["CL"], p["VC"], p["KA"]);
    let ke = cl / vc;

    let dose = 100.0;
    let regimen = Regimen::new().bolus(0.0, dose, pk1::GUT);
    let times: Vec<f64> = (0..=24).map(f64::from).collect();

    let trajectory = subject.simulate(&regimen, &times, &tight())?;
    assert!(trajectory.status().is_completed());

    // Bateman solution for first-order absorption and elimination
    let cp = |t: f64| (dose * ka / (vc * (ka - ke))) * (f64::exp(-ke * t) - f64::exp(-ka * t));

    let observed = trajectory.output("CP").unwrap();
    assert_eq!(observed[0], 0.0);
    for (t, obs) in times.iter().zip(observed.iter()).skip(1) {
        let expected = cp(*t);
        assert!(
            (obs - expected).abs() / expected < 1e-4,
            "at t={}: got {}, expected {}",
            t,
            obs,
            expected
        );
    }

    Ok(())
}

#[test]
fn test_intravenous_bolus_matches_analytic_solution() -> Result<()> {
    let subject = pk1::model()?.context()?;
    let p = subject.parameters();
    let (cl, vc) = (p["CL"], p["VC"]);
    let ke = cl / vc;

    let dose = 50.0;
    let regimen = Regimen::new().bolus(0.0, dose, pk1::CENT);
    let times: Vec<f64> = (0..=48).map(|i| i as f64 * 0.5).collect();

    let trajectory = subject.simulate(&regimen, &times, &tight())?;
    assert!(trajectory.status().is_completed());

    let observed = trajectory.output("CP").unwrap();
    for (t, obs) in times.iter().zip(observed.iter()) {
        let expected = (dose / vc) * f64::exp(-ke * t);
        assert!(
            (obs - expected).abs() / expected < 1e-4,
            "at t={}: got {}, expected {}",
            t,
            obs,
            expected
        );
    }

    // nothing ever enters the depot
    for sample in trajectory.samples() {
        assert_eq!(sample.state[pk1::GUT], 0.0);
    }

    Ok(())
}

#[test]
fn test_constant_infusion_matches_analytic_solution() -> Result<()> {
    let subject = pk1::model()?.context()?;
    let p = subject.parameters();
    let (cl, vc) = (p["CL"], p["VC"]);
    let ke = cl / vc;

    let dose = 100.0;
    let duration = 2.0;
    let rate = dose / duration;
    let regimen = Regimen::new().infusion(0.0, dose, pk1::CENT, duration);
    let times = vec![0.0, 0.5, 1.0, 1.5, 2.0, 3.0, 6.0, 12.0, 24.0];

    let trajectory = subject.simulate(&regimen, &times, &tight())?;
    assert!(trajectory.status().is_completed());

    // amount rises as R/ke (1 - exp(-ke t)) while the pump runs, then decays
    let amount = |t: f64| {
        let during = (rate / ke) * (1.0 - f64::exp(-ke * t.min(duration)));
        during * f64::exp(-ke * (t - duration).max(0.0))
    };

    let observed = trajectory.output("CP").unwrap();
    assert_eq!(observed[0], 0.0);
    for (t, obs) in times.iter().zip(observed.iter()).skip(1) {
        let expected = amount(*t) / vc;
        assert!(
            (obs - expected).abs() / expected < 1e-4,
            "at t={}: got {}, expected {}",
            t,
            obs,
            expected
        );
    }

    Ok(())
}

#[test]
fn test_concentration_profile_is_unimodal() -> Result<()> {
    let subject = pk1::model()?.context()?;

    let regimen = Regimen::new().bolus(0.0, 100.0, pk1::GUT);
    let times: Vec<f64> = (0..=192).map(|i| i as f64 * 0.25).collect();

    let trajectory = subject.simulate(&regimen, &times, &tight())?;
    assert!(trajectory.status().is_completed());
    let cp = trajectory.output("CP").unwrap();

    let peak = cp
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
        .map(|(i, _)| i)
        .unwrap();
    assert!(peak > 0 && peak < cp.len() - 1);

    for i in 0..peak {
        assert!(cp[i] <= cp[i + 1] + 1e-9, "dip before the peak at index {}", i);
    }
    for i in peak..cp.len() - 1 {
        assert!(cp[i] >= cp[i + 1] - 1e-9, "rise after the peak at index {}", i);
    }

    Ok(())
}

#[test]
fn test_default_tolerances_track_analytic_solution() -> Result<()> {
    let subject = pk1::model()?.context()?;
    let p = subject.parameters();
    let (cl, vc, ka) = (p["CL"], p["VC"], p["KA"]);
    let ke = cl / vc;

    let dose = 100.0;
    let regimen = Regimen::new().bolus(0.0, dose, pk1::GUT);
    let times: Vec<f64> = (0..=24).map(f64::from).collect();

    let trajectory = subject.simulate(&regimen, &times, &SolverOptions::default())?;
    assert!(trajectory.status().is_completed());
    let cp = |t: f64| (dose * ka / (vc * (ka - ke))) * (f64::exp(-ke * t) - f64::exp(-ka * t));

    let observed = trajectory.output("CP").unwrap();
    for (t, obs) in times.iter().zip(observed.iter()).skip(1) {
        let expected = cp(*t);
        assert!(
            (obs - expected).abs() / expected < 1e-2,
            "at t={}: got {}, expected {}",
            t,
            obs,
            expected
        );
    }

    Ok(())
}
