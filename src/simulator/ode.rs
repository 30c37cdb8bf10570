//! Segment-wise adaptive integration
//!
//! A run is split at its dose-event times. Each segment is advanced with the
//! Dormand-Prince 4(5) stepper; the integrator pauses exactly at every event
//! time, applies the events due there in schedule order, then resumes with
//! the updated state and infusion rates. Requested output times never
//! constrain the step size: they are sampled afterwards by cubic Hermite
//! interpolation over the accepted-step mesh, with node slopes from the
//! right-hand side.

use ode_solvers::dop_shared::OutputType;
use ode_solvers::Dopri5;

use crate::data::{DoseEvent, EventKind, Regimen};
use crate::error::{Error, Result};
use crate::simulator::{CancelToken, SimulationContext, SolverOptions, T, V};
use crate::structs::trajectory::{RunStatus, Trajectory};

/// One event segment: the model dynamics plus the active infusion inflow
#[derive(Clone)]
struct SegmentOde<'a> {
    ctx: &'a SimulationContext,
    rates: V,
    cancel: Option<CancelToken>,
}

impl SegmentOde<'_> {
    fn rhs(&self, t: T, x: &V, dx: &mut V) {
        (self.ctx.model().diffeq())(x, self.ctx.parameters(), self.ctx.derived(), t, dx);
        *dx += &self.rates;
    }
}

impl ode_solvers::System<T, V> for SegmentOde<'_> {
    fn system(&self, t: T, y: &V, dy: &mut V) {
        self.rhs(t, y, dy);
    }

    fn solout(&mut self, _t: T, _y: &V, _dy: &V) -> bool {
        self.cancel.as_ref().map_or(false, CancelToken::is_cancelled)
    }
}

pub(crate) fn run(
    ctx: &SimulationContext,
    x0: V,
    regimen: &Regimen,
    times: &[f64],
    options: &SolverOptions,
) -> Result<Trajectory> {
    let nstates = ctx.model().nstates();
    if x0.len() != nstates {
        return Err(Error::invalid_model(format!(
            "initial state has {} entries but the model has {} compartments",
            x0.len(),
            nstates
        )));
    }
    if x0.iter().any(|v| !v.is_finite()) {
        return Err(Error::invalid_model(
            "initial state contains a non-finite value",
        ));
    }
    validate_grid(times)?;
    let t0 = times[0];
    let t_end = times[times.len() - 1];
    let events = validate_events(regimen, t0, t_end, nstates)?;

    tracing::debug!(
        "simulating `{}` over [{}, {}] with {} events and {} output times",
        ctx.model().name(),
        t0,
        t_end,
        events.len(),
        times.len()
    );

    let mut traj = Trajectory::new(ctx.model().captures().to_vec());
    let mut x = x0;
    let mut rates = V::zeros(nstates);
    let mut t_cur = t0;
    let mut ei = 0;
    let mut gi = 0;

    loop {
        // events due exactly at this boundary, in schedule order
        let mut applied = false;
        while ei < events.len() && events[ei].time == t_cur {
            apply_event(&events[ei], &mut x, &mut rates);
            ei += 1;
            applied = true;
        }
        if applied {
            if let Some(i) = x.iter().position(|v| !v.is_finite()) {
                traj.finish(RunStatus::Failed(Error::InvalidState {
                    time: t_cur,
                    compartment: compartment_name(ctx, i),
                }));
                return Ok(traj);
            }
        }
        // an event at an output time applies before that time is sampled
        if gi < times.len() && times[gi] == t_cur {
            push_sample(ctx, &mut traj, t_cur, &x);
            gi += 1;
        }
        if t_cur >= t_end {
            break;
        }
        let t_next = if ei < events.len() {
            events[ei].time
        } else {
            t_end
        };

        let ode = SegmentOde {
            ctx,
            rates: rates.clone(),
            cancel: options.cancel.clone(),
        };
        let mut stepper = Dopri5::from_param(
            ode.clone(),
            t_cur,
            t_next,
            t_next - t_cur,
            x.clone(),
            options.rtol,
            options.atol,
            0.9,
            0.04,
            0.2,
            10.0,
            t_next - t_cur,
            options.h0,
            options.max_steps,
            // perfusion models hold the accepted step at the stability
            // boundary for the whole run, which DOPRI5's stiffness heuristic
            // misreads as stiffness; leave it disarmed
            u32::MAX,
            OutputType::Sparse,
        );
        let result = stepper.integrate();
        let xs = stepper.x_out();
        let ys = stepper.y_out();

        match result {
            Err(e) => {
                let stop = if xs.is_empty() { t_cur } else { xs[xs.len() - 1] };
                sample_interior(ctx, &ode, xs, ys, times, &mut gi, t_next, stop, &mut traj);
                traj.finish(RunStatus::Failed(Error::NumericalInstability {
                    time: stop,
                    detail: e.to_string(),
                }));
                return Ok(traj);
            }
            Ok(stats) => {
                tracing::trace!(
                    "segment [{}, {}]: {} accepted, {} rejected steps",
                    t_cur,
                    t_next,
                    stats.accepted_steps,
                    stats.rejected_steps
                );
            }
        }
        for (tm, ym) in xs.iter().zip(ys.iter()) {
            if let Some(i) = ym.iter().position(|v| !v.is_finite()) {
                traj.finish(RunStatus::Failed(Error::InvalidState {
                    time: *tm,
                    compartment: compartment_name(ctx, i),
                }));
                return Ok(traj);
            }
        }
        if options
            .cancel
            .as_ref()
            .map_or(false, CancelToken::is_cancelled)
        {
            let covered = xs[xs.len() - 1];
            sample_interior(ctx, &ode, xs, ys, times, &mut gi, t_next, covered, &mut traj);
            traj.finish(RunStatus::Cancelled);
            return Ok(traj);
        }

        sample_interior(ctx, &ode, xs, ys, times, &mut gi, t_next, t_next, &mut traj);
        x = ys[ys.len() - 1].clone();
        t_cur = t_next;
    }

    traj.finish(RunStatus::Completed);
    Ok(traj)
}

fn validate_grid(times: &[f64]) -> Result<()> {
    if times.is_empty() {
        return Err(Error::invalid_model("output grid is empty"));
    }
    if times.iter().any(|t| !t.is_finite()) {
        return Err(Error::invalid_model(
            "output grid contains a non-finite time",
        ));
    }
    if times.windows(2).any(|w| w[0] >= w[1]) {
        return Err(Error::invalid_model(
            "output grid must be strictly ascending",
        ));
    }
    Ok(())
}

/// Order and check the schedule against the grid and the model
///
/// Events after the last output time are dropped with a warning; an event
/// before the first output time is an error. Every infusion stop must match
/// an earlier start with the same rate in the same compartment.
fn validate_events(
    regimen: &Regimen,
    t0: f64,
    t_end: f64,
    nstates: usize,
) -> Result<Vec<DoseEvent>> {
    let mut events = Vec::with_capacity(regimen.len());
    for event in regimen.sorted_events() {
        if !event.time.is_finite() {
            return Err(Error::invalid_model(format!(
                "event has a non-finite time: {}",
                event
            )));
        }
        if event.compartment >= nstates {
            return Err(Error::invalid_model(format!(
                "event targets compartment {} but the model has {}",
                event.compartment, nstates
            )));
        }
        if event.time < t0 {
            return Err(Error::invalid_model(format!(
                "event at t = {} precedes the output grid start {}",
                event.time, t0
            )));
        }
        if event.time > t_end {
            tracing::warn!("ignoring event beyond the output grid: {}", event);
            continue;
        }
        events.push(event);
    }

    let mut active: Vec<(usize, f64)> = Vec::new();
    for event in &events {
        match event.kind {
            EventKind::Bolus => {}
            EventKind::InfusionStart => active.push((event.compartment, event.amount)),
            EventKind::InfusionStop => {
                let found = active
                    .iter()
                    .position(|(c, r)| *c == event.compartment && *r == event.amount);
                match found {
                    Some(i) => {
                        active.remove(i);
                    }
                    None => {
                        return Err(Error::invalid_model(format!(
                            "infusion stop without a matching start: {}",
                            event
                        )));
                    }
                }
            }
        }
    }
    Ok(events)
}

fn apply_event(event: &DoseEvent, x: &mut V, rates: &mut V) {
    match event.kind {
        EventKind::Bolus => x[event.compartment] += event.amount,
        EventKind::InfusionStart => rates[event.compartment] += event.amount,
        EventKind::InfusionStop => rates[event.compartment] -= event.amount,
    }
}

fn compartment_name(ctx: &SimulationContext, index: usize) -> String {
    ctx.model().compartments()[index].name().to_string()
}

fn push_sample(ctx: &SimulationContext, traj: &mut Trajectory, t: f64, x: &V) {
    let y = ctx.capture(x);
    traj.push(t, x.as_slice().to_vec(), y.as_slice().to_vec());
}

/// Sample the output times that fall strictly inside the segment
///
/// Consumes grid entries in `(segment start, t_stop)` up to `covered`; the
/// boundary itself is sampled by the caller after events apply. For a
/// completed segment `covered` is the boundary; for a failed or cancelled
/// one it is the last accepted mesh node.
#[allow(clippy::too_many_arguments)]
fn sample_interior(
    ctx: &SimulationContext,
    ode: &SegmentOde,
    xs: &[f64],
    ys: &[V],
    times: &[f64],
    gi: &mut usize,
    t_stop: f64,
    covered: f64,
    traj: &mut Trajectory,
) {
    if xs.len() < 2 {
        return;
    }
    let mut k = 0;
    let mut cached_k = usize::MAX;
    let mut f0 = V::zeros(0);
    let mut f1 = V::zeros(0);

    while *gi < times.len() {
        let g = times[*gi];
        if g >= t_stop || g > covered {
            break;
        }
        while k + 2 < xs.len() && xs[k + 1] < g {
            k += 1;
        }
        if cached_k != k {
            f0 = V::zeros(ys[k].len());
            f1 = V::zeros(ys[k].len());
            ode.rhs(xs[k], &ys[k], &mut f0);
            ode.rhs(xs[k + 1], &ys[k + 1], &mut f1);
            cached_k = k;
        }
        let y = hermite(xs[k], xs[k + 1], &ys[k], &ys[k + 1], &f0, &f1, g);
        push_sample(ctx, traj, g, &y);
        *gi += 1;
    }
}

/// Cubic Hermite interpolation between two mesh nodes
fn hermite(x0: f64, x1: f64, y0: &V, y1: &V, f0: &V, f1: &V, g: f64) -> V {
    let h = x1 - x0;
    let th = ((g - x0) / h).clamp(0.0, 1.0);
    let t2 = th * th;
    let t3 = t2 * th;
    let b00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let b10 = t3 - 2.0 * t2 + th;
    let b01 = -2.0 * t3 + 3.0 * t2;
    let b11 = t3 - t2;
    y0 * b00 + y1 * b01 + f0 * (b10 * h) + f1 * (b11 * h)
}
