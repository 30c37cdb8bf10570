//! Dosing schedules
//!
//! A schedule is an ordered list of [`DoseEvent`] records supplied by an
//! external regimen builder: `(time, compartment, amount, kind)` with kind
//! bolus, infusion-start or infusion-stop. For a bolus the amount is mass
//! added instantaneously; for the infusion kinds it is a mass-per-time rate
//! added to (or removed from) the compartment's active infusion rate, so
//! overlapping infusions superpose. Events are consumed in time order;
//! events at the same instant apply in the order they were scheduled.
//!
//! [`Regimen`] is the bundled builder for the common cases.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of a scheduled dose perturbation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Bolus,
    InfusionStart,
    InfusionStop,
}

/// A scheduled discrete perturbation of the state vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub time: f64,
    pub compartment: usize,
    pub amount: f64,
    pub kind: EventKind,
}

impl fmt::Display for DoseEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.kind {
            EventKind::Bolus => write!(
                f,
                "Bolus at time {:.2} with amount {:.2} in compartment {}",
                self.time, self.amount, self.compartment
            ),
            EventKind::InfusionStart => write!(
                f,
                "Infusion start at time {:.2} with rate {:.2} in compartment {}",
                self.time, self.amount, self.compartment
            ),
            EventKind::InfusionStop => write!(
                f,
                "Infusion stop at time {:.2} with rate {:.2} in compartment {}",
                self.time, self.amount, self.compartment
            ),
        }
    }
}

/// A dosing regimen: the schedule of events for one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Regimen {
    events: Vec<DoseEvent>,
}

impl Regimen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap raw schedule records, e.g. deserialized from an external builder
    pub fn from_events(events: Vec<DoseEvent>) -> Self {
        Regimen { events }
    }

    /// Instantaneous dose of `amount` mass into a compartment
    pub fn bolus(mut self, time: f64, amount: f64, compartment: usize) -> Self {
        self.events.push(DoseEvent {
            time,
            compartment,
            amount,
            kind: EventKind::Bolus,
        });
        self
    }

    /// Constant-rate infusion of `amount` mass over `duration`
    ///
    /// Expands to an infusion-start/infusion-stop pair carrying the rate
    /// `amount / duration`.
    pub fn infusion(mut self, time: f64, amount: f64, compartment: usize, duration: f64) -> Self {
        let rate = amount / duration;
        self.events.push(DoseEvent {
            time,
            compartment,
            amount: rate,
            kind: EventKind::InfusionStart,
        });
        self.events.push(DoseEvent {
            time: time + duration,
            compartment,
            amount: rate,
            kind: EventKind::InfusionStop,
        });
        self
    }

    /// Append a raw event record
    pub fn event(mut self, event: DoseEvent) -> Self {
        self.events.push(event);
        self
    }

    pub fn events(&self) -> &[DoseEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Events ordered by time; schedule order is kept at equal times
    pub(crate) fn sorted_events(&self) -> Vec<DoseEvent> {
        let mut events = self.events.clone();
        events.sort_by(|a, b| {
            a.time
                .partial_cmp(&b.time)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        events
    }
}

impl fmt::Display for Regimen {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Regimen with {} events:", self.events.len())?;
        for event in &self.events {
            writeln!(f, "  {}", event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infusion_expands_to_start_stop_pair() {
        let regimen = Regimen::new().infusion(2.0, 100.0, 1, 4.0);

        assert_eq!(regimen.len(), 2);
        let events = regimen.events();
        assert_eq!(events[0].kind, EventKind::InfusionStart);
        assert_eq!(events[0].time, 2.0);
        assert_eq!(events[0].amount, 25.0);
        assert_eq!(events[1].kind, EventKind::InfusionStop);
        assert_eq!(events[1].time, 6.0);
        assert_eq!(events[1].amount, 25.0);
    }

    #[test]
    fn test_sort_is_stable_at_equal_times() {
        let regimen = Regimen::new()
            .bolus(4.0, 10.0, 0)
            .bolus(2.0, 20.0, 1)
            .bolus(2.0, 30.0, 0)
            .bolus(0.0, 40.0, 0);

        let sorted = regimen.sorted_events();
        let order: Vec<f64> = sorted.iter().map(|e| e.amount).collect();
        // the two t = 2.0 events keep their schedule order
        assert_eq!(order, vec![40.0, 20.0, 30.0, 10.0]);
    }

    #[test]
    fn test_schedule_records_round_trip_through_json() {
        let records = r#"[
            {"time": 0.0, "compartment": 0, "amount": 200.0, "kind": "bolus"},
            {"time": 1.0, "compartment": 13, "amount": 50.0, "kind": "infusion-start"},
            {"time": 3.0, "compartment": 13, "amount": 50.0, "kind": "infusion-stop"}
        ]"#;

        let events: Vec<DoseEvent> = serde_json::from_str(records).unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[1].kind, EventKind::InfusionStart);

        let regimen = Regimen::from_events(events.clone());
        let json = serde_json::to_string(regimen.events()).unwrap();
        let back: Vec<DoseEvent> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, events);
    }
}
