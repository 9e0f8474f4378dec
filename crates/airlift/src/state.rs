//! Shared-state record mutated by every role.
//!
//! A single [`SharedState`] instance lives inside a
//! [`SharedRegion`](crate::region::SharedRegion) and is only ever touched
//! inside its scoped critical section. All multi-field invariants (queue
//! count vs. per-passenger status, flight number vs. recorded loads) hold
//! at every lock release.

use serde::{Deserialize, Serialize};

/// Passenger identity, stable for the lifetime of the simulation, in
/// range `[0, n_passengers)`.
pub type PassengerId = usize;

/// Where a passenger is in its one-way journey.
///
/// Statuses only ever advance; the `Ord` derive follows declaration order
/// so "forward" is `>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PassengerStatus {
    /// Not yet at the airport. Initial status for every slot, so an
    /// untouched slot is never ambiguous.
    Traveling,
    /// Waiting to be checked in by the hostess.
    InQueue,
    /// Checked in and aboard the plane.
    InFlight,
    /// Disembarked at the target. Terminal.
    AtDestination,
}

/// What the pilot is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PilotStatus {
    /// Returning empty from target to origin.
    FlyingBack,
    /// At origin, boarding may start.
    ReadyForBoarding,
    /// Waiting for the hostess to close boarding.
    WaitingForBoarding,
    /// Loaded and en route to the target.
    Flying,
    /// At the target, releasing passengers.
    DroppingPassengers,
}

/// What the hostess is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HostessStatus {
    /// Waiting for the pilot to open the next boarding round.
    WaitingForFlight,
    /// Boarding open, waiting for a passenger to arrive.
    WaitingForPassenger,
    /// Admitting one passenger and reading its id.
    CheckingPassenger,
    /// Boarding closed, plane handed to the pilot.
    ReadyToFlight,
}

/// The shared record.
///
/// Counters are `u32` and mutators use checked arithmetic: a counter
/// going negative means the protocol released more waiters than it
/// admitted, which is a defect, not a runtime condition.
#[derive(Debug)]
pub struct SharedState {
    passengers_in_queue: u32,
    passengers_aboard: u32,
    passenger_checked: Option<PassengerId>,
    flight_number: u32,
    flight_loads: Vec<u32>,
    passengers_checked_total: u32,
    passenger_status: Vec<PassengerStatus>,
    pilot_status: PilotStatus,
    hostess_status: HostessStatus,
}

impl SharedState {
    /// Fresh record for `n_passengers` passengers, everyone still traveling.
    pub fn new(n_passengers: usize) -> Self {
        Self {
            passengers_in_queue: 0,
            passengers_aboard: 0,
            passenger_checked: None,
            flight_number: 0,
            flight_loads: Vec::new(),
            passengers_checked_total: 0,
            passenger_status: vec![PassengerStatus::Traveling; n_passengers],
            pilot_status: PilotStatus::FlyingBack,
            hostess_status: HostessStatus::WaitingForFlight,
        }
    }

    /// Passenger arrives at the check-in queue.
    pub fn enqueue_passenger(&mut self, id: PassengerId) {
        self.passengers_in_queue += 1;
        self.advance_passenger(id, PassengerStatus::InQueue);
    }

    /// Passenger records itself as the one being checked and boards.
    ///
    /// The id sits in the handoff slot until the hostess consumes it in
    /// [`complete_check_in`](Self::complete_check_in); the `id_shown`
    /// signal serializes the two.
    pub fn record_checked(&mut self, id: PassengerId) {
        assert!(
            self.passenger_checked.is_none(),
            "check-in handoff slot already occupied by {:?}",
            self.passenger_checked
        );
        self.passenger_checked = Some(id);
        self.advance_passenger(id, PassengerStatus::InFlight);
    }

    /// Hostess consumes the recorded id and moves the passenger from the
    /// queue to the plane. Returns the id that was checked in.
    pub fn complete_check_in(&mut self) -> PassengerId {
        let id = self
            .passenger_checked
            .take()
            .expect("check-in completed but no passenger recorded its id");
        self.passengers_in_queue = self
            .passengers_in_queue
            .checked_sub(1)
            .expect("queue count underflow at check-in");
        self.passengers_aboard += 1;
        self.passengers_checked_total += 1;
        id
    }

    /// Pilot opens a boarding round. Returns the new flight number.
    pub fn start_boarding(&mut self) -> u32 {
        self.flight_number += 1;
        self.flight_number
    }

    /// Hostess closes boarding: the current aboard count becomes the
    /// recorded load for the active flight. Returns the load.
    pub fn close_boarding(&mut self) -> u32 {
        let load = self.passengers_aboard;
        self.flight_loads.push(load);
        assert_eq!(
            self.flight_loads.len(),
            self.flight_number as usize,
            "boarding closed out of step with the flight counter"
        );
        load
    }

    /// Recorded load of a completed-boarding flight (1-based number).
    pub fn flight_load(&self, flight: u32) -> u32 {
        self.flight_loads[flight as usize - 1]
    }

    /// Passenger leaves the plane at the target. Returns `true` iff this
    /// was the last passenger aboard, i.e. the 1 -> 0 transition.
    pub fn disembark(&mut self, id: PassengerId) -> bool {
        self.passengers_aboard = self
            .passengers_aboard
            .checked_sub(1)
            .expect("aboard count underflow at disembark");
        self.advance_passenger(id, PassengerStatus::AtDestination);
        self.passengers_aboard == 0
    }

    pub fn set_pilot(&mut self, status: PilotStatus) {
        self.pilot_status = status;
    }

    pub fn set_hostess(&mut self, status: HostessStatus) {
        self.hostess_status = status;
    }

    pub fn passengers_in_queue(&self) -> u32 {
        self.passengers_in_queue
    }

    pub fn passengers_aboard(&self) -> u32 {
        self.passengers_aboard
    }

    pub fn passengers_checked_total(&self) -> u32 {
        self.passengers_checked_total
    }

    pub fn flight_number(&self) -> u32 {
        self.flight_number
    }

    pub fn passenger_status(&self, id: PassengerId) -> PassengerStatus {
        self.passenger_status[id]
    }

    /// Owned copy of the record for journaling outside the lock.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            passengers_in_queue: self.passengers_in_queue,
            passengers_aboard: self.passengers_aboard,
            passenger_checked: self.passenger_checked,
            flight_number: self.flight_number,
            flight_loads: self.flight_loads.clone(),
            passengers_checked_total: self.passengers_checked_total,
            passenger_status: self.passenger_status.clone(),
            pilot_status: self.pilot_status,
            hostess_status: self.hostess_status,
        }
    }

    /// Move a passenger strictly forward. A regression or a skip backward
    /// is a protocol defect.
    fn advance_passenger(&mut self, id: PassengerId, to: PassengerStatus) {
        let current = self.passenger_status[id];
        assert!(
            to > current,
            "passenger {id} status regression: {current:?} -> {to:?}"
        );
        self.passenger_status[id] = to;
    }
}

/// Immutable copy of [`SharedState`], cloned under the lock.
///
/// Journal implementations only ever see snapshots, so a slow or failing
/// journal can never hold the critical section open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSnapshot {
    pub passengers_in_queue: u32,
    pub passengers_aboard: u32,
    pub passenger_checked: Option<PassengerId>,
    pub flight_number: u32,
    pub flight_loads: Vec<u32>,
    pub passengers_checked_total: u32,
    pub passenger_status: Vec<PassengerStatus>,
    pub pilot_status: PilotStatus,
    pub hostess_status: HostessStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn passenger_status_advances_in_declaration_order() {
        assert!(PassengerStatus::InQueue > PassengerStatus::Traveling);
        assert!(PassengerStatus::InFlight > PassengerStatus::InQueue);
        assert!(PassengerStatus::AtDestination > PassengerStatus::InFlight);
    }

    #[test]
    fn check_in_moves_passenger_from_queue_to_plane() {
        let mut state = SharedState::new(2);
        state.enqueue_passenger(0);
        assert_eq!(state.passengers_in_queue(), 1);

        state.record_checked(0);
        assert_eq!(state.complete_check_in(), 0);
        assert_eq!(state.passengers_in_queue(), 0);
        assert_eq!(state.passengers_aboard(), 1);
        assert_eq!(state.passengers_checked_total(), 1);
        assert_eq!(state.passenger_status(0), PassengerStatus::InFlight);
    }

    #[test]
    fn close_boarding_records_load_at_flight_index() {
        let mut state = SharedState::new(3);
        assert_eq!(state.start_boarding(), 1);
        for id in 0..2 {
            state.enqueue_passenger(id);
            state.record_checked(id);
            state.complete_check_in();
        }
        assert_eq!(state.close_boarding(), 2);
        assert_eq!(state.flight_load(1), 2);
    }

    #[test]
    fn last_disembark_reports_empty_plane_exactly_once() {
        let mut state = SharedState::new(2);
        state.start_boarding();
        for id in 0..2 {
            state.enqueue_passenger(id);
            state.record_checked(id);
            state.complete_check_in();
        }
        state.close_boarding();

        assert!(!state.disembark(0));
        assert!(state.disembark(1));
        assert_eq!(state.passenger_status(1), PassengerStatus::AtDestination);
    }

    #[test]
    #[should_panic(expected = "status regression")]
    fn status_regression_is_a_defect() {
        let mut state = SharedState::new(1);
        state.enqueue_passenger(0);
        state.enqueue_passenger(0);
    }

    #[test]
    #[should_panic(expected = "underflow")]
    fn disembark_without_boarding_is_a_defect() {
        let mut state = SharedState::new(1);
        state.disembark(0);
    }

    #[test]
    fn snapshot_is_detached_from_the_record() {
        let mut state = SharedState::new(1);
        let snap = state.snapshot();
        state.enqueue_passenger(0);
        assert_eq!(snap.passengers_in_queue, 0);
        assert_eq!(state.passengers_in_queue(), 1);
    }
}
