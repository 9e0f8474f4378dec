//! In-memory model of the boarding-cycle protocol for property-based
//! testing.
//!
//! The model replicates the shared record, the semaphore counters, and
//! each role's state machine at the granularity of one critical section
//! (plus the signal that immediately follows it). A fuzz-chosen schedule
//! picks which actor steps next; a step only fires when its semaphore
//! wait is satisfiable, exactly like the real blocking behavior, and
//! every step is atomic, so torn reads cannot exist by construction.
//!
//! Invariants are verified after every step and at quiescence.

/// Bound on passengers in the model; keeps schedules short enough to
/// find edge cases quickly.
pub const MAX_PASSENGERS: usize = 6;

/// Cap on total steps before the model declares the protocol stalled.
const STEP_BUDGET: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Status {
    Traveling,
    InQueue,
    InFlight,
    AtDestination,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PassengerPc {
    Arrive,
    AwaitAdmission,
    AwaitRelease,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PilotPc {
    CheckFinished,
    StartBoarding,
    AwaitReadyToFlight,
    Arrive,
    AwaitEmpty,
    Exited,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostessPc {
    AwaitFlight,
    Decide,
    AwaitArrival,
    AwaitId,
}

/// Who gets scheduled next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Passenger(usize),
    Pilot,
    Hostess,
    /// The external collaborator that writes the termination flag, once,
    /// after every passenger is done.
    Orchestrator,
}

/// The whole protocol state: shared record, semaphores, program counters.
#[derive(Debug)]
pub struct CycleModel {
    capacity: u32,
    n_passengers: usize,

    // Shared record.
    queue: u32,
    aboard: u32,
    checked_slot: Option<usize>,
    flight: u32,
    loads: Vec<u32>,
    checked_total: u32,
    status: Vec<Status>,
    finished: bool,

    // Semaphore counters.
    sem_in_queue: u32,
    sem_wait_in_queue: u32,
    sem_id_shown: u32,
    sem_ready_for_boarding: u32,
    sem_ready_to_flight: u32,
    sem_wait_in_flight: u32,
    sem_plane_empty: u32,

    // Program counters.
    passenger_pc: Vec<PassengerPc>,
    pilot_pc: PilotPc,
    hostess_pc: HostessPc,

    // Accounting for invariant checks.
    releases: Vec<u32>,
    empty_signals: Vec<u32>,
}

impl CycleModel {
    pub fn new(capacity: u32, n_passengers: usize) -> Self {
        assert!(capacity >= 1, "capacity must be at least 1");
        let n_passengers = n_passengers.min(MAX_PASSENGERS);
        Self {
            capacity,
            n_passengers,
            queue: 0,
            aboard: 0,
            checked_slot: None,
            flight: 0,
            loads: Vec::new(),
            checked_total: 0,
            status: vec![Status::Traveling; n_passengers],
            finished: false,
            sem_in_queue: 0,
            sem_wait_in_queue: 0,
            sem_id_shown: 0,
            sem_ready_for_boarding: 0,
            sem_ready_to_flight: 0,
            sem_wait_in_flight: 0,
            sem_plane_empty: 0,
            passenger_pc: vec![PassengerPc::Arrive; n_passengers],
            pilot_pc: PilotPc::CheckFinished,
            hostess_pc: HostessPc::AwaitFlight,
            releases: Vec::new(),
            empty_signals: Vec::new(),
        }
    }

    pub fn n_passengers(&self) -> usize {
        self.n_passengers
    }

    /// Attempt one step for `actor`. Returns `true` if a step fired,
    /// `false` if the actor is blocked (or already done).
    pub fn step(&mut self, actor: Actor) -> bool {
        let fired = match actor {
            Actor::Passenger(id) if id < self.n_passengers => self.step_passenger(id),
            Actor::Passenger(_) => false,
            Actor::Pilot => self.step_pilot(),
            Actor::Hostess => self.step_hostess(),
            Actor::Orchestrator => self.step_orchestrator(),
        };
        if fired {
            self.verify_step();
        }
        fired
    }

    fn step_passenger(&mut self, id: usize) -> bool {
        match self.passenger_pc[id] {
            PassengerPc::Arrive => {
                self.queue += 1;
                self.advance(id, Status::InQueue);
                self.sem_in_queue += 1;
                self.passenger_pc[id] = PassengerPc::AwaitAdmission;
                true
            }
            PassengerPc::AwaitAdmission => {
                if !take(&mut self.sem_wait_in_queue) {
                    return false;
                }
                assert!(
                    self.checked_slot.is_none(),
                    "handoff slot occupied by {:?} while admitting {id}",
                    self.checked_slot
                );
                self.checked_slot = Some(id);
                self.advance(id, Status::InFlight);
                self.sem_id_shown += 1;
                self.passenger_pc[id] = PassengerPc::AwaitRelease;
                true
            }
            PassengerPc::AwaitRelease => {
                if !take(&mut self.sem_wait_in_flight) {
                    return false;
                }
                self.aboard = self
                    .aboard
                    .checked_sub(1)
                    .expect("aboard underflow: released more passengers than boarded");
                self.advance(id, Status::AtDestination);
                if self.aboard == 0 {
                    self.sem_plane_empty += 1;
                    self.empty_signals[self.flight as usize - 1] += 1;
                }
                self.passenger_pc[id] = PassengerPc::Done;
                true
            }
            PassengerPc::Done => false,
        }
    }

    fn step_pilot(&mut self) -> bool {
        match self.pilot_pc {
            PilotPc::CheckFinished => {
                self.pilot_pc = if self.finished {
                    PilotPc::Exited
                } else {
                    PilotPc::StartBoarding
                };
                true
            }
            PilotPc::StartBoarding => {
                self.flight += 1;
                self.releases.push(0);
                self.empty_signals.push(0);
                self.sem_ready_for_boarding += 1;
                self.pilot_pc = PilotPc::AwaitReadyToFlight;
                true
            }
            PilotPc::AwaitReadyToFlight => {
                if !take(&mut self.sem_ready_to_flight) {
                    return false;
                }
                self.pilot_pc = PilotPc::Arrive;
                true
            }
            PilotPc::Arrive => {
                let load = self.loads[self.flight as usize - 1];
                self.sem_wait_in_flight += load;
                self.releases[self.flight as usize - 1] = load;
                self.pilot_pc = if load > 0 {
                    PilotPc::AwaitEmpty
                } else {
                    PilotPc::CheckFinished
                };
                true
            }
            PilotPc::AwaitEmpty => {
                if !take(&mut self.sem_plane_empty) {
                    return false;
                }
                self.pilot_pc = PilotPc::CheckFinished;
                true
            }
            PilotPc::Exited => false,
        }
    }

    fn step_hostess(&mut self) -> bool {
        match self.hostess_pc {
            HostessPc::AwaitFlight => {
                if !take(&mut self.sem_ready_for_boarding) {
                    return false;
                }
                self.hostess_pc = HostessPc::Decide;
                true
            }
            HostessPc::Decide => {
                if self.aboard >= self.capacity || self.checked_total >= self.n_passengers as u32 {
                    self.loads.push(self.aboard);
                    assert_eq!(
                        self.loads.len(),
                        self.flight as usize,
                        "boarding closed out of step with the flight counter"
                    );
                    self.sem_ready_to_flight += 1;
                    self.hostess_pc = HostessPc::AwaitFlight;
                } else {
                    self.hostess_pc = HostessPc::AwaitArrival;
                }
                true
            }
            HostessPc::AwaitArrival => {
                if !take(&mut self.sem_in_queue) {
                    return false;
                }
                self.sem_wait_in_queue += 1;
                self.hostess_pc = HostessPc::AwaitId;
                true
            }
            HostessPc::AwaitId => {
                if !take(&mut self.sem_id_shown) {
                    return false;
                }
                let id = self
                    .checked_slot
                    .take()
                    .expect("id shown but handoff slot is empty");
                assert_eq!(self.status[id], Status::InFlight);
                self.queue = self
                    .queue
                    .checked_sub(1)
                    .expect("queue underflow at check-in");
                self.aboard += 1;
                self.checked_total += 1;
                self.hostess_pc = HostessPc::Decide;
                true
            }
        }
    }

    fn step_orchestrator(&mut self) -> bool {
        let all_done = self.passenger_pc.iter().all(|&pc| pc == PassengerPc::Done);
        if !all_done || self.finished {
            return false;
        }
        self.finished = true;
        true
    }

    fn advance(&mut self, id: usize, to: Status) {
        let current = self.status[id];
        assert!(
            to > current,
            "passenger {id} status regression: {current:?} -> {to:?}"
        );
        self.status[id] = to;
    }

    /// Invariants that must hold after every single step.
    fn verify_step(&self) {
        let in_queue = self.count(Status::InQueue) as u32;
        let in_flight = self.count(Status::InFlight) as u32;

        // The queue counter lags the status by at most the one passenger
        // currently mid-handshake (status flips at admission, counter at
        // the hostess's check-in completion).
        assert!(
            self.queue == in_queue || self.queue == in_queue + 1,
            "queue counter {} inconsistent with {} InQueue statuses",
            self.queue,
            in_queue
        );
        assert!(
            self.aboard == in_flight || self.aboard + 1 == in_flight,
            "aboard counter {} inconsistent with {} InFlight statuses",
            self.aboard,
            in_flight
        );

        assert!(
            self.loads.len() <= self.flight as usize,
            "more loads recorded than flights opened"
        );
        assert_eq!(self.releases.len(), self.flight as usize);
        assert_eq!(self.empty_signals.len(), self.flight as usize);

        for (i, &signals) in self.empty_signals.iter().enumerate() {
            assert!(
                signals <= 1,
                "plane_empty signaled {signals} times for flight {}",
                i + 1
            );
        }
        for (i, &load) in self.loads.iter().enumerate() {
            assert!(
                load <= self.capacity,
                "flight {} load {load} exceeds capacity {}",
                i + 1,
                self.capacity
            );
            assert!(
                self.releases[i] == 0 || self.releases[i] == load,
                "flight {} released {} passengers for a load of {load}",
                i + 1,
                self.releases[i]
            );
        }

        // At most one passenger in the handoff slot, and only mid-check.
        if self.checked_slot.is_some() {
            assert_eq!(self.hostess_pc, HostessPc::AwaitId);
        }
    }

    /// Invariants that must hold once the system is quiescent.
    pub fn verify_quiescent(&self) {
        assert_eq!(self.pilot_pc, PilotPc::Exited, "pilot never exited");
        assert!(
            self.passenger_pc.iter().all(|&pc| pc == PassengerPc::Done),
            "not all passengers completed: {:?}",
            self.passenger_pc
        );
        assert_eq!(
            self.hostess_pc,
            HostessPc::AwaitFlight,
            "hostess stopped mid-cycle"
        );
        assert!(
            self.status.iter().all(|&s| s == Status::AtDestination),
            "passenger left behind: {:?}",
            self.status
        );

        let delivered: u32 = self.loads.iter().sum();
        assert_eq!(
            delivered, self.n_passengers as u32,
            "loads {:?} do not account for every passenger exactly once",
            self.loads
        );
        assert_eq!(self.loads.len(), self.flight as usize);

        for (i, &load) in self.loads.iter().enumerate() {
            assert_eq!(
                self.releases[i], load,
                "flight {} release multiplicity mismatch",
                i + 1
            );
            let expected_signals = u32::from(load > 0);
            assert_eq!(
                self.empty_signals[i], expected_signals,
                "flight {} (load {load}) signaled plane_empty {} times",
                i + 1,
                self.empty_signals[i]
            );
        }

        // Nothing left unconsumed except by the announced shutdown.
        assert_eq!(self.sem_wait_in_flight, 0, "unconsumed release permits");
        assert_eq!(self.sem_plane_empty, 0, "unconsumed plane_empty permit");
        assert_eq!(self.sem_wait_in_queue, 0, "unconsumed admission permit");
        assert_eq!(self.sem_id_shown, 0, "unconsumed id_shown permit");
    }

    fn count(&self, status: Status) -> usize {
        self.status.iter().filter(|&&s| s == status).count()
    }

    fn quiescent(&self) -> bool {
        self.pilot_pc == PilotPc::Exited
            && self.passenger_pc.iter().all(|&pc| pc == PassengerPc::Done)
            && self.hostess_pc == HostessPc::AwaitFlight
    }

    fn actors(&self) -> Vec<Actor> {
        let mut actors = vec![Actor::Pilot, Actor::Hostess, Actor::Orchestrator];
        actors.extend((0..self.n_passengers).map(Actor::Passenger));
        actors
    }
}

fn take(sem: &mut u32) -> bool {
    if *sem == 0 {
        return false;
    }
    *sem -= 1;
    true
}

/// Map a schedule byte to an actor for a model with `n` passengers.
pub fn actor_from_byte(byte: u8, n_passengers: usize) -> Actor {
    match byte % 4 {
        0 => Actor::Pilot,
        1 => Actor::Hostess,
        2 => Actor::Orchestrator,
        _ if n_passengers == 0 => Actor::Pilot,
        _ => Actor::Passenger((byte as usize / 4) % n_passengers),
    }
}

/// Drive the model through a fuzz-chosen schedule, then round-robin every
/// actor to quiescence, verifying invariants throughout.
///
/// Panics if any invariant breaks or if the protocol fails to reach
/// quiescence within the step budget (a deadlock or livelock).
pub fn execute_and_verify(capacity: u32, n_passengers: usize, schedule: &[u8]) {
    let mut model = CycleModel::new(capacity, n_passengers);
    let mut steps = 0usize;

    for &byte in schedule {
        let actor = actor_from_byte(byte, model.n_passengers());
        if model.step(actor) {
            steps += 1;
            assert!(steps < STEP_BUDGET, "step budget exhausted mid-schedule");
        }
    }

    // Fair completion: keep offering steps to every actor until nothing
    // can move. With the protocol deadlock-free, that state is quiescence.
    loop {
        let mut progressed = false;
        for actor in model.actors() {
            while model.step(actor) {
                progressed = true;
                steps += 1;
                assert!(
                    steps < STEP_BUDGET,
                    "protocol stalled: {steps} steps without quiescence"
                );
            }
        }
        if !progressed {
            break;
        }
    }

    assert!(
        model.quiescent(),
        "no actor can move but the system is not quiescent: {model:?}"
    );
    model.verify_quiescent();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_schedule_completes_round_robin() {
        execute_and_verify(2, 5, &[]);
    }

    #[test]
    fn single_passenger_empties_on_first_disembark() {
        execute_and_verify(4, 1, &[]);
    }

    #[test]
    fn zero_passengers_terminates() {
        execute_and_verify(3, 0, &[]);
    }

    #[test]
    fn blocked_actor_does_not_fire() {
        let mut model = CycleModel::new(2, 1);
        // Hostess cannot consume ready_for_boarding before the pilot
        // opens boarding.
        assert!(!model.step(Actor::Hostess));
        // Orchestrator cannot finish before passengers are done.
        assert!(!model.step(Actor::Orchestrator));
        assert!(model.step(Actor::Pilot));
    }

    #[test]
    fn early_finish_leads_to_trailing_empty_flights() {
        // Deliver everyone first, then let the pilot run extra cycles
        // before the orchestrator flips the flag.
        let mut schedule = Vec::new();
        // Pilot opens boarding, hostess and passenger do the handshake.
        schedule.extend(std::iter::repeat_n([0u8, 1, 3, 1, 0].into_iter(), 40).flatten());
        execute_and_verify(1, 2, &schedule);
    }
}
