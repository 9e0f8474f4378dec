//! Hostess role: per-cycle check-in desk.
//!
//! One instance. Each cycle the hostess waits for the pilot to open
//! boarding, admits passengers one at a time (serializing the id handoff
//! through the shared `passenger_checked` slot), decides when boarding is
//! complete, records the load, and signals the pilot exactly once.
//!
//! Boarding closes when the plane is full or when every passenger the
//! simulation will ever see has been checked in; a round with nobody left
//! to transport closes immediately with a load of zero.

use std::sync::Arc;

use crate::config::AirliftConfig;
use crate::error::AirliftError;
use crate::journal::{Checkpoint, Journal};
use crate::region::SharedRegion;
use crate::state::HostessStatus;
use crate::sync::SignalSet;

pub struct Hostess {
    region: Arc<SharedRegion>,
    signals: Arc<SignalSet>,
    journal: Arc<dyn Journal>,
    n_passengers: u32,
    capacity: u32,
}

impl Hostess {
    pub fn new(
        region: Arc<SharedRegion>,
        signals: Arc<SignalSet>,
        journal: Arc<dyn Journal>,
        config: &AirliftConfig,
    ) -> Self {
        Self {
            region,
            signals,
            journal,
            n_passengers: config.n_passengers as u32,
            capacity: config.capacity,
        }
    }

    /// Serve boarding rounds until shutdown.
    ///
    /// The hostess has no loop guard of her own: she parks on
    /// `ready_for_boarding` between cycles, and the orchestrator closes
    /// the signal set once the pilot has exited. A failed wait there with
    /// the termination flag already set is the announced shutdown, not an
    /// error; anywhere else it is fatal.
    pub async fn run(self) -> Result<(), AirliftError> {
        loop {
            let snap = self.region.with(|state| {
                state.set_hostess(HostessStatus::WaitingForFlight);
                state.snapshot()
            });
            self.journal.record(Checkpoint::State, &snap);

            match self.signals.ready_for_boarding.wait().await {
                Ok(()) => {}
                Err(_) if self.region.is_finished() => {
                    tracing::debug!("hostess done");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }

            self.board_one_flight().await?;
        }
    }

    /// Admit passengers for the active flight, then close boarding.
    async fn board_one_flight(&self) -> Result<(), AirliftError> {
        loop {
            let (aboard, checked_total, snap) = self.region.with(|state| {
                state.set_hostess(HostessStatus::WaitingForPassenger);
                (
                    state.passengers_aboard(),
                    state.passengers_checked_total(),
                    state.snapshot(),
                )
            });
            self.journal.record(Checkpoint::State, &snap);

            if aboard >= self.capacity || checked_total >= self.n_passengers {
                break;
            }

            // Someone is still expected: wait for an arrival and admit it.
            self.signals.passengers_in_queue.wait().await?;
            self.check_in_one().await?;
        }

        let (load, snap) = self.region.with(|state| {
            state.set_hostess(HostessStatus::ReadyToFlight);
            let load = state.close_boarding();
            (load, state.snapshot())
        });
        self.journal.record(Checkpoint::State, &snap);
        tracing::debug!(load, "boarding closed");

        self.signals.ready_to_flight.signal(1);
        Ok(())
    }

    /// The three-step handshake with one queued passenger: call it up,
    /// wait for its id to land in the handoff slot, then consume the slot
    /// and move the passenger aboard.
    async fn check_in_one(&self) -> Result<(), AirliftError> {
        let snap = self.region.with(|state| {
            state.set_hostess(HostessStatus::CheckingPassenger);
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);

        self.signals.passengers_wait_in_queue.signal(1);
        self.signals.id_shown.wait().await?;

        let (id, snap) = self.region.with(|state| {
            let id = state.complete_check_in();
            (id, state.snapshot())
        });
        self.journal.record(Checkpoint::State, &snap);
        tracing::debug!(passenger = id, "checked in");
        Ok(())
    }
}
