//! Passenger role: travel, queue up, board, ride, disembark.
//!
//! One instance per passenger id. The life cycle runs exactly once:
//!
//! ```text
//! Traveling -> InQueue -> InFlight -> AtDestination
//! ```
//!
//! Blocking happens only on semaphore waits; every shared-state mutation
//! is bracketed by the region's critical section.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{sample_duration, AirliftConfig};
use crate::error::AirliftError;
use crate::journal::{Checkpoint, Journal};
use crate::region::SharedRegion;
use crate::state::PassengerId;
use crate::sync::SignalSet;

pub struct Passenger {
    id: PassengerId,
    region: Arc<SharedRegion>,
    signals: Arc<SignalSet>,
    journal: Arc<dyn Journal>,
    max_travel: Duration,
    rng: StdRng,
}

impl Passenger {
    pub fn new(
        id: PassengerId,
        region: Arc<SharedRegion>,
        signals: Arc<SignalSet>,
        journal: Arc<dyn Journal>,
        config: &AirliftConfig,
    ) -> Self {
        Self {
            id,
            region,
            signals,
            journal,
            max_travel: config.max_travel,
            // Distinct stream per passenger so ids don't march in lockstep.
            rng: StdRng::seed_from_u64(config.seed ^ (id as u64).wrapping_mul(0x9E37_79B9)),
        }
    }

    /// Run the full life cycle.
    pub async fn run(mut self) -> Result<(), AirliftError> {
        self.travel_to_airport().await;
        self.wait_in_queue().await?;
        self.wait_until_destination().await?;
        tracing::debug!(passenger = self.id, "at destination");
        Ok(())
    }

    /// Bounded random delay before showing up; no shared-state contact.
    async fn travel_to_airport(&mut self) {
        let travel = sample_duration(&mut self.rng, self.max_travel);
        tracing::debug!(passenger = self.id, ?travel, "traveling to airport");
        tokio::time::sleep(travel).await;
    }

    /// Join the queue, get admitted by the hostess, and board.
    async fn wait_in_queue(&self) -> Result<(), AirliftError> {
        let snap = self.region.with(|state| {
            state.enqueue_passenger(self.id);
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);

        // Announce the arrival, then park until the hostess calls us up.
        self.signals.passengers_in_queue.signal(1);
        self.signals.passengers_wait_in_queue.wait().await?;

        let snap = self.region.with(|state| {
            state.record_checked(self.id);
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);
        self.journal.record(Checkpoint::PassengerChecked(self.id), &snap);

        // Let the hostess read the recorded id.
        self.signals.id_shown.signal(1);
        Ok(())
    }

    /// Ride out the flight, then leave the plane. The last passenger off
    /// wakes the pilot, and that decision is atomic with the decrement:
    /// both happen inside one critical section, so the 1 -> 0 transition
    /// signals `plane_empty` exactly once.
    async fn wait_until_destination(&self) -> Result<(), AirliftError> {
        self.signals.passengers_wait_in_flight.wait().await?;

        let snap = self.region.with(|state| {
            let empty = state.disembark(self.id);
            if empty {
                self.signals.plane_empty.signal(1);
            }
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);
        Ok(())
    }
}
