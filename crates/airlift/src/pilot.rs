//! Pilot role: shuttle loop between origin and target.
//!
//! One instance. Each cycle: fly back empty, open boarding, wait for the
//! hostess to close it, fly out loaded, release exactly the boarded
//! passengers, wait for the plane to empty, repeat. The termination flag
//! is observed between cycles only, never mid-cycle.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::{sample_duration, AirliftConfig};
use crate::error::AirliftError;
use crate::journal::{Checkpoint, Journal};
use crate::region::SharedRegion;
use crate::state::PilotStatus;
use crate::sync::SignalSet;

pub struct Pilot {
    region: Arc<SharedRegion>,
    signals: Arc<SignalSet>,
    journal: Arc<dyn Journal>,
    max_flight: Duration,
    rng: StdRng,
}

impl Pilot {
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
            max_flight: config.max_flight,
            rng: StdRng::seed_from_u64(config.seed.wrapping_add(0x9170)),
        }
    }

    /// Fly cycles until the termination flag is observed between cycles.
    pub async fn run(mut self) -> Result<(), AirliftError> {
        while !self.region.is_finished() {
            self.flight(false).await;
            self.signal_ready_for_boarding();
            self.wait_until_ready_to_flight().await?;
            self.flight(true).await;
            self.drop_passengers_at_target().await?;
        }
        tracing::debug!("pilot done");
        Ok(())
    }

    /// One leg in the air: outbound (loaded) or back (empty). No
    /// passenger interaction while flying.
    async fn flight(&mut self, outbound: bool) {
        let snap = self.region.with(|state| {
            state.set_pilot(if outbound {
                PilotStatus::Flying
            } else {
                PilotStatus::FlyingBack
            });
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);

        let airborne = sample_duration(&mut self.rng, self.max_flight);
        tracing::debug!(outbound, ?airborne, "in flight");
        tokio::time::sleep(airborne).await;
    }

    /// Open a boarding round and hand control to the hostess.
    fn signal_ready_for_boarding(&self) {
        let (flight, state_snap, boarding_snap) = self.region.with(|state| {
            state.set_pilot(PilotStatus::ReadyForBoarding);
            let state_snap = state.snapshot();
            let flight = state.start_boarding();
            (flight, state_snap, state.snapshot())
        });
        self.journal.record(Checkpoint::State, &state_snap);
        self.journal
            .record(Checkpoint::BoardingStarted(flight), &boarding_snap);

        self.signals.ready_for_boarding.signal(1);
    }

    /// Park until the hostess closes boarding.
    async fn wait_until_ready_to_flight(&self) -> Result<(), AirliftError> {
        let snap = self.region.with(|state| {
            state.set_pilot(PilotStatus::WaitingForBoarding);
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);

        self.signals.ready_to_flight.wait().await
    }

    /// Release every boarded passenger at the target, and only those,
    /// then wait for the last one to confirm the plane is empty.
    ///
    /// A zero-load flight releases nobody and must not wait: the
    /// `plane_empty` signal only ever comes from a disembarking
    /// passenger's 1 -> 0 transition, which an empty plane never has.
    async fn drop_passengers_at_target(&self) -> Result<(), AirliftError> {
        let (flight, load, arrived_snap, state_snap) = self.region.with(|state| {
            let flight = state.flight_number();
            let arrived_snap = state.snapshot();
            state.set_pilot(PilotStatus::DroppingPassengers);
            (flight, state.flight_load(flight), arrived_snap, state.snapshot())
        });
        self.journal
            .record(Checkpoint::FlightArrived(flight), &arrived_snap);
        self.journal.record(Checkpoint::State, &state_snap);

        if load > 0 {
            self.signals.passengers_wait_in_flight.signal(load as usize);
            self.signals.plane_empty.wait().await?;
        }

        let snap = self.region.with(|state| {
            state.set_pilot(PilotStatus::FlyingBack);
            state.snapshot()
        });
        self.journal.record(Checkpoint::State, &snap);
        self.journal.record(Checkpoint::FlightReturning(flight), &snap);
        Ok(())
    }
}
