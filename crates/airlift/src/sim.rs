//! Top-level orchestrator: spawns all role tasks and shepherds shutdown.
//!
//! Shutdown sequence, in order:
//!
//! 1. join every passenger (they each run a finite life cycle),
//! 2. set the termination flag,
//! 3. join the pilot (it observes the flag between cycles),
//! 4. close the signal set so the hostess's wait for the next boarding
//!    round resolves, and join her.
//!
//! The flag is therefore only ever set after the last passenger has
//! disembarked, and the set is only ever closed once no role can be
//! blocked mid-cycle.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::AirliftConfig;
use crate::error::AirliftError;
use crate::hostess::Hostess;
use crate::journal::{Journal, TracingJournal};
use crate::passenger::Passenger;
use crate::pilot::Pilot;
use crate::region::SharedRegion;
use crate::state::{PassengerStatus, StateSnapshot};
use crate::sync::SignalSet;

/// One configured simulation, ready to run.
pub struct Simulation {
    config: AirliftConfig,
    journal: Arc<dyn Journal>,
}

/// Aggregate outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Boarding cycles completed (== highest flight number reached).
    pub flights_completed: u32,
    /// Load of each flight, indexed by flight number minus one.
    pub flight_loads: Vec<u32>,
    /// Final status of every passenger.
    pub passenger_status: Vec<PassengerStatus>,
    /// Final state of the shared record.
    pub final_snapshot: StateSnapshot,
}

impl Simulation {
    /// Simulation logging its checkpoints through tracing.
    pub fn new(config: AirliftConfig) -> Self {
        Self::with_journal(config, Arc::new(TracingJournal))
    }

    /// Simulation recording checkpoints into the given journal.
    pub fn with_journal(config: AirliftConfig, journal: Arc<dyn Journal>) -> Self {
        Self { config, journal }
    }

    /// Run the whole shuttle service to completion.
    pub async fn run(self) -> Result<SimulationReport, AirliftError> {
        self.config.validate()?;

        let region = Arc::new(SharedRegion::new(self.config.n_passengers));
        let signals = Arc::new(SignalSet::new());

        let hostess = Hostess::new(
            region.clone(),
            signals.clone(),
            self.journal.clone(),
            &self.config,
        );
        let hostess_task = tokio::spawn(hostess.run());

        let pilot = Pilot::new(
            region.clone(),
            signals.clone(),
            self.journal.clone(),
            &self.config,
        );
        let pilot_task = tokio::spawn(pilot.run());

        let n_passengers = self.config.n_passengers;
        let passenger_tasks: Vec<JoinHandle<Result<(), AirliftError>>> = (0..n_passengers)
            .map(|id| {
                let passenger = Passenger::new(
                    id,
                    region.clone(),
                    signals.clone(),
                    self.journal.clone(),
                    &self.config,
                );
                tokio::spawn(passenger.run())
            })
            .collect();

        for task in passenger_tasks {
            join_role("passenger", task).await?;
        }

        region.finish();
        join_role("pilot", pilot_task).await?;

        signals.close_all();
        join_role("hostess", hostess_task).await?;

        let final_snapshot = region.with(|state| state.snapshot());
        Ok(SimulationReport {
            flights_completed: final_snapshot.flight_number,
            flight_loads: final_snapshot.flight_loads.clone(),
            passenger_status: final_snapshot.passenger_status.clone(),
            final_snapshot,
        })
    }
}

async fn join_role(
    role: &'static str,
    task: JoinHandle<Result<(), AirliftError>>,
) -> Result<(), AirliftError> {
    task.await.map_err(|e| AirliftError::RoleFailed {
        role,
        reason: e.to_string(),
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_zero_capacity() {
        let config = AirliftConfig {
            capacity: 0,
            ..Default::default()
        };
        let err = Simulation::new(config).run().await.unwrap_err();
        assert!(matches!(err, AirliftError::InvalidConfig { .. }));
    }
}
