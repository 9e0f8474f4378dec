//! airlift-testkit: shared scenario suite for the shuttle protocol.
//!
//! Provides `run_*` scenarios that spin up a full simulation with an
//! in-memory journal and assert the protocol's observable properties:
//! conservation of passengers across flights, capacity bounds, journal
//! ordering, and deterministic delivery aggregates.
//!
//! # Usage
//!
//! ```ignore
//! #[tokio::test]
//! async fn five_passengers_capacity_two() {
//!     airlift_testkit::run_capacity_scenario(2, 5).await;
//! }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use airlift::{
    AirliftConfig, AirliftError, Checkpoint, Hostess, MemoryJournal, PassengerId, PassengerStatus,
    Pilot, SharedRegion, SignalSet, Simulation, SimulationReport,
};

/// Ceiling on any single scenario; a scenario that runs longer is
/// considered deadlocked.
pub const SCENARIO_DEADLINE: Duration = Duration::from_secs(30);

/// Error type for scenario runs.
#[derive(Debug)]
pub enum TestError {
    /// Simulation setup or shutdown failed.
    Setup(String),
    /// A role returned a protocol error.
    Sim(AirliftError),
    /// A property did not hold.
    Assertion(String),
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TestError::Setup(msg) => write!(f, "setup error: {}", msg),
            TestError::Sim(e) => write!(f, "simulation error: {}", e),
            TestError::Assertion(msg) => write!(f, "assertion failed: {}", msg),
        }
    }
}

impl std::error::Error for TestError {}

impl From<AirliftError> for TestError {
    fn from(e: AirliftError) -> Self {
        TestError::Sim(e)
    }
}

/// Outcome of one scenario run: the report plus the journal it recorded.
pub struct ScenarioRun {
    pub report: SimulationReport,
    pub journal: Arc<MemoryJournal>,
}

/// Run one simulation under the scenario deadline with a memory journal.
pub async fn run_scenario(config: AirliftConfig) -> Result<ScenarioRun, TestError> {
    let journal = Arc::new(MemoryJournal::new());
    let sim = Simulation::with_journal(config, journal.clone());

    let report = tokio::time::timeout(SCENARIO_DEADLINE, sim.run())
        .await
        .map_err(|_| TestError::Setup("simulation deadlocked (deadline exceeded)".into()))??;

    Ok(ScenarioRun { report, journal })
}

/// Tight scenario config: short travel/flight times, fixed seed.
pub fn scenario_config(capacity: u32, n_passengers: usize) -> AirliftConfig {
    AirliftConfig {
        n_passengers,
        capacity,
        max_travel: Duration::from_millis(20),
        max_flight: Duration::from_millis(5),
        seed: 0x5EED,
    }
}

// ============================================================================
// Scenarios
// ============================================================================

/// Full delivery scenario: `n_passengers` through a plane of `capacity`.
///
/// Asserts conservation (every passenger delivered exactly once), the
/// capacity bound, the expected number of loaded flights, and journal
/// ordering per flight.
pub async fn run_capacity_scenario(capacity: u32, n_passengers: usize) {
    if let Err(e) = run_capacity_scenario_inner(capacity, n_passengers).await {
        panic!("run_capacity_scenario({capacity}, {n_passengers}) failed: {e}");
    }
}

async fn run_capacity_scenario_inner(
    capacity: u32,
    n_passengers: usize,
) -> Result<(), TestError> {
    let run = run_scenario(scenario_config(capacity, n_passengers)).await?;
    assert_delivery(&run, capacity, n_passengers)?;
    verify_journal_ordering(&run.journal)?;
    Ok(())
}

/// Boundary scenario: no passengers ever arrive. The pilot must cycle
/// through empty boarding rounds without deadlocking and shut down
/// cleanly once the flag is set.
///
/// Drives the roles directly (without the orchestrator) so at least two
/// empty rounds demonstrably complete before termination.
pub async fn run_empty_rounds_scenario() {
    if let Err(e) = run_empty_rounds_inner().await {
        panic!("run_empty_rounds_scenario failed: {e}");
    }
}

async fn run_empty_rounds_inner() -> Result<(), TestError> {
    let config = scenario_config(2, 0);
    let journal = Arc::new(MemoryJournal::new());
    let region = Arc::new(SharedRegion::new(0));
    let signals = Arc::new(SignalSet::new());

    let hostess = Hostess::new(region.clone(), signals.clone(), journal.clone(), &config);
    let hostess_task = tokio::spawn(hostess.run());
    let pilot = Pilot::new(region.clone(), signals.clone(), journal.clone(), &config);
    let pilot_task = tokio::spawn(pilot.run());

    // Let at least two empty rounds complete before announcing shutdown.
    let waited = tokio::time::timeout(SCENARIO_DEADLINE, async {
        loop {
            if region.with(|state| state.flight_number()) >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    })
    .await;
    if waited.is_err() {
        return Err(TestError::Assertion(
            "pilot never completed two empty boarding rounds".into(),
        ));
    }

    region.finish();
    join(pilot_task).await?;
    signals.close_all();
    join(hostess_task).await?;

    let snapshot = region.with(|state| state.snapshot());
    if snapshot.flight_loads.iter().any(|&load| load != 0) {
        return Err(TestError::Assertion(format!(
            "empty scenario recorded a non-zero load: {:?}",
            snapshot.flight_loads
        )));
    }
    if snapshot.flight_loads.len() != snapshot.flight_number as usize {
        return Err(TestError::Assertion(format!(
            "{} flights opened but {} loads recorded",
            snapshot.flight_number,
            snapshot.flight_loads.len()
        )));
    }
    Ok(())
}

/// Boundary scenario: exactly one passenger, capacity larger than one.
/// The plane-empty handoff fires on the very first disembarkation.
pub async fn run_single_passenger_scenario() {
    if let Err(e) = run_single_passenger_inner().await {
        panic!("run_single_passenger_scenario failed: {e}");
    }
}

async fn run_single_passenger_inner() -> Result<(), TestError> {
    let run = run_scenario(scenario_config(3, 1)).await?;
    assert_delivery(&run, 3, 1)?;

    let loaded: Vec<u32> = run
        .report
        .flight_loads
        .iter()
        .copied()
        .filter(|&load| load > 0)
        .collect();
    if loaded != [1] {
        return Err(TestError::Assertion(format!(
            "expected exactly one flight with load 1, got loads {:?}",
            run.report.flight_loads
        )));
    }
    verify_journal_ordering(&run.journal)?;
    Ok(())
}

/// Re-running a scenario yields the same delivery aggregates even though
/// interleavings differ.
pub async fn run_idempotent_aggregates(capacity: u32, n_passengers: usize) {
    if let Err(e) = run_idempotent_inner(capacity, n_passengers).await {
        panic!("run_idempotent_aggregates({capacity}, {n_passengers}) failed: {e}");
    }
}

async fn run_idempotent_inner(capacity: u32, n_passengers: usize) -> Result<(), TestError> {
    let first = run_scenario(scenario_config(capacity, n_passengers)).await?;
    let second = run_scenario(scenario_config(capacity, n_passengers)).await?;

    let a = delivery_aggregates(&first.report);
    let b = delivery_aggregates(&second.report);
    if a != b {
        return Err(TestError::Assertion(format!(
            "delivery aggregates differ across runs: {a:?} vs {b:?}"
        )));
    }
    Ok(())
}

// ============================================================================
// Property helpers
// ============================================================================

/// Loaded flights and their loads, trailing empty rounds excluded.
///
/// The pilot may squeeze in an extra empty cycle between the last
/// delivery and its observation of the termination flag; delivery
/// aggregates are invariant to those.
pub fn delivery_aggregates(report: &SimulationReport) -> (usize, Vec<u32>, u32) {
    let loaded: Vec<u32> = report
        .flight_loads
        .iter()
        .copied()
        .filter(|&load| load > 0)
        .collect();
    (loaded.len(), loaded.clone(), loaded.iter().sum())
}

/// Core delivery assertions shared by the scenarios.
fn assert_delivery(
    run: &ScenarioRun,
    capacity: u32,
    n_passengers: usize,
) -> Result<(), TestError> {
    let report = &run.report;

    // Everyone got there, exactly once.
    let delivered = report
        .passenger_status
        .iter()
        .filter(|&&s| s == PassengerStatus::AtDestination)
        .count();
    if delivered != n_passengers {
        return Err(TestError::Assertion(format!(
            "{delivered}/{n_passengers} passengers at destination: {:?}",
            report.passenger_status
        )));
    }

    // Conservation and capacity bound on recorded loads.
    let total: u32 = report.flight_loads.iter().sum();
    if total != n_passengers as u32 {
        return Err(TestError::Assertion(format!(
            "loads {:?} sum to {total}, expected {n_passengers}",
            report.flight_loads
        )));
    }
    if let Some(&over) = report.flight_loads.iter().find(|&&load| load > capacity) {
        return Err(TestError::Assertion(format!(
            "flight load {over} exceeds capacity {capacity}"
        )));
    }

    // The hostess holds boarding open while passengers are still expected,
    // so loaded flights are full except possibly the last.
    let (loaded_flights, loaded, _) = delivery_aggregates(report);
    let expected_flights = n_passengers.div_ceil(capacity as usize);
    if loaded_flights != expected_flights {
        return Err(TestError::Assertion(format!(
            "expected {expected_flights} loaded flights, got {loaded_flights}: {loaded:?}"
        )));
    }
    for (i, &load) in loaded.iter().enumerate() {
        let expected = if i + 1 < loaded_flights {
            capacity
        } else {
            n_passengers as u32 - capacity * (loaded_flights as u32 - 1)
        };
        if load != expected {
            return Err(TestError::Assertion(format!(
                "flight {} load {load}, expected {expected} (loads {loaded:?})",
                i + 1
            )));
        }
    }

    // Every passenger id checked in exactly once, and never on two flights.
    let manifest = manifest_by_flight(&run.journal);
    let mut seen: Vec<PassengerId> = manifest.values().flatten().copied().collect();
    seen.sort_unstable();
    let expected_ids: Vec<PassengerId> = (0..n_passengers).collect();
    if seen != expected_ids {
        return Err(TestError::Assertion(format!(
            "check-in manifest {manifest:?} does not cover each id exactly once"
        )));
    }

    Ok(())
}

/// Group checked-in passenger ids by the flight they boarded.
pub fn manifest_by_flight(journal: &MemoryJournal) -> BTreeMap<u32, Vec<PassengerId>> {
    let mut manifest: BTreeMap<u32, Vec<PassengerId>> = BTreeMap::new();
    for entry in journal.entries() {
        if let Checkpoint::PassengerChecked(id) = entry.checkpoint {
            manifest
                .entry(entry.snapshot.flight_number)
                .or_default()
                .push(id);
        }
    }
    manifest
}

/// Per-flight event ordering: boarding start, then that flight's
/// check-ins, then arrival, then the return leg.
pub fn verify_journal_ordering(journal: &MemoryJournal) -> Result<(), TestError> {
    let entries = journal.entries();

    let position = |checkpoint: Checkpoint| -> Option<usize> {
        entries.iter().position(|e| e.checkpoint == checkpoint)
    };

    let flights: Vec<u32> = entries
        .iter()
        .filter_map(|e| match e.checkpoint {
            Checkpoint::BoardingStarted(n) => Some(n),
            _ => None,
        })
        .collect();

    // Flight numbers must be 1, 2, 3, ... with no skips or repeats.
    for (i, &flight) in flights.iter().enumerate() {
        if flight != i as u32 + 1 {
            return Err(TestError::Assertion(format!(
                "boarding starts out of sequence: {flights:?}"
            )));
        }
    }

    for &flight in &flights {
        let started = position(Checkpoint::BoardingStarted(flight))
            .ok_or_else(|| TestError::Assertion(format!("no boarding start for {flight}")))?;
        let arrived = position(Checkpoint::FlightArrived(flight));
        let returned = position(Checkpoint::FlightReturning(flight));

        if let (Some(arrived), Some(returned)) = (arrived, returned) {
            if !(started < arrived && arrived < returned) {
                return Err(TestError::Assertion(format!(
                    "flight {flight} events out of order: start={started}, arrived={arrived}, returned={returned}"
                )));
            }
            for (i, entry) in entries.iter().enumerate() {
                if let Checkpoint::PassengerChecked(id) = entry.checkpoint {
                    if entry.snapshot.flight_number == flight && !(started < i && i < arrived) {
                        return Err(TestError::Assertion(format!(
                            "passenger {id} checked in outside flight {flight}'s boarding window"
                        )));
                    }
                }
            }
        }
    }

    Ok(())
}

async fn join(
    task: tokio::task::JoinHandle<Result<(), AirliftError>>,
) -> Result<(), TestError> {
    task.await
        .map_err(|e| TestError::Setup(format!("role task panicked: {e}")))?
        .map_err(TestError::Sim)
}
