//! airlift: fixed-capacity shuttle coordination between an origin and a
//! target, shared by many passengers, one pilot, and one hostess.
//!
//! The load-bearing abstraction is the [`SignalSet`]: every cross-role
//! handshake — queue admission, boarding start and close, release and
//! disembark — is an up/down pair on one of its counting semaphores. The
//! shared record itself is only reachable through the scoped critical
//! section of a [`SharedRegion`], so no role can observe a torn update or
//! leak the lock on an error path.
//!
//! # Quick start
//!
//! ```no_run
//! use airlift::{AirliftConfig, Simulation};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), airlift::AirliftError> {
//!     let report = Simulation::new(AirliftConfig {
//!         n_passengers: 5,
//!         capacity: 2,
//!         ..Default::default()
//!     })
//!     .run()
//!     .await?;
//!
//!     println!("{} flights, loads {:?}", report.flights_completed, report.flight_loads);
//!     Ok(())
//! }
//! ```
//!
//! # Protocol shape
//!
//! ```text
//! passenger             hostess                 pilot
//! ---------             -------                 -----
//!                                    <----  ready_for_boarding
//! passengers_in_queue ---->
//!       <---- passengers_wait_in_queue
//! id_shown ---->
//!                       ready_to_flight  ---->
//!       <---------------------------  passengers_wait_in_flight (x load)
//! plane_empty (last one off) ------------------->
//! ```
//!
//! Roles run as tokio tasks; a [`Simulation`] wires them together and
//! shepherds shutdown. Every state-affecting step records a checkpointed
//! snapshot through a [`Journal`].

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod hostess;
pub mod journal;
pub mod passenger;
pub mod pilot;
pub mod region;
pub mod sim;
pub mod state;
pub mod sync;

pub use config::AirliftConfig;
pub use error::AirliftError;
pub use hostess::Hostess;
pub use journal::{
    Checkpoint, Journal, JournalEntry, JsonLinesJournal, MemoryJournal, TracingJournal,
};
pub use passenger::Passenger;
pub use pilot::Pilot;
pub use region::SharedRegion;
pub use sim::{Simulation, SimulationReport};
pub use state::{
    HostessStatus, PassengerId, PassengerStatus, PilotStatus, SharedState, StateSnapshot,
};
pub use sync::{Sem, SignalSet};
