//! Fuzzing harnesses for the airlift boarding-cycle protocol.
//!
//! These fuzzers operate on an in-memory replica of the shared record,
//! the semaphore counters, and the role state machines, without spawning
//! tasks, to test protocol invariants under arbitrary interleavings.

pub mod cycle_model;
