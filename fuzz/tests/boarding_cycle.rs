//! Bolero fuzzer for boarding-cycle interleavings.
//!
//! Properties tested:
//! - Passenger statuses only ever advance, and everyone is delivered
//! - Flight numbers go 1, 2, 3, ... with no skips and no repeats
//! - The pilot releases exactly the recorded load per flight
//! - plane_empty fires exactly once per loaded flight, at the 1 -> 0
//!   transition, and never for an empty flight
//! - The protocol reaches quiescence under every schedule (no deadlock)

use airlift_fuzz::cycle_model::execute_and_verify;
use bolero::check;

fn main() {
    check!()
        .with_type::<(u8, u8, Vec<u8>)>()
        .for_each(|(capacity, n_passengers, schedule)| {
            let capacity = (*capacity as u32 % 4) + 1;
            let n_passengers = *n_passengers as usize % 7;
            execute_and_verify(capacity, n_passengers, schedule);
        });
}
