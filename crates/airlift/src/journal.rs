//! State persistence: checkpointed snapshots of the shared record.
//!
//! Every state-affecting mutation is followed by a `record` call made
//! *outside* the critical section, on a snapshot cloned under the lock.
//! Journals are fire-and-forget from the protocol's perspective: a slow
//! or failing writer logs a warning and the protocol proceeds.

use std::io::Write;

use parking_lot::Mutex;
use serde::Serialize;

use crate::state::{PassengerId, StateSnapshot};

/// Why a snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Checkpoint {
    /// Routine snapshot after a state change.
    State,
    /// The hostess-side handoff just completed for this passenger.
    PassengerChecked(PassengerId),
    /// The pilot opened boarding for this flight.
    BoardingStarted(u32),
    /// The loaded plane reached the target.
    FlightArrived(u32),
    /// The emptied plane is heading back to the origin.
    FlightReturning(u32),
}

/// Sink for checkpointed snapshots.
pub trait Journal: Send + Sync {
    fn record(&self, checkpoint: Checkpoint, snapshot: &StateSnapshot);
}

/// Journal that emits structured tracing events. Default for simulations
/// that only want logs.
#[derive(Debug, Default)]
pub struct TracingJournal;

impl Journal for TracingJournal {
    fn record(&self, checkpoint: Checkpoint, snapshot: &StateSnapshot) {
        tracing::info!(
            ?checkpoint,
            flight = snapshot.flight_number,
            in_queue = snapshot.passengers_in_queue,
            aboard = snapshot.passengers_aboard,
            pilot = ?snapshot.pilot_status,
            hostess = ?snapshot.hostess_status,
            "checkpoint"
        );
    }
}

/// One recorded checkpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalEntry {
    pub checkpoint: Checkpoint,
    pub snapshot: StateSnapshot,
}

/// Journal that keeps every entry in order, in memory. The testkit and
/// the scenario assertions read flight manifests out of it.
#[derive(Debug, Default)]
pub struct MemoryJournal {
    entries: Mutex<Vec<JournalEntry>>,
}

impl MemoryJournal {
    pub fn new() -> Self {
        Self::default()
    }

    /// All entries recorded so far, in recording order.
    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().clone()
    }

    /// Entries matching a predicate on the checkpoint.
    pub fn filtered(&self, pred: impl Fn(&Checkpoint) -> bool) -> Vec<JournalEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|e| pred(&e.checkpoint))
            .cloned()
            .collect()
    }
}

impl Journal for MemoryJournal {
    fn record(&self, checkpoint: Checkpoint, snapshot: &StateSnapshot) {
        self.entries.lock().push(JournalEntry {
            checkpoint,
            snapshot: snapshot.clone(),
        });
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    checkpoint: Checkpoint,
    snapshot: &'a StateSnapshot,
}

/// Journal that writes one JSON object per checkpoint to any writer.
///
/// Write errors are reported through tracing and otherwise swallowed;
/// persistence must never stall or kill the protocol.
pub struct JsonLinesJournal<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesJournal<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Flush and hand the writer back.
    pub fn into_inner(self) -> W {
        let mut writer = self.writer.into_inner();
        let _ = writer.flush();
        writer
    }
}

impl<W: Write + Send> Journal for JsonLinesJournal<W> {
    fn record(&self, checkpoint: Checkpoint, snapshot: &StateSnapshot) {
        let record = JsonRecord { checkpoint, snapshot };
        let mut writer = self.writer.lock();
        let result = serde_json::to_writer(&mut *writer, &record)
            .map_err(std::io::Error::from)
            .and_then(|()| writer.write_all(b"\n"));
        if let Err(e) = result {
            tracing::warn!(?checkpoint, error = %e, "journal write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SharedState;

    #[test]
    fn memory_journal_preserves_order() {
        let journal = MemoryJournal::new();
        let snap = SharedState::new(1).snapshot();

        journal.record(Checkpoint::BoardingStarted(1), &snap);
        journal.record(Checkpoint::PassengerChecked(0), &snap);
        journal.record(Checkpoint::FlightArrived(1), &snap);

        let entries = journal.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].checkpoint, Checkpoint::BoardingStarted(1));
        assert_eq!(entries[2].checkpoint, Checkpoint::FlightArrived(1));
    }

    #[test]
    fn json_lines_journal_writes_one_object_per_record() {
        let journal = JsonLinesJournal::new(Vec::new());
        let snap = SharedState::new(2).snapshot();

        journal.record(Checkpoint::State, &snap);
        journal.record(Checkpoint::PassengerChecked(1), &snap);

        let buf = journal.into_inner();
        let lines: Vec<&str> = std::str::from_utf8(&buf).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("checkpoint").is_some());
            assert_eq!(value["snapshot"]["flight_number"], 0);
        }
    }
}
