//! The signal set: every cross-role handshake as a named counting
//! semaphore.
//!
//! All ordering and capacity constraints between roles are expressed as
//! signal/wait pairs on these semaphores; no role ever polls a
//! shared-state field. Signal multiplicity is exact: `signal(n)` wakes at
//! most `n` waiters, ever, so the pilot releasing a load of `k` frees
//! exactly `k` passengers and nobody else.
//!
//! Wakeup order among waiters is whatever the underlying semaphore
//! provides; the protocol only relies on multiplicity, never on order.

use tokio::sync::Semaphore;

use crate::error::AirliftError;

/// A named counting semaphore, initial count 0.
///
/// `wait` is a down (consumes one permit), `signal` an up. Permits are
/// forgotten on acquire so they never flow back on drop.
#[derive(Debug)]
pub struct Sem {
    name: &'static str,
    inner: Semaphore,
}

impl Sem {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Semaphore::new(0),
        }
    }

    /// Down: block until a permit is available and consume it.
    ///
    /// Fails only when the signal set has been closed; per the failure
    /// model that is fatal for the calling role.
    pub async fn wait(&self) -> Result<(), AirliftError> {
        let permit = self
            .inner
            .acquire()
            .await
            .map_err(|_| AirliftError::Synchronization { name: self.name })?;
        permit.forget();
        Ok(())
    }

    /// Up, `n` times.
    pub fn signal(&self, n: usize) {
        self.inner.add_permits(n);
    }

    /// Permits currently available (diagnostics and tests only).
    pub fn available(&self) -> usize {
        self.inner.available_permits()
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    fn close(&self) {
        self.inner.close();
    }
}

/// The fixed set of semaphores shared by all roles.
///
/// | Field | up by | down by |
/// |---|---|---|
/// | `passengers_in_queue` | passenger on arrival | hostess, once per arrival |
/// | `passengers_wait_in_queue` | hostess admitting one | the admitted passenger |
/// | `id_shown` | passenger after recording its id | hostess |
/// | `ready_for_boarding` | pilot, once per cycle | hostess |
/// | `ready_to_flight` | hostess, once per cycle | pilot |
/// | `passengers_wait_in_flight` | pilot, load times | each released passenger, once |
/// | `plane_empty` | last passenger off the plane | pilot |
#[derive(Debug)]
pub struct SignalSet {
    pub passengers_in_queue: Sem,
    pub passengers_wait_in_queue: Sem,
    pub id_shown: Sem,
    pub ready_for_boarding: Sem,
    pub ready_to_flight: Sem,
    pub passengers_wait_in_flight: Sem,
    pub plane_empty: Sem,
}

impl SignalSet {
    pub fn new() -> Self {
        Self {
            passengers_in_queue: Sem::new("passengers_in_queue"),
            passengers_wait_in_queue: Sem::new("passengers_wait_in_queue"),
            id_shown: Sem::new("id_shown"),
            ready_for_boarding: Sem::new("ready_for_boarding"),
            ready_to_flight: Sem::new("ready_to_flight"),
            passengers_wait_in_flight: Sem::new("passengers_wait_in_flight"),
            plane_empty: Sem::new("plane_empty"),
        }
    }

    /// Tear the set down. Every pending and future `wait` resolves to
    /// [`AirliftError::Synchronization`]. The orchestrator calls this
    /// after the pilot has exited so the hostess's wait for the next
    /// boarding round resolves.
    pub fn close_all(&self) {
        self.passengers_in_queue.close();
        self.passengers_wait_in_queue.close();
        self.id_shown.close();
        self.ready_for_boarding.close();
        self.ready_to_flight.close();
        self.passengers_wait_in_flight.close();
        self.plane_empty.close();
    }
}

impl Default for SignalSet {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn signal_multiplicity_is_exact() {
        let sem = Sem::new("test");
        sem.signal(3);

        sem.wait().await.unwrap();
        sem.wait().await.unwrap();
        sem.wait().await.unwrap();
        assert_eq!(sem.available(), 0);

        // A fourth waiter would block: nothing left to consume.
        let pending = tokio::time::timeout(std::time::Duration::from_millis(20), sem.wait()).await;
        assert!(pending.is_err(), "wait consumed a permit that was never signaled");
    }

    #[tokio::test]
    async fn permits_are_not_returned_on_drop() {
        let sem = Sem::new("test");
        sem.signal(1);
        sem.wait().await.unwrap();
        drop(sem.inner.try_acquire());
        assert_eq!(sem.available(), 0);
    }

    #[tokio::test]
    async fn close_fails_pending_waits() {
        let set = std::sync::Arc::new(SignalSet::new());

        let waiter = tokio::spawn({
            let set = set.clone();
            async move { set.ready_for_boarding.wait().await }
        });

        // Let the waiter park first.
        tokio::task::yield_now().await;
        set.close_all();

        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(
            err,
            AirliftError::Synchronization { name: "ready_for_boarding" }
        ));
    }
}
