//! Error taxonomy.
//!
//! Synchronization failures are fatal for the role that hits them: the
//! signal set is shared infrastructure, and once it is broken no role's
//! safety guarantees hold, so there is no retry path. Invariant
//! violations (over-release, counter underflow, status regression) are
//! programming defects and panic instead of surfacing here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AirliftError {
    /// A semaphore operation could not complete because the signal set
    /// was closed under the role.
    #[error("semaphore operation on `{name}` failed: signal set closed")]
    Synchronization { name: &'static str },

    /// A role task panicked or was cancelled; observed by the
    /// orchestrator when joining it.
    #[error("{role} task failed: {reason}")]
    RoleFailed { role: &'static str, reason: String },

    /// Rejected configuration (zero capacity and the like).
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}
