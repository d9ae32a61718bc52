//! Single-flight coordination for token refreshes.
//!
//! At most one refresh is ever in flight per coordinator. The first caller
//! to hit a 401 becomes the leader and performs the refresh; every caller
//! that arrives while it is outstanding is parked on a oneshot channel and
//! released in FIFO order when the leader completes. Both storefront and
//! dashboard clients share one coordinator by reference, so the invariant
//! holds process-wide, not per client.

use crate::api::error::RefreshFailed;
use secrecy::SecretString;
use std::sync::{Mutex, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

pub type RefreshResult = Result<SecretString, RefreshFailed>;

/// What `begin_refresh` hands back to a caller.
pub enum RefreshTicket {
    /// No refresh was in flight; the caller must perform it and report the
    /// outcome through [`RefreshCoordinator::complete_refresh`].
    Leader,
    /// A refresh is already outstanding; await the receiver for its outcome.
    Follower(oneshot::Receiver<RefreshResult>),
}

#[derive(Debug, Default)]
struct State {
    refreshing: bool,
    followers: Vec<oneshot::Sender<RefreshResult>>,
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<State>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the refresh or join the queue behind the one in flight.
    pub fn begin_refresh(&self) -> RefreshTicket {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        if state.refreshing {
            let (tx, rx) = oneshot::channel();
            state.followers.push(tx);
            debug!(queued = state.followers.len(), "refresh in flight, queueing");
            return RefreshTicket::Follower(rx);
        }

        state.refreshing = true;
        RefreshTicket::Leader
    }

    /// Publish the leader's outcome. The queue is drained in FIFO order and
    /// the in-flight flag is cleared before the lock is released, so no
    /// caller can observe a cleared flag with followers still parked.
    pub fn complete_refresh(&self, result: &RefreshResult) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        for follower in state.followers.drain(..) {
            // A follower may have been dropped by a cancelled caller.
            let _ = follower.send(result.clone());
        }
        state.refreshing = false;
    }

    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .refreshing
    }
}
