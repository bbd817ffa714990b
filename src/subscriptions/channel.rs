//! Channel-backed subscriptions.

use crate::manager::PropertyManager;
use crate::types::Changes;
use crossbeam_channel::{bounded, Receiver, TrySendError};
use std::time::Duration;
use tracing::warn;

use super::types::Subscription;

/// A subscription that queues change batches instead of running a callback.
///
/// Batches that arrive while the buffer is full are dropped. Dropping the
/// stream cancels the underlying subscription.
pub struct ChangeStream {
    subscription: Subscription,
    receiver: Receiver<Changes>,
}

impl ChangeStream {
    /// Receive the next batch (blocking).
    pub fn recv(&self) -> Result<Changes, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a batch (non-blocking).
    pub fn try_recv(&self) -> Result<Changes, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Receive with timeout.
    pub fn recv_timeout(
        &self,
        timeout: Duration,
    ) -> Result<Changes, crossbeam_channel::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }

    /// Batches currently buffered.
    pub fn pending(&self) -> usize {
        self.receiver.len()
    }

    pub fn subscription(&self) -> &Subscription {
        &self.subscription
    }
}

impl Drop for ChangeStream {
    fn drop(&mut self) {
        self.subscription.cancel();
    }
}

/// Subscribe to every change batch of `manager` through a bounded channel.
pub fn subscribe_channel(manager: &dyn PropertyManager, buffer_size: usize) -> ChangeStream {
    let (sender, receiver) = bounded(buffer_size);

    let subscription = manager.subscribe(Box::new(move |changes: &Changes| {
        match sender.try_send(changes.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                warn!(keys = dropped.len(), "change stream buffer full, dropping batch");
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }));

    ChangeStream {
        subscription,
        receiver,
    }
}
