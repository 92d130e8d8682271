//! Pending identifier tokens
//!
//! The system under test assigns identifiers asynchronously. A `PendingId`
//! is the explicit pending/resolved token handed out at creation time;
//! consumers must `wait` on it before using the value.

use crate::error::ModelError;
use tokio::sync::oneshot;

/// Producer half, held by whoever learns the identifier
#[derive(Debug)]
pub struct IdResolver<T> {
    sender: oneshot::Sender<T>,
}

impl<T> IdResolver<T> {
    /// Deliver the identifier
    ///
    /// Returns `false` when the pending token was already dropped.
    pub fn resolve(self, value: T) -> bool {
        self.sender.send(value).is_ok()
    }
}

#[derive(Debug)]
enum Slot<T> {
    Pending(oneshot::Receiver<T>),
    Resolved(T),
    Abandoned,
}

/// Identifier that may not be known yet
#[derive(Debug)]
pub struct PendingId<T> {
    label: String,
    slot: Slot<T>,
}

impl<T> PendingId<T> {
    /// Create a pending token and its resolver
    #[must_use]
    pub fn channel(label: impl Into<String>) -> (IdResolver<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        let pending = Self {
            label: label.into(),
            slot: Slot::Pending(receiver),
        };
        (IdResolver { sender }, pending)
    }

    /// Token that is resolved from the start
    #[must_use]
    pub fn resolved(label: impl Into<String>, value: T) -> Self {
        Self {
            label: label.into(),
            slot: Slot::Resolved(value),
        }
    }

    /// Label used in error messages
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the value is available without waiting
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        matches!(self.slot, Slot::Resolved(_))
    }

    /// Read the value, failing if resolution has not been observed yet
    ///
    /// # Errors
    /// `ModelError::UnresolvedReference` while pending or after the
    /// resolver was dropped without delivering.
    pub fn get(&self) -> Result<&T, ModelError> {
        match &self.slot {
            Slot::Resolved(value) => Ok(value),
            Slot::Pending(_) => Err(ModelError::UnresolvedReference(format!(
                "{} is still pending",
                self.label
            ))),
            Slot::Abandoned => Err(ModelError::UnresolvedReference(format!(
                "{} was never resolved",
                self.label
            ))),
        }
    }

    /// Suspend until the identifier is delivered
    ///
    /// # Errors
    /// `ModelError::UnresolvedReference` if the resolver is dropped.
    pub async fn wait(&mut self) -> Result<&T, ModelError> {
        if let Slot::Pending(receiver) = &mut self.slot {
            let outcome = receiver.await;
            self.slot = match outcome {
                Ok(value) => Slot::Resolved(value),
                Err(_) => Slot::Abandoned,
            };
        }
        self.get()
    }
}

impl<T: Clone> PendingId<T> {
    /// Wait and clone the value out
    ///
    /// # Errors
    /// See [`PendingId::wait`].
    pub async fn wait_cloned(&mut self) -> Result<T, ModelError> {
        self.wait().await.cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ExplorationId;

    #[tokio::test]
    async fn get_before_resolution_is_rejected() {
        let (resolver, mut pending) = PendingId::<ExplorationId>::channel("First Exploration");
        assert!(matches!(
            pending.get(),
            Err(ModelError::UnresolvedReference(_))
        ));

        tokio::spawn(async move {
            tokio::task::yield_now().await;
            resolver.resolve(ExplorationId::new("exp-1"));
        });

        let id = pending.wait_cloned().await.unwrap();
        assert_eq!(id, ExplorationId::new("exp-1"));
        assert!(pending.is_resolved());
        assert_eq!(pending.get().unwrap(), &id);
    }

    #[tokio::test]
    async fn dropped_resolver_abandons_token() {
        let (resolver, mut pending) = PendingId::<ExplorationId>::channel("Lost");
        drop(resolver);

        let err = pending.wait().await.unwrap_err();
        assert!(err.to_string().contains("never resolved"));
    }

    #[test]
    fn resolved_token_reads_immediately() {
        let pending = PendingId::resolved("known", 7_u32);
        assert_eq!(*pending.get().unwrap(), 7);
        assert_eq!(pending.label(), "known");
    }
}
