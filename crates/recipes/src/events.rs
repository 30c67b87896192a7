//! Post-commit event dispatch.
//!
//! Operations stage [`DomainEvent`]s in an [`EventQueue`] while the
//! transaction is open. The queue is dispatched only after a successful
//! commit and dropped on rollback, so nothing is emitted for work that
//! never happened and nothing committed is lost to a failed emit.

use forkful_core::activity::DomainEvent;
use forkful_events::EventBus;

/// Receiver of committed domain events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &DomainEvent) -> anyhow::Result<()>;
}

impl EventSink for EventBus {
    fn emit(&self, event: &DomainEvent) -> anyhow::Result<()> {
        let receivers = self.publish(event.clone().into());
        if receivers == 0 {
            tracing::debug!(kind = %event.kind, "No event bus subscribers");
        }
        Ok(())
    }
}

/// Events staged by the current transaction.
#[derive(Debug, Default)]
pub struct EventQueue {
    staged: Vec<DomainEvent>,
}

impl EventQueue {
    pub fn stage(&mut self, event: DomainEvent) {
        self.staged.push(event);
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    pub fn staged(&self) -> &[DomainEvent] {
        &self.staged
    }

    /// Hand every staged event to `sink`. Failures are logged, never retried.
    ///
    /// Returns how many events were delivered.
    pub fn dispatch(self, sink: &dyn EventSink) -> usize {
        let mut delivered = 0;
        for event in self.staged {
            match sink.emit(&event) {
                Ok(()) => delivered += 1,
                Err(e) => tracing::warn!(
                    error = %e,
                    kind = %event.kind,
                    recipe_id = ?event.recipe_id,
                    community_id = ?event.community_id,
                    "Failed to emit domain event"
                ),
            }
        }
        delivered
    }
}
