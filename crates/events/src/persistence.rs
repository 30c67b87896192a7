//! Durable activity persistence.
//!
//! [`ActivityPersistence`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! and writes every received [`PlatformEvent`] to `activity_events`. It runs
//! as a long-lived background task and exits when the bus is dropped.

use forkful_core::types::DbId;
use forkful_db::repositories::ActivityRepo;
use forkful_db::DbPool;
use tokio::sync::broadcast;

use crate::bus::PlatformEvent;

pub struct ActivityPersistence;

impl ActivityPersistence {
    /// Run the persistence loop until the channel closes.
    pub async fn run(pool: DbPool, mut receiver: broadcast::Receiver<PlatformEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = Self::persist(&pool, &event).await {
                        tracing::error!(
                            error = %e,
                            kind = %event.event.kind,
                            recipe_id = ?event.event.recipe_id,
                            "Failed to persist activity event"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(
                        skipped = n,
                        "Activity persistence lagged, some events were not persisted"
                    );
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, activity persistence shutting down");
                    break;
                }
            }
        }
    }

    async fn persist(pool: &DbPool, event: &PlatformEvent) -> Result<DbId, sqlx::Error> {
        let mut conn = pool.acquire().await?;
        ActivityRepo::insert(&mut conn, &event.event).await
    }
}
