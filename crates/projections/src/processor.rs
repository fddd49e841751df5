//! Delivery of stored events to registered projections.

use event_store::{EventEnvelope, EventId, EventStore};
use futures_util::StreamExt;
use tokio::sync::Mutex;

use crate::projection::Projection;
use crate::{ProjectionError, Result};

/// Feeds the event log of a store to a set of projections.
///
/// Each projection reports how much of the log it has seen, so
/// [`run_catch_up`](Self::run_catch_up) can be called after every write and
/// only hands over the new tail. Deliveries are serialized; two concurrent
/// catch-ups never hand the same event to a projection twice.
pub struct ProjectionProcessor<S: EventStore> {
    store: S,
    projections: Vec<Box<dyn Projection>>,
    delivery: Mutex<()>,
}

impl<S: EventStore> ProjectionProcessor<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            projections: Vec::new(),
            delivery: Mutex::new(()),
        }
    }

    /// Adds a projection. It starts receiving events on the next catch-up.
    pub fn register(&mut self, projection: Box<dyn Projection>) {
        tracing::debug!(projection = projection.name(), "projection registered");
        self.projections.push(projection);
    }

    /// Names of the registered projections, in registration order.
    pub fn projection_names(&self) -> Vec<&'static str> {
        self.projections.iter().map(|p| p.name()).collect()
    }

    /// Streams the whole log and hands every event a projection has not yet
    /// seen to that projection.
    ///
    /// Returns the number of (event, projection) deliveries made.
    #[tracing::instrument(skip(self))]
    pub async fn run_catch_up(&self) -> Result<u64> {
        let _delivery = self.delivery.lock().await;
        let (delivered, _) = self.deliver_through(None).await?;
        Ok(delivered)
    }

    /// Brings every projection up to and including `event`.
    ///
    /// Positions are log indexes, so earlier events a projection has not seen
    /// are delivered first and an event already seen is not delivered again.
    /// Fails with [`ProjectionError::UnknownEvent`] if `event` was never
    /// appended to the store.
    #[tracing::instrument(skip(self, event), fields(event_type = %event.event_type))]
    pub async fn process_event(&self, event: &EventEnvelope) -> Result<u64> {
        let _delivery = self.delivery.lock().await;
        match self.deliver_through(Some(event.event_id)).await? {
            (delivered, true) => Ok(delivered),
            (_, false) => Err(ProjectionError::UnknownEvent(event.event_id)),
        }
    }

    /// Walks the log from the start, stopping after `stop_at` if given.
    ///
    /// Callers hold the delivery lock. Returns the delivery count and whether
    /// `stop_at` was reached.
    async fn deliver_through(&self, stop_at: Option<EventId>) -> Result<(u64, bool)> {
        let mut stream = self.store.stream_all_events().await?;
        let mut log_index: u64 = 0;
        let mut delivered: u64 = 0;
        let mut reached = false;

        while let Some(envelope) = stream.next().await {
            let envelope = envelope?;
            log_index += 1;

            for projection in &self.projections {
                if projection.position().await.has_seen(log_index) {
                    continue;
                }
                projection.handle(&envelope).await?;
                delivered += 1;
            }

            if stop_at == Some(envelope.event_id) {
                reached = true;
                break;
            }
        }

        if delivered > 0 {
            metrics::counter!("projections_events_processed").increment(delivered);
        }
        tracing::debug!(log_index, delivered, "projections caught up");

        Ok((delivered, reached))
    }

    /// Clears every projection and replays the full log into it.
    #[tracing::instrument(skip(self))]
    pub async fn rebuild_all(&self) -> Result<u64> {
        for projection in &self.projections {
            projection.reset().await?;
            tracing::info!(projection = projection.name(), "projection reset");
        }
        self.run_catch_up().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::ProjectionPosition;
    use async_trait::async_trait;
    use common::AggregateId;
    use event_store::{AppendOptions, InMemoryEventStore, Version};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// A simple counting projection for testing.
    struct CountingProjection {
        count: Arc<RwLock<u64>>,
        position: Arc<RwLock<ProjectionPosition>>,
    }

    impl CountingProjection {
        fn new() -> Self {
            Self {
                count: Arc::new(RwLock::new(0)),
                position: Arc::new(RwLock::new(ProjectionPosition::zero())),
            }
        }
    }

    #[async_trait]
    impl Projection for CountingProjection {
        fn name(&self) -> &'static str {
            "CountingProjection"
        }

        async fn handle(&self, _event: &EventEnvelope) -> Result<()> {
            *self.count.write().await += 1;
            let mut pos = self.position.write().await;
            *pos = pos.advance();
            Ok(())
        }

        async fn position(&self) -> ProjectionPosition {
            *self.position.read().await
        }

        async fn reset(&self) -> Result<()> {
            *self.count.write().await = 0;
            *self.position.write().await = ProjectionPosition::zero();
            Ok(())
        }
    }

    fn test_event(aggregate_id: u64, version: u64) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(AggregateId::new(aggregate_id))
            .aggregate_type("Order")
            .event_type("TestEvent")
            .version(Version::new(version))
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    async fn store_with_events(count: u64) -> InMemoryEventStore {
        let store = InMemoryEventStore::new();
        if count > 0 {
            let events = (1..=count).map(|v| test_event(1, v)).collect();
            store.append(events, AppendOptions::new()).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn catch_up_processes_all_events() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store_with_events(3).await);
        processor.register(Box::new(projection));
        processor.run_catch_up().await.unwrap();

        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn process_single_event() {
        let store = store_with_events(1).await;
        let first = store
            .stream_all_events()
            .await
            .unwrap()
            .next()
            .await
            .unwrap()
            .unwrap();
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        assert_eq!(processor.process_event(&first).await.unwrap(), 1);
        assert_eq!(processor.process_event(&first).await.unwrap(), 0);
        assert_eq!(*count_ref.read().await, 1);
    }

    #[tokio::test]
    async fn process_event_delivers_earlier_unseen_events_first() {
        let store = store_with_events(3).await;
        let events = store
            .get_events_for_aggregate(AggregateId::new(1))
            .await
            .unwrap();
        let second = events[1].clone();
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let pos_ref = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(projection));

        assert_eq!(processor.process_event(&second).await.unwrap(), 2);
        assert_eq!(pos_ref.read().await.events_processed, 2);

        assert_eq!(processor.run_catch_up().await.unwrap(), 1);
        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn process_event_rejects_envelopes_not_in_the_log() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store_with_events(1).await);
        processor.register(Box::new(projection));

        let stray = test_event(9, 1);
        let result = processor.process_event(&stray).await;
        assert!(matches!(
            result,
            Err(ProjectionError::UnknownEvent(id)) if id == stray.event_id
        ));
        // Walking the log still caught the projection up.
        assert_eq!(*count_ref.read().await, 1);
    }

    #[tokio::test]
    async fn rebuild_resets_and_replays() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);
        let pos_ref = Arc::clone(&projection.position);

        let mut processor = ProjectionProcessor::new(store_with_events(2).await);
        processor.register(Box::new(projection));

        processor.run_catch_up().await.unwrap();
        assert_eq!(*count_ref.read().await, 2);

        assert_eq!(processor.rebuild_all().await.unwrap(), 2);
        assert_eq!(*count_ref.read().await, 2);
        assert_eq!(pos_ref.read().await.events_processed, 2);
    }

    #[tokio::test]
    async fn second_catch_up_delivers_nothing() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store_with_events(3).await);
        processor.register(Box::new(projection));

        assert_eq!(processor.run_catch_up().await.unwrap(), 3);
        assert_eq!(processor.run_catch_up().await.unwrap(), 0);
        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn catch_up_delivers_only_new_tail() {
        let store = store_with_events(2).await;
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(store.clone());
        processor.register(Box::new(projection));
        processor.run_catch_up().await.unwrap();

        store
            .append(vec![test_event(2, 1)], AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(processor.run_catch_up().await.unwrap(), 1);

        assert_eq!(*count_ref.read().await, 3);
    }

    #[tokio::test]
    async fn empty_store_catch_up() {
        let projection = CountingProjection::new();
        let count_ref = Arc::clone(&projection.count);

        let mut processor = ProjectionProcessor::new(InMemoryEventStore::new());
        processor.register(Box::new(projection));
        processor.run_catch_up().await.unwrap();

        assert_eq!(*count_ref.read().await, 0);
    }

    #[tokio::test]
    async fn multiple_projections() {
        let proj1 = CountingProjection::new();
        let proj2 = CountingProjection::new();
        let count1 = Arc::clone(&proj1.count);
        let count2 = Arc::clone(&proj2.count);

        let mut processor = ProjectionProcessor::new(store_with_events(2).await);
        processor.register(Box::new(proj1));
        processor.register(Box::new(proj2));
        assert_eq!(
            processor.projection_names(),
            vec!["CountingProjection", "CountingProjection"]
        );

        assert_eq!(processor.run_catch_up().await.unwrap(), 4);

        assert_eq!(*count1.read().await, 2);
        assert_eq!(*count2.read().await, 2);
    }
}
