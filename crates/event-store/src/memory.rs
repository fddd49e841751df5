use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventEnvelope, EventStoreError, Result, Version,
    store::{AppendOptions, EventStore, EventStream, validate_events_for_append},
};

/// In-memory event store.
///
/// Events are kept in a single append-only vector in insertion order.
/// Clones share the same log, so a store can be handed to several services.
#[derive(Clone, Default)]
pub struct InMemoryEventStore {
    events: Arc<RwLock<Vec<EventEnvelope>>>,
}

impl InMemoryEventStore {
    /// Creates a new empty in-memory event store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of events stored.
    pub async fn event_count(&self) -> usize {
        self.events.read().await.len()
    }
}

fn current_version(store: &[EventEnvelope], aggregate_id: AggregateId) -> Version {
    store
        .iter()
        .filter(|e| e.aggregate_id == aggregate_id)
        .map(|e| e.version)
        .max()
        .unwrap_or(Version::initial())
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    #[tracing::instrument(skip(self, events), fields(count = events.len()))]
    async fn append(&self, events: Vec<EventEnvelope>, options: AppendOptions) -> Result<Version> {
        validate_events_for_append(&events)?;

        let aggregate_id = events[0].aggregate_id;
        let first_new_version = events[0].version;

        let mut store = self.events.write().await;
        let current = current_version(&store, aggregate_id);

        if let Some(expected) = options.expected_version
            && current != expected
        {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected,
                actual: current,
            });
        }

        if first_new_version != current.next() {
            return Err(EventStoreError::ConcurrencyConflict {
                aggregate_id,
                expected: options.expected_version.unwrap_or(current),
                actual: current,
            });
        }

        let last_version = events
            .last()
            .map(|e| e.version)
            .unwrap_or(Version::initial());
        metrics::counter!("event_store_events_appended_total").increment(events.len() as u64);
        store.extend(events);

        Ok(last_version)
    }

    async fn get_events_for_aggregate(
        &self,
        aggregate_id: AggregateId,
    ) -> Result<Vec<EventEnvelope>> {
        let store = self.events.read().await;
        let mut events: Vec<_> = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .cloned()
            .collect();
        events.sort_by_key(|e| e.version);
        Ok(events)
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        let events = self.events.read().await.clone();
        let stream = stream::iter(events.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn get_aggregate_version(&self, aggregate_id: AggregateId) -> Result<Option<Version>> {
        let store = self.events.read().await;
        let version = store
            .iter()
            .filter(|e| e.aggregate_id == aggregate_id)
            .map(|e| e.version)
            .max();
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use futures_util::StreamExt;

    use super::*;

    fn create_test_event(
        aggregate_id: AggregateId,
        version: Version,
        event_type: &str,
    ) -> EventEnvelope {
        EventEnvelope::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Order")
            .event_type(event_type)
            .version(version)
            .payload_raw(serde_json::json!({"test": true}))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn append_single_event() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new(1);
        let event = create_test_event(aggregate_id, Version::first(), "OrderCreated");

        let version = store
            .append(vec![event], AppendOptions::expect_new())
            .await
            .unwrap();
        assert_eq!(version, Version::first());
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn append_multiple_events_returns_last_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new(1);
        let events = vec![
            create_test_event(aggregate_id, Version::new(1), "OrderCreated"),
            create_test_event(aggregate_id, Version::new(2), "OrderShipped"),
        ];

        let version = store.append(events, AppendOptions::new()).await.unwrap();
        assert_eq!(version, Version::new(2));
    }

    #[tokio::test]
    async fn concurrency_conflict_on_wrong_expected_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new(1);
        store
            .append(
                vec![create_test_event(aggregate_id, Version::first(), "OrderCreated")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![create_test_event(aggregate_id, Version::new(2), "OrderShipped")],
                AppendOptions::expect_new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
        assert_eq!(store.event_count().await, 1);
    }

    #[tokio::test]
    async fn duplicate_version_is_rejected_without_expected_version() {
        let store = InMemoryEventStore::new();
        let aggregate_id = AggregateId::new(1);
        store
            .append(
                vec![create_test_event(aggregate_id, Version::first(), "OrderCreated")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let result = store
            .append(
                vec![create_test_event(aggregate_id, Version::first(), "OrderCreated")],
                AppendOptions::new(),
            )
            .await;

        assert!(matches!(
            result,
            Err(EventStoreError::ConcurrencyConflict { .. })
        ));
    }

    #[tokio::test]
    async fn events_are_isolated_per_aggregate() {
        let store = InMemoryEventStore::new();
        let first = AggregateId::new(1);
        let second = AggregateId::new(2);

        store
            .append(
                vec![create_test_event(first, Version::first(), "OrderCreated")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(second, Version::first(), "OrderCreated")],
                AppendOptions::expect_new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(first, Version::new(2), "OrderShipped")],
                AppendOptions::expect_version(Version::first()),
            )
            .await
            .unwrap();

        let events = store.get_events_for_aggregate(first).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].event_type, "OrderCreated");
        assert_eq!(events[1].event_type, "OrderShipped");

        assert_eq!(
            store.get_aggregate_version(first).await.unwrap(),
            Some(Version::new(2))
        );
        assert_eq!(
            store.get_aggregate_version(second).await.unwrap(),
            Some(Version::first())
        );
        assert_eq!(
            store.get_aggregate_version(AggregateId::new(3)).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn stream_all_events_preserves_append_order() {
        let store = InMemoryEventStore::new();
        store
            .append(
                vec![create_test_event(AggregateId::new(2), Version::first(), "OrderCreated")],
                AppendOptions::new(),
            )
            .await
            .unwrap();
        store
            .append(
                vec![create_test_event(AggregateId::new(1), Version::first(), "OrderCreated")],
                AppendOptions::new(),
            )
            .await
            .unwrap();

        let mut stream = store.stream_all_events().await.unwrap();
        let mut ids = Vec::new();
        while let Some(event) = stream.next().await {
            ids.push(event.unwrap().aggregate_id.as_u64());
        }
        assert_eq!(ids, vec![2, 1]);
    }
}
