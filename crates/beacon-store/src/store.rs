//! Priority-ordered store
//!
//! Records are kept sorted by score descending. Equal scores keep arrival
//! order: a new record goes after every record with an equal or higher score.
//! Inserts take the write lock; queries share the read lock and always see
//! whole records.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use tracing::debug;

use beacon_core::{BeaconError, BeaconResult, Event, Priority, RecordId};

use crate::{Page, PriorityStats, Query, SortOrder, StoredEvent};

#[derive(Debug, Default)]
struct StoreInner {
    /// Sorted by score descending, stable
    records: Vec<Arc<StoredEvent>>,
    last_id: RecordId,
}

/// Shared priority-ordered collection of accepted events
#[derive(Debug, Default)]
pub struct PriorityStore {
    inner: RwLock<StoreInner>,
}

impl PriorityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event in score order and return the stored record
    pub fn insert(&self, event: Event, priority: Priority) -> Arc<StoredEvent> {
        let mut inner = self.inner.write();
        inner.last_id = inner.last_id.next();

        let score = priority.score;
        let record = Arc::new(StoredEvent {
            id: inner.last_id,
            event,
            priority,
            stored_at: Utc::now(),
        });

        // First position whose score is strictly lower
        let position = inner
            .records
            .partition_point(|r| r.priority.score >= score);
        inner.records.insert(position, Arc::clone(&record));

        debug!(
            record = %record.id,
            node = %record.event.node_id,
            score = %score,
            position,
            "stored event"
        );
        record
    }

    /// Filter, order and paginate. `total` counts matches before pagination.
    pub fn query(&self, query: &Query) -> Page {
        let mut items: Vec<Arc<StoredEvent>> = {
            let inner = self.inner.read();
            inner
                .records
                .iter()
                .filter(|r| query.matches(r))
                .cloned()
                .collect()
        };

        if query.sort == SortOrder::Recency {
            items.sort_by(|a, b| b.event.timestamp.cmp(&a.event.timestamp));
        }

        let total = items.len();
        let items = items
            .into_iter()
            .skip(query.offset)
            .take(query.limit.unwrap_or(usize::MAX))
            .collect();

        Page { items, total }
    }

    /// All records in priority order
    pub fn all(&self) -> Vec<Arc<StoredEvent>> {
        self.inner.read().records.clone()
    }

    pub fn get(&self, id: RecordId) -> BeaconResult<Arc<StoredEvent>> {
        self.inner
            .read()
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(BeaconError::RecordNotFound(id))
    }

    /// Highest-priority record, if any
    pub fn top(&self) -> Option<Arc<StoredEvent>> {
        self.inner.read().records.first().cloned()
    }

    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    pub fn statistics(&self) -> PriorityStats {
        let inner = self.inner.read();
        PriorityStats::collect(
            inner
                .records
                .iter()
                .map(|r| (r.priority.score, r.priority.level)),
        )
    }

    /// Remove every record and restart id assignment
    pub fn clear(&self) {
        let mut inner = self.inner.write();
        let removed = inner.records.len();
        inner.records.clear();
        inner.last_id = RecordId::ZERO;
        debug!(removed, "store cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beacon_core::{NetworkStatus, PriorityLevel, Score};
    use beacon_priority::{is_priority_ordered, score_event};
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn put(store: &PriorityStore, node: &str, importance: f64, battery: f64) -> Arc<StoredEvent> {
        let event = Event::new(node, importance, battery, NetworkStatus::Good);
        let priority = score_event(&event);
        store.insert(event, priority)
    }

    fn scores(page: &Page) -> Vec<u16> {
        page.items.iter().map(|r| r.priority.score.hundredths()).collect()
    }

    #[test]
    fn test_insert_keeps_descending_order() {
        let store = PriorityStore::new();
        put(&store, "a", 2.0, 90.0);
        put(&store, "b", 9.0, 15.0);
        put(&store, "c", 5.0, 50.0);

        let page = store.query(&Query::new());
        assert_eq!(page.total, 3);
        assert!(is_priority_ordered(&page.items));
        assert_eq!(page.items[0].node_id().as_str(), "b");
    }

    #[test]
    fn test_equal_scores_keep_arrival_order() {
        let store = PriorityStore::new();
        let first = put(&store, "first", 5.0, 50.0);
        put(&store, "higher", 9.0, 10.0);
        let second = put(&store, "second", 5.0, 50.0);
        let third = put(&store, "third", 5.0, 50.0);

        let ids: Vec<RecordId> = store.all().iter().skip(1).map(|r| r.id).collect();
        assert_eq!(ids, vec![first.id, second.id, third.id]);
    }

    #[test]
    fn test_ids_increase_and_reset_on_clear() {
        let store = PriorityStore::new();
        let a = put(&store, "a", 1.0, 10.0);
        let b = put(&store, "b", 1.0, 10.0);
        assert_eq!(a.id, RecordId::new(1));
        assert_eq!(b.id, RecordId::new(2));

        store.clear();
        assert!(store.is_empty());
        assert!(store.top().is_none());
        let c = put(&store, "c", 1.0, 10.0);
        assert_eq!(c.id, RecordId::new(1));
    }

    #[test]
    fn test_get_and_top() {
        let store = PriorityStore::new();
        let low = put(&store, "low", 1.0, 90.0);
        let high = put(&store, "high", 10.0, 5.0);

        assert_eq!(store.get(low.id).unwrap().id, low.id);
        assert_eq!(store.top().unwrap().id, high.id);
        assert!(matches!(
            store.get(RecordId::new(99)),
            Err(BeaconError::RecordNotFound(_))
        ));
    }

    #[test]
    fn test_query_filters() {
        let store = PriorityStore::new();
        put(&store, "n1", 9.0, 10.0);
        put(&store, "n1", 1.0, 95.0);
        put(&store, "n2", 6.0, 40.0);
        let event = Event::new("n3", 5.0, 50.0, NetworkStatus::Fair).with_sensor_type("humidity");
        let priority = score_event(&event);
        store.insert(event, priority);

        let page = store.query(&Query::new().node("n1"));
        assert_eq!(page.total, 2);
        assert!(page.items.iter().all(|r| r.node_id().as_str() == "n1"));

        let page = store.query(&Query::new().level(PriorityLevel::Critical));
        assert_eq!(page.total, 1);

        let page = store.query(&Query::new().min_score(Score::from_f64(5.0)));
        assert!(page.items.iter().all(|r| r.priority.score >= Score::from_f64(5.0)));
        assert_eq!(page.total, 3);

        let page = store.query(&Query::new().sensor_type("humidity"));
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].node_id().as_str(), "n3");
    }

    #[test]
    fn test_query_recency_order() {
        let store = PriorityStore::new();
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        for (i, importance) in [9.0, 1.0, 5.0].into_iter().enumerate() {
            let event = Event::new(format!("n{}", i), importance, 50.0, NetworkStatus::Good)
                .with_timestamp(base + Duration::minutes(i as i64));
            let priority = score_event(&event);
            store.insert(event, priority);
        }

        let page = store.query(&Query::new().sort(SortOrder::Recency));
        let nodes: Vec<&str> = page.items.iter().map(|r| r.node_id().as_str()).collect();
        assert_eq!(nodes, vec!["n2", "n1", "n0"]);
    }

    #[test]
    fn test_query_pagination() {
        let store = PriorityStore::new();
        for i in 0..10 {
            put(&store, "n", i as f64, 50.0);
        }

        let page = store.query(&Query::new().offset(2).limit(3));
        assert_eq!(page.total, 10);
        assert_eq!(page.len(), 3);

        let all = store.query(&Query::new());
        assert_eq!(scores(&page), scores(&all)[2..5].to_vec());

        let past_end = store.query(&Query::new().offset(20));
        assert_eq!(past_end.total, 10);
        assert!(past_end.is_empty());
    }

    #[test]
    fn test_statistics() {
        let store = PriorityStore::new();
        assert_eq!(store.statistics(), PriorityStats::default());

        put(&store, "a", 9.0, 15.0); // 8.65 critical
        put(&store, "b", 2.0, 90.0); // 2.90 low

        let stats = store.statistics();
        assert_eq!(stats.total, 2);
        assert_eq!(stats.by_level.critical, 1);
        assert_eq!(stats.by_level.low, 1);
        assert_eq!(stats.top_score, Some(Score::from_hundredths(865)));
        assert!((stats.distribution.critical - 50.0).abs() < 1e-9);
        assert!((stats.average_score - (8.65 + 2.9) / 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_record_serializes_flat() {
        let store = PriorityStore::new();
        let event = Event::new("n-4", 9.0, 15.0, NetworkStatus::Good).with_sensor_type("smoke");
        let priority = score_event(&event);
        let record = store.insert(event, priority);

        let json = serde_json::to_value(&*record).unwrap();
        assert_eq!(json["id"], 1);
        // Event fields sit beside the record's own
        assert_eq!(json["nodeId"], "n-4");
        assert_eq!(json["networkStatus"], "good");
        assert_eq!(json["sensorType"], "smoke");
        assert!(json.get("event").is_none());
        assert_eq!(json["priority"]["score"], 8.65);
        assert_eq!(json["priority"]["level"], "critical");
        assert!(json["storedAt"].is_string());
    }

    #[test]
    fn test_statistics_serialize() {
        let store = PriorityStore::new();
        put(&store, "a", 9.0, 15.0);
        put(&store, "b", 2.0, 90.0);

        let json = serde_json::to_value(store.statistics()).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["byLevel"]["critical"], 1);
        assert_eq!(json["byLevel"]["low"], 1);
        assert_eq!(json["topScore"], 8.65);
        assert_eq!(json["distribution"]["critical"], 50.0);

        let empty = serde_json::to_value(PriorityStore::new().statistics()).unwrap();
        assert!(empty["topScore"].is_null());
    }

    #[test]
    fn test_concurrent_inserts_stay_ordered() {
        let store = Arc::new(PriorityStore::new());
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        put(&store, &format!("t{}", t), ((i * 7 + t) % 11) as f64, 50.0);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 200);
        assert!(is_priority_ordered(&store.all()));
    }

    proptest! {
        #[test]
        fn prop_default_query_non_increasing(
            inputs in prop::collection::vec((0.0f64..=10.0, 0.0f64..=100.0), 0..64)
        ) {
            let store = PriorityStore::new();
            for (importance, battery) in inputs {
                put(&store, "p", importance, battery);
            }
            let page = store.query(&Query::new());
            prop_assert!(is_priority_ordered(&page.items));
            prop_assert_eq!(page.total, store.len());
        }
    }
}
