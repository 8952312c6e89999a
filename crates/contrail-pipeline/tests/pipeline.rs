//! End-to-end pass scenarios over the in-memory store.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use contrail_core::{RecordType, Result, Row, TypeSelection};
use contrail_pipeline::{
    Archiver, BatchProcessor, BatchSettings, DomainColumnSink, Orchestrator, RunMode, RunState,
    Scheduler,
};
use contrail_store::{Filter, MemoryStore, StoreCall};
use contrail_vector::{EmbeddingClient, EmbeddingProvider, MockEmbeddingProvider, RateLimiter};
use serde_json::{Value, json};
use tokio::time::Instant;

// ============================================================================
// Fixtures
// ============================================================================

fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        _ => Row::new(),
    }
}

fn pending(prefix: &str, count: usize) -> Vec<Row> {
    (1..=count)
        .map(|i| row(json!({"id": format!("{prefix}{i}"), "status": "open", "embedding": null})))
        .collect()
}

fn marketplace() -> MemoryStore {
    MemoryStore::new()
        .with_rows("offers", pending("o", 3))
        .with_rows("flights", pending("f", 2))
        .with_rows("crews", pending("c", 2))
        .with_pending_function("offers_needing_embedding", "offers", "embedding")
        .with_pending_function("flights_needing_embedding", "flights", "embedding")
        .with_pending_function("crews_needing_embedding", "crews", "embedding")
}

fn settings(dimension: usize) -> BatchSettings {
    BatchSettings {
        dimension,
        ..BatchSettings::default()
    }
}

fn orchestrator(
    store: Arc<MemoryStore>,
    provider: Arc<dyn EmbeddingProvider>,
    settings: BatchSettings,
    selection: TypeSelection,
    batch_size: usize,
) -> Orchestrator {
    let client = EmbeddingClient::new(provider, Arc::new(RateLimiter::per_minute(2800)));
    let sink = Arc::new(DomainColumnSink::new(store.clone()));
    let processor = BatchProcessor::new(store.clone(), client, sink, settings);
    let archiver = Archiver::new(store, 90, false);
    Orchestrator::new(processor, archiver, selection, batch_size)
}

fn vector_of(stored: &Row) -> Vec<f32> {
    stored
        .get("embedding")
        .and_then(Value::as_str)
        .map(|s| {
            s.trim_matches(|c| c == '[' || c == ']')
                .split(',')
                .filter_map(|v| v.parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Records when each embedding call happened and returns vectors of a
/// fixed width.
struct RecordingProvider {
    width: usize,
    at: Mutex<Vec<Instant>>,
}

impl RecordingProvider {
    fn new(width: usize) -> Self {
        Self {
            width,
            at: Mutex::new(Vec::new()),
        }
    }

    fn stamps(&self) -> Vec<Instant> {
        self.at.lock().unwrap().clone()
    }
}

#[async_trait]
impl EmbeddingProvider for RecordingProvider {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.at.lock().unwrap().push(Instant::now());
        Ok(vec![0.25; self.width])
    }

    fn dimension(&self) -> Option<usize> {
        Some(self.width)
    }

    fn name(&self) -> &str {
        "recording"
    }
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test(start_paused = true)]
async fn second_pass_without_changes_processes_nothing() {
    let store = Arc::new(marketplace());
    let orch = orchestrator(
        store.clone(),
        Arc::new(MockEmbeddingProvider::new(16)),
        settings(16),
        TypeSelection::All,
        50,
    );

    let first = orch.run_pass().await;
    assert_eq!(first.total_processed(), 7);
    assert_eq!(first.processed_for(RecordType::Offer), Some(3));

    let second = orch.run_pass().await;
    assert_eq!(second.total_processed(), 0);
    assert_eq!(second.failed_types(), 0);
}

#[tokio::test(start_paused = true)]
async fn types_run_in_priority_order() {
    let store = Arc::new(marketplace());
    let orch = orchestrator(
        store.clone(),
        Arc::new(MockEmbeddingProvider::new(16)),
        settings(16),
        TypeSelection::All,
        50,
    );
    let summary = orch.run_pass().await;
    let order: Vec<RecordType> = summary.results.iter().map(|r| r.record_type).collect();
    assert_eq!(order, RecordType::by_priority());

    let calls = store.calls().await;
    let position = |wanted: &StoreCall| calls.iter().position(|c| c == wanted).unwrap();
    let flights_selected = position(&StoreCall::Function {
        name: "flights_needing_embedding".into(),
    });
    let crews_selected = position(&StoreCall::Function {
        name: "crews_needing_embedding".into(),
    });
    let last_offer_write = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::Update { table, .. } if table == "offers"))
        .unwrap();
    let last_flight_write = calls
        .iter()
        .rposition(|c| matches!(c, StoreCall::Update { table, .. } if table == "flights"))
        .unwrap();
    assert!(last_offer_write < flights_selected);
    assert!(last_flight_write < crews_selected);
}

#[tokio::test(start_paused = true)]
async fn one_failing_record_does_not_sink_the_batch() {
    let store = Arc::new(
        MemoryStore::new()
            .with_rows("crews", pending("c", 5))
            .with_failing_key("crews", "c3"),
    );
    let orch = orchestrator(
        store.clone(),
        Arc::new(MockEmbeddingProvider::new(8)),
        settings(8),
        TypeSelection::Only(RecordType::Crew),
        5,
    );
    let summary = orch.run_pass().await;
    assert_eq!(summary.processed_for(RecordType::Crew), Some(4));

    let c3 = store.row("crews", "id", "c3").await.unwrap();
    assert!(c3.get("embedding").is_some_and(Value::is_null));
}

#[tokio::test(start_paused = true)]
async fn provider_failure_is_isolated_per_record() {
    let store = Arc::new(
        MemoryStore::new().with_rows(
            "profiles",
            vec![
                row(json!({"id": "u1", "role": "broker"})),
                row(json!({"id": "u2", "role": "reject-me"})),
                row(json!({"id": "u3", "role": "owner"})),
            ],
        ),
    );
    let provider = MockEmbeddingProvider::new(8).with_failure_marker("reject-me");
    let orch = orchestrator(
        store,
        Arc::new(provider),
        settings(8),
        TypeSelection::Only(RecordType::UserProfile),
        10,
    );
    assert_eq!(
        orch.run_pass().await.processed_for(RecordType::UserProfile),
        Some(2)
    );
}

#[tokio::test(start_paused = true)]
async fn five_records_run_in_chunks_of_two_with_pauses() {
    let store = Arc::new(MemoryStore::new().with_rows("crews", pending("c", 5)));
    let provider = Arc::new(RecordingProvider::new(8));
    let orch = orchestrator(
        store,
        provider.clone(),
        settings(8),
        TypeSelection::Only(RecordType::Crew),
        5,
    );

    let start = Instant::now();
    let summary = orch.run_pass().await;
    assert_eq!(summary.processed_for(RecordType::Crew), Some(5));

    let offsets: Vec<Duration> = provider.stamps().iter().map(|t| *t - start).collect();
    let per_second = |secs: u64| {
        offsets
            .iter()
            .filter(|d| **d == Duration::from_secs(secs))
            .count()
    };
    assert_eq!(
        (per_second(0), per_second(1), per_second(2)),
        (2, 2, 1)
    );
    // No pause after the last chunk.
    assert_eq!(start.elapsed(), Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn short_vectors_are_zero_padded_before_persisting() {
    let store = Arc::new(MemoryStore::new().with_rows("crews", pending("c", 1)));
    let orch = orchestrator(
        store.clone(),
        Arc::new(RecordingProvider::new(1000)),
        BatchSettings::default(),
        TypeSelection::Only(RecordType::Crew),
        1,
    );
    orch.run_pass().await;

    let stored = vector_of(&store.row("crews", "id", "c1").await.unwrap());
    assert_eq!(stored.len(), 1536);
    assert!(stored[..1000].iter().all(|v| *v == 0.25));
    assert!(stored[1000..].iter().all(|v| *v == 0.0));
}

#[tokio::test(start_paused = true)]
async fn long_vectors_are_truncated_before_persisting() {
    let store = Arc::new(MemoryStore::new().with_rows("crews", pending("c", 1)));
    let orch = orchestrator(
        store.clone(),
        Arc::new(RecordingProvider::new(3072)),
        BatchSettings::default(),
        TypeSelection::Only(RecordType::Crew),
        1,
    );
    orch.run_pass().await;
    let stored = vector_of(&store.row("crews", "id", "c1").await.unwrap());
    assert_eq!(stored.len(), 1536);
}

#[tokio::test(start_paused = true)]
async fn only_offers_never_touches_other_selectors() {
    let store = Arc::new(marketplace());
    let orch = orchestrator(
        store.clone(),
        Arc::new(MockEmbeddingProvider::new(16)),
        settings(16),
        TypeSelection::Only(RecordType::Offer),
        50,
    );
    let summary = orch.run_pass().await;
    assert_eq!(summary.results.len(), 1);

    for call in store.calls().await {
        match call {
            StoreCall::Function { name } => assert_eq!(name, "offers_needing_embedding"),
            StoreCall::Select { table, filters } => {
                let selector_query = filters.iter().any(|f| matches!(f, Filter::IsNull(_)));
                assert!(!selector_query || table == "offers", "selected from {table}");
            }
            StoreCall::Update { .. } => {}
        }
    }
}

#[tokio::test(start_paused = true)]
async fn unreachable_type_does_not_stop_later_types() {
    let store = Arc::new(marketplace().with_failing_table("flights"));
    let orch = orchestrator(
        store,
        Arc::new(MockEmbeddingProvider::new(16)),
        settings(16),
        TypeSelection::All,
        50,
    );
    let summary = orch.run_pass().await;
    assert_eq!(summary.failed_types(), 1);
    assert_eq!(summary.processed_for(RecordType::Offer), Some(3));
    assert_eq!(summary.processed_for(RecordType::Crew), Some(2));
    let flights = summary
        .results
        .iter()
        .find(|r| r.record_type == RecordType::Flight)
        .unwrap();
    assert!(flights.error.is_some());
}

#[tokio::test(start_paused = true)]
async fn offers_are_marked_embedded() {
    let store = Arc::new(marketplace());
    let orch = orchestrator(
        store.clone(),
        Arc::new(MockEmbeddingProvider::new(16)),
        settings(16),
        TypeSelection::Only(RecordType::Offer),
        50,
    );
    orch.run_pass().await;
    for offer in store.rows("offers").await {
        assert_eq!(offer.get("is_embedded"), Some(&json!(true)));
        assert!(offer.get("embedded_at").is_some());
    }
}

#[tokio::test(start_paused = true)]
async fn continuous_mode_sleeps_short_after_work_and_long_when_idle() {
    let store = Arc::new(MemoryStore::new().with_rows("offers", pending("o", 10)));
    let orch = orchestrator(
        store,
        Arc::new(MockEmbeddingProvider::new(8)),
        settings(8),
        TypeSelection::Only(RecordType::Offer),
        50,
    );
    let mut scheduler = Scheduler::new(orch, RunMode::continuous(Duration::from_secs(300)));
    assert_eq!(scheduler.state(), RunState::Idle);

    let first = scheduler.step().await.unwrap();
    assert_eq!(first.total_processed(), 10);
    let wake = scheduler.next_wake().unwrap();
    assert_eq!(wake - Instant::now(), Duration::from_secs(30));

    let second = scheduler.step().await.unwrap();
    assert_eq!(second.total_processed(), 0);
    assert!(Instant::now() >= wake);
    let wake = scheduler.next_wake().unwrap();
    assert_eq!(wake - Instant::now(), Duration::from_secs(300));
    assert!(matches!(scheduler.state(), RunState::Sleeping { .. }));
    assert_eq!(scheduler.passes(), 2);
}

#[tokio::test(start_paused = true)]
async fn one_shot_mode_finishes_after_one_pass() {
    let store = Arc::new(marketplace());
    let orch = orchestrator(
        store,
        Arc::new(MockEmbeddingProvider::new(8)),
        settings(8),
        TypeSelection::All,
        50,
    );
    let mut scheduler = Scheduler::new(orch, RunMode::OneShot);
    let summary = scheduler.run().await;
    assert_eq!(summary.total_processed(), 7);
    assert_eq!(scheduler.state(), RunState::Done);
    assert_eq!(scheduler.next_wake(), None);
    assert!(scheduler.step().await.is_none());
}

#[tokio::test(start_paused = true)]
async fn dry_run_leaves_rows_untouched() {
    let store = Arc::new(marketplace());
    let dry = BatchSettings {
        dry_run: true,
        ..settings(8)
    };
    let client = EmbeddingClient::new(
        Arc::new(MockEmbeddingProvider::new(8)),
        Arc::new(RateLimiter::per_minute(2800)),
    );
    let sink = Arc::new(DomainColumnSink::new(store.clone()));
    let processor = BatchProcessor::new(store.clone(), client, sink, dry);
    let orch = Orchestrator::new(
        processor,
        Archiver::new(store.clone(), 90, true),
        TypeSelection::All,
        50,
    );
    let summary = orch.run_pass().await;
    assert_eq!(summary.total_processed(), 7);
    assert!(
        !store
            .calls()
            .await
            .iter()
            .any(|c| matches!(c, StoreCall::Update { .. }))
    );
}
