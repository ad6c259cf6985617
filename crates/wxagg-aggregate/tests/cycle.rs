use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wxagg_aggregate::{fetch_all, Collector, CycleError, CycleSettings, QualityPolicy};
use wxagg_core::{
    CanonicalObservation, FieldValue, Fields, Metric, ObservationStore, PartialObservation,
    Source, StoreError, Timestamp,
};
use wxagg_query::{QueryEngine, QueryError};
use wxagg_store::MemoryStore;

struct StaticSource {
    id: &'static str,
    temp: Option<f64>,
    delay: Duration,
}

impl StaticSource {
    fn ok(id: &'static str, temp: f64) -> Arc<dyn Source> {
        Arc::new(Self {
            id,
            temp: Some(temp),
            delay: Duration::ZERO,
        })
    }

    fn failing(id: &'static str) -> Arc<dyn Source> {
        Arc::new(Self {
            id,
            temp: None,
            delay: Duration::ZERO,
        })
    }

    fn slow(id: &'static str, temp: f64, delay: Duration) -> Arc<dyn Source> {
        Arc::new(Self {
            id,
            temp: Some(temp),
            delay,
        })
    }
}

#[async_trait]
impl Source for StaticSource {
    fn source_id(&self) -> &str {
        self.id
    }

    async fn fetch(&self) -> PartialObservation {
        tokio::time::sleep(self.delay).await;
        match self.temp {
            Some(t) => {
                let mut fields = Fields::new();
                fields.insert(Metric::Temperature, FieldValue::Number(t));
                PartialObservation::success(self.id, fields, Utc::now())
            }
            None => PartialObservation::failure(self.id, "Provider returned HTTP 503", Utc::now()),
        }
    }
}

/// Reports the full metric set, observed some time before the cycle
struct ReadingSource {
    id: &'static str,
    observed_at: Timestamp,
}

#[async_trait]
impl Source for ReadingSource {
    fn source_id(&self) -> &str {
        self.id
    }

    async fn fetch(&self) -> PartialObservation {
        let mut fields = Fields::new();
        for metric in Metric::ALL {
            let value = if metric.is_numeric() {
                FieldValue::Number(10.0)
            } else {
                FieldValue::Text("Clear".into())
            };
            fields.insert(metric, value);
        }
        PartialObservation::success(self.id, fields, Utc::now())
            .with_observed_at(Some(self.observed_at))
    }
}

/// Counts writes and can be told to fail
#[derive(Default)]
struct SpyStore {
    inner: MemoryStore,
    puts: AtomicUsize,
    fail_puts: bool,
}

#[async_trait]
impl ObservationStore for SpyStore {
    async fn put(&self, record: &CanonicalObservation) -> Result<(), StoreError> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if self.fail_puts {
            return Err(StoreError::Unavailable("disk full".into()));
        }
        self.inner.put(record).await
    }

    async fn query(
        &self,
        location: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<Vec<CanonicalObservation>, StoreError> {
        self.inner.query(location, start, end).await
    }

    async fn latest(&self, location: &str) -> Result<Option<CanonicalObservation>, StoreError> {
        self.inner.latest(location).await
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.inner.ping().await
    }

    async fn purge_expired(&self, now: Timestamp) -> Result<u64, StoreError> {
        self.inner.purge_expired(now).await
    }
}

fn settings(timeout: Duration) -> CycleSettings {
    CycleSettings {
        location: "lewisville-tx".into(),
        policy: QualityPolicy::default(),
        retention: chrono::Duration::days(30),
        fetch_timeout: timeout,
    }
}

fn at() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 1, 15, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn cycle_writes_one_record() {
    let store = Arc::new(SpyStore::default());
    let collector = Collector::new(
        vec![
            StaticSource::ok("a", 24.0),
            StaticSource::ok("b", 25.0),
            StaticSource::ok("c", 26.0),
        ],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    let record = collector.run_cycle(at()).await.unwrap();
    assert_eq!(store.puts.load(Ordering::SeqCst), 1);
    assert_eq!(record.value(Metric::Temperature), Some(25.0));
    assert_eq!(record.sources, vec!["a", "b", "c"]);

    let latest = store.latest("lewisville-tx").await.unwrap().unwrap();
    assert_eq!(latest, record);
}

#[tokio::test]
async fn all_sources_failing_writes_nothing() {
    let store = Arc::new(SpyStore::default());
    let collector = Collector::new(
        vec![StaticSource::failing("a"), StaticSource::failing("b")],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    let err = collector.run_cycle(at()).await.unwrap_err();
    match err {
        CycleError::Collection(failure) => assert_eq!(failure.attempted, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(store.puts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn partial_outage_lowers_quality() {
    let store = Arc::new(SpyStore::default());
    let collector = Collector::new(
        vec![StaticSource::ok("a", 20.0), StaticSource::failing("b")],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    let record = collector.run_cycle(at()).await.unwrap();
    assert_eq!(record.sources, vec!["a"]);
    assert!(record.quality_score < 1.0);
}

#[tokio::test]
async fn store_error_is_reported() {
    let store = Arc::new(SpyStore {
        fail_puts: true,
        ..Default::default()
    });
    let collector = Collector::new(
        vec![StaticSource::ok("a", 20.0)],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    let err = collector.run_cycle(at()).await.unwrap_err();
    assert!(matches!(err, CycleError::Store(StoreError::Unavailable(_))));
}

#[tokio::test]
async fn rerunning_a_cycle_overwrites() {
    let store = Arc::new(SpyStore::default());
    let collector = Collector::new(
        vec![StaticSource::ok("a", 20.0)],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    collector.run_cycle(at()).await.unwrap();
    collector.run_cycle(at()).await.unwrap();
    let rows = store
        .query("lewisville-tx", at(), at())
        .await
        .unwrap();
    assert_eq!(rows.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn slow_source_is_timed_out() {
    let sources = vec![
        StaticSource::ok("fast", 20.0),
        StaticSource::slow("slow", 30.0, Duration::from_secs(60)),
    ];
    let partials = fetch_all(&sources, Duration::from_secs(1)).await;

    assert_eq!(partials.len(), 2);
    assert_eq!(partials[0].source_id, "fast");
    assert!(partials[0].is_contributing());
    assert_eq!(partials[1].source_id, "slow");
    assert!(partials[1].error.as_deref().unwrap().contains("Timeout"));
}

#[tokio::test]
async fn old_readings_lower_quality() {
    let interval = QualityPolicy::default().expected_interval;
    let two_intervals = chrono::Duration::from_std(interval * 2).unwrap();

    let fresh = Collector::new(
        vec![Arc::new(ReadingSource {
            id: "a",
            observed_at: at(),
        }) as Arc<dyn Source>],
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5)),
    );
    let stale = Collector::new(
        vec![Arc::new(ReadingSource {
            id: "a",
            observed_at: at() - two_intervals,
        }) as Arc<dyn Source>],
        Arc::new(MemoryStore::new()),
        settings(Duration::from_secs(5)),
    );

    let fresh_score = fresh.run_cycle(at()).await.unwrap().quality_score;
    let stale_score = stale.run_cycle(at()).await.unwrap().quality_score;
    assert!((fresh_score - 1.0).abs() < 1e-12, "fresh score {fresh_score}");
    assert!(stale_score < 1.0, "stale score {stale_score}");
}

#[tokio::test]
async fn cycle_result_is_served_as_current() {
    let store = Arc::new(MemoryStore::new());
    let engine = QueryEngine::new(store.clone(), "lewisville-tx");
    let collector = Collector::new(
        vec![StaticSource::ok("a", 24.0), StaticSource::ok("b", 26.0)],
        store.clone(),
        settings(Duration::from_secs(5)),
    );

    assert!(matches!(engine.current().await, Err(QueryError::NotFound(_))));

    let written = collector.run_cycle(at()).await.unwrap();
    let current = engine.current().await.unwrap();
    assert_eq!(current.timestamp, written.timestamp);
    assert_eq!(current.timestamp, at());
    assert_eq!(current.value(Metric::Temperature), Some(25.0));
}
