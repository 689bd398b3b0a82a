use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use feeder_engine::{
    upload_pipeline, ActionProbe, BatchRunner, CancellationToken, CompletionStore, EngineEvent,
    EventSink, ItemKey, PipelineTiming, ProbeError, RunSummary, SequenceController, SourceItem,
    SurfaceResolver, TargetSurface, UploadProbes,
};
use pretty_assertions::assert_eq;

struct CollectingSink {
    events: Mutex<Vec<EngineEvent>>,
}

impl CollectingSink {
    fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    fn events(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    fn completions(&self) -> Vec<RunSummary> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::RunCompleted { summary } => Some(summary),
                _ => None,
            })
            .collect()
    }

    fn error_statuses(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                EngineEvent::Status(status) if status.is_error => Some(status.text),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: EngineEvent) {
        self.events.lock().unwrap().push(event);
    }
}

#[derive(Default)]
struct MemStore {
    completed: Mutex<BTreeSet<ItemKey>>,
}

impl MemStore {
    fn with_completed(keys: &[ItemKey]) -> Arc<Self> {
        Arc::new(Self {
            completed: Mutex::new(keys.iter().copied().collect()),
        })
    }
}

impl CompletionStore for MemStore {
    fn is_completed(&self, key: ItemKey) -> bool {
        self.completed.lock().unwrap().contains(&key)
    }

    fn mark_completed(&self, key: ItemKey, _url: &str) {
        self.completed.lock().unwrap().insert(key);
    }
}

struct FixedResolver {
    result: Result<String, String>,
}

impl FixedResolver {
    fn ok() -> Arc<Self> {
        Arc::new(Self {
            result: Ok("tab-1".to_string()),
        })
    }

    fn missing() -> Arc<Self> {
        Arc::new(Self {
            result: Err("no automatable tab".to_string()),
        })
    }
}

#[async_trait::async_trait]
impl SurfaceResolver for FixedResolver {
    async fn resolve(&self) -> Result<TargetSurface, ProbeError> {
        match &self.result {
            Ok(id) => Ok(TargetSurface { id: id.clone() }),
            Err(reason) => Err(ProbeError::Transport(reason.clone())),
        }
    }
}

/// Probe that always reports success and records the URLs it was given.
struct RecordingProbe {
    urls: Mutex<Vec<String>>,
}

impl RecordingProbe {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            urls: Mutex::new(Vec::new()),
        })
    }

    fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ActionProbe for RecordingProbe {
    async fn invoke(
        &self,
        _surface: &TargetSurface,
        url_arg: Option<&str>,
    ) -> Result<String, ProbeError> {
        if let Some(url) = url_arg {
            self.urls.lock().unwrap().push(url.to_string());
        }
        Ok("clicked".to_string())
    }
}

/// Probe that replays one scripted result per invocation.
struct PerCallProbe {
    results: Mutex<VecDeque<String>>,
}

impl PerCallProbe {
    fn new(results: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            results: Mutex::new(results.iter().map(|s| s.to_string()).collect()),
        })
    }
}

#[async_trait::async_trait]
impl ActionProbe for PerCallProbe {
    async fn invoke(
        &self,
        _surface: &TargetSurface,
        _url_arg: Option<&str>,
    ) -> Result<String, ProbeError> {
        Ok(self
            .results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "clicked".to_string()))
    }
}

/// Probe that cancels the shared token when it sees the given URL.
struct CancellingProbe {
    cancel_on_url: String,
    token: CancellationToken,
}

#[async_trait::async_trait]
impl ActionProbe for CancellingProbe {
    async fn invoke(
        &self,
        _surface: &TargetSurface,
        url_arg: Option<&str>,
    ) -> Result<String, ProbeError> {
        if url_arg == Some(self.cancel_on_url.as_str()) {
            self.token.cancel();
        }
        Ok("filled".to_string())
    }
}

fn zero_timing() -> PipelineTiming {
    PipelineTiming {
        after_open_dialog: std::time::Duration::ZERO,
        after_pick_website: std::time::Duration::ZERO,
        after_fill_url: std::time::Duration::ZERO,
        after_submit: std::time::Duration::ZERO,
        between_items: std::time::Duration::from_millis(2500),
        failure_cooldown: std::time::Duration::from_millis(1000),
    }
}

fn runner_with(
    probes: UploadProbes,
    resolver: Arc<dyn SurfaceResolver>,
    store: Arc<dyn CompletionStore>,
) -> BatchRunner {
    let timing = zero_timing();
    let sequence = SequenceController::new(upload_pipeline(probes, &timing), 60);
    BatchRunner::new(sequence, resolver, store, timing, 40)
}

fn all_ok_probes(fill: Arc<dyn ActionProbe>) -> UploadProbes {
    UploadProbes {
        open_dialog: RecordingProbe::new(),
        pick_website: RecordingProbe::new(),
        fill_url: fill,
        submit: RecordingProbe::new(),
    }
}

#[tokio::test(start_paused = true)]
async fn two_item_batch_with_one_submit_failure() {
    // Submit succeeds for the first item and reports an error for the second.
    let submit = PerCallProbe::new(&["Insert clicked", "Error: Insert button is disabled"]);
    let probes = UploadProbes {
        open_dialog: RecordingProbe::new(),
        pick_website: RecordingProbe::new(),
        fill_url: RecordingProbe::new(),
        submit,
    };
    let store = MemStore::with_completed(&[]);
    let runner = runner_with(probes, FixedResolver::ok(), store.clone());
    let sink = CollectingSink::new();

    let items = vec![
        SourceItem::keyed(0, "http://a.test"),
        SourceItem::keyed(1, "http://b.test"),
    ];
    let summary = runner
        .run(&items, &sink, &CancellationToken::new())
        .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.attempted(), 2);
    assert!(!summary.stopped_early);
    assert_eq!(summary.setup_error, None);

    // Exactly one per-item success notification, for the first item.
    let succeeded_keys: Vec<_> = sink
        .events()
        .into_iter()
        .filter_map(|event| match event {
            EngineEvent::ItemSucceeded { key } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(succeeded_keys, vec![0]);
    assert!(store.is_completed(0));
    assert!(!store.is_completed(1));

    // Exactly one error progress line, carrying the second item's reason.
    let errors = sink.error_statuses();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("Failed 2/2"));
    assert!(errors[0].contains("Insert button is disabled"));

    assert_eq!(sink.completions().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn items_run_in_input_order_and_a_failure_does_not_stop_the_batch() {
    let fill = RecordingProbe::new();
    let submit = PerCallProbe::new(&["ok", "Error: rejected", "ok"]);
    let probes = UploadProbes {
        open_dialog: RecordingProbe::new(),
        pick_website: RecordingProbe::new(),
        fill_url: fill.clone(),
        submit,
    };
    let runner = runner_with(probes, FixedResolver::ok(), MemStore::with_completed(&[]));
    let sink = CollectingSink::new();

    let items = vec![
        SourceItem::from_url("http://a.test"),
        SourceItem::from_url("http://b.test"),
        SourceItem::from_url("http://c.test"),
    ];
    let summary = runner
        .run(&items, &sink, &CancellationToken::new())
        .await;

    assert_eq!(
        fill.urls(),
        vec!["http://a.test", "http://b.test", "http://c.test"]
    );
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 1);
}

#[tokio::test(start_paused = true)]
async fn previously_completed_items_are_skipped() {
    let fill = RecordingProbe::new();
    let probes = all_ok_probes(fill.clone());
    let runner = runner_with(probes, FixedResolver::ok(), MemStore::with_completed(&[0, 2]));
    let sink = CollectingSink::new();

    let items = vec![
        SourceItem::keyed(0, "http://a.test"),
        SourceItem::keyed(1, "http://b.test"),
        SourceItem::keyed(2, "http://c.test"),
    ];
    let summary = runner
        .run(&items, &sink, &CancellationToken::new())
        .await;

    assert_eq!(fill.urls(), vec!["http://b.test"]);
    assert_eq!(summary.succeeded, 1);
    assert_eq!(summary.skipped, 2);
    assert_eq!(summary.total, 3);
    assert_eq!(summary.attempted(), summary.total - summary.skipped);
}

#[tokio::test(start_paused = true)]
async fn second_identical_run_attempts_nothing() {
    let store = MemStore::with_completed(&[]);
    let items = vec![
        SourceItem::keyed(0, "http://a.test"),
        SourceItem::keyed(1, "http://b.test"),
    ];

    let first_fill = RecordingProbe::new();
    let runner = runner_with(
        all_ok_probes(first_fill.clone()),
        FixedResolver::ok(),
        store.clone(),
    );
    let first = runner
        .run(&items, &CollectingSink::new(), &CancellationToken::new())
        .await;
    assert_eq!(first.succeeded, 2);

    let second_fill = RecordingProbe::new();
    let runner = runner_with(
        all_ok_probes(second_fill.clone()),
        FixedResolver::ok(),
        store,
    );
    let second = runner
        .run(&items, &CollectingSink::new(), &CancellationToken::new())
        .await;

    assert_eq!(second_fill.urls(), Vec::<String>::new());
    assert_eq!(second.attempted(), 0);
    assert_eq!(second.skipped, 2);
}

#[tokio::test(start_paused = true)]
async fn stop_during_an_item_finishes_it_and_drops_the_rest() {
    let token = CancellationToken::new();
    let fill: Arc<dyn ActionProbe> = Arc::new(CancellingProbe {
        cancel_on_url: "http://b.test".to_string(),
        token: token.clone(),
    });
    let probes = all_ok_probes(fill);
    let store = MemStore::with_completed(&[]);
    let runner = runner_with(probes, FixedResolver::ok(), store.clone());
    let sink = CollectingSink::new();

    let items: Vec<_> = ["a", "b", "c", "d", "e"]
        .iter()
        .enumerate()
        .map(|(i, name)| SourceItem::keyed(i as u64, format!("http://{name}.test")))
        .collect();
    let summary = runner.run(&items, &sink, &token).await;

    // Item 2 (where the stop landed) still completed and was recorded.
    assert_eq!(summary.succeeded, 2);
    assert_eq!(summary.failed, 0);
    assert!(summary.stopped_early);
    assert!(store.is_completed(1));
    assert!(!store.is_completed(2));

    // Exactly one terminal summary, marked stopped-early.
    let completions = sink.completions();
    assert_eq!(completions.len(), 1);
    assert!(completions[0].stopped_early);
}

#[tokio::test(start_paused = true)]
async fn missing_surface_fails_the_batch_before_any_item() {
    let fill = RecordingProbe::new();
    let probes = all_ok_probes(fill.clone());
    let runner = runner_with(probes, FixedResolver::missing(), MemStore::with_completed(&[]));
    let sink = CollectingSink::new();

    let items = vec![SourceItem::keyed(0, "http://a.test")];
    let summary = runner
        .run(&items, &sink, &CancellationToken::new())
        .await;

    assert_eq!(fill.urls(), Vec::<String>::new());
    assert_eq!(summary.attempted(), 0);
    let reason = summary.setup_error.expect("setup error");
    assert!(reason.contains("no target surface"));

    // The only event is the terminal completion.
    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::RunCompleted { .. }));
}

#[tokio::test(start_paused = true)]
async fn counts_never_exceed_totals() {
    let submit = PerCallProbe::new(&["ok", "Error: rejected"]);
    let probes = UploadProbes {
        open_dialog: RecordingProbe::new(),
        pick_website: RecordingProbe::new(),
        fill_url: RecordingProbe::new(),
        submit,
    };
    let runner = runner_with(probes, FixedResolver::ok(), MemStore::with_completed(&[2]));
    let sink = CollectingSink::new();

    let items = vec![
        SourceItem::keyed(0, "http://a.test"),
        SourceItem::keyed(1, "http://b.test"),
        SourceItem::keyed(2, "http://c.test"),
    ];
    let summary = runner
        .run(&items, &sink, &CancellationToken::new())
        .await;

    assert!(summary.attempted() <= summary.total);
    assert_eq!(summary.total - summary.attempted(), summary.skipped);
}
