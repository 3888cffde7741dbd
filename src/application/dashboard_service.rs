// Dashboard service - owns the sync engine and tilt advisor on a single task
use crate::application::error::{LocationError, SyncError};
use crate::application::history_service::HistoryService;
use crate::application::live_channel::{ChannelEvent, LiveSubscription, LiveUpdateChannel};
use crate::application::location_provider::LocationProvider;
use crate::application::sync_engine::{LiveFilterPolicy, LiveOutcome, PendingReload, SyncEngine};
use crate::domain::dashboard::DashboardSnapshot;
use crate::domain::query::{DateRange, SortConfig};
use crate::domain::record::{Record, RecordField};
use crate::domain::telemetry::{charts, summary_cards, table_columns};
use crate::domain::tilt::{LocationFix, TiltAdvisor};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Intents coming from the presentation layer
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Without a sort the task keeps whatever sort it currently holds
    Configure { filter: DateRange, sort: Option<SortConfig> },
    Reload,
    RequestSort(RecordField),
    ReacquireLocation,
    /// Stop the task even while handles are still alive
    Shutdown,
}

#[derive(Debug, thiserror::Error)]
#[error("dashboard task has stopped")]
pub struct DashboardClosed;

/// Cheap, cloneable handle for talking to a running dashboard.
///
/// Once every handle is dropped the dashboard task shuts down and releases its
/// live-update subscription.
#[derive(Debug, Clone)]
pub struct DashboardHandle {
    commands: mpsc::Sender<Command>,
    snapshots: watch::Receiver<DashboardSnapshot>,
}

impl DashboardHandle {
    pub async fn send(&self, command: Command) -> Result<(), DashboardClosed> {
        self.commands.send(command).await.map_err(|_| DashboardClosed)
    }

    pub async fn configure(&self, filter: DateRange, sort: SortConfig) -> Result<(), DashboardClosed> {
        self.send(Command::Configure {
            filter,
            sort: Some(sort),
        })
        .await
    }

    /// Change the date range only; a sort change still queued ahead of this
    /// one is kept.
    pub async fn set_filter(&self, filter: DateRange) -> Result<(), DashboardClosed> {
        self.send(Command::Configure { filter, sort: None }).await
    }

    pub async fn reload(&self) -> Result<(), DashboardClosed> {
        self.send(Command::Reload).await
    }

    pub async fn request_sort(&self, key: RecordField) -> Result<(), DashboardClosed> {
        self.send(Command::RequestSort(key)).await
    }

    pub async fn reacquire_location(&self) -> Result<(), DashboardClosed> {
        self.send(Command::ReacquireLocation).await
    }

    /// Stop the dashboard; snapshot subscribers see their stream end
    pub async fn shutdown(&self) -> Result<(), DashboardClosed> {
        self.send(Command::Shutdown).await
    }

    pub fn snapshot(&self) -> DashboardSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DashboardSnapshot> {
        self.snapshots.clone()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub filter: DateRange,
    pub sort: SortConfig,
    pub live_policy: LiveFilterPolicy,
}

struct ReloadDone {
    seq: u64,
    result: Result<Vec<Record>, SyncError>,
}

struct LocationDone {
    attempt: u64,
    result: Result<LocationFix, LocationError>,
}

enum Step {
    Command(Option<Command>),
    Subscribed(LiveSubscription),
    Reloaded(ReloadDone),
    Located(LocationDone),
    Live(Option<ChannelEvent>),
}

pub struct DashboardService {
    history: Option<Arc<dyn HistoryService>>,
    live: Option<Arc<dyn LiveUpdateChannel>>,
    location: Arc<dyn LocationProvider>,
    engine: SyncEngine,
    advisor: TiltAdvisor,
    location_attempt: u64,
    live_connected: bool,
    loading_since: Option<DateTime<Utc>>,
}

impl DashboardService {
    pub fn new(
        history: Option<Arc<dyn HistoryService>>,
        live: Option<Arc<dyn LiveUpdateChannel>>,
        location: Arc<dyn LocationProvider>,
        options: SyncOptions,
    ) -> Self {
        Self {
            history,
            live,
            location,
            engine: SyncEngine::new(options.filter, options.sort, options.live_policy),
            advisor: TiltAdvisor::new(),
            location_attempt: 0,
            live_connected: false,
            loading_since: None,
        }
    }

    /// Start the dashboard task: subscribe to live updates, run the initial
    /// load and the first location fix, then serve commands until every
    /// handle is dropped.
    pub fn spawn(self) -> (DashboardHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (snapshot_tx, snapshot_rx) = watch::channel(DashboardSnapshot::initial());
        let task = tokio::spawn(self.run(command_rx, snapshot_tx));
        let handle = DashboardHandle {
            commands: command_tx,
            snapshots: snapshot_rx,
        };
        (handle, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        snapshots: watch::Sender<DashboardSnapshot>,
    ) {
        let (reload_tx, mut reload_rx) = mpsc::channel::<ReloadDone>(16);
        let (location_tx, mut location_rx) = mpsc::channel::<LocationDone>(4);

        let (subscribed_tx, mut subscribed_rx) = mpsc::channel::<LiveSubscription>(1);

        let pending = self.engine.reload();
        self.dispatch(pending, &reload_tx);
        self.locate(&location_tx);
        self.publish(&snapshots);

        let connecting = self.subscribe_live(subscribed_tx);
        let mut live: Option<LiveSubscription> = None;

        loop {
            let step = tokio::select! {
                command = commands.recv() => Step::Command(command),
                Some(subscription) = subscribed_rx.recv() => Step::Subscribed(subscription),
                Some(done) = reload_rx.recv() => Step::Reloaded(done),
                Some(done) = location_rx.recv() => Step::Located(done),
                event = next_live_event(&mut live) => Step::Live(event),
            };

            match step {
                Step::Command(None) | Step::Command(Some(Command::Shutdown)) => break,
                Step::Command(Some(command)) => self.handle_command(command, &reload_tx, &location_tx),
                Step::Subscribed(subscription) => live = Some(subscription),
                Step::Reloaded(done) => {
                    let outcome = self.engine.complete_reload(done.seq, done.result);
                    tracing::debug!(seq = done.seq, ?outcome, "Reload completed");
                }
                Step::Located(done) => self.apply_location(done),
                Step::Live(Some(event)) => self.handle_live_event(event),
                Step::Live(None) => {
                    tracing::warn!("Live update channel closed; continuing with manual refresh only");
                    live = None;
                    self.live_connected = false;
                }
            }
            self.publish(&snapshots);
        }

        if let Some(connecting) = connecting {
            connecting.abort();
        }
        tracing::info!("Dashboard stopped");
    }

    /// Connect to the live channel on its own task so a slow endpoint never
    /// holds up reloads or commands. The subscription is handed over through
    /// `subscribed`.
    fn subscribe_live(&self, subscribed: mpsc::Sender<LiveSubscription>) -> Option<JoinHandle<()>> {
        let channel = self.live.clone()?;
        Some(tokio::spawn(async move {
            match channel.subscribe().await {
                Ok(subscription) => {
                    // A send error means the dashboard already stopped; the
                    // returned subscription is dropped and its reader aborted
                    let _ = subscribed.send(subscription).await;
                }
                Err(e) => tracing::warn!("Live updates unavailable: {}", e),
            }
        }))
    }

    fn handle_command(
        &mut self,
        command: Command,
        reload_tx: &mpsc::Sender<ReloadDone>,
        location_tx: &mpsc::Sender<LocationDone>,
    ) {
        tracing::debug!(?command, "Handling command");
        match command {
            Command::Configure { filter, sort } => {
                let sort = sort.unwrap_or_else(|| self.engine.sort());
                if let Some(pending) = self.engine.configure(filter, sort) {
                    self.dispatch(pending, reload_tx);
                }
            }
            Command::Reload => {
                let pending = self.engine.reload();
                self.dispatch(pending, reload_tx);
            }
            Command::RequestSort(key) => {
                let pending = self.engine.request_sort(key);
                self.dispatch(pending, reload_tx);
            }
            Command::ReacquireLocation => {
                self.advisor.reacquire();
                self.locate(location_tx);
            }
            Command::Shutdown => {}
        }
    }

    fn dispatch(&mut self, pending: PendingReload, reload_tx: &mpsc::Sender<ReloadDone>) {
        self.loading_since = Some(Utc::now());
        let Some(history) = self.history.clone() else {
            tracing::error!("Cannot reload: history service URL is not configured");
            self.engine.complete_reload(pending.seq, Err(SyncError::NotConfigured));
            return;
        };

        let tx = reload_tx.clone();
        tokio::spawn(async move {
            let result = history.fetch(&pending.descriptor).await.map_err(|e| {
                tracing::error!(seq = pending.seq, "Error fetching history: {:#}", e);
                SyncError::Transport(format!("{:#}", e))
            });
            let _ = tx
                .send(ReloadDone {
                    seq: pending.seq,
                    result,
                })
                .await;
        });
    }

    fn locate(&mut self, location_tx: &mpsc::Sender<LocationDone>) {
        self.location_attempt += 1;
        let attempt = self.location_attempt;
        let provider = self.location.clone();
        let tx = location_tx.clone();
        tokio::spawn(async move {
            let result = provider.locate().await;
            let _ = tx.send(LocationDone { attempt, result }).await;
        });
    }

    fn apply_location(&mut self, done: LocationDone) {
        if done.attempt != self.location_attempt {
            return;
        }
        match done.result {
            Ok(fix) => {
                let tilt = self.advisor.on_fix(fix);
                tracing::info!(latitude = fix.latitude, optimal_tilt = tilt, "Location fixed");
            }
            Err(e) => {
                tracing::warn!("Location unavailable: {}", e);
                self.advisor.on_error(e.to_string());
            }
        }
    }

    fn handle_live_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Connected => {
                tracing::info!("Live updates connected");
                self.live_connected = true;
            }
            ChannelEvent::Disconnected => {
                tracing::warn!("Live updates disconnected");
                self.live_connected = false;
            }
            ChannelEvent::Error(e) => tracing::warn!("Live update error: {}", e),
            ChannelEvent::NewData(record) => {
                let id = record.id.clone();
                match self.engine.on_live_update(record) {
                    LiveOutcome::Prepended => tracing::debug!(%id, "Live sample added"),
                    outcome => tracing::debug!(%id, ?outcome, "Live sample ignored"),
                }
            }
        }
    }

    fn publish(&mut self, snapshots: &watch::Sender<DashboardSnapshot>) {
        if !self.engine.state().is_loading() {
            self.loading_since = None;
        }
        snapshots.send_replace(self.snapshot());
    }

    fn snapshot(&self) -> DashboardSnapshot {
        let view = self.engine.current_view();
        let latest = self.engine.latest();
        DashboardSnapshot {
            state: self.engine.state().clone(),
            loading_since: self.loading_since,
            live_connected: self.live_connected,
            sort: self.engine.sort(),
            filter: self.engine.filter().clone(),
            records: view.to_vec(),
            latest: latest.cloned(),
            cards: summary_cards(latest),
            charts: charts(view),
            columns: table_columns(),
            recommendation: self.advisor.recommend(latest.and_then(|r| r.tilt_angle)),
        }
    }
}

async fn next_live_event(live: &mut Option<LiveSubscription>) -> Option<ChannelEvent> {
    match live {
        Some(subscription) => subscription.next().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::error::ChannelError;
    use crate::domain::dashboard::EngineState;
    use crate::domain::query::{RequestDescriptor, SortDirection};
    use crate::domain::tilt::AlignmentStatus;
    use async_trait::async_trait;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::oneshot;

    type Reply = oneshot::Receiver<anyhow::Result<Vec<Record>>>;

    /// History service whose responses are released by the test, per query, in any order
    #[derive(Default)]
    struct ScriptedHistory {
        replies: Mutex<HashMap<String, VecDeque<Reply>>>,
        requests: Mutex<Vec<RequestDescriptor>>,
    }

    impl ScriptedHistory {
        fn expect(&self, query: &str) -> oneshot::Sender<anyhow::Result<Vec<Record>>> {
            let (tx, rx) = oneshot::channel();
            self.replies
                .lock()
                .unwrap()
                .entry(query.to_string())
                .or_default()
                .push_back(rx);
            tx
        }

        fn requests(&self) -> Vec<RequestDescriptor> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HistoryService for ScriptedHistory {
        async fn fetch(&self, query: &RequestDescriptor) -> anyhow::Result<Vec<Record>> {
            self.requests.lock().unwrap().push(query.clone());
            let reply = self
                .replies
                .lock()
                .unwrap()
                .get_mut(&query.to_query_string())
                .and_then(|queue| queue.pop_front());
            match reply {
                Some(reply) => reply.await.map_err(|_| anyhow::anyhow!("reply dropped"))?,
                None => anyhow::bail!("unexpected request"),
            }
        }
    }

    const DEFAULT_QUERY: &str = "sortBy=createdAt&order=desc";

    struct FixedLocation(Result<LocationFix, LocationError>);

    #[async_trait]
    impl LocationProvider for FixedLocation {
        async fn locate(&self) -> Result<LocationFix, LocationError> {
            self.0.clone()
        }
    }

    /// Answers each lookup with the next scripted result
    struct SequencedLocation(Mutex<VecDeque<Result<LocationFix, LocationError>>>);

    #[async_trait]
    impl LocationProvider for SequencedLocation {
        async fn locate(&self) -> Result<LocationFix, LocationError> {
            self.0
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LocationError::Unavailable))
        }
    }

    struct PushChannel(Mutex<Option<mpsc::Receiver<ChannelEvent>>>);

    #[async_trait]
    impl LiveUpdateChannel for PushChannel {
        async fn subscribe(&self) -> Result<LiveSubscription, ChannelError> {
            self.0
                .lock()
                .unwrap()
                .take()
                .map(LiveSubscription::from_receiver)
                .ok_or_else(|| ChannelError::Connect("already subscribed".to_string()))
        }
    }

    /// Live channel whose endpoint accepts the connection and then never answers
    struct HungChannel;

    #[async_trait]
    impl LiveUpdateChannel for HungChannel {
        async fn subscribe(&self) -> Result<LiveSubscription, ChannelError> {
            std::future::pending().await
        }
    }

    fn record(id: &str, tilt: Option<f64>) -> Record {
        let mut record = Record::new(id, "2025-06-01T10:00:00Z");
        record.tilt_angle = tilt;
        record
    }

    fn ids(snapshot: &DashboardSnapshot) -> Vec<String> {
        snapshot.records.iter().map(|r| r.id.clone()).collect()
    }

    async fn wait_for(
        rx: &mut watch::Receiver<DashboardSnapshot>,
        condition: impl Fn(&DashboardSnapshot) -> bool,
    ) -> DashboardSnapshot {
        let result = tokio::time::timeout(Duration::from_secs(2), rx.wait_for(|s| condition(s))).await;
        result.expect("timed out").expect("dashboard stopped").clone()
    }

    fn sydney() -> Arc<dyn LocationProvider> {
        Arc::new(FixedLocation(Ok(LocationFix::new(-33.8, 151.2))))
    }

    #[tokio::test]
    async fn test_initial_load_and_recommendation() {
        let history = Arc::new(ScriptedHistory::default());
        let reply = history.expect(DEFAULT_QUERY);
        let service = DashboardService::new(Some(history.clone()), None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        reply.send(Ok(vec![record("r2", Some(30.0)), record("r1", Some(10.0))])).unwrap();
        let snapshot = wait_for(&mut rx, |s| {
            s.state == EngineState::Idle && s.recommendation.optimal_tilt.is_some()
        })
        .await;

        assert_eq!(ids(&snapshot), vec!["r2", "r1"]);
        assert_eq!(snapshot.latest.as_ref().map(|r| r.id.as_str()), Some("r2"));
        assert_eq!(snapshot.recommendation.optimal_tilt, Some(33.8));
        assert_eq!(snapshot.recommendation.status, AlignmentStatus::Excellent);
        assert_eq!(history.requests()[0].to_query_string(), "sortBy=createdAt&order=desc");
    }

    #[tokio::test]
    async fn test_out_of_order_completion_keeps_newest_request() {
        let history = Arc::new(ScriptedHistory::default());
        let first = history.expect(DEFAULT_QUERY);
        let second = history.expect("sortBy=power&order=asc");
        let service = DashboardService::new(Some(history.clone()), None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        handle.request_sort(RecordField::Power).await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.sort.key == RecordField::Power).await;
        assert_eq!(snapshot.sort.direction, SortDirection::Asc);

        // The superseded initial load finishes last
        second.send(Ok(vec![record("by-power", None)])).unwrap();
        wait_for(&mut rx, |s| s.state == EngineState::Idle && !s.records.is_empty()).await;
        first.send(Ok(vec![record("stale", None)])).unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        let snapshot = handle.snapshot();
        assert_eq!(ids(&snapshot), vec!["by-power"]);
        assert_eq!(snapshot.state, EngineState::Idle);
        assert_eq!(history.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_records() {
        let history = Arc::new(ScriptedHistory::default());
        let first = history.expect(DEFAULT_QUERY);
        let second = history.expect(DEFAULT_QUERY);
        let service = DashboardService::new(Some(history.clone()), None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        first.send(Ok(vec![record("r1", None)])).unwrap();
        wait_for(&mut rx, |s| s.state == EngineState::Idle && !s.records.is_empty()).await;

        handle.reload().await.unwrap();
        second.send(Err(anyhow::anyhow!("502 Bad Gateway"))).unwrap();
        let snapshot = wait_for(&mut rx, |s| s.state.error().is_some()).await;

        assert_eq!(snapshot.state.error(), Some("Failed to fetch data from the server."));
        assert_eq!(ids(&snapshot), vec!["r1"]);
    }

    #[tokio::test]
    async fn test_missing_history_service_is_configuration_error() {
        let service = DashboardService::new(None, None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| s.state.error().is_some()).await;
        assert_eq!(snapshot.state.error(), Some("History service URL is not configured."));
        assert!(snapshot.records.is_empty());
    }

    #[tokio::test]
    async fn test_live_updates_prepend_and_disconnect_is_non_fatal() {
        let history = Arc::new(ScriptedHistory::default());
        let reply = history.expect(DEFAULT_QUERY);
        let (live_tx, live_rx) = mpsc::channel(8);
        let channel = Arc::new(PushChannel(Mutex::new(Some(live_rx))));
        let service = DashboardService::new(Some(history.clone()), Some(channel), sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        reply.send(Ok(vec![record("r2", None), record("r1", None)])).unwrap();
        wait_for(&mut rx, |s| s.state == EngineState::Idle && s.records.len() == 2).await;

        live_tx.send(ChannelEvent::Connected).await.unwrap();
        live_tx.send(ChannelEvent::NewData(record("r3", Some(20.0)))).await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.records.len() == 3).await;
        assert_eq!(ids(&snapshot), vec!["r3", "r2", "r1"]);
        assert!(snapshot.live_connected);
        assert_eq!(snapshot.recommendation.current_tilt, Some(20.0));
        assert_eq!(history.requests().len(), 1);

        drop(live_tx);
        let snapshot = wait_for(&mut rx, |s| !s.live_connected).await;
        assert_eq!(snapshot.records.len(), 3);
        assert!(snapshot.state.error().is_none());
    }

    #[tokio::test]
    async fn test_hung_live_subscribe_does_not_block_reloads() {
        let history = Arc::new(ScriptedHistory::default());
        history.expect(DEFAULT_QUERY).send(Ok(vec![record("r1", None)])).unwrap();
        history.expect(DEFAULT_QUERY).send(Ok(vec![record("r2", None), record("r1", None)])).unwrap();
        let channel: Arc<dyn LiveUpdateChannel> = Arc::new(HungChannel);
        let service = DashboardService::new(Some(history.clone()), Some(channel), sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        let snapshot = wait_for(&mut rx, |s| {
            s.state == EngineState::Idle && !s.records.is_empty() && s.recommendation.optimal_tilt.is_some()
        })
        .await;
        assert_eq!(ids(&snapshot), vec!["r1"]);
        assert_eq!(snapshot.recommendation.optimal_tilt, Some(33.8));
        assert!(!snapshot.live_connected);

        handle.reload().await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.records.len() == 2).await;
        assert_eq!(ids(&snapshot), vec!["r2", "r1"]);
    }

    #[tokio::test]
    async fn test_filter_keeps_queued_sort() {
        let history = Arc::new(ScriptedHistory::default());
        let _initial = history.expect(DEFAULT_QUERY);
        let _by_power = history.expect("sortBy=power&order=asc");
        let filtered = history.expect("startDate=2025-06-01&sortBy=power&order=asc");
        let service = DashboardService::new(Some(history.clone()), None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        // The filter is sent before the sort change has been published
        handle.request_sort(RecordField::Power).await.unwrap();
        handle.set_filter(DateRange::new("2025-06-01", "")).await.unwrap();

        let snapshot = wait_for(&mut rx, |s| s.filter.start_date == "2025-06-01").await;
        assert_eq!(snapshot.sort, SortConfig::new(RecordField::Power, SortDirection::Asc));

        filtered.send(Ok(vec![record("june", None)])).unwrap();
        let snapshot = wait_for(&mut rx, |s| s.state == EngineState::Idle && !s.records.is_empty()).await;
        assert_eq!(ids(&snapshot), vec!["june"]);
    }

    #[tokio::test]
    async fn test_loading_since_restarts_with_newer_request() {
        let history = Arc::new(ScriptedHistory::default());
        let _first = history.expect(DEFAULT_QUERY);
        let second = history.expect(DEFAULT_QUERY);
        let service = DashboardService::new(Some(history.clone()), None, sydney(), SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        let first_since = wait_for(&mut rx, |s| s.loading_since.is_some())
            .await
            .loading_since
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        handle.reload().await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.loading_since.is_some_and(|since| since > first_since)).await;
        assert!(snapshot.state.is_loading());

        second.send(Ok(vec![record("r1", None)])).unwrap();
        let snapshot = wait_for(&mut rx, |s| !s.records.is_empty()).await;
        assert_eq!(snapshot.loading_since, None);
    }

    #[tokio::test]
    async fn test_location_error_and_reacquire() {
        let history = Arc::new(ScriptedHistory::default());
        let reply = history.expect(DEFAULT_QUERY);
        let location = Arc::new(SequencedLocation(Mutex::new(VecDeque::from([
            Err(LocationError::PermissionDenied),
            Ok(LocationFix::new(-33.8, 151.2)),
        ]))));
        let service = DashboardService::new(Some(history.clone()), None, location, SyncOptions::default());
        let (handle, _task) = service.spawn();
        let mut rx = handle.subscribe();

        reply.send(Ok(vec![record("r1", Some(30.0))])).unwrap();
        let snapshot = wait_for(&mut rx, |s| {
            s.state == EngineState::Idle && s.recommendation.status == AlignmentStatus::Error
        })
        .await;
        assert_eq!(
            snapshot.recommendation.message,
            LocationError::PermissionDenied.to_string()
        );
        assert!(snapshot.recommendation.deviation.is_none());
        assert_eq!(ids(&snapshot), vec!["r1"]);

        handle.reacquire_location().await.unwrap();
        let snapshot = wait_for(&mut rx, |s| s.recommendation.status == AlignmentStatus::Excellent).await;
        assert_eq!(snapshot.recommendation.optimal_tilt, Some(33.8));
        assert_eq!(history.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_dropping_handles_stops_task() {
        let service = DashboardService::new(None, None, sydney(), SyncOptions::default());
        let (handle, task) = service.spawn();
        drop(handle);

        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("task did not stop")
            .unwrap();
    }

    #[tokio::test]
    async fn test_shutdown_ends_snapshot_stream() {
        let service = DashboardService::new(None, None, sydney(), SyncOptions::default());
        let (handle, task) = service.spawn();
        let mut rx = handle.subscribe();

        handle.shutdown().await.unwrap();
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .expect("task did not stop")
            .unwrap();
        rx.borrow_and_update();
        assert!(rx.changed().await.is_err());
        assert!(handle.reload().await.is_err());
    }
}
