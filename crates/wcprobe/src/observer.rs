//! Per-member change feed observer.
//!
//! A [`ReplicaObserver`] owns one connection to one replica member. It tails
//! the member's change feed for tagged inserts, starting at the log tip the
//! first time and resuming strictly after its checkpoint whenever the feed is
//! lost. Every matching entry advances the checkpoint before anything else
//! happens to it, so an entry is narrated at most once.
//!
//! Session lifecycle:
//!
//! ```text
//! Starting --open--> Tailing --feed lost--> Starting
//! Starting | Tailing --stop--> Draining --released--> Exited
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, error, warn};
use wcprobe_store::{ChangeEvent, ChangeFeed, ConnectOptions, Connector, StoreClient};
use wcprobe_types::{DocumentId, LogPosition, ReplicaTarget};

use crate::control::{CommandInbox, ReportSender};
use crate::{Command, ObserverSettings, Report, Result, bounded};

/// Where an observer's session stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No feed open; the next supervisory tick tries to open one.
    Starting,
    /// A feed is open and delivering entries.
    Tailing,
    /// Stop received; releasing the feed and the connection.
    Draining,
    Exited,
}

/// Last log position an observer has consumed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumeCheckpoint {
    current: Option<LogPosition>,
    history: Vec<LogPosition>,
}

impl ResumeCheckpoint {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<LogPosition> {
        self.current
    }

    /// Every position the checkpoint has held, oldest first.
    pub fn history(&self) -> &[LogPosition] {
        &self.history
    }

    /// Moves the checkpoint to `position`. Returns false, leaving the
    /// checkpoint untouched, unless `position` is strictly ahead.
    pub fn advance(&mut self, position: LogPosition) -> bool {
        if self.current.is_some_and(|current| position <= current) {
            return false;
        }
        self.current = Some(position);
        self.history.push(position);
        true
    }
}

/// What the observer was told to look out for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpectationState {
    pub expecting: Option<DocumentId>,
    pub expecting_since: Option<Instant>,
    pub last_acked: Option<DocumentId>,
}

/// Exponential delay between attempts to reopen a lost feed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    attempts: u32,
    not_before: Option<Instant>,
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            attempts: 0,
            not_before: None,
        }
    }

    /// Consecutive failed or lost sessions since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Delay the next failure will impose.
    pub fn delay(&self) -> Duration {
        let factor = self.multiplier.powi(self.attempts.min(32) as i32);
        let secs = (self.initial.as_secs_f64() * factor).min(self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    /// Records a failure at `now` and returns how long to wait.
    pub fn schedule(&mut self, now: Instant) -> Duration {
        let delay = self.delay();
        self.attempts += 1;
        self.not_before = Some(now + delay);
        delay
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.not_before.is_none_or(|at| now >= at)
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
        self.not_before = None;
    }
}

/// One narrated entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub document_id: DocumentId,
    pub position: LogPosition,
    pub expecting: Option<DocumentId>,
    pub last_acked: Option<DocumentId>,
    /// Time since `sent` for this id, when it was the expected one.
    pub since_sent: Option<Duration>,
}

/// What an observer returns when it exits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserverReport {
    pub region: String,
    /// Log tip adopted as the first checkpoint.
    pub first_tip: Option<LogPosition>,
    pub checkpoints: Vec<LogPosition>,
    pub observations: Vec<Observation>,
    pub sessions_opened: usize,
}

fn describe(id: Option<DocumentId>) -> String {
    id.map_or_else(|| "none".to_string(), |id| id.to_string())
}

async fn next_event(feed: &mut Option<ChangeFeed>) -> Option<wcprobe_store::Result<ChangeEvent>> {
    match feed {
        Some(feed) => feed.next().await,
        None => std::future::pending().await,
    }
}

/// Tails one replica member on behalf of the orchestrator.
pub struct ReplicaObserver<C: Connector> {
    target: ReplicaTarget,
    connector: Arc<C>,
    settings: ObserverSettings,
    inbox: CommandInbox,
    reports: ReportSender,
    state: SessionState,
    checkpoint: ResumeCheckpoint,
    expectation: ExpectationState,
    backoff: ReconnectBackoff,
    ready_sent: bool,
    first_tip: Option<LogPosition>,
    observations: Vec<Observation>,
    sessions_opened: usize,
}

impl<C: Connector> ReplicaObserver<C> {
    pub fn new(
        target: ReplicaTarget,
        connector: Arc<C>,
        settings: ObserverSettings,
        inbox: CommandInbox,
        reports: ReportSender,
    ) -> Self {
        let backoff = settings.backoff.clone();
        Self {
            target,
            connector,
            settings,
            inbox,
            reports,
            state: SessionState::Starting,
            checkpoint: ResumeCheckpoint::new(),
            expectation: ExpectationState::default(),
            backoff,
            ready_sent: false,
            first_tip: None,
            observations: Vec::new(),
            sessions_opened: 0,
        }
    }

    pub fn region(&self) -> &str {
        &self.target.region
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Runs until stopped.
    ///
    /// Fails only if the initial connection cannot be made; in that case
    /// `ready` is never reported.
    pub async fn run(mut self) -> Result<ObserverReport> {
        self.report(Report::Info(format!(
            "Observer starting for {}",
            self.target.endpoint
        )))
        .await;
        let client = match self
            .connector
            .connect(&self.target.endpoint, ConnectOptions::default())
            .await
        {
            Ok(client) => client,
            Err(e) => {
                error!(region = %self.target.region, endpoint = %self.target.endpoint, error = %e, "observer failed to connect");
                return Err(e.into());
            }
        };
        self.report(Report::Info(format!("Connected to {}", self.target.endpoint)))
            .await;

        let mut feed = None;
        self.try_open(&client, &mut feed).await;

        let mut tick = interval(self.settings.supervise_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // Commands first: a `sent` must be recorded before its entry is narrated.
            tokio::select! {
                biased;

                command = self.inbox.recv() => match command {
                    Some(Ok(Command::Stop(reason))) => {
                        self.report(Report::Info(format!("Stop received: {reason}"))).await;
                        break;
                    }
                    Some(Ok(command)) => self.handle_command(&client, command).await,
                    Some(Err(e)) => {
                        warn!(region = %self.target.region, error = %e, "ignoring undecodable control frame");
                    }
                    None => {
                        warn!(region = %self.target.region, "control link closed, stopping");
                        break;
                    }
                },
                event = next_event(&mut feed) => self.handle_event(event, &mut feed).await,
                _ = tick.tick() => {
                    if feed.is_none() {
                        self.try_open(&client, &mut feed).await;
                    }
                }
            }
        }

        self.state = SessionState::Draining;
        if let Some(feed) = feed.take()
            && let Err(e) = feed.close().await
        {
            warn!(region = %self.target.region, error = %e, "failed to close change feed");
        }
        if let Err(e) = client.close().await {
            warn!(region = %self.target.region, error = %e, "failed to close connection");
        }
        self.state = SessionState::Exited;
        self.report(Report::Info(format!(
            "Exited after {} observations over {} sessions",
            self.observations.len(),
            self.sessions_opened
        )))
        .await;

        Ok(ObserverReport {
            region: self.target.region,
            first_tip: self.first_tip,
            checkpoints: self.checkpoint.history,
            observations: self.observations,
            sessions_opened: self.sessions_opened,
        })
    }

    async fn open_session(&mut self, client: &C::Client) -> Result<ChangeFeed> {
        if self.checkpoint.current().is_none() {
            let tip = bounded(self.settings.operation_timeout, "log tip query", client.log_tip())
                .await?;
            self.checkpoint.advance(tip);
            self.first_tip.get_or_insert(tip);
            debug!(region = %self.target.region, %tip, "starting at log tip");
        }
        let feed = client
            .open_feed(self.settings.filter.clone(), self.checkpoint.current())
            .await?;
        Ok(feed)
    }

    async fn try_open(&mut self, client: &C::Client, feed: &mut Option<ChangeFeed>) {
        if !self.backoff.is_due(Instant::now()) {
            return;
        }
        match self.open_session(client).await {
            Ok(opened) => {
                self.sessions_opened += 1;
                self.backoff.reset();
                self.state = SessionState::Tailing;
                debug!(
                    region = %self.target.region,
                    resume_after = %opened.resume_after(),
                    session = self.sessions_opened,
                    "change feed open"
                );
                *feed = Some(opened);
                if !self.ready_sent {
                    self.ready_sent = true;
                    self.report(Report::Ready).await;
                }
            }
            Err(e) => {
                let delay = self.backoff.schedule(Instant::now());
                warn!(
                    region = %self.target.region,
                    error = %e,
                    retry_in = ?delay,
                    "failed to open change feed"
                );
            }
        }
    }

    async fn handle_event(
        &mut self,
        event: Option<wcprobe_store::Result<ChangeEvent>>,
        feed: &mut Option<ChangeFeed>,
    ) {
        match event {
            Some(Ok(event)) => self.observe(event).await,
            Some(Err(e)) => {
                warn!(region = %self.target.region, error = %e, "change feed failed");
                self.lose_session(feed).await;
            }
            None => {
                self.report(Report::Info(format!(
                    "Change feed lost, resuming after {}",
                    describe_position(self.checkpoint.current())
                )))
                .await;
                self.lose_session(feed).await;
            }
        }
    }

    async fn lose_session(&mut self, feed: &mut Option<ChangeFeed>) {
        if let Some(lost) = feed.take()
            && let Err(e) = lost.close().await
        {
            debug!(region = %self.target.region, error = %e, "failed to release lost feed");
        }
        self.state = SessionState::Starting;
        self.backoff.schedule(Instant::now());
    }

    async fn observe(&mut self, event: ChangeEvent) {
        let id = event.document.id;
        if !self.checkpoint.advance(event.position) {
            self.report(Report::Debug(format!(
                "Dropped duplicate {id} at {}",
                event.position
            )))
            .await;
            return;
        }

        let expecting = self.expectation.expecting;
        let last_acked = self.expectation.last_acked;
        let since_sent = match (expecting, self.expectation.expecting_since) {
            (Some(expected), Some(since)) if expected == id => Some(since.elapsed()),
            _ => None,
        };

        self.report(Report::Info(format!(
            "Received {id} while expecting {} and last ack {}",
            describe(expecting),
            describe(last_acked)
        )))
        .await;
        if let Some(lag) = since_sent {
            self.report(Report::Debug(format!(
                "{id} at position {} seen {lag:?} after sent",
                event.position
            )))
            .await;
        }

        self.observations.push(Observation {
            document_id: id,
            position: event.position,
            expecting,
            last_acked,
            since_sent,
        });
    }

    async fn handle_command(&mut self, client: &C::Client, command: Command) {
        match command {
            Command::Sent(id) => {
                self.expectation.expecting = Some(id);
                self.expectation.expecting_since = Some(Instant::now());
                self.report(Report::Debug(format!("Expecting {id}"))).await;
            }
            Command::Ack(id) => {
                self.expectation.last_acked = Some(id);
                if self.settings.reconcile_tip_on_ack {
                    self.report_tip(client).await;
                }
            }
            Command::FetchTip => self.report_tip(client).await,
            Command::Stop(_) => {}
            Command::Unknown(tag) => {
                warn!(region = %self.target.region, %tag, "ignoring unknown command");
            }
        }
    }

    async fn report_tip(&mut self, client: &C::Client) {
        match bounded(self.settings.operation_timeout, "log tip query", client.log_tip()).await {
            Ok(tip) => {
                self.report(Report::Info(format!(
                    "Log tip {tip}, checkpoint {}, last ack {}",
                    describe_position(self.checkpoint.current()),
                    describe(self.expectation.last_acked)
                )))
                .await;
            }
            Err(e) => {
                warn!(region = %self.target.region, error = %e, "log tip query failed");
            }
        }
    }

    async fn report(&self, report: Report) {
        if let Err(e) = self.reports.send(&report).await {
            debug!(region = %self.target.region, tag = report.tag(), error = %e, "report dropped");
        }
    }
}

fn describe_position(position: Option<LogPosition>) -> String {
    position.map_or_else(|| "none".to_string(), |p| p.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{CommandLink, ReportInbox, command_link, report_channel};
    use wcprobe_store::{ClusterSpec, FeedFilter, MemberSpec, MemoryCluster, OperationType};
    use wcprobe_types::{Document, DocumentDraft};

    fn backoff() -> ReconnectBackoff {
        ReconnectBackoff::new(Duration::from_millis(50), Duration::from_millis(300), 2.0)
    }

    #[test]
    fn checkpoint_only_moves_forward() {
        let mut checkpoint = ResumeCheckpoint::new();
        assert_eq!(checkpoint.current(), None);

        assert!(checkpoint.advance(LogPosition::new(4)));
        assert!(!checkpoint.advance(LogPosition::new(4)));
        assert!(!checkpoint.advance(LogPosition::new(2)));
        assert!(checkpoint.advance(LogPosition::new(9)));

        assert_eq!(checkpoint.current(), Some(LogPosition::new(9)));
        assert_eq!(checkpoint.history(), &[LogPosition::new(4), LogPosition::new(9)]);
    }

    #[test]
    fn checkpoint_accepts_zero_tip() {
        let mut checkpoint = ResumeCheckpoint::new();
        assert!(checkpoint.advance(LogPosition::ZERO));
        assert!(checkpoint.advance(LogPosition::new(1)));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let mut backoff = backoff();
        let now = Instant::now();

        assert_eq!(backoff.schedule(now), Duration::from_millis(50));
        assert_eq!(backoff.schedule(now), Duration::from_millis(100));
        assert_eq!(backoff.schedule(now), Duration::from_millis(200));
        assert_eq!(backoff.schedule(now), Duration::from_millis(300));
        assert_eq!(backoff.schedule(now), Duration::from_millis(300));
        assert_eq!(backoff.attempts(), 5);
    }

    #[test]
    fn backoff_gates_until_due() {
        let mut backoff = backoff();
        let now = Instant::now();
        assert!(backoff.is_due(now));

        backoff.schedule(now);
        assert!(!backoff.is_due(now));
        assert!(backoff.is_due(now + Duration::from_millis(50)));

        backoff.reset();
        assert!(backoff.is_due(now));
        assert_eq!(backoff.delay(), Duration::from_millis(50));
    }

    fn settings() -> ObserverSettings {
        ObserverSettings {
            filter: FeedFilter::new("wctest", "tagged_insert"),
            supervise_interval: Duration::from_millis(10),
            backoff: backoff(),
            operation_timeout: Some(Duration::from_secs(1)),
            reconcile_tip_on_ack: true,
        }
    }

    fn cluster() -> MemoryCluster {
        MemoryCluster::new(
            ClusterSpec::new("rs0")
                .member(MemberSpec::primary("east1", "us-east"))
                .member(MemberSpec::secondary(
                    "central",
                    "us-central",
                    Duration::from_millis(5),
                )),
        )
        .unwrap()
    }

    fn spawn(
        cluster: &Arc<MemoryCluster>,
        settings: ObserverSettings,
    ) -> (CommandLink, ReportInbox, ReplicaObserver<MemoryCluster>) {
        let (link, inbox) = command_link("central", 8);
        let (sink, reports) = report_channel(64);
        let observer = ReplicaObserver::new(
            ReplicaTarget::new("central", "memory://central"),
            Arc::clone(cluster),
            settings,
            inbox,
            sink.for_region("central"),
        );
        (link, reports, observer)
    }

    /// Reads reports until one matches, returning it.
    async fn wait_for(reports: &mut ReportInbox, matches: impl Fn(&Report) -> bool) -> Report {
        loop {
            let (region, report) = reports.recv().await.unwrap().unwrap();
            assert_eq!(region, "central");
            if matches(&report) {
                return report;
            }
        }
    }

    /// Reads every remaining report; the observer must have exited.
    async fn drain(reports: &mut ReportInbox) -> Vec<Report> {
        let mut all = Vec::new();
        while let Some(frame) = reports.recv().await {
            all.push(frame.unwrap().1);
        }
        all
    }

    fn is_tip_line(report: &Report) -> bool {
        matches!(report, Report::Info(text) if text.starts_with("Log tip"))
    }

    fn tagged_document() -> Document {
        let mut doc = DocumentDraft::new("first").into_document();
        doc.tag("tagged_insert");
        doc
    }

    fn event_at(position: u64, document: Document) -> ChangeEvent {
        ChangeEvent {
            position: LogPosition::new(position),
            operation: OperationType::Insert,
            collection: "wctest".to_string(),
            cluster_time: document.created_at,
            document,
        }
    }

    #[tokio::test]
    async fn stop_before_any_session_exits_cleanly() {
        let cluster = Arc::new(cluster());
        cluster.set_tip_failure("central", true);

        let (link, mut reports, observer) = spawn(&cluster, settings());
        assert_eq!(observer.state(), SessionState::Starting);

        let task = tokio::spawn(observer.run());
        link.send(&Command::Stop("done".to_string())).await.unwrap();

        let report = task.await.unwrap().unwrap();
        assert_eq!(report.sessions_opened, 0);
        assert_eq!(report.first_tip, None);
        assert!(report.observations.is_empty());

        let narrated = drain(&mut reports).await;
        assert!(!narrated.contains(&Report::Ready));
        assert!(narrated.contains(&Report::Info("Stop received: done".to_string())));
    }

    #[tokio::test]
    async fn connect_failure_is_fatal() {
        let cluster = Arc::new(cluster());
        cluster.set_unreachable("central", true);

        let (_link, mut reports, observer) = spawn(&cluster, settings());

        assert!(observer.run().await.is_err());
        assert_eq!(
            drain(&mut reports).await,
            vec![Report::Info("Observer starting for memory://central".to_string())]
        );
    }

    #[tokio::test]
    async fn narrates_lifecycle_over_the_report_channel() {
        let cluster = Arc::new(cluster());
        let (link, mut reports, observer) = spawn(&cluster, settings());
        let task = tokio::spawn(observer.run());

        wait_for(&mut reports, |r| *r == Report::Ready).await;
        link.send(&Command::Stop("Test Complete".to_string()))
            .await
            .unwrap();
        task.await.unwrap().unwrap();

        let mut narrated = drain(&mut reports).await;
        assert_eq!(
            narrated.split_off(narrated.len() - 2),
            vec![
                Report::Info("Stop received: Test Complete".to_string()),
                Report::Info("Exited after 0 observations over 1 sessions".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn reports_ready_once_and_narrates_entries() {
        let cluster = Arc::new(cluster());
        let (link, mut reports, observer) = spawn(&cluster, settings());
        let task = tokio::spawn(observer.run());

        let startup = [
            wait_for(&mut reports, |_| true).await,
            wait_for(&mut reports, |_| true).await,
            wait_for(&mut reports, |_| true).await,
        ];
        assert_eq!(
            startup,
            [
                Report::Info("Observer starting for memory://central".to_string()),
                Report::Info("Connected to memory://central".to_string()),
                Report::Ready,
            ]
        );

        let writer = cluster
            .connect(&cluster.endpoint(), ConnectOptions::default())
            .await
            .unwrap();
        let doc = tagged_document();
        let id = doc.id;

        link.send(&Command::Sent(id)).await.unwrap();
        writer.insert_one("wctest", doc, None).await.unwrap();

        let expected = Report::Info(format!(
            "Received {id} while expecting {id} and last ack none"
        ));
        let seen = wait_for(&mut reports, |r| {
            assert_ne!(*r, Report::Ready);
            *r == expected
        })
        .await;
        assert_eq!(seen, expected);

        link.send(&Command::Stop("done".to_string())).await.unwrap();
        let report = task.await.unwrap().unwrap();
        assert_eq!(report.sessions_opened, 1);
        assert_eq!(report.first_tip, Some(LogPosition::ZERO));
        assert_eq!(report.observations.len(), 1);
        assert_eq!(report.observations[0].expecting, Some(id));
        assert!(report.observations[0].since_sent.is_some());
    }

    #[tokio::test]
    async fn ack_reconciles_log_tip() {
        let cluster = Arc::new(cluster());
        let (link, mut reports, observer) = spawn(&cluster, settings());
        let task = tokio::spawn(observer.run());
        wait_for(&mut reports, |r| *r == Report::Ready).await;

        let writer = cluster
            .connect(&cluster.endpoint(), ConnectOptions::default())
            .await
            .unwrap();
        let doc = tagged_document();
        let id = doc.id;
        writer.insert_one("wctest", doc, None).await.unwrap();
        wait_for(&mut reports, |r| {
            matches!(r, Report::Info(text) if text.starts_with("Received"))
        })
        .await;

        link.send(&Command::Ack(id)).await.unwrap();
        let tip = wait_for(&mut reports, is_tip_line).await;
        assert_eq!(
            tip,
            Report::Info(format!("Log tip 1, checkpoint 1, last ack {id}"))
        );

        link.send(&Command::Stop("done".to_string())).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn ack_without_reconciliation_reports_no_tip() {
        let cluster = Arc::new(cluster());
        let mut settings = settings();
        settings.reconcile_tip_on_ack = false;
        let (link, mut reports, observer) = spawn(&cluster, settings);
        let task = tokio::spawn(observer.run());
        wait_for(&mut reports, |r| *r == Report::Ready).await;

        link.send(&Command::Ack(DocumentId::generate())).await.unwrap();
        link.send(&Command::Stop("done".to_string())).await.unwrap();
        task.await.unwrap().unwrap();

        let narrated = drain(&mut reports).await;
        assert!(!narrated.iter().any(is_tip_line), "{narrated:?}");
    }

    #[tokio::test]
    async fn fetch_tip_reports_log_tip() {
        let cluster = Arc::new(cluster());
        let mut settings = settings();
        settings.reconcile_tip_on_ack = false;
        let (link, mut reports, observer) = spawn(&cluster, settings);
        let task = tokio::spawn(observer.run());
        wait_for(&mut reports, |r| *r == Report::Ready).await;

        link.send(&Command::FetchTip).await.unwrap();
        assert_eq!(
            wait_for(&mut reports, is_tip_line).await,
            Report::Info("Log tip 0, checkpoint 0, last ack none".to_string())
        );

        link.send(&Command::Stop("done".to_string())).await.unwrap();
        task.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn entries_at_or_before_checkpoint_are_dropped() {
        let cluster = Arc::new(cluster());
        let (_link, mut reports, mut observer) = spawn(&cluster, settings());
        observer.checkpoint.advance(LogPosition::new(5));

        let stale = tagged_document();
        let older = tagged_document();
        let fresh = tagged_document();
        let (stale_id, older_id, fresh_id) = (stale.id, older.id, fresh.id);

        observer.observe(event_at(5, stale)).await;
        observer.observe(event_at(3, older)).await;
        observer.observe(event_at(6, fresh)).await;

        assert_eq!(observer.observations.len(), 1);
        assert_eq!(observer.observations[0].document_id, fresh_id);
        assert_eq!(observer.checkpoint.current(), Some(LogPosition::new(6)));
        drop(observer);

        assert_eq!(
            drain(&mut reports).await,
            vec![
                Report::Debug(format!("Dropped duplicate {stale_id} at 5")),
                Report::Debug(format!("Dropped duplicate {older_id} at 3")),
                Report::Info(format!(
                    "Received {fresh_id} while expecting none and last ack none"
                )),
            ]
        );
    }
}
