//! Test orchestration.
//!
//! The orchestrator is the only writer. It spawns one [`ReplicaObserver`] per
//! target, waits until every one of them has a feed open, then runs the write
//! script once per connection variant, strictly in order. Tagged writes are
//! bracketed by `sent` and `ack` broadcasts so observers can annotate what
//! they see; filler writes are not announced. Once the scenarios are done the
//! observers are told to stop and polled until none is left running.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep, timeout};
use tracing::{debug, info, warn};
use wcprobe_config::ScriptStep;
use wcprobe_random::PayloadGenerator;
use wcprobe_store::{ConnectOptions, Connector, StoreClient};
use wcprobe_types::{
    ConnectionVariant, Document, DocumentDraft, DocumentId, FillerPayload, ReplicaTarget,
    WriteConcern,
};

use crate::control::{CommandLink, ReportInbox, ReportSink, command_link, report_channel};
use crate::{
    Command, Error, ObserverReport, ProbeSettings, ReplicaObserver, Report, Result, bounded,
};

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Ids of every tagged write, in the order they were issued.
    pub tagged: Vec<DocumentId>,
    /// One report per observer that exited normally, in target order.
    pub observers: Vec<ObserverReport>,
}

struct ObserverHandle {
    link: CommandLink,
    task: JoinHandle<Result<ObserverReport>>,
}

/// Drives observers and writes for a set of targets.
pub struct TestOrchestrator<C: Connector> {
    connector: Arc<C>,
    targets: Vec<ReplicaTarget>,
    settings: ProbeSettings,
    generator: PayloadGenerator,
    observers: Vec<ObserverHandle>,
    sink: Option<ReportSink>,
    inbox: Option<ReportInbox>,
    ready: HashSet<String>,
    relay: Option<JoinHandle<()>>,
    tagged: Vec<DocumentId>,
}

impl<C: Connector> TestOrchestrator<C> {
    pub fn new(connector: Arc<C>, targets: Vec<ReplicaTarget>, settings: ProbeSettings) -> Self {
        let (sink, inbox) = report_channel(settings.channel_capacity);
        Self {
            connector,
            targets,
            settings,
            generator: PayloadGenerator::new(),
            observers: Vec::new(),
            sink: Some(sink),
            inbox: Some(inbox),
            ready: HashSet::new(),
            relay: None,
            tagged: Vec::new(),
        }
    }

    /// Replaces the filler generator, e.g. with a seeded one.
    pub fn with_generator(mut self, generator: PayloadGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Ids of the tagged writes issued so far.
    pub fn tagged(&self) -> &[DocumentId] {
        &self.tagged
    }

    pub fn ready_count(&self) -> usize {
        self.ready.len()
    }

    /// Observers whose task has not finished.
    pub fn live_observers(&self) -> usize {
        self.observers
            .iter()
            .filter(|o| !o.task.is_finished())
            .count()
    }

    /// Starts one observer per target. Returns how many were started.
    pub fn spawn_observers(&mut self) -> Result<usize> {
        let sink = self
            .sink
            .take()
            .ok_or(Error::InvalidState("observers already spawned"))?;

        for target in &self.targets {
            let (link, inbox) = command_link(&target.region, self.settings.channel_capacity);
            let observer = ReplicaObserver::new(
                target.clone(),
                Arc::clone(&self.connector),
                self.settings.observer.clone(),
                inbox,
                sink.for_region(&target.region),
            );
            info!(region = %target.region, endpoint = %target.endpoint, "Spawn monitor");
            let task = tokio::spawn(observer.run());
            self.observers.push(ObserverHandle { link, task });
        }

        Ok(self.observers.len())
    }

    /// Waits until `expected` distinct observers have reported ready.
    ///
    /// Fails with [`Error::ReadyTimeout`] once the configured ready timeout
    /// elapses, and with [`Error::ObserversExited`] as soon as every observer
    /// that has not reported ready is gone.
    pub async fn await_ready(&mut self, expected: usize) -> Result<()> {
        let mut inbox = self
            .inbox
            .take()
            .ok_or(Error::InvalidState("report inbox already handed to the relay"))?;
        let result = self.wait_for_ready(&mut inbox, expected).await;
        self.inbox = Some(inbox);
        if result.is_ok() {
            self.start_relay();
        }
        result
    }

    async fn wait_for_ready(&mut self, inbox: &mut ReportInbox, expected: usize) -> Result<()> {
        let started = Instant::now();
        let deadline = self.settings.ready_timeout.map(|limit| started + limit);
        let poll = self.settings.observer.supervise_interval;

        while self.ready.len() < expected {
            let now = Instant::now();
            if let Some(deadline) = deadline
                && now >= deadline
            {
                return Err(Error::ReadyTimeout {
                    ready: self.ready.len(),
                    expected,
                    waited: started.elapsed(),
                });
            }
            let owed_alive = self
                .observers
                .iter()
                .any(|o| !o.task.is_finished() && !self.ready.contains(o.link.region()));
            if !owed_alive {
                return Err(Error::ObserversExited {
                    ready: self.ready.len(),
                    expected,
                });
            }

            let wait = deadline.map_or(poll, |d| poll.min(d.saturating_duration_since(now)));
            match timeout(wait, inbox.recv()).await {
                Err(_) => {}
                Ok(Some(frame)) => log_report(frame, &mut self.ready),
                Ok(None) => {
                    return Err(Error::ObserversExited {
                        ready: self.ready.len(),
                        expected,
                    });
                }
            }
        }

        info!(ready = self.ready.len(), "all observers ready");
        Ok(())
    }

    fn start_relay(&mut self) {
        let Some(mut inbox) = self.inbox.take() else {
            return;
        };
        let mut ready = self.ready.clone();
        self.relay = Some(tokio::spawn(async move {
            while let Some(frame) = inbox.recv().await {
                log_report(frame, &mut ready);
            }
            debug!("report relay finished");
        }));
    }

    /// Delivers `command` to every observer still listening.
    pub async fn broadcast(&self, command: &Command) {
        debug!(tag = command.tag(), "broadcast");
        for observer in &self.observers {
            if let Err(e) = observer.link.send(command).await {
                warn!(region = observer.link.region(), tag = command.tag(), error = %e, "broadcast not delivered");
            }
        }
    }

    /// Writes one tagged document, announcing it before and after.
    ///
    /// `concern = None` uses the connection default. `ack` is broadcast only
    /// after the insert has returned.
    pub async fn send_tagged(
        &mut self,
        client: &C::Client,
        draft: DocumentDraft,
        concern: Option<WriteConcern>,
    ) -> Result<DocumentId> {
        let mut document = draft.into_document();
        document.tag(&self.settings.tag_field);
        let id = document.id;
        debug!(%id, kind = %document.kind, "tagging");

        self.broadcast(&Command::Sent(id)).await;
        info!(
            %id,
            concern = %concern.as_ref().map_or_else(|| "default".to_string(), ToString::to_string),
            "Insert"
        );
        let receipt = bounded(
            self.settings.operation_timeout,
            "insert",
            client.insert_one(&self.settings.collection, document, concern),
        )
        .await?;
        self.broadcast(&Command::Ack(id)).await;
        info!(%id, concern = %receipt.concern, position = %receipt.last_position, "Insert acknowledged");
        self.tagged.push(id);

        match bounded(self.settings.operation_timeout, "log tip query", client.log_tip()).await {
            Ok(tip) => info!(%id, %tip, "primary log tip"),
            Err(e) => warn!(%id, error = %e, "primary log tip query failed"),
        }

        Ok(id)
    }

    /// Writes the configured number of untagged random documents in one batch.
    pub async fn send_filler(&mut self, client: &C::Client) -> Result<()> {
        let count = self.settings.filler_count;
        if count == 0 {
            return Ok(());
        }
        let documents: Vec<Document> = (0..count)
            .map(|_| {
                DocumentDraft::new("random")
                    .with_payload(FillerPayload {
                        name: self.generator.random_string(None, None),
                        value: self.generator.random_int(None),
                    })
                    .into_document()
            })
            .collect();

        let receipt = bounded(
            self.settings.operation_timeout,
            "filler insert",
            client.insert_many(
                &self.settings.collection,
                documents,
                Some(self.settings.filler_concern.clone()),
            ),
        )
        .await?;
        info!(inserted = receipt.inserted, concern = %receipt.concern, "filler inserted");
        Ok(())
    }

    /// Runs the write script over one connection variant.
    pub async fn run_scenario(&mut self, variant: &ConnectionVariant) -> Result<()> {
        info!(scenario = %variant, "Begin test");
        let client = self
            .connector
            .connect(
                &variant.endpoint,
                ConnectOptions::with_default_concern(variant.default_concern.clone()),
            )
            .await?;

        let result = self.run_script(&client).await;
        if let Err(e) = client.close().await {
            warn!(scenario = %variant.name, error = %e, "failed to close writer connection");
        }
        match &result {
            Ok(()) => debug!(scenario = %variant.name, "Complete"),
            Err(e) => warn!(scenario = %variant.name, error = %e, "scenario aborted"),
        }
        result
    }

    async fn run_script(&mut self, client: &C::Client) -> Result<()> {
        for step in self.settings.steps.clone() {
            match step {
                ScriptStep::Tagged { kind, elevated } => {
                    let concern = elevated.then(|| self.settings.elevated_concern.clone());
                    self.send_tagged(client, DocumentDraft::new(kind), concern)
                        .await?;
                }
                ScriptStep::Filler => self.send_filler(client).await?,
            }
        }
        Ok(())
    }

    /// Runs every scenario in order, pausing between them. Stops at the first
    /// failed write.
    pub async fn run_all(&mut self, scenarios: &[ConnectionVariant]) -> Result<()> {
        for (i, variant) in scenarios.iter().enumerate() {
            if i > 0 && !self.settings.scenario_pause.is_zero() {
                sleep(self.settings.scenario_pause).await;
            }
            self.run_scenario(variant).await?;
        }
        Ok(())
    }

    /// Stops every observer and waits for all of them to exit.
    ///
    /// Returns the reports of observers that exited normally.
    pub async fn shutdown(&mut self, reason: &str) -> Vec<ObserverReport> {
        self.sink = None;
        self.start_relay();

        if !self.settings.shutdown_pause.is_zero() {
            sleep(self.settings.shutdown_pause).await;
        }
        self.broadcast(&Command::Stop(reason.to_string())).await;

        loop {
            let live = self.live_observers();
            debug!(live, "workers");
            if live == 0 {
                break;
            }
            sleep(self.settings.shutdown_poll).await;
        }
        info!("All observers stopped");

        let mut reports = Vec::with_capacity(self.observers.len());
        for observer in self.observers.drain(..) {
            let region = observer.link.region().to_string();
            match observer.task.await {
                Ok(Ok(report)) => reports.push(report),
                Ok(Err(e)) => warn!(%region, error = %e, "observer failed"),
                Err(e) => warn!(%region, error = %e, "observer task aborted"),
            }
        }

        if let Some(relay) = self.relay.take()
            && let Err(e) = relay.await
        {
            warn!(error = %e, "report relay aborted");
        }
        reports
    }

    /// Spawns the observers, waits for all of them, runs every scenario and
    /// shuts down.
    ///
    /// Shutdown happens even if the barrier or a write failed; that error is
    /// returned afterwards.
    pub async fn run(mut self, scenarios: &[ConnectionVariant]) -> Result<RunReport> {
        let expected = self.spawn_observers()?;
        let outcome = match self.await_ready(expected).await {
            Ok(()) => self.run_all(scenarios).await,
            Err(e) => Err(e),
        };

        let reason = if outcome.is_ok() {
            "Test Complete"
        } else {
            "Test Aborted"
        };
        let observers = self.shutdown(reason).await;
        outcome?;

        Ok(RunReport {
            tagged: self.tagged,
            observers,
        })
    }
}

fn log_report(frame: Result<(String, Report)>, ready: &mut HashSet<String>) {
    match frame {
        Ok((region, Report::Ready)) => {
            if ready.insert(region.clone()) {
                info!(%region, ready = ready.len(), "ready");
            } else {
                warn!(%region, "duplicate ready ignored");
            }
        }
        Ok((region, Report::Info(msg))) => info!(%region, "{msg}"),
        Ok((region, Report::Debug(msg))) => debug!(%region, "{msg}"),
        Ok((region, Report::Unknown(tag))) => warn!(%region, %tag, "unknown report"),
        Err(e) => warn!(error = %e, "ignoring undecodable report frame"),
    }
}
