//! In-process simulated replica set.
//!
//! `MemoryCluster` keeps one operation log per member. Writes land on the
//! primary, which assigns log positions, and are then shipped to every
//! secondary through a FIFO replication queue that applies each entry after
//! the member's configured delay. Write concerns wait on the set of members
//! that have applied the write, so the observable behavior matches a real
//! replica set with lagging secondaries:
//! - `w: 1` returns as soon as the primary has the write
//! - `w: n` / `majority` wait for the n-th fastest member
//! - named modes wait for members spanning the required number of zones
//!
//! Endpoints use the `memory://` scheme: `memory://<region>` addresses one
//! member directly, `memory://<cluster-name>` addresses the replica set.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace};
use wcprobe_types::{Document, DocumentId, LogPosition, MemberRole, MemberStatus, WriteConcern};

use crate::{
    ChangeEvent, ChangeFeed, ConnectOptions, Connector, FeedFilter, InsertReceipt, OperationType,
    Result, StoreClient, StoreError,
};

/// Endpoint scheme understood by [`MemoryCluster`].
pub const SCHEME: &str = "memory://";

const FEED_BUFFER: usize = 1024;

/// One simulated member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSpec {
    pub region: String,
    /// Zone tag counted by named write concern modes.
    pub zone: String,
    /// Time between the primary accepting a write and this member applying it.
    pub replication_delay: Duration,
    pub primary: bool,
}

impl MemberSpec {
    pub fn primary(region: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            zone: zone.into(),
            replication_delay: Duration::ZERO,
            primary: true,
        }
    }

    pub fn secondary(
        region: impl Into<String>,
        zone: impl Into<String>,
        replication_delay: Duration,
    ) -> Self {
        Self {
            region: region.into(),
            zone: zone.into(),
            replication_delay,
            primary: false,
        }
    }
}

/// Shape of a simulated replica set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSpec {
    pub name: String,
    pub members: Vec<MemberSpec>,
    /// Named write concern modes: mode name to number of distinct zones.
    pub modes: BTreeMap<String, usize>,
}

impl ClusterSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            members: Vec::new(),
            modes: BTreeMap::new(),
        }
    }

    pub fn member(mut self, member: MemberSpec) -> Self {
        self.members.push(member);
        self
    }

    pub fn mode(mut self, name: impl Into<String>, zones: usize) -> Self {
        self.modes.insert(name.into(), zones);
        self
    }
}

#[derive(Debug)]
struct OplogEntry {
    position: LogPosition,
    collection: String,
    document: Document,
    cluster_time: DateTime<Utc>,
}

#[derive(Debug)]
struct Member {
    spec: MemberSpec,
    log: Mutex<Vec<Arc<OplogEntry>>>,
    applied: watch::Sender<LogPosition>,
    disconnects: watch::Sender<u64>,
    tip_failure: AtomicBool,
    unreachable: AtomicBool,
}

impl Member {
    fn new(spec: MemberSpec) -> Self {
        Self {
            spec,
            log: Mutex::new(Vec::new()),
            applied: watch::Sender::new(LogPosition::ZERO),
            disconnects: watch::Sender::new(0),
            tip_failure: AtomicBool::new(false),
            unreachable: AtomicBool::new(false),
        }
    }

    fn lock_log(&self) -> MutexGuard<'_, Vec<Arc<OplogEntry>>> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, entry: Arc<OplogEntry>) {
        let position = entry.position;
        self.lock_log().push(entry);
        self.applied.send_replace(position);
    }

    fn applied(&self) -> LogPosition {
        *self.applied.borrow()
    }

    /// Entries strictly after `cursor`. Positions are dense from 1, so the
    /// entry at position `p` sits at index `p - 1`.
    fn entries_after(&self, cursor: LogPosition) -> Vec<Arc<OplogEntry>> {
        let log = self.lock_log();
        let start = (cursor.as_u64() as usize).min(log.len());
        log[start..].to_vec()
    }

    fn check_reachable(&self) -> Result<()> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(self.spec.region.clone()));
        }
        Ok(())
    }
}

type ReplicationQueue = mpsc::UnboundedSender<(Arc<OplogEntry>, Instant)>;

#[derive(Debug)]
struct Shared {
    name: String,
    members: Vec<Arc<Member>>,
    primary: usize,
    modes: BTreeMap<String, usize>,
    replication: Vec<ReplicationQueue>,
    /// Document ids per collection, guarded for the whole append so log
    /// positions are assigned in one total order.
    writes: Mutex<HashMap<String, HashSet<DocumentId>>>,
    progress: Arc<watch::Sender<u64>>,
}

enum Requirement {
    None,
    Members(usize),
    Zones(usize),
}

/// Simulated replica set shared by every connection made to it.
#[derive(Debug, Clone)]
pub struct MemoryCluster {
    shared: Arc<Shared>,
}

impl MemoryCluster {
    /// Builds the replica set and starts one replication task per secondary.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(spec: ClusterSpec) -> Result<Self> {
        if spec.members.is_empty() {
            return Err(StoreError::InvalidTopology(
                "replica set has no members".to_string(),
            ));
        }
        let primaries: Vec<usize> = spec
            .members
            .iter()
            .enumerate()
            .filter(|(_, m)| m.primary)
            .map(|(i, _)| i)
            .collect();
        let &[primary] = primaries.as_slice() else {
            return Err(StoreError::InvalidTopology(format!(
                "expected exactly one primary, found {}",
                primaries.len()
            )));
        };
        let mut regions = HashSet::new();
        for member in &spec.members {
            if !regions.insert(member.region.as_str()) {
                return Err(StoreError::InvalidTopology(format!(
                    "duplicate member region {}",
                    member.region
                )));
            }
            if member.region == spec.name {
                return Err(StoreError::InvalidTopology(format!(
                    "member region {} collides with the replica set name",
                    member.region
                )));
            }
        }

        let progress = Arc::new(watch::Sender::new(0u64));
        let members: Vec<Arc<Member>> = spec
            .members
            .into_iter()
            .map(|m| Arc::new(Member::new(m)))
            .collect();

        let mut replication = Vec::with_capacity(members.len() - 1);
        for (i, member) in members.iter().enumerate() {
            if i == primary {
                continue;
            }
            let (tx, rx) = mpsc::unbounded_channel();
            tokio::spawn(replicate(Arc::clone(member), rx, Arc::clone(&progress)));
            replication.push(tx);
        }

        Ok(Self {
            shared: Arc::new(Shared {
                name: spec.name,
                members,
                primary,
                modes: spec.modes,
                replication,
                writes: Mutex::new(HashMap::new()),
                progress,
            }),
        })
    }

    /// Replica set name, also its endpoint target.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// Endpoint addressing the replica set as a whole.
    pub fn endpoint(&self) -> String {
        format!("{SCHEME}{}", self.shared.name)
    }

    /// Endpoint addressing one member directly.
    pub fn member_endpoint(&self, region: &str) -> String {
        format!("{SCHEME}{region}")
    }

    pub fn regions(&self) -> Vec<String> {
        self.shared
            .members
            .iter()
            .map(|m| m.spec.region.clone())
            .collect()
    }

    /// Last position applied by a member.
    pub fn applied(&self, region: &str) -> Option<LogPosition> {
        self.find(region).map(|i| self.shared.members[i].applied())
    }

    /// Last position accepted by the primary.
    pub fn primary_tip(&self) -> LogPosition {
        self.primary().applied()
    }

    /// Ends every open feed on a member, as if its sessions were dropped.
    pub fn disconnect_feeds(&self, region: &str) -> bool {
        let Some(i) = self.find(region) else {
            return false;
        };
        self.shared.members[i]
            .disconnects
            .send_modify(|epoch| *epoch += 1);
        true
    }

    /// Makes tip queries against a member fail.
    pub fn set_tip_failure(&self, region: &str, failing: bool) -> bool {
        let Some(i) = self.find(region) else {
            return false;
        };
        self.shared.members[i]
            .tip_failure
            .store(failing, Ordering::SeqCst);
        true
    }

    /// Makes a member refuse new connections and requests.
    pub fn set_unreachable(&self, region: &str, unreachable: bool) -> bool {
        let Some(i) = self.find(region) else {
            return false;
        };
        self.shared.members[i]
            .unreachable
            .store(unreachable, Ordering::SeqCst);
        true
    }

    fn find(&self, region: &str) -> Option<usize> {
        self.shared
            .members
            .iter()
            .position(|m| m.spec.region == region)
    }

    fn primary(&self) -> &Arc<Member> {
        &self.shared.members[self.shared.primary]
    }

    fn requirement(&self, concern: &WriteConcern) -> Result<Requirement> {
        let members = self.shared.members.len();
        match concern {
            WriteConcern::Unacknowledged => Ok(Requirement::None),
            WriteConcern::Nodes(n) => {
                let n = *n as usize;
                if n > members {
                    return Err(StoreError::UnsatisfiableWriteConcern {
                        concern: concern.clone(),
                        members,
                    });
                }
                Ok(Requirement::Members(n))
            }
            WriteConcern::Majority => Ok(Requirement::Members(members / 2 + 1)),
            WriteConcern::Mode(name) => {
                let zones = *self
                    .shared
                    .modes
                    .get(name)
                    .ok_or_else(|| StoreError::UnknownWriteConcernMode(name.clone()))?;
                let available: BTreeSet<&str> = self
                    .shared
                    .members
                    .iter()
                    .map(|m| m.spec.zone.as_str())
                    .collect();
                if zones > available.len() {
                    return Err(StoreError::UnsatisfiableWriteConcern {
                        concern: concern.clone(),
                        members,
                    });
                }
                Ok(Requirement::Zones(zones))
            }
        }
    }

    fn satisfied(&self, requirement: &Requirement, position: LogPosition) -> bool {
        let acked = self
            .shared
            .members
            .iter()
            .filter(|m| m.applied() >= position);
        match requirement {
            Requirement::None => true,
            Requirement::Members(n) => acked.count() >= *n,
            Requirement::Zones(n) => {
                acked
                    .map(|m| m.spec.zone.as_str())
                    .collect::<BTreeSet<_>>()
                    .len()
                    >= *n
            }
        }
    }

    /// Appends documents to the primary's log and queues them for replication.
    fn append(&self, collection: &str, documents: Vec<Document>) -> Result<LogPosition> {
        let mut writes = self
            .shared
            .writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let known = writes.entry(collection.to_string()).or_default();

        let mut batch = HashSet::with_capacity(documents.len());
        for document in &documents {
            if known.contains(&document.id) || !batch.insert(document.id) {
                return Err(StoreError::DuplicateKey(document.id));
            }
        }
        known.extend(batch);

        let primary = self.primary();
        let cluster_time = Utc::now();
        let enqueued = Instant::now();
        let mut last = primary.applied();
        for document in documents {
            last = last.next();
            let entry = Arc::new(OplogEntry {
                position: last,
                collection: collection.to_string(),
                document,
                cluster_time,
            });
            primary.apply(Arc::clone(&entry));
            for queue in &self.shared.replication {
                // A closed queue means the runtime is shutting down.
                let _ = queue.send((Arc::clone(&entry), enqueued));
            }
        }
        self.shared.progress.send_modify(|v| *v += 1);
        Ok(last)
    }

    async fn await_concern(&self, requirement: Requirement, position: LogPosition) {
        let mut progress = self.shared.progress.subscribe();
        while !self.satisfied(&requirement, position) {
            // The sender lives in `self.shared`, so this never errors.
            if progress.changed().await.is_err() {
                return;
            }
        }
    }
}

async fn replicate(
    member: Arc<Member>,
    mut queue: mpsc::UnboundedReceiver<(Arc<OplogEntry>, Instant)>,
    progress: Arc<watch::Sender<u64>>,
) {
    while let Some((entry, enqueued)) = queue.recv().await {
        sleep_until(enqueued + member.spec.replication_delay).await;
        trace!(region = %member.spec.region, position = %entry.position, "applied");
        member.apply(entry);
        progress.send_modify(|v| *v += 1);
    }
}

async fn pump_feed(
    member: Arc<Member>,
    filter: FeedFilter,
    mut cursor: LogPosition,
    mut applied: watch::Receiver<LogPosition>,
    mut disconnects: watch::Receiver<u64>,
    tx: mpsc::Sender<Result<ChangeEvent>>,
) {
    loop {
        for entry in member.entries_after(cursor) {
            cursor = entry.position;
            if !filter.matches(OperationType::Insert, &entry.collection, &entry.document) {
                continue;
            }
            let event = ChangeEvent {
                position: entry.position,
                operation: OperationType::Insert,
                collection: entry.collection.clone(),
                document: entry.document.clone(),
                cluster_time: entry.cluster_time,
            };
            tokio::select! {
                sent = tx.send(Ok(event)) => {
                    if sent.is_err() {
                        return;
                    }
                }
                _ = disconnects.changed() => {
                    debug!(region = %member.spec.region, %cursor, "feed disconnected");
                    return;
                }
            }
        }

        tokio::select! {
            changed = applied.changed() => {
                if changed.is_err() {
                    return;
                }
            }
            _ = disconnects.changed() => {
                debug!(region = %member.spec.region, %cursor, "feed disconnected");
                return;
            }
            () = tx.closed() => return,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    ReplicaSet,
    Member(usize),
}

/// Connection to a [`MemoryCluster`].
#[derive(Debug)]
pub struct MemoryClient {
    cluster: MemoryCluster,
    route: Route,
    default_concern: Option<WriteConcern>,
    closed: AtomicBool,
}

impl MemoryClient {
    fn member(&self) -> &Arc<Member> {
        match self.route {
            Route::ReplicaSet => self.cluster.primary(),
            Route::Member(i) => &self.cluster.shared.members[i],
        }
    }

    fn ensure_open(&self) -> Result<&Arc<Member>> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Closed);
        }
        let member = self.member();
        member.check_reachable()?;
        Ok(member)
    }

    fn ensure_writable(&self) -> Result<()> {
        let member = self.ensure_open()?;
        if let Route::Member(i) = self.route
            && i != self.cluster.shared.primary
        {
            return Err(StoreError::NotPrimary(member.spec.region.clone()));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreClient for MemoryClient {
    async fn insert_one(
        &self,
        collection: &str,
        document: Document,
        concern: Option<WriteConcern>,
    ) -> Result<InsertReceipt> {
        self.insert_many(collection, vec![document], concern).await
    }

    async fn insert_many(
        &self,
        collection: &str,
        documents: Vec<Document>,
        concern: Option<WriteConcern>,
    ) -> Result<InsertReceipt> {
        self.ensure_writable()?;
        let concern = concern
            .or_else(|| self.default_concern.clone())
            .unwrap_or_default();
        let requirement = self.cluster.requirement(&concern)?;

        let inserted = documents.len();
        let last_position = self.cluster.append(collection, documents)?;
        self.cluster.await_concern(requirement, last_position).await;

        Ok(InsertReceipt {
            inserted,
            last_position,
            concern,
        })
    }

    async fn open_feed(
        &self,
        filter: FeedFilter,
        resume_after: Option<LogPosition>,
    ) -> Result<ChangeFeed> {
        let member = Arc::clone(self.ensure_open()?);
        // Subscribe before reading the cursor so nothing applied in between is missed.
        let applied = member.applied.subscribe();
        let disconnects = member.disconnects.subscribe();
        let cursor = resume_after.unwrap_or_else(|| member.applied());

        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let pump = tokio::spawn(pump_feed(member, filter, cursor, applied, disconnects, tx));
        Ok(ChangeFeed::new(rx, pump, cursor))
    }

    async fn log_tip(&self) -> Result<LogPosition> {
        let member = self.ensure_open()?;
        if member.tip_failure.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(member.spec.region.clone()));
        }
        Ok(member.applied())
    }

    async fn member_status(&self) -> Result<MemberStatus> {
        let member = self.ensure_open()?;
        let role = if member.spec.primary {
            MemberRole::Primary
        } else {
            MemberRole::Secondary
        };
        Ok(MemberStatus {
            region: member.spec.region.clone(),
            role,
            applied: member.applied(),
        })
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl Connector for MemoryCluster {
    type Client = MemoryClient;

    async fn connect(&self, endpoint: &str, options: ConnectOptions) -> Result<MemoryClient> {
        let target = endpoint
            .strip_prefix(SCHEME)
            .ok_or_else(|| StoreError::UnsupportedEndpoint(endpoint.to_string()))?
            .trim_end_matches('/');

        let route = if target == self.shared.name {
            Route::ReplicaSet
        } else {
            self.find(target)
                .map(Route::Member)
                .ok_or_else(|| StoreError::UnknownEndpoint(endpoint.to_string()))?
        };

        let client = MemoryClient {
            cluster: self.clone(),
            route,
            default_concern: options.default_concern,
            closed: AtomicBool::new(false),
        };
        client.member().check_reachable()?;
        debug!(endpoint, "connected");
        Ok(client)
    }
}
