//! End-to-end runs against the in-process replica set.
//!
//! Every test builds a five-member cluster spread over three zones with short
//! replication delays, so the full script finishes in well under a second.

use std::sync::Arc;

use wcprobe::{ObserverReport, ProbeSettings, TestOrchestrator, cluster_spec};
use wcprobe_config::{ProbeConfig, SimulatedMember};
use wcprobe_random::PayloadGenerator;
use wcprobe_store::MemoryCluster;
use wcprobe_types::{DocumentId, LogPosition};

fn fast_config() -> ProbeConfig {
    let mut config = ProbeConfig::default();
    config.script.filler_count = 50;
    config.simulation.members = vec![
        SimulatedMember::new("east1", "us-east", 0, true),
        SimulatedMember::new("east2", "us-east", 3, false),
        SimulatedMember::new("east3", "us-east", 5, false),
        SimulatedMember::new("central", "us-central", 12, false),
        SimulatedMember::new("ireland", "eu-west", 30, false),
    ];
    config.timing.scenario_pause_ms = 0;
    // Long enough for the slowest member to apply everything before stop.
    config.timing.shutdown_pause_ms = 300;
    config.timing.shutdown_poll_ms = 10;
    config.timing.supervise_interval_ms = 10;
    config.timing.reconnect_initial_ms = 10;
    config.timing.ready_timeout_ms = Some(5_000);
    config
}

fn cluster(config: &ProbeConfig) -> Arc<MemoryCluster> {
    Arc::new(MemoryCluster::new(cluster_spec(&config.simulation)).expect("valid topology"))
}

fn seen(report: &ObserverReport) -> Vec<DocumentId> {
    report.observations.iter().map(|o| o.document_id).collect()
}

fn assert_monotonic(report: &ObserverReport) {
    assert!(
        report.checkpoints.windows(2).all(|w| w[0] < w[1]),
        "{}: checkpoints went backwards: {:?}",
        report.region,
        report.checkpoints
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_run_reports_every_tagged_write() {
    let config = fast_config();
    let cluster = cluster(&config);

    let report = TestOrchestrator::new(
        Arc::clone(&cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .with_generator(PayloadGenerator::seeded(7, None))
    .run(&config.scenarios)
    .await
    .expect("run completes");

    // Four tagged writes per scenario, two scenarios.
    assert_eq!(report.tagged.len(), 8);
    assert_eq!(report.observers.len(), 5);

    // Tagged writes plus two batches of filler.
    assert_eq!(cluster.primary_tip(), LogPosition::new(8 + 2 * 50));

    for observer in &report.observers {
        assert_eq!(seen(observer), report.tagged, "{}", observer.region);
        assert_eq!(observer.sessions_opened, 1);
        assert_eq!(observer.first_tip, Some(LogPosition::ZERO));
        assert_monotonic(observer);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_primary_observer_sees_writes_while_expecting_them() {
    let mut config = fast_config();
    // Writes acknowledge only after slower secondaries apply them, giving the
    // primary's observer time to narrate each one before the next `sent`.
    for (member, delay_ms) in config.simulation.members[1..].iter_mut().zip([25, 30, 40, 60]) {
        member.delay_ms = delay_ms;
    }
    let cluster = cluster(&config);

    let report = TestOrchestrator::new(
        Arc::clone(&cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .run(&config.scenarios)
    .await
    .expect("run completes");

    let primary = report
        .observers
        .iter()
        .find(|o| o.region == "east1")
        .expect("primary observer reported");

    let mut previous = None;
    for observation in &primary.observations {
        assert_eq!(observation.expecting, Some(observation.document_id));
        assert_eq!(observation.last_acked, previous);
        assert!(observation.since_sent.is_some());
        previous = Some(observation.document_id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_observers_ignore_history_before_their_start() {
    let config = fast_config();
    let cluster = cluster(&config);

    // A first run leaves tagged entries in every member's log.
    let first = TestOrchestrator::new(
        Arc::clone(&cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .run(&config.scenarios[..1])
    .await
    .expect("first run completes");
    let tip = cluster.primary_tip();
    assert!(tip > LogPosition::ZERO);

    let second = TestOrchestrator::new(
        Arc::clone(&cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .run(&config.scenarios[1..])
    .await
    .expect("second run completes");

    for observer in &second.observers {
        assert_eq!(observer.first_tip, Some(tip), "{}", observer.region);
        assert!(observer.observations.iter().all(|o| o.position > tip));
        assert_eq!(seen(observer), second.tagged);
        assert!(first.tagged.iter().all(|id| !seen(observer).contains(id)));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_filler_never_matches() {
    let mut config = fast_config();
    config.script.steps = vec![wcprobe_config::ScriptStep::Filler];
    config.script.filler_count = 200;
    let cluster = cluster(&config);

    let report = TestOrchestrator::new(
        Arc::clone(&cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .run(&config.scenarios)
    .await
    .expect("run completes");

    assert!(report.tagged.is_empty());
    assert_eq!(cluster.primary_tip(), LogPosition::new(400));
    for observer in &report.observers {
        assert!(observer.observations.is_empty(), "{}", observer.region);
    }
}
