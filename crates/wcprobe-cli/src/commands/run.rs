//! Run command - probes the configured scenarios.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use wcprobe::{ProbeSettings, RunReport, TestOrchestrator, cluster_spec};
use wcprobe_config::ProbeConfig;
use wcprobe_random::PayloadGenerator;
use wcprobe_store::MemoryCluster;

pub fn run(config: ProbeConfig, seed: Option<u64>) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let report = runtime.block_on(execute(config, seed))?;
    print_summary(&report);
    Ok(())
}

async fn execute(config: ProbeConfig, seed: Option<u64>) -> Result<RunReport> {
    let cluster = MemoryCluster::new(cluster_spec(&config.simulation))
        .context("Failed to build simulated replica set")?;

    let generator = match seed.or(config.random.seed) {
        Some(seed) => PayloadGenerator::seeded(seed, config.random.prime),
        None => PayloadGenerator::new(),
    };

    info!(
        cluster = cluster.name(),
        targets = config.targets.len(),
        scenarios = config.scenarios.len(),
        "starting probe"
    );

    TestOrchestrator::new(
        Arc::new(cluster),
        config.targets.clone(),
        ProbeSettings::from(&config),
    )
    .with_generator(generator)
    .run(&config.scenarios)
    .await
    .context("Probe run failed")
}

fn print_summary(report: &RunReport) {
    println!("Run complete: {} tagged writes", report.tagged.len());
    println!();
    println!("{:<12} {:>9} {:>9} {:>10}", "REGION", "OBSERVED", "SESSIONS", "FIRST TIP");
    for observer in &report.observers {
        println!(
            "{:<12} {:>9} {:>9} {:>10}",
            observer.region,
            observer.observations.len(),
            observer.sessions_opened,
            observer
                .first_tip
                .map_or_else(|| "-".to_string(), |tip| tip.to_string())
        );
    }
}
