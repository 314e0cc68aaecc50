//! Runtime settings derived from [`ProbeConfig`].

use std::time::Duration;
use wcprobe_config::{ProbeConfig, ScriptStep, SimulationConfig};
use wcprobe_store::{ClusterSpec, FeedFilter, MemberSpec};
use wcprobe_types::WriteConcern;

use crate::ReconnectBackoff;

/// Per-observer settings, cloned into every observer at spawn.
#[derive(Debug, Clone)]
pub struct ObserverSettings {
    pub filter: FeedFilter,
    pub supervise_interval: Duration,
    pub backoff: ReconnectBackoff,
    pub operation_timeout: Option<Duration>,
    pub reconcile_tip_on_ack: bool,
}

/// Everything the orchestrator needs besides targets and scenarios.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    /// Qualified `database.collection` key.
    pub collection: String,
    pub tag_field: String,
    pub steps: Vec<ScriptStep>,
    pub elevated_concern: WriteConcern,
    pub filler_count: usize,
    pub filler_concern: WriteConcern,
    pub scenario_pause: Duration,
    pub shutdown_pause: Duration,
    pub shutdown_poll: Duration,
    pub operation_timeout: Option<Duration>,
    pub ready_timeout: Option<Duration>,
    pub channel_capacity: usize,
    pub observer: ObserverSettings,
}

impl From<&ProbeConfig> for ProbeSettings {
    fn from(config: &ProbeConfig) -> Self {
        let timing = &config.timing;
        let namespace = config.namespace.qualified();
        let observer = ObserverSettings {
            filter: FeedFilter::new(&namespace, &config.namespace.tag_field),
            supervise_interval: timing.supervise_interval(),
            backoff: ReconnectBackoff::new(
                timing.reconnect_initial(),
                timing.reconnect_max(),
                timing.reconnect_multiplier,
            ),
            operation_timeout: timing.operation_timeout(),
            reconcile_tip_on_ack: config.observer.reconcile_tip_on_ack,
        };

        Self {
            collection: namespace,
            tag_field: config.namespace.tag_field.clone(),
            steps: config.script.steps.clone(),
            elevated_concern: config.script.elevated_concern.clone(),
            filler_count: config.script.filler_count,
            filler_concern: config.script.filler_concern.clone(),
            scenario_pause: timing.scenario_pause(),
            shutdown_pause: timing.shutdown_pause(),
            shutdown_poll: timing.shutdown_poll(),
            operation_timeout: timing.operation_timeout(),
            ready_timeout: timing.ready_timeout(),
            channel_capacity: config.observer.channel_capacity,
            observer,
        }
    }
}

/// Shape of the simulated replica set described by `[simulation]`.
pub fn cluster_spec(simulation: &SimulationConfig) -> ClusterSpec {
    let mut spec = ClusterSpec::new(&simulation.name);
    for member in &simulation.members {
        spec = spec.member(if member.primary {
            MemberSpec::primary(&member.region, &member.zone)
        } else {
            MemberSpec::secondary(
                &member.region,
                &member.zone,
                Duration::from_millis(member.delay_ms),
            )
        });
    }
    for mode in &simulation.modes {
        spec = spec.mode(&mode.name, mode.zones);
    }
    spec
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_follow_config() {
        let mut config = ProbeConfig::default();
        config.namespace.tag_field = "marker".to_string();
        config.timing.ready_timeout_ms = Some(250);
        config.observer.reconcile_tip_on_ack = false;

        let settings = ProbeSettings::from(&config);
        assert_eq!(settings.collection, "test.wctest");
        assert_eq!(settings.observer.filter, FeedFilter::new("test.wctest", "marker"));
        assert_eq!(settings.ready_timeout, Some(Duration::from_millis(250)));
        assert_eq!(settings.observer.supervise_interval, Duration::from_millis(50));
        assert!(!settings.observer.reconcile_tip_on_ack);
        assert_eq!(settings.steps.len(), 5);
    }

    #[test]
    fn simulation_becomes_cluster_spec() {
        let spec = cluster_spec(&SimulationConfig::default());
        assert_eq!(spec.name, "rs0");
        assert_eq!(spec.members.len(), 5);
        assert_eq!(spec.members.iter().filter(|m| m.primary).count(), 1);
        assert_eq!(spec.members[4].replication_delay, Duration::from_millis(110));
        assert_eq!(spec.modes.get("threeRegions"), Some(&3));
    }
}
