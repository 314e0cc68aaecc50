//! Configuration management for wcprobe
//!
//! Provides hierarchical configuration loading from multiple sources:
//! 1. Environment variables (WCPROBE_* prefix, `__` between nested keys)
//! 2. wcprobe.local.toml (gitignored, local overrides)
//! 3. wcprobe.toml (git-tracked, project config)
//! 4. ~/.config/wcprobe/config.toml (user defaults)
//! 5. Built-in defaults (lowest precedence)
//!
//! The built-in defaults describe a five-member replica set spread over
//! three zones and two scenarios (`w: 3` and `w: threeRegions`).

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::time::Duration;
use wcprobe_types::{ConnectionVariant, ReplicaTarget, WriteConcern};

mod error;
mod loader;
mod paths;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use paths::{ConfigFiles, LOCAL_FILE, PROJECT_FILE};

/// Main wcprobe configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    pub namespace: NamespaceConfig,
    pub targets: Vec<ReplicaTarget>,
    pub scenarios: Vec<ConnectionVariant>,
    pub script: ScriptConfig,
    pub timing: TimingConfig,
    pub observer: ObserverConfig,
    pub logging: LoggingConfig,
    pub random: RandomConfig,
    pub simulation: SimulationConfig,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        let simulation = SimulationConfig::default();
        let targets = simulation
            .members
            .iter()
            .map(|m| ReplicaTarget::new(&m.region, format!("memory://{}", m.region)))
            .collect();
        let endpoint = format!("memory://{}", simulation.name);
        Self {
            namespace: NamespaceConfig::default(),
            targets,
            scenarios: vec![
                ConnectionVariant {
                    name: "w3".to_string(),
                    endpoint: endpoint.clone(),
                    default_concern: Some(WriteConcern::Nodes(3)),
                },
                ConnectionVariant {
                    name: "three-regions".to_string(),
                    endpoint,
                    default_concern: Some(WriteConcern::Mode("threeRegions".to_string())),
                },
            ],
            script: ScriptConfig::default(),
            timing: TimingConfig::default(),
            observer: ObserverConfig::default(),
            logging: LoggingConfig::default(),
            random: RandomConfig::default(),
            simulation,
        }
    }
}

/// Where tracked writes go and how they are recognized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NamespaceConfig {
    pub database: String,
    pub collection: String,
    /// Field marking a document as a tracked write.
    pub tag_field: String,
}

impl NamespaceConfig {
    /// `database.collection`, the key writes and change feeds are scoped to.
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            database: "test".to_string(),
            collection: "wctest".to_string(),
            tag_field: "tagged_insert".to_string(),
        }
    }
}

/// One step of the per-scenario write script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub enum ScriptStep {
    /// A tracked write announced to every observer.
    Tagged {
        kind: String,
        /// Use the elevated write concern instead of the connection default.
        #[serde(default)]
        elevated: bool,
    },
    /// A batch of untracked filler documents.
    Filler,
}

impl ScriptStep {
    pub fn tagged(kind: &str, elevated: bool) -> Self {
        ScriptStep::Tagged {
            kind: kind.to_string(),
            elevated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptConfig {
    pub elevated_concern: WriteConcern,
    pub filler_count: usize,
    pub filler_concern: WriteConcern,
    pub steps: Vec<ScriptStep>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            elevated_concern: WriteConcern::Mode("threeRegions".to_string()),
            filler_count: 1000,
            filler_concern: WriteConcern::Nodes(1),
            steps: vec![
                ScriptStep::tagged("first", false),
                ScriptStep::tagged("second", true),
                ScriptStep::Filler,
                ScriptStep::tagged("third", false),
                ScriptStep::tagged("fourth", true),
            ],
        }
    }
}

/// Pauses, polling intervals, backoff and timeouts, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub scenario_pause_ms: u64,
    pub shutdown_pause_ms: u64,
    pub shutdown_poll_ms: u64,
    pub supervise_interval_ms: u64,
    pub reconnect_initial_ms: u64,
    pub reconnect_max_ms: u64,
    pub reconnect_multiplier: f64,
    /// Bound on tip queries and write calls; `None` waits indefinitely.
    pub operation_timeout_ms: Option<u64>,
    /// Bound on the readiness barrier; `None` waits indefinitely.
    pub ready_timeout_ms: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            scenario_pause_ms: 2000,
            shutdown_pause_ms: 5000,
            shutdown_poll_ms: 500,
            supervise_interval_ms: 50,
            reconnect_initial_ms: 50,
            reconnect_max_ms: 5000,
            reconnect_multiplier: 2.0,
            operation_timeout_ms: Some(10_000),
            ready_timeout_ms: None,
        }
    }
}

impl TimingConfig {
    pub fn scenario_pause(&self) -> Duration {
        Duration::from_millis(self.scenario_pause_ms)
    }

    pub fn shutdown_pause(&self) -> Duration {
        Duration::from_millis(self.shutdown_pause_ms)
    }

    pub fn shutdown_poll(&self) -> Duration {
        Duration::from_millis(self.shutdown_poll_ms)
    }

    pub fn supervise_interval(&self) -> Duration {
        Duration::from_millis(self.supervise_interval_ms)
    }

    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    pub fn ready_timeout(&self) -> Option<Duration> {
        self.ready_timeout_ms.map(Duration::from_millis)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Query the member's log tip whenever a write is acknowledged.
    pub reconcile_tip_on_ack: bool,
    /// Capacity of each control link.
    pub channel_capacity: usize,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            reconcile_tip_on_ack: true,
            channel_capacity: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 logs info only, 2 and above adds debug narration.
    pub level: u8,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: 0 }
    }
}

impl LoggingConfig {
    /// Default `tracing` filter directive for this level.
    pub fn directive(&self) -> &'static str {
        if self.level >= 2 { "debug" } else { "info" }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomConfig {
    /// Seed for reproducible filler; unset draws from OS entropy.
    pub seed: Option<u64>,
    pub prime: Option<u64>,
}

/// Simulated replica set used by `memory://` endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub name: String,
    pub members: Vec<SimulatedMember>,
    pub modes: Vec<ConcernMode>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            name: "rs0".to_string(),
            members: vec![
                SimulatedMember::new("east1", "us-east", 0, true),
                SimulatedMember::new("east2", "us-east", 8, false),
                SimulatedMember::new("east3", "us-east", 12, false),
                SimulatedMember::new("central", "us-central", 35, false),
                SimulatedMember::new("ireland", "eu-west", 110, false),
            ],
            modes: vec![ConcernMode {
                name: "threeRegions".to_string(),
                zones: 3,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedMember {
    pub region: String,
    pub zone: String,
    #[serde(default)]
    pub delay_ms: u64,
    #[serde(default)]
    pub primary: bool,
}

impl SimulatedMember {
    pub fn new(region: &str, zone: &str, delay_ms: u64, primary: bool) -> Self {
        Self {
            region: region.to_string(),
            zone: zone.to_string(),
            delay_ms,
            primary,
        }
    }
}

/// Named write concern mode: satisfied once members in `zones` distinct
/// zones have applied the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcernMode {
    pub name: String,
    pub zones: usize,
}

impl ProbeConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        ConfigLoader::new().load()
    }

    /// Load configuration from specific project directory
    pub fn load_from_dir(project_dir: impl AsRef<Path>) -> Result<Self> {
        ConfigLoader::new().with_project_dir(project_dir).load()
    }

    /// Parse a single TOML file on top of the built-in defaults.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if self.targets.is_empty() {
            return invalid("at least one replica target is required".to_string());
        }
        let mut regions = HashSet::new();
        for target in &self.targets {
            if !regions.insert(target.region.as_str()) {
                return invalid(format!("duplicate target region {}", target.region));
            }
        }
        if self.scenarios.is_empty() {
            return invalid("at least one scenario is required".to_string());
        }
        if self.namespace.collection.is_empty() || self.namespace.tag_field.is_empty() {
            return invalid("namespace.collection and namespace.tag_field must be set".to_string());
        }
        if self.namespace.database.is_empty() || self.namespace.database.contains('.') {
            return invalid(format!(
                "namespace.database must be a non-empty name without '.', got {:?}",
                self.namespace.database
            ));
        }
        if self.timing.supervise_interval_ms == 0 || self.timing.shutdown_poll_ms == 0 {
            return invalid("polling intervals must be positive".to_string());
        }
        if self.timing.reconnect_multiplier < 1.0 {
            return invalid("timing.reconnect_multiplier must be at least 1.0".to_string());
        }
        if self.timing.reconnect_initial_ms > self.timing.reconnect_max_ms {
            return invalid("timing.reconnect_initial_ms exceeds reconnect_max_ms".to_string());
        }
        if self.observer.channel_capacity == 0 {
            return invalid("observer.channel_capacity must be positive".to_string());
        }
        let primaries = self.simulation.members.iter().filter(|m| m.primary).count();
        if !self.simulation.members.is_empty() && primaries != 1 {
            return invalid(format!(
                "simulation needs exactly one primary, found {primaries}"
            ));
        }
        Ok(())
    }
}
