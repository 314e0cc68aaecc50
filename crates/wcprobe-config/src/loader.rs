//! Configuration loader with multi-source merging

use crate::{ConfigFiles, ProbeConfig};
use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration loader with builder pattern
pub struct ConfigLoader {
    project_dir: PathBuf,
    env_prefix: String,
    include_user_config: bool,
}

impl ConfigLoader {
    /// Create a new config loader with default project directory (current dir)
    pub fn new() -> Self {
        Self {
            project_dir: env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            env_prefix: "WCPROBE".to_string(),
            include_user_config: true,
        }
    }

    /// Set the project directory
    pub fn with_project_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.project_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Set the environment variable prefix (default: "WCPROBE")
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip ~/.config/wcprobe/config.toml
    pub fn without_user_config(mut self) -> Self {
        self.include_user_config = false;
        self
    }

    /// Load configuration from all sources with proper precedence
    pub fn load(self) -> Result<ProbeConfig> {
        let mut builder = config::Config::builder();

        // 1. Start with built-in defaults
        let defaults = ProbeConfig::default();
        builder = builder.add_source(config::Config::try_from(&defaults)?);

        // 2-4. User, project, then local files
        let mut files = ConfigFiles::for_project(&self.project_dir);
        if !self.include_user_config {
            files = files.without_user();
        }
        for file in files.existing() {
            builder = builder.add_source(
                config::File::from(file)
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // 5. Environment variables (WCPROBE_SECTION__KEY)
        builder = builder.add_source(
            config::Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to build configuration")?;

        let probe_config: ProbeConfig = config
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        probe_config
            .validate()
            .context("Configuration failed validation")?;

        Ok(probe_config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default(self) -> ProbeConfig {
        self.load().unwrap_or_default()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ScriptStep;
    use std::fs;
    use tempfile::tempdir;
    use wcprobe_types::WriteConcern;

    fn loader(dir: &Path) -> ConfigLoader {
        ConfigLoader::new()
            .with_project_dir(dir)
            .with_env_prefix("WCPROBE_LOADER_TEST")
            .without_user_config()
    }

    #[test]
    fn test_load_defaults() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config = loader(temp_dir.path()).load().expect("Failed to load config");

        assert_eq!(config.namespace.collection, "wctest");
        assert_eq!(config.targets.len(), 5);
        assert_eq!(config.timing.operation_timeout_ms, Some(10_000));
        assert_eq!(config.timing.ready_timeout_ms, None);
        assert_eq!(
            config.script.elevated_concern,
            WriteConcern::Mode("threeRegions".to_string())
        );
    }

    #[test]
    fn test_load_project_config() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        let config_content = r#"
[namespace]
collection = "probe"

[script]
filler_count = 10
steps = [
    { step = "tagged", kind = "only", elevated = true },
    { step = "filler" },
]

[[targets]]
region = "a"
endpoint = "memory://a"

[[scenarios]]
name = "majority"
endpoint = "memory://rs0"
default_concern = "majority"

[timing]
scenario_pause_ms = 0
ready_timeout_ms = 3000
"#;
        fs::write(project_dir.join("wcprobe.toml"), config_content)
            .expect("Failed to write config");

        let config = loader(project_dir).load().expect("Failed to load config");

        assert_eq!(config.namespace.collection, "probe");
        assert_eq!(config.namespace.tag_field, "tagged_insert");
        assert_eq!(config.script.filler_count, 10);
        assert_eq!(
            config.script.steps,
            vec![ScriptStep::tagged("only", true), ScriptStep::Filler]
        );
        assert_eq!(config.targets.len(), 1);
        assert_eq!(config.scenarios[0].default_concern, Some(WriteConcern::Majority));
        assert_eq!(config.timing.scenario_pause_ms, 0);
        assert_eq!(config.timing.ready_timeout_ms, Some(3000));
    }

    #[test]
    fn test_local_overrides() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let project_dir = temp_dir.path();

        fs::write(
            project_dir.join("wcprobe.toml"),
            r#"
[logging]
level = 1
"#,
        )
        .expect("Failed to write project config");

        fs::write(
            project_dir.join("wcprobe.local.toml"),
            r#"
[logging]
level = 3
"#,
        )
        .expect("Failed to write local config");

        let config = loader(project_dir).load().expect("Failed to load config");

        // Local config should override project config
        assert_eq!(config.logging.level, 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        fs::write(
            temp_dir.path().join("wcprobe.toml"),
            "[timing]\nreconnect_multiplier = 0.5\n",
        )
        .expect("Failed to write config");

        assert!(loader(temp_dir.path()).load().is_err());
    }

    // Environment overrides use a double underscore between nested keys so
    // that keys containing underscores survive:
    //
    // WCPROBE_LOGGING__LEVEL=2
    // WCPROBE_NAMESPACE__TAG_FIELD=probe_marker
    // WCPROBE_TIMING__SCENARIO_PAUSE_MS=0
}
