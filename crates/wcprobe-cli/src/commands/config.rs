//! Configuration management commands.

use anyhow::{Context, Result};
use std::path::Path;
use wcprobe_config::{ConfigFiles, ProbeConfig, ScriptStep};

/// Output format for `config show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Toml,
    Json,
}

/// Show current configuration.
pub fn show(project: &str, format: Format) -> Result<()> {
    let config = ProbeConfig::load_from_dir(Path::new(project))
        .context("Failed to load configuration")?;

    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&config)?),
        Format::Toml => println!("{}", toml::to_string_pretty(&config)?),
        Format::Text => print_text(&config),
    }

    Ok(())
}

fn print_text(config: &ProbeConfig) {
    println!("wcprobe Configuration");
    println!("=====================\n");

    println!("Namespace:");
    println!("  Database: {}", config.namespace.database);
    println!("  Collection: {}", config.namespace.collection);
    println!("  Tag field: {}", config.namespace.tag_field);
    println!();

    println!("Targets:");
    for target in &config.targets {
        println!("  {}: {}", target.region, target.endpoint);
    }
    println!();

    println!("Scenarios:");
    for scenario in &config.scenarios {
        println!("  {scenario}");
    }
    println!();

    println!("Script:");
    for step in &config.script.steps {
        match step {
            ScriptStep::Tagged { kind, elevated: true } => {
                println!("  {kind} (w={})", config.script.elevated_concern);
            }
            ScriptStep::Tagged { kind, .. } => println!("  {kind}"),
            ScriptStep::Filler => println!(
                "  {} filler documents (w={})",
                config.script.filler_count, config.script.filler_concern
            ),
        }
    }
    println!();

    println!("Timing:");
    println!("  Scenario pause: {:?}", config.timing.scenario_pause());
    println!("  Shutdown pause: {:?}", config.timing.shutdown_pause());
    println!("  Supervise interval: {:?}", config.timing.supervise_interval());
    println!(
        "  Reconnect backoff: {:?} x{} up to {:?}",
        config.timing.reconnect_initial(),
        config.timing.reconnect_multiplier,
        config.timing.reconnect_max()
    );
    println!(
        "  Operation timeout: {}",
        config
            .timing
            .operation_timeout()
            .map_or("none".to_string(), |t| format!("{t:?}"))
    );
    println!(
        "  Ready timeout: {}",
        config
            .timing
            .ready_timeout()
            .map_or("none".to_string(), |t| format!("{t:?}"))
    );
    println!();

    println!("Simulation ({}):", config.simulation.name);
    for member in &config.simulation.members {
        let role = if member.primary { "primary" } else { "secondary" };
        println!(
            "  {} [{}] {role}, {}ms",
            member.region, member.zone, member.delay_ms
        );
    }
    for mode in &config.simulation.modes {
        println!("  mode {}: {} zones", mode.name, mode.zones);
    }
}

/// Validate configuration files.
pub fn validate(project: &str) -> Result<()> {
    let project_path = Path::new(project);

    println!("Validating configuration in {}...", project_path.display());

    let files = ConfigFiles::for_project(project_path);
    for file in [&files.project, &files.local] {
        if file.exists() {
            ProbeConfig::from_toml_file(file)?;
            println!("  ✓ {}", file.display());
        }
    }

    let config = ProbeConfig::load_from_dir(project_path).context("Validation failed")?;
    println!(
        "  ✓ merged: {} targets, {} scenarios",
        config.targets.len(),
        config.scenarios.len()
    );
    println!();
    println!("Configuration is valid");
    Ok(())
}
