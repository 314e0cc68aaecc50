//! Initialize command - writes a default wcprobe.toml.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use wcprobe_config::{ConfigFiles, LOCAL_FILE, ProbeConfig};

pub fn run(path: &str) -> Result<()> {
    let project_dir = Path::new(path);

    let files = ConfigFiles::for_project(project_dir);
    if files.is_initialized() {
        anyhow::bail!(
            "Project already initialized in {}. wcprobe.toml already exists.",
            project_dir.display()
        );
    }

    fs::create_dir_all(project_dir).context("Failed to create project directory")?;

    let config = ProbeConfig::default();
    let config_path = &files.project;
    let content = toml::to_string_pretty(&config).context("Failed to serialize configuration")?;
    fs::write(config_path, content).context("Failed to write wcprobe.toml")?;

    let gitignore = project_dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, format!("# wcprobe local overrides\n{LOCAL_FILE}\n"))
            .context("Failed to write .gitignore")?;
    }

    println!("Wrote {}", config_path.display());
    println!();
    println!("Next steps:");
    println!("  wcprobe config show --project {}", project_dir.display());
    println!("  wcprobe run --project {}", project_dir.display());
    Ok(())
}
