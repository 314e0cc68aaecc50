//! Where configuration files live.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Tracked project file, written by `wcprobe init`.
pub const PROJECT_FILE: &str = "wcprobe.toml";
/// Untracked per-checkout overrides.
pub const LOCAL_FILE: &str = "wcprobe.local.toml";

/// The files layered on top of the built-in defaults for one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFiles {
    /// `config.toml` under the platform config directory, if there is one.
    pub user: Option<PathBuf>,
    pub project: PathBuf,
    pub local: PathBuf,
}

impl ConfigFiles {
    pub fn for_project(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            user: ProjectDirs::from("", "", "wcprobe")
                .map(|dirs| dirs.config_dir().join("config.toml")),
            project: dir.join(PROJECT_FILE),
            local: dir.join(LOCAL_FILE),
        }
    }

    pub fn without_user(mut self) -> Self {
        self.user = None;
        self
    }

    /// Files present on disk, lowest precedence first.
    pub fn existing(&self) -> Vec<&Path> {
        self.user
            .iter()
            .chain([&self.project, &self.local])
            .map(PathBuf::as_path)
            .filter(|path| path.exists())
            .collect()
    }

    pub fn is_initialized(&self) -> bool {
        self.project.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn user_file_is_named_for_wcprobe() {
        if let Some(user) = ConfigFiles::for_project(".").user {
            assert!(user.ends_with("config.toml"));
            assert!(user.to_string_lossy().contains("wcprobe"));
        }
    }

    #[test]
    fn existing_follows_precedence_and_skips_missing() {
        let dir = tempdir().expect("Failed to create temp dir");
        let user = dir.path().join("user.toml");
        let files = ConfigFiles {
            user: Some(user.clone()),
            ..ConfigFiles::for_project(dir.path())
        };
        assert!(files.existing().is_empty());
        assert!(!files.is_initialized());

        fs::write(&files.local, "").unwrap();
        fs::write(&user, "").unwrap();
        assert_eq!(files.existing(), vec![user.as_path(), files.local.as_path()]);

        fs::write(&files.project, "").unwrap();
        assert!(files.is_initialized());
        assert_eq!(
            files.existing(),
            vec![user.as_path(), files.project.as_path(), files.local.as_path()]
        );
        assert_eq!(files.clone().without_user().existing().len(), 2);
    }
}
