//! Per-user directory layout.

use std::io;
use std::path::PathBuf;

use crate::config::{DEFAULT_BASE_DIR, DEFAULT_CONFIG_FILE};

/// Directories under `~/.voxclone/<app>`.
#[derive(Debug, Clone)]
pub struct Paths {
    pub app_name: String,
    pub home_dir: PathBuf,
}

impl Paths {
    pub fn new(app_name: impl Into<String>) -> io::Result<Self> {
        let home_dir = dirs::home_dir().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "could not find home directory")
        })?;
        Ok(Self {
            app_name: app_name.into(),
            home_dir,
        })
    }

    /// `~/.voxclone`
    pub fn base_dir(&self) -> PathBuf {
        self.home_dir.join(DEFAULT_BASE_DIR)
    }

    /// `~/.voxclone/<app>`
    pub fn app_dir(&self) -> PathBuf {
        self.base_dir().join(&self.app_name)
    }

    pub fn config_file(&self) -> PathBuf {
        self.app_dir().join(DEFAULT_CONFIG_FILE)
    }

    /// Kept job workspaces, one directory per job id.
    pub fn jobs_dir(&self) -> PathBuf {
        self.app_dir().join("jobs")
    }

    /// Synthesized audio written without an explicit output path.
    pub fn outputs_dir(&self) -> PathBuf {
        self.app_dir().join("outputs")
    }

    pub fn output_path(&self, name: &str) -> PathBuf {
        self.outputs_dir().join(name)
    }

    pub fn ensure_outputs_dir(&self) -> io::Result<PathBuf> {
        let dir = self.outputs_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths() -> Paths {
        Paths {
            app_name: "voxclone".into(),
            home_dir: PathBuf::from("/home/tester"),
        }
    }

    #[test]
    fn test_layout() {
        let p = paths();
        assert_eq!(p.base_dir(), PathBuf::from("/home/tester/.voxclone"));
        assert_eq!(p.config_file(), PathBuf::from("/home/tester/.voxclone/voxclone/config.yaml"));
        assert!(p.jobs_dir().ends_with("voxclone/jobs"));
        assert!(p.output_path("a.wav").ends_with("outputs/a.wav"));
    }

    #[test]
    fn test_ensure_outputs_dir() {
        let home = tempfile::tempdir().unwrap();
        let p = Paths {
            app_name: "voxclone".into(),
            home_dir: home.path().to_path_buf(),
        };
        let dir = p.ensure_outputs_dir().unwrap();
        assert!(dir.is_dir());
    }
}
