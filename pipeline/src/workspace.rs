use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

/// Working directory of a single job.
///
/// A temporary workspace is deleted when dropped, whether the job
/// succeeded, failed or panicked. A persistent one lives under a caller
/// chosen directory and is left in place.
#[derive(Debug)]
pub struct JobWorkspace {
    root: PathBuf,
    temp: Option<TempDir>,
}

impl JobWorkspace {
    pub fn temporary(job_id: &str) -> io::Result<Self> {
        let temp = tempfile::Builder::new()
            .prefix(&format!("voxclone-{}-", sanitize(job_id)))
            .tempdir()?;
        debug!(path = %temp.path().display(), "created temporary workspace");
        Ok(Self {
            root: temp.path().to_path_buf(),
            temp: Some(temp),
        })
    }

    /// Uses `<base>/<job_id>`, creating it if needed.
    pub fn persistent(base: &Path, job_id: &str) -> io::Result<Self> {
        let root = base.join(sanitize(job_id));
        fs::create_dir_all(&root)?;
        Ok(Self { root, temp: None })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_temporary(&self) -> bool {
        self.temp.is_some()
    }

    pub fn raw_path(&self, index: usize, extension: &str) -> PathBuf {
        self.root.join(format!("audio_{index}.{extension}"))
    }

    pub fn processed_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("audio_{index}.proc.wav"))
    }

    pub fn embedding_path(&self, index: usize) -> PathBuf {
        self.root.join(format!("audio_{index}.proc.wav.emb.json"))
    }

    pub fn combined_embedding_path(&self) -> PathBuf {
        self.root.join("voice_embedding.json")
    }

    /// Removes a temporary workspace now, reporting failures that `Drop`
    /// would swallow. Persistent workspaces are kept.
    pub fn close(self) -> io::Result<()> {
        match self.temp {
            Some(temp) => temp.close(),
            None => Ok(()),
        }
    }
}

/// Keeps job ids usable as a single path component.
fn sanitize(job_id: &str) -> String {
    let s: String = job_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if s.is_empty() { "job".to_string() } else { s }
}
