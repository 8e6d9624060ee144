use std::path::PathBuf;
use std::process::Command;

use tracing::debug;
use voxclone_audio::NormalizedAudio;
use voxclone_voiceprint::{EmbeddingVector, SpeakerEncoder, VoiceprintError};

use crate::error::EncoderError;
use crate::response::parse_embedding;

/// Runs an external embedding program once per file.
///
/// Invoked as `<program> [args..] --input <wav>`; the program must print
/// an embedding record (or a bare JSON array) on stdout. Anything on
/// stderr is ignored unless the program fails.
///
/// Every call pays the program's model loading time. Prefer
/// [`crate::HttpEncoder`] against a long-running service when embedding
/// many files.
pub struct CommandEncoder {
    program: PathBuf,
    args: Vec<String>,
    dimension: usize,
}

impl CommandEncoder {
    /// `dimension` of zero disables the output size check.
    pub fn new(program: impl Into<PathBuf>, dimension: usize) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            dimension,
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn run(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, EncoderError> {
        debug!(
            program = %self.program.display(),
            input = %audio.path.display(),
            "running encoder"
        );
        let out = Command::new(&self.program)
            .args(&self.args)
            .arg("--input")
            .arg(&audio.path)
            .output()?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(EncoderError::Command(format!(
                "{} exited with {}: {}",
                self.program.display(),
                out.status,
                stderr.trim()
            )));
        }
        parse_embedding(&out.stdout, self.dimension)
    }
}

impl SpeakerEncoder for CommandEncoder {
    fn embed(&self, audio: &NormalizedAudio) -> Result<EmbeddingVector, VoiceprintError> {
        Ok(self.run(audio)?)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "command"
    }
}
