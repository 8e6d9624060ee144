use std::path::PathBuf;
use std::process::Command;

use tracing::{debug, info};

use crate::{PipelineError, ReprocessHint, Stage};

/// Default local engine model (XTTS v2 handles zero-shot cloning).
pub const DEFAULT_LOCAL_MODEL: &str = "tts_models/multilingual/multi-dataset/xtts_v2";

/// Input for a local synthesis run.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisRequest {
    pub text: String,
    /// Reference recordings conditioning the voice.
    pub reference_audio: Vec<PathBuf>,
    pub output: PathBuf,
    pub language: String,
    pub temperature: f32,
    pub top_p: f32,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, reference_audio: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            text: text.into(),
            reference_audio,
            output: output.into(),
            language: "pt".to_string(),
            temperature: 0.75,
            top_p: 0.85,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Applies the sampling of a reprocess hint.
    pub fn with_hint(mut self, hint: ReprocessHint) -> Self {
        self.temperature = hint.temperature;
        self.top_p = hint.top_p;
        self
    }
}

/// Produces speech in a cloned voice.
pub trait Synthesizer: Send + Sync {
    /// Synthesizes `request.text`, writes it to `request.output` and
    /// returns the audio bytes.
    fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, PipelineError>;
}

/// Runs a local TTS engine as a subprocess.
///
/// Invoked as `<program> [args..] --text <t> --output <o> --model <m>
/// --speaker_wav <a,b,..> --language <l> --temperature <t> --top_p <p>`.
pub struct CommandSynthesizer {
    program: PathBuf,
    args: Vec<String>,
    model: String,
}

impl CommandSynthesizer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            model: DEFAULT_LOCAL_MODEL.to_string(),
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

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    fn command(&self, request: &SynthesisRequest) -> Command {
        let speakers = request
            .reference_audio
            .iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(",");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg("--text")
            .arg(&request.text)
            .arg("--output")
            .arg(&request.output)
            .arg("--model")
            .arg(&self.model)
            .arg("--speaker_wav")
            .arg(speakers)
            .arg("--language")
            .arg(&request.language)
            .arg("--temperature")
            .arg(request.temperature.to_string())
            .arg("--top_p")
            .arg(request.top_p.to_string());
        cmd
    }
}

impl Synthesizer for CommandSynthesizer {
    fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, PipelineError> {
        if request.text.trim().is_empty() {
            return Err(PipelineError::InvalidInput("text is empty".into()));
        }
        if request.reference_audio.is_empty() {
            return Err(PipelineError::InvalidInput("no reference audio".into()));
        }
        if let Some(parent) = request.output.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        debug!(program = %self.program.display(), model = %self.model, "running local synthesis");
        let out = self
            .command(request)
            .output()
            .map_err(|e| PipelineError::collaborator(Stage::GenerationHandoff, None, e))?;
        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            return Err(PipelineError::collaborator(
                Stage::GenerationHandoff,
                None,
                format!("{} exited with {}: {}", self.program.display(), out.status, stderr.trim()),
            ));
        }

        let audio = std::fs::read(&request.output).map_err(|e| {
            PipelineError::collaborator(
                Stage::GenerationHandoff,
                None,
                format!("engine produced no output at {}: {e}", request.output.display()),
            )
        })?;
        info!(output = %request.output.display(), bytes = audio.len(), "local synthesis complete");
        Ok(audio)
    }
}
