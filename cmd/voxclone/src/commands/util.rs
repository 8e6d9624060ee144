//! Utility functions for CLI commands.

use std::path::PathBuf;
use std::time::Duration;

use voxclone_audio::Normalizer;
use voxclone_cli::config::{Config, Context, load_config};
use voxclone_cli::{NormalizerSettings, Output, OutputFormat, Paths};
use voxclone_fish::Client;
use voxclone_pipeline::VoiceCloningPipeline;
use voxclone_voiceprint::SpeakerEncoder;

use crate::Cli;

pub const APP_NAME: &str = "voxclone";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context to use, with environment overrides applied.
///
/// Without `-c` and without a current context, an empty context is used so
/// commands that only need local collaborators keep working.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    let mut ctx = match (cfg.resolve_context(cli.context.as_deref()), cli.context.as_deref()) {
        (Some(ctx), _) => ctx.clone(),
        (None, Some(name)) if !name.is_empty() => {
            anyhow::bail!("context '{}' not found", name);
        }
        (None, _) => {
            print_verbose(cli, "No context selected, using defaults");
            Context::default()
        }
    };
    ctx.apply_env();
    Ok(ctx)
}

/// Requires input file to be provided.
pub fn require_input_file(cli: &Cli) -> anyhow::Result<&str> {
    cli.input
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("input file is required, use -f flag"))
}

/// Outputs result as JSON or YAML per the global flags.
pub fn output_result<T: serde::Serialize>(result: &T, cli: &Cli) -> anyhow::Result<()> {
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Yaml
    };
    Output::new(format, cli.output.clone()).write(result)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    voxclone_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Prints warning message.
pub fn print_warning(msg: &str) {
    eprintln!("\x1b[33m⚠\x1b[0m {}", msg);
}

/// Prints error message.
pub fn print_error(msg: &str) {
    eprintln!("\x1b[31m✗\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Creates a Fish Audio client from context configuration.
pub fn create_client(ctx: &Context) -> anyhow::Result<Client> {
    if ctx.api_key.is_empty() {
        anyhow::bail!(
            "no Fish Audio API key: set FISH_AUDIO_API_KEY or add one with 'voxclone config add-context --api-key'"
        );
    }
    let mut builder = Client::builder(&ctx.api_key);

    if !ctx.base_url.is_empty() {
        builder = builder.base_url(&ctx.base_url);
    }
    if ctx.timeout > 0 {
        builder = builder.timeout(Duration::from_secs(ctx.timeout as u64));
    }
    if ctx.max_retries > 0 {
        builder = builder.max_retries(ctx.max_retries as u32);
    }

    Ok(builder.build()?)
}

/// Normalizer configured in the context, the in-process one by default.
pub fn create_normalizer(ctx: &Context) -> anyhow::Result<Box<dyn Normalizer>> {
    match &ctx.normalizer {
        Some(settings) => settings.build(),
        None => NormalizerSettings::default().build(),
    }
}

/// Speaker encoder configured in the context.
///
/// Constructing an encoder may load a model; call once per process.
pub fn create_encoder(ctx: &Context) -> anyhow::Result<Box<dyn SpeakerEncoder>> {
    let cfg = ctx.encoder.as_ref().ok_or_else(|| {
        anyhow::anyhow!(
            "no speaker encoder configured: add one with 'voxclone config add-context --encoder-program' or '--encoder-url'"
        )
    })?;
    Ok(cfg.build()?)
}

/// Pipeline with the context's collaborators. `keep` forces artifacts to
/// be kept, under `~/.voxclone/voxclone/jobs` unless the context names a
/// directory.
pub fn create_pipeline(ctx: &Context, keep: bool) -> anyhow::Result<VoiceCloningPipeline> {
    let mut config = ctx.pipeline_config();
    if keep && config.artifacts_dir.is_none() {
        config = config.with_artifacts_dir(Paths::new(APP_NAME)?.jobs_dir());
    }
    Ok(
        VoiceCloningPipeline::new(create_normalizer(ctx)?, create_encoder(ctx)?)
            .with_config(config),
    )
}

/// Model id used when the hosted API does not provide one.
pub fn local_model_id(job_id: &str) -> String {
    format!("local-{job_id}")
}

/// Default path for synthesized audio.
pub fn default_output_path(format: &str) -> anyhow::Result<PathBuf> {
    let paths = Paths::new(APP_NAME)?;
    paths.ensure_outputs_dir()?;
    let name = format!(
        "{}.{}",
        uuid::Uuid::new_v4(),
        voxclone_cli::guess_extension(format)
    );
    Ok(paths.output_path(&name))
}
