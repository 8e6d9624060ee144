//! Configuration management commands.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use voxclone_audio::VadMode;
use voxclone_cli::config::{Context as CliContext, mask_api_key};
use voxclone_cli::{NormalizerKind, NormalizerSettings, SynthesizerSettings};
use voxclone_embed::EncoderConfig;
use voxclone_pipeline::SynthesisBackend;
use voxclone_voiceprint::{CombineMethod, Thresholds};

use super::{get_config, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts bundle the Fish Audio credentials with the collaborators used
/// to build and validate voices, similar to kubectl's context management.
///
/// Configuration is stored in ~/.voxclone/voxclone/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Args)]
struct AddContextArgs {
    /// Context name
    name: String,
    /// Fish Audio API key
    #[arg(long)]
    api_key: Option<String>,
    /// Fish Audio base URL
    #[arg(long)]
    base_url: Option<String>,
    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<i32>,
    /// Maximum retries
    #[arg(long)]
    max_retries: Option<i32>,
    /// Synthesis backend (hosted_api, local_engine)
    #[arg(long)]
    backend: Option<SynthesisBackend>,
    /// Speaker encoder program (prints an embedding record for --input <wav>)
    #[arg(long, conflicts_with = "encoder_url")]
    encoder_program: Option<PathBuf>,
    /// Speaker encoder service URL (receives WAV bytes)
    #[arg(long)]
    encoder_url: Option<String>,
    /// Leading arguments for the encoder program
    #[arg(long = "encoder-arg")]
    encoder_args: Vec<String>,
    /// Embedding dimension (0 accepts any)
    #[arg(long)]
    encoder_dimension: Option<usize>,
    /// External normalizer program (default: built-in)
    #[arg(long)]
    normalizer_program: Option<PathBuf>,
    /// Normalized sample rate
    #[arg(long)]
    sample_rate: Option<u32>,
    /// Silence trimming detector (energy, always_active)
    #[arg(long, value_parser = parse_vad)]
    vad: Option<VadMode>,
    /// Local TTS engine program
    #[arg(long)]
    synthesizer_program: Option<PathBuf>,
    /// Accept generations at or above this similarity
    #[arg(long)]
    ok_threshold: Option<f32>,
    /// Reject generations below this similarity
    #[arg(long, requires = "ok_threshold")]
    reject_floor: Option<f32>,
    /// Embedding combination (average, weighted_average, max)
    #[arg(long)]
    combine_method: Option<CombineMethod>,
    /// Minimum pairwise similarity between references
    #[arg(long)]
    consistency_threshold: Option<f32>,
    /// Keep job artifacts in this directory
    #[arg(long)]
    artifacts_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add a new context
    #[command(name = "add-context")]
    AddContext(AddContextArgs),
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the current configuration
    View,
}

fn parse_vad(s: &str) -> Result<VadMode, String> {
    match s {
        "energy" => Ok(VadMode::Energy),
        "always_active" | "none" => Ok(VadMode::AlwaysActive),
        other => Err(format!("unknown vad mode: {other}")),
    }
}

impl AddContextArgs {
    fn to_context(&self) -> anyhow::Result<CliContext> {
        let encoder = match (&self.encoder_program, &self.encoder_url) {
            (Some(program), _) => Some(EncoderConfig::command(program.clone())),
            (None, Some(url)) => Some(EncoderConfig::http(url)),
            (None, None) => None,
        }
        .map(|mut cfg| {
            cfg.args = self.encoder_args.clone();
            if let Some(dim) = self.encoder_dimension {
                cfg = cfg.with_dimension(dim);
            }
            cfg
        });

        let normalizer = if self.normalizer_program.is_some()
            || self.sample_rate.is_some()
            || self.vad.is_some()
        {
            let mut settings = NormalizerSettings::default();
            if let Some(program) = &self.normalizer_program {
                settings.kind = NormalizerKind::Command;
                settings.program = Some(program.clone());
            }
            if let Some(rate) = self.sample_rate {
                settings.audio = settings.audio.with_sample_rate(rate);
            }
            if let Some(vad) = self.vad {
                settings.audio = settings.audio.with_vad(vad);
            }
            Some(settings)
        } else {
            None
        };

        let thresholds = match (self.ok_threshold, self.reject_floor) {
            (Some(ok), Some(floor)) => Some(Thresholds::new(ok, floor)?),
            (Some(ok), None) => Some(Thresholds::with_ok(ok)?),
            _ => None,
        };

        Ok(CliContext {
            api_key: self.api_key.clone().unwrap_or_default(),
            base_url: self.base_url.clone().unwrap_or_default(),
            timeout: self.timeout.unwrap_or(0),
            max_retries: self.max_retries.unwrap_or(0),
            backend: self.backend,
            encoder,
            normalizer,
            synthesizer: self.synthesizer_program.as_ref().map(|program| SynthesizerSettings {
                program: program.clone(),
                ..Default::default()
            }),
            thresholds,
            combine_method: self.combine_method.clone(),
            consistency_threshold: self.consistency_threshold,
            artifacts_dir: self.artifacts_dir.clone(),
            ..Default::default()
        })
    }
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext(args) => {
                let mut cfg = get_config(cli)?;
                let ctx = args.to_context()?;
                cfg.add_context(&args.name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", args.name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<14} {}", "CURRENT", "NAME", "BACKEND", "ENCODER");
                for name in cfg.list_contexts() {
                    let Some(ctx) = cfg.get_context(name) else {
                        continue;
                    };
                    let current = if name == cfg.current_context { "*" } else { "" };
                    println!(
                        "{:<8} {:<20} {:<14} {}",
                        current,
                        name,
                        ctx.backend().as_str(),
                        describe_encoder(ctx)
                    );
                }

                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                println!("Config file: {}", cfg.path().display());
                println!("Current context: {}", cfg.current_context);
                println!("Contexts: {}", cfg.contexts.len());

                if !cfg.contexts.is_empty() {
                    println!("\nContext details:");

                    for name in cfg.list_contexts() {
                        let Some(ctx) = cfg.get_context(name) else {
                            continue;
                        };
                        println!("\n  {}:", name);
                        if !ctx.api_key.is_empty() {
                            println!("    API Key: {}", mask_api_key(&ctx.api_key));
                        }
                        if !ctx.base_url.is_empty() {
                            println!("    Base URL: {}", ctx.base_url);
                        }
                        if ctx.timeout > 0 {
                            println!("    Timeout: {}s", ctx.timeout);
                        }
                        println!("    Backend: {}", ctx.backend().as_str());
                        println!("    Encoder: {}", describe_encoder(ctx));
                        let t = ctx.thresholds();
                        println!("    Thresholds: ok >= {}, reject < {}", t.ok, t.reject_floor);
                        if let Some(dir) = &ctx.artifacts_dir {
                            println!("    Artifacts: {}", dir.display());
                        }
                    }
                }

                Ok(())
            }
        }
    }
}

fn describe_encoder(ctx: &CliContext) -> String {
    match &ctx.encoder {
        Some(enc) => match (&enc.program, &enc.url) {
            (Some(program), _) => program.display().to_string(),
            (None, Some(url)) => url.clone(),
            (None, None) => "(incomplete)".to_string(),
        },
        None => "(none)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: AddContextArgs,
    }

    #[test]
    fn test_add_context_args() {
        let h = Harness::parse_from([
            "add-context",
            "studio",
            "--encoder-program",
            "python3",
            "--encoder-arg",
            "embed.py",
            "--encoder-dimension",
            "192",
            "--vad",
            "always_active",
            "--ok-threshold",
            "0.7",
            "--backend",
            "local",
            "--combine-method",
            "max",
            "--consistency-threshold",
            "0.5",
        ]);
        let ctx = h.args.to_context().unwrap();

        let pipeline = ctx.pipeline_config();
        assert_eq!(pipeline.combine_method, CombineMethod::Max);
        assert_eq!(pipeline.consistency_threshold, 0.5);

        let enc = ctx.encoder.unwrap();
        assert_eq!(enc.args, vec!["embed.py".to_string()]);
        assert_eq!(enc.dimension, 192);
        assert_eq!(ctx.normalizer.unwrap().audio.vad, VadMode::AlwaysActive);
        assert_eq!(ctx.backend, Some(SynthesisBackend::LocalEngine));

        let t = ctx.thresholds.unwrap();
        assert_eq!(t.ok, 0.7);
        assert_eq!(t.reject_floor, 0.7);
    }

    #[test]
    fn test_invalid_thresholds() {
        let h = Harness::parse_from(["add-context", "x", "--ok-threshold", "0.5", "--reject-floor", "0.9"]);
        assert!(h.args.to_context().is_err());
    }
}
