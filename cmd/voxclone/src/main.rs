//! voxclone - build cloned voices and gate what they generate.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    BuildCommand, CombineCommand, ConfigCommand, EmbedCommand, SimilarityCommand,
    SynthesizeCommand, ValidateCommand,
};

/// voxclone - voice cloning pipeline and quality gate.
///
/// Builds a reference voice from a few recordings, hands it to a hosted
/// (Fish Audio) or local synthesis engine, and checks generated speech
/// against the reference before it is used:
///   - build:      run a voice job and create the hosted model
///   - embed:      extract a speaker embedding from one recording
///   - combine:    merge embedding records into a reference voice
///   - similarity: score two embedding records
///   - validate:   accept, review or reject a generated clip
///   - synthesize: generate speech, optionally validated
///
/// Configuration is stored in ~/.voxclone/voxclone/ and supports multiple
/// contexts, similar to kubectl's context management.
#[derive(Parser)]
#[command(name = "voxclone")]
#[command(about = "Voice cloning pipeline and quality gate")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.voxclone/voxclone/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Build a voice from reference recordings
    Build(BuildCommand),
    /// Extract a speaker embedding from an audio file
    Embed(EmbedCommand),
    /// Combine embedding records into one reference
    Combine(CombineCommand),
    /// Cosine similarity between two embedding records
    Similarity(SimilarityCommand),
    /// Validate generated audio against a reference embedding
    Validate(ValidateCommand),
    /// Synthesize speech with a built voice
    Synthesize(SynthesizeCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries results only.
    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Build(cmd) => cmd.run(&cli).await,
        Commands::Embed(cmd) => cmd.run(&cli).await,
        Commands::Combine(cmd) => cmd.run(&cli).await,
        Commands::Similarity(cmd) => cmd.run(&cli).await,
        Commands::Validate(cmd) => cmd.run(&cli).await,
        Commands::Synthesize(cmd) => cmd.run(&cli).await,
    }
}
