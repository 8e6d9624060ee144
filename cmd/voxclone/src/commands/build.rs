//! Voice build command.

use clap::Args;
use tracing::{info, warn};
use voxclone_cli::config::Context;
use voxclone_cli::load_request_or_stdin;
use voxclone_fish::CreateModelRequest;
use voxclone_pipeline::{HandoffPayload, JobOutput, PipelineResult, VoiceJob};

use super::{
    create_client, create_pipeline, get_context, local_model_id, output_result, print_error,
    print_success, print_verbose, print_warning, require_input_file,
};
use crate::Cli;

/// Build a voice from reference recordings.
///
/// Reads a job file (`id`, `name`, `urls`, optional `transcripts`; `-f -`
/// reads it from stdin), runs
/// preprocessing, embedding extraction and the consistency check, then for
/// the hosted backend creates the Fish Audio model. Prints the job output
/// record.
#[derive(Args)]
pub struct BuildCommand {
    /// Keep job artifacts (default directory: ~/.voxclone/voxclone/jobs)
    #[arg(long)]
    keep: bool,

    /// Do not create the hosted model
    #[arg(long)]
    no_submit: bool,
}

impl BuildCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let input_file = require_input_file(cli)?;
        let ctx = get_context(cli)?;
        let job: VoiceJob = load_request_or_stdin(input_file)?;
        job.validate()?;

        print_verbose(cli, &format!("Using context: {}", ctx.name));
        print_verbose(cli, &format!("Job {}: {} source(s)", job.id, job.sources.len()));

        let pipeline = create_pipeline(&ctx, self.keep)?;
        let (job, result) = tokio::task::spawn_blocking(move || {
            let result = pipeline.process(&job);
            (job, result)
        })
        .await?;
        let result = result?;

        if let Some(report) = &result.consistency {
            if report.is_consistent() == Some(false) {
                print_warning("Reference recordings may not share one speaker");
            }
        }

        let model_id = if result.is_completed() {
            Some(self.model_id(&ctx, &job, &result).await)
        } else {
            None
        };

        let output = JobOutput::from_result(&job, &result, model_id);
        output_result(&output, cli)?;

        match (&result.failed_stage, &result.error) {
            (Some(stage), Some(err)) => {
                print_error(&format!("Job {} failed at {}: {}", job.id, stage, err));
                anyhow::bail!("voice build failed");
            }
            _ => {
                print_success(&format!(
                    "Voice \"{}\" built from {} reference(s)",
                    job.name, output.embeddings_count
                ));
                Ok(())
            }
        }
    }

    async fn model_id(&self, ctx: &Context, job: &VoiceJob, result: &PipelineResult) -> String {
        match &result.handoff {
            Some(HandoffPayload::HostedApi(request)) if !self.no_submit => {
                match submit(ctx, request).await {
                    Ok(Some(id)) => {
                        info!(model_id = %id, "hosted model created");
                        id
                    }
                    Ok(None) => {
                        warn!("hosted API returned no model id, using local id");
                        local_model_id(&job.id)
                    }
                    Err(e) => {
                        warn!(error = %e, "hosted model creation failed, using local id");
                        local_model_id(&job.id)
                    }
                }
            }
            _ => local_model_id(&job.id),
        }
    }
}

async fn submit(ctx: &Context, request: &CreateModelRequest) -> anyhow::Result<Option<String>> {
    let client = create_client(ctx)?;
    let response = client.model().create(request).await?;
    Ok(response.model_id)
}
