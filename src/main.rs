// ABOUTME: Entry point for the rollout CLI application.
// ABOUTME: Loads settings and the env file, then runs the selected workflow.

mod cli;

use clap::Parser;
use cli::Cli;
use rollout::cloud::GcpClient;
use rollout::config::{DOTENV_FILENAME, Settings, load_env_file};
use rollout::deploy::{DeploymentRequest, Pipeline, Target, Workflow};
use rollout::diagnostics::Warning;
use rollout::error::{ErrorKind, Result};
use rollout::output::{Output, OutputMode};
use rollout::types::EnvVar;
use std::env;
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing subscriber based on verbose flag
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    if let Err(e) = run(cli, &mut output).await {
        // The failed step has already been reported.
        if e.kind() != ErrorKind::StepFailure {
            output.error(&e.to_string());
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;

    if let Err(e) = dotenvy::from_path(cwd.join(DOTENV_FILENAME)) {
        tracing::debug!("No .env loaded: {e}");
    }

    let settings = Settings::discover(&cwd)?;
    let workflow = Workflow::new(cli.target, cli.action);

    let env = if workflow.target == Target::Backend {
        service_env(&cwd.join(&settings.env_file), output)
    } else {
        Vec::new()
    };

    let client = GcpClient::new(&settings)?;
    let request = DeploymentRequest::new(cwd, cli.name).with_env(env);

    output.start_timer();
    let pipeline = Pipeline::new(&client, &settings, output);
    let report = pipeline.execute(workflow, &request).await?;
    pipeline.report_success(&report, &request);
    Ok(())
}

/// Variables for the deployed service; a malformed file yields none.
fn service_env(path: &Path, output: &Output) -> Vec<EnvVar> {
    match load_env_file(path) {
        Ok(vars) => {
            tracing::debug!("Loaded {} variables from {}", vars.len(), path.display());
            vars
        }
        Err(e) => {
            let warning = Warning::env_file_skipped(format!("ignoring {}: {e}", path.display()));
            output.warning(&warning.message);
            Vec::new()
        }
    }
}
