// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: One invocation names a service or site, a target and an action.

use clap::Parser;
use rollout::deploy::{Action, Target};
use rollout::types::ServiceName;

#[derive(Parser)]
#[command(name = "rollout")]
#[command(about = "Deploy container backends and static sites to Google Cloud")]
#[command(version)]
pub struct Cli {
    /// Service or site name (lowercase letters, digits and hyphens)
    #[arg(value_parser = parse_name)]
    pub name: ServiceName,

    /// What to deploy from the current directory
    #[arg(value_enum)]
    pub target: Target,

    /// Provision new resources or replace an existing deployment
    #[arg(value_enum)]
    pub action: Action,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print only the final result
    #[arg(short, long, conflicts_with = "json")]
    pub quiet: bool,

    /// Print JSON lines instead of text
    #[arg(long)]
    pub json: bool,
}

fn parse_name(value: &str) -> Result<ServiceName, String> {
    ServiceName::new(value).map_err(|e| e.to_string())
}
