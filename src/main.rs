use std::path::PathBuf;

use anyhow::{Context, Error};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::json;

use crate::config::{default_config_path, load_config, EnvOverrides};
use crate::domain::{resolve_source, resolve_target, ResolutionService};
use crate::infra::{api::ApiTemplateRepository, document};

mod config;
mod domain;
mod infra;

/// Resolve preview deployment sources and targets
#[derive(Parser, Debug)]
#[command(name = "porter-preview", version)]
struct Cli {
    /// CLI config file (defaults to ~/.porter/porter.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Porter API host, overrides the config file
    #[arg(long, global = true, env = "PORTER_HOST")]
    host: Option<String>,

    /// Porter API token, overrides the config file
    #[arg(long, global = true, env = "PORTER_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve every resource of a preview document
    Resolve {
        file: PathBuf,
        /// Only resolve the resource with this name
        #[arg(long)]
        resource: Option<String>,
    },
    /// Resolve a single source block
    Source { file: PathBuf },
    /// Resolve a single target block
    Target { file: PathBuf },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(default_config_path);
    let mut config = load_config(config_path.as_deref())?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(token) = cli.token {
        config.token = Some(token);
    }
    debug!(
        "Loaded config for host {} (project {}, cluster {})",
        config.host, config.project, config.cluster
    );

    let service = ResolutionService {
        template_repository: Box::new(ApiTemplateRepository::new(&config)?),
        overrides: EnvOverrides::from_process()?,
        defaults: config.defaults(),
    };

    let output = match cli.command {
        Command::Resolve { file, resource } => {
            let resources = document::read_resources(&file, resource.as_deref())?;
            let mut resolved = Vec::with_capacity(resources.len());
            for resource in resources {
                let source = resolve_source(&resource.source, &service)
                    .await
                    .with_context(|| {
                        format!("Can't resolve source of resource {}", resource.name)
                    })?;
                let target = resolve_target(&resource.target, &service).with_context(|| {
                    format!("Can't resolve target of resource {}", resource.name)
                })?;
                info!(
                    "Resource {} resolved to {}@{} from {}",
                    resource.name, source.name, source.version, source.repo
                );
                resolved.push(json!({
                    "name": resource.name,
                    "source": source,
                    "target": target,
                }));
            }
            serde_json::to_value(resolved)?
        }
        Command::Source { file } => {
            let source = resolve_source(&document::read_block(&file)?, &service).await?;
            serde_json::to_value(source)?
        }
        Command::Target { file } => {
            let target = resolve_target(&document::read_block(&file)?, &service)?;
            serde_json::to_value(target)?
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
