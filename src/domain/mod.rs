use model::{
    Source, SourceInput, SourceValues, Target, TargetDefaults, TargetInput, ADDON_REPO_URL,
    APPLICATION_REPO_URL, DEFAULT_NAMESPACE, DEFAULT_VERSION,
};
use port::TemplateRepository;
use serde_yaml::Value;

use crate::config::EnvOverrides;
pub use error::ResolveError;

pub mod error;
pub mod model;
pub mod port;


pub struct ResolutionService {
    pub template_repository: Box<dyn TemplateRepository + 'static + Sync + Send>,
    pub overrides: EnvOverrides,
    pub defaults: TargetDefaults,
}

/// Resolves a `source` block. Each of name, repo and version comes from the
/// environment, then the document, then its default. Without a repo the
/// application repository is searched before the add-on repository.
pub async fn resolve_source(
    input: &Value,
    service: &ResolutionService,
) -> Result<Source, ResolveError> {
    let document = SourceInput::from_document(input)?;
    let overrides = &service.overrides;

    let Some(name) = or_document(&overrides.source_name, || document.name())? else {
        return Err(ResolveError::MissingRequiredField {
            field: "name".to_string(),
        });
    };
    let repo = or_document(&overrides.source_repo, || document.repo())?;
    let version = or_document(&overrides.source_version, || document.version())?
        .unwrap_or_else(|| DEFAULT_VERSION.to_string());

    match repo {
        Some(repo) => match lookup(service, &name, &version, &repo).await {
            Some(source_values) => Ok(Source {
                is_application: repo == APPLICATION_REPO_URL,
                name,
                repo,
                version,
                source_values,
            }),
            None => Err(ResolveError::SourceNotFound {
                name,
                version,
                repo: Some(repo),
            }),
        },
        None => {
            for repo in [APPLICATION_REPO_URL, ADDON_REPO_URL] {
                if let Some(source_values) = lookup(service, &name, &version, repo).await {
                    return Ok(Source {
                        is_application: repo == APPLICATION_REPO_URL,
                        name,
                        repo: repo.to_string(),
                        version,
                        source_values,
                    });
                }
            }
            Err(ResolveError::SourceNotFound {
                name,
                version,
                repo: None,
            })
        }
    }
}

// Any lookup failure, transport errors included, counts as "not in this repo".
async fn lookup(
    service: &ResolutionService,
    name: &str,
    version: &str,
    repo: &str,
) -> Option<SourceValues> {
    service
        .template_repository
        .fetch_template(name, version, repo)
        .await
        .ok()
}

/// Resolves a `target` block. A `PORTER_PROJECT` or `PORTER_CLUSTER` that is
/// not an unsigned integer fails the call instead of falling through.
pub fn resolve_target(
    input: &Value,
    service: &ResolutionService,
) -> Result<Target, ResolveError> {
    let overrides = &service.overrides;
    let project = parse_id("PORTER_PROJECT", overrides.project.as_deref())?;
    let cluster = parse_id("PORTER_CLUSTER", overrides.cluster.as_deref())?;

    let document = TargetInput::from_document(input)?;

    Ok(Target {
        app_name: document.app_name()?,
        project: or_document(&project, || document.project())?
            .unwrap_or(service.defaults.project),
        cluster: or_document(&cluster, || document.cluster())?
            .unwrap_or(service.defaults.cluster),
        namespace: or_document(&overrides.namespace, || document.namespace())?
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
    })
}

// The document is only decoded when the override is unset.
fn or_document<T: Clone>(
    value: &Option<T>,
    document: impl FnOnce() -> Result<Option<T>, ResolveError>,
) -> Result<Option<T>, ResolveError> {
    match value {
        Some(value) => Ok(Some(value.clone())),
        None => document(),
    }
}

fn parse_id(variable: &str, raw: Option<&str>) -> Result<Option<u64>, ResolveError> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    raw.parse::<u64>()
        .map(|id| Some(id).filter(|id| *id != 0))
        .map_err(|e| ResolveError::InvalidField {
            field: variable.to_string(),
            reason: format!("'{raw}' is not an unsigned integer: {e}"),
        })
}
