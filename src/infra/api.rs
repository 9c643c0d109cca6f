use std::time::Duration;

use anyhow::{anyhow, Context, Error};
use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Url};

use crate::{
    config::CliConfig,
    domain::{model::SourceValues, port::TemplateRepository},
};

#[derive(serde_derive::Deserialize)]
struct TemplateResponse {
    #[serde(default)]
    values: Option<SourceValues>,
}

/// Template lookups against the Porter API server.
pub struct ApiTemplateRepository {
    pub host: Url,
    pub token: Option<String>,
    pub client: Client,
}

impl ApiTemplateRepository {
    pub fn new(config: &CliConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Can't build HTTP client")?;
        let host = Url::parse(&config.host)
            .with_context(|| format!("Invalid API host {}", config.host))?;
        if host.cannot_be_a_base() {
            return Err(anyhow!("Invalid API host {}", config.host));
        }
        Ok(Self {
            host,
            token: config.token.clone(),
            client,
        })
    }

    async fn get_template(
        &self,
        name: &str,
        version: &str,
        repo_url: &str,
    ) -> Result<SourceValues, Error> {
        let mut url = self.host.clone();
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid API host {}", self.host))?
            .pop_if_empty()
            .extend(["api", "templates", name, version]);
        let mut request = self
            .client
            .get(url.clone())
            .query(&[("repo_url", repo_url)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?
            .error_for_status()
            .with_context(|| {
                format!("Template {}@{} not available in {}", name, version, repo_url)
            })?;
        let template: TemplateResponse = response
            .json()
            .await
            .context("Can't decode template response")?;
        Ok(template.values.unwrap_or_default())
    }
}

#[async_trait]
impl TemplateRepository for ApiTemplateRepository {
    async fn fetch_template(
        &self,
        name: &str,
        version: &str,
        repo_url: &str,
    ) -> Result<SourceValues, Error> {
        self.get_template(name, version, repo_url)
            .await
            .map_err(|e| {
                debug!(
                    "Template lookup {}@{} in {} failed: {:#}",
                    name, version, repo_url, e
                );
                e
            })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{
        extract::{Path, Query},
        http::{HeaderMap, StatusCode},
        response::IntoResponse,
        routing::get,
        Json, Router,
    };
    use serde_json::json;
    use tokio::net::TcpListener;

    use super::*;
    use crate::domain::model::{ADDON_REPO_URL, APPLICATION_REPO_URL};

    async fn get_template(
        Path((name, version)): Path<(String, String)>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        let authorized = headers
            .get("authorization")
            .and_then(|value| value.to_str().ok())
            == Some("Bearer secret");
        if !authorized {
            return (StatusCode::FORBIDDEN, Json(json!({ "error": "forbidden" })));
        }
        match (name.as_str(), version.as_str(), query.get("repo_url").map(String::as_str)) {
            ("web", "latest", Some(APPLICATION_REPO_URL)) => (
                StatusCode::OK,
                Json(json!({ "name": "web", "values": { "replicaCount": 1 } })),
            ),
            ("redis", "1.0.0", Some(ADDON_REPO_URL)) => {
                (StatusCode::OK, Json(json!({ "name": "redis" })))
            }
            ("bitnami/redis", "7.0.0 rc#1", Some(ADDON_REPO_URL)) => (
                StatusCode::OK,
                Json(json!({ "values": { "architecture": "standalone" } })),
            ),
            _ => (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))),
        }
    }

    async fn serve() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let router = Router::new().route("/api/templates/:name/:version", get(get_template));
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/", address)
    }

    fn repository(host: String, token: Option<&str>) -> ApiTemplateRepository {
        ApiTemplateRepository::new(&CliConfig {
            host,
            token: token.map(str::to_string),
            timeout_secs: 5,
            ..Default::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetches_values_from_repo() {
        let repository = repository(serve().await, Some("secret"));

        let values = repository
            .fetch_template("web", "latest", APPLICATION_REPO_URL)
            .await
            .unwrap();
        assert_eq!(values["replicaCount"], 1);
    }

    #[tokio::test]
    async fn missing_values_are_empty() {
        let repository = repository(serve().await, Some("secret"));

        let values = repository
            .fetch_template("redis", "1.0.0", ADDON_REPO_URL)
            .await
            .unwrap();
        assert!(values.is_empty());
    }

    #[tokio::test]
    async fn error_statuses_are_errors() {
        let authorized = repository(serve().await, Some("secret"));
        assert!(authorized
            .fetch_template("web", "latest", ADDON_REPO_URL)
            .await
            .is_err());

        let anonymous = repository(serve().await, None);
        assert!(anonymous
            .fetch_template("web", "latest", APPLICATION_REPO_URL)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn name_and_version_are_single_path_segments() {
        let repository = repository(serve().await, Some("secret"));

        let values = repository
            .fetch_template("bitnami/redis", "7.0.0 rc#1", ADDON_REPO_URL)
            .await
            .unwrap();
        assert_eq!(values["architecture"], "standalone");

        assert!(repository
            .fetch_template("web/../web", "latest", APPLICATION_REPO_URL)
            .await
            .is_err());
    }

    #[test]
    fn invalid_host_is_rejected() {
        for host in ["not a url", "mailto:ops@example.com"] {
            let config = CliConfig {
                host: host.to_string(),
                ..Default::default()
            };
            assert!(ApiTemplateRepository::new(&config).is_err(), "{host}");
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_an_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let repository = repository(format!("http://{}", address), Some("secret"));
        assert!(repository
            .fetch_template("web", "latest", APPLICATION_REPO_URL)
            .await
            .is_err());
    }
}
