use anyhow::Error;
use async_trait::async_trait;

use super::model::SourceValues;

#[async_trait]
pub trait TemplateRepository {
    /// Looks up chart `name` at `version` in the repository at `repo_url` and
    /// returns its default values.
    async fn fetch_template(
        &self,
        name: &str,
        version: &str,
        repo_url: &str,
    ) -> Result<SourceValues, Error>;
}
