use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("invalid {field} provided: {reason}")]
    InvalidField { field: String, reason: String },

    #[error("source {field} required")]
    MissingRequiredField { field: String },

    #[error("{}", not_found_message(.name, .version, .repo.as_deref()))]
    SourceNotFound {
        name: String,
        version: String,
        /// `None` when the canonical repositories were searched.
        repo: Option<String>,
    },
}

fn not_found_message(name: &str, version: &str, repo: Option<&str>) -> String {
    match repo {
        Some(repo) => {
            format!("source '{name}' version '{version}' does not exist in repo '{repo}'")
        }
        None => format!("source '{name}' version '{version}' does not exist in any repo"),
    }
}
