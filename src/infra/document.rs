use std::path::Path;

use anyhow::{anyhow, Context, Error};
use serde_yaml::Value;

/// One entry of a preview document's `resources` list.
#[derive(Debug, Clone, serde_derive::Deserialize, PartialEq)]
pub struct Resource {
    pub name: String,
    #[serde(default)]
    pub source: Value,
    #[serde(default)]
    pub target: Value,
}

#[derive(Debug, serde_derive::Deserialize)]
struct PreviewDocument {
    #[serde(default)]
    resources: Vec<Resource>,
}

pub fn read_block(path: &Path) -> Result<Value, Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Can't read {}", path.display()))?;
    serde_yaml::from_str(&content).with_context(|| format!("Can't parse {}", path.display()))
}

pub fn read_resources(path: &Path, only: Option<&str>) -> Result<Vec<Resource>, Error> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Can't read {}", path.display()))?;
    parse_resources(&content, only)
        .with_context(|| format!("Invalid preview document {}", path.display()))
}

pub fn parse_resources(content: &str, only: Option<&str>) -> Result<Vec<Resource>, Error> {
    let document: PreviewDocument = serde_yaml::from_str(content)?;
    match only {
        None => Ok(document.resources),
        Some(name) => {
            let selected: Vec<Resource> = document
                .resources
                .into_iter()
                .filter(|resource| resource.name == name)
                .collect();
            if selected.is_empty() {
                Err(anyhow!("Resource {} not found", name))
            } else {
                Ok(selected)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"
version: v1
resources:
  - name: web
    driver: helm
    source:
      name: web
      version: 0.50.0
    target:
      namespace: preview
      app_name: web-pr-12
  - name: redis
    source:
      name: redis
      repo: https://chart-addons.getporter.dev
"#;

    #[test]
    fn parses_all_resources() {
        let resources = parse_resources(DOCUMENT, None).unwrap();
        assert_eq!(resources.len(), 2);
        assert_eq!(resources[0].name, "web");
        assert_eq!(resources[0].source["version"], Value::from("0.50.0"));
        assert_eq!(resources[0].target["app_name"], Value::from("web-pr-12"));
        assert_eq!(resources[1].target, Value::Null);
    }

    #[test]
    fn filters_by_name() {
        let resources = parse_resources(DOCUMENT, Some("redis")).unwrap();
        assert_eq!(resources.len(), 1);
        assert_eq!(resources[0].name, "redis");

        let err = parse_resources(DOCUMENT, Some("postgres")).unwrap_err();
        assert!(err.to_string().contains("postgres"));
    }

    #[test]
    fn resource_without_name_is_rejected() {
        assert!(parse_resources("resources:\n  - source: {name: web}\n", None).is_err());
    }

    #[test]
    fn reads_block_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("source.yaml");
        std::fs::write(&path, "name: web\nversion: 1.0.0\n").unwrap();

        let block = read_block(&path).unwrap();
        assert_eq!(block["name"], Value::from("web"));
        assert!(read_block(&dir.path().join("missing.yaml")).is_err());
    }
}
