use std::{
    env,
    path::{Component, Path, PathBuf},
};

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub docs_root: PathBuf,
    pub readme_file: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("MCP_DOCS_ROOT must point to an existing directory")]
    InvalidDocsRoot,
    #[error("MCP_README_FILE must be a relative path inside MCP_DOCS_ROOT")]
    InvalidReadmeFile,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let docs_root = lookup("MCP_DOCS_ROOT")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        if !docs_root.is_dir() {
            return Err(ConfigError::InvalidDocsRoot);
        }

        let readme_file = lookup("MCP_README_FILE")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| "README.md".to_string());

        let stays_inside_root = Path::new(&readme_file)
            .components()
            .all(|component| matches!(component, Component::Normal(_)));
        if !stays_inside_root {
            return Err(ConfigError::InvalidReadmeFile);
        }

        Ok(Self {
            docs_root,
            readme_file,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn parse_defaults() {
        let config = Config::from_lookup(lookup(&[])).expect("config should parse");

        assert_eq!(config.docs_root, PathBuf::from("."));
        assert_eq!(config.readme_file, "README.md");
    }

    #[test]
    fn docs_root_must_exist() {
        let err = Config::from_lookup(lookup(&[("MCP_DOCS_ROOT", "/definitely/not/here")]))
            .expect_err("expected invalid docs root");

        assert_eq!(err, ConfigError::InvalidDocsRoot);
    }

    #[test]
    fn custom_docs_root_and_readme_parse() {
        let dir = tempfile::tempdir().expect("temp dir");
        let root = dir.path().to_string_lossy().to_string();

        let config = Config::from_lookup(lookup(&[
            ("MCP_DOCS_ROOT", root.as_str()),
            ("MCP_README_FILE", " docs/OVERVIEW.md "),
        ]))
        .expect("config should parse");

        assert_eq!(config.docs_root, dir.path());
        assert_eq!(config.readme_file, "docs/OVERVIEW.md");
    }

    #[test]
    fn readme_outside_root_fails() {
        for readme in ["../README.md", "/etc/motd"] {
            let err = Config::from_lookup(lookup(&[("MCP_README_FILE", readme)]))
                .expect_err("expected invalid readme file");

            assert_eq!(err, ConfigError::InvalidReadmeFile);
        }
    }
}
