//! Read-only access to files under the configured document root

use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use crate::errors::AppError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileBody {
    Text(String),
    Binary(Vec<u8>),
}

#[derive(Debug, Clone)]
pub struct DocumentRoot {
    root: PathBuf,
}

impl DocumentRoot {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads `relative` below the root. Anything that could escape the root
    /// (absolute paths, `..`, prefixes) is rejected before touching the disk,
    /// and symlinks must still land inside the root once resolved.
    pub async fn read(&self, relative: &str) -> Result<FileBody, AppError> {
        let path = self.resolve(relative)?;

        let target = tokio::fs::canonicalize(&path)
            .await
            .map_err(|err| read_error(relative, &path, err))?;
        let root = tokio::fs::canonicalize(&self.root).await.map_err(|err| {
            AppError::internal(format!(
                "document root {} is unavailable: {err}",
                self.root.display()
            ))
        })?;
        if !target.starts_with(&root) {
            return Err(outside_root());
        }

        let bytes = tokio::fs::read(&target)
            .await
            .map_err(|err| read_error(relative, &target, err))?;

        Ok(match String::from_utf8(bytes) {
            Ok(text) => FileBody::Text(text),
            Err(err) => FileBody::Binary(err.into_bytes()),
        })
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, AppError> {
        let candidate = Path::new(relative);
        let escapes = relative.trim().is_empty()
            || candidate
                .components()
                .any(|component| !matches!(component, Component::Normal(_) | Component::CurDir));

        if escapes {
            return Err(outside_root());
        }

        Ok(self.root.join(candidate))
    }
}

fn outside_root() -> AppError {
    AppError::bad_argument("path", "relative path inside the document root")
}

fn read_error(relative: &str, path: &Path, err: std::io::Error) -> AppError {
    match err.kind() {
        ErrorKind::NotFound => {
            AppError::not_found_with_details(relative, format!("file not found: {relative}"))
        }
        _ => AppError::internal(format!("failed to read {}: {err}", path.display())),
    }
}

pub fn guess_mime_type(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("md" | "markdown") => "text/markdown",
        Some("json") => "application/json",
        Some("html" | "htm") => "text/html",
        Some("csv") => "text/csv",
        Some("toml") => "application/toml",
        Some("yaml" | "yml") => "application/yaml",
        Some("rs") => "text/x-rust",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("pdf") => "application/pdf",
        _ => "text/plain",
    }
}
