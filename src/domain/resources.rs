//! Sample resources registered by the demo server
//!
//! Two static resources (`system://info`, `docs://readme`) and a set of
//! templates over the user/project collections and the document root.

use std::{sync::Arc, time::Instant};

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rust_mcp_sdk::schema::Role;
use serde::Serialize;
use serde_json::json;

use crate::domain::{
    files::{guess_mime_type, DocumentRoot, FileBody},
    store::{Project, RecordStore, SampleData, User},
};
use crate::errors::{AppError, RegistryError};
use crate::router::{
    resources::{ResourceContent, ResourceHandler, ResourceMeta, ResourceRouter},
    template::PlaceholderBinding,
};

pub const SYSTEM_INFO_URI: &str = "system://info";
pub const README_URI: &str = "docs://readme";
pub const USER_PROFILE_TEMPLATE: &str = "users://{id}/profile";
pub const USER_TEMPLATE: &str = "users://{id}";
pub const PROJECT_TEMPLATE: &str = "projects://{id}";
pub const COLLECTION_TEMPLATE: &str = "data://{collection}";
pub const FILE_TEMPLATE: &str = "file://{+path}";
pub const USERS_COLLECTION_URI: &str = "data://users";
pub const PROJECTS_COLLECTION_URI: &str = "data://projects";

const JSON_MIME: &str = "application/json";

pub fn register_resources(
    router: &mut ResourceRouter,
    data: &SampleData,
    docs: &DocumentRoot,
    readme_file: &str,
) -> Result<(), RegistryError> {
    let both = [Role::User, Role::Assistant];

    router.register_static(
        SYSTEM_INFO_URI,
        ResourceMeta::new(
            "System Information",
            "Current system information and server status",
            JSON_MIME,
        )
        .with_annotations(&both, 0.8),
        Arc::new(SystemInfoResource {
            data: data.clone(),
            started_at: Instant::now(),
        }),
    )?;
    router.register_static(
        README_URI,
        ResourceMeta::new(
            "README Documentation",
            "Server documentation and usage instructions",
            "text/markdown",
        )
        .with_annotations(&[Role::User], 0.9),
        Arc::new(ReadmeResource {
            docs: docs.clone(),
            file: readme_file.to_string(),
        }),
    )?;

    router.register_template(
        USER_PROFILE_TEMPLATE,
        ResourceMeta::new("User Profile", "Returns user profile information", JSON_MIME)
            .with_annotations(&both, 0.7),
        Arc::new(UserResource {
            users: Arc::clone(&data.users),
        }),
    )?;
    router.register_template(
        USER_TEMPLATE,
        ResourceMeta::new(
            "User Information",
            "Individual user information by ID",
            JSON_MIME,
        )
        .with_annotations(&both, 0.7),
        Arc::new(UserResource {
            users: Arc::clone(&data.users),
        }),
    )?;
    router.register_template(
        PROJECT_TEMPLATE,
        ResourceMeta::new(
            "Project Information",
            "Individual project information by ID",
            JSON_MIME,
        )
        .with_annotations(&both, 0.7),
        Arc::new(ProjectResource {
            projects: Arc::clone(&data.projects),
        }),
    )?;
    router.register_template(
        COLLECTION_TEMPLATE,
        ResourceMeta::new(
            "Data Collections",
            "Access to data collections (users, projects)",
            JSON_MIME,
        )
        .with_annotations(&both, 0.6),
        Arc::new(CollectionResource { data: data.clone() }),
    )?;
    router.register_template(
        FILE_TEMPLATE,
        ResourceMeta::new(
            "File System Access",
            "Access to files in the document root",
            "text/plain",
        )
        .with_annotations(&both, 0.5),
        Arc::new(FileResource { docs: docs.clone() }),
    )?;

    Ok(())
}

struct SystemInfoResource {
    data: SampleData,
    started_at: Instant,
}

#[async_trait]
impl ResourceHandler for SystemInfoResource {
    async fn read(
        &self,
        uri: &str,
        _binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        let info = json!({
            "server_name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            "uptime_seconds": self.started_at.elapsed().as_secs(),
            "resources": {
                "users": self.data.users.len(),
                "projects": self.data.projects.len(),
            },
        });

        Ok(vec![ResourceContent::text(uri, JSON_MIME, pretty_json(&info)?)])
    }
}

struct ReadmeResource {
    docs: DocumentRoot,
    file: String,
}

#[async_trait]
impl ResourceHandler for ReadmeResource {
    async fn read(
        &self,
        uri: &str,
        _binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        // A missing README is a server misconfiguration, not a caller mistake.
        let body = self.docs.read(&self.file).await.map_err(|err| match err {
            AppError::NotFound { .. } => AppError::internal(format!(
                "{} is missing from {}",
                self.file,
                self.docs.root().display()
            )),
            other => other,
        })?;

        Ok(vec![match body {
            FileBody::Text(text) => ResourceContent::text(uri, "text/markdown", text),
            FileBody::Binary(bytes) => ResourceContent::blob(uri, "text/markdown", bytes),
        }])
    }
}

struct UserResource {
    users: Arc<RecordStore<User>>,
}

#[async_trait]
impl ResourceHandler for UserResource {
    async fn read(
        &self,
        uri: &str,
        binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        let id = record_id(binding)?;
        let user = self.users.get(id).ok_or_else(|| {
            AppError::not_found_with_details(uri, format!("user not found: {id}"))
        })?;

        Ok(vec![ResourceContent::text(uri, JSON_MIME, pretty_json(&user)?)])
    }
}

struct ProjectResource {
    projects: Arc<RecordStore<Project>>,
}

#[async_trait]
impl ResourceHandler for ProjectResource {
    async fn read(
        &self,
        uri: &str,
        binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        let id = record_id(binding)?;
        let project = self.projects.get(id).ok_or_else(|| {
            AppError::not_found_with_details(uri, format!("project not found: {id}"))
        })?;

        Ok(vec![ResourceContent::text(uri, JSON_MIME, pretty_json(&project)?)])
    }
}

struct CollectionResource {
    data: SampleData,
}

#[async_trait]
impl ResourceHandler for CollectionResource {
    async fn read(
        &self,
        uri: &str,
        binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        let collection = placeholder(binding, "collection")?;
        let text = match collection {
            "users" => pretty_json(&self.data.users.list())?,
            "projects" => pretty_json(&self.data.projects.list())?,
            other => {
                return Err(AppError::not_found_with_details(
                    uri,
                    format!("collection not found: {other}"),
                ))
            }
        };

        Ok(vec![ResourceContent::text(uri, JSON_MIME, text)])
    }
}

struct FileResource {
    docs: DocumentRoot,
}

#[async_trait]
impl ResourceHandler for FileResource {
    async fn read(
        &self,
        uri: &str,
        binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError> {
        let path = placeholder(binding, "path")?;
        let mime_type = guess_mime_type(path);

        let content = match self.docs.read(path).await {
            Ok(FileBody::Text(text)) => ResourceContent::text(uri, mime_type, text),
            Ok(FileBody::Binary(bytes)) => {
                let mime_type = if mime_type.starts_with("text/") {
                    "application/octet-stream"
                } else {
                    mime_type
                };
                ResourceContent::blob(uri, mime_type, bytes)
            }
            Err(AppError::NotFound { details, .. }) => {
                return Err(AppError::NotFound {
                    identifier: uri.to_string(),
                    details,
                })
            }
            Err(err) => return Err(err),
        };

        Ok(vec![content])
    }
}

fn placeholder<'a>(binding: &'a PlaceholderBinding, name: &str) -> Result<&'a str, AppError> {
    binding
        .get(name)
        .map(String::as_str)
        .ok_or_else(|| AppError::internal(format!("template placeholder `{name}` not bound")))
}

fn record_id(binding: &PlaceholderBinding) -> Result<u64, AppError> {
    placeholder(binding, "id")?
        .parse::<u64>()
        .map_err(|_| AppError::bad_argument("id", "non-negative integer"))
}

fn pretty_json(value: &impl Serialize) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::internal(format!("failed to serialize resource: {err}")))
}
