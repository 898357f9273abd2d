//! Resource routing: static identifiers first, then templates in registration order

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rust_mcp_sdk::schema::{Annotations, Resource, ResourceTemplate, Role};
use tracing::warn;

use crate::errors::{AppError, RegistryError};
use crate::router::template::{PlaceholderBinding, UriTemplate};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Blob(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceContent {
    pub uri: String,
    pub mime_type: String,
    pub payload: Payload,
}

impl ResourceContent {
    pub fn text(
        uri: impl Into<String>,
        mime_type: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            payload: Payload::Text(text.into()),
        }
    }

    pub fn blob(uri: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            payload: Payload::Blob(bytes),
        }
    }
}

/// Listing metadata shared by static resources and templates.
#[derive(Debug, Clone)]
pub struct ResourceMeta {
    pub name: String,
    pub description: String,
    pub mime_type: String,
    pub annotations: Option<Annotations>,
}

impl ResourceMeta {
    pub fn new(name: &str, description: &str, mime_type: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            mime_type: mime_type.to_string(),
            annotations: None,
        }
    }

    pub fn with_annotations(mut self, audience: &[Role], priority: f64) -> Self {
        self.annotations = Some(Annotations {
            audience: audience.to_vec(),
            priority: Some(priority),
            last_modified: None,
        });
        self
    }
}

#[async_trait]
pub trait ResourceHandler: Send + Sync {
    async fn read(
        &self,
        uri: &str,
        binding: &PlaceholderBinding,
    ) -> Result<Vec<ResourceContent>, AppError>;
}

struct StaticEntry {
    uri: String,
    meta: ResourceMeta,
    handler: Arc<dyn ResourceHandler>,
}

struct TemplateEntry {
    template: UriTemplate,
    meta: ResourceMeta,
    handler: Arc<dyn ResourceHandler>,
}

/// What `resolve` picked for an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration<'a> {
    Static { uri: &'a str },
    Template { pattern: &'a str },
}

pub struct Resolved<'a> {
    pub registration: Registration<'a>,
    pub binding: PlaceholderBinding,
    handler: &'a Arc<dyn ResourceHandler>,
}

/// Read-only after setup; share it behind an `Arc`.
#[derive(Default)]
pub struct ResourceRouter {
    statics: Vec<StaticEntry>,
    static_index: HashMap<String, usize>,
    templates: Vec<TemplateEntry>,
}

impl ResourceRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_static(
        &mut self,
        uri: &str,
        meta: ResourceMeta,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), RegistryError> {
        if self.static_index.contains_key(uri) {
            return Err(RegistryError::DuplicateUri(uri.to_string()));
        }

        self.static_index.insert(uri.to_string(), self.statics.len());
        self.statics.push(StaticEntry {
            uri: uri.to_string(),
            meta,
            handler,
        });
        Ok(())
    }

    pub fn register_template(
        &mut self,
        pattern: &str,
        meta: ResourceMeta,
        handler: Arc<dyn ResourceHandler>,
    ) -> Result<(), RegistryError> {
        let template = UriTemplate::parse(pattern)?;
        if self
            .templates
            .iter()
            .any(|entry| entry.template.shape() == template.shape())
        {
            return Err(RegistryError::DuplicateTemplate(pattern.to_string()));
        }

        self.templates.push(TemplateEntry {
            template,
            meta,
            handler,
        });
        Ok(())
    }

    pub fn list_static_resources(&self) -> Vec<Resource> {
        self.statics
            .iter()
            .map(|entry| Resource {
                annotations: entry.meta.annotations.clone(),
                description: Some(entry.meta.description.clone()),
                icons: vec![],
                meta: None,
                mime_type: Some(entry.meta.mime_type.clone()),
                name: entry.meta.name.clone(),
                size: None,
                title: Some(entry.meta.name.clone()),
                uri: entry.uri.clone(),
            })
            .collect()
    }

    pub fn list_templates(&self) -> Vec<ResourceTemplate> {
        self.templates
            .iter()
            .map(|entry| ResourceTemplate {
                annotations: entry.meta.annotations.clone(),
                description: Some(entry.meta.description.clone()),
                icons: vec![],
                meta: None,
                mime_type: Some(entry.meta.mime_type.clone()),
                name: entry.meta.name.clone(),
                title: Some(entry.meta.name.clone()),
                uri_template: entry.template.pattern().to_string(),
            })
            .collect()
    }

    pub fn resolve(&self, uri: &str) -> Result<Resolved<'_>, AppError> {
        if let Some(entry) = self.static_index.get(uri).map(|index| &self.statics[*index]) {
            return Ok(Resolved {
                registration: Registration::Static { uri: &entry.uri },
                binding: PlaceholderBinding::new(),
                handler: &entry.handler,
            });
        }

        self.templates
            .iter()
            .find_map(|entry| {
                entry.template.matches(uri).map(|binding| Resolved {
                    registration: Registration::Template {
                        pattern: entry.template.pattern(),
                    },
                    binding,
                    handler: &entry.handler,
                })
            })
            .ok_or_else(|| AppError::not_found(uri))
    }

    pub async fn read(&self, uri: &str) -> Result<Vec<ResourceContent>, AppError> {
        let resolved = self.resolve(uri)?;

        resolved
            .handler
            .read(uri, &resolved.binding)
            .await
            .map_err(|err| {
                warn!(uri = %uri, error = %err, "resource handler failed");
                err.for_resource(uri)
            })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };

    use async_trait::async_trait;

    use super::*;

    struct Echo {
        label: &'static str,
    }

    #[async_trait]
    impl ResourceHandler for Echo {
        async fn read(
            &self,
            uri: &str,
            binding: &PlaceholderBinding,
        ) -> Result<Vec<ResourceContent>, AppError> {
            let mut keys = binding
                .iter()
                .map(|(key, value)| format!("{key}={value}"))
                .collect::<Vec<_>>();
            keys.sort();
            Ok(vec![ResourceContent::text(
                uri,
                "text/plain",
                format!("{}:{}", self.label, keys.join(",")),
            )])
        }
    }

    struct Failing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl ResourceHandler for Failing {
        async fn read(
            &self,
            _uri: &str,
            _binding: &PlaceholderBinding,
        ) -> Result<Vec<ResourceContent>, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::internal("backing store unavailable"))
        }
    }

    fn echo(label: &'static str) -> Arc<dyn ResourceHandler> {
        Arc::new(Echo { label })
    }

    fn meta() -> ResourceMeta {
        ResourceMeta::new("Test", "Test resource", "text/plain")
    }

    #[test]
    fn static_identifier_resolves_with_empty_binding() {
        let mut router = ResourceRouter::new();
        router
            .register_static("system://info", meta(), echo("info"))
            .expect("register");

        let resolved = router.resolve("system://info").expect("resolves");
        assert_eq!(
            resolved.registration,
            Registration::Static {
                uri: "system://info"
            }
        );
        assert!(resolved.binding.is_empty());
    }

    #[test]
    fn template_resolves_with_binding() {
        let mut router = ResourceRouter::new();
        router
            .register_template("users://{id}/profile", meta(), echo("profile"))
            .expect("register");

        let resolved = router.resolve("users://7/profile").expect("resolves");
        assert_eq!(
            resolved.registration,
            Registration::Template {
                pattern: "users://{id}/profile"
            }
        );
        assert_eq!(resolved.binding.get("id").map(String::as_str), Some("7"));
    }

    #[test]
    fn unknown_identifier_is_not_found() {
        let mut router = ResourceRouter::new();
        router
            .register_static("system://info", meta(), echo("info"))
            .expect("register");
        router
            .register_template("users://{id}", meta(), echo("user"))
            .expect("register");

        let error = router.resolve("projects://1").err().expect("not found");
        assert!(matches!(
            error,
            AppError::NotFound { ref identifier, .. } if identifier == "projects://1"
        ));
    }

    #[test]
    fn static_wins_over_matching_template() {
        let mut router = ResourceRouter::new();
        router
            .register_template("users://{id}", meta(), echo("template"))
            .expect("register");
        router
            .register_static("users://me", meta(), echo("static"))
            .expect("register");

        let resolved = router.resolve("users://me").expect("resolves");
        assert_eq!(resolved.registration, Registration::Static { uri: "users://me" });
    }

    #[test]
    fn first_registered_template_wins() {
        let mut router = ResourceRouter::new();
        router
            .register_template("files://{+path}", meta(), echo("deep"))
            .expect("register");
        router
            .register_template("files://{name}", meta(), echo("shallow"))
            .expect("register");

        let resolved = router.resolve("files://readme").expect("resolves");
        assert_eq!(
            resolved.registration,
            Registration::Template {
                pattern: "files://{+path}"
            }
        );
    }

    #[test]
    fn rejects_duplicate_registrations() {
        let mut router = ResourceRouter::new();
        router
            .register_static("system://info", meta(), echo("info"))
            .expect("register");
        router
            .register_template("users://{id}", meta(), echo("user"))
            .expect("register");

        assert_eq!(
            router.register_static("system://info", meta(), echo("again")),
            Err(RegistryError::DuplicateUri("system://info".to_string()))
        );
        assert_eq!(
            router.register_template("users://{user_id}", meta(), echo("again")),
            Err(RegistryError::DuplicateTemplate("users://{user_id}".to_string()))
        );
    }

    #[test]
    fn listings_preserve_registration_order() {
        let mut router = ResourceRouter::new();
        router
            .register_static("b://one", meta(), echo("one"))
            .expect("register");
        router
            .register_static("a://two", meta(), echo("two"))
            .expect("register");
        router
            .register_template("z://{x}", meta(), echo("z"))
            .expect("register");
        router
            .register_template("y://{x}", meta(), echo("y"))
            .expect("register");

        let statics = router
            .list_static_resources()
            .into_iter()
            .map(|descriptor| descriptor.uri)
            .collect::<Vec<_>>();
        let templates = router
            .list_templates()
            .into_iter()
            .map(|descriptor| descriptor.uri_template)
            .collect::<Vec<_>>();

        assert_eq!(statics, ["b://one", "a://two"]);
        assert_eq!(templates, ["z://{x}", "y://{x}"]);
    }

    #[tokio::test]
    async fn read_passes_identifier_and_binding_to_handler() {
        let mut router = ResourceRouter::new();
        router
            .register_template("orgs://{org}/members/{member}", meta(), echo("member"))
            .expect("register");

        let contents = router
            .read("orgs://acme/members/ann")
            .await
            .expect("read succeeds");

        assert_eq!(
            contents,
            vec![ResourceContent::text(
                "orgs://acme/members/ann",
                "text/plain",
                "member:member=ann,org=acme"
            )]
        );
    }

    #[tokio::test]
    async fn read_wraps_handler_failure_with_identifier() {
        let failing = Arc::new(Failing {
            calls: AtomicUsize::new(0),
        });
        let mut router = ResourceRouter::new();
        router
            .register_static("docs://readme", meta(), failing.clone())
            .expect("register");

        let error = router.read("docs://readme").await.expect_err("must fail");

        assert_eq!(failing.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(
            error,
            AppError::Handler { ref identifier, .. } if identifier == "docs://readme"
        ));
    }
}
