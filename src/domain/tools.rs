//! Sample tools registered by the demo server
//!
//! `create_user` and `create_project` append to the shared record store and
//! announce the change to subscribers of the affected collection. Arguments
//! arrive already validated against each tool's schema.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Map};

use crate::domain::resources::{PROJECTS_COLLECTION_URI, SYSTEM_INFO_URI, USERS_COLLECTION_URI};
use crate::domain::store::{Project, RecordStore, SampleData, User, PROJECT_STATUSES, USER_ROLES};
use crate::errors::{AppError, RegistryError};
use crate::router::subscriptions::ResourceEvents;
use crate::router::tools::{
    ArgumentType, ToolHandler, ToolOutcome, ToolRegistry, ToolSchema, ValidatedArguments,
};

pub const CREATE_USER_TOOL: &str = "create_user";
pub const CREATE_PROJECT_TOOL: &str = "create_project";

pub fn register_tools(
    registry: &mut ToolRegistry,
    data: &SampleData,
    events: &ResourceEvents,
) -> Result<(), RegistryError> {
    registry.register(
        CREATE_USER_TOOL,
        "Create a new user in the system",
        ToolSchema::new()
            .required("name", ArgumentType::String, "Full name of the user")
            .required("email", ArgumentType::String, "Email address of the user")
            .optional(
                "role",
                ArgumentType::Enum(USER_ROLES),
                "User role (admin, user, moderator)",
            ),
        Arc::new(CreateUserTool {
            users: Arc::clone(&data.users),
            events: events.clone(),
        }),
    )?;

    registry.register(
        CREATE_PROJECT_TOOL,
        "Create a new project owned by an existing user",
        ToolSchema::new()
            .required("name", ArgumentType::String, "Project name")
            .required("owner_id", ArgumentType::Number, "ID of the owning user")
            .optional("description", ArgumentType::String, "Short project summary")
            .optional(
                "status",
                ArgumentType::Enum(PROJECT_STATUSES),
                "Project status (planning, active, archived)",
            ),
        Arc::new(CreateProjectTool {
            users: Arc::clone(&data.users),
            projects: Arc::clone(&data.projects),
            events: events.clone(),
        }),
    )?;

    Ok(())
}

struct CreateUserTool {
    users: Arc<RecordStore<User>>,
    events: ResourceEvents,
}

#[async_trait]
impl ToolHandler for CreateUserTool {
    async fn call(&self, arguments: ValidatedArguments) -> Result<ToolOutcome, AppError> {
        let name = arguments.required_str("name")?.trim().to_string();
        let email = arguments.required_str("email")?.trim().to_string();
        let role = arguments.str("role").unwrap_or("user").to_string();

        let user = self.users.add(|id| User {
            id,
            name,
            email,
            role,
            created: today(),
        });
        self.events.resource_updated(USERS_COLLECTION_URI);
        self.events.resource_updated(SYSTEM_INFO_URI);

        created_outcome("User", "user", &user)
    }
}

struct CreateProjectTool {
    users: Arc<RecordStore<User>>,
    projects: Arc<RecordStore<Project>>,
    events: ResourceEvents,
}

#[async_trait]
impl ToolHandler for CreateProjectTool {
    async fn call(&self, arguments: ValidatedArguments) -> Result<ToolOutcome, AppError> {
        let raw_owner = arguments.required_number("owner_id")?;
        if raw_owner < 0.0 || raw_owner.fract() != 0.0 {
            return Ok(ToolOutcome::error(format!(
                "owner_id must be a non-negative integer, got {raw_owner}"
            )));
        }

        let owner_id = raw_owner as u64;
        if self.users.get(owner_id).is_none() {
            return Ok(ToolOutcome::error(format!("owner not found: {owner_id}")));
        }

        let name = arguments.required_str("name")?.trim().to_string();
        let description = arguments.str("description").unwrap_or_default().to_string();
        let status = arguments.str("status").unwrap_or("planning").to_string();

        let project = self.projects.add(|id| Project {
            id,
            name,
            description,
            owner_id,
            status,
            created: today(),
        });
        self.events.resource_updated(PROJECTS_COLLECTION_URI);
        self.events.resource_updated(SYSTEM_INFO_URI);

        created_outcome("Project", "project", &project)
    }
}

fn created_outcome(
    label: &str,
    key: &str,
    record: &impl Serialize,
) -> Result<ToolOutcome, AppError> {
    let pretty = serde_json::to_string_pretty(record)
        .map_err(|err| AppError::internal(format!("failed to serialize {key}: {err}")))?;

    Ok(
        ToolOutcome::success(format!("{label} created successfully:\n{pretty}"))
            .with_structured(Map::from_iter([(key.to_string(), json!(record))])),
    )
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}
