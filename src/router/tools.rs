//! Tool registry and schema-driven argument validation
//!
//! Each tool declares its arguments once. The same declaration produces the
//! advertised JSON schema and drives validation, so handlers only ever see
//! arguments that already passed the checks.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use rust_mcp_sdk::schema::{Tool, ToolInputSchema};
use serde_json::{json, Map, Value};

use crate::errors::{AppError, RegistryError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentType {
    String,
    Number,
    Enum(&'static [&'static str]),
}

impl ArgumentType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::String => value.is_string(),
            Self::Number => value.is_number(),
            Self::Enum(allowed) => value
                .as_str()
                .is_some_and(|candidate| allowed.contains(&candidate)),
        }
    }

    fn expected(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Number => "number".to_string(),
            Self::Enum(allowed) => format!("one of: {}", allowed.join(", ")),
        }
    }

    fn property_schema(&self, description: &str) -> Map<String, Value> {
        let mut property = Map::new();
        let type_name = match self {
            Self::Number => "number",
            Self::String | Self::Enum(_) => "string",
        };
        property.insert("type".to_string(), json!(type_name));
        property.insert("description".to_string(), json!(description));
        if let Self::Enum(allowed) = self {
            property.insert("enum".to_string(), json!(allowed));
        }
        property
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub kind: ArgumentType,
    pub required: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolSchema {
    arguments: Vec<ArgumentSpec>,
}

impl ToolSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(
        mut self,
        name: &'static str,
        kind: ArgumentType,
        description: &'static str,
    ) -> Self {
        self.arguments.push(ArgumentSpec {
            name,
            description,
            kind,
            required: true,
        });
        self
    }

    pub fn optional(
        mut self,
        name: &'static str,
        kind: ArgumentType,
        description: &'static str,
    ) -> Self {
        self.arguments.push(ArgumentSpec {
            name,
            description,
            kind,
            required: false,
        });
        self
    }

    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    /// Checks declared arguments in declaration order and stops at the first
    /// missing or mistyped one. Undeclared arguments are dropped.
    pub fn validate(
        &self,
        arguments: &Map<String, Value>,
    ) -> Result<ValidatedArguments, AppError> {
        let mut accepted = Map::new();

        for spec in &self.arguments {
            match arguments.get(spec.name).filter(|value| !value.is_null()) {
                Some(value) if spec.kind.accepts(value) => {
                    accepted.insert(spec.name.to_string(), value.clone());
                }
                Some(_) => return Err(AppError::bad_argument(spec.name, spec.kind.expected())),
                None if spec.required => {
                    return Err(AppError::bad_argument(spec.name, spec.kind.expected()))
                }
                None => {}
            }
        }

        Ok(ValidatedArguments { values: accepted })
    }

    pub fn input_schema(&self) -> ToolInputSchema {
        let properties = self
            .arguments
            .iter()
            .map(|spec| {
                (
                    spec.name.to_string(),
                    spec.kind.property_schema(spec.description),
                )
            })
            .collect::<HashMap<_, _>>();
        let required = self
            .arguments
            .iter()
            .filter(|spec| spec.required)
            .map(|spec| spec.name.to_string())
            .collect();

        ToolInputSchema::new(required, Some(properties), None)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedArguments {
    values: Map<String, Value>,
}

impl ValidatedArguments {
    pub fn str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    pub fn number(&self, name: &str) -> Option<f64> {
        self.values.get(name).and_then(Value::as_f64)
    }

    pub fn required_str(&self, name: &str) -> Result<&str, AppError> {
        self.str(name)
            .ok_or_else(|| AppError::internal(format!("validated argument `{name}` is missing")))
    }

    pub fn required_number(&self, name: &str) -> Result<f64, AppError> {
        self.number(name)
            .ok_or_else(|| AppError::internal(format!("validated argument `{name}` is missing")))
    }
}

/// Result of a tool call that reached its handler.
///
/// `is_error` marks a caller-facing failure: it travels back as a normal
/// response, not as a protocol error.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    pub text: String,
    pub structured: Option<Map<String, Value>>,
    pub is_error: bool,
}

impl ToolOutcome {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
            is_error: true,
        }
    }

    pub fn with_structured(mut self, structured: Map<String, Value>) -> Self {
        self.structured = Some(structured);
        self
    }
}

#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: ValidatedArguments) -> Result<ToolOutcome, AppError>;
}

struct ToolEntry {
    name: String,
    description: String,
    schema: ToolSchema,
    handler: Arc<dyn ToolHandler>,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<ToolEntry>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: &str,
        description: &str,
        schema: ToolSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Result<(), RegistryError> {
        if self.index.contains_key(name) {
            return Err(RegistryError::DuplicateTool(name.to_string()));
        }

        self.index.insert(name.to_string(), self.tools.len());
        self.tools.push(ToolEntry {
            name: name.to_string(),
            description: description.to_string(),
            schema,
            handler,
        });
        Ok(())
    }

    pub fn list_tools(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .map(|entry| Tool {
                annotations: None,
                description: Some(entry.description.clone()),
                execution: None,
                icons: vec![],
                input_schema: entry.schema.input_schema(),
                meta: None,
                name: entry.name.clone(),
                output_schema: None,
                title: None,
            })
            .collect()
    }

    pub async fn call(
        &self,
        name: &str,
        arguments: &Map<String, Value>,
    ) -> Result<ToolOutcome, AppError> {
        let entry = self
            .index
            .get(name)
            .map(|index| &self.tools[*index])
            .ok_or_else(|| AppError::not_found(name))?;

        let validated = entry.schema.validate(arguments)?;
        entry.handler.call(validated).await
    }
}
