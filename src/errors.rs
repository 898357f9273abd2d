use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {identifier}")]
    NotFound {
        identifier: String,
        details: Option<String>,
    },
    #[error("bad argument `{argument}`: expected {expected}")]
    BadArgument { argument: String, expected: String },
    #[error("bad request: {message}")]
    BadRequest {
        code: &'static str,
        message: &'static str,
    },
    #[error("handler failed for {identifier}: {message}")]
    Handler { identifier: String, message: String },
    #[error("internal error")]
    Internal { code: &'static str, message: String },
}

impl AppError {
    pub fn not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            details: None,
        }
    }

    pub fn not_found_with_details(
        identifier: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self::NotFound {
            identifier: identifier.into(),
            details: Some(details.into()),
        }
    }

    pub fn bad_argument(argument: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::BadArgument {
            argument: argument.into(),
            expected: expected.into(),
        }
    }

    pub fn bad_request(code: &'static str, message: &'static str) -> Self {
        Self::BadRequest { code, message }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: "internal_error",
            message: message.into(),
        }
    }

    /// Ties a handler failure to the resource that produced it.
    ///
    /// Only internal failures change kind; everything else is already
    /// meaningful to the caller and passes through untouched.
    pub fn for_resource(self, identifier: &str) -> Self {
        match self {
            Self::Internal { message, .. } => Self::Handler {
                identifier: identifier.to_string(),
                message,
            },
            other => other,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("resource uri already registered: {0}")]
    DuplicateUri(String),
    #[error("resource template overlaps an existing template: {0}")]
    DuplicateTemplate(String),
    #[error("invalid resource template {pattern}: {reason}")]
    InvalidTemplate {
        pattern: String,
        reason: &'static str,
    },
    #[error("tool already registered: {0}")]
    DuplicateTool(String),
}
