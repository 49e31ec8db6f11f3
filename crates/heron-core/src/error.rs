//! Error types for Heron.
//!
//! Errors fall into two groups. [`ConfigurationError`] is raised while the
//! routing table is compiled and must abort startup. [`ConversionError`] and
//! [`HandlerError`] happen per request and are turned into a 500 response at
//! the dispatch boundary.

use std::fmt;

use heron_router::TemplateError;
use thiserror::Error;

use crate::codec::CodecError;

/// Result type alias for handler methods.
pub type HandlerResult<T> = Result<T, HandlerError>;

/// A structural problem found while compiling routes.
///
/// Every variant names the component and method at fault so that the startup
/// failure points straight at the offending declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    /// A handler method carries more than one HTTP verb marker.
    #[error("method {component}#{method} has conflicting HTTP mappings: {}", markers.join(", "))]
    ConflictingMappings {
        /// Component type name.
        component: String,
        /// Handler method name.
        method: String,
        /// Every verb marker found on the method.
        markers: Vec<String>,
    },

    /// A template variable has no matching path-variable parameter.
    #[error("path variable '{{{name}}}' in '{template}' has no matching parameter on {component}#{method}")]
    UnboundPathVariable {
        /// Component type name.
        component: String,
        /// Handler method name.
        method: String,
        /// Full route template.
        template: String,
        /// The unbound variable name.
        name: String,
    },

    /// A path-variable parameter names a variable absent from the template.
    #[error("parameter '{name}' on {component}#{method} does not appear in path '{template}'")]
    UnknownPathVariable {
        /// Component type name.
        component: String,
        /// Handler method name.
        method: String,
        /// Full route template.
        template: String,
        /// The unknown variable name.
        name: String,
    },

    /// The same path-variable name is bound twice on one method.
    #[error("duplicate path variable '{name}' on {component}#{method}")]
    DuplicatePathVariable {
        /// Component type name.
        component: String,
        /// Handler method name.
        method: String,
        /// The repeated name.
        name: String,
    },

    /// The route template could not be compiled.
    #[error("invalid path on {component}#{method}: {source}")]
    InvalidTemplate {
        /// Component type name.
        component: String,
        /// Handler method name.
        method: String,
        /// Why the template was rejected.
        #[source]
        source: TemplateError,
    },

    /// Two handlers map the same verb and template.
    #[error("route {verb} {template} is mapped by both {first} and {second}")]
    DuplicateRoute {
        /// HTTP verb.
        verb: String,
        /// Full route template.
        template: String,
        /// `Component#method` registered first.
        first: String,
        /// `Component#method` registered second.
        second: String,
    },
}

/// A failure turning request data into handler arguments.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The request body could not be decoded into the declared shape.
    #[error("invalid request body for parameter '{param}': {source}")]
    InvalidBody {
        /// Parameter name.
        param: String,
        /// Decoder diagnostic.
        #[source]
        source: CodecError,
    },

    /// The parameter's declared type cannot be bound from this source.
    #[error("unsupported type {type_name} for parameter '{param}'")]
    UnsupportedType {
        /// Parameter name.
        param: String,
        /// Declared Rust type.
        type_name: String,
    },

    /// A path segment is not a valid literal of the declared type.
    #[error("cannot convert '{value}' to {expected} for parameter '{param}'")]
    BadValue {
        /// Parameter name.
        param: String,
        /// The offending text.
        value: String,
        /// Target kind.
        expected: &'static str,
    },

    /// No binding exists for a path variable.
    #[error("no value bound for path variable '{name}'")]
    MissingVariable {
        /// Variable name.
        name: String,
    },

    /// A handler asked for an argument of the wrong kind or position.
    #[error("argument {index} is not a {expected}")]
    ArgumentMismatch {
        /// Argument position.
        index: usize,
        /// What the handler expected.
        expected: &'static str,
    },
}

/// A failure raised by a handler method.
///
/// Handlers return `Result<_, HandlerError>` (or any error convertible into
/// it); the dispatcher logs the error and answers 500 with an empty body.
///
/// # Example
///
/// ```
/// use heron_core::HandlerError;
///
/// fn find(id: i64) -> Result<String, HandlerError> {
///     if id < 0 {
///         return Err(HandlerError::new("negative id"));
///     }
///     Ok(format!("item {id}"))
/// }
///
/// assert!(find(-1).is_err());
/// ```
pub struct HandlerError {
    message: String,
    source: Option<anyhow::Error>,
}

impl HandlerError {
    /// Creates an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Debug for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerError")
            .field("message", &self.message)
            .field("source", &self.source)
            .finish()
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {source:#}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for HandlerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<ConversionError> for HandlerError {
    fn from(err: ConversionError) -> Self {
        Self::with_source("argument conversion failed", err)
    }
}

impl From<CodecError> for HandlerError {
    fn from(err: CodecError) -> Self {
        Self::with_source("response encoding failed", err)
    }
}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        Self {
            message: "handler failed".to_string(),
            source: Some(err),
        }
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflicting_mappings_names_every_marker() {
        let err = ConfigurationError::ConflictingMappings {
            component: "UserController".to_string(),
            method: "find".to_string(),
            markers: vec!["get".to_string(), "post".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "method UserController#find has conflicting HTTP mappings: get, post"
        );
    }

    #[test]
    fn test_unbound_variable_message() {
        let err = ConfigurationError::UnboundPathVariable {
            component: "ItemController".to_string(),
            method: "show".to_string(),
            template: "/items/{id}".to_string(),
            name: "id".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("{id}"));
        assert!(text.contains("ItemController#show"));
    }

    #[test]
    fn test_bad_value_message() {
        let err = ConversionError::BadValue {
            param: "id".to_string(),
            value: "abc".to_string(),
            expected: "i64",
        };
        assert_eq!(err.to_string(), "cannot convert 'abc' to i64 for parameter 'id'");
    }

    #[test]
    fn test_handler_error_display_includes_source() {
        let err = HandlerError::with_source("lookup failed", anyhow::anyhow!("store offline"));
        assert_eq!(err.to_string(), "lookup failed: store offline");
        assert_eq!(err.message(), "lookup failed");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_handler_error_from_conversion() {
        let err: HandlerError = ConversionError::MissingVariable {
            name: "id".to_string(),
        }
        .into();
        assert!(err.to_string().contains("no value bound"));
    }
}
