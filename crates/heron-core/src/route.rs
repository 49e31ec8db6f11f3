//! Compiled routes.

use std::fmt;
use std::sync::Arc;

use heron_router::Verb;

use crate::component::{Arguments, Component};
use crate::error::HandlerError;
use crate::meta::{ComponentDescriptor, MethodDescriptor};
use crate::response::Reply;

/// A handler method bound to its bean, ready to be dispatched.
///
/// Created once by the route compiler and never modified.
#[derive(Clone)]
pub struct RouteDescriptor {
    verb: Verb,
    template: String,
    bean: Arc<dyn Component>,
    component: Arc<ComponentDescriptor>,
    method: usize,
    variables: Vec<String>,
}

impl RouteDescriptor {
    pub(crate) fn new(
        verb: Verb,
        template: String,
        bean: Arc<dyn Component>,
        component: Arc<ComponentDescriptor>,
        method: usize,
        variables: Vec<String>,
    ) -> Self {
        Self {
            verb,
            template,
            bean,
            component,
            method,
            variables,
        }
    }

    /// Returns the HTTP verb.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.verb
    }

    /// Returns the full, normalized path template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Returns the owning component's descriptor.
    #[must_use]
    pub fn component(&self) -> &ComponentDescriptor {
        &self.component
    }

    /// Returns the handler method's descriptor.
    #[must_use]
    pub fn method(&self) -> &MethodDescriptor {
        &self.component.methods()[self.method]
    }

    /// Returns the template's variable names in left-to-right order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns `Component#method`, for logs and errors.
    #[must_use]
    pub fn handler_name(&self) -> String {
        format!("{}#{}", self.component.name(), self.method().name())
    }

    /// Invokes the handler on its bean.
    pub fn invoke(&self, args: Arguments) -> Result<Reply, HandlerError> {
        self.bean.invoke(self.method().name(), args)
    }
}

impl fmt::Debug for RouteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDescriptor")
            .field("verb", &self.verb)
            .field("template", &self.template)
            .field("handler", &self.handler_name())
            .field("variables", &self.variables)
            .finish()
    }
}
