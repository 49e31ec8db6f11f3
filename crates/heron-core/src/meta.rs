//! Metadata model: the markers a component declares about itself.
//!
//! A [`ComponentDescriptor`] is the typed, compile-time-known replacement for
//! runtime introspection. It names the component, says whether it is a plain
//! component or a controller, carries the controller base path and lists the
//! handler methods with their verb markers and parameter bindings.
//!
//! Descriptors are normally generated by the `#[controller]` attribute macro,
//! but can be written by hand with the builders in this module:
//!
//! ```
//! use heron_core::meta::{ComponentDescriptor, Mapping, MethodDescriptor, ParamDescriptor, ParamKind};
//!
//! let descriptor = ComponentDescriptor::controller("ItemController")
//!     .base_path("/items")
//!     .method(
//!         MethodDescriptor::new("show")
//!             .mapping(Mapping::get("/{id}"))
//!             .param(ParamDescriptor::path_variable("id", ParamKind::Int64)),
//!     );
//!
//! assert_eq!(descriptor.methods().len(), 1);
//! assert_eq!(descriptor.methods()[0].mappings()[0].path(), "/{id}");
//! ```

use std::any::Any;
use std::fmt;

use heron_router::Verb;
use serde::de::DeserializeOwned;

use crate::codec::{self, CodecError};

/// How a component type is marked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stereotype {
    /// A plain component: instantiated and registered, never routed.
    Component,
    /// A controller: its mapped methods become routes.
    Controller,
}

/// An HTTP verb marker on a handler method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VerbMarker {
    /// `#[get]`
    Get,
    /// `#[post]`
    Post,
    /// `#[put]`
    Put,
    /// `#[patch]`
    Patch,
    /// `#[delete]`
    Delete,
    /// `#[request_mapping(method = ...)]`
    Request(Verb),
}

impl VerbMarker {
    /// Returns the verb the marker maps to.
    #[must_use]
    pub const fn verb(self) -> Verb {
        match self {
            Self::Get => Verb::Get,
            Self::Post => Verb::Post,
            Self::Put => Verb::Put,
            Self::Patch => Verb::Patch,
            Self::Delete => Verb::Delete,
            Self::Request(verb) => verb,
        }
    }
}

impl fmt::Display for VerbMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => f.write_str("get"),
            Self::Post => f.write_str("post"),
            Self::Put => f.write_str("put"),
            Self::Patch => f.write_str("patch"),
            Self::Delete => f.write_str("delete"),
            Self::Request(verb) => write!(f, "request_mapping({verb})"),
        }
    }
}

/// A verb marker together with its path attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mapping {
    marker: VerbMarker,
    path: String,
}

impl Mapping {
    /// Creates a mapping.
    pub fn new(marker: VerbMarker, path: impl Into<String>) -> Self {
        Self {
            marker,
            path: path.into(),
        }
    }

    /// `#[get(path)]`
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Get, path)
    }

    /// `#[post(path)]`
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Post, path)
    }

    /// `#[put(path)]`
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Put, path)
    }

    /// `#[patch(path)]`
    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Patch, path)
    }

    /// `#[delete(path)]`
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Delete, path)
    }

    /// `#[request_mapping(method = verb, path = path)]`
    pub fn request(verb: Verb, path: impl Into<String>) -> Self {
        Self::new(VerbMarker::Request(verb), path)
    }

    /// Returns the marker.
    #[must_use]
    pub fn marker(&self) -> VerbMarker {
        self.marker
    }

    /// Returns the verb.
    #[must_use]
    pub fn verb(&self) -> Verb {
        self.marker.verb()
    }

    /// Returns the path attribute as declared.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

/// Where a parameter's value comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamBinding {
    /// The whole request body, decoded as JSON.
    Body,
    /// A path variable, by explicit name or by the parameter's own name.
    PathVariable {
        /// Explicit variable name, if it differs from the parameter name.
        name: Option<String>,
    },
    /// No marker: always bound to an absent value.
    Unbound,
}

/// Type-erased JSON decoder for a body parameter.
#[derive(Clone, Copy)]
pub struct JsonShape {
    type_name: &'static str,
    decode: fn(&[u8]) -> Result<Box<dyn Any + Send>, CodecError>,
}

impl JsonShape {
    /// Describes a body parameter of type `T`.
    #[must_use]
    pub fn of<T: DeserializeOwned + Send + 'static>() -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            decode: decode_boxed::<T>,
        }
    }

    /// Returns the Rust type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Decodes `bytes` into a boxed value of the described type.
    pub fn decode(&self, bytes: &[u8]) -> Result<Box<dyn Any + Send>, CodecError> {
        (self.decode)(bytes)
    }
}

impl fmt::Debug for JsonShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("JsonShape").field(&self.type_name).finish()
    }
}

impl PartialEq for JsonShape {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
    }
}

impl Eq for JsonShape {}

fn decode_boxed<T: DeserializeOwned + Send + 'static>(
    bytes: &[u8],
) -> Result<Box<dyn Any + Send>, CodecError> {
    codec::decode::<T>(bytes).map(|value| Box::new(value) as Box<dyn Any + Send>)
}

/// The declared type of a parameter, as far as binding cares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    /// `String`
    Text,
    /// `i32`
    Int32,
    /// `i64`
    Int64,
    /// `bool`
    Bool,
    /// Any JSON-decodable type.
    Json(JsonShape),
    /// A type no binding source can produce.
    Unsupported(&'static str),
}

impl ParamKind {
    /// Short human-readable name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "String",
            Self::Int32 => "i32",
            Self::Int64 => "i64",
            Self::Bool => "bool",
            Self::Json(shape) => shape.type_name(),
            Self::Unsupported(name) => name,
        }
    }
}

/// One parameter of a handler method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDescriptor {
    name: String,
    binding: ParamBinding,
    kind: ParamKind,
}

impl ParamDescriptor {
    /// Creates a descriptor.
    pub fn new(name: impl Into<String>, binding: ParamBinding, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            binding,
            kind,
        }
    }

    /// A path variable named after the parameter.
    pub fn path_variable(name: impl Into<String>, kind: ParamKind) -> Self {
        Self::new(name, ParamBinding::PathVariable { name: None }, kind)
    }

    /// A path variable with an explicit variable name.
    pub fn named_path_variable(
        name: impl Into<String>,
        variable: impl Into<String>,
        kind: ParamKind,
    ) -> Self {
        Self::new(
            name,
            ParamBinding::PathVariable {
                name: Some(variable.into()),
            },
            kind,
        )
    }

    /// A JSON body parameter of type `T`.
    pub fn body<T: DeserializeOwned + Send + 'static>(name: impl Into<String>) -> Self {
        Self::new(name, ParamBinding::Body, ParamKind::Json(JsonShape::of::<T>()))
    }

    /// A parameter with no marker.
    pub fn unbound(name: impl Into<String>, kind: ParamKind) -> Self {
        Self::new(name, ParamBinding::Unbound, kind)
    }

    /// Returns the parameter name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the binding marker.
    #[must_use]
    pub fn binding(&self) -> &ParamBinding {
        &self.binding
    }

    /// Returns the declared kind.
    #[must_use]
    pub fn kind(&self) -> &ParamKind {
        &self.kind
    }

    /// Returns the path variable this parameter binds, if any.
    ///
    /// A blank explicit name falls back to the parameter name.
    #[must_use]
    pub fn variable_name(&self) -> Option<&str> {
        match &self.binding {
            ParamBinding::PathVariable { name: Some(name) } if !name.trim().is_empty() => {
                Some(name)
            }
            ParamBinding::PathVariable { .. } => Some(&self.name),
            _ => None,
        }
    }
}

/// A method declared by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodDescriptor {
    name: String,
    mappings: Vec<Mapping>,
    params: Vec<ParamDescriptor>,
}

impl MethodDescriptor {
    /// Creates a method with no markers or parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mappings: Vec::new(),
            params: Vec::new(),
        }
    }

    /// Adds a verb marker.
    pub fn mapping(mut self, mapping: Mapping) -> Self {
        self.mappings.push(mapping);
        self
    }

    /// Appends a parameter.
    pub fn param(mut self, param: ParamDescriptor) -> Self {
        self.params.push(param);
        self
    }

    /// Returns the method name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns every verb marker, in declaration order.
    #[must_use]
    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }

    /// Returns the parameters, in declaration order.
    #[must_use]
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Returns `true` if the method carries any verb marker.
    #[must_use]
    pub fn is_handler(&self) -> bool {
        !self.mappings.is_empty()
    }
}

/// Everything a component type declares about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    name: String,
    stereotype: Stereotype,
    base_path: String,
    methods: Vec<MethodDescriptor>,
}

impl ComponentDescriptor {
    /// Describes a plain component.
    pub fn component(name: impl Into<String>) -> Self {
        Self::new(name, Stereotype::Component)
    }

    /// Describes a controller.
    pub fn controller(name: impl Into<String>) -> Self {
        Self::new(name, Stereotype::Controller)
    }

    fn new(name: impl Into<String>, stereotype: Stereotype) -> Self {
        Self {
            name: name.into(),
            stereotype,
            base_path: String::new(),
            methods: Vec::new(),
        }
    }

    /// Sets the base path prefixed to every mapped method.
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = path.into();
        self
    }

    /// Declares a method.
    pub fn method(mut self, method: MethodDescriptor) -> Self {
        self.methods.push(method);
        self
    }

    /// Returns the component name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how the type is marked.
    #[must_use]
    pub fn stereotype(&self) -> Stereotype {
        self.stereotype
    }

    /// Returns `true` for controllers.
    #[must_use]
    pub fn is_controller(&self) -> bool {
        self.stereotype == Stereotype::Controller
    }

    /// Returns the base path as declared.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.base_path
    }

    /// Returns the declared methods.
    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.methods
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Deserialize)]
    struct NewItem {
        name: String,
    }

    #[test]
    fn test_marker_display() {
        assert_eq!(VerbMarker::Get.to_string(), "get");
        assert_eq!(
            VerbMarker::Request(Verb::Put).to_string(),
            "request_mapping(PUT)"
        );
    }

    #[test]
    fn test_request_mapping_verb() {
        let mapping = Mapping::request(Verb::Patch, "/x");
        assert_eq!(mapping.verb(), Verb::Patch);
        assert_eq!(mapping.marker(), VerbMarker::Request(Verb::Patch));
    }

    #[test]
    fn test_variable_name_falls_back_to_param_name() {
        let plain = ParamDescriptor::path_variable("id", ParamKind::Int64);
        assert_eq!(plain.variable_name(), Some("id"));

        let named = ParamDescriptor::named_path_variable("item_id", "id", ParamKind::Int64);
        assert_eq!(named.variable_name(), Some("id"));

        let blank = ParamDescriptor::named_path_variable("id", "  ", ParamKind::Text);
        assert_eq!(blank.variable_name(), Some("id"));

        let body = ParamDescriptor::body::<NewItem>("item");
        assert_eq!(body.variable_name(), None);
    }

    #[test]
    fn test_json_shape_decodes() {
        let shape = JsonShape::of::<NewItem>();
        let value = shape.decode(br#"{"name":"lamp"}"#).unwrap();
        let item = value.downcast::<NewItem>().unwrap();
        assert_eq!(item.name, "lamp");
        assert!(shape.type_name().ends_with("NewItem"));
    }

    #[test]
    fn test_component_descriptor_builder() {
        let descriptor = ComponentDescriptor::controller("Items")
            .base_path("/items")
            .method(MethodDescriptor::new("helper"))
            .method(MethodDescriptor::new("list").mapping(Mapping::get("")));

        assert!(descriptor.is_controller());
        assert_eq!(descriptor.path(), "/items");
        assert!(!descriptor.methods()[0].is_handler());
        assert!(descriptor.methods()[1].is_handler());
    }
}
