//! Route compilation.
//!
//! [`compile`] walks every bean in the registry and turns each mapped method
//! into a [`RouteDescriptor`]. All validation happens here, once, before the
//! first request: conflicting verb markers, malformed templates and any
//! mismatch between template variables and path-variable parameters abort
//! compilation with a [`ConfigurationError`].

use std::collections::HashSet;
use std::sync::Arc;

use heron_router::template::join;
use heron_router::{PathTemplate, RoutingTable, TemplateError};

use crate::error::ConfigurationError;
use crate::meta::{ComponentDescriptor, MethodDescriptor};
use crate::registry::{Bean, Registry};
use crate::route::RouteDescriptor;

/// The table the dispatcher matches against.
pub type RouteTable = RoutingTable<RouteDescriptor>;

/// Knobs for [`compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Fail on a repeated verb and template instead of letting the later
    /// registration replace the earlier one.
    pub reject_duplicates: bool,
}

impl CompileOptions {
    /// Strict options: duplicate routes are an error.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            reject_duplicates: true,
        }
    }
}

/// Builds the routing table from every bean in `registry`.
///
/// Beans are visited in registration order and methods in declaration order,
/// which fixes the first-match priority of overlapping templates.
pub fn compile(registry: &Registry, options: CompileOptions) -> Result<RouteTable, ConfigurationError> {
    let mut table = RouteTable::new();

    for bean in registry.beans() {
        let component = bean.descriptor();
        for (index, method) in component.methods().iter().enumerate() {
            if !method.is_handler() {
                continue;
            }
            let route = compile_method(bean, index, method)?;
            insert(&mut table, route, options)?;
        }
    }

    tracing::info!(routes = table.len(), "routing table compiled");
    Ok(table)
}

fn compile_method(
    bean: &Bean,
    index: usize,
    method: &MethodDescriptor,
) -> Result<(PathTemplate, RouteDescriptor), ConfigurationError> {
    let component = bean.descriptor();

    let [mapping] = method.mappings() else {
        return Err(ConfigurationError::ConflictingMappings {
            component: component.name().to_string(),
            method: method.name().to_string(),
            markers: method
                .mappings()
                .iter()
                .map(|m| m.marker().to_string())
                .collect(),
        });
    };

    let raw = join(component.path(), mapping.path());
    let template = PathTemplate::parse(raw).map_err(|source| template_error(component, method, source))?;

    let params = path_variable_params(component, method)?;
    check_variables(component, method, &template, &params)?;

    let route = RouteDescriptor::new(
        mapping.verb(),
        template.as_str().to_string(),
        bean.instance().clone(),
        Arc::clone(component),
        index,
        template.variables().to_vec(),
    );
    Ok((template, route))
}

fn template_error(
    component: &ComponentDescriptor,
    method: &MethodDescriptor,
    source: TemplateError,
) -> ConfigurationError {
    match source {
        TemplateError::RepeatedVariable { name, .. } => ConfigurationError::DuplicatePathVariable {
            component: component.name().to_string(),
            method: method.name().to_string(),
            name,
        },
        source => ConfigurationError::InvalidTemplate {
            component: component.name().to_string(),
            method: method.name().to_string(),
            source,
        },
    }
}

/// Collects path-variable names declared by the parameters.
fn path_variable_params<'a>(
    component: &ComponentDescriptor,
    method: &'a MethodDescriptor,
) -> Result<Vec<&'a str>, ConfigurationError> {
    let mut seen = HashSet::new();
    let mut names = Vec::new();

    for name in method.params().iter().filter_map(|p| p.variable_name()) {
        if !seen.insert(name) {
            return Err(ConfigurationError::DuplicatePathVariable {
                component: component.name().to_string(),
                method: method.name().to_string(),
                name: name.to_string(),
            });
        }
        names.push(name);
    }
    Ok(names)
}

/// Checks template variables and parameters correspond one to one.
fn check_variables(
    component: &ComponentDescriptor,
    method: &MethodDescriptor,
    template: &PathTemplate,
    params: &[&str],
) -> Result<(), ConfigurationError> {
    if let Some(name) = params
        .iter()
        .find(|name| !template.variables().iter().any(|v| v == *name))
    {
        return Err(ConfigurationError::UnknownPathVariable {
            component: component.name().to_string(),
            method: method.name().to_string(),
            template: template.to_string(),
            name: (*name).to_string(),
        });
    }

    if let Some(name) = template
        .variables()
        .iter()
        .find(|v| !params.contains(&v.as_str()))
    {
        return Err(ConfigurationError::UnboundPathVariable {
            component: component.name().to_string(),
            method: method.name().to_string(),
            template: template.to_string(),
            name: name.clone(),
        });
    }

    Ok(())
}

fn insert(
    table: &mut RouteTable,
    (template, route): (PathTemplate, RouteDescriptor),
    options: CompileOptions,
) -> Result<(), ConfigurationError> {
    let verb = route.verb();
    let handler = route.handler_name();

    if let Some(existing) = table.get(verb, template.as_str()) {
        let first = existing.target().handler_name();
        if options.reject_duplicates {
            return Err(ConfigurationError::DuplicateRoute {
                verb: verb.to_string(),
                template: template.to_string(),
                first,
                second: handler,
            });
        }
        tracing::warn!(
            verb = %verb,
            template = %template,
            replaced = %first,
            handler = %handler,
            "duplicate route, later registration wins"
        );
    }

    tracing::info!(
        verb = %verb,
        template = %template,
        handler = %handler,
        "route registered"
    );
    table.insert(verb, template, route);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Arguments, Component};
    use crate::error::HandlerError;
    use crate::meta::{Mapping, MethodDescriptor, ParamDescriptor, ParamKind};
    use crate::response::Reply;
    use heron_router::Verb;

    /// Declares a test component with a fixed descriptor.
    macro_rules! component {
        ($name:ident, $descriptor:expr) => {
            #[derive(Default)]
            struct $name;

            impl Component for $name {
                fn descriptor() -> ComponentDescriptor {
                    $descriptor
                }

                fn invoke(&self, method: &str, _args: Arguments) -> Result<Reply, HandlerError> {
                    Ok(Reply::Text(format!("{}#{method}", stringify!($name))))
                }
            }
        };
    }

    fn registry_with<T: Component + Default>() -> Registry {
        let mut registry = Registry::new();
        registry.register::<T>();
        registry
    }

    fn handler_at(table: &RouteTable, verb: Verb, path: &str) -> Option<String> {
        table
            .match_route(verb, path)
            .map(|m| m.target().handler_name())
    }

    component!(
        ItemController,
        ComponentDescriptor::controller("ItemController")
            .base_path("items/")
            .method(MethodDescriptor::new("list").mapping(Mapping::get("")))
            .method(
                MethodDescriptor::new("show")
                    .mapping(Mapping::get("/{id}"))
                    .param(ParamDescriptor::path_variable("id", ParamKind::Int64)),
            )
            .method(MethodDescriptor::new("helper"))
            .method(
                MethodDescriptor::new("rename")
                    .mapping(Mapping::request(Verb::Patch, "{id}/name/"))
                    .param(ParamDescriptor::named_path_variable("item", "id", ParamKind::Int64))
                    .param(ParamDescriptor::body::<String>("name")),
            )
    );

    #[test]
    fn test_compile_builds_normalized_routes() {
        let table = compile(&registry_with::<ItemController>(), CompileOptions::default()).unwrap();

        let templates: Vec<_> = table.iter().map(|r| r.template().as_str()).collect();
        assert_eq!(templates, ["/items", "/items/{id}", "/items/{id}/name"]);

        let route = table.get(Verb::Get, "/items/{id}").unwrap().target();
        assert_eq!(route.variables(), ["id"]);
        assert_eq!(route.method().name(), "show");
        assert_eq!(route.handler_name(), "ItemController#show");
    }

    #[test]
    fn test_unmapped_methods_are_ignored() {
        let table = compile(&registry_with::<ItemController>(), CompileOptions::default()).unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_route_invokes_bean() {
        let table = compile(&registry_with::<ItemController>(), CompileOptions::default()).unwrap();
        let found = table.match_route(Verb::Patch, "/items/3/name").unwrap();
        let reply = found.target().invoke(Arguments::default()).unwrap();
        assert_eq!(reply, Reply::Text("ItemController#rename".to_string()));
    }

    component!(
        RootController,
        ComponentDescriptor::controller("RootController")
            .method(MethodDescriptor::new("index").mapping(Mapping::get("")))
    );

    #[test]
    fn test_empty_template_is_root() {
        let table = compile(&registry_with::<RootController>(), CompileOptions::default()).unwrap();
        assert_eq!(handler_at(&table, Verb::Get, "/").as_deref(), Some("RootController#index"));
    }

    component!(
        ConflictController,
        ComponentDescriptor::controller("ConflictController")
            .method(MethodDescriptor::new("fine").mapping(Mapping::get("/fine")))
            .method(
                MethodDescriptor::new("both")
                    .mapping(Mapping::get("/x"))
                    .mapping(Mapping::post("/x")),
            )
    );

    #[test]
    fn test_conflicting_markers_rejected() {
        let err = compile(&registry_with::<ConflictController>(), CompileOptions::default()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::ConflictingMappings {
                component: "ConflictController".to_string(),
                method: "both".to_string(),
                markers: vec!["get".to_string(), "post".to_string()],
            }
        );
        let text = err.to_string();
        assert!(text.contains("get") && text.contains("post"));
    }

    component!(
        UnboundController,
        ComponentDescriptor::controller("UnboundController")
            .method(MethodDescriptor::new("show").mapping(Mapping::get("/items/{id}")))
    );

    #[test]
    fn test_template_variable_without_parameter_rejected() {
        let err = compile(&registry_with::<UnboundController>(), CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnboundPathVariable { ref name, ref method, .. }
                if name == "id" && method == "show"
        ));
    }

    component!(
        UnknownController,
        ComponentDescriptor::controller("UnknownController").method(
            MethodDescriptor::new("show")
                .mapping(Mapping::get("/items"))
                .param(ParamDescriptor::path_variable("id", ParamKind::Text)),
        )
    );

    #[test]
    fn test_parameter_without_template_variable_rejected() {
        let err = compile(&registry_with::<UnknownController>(), CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            ConfigurationError::UnknownPathVariable { ref name, ref template, .. }
                if name == "id" && template == "/items"
        ));
    }

    component!(
        DuplicateParamController,
        ComponentDescriptor::controller("DuplicateParamController").method(
            MethodDescriptor::new("show")
                .mapping(Mapping::get("/items/{id}"))
                .param(ParamDescriptor::path_variable("id", ParamKind::Text))
                .param(ParamDescriptor::named_path_variable("other", "id", ParamKind::Text)),
        )
    );

    #[test]
    fn test_duplicate_parameter_names_rejected() {
        let err = compile(&registry_with::<DuplicateParamController>(), CompileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicatePathVariable { ref name, .. } if name == "id"));
    }

    component!(
        RepeatedVariableController,
        ComponentDescriptor::controller("RepeatedVariableController")
            .base_path("/{id}")
            .method(
                MethodDescriptor::new("show")
                    .mapping(Mapping::get("/{id}"))
                    .param(ParamDescriptor::path_variable("id", ParamKind::Text)),
            )
    );

    #[test]
    fn test_repeated_template_variable_rejected() {
        let err = compile(&registry_with::<RepeatedVariableController>(), CompileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::DuplicatePathVariable { .. }));
    }

    component!(
        BadTemplateController,
        ComponentDescriptor::controller("BadTemplateController")
            .method(MethodDescriptor::new("show").mapping(Mapping::get("/items/{}")))
    );

    #[test]
    fn test_malformed_template_rejected() {
        let err = compile(&registry_with::<BadTemplateController>(), CompileOptions::default())
            .unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidTemplate { .. }));
    }

    component!(
        BasePathVariableController,
        ComponentDescriptor::controller("BasePathVariableController")
            .base_path("/orgs/{org}")
            .method(
                MethodDescriptor::new("members")
                    .mapping(Mapping::get("/members"))
                    .param(ParamDescriptor::path_variable("org", ParamKind::Text)),
            )
    );

    #[test]
    fn test_base_path_variables_are_checked() {
        let table = compile(&registry_with::<BasePathVariableController>(), CompileOptions::default())
            .unwrap();
        let found = table.match_route(Verb::Get, "/orgs/acme/members").unwrap();
        assert_eq!(found.params.get("org"), Some("acme"));
    }

    component!(
        SameVerbTwice,
        ComponentDescriptor::controller("SameVerbTwice")
            .method(MethodDescriptor::new("first").mapping(Mapping::get("/dup")))
            .method(MethodDescriptor::new("second").mapping(Mapping::get("/dup/")))
    );

    #[test]
    fn test_duplicate_route_last_wins_by_default() {
        let table = compile(&registry_with::<SameVerbTwice>(), CompileOptions::default()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(handler_at(&table, Verb::Get, "/dup").as_deref(), Some("SameVerbTwice#second"));
    }

    #[test]
    fn test_duplicate_route_rejected_when_strict() {
        let err = compile(&registry_with::<SameVerbTwice>(), CompileOptions::strict()).unwrap_err();
        assert_eq!(
            err,
            ConfigurationError::DuplicateRoute {
                verb: "GET".to_string(),
                template: "/dup".to_string(),
                first: "SameVerbTwice#first".to_string(),
                second: "SameVerbTwice#second".to_string(),
            }
        );
    }

    component!(
        ByIdFirst,
        ComponentDescriptor::controller("ByIdFirst").base_path("/items").method(
            MethodDescriptor::new("by_id")
                .mapping(Mapping::get("/{id}"))
                .param(ParamDescriptor::path_variable("id", ParamKind::Text)),
        )
    );

    component!(
        SpecialFirst,
        ComponentDescriptor::controller("SpecialFirst")
            .base_path("/items")
            .method(MethodDescriptor::new("special").mapping(Mapping::get("/special")))
    );

    #[test]
    fn test_overlap_resolved_by_registration_order() {
        let mut registry = Registry::new();
        registry.register::<ByIdFirst>();
        registry.register::<SpecialFirst>();
        let table = compile(&registry, CompileOptions::default()).unwrap();
        assert_eq!(handler_at(&table, Verb::Get, "/items/special").as_deref(), Some("ByIdFirst#by_id"));

        let mut registry = Registry::new();
        registry.register::<SpecialFirst>();
        registry.register::<ByIdFirst>();
        let table = compile(&registry, CompileOptions::default()).unwrap();
        assert_eq!(
            handler_at(&table, Verb::Get, "/items/special").as_deref(),
            Some("SpecialFirst#special")
        );
        assert_eq!(handler_at(&table, Verb::Get, "/items/7").as_deref(), Some("ByIdFirst#by_id"));
    }

    component!(
        PlainComponent,
        ComponentDescriptor::component("PlainComponent")
    );

    #[test]
    fn test_plain_components_produce_no_routes() {
        let table = compile(&registry_with::<PlainComponent>(), CompileOptions::default()).unwrap();
        assert!(table.is_empty());
    }
}
