//! Parsing utilities for controller macros.
//!
//! This module reads the `#[controller]` / `#[component]` arguments, the verb
//! markers on methods and the binding markers on parameters. Markers are
//! stripped from the item as they are read so the re-emitted impl block
//! compiles without them.

use syn::{
    parse::{Parse, ParseStream},
    punctuated::Punctuated,
    spanned::Spanned,
    Attribute, Expr, ExprLit, FnArg, Ident, ImplItemFn, Lit, LitStr, Meta, MetaNameValue, Pat,
    PatIdent, PatType, Path, Token, Type,
};

/// Verb markers recognized on methods.
pub const VERB_MARKERS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

/// Generic mapping marker taking an explicit verb.
pub const REQUEST_MAPPING: &str = "request_mapping";

/// Verbs accepted by `request_mapping(method = ...)`.
pub const VERBS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Parsed `#[controller(...)]` / `#[component(...)]` arguments.
#[derive(Debug, Default)]
pub struct ComponentAttrs {
    /// Base path for every mapped method.
    pub path: Option<String>,
    /// Submit the type for link-time discovery.
    pub scan: bool,
    /// Path to the core crate, `::heron_core` when absent.
    pub krate: Option<Path>,
}

impl Parse for ComponentAttrs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut attrs = Self::default();
        let meta_list: Punctuated<Meta, Token![,]> = Punctuated::parse_terminated(input)?;

        for meta in meta_list {
            match meta {
                Meta::Path(path) if path.is_ident("scan") => attrs.scan = true,
                Meta::NameValue(nv) => {
                    let ident = nv
                        .path
                        .get_ident()
                        .ok_or_else(|| syn::Error::new(nv.path.span(), "expected identifier"))?
                        .to_string();
                    let value = string_value(&nv.value)?;

                    match ident.as_str() {
                        "path" => attrs.path = Some(value.value()),
                        "crate" => attrs.krate = Some(value.parse()?),
                        _ => {
                            return Err(syn::Error::new(
                                nv.path.span(),
                                format!("unknown attribute: {ident}"),
                            ))
                        }
                    }
                }
                other => {
                    return Err(syn::Error::new(
                        other.span(),
                        "expected `path = \"...\"`, `scan` or `crate = \"...\"`",
                    ))
                }
            }
        }

        Ok(attrs)
    }
}

fn string_value(expr: &Expr) -> syn::Result<LitStr> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Str(s), ..
        }) => Ok(s.clone()),
        _ => Err(syn::Error::new(expr.span(), "expected string literal")),
    }
}

/// A verb marker as written on a method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Marker {
    /// One of `get`, `post`, `put`, `patch`, `delete`.
    Verb(Ident),
    /// `request_mapping(method = "...")`, holding the verb in upper case.
    Request(String),
}

/// A parsed verb marker with its path.
#[derive(Debug, Clone)]
pub struct MappingAttr {
    /// Which marker.
    pub marker: Marker,
    /// The path attribute, empty when omitted.
    pub path: String,
}

impl MappingAttr {
    /// Parses `attr` if it is a verb marker.
    pub fn from_attribute(attr: &Attribute) -> syn::Result<Option<Self>> {
        let Some(ident) = attr.path().get_ident() else {
            return Ok(None);
        };
        let name = ident.to_string();

        if VERB_MARKERS.contains(&name.as_str()) {
            return Ok(Some(Self {
                marker: Marker::Verb(ident.clone()),
                path: verb_marker_path(attr)?,
            }));
        }
        if name == REQUEST_MAPPING {
            return request_mapping(attr).map(Some);
        }
        Ok(None)
    }
}

/// `#[get]`, `#[get("/p")]` or `#[get(path = "/p")]`.
fn verb_marker_path(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::Path(_) => Ok(String::new()),
        Meta::List(list) => list.parse_args_with(|input: ParseStream| {
            if input.is_empty() {
                return Ok(String::new());
            }
            if input.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                return Ok(lit.value());
            }
            let nv: MetaNameValue = input.parse()?;
            if !nv.path.is_ident("path") {
                return Err(syn::Error::new(nv.path.span(), "expected `path`"));
            }
            Ok(string_value(&nv.value)?.value())
        }),
        Meta::NameValue(nv) => Err(syn::Error::new(
            nv.span(),
            "expected `#[verb]` or `#[verb(\"/path\")]`",
        )),
    }
}

/// `#[request_mapping(method = "PUT", path = "/p")]`.
fn request_mapping(attr: &Attribute) -> syn::Result<MappingAttr> {
    let list = attr.meta.require_list()?;
    let metas = list.parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)?;

    let mut verb = None;
    let mut path = String::new();

    for meta in metas {
        let Meta::NameValue(nv) = meta else {
            return Err(syn::Error::new(meta.span(), "expected name = value"));
        };
        let value = string_value(&nv.value)?;
        if nv.path.is_ident("method") {
            let text = value.value();
            if !VERBS.contains(&text.as_str()) {
                return Err(syn::Error::new(
                    value.span(),
                    format!("unknown HTTP verb `{text}`, expected one of {}", VERBS.join(", ")),
                ));
            }
            verb = Some(text);
        } else if nv.path.is_ident("path") {
            path = value.value();
        } else {
            return Err(syn::Error::new(nv.path.span(), "expected `method` or `path`"));
        }
    }

    let verb = verb.ok_or_else(|| {
        syn::Error::new(list.span(), "request_mapping requires `method = \"...\"`")
    })?;

    Ok(MappingAttr {
        marker: Marker::Request(verb),
        path,
    })
}

/// How a handler parameter is bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    /// `#[request_body]`
    Body,
    /// `#[path_variable]` with an optional explicit name.
    PathVariable(Option<String>),
    /// No marker.
    Unbound,
}

/// A parsed handler parameter.
#[derive(Debug)]
pub struct HandlerParam {
    /// The parameter name.
    pub name: Ident,
    /// The parameter type.
    pub ty: Type,
    /// Its binding marker.
    pub binding: Binding,
}

impl HandlerParam {
    /// Reads and strips the binding marker of a typed argument.
    pub fn extract(arg: &mut PatType) -> syn::Result<Self> {
        let name = match &*arg.pat {
            Pat::Ident(PatIdent { ident, .. }) => ident.clone(),
            other => {
                return Err(syn::Error::new(
                    other.span(),
                    "handler parameters must be plain identifiers",
                ))
            }
        };

        let mut binding = Binding::Unbound;
        let mut error: Option<syn::Error> = None;

        arg.attrs.retain(|attr| {
            let parsed = if attr.path().is_ident("request_body") {
                attr.meta.require_path_only().map(|_| Some(Binding::Body))
            } else if attr.path().is_ident("path_variable") {
                path_variable_name(attr).map(|name| Some(Binding::PathVariable(name)))
            } else {
                return true;
            };

            match parsed {
                Ok(Some(found)) if binding == Binding::Unbound => binding = found,
                Ok(_) => push_error(
                    &mut error,
                    syn::Error::new(attr.span(), "a parameter can carry only one binding marker"),
                ),
                Err(e) => push_error(&mut error, e),
            }
            false
        });

        if let Some(error) = error {
            return Err(error);
        }

        Ok(Self {
            name,
            ty: (*arg.ty).clone(),
            binding,
        })
    }

    /// The name used in descriptors: the parameter name without a leading `r#`.
    pub fn display_name(&self) -> String {
        let text = self.name.to_string();
        text.strip_prefix("r#").map(str::to_string).unwrap_or(text)
    }
}

fn push_error(slot: &mut Option<syn::Error>, err: syn::Error) {
    match slot {
        Some(existing) => existing.combine(err),
        None => *slot = Some(err),
    }
}

/// `#[path_variable]`, `#[path_variable("id")]` or `#[path_variable(name = "id")]`.
fn path_variable_name(attr: &Attribute) -> syn::Result<Option<String>> {
    match &attr.meta {
        Meta::Path(_) => Ok(None),
        Meta::List(list) => list.parse_args_with(|input: ParseStream| {
            if input.peek(LitStr) {
                let lit: LitStr = input.parse()?;
                return Ok(Some(lit.value()));
            }
            let nv: MetaNameValue = input.parse()?;
            if !nv.path.is_ident("name") {
                return Err(syn::Error::new(nv.path.span(), "expected `name`"));
            }
            Ok(Some(string_value(&nv.value)?.value()))
        }),
        Meta::NameValue(nv) => Err(syn::Error::new(nv.span(), "expected `#[path_variable(\"name\")]`")),
    }
}

/// A method of the annotated impl block.
#[derive(Debug)]
pub struct HandlerMethod {
    /// Method name.
    pub name: Ident,
    /// Every verb marker, in order.
    pub mappings: Vec<MappingAttr>,
    /// Typed parameters after the receiver.
    pub params: Vec<HandlerParam>,
}

impl HandlerMethod {
    /// Reads and strips markers from `method`.
    ///
    /// Returns `None` for methods without a verb marker; their parameters are
    /// left untouched.
    pub fn extract(method: &mut ImplItemFn) -> syn::Result<Option<Self>> {
        let mut mappings = Vec::new();
        let mut kept = Vec::with_capacity(method.attrs.len());

        for attr in method.attrs.drain(..) {
            match MappingAttr::from_attribute(&attr)? {
                Some(mapping) => mappings.push(mapping),
                None => kept.push(attr),
            }
        }
        method.attrs = kept;

        if mappings.is_empty() {
            return Ok(None);
        }

        let mut has_ref_receiver = false;
        let mut params = Vec::new();
        for input in &mut method.sig.inputs {
            match input {
                FnArg::Receiver(receiver) => {
                    has_ref_receiver = receiver.reference.is_some() && receiver.mutability.is_none();
                }
                FnArg::Typed(arg) => params.push(HandlerParam::extract(arg)?),
            }
        }

        if !has_ref_receiver {
            return Err(syn::Error::new(
                method.sig.ident.span(),
                "handler methods must take `&self`",
            ));
        }
        if method.sig.asyncness.is_some() {
            return Err(syn::Error::new(
                method.sig.ident.span(),
                "handler methods must not be async",
            ));
        }
        if !method.sig.generics.params.is_empty() {
            return Err(syn::Error::new(
                method.sig.generics.span(),
                "handler methods cannot be generic",
            ));
        }

        Ok(Some(Self {
            name: method.sig.ident.clone(),
            mappings,
            params,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::parse_quote;

    #[test]
    fn test_parse_component_attrs_empty() {
        let attrs: ComponentAttrs = parse_quote!();
        assert!(attrs.path.is_none());
        assert!(!attrs.scan);
        assert!(attrs.krate.is_none());
    }

    #[test]
    fn test_parse_component_attrs_all() {
        let attrs: ComponentAttrs = parse_quote!(path = "/items", scan, crate = "heron::core");
        assert_eq!(attrs.path.as_deref(), Some("/items"));
        assert!(attrs.scan);
        assert!(attrs.krate.is_some());
    }

    #[test]
    fn test_parse_component_attrs_unknown() {
        let result: syn::Result<ComponentAttrs> = syn::parse2(quote::quote!(prefix = "/x"));
        assert!(result.is_err());
    }

    #[test]
    fn test_verb_marker_forms() {
        let bare: Attribute = parse_quote!(#[get]);
        let literal: Attribute = parse_quote!(#[post("/items")]);
        let named: Attribute = parse_quote!(#[delete(path = "/items/{id}")]);

        assert_eq!(MappingAttr::from_attribute(&bare).unwrap().unwrap().path, "");
        assert_eq!(MappingAttr::from_attribute(&literal).unwrap().unwrap().path, "/items");
        assert_eq!(
            MappingAttr::from_attribute(&named).unwrap().unwrap().path,
            "/items/{id}"
        );
    }

    #[test]
    fn test_request_mapping() {
        let attr: Attribute = parse_quote!(#[request_mapping(method = "PATCH", path = "/x")]);
        let mapping = MappingAttr::from_attribute(&attr).unwrap().unwrap();
        assert_eq!(mapping.marker, Marker::Request("PATCH".to_string()));
        assert_eq!(mapping.path, "/x");
    }

    #[test]
    fn test_request_mapping_rejects_unknown_verb() {
        let attr: Attribute = parse_quote!(#[request_mapping(method = "TRACE")]);
        assert!(MappingAttr::from_attribute(&attr).is_err());

        let missing: Attribute = parse_quote!(#[request_mapping(path = "/x")]);
        assert!(MappingAttr::from_attribute(&missing).is_err());
    }

    #[test]
    fn test_other_attributes_ignored() {
        let attr: Attribute = parse_quote!(#[inline]);
        assert!(MappingAttr::from_attribute(&attr).unwrap().is_none());
    }

    #[test]
    fn test_extract_handler_method() {
        let mut method: ImplItemFn = parse_quote! {
            #[get("/{id}")]
            #[inline]
            fn show(
                &self,
                #[path_variable] id: i64,
                #[path_variable("v")] verbose: bool,
                #[request_body] body: NewItem,
                extra: Option<String>,
            ) -> String {
                todo!()
            }
        };

        let handler = HandlerMethod::extract(&mut method).unwrap().unwrap();
        assert_eq!(handler.name.to_string(), "show");
        assert_eq!(handler.mappings.len(), 1);
        assert_eq!(handler.params.len(), 4);
        assert_eq!(handler.params[0].binding, Binding::PathVariable(None));
        assert_eq!(
            handler.params[1].binding,
            Binding::PathVariable(Some("v".to_string()))
        );
        assert_eq!(handler.params[2].binding, Binding::Body);
        assert_eq!(handler.params[3].binding, Binding::Unbound);

        // Markers are stripped, other attributes kept.
        assert_eq!(method.attrs.len(), 1);
        let FnArg::Typed(arg) = &method.sig.inputs[1] else {
            panic!("expected a typed argument");
        };
        assert!(arg.attrs.is_empty());
    }

    #[test]
    fn test_conflicting_markers_are_all_kept() {
        let mut method: ImplItemFn = parse_quote! {
            #[get]
            #[post]
            fn both(&self) -> String {
                todo!()
            }
        };
        let handler = HandlerMethod::extract(&mut method).unwrap().unwrap();
        assert_eq!(handler.mappings.len(), 2);
    }

    #[test]
    fn test_unmapped_method_is_skipped() {
        let mut method: ImplItemFn = parse_quote! {
            fn helper(&self, x: i32) -> i32 { x }
        };
        assert!(HandlerMethod::extract(&mut method).unwrap().is_none());
    }

    #[test]
    fn test_handler_requires_ref_self() {
        let mut method: ImplItemFn = parse_quote! {
            #[get]
            fn list() -> String { todo!() }
        };
        assert!(HandlerMethod::extract(&mut method).is_err());
    }

    #[test]
    fn test_two_binding_markers_rejected() {
        let mut method: ImplItemFn = parse_quote! {
            #[post]
            fn create(&self, #[request_body] #[path_variable] id: i64) -> String { todo!() }
        };
        assert!(HandlerMethod::extract(&mut method).is_err());
    }
}
