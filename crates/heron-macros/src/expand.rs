//! Controller macro implementation.
//!
//! Expanding `#[controller]` re-emits the impl block with its markers
//! stripped and adds an `impl Component` holding the descriptor and an
//! `invoke` that dispatches by method name.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{spanned::Spanned, ImplItem, ItemImpl, Path, Type};

use crate::parse::{Binding, ComponentAttrs, HandlerMethod, HandlerParam, MappingAttr, Marker};

/// Which descriptor constructor to call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stereotype {
    /// `#[component]`
    Component,
    /// `#[controller]`
    Controller,
}

/// Expands `#[controller]` or `#[component]`.
pub fn expand(stereotype: Stereotype, attr: TokenStream, item: TokenStream) -> syn::Result<TokenStream> {
    let attrs: ComponentAttrs = syn::parse2(attr)?;
    let mut item: ItemImpl = syn::parse2(item)?;

    if let Some((_, trait_path, _)) = &item.trait_ {
        return Err(syn::Error::new(
            trait_path.span(),
            "expected an inherent impl block, not a trait impl",
        ));
    }
    if !item.generics.params.is_empty() {
        return Err(syn::Error::new(
            item.generics.span(),
            "generic components are not supported",
        ));
    }

    let type_name = type_name(&item.self_ty)?;

    let mut handlers = Vec::new();
    for impl_item in &mut item.items {
        if let ImplItem::Fn(method) = impl_item {
            if let Some(handler) = HandlerMethod::extract(method)? {
                handlers.push(handler);
            }
        }
    }

    let krate = attrs
        .krate
        .clone()
        .unwrap_or_else(|| syn::parse_quote!(::heron_core));

    let descriptor = generate_descriptor(&krate, stereotype, &type_name, attrs.path.as_deref(), &handlers);
    let arms = handlers
        .iter()
        .map(|handler| generate_invoke_arm(&krate, handler))
        .collect::<syn::Result<Vec<_>>>()?;
    let registration = attrs
        .scan
        .then(|| generate_registration(&krate, &item.self_ty, &type_name));
    let self_ty = &item.self_ty;

    Ok(quote! {
        #item

        impl #krate::Component for #self_ty {
            fn descriptor() -> #krate::meta::ComponentDescriptor {
                #descriptor
            }

            #[allow(unused_mut, unused_variables, unreachable_code)]
            fn invoke(
                &self,
                __heron_method: &str,
                mut __heron_args: #krate::Arguments,
            ) -> ::core::result::Result<#krate::Reply, #krate::HandlerError> {
                match __heron_method {
                    #(#arms)*
                    other => ::core::result::Result::Err(#krate::HandlerError::new(
                        ::std::format!("{} has no handler method `{}`", #type_name, other),
                    )),
                }
            }
        }

        #registration
    })
}

/// The last path segment of the implementing type.
fn type_name(ty: &Type) -> syn::Result<String> {
    match ty {
        Type::Path(type_path) => type_path
            .path
            .segments
            .last()
            .map(|segment| segment.ident.to_string())
            .ok_or_else(|| syn::Error::new(ty.span(), "expected a named type")),
        _ => Err(syn::Error::new(ty.span(), "expected a named type")),
    }
}

fn generate_descriptor(
    krate: &Path,
    stereotype: Stereotype,
    type_name: &str,
    base_path: Option<&str>,
    handlers: &[HandlerMethod],
) -> TokenStream {
    let constructor = match stereotype {
        Stereotype::Component => quote!(component),
        Stereotype::Controller => quote!(controller),
    };
    let base_path = base_path.map(|path| quote!(.base_path(#path)));
    let methods = handlers.iter().map(|handler| {
        let name = handler.name.to_string();
        let mappings = handler.mappings.iter().map(|m| generate_mapping(krate, m));
        let params = handler.params.iter().map(|p| generate_param(krate, p));
        quote! {
            .method(
                #krate::meta::MethodDescriptor::new(#name)
                    #(.mapping(#mappings))*
                    #(.param(#params))*
            )
        }
    });

    quote! {
        #krate::meta::ComponentDescriptor::#constructor(#type_name)
            #base_path
            #(#methods)*
    }
}

fn generate_mapping(krate: &Path, mapping: &MappingAttr) -> TokenStream {
    let path = &mapping.path;
    match &mapping.marker {
        Marker::Verb(ident) => quote!(#krate::meta::Mapping::#ident(#path)),
        Marker::Request(verb) => {
            let verb = verb_ident(verb);
            quote!(#krate::meta::Mapping::request(#krate::Verb::#verb, #path))
        }
    }
}

fn verb_ident(verb: &str) -> syn::Ident {
    let mut chars = verb.chars();
    let name: String = chars
        .next()
        .into_iter()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    format_ident!("{}", name)
}

/// Scalar kinds a path variable can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scalar {
    Text,
    Int32,
    Int64,
    Bool,
}

fn scalar_kind(ty: &Type) -> Option<Scalar> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    if type_path.qself.is_some() {
        return None;
    }
    let segment = type_path.path.segments.last()?;
    if !segment.arguments.is_empty() {
        return None;
    }
    match segment.ident.to_string().as_str() {
        "String" => Some(Scalar::Text),
        "i32" => Some(Scalar::Int32),
        "i64" => Some(Scalar::Int64),
        "bool" => Some(Scalar::Bool),
        _ => None,
    }
}

fn is_option(ty: &Type) -> bool {
    matches!(ty, Type::Path(type_path)
        if type_path.path.segments.last().is_some_and(|s| s.ident == "Option"))
}

fn type_text(ty: &Type) -> String {
    quote!(#ty).to_string().replace(' ', "")
}

fn generate_kind(krate: &Path, ty: &Type) -> TokenStream {
    match scalar_kind(ty) {
        Some(Scalar::Text) => quote!(#krate::meta::ParamKind::Text),
        Some(Scalar::Int32) => quote!(#krate::meta::ParamKind::Int32),
        Some(Scalar::Int64) => quote!(#krate::meta::ParamKind::Int64),
        Some(Scalar::Bool) => quote!(#krate::meta::ParamKind::Bool),
        None => {
            let text = type_text(ty);
            quote!(#krate::meta::ParamKind::Unsupported(#text))
        }
    }
}

fn generate_param(krate: &Path, param: &HandlerParam) -> TokenStream {
    let name = param.display_name();
    let ty = &param.ty;
    match &param.binding {
        Binding::Body => quote!(#krate::meta::ParamDescriptor::body::<#ty>(#name)),
        Binding::PathVariable(None) => {
            let kind = generate_kind(krate, ty);
            quote!(#krate::meta::ParamDescriptor::path_variable(#name, #kind))
        }
        Binding::PathVariable(Some(variable)) => {
            let kind = generate_kind(krate, ty);
            quote!(#krate::meta::ParamDescriptor::named_path_variable(#name, #variable, #kind))
        }
        Binding::Unbound => {
            let kind = generate_kind(krate, ty);
            quote!(#krate::meta::ParamDescriptor::unbound(#name, #kind))
        }
    }
}

fn generate_invoke_arm(krate: &Path, handler: &HandlerMethod) -> syn::Result<TokenStream> {
    let method = &handler.name;
    let name = method.to_string();

    let mut bindings = Vec::with_capacity(handler.params.len());
    let mut call_args = Vec::with_capacity(handler.params.len());

    for (index, param) in handler.params.iter().enumerate() {
        let local = format_ident!("__heron_arg{}", index);
        let ty = &param.ty;

        let value = match &param.binding {
            Binding::Body => quote!(__heron_args.take_body::<#ty>(#index)?),
            Binding::PathVariable(_) if scalar_kind(ty).is_some() => {
                quote!(__heron_args.take::<#ty>(#index)?)
            }
            Binding::PathVariable(_) => {
                let message = format!(
                    "unsupported path variable type {} for parameter `{}`",
                    type_text(ty),
                    param.display_name()
                );
                quote!(return ::core::result::Result::Err(#krate::HandlerError::new(#message)))
            }
            Binding::Unbound if is_option(ty) => quote!({
                __heron_args.take_absent(#index)?;
                ::core::option::Option::None
            }),
            Binding::Unbound => {
                return Err(syn::Error::new(
                    ty.span(),
                    "parameters without #[path_variable] or #[request_body] must be an Option",
                ));
            }
        };

        bindings.push(quote!(let #local: #ty = #value;));
        call_args.push(local);
    }

    Ok(quote! {
        #name => {
            #(#bindings)*
            #krate::IntoReply::into_reply(self.#method(#(#call_args),*))
        }
    })
}

fn generate_registration(krate: &Path, self_ty: &Type, type_name: &str) -> TokenStream {
    quote! {
        #krate::__private::inventory::submit! {
            #krate::ComponentRegistration::new(
                ::core::concat!(::core::module_path!(), "::", #type_name),
                #krate::__private::register_default::<#self_ty>,
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expand_controller(attr: TokenStream, item: TokenStream) -> syn::Result<String> {
        expand(Stereotype::Controller, attr, item).map(|tokens| tokens.to_string())
    }

    #[test]
    fn test_expand_basic_controller() {
        let output = expand_controller(
            quote!(path = "/items"),
            quote! {
                impl ItemController {
                    #[get("/{id}")]
                    fn show(&self, #[path_variable] id: i64) -> String {
                        id.to_string()
                    }
                }
            },
        )
        .unwrap();

        assert!(output.contains("ComponentDescriptor :: controller (\"ItemController\")"));
        assert!(output.contains("base_path (\"/items\")"));
        assert!(output.contains("Mapping :: get (\"/{id}\")"));
        assert!(output.contains("ParamKind :: Int64"));
        assert!(!output.contains("path_variable]"));
    }

    #[test]
    fn test_expand_request_mapping_verb() {
        let output = expand_controller(
            quote!(),
            quote! {
                impl Api {
                    #[request_mapping(method = "DELETE", path = "/x")]
                    fn remove(&self) -> String { String::new() }
                }
            },
        )
        .unwrap();
        assert!(output.contains("Verb :: Delete"));
    }

    #[test]
    fn test_expand_scan_submits_registration() {
        let output = expand_controller(
            quote!(scan),
            quote! {
                impl Api {}
            },
        )
        .unwrap();
        assert!(output.contains("inventory :: submit !"));
        assert!(output.contains("register_default :: < Api >"));
    }

    #[test]
    fn test_expand_custom_crate_path() {
        let output = expand_controller(
            quote!(crate = "heron::core"),
            quote! {
                impl Api {}
            },
        )
        .unwrap();
        assert!(output.contains("heron :: core :: Component"));
        assert!(!output.contains(":: heron_core"));
    }

    #[test]
    fn test_expand_component_stereotype() {
        let output = expand(Stereotype::Component, quote!(), quote!(impl Clock {}))
            .unwrap()
            .to_string();
        assert!(output.contains("ComponentDescriptor :: component (\"Clock\")"));
    }

    #[test]
    fn test_trait_impl_rejected() {
        let result = expand_controller(quote!(), quote!(impl Default for Api {}));
        assert!(result.is_err());
    }

    #[test]
    fn test_generic_impl_rejected() {
        let result = expand_controller(quote!(), quote!(impl<T> Api<T> {}));
        assert!(result.is_err());
    }

    #[test]
    fn test_unbound_non_option_rejected() {
        let result = expand_controller(
            quote!(),
            quote! {
                impl Api {
                    #[get]
                    fn list(&self, page: i32) -> String { String::new() }
                }
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_verb_ident() {
        assert_eq!(verb_ident("PATCH").to_string(), "Patch");
        assert_eq!(verb_ident("GET").to_string(), "Get");
    }

    #[test]
    fn test_scalar_kind() {
        assert_eq!(scalar_kind(&syn::parse_quote!(String)), Some(Scalar::Text));
        assert_eq!(scalar_kind(&syn::parse_quote!(std::string::String)), Some(Scalar::Text));
        assert_eq!(scalar_kind(&syn::parse_quote!(i32)), Some(Scalar::Int32));
        assert_eq!(scalar_kind(&syn::parse_quote!(f64)), None);
        assert_eq!(scalar_kind(&syn::parse_quote!(Vec<i64>)), None);
    }
}
