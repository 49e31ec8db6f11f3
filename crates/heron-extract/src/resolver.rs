//! Argument resolution for one handler call.

use heron_core::meta::{MethodDescriptor, ParamBinding, ParamDescriptor, ParamKind};
use heron_core::{Argument, Arguments, ConversionError};
use heron_router::Params;

use crate::convert::convert;

/// Produces a handler's arguments from path bindings and the request body.
///
/// Parameters are resolved in declaration order:
///
/// | marker | source |
/// |---|---|
/// | body | the whole body decoded as JSON into the declared type |
/// | path variable | the binding named by the marker or parameter, converted |
/// | none | an absent value |
///
/// Every body parameter decodes the full body independently.
///
/// # Example
///
/// ```rust
/// use heron_core::meta::{MethodDescriptor, ParamDescriptor, ParamKind};
/// use heron_extract::resolve;
/// use heron_router::Params;
///
/// let method = MethodDescriptor::new("show")
///     .param(ParamDescriptor::path_variable("id", ParamKind::Int64));
///
/// let params: Params = [("id", "42")].into_iter().collect();
/// let mut args = resolve(&method, &params, b"").unwrap();
/// assert_eq!(args.take::<i64>(0).unwrap(), 42);
/// ```
pub fn resolve(
    method: &MethodDescriptor,
    params: &Params,
    body: &[u8],
) -> Result<Arguments, ConversionError> {
    method
        .params()
        .iter()
        .map(|param| resolve_param(param, params, body))
        .collect::<Result<Vec<_>, _>>()
        .map(Arguments::new)
}

fn resolve_param(
    param: &ParamDescriptor,
    params: &Params,
    body: &[u8],
) -> Result<Argument, ConversionError> {
    match param.binding() {
        ParamBinding::Body => decode_body(param, body),
        ParamBinding::PathVariable { .. } => {
            let name = param.variable_name().unwrap_or_else(|| param.name());
            let value = params
                .get(name)
                .ok_or_else(|| ConversionError::MissingVariable {
                    name: name.to_string(),
                })?;
            convert(param.name(), value, param.kind())
        }
        ParamBinding::Unbound => Ok(Argument::Absent),
    }
}

fn decode_body(param: &ParamDescriptor, body: &[u8]) -> Result<Argument, ConversionError> {
    let ParamKind::Json(shape) = param.kind() else {
        return Err(ConversionError::UnsupportedType {
            param: param.name().to_string(),
            type_name: param.kind().name().to_string(),
        });
    };

    shape
        .decode(body)
        .map(Argument::Body)
        .map_err(|source| {
            tracing::debug!(param = param.name(), error = %source, "request body rejected");
            ConversionError::InvalidBody {
                param: param.name().to_string(),
                source,
            }
        })
}
