//! Path segment to scalar conversion.

use heron_core::meta::ParamKind;
use heron_core::{Argument, ConversionError};

/// Converts a matched path segment to the parameter's declared kind.
///
/// Integers are signed decimal literals. Booleans accept exactly `true` or
/// `false`; any other spelling, including `TRUE`, is rejected.
pub fn convert(param: &str, value: &str, kind: &ParamKind) -> Result<Argument, ConversionError> {
    let bad_value = |expected: &'static str| ConversionError::BadValue {
        param: param.to_string(),
        value: value.to_string(),
        expected,
    };

    match kind {
        ParamKind::Text => Ok(Argument::Text(value.to_string())),
        ParamKind::Int32 => value
            .parse()
            .map(Argument::I32)
            .map_err(|_| bad_value("i32")),
        ParamKind::Int64 => value
            .parse()
            .map(Argument::I64)
            .map_err(|_| bad_value("i64")),
        ParamKind::Bool => match value {
            "true" => Ok(Argument::Bool(true)),
            "false" => Ok(Argument::Bool(false)),
            _ => Err(bad_value("bool")),
        },
        ParamKind::Json(_) | ParamKind::Unsupported(_) => Err(ConversionError::UnsupportedType {
            param: param.to_string(),
            type_name: kind.name().to_string(),
        }),
    }
}
