//! The component contract and handler arguments.

use std::any::Any;
use std::fmt;

use crate::error::{ConversionError, HandlerError};
use crate::meta::ComponentDescriptor;
use crate::response::Reply;

/// A registered application type.
///
/// One instance of each component lives in the [`Registry`](crate::Registry)
/// for the whole process and is shared by every request routed to it, so
/// implementations must be immutable or synchronize their own state (a
/// `Mutex` or atomics). `Send + Sync` is required for exactly that reason.
///
/// The `#[controller]` and `#[component]` macros implement this trait. A
/// hand-written implementation looks like this:
///
/// ```
/// use heron_core::meta::{ComponentDescriptor, Mapping, MethodDescriptor, ParamDescriptor, ParamKind};
/// use heron_core::{Arguments, Component, HandlerError, IntoReply, Reply};
///
/// #[derive(Default)]
/// struct Greeter;
///
/// impl Component for Greeter {
///     fn descriptor() -> ComponentDescriptor {
///         ComponentDescriptor::controller("Greeter").method(
///             MethodDescriptor::new("hello")
///                 .mapping(Mapping::get("/hello/{name}"))
///                 .param(ParamDescriptor::path_variable("name", ParamKind::Text)),
///         )
///     }
///
///     fn invoke(&self, method: &str, mut args: Arguments) -> Result<Reply, HandlerError> {
///         match method {
///             "hello" => {
///                 let name: String = args.take(0)?;
///                 format!("hello, {name}").into_reply()
///             }
///             other => Err(HandlerError::new(format!("no method {other}"))),
///         }
///     }
/// }
/// ```
pub trait Component: Send + Sync + 'static {
    /// Describes the type, its markers and its methods.
    fn descriptor() -> ComponentDescriptor
    where
        Self: Sized;

    /// Calls the named method with resolved arguments.
    fn invoke(&self, method: &str, args: Arguments) -> Result<Reply, HandlerError>;
}

/// One resolved handler argument.
pub enum Argument {
    /// A text path variable.
    Text(String),
    /// A 32-bit integer path variable.
    I32(i32),
    /// A 64-bit integer path variable.
    I64(i64),
    /// A boolean path variable.
    Bool(bool),
    /// A decoded request body.
    Body(Box<dyn Any + Send>),
    /// An unmarked parameter.
    Absent,
}

impl fmt::Debug for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(v) => f.debug_tuple("Text").field(v).finish(),
            Self::I32(v) => f.debug_tuple("I32").field(v).finish(),
            Self::I64(v) => f.debug_tuple("I64").field(v).finish(),
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Body(_) => f.write_str("Body(..)"),
            Self::Absent => f.write_str("Absent"),
        }
    }
}

/// Conversion from an [`Argument`] into a handler parameter type.
pub trait FromArgument: Sized {
    /// Name used in mismatch errors.
    const EXPECTED: &'static str;

    /// Extracts the value, or `None` if the argument has another kind.
    fn from_argument(arg: Argument) -> Option<Self>;
}

impl FromArgument for String {
    const EXPECTED: &'static str = "String";

    fn from_argument(arg: Argument) -> Option<Self> {
        match arg {
            Argument::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgument for i32 {
    const EXPECTED: &'static str = "i32";

    fn from_argument(arg: Argument) -> Option<Self> {
        match arg {
            Argument::I32(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgument for i64 {
    const EXPECTED: &'static str = "i64";

    fn from_argument(arg: Argument) -> Option<Self> {
        match arg {
            Argument::I64(v) => Some(v),
            _ => None,
        }
    }
}

impl FromArgument for bool {
    const EXPECTED: &'static str = "bool";

    fn from_argument(arg: Argument) -> Option<Self> {
        match arg {
            Argument::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl<T: FromArgument> FromArgument for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_argument(arg: Argument) -> Option<Self> {
        match arg {
            Argument::Absent => Some(None),
            other => T::from_argument(other).map(Some),
        }
    }
}

/// The ordered arguments for one handler call.
///
/// Each position can be taken exactly once.
#[derive(Debug, Default)]
pub struct Arguments {
    slots: Vec<Option<Argument>>,
}

impl Arguments {
    /// Wraps resolved arguments in declaration order.
    #[must_use]
    pub fn new(values: Vec<Argument>) -> Self {
        Self {
            slots: values.into_iter().map(Some).collect(),
        }
    }

    /// Returns the number of positions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Borrows the argument at `index` if it has not been taken.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Argument> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// Takes a scalar (or optional scalar) argument.
    pub fn take<T: FromArgument>(&mut self, index: usize) -> Result<T, ConversionError> {
        let mismatch = || ConversionError::ArgumentMismatch {
            index,
            expected: T::EXPECTED,
        };
        let arg = self.take_raw(index).ok_or_else(mismatch)?;
        T::from_argument(arg).ok_or_else(mismatch)
    }

    /// Takes a decoded body argument.
    pub fn take_body<T: 'static>(&mut self, index: usize) -> Result<T, ConversionError> {
        let mismatch = || ConversionError::ArgumentMismatch {
            index,
            expected: std::any::type_name::<T>(),
        };
        match self.take_raw(index) {
            Some(Argument::Body(value)) => value
                .downcast::<T>()
                .map(|boxed| *boxed)
                .map_err(|_| mismatch()),
            _ => Err(mismatch()),
        }
    }

    /// Consumes an unmarked argument.
    pub fn take_absent(&mut self, index: usize) -> Result<(), ConversionError> {
        match self.take_raw(index) {
            Some(Argument::Absent) => Ok(()),
            _ => Err(ConversionError::ArgumentMismatch {
                index,
                expected: "absent value",
            }),
        }
    }

    fn take_raw(&mut self, index: usize) -> Option<Argument> {
        self.slots.get_mut(index).and_then(Option::take)
    }
}

impl FromIterator<Argument> for Arguments {
    fn from_iter<I: IntoIterator<Item = Argument>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_scalars() {
        let mut args = Arguments::new(vec![
            Argument::Text("alice".to_string()),
            Argument::I32(7),
            Argument::I64(42),
            Argument::Bool(true),
        ]);

        assert_eq!(args.len(), 4);
        assert_eq!(args.take::<String>(0).unwrap(), "alice");
        assert_eq!(args.take::<i32>(1).unwrap(), 7);
        assert_eq!(args.take::<i64>(2).unwrap(), 42);
        assert!(args.take::<bool>(3).unwrap());
    }

    #[test]
    fn test_take_twice_fails() {
        let mut args = Arguments::new(vec![Argument::I64(1)]);
        assert!(args.take::<i64>(0).is_ok());
        assert!(matches!(
            args.take::<i64>(0),
            Err(ConversionError::ArgumentMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_take_wrong_kind() {
        let mut args = Arguments::new(vec![Argument::Text("x".to_string())]);
        let err = args.take::<i64>(0).unwrap_err();
        assert_eq!(err.to_string(), "argument 0 is not a i64");
    }

    #[test]
    fn test_take_optional() {
        let mut args = Arguments::new(vec![Argument::Absent, Argument::Bool(false)]);
        assert_eq!(args.take::<Option<bool>>(0).unwrap(), None);
        assert_eq!(args.take::<Option<bool>>(1).unwrap(), Some(false));
    }

    #[test]
    fn test_take_body_downcasts() {
        let mut args = Arguments::new(vec![Argument::Body(Box::new(vec![1_u8, 2, 3]))]);
        assert!(matches!(args.get(0), Some(Argument::Body(_))));
        assert_eq!(args.take_body::<Vec<u8>>(0).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_take_body_wrong_type() {
        let mut args = Arguments::new(vec![Argument::Body(Box::new(5_u32))]);
        assert!(args.take_body::<String>(0).is_err());
    }

    #[test]
    fn test_take_absent() {
        let mut args: Arguments = [Argument::Absent, Argument::I32(1)].into_iter().collect();
        assert!(args.take_absent(0).is_ok());
        assert!(args.take_absent(1).is_err());
    }
}
