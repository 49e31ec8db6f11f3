//! Component registry.
//!
//! The registry owns exactly one live instance ("bean") of every registered
//! component type. It is filled single-threaded at startup, then shared
//! read-only; it is the only source of handler instances for the route
//! compiler.
//!
//! # Example
//!
//! ```rust
//! use heron_core::meta::ComponentDescriptor;
//! use heron_core::{Arguments, Component, HandlerError, Registry, Reply};
//!
//! #[derive(Default)]
//! struct Clock;
//!
//! impl Component for Clock {
//!     fn descriptor() -> ComponentDescriptor {
//!         ComponentDescriptor::component("Clock")
//!     }
//!
//!     fn invoke(&self, method: &str, _args: Arguments) -> Result<Reply, HandlerError> {
//!         Err(HandlerError::new(format!("no method {method}")))
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! assert!(registry.register::<Clock>());
//! assert!(!registry.register::<Clock>()); // already present
//!
//! let clock: std::sync::Arc<Clock> = registry.get().unwrap();
//! # let _ = clock;
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::component::Component;
use crate::meta::ComponentDescriptor;

/// A registered instance and its descriptor.
#[derive(Clone)]
pub struct Bean {
    descriptor: Arc<ComponentDescriptor>,
    instance: Arc<dyn Component>,
    any: Arc<dyn Any + Send + Sync>,
}

impl Bean {
    fn new<T: Component>(instance: T) -> Self {
        let instance = Arc::new(instance);
        Self {
            descriptor: Arc::new(T::descriptor()),
            instance: instance.clone(),
            any: instance,
        }
    }

    /// Returns the component's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
        &self.descriptor
    }

    /// Returns the shared instance.
    #[must_use]
    pub fn instance(&self) -> &Arc<dyn Component> {
        &self.instance
    }
}

impl fmt::Debug for Bean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bean")
            .field("component", &self.descriptor.name())
            .finish_non_exhaustive()
    }
}

/// Type-keyed store of component instances, in registration order.
#[derive(Default, Clone)]
pub struct Registry {
    beans: IndexMap<TypeId, Bean>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            beans: IndexMap::new(),
        }
    }

    /// Instantiates `T` with `Default` and registers it.
    ///
    /// Returns `false` if `T` was already registered; the existing instance
    /// is kept.
    pub fn register<T: Component + Default>(&mut self) -> bool {
        if self.contains::<T>() {
            return false;
        }
        self.insert(T::default())
    }

    /// Registers a ready-made instance of `T`.
    ///
    /// Returns `false` if `T` was already registered; the existing instance
    /// is kept.
    pub fn register_instance<T: Component>(&mut self, instance: T) -> bool {
        if self.contains::<T>() {
            return false;
        }
        self.insert(instance)
    }

    fn insert<T: Component>(&mut self, instance: T) -> bool {
        let bean = Bean::new(instance);
        tracing::debug!(
            component = bean.descriptor.name(),
            controller = bean.descriptor.is_controller(),
            "component registered"
        );
        self.beans.insert(TypeId::of::<T>(), bean);
        true
    }

    /// Looks up the instance of `T`.
    #[must_use]
    pub fn get<T: Component>(&self) -> Option<Arc<T>> {
        self.beans
            .get(&TypeId::of::<T>())
            .and_then(|bean| bean.any.clone().downcast::<T>().ok())
    }

    /// Returns `true` if `T` is registered.
    #[must_use]
    pub fn contains<T: Component>(&self) -> bool {
        self.beans.contains_key(&TypeId::of::<T>())
    }

    /// Iterates over beans in registration order.
    pub fn beans(&self) -> impl Iterator<Item = &Bean> {
        self.beans.values()
    }

    /// Returns the number of registered components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.beans.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.beans.is_empty()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field(
                "components",
                &self.beans.values().map(|b| b.descriptor.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
