//! Discovery sources: where the set of component types comes from.
//!
//! [`RegistrationList`] is an explicit list assembled in `main`.
//! [`LinkedComponents`] gathers every type marked with
//! `#[controller(scan)]` or `#[component(scan)]` anywhere in the linked
//! binary, using `inventory` link-time collection.

use crate::component::Component;
use crate::registry::Registry;

/// One discoverable component type.
#[derive(Debug, Clone, Copy)]
pub struct ComponentRegistration {
    type_name: &'static str,
    register: fn(&mut Registry),
}

impl ComponentRegistration {
    /// Creates a registration from a name and a registering function.
    #[must_use]
    pub const fn new(type_name: &'static str, register: fn(&mut Registry)) -> Self {
        Self {
            type_name,
            register,
        }
    }

    /// Registration that default-constructs `T`.
    #[must_use]
    pub fn of<T: Component + Default>() -> Self {
        Self::new(std::any::type_name::<T>(), register_default::<T>)
    }

    /// Returns the component's type name.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Registers the component.
    pub fn apply(&self, registry: &mut Registry) {
        (self.register)(registry);
    }
}

/// Default-constructs `T` into `registry`.
pub fn register_default<T: Component + Default>(registry: &mut Registry) {
    registry.register::<T>();
}

inventory::collect!(ComponentRegistration);

/// A provider of component registrations.
pub trait DiscoverySource {
    /// Returns the registrations, in the order they should be instantiated.
    fn components(&self) -> Vec<ComponentRegistration>;

    /// Registers every component into `registry`.
    fn populate(&self, registry: &mut Registry) {
        let components = self.components();
        tracing::debug!(count = components.len(), "discovered components");
        for registration in &components {
            registration.apply(registry);
        }
    }
}

/// An explicit, ordered list of component types.
///
/// # Example
///
/// ```rust,ignore
/// let source = RegistrationList::new()
///     .with::<UserController>()
///     .with::<ItemController>();
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegistrationList {
    entries: Vec<ComponentRegistration>,
}

impl RegistrationList {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `T`.
    pub fn with<T: Component + Default>(mut self) -> Self {
        self.entries.push(ComponentRegistration::of::<T>());
        self
    }

    /// Appends a prepared registration.
    pub fn push(&mut self, registration: ComponentRegistration) {
        self.entries.push(registration);
    }
}

impl DiscoverySource for RegistrationList {
    fn components(&self) -> Vec<ComponentRegistration> {
        self.entries.clone()
    }
}

/// All components submitted at link time, ordered by type name.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkedComponents;

impl DiscoverySource for LinkedComponents {
    fn components(&self) -> Vec<ComponentRegistration> {
        let mut found: Vec<_> = inventory::iter::<ComponentRegistration>
            .into_iter()
            .copied()
            .collect();
        found.sort_by_key(ComponentRegistration::type_name);
        found
    }
}
