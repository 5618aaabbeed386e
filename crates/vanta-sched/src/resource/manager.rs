//! Resource registration and construction.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use super::instrument::InstrumentResource;
use super::qubit::QubitResource;
use super::state::ResourceState;
use super::{Direction, Resource, ResourceInstance};
use crate::error::{SchedError, SchedResult};

/// Everything a resource constructor gets to work with.
#[derive(Debug, Clone, Copy)]
pub struct ResourceContext<'a> {
    /// The registered type name the resource was constructed through.
    pub type_name: &'a str,
    /// The unique instance name.
    pub name: &'a str,
    /// The direction the state is being built for.
    pub direction: Direction,
    /// The configuration payload from the resource specification.
    pub config: &'a Value,
}

/// Constructor function for a resource type.
pub type ResourceConstructor =
    Arc<dyn Fn(&ResourceContext<'_>) -> SchedResult<Box<dyn Resource>> + Send + Sync>;

/// Registry mapping resource type names to constructors.
///
/// The default registry knows the built-in `qubit` and `instrument`
/// types; additional types can be registered locally.
#[derive(Clone)]
pub struct ResourceFactory {
    constructors: FxHashMap<String, ResourceConstructor>,
}

impl Default for ResourceFactory {
    fn default() -> Self {
        let mut factory = Self {
            constructors: FxHashMap::default(),
        };
        factory.register("qubit", |context| {
            Ok(Box::new(QubitResource::from_context(context)?) as Box<dyn Resource>)
        });
        factory.register("instrument", |context| {
            Ok(Box::new(InstrumentResource::from_context(context)?) as Box<dyn Resource>)
        });
        factory
    }
}

impl ResourceFactory {
    /// A registry with no types registered at all.
    pub fn empty() -> Self {
        Self {
            constructors: FxHashMap::default(),
        }
    }

    /// Register a resource type. Replaces any previous registration
    /// with the same name.
    pub fn register<F>(&mut self, type_name: impl Into<String>, constructor: F)
    where
        F: Fn(&ResourceContext<'_>) -> SchedResult<Box<dyn Resource>> + Send + Sync + 'static,
    {
        self.constructors
            .insert(type_name.into(), Arc::new(constructor));
    }

    /// Whether a type with the given name is registered.
    pub fn has(&self, type_name: &str) -> bool {
        self.constructors.contains_key(type_name)
    }

    fn construct(&self, context: &ResourceContext<'_>) -> SchedResult<Box<dyn Resource>> {
        let constructor = self
            .constructors
            .get(context.type_name)
            .ok_or_else(|| SchedError::UnknownResourceType(context.type_name.to_string()))?;
        constructor(context)
    }
}

impl std::fmt::Debug for ResourceFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        types.sort_unstable();
        f.debug_struct("ResourceFactory")
            .field("types", &types)
            .finish()
    }
}

/// A single resource specification: type, instance name, and
/// configuration.
#[derive(Debug, Clone)]
pub struct ResourceSpec {
    /// The registered type name.
    pub type_name: String,
    /// The unique instance name.
    pub name: String,
    /// The configuration payload handed to the constructor.
    pub config: Value,
}

/// Holds resource specifications and builds fresh scheduling states
/// from them.
///
/// The manager itself carries no scheduling state; each call to
/// [`build`](ResourceManager::build) constructs all resources anew for
/// the requested direction.
#[derive(Debug, Clone)]
pub struct ResourceManager {
    factory: ResourceFactory,
    specs: Vec<ResourceSpec>,
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new(ResourceFactory::default())
    }
}

impl ResourceManager {
    /// Create a manager using the given type registry.
    pub fn new(factory: ResourceFactory) -> Self {
        Self {
            factory,
            specs: Vec::new(),
        }
    }

    /// The registered specifications, in registration order.
    pub fn specs(&self) -> &[ResourceSpec] {
        &self.specs
    }

    /// Add a resource specification.
    ///
    /// When no instance name is given, a unique one is generated from
    /// the type name. Explicit names must consist of letters, digits,
    /// `_` and `-`, and must be unique within the manager.
    pub fn add_resource(
        &mut self,
        type_name: &str,
        name: Option<&str>,
        config: Value,
    ) -> SchedResult<()> {
        if !self.factory.has(type_name) {
            return Err(SchedError::UnknownResourceType(type_name.to_string()));
        }
        let name = match name {
            Some(name) => {
                if name.is_empty()
                    || !name
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                {
                    return Err(SchedError::InvalidResourceName(name.to_string()));
                }
                if self.specs.iter().any(|spec| spec.name == name) {
                    return Err(SchedError::DuplicateResourceName(name.to_string()));
                }
                name.to_string()
            }
            None => self.generate_name(type_name),
        };
        debug!(type_name, name, "add resource");
        self.specs.push(ResourceSpec {
            type_name: type_name.to_string(),
            name,
            config,
        });
        Ok(())
    }

    fn generate_name(&self, type_name: &str) -> String {
        let mut candidate = type_name.to_string();
        let mut counter = 1u32;
        while self.specs.iter().any(|spec| spec.name == candidate) {
            counter += 1;
            candidate = format!("{type_name}_{counter}");
        }
        candidate
    }

    /// Construct a fresh scheduling state for all registered resources
    /// in the given direction.
    pub fn build(&self, direction: Direction) -> SchedResult<ResourceState> {
        let mut instances = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let context = ResourceContext {
                type_name: &spec.type_name,
                name: &spec.name,
                direction,
                config: &spec.config,
            };
            let imp = self.factory.construct(&context)?;
            instances.push(ResourceInstance::new(
                spec.type_name.clone(),
                spec.name.clone(),
                direction,
                imp,
            ));
        }
        Ok(ResourceState::new(instances))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_type_rejected() {
        let mut manager = ResourceManager::default();
        let err = manager
            .add_resource("nonsense", None, json!({}))
            .unwrap_err();
        assert!(matches!(err, SchedError::UnknownResourceType(_)));
    }

    #[test]
    fn test_name_validation() {
        let mut manager = ResourceManager::default();
        let err = manager
            .add_resource("qubit", Some("bad name!"), json!({ "num_qubits": 1 }))
            .unwrap_err();
        assert!(matches!(err, SchedError::InvalidResourceName(_)));

        manager
            .add_resource("qubit", Some("qubits-0"), json!({ "num_qubits": 1 }))
            .unwrap();
        let err = manager
            .add_resource("qubit", Some("qubits-0"), json!({ "num_qubits": 1 }))
            .unwrap_err();
        assert!(matches!(err, SchedError::DuplicateResourceName(_)));
    }

    #[test]
    fn test_generated_names_are_unique() {
        let mut manager = ResourceManager::default();
        manager
            .add_resource("qubit", None, json!({ "num_qubits": 1 }))
            .unwrap();
        manager
            .add_resource("qubit", None, json!({ "num_qubits": 1 }))
            .unwrap();
        assert_eq!(manager.specs()[0].name, "qubit");
        assert_eq!(manager.specs()[1].name, "qubit_2");
    }

    #[test]
    fn test_build_constructs_fresh_state() {
        let mut manager = ResourceManager::default();
        manager
            .add_resource("instrument", Some("readout"), json!({ "count": 2 }))
            .unwrap();
        let state = manager.build(Direction::Forward).unwrap();
        assert_eq!(state.instances().len(), 1);
        assert_eq!(state.instances()[0].name(), "readout");
        assert_eq!(state.instances()[0].type_name(), "instrument");
    }

    #[test]
    fn test_custom_type_registration() {
        let mut factory = ResourceFactory::default();
        factory.register("custom", |context| {
            // Reuse the qubit implementation under a different name.
            Ok(Box::new(super::super::qubit::QubitResource::from_context(context)?) as _)
        });
        let mut manager = ResourceManager::new(factory);
        manager
            .add_resource("custom", None, json!({ "num_qubits": 3 }))
            .unwrap();
        manager.build(Direction::Backward).unwrap();
    }
}
