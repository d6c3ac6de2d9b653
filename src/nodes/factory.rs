//! Behavior registry: port data types and class-name keyed constructors

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use log::{debug, warn};

use crate::nodes::interface::Behavior;

/// Data types that can flow through ports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DataType {
    /// Any type (for generic ports)
    #[default]
    Any,
    /// Floating point number
    Float,
    /// Text string
    Text,
    /// Boolean value
    Boolean,
}

impl DataType {
    /// Check if this data type can connect to another
    pub fn can_connect_to(&self, other: &DataType) -> bool {
        self == other || *self == DataType::Any || *other == DataType::Any
    }

    /// Get a human-readable name for this data type
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Any => "any",
            DataType::Float => "float",
            DataType::Text => "text",
            DataType::Boolean => "bool",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "any" => Ok(DataType::Any),
            "float" => Ok(DataType::Float),
            "text" => Ok(DataType::Text),
            "bool" => Ok(DataType::Boolean),
            other => Err(format!("unknown data type '{}'", other)),
        }
    }
}

/// Descriptive metadata shown by completion menus and hosts
#[derive(Debug, Clone, PartialEq)]
pub struct BehaviorMetadata {
    pub class_name: String,
    pub category: &'static str,
    pub description: &'static str,
}

impl BehaviorMetadata {
    pub fn new(class_name: impl Into<String>, category: &'static str, description: &'static str) -> Self {
        Self {
            class_name: class_name.into(),
            category,
            description,
        }
    }
}

/// Behavior classes that register themselves by type
pub trait BehaviorFactory {
    /// Metadata for the class, including the class name used in node text
    fn metadata() -> BehaviorMetadata
    where
        Self: Sized;

    /// Construct a fresh, uninitialised behavior instance
    fn create() -> Box<dyn Behavior>
    where
        Self: Sized;
}

/// Constructor stored for each class name
pub type BehaviorCreator = Box<dyn Fn() -> Box<dyn Behavior>>;

/// Registry resolving class names to behavior constructors
pub struct BehaviorRegistry {
    creators: BTreeMap<String, BehaviorCreator>,
    metadata: BTreeMap<String, BehaviorMetadata>,
    categories: HashMap<&'static str, Vec<String>>,
}

impl BehaviorRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            creators: BTreeMap::new(),
            metadata: BTreeMap::new(),
            categories: HashMap::new(),
        }
    }

    /// Register a behavior factory
    pub fn register<T: BehaviorFactory + 'static>(&mut self) {
        self.register_creator(T::metadata(), T::create);
    }

    /// Register a class under an explicit constructor
    pub fn register_creator<F>(&mut self, metadata: BehaviorMetadata, creator: F)
    where
        F: Fn() -> Box<dyn Behavior> + 'static,
    {
        let class_name = metadata.class_name.clone();
        if self.creators.contains_key(&class_name) {
            warn!("Replacing previously registered behavior class '{}'", class_name);
            self.forget_category(&class_name);
        }

        debug!("Registered behavior class '{}' ({})", class_name, metadata.category);
        self.categories
            .entry(metadata.category)
            .or_default()
            .push(class_name.clone());
        self.creators.insert(class_name.clone(), Box::new(creator));
        self.metadata.insert(class_name, metadata);
    }

    fn forget_category(&mut self, class_name: &str) {
        if let Some(previous) = self.metadata.get(class_name) {
            if let Some(classes) = self.categories.get_mut(previous.category) {
                classes.retain(|name| name != class_name);
            }
        }
    }

    /// Instantiate a behavior by class name
    pub fn create(&self, class_name: &str) -> Option<Box<dyn Behavior>> {
        self.creators.get(class_name).map(|creator| creator())
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.creators.contains_key(class_name)
    }

    /// All registered class names in lexical order
    pub fn class_names(&self) -> Vec<String> {
        self.creators.keys().cloned().collect()
    }

    pub fn metadata(&self, class_name: &str) -> Option<&BehaviorMetadata> {
        self.metadata.get(class_name)
    }

    /// Class names registered under a category
    pub fn classes_in_category(&self, category: &str) -> Vec<&str> {
        self.categories
            .get(category)
            .map(|classes| classes.iter().map(|name| name.as_str()).collect())
            .unwrap_or_default()
    }

    pub fn categories(&self) -> Vec<&'static str> {
        let mut categories: Vec<_> = self.categories.keys().copied().collect();
        categories.sort_unstable();
        categories
    }

    pub fn len(&self) -> usize {
        self.creators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creators.is_empty()
    }
}

impl Default for BehaviorRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        crate::nodes::register_builtin_behaviors(&mut registry);
        registry
    }
}

impl fmt::Debug for BehaviorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BehaviorRegistry")
            .field("classes", &self.creators.keys().collect::<Vec<_>>())
            .finish()
    }
}
