//! Strategy Registry - manages available strategies

use std::collections::BTreeMap;

use serde::Serialize;

use crate::strategy::{
    default_params, validate_params, EmaCrossover, ParamSchema, ParamSpec, Strategy,
    StrategyError, StrategyParams,
};

pub type StrategyFactory =
    Box<dyn Fn(&StrategyParams) -> Result<Box<dyn Strategy>, StrategyError> + Send + Sync>;

struct StrategyEntry {
    schema: ParamSchema,
    factory: StrategyFactory,
}

/// Public description of a registered strategy
#[derive(Debug, Clone, Serialize)]
pub struct StrategyDescriptor {
    pub name: String,
    pub params: ParamSchema,
    pub defaults: StrategyParams,
}

/// Strategy Registry - maps display names to parameter schemas and factories
pub struct StrategyRegistry {
    entries: BTreeMap<String, StrategyEntry>,
}

impl StrategyRegistry {
    /// Registry with the built-in strategies
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register_strategy(EmaCrossover::NAME, EmaCrossover::schema(), |params| {
            Ok(Box::new(EmaCrossover::from_params(params)?))
        });

        registry
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Register a strategy factory; a later registration replaces an earlier one
    pub fn register_strategy<F>(&mut self, name: &str, schema: ParamSchema, factory: F)
    where
        F: Fn(&StrategyParams) -> Result<Box<dyn Strategy>, StrategyError> + Send + Sync + 'static,
    {
        self.entries.insert(
            name.to_string(),
            StrategyEntry {
                schema,
                factory: Box::new(factory),
            },
        );
    }

    /// Validate `params` and build the named strategy
    pub fn create(
        &self,
        name: &str,
        params: &StrategyParams,
    ) -> Result<Box<dyn Strategy>, StrategyError> {
        let entry = self
            .entries
            .get(name)
            .ok_or_else(|| StrategyError::UnknownStrategy(name.to_string()))?;
        let resolved = validate_params(&entry.schema, params)?;
        (entry.factory)(&resolved)
    }

    /// Parameter schema of a registered strategy
    pub fn schema(&self, name: &str) -> Option<&[ParamSpec]> {
        self.entries.get(name).map(|e| e.schema.as_slice())
    }

    /// Get list of available strategy names, sorted
    pub fn list(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Check if a strategy is available
    pub fn has_strategy(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn descriptors(&self) -> Vec<StrategyDescriptor> {
        self.entries
            .iter()
            .map(|(name, entry)| StrategyDescriptor {
                name: name.clone(),
                params: entry.schema.clone(),
                defaults: default_params(&entry.schema),
            })
            .collect()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
