//! Product-type registry for ugenic graphs.
//!
//! The registry maps type keys to the two capabilities the rest of the system
//! needs for each element kind: a factory that builds an element from a rate
//! and argument list, and a reader that rebuilds it from the codec stream.
//!
//! Entries arrive in named [`Catalogue`]s. [`ProductRegistry::initialize_once`]
//! merges a catalogue at most once per registry, even when called from several
//! threads at once.
//!
//! # Example
//!
//! ```rust
//! use ugenic_core::{GE, Rate, SynthGraph, decode_graph, encode_graph};
//! use ugenic_registry::ProductRegistry;
//!
//! let registry = ProductRegistry::standard();
//! let osc = registry.create("SinOsc", Some(Rate::Audio), vec![GE::from(220.0)]).unwrap();
//! let out = registry
//!     .create("Out", Some(Rate::Audio), vec![GE::from(0.0), osc * GE::from(0.1)])
//!     .unwrap();
//!
//! let graph = SynthGraph::new(vec![out]);
//! let bytes = encode_graph(&graph).unwrap();
//! assert_eq!(decode_graph(&bytes, &registry).unwrap(), graph);
//! ```

pub mod catalogue;

pub use catalogue::{Catalogue, PLUGINS, STANDARD};

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use ugenic_core::{
    GE, GraphError, ProductReader, ProductResolver, Rate, SerialError, UGenSource, UGenSpec,
};

/// Builds an element from a rate and an argument list.
pub type Factory = Arc<dyn Fn(Option<Rate>, Vec<GE>) -> Result<GE, GraphError> + Send + Sync>;

/// Errors raised by registry lookups.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    /// No entry is registered under the key.
    #[error("unknown product type: {0}")]
    UnknownType(String),

    /// The entry can be decoded but not constructed by name.
    #[error("{0} cannot be constructed from an argument list")]
    NoFactory(String),

    /// The factory rejected the arguments.
    #[error("cannot construct {key}: {source}")]
    Factory {
        /// Type key.
        key: String,
        /// Why construction failed.
        #[source]
        source: GraphError,
    },
}

/// One registered element kind.
#[derive(Clone)]
pub struct ProductEntry {
    key: String,
    reader: ProductReader,
    factory: Option<Factory>,
    spec: Option<Arc<UGenSpec>>,
}

impl ProductEntry {
    /// An entry that can only be decoded.
    pub fn new(key: impl Into<String>, reader: ProductReader) -> Self {
        Self {
            key: key.into(),
            reader,
            factory: None,
            spec: None,
        }
    }

    /// Adds a factory.
    pub fn with_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn(Option<Rate>, Vec<GE>) -> Result<GE, GraphError> + Send + Sync + 'static,
    {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// An operator entry: decoded and constructed through [`UGenSource`].
    pub fn from_spec(spec: UGenSpec) -> Self {
        let spec = Arc::new(spec);
        let factory_spec = Arc::clone(&spec);
        Self {
            key: spec.name().to_owned(),
            reader: UGenSource::reader(Arc::clone(&spec)),
            factory: Some(Arc::new(move |rate: Option<Rate>, args: Vec<GE>| {
                UGenSource::make(Arc::clone(&factory_spec), rate, args)
            })),
            spec: Some(spec),
        }
    }

    /// Type key.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Codec reader.
    pub fn reader(&self) -> &ProductReader {
        &self.reader
    }

    /// Factory, if the kind can be constructed by name.
    pub fn factory(&self) -> Option<&Factory> {
        self.factory.as_ref()
    }

    /// Operator spec, for entries built from one.
    pub fn spec(&self) -> Option<&Arc<UGenSpec>> {
        self.spec.as_ref()
    }
}

impl fmt::Debug for ProductEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductEntry")
            .field("key", &self.key)
            .field("factory", &self.factory.is_some())
            .field("spec", &self.spec)
            .finish_non_exhaustive()
    }
}

/// Registry of element kinds, shared by expansion and decoding.
///
/// The registry is an ordinary value: construct one, populate it and pass it
/// where it is needed. All methods take `&self`, so one registry can be shared
/// between threads behind an `Arc`.
#[derive(Default)]
pub struct ProductRegistry {
    entries: RwLock<HashMap<String, ProductEntry>>,
    /// Ids of merged catalogues. Held for the whole check-and-merge.
    initialized: Mutex<HashSet<&'static str>>,
}

impl ProductRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the [`STANDARD`] catalogue.
    pub fn standard() -> Self {
        let registry = Self::new();
        registry.initialize_once(&STANDARD);
        registry
    }

    /// Merges entries; an existing key is replaced with a warning.
    pub fn register(&self, entries: impl IntoIterator<Item = ProductEntry>) {
        let mut map = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        for entry in entries {
            if map.contains_key(&entry.key) {
                tracing::warn!(key = %entry.key, "registry entry replaced");
            }
            map.insert(entry.key.clone(), entry);
        }
    }

    /// Merges `catalogue` unless it was merged before.
    ///
    /// Returns `true` when this call performed the merge. Concurrent calls for
    /// any catalogue are serialized, so a catalogue is never merged twice.
    pub fn initialize_once(&self, catalogue: &Catalogue) -> bool {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if initialized.contains(catalogue.id) {
            return false;
        }
        let entries = (catalogue.build)();
        tracing::debug!(
            catalogue = catalogue.id,
            entries = entries.len(),
            "registry_merge"
        );
        self.register(entries);
        initialized.insert(catalogue.id);
        true
    }

    /// True when the catalogue `id` has been merged.
    pub fn is_initialized(&self, id: &str) -> bool {
        self.initialized
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(id)
    }

    /// Looks up an entry.
    pub fn resolve(&self, key: &str) -> Result<ProductEntry, RegistryError> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::UnknownType(key.to_owned()))
    }

    /// Builds an element of kind `key`.
    pub fn create(&self, key: &str, rate: Option<Rate>, args: Vec<GE>) -> Result<GE, RegistryError> {
        let entry = self.resolve(key)?;
        let factory = entry
            .factory
            .ok_or_else(|| RegistryError::NoFactory(key.to_owned()))?;
        factory(rate, args).map_err(|source| RegistryError::Factory {
            key: key.to_owned(),
            source,
        })
    }

    /// The operator spec registered under `key`, if any.
    pub fn spec(&self, key: &str) -> Option<Arc<UGenSpec>> {
        self.resolve(key).ok().and_then(|e| e.spec)
    }

    /// True when `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ProductRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductRegistry")
            .field("keys", &self.keys())
            .finish_non_exhaustive()
    }
}

impl ProductResolver for ProductRegistry {
    fn resolve_reader(&self, key: &str) -> Result<ProductReader, SerialError> {
        self.resolve(key)
            .map(|entry| entry.reader)
            .map_err(|_| SerialError::UnknownType(key.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugenic_core::{Mix, SynthGraph};

    #[test]
    fn test_empty_registry() {
        let registry = ProductRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(
            registry.resolve("SinOsc").unwrap_err(),
            RegistryError::UnknownType("SinOsc".into())
        );
    }

    #[test]
    fn test_standard_registry() {
        let registry = ProductRegistry::standard();
        assert!(registry.is_initialized(STANDARD.id));
        assert!(!registry.is_initialized(PLUGINS.id));
        for key in ["SinOsc", "Out", "K2A", "BinaryOpUGen", "ControlProxy", "Mix"] {
            assert!(registry.contains(key), "missing {key}");
        }
    }

    #[test]
    fn test_initialize_once_is_idempotent() {
        let registry = ProductRegistry::new();
        assert!(registry.initialize_once(&STANDARD));
        let keys = registry.keys();
        assert!(!registry.initialize_once(&STANDARD));
        assert_eq!(registry.keys(), keys);
    }

    #[test]
    fn test_catalogues_merge_independently() {
        let registry = ProductRegistry::standard();
        let before = registry.len();
        assert!(registry.initialize_once(&PLUGINS));
        assert!(registry.len() > before);
        assert!(registry.contains("MoogLadder"));
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ProductRegistry::standard();
        registry.register([ProductEntry::new("Mix", Mix::reader())]);
        assert!(registry.resolve("Mix").unwrap().factory().is_none());
        assert_eq!(
            registry.create("Mix", None, vec![GE::from(1.0)]).unwrap_err(),
            RegistryError::NoFactory("Mix".into())
        );
    }

    #[test]
    fn test_create_reports_factory_errors() {
        let registry = ProductRegistry::standard();
        let err = registry.create("SinOsc", None, vec![]).unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Factory {
                source: GraphError::MissingRate { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_create_and_expand() {
        let registry = ProductRegistry::standard();
        let osc = registry
            .create("SinOsc", Some(Rate::Audio), vec![GE::from(440.0)])
            .unwrap();
        let graph = SynthGraph::new(vec![osc]).expand().unwrap();
        assert_eq!(graph.ugens()[0].name(), "SinOsc");
        assert_eq!(graph.ugens()[0].inputs().len(), 2);
    }

    #[test]
    fn test_resolver_maps_unknown_type() {
        let registry = ProductRegistry::new();
        let err = registry.resolve_reader("Nope").err().unwrap();
        assert!(matches!(err, SerialError::UnknownType(key) if key == "Nope"));
    }
}
