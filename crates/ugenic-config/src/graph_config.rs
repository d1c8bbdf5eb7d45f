//! Graph description file format and operations.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ugenic_core::{ControlProxy, GE, SynthGraph};
use ugenic_registry::{ProductRegistry, RegistryError};
use ugenic_synthdef::Destination;

use crate::error::ConfigError;
use crate::node_config::{ArgValue, ControlConfig, NodeConfig};

/// Transport settings for the lowered definition.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoadConfig {
    /// Where the engine runs; picks the path for oversized definitions.
    #[serde(default)]
    pub destination: Destination,
}

/// A graph described by named controls and nodes.
///
/// # TOML Format
///
/// ```toml
/// name = "pad"
///
/// [[controls]]
/// name = "freq"
/// values = [220.0]
///
/// [[nodes]]
/// id = "osc"
/// kind = "Saw"
/// rate = "audio"
/// args = [[{ ref = "freq" }, 221.0]]
///
/// [[nodes]]
/// id = "out"
/// kind = "Out"
/// rate = "audio"
/// args = [0, { ref = "osc" }]
///
/// [load]
/// destination = "remote"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GraphConfig {
    /// Definition name.
    pub name: String,

    /// Synth parameters, in parameter-table order.
    #[serde(default)]
    pub controls: Vec<ControlConfig>,

    /// Nodes in declaration order.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,

    /// Transport settings.
    #[serde(default)]
    pub load: LoadConfig,
}

impl GraphConfig {
    /// Create an empty description.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            controls: Vec::new(),
            nodes: Vec::new(),
            load: LoadConfig::default(),
        }
    }

    /// Add a control.
    pub fn with_control(mut self, control: ControlConfig) -> Self {
        self.controls.push(control);
        self
    }

    /// Add a node.
    pub fn with_node(mut self, node: NodeConfig) -> Self {
        self.nodes.push(node);
        self
    }

    /// Set the load destination.
    pub fn with_destination(mut self, destination: Destination) -> Self {
        self.load.destination = destination;
        self
    }

    /// Load a description from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        Self::from_toml(&content)
    }

    /// Load a description from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Save the description to a TOML file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }

        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))?;
        Ok(())
    }

    /// Convert the description to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Number of controls and nodes.
    pub fn len(&self) -> usize {
        self.controls.len() + self.nodes.len()
    }

    /// True when the description has no controls and no nodes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Builds the unexpanded graph.
    ///
    /// Controls become sources first, then every node in declaration order.
    /// A node may only reference controls and earlier nodes. A node
    /// referenced from several places is one shared element of the graph.
    pub fn build(&self, registry: &ProductRegistry) -> Result<SynthGraph, ConfigError> {
        let mut scope: HashMap<&str, GE> = HashMap::with_capacity(self.len());
        let mut graph = SynthGraph::default();

        for control in &self.controls {
            if scope.contains_key(control.name.as_str()) {
                return Err(ConfigError::DuplicateId(control.name.clone()));
            }
            let ge = ControlProxy::make(control.name.clone(), control.rate, control.values.clone())
                .map_err(|source| ConfigError::Graph {
                    control: control.name.clone(),
                    source,
                })?;
            scope.insert(&control.name, ge.clone());
            graph.push(ge);
        }

        for node in &self.nodes {
            if scope.contains_key(node.id.as_str()) {
                return Err(ConfigError::DuplicateId(node.id.clone()));
            }
            let args = node
                .args
                .iter()
                .map(|arg| resolve_arg(&scope, &node.id, arg))
                .collect::<Result<Vec<_>, _>>()?;
            let ge = registry
                .create(&node.kind, node.rate, args)
                .map_err(|source| match source {
                    RegistryError::UnknownType(kind) => ConfigError::UnknownKind {
                        node: node.id.clone(),
                        kind,
                    },
                    source => ConfigError::Registry {
                        node: node.id.clone(),
                        source,
                    },
                })?;
            tracing::debug!(id = %node.id, kind = %node.kind, "config_node");
            scope.insert(&node.id, ge.clone());
            graph.push(ge);
        }

        Ok(graph)
    }
}

fn resolve_arg(scope: &HashMap<&str, GE>, node: &str, arg: &ArgValue) -> Result<GE, ConfigError> {
    match arg {
        ArgValue::Number(value) => Ok(GE::from(*value)),
        ArgValue::Ref { reference, channel } => {
            let ge = scope
                .get(reference.as_str())
                .cloned()
                .ok_or_else(|| ConfigError::unknown_reference(node, reference))?;
            Ok(match channel {
                Some(index) => ge.channel(*index),
                None => ge,
            })
        }
        ArgValue::List(items) => {
            let channels = items
                .iter()
                .map(|item| resolve_arg(scope, node, item))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(GE::seq(channels))
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self::new("untitled")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ugenic_core::Rate;

    fn sine() -> GraphConfig {
        GraphConfig::new("sine")
            .with_control(ControlConfig::new("freq", [440.0]))
            .with_node(
                NodeConfig::new("osc", "SinOsc")
                    .with_rate(Rate::Audio)
                    .with_arg(ArgValue::reference("freq")),
            )
            .with_node(
                NodeConfig::new("out", "Out")
                    .with_rate(Rate::Audio)
                    .with_arg(0.0_f32)
                    .with_arg(ArgValue::reference("osc")),
            )
    }

    #[test]
    fn test_build_sources_in_order() {
        let registry = ProductRegistry::standard();
        let graph = sine().build(&registry).unwrap();
        assert_eq!(graph.sources().len(), 3);
        let expanded = graph.expand().unwrap();
        let names: Vec<&str> = expanded.ugens().iter().map(|u| u.name()).collect();
        assert_eq!(names, vec!["Control", "SinOsc", "Out"]);
    }

    #[test]
    fn test_shared_node_expands_once() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::new("shared")
            .with_node(NodeConfig::new("noise", "WhiteNoise").with_rate(Rate::Audio))
            .with_node(
                NodeConfig::new("out", "Out")
                    .with_rate(Rate::Audio)
                    .with_arg(0.0_f32)
                    .with_arg(vec![ArgValue::reference("noise"), ArgValue::reference("noise")]),
            );
        let graph = config.build(&registry).unwrap().expand().unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(graph.ugens()[1].inputs().len(), 3);
    }

    #[test]
    fn test_forward_reference_is_rejected() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::new("fwd")
            .with_node(
                NodeConfig::new("out", "Out")
                    .with_rate(Rate::Audio)
                    .with_arg(0.0_f32)
                    .with_arg(ArgValue::reference("osc")),
            )
            .with_node(NodeConfig::new("osc", "SinOsc").with_rate(Rate::Audio));
        let err = config.build(&registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownReference { ref node, ref reference } if node == "out" && reference == "osc"
        ));
    }

    #[test]
    fn test_duplicate_ids() {
        let registry = ProductRegistry::standard();
        let config = sine().with_node(NodeConfig::new("freq", "WhiteNoise").with_rate(Rate::Audio));
        assert!(matches!(
            config.build(&registry),
            Err(ConfigError::DuplicateId(ref id)) if id == "freq"
        ));
    }

    #[test]
    fn test_unknown_kind() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::new("x").with_node(NodeConfig::new("m", "MoogLadder"));
        assert!(matches!(
            config.build(&registry),
            Err(ConfigError::UnknownKind { ref kind, .. }) if kind == "MoogLadder"
        ));
    }

    #[test]
    fn test_factory_errors_name_the_node() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::new("x").with_node(NodeConfig::new("osc", "SinOsc"));
        let err = config.build(&registry).unwrap_err();
        assert!(matches!(err, ConfigError::Registry { ref node, .. } if node == "osc"));
        assert!(err.to_string().starts_with("node 'osc'"));
    }

    #[test]
    fn test_unbounded_channel_count_is_rejected() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::from_toml(
            r#"
name = "bus"

[[nodes]]
id = "in"
kind = "In"
rate = "audio"
args = [0, inf]
"#,
        )
        .unwrap();
        let err = config.build(&registry).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Registry {
                source: RegistryError::Factory {
                    source: ugenic_core::GraphError::InvalidChannelCount { .. },
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn test_empty_control_is_rejected() {
        let registry = ProductRegistry::standard();
        let config = GraphConfig::new("x").with_control(ControlConfig::new("gate", []));
        assert!(matches!(config.build(&registry), Err(ConfigError::Graph { .. })));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = sine().with_destination(Destination::Remote);
        let text = config.to_toml().unwrap();
        let parsed = GraphConfig::from_toml(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_defaults_to_local() {
        let config = GraphConfig::from_toml("name = \"bare\"").unwrap();
        assert_eq!(config.load.destination, Destination::Local);
        assert!(config.is_empty());
    }
}
