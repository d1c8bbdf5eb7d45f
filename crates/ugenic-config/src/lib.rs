//! TOML graph descriptions for ugenic.
//!
//! A [`GraphConfig`] names a graph's controls and nodes. Each node names a
//! registry kind, an optional rate and its arguments: numbers, references to
//! earlier nodes or controls, and lists of those for multichannel arguments.
//! [`GraphConfig::build`] turns the description into a
//! [`SynthGraph`](ugenic_core::SynthGraph) through a
//! [`ProductRegistry`](ugenic_registry::ProductRegistry).
//!
//! # Example
//!
//! ```rust
//! use ugenic_config::GraphConfig;
//! use ugenic_registry::ProductRegistry;
//!
//! let config = GraphConfig::from_toml(r#"
//!     name = "beep"
//!
//!     [[nodes]]
//!     id = "osc"
//!     kind = "SinOsc"
//!     rate = "audio"
//!     args = [[440, 442]]
//!
//!     [[nodes]]
//!     id = "out"
//!     kind = "Out"
//!     rate = "audio"
//!     args = [0, { ref = "osc" }]
//! "#).unwrap();
//!
//! let registry = ProductRegistry::standard();
//! let graph = config.build(&registry).unwrap().expand().unwrap();
//! assert_eq!(graph.len(), 3);
//! ```

mod error;
mod graph_config;
mod node_config;

pub use error::ConfigError;
pub use graph_config::{GraphConfig, LoadConfig};
pub use node_config::{ArgValue, ControlConfig, NodeConfig};
