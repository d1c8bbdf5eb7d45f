//! Control and node entries of a graph description.

use serde::{Deserialize, Serialize};
use ugenic_core::Rate;

/// A named synth parameter.
///
/// ```toml
/// [[controls]]
/// name = "freq"
/// rate = "control"
/// values = [220.0, 330.0]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ControlConfig {
    /// Parameter name; nodes refer to the control by this name.
    pub name: String,

    /// Control rate (defaults to `control`).
    #[serde(default = "default_control_rate")]
    pub rate: Rate,

    /// Default values, one per channel.
    pub values: Vec<f32>,
}

fn default_control_rate() -> Rate {
    Rate::Control
}

impl ControlConfig {
    /// Create a control-rate parameter.
    pub fn new(name: impl Into<String>, values: impl IntoIterator<Item = f32>) -> Self {
        Self {
            name: name.into(),
            rate: Rate::Control,
            values: values.into_iter().collect(),
        }
    }

    /// Set the control rate.
    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }
}

/// One argument of a node.
///
/// In TOML an argument is a number, a reference table or an array of
/// arguments (a multichannel argument):
///
/// ```toml
/// args = [{ ref = "osc" }, [400.0, 800.0], { ref = "pan", channel = 1 }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ArgValue {
    /// A constant.
    Number(f32),
    /// Another node or control, optionally one of its channels.
    Ref {
        /// Id of an earlier node or control.
        #[serde(rename = "ref")]
        reference: String,
        /// Channel to select.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        channel: Option<u16>,
    },
    /// A multichannel group.
    List(Vec<ArgValue>),
}

impl ArgValue {
    /// Reference to a whole node or control.
    pub fn reference(id: impl Into<String>) -> Self {
        ArgValue::Ref {
            reference: id.into(),
            channel: None,
        }
    }

    /// Reference to one channel of a node or control.
    pub fn channel(id: impl Into<String>, channel: u16) -> Self {
        ArgValue::Ref {
            reference: id.into(),
            channel: Some(channel),
        }
    }
}

impl From<f32> for ArgValue {
    fn from(value: f32) -> Self {
        ArgValue::Number(value)
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(items: Vec<T>) -> Self {
        ArgValue::List(items.into_iter().map(Into::into).collect())
    }
}

/// One node: a registry kind, an optional rate and its arguments.
///
/// ```toml
/// [[nodes]]
/// id = "osc"
/// kind = "SinOsc"
/// rate = "audio"
/// args = [{ ref = "freq" }]
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// Unique id, referenced by later nodes.
    pub id: String,

    /// Registry key of the element kind.
    pub kind: String,

    /// Requested rate, for kinds that take one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<Rate>,

    /// Arguments in declaration order; omitted trailing ones take defaults.
    #[serde(default)]
    pub args: Vec<ArgValue>,
}

impl NodeConfig {
    /// Create a node with no rate and no arguments.
    pub fn new(id: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: kind.into(),
            rate: None,
            args: Vec::new(),
        }
    }

    /// Set the requested rate.
    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = Some(rate);
        self
    }

    /// Append an argument.
    pub fn with_arg(mut self, arg: impl Into<ArgValue>) -> Self {
        self.args.push(arg.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_value_forms() {
        #[derive(Deserialize)]
        struct Args {
            args: Vec<ArgValue>,
        }
        let parsed: Args = toml::from_str(
            r#"args = [1, 2.5, { ref = "osc" }, { ref = "pan", channel = 1 }, [3, { ref = "lfo" }]]"#,
        )
        .unwrap();
        assert_eq!(
            parsed.args,
            vec![
                ArgValue::Number(1.0),
                ArgValue::Number(2.5),
                ArgValue::reference("osc"),
                ArgValue::channel("pan", 1),
                ArgValue::List(vec![ArgValue::Number(3.0), ArgValue::reference("lfo")]),
            ]
        );
    }

    #[test]
    fn test_nested_lists_convert() {
        let arg = ArgValue::from(vec![
            ArgValue::reference("a"),
            ArgValue::from(vec![ArgValue::channel("b", 0), ArgValue::Number(1.0)]),
        ]);
        let ArgValue::List(items) = arg else {
            panic!("expected a list");
        };
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[1], ArgValue::List(inner) if inner.len() == 2));
    }

    #[test]
    fn test_node_builder() {
        let node = NodeConfig::new("lpf", "LPF")
            .with_rate(Rate::Audio)
            .with_arg(ArgValue::reference("osc"))
            .with_arg(800.0_f32);
        assert_eq!(node.rate, Some(Rate::Audio));
        assert_eq!(node.args.len(), 2);
    }

    #[test]
    fn test_control_rate_defaults_to_control() {
        let control: ControlConfig = toml::from_str("name = \"amp\"\nvalues = [0.1]").unwrap();
        assert_eq!(control.rate, Rate::Control);
        assert_eq!(control, ControlConfig::new("amp", [0.1]));
    }
}
