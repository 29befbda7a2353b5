//! Port, property, and node type descriptors.
//!
//! A [`NodeTypeSpec`] is the full static description of one node type: its
//! declared ports (with signal kind and direction), its typed default
//! properties, and its category. Everything a placed graph node refers to
//! resolves against these specs.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Audio vs. control classification of a port.
///
/// Governs connection legality: audio may drive audio or control (latest
/// value semantics), control may only drive control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Continuous audio-rate signal carried by the platform audio engine.
    Audio,
    /// Discrete computed values produced by logic nodes or read from
    /// audio-rate outputs as "latest value".
    Control,
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalKind::Audio => write!(f, "audio"),
            SignalKind::Control => write!(f, "control"),
        }
    }
}

/// Direction of a declared port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {
    /// Receives a signal.
    Input,
    /// Produces a signal.
    Output,
}

/// A port declared by a node type.
///
/// Ports are not standalone entities; edges name them by `name` and resolve
/// them against the node type's current spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortSpec {
    /// Port name, unique within the node type.
    pub name: String,
    /// Input or output.
    pub direction: PortDirection,
    /// Audio or control.
    pub kind: SignalKind,
    /// True for control inputs backed by a live audio parameter of the
    /// same name (the bridge writes these through to the platform object).
    #[serde(default)]
    pub param: bool,
}

impl PortSpec {
    /// An audio-kind input port.
    pub fn audio_in(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            kind: SignalKind::Audio,
            param: false,
        }
    }

    /// An audio-kind output port.
    pub fn audio_out(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            kind: SignalKind::Audio,
            param: false,
        }
    }

    /// A control-kind input port (plain value input, e.g. on a logic node).
    pub fn control_in(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            kind: SignalKind::Control,
            param: false,
        }
    }

    /// A control-kind input backed by a live audio parameter.
    pub fn param_in(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Input,
            kind: SignalKind::Control,
            param: true,
        }
    }

    /// A control-kind output port.
    pub fn control_out(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direction: PortDirection::Output,
            kind: SignalKind::Control,
            param: false,
        }
    }
}

/// Value type of a node property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyKind {
    /// Numeric property with an inclusive valid range.
    Number {
        /// Smallest accepted value.
        min: f64,
        /// Largest accepted value.
        max: f64,
    },
    /// Free-form text.
    Text,
    /// Boolean flag.
    Bool,
    /// One of a fixed set of string options.
    Choice {
        /// The accepted option strings.
        options: Vec<String>,
    },
}

impl PropertyKind {
    /// Numeric kind with an unbounded range.
    pub fn number() -> Self {
        PropertyKind::Number {
            min: f64::MIN,
            max: f64::MAX,
        }
    }

    /// Returns true if `value` is acceptable for this kind.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match (self, value) {
            (PropertyKind::Number { min, max }, PropertyValue::Number(n)) => {
                n.is_finite() && *n >= *min && *n <= *max
            }
            (PropertyKind::Text, PropertyValue::Text(_)) => true,
            (PropertyKind::Bool, PropertyValue::Bool(_)) => true,
            (PropertyKind::Choice { options }, PropertyValue::Text(s)) => {
                options.iter().any(|o| o == s)
            }
            _ => false,
        }
    }
}

/// A property value on a graph node.
///
/// Choice properties are carried as `Text`; [`PropertyKind::Choice`]
/// constrains the accepted strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// Text or choice value.
    Text(String),
}

impl PropertyValue {
    /// Returns the numeric value, if this is a number.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the boolean value, if this is a bool.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            PropertyValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the string value, if this is text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        PropertyValue::Number(v)
    }
}

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        PropertyValue::Bool(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        PropertyValue::Text(v.to_string())
    }
}

/// A typed property declared by a node type, with its default value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// Property name, unique within the node type.
    pub name: String,
    /// Value type and constraints.
    pub kind: PropertyKind,
    /// Default value assigned when a node of this type is created.
    pub default: PropertyValue,
}

impl PropertySpec {
    /// A numeric property with an inclusive range.
    pub fn number(name: &str, min: f64, max: f64, default: f64) -> Self {
        Self {
            name: name.to_string(),
            kind: PropertyKind::Number { min, max },
            default: PropertyValue::Number(default),
        }
    }

    /// A boolean property.
    pub fn bool(name: &str, default: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: PropertyKind::Bool,
            default: PropertyValue::Bool(default),
        }
    }

    /// A choice property over fixed options.
    pub fn choice(name: &str, options: &[&str], default: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: PropertyKind::Choice {
                options: options.iter().map(|o| (*o).to_string()).collect(),
            },
            default: PropertyValue::Text(default.to_string()),
        }
    }
}

/// Category of a node type, for organization and capability queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    /// Audio signal generators (oscillators).
    Source,
    /// Audio processors (gain, filter, delay).
    Processing,
    /// Audio sinks (destination).
    Output,
    /// In-process logic nodes (sliders, timers, comparators, MIDI input).
    Logic,
    /// Instances of a registered composite definition.
    Composite,
}

impl NodeCategory {
    /// Returns a human-readable name for the category.
    pub const fn name(&self) -> &'static str {
        match self {
            NodeCategory::Source => "Source",
            NodeCategory::Processing => "Processing",
            NodeCategory::Output => "Output",
            NodeCategory::Logic => "Logic",
            NodeCategory::Composite => "Composite",
        }
    }
}

/// The full static description of one node type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeTypeSpec {
    /// Unique identifier (lowercase, no spaces).
    pub name: String,
    /// Human-readable name.
    pub label: String,
    /// Category for organization and capability queries.
    pub category: NodeCategory,
    /// Declared ports, in declaration order.
    pub ports: Vec<PortSpec>,
    /// Declared properties with defaults, in declaration order.
    pub properties: Vec<PropertySpec>,
}

impl NodeTypeSpec {
    /// True if nodes of this type are backed by a native platform audio
    /// object.
    pub fn is_audio(&self) -> bool {
        matches!(
            self.category,
            NodeCategory::Source | NodeCategory::Processing | NodeCategory::Output
        )
    }

    /// True if nodes of this type are backed by an in-process logic unit.
    pub fn is_logic(&self) -> bool {
        self.category == NodeCategory::Logic
    }

    /// True if nodes of this type expand a composite definition.
    pub fn is_composite(&self) -> bool {
        self.category == NodeCategory::Composite
    }

    /// Looks up a declared port by name.
    pub fn port(&self, name: &str) -> Option<&PortSpec> {
        self.ports.iter().find(|p| p.name == name)
    }

    /// Looks up a declared property by name.
    pub fn property(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// The primary output port: the port literally named `output`, else the
    /// first declared output.
    pub fn default_output(&self) -> Option<&PortSpec> {
        self.port("output")
            .filter(|p| p.direction == PortDirection::Output)
            .or_else(|| {
                self.ports
                    .iter()
                    .find(|p| p.direction == PortDirection::Output)
            })
    }

    /// The primary input port: the port literally named `input`, else the
    /// first declared input.
    pub fn default_input(&self) -> Option<&PortSpec> {
        self.port("input")
            .filter(|p| p.direction == PortDirection::Input)
            .or_else(|| {
                self.ports
                    .iter()
                    .find(|p| p.direction == PortDirection::Input)
            })
    }

    /// Default property values, in declaration order.
    pub fn default_properties(&self) -> Vec<(String, PropertyValue)> {
        self.properties
            .iter()
            .map(|p| (p.name.clone(), p.default.clone()))
            .collect()
    }
}
