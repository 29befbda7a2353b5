//! In-process computation units for logic nodes.
//!
//! Logic nodes have no backend object; each is bound to a [`LogicUnit`]
//! that holds a property store seeded from the model node, a named input
//! cache fed by the bridge, and a named output cache. Outputs stay cached
//! so reconciliation can re-push them into newly formed connections.

use std::collections::BTreeMap;

use patchbay_catalog::PropertyValue;
use patchbay_graph::PropertyMap;

/// Which computation a [`LogicUnit`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicKind {
    /// Emits its `value` property, clamped to `[min, max]`.
    Slider,
    /// Emits its `value` property unmodified.
    Constant,
    /// Emits a monotone tick counter, advanced by the host timer.
    Timer,
    /// Emits a seeded-PRNG draw in `[min, max]`, advanced per firing.
    Random,
    /// Emits 1.0/0.0 from comparing inputs `a` and `b`.
    Comparator,
    /// Emits `note`/`velocity` from host-fed MIDI events.
    MidiInput,
}

impl LogicKind {
    /// Maps a catalog type name to its computation, if it is a logic type.
    pub fn from_node_type(node_type: &str) -> Option<Self> {
        match node_type {
            "slider" => Some(Self::Slider),
            "constant" => Some(Self::Constant),
            "timer" => Some(Self::Timer),
            "random" => Some(Self::Random),
            "comparator" => Some(Self::Comparator),
            "midi-input" => Some(Self::MidiInput),
            _ => None,
        }
    }
}

/// One logic node's live computation state.
#[derive(Debug, Clone)]
pub struct LogicUnit {
    kind: LogicKind,
    properties: BTreeMap<String, PropertyValue>,
    inputs: BTreeMap<String, f64>,
    outputs: BTreeMap<String, f64>,
    tick: u64,
    rng: u64,
}

impl LogicUnit {
    /// Builds a unit for a logic node type, seeding properties from the
    /// model node. Returns `None` for non-logic types.
    pub fn new(node_type: &str, properties: &PropertyMap) -> Option<Self> {
        let kind = LogicKind::from_node_type(node_type)?;
        let mut unit = Self {
            kind,
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            tick: 0,
            rng: 0,
        };
        unit.reseed();
        match kind {
            // Timer emits nothing until first fired; random draws its
            // first value eagerly so reconnects see a stable output.
            LogicKind::Timer => {}
            LogicKind::Random => {
                unit.draw();
            }
            _ => {
                unit.compute();
            }
        }
        Some(unit)
    }

    /// The unit's computation kind.
    pub fn kind(&self) -> LogicKind {
        self.kind
    }

    /// Cached value of a named output, if it has ever been produced.
    pub fn output(&self, name: &str) -> Option<f64> {
        self.outputs.get(name).copied()
    }

    /// Current value of a unit property, as last written.
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// All cached outputs, in name order.
    pub fn outputs(&self) -> impl Iterator<Item = (&str, f64)> {
        self.outputs.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Writes a property and reseeds the PRNG when `seed` changes.
    pub fn set_property(&mut self, name: &str, value: &PropertyValue) {
        self.properties.insert(name.to_string(), value.clone());
        if self.kind == LogicKind::Random && name == "seed" {
            self.reseed();
        }
    }

    /// Feeds a named input from the bridge.
    pub fn set_input(&mut self, name: &str, value: f64) {
        self.inputs.insert(name.to_string(), value);
    }

    /// Recomputes outputs from the current properties and inputs.
    ///
    /// Returns the full output set to push. Timer and random units do not
    /// advance here; their cached outputs pass through unchanged.
    pub fn compute(&mut self) -> Vec<(String, f64)> {
        match self.kind {
            LogicKind::Slider => {
                let min = self.number("min", 0.0);
                let max = self.number("max", 1.0);
                let value = self.number("value", 0.0).clamp(min, max.max(min));
                self.outputs.insert("output".to_string(), value);
            }
            LogicKind::Constant => {
                let value = self.number("value", 0.0);
                self.outputs.insert("output".to_string(), value);
            }
            LogicKind::Comparator => {
                let a = self.inputs.get("a").copied().unwrap_or(0.0);
                let b = self.inputs.get("b").copied().unwrap_or(0.0);
                let op = self
                    .properties
                    .get("operator")
                    .and_then(PropertyValue::as_text)
                    .unwrap_or("gt");
                let holds = match op {
                    "lt" => a < b,
                    "ge" => a >= b,
                    "le" => a <= b,
                    "eq" => a == b,
                    _ => a > b,
                };
                self.outputs
                    .insert("output".to_string(), if holds { 1.0 } else { 0.0 });
            }
            // Timer/random outputs only move on fire; midi outputs only
            // move on note events.
            LogicKind::Timer | LogicKind::Random | LogicKind::MidiInput => {}
        }
        self.produced()
    }

    /// Host-timer entry: advances timer and random units.
    ///
    /// A timer honors its `running` flag and produces nothing while
    /// stopped. For other kinds this is equivalent to [`compute`](Self::compute).
    pub fn fire(&mut self) -> Vec<(String, f64)> {
        match self.kind {
            LogicKind::Timer => {
                let running = self
                    .properties
                    .get("running")
                    .and_then(PropertyValue::as_bool)
                    .unwrap_or(true);
                if !running {
                    return Vec::new();
                }
                self.tick += 1;
                self.outputs.insert("output".to_string(), self.tick as f64);
                self.produced()
            }
            LogicKind::Random => {
                self.draw();
                self.produced()
            }
            _ => self.compute(),
        }
    }

    /// Host MIDI entry: a note-on sets both outputs.
    pub fn note_on(&mut self, note: u8, velocity: u8) -> Vec<(String, f64)> {
        if self.kind != LogicKind::MidiInput {
            return Vec::new();
        }
        self.outputs.insert("note".to_string(), f64::from(note));
        self.outputs
            .insert("velocity".to_string(), f64::from(velocity));
        self.produced()
    }

    /// Host MIDI entry: a note-off zeroes velocity for the held note.
    pub fn note_off(&mut self, note: u8) -> Vec<(String, f64)> {
        if self.kind != LogicKind::MidiInput {
            return Vec::new();
        }
        if self.output("note") != Some(f64::from(note)) {
            return Vec::new();
        }
        self.outputs.insert("velocity".to_string(), 0.0);
        self.produced()
    }

    fn number(&self, name: &str, default: f64) -> f64 {
        self.properties
            .get(name)
            .and_then(PropertyValue::as_number)
            .unwrap_or(default)
    }

    fn produced(&self) -> Vec<(String, f64)> {
        self.outputs.iter().map(|(k, v)| (k.clone(), *v)).collect()
    }

    fn reseed(&mut self) {
        let seed = self.number("seed", 1.0).abs() as u64;
        self.rng = seed.max(1);
    }

    /// xorshift64 step, mapped into `[min, max]`.
    fn draw(&mut self) {
        self.rng ^= self.rng << 13;
        self.rng ^= self.rng >> 7;
        self.rng ^= self.rng << 17;
        let min = self.number("min", 0.0);
        let max = self.number("max", 1.0).max(min);
        let unit = (self.rng >> 11) as f64 / (1u64 << 53) as f64;
        self.outputs
            .insert("output".to_string(), min + unit * (max - min));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, PropertyValue)]) -> PropertyMap {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn non_logic_types_have_no_unit() {
        assert!(LogicUnit::new("oscillator", &PropertyMap::default()).is_none());
        assert!(LogicUnit::new("gain", &PropertyMap::default()).is_none());
    }

    #[test]
    fn slider_clamps_value_into_range() {
        let mut unit = LogicUnit::new(
            "slider",
            &props(&[
                ("value", PropertyValue::Number(5.0)),
                ("min", PropertyValue::Number(0.0)),
                ("max", PropertyValue::Number(1.0)),
            ]),
        )
        .unwrap();
        assert_eq!(unit.output("output"), Some(1.0));

        unit.set_property("value", &PropertyValue::Number(0.25));
        unit.compute();
        assert_eq!(unit.output("output"), Some(0.25));
    }

    #[test]
    fn constant_emits_its_value() {
        let unit =
            LogicUnit::new("constant", &props(&[("value", PropertyValue::Number(7.5))])).unwrap();
        assert_eq!(unit.output("output"), Some(7.5));
    }

    #[test]
    fn timer_ticks_monotonically_and_honors_running() {
        let mut unit = LogicUnit::new(
            "timer",
            &props(&[
                ("interval_ms", PropertyValue::Number(500.0)),
                ("running", PropertyValue::Bool(true)),
            ]),
        )
        .unwrap();
        assert_eq!(unit.output("output"), None);

        assert_eq!(unit.fire(), vec![("output".to_string(), 1.0)]);
        assert_eq!(unit.fire(), vec![("output".to_string(), 2.0)]);

        unit.set_property("running", &PropertyValue::Bool(false));
        assert!(unit.fire().is_empty());
        assert_eq!(unit.output("output"), Some(2.0));
    }

    #[test]
    fn random_is_deterministic_per_seed_and_in_range() {
        let seeded = |seed: f64| {
            LogicUnit::new(
                "random",
                &props(&[
                    ("min", PropertyValue::Number(10.0)),
                    ("max", PropertyValue::Number(20.0)),
                    ("seed", PropertyValue::Number(seed)),
                ]),
            )
            .unwrap()
        };

        let mut a = seeded(42.0);
        let mut b = seeded(42.0);
        for _ in 0..10 {
            let va = a.fire()[0].1;
            let vb = b.fire()[0].1;
            assert_eq!(va, vb);
            assert!((10.0..=20.0).contains(&va), "out of range: {va}");
        }

        let mut c = seeded(43.0);
        assert_ne!(a.fire()[0].1, c.fire()[0].1);
    }

    #[test]
    fn comparator_applies_its_operator() {
        let mut unit = LogicUnit::new(
            "comparator",
            &props(&[("operator", PropertyValue::Text("gt".to_string()))]),
        )
        .unwrap();

        unit.set_input("a", 2.0);
        unit.set_input("b", 1.0);
        unit.compute();
        assert_eq!(unit.output("output"), Some(1.0));

        unit.set_property("operator", &PropertyValue::Text("le".to_string()));
        unit.compute();
        assert_eq!(unit.output("output"), Some(0.0));

        unit.set_input("a", 1.0);
        unit.compute();
        assert_eq!(unit.output("output"), Some(1.0));
    }

    #[test]
    fn midi_input_tracks_note_events() {
        let mut unit = LogicUnit::new(
            "midi-input",
            &props(&[("channel", PropertyValue::Number(0.0))]),
        )
        .unwrap();

        unit.note_on(60, 100);
        assert_eq!(unit.output("note"), Some(60.0));
        assert_eq!(unit.output("velocity"), Some(100.0));

        // Off for a different note is ignored.
        assert!(unit.note_off(61).is_empty());
        assert_eq!(unit.output("velocity"), Some(100.0));

        unit.note_off(60);
        assert_eq!(unit.output("velocity"), Some(0.0));
        assert_eq!(unit.output("note"), Some(60.0));
    }

    #[test]
    fn outputs_stay_cached_for_reconnects() {
        let mut unit = LogicUnit::new(
            "slider",
            &props(&[
                ("value", PropertyValue::Number(0.4)),
                ("min", PropertyValue::Number(0.0)),
                ("max", PropertyValue::Number(1.0)),
            ]),
        )
        .unwrap();
        unit.compute();

        // A later caller reads the cache without recomputing.
        assert_eq!(unit.output("output"), Some(0.4));
        let cached: Vec<_> = unit.outputs().collect();
        assert_eq!(cached, vec![("output", 0.4)]);
    }
}
