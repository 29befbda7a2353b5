//! Built-in node type specs.
//!
//! One function per shipped type, assembled by [`Catalog::new`](crate::Catalog::new).
//! Audio types mirror the platform audio engine's factory vocabulary; logic
//! types are in-process computation units with control-kind ports only.

use crate::spec::{NodeCategory, NodeTypeSpec, PortSpec, PropertySpec};

pub(crate) fn all() -> Vec<NodeTypeSpec> {
    vec![
        oscillator(),
        gain(),
        filter(),
        delay(),
        destination(),
        slider(),
        constant(),
        timer(),
        random(),
        comparator(),
        midi_input(),
    ]
}

fn oscillator() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "oscillator".to_string(),
        label: "Oscillator".to_string(),
        category: NodeCategory::Source,
        ports: vec![
            PortSpec::audio_out("output"),
            PortSpec::param_in("frequency"),
            PortSpec::param_in("detune"),
        ],
        properties: vec![
            PropertySpec::number("frequency", 0.0, 20000.0, 440.0),
            PropertySpec::number("detune", -1200.0, 1200.0, 0.0),
            PropertySpec::choice(
                "waveform",
                &["sine", "square", "sawtooth", "triangle"],
                "sine",
            ),
        ],
    }
}

fn gain() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "gain".to_string(),
        label: "Gain".to_string(),
        category: NodeCategory::Processing,
        ports: vec![
            PortSpec::audio_in("input"),
            PortSpec::audio_out("output"),
            PortSpec::param_in("gain"),
        ],
        properties: vec![PropertySpec::number("gain", 0.0, 10.0, 1.0)],
    }
}

fn filter() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "filter".to_string(),
        label: "Filter".to_string(),
        category: NodeCategory::Processing,
        ports: vec![
            PortSpec::audio_in("input"),
            PortSpec::audio_out("output"),
            PortSpec::param_in("frequency"),
            PortSpec::param_in("q"),
        ],
        properties: vec![
            PropertySpec::number("frequency", 10.0, 20000.0, 350.0),
            PropertySpec::number("q", 0.0001, 1000.0, 1.0),
            PropertySpec::choice("mode", &["lowpass", "highpass", "bandpass", "notch"], "lowpass"),
        ],
    }
}

fn delay() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "delay".to_string(),
        label: "Delay".to_string(),
        category: NodeCategory::Processing,
        ports: vec![
            PortSpec::audio_in("input"),
            PortSpec::audio_out("output"),
            PortSpec::param_in("delay_time"),
        ],
        properties: vec![PropertySpec::number("delay_time", 0.0, 5.0, 0.25)],
    }
}

fn destination() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "destination".to_string(),
        label: "Destination".to_string(),
        category: NodeCategory::Output,
        ports: vec![PortSpec::audio_in("input")],
        properties: vec![],
    }
}

fn slider() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "slider".to_string(),
        label: "Slider".to_string(),
        category: NodeCategory::Logic,
        ports: vec![PortSpec::control_out("output")],
        properties: vec![
            PropertySpec::number("value", f64::MIN, f64::MAX, 0.5),
            PropertySpec::number("min", f64::MIN, f64::MAX, 0.0),
            PropertySpec::number("max", f64::MIN, f64::MAX, 1.0),
        ],
    }
}

fn constant() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "constant".to_string(),
        label: "Constant".to_string(),
        category: NodeCategory::Logic,
        ports: vec![PortSpec::control_out("output")],
        properties: vec![PropertySpec::number("value", f64::MIN, f64::MAX, 1.0)],
    }
}

fn timer() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "timer".to_string(),
        label: "Timer".to_string(),
        category: NodeCategory::Logic,
        ports: vec![PortSpec::control_out("output")],
        properties: vec![
            PropertySpec::number("interval_ms", 1.0, 60000.0, 500.0),
            PropertySpec::bool("running", true),
        ],
    }
}

fn random() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "random".to_string(),
        label: "Random".to_string(),
        category: NodeCategory::Logic,
        ports: vec![PortSpec::control_out("output")],
        properties: vec![
            PropertySpec::number("min", f64::MIN, f64::MAX, 0.0),
            PropertySpec::number("max", f64::MIN, f64::MAX, 1.0),
            PropertySpec::number("seed", 1.0, f64::MAX, 1.0),
        ],
    }
}

fn comparator() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "comparator".to_string(),
        label: "Comparator".to_string(),
        category: NodeCategory::Logic,
        ports: vec![
            PortSpec::control_in("a"),
            PortSpec::control_in("b"),
            PortSpec::control_out("output"),
        ],
        properties: vec![PropertySpec::choice(
            "operator",
            &["gt", "lt", "ge", "le", "eq"],
            "gt",
        )],
    }
}

fn midi_input() -> NodeTypeSpec {
    NodeTypeSpec {
        name: "midi-input".to_string(),
        label: "MIDI Input".to_string(),
        category: NodeCategory::Logic,
        ports: vec![
            PortSpec::control_out("note"),
            PortSpec::control_out("velocity"),
        ],
        properties: vec![PropertySpec::number("channel", 0.0, 15.0, 0.0)],
    }
}
