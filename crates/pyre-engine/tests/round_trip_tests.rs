//! Declarative construction coverage: every rule kind builds from JSON,
//! re-serializes to an equivalent description, and bad input fails with a
//! useful error.

use pyre_engine::prelude::*;

fn build_initializer(json: &str) -> Initializer {
    let config: InitializerConfig = serde_json::from_str(json).unwrap();
    Initializer::from_config(&config).unwrap()
}

fn build_behaviour(json: &str) -> Behaviour {
    let config: BehaviourConfig = serde_json::from_str(json).unwrap();
    Behaviour::from_config(&config).unwrap()
}

// ---------------------------------------------------------------------------
// Initializer kinds
// ---------------------------------------------------------------------------

#[test]
fn every_initializer_kind_round_trips() {
    let recipes = [
        r#"{ "type": "Mass", "mass": [0.5, 2.0] }"#,
        r#"{ "type": "Life", "life": 1500.0 }"#,
        r#"{ "type": "Radius", "width": 2.0, "height": 6.0, "center": true }"#,
        r#"{ "type": "Position", "zone": { "type": "Box", "min": [-1, 0, -1], "max": [1, 2, 1] } }"#,
        r#"{ "type": "RadialVelocity", "direction": [0, 1, 0], "speed": [0.1, 0.3], "theta": 15.0 }"#,
        r#"{ "type": "VectorVelocity", "direction": [1, 0, 0], "speed": 0.25 }"#,
        r#"{ "type": "Rotation", "x": 0.0, "y": [0.0, 6.28], "z": 0.0 }"#,
        r#"{ "type": "Body", "keys": ["spark", "ember"] }"#,
    ];
    for json in recipes {
        let original: InitializerConfig = serde_json::from_str(json).unwrap();
        let init = Initializer::from_config(&original).unwrap();
        assert_eq!(
            init.to_config().unwrap(),
            original,
            "round trip mismatch for {json}"
        );
    }
}

#[test]
fn initializer_enabled_flag_defaults_on_and_round_trips_off() {
    let on = build_initializer(r#"{ "type": "Mass", "mass": 1.0 }"#);
    assert!(on.is_enabled());

    let off = build_initializer(r#"{ "type": "Mass", "mass": 1.0, "enabled": false }"#);
    assert!(!off.is_enabled());
    assert!(!off.to_config().unwrap().enabled);
}

// ---------------------------------------------------------------------------
// Behaviour kinds
// ---------------------------------------------------------------------------

#[test]
fn every_behaviour_kind_round_trips() {
    let recipes = [
        r#"{ "type": "Force", "force": [0.001, 0.0, 0.0] }"#,
        r#"{ "type": "Gravity", "gravity": 0.002 }"#,
        r#"{ "type": "Alpha", "from": 1.0, "to": [0.0, 0.1], "life": 800.0, "easing": "outCubic" }"#,
        r#"{ "type": "Color", "from": [1, 0.5, 0], "to": [0.2, 0.2, 0.2] }"#,
        r#"{ "type": "Scale", "from": 0.5, "to": [1.5, 2.0] }"#,
        r#"{ "type": "Rotate", "x": 0.01, "y": [0.0, 0.02], "z": 0.0 }"#,
        r#"{ "type": "Attraction", "target": [0, 10, 0], "force": 0.05, "radius": 40.0 }"#,
        r#"{ "type": "Repulsion", "target": [0, 0, 0], "force": 0.05, "radius": 25.0 }"#,
        r#"{ "type": "RandomDrift", "drift": [0.01, 0.0, 0.01], "delay": 50.0 }"#,
        r#"{ "type": "Collision", "bounce": 0.8, "useMass": true }"#,
        r#"{ "type": "CrossZone", "zone": { "type": "Sphere", "center": [0, 0, 0], "radius": 80 }, "crossing": "bound" }"#,
    ];
    for json in recipes {
        let original: BehaviourConfig = serde_json::from_str(json).unwrap();
        let behaviour = Behaviour::from_config(&original).unwrap();
        assert_eq!(
            behaviour.to_config().unwrap(),
            original,
            "round trip mismatch for {json}"
        );
    }
}

#[test]
fn behaviour_defaults_are_unbounded_linear_enabled() {
    let b = build_behaviour(r#"{ "type": "Gravity", "gravity": 0.001 }"#);
    assert_eq!(b.state().life, f32::INFINITY);
    assert_eq!(b.state().easing, Easing::Linear);
    assert!(b.is_enabled());
    // An unbounded life serializes as an absent field.
    assert_eq!(b.to_config().unwrap().life, None);
}

// ---------------------------------------------------------------------------
// Error paths
// ---------------------------------------------------------------------------

#[test]
fn unknown_type_tags_are_rejected_with_a_parse_error() {
    assert!(serde_json::from_str::<InitializerConfig>(r#"{ "type": "Wings" }"#).is_err());
    assert!(serde_json::from_str::<BehaviourConfig>(r#"{ "type": "Explode" }"#).is_err());
}

#[test]
fn invalid_spans_name_the_offending_field() {
    let config: InitializerConfig =
        serde_json::from_str(r#"{ "type": "Mass", "mass": [5.0, 2.0] }"#).unwrap();
    let err = Initializer::from_config(&config).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("mass"), "got: {message}");
    assert!(message.contains("inverted"), "got: {message}");
}

#[test]
fn nan_rejection_covers_nested_rule_fields() {
    let config = BehaviourConfig {
        kind: pyre_engine::behaviour::BehaviourKindConfig::Force {
            force: glam::Vec3::new(0.0, f32::NAN, 0.0),
        },
        life: None,
        easing: Easing::Linear,
        enabled: true,
    };
    assert!(Behaviour::from_config(&config).is_err());
}

// ---------------------------------------------------------------------------
// Whole-emitter JSON
// ---------------------------------------------------------------------------

#[test]
fn emitter_json_with_every_section_round_trips() {
    let json = r#"{
        "id": "torch",
        "position": [0, 5, 0],
        "rotation": [0, 0, 0.5],
        "life": 60000,
        "total": 10000,
        "damping": 0.004,
        "bindEmitter": true,
        "autoDestroy": true,
        "seed": 1234,
        "rate": { "numPan": [1, 4], "timePan": [20, 60] },
        "initializers": [
            { "type": "Life", "life": [300, 900] },
            { "type": "Position", "zone": { "type": "Point", "position": [0, 0, 0] } },
            { "type": "RadialVelocity", "direction": [0, 1, 0], "speed": 0.2, "theta": 10 }
        ],
        "behaviours": [
            { "type": "Alpha", "from": 1.0, "to": 0.0, "easing": "inQuad" },
            { "type": "Color", "from": [1.0, 0.8, 0.2], "to": [0.6, 0.1, 0.0] }
        ],
        "emitterBehaviours": [
            { "type": "RandomDrift", "drift": [0.005, 0.0, 0.005], "delay": 100 }
        ]
    }"#;

    let emitter = Emitter::from_json(json).unwrap();
    assert!(emitter.bind_emitter());
    assert_eq!(emitter.total_emit_count(), Some(10_000));
    assert_eq!(emitter.emitter_behaviours().len(), 1);

    let original: EmitterConfig = serde_json::from_str(json).unwrap();
    let back = emitter.to_config().unwrap();
    assert_eq!(back.rate, original.rate);
    assert_eq!(back.initializers, original.initializers);
    assert_eq!(back.behaviours, original.behaviours);
    assert_eq!(back.emitter_behaviours, original.emitter_behaviours);
    assert_eq!(back.seed, Some(1234));
    assert_eq!(back.life, Some(60_000.0));

    // Text-level round trip stabilizes after one pass.
    let text = emitter.to_json().unwrap();
    let rebuilt = Emitter::from_json(&text).unwrap();
    assert_eq!(rebuilt.to_config().unwrap(), back);
}
