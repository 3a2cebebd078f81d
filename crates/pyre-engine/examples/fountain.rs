//! Headless fountain demo -- builds an emitter from JSON and steps it for a
//! few simulated seconds, logging population stats along the way.
//!
//! Run with:
//!   cargo run --example fountain -p pyre-engine
//!
//! Set `RUST_LOG=debug` to see the engine's own tracing output.

use pyre_engine::prelude::*;
use tracing::info;

const FOUNTAIN: &str = r#"{
    "id": "fountain",
    "seed": 42,
    "rate": { "numPan": [2, 5], "timePan": 50 },
    "initializers": [
        { "type": "Life", "life": [800, 2000] },
        { "type": "Radius", "width": 2, "height": 6 },
        { "type": "Position", "zone": { "type": "Sphere", "center": [0, 0, 0], "radius": 1 } },
        { "type": "RadialVelocity", "direction": [0, 1, 0], "speed": [0.15, 0.35], "theta": 20 }
    ],
    "behaviours": [
        { "type": "Gravity", "gravity": 0.0005 },
        { "type": "Alpha", "from": 1.0, "to": 0.0, "easing": "outQuad" },
        { "type": "Scale", "from": 1.0, "to": 0.3 }
    ]
}"#;

fn main() -> Result<(), BuildError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let mut pool = Pool::new();
    let mut emitter = Emitter::from_json(FOUNTAIN)?;
    emitter.connect_on_dead(|event| {
        info!(emitter = %event.emitter_id, "emitter died");
    });
    emitter.emit(None, None);

    // Five simulated seconds at a 16 ms step.
    for frame in 0..312u32 {
        emitter.update(16.0, &mut pool);
        if frame % 62 == 0 {
            let peak = emitter
                .particles()
                .iter()
                .map(|p| p.state.position.y)
                .fold(0.0f32, f32::max);
            info!(
                frame,
                alive = emitter.particle_count(),
                emitted = emitter.current_emit_count(),
                pooled = pool.free_len(),
                peak_height = format!("{peak:.1}"),
                "fountain"
            );
        }
    }

    emitter.destroy(&mut pool);
    info!(
        created = pool.created(),
        recycled = pool.recycled(),
        "run complete"
    );
    Ok(())
}
