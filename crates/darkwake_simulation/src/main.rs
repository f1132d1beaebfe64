//! Headless симуляция DARKWAKE
//!
//! Запускает Bevy App без рендера: один монстр, один игрок, footstep bus.

use bevy::prelude::*;
use darkwake_simulation::*;

fn main() {
    let seed = 42;
    println!("Starting DARKWAKE headless simulation (seed: {})", seed);

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin);
    app.insert_resource(NavSurface::single_plane(200.0));

    {
        let mut library = app.world_mut().resource_mut::<SoundLibrary>();
        library
            .register(SoundClip::new("Footstep_01", vec![]))
            .expect("clip registry is empty at startup");
        library
            .register(SoundClip::new("Footstep_02", vec![]))
            .expect("clip registry is empty at startup");
    }

    app.world_mut().spawn((
        Monster,
        SpeedProfile::default(),
        PerceptionConfig::default(),
        Transform::from_translation(Vec3::new(30.0, 0.0, 0.0)),
    ));
    app.world_mut().spawn((
        Player,
        LocalAuthority,
        FootstepEmitter::default(),
        Locomotion { speed: 2.5 },
        Transform::from_translation(Vec3::ZERO),
    ));

    // Прогоняем 1000 фиксированных тиков симуляции
    for tick in 0..1000 {
        step_simulation(&mut app);

        if tick % 100 == 0 {
            let entity_count = app.world().entities().len();
            println!("Tick {}: {} entities", tick, entity_count);
        }
    }

    println!("Simulation complete!");
}
