use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use gravsim::body::BodyBuilder;
use gravsim::cli::{self, Scenario};
use gravsim::constants::*;
use gravsim::output::OutputDevice;
use gravsim::vector3::Vector3;
use gravsim::world::World;

fn build_solar_system(world: &mut World) {
    let _sol = world
        .add_body(BodyBuilder::new("Sol").mass(SOL_MASS).radius(SOL_RADIUS))
        .expect("Sol is a valid body");

    let earth = world
        .add_body(
            BodyBuilder::new("Earth")
                .mass(EARTH_MASS)
                .radius(EARTH_RADIUS)
                .position(Vector3::new(EARTH_DIST_TO_SOL, 0.0, 0.0))
                .velocity(Vector3::new(0.0, EARTH_SOL_ORBIT_VEL, 0.0)),
        )
        .expect("Earth is a valid body");

    world
        .add_body_in_circular_orbit(
            BodyBuilder::new("Moon").mass(MOON_MASS).radius(MOON_RADIUS),
            earth,
            MOON_DIST_TO_EARTH,
        )
        .expect("Moon orbit is valid");
}

fn build_collision(world: &mut World) {
    world
        .add_body(
            BodyBuilder::new("a")
                .mass(1.0e3)
                .radius(0.5)
                .position(Vector3::new(-10.0, 0.0, 0.0))
                .velocity(Vector3::new(1.0, 0.0, 0.0)),
        )
        .expect("body a is valid");
    world
        .add_body(
            BodyBuilder::new("b")
                .mass(1.0e3)
                .radius(0.5)
                .position(Vector3::new(10.0, 0.0, 0.0))
                .velocity(Vector3::new(-1.0, 0.0, 0.0)),
        )
        .expect("body b is valid");
}

fn build_autopilot(world: &mut World) {
    let earth = world
        .add_body(BodyBuilder::new("Earth").mass(EARTH_MASS).radius(EARTH_RADIUS))
        .expect("Earth is a valid body");

    let ship = world
        .add_spaceship(
            BodyBuilder::new("ship")
                .mass(1000.0)
                .position(Vector3::new(7.0e6, 0.0, 0.0))
                .velocity(Vector3::new(-50.0, 7546.0, 0.0))
                .as_ship(100.0),
        )
        .expect("ship is a valid body");

    world.auto_orbit(ship, earth).expect("earth exists");
}

fn main() {
    env_logger::init();
    let cli = cli::parse_command_line();

    let mut world = World::new();
    match cli.scenario {
        Scenario::SolarSystem => build_solar_system(&mut world),
        Scenario::Collision => build_collision(&mut world),
        Scenario::Autopilot => build_autopilot(&mut world),
    }

    world.set_integrator(cli.integrator.into());
    world.set_force_strategy(cli.force_strategy.into());
    world.set_substeps(cli.substeps);
    world.set_time_warp(cli.time_warp);
    world.set_storing_positions(true);

    let output = OutputDevice::from_cli_config(&world, &cli);

    let world = Arc::new(Mutex::new(world));
    let running = Arc::new(AtomicBool::new(true));
    let output = Arc::new(Mutex::new(output));

    // Sim thread: sole writer of body state, clock, and trails (§5).
    let sim_world = Arc::clone(&world);
    let sim_running = Arc::clone(&running);
    let duration = cli.duration;
    let dt_wall = 1.0 / 60.0;
    let sim_handle = thread::spawn(move || {
        log::info!("sim thread starting, target duration {}s sim time", duration);
        let mut elapsed = 0.0;
        while sim_running.load(Ordering::Relaxed) && elapsed < duration {
            sim_world.lock().expect("world mutex poisoned").step(dt_wall);
            elapsed += dt_wall;
        }
        sim_running.store(false, Ordering::Relaxed);
        log::info!("sim thread finished after {:.1}s sim time", elapsed);
    });

    // Reader thread: read-only renderer stand-in, polls and reports.
    let reader_world = Arc::clone(&world);
    let reader_running = Arc::clone(&running);
    let reader_output = Arc::clone(&output);
    let report_every = cli.report_every.max(1) as u64;
    let reader_handle = thread::spawn(move || {
        let mut polls = 0u64;
        while reader_running.load(Ordering::Relaxed) {
            polls += 1;
            if polls % report_every == 0 {
                let w = reader_world.lock().expect("world mutex poisoned");
                reader_output.lock().expect("output mutex poisoned").report(&w);
            }
            thread::sleep(Duration::from_millis(16));
        }
    });

    sim_handle.join().expect("sim thread panicked");
    running.store(false, Ordering::Relaxed);
    reader_handle.join().expect("reader thread panicked");
}
