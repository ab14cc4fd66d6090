//! The simulator (§4.5 `World.step` machine, §4.6 reference resolution,
//! §4.8 diagnostics, §6 embedding API). Owns every `Body`, drives substeps,
//! dispatches force evaluation, runs the collision pass, advances the clock,
//! and samples trails.

use std::sync::Mutex;

use crate::body::{Body, BodyBuilder, BodyId, BodyKind};
use crate::collision;
use crate::constants::G;
use crate::error::SimError;
use crate::force::{self, ForceStrategy, WorkerPool};
use crate::integrator::{self, Integrator};
use crate::spaceship::{self, TargetSnapshot, TimewarpSignal};
use crate::vector3::Vector3;

/// Rolled-over wall-clock display of `t_sim`, using the fixed ratios of
/// §4.5 (60/60/24/365). Purely a presentation accumulator; physics only
/// ever uses `t_sim`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Calendar {
    pub years: u64,
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
    pub seconds: f64,
}

/// Owns the bodies, the simulation clock, and the run configuration. See
/// `SPEC_FULL.md` §6 for the full embedding API this exposes.
pub struct World {
    all_bodies: Vec<Body>,
    gravity_sources: Vec<usize>,
    test_bodies: Vec<usize>,

    t_sim: f64,
    calendar: Calendar,

    trail_store_period_s: f64,
    next_trail_t: f64,
    max_trail_samples: u32,
    storing_positions: bool,

    integrator: Integrator,
    force_strategy: ForceStrategy,
    worker_pool: Option<WorkerPool>,
    substeps: u32,
    time_warp: f64,

    paused: bool,
    selected_id: BodyId,

    /// Held only across the trail-append block of `step` (§5, §9); readers
    /// that need cross-body trail-index consistency must acquire this
    /// before traversing `trail`.
    snapshot_lock: Mutex<()>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            all_bodies: Vec::new(),
            gravity_sources: Vec::new(),
            test_bodies: Vec::new(),
            t_sim: 0.0,
            calendar: Calendar::default(),
            trail_store_period_s: 1.0,
            next_trail_t: 0.0,
            max_trail_samples: 1000,
            storing_positions: false,
            integrator: Integrator::default(),
            force_strategy: ForceStrategy::default(),
            worker_pool: None,
            substeps: 1,
            time_warp: 1.0,
            paused: false,
            selected_id: BodyId::SENTINEL,
            snapshot_lock: Mutex::new(()),
        }
    }

    // -- construction ---------------------------------------------------

    /// Validates and inserts a body (§7 `InvalidBody`); the World is left
    /// unchanged on error.
    pub fn add_body(&mut self, builder: BodyBuilder) -> Result<BodyId, SimError> {
        self.insert(builder)
    }

    /// Same insertion path as `add_body`; kept distinct in the API per §6
    /// since it's the entry point hosts reach for when building a ship
    /// (the builder's `.as_ship(..)` is what actually sets `BodyKind::Ship`).
    pub fn add_spaceship(&mut self, builder: BodyBuilder) -> Result<BodyId, SimError> {
        self.insert(builder)
    }

    /// Convenience constructor for a circular orbit around an existing body,
    /// used by the demo scenario and by tests that don't want to hand-derive
    /// orbital velocity. Not part of the source; grounded in the teacher's
    /// `relative_to`/`with_velocity` builder chain.
    pub fn add_body_in_circular_orbit(
        &mut self,
        builder: BodyBuilder,
        around: BodyId,
        distance: f64,
    ) -> Result<BodyId, SimError> {
        self.validate_id(around)?;
        let center = &self.all_bodies[around.0];
        let mu = G * center.mass;
        let speed = (mu / distance).sqrt();
        let p = center.p + Vector3::new(distance, 0.0, 0.0);
        let v = center.v + Vector3::new(0.0, speed, 0.0);
        let id = self.insert(builder.position(p).velocity(v))?;
        self.all_bodies[id.0].reference_id = around;
        Ok(id)
    }

    fn insert(&mut self, builder: BodyBuilder) -> Result<BodyId, SimError> {
        if builder.mass <= 0.0 || builder.radius < 0.0 {
            return Err(SimError::InvalidBody { mass: builder.mass, radius: builder.radius });
        }
        let id = BodyId(self.all_bodies.len());
        let body = builder.build(id);
        let idx = self.all_bodies.len();
        if body.contributes_to_gravity {
            self.gravity_sources.push(idx);
        } else {
            self.test_bodies.push(idx);
        }
        self.all_bodies.push(body);
        Ok(id)
    }

    fn validate_id(&self, id: BodyId) -> Result<(), SimError> {
        if id.0 < self.all_bodies.len() {
            Ok(())
        } else {
            Err(SimError::UnknownId(id))
        }
    }

    fn ship_state_mut(&mut self, id: BodyId) -> Result<&mut crate::spaceship::ShipState, SimError> {
        let body = self.all_bodies.get_mut(id.0).ok_or(SimError::UnknownId(id))?;
        match &mut body.kind {
            BodyKind::Ship(state) => Ok(state),
            BodyKind::Plain => Err(SimError::NotAShip(id)),
        }
    }

    // -- control ----------------------------------------------------------

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn set_time_warp(&mut self, time_warp: f64) {
        self.time_warp = time_warp;
    }

    pub fn set_substeps(&mut self, substeps: u32) {
        self.substeps = substeps.max(1);
    }

    pub fn set_integrator(&mut self, integrator: Integrator) {
        self.integrator = integrator;
    }

    /// Changing away from `WorkerPool` tears the pool down (its `Drop`
    /// joins every worker thread, satisfying §7's `SchedulerShutdown`
    /// policy); changing to it lazily spins one up sized to the host.
    pub fn set_force_strategy(&mut self, strategy: ForceStrategy) {
        self.force_strategy = strategy;
        match strategy {
            ForceStrategy::WorkerPool => {
                if self.worker_pool.is_none() {
                    self.worker_pool = Some(WorkerPool::default_sized());
                }
            }
            _ => self.worker_pool = None,
        }
    }

    pub fn set_storing_positions(&mut self, storing: bool) {
        self.storing_positions = storing;
    }

    pub fn set_trail_store_period(&mut self, period_s: f64) {
        self.trail_store_period_s = period_s;
    }

    pub fn set_max_trail_samples(&mut self, cap: u32) {
        self.max_trail_samples = cap;
    }

    pub fn set_selected(&mut self, id: BodyId) -> Result<(), SimError> {
        self.validate_id(id)?;
        self.selected_id = id;
        Ok(())
    }

    pub fn set_reference(&mut self, of: BodyId, to: BodyId) -> Result<(), SimError> {
        self.validate_id(of)?;
        self.validate_id(to)?;
        self.all_bodies[of.0].reference_id = to;
        Ok(())
    }

    // -- spaceship controls -------------------------------------------------

    pub fn add_burn(
        &mut self,
        ship_id: BodyId,
        direction: Vector3,
        thrust_n: f64,
        start_time_s: f64,
        duration_s: f64,
    ) -> Result<(), SimError> {
        let state = self.ship_state_mut(ship_id)?;
        state.add_burn(crate::spaceship::Burn {
            direction_unit: direction.normalize(),
            thrust_n,
            start_time_s,
            duration_s,
        });
        Ok(())
    }

    pub fn auto_orbit(&mut self, ship_id: BodyId, target_id: BodyId) -> Result<(), SimError> {
        self.validate_id(target_id)?;
        self.ship_state_mut(ship_id)?.begin_auto_orbit(target_id);
        Ok(())
    }

    pub fn consume_timewarp_request(&mut self, ship_id: BodyId) -> Result<Option<TimewarpSignal>, SimError> {
        Ok(self.ship_state_mut(ship_id)?.consume_timewarp_request())
    }

    // -- snapshot readers ---------------------------------------------------

    pub fn bodies(&self) -> &[Body] {
        &self.all_bodies
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.all_bodies.get(id.0)
    }

    pub fn bodies_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Body> + 'a {
        self.all_bodies.iter().filter(move |b| b.name == name)
    }

    pub fn sim_time(&self) -> f64 {
        self.t_sim
    }

    pub fn calendar(&self) -> Calendar {
        self.calendar
    }

    pub fn selected(&self) -> BodyId {
        self.selected_id
    }

    /// Total system energy in MJ: `Sum(GPE_i + KE_i) / 1e6` (§4.8).
    pub fn energy(&self) -> f64 {
        self.all_bodies.iter().map(|b| b.gpe + b.kinetic_energy()).sum::<f64>() / 1_000_000.0
    }

    /// `|Sum(m_i * v_i)|` (§4.8).
    pub fn momentum(&self) -> f64 {
        self.all_bodies
            .iter()
            .fold(Vector3::zero(), |acc, b| acc + b.momentum())
            .magnitude()
    }

    /// Caller must hold `snapshot_lock` (via `with_trail_snapshot`) before
    /// relying on cross-body trail-index alignment (§5).
    pub fn with_trail_snapshot<R>(&self, f: impl FnOnce(&[Body]) -> R) -> R {
        let _guard = self.snapshot_lock.lock().expect("snapshot lock poisoned");
        f(&self.all_bodies)
    }

    // -- step machine (§4.5) ------------------------------------------------

    pub fn step(&mut self, dt_wall: f64) {
        if self.paused {
            return;
        }

        self.resolve_references();

        let dt = self.time_warp * dt_wall;
        let dt_sub = dt / self.substeps as f64;

        for _ in 0..self.substeps {
            match self.integrator {
                Integrator::Euler | Integrator::Verlet => self.run_non_rk4_substep(dt_sub),
                Integrator::Rk4 => self.run_rk4_substep(dt_sub),
            }
        }

        self.recompute_gpe();
        self.sample_trails(dt_sub);

        for b in self.all_bodies.iter_mut() {
            b.external_force = Vector3::zero();
        }
    }

    fn run_non_rk4_substep(&mut self, dt_sub: f64) {
        self.pre_force_pass(0, dt_sub);
        self.zero_stage_accel(0);
        force::compute_accelerations(
            self.force_strategy,
            self.worker_pool.as_ref(),
            &mut self.all_bodies,
            0,
            &self.gravity_sources,
            &self.test_bodies,
        );
        self.fold_external_force(0);

        let integrator = self.integrator;
        for b in self.all_bodies.iter_mut() {
            integrator::step(integrator, b, dt_sub);
        }

        collision::resolve_pass(&mut self.all_bodies);
        self.advance_clock(dt_sub);
    }

    fn run_rk4_substep(&mut self, dt_sub: f64) {
        for b in self.all_bodies.iter_mut() {
            b.p_stage[0] = b.p;
        }

        for stage in 1..=4u8 {
            self.pre_force_pass(stage, dt_sub);
            self.zero_stage_accel(stage);
            force::compute_accelerations(
                self.force_strategy,
                self.worker_pool.as_ref(),
                &mut self.all_bodies,
                stage,
                &self.gravity_sources,
                &self.test_bodies,
            );
            self.fold_external_force(stage);

            for b in self.all_bodies.iter_mut() {
                integrator::rk4_stage(b, stage, dt_sub);
            }
        }

        collision::resolve_pass(&mut self.all_bodies);
        self.advance_clock(dt_sub);
    }

    /// Dispatches `body.pre_force` (§4.1) for every Ship body. The target's
    /// state is snapshotted before the ship is borrowed mutably so the
    /// autopilot never aliases two elements of `all_bodies` at once; the
    /// `ShipState` is temporarily swapped out of `BodyKind` for the same
    /// reason (both `&mut Body` and `&mut ShipState` are needed, and the
    /// latter lives inside the former).
    fn pre_force_pass(&mut self, stage: u8, dt_sub: f64) {
        for i in 0..self.all_bodies.len() {
            if !self.all_bodies[i].is_ship() {
                continue;
            }
            let target_id = match &self.all_bodies[i].kind {
                BodyKind::Ship(state) => state.target_id,
                BodyKind::Plain => unreachable!("checked is_ship above"),
            };
            let snapshot = target_id
                .and_then(|tid| self.all_bodies.get(tid.0))
                .map(TargetSnapshot::from_body);

            let body = &mut self.all_bodies[i];
            let mut state = match std::mem::replace(&mut body.kind, BodyKind::Plain) {
                BodyKind::Ship(state) => state,
                BodyKind::Plain => unreachable!("checked is_ship above"),
            };
            spaceship::pre_force(body, &mut state, snapshot, self.t_sim, dt_sub);
            body.kind = BodyKind::Ship(state);
        }
    }

    fn zero_stage_accel(&mut self, stage: u8) {
        for b in self.all_bodies.iter_mut() {
            *force::accel_slot(b, stage) = Vector3::zero();
        }
    }

    fn fold_external_force(&mut self, stage: u8) {
        for b in self.all_bodies.iter_mut() {
            let delta = b.external_force / b.mass;
            *force::accel_slot(b, stage) += delta;
        }
    }

    fn advance_clock(&mut self, dt_sub: f64) {
        self.t_sim += dt_sub;
        let c = &mut self.calendar;
        c.seconds += dt_sub;
        while c.seconds >= 60.0 {
            c.seconds -= 60.0;
            c.minutes += 1;
            if c.minutes >= 60 {
                c.minutes -= 60;
                c.hours += 1;
                if c.hours >= 24 {
                    c.hours -= 24;
                    c.days += 1;
                    if c.days >= 365 {
                        c.days -= 365;
                        c.years += 1;
                    }
                }
            }
        }
    }

    /// §4.6: the only point reference topology is mutated. Ids never become
    /// stale in this model (bodies are never removed once inserted), but
    /// resolution is kept as an explicit step so a future `remove_body`
    /// doesn't silently violate the invariant.
    fn resolve_references(&mut self) {
        let n = self.all_bodies.len();
        for b in self.all_bodies.iter_mut() {
            if b.reference_id.0 >= n {
                b.reference_id = BodyId::SENTINEL;
            }
        }
        if self.selected_id.0 >= n {
            self.selected_id = BodyId::SENTINEL;
        }
    }

    /// GPE_i is half the pairwise potential `-G m_i m_j / r` for every pair
    /// where at least one side contributes to gravity, split evenly so that
    /// `Sum(GPE_i) == -Sum_{i<j}(G m_i m_j / r_ij)`, the physically correct
    /// total potential energy, while still attributing a share to test
    /// bodies (they feel the field even though they don't source it).
    fn recompute_gpe(&mut self) {
        for b in self.all_bodies.iter_mut() {
            b.gpe = 0.0;
        }
        let n = self.all_bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if !self.all_bodies[i].contributes_to_gravity && !self.all_bodies[j].contributes_to_gravity {
                    continue;
                }
                let d = self.all_bodies[j].p - self.all_bodies[i].p;
                let dist = d.magnitude();
                if dist == 0.0 {
                    continue;
                }
                let pe = -(G * self.all_bodies[i].mass * self.all_bodies[j].mass) / dist;
                self.all_bodies[i].gpe += pe * 0.5;
                self.all_bodies[j].gpe += pe * 0.5;
            }
        }
    }

    /// §4.5 step 4: samples are time-aligned across bodies because every
    /// body is appended to within the same lock hold.
    fn sample_trails(&mut self, dt_sub: f64) {
        if self.storing_positions && self.t_sim > self.next_trail_t {
            let cap = self.max_trail_samples as usize;
            {
                let _guard = self.snapshot_lock.lock().expect("snapshot lock poisoned");
                for b in self.all_bodies.iter_mut() {
                    b.store_current_position(cap);
                }
            }
            self.next_trail_t += self.trail_store_period_s.max(dt_sub);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyBuilder;

    #[test]
    fn invalid_body_insertion_is_rejected_and_leaves_world_unchanged() {
        let mut world = World::new();
        let err = world.add_body(BodyBuilder::new("bad").mass(-1.0)).unwrap_err();
        assert!(matches!(err, SimError::InvalidBody { .. }));
        assert_eq!(world.bodies().len(), 0);
    }

    #[test]
    fn unknown_id_operations_fail_without_mutation() {
        let mut world = World::new();
        let err = world.set_selected(BodyId(5)).unwrap_err();
        assert!(matches!(err, SimError::UnknownId(_)));
    }

    #[test]
    fn single_body_free_drift_scenario() {
        // Scenario 1: m=1, r=0, p=origin, v=(1,0,0); Euler, dt=1, 10 steps.
        let mut world = World::new();
        world.set_integrator(Integrator::Euler);
        let id = world
            .add_body(BodyBuilder::new("drifter").mass(1.0).velocity(Vector3::new(1.0, 0.0, 0.0)))
            .unwrap();
        for _ in 0..10 {
            world.step(1.0);
        }
        let b = world.body(id).unwrap();
        assert!((b.p - Vector3::new(10.0, 0.0, 0.0)).magnitude() < 1e-9);
        assert!((b.v - Vector3::new(1.0, 0.0, 0.0)).magnitude() < 1e-9);
    }

    #[test]
    fn two_equal_masses_head_on_collision_separate_and_bounce_back() {
        // Scenario 2. Several substeps within the one `step()` call so the
        // collision pass sees the pair while genuinely overlapping instead
        // of landing exactly on the same point (mirrored unit velocities
        // cancel *exactly* in IEEE754 at dt=1 substeps=1, which would hit
        // the zero-distance perturbation path instead of real contact).
        let mut world = World::new();
        world.set_integrator(Integrator::Euler);
        world.set_substeps(10);
        let a = world
            .add_body(
                BodyBuilder::new("a")
                    .mass(1.0)
                    .radius(0.5)
                    .position(Vector3::new(-1.0, 0.0, 0.0))
                    .velocity(Vector3::new(1.0, 0.0, 0.0)),
            )
            .unwrap();
        let b = world
            .add_body(
                BodyBuilder::new("b")
                    .mass(1.0)
                    .radius(0.5)
                    .position(Vector3::new(1.0, 0.0, 0.0))
                    .velocity(Vector3::new(-1.0, 0.0, 0.0)),
            )
            .unwrap();
        world.step(1.0);
        let ba = world.body(a).unwrap();
        let bb = world.body(b).unwrap();
        assert!((ba.p - bb.p).magnitude() >= 1.0 - 1e-6);
        assert!(ba.v.x <= 0.0);
        assert!(ba.v.magnitude() <= crate::constants::SPEED_OF_LIGHT);
        assert!(bb.v.magnitude() <= crate::constants::SPEED_OF_LIGHT);
    }

    #[test]
    fn earth_moon_circular_orbit_returns_near_periapsis() {
        // Scenario 3, abbreviated: RK4, dt=60s, ~27.32 days.
        let mut world = World::new();
        world.set_integrator(Integrator::Rk4);
        let earth = world
            .add_body(
                BodyBuilder::new("Earth")
                    .mass(crate::constants::EARTH_MASS)
                    .radius(crate::constants::EARTH_RADIUS),
            )
            .unwrap();
        let r = crate::constants::MOON_DIST_TO_EARTH;
        let mu = G * crate::constants::EARTH_MASS;
        let v = (mu / r).sqrt();
        let moon = world
            .add_body(
                BodyBuilder::new("Moon")
                    .mass(crate::constants::MOON_MASS)
                    .radius(crate::constants::MOON_RADIUS)
                    .position(Vector3::new(r, 0.0, 0.0))
                    .velocity(Vector3::new(0.0, v, 0.0)),
            )
            .unwrap();
        world.set_reference(moon, earth).unwrap();

        let dt = 60.0;
        let steps = (27.32 * 24.0 * 3600.0 / dt).round() as u64;
        for _ in 0..steps {
            world.step(dt);
        }

        let start = Vector3::new(r, 0.0, 0.0);
        let end = world.body(moon).unwrap().p;
        let drift = (end - start).magnitude() / r;
        assert!(drift < 0.02, "moon drifted {:.4} of orbital radius from periapsis", drift);
    }

    #[test]
    fn autopilot_circularizes_and_goes_idle_within_an_hour() {
        // Scenario 4.
        let mut world = World::new();
        world.set_integrator(Integrator::Rk4);
        let earth = world
            .add_body(BodyBuilder::new("Earth").mass(crate::constants::EARTH_MASS).radius(crate::constants::EARTH_RADIUS))
            .unwrap();
        let ship = world
            .add_spaceship(
                BodyBuilder::new("ship")
                    .mass(1000.0)
                    .position(Vector3::new(7.0e6, 0.0, 0.0))
                    .velocity(Vector3::new(-50.0, 7546.0, 0.0))
                    .as_ship(100.0),
            )
            .unwrap();
        world.auto_orbit(ship, earth).unwrap();

        let dt = 1.0;
        for _ in 0..3600 {
            world.step(dt);
        }

        let ship_body = world.body(ship).unwrap();
        let earth_body = world.body(earth).unwrap();
        let r = ship_body.p - earth_body.p;
        let r_hat = r.normalize();
        let v_rel = ship_body.v - earth_body.v;
        let v_rad = v_rel.dot(&r_hat);
        assert!(v_rad.abs() < 1.0, "radial velocity {} did not converge", v_rad);

        match &ship_body.kind {
            BodyKind::Ship(state) => assert_eq!(state.autopilot, crate::spaceship::AutopilotMode::Idle),
            BodyKind::Plain => panic!("expected ship"),
        }
    }

    #[test]
    fn partitioned_matches_serial_forces_on_sources() {
        // Scenario 5 (correctness half; perf not exercised in a unit test).
        let mut world_serial = World::new();
        let mut world_part = World::new();
        world_serial.set_force_strategy(ForceStrategy::Serial);
        world_part.set_force_strategy(ForceStrategy::Partitioned);

        for w in [&mut world_serial, &mut world_part] {
            w.add_body(BodyBuilder::new("s0").mass(5.972e24).position(Vector3::zero())).unwrap();
            w.add_body(
                BodyBuilder::new("s1")
                    .mass(7.349e22)
                    .position(Vector3::new(3.844e8, 0.0, 0.0)),
            )
            .unwrap();
            w.add_body(
                BodyBuilder::new("t0")
                    .mass(1.0)
                    .contributes_to_gravity(false)
                    .position(Vector3::new(1.0e7, 2.0e7, 0.0)),
            )
            .unwrap();
        }

        world_serial.step(1.0);
        world_part.step(1.0);

        for id in [BodyId(0), BodyId(1)] {
            let a = world_serial.body(id).unwrap().p;
            let b = world_part.body(id).unwrap().p;
            let rel = (a - b).magnitude() / a.magnitude().max(1.0);
            assert!(rel < 1e-8, "strategy disagreement on source {:?}: {}", id, rel);
        }
    }

    #[test]
    fn trail_caps_and_keeps_the_most_recent_samples() {
        // Scenario 6.
        let mut world = World::new();
        world.set_max_trail_samples(100);
        world.set_storing_positions(true);
        world.set_trail_store_period(0.0);
        let id = world.add_body(BodyBuilder::new("drifter").mass(1.0).velocity(Vector3::new(1.0, 0.0, 0.0))).unwrap();

        for _ in 0..10_000 {
            world.step(1.0);
        }

        let b = world.body(id).unwrap();
        assert_eq!(b.trail.len(), 100);
    }

    #[test]
    fn momentum_is_conserved_for_a_closed_system_under_rk4() {
        let mut world = World::new();
        world.set_integrator(Integrator::Rk4);
        world.add_body(BodyBuilder::new("a").mass(5.972e24).position(Vector3::zero())).unwrap();
        world
            .add_body(
                BodyBuilder::new("b")
                    .mass(7.349e22)
                    .position(Vector3::new(3.844e8, 0.0, 0.0))
                    .velocity(Vector3::new(0.0, 1000.0, 0.0)),
            )
            .unwrap();

        let before = world.momentum();
        for _ in 0..1000 {
            world.step(60.0);
        }
        let after = world.momentum();
        let scale = world.bodies().iter().map(|b| b.mass * b.v.magnitude()).sum::<f64>().max(1.0);
        assert!((after - before).abs() < 1e-6 * scale);
    }

    #[test]
    fn two_body_energy_drifts_little_over_ten_thousand_rk4_steps() {
        // SS8 law: circular two-body system, G*M/r = v^2, dt=1s, 1e4 steps,
        // relative energy drift < 1e-4.
        let mut world = World::new();
        world.set_integrator(Integrator::Rk4);
        world
            .add_body(BodyBuilder::new("Earth").mass(crate::constants::EARTH_MASS).radius(crate::constants::EARTH_RADIUS))
            .unwrap();
        let r = crate::constants::MOON_DIST_TO_EARTH;
        let mu = G * crate::constants::EARTH_MASS;
        let v = (mu / r).sqrt();
        world
            .add_body(
                BodyBuilder::new("Moon")
                    .mass(crate::constants::MOON_MASS)
                    .radius(crate::constants::MOON_RADIUS)
                    .position(Vector3::new(r, 0.0, 0.0))
                    .velocity(Vector3::new(0.0, v, 0.0)),
            )
            .unwrap();

        // `gpe` is only populated by `recompute_gpe` inside `step`; a zero-length
        // step seeds it at the initial positions without advancing anything.
        world.step(0.0);
        let initial_energy = world.energy();
        for _ in 0..10_000 {
            world.step(1.0);
        }
        let final_energy = world.energy();

        let drift = (final_energy - initial_energy).abs() / initial_energy.abs();
        assert!(drift < 1e-4, "relative energy drift {} exceeded 1e-4", drift);
    }

    #[test]
    fn trail_samples_are_time_aligned_across_bodies() {
        // SS8 law: trail_a[k] and trail_b[k] correspond to the same sim
        // time for any k. Both bodies are non-contributing test particles
        // under Euler with no external force, so drift is exactly p = v*t;
        // recovering t_sim from each body's own trail sample and comparing
        // across bodies verifies alignment without a separate recorded-time
        // channel.
        let mut world = World::new();
        world.set_integrator(Integrator::Euler);
        world.set_storing_positions(true);
        world.set_trail_store_period(5.0);
        world.set_max_trail_samples(1000);

        let a = world
            .add_body(
                BodyBuilder::new("a")
                    .mass(1.0)
                    .contributes_to_gravity(false)
                    .position(Vector3::new(0.0, 0.0, 0.0))
                    .velocity(Vector3::new(2.0, 0.0, 0.0)),
            )
            .unwrap();
        let b = world
            .add_body(
                BodyBuilder::new("b")
                    .mass(1.0)
                    .contributes_to_gravity(false)
                    .position(Vector3::new(1000.0, 0.0, 0.0))
                    .velocity(Vector3::new(-3.0, 0.0, 0.0)),
            )
            .unwrap();

        for _ in 0..200 {
            world.step(1.0);
        }

        world.with_trail_snapshot(|bodies| {
            let trail_a = &bodies[a.0].trail;
            let trail_b = &bodies[b.0].trail;
            assert_eq!(trail_a.len(), trail_b.len());
            assert!(trail_a.len() > 1);
            for k in 0..trail_a.len() {
                let t_from_a = trail_a.get(k).unwrap().x / 2.0;
                let t_from_b = (trail_b.get(k).unwrap().x - 1000.0) / -3.0;
                assert!(
                    (t_from_a - t_from_b).abs() < 1e-9,
                    "trail[{}] misaligned: t_a={}, t_b={}",
                    k,
                    t_from_a,
                    t_from_b
                );
            }
        });
    }

    #[test]
    fn reference_resolution_normalizes_stale_selected_id() {
        let mut world = World::new();
        world.add_body(BodyBuilder::new("only")).unwrap();
        // Force an out-of-range selection the way a future remove_body would.
        world.selected_id = BodyId(99);
        world.step(1.0);
        assert_eq!(world.selected(), BodyId::SENTINEL);
    }
}
