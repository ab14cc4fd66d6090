//! Spaceship autopilot and scheduled-burn logic (§4.2). A Spaceship is not a
//! separate struct from `Body` — it is `Body` carrying `BodyKind::Ship(ShipState)`
//! — so everything here operates on `&mut Body` plus the `ShipState` it holds.

use crate::body::Body;
use crate::constants::{
    AUTOPILOT_ERROR_COMPLETE_MPS, AUTOPILOT_KP, AUTOPILOT_RADIAL_GATE_MPS,
    AUTOPILOT_TIMEWARP_REQUEST_MPS,
};
use crate::vector3::Vector3;

/// A scheduled impulsive burn, active while `t_sim` is within
/// `[start_time_s, start_time_s + duration_s)`.
#[derive(Debug, Clone, Copy)]
pub struct Burn {
    pub direction_unit: Vector3,
    pub thrust_n: f64,
    pub start_time_s: f64,
    pub duration_s: f64,
}

impl Burn {
    pub fn is_active(&self, t_sim: f64) -> bool {
        t_sim >= self.start_time_s && t_sim < self.start_time_s + self.duration_s
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutopilotMode {
    Idle,
    AutoOrbit,
}

/// One-shot host-facing signals, polled via `World::consume_timewarp_request`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimewarpSignal {
    /// Radial velocity has settled below the threshold; the autopilot would
    /// like the host to drop to 1x timewarp so the burn isn't overshot.
    UnitWarp,
    /// Circularization has completed; the host may resume its prior timewarp.
    Resume,
}

#[derive(Debug, Clone)]
pub struct ShipState {
    pub burns: Vec<Burn>,
    pub autopilot: AutopilotMode,
    pub target_id: Option<crate::body::BodyId>,
    pub max_thrust_n: f64,
    request_unit_timewarp: bool,
    requested_already: bool,
    resume_timewarp: bool,
}

impl ShipState {
    pub fn new(max_thrust_n: f64) -> Self {
        Self {
            burns: Vec::new(),
            autopilot: AutopilotMode::Idle,
            target_id: None,
            max_thrust_n,
            request_unit_timewarp: false,
            requested_already: false,
            resume_timewarp: false,
        }
    }

    pub fn add_burn(&mut self, burn: Burn) {
        self.burns.push(burn);
    }

    pub fn begin_auto_orbit(&mut self, target_id: crate::body::BodyId) {
        self.target_id = Some(target_id);
        self.autopilot = AutopilotMode::AutoOrbit;
        self.requested_already = false;
        self.request_unit_timewarp = false;
    }

    /// Drains and returns whichever one-shot signal is currently pending, in
    /// priority order (a completion `Resume` always takes precedence over a
    /// stale `UnitWarp` from the same approach).
    pub fn consume_timewarp_request(&mut self) -> Option<TimewarpSignal> {
        if self.resume_timewarp {
            self.resume_timewarp = false;
            return Some(TimewarpSignal::Resume);
        }
        if self.request_unit_timewarp {
            self.request_unit_timewarp = false;
            return Some(TimewarpSignal::UnitWarp);
        }
        None
    }
}

/// A read-only snapshot of the autopilot target, taken before the ship body is
/// borrowed mutably (avoids borrowing two elements of the same `Vec<Body>` at
/// once).
#[derive(Debug, Clone, Copy)]
pub struct TargetSnapshot {
    pub p: Vector3,
    pub v: Vector3,
    pub mass: f64,
}

impl TargetSnapshot {
    pub fn from_body(body: &Body) -> Self {
        Self { p: body.p, v: body.v, mass: body.mass }
    }
}

/// Accumulates scheduled-burn and autopilot thrust into `ship.external_force`.
/// Called once per stage, before the force pass, exactly like any other
/// `pre_force` hook (§4.1); `external_force` itself is cleared once per
/// `World::step`, not per call.
pub fn pre_force(ship: &mut Body, state: &mut ShipState, target: Option<TargetSnapshot>, t_sim: f64, dt: f64) {
    apply_scheduled_burns(ship, state, t_sim);
    if state.autopilot == AutopilotMode::AutoOrbit {
        if let Some(target) = target {
            apply_auto_orbit(ship, state, target, dt);
        }
    }
}

fn apply_scheduled_burns(ship: &mut Body, state: &ShipState, t_sim: f64) {
    let mut thrust_sum = 0.0;
    let mut dir_sum = Vector3::zero();

    for burn in &state.burns {
        if burn.is_active(t_sim) {
            thrust_sum += burn.thrust_n;
            dir_sum += burn.direction_unit;
        }
    }

    if thrust_sum > 0.0 {
        let dir = dir_sum.normalize();
        ship.external_force += dir * thrust_sum.min(state.max_thrust_n);
    }
}

/// The auto-circularization controller (§4.2). `target` is a snapshot taken
/// before `ship` was borrowed mutably, so it reflects the target's state at
/// the start of this stage, not any update made within it.
fn apply_auto_orbit(ship: &mut Body, state: &mut ShipState, target: TargetSnapshot, dt: f64) {
    let r = ship.p - target.p;
    let r_mag = r.magnitude();
    if r_mag == 0.0 {
        return;
    }
    let r_hat = r * (1.0 / r_mag);

    let v_rel = ship.v - target.v;
    let v_rad = r_hat * v_rel.dot(&r_hat);
    let v_tan = v_rel - v_rad;

    let v_rad_mag = v_rad.magnitude();

    // Timewarp request runs unconditionally, before the radial gate, so the
    // [100, 150) m/s early-warning window still fires even while the gate
    // below would otherwise return first.
    if v_rad_mag < AUTOPILOT_TIMEWARP_REQUEST_MPS && !state.requested_already {
        state.request_unit_timewarp = true;
        state.requested_already = true;
    }

    // Radial gating: wait for apsis before thrusting.
    if v_rad_mag >= AUTOPILOT_RADIAL_GATE_MPS {
        return;
    }

    let mu_target = crate::constants::G * target.mass;
    let v_c = (mu_target / r_mag).sqrt();

    let v_tan_mag = v_tan.magnitude();
    if v_tan_mag == 0.0 {
        return;
    }
    let v_target = v_tan * (v_c / v_tan_mag);

    let error = v_rel - v_target;
    let error_mag = error.magnitude();

    if error_mag < AUTOPILOT_ERROR_COMPLETE_MPS {
        state.autopilot = AutopilotMode::Idle;
        state.resume_timewarp = true;
        state.request_unit_timewarp = false;
        return;
    }

    let thrust_mag = (AUTOPILOT_KP * error_mag).clamp(0.0, state.max_thrust_n);
    let thrust_dir = -(error.normalize());

    // Scale so the corrective delta-v this stage cannot overshoot the error.
    let desired_acc = thrust_mag / ship.mass;
    let overshoot_guard = if desired_acc * dt > 0.0 {
        (error_mag / (desired_acc * dt)).min(1.0)
    } else {
        1.0
    };

    ship.external_force += thrust_dir * (thrust_mag * overshoot_guard);
}
