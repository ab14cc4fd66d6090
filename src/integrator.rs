//! Fixed-step integrators (§4.3). Each operates on one Body and a scalar
//! `dt`; all three clamp `|v|` to the speed of light on exit.

use crate::body::Body;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Integrator {
    Euler,
    Verlet,
    Rk4,
}

impl Default for Integrator {
    fn default() -> Self {
        Integrator::Rk4
    }
}

/// Non-RK4 step: force strategy has already written `body.a` for this substep.
/// `Euler` advances position from the pre-step velocity, then updates
/// velocity; `Verlet` advances position with the usual half-`a dt^2` term.
/// Both zero `a` on exit so the next substep's force pass starts clean.
pub fn step(integrator: Integrator, body: &mut Body, dt: f64) {
    debug_assert!(integrator != Integrator::Rk4, "RK4 uses rk4_stage, not step");

    match integrator {
        Integrator::Euler => {
            body.p += body.v * dt;
            body.v += body.a * dt;
        }
        Integrator::Verlet => {
            body.p += body.v * dt + body.a * (0.5 * dt * dt);
            body.v += body.a * dt;
        }
        Integrator::Rk4 => unreachable!(),
    }

    if body.clamp_velocity_to_light_speed() {
        log::warn!("body {:?} velocity clamped to light speed", body.id);
    }
    body.a = crate::vector3::Vector3::zero();
}

/// One of the four RK4 stage updates (§4.3). The force strategy has already
/// written `body.a_stage[stage - 1]` for this stage before this is called.
pub fn rk4_stage(body: &mut Body, stage: u8, dt: f64) {
    match stage {
        1 => {
            body.p_stage[0] = body.p;
            body.p_stage[1] = body.p_stage[0] + body.v * dt + body.a_stage[0] * (0.5 * dt * dt);
        }
        2 => {
            let half = dt * 0.5;
            body.p_stage[2] = body.p_stage[0] + body.v * half + body.a_stage[1] * (0.5 * half * half);
        }
        3 => {
            let half = dt * 0.5;
            body.p_stage[3] = body.p_stage[0] + body.v * half + body.a_stage[2] * (0.5 * half * half);
        }
        4 => {
            let (a1, a2, a3, a4) = (body.a_stage[0], body.a_stage[1], body.a_stage[2], body.a_stage[3]);
            let a = (a1 + a3 * 2.0 + a4 * 2.0 + a2) * (1.0 / 6.0);
            body.p += body.v * dt + a * (0.5 * dt * dt);
            body.v += a * dt;
            if body.clamp_velocity_to_light_speed() {
                log::warn!("body {:?} velocity clamped to light speed", body.id);
            }
        }
        _ => unreachable!("RK4 stage must be in 1..=4, got {}", stage),
    }
}

/// Position to use for pairwise force evaluation at a given RK4 stage, or the
/// plain position for Euler/Verlet (stage 0).
pub fn stage_position(body: &Body, stage: u8) -> crate::vector3::Vector3 {
    match stage {
        0 => body.p,
        s @ 1..=4 => body.p_stage[(s - 1) as usize],
        _ => unreachable!(),
    }
}
