//! Rigid-sphere collision/constraint pass (§4.7). Runs once per substep,
//! after integration, over every ordered pair `i < j` of the World's bodies.

use crate::body::Body;
use crate::constants::RESTITUTION;

/// Resolves overlap and exchanges impulse for every intersecting pair.
/// Mirrors `GravitySimulator::SolveDistanceConstraints` one-for-one: the
/// positional push uses mass-weighted shares of the (negative) overlap, and
/// the impulse uses a fixed restitution coefficient, skipping pairs that are
/// already separating.
pub fn resolve_pass(bodies: &mut [Body]) {
    let n = bodies.len();
    for i in 0..n {
        for j in (i + 1)..n {
            resolve_pair(bodies, i, j);
        }
    }
}

fn resolve_pair(bodies: &mut [Body], i: usize, j: usize) {
    let mut d = bodies[j].p - bodies[i].p;
    let mut dist = d.magnitude();

    if dist == 0.0 {
        log::warn!(
            "bodies {:?} and {:?} coincide exactly; perturbing apart before collision resolution",
            bodies[i].id,
            bodies[j].id,
        );
        bodies[i].p.y -= 1.0;
        bodies[j].p.y += 1.0;
        d = bodies[j].p - bodies[i].p;
        dist = d.magnitude();
    }

    let combined_radii = bodies[i].radius + bodies[j].radius;
    if dist >= combined_radii {
        return;
    }

    let n_hat = d * (1.0 / dist);
    let overlap = dist - combined_radii; // negative: penetration depth
    let (mi, mj) = (bodies[i].mass, bodies[j].mass);
    let total_mass = mi + mj;

    // overlap is negative, so these shares push the bodies apart.
    bodies[j].p -= n_hat * (overlap * (mi / total_mass));
    bodies[i].p += n_hat * (overlap * (mj / total_mass));

    let v_rel = bodies[j].v - bodies[i].v;
    let vel_along_normal = v_rel.dot(&n_hat);
    if vel_along_normal > 0.0 {
        return; // already separating
    }

    let impulse_mag = -(1.0 + RESTITUTION) * vel_along_normal / (1.0 / mi + 1.0 / mj);
    bodies[i].v -= n_hat * (impulse_mag / mi);
    bodies[j].v += n_hat * (impulse_mag / mj);

    if bodies[i].clamp_velocity_to_light_speed() {
        log::warn!("body {:?} velocity clamped to light speed after collision impulse", bodies[i].id);
    }
    if bodies[j].clamp_velocity_to_light_speed() {
        log::warn!("body {:?} velocity clamped to light speed after collision impulse", bodies[j].id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{BodyBuilder, BodyId};
    use crate::vector3::Vector3;

    fn head_on_pair() -> Vec<Body> {
        vec![
            BodyBuilder::new("a").mass(1.0).radius(0.5).position(Vector3::new(-1.0, 0.0, 0.0)).velocity(Vector3::new(1.0, 0.0, 0.0)).build(BodyId(0)),
            BodyBuilder::new("b").mass(1.0).radius(0.5).position(Vector3::new(1.0, 0.0, 0.0)).velocity(Vector3::new(-1.0, 0.0, 0.0)).build(BodyId(1)),
        ]
    }

    #[test]
    fn non_overlapping_bodies_are_untouched() {
        let mut bodies = vec![
            BodyBuilder::new("a").mass(1.0).radius(0.1).position(Vector3::new(0.0, 0.0, 0.0)).build(BodyId(0)),
            BodyBuilder::new("b").mass(1.0).radius(0.1).position(Vector3::new(10.0, 0.0, 0.0)).build(BodyId(1)),
        ];
        resolve_pass(&mut bodies);
        assert_eq!(bodies[0].p, Vector3::new(0.0, 0.0, 0.0));
        assert_eq!(bodies[1].p, Vector3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn overlapping_equal_masses_separate_and_bounce() {
        let mut bodies = vec![
            BodyBuilder::new("a").mass(1.0).radius(1.0).position(Vector3::new(-0.5, 0.0, 0.0)).velocity(Vector3::new(1.0, 0.0, 0.0)).build(BodyId(0)),
            BodyBuilder::new("b").mass(1.0).radius(1.0).position(Vector3::new(0.5, 0.0, 0.0)).velocity(Vector3::new(-1.0, 0.0, 0.0)).build(BodyId(1)),
        ];
        resolve_pass(&mut bodies);
        let dist = (bodies[1].p - bodies[0].p).magnitude();
        assert!(dist >= 2.0 - 1e-9, "bodies must no longer overlap, got separation {}", dist);
        assert!(bodies[0].v.x <= 0.0, "body a must bounce back, got vx={}", bodies[0].v.x);
        assert!(bodies[1].v.x >= 0.0, "body b must bounce back, got vx={}", bodies[1].v.x);
    }

    #[test]
    fn coincident_bodies_are_perturbed_before_resolution() {
        let mut bodies = vec![
            BodyBuilder::new("a").mass(1.0).radius(1.0).position(Vector3::zero()).build(BodyId(0)),
            BodyBuilder::new("b").mass(1.0).radius(1.0).position(Vector3::zero()).build(BodyId(1)),
        ];
        resolve_pass(&mut bodies);
        assert!(bodies[0].p != bodies[1].p);
    }

    #[test]
    fn separating_pair_still_gets_positional_push_but_no_impulse() {
        let mut bodies = head_on_pair();
        // Move them so they overlap but are already flying apart.
        bodies[0].p = Vector3::new(-0.2, 0.0, 0.0);
        bodies[1].p = Vector3::new(0.2, 0.0, 0.0);
        bodies[0].v = Vector3::new(-1.0, 0.0, 0.0);
        bodies[1].v = Vector3::new(1.0, 0.0, 0.0);
        resolve_pass(&mut bodies);
        assert_eq!(bodies[0].v, Vector3::new(-1.0, 0.0, 0.0));
        assert_eq!(bodies[1].v, Vector3::new(1.0, 0.0, 0.0));
    }
}
