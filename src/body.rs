//! The massive (or massless test) point that all World state is built from,
//! plus the `BodyKind` tag that replaces the source's virtual `PreForceUpdate`.

use crate::spaceship::ShipState;
use crate::vector3::Vector3;

/// Stable integer id assigned on insertion into a World. Id 0 is always the
/// first body ever inserted and doubles as the default/sentinel reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyId(pub usize);

impl BodyId {
    pub const SENTINEL: BodyId = BodyId(0);
}

/// Bounded, time-ordered ring of past positions. Appends evict from the front
/// once `cap` is exceeded, so index 0 is always the oldest retained sample.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    samples: std::collections::VecDeque<Vector3>,
}

impl Trail {
    pub fn new() -> Self {
        Self { samples: std::collections::VecDeque::new() }
    }

    pub fn push(&mut self, p: Vector3, cap: usize) {
        self.samples.push_back(p);
        while self.samples.len() > cap {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vector3> {
        self.samples.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Vector3> {
        self.samples.get(index)
    }
}

/// Replaces the source's `PhysicsObject` / `Spaceship` virtual-dispatch pair:
/// a single tagged variant dispatched once per stage in `World::step`.
#[derive(Debug, Clone)]
pub enum BodyKind {
    Plain,
    Ship(ShipState),
}

impl Default for BodyKind {
    fn default() -> Self {
        BodyKind::Plain
    }
}

/// A massive, extended point. See `SPEC_FULL.md` §3 for the field table this
/// mirrors one-to-one.
#[derive(Debug, Clone)]
pub struct Body {
    pub id: BodyId,
    pub name: String,
    pub mass: f64,
    pub radius: f64,
    pub contributes_to_gravity: bool,

    pub p: Vector3,
    pub v: Vector3,
    pub a: Vector3,

    pub p_stage: [Vector3; 4],
    pub a_stage: [Vector3; 4],

    pub external_force: Vector3,
    pub reference_id: BodyId,
    pub trail: Trail,
    pub gpe: f64,

    pub kind: BodyKind,
}

impl Body {
    /// Standard gravitational parameter, mu = G * m.
    pub fn mu(&self) -> f64 {
        crate::constants::G * self.mass
    }

    pub fn kinetic_energy(&self) -> f64 {
        0.5 * self.mass * self.v.sqr_magnitude()
    }

    pub fn momentum(&self) -> Vector3 {
        self.v * self.mass
    }

    pub fn is_ship(&self) -> bool {
        matches!(self.kind, BodyKind::Ship(_))
    }

    pub fn store_current_position(&mut self, cap: usize) {
        self.trail.push(self.p, cap);
    }

    pub fn clamp_velocity_to_light_speed(&mut self) -> bool {
        clamp_to_speed_of_light(&mut self.v)
    }
}

/// Clamps `v` in place to at most `SPEED_OF_LIGHT`; returns whether it clamped
/// (callers use this to decide whether to log a `NumericOverflow` recovery).
pub fn clamp_to_speed_of_light(v: &mut Vector3) -> bool {
    let m = v.magnitude();
    if m > crate::constants::SPEED_OF_LIGHT {
        *v = v.normalize() * crate::constants::SPEED_OF_LIGHT;
        true
    } else {
        false
    }
}

/// Builder mirroring the teacher's `PhysicsBodyBuilder` ergonomics, adapted to
/// the Body/BodyId model. Validation (§7 `InvalidBody`) happens on `add`,
/// inside `World::add_body`, not here — the builder itself cannot fail.
pub struct BodyBuilder {
    pub(crate) name: String,
    pub(crate) mass: f64,
    pub(crate) radius: f64,
    pub(crate) p: Vector3,
    pub(crate) v: Vector3,
    pub(crate) contributes_to_gravity: bool,
    pub(crate) kind: BodyKind,
}

impl BodyBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            mass: 1.0,
            radius: 0.0,
            p: Vector3::zero(),
            v: Vector3::zero(),
            contributes_to_gravity: true,
            kind: BodyKind::Plain,
        }
    }

    pub fn mass(mut self, mass: f64) -> Self {
        self.mass = mass;
        self
    }

    pub fn radius(mut self, radius: f64) -> Self {
        self.radius = radius;
        self
    }

    pub fn position(mut self, p: Vector3) -> Self {
        self.p = p;
        self
    }

    pub fn velocity(mut self, v: Vector3) -> Self {
        self.v = v;
        self
    }

    pub fn contributes_to_gravity(mut self, yes: bool) -> Self {
        self.contributes_to_gravity = yes;
        self
    }

    pub fn as_ship(mut self, max_thrust_n: f64) -> Self {
        self.kind = BodyKind::Ship(ShipState::new(max_thrust_n));
        self
    }

    /// Builds a standalone `Body` with the given id, bypassing `World`'s
    /// `InvalidBody` validation (§7). `World::add_body` is the validating
    /// entry point for normal use; this exists for tests and benchmarks
    /// that want a bare `Vec<Body>` without a `World` around it.
    pub fn build(self, id: BodyId) -> Body {
        Body {
            id,
            name: self.name,
            mass: self.mass,
            radius: self.radius,
            contributes_to_gravity: self.contributes_to_gravity,
            p: self.p,
            v: self.v,
            a: Vector3::zero(),
            p_stage: [Vector3::zero(); 4],
            a_stage: [Vector3::zero(); 4],
            external_force: Vector3::zero(),
            reference_id: BodyId::SENTINEL,
            trail: Trail::new(),
            gpe: 0.0,
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trail_evicts_from_front() {
        let mut trail = Trail::new();
        for i in 0..10 {
            trail.push(Vector3::new(i as f64, 0.0, 0.0), 3);
        }
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.get(0), Some(&Vector3::new(7.0, 0.0, 0.0)));
    }

    #[test]
    fn clamp_leaves_subluminal_velocity_untouched() {
        let mut v = Vector3::new(100.0, 0.0, 0.0);
        assert!(!clamp_to_speed_of_light(&mut v));
        assert_eq!(v, Vector3::new(100.0, 0.0, 0.0));
    }

    #[test]
    fn clamp_rescales_superluminal_velocity() {
        let mut v = Vector3::new(crate::constants::SPEED_OF_LIGHT * 2.0, 0.0, 0.0);
        assert!(clamp_to_speed_of_light(&mut v));
        assert!((v.magnitude() - crate::constants::SPEED_OF_LIGHT).abs() < 1e-6);
    }

    #[test]
    fn builder_defaults_are_sane() {
        let b = BodyBuilder::new("test").mass(5.0).build(BodyId(3));
        assert_eq!(b.id, BodyId(3));
        assert_eq!(b.mass, 5.0);
        assert!(b.contributes_to_gravity);
        assert!(!b.is_ship());
    }
}
