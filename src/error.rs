//! Typed errors for the embedding API. `World::step` itself never fails: every
//! input state produces a valid next state, with `DegenerateGeometry` and
//! `NumericOverflow` handled in place and only logged (see `collision::resolve_pair`
//! and `integrator::{step, rk4_stage}`).

use thiserror::Error;

use crate::body::BodyId;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
pub enum SimError {
    #[error("invalid body: mass {mass} (must be > 0) or radius {radius} (must be >= 0)")]
    InvalidBody { mass: f64, radius: f64 },

    #[error("unknown body id {0:?}")]
    UnknownId(BodyId),

    #[error("body {0:?} is not a spaceship")]
    NotAShip(BodyId),

    #[error("worker pool shut down while a task for the current step was still pending")]
    SchedulerShutdown,
}
