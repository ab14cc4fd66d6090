//! `gravsim`: a deterministic, pluggable-integrator N-body gravitational
//! simulator. See `World` for the embedding API; `bin/main.rs` is a demo
//! host built on top of it.

pub mod body;
pub mod cli;
pub mod collision;
pub mod constants;
pub mod error;
pub mod force;
pub mod integrator;
pub mod output;
pub mod spaceship;
pub mod vector3;
pub mod world;
