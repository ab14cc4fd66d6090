//! Physical constants used by the core, plus the demo scenario's solar-system
//! bodies (kept from the original demo so `bin/main.rs` can build the same
//! Sol/Earth/Moon layout without magic numbers scattered through it).

/// Newtonian gravitational constant, m^3 kg^-1 s^-2. Bit-exact with the source.
pub const G: f64 = 6.67e-11;

/// Speed of light, m/s. Velocities are clamped to this magnitude everywhere.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Restitution coefficient used by the collision impulse response (§4.7).
pub const RESTITUTION: f64 = 0.5;

/// Autopilot proportional gain (§4.2).
pub const AUTOPILOT_KP: f64 = 0.5;

/// Autopilot radial-velocity gate: above this, wait for apsis before thrusting.
pub const AUTOPILOT_RADIAL_GATE_MPS: f64 = 100.0;

/// Autopilot one-shot timewarp-request threshold.
pub const AUTOPILOT_TIMEWARP_REQUEST_MPS: f64 = 150.0;

/// Autopilot completion threshold on velocity error magnitude.
pub const AUTOPILOT_ERROR_COMPLETE_MPS: f64 = 1.0;

/// Calendar rollover ratios: seconds/minute, minutes/hour, hours/day, days/year.
pub const SECONDS_PER_MINUTE: u64 = 60;
pub const MINUTES_PER_HOUR: u64 = 60;
pub const HOURS_PER_DAY: u64 = 24;
pub const DAYS_PER_YEAR: u64 = 365;

pub const SOL_GRAV_PARAM: f64 = 132712440018000000000.0;
pub const SOL_MASS: f64 = 1989000000000000000000000000000.0; // kg
pub const SOL_RADIUS: f64 = 696340000.0; // m

pub const EARTH_GRAV_PARAM: f64 = 398600441800000.0;
pub const EARTH_MASS: f64 = 5972000000000000000000000.0; // kg
pub const EARTH_RADIUS: f64 = 6371000.0;
pub const EARTH_DIST_TO_SOL: f64 = 149600000000.0; // m
pub const EARTH_SOL_ORBIT_VEL: f64 = 29780.0;
pub const EARTH_LEO_ORBIT_VEL: f64 = 7788.25;

pub const MOON_MASS: f64 = 7.349e22;
pub const MOON_RADIUS: f64 = 1.7375e6;
pub const MOON_DIST_TO_EARTH: f64 = 3.844e8;
