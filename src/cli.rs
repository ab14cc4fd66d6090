//! Command-line surface for the `gravsim` demo binary. The core itself has
//! no CLI (§6) — this only configures which scenario `bin/main.rs` builds
//! and how `OutputDevice` reports on it.

use clap::{Parser, ValueEnum};

use crate::force::ForceStrategy;
use crate::integrator::Integrator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Sol, Earth, and Moon on a stable orbit.
    SolarSystem,
    /// Two equal-mass bodies on a head-on collision course.
    Collision,
    /// A spaceship circularizing its orbit under `auto_orbit`.
    Autopilot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntegratorArg {
    Euler,
    Verlet,
    Rk4,
}

impl From<IntegratorArg> for Integrator {
    fn from(value: IntegratorArg) -> Self {
        match value {
            IntegratorArg::Euler => Integrator::Euler,
            IntegratorArg::Verlet => Integrator::Verlet,
            IntegratorArg::Rk4 => Integrator::Rk4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ForceStrategyArg {
    Serial,
    PerBodyThread,
    WorkerPool,
    Partitioned,
}

impl From<ForceStrategyArg> for ForceStrategy {
    fn from(value: ForceStrategyArg) -> Self {
        match value {
            ForceStrategyArg::Serial => ForceStrategy::Serial,
            ForceStrategyArg::PerBodyThread => ForceStrategy::PerBodyThread,
            ForceStrategyArg::WorkerPool => ForceStrategy::WorkerPool,
            ForceStrategyArg::Partitioned => ForceStrategy::Partitioned,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputTargetArg {
    Console,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormatArg {
    Pretty,
    Csv,
}

/// A deterministic, pluggable-integrator N-body gravitational simulator.
#[derive(Debug, Parser)]
#[command(name = "gravsim", version, author)]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = Scenario::SolarSystem)]
    pub scenario: Scenario,

    #[arg(long, value_enum, default_value_t = IntegratorArg::Rk4)]
    pub integrator: IntegratorArg,

    #[arg(long = "force-strategy", value_enum, default_value_t = ForceStrategyArg::Serial)]
    pub force_strategy: ForceStrategyArg,

    #[arg(long, default_value_t = 1)]
    pub substeps: u32,

    #[arg(long = "time-warp", default_value_t = 1.0)]
    pub time_warp: f64,

    /// Simulated seconds to run before exiting.
    #[arg(long, default_value_t = 3600.0)]
    pub duration: f64,

    #[arg(long = "output-target", value_enum, default_value_t = OutputTargetArg::Console)]
    pub output_target: OutputTargetArg,

    #[arg(long = "output-format", value_enum, default_value_t = OutputFormatArg::Pretty)]
    pub output_format: OutputFormatArg,

    /// Report cadence, in simulated steps.
    #[arg(long = "report-every", default_value_t = 100)]
    pub report_every: u32,

    #[arg(long = "total-energy")]
    pub total_energy: bool,

    #[arg(long)]
    pub momentum: bool,

    #[arg(long)]
    pub frames: bool,

    /// Body names to report position/velocity for on each report.
    #[arg(long)]
    pub track: Vec<String>,
}

pub fn parse_command_line() -> Cli {
    Cli::parse()
}
