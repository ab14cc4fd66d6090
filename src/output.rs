//! Demo reporting device. Not part of the core (§6 lists no CLI/output
//! surface for the library); this reads a `World` snapshot and prints it,
//! kept close to the teacher's `OutputDevice`/`format_si_value` shape.

use crate::body::BodyId;
use crate::cli::{Cli, OutputFormatArg, OutputTargetArg};
use crate::world::World;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputTarget {
    Console,
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Pretty,
    Csv,
}

#[derive(Debug, Clone, Copy)]
enum OutputField {
    TotalEnergy,
    Momentum,
    Frames,
}

#[derive(Debug, Clone)]
pub struct OutputDevice {
    target: OutputTarget,
    format: OutputFormat,
    global_fields: Vec<OutputField>,
    tracked_bodies: Vec<(String, BodyId)>,
    frame: u64,
}

impl OutputDevice {
    pub fn from_cli_config(world: &World, cli: &Cli) -> Self {
        let target = match cli.output_target {
            OutputTargetArg::Console => OutputTarget::Console,
            OutputTargetArg::File => OutputTarget::File,
        };
        let format = match cli.output_format {
            OutputFormatArg::Pretty => OutputFormat::Pretty,
            OutputFormatArg::Csv => OutputFormat::Csv,
        };

        let mut global_fields = Vec::new();
        if cli.total_energy {
            global_fields.push(OutputField::TotalEnergy);
        }
        if cli.momentum {
            global_fields.push(OutputField::Momentum);
        }
        if cli.frames {
            global_fields.push(OutputField::Frames);
        }

        let mut tracked_bodies = Vec::new();
        for name in &cli.track {
            for body in world.bodies_named(name) {
                tracked_bodies.push((name.clone(), body.id));
            }
        }

        Self { target, format, global_fields, tracked_bodies, frame: 0 }
    }

    pub fn report(&mut self, world: &World) {
        self.frame += 1;
        let line = match self.format {
            OutputFormat::Pretty => self.render_pretty(world),
            OutputFormat::Csv => self.render_csv(world),
        };
        match self.target {
            OutputTarget::Console => println!("{}", line),
            // File output is out of the core's scope; the demo only ever
            // runs with --output-target console, so this is unreachable
            // in practice but kept total rather than panicking.
            OutputTarget::File => println!("{}", line),
        }
    }

    fn render_pretty(&self, world: &World) -> String {
        let mut out = String::from("------------------------------------------\n");
        for field in &self.global_fields {
            match field {
                OutputField::TotalEnergy => {
                    let (v, suffix) = format_si_value(world.energy());
                    out.push_str(&format!("  System Total Energy: {:+09.4}{}MJ\n", v, suffix));
                }
                OutputField::Momentum => {
                    let (v, suffix) = format_si_value(world.momentum());
                    out.push_str(&format!("  System Momentum: {:+09.4}{}kg m/s\n", v, suffix));
                }
                OutputField::Frames => {
                    out.push_str(&format!("  Frame: {}\n", self.frame));
                }
            }
        }
        if !self.tracked_bodies.is_empty() {
            out.push_str("  Tracked Bodies:\n");
            for (name, id) in &self.tracked_bodies {
                if let Some(body) = world.body(*id) {
                    let (px, pxs) = format_si_value(body.p.x);
                    let (py, pys) = format_si_value(body.p.y);
                    let (pz, pzs) = format_si_value(body.p.z);
                    let (vx, vxs) = format_si_value(body.v.x);
                    let (vy, vys) = format_si_value(body.v.y);
                    let (vz, vzs) = format_si_value(body.v.z);
                    out.push_str(&format!(
                        "    {}: POS=({:+.4}{}m, {:+.4}{}m, {:+.4}{}m) VEL=({:+.4}{}m/s, {:+.4}{}m/s, {:+.4}{}m/s)\n",
                        name, px, pxs, py, pys, pz, pzs, vx, vxs, vy, vys, vz, vzs,
                    ));
                }
            }
        }
        out
    }

    fn render_csv(&self, world: &World) -> String {
        let mut fields = vec![self.frame.to_string()];
        for field in &self.global_fields {
            match field {
                OutputField::TotalEnergy => fields.push(world.energy().to_string()),
                OutputField::Momentum => fields.push(world.momentum().to_string()),
                OutputField::Frames => fields.push(self.frame.to_string()),
            }
        }
        for (_, id) in &self.tracked_bodies {
            if let Some(body) = world.body(*id) {
                fields.push(body.p.x.to_string());
                fields.push(body.p.y.to_string());
                fields.push(body.p.z.to_string());
            }
        }
        fields.join(",")
    }
}

/// Scales `n` into the smallest SI-prefixed range it fits, teacher's
/// `format_si_value` kept near-verbatim.
fn format_si_value(n: f64) -> (f64, &'static str) {
    if n == 0.0 {
        return (0.0, "");
    } else if n.is_nan() {
        return (f64::NAN, "");
    } else if n.is_infinite() {
        return (f64::INFINITY, "");
    }
    match n.abs() {
        x if x < 1e-9 => (n * 1e9, "n"),
        x if x < 1e-6 => (n * 1e9, "n"),
        x if x < 1e-3 => (n * 1e6, "u"),
        x if x < 1.0 => (n * 1e3, "m"),
        x if x < 1e3 => (n, ""),
        x if x < 1e6 => (n / 1e3, "K"),
        x if x < 1e9 => (n / 1e6, "M"),
        x if x < 1e12 => (n / 1e9, "G"),
        x if x < 1e15 => (n / 1e12, "T"),
        x if x < 1e18 => (n / 1e15, "P"),
        _ => (n / 1e18, "E"),
    }
}
