//! CLI surface (SPEC_FULL.md §6.4): generalizes `ubsniff::cmdline::Cmdline`
//! (a subcommand per transport) into one subcommand for a live
//! MAVLink link and one for a fully in-memory simulation.

use std::path::PathBuf;
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt(name = "venusd", about = "Autonomous precision-landing controller")]
pub enum Cmdline {
    /// Fly the landing controller against a real MAVLink link.
    Run {
        /// MAVLink connection string, e.g.
        /// `serial:/dev/ttyAMA1:115200` or `udpin:127.0.0.1:14550`.
        /// Defaults to the serial UART, or the SITL UDP endpoint
        /// under `--dev`.
        #[structopt(long)]
        connection: Option<String>,

        /// Development mode: default to the SITL UDP endpoint and
        /// log to stdout instead of a numbered run directory.
        #[structopt(long)]
        dev: bool,

        /// Directory under which each run gets a numbered
        /// subdirectory holding `venus.log` and `camera.h265`.
        #[structopt(long, default_value = "/home/pi/flight_logs/")]
        logs_dir: PathBuf,

        /// Where to record H.265 video tape, overriding the default
        /// `<run dir>/camera.h265`. Ignored in `--dev`.
        #[structopt(long)]
        video_tape: Option<PathBuf>,

        /// Scripted detection feed, since the real neural detector is
        /// an external-accelerator concern outside this repo's scope
        /// (spec.md §1). With no script the detector reports no
        /// fresh frame, forever.
        #[structopt(long)]
        script: Option<PathBuf>,
    },

    /// Drive the state machine against a scripted detector and an
    /// in-memory vehicle fake — no hardware required.
    Sim {
        /// Scripted detection feed; one line per tick.
        #[structopt(long)]
        script: PathBuf,
    },
}
