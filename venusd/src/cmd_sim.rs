//! `venusd sim` subcommand (SPEC_FULL.md §6.4): drives the landing
//! state machine against a scripted detector and the in-memory
//! [`crate::sim_vehicle::SimVehicle`] fake — no hardware, no MAVLink
//! link, for local development and manual smoke-testing of scripted
//! detection sequences.

use std::path::PathBuf;

use venus::config::Config;

use crate::detector::{parse_script, SimDetector};
use crate::error::Result;
use crate::sim_vehicle::SimVehicle;

/// `z` parameter of the synthetic GUIDED_ENABLE item the simulated
/// vehicle starts having just reached — bottlePickup, the same
/// fallback Descent uses when no pad type is specified (spec.md §9).
const DEFAULT_REQUESTED_PAD: i32 = 1;
/// Starting altitude above home, meters, comfortably above
/// `MIN_ALT_FOR_FLIGHT` so `Idle` activates on the first tick.
const START_ALT_M: f64 = 10.0;

/// Runs the `sim` subcommand against `script`.
pub fn run(script: PathBuf) -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Stdout)
        .try_init()
        .ok();

    let frames = parse_script(&script)?;
    let detector = SimDetector::new(frames, None)?;
    let vehicle = SimVehicle::new(DEFAULT_REQUESTED_PAD, START_ALT_M);

    crate::controller::run(Box::new(vehicle), Box::new(detector), &Config::default())
}
