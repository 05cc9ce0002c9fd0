//! Library surface of the `venusd` binary crate.
//!
//! Split out of `main.rs` so the integration test
//! (`tests/loop_sim.rs`) can drive the controller loop against the
//! in-memory [`sim_vehicle::SimVehicle`] and scripted
//! [`detector::SimDetector`] without a real MAVLink link, the same
//! way the teacher's per-transport readers (`cmd_uart`, `cmd_i2c`)
//! were plain `mod`s reachable from outside `main`.

pub mod cmd_run;
pub mod cmd_sim;
pub mod cmdline;
pub mod controller;
pub mod detector;
pub mod error;
pub mod logging;
pub mod mavlink_vehicle;
pub mod sim_vehicle;
