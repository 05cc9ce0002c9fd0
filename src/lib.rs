#![deny(missing_docs)]

//! Pure landing-controller logic: geometry, the pad-detection
//! Conductor, and the four-stage state machine.
//!
//! Everything I/O-bound — the MAVLink link, the camera/detector
//! pipeline, the controller loop, logging and CLI setup — lives in
//! the `venusd` binary crate, which depends on this crate only
//! through [`vehicle::VehiclePort`] and [`detector::DetectorPort`].

pub mod conductor;
pub mod config;
pub mod detector;
pub mod error;
pub mod geometry;
pub mod state;
pub mod types;
pub mod vehicle;
