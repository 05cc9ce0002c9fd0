//! The error taxonomy at the core boundary.
//!
//! No exception may escape a stage `tick()` or a port call: every
//! fallible operation in this crate returns a [`VenusError`] instead.

use std::fmt;

/// Errors produced at the core's boundary with its two external
/// collaborators (the vehicle link and the detector).
#[derive(Debug, thiserror::Error)]
pub enum VenusError {
    /// Camera queue fault, malformed detection payload, or video-sink
    /// write error. Logged and counted; the loop continues.
    #[error("transient sensor fault: {0}")]
    TransientSensor(String),

    /// Failed mission download or failed command send to the vehicle
    /// link. Logged and counted; the loop continues.
    #[error("transient link fault: {0}")]
    TransientLink(String),

    /// An uncaught failure inside a stage's `tick()`.
    #[error("error in {stage} stage: {source}")]
    StateTick {
        /// Name of the stage that raised the error (for logging, matches
        /// `State::name()`).
        stage: &'static str,
        /// The underlying cause.
        #[source]
        source: Box<VenusError>,
    },

    /// The rolling failure counter reached `MAX_FAILURES`.
    #[error("failure budget exceeded")]
    BudgetExceeded,

    /// The detector port failed to initialize. Fatal at cold start.
    #[error("detector failed to initialize: {0}")]
    ColdStartFatal(String),
}

impl VenusError {
    /// Wraps `self` as having occurred while ticking `stage`.
    pub fn in_stage(self, stage: &'static str) -> Self {
        VenusError::StateTick {
            stage,
            source: Box::new(self),
        }
    }

    /// True if this error should increment the loop's failure counter.
    ///
    /// `ColdStartFatal` never reaches the loop (it aborts before the
    /// loop starts) and `BudgetExceeded` is the result of the counter,
    /// not a contributor to it.
    pub fn counts_as_failure(&self) -> bool {
        !matches!(self, VenusError::BudgetExceeded | VenusError::ColdStartFatal(_))
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, VenusError>;

impl fmt::Display for crate::types::PadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use crate::types::PadType::*;
        let s = match self {
            BottleDropoff => "bottle dropoff",
            BottlePickup => "bottle pickup",
            MedkitDropoff => "medkit dropoff",
            MedkitPickup => "medkit pickup",
            SmoresDropoff => "smores dropoff",
            SmoresPickup => "smores pickup",
            PadCenter => "pad center",
        };
        write!(f, "{s}")
    }
}
