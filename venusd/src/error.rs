//! `venusd`'s own error type: wraps I/O and `venus` core errors behind
//! one `Result` alias — the shape `crate::error::Result` that the
//! teacher's `cmd_uart.rs`/`cmd_i2c.rs` already imported. MAVLink
//! errors are folded into [`venus::error::VenusError`] at the point
//! they occur in `mavlink_vehicle.rs`, since that module implements
//! [`venus::vehicle::VehiclePort`] and must return the trait's own
//! result type; they reach here only already wrapped as `Venus`.

/// Errors that can occur assembling or driving a `venusd` run, on top
/// of the core's own [`venus::error::VenusError`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Filesystem or transport I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A malformed scripted-detection file passed to `--script`.
    #[error("bad script at line {line}: {reason}")]
    BadScript {
        /// 1-based line number.
        line: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Propagated from the core.
    #[error(transparent)]
    Venus(#[from] venus::error::VenusError),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
