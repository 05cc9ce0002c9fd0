//! Detector port: abstracts the camera + neural net (spec.md §4.5).
//!
//! Construction, configuration, and the real DepthAI/YOLO pipeline are
//! external-collaborator concerns out of this crate's scope (spec.md
//! §1); `venus` depends only on this trait. `venusd` ships the real
//! implementation plus a scripted `SimDetector` for development.

use crate::error::Result;
use crate::types::PixelDetection;

/// Abstracts the camera + neural net.
///
/// `tick()` must never block: "no fresh frame" is `Ok(None)`, not a
/// stall (spec.md §5).
pub trait DetectorPort {
    /// Returns the latest batch of detections, or `None` if no fresh
    /// frame is available yet. Labels outside the valid `PadType`
    /// range are already filtered out by the time they reach here.
    fn tick(&mut self) -> Result<Option<Vec<PixelDetection>>>;

    /// Drains the video encoder queue and appends bytes to the video
    /// tape sink, if one was configured. A no-op if no sink exists.
    fn update_video_tape(&mut self) -> Result<()>;
}
