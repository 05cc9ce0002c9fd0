//! Development/test stand-in for the detector port (SPEC_FULL.md
//! §4.8). The real detector (DepthAI OAK camera + YOLO blob) is an
//! external accelerator outside this repo's scope (spec.md §1); this
//! is the only `DetectorPort` implementation this crate ships.

use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::Path;

use venus::detector::DetectorPort;
use venus::error::{Result as VenusResult, VenusError};
use venus::types::{PadType, PixelCoords, PixelDetection};

use crate::error::{Error, Result};

/// Feeds a pre-scripted sequence of detection batches, one per
/// `tick()` call — past the end of the script, every tick reports no
/// fresh frame. Records `updateVideoTape` calls without touching real
/// camera hardware.
pub struct SimDetector {
    frames: VecDeque<Option<Vec<PixelDetection>>>,
    video_tape: Option<fs::File>,
}

impl SimDetector {
    /// Builds a SimDetector from a parsed frame script, optionally
    /// recording a fake video tape to `video_tape_path`.
    pub fn new(frames: Vec<Option<Vec<PixelDetection>>>, video_tape_path: Option<&Path>) -> Result<Self> {
        let video_tape = video_tape_path
            .map(|p| fs::OpenOptions::new().create(true).append(true).open(p))
            .transpose()?;
        Ok(Self {
            frames: frames.into(),
            video_tape,
        })
    }

    /// A SimDetector that never has a fresh frame, for `venusd run`
    /// when no `--script` is given — the real accelerator isn't
    /// wired up yet, but the loop still needs a `DetectorPort`.
    pub fn empty(video_tape_path: Option<&Path>) -> Result<Self> {
        Self::new(Vec::new(), video_tape_path)
    }
}

impl DetectorPort for SimDetector {
    fn tick(&mut self) -> VenusResult<Option<Vec<PixelDetection>>> {
        Ok(self.frames.pop_front().unwrap_or(None))
    }

    fn update_video_tape(&mut self) -> VenusResult<()> {
        if let Some(file) = &mut self.video_tape {
            file.flush().map_err(|e| VenusError::TransientSensor(e.to_string()))?;
        }
        Ok(())
    }
}

/// Parses a scripted detection file: one line per tick, either the
/// literal `none` or `;`-separated `padType:x:y:confidence` entries.
/// Blank lines and `#`-prefixed comments are skipped.
pub fn parse_script(path: &Path) -> Result<Vec<Option<Vec<PixelDetection>>>> {
    let text = fs::read_to_string(path)?;
    let mut frames = Vec::new();
    for (i, raw_line) in text.lines().enumerate() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.eq_ignore_ascii_case("none") {
            frames.push(None);
            continue;
        }
        let mut batch = Vec::new();
        for entry in line.split(';') {
            batch.push(parse_detection(entry, i + 1)?);
        }
        frames.push(Some(batch));
    }
    Ok(frames)
}

fn parse_detection(entry: &str, line: usize) -> Result<PixelDetection> {
    let bad = |reason: &str| Error::BadScript {
        line,
        reason: reason.to_string(),
    };
    let parts: Vec<&str> = entry.split(':').collect();
    if parts.len() != 4 {
        return Err(bad("expected padType:x:y:confidence"));
    }
    let pad_type = parse_pad_type(parts[0]).ok_or_else(|| bad("unknown pad type"))?;
    let x: f64 = parts[1].parse().map_err(|_| bad("x is not a float"))?;
    let y: f64 = parts[2].parse().map_err(|_| bad("y is not a float"))?;
    let confidence: f64 = parts[3].parse().map_err(|_| bad("confidence is not a float"))?;
    Ok(PixelDetection {
        pad_type,
        center: PixelCoords::new(x, y),
        confidence,
    })
}

fn parse_pad_type(s: &str) -> Option<PadType> {
    Some(match s {
        "bottleDropoff" => PadType::BottleDropoff,
        "bottlePickup" => PadType::BottlePickup,
        "medkitDropoff" => PadType::MedkitDropoff,
        "medkitPickup" => PadType::MedkitPickup,
        "smoresDropoff" => PadType::SmoresDropoff,
        "smoresPickup" => PadType::SmoresPickup,
        "padCenter" => PadType::PadCenter,
        _ => return None,
    })
}
