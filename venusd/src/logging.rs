//! Per-run log directory setup (SPEC_FULL.md §6.1), generalizing
//! `ubsniff::main`'s bare `env_logger::init()` into the original
//! `main.py`'s numbered-run-directory behavior.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Where a run's logs, and (in production mode) its video tape, land.
pub struct RunPaths {
    /// `<logs_dir>/<n>/venus.log`, or `None` in development mode.
    pub log_file: Option<PathBuf>,
    /// `<logs_dir>/<n>/camera.h265` unless overridden, or `None` in
    /// development mode with no explicit override.
    pub video_tape: Option<PathBuf>,
}

/// Picks `logs_dir/<n>`, `n` one past the highest existing numbered
/// subdirectory, and creates it.
fn next_run_dir(logs_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(logs_dir)?;
    let next = fs::read_dir(logs_dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter_map(|name| name.parse::<u32>().ok())
        .max()
        .map_or(0, |n| n + 1);
    let dir = logs_dir.join(next.to_string());
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Initializes logging and returns the paths chosen for this run.
///
/// In development mode, logs go to stdout and no video tape path is
/// created unless `video_tape_override` names one explicitly. In
/// production mode, a fresh numbered directory is created under
/// `logs_dir` holding `venus.log` and (unless overridden)
/// `camera.h265`.
pub fn init(dev: bool, logs_dir: &Path, video_tape_override: Option<PathBuf>) -> Result<RunPaths> {
    if dev {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .target(env_logger::Target::Stdout)
            .try_init()
            .ok();
        return Ok(RunPaths {
            log_file: None,
            video_tape: video_tape_override,
        });
    }

    let run_dir = next_run_dir(logs_dir)?;
    let log_path = run_dir.join("venus.log");
    let log_file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;

    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .try_init()
        .ok();

    let video_tape = Some(video_tape_override.unwrap_or_else(|| run_dir.join("camera.h265")));
    Ok(RunPaths {
        log_file: Some(log_path),
        video_tape,
    })
}
