//! Surfaces the countdown is drawn on.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use super::countdown::CountdownFrame;

/// Errors raised by a surface.
#[derive(Debug, Error)]
pub enum SurfaceError {
    /// No display is attached (e.g. stdout is not a terminal).
    #[error("Surface unavailable: {0}")]
    Unavailable(String),

    /// Terminal I/O failed.
    #[error("Surface I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A modal, full-screen place to draw the countdown.
pub trait Surface {
    /// Takes over the display.
    fn show(&mut self) -> Result<(), SurfaceError>;
    /// Draws one frame.
    fn render(&mut self, frame: &CountdownFrame) -> Result<(), SurfaceError>;
    /// Gives the display back. Safe to call when not shown.
    fn hide(&mut self) -> Result<(), SurfaceError>;
}

/// Surface that draws nothing; the countdown runs headless.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessSurface;

impl Surface for HeadlessSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn render(&mut self, _frame: &CountdownFrame) -> Result<(), SurfaceError> {
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        Ok(())
    }
}

/// What a [`RecordingSurface`] observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recording {
    pub shown: usize,
    pub hidden: usize,
    pub frames: Vec<CountdownFrame>,
}

/// Test surface that records every call.
///
/// Clones share the same recording, so a test can keep one clone while the
/// presenter owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    recording: Arc<Mutex<Recording>>,
    fail_show: bool,
}

impl RecordingSurface {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A surface whose `show()` always fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_show: true,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn recording(&self) -> Recording {
        self.recording.lock().unwrap().clone()
    }

    /// Remaining seconds of every rendered frame, in order.
    #[must_use]
    pub fn rendered_remaining(&self) -> Vec<u64> {
        self.recording
            .lock()
            .unwrap()
            .frames
            .iter()
            .map(|f| f.remaining_seconds)
            .collect()
    }
}

impl Surface for RecordingSurface {
    fn show(&mut self) -> Result<(), SurfaceError> {
        if self.fail_show {
            return Err(SurfaceError::Unavailable("no display".to_string()));
        }
        self.recording.lock().unwrap().shown += 1;
        Ok(())
    }

    fn render(&mut self, frame: &CountdownFrame) -> Result<(), SurfaceError> {
        self.recording.lock().unwrap().frames.push(frame.clone());
        Ok(())
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        self.recording.lock().unwrap().hidden += 1;
        Ok(())
    }
}
