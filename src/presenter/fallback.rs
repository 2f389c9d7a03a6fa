//! Surface chaining: use the first surface that can be shown.

use tracing::info;

use super::countdown::CountdownFrame;
use super::surface::{Surface, SurfaceError};
use super::terminal::TerminalSurface;
use super::window::WindowSurface;

/// The surface used by the real daemon: the shield window, or the terminal
/// when no window can be opened.
pub type PlatformSurface = FallbackSurface<WindowSurface, TerminalSurface>;

/// Builds the daemon's surface.
#[must_use]
pub fn platform_surface() -> PlatformSurface {
    FallbackSurface::new(WindowSurface::new(), TerminalSurface::new())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shown {
    Primary,
    Fallback,
}

/// Shows on `primary` when it can, otherwise on `fallback`.
///
/// The choice is made on every `show()`, so a window server that comes back
/// between sessions is picked up again.
#[derive(Debug)]
pub struct FallbackSurface<P, F> {
    primary: P,
    fallback: F,
    shown: Option<Shown>,
}

impl<P: Surface, F: Surface> FallbackSurface<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self {
            primary,
            fallback,
            shown: None,
        }
    }

    pub fn primary(&self) -> &P {
        &self.primary
    }

    pub fn fallback(&self) -> &F {
        &self.fallback
    }

    /// Returns true while the fallback surface is the one shown.
    #[must_use]
    pub fn is_on_fallback(&self) -> bool {
        self.shown == Some(Shown::Fallback)
    }
}

impl<P: Surface, F: Surface> Surface for FallbackSurface<P, F> {
    fn show(&mut self) -> Result<(), SurfaceError> {
        if self.shown.is_some() {
            return Ok(());
        }

        match self.primary.show() {
            Ok(()) => {
                self.shown = Some(Shown::Primary);
                Ok(())
            }
            Err(e) => {
                info!("Primary surface unavailable ({}), trying fallback", e);
                self.fallback.show()?;
                self.shown = Some(Shown::Fallback);
                Ok(())
            }
        }
    }

    fn render(&mut self, frame: &CountdownFrame) -> Result<(), SurfaceError> {
        match self.shown {
            Some(Shown::Primary) => self.primary.render(frame),
            Some(Shown::Fallback) => self.fallback.render(frame),
            None => Ok(()),
        }
    }

    fn hide(&mut self) -> Result<(), SurfaceError> {
        match self.shown.take() {
            Some(Shown::Primary) => self.primary.hide(),
            Some(Shown::Fallback) => self.fallback.hide(),
            None => Ok(()),
        }
    }
}
