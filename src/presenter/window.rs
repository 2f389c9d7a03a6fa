//! Full-screen shield window.
//!
//! On macOS the countdown is drawn in a borderless, opaque window at the
//! shielding window level, above every other window including the menu bar
//! and the Dock. While it is shown the application hides the Dock and menu
//! bar and disables process switching, so Cmd-Tab and force quit do nothing.
//!
//! AppKit objects may only be touched from the main thread. The daemon runs
//! its single-threaded runtime there; from any other thread `show()` fails
//! with [`SurfaceError::Unavailable`]. There is no `NSApplication` run loop:
//! every `render()` pumps the pending window server events, discarding key
//! events so nothing typed during the block leaks anywhere.

use super::countdown::CountdownFrame;
use super::surface::{Surface, SurfaceError};

pub use imp::WindowSurface;

#[cfg(target_os = "macos")]
mod imp {
    use objc2::rc::Retained;
    use objc2::{MainThreadMarker, MainThreadOnly};
    use objc2_app_kit::{
        NSApplication, NSApplicationActivationPolicy, NSApplicationPresentationOptions,
        NSBackingStoreType, NSColor, NSEventMask, NSEventType, NSFont, NSScreen, NSTextAlignment,
        NSTextField, NSWindow, NSWindowCollectionBehavior, NSWindowStyleMask,
    };
    use objc2_foundation::{NSDefaultRunLoopMode, NSPoint, NSRect, NSSize, NSString};
    use tracing::debug;

    use super::{CountdownFrame, Surface, SurfaceError};

    #[link(name = "CoreGraphics", kind = "framework")]
    extern "C" {
        fn CGShieldingWindowLevel() -> i32;
    }

    struct Shield {
        app: Retained<NSApplication>,
        window: Retained<NSWindow>,
        headline: Retained<NSTextField>,
        time: Retained<NSTextField>,
        info: Retained<NSTextField>,
    }

    /// Borderless shielding-level window covering the main screen.
    #[derive(Default)]
    pub struct WindowSurface {
        shield: Option<Shield>,
    }

    impl std::fmt::Debug for WindowSurface {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("WindowSurface")
                .field("shown", &self.shield.is_some())
                .finish()
        }
    }

    impl WindowSurface {
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Returns true if called on the main thread.
        #[must_use]
        pub fn is_available() -> bool {
            MainThreadMarker::new().is_some()
        }
    }

    /// # Safety
    ///
    /// Must run on the main thread, which `mtm` proves.
    unsafe fn label(
        text: &str,
        size: f64,
        color: &NSColor,
        frame: NSRect,
        mtm: MainThreadMarker,
    ) -> Retained<NSTextField> {
        let label = NSTextField::labelWithString(&NSString::from_str(text), mtm);
        label.setFont(Some(&NSFont::boldSystemFontOfSize(size)));
        label.setTextColor(Some(color));
        label.setAlignment(NSTextAlignment::Center);
        label.setFrame(frame);
        label
    }

    /// Opens the shield over the main screen.
    ///
    /// # Safety
    ///
    /// Must run on the main thread, which `mtm` proves.
    unsafe fn open(mtm: MainThreadMarker) -> Result<Shield, SurfaceError> {
        let screen = NSScreen::mainScreen(mtm)
            .ok_or_else(|| SurfaceError::Unavailable("no screen attached".to_string()))?;
        let bounds = screen.frame();

        let app = NSApplication::sharedApplication(mtm);
        app.setActivationPolicy(NSApplicationActivationPolicy::Accessory);
        app.finishLaunching();

        let window = NSWindow::initWithContentRect_styleMask_backing_defer(
            NSWindow::alloc(mtm),
            bounds,
            NSWindowStyleMask::Borderless,
            NSBackingStoreType::Buffered,
            false,
        );
        window.setReleasedWhenClosed(false);
        window.setLevel(CGShieldingWindowLevel() as isize);
        window.setOpaque(true);
        window.setBackgroundColor(Some(&NSColor::blackColor()));
        window.setHidesOnDeactivate(false);
        window.setIgnoresMouseEvents(false);
        window.setCollectionBehavior(
            NSWindowCollectionBehavior::CanJoinAllSpaces
                | NSWindowCollectionBehavior::Stationary
                | NSWindowCollectionBehavior::FullScreenAuxiliary,
        );

        let width = bounds.size.width;
        let middle = bounds.size.height / 2.0;
        let row =
            |y: f64, height: f64| NSRect::new(NSPoint::new(0.0, y), NSSize::new(width, height));

        let white = NSColor::whiteColor();
        let headline = label("", 48.0, &white, row(middle + 40.0, 64.0), mtm);
        let time = label("", 72.0, &white, row(middle - 70.0, 96.0), mtm);
        let info = label("", 18.0, &NSColor::grayColor(), row(40.0, 28.0), mtm);

        if let Some(content) = window.contentView() {
            content.addSubview(&headline);
            content.addSubview(&time);
            content.addSubview(&info);
        }

        app.setPresentationOptions(
            NSApplicationPresentationOptions::HideDock
                | NSApplicationPresentationOptions::HideMenuBar
                | NSApplicationPresentationOptions::DisableProcessSwitching
                | NSApplicationPresentationOptions::DisableForceQuit
                | NSApplicationPresentationOptions::DisableSessionTermination
                | NSApplicationPresentationOptions::DisableHideApplication,
        );
        window.makeKeyAndOrderFront(None);
        #[allow(deprecated)]
        app.activateIgnoringOtherApps(true);

        Ok(Shield {
            app,
            window,
            headline,
            time,
            info,
        })
    }

    /// Dispatches queued window server events, dropping keyboard input.
    ///
    /// # Safety
    ///
    /// Must run on the main thread.
    unsafe fn pump(app: &NSApplication) {
        while let Some(event) = app.nextEventMatchingMask_untilDate_inMode_dequeue(
            NSEventMask::Any,
            None,
            NSDefaultRunLoopMode,
            true,
        ) {
            let kind = event.r#type();
            if kind == NSEventType::KeyDown
                || kind == NSEventType::KeyUp
                || kind == NSEventType::FlagsChanged
            {
                continue;
            }
            app.sendEvent(&event);
        }
    }

    /// # Safety
    ///
    /// Must run on the main thread.
    unsafe fn draw(shield: &Shield, frame: &CountdownFrame) {
        pump(&shield.app);
        shield
            .headline
            .setStringValue(&NSString::from_str(CountdownFrame::HEADLINE));
        shield.time.setStringValue(&NSString::from_str(&frame.time_line()));
        shield.info.setStringValue(&NSString::from_str(&frame.info_line()));
        shield.window.displayIfNeeded();
    }

    /// # Safety
    ///
    /// Must run on the main thread.
    unsafe fn close(shield: Shield) {
        shield.window.orderOut(None);
        shield.window.close();
        shield
            .app
            .setPresentationOptions(NSApplicationPresentationOptions::Default);
        pump(&shield.app);
    }

    impl Surface for WindowSurface {
        fn show(&mut self) -> Result<(), SurfaceError> {
            if self.shield.is_some() {
                return Ok(());
            }
            let mtm = MainThreadMarker::new()
                .ok_or_else(|| SurfaceError::Unavailable("not on the main thread".to_string()))?;

            // SAFETY: `mtm` proves we are on the main thread
            let shield = unsafe { open(mtm)? };
            debug!("Shield window shown");
            self.shield = Some(shield);
            Ok(())
        }

        fn render(&mut self, frame: &CountdownFrame) -> Result<(), SurfaceError> {
            if let Some(shield) = self.shield.as_ref() {
                // SAFETY: a shield only exists after `show()` ran on the main thread,
                // and the surface is not `Send`
                unsafe { draw(shield, frame) };
            }
            Ok(())
        }

        fn hide(&mut self) -> Result<(), SurfaceError> {
            if let Some(shield) = self.shield.take() {
                // SAFETY: see `render`
                unsafe { close(shield) };
                debug!("Shield window hidden");
            }
            Ok(())
        }
    }

    impl Drop for WindowSurface {
        fn drop(&mut self) {
            let _ = self.hide();
        }
    }
}

#[cfg(not(target_os = "macos"))]
mod imp {
    use super::{CountdownFrame, Surface, SurfaceError};

    /// Window surface for platforms without a supported window server.
    #[derive(Debug, Default)]
    pub struct WindowSurface;

    impl WindowSurface {
        #[must_use]
        pub fn new() -> Self {
            Self
        }

        #[must_use]
        pub fn is_available() -> bool {
            false
        }
    }

    impl Surface for WindowSurface {
        fn show(&mut self) -> Result<(), SurfaceError> {
            Err(SurfaceError::Unavailable(
                "shield window is only supported on macOS".to_string(),
            ))
        }

        fn render(&mut self, _frame: &CountdownFrame) -> Result<(), SurfaceError> {
            Ok(())
        }

        fn hide(&mut self) -> Result<(), SurfaceError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_os = "macos"))]
    #[test]
    fn test_unavailable_off_macos() {
        let mut surface = WindowSurface::new();
        assert!(!WindowSurface::is_available());
        assert!(matches!(surface.show(), Err(SurfaceError::Unavailable(_))));
        assert!(surface.hide().is_ok());
    }

    #[test]
    fn test_not_shown_off_main_thread() {
        // Test threads are never the process main thread
        let result = std::thread::spawn(|| WindowSurface::new().show().is_err())
            .join()
            .unwrap();
        assert!(result);
    }
}
