//! Quartz event tap interceptor (macOS).
//!
//! The tap lives on a dedicated thread with its own run loop. The thread
//! reports whether the tap could be created, then pumps the run loop in short
//! slices until the handle asks it to stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use core_foundation::runloop::{kCFRunLoopCommonModes, kCFRunLoopDefaultMode, CFRunLoop};
use core_graphics::event::{
    CGEventTap, CGEventTapLocation, CGEventTapOptions, CGEventTapPlacement, CGEventType,
};
use crossbeam_channel::bounded;
use tracing::{debug, info, warn};

use super::{InputInterceptor, InterceptorError, InterceptorHandle};

/// Name of the event-tap thread.
pub const TAP_THREAD_NAME: &str = "fitblock-event-tap";

/// How long `install()` waits for the tap thread to report.
const READY_TIMEOUT: Duration = Duration::from_secs(2);

/// Length of one run-loop slice; bounds how long a stop request waits.
const RUN_SLICE: Duration = Duration::from_millis(100);

#[link(name = "ApplicationServices", kind = "framework")]
extern "C" {
    fn AXIsProcessTrusted() -> bool;
}

/// Returns true if the process has the Accessibility permission.
#[must_use]
pub fn accessibility_trusted() -> bool {
    unsafe { AXIsProcessTrusted() }
}

/// Events swallowed while the tap is installed.
fn intercepted_events() -> Vec<CGEventType> {
    vec![
        CGEventType::KeyDown,
        CGEventType::KeyUp,
        CGEventType::FlagsChanged,
        CGEventType::LeftMouseDown,
        CGEventType::LeftMouseUp,
        CGEventType::RightMouseDown,
        CGEventType::RightMouseUp,
        CGEventType::OtherMouseDown,
        CGEventType::OtherMouseUp,
        CGEventType::LeftMouseDragged,
        CGEventType::RightMouseDragged,
        CGEventType::OtherMouseDragged,
        CGEventType::MouseMoved,
        CGEventType::ScrollWheel,
    ]
}

/// Session-level event tap that consumes all keyboard and pointer input.
#[derive(Debug, Clone, Copy, Default)]
pub struct QuartzInterceptor;

impl QuartzInterceptor {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl InputInterceptor for QuartzInterceptor {
    /// Creating the tap fails unless the process runs as root or holds the
    /// Accessibility permission; that failure maps to `PermissionDenied`.
    fn install(&self) -> Result<InterceptorHandle, InterceptorError> {
        let stop = Arc::new(AtomicBool::new(false));
        let (ready_tx, ready_rx) = bounded::<Result<(), InterceptorError>>(1);

        let worker_stop = Arc::clone(&stop);
        let worker = thread::Builder::new()
            .name(TAP_THREAD_NAME.to_string())
            .spawn(move || run_tap(worker_stop, ready_tx))
            .map_err(|e| InterceptorError::WorkerFailed(e.to_string()))?;

        let ready = ready_rx
            .recv_timeout(READY_TIMEOUT)
            .map_err(|e| InterceptorError::WorkerFailed(e.to_string()))
            .and_then(|result| result);

        if let Err(e) = ready {
            stop.store(true, Ordering::SeqCst);
            let _ = worker.join();
            return Err(e);
        }

        info!("Input interceptor installed");
        Ok(InterceptorHandle::new(move || {
            stop.store(true, Ordering::SeqCst);
            if worker.join().is_err() {
                warn!("Event tap thread panicked");
            }
            info!("Input interceptor removed");
        }))
    }

    fn is_available(&self) -> bool {
        crate::privilege::is_elevated() || accessibility_trusted()
    }
}

fn run_tap(stop: Arc<AtomicBool>, ready: crossbeam_channel::Sender<Result<(), InterceptorError>>) {
    let tap = CGEventTap::new(
        CGEventTapLocation::Session,
        CGEventTapPlacement::HeadInsertEventTap,
        CGEventTapOptions::Default,
        intercepted_events(),
        |_proxy, event_type, event| match event_type {
            CGEventType::TapDisabledByTimeout | CGEventType::TapDisabledByUserInput => None,
            _ => {
                // A null event is dropped by the window server
                event.set_type(CGEventType::Null);
                Some(event.clone())
            }
        },
    );

    let tap = match tap {
        Ok(tap) => tap,
        Err(()) => {
            let _ = ready.send(Err(InterceptorError::PermissionDenied));
            return;
        }
    };

    let source = match tap.mach_port.create_runloop_source(0) {
        Ok(source) => source,
        Err(()) => {
            let _ = ready.send(Err(InterceptorError::WorkerFailed(
                "could not create run loop source".to_string(),
            )));
            return;
        }
    };

    let run_loop = CFRunLoop::get_current();
    unsafe {
        run_loop.add_source(&source, kCFRunLoopCommonModes);
    }
    tap.enable();

    if ready.send(Ok(())).is_err() {
        return;
    }

    while !stop.load(Ordering::SeqCst) {
        unsafe {
            CFRunLoop::run_in_mode(kCFRunLoopDefaultMode, RUN_SLICE, false);
        }
        // The system disables taps it considers unresponsive
        tap.enable();
    }

    unsafe {
        run_loop.remove_source(&source, kCFRunLoopCommonModes);
    }
    debug!("Event tap thread exiting");
}
