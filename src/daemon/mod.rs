//! The blocker daemon.
//!
//! Hosts one [`SessionController`] on a single-threaded runtime and wires it
//! to its triggers: the [`Scheduler`], the IPC socket, and process signals.

pub mod ipc;
pub mod scheduler;

use std::rc::Rc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::{mpsc, watch};
use tokio::task::LocalSet;

use crate::config::{AppConfig, AppPaths, TriggerStrategy};
use crate::interceptor::{InputInterceptor, PlatformInterceptor};
use crate::notification::{Notifier, SystemNotifier};
use crate::presenter::{platform_surface, CountdownPresenter, PlatformSurface, Surface};
use crate::session::SessionController;
use crate::shortcuts::{ShortcutGuard, SymbolicHotkeyGuard};
use crate::store::StateStore;

pub use ipc::{IpcError, IpcServer, RequestHandler};
pub use scheduler::Scheduler;

/// How long a shutdown waits for the running session before warning.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Controller type built from the real system collaborators.
pub type PlatformController =
    SessionController<SymbolicHotkeyGuard, PlatformInterceptor, SystemNotifier, PlatformSurface>;

/// Everything the daemon needs to know at launch.
#[derive(Debug, Clone)]
pub struct DaemonOptions {
    pub paths: AppPaths,
    pub config: AppConfig,
    pub trigger: TriggerStrategy,
    /// Uid of the user the elevated daemon works for
    pub owner_uid: Option<u32>,
}

/// Builds a controller over the real system collaborators.
pub fn build_controller(options: &DaemonOptions) -> PlatformController {
    let store = StateStore::new(options.paths.state_file.clone()).with_owner(options.owner_uid);
    let guard = SymbolicHotkeyGuard::new().run_as(options.owner_uid);
    let notifier = SystemNotifier::detect().enabled(options.config.notifications);
    let presenter = CountdownPresenter::new(platform_surface())
        .with_progress_interval(options.config.progress_interval());

    SessionController::new(
        guard,
        PlatformInterceptor::default(),
        notifier,
        presenter,
        store,
    )
}

/// Runs the blocker until its trigger strategy is exhausted or it is told
/// to stop.
pub async fn run_blocker(options: DaemonOptions) -> Result<()> {
    let controller = Rc::new(build_controller(&options));

    if !controller.interceptor().is_available() {
        tracing::warn!("Input interception is unavailable; sessions will only cover the screen");
    }

    let server = IpcServer::new(&options.paths.socket)?;
    if let Some(uid) = options.owner_uid {
        if let Err(e) = server.set_owner(uid) {
            tracing::warn!("{:#}", e);
        }
    }

    let scheduler = Scheduler::new(options.trigger, options.config.schedule_interval());
    tracing::info!(
        "Blocker running with trigger '{}', listening on {:?}",
        options.trigger,
        server.socket_path()
    );

    LocalSet::new()
        .run_until(serve(controller, server, scheduler))
        .await
}

/// Drives a controller with the given server and scheduler.
///
/// Must run inside a [`LocalSet`]. Returns once the scheduler finishes on
/// its own, or after a SIGINT, SIGTERM or IPC `quit` has interrupted and
/// torn down any running session.
pub async fn serve<G, I, N, S>(
    controller: Rc<SessionController<G, I, N, S>>,
    server: IpcServer,
    scheduler: Scheduler,
) -> Result<()>
where
    G: ShortcutGuard + 'static,
    I: InputInterceptor + 'static,
    N: Notifier + 'static,
    S: Surface + 'static,
{
    if controller.recover_interrupted_session().await {
        tracing::info!("Recovered from an unfinished session");
    }

    let mut sigint = signal(SignalKind::interrupt()).context("Failed to install SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

    let (start_tx, start_rx) = mpsc::channel(1);
    let (quit_tx, mut quit_rx) = mpsc::channel(1);
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let handler = Rc::new(RequestHandler::new(Rc::clone(&controller), start_tx, quit_tx));
    let ipc_task = tokio::task::spawn_local(accept_loop(server, handler));

    let sessions = scheduler.run(&controller, start_rx, shutdown_rx);
    tokio::pin!(sessions);

    let reason = tokio::select! {
        count = &mut sessions => {
            tracing::info!("All scheduled work done ({} session(s))", count);
            ipc_task.abort();
            return Ok(());
        }
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
        Some(()) = quit_rx.recv() => "quit request",
    };

    tracing::info!("Received {}, shutting down", reason);
    shutdown_tx.send_replace(true);
    controller.interrupt();

    // A session caught in setup finishes it before teardown can restore the
    // system, so the session future is driven to completion, never dropped
    let unwind = async { tokio::join!(controller.teardown(), &mut sessions) };
    tokio::pin!(unwind);
    if tokio::time::timeout(SHUTDOWN_GRACE, &mut unwind)
        .await
        .is_err()
    {
        tracing::warn!(
            "Session still unwinding after {:?}, waiting for it to restore the system",
            SHUTDOWN_GRACE
        );
        unwind.await;
    }

    ipc_task.abort();
    Ok(())
}

async fn accept_loop<G, I, N, S>(server: IpcServer, handler: Rc<RequestHandler<G, I, N, S>>)
where
    G: ShortcutGuard + 'static,
    I: InputInterceptor + 'static,
    N: Notifier + 'static,
    S: Surface + 'static,
{
    loop {
        match server.accept().await {
            Ok(stream) => {
                let handler = Rc::clone(&handler);
                tokio::task::spawn_local(async move {
                    handler.serve(stream).await;
                });
            }
            Err(e) => {
                tracing::warn!("{:#}", e);
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        }
    }
}
