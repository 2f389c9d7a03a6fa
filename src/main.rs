//! FitBlock - enforced movement breaks for macOS
//!
//! Every so often the blocker takes over the screen, keyboard and mouse for
//! two minutes and shows a countdown, so you get up and train instead of
//! pushing on.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};

use fitblock::cli::{Cli, Commands, Display, IpcClient, OfflineStats, PathArgs, RunArgs};
use fitblock::config::{AppConfig, AppPaths};
use fitblock::daemon::{self, DaemonOptions};
use fitblock::privilege::{self, ElevationError, Elevator, Relaunch};
use fitblock::shortcuts::{preferences_path, read_hotkey_states};
use fitblock::store::StateStore;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if let Some(Commands::Completions { shell }) = cli.command {
        generate_completions(shell);
        return Ok(());
    }

    let paths = resolve_paths(&cli.paths)?;

    match cli.command {
        None => run(&paths, RunArgs::default(), cli.verbose).await?,
        Some(Commands::Run(args)) => run(&paths, args, cli.verbose).await?,
        Some(Commands::Start) => {
            let response = IpcClient::new(&paths.socket).start().await?;
            Display::show_success(&response);
        }
        Some(Commands::Pause) => {
            let client = IpcClient::new(&paths.socket);
            if client.is_daemon_running().await {
                Display::show_success(&client.pause().await?);
            } else {
                let changed = offline(&paths).pause()?;
                println!("✓ {}", if changed { "Sessions paused" } else { "Sessions were already paused" });
            }
        }
        Some(Commands::Resume) => {
            let client = IpcClient::new(&paths.socket);
            if client.is_daemon_running().await {
                Display::show_success(&client.resume().await?);
            } else {
                let changed = offline(&paths).resume()?;
                println!("✓ {}", if changed { "Sessions resumed" } else { "Sessions were not paused" });
            }
        }
        Some(Commands::Reset) => {
            let client = IpcClient::new(&paths.socket);
            if client.is_daemon_running().await {
                Display::show_success(&client.reset().await?);
            } else {
                offline(&paths).reset()?;
                println!("✓ Statistics reset");
            }
        }
        Some(Commands::Status) => {
            let client = IpcClient::new(&paths.socket);
            let running = client.is_daemon_running().await;
            let data = if running {
                client.status().await?.data.unwrap_or_default()
            } else {
                offline(&paths).status()?
            };
            Display::show_status(&data, running);
            show_hotkeys();
        }
        Some(Commands::Quit) => {
            let response = IpcClient::new(&paths.socket).quit().await?;
            Display::show_success(&response);
        }
        Some(Commands::Completions { .. }) => unreachable!("handled above"),
    }

    Ok(())
}

fn resolve_paths(overrides: &PathArgs) -> Result<AppPaths> {
    Ok(AppPaths::from_home()?.with_overrides(
        overrides.state_file.clone(),
        overrides.config.clone(),
        overrides.socket.clone(),
    ))
}

fn offline(paths: &AppPaths) -> OfflineStats {
    OfflineStats::new(StateStore::new(paths.state_file.clone()))
}

/// Runs the blocker, elevating first if needed.
async fn run(paths: &AppPaths, args: RunArgs, verbose: bool) -> Result<()> {
    let config = AppConfig::load_or_default(&paths.config_file);
    let trigger = args.trigger.unwrap_or(config.trigger);

    if !privilege::is_elevated() {
        if !args.no_elevate {
            let relaunch =
                Relaunch::for_current_exe(trigger, paths, privilege::invoking_uid(), verbose)?;
            let status = tokio::task::spawn_blocking(move || relaunch.run(Elevator::detect()))
                .await
                .context("Elevation task failed")?;

            match status {
                Ok(code) => std::process::exit(code),
                Err(e @ ElevationError::Refused) => {
                    Display::show_error(&format!("{} ({})", e, e.suggestion()));
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::warn!("Running without administrator privileges; input may not be blocked");
    }

    let owner_uid = args.owner_uid.or_else(sudo_uid);

    daemon::run_blocker(DaemonOptions {
        paths: paths.clone(),
        config,
        trigger,
        owner_uid,
    })
    .await
}

/// Uid of the user who ran `sudo fitblock` directly.
fn sudo_uid() -> Option<u32> {
    std::env::var("SUDO_UID").ok()?.parse().ok()
}

/// Prints the current state of the guarded system shortcuts.
fn show_hotkeys() {
    let Some(home) = dirs::home_dir() else {
        return;
    };
    match read_hotkey_states(&preferences_path(&home)) {
        Ok(states) => Display::show_hotkeys(&states),
        Err(e) => tracing::debug!("Could not read system shortcut states: {}", e),
    }
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
