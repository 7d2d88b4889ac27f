//! # Demo: rotation
//!
//! Two small shows played back to back under a single-instance lock, with every
//! lifecycle event rendered by the built-in [`LogWriter`].
//!
//! Demonstrates how to:
//! - Build shows from blocking and non-blocking commands.
//! - Attach lifecycle hooks that share a caller context.
//! - Subscribe to run events.
//! - Guard the process with a [`ProcessLock`].
//!
//! ## Flow
//! ```text
//! ProcessLock::guard()
//!   └─► Manager::run_rotation(["opening", "finale"])
//!         ├─► opening: pre_show → cues → post_show
//!         └─► finale:  pre_show → cues (one fails) → on_error → post_show
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example rotation --features logging
//! ```
//! Press Ctrl-C to interrupt the running show; post-show still runs.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use showvisor::{
    command, CommandError, ErrorCall, EventCall, Hook, Hooks, LogWriter, Manager, ManagerConfig,
    ProcessLock, Show, ShowCall, Subscribe,
};
use tracing_subscriber::EnvFilter;

/// Shared state handed to every hook.
#[derive(Default)]
struct Stage {
    cues: AtomicU32,
}

fn opening() -> Result<Show, showvisor::ShowError> {
    let mut show = Show::new("opening", 1.5)?
        .with_description("house lights down, music up")
        .with_metadata("venue", "hall a");

    show.add_blocking(0.0, command::blocking(|| {
        println!("[opening] house lights down");
        Ok(())
    }), "house-lights")?
    .add_non_blocking_batch(
        0.5,
        vec![
            command::non_blocking(|| async {
                println!("[opening] music fade-in");
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(())
            }),
            command::non_blocking(|| async {
                println!("[opening] spot on stage");
                Ok(())
            }),
        ],
        "music-and-spot",
    )?
    .add_blocking(1.5, command::blocking(|| {
        std::thread::sleep(Duration::from_millis(100));
        println!("[opening] curtain up");
        Ok(())
    }), "curtain")?;
    Ok(show)
}

fn finale() -> Result<Show, showvisor::ShowError> {
    let mut show = Show::new("finale", 1.0)?;
    show.add_blocking_events([
        (0.0, command::blocking(|| {
            println!("[finale] strobes");
            Ok(())
        }), "strobes"),
        (0.5, command::blocking(|| Err(CommandError::fail("fog machine out of fluid"))), "fog"),
        (1.0, command::blocking(|| {
            println!("[finale] blackout");
            Ok(())
        }), "blackout"),
    ])?;
    Ok(show)
}

fn hooks() -> Hooks<Stage> {
    Hooks::new()
        .with_pre_show(Hook::blocking(|call: ShowCall<Stage>| {
            println!("== {} ==", call.show);
            Ok(())
        }))
        .with_on_event(Hook::non_blocking(|call: EventCall<Stage>| async move {
            call.context.cues.fetch_add(1, Ordering::Relaxed);
            Ok(())
        }))
        .with_on_error(Hook::blocking(|call: ErrorCall<Stage>| {
            eprintln!("[{}] {}", call.show.name(), call.error);
            Ok(())
        }))
        .with_post_show(Hook::blocking(|call: ShowCall<Stage>| {
            println!(
                "== {} done, {} cue(s) so far ==",
                call.show.name(),
                call.context.cues.load(Ordering::Relaxed)
            );
            Ok(())
        }))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let _lock = ProcessLock::new("showvisor-rotation-demo").guard()?;

    let cfg = ManagerConfig {
        max_workers: 4,
        time_precision: Duration::from_millis(20),
        ..ManagerConfig::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];

    let manager = Manager::builder(cfg)
        .with_shows([opening()?, finale()?])
        .with_hooks(hooks())
        .with_subscribers(subs)
        .build();

    let report = manager
        .run_rotation(["opening", "finale"], false, Stage::default())
        .await?;
    println!(
        "rotation {}: {} run(s), {} fired, {} failed",
        report.outcome.as_label(),
        report.runs,
        report.events_fired,
        report.events_failed
    );

    manager.shutdown().await;
    Ok(())
}
