use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use showvisor::{command, CommandError, Commands, Executor, TimelineEvent};

fn sleeping_blocking(ms: u64) -> showvisor::BlockingCommand {
    command::blocking(move || {
        std::thread::sleep(Duration::from_millis(ms));
        Ok(())
    })
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn blocking_batch_runs_concurrently() {
    let exec = Executor::new(4);
    let cmds: Vec<_> = (0..4).map(|_| sleeping_blocking(150)).collect();

    let started = Instant::now();
    let results = exec.run_blocking_batch(&cmds).await;

    assert_eq!(results.len(), 4);
    assert!(results.iter().all(Result::is_ok));
    assert!(
        started.elapsed() < Duration::from_millis(450),
        "batch took {:?}",
        started.elapsed()
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn pool_bounds_concurrent_blocking_commands() {
    let exec = Executor::new(2);
    let current = Arc::new(AtomicUsize::new(0));
    let peak = Arc::new(AtomicUsize::new(0));

    let cmds: Vec<_> = (0..6)
        .map(|_| {
            let current = Arc::clone(&current);
            let peak = Arc::clone(&peak);
            command::blocking(move || {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(40));
                current.fetch_sub(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .collect();

    let results = exec.run_blocking_batch(&cmds).await;
    assert!(results.iter().all(Result::is_ok));
    assert!(peak.load(Ordering::SeqCst) <= 2, "peak {}", peak.load(Ordering::SeqCst));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_blocking_batch_is_awaited_together() {
    let exec = Executor::new(1);
    let cmds: Vec<_> = (0..3)
        .map(|_| {
            command::non_blocking(|| async {
                tokio::time::sleep(Duration::from_millis(150)).await;
                Ok(())
            })
        })
        .collect();

    let started = Instant::now();
    let results = exec.run_non_blocking_batch(&cmds).await;
    assert!(results.iter().all(Result::is_ok));
    assert!(started.elapsed() < Duration::from_millis(400));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn batch_failure_lists_only_failing_commands() {
    let exec = Executor::new(4);
    let ran = Arc::new(AtomicUsize::new(0));
    let ok = {
        let ran = Arc::clone(&ran);
        command::blocking(move || {
            ran.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    };
    let bad = command::blocking(|| Err(CommandError::fail("lamp 2 offline")));

    let event = TimelineEvent::batch(
        1.0,
        Commands::blocking_batch(vec![ok.clone(), bad, ok]),
        "wash",
    )
    .unwrap();

    let err = exec.execute(&event).await.unwrap_err();
    assert_eq!(err.description, "wash");
    assert_eq!(err.timestamp, 1.0);
    assert_eq!(err.total, 3);
    assert_eq!(err.failures.len(), 1);
    assert_eq!(err.failures[0].index, 1);
    assert_eq!(err.failures[0].error, CommandError::fail("lamp 2 offline"));
    // Siblings still ran to completion.
    assert_eq!(ran.load(Ordering::SeqCst), 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn panics_become_command_errors() {
    let exec = Executor::new(2);

    let err = exec
        .run_blocking(command::blocking(|| panic!("blocking boom")))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::Panicked {
            error: "blocking boom".into()
        }
    );

    fn explode() -> showvisor::CommandResult {
        panic!("async boom")
    }
    let err = exec
        .run_non_blocking(command::non_blocking(|| async { explode() }))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        CommandError::Panicked {
            error: "async boom".into()
        }
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn mixed_non_blocking_batch_collects_every_failure() {
    let exec = Executor::default();
    let event = TimelineEvent::new(
        0.0,
        Commands::non_blocking_batch(vec![
            command::non_blocking(|| async { Err(CommandError::fail("a")) }),
            command::non_blocking(|| async { Ok(()) }),
            command::non_blocking(|| async { Err(CommandError::fail("c")) }),
        ]),
        "trio",
    )
    .unwrap();

    let err = exec.execute(&event).await.unwrap_err();
    let indexes: Vec<usize> = err.failures.iter().map(|f| f.index).collect();
    assert_eq!(indexes, vec![0, 2]);
    assert_eq!(err.total, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_rejects_blocking_only() {
    let exec = Executor::new(2);
    assert!(!exec.is_shut_down());
    exec.shutdown();
    assert!(exec.is_shut_down());

    let err = exec
        .run_blocking(command::blocking(|| Ok(())))
        .await
        .unwrap_err();
    assert_eq!(err, CommandError::Rejected);

    let ok = exec
        .run_non_blocking(command::non_blocking(|| async { Ok(()) }))
        .await;
    assert!(ok.is_ok());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unlimited_pool() {
    let exec = Executor::new(0);
    assert_eq!(exec.max_workers(), 0);
    let cmds: Vec<_> = (0..8).map(|_| sleeping_blocking(10)).collect();
    assert!(exec.run_blocking_batch(&cmds).await.iter().all(Result::is_ok));
}
