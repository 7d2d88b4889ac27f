use std::fs;
use std::process::{Command, Stdio};

use showvisor::{LockError, ProcessLock};

fn write_record(lock: &ProcessLock, contents: &str) {
    fs::write(lock.path(), contents).unwrap();
}

/// PID of a process that has already exited and been reaped.
fn dead_pid() -> u32 {
    let mut child = Command::new("true").stdout(Stdio::null()).spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

#[test]
fn acquire_then_release_removes_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut lock = ProcessLock::with_dir("console", dir.path());

    lock.acquire().unwrap();
    assert!(lock.is_held());
    assert!(lock.is_locked());
    assert_eq!(lock.holder(), Some(std::process::id()));
    assert_eq!(
        fs::read_to_string(lock.path()).unwrap(),
        format!("{}\n", std::process::id())
    );

    // Re-acquiring from the holder is a no-op.
    lock.acquire().unwrap();

    lock.release().unwrap();
    assert!(!lock.is_held());
    assert!(!lock.path().exists());
    assert!(!lock.is_locked());
}

#[test]
fn second_instance_is_refused_while_first_holds() {
    let dir = tempfile::tempdir().unwrap();
    let mut first = ProcessLock::with_dir("console", dir.path());
    let mut second = ProcessLock::with_dir("console", dir.path());

    first.acquire().unwrap();
    let err = second.acquire().unwrap_err();
    match &err {
        LockError::Held { name, pid, .. } => {
            assert_eq!(name, "console");
            assert_eq!(*pid, std::process::id());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains(&std::process::id().to_string()));
    assert!(!second.is_held());

    // Releasing a lock never acquired leaves the holder's record alone.
    second.release().unwrap();
    assert!(first.is_locked());

    first.release().unwrap();
    second.acquire().unwrap();
    assert!(second.is_held());
}

#[cfg(unix)]
#[test]
fn live_foreign_holder_blocks_until_it_exits() {
    let dir = tempfile::tempdir().unwrap();
    let mut lock = ProcessLock::with_dir("console", dir.path());

    let mut holder = Command::new("sleep").arg("30").spawn().unwrap();
    write_record(&lock, &format!("{}\n", holder.id()));

    let err = lock.acquire().unwrap_err();
    assert!(matches!(err, LockError::Held { pid, .. } if pid == holder.id()));
    assert!(lock.is_locked());
    assert_eq!(lock.holder(), Some(holder.id()));

    holder.kill().unwrap();
    holder.wait().unwrap();

    lock.acquire().unwrap();
    assert_eq!(lock.holder(), Some(std::process::id()));
}

#[cfg(unix)]
#[test]
fn dead_holder_is_reclaimed() {
    let dir = tempfile::tempdir().unwrap();
    let mut lock = ProcessLock::with_dir("console", dir.path());
    let pid = dead_pid();
    write_record(&lock, &format!("{pid}\n"));

    assert!(!lock.is_locked());
    // Inspection does not touch the record.
    assert_eq!(lock.holder(), Some(pid));

    lock.acquire().unwrap();
    assert!(lock.is_held());
    assert_eq!(lock.holder(), Some(std::process::id()));
}

#[test]
fn garbage_record_is_reclaimed() {
    let dir = tempfile::tempdir().unwrap();
    let mut lock = ProcessLock::with_dir("console", dir.path());
    write_record(&lock, "not a pid");

    assert!(!lock.is_locked());
    assert_eq!(lock.holder(), None);
    assert!(lock.path().exists());

    lock.acquire().unwrap();
    assert_eq!(lock.holder(), Some(std::process::id()));
}

#[test]
fn dropping_releases() {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let mut lock = ProcessLock::with_dir("console", dir.path());
        lock.acquire().unwrap();
        lock.path().to_path_buf()
    };
    assert!(!path.exists());

    let guard = ProcessLock::with_dir("console", dir.path()).guard().unwrap();
    let path = guard.lock().path().to_path_buf();
    assert!(path.exists());
    drop(guard);
    assert!(!path.exists());

    let guard = ProcessLock::with_dir("console", dir.path()).guard().unwrap();
    guard.release().unwrap();
    assert!(!path.exists());
}

#[test]
fn release_leaves_a_record_that_names_someone_else() {
    let dir = tempfile::tempdir().unwrap();
    let mut lock = ProcessLock::with_dir("console", dir.path());
    lock.acquire().unwrap();

    // Another process reclaimed the record out from under us.
    write_record(&lock, "1\n");
    lock.release().unwrap();
    assert!(!lock.is_held());
    assert_eq!(lock.holder(), Some(1));
}

#[test]
fn names_are_independent() {
    let dir = tempfile::tempdir().unwrap();
    let mut lights = ProcessLock::with_dir("lights", dir.path());
    let mut sound = ProcessLock::with_dir("sound", dir.path());

    lights.acquire().unwrap();
    sound.acquire().unwrap();
    assert_ne!(lights.path(), sound.path());
    assert_eq!(lights.name(), "lights");
    assert!(lights.path().ends_with("lights.lock"));
}
